// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Core tree: node storage, plain properties, and lazy matrix validation.

use alloc::boxed::Box;
use alloc::string::String;
use alloc::{vec, vec::Vec};
use glam::DVec3;
use hashbrown::HashMap;
use kurbo::{Rect, Size, Vec2};
use smallvec::SmallVec;
use tracing::trace;
use understory_object3d::{Camera, Graph, Layers, ObjectId};

use crate::clip::{ClipPlanes, RenderState};
use crate::events::Listener;
use crate::graphics::Graphics;
use crate::hit_area::HitArea;
use crate::options::StageOptions;
use crate::types::{NodeFlags, NodeId};

/// A tree of 2D display nodes layered on a 3D object [`Graph`].
///
/// Every node wraps one backend object. The public API uses screen
/// conventions (`y` grows downward, rotation in degrees, clockwise), while the
/// backend stores a `y`-up translation and radians. The tree owns a *stage*
/// node wrapping the backend scene; nodes attached below it are "on stage",
/// receive lifecycle events, and take part in [`DisplayTree::pick`] and
/// [`DisplayTree::traverse_update`].
///
/// World matrices are validated lazily: property setters only mark a node
/// dirty, and the first query that needs a current matrix walks the ancestor
/// chain and recomposes what is stale.
///
/// ## Example
///
/// ```rust
/// use kurbo::{Point, Rect};
/// use understory_display_tree::DisplayTree;
///
/// let mut tree = DisplayTree::new();
/// let stage = tree.stage();
/// let panel = tree.create_node();
/// tree.set_size(panel, 200.0, 100.0);
/// tree.set_position(panel, 50.0, 20.0, 0.0);
/// tree.set_opaque(panel, true);
/// tree.add_child(stage, panel).unwrap();
///
/// assert_eq!(tree.pick(Point::new(60.0, 30.0), false), Some(panel));
/// assert_eq!(tree.pick(Point::new(10.0, 10.0), false), None);
///
/// let bounds = tree.get_bounds(panel, Some(stage)).unwrap();
/// assert_eq!(bounds, Rect::new(50.0, 20.0, 250.0, 120.0));
/// ```
pub struct DisplayTree {
    pub(crate) graph: Graph,
    /// slots
    nodes: Vec<Option<Node>>,
    /// last generation per slot (persists across frees)
    generations: Vec<u32>,
    free_list: Vec<usize>,
    /// backend object -> owning node
    pub(crate) owners: HashMap<ObjectId, NodeId>,
    pub(crate) stage: NodeId,
    pub(crate) listeners: HashMap<NodeId, SmallVec<[Listener; 2]>>,
    pub(crate) next_listener: u64,
    pub(crate) options: StageOptions,
    pub(crate) camera: Camera,
}

impl core::fmt::Debug for DisplayTree {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let total = self.nodes.len();
        let alive = self.nodes.iter().filter(|n| n.is_some()).count();
        let free = self.free_list.len();
        f.debug_struct("DisplayTree")
            .field("nodes_total", &total)
            .field("nodes_alive", &alive)
            .field("free_list", &free)
            .field("stage", &self.stage)
            .field("options", &self.options)
            .field("graph", &self.graph)
            .finish_non_exhaustive()
    }
}

impl Default for DisplayTree {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug)]
pub(crate) struct Node {
    pub(crate) generation: u32,
    pub(crate) object: ObjectId,
    pub(crate) pivot: Vec2,
    /// pivot point in the parent's basis, derived from pivot, size, rotation and scale
    pub(crate) pivot_offset: DVec3,
    pub(crate) size: Size,
    pub(crate) clip_rect: Option<Rect>,
    /// allocated on the first update with a clip rect
    pub(crate) clip_planes: Option<ClipPlanes>,
    pub(crate) alpha: f64,
    pub(crate) flags: NodeFlags,
    pub(crate) hit_area: Option<Box<dyn HitArea>>,
    pub(crate) mask: Option<NodeId>,
    pub(crate) camera: Option<Camera>,
    pub(crate) graphics: Option<Graphics>,
    pub(crate) matrix_dirty: bool,
    pub(crate) render_state: RenderState,
}

impl Node {
    fn new(generation: u32, object: ObjectId) -> Self {
        Self {
            generation,
            object,
            pivot: Vec2::ZERO,
            pivot_offset: DVec3::ZERO,
            size: Size::ZERO,
            clip_rect: None,
            clip_planes: None,
            alpha: 1.0,
            flags: NodeFlags::default(),
            hit_area: None,
            mask: None,
            camera: None,
            graphics: None,
            matrix_dirty: true,
            render_state: RenderState::default(),
        }
    }

    pub(crate) fn content_rect(&self) -> Rect {
        Rect::from_origin_size(kurbo::Point::ZERO, self.size)
    }
}

impl DisplayTree {
    /// Create a tree with [`StageOptions::default`].
    pub fn new() -> Self {
        Self::with_options(StageOptions::default())
    }

    /// Create a tree with explicit options.
    pub fn with_options(options: StageOptions) -> Self {
        let mut graph = Graph::new();
        let scene = graph.create_scene();
        graph.set_name(scene, "stage");
        graph.set_layers(scene, Layers::single(options.ui_layer));

        let stage = NodeId::new(0, 1);
        let mut owners = HashMap::new();
        owners.insert(scene, stage);

        let mut camera = Camera::ui(options.viewport);
        camera.layers = Layers::single(options.ui_layer);

        Self {
            graph,
            nodes: vec![Some(Node::new(1, scene))],
            generations: vec![1],
            free_list: Vec::new(),
            owners,
            stage,
            listeners: HashMap::new(),
            next_listener: 0,
            options,
            camera,
        }
    }

    /// The root node wrapping the backend scene.
    pub fn stage(&self) -> NodeId {
        self.stage
    }

    /// Current options.
    pub fn options(&self) -> &StageOptions {
        &self.options
    }

    /// The backend graph.
    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    /// Mutable access to the backend graph.
    ///
    /// Raw objects may be linked under nodes; update and pick traversals walk
    /// through them. Transform changes made here are not tracked: call
    /// [`Graph::update_matrix_world`] or touch an owning node afterwards.
    pub fn graph_mut(&mut self) -> &mut Graph {
        &mut self.graph
    }

    /// The default camera used when no ancestor overrides it.
    pub fn default_camera(&self) -> &Camera {
        &self.camera
    }

    /// Replace the default camera.
    pub fn set_camera(&mut self, camera: Camera) {
        self.camera = camera;
    }

    /// Resize the screen area of the default camera.
    pub fn set_viewport(&mut self, viewport: Size) {
        self.options.viewport = viewport;
        self.camera.set_viewport(viewport);
    }

    /// Create a detached node with an identity transform, an empty content
    /// rect, `alpha = 1`, and touch enabled.
    pub fn create_node(&mut self) -> NodeId {
        let object = self.graph.create();
        self.graph
            .set_layers(object, Layers::single(self.options.ui_layer));
        let (idx, generation) = if let Some(idx) = self.free_list.pop() {
            let generation = self.generations[idx].saturating_add(1);
            self.generations[idx] = generation;
            self.nodes[idx] = Some(Node::new(generation, object));
            #[allow(
                clippy::cast_possible_truncation,
                reason = "NodeId uses 32-bit indices by design."
            )]
            (idx as u32, generation)
        } else {
            let generation = 1_u32;
            self.nodes.push(Some(Node::new(generation, object)));
            self.generations.push(generation);
            #[allow(
                clippy::cast_possible_truncation,
                reason = "NodeId uses 32-bit indices by design."
            )]
            ((self.nodes.len() - 1) as u32, generation)
        };
        let id = NodeId::new(idx, generation);
        self.owners.insert(object, id);
        id
    }

    /// Free the slot of a node whose object has already been destroyed.
    pub(crate) fn release_slot(&mut self, id: NodeId) -> Option<Node> {
        let node = self.nodes.get_mut(id.idx())?.take()?;
        self.owners.remove(&node.object);
        self.free_list.push(id.idx());
        Some(node)
    }

    /// Returns true if `id` refers to a live node.
    pub fn is_alive(&self, id: NodeId) -> bool {
        self.node_opt(id).is_some()
    }

    /// Backend object wrapped by a node.
    pub fn object_of(&self, id: NodeId) -> Option<ObjectId> {
        self.node_opt(id).map(|n| n.object)
    }

    /// Node owning a backend object, if any.
    pub fn owner_of(&self, object: ObjectId) -> Option<NodeId> {
        self.owners.get(&object).copied()
    }

    // --- plain properties ---

    /// Debug name (stored on the backend object).
    pub fn name(&self, id: NodeId) -> Option<&str> {
        self.graph.name(self.object_of(id)?)
    }

    /// Set the debug name.
    pub fn set_name(&mut self, id: NodeId, name: impl Into<String>) {
        if let Some(object) = self.object_of(id) {
            self.graph.set_name(object, name);
        }
    }

    /// Own opacity, not including ancestors.
    pub fn alpha(&self, id: NodeId) -> Option<f64> {
        self.node_opt(id).map(|n| n.alpha)
    }

    /// Set the own opacity. Takes effect on the next update pass.
    pub fn set_alpha(&mut self, id: NodeId, alpha: f64) {
        if let Some(n) = self.node_opt_mut(id) {
            n.alpha = alpha;
        }
    }

    /// Whether the node is drawn and pickable.
    pub fn visible(&self, id: NodeId) -> Option<bool> {
        self.graph.visible(self.object_of(id)?)
    }

    /// Show or hide the node and its subtree.
    pub fn set_visible(&mut self, id: NodeId, visible: bool) {
        if let Some(object) = self.object_of(id) {
            self.graph.set_visible(object, visible);
        }
    }

    /// All flags of a node.
    pub fn flags(&self, id: NodeId) -> Option<NodeFlags> {
        self.node_opt(id).map(|n| n.flags)
    }

    /// Replace all flags of a node.
    pub fn set_flags(&mut self, id: NodeId, flags: NodeFlags) {
        if let Some(n) = self.node_opt_mut(id) {
            n.flags = flags;
        }
    }

    fn set_flag(&mut self, id: NodeId, flag: NodeFlags, on: bool) {
        if let Some(n) = self.node_opt_mut(id) {
            n.flags.set(flag, on);
        }
    }

    /// Whether touch picks consider the node.
    pub fn touchable(&self, id: NodeId) -> Option<bool> {
        self.flags(id).map(|f| f.contains(NodeFlags::TOUCHABLE))
    }

    /// Include or exclude the node from touch picks. Its children are still
    /// considered.
    pub fn set_touchable(&mut self, id: NodeId, touchable: bool) {
        self.set_flag(id, NodeFlags::TOUCHABLE, touchable);
    }

    /// Whether every pick skips the node and its subtree.
    pub fn touch_disabled(&self, id: NodeId) -> Option<bool> {
        self.flags(id).map(|f| f.contains(NodeFlags::TOUCH_DISABLED))
    }

    /// Make every pick skip the node and its subtree.
    pub fn set_touch_disabled(&mut self, id: NodeId, disabled: bool) {
        self.set_flag(id, NodeFlags::TOUCH_DISABLED, disabled);
    }

    /// Whether the node is hit by points inside its content rect.
    pub fn opaque(&self, id: NodeId) -> Option<bool> {
        self.flags(id).map(|f| f.contains(NodeFlags::OPAQUE))
    }

    /// Make the node hittable over its content rect (or hit area).
    pub fn set_opaque(&mut self, id: NodeId, opaque: bool) {
        self.set_flag(id, NodeFlags::OPAQUE, opaque);
    }

    /// Whether the mask admits points outside of it.
    pub fn reversed_mask(&self, id: NodeId) -> Option<bool> {
        self.flags(id).map(|f| f.contains(NodeFlags::REVERSED_MASK))
    }

    /// Invert the mask test.
    pub fn set_reversed_mask(&mut self, id: NodeId, reversed: bool) {
        self.set_flag(id, NodeFlags::REVERSED_MASK, reversed);
    }

    /// Local clip window.
    pub fn clip_rect(&self, id: NodeId) -> Option<Rect> {
        self.node_opt(id).and_then(|n| n.clip_rect)
    }

    /// Set or clear the local clip window.
    pub fn set_clip_rect(&mut self, id: NodeId, clip: Option<Rect>) {
        if let Some(n) = self.node_opt_mut(id) {
            n.clip_rect = clip;
        }
    }

    /// Custom hit-test strategy.
    pub fn hit_area(&self, id: NodeId) -> Option<&dyn HitArea> {
        self.node_opt(id).and_then(|n| n.hit_area.as_deref())
    }

    /// Set or clear the custom hit-test strategy.
    pub fn set_hit_area(&mut self, id: NodeId, hit_area: Option<Box<dyn HitArea>>) {
        if let Some(n) = self.node_opt_mut(id) {
            n.hit_area = hit_area;
        }
    }

    /// Node whose hit area gates hits on this node.
    pub fn mask(&self, id: NodeId) -> Option<NodeId> {
        self.node_opt(id).and_then(|n| n.mask)
    }

    /// Set or clear the mask. A node cannot mask itself.
    pub fn set_mask(&mut self, id: NodeId, mask: Option<NodeId>) {
        if mask == Some(id) {
            return;
        }
        if let Some(n) = self.node_opt_mut(id) {
            n.mask = mask;
        }
    }

    /// Camera override used by this node's subtree.
    pub fn camera(&self, id: NodeId) -> Option<Camera> {
        self.node_opt(id).and_then(|n| n.camera)
    }

    /// Set or clear the camera override.
    pub fn set_camera_override(&mut self, id: NodeId, camera: Option<Camera>) {
        if let Some(n) = self.node_opt_mut(id) {
            n.camera = camera;
        }
    }

    /// Drawn content.
    pub fn graphics(&self, id: NodeId) -> Option<&Graphics> {
        self.node_opt(id).and_then(|n| n.graphics.as_ref())
    }

    /// Mutable drawn content.
    pub fn graphics_mut(&mut self, id: NodeId) -> Option<&mut Graphics> {
        self.node_opt_mut(id).and_then(|n| n.graphics.as_mut())
    }

    /// Attach or remove drawn content; its draw rect follows the content rect.
    pub fn set_graphics(&mut self, id: NodeId, graphics: Option<Graphics>) {
        if let Some(n) = self.node_opt_mut(id) {
            let rect = n.content_rect();
            n.graphics = graphics.map(|mut g| {
                g.set_draw_rect(rect);
                g
            });
        }
    }

    /// Put the node's whole backend subtree on a single render layer.
    pub fn set_layer(&mut self, id: NodeId, layer: u8) {
        let Some(object) = self.object_of(id) else {
            return;
        };
        let mut objects: SmallVec<[ObjectId; 16]> = SmallVec::new();
        self.graph.traverse(object, |o| objects.push(o));
        for o in objects {
            self.graph.set_layers(o, Layers::single(layer));
        }
    }

    /// Render layers of the node's object.
    pub fn layers(&self, id: NodeId) -> Option<Layers> {
        self.graph.layers(self.object_of(id)?)
    }

    /// Whether the node is rooted at the backend scene.
    pub fn is_on_stage(&self, id: NodeId) -> bool {
        self.object_of(id)
            .and_then(|o| self.graph.root(o))
            .is_some_and(|root| self.graph.is_scene(root))
    }

    /// Owning node of the parent object, or `None` for detached nodes, for
    /// the stage, and when the parent is a raw backend object.
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.graph.parent(self.object_of(id)?)?;
        self.owner_of(parent)
    }

    /// Child nodes in paint order (back to front). Raw backend children are
    /// skipped.
    pub fn children(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        let objects = match self.object_of(id) {
            Some(o) => self.graph.children(o),
            None => &[],
        };
        objects.iter().filter_map(move |o| self.owner_of(*o))
    }

    // --- matrix validation ---

    /// Whether any transform input changed since the node was last validated.
    pub fn is_matrix_dirty(&self, id: NodeId) -> Option<bool> {
        self.node_opt(id).map(|n| n.matrix_dirty)
    }

    /// Whether conversions and picks skip lazy validation.
    pub fn matrix_validation_disabled(&self) -> bool {
        self.options.disable_matrix_validation
    }

    /// Turn lazy validation off for a batch of queries that were validated up
    /// front, or back on.
    pub fn set_matrix_validation_disabled(&mut self, disabled: bool) {
        self.options.disable_matrix_validation = disabled;
    }

    /// Bring the world matrix of `id` up to date.
    ///
    /// Dirty ancestors are resolved root first, each recomposing its whole
    /// subtree, then the node itself if it is still dirty.
    pub fn validate_matrix(&mut self, id: NodeId) {
        let Some(object) = self.object_of(id) else {
            return;
        };
        let chain: SmallVec<[ObjectId; 16]> = self.graph.ancestors(object).collect();
        for &ancestor in chain.iter().rev() {
            if self.owner_dirty(ancestor) {
                self.refresh_subtree(ancestor);
            }
        }
        if self.node_opt(id).is_some_and(|n| n.matrix_dirty) {
            self.refresh_subtree(object);
        }
    }

    /// Validate every dirty node attached to the stage.
    pub fn validate_all(&mut self) {
        let Some(root) = self.object_of(self.stage) else {
            return;
        };
        let mut stack = vec![root];
        while let Some(object) = stack.pop() {
            if self.owner_dirty(object) {
                self.refresh_subtree(object);
            } else {
                stack.extend_from_slice(self.graph.children(object));
            }
        }
    }

    pub(crate) fn validate_if_enabled(&mut self, id: NodeId) {
        if !self.options.disable_matrix_validation {
            self.validate_matrix(id);
        }
    }

    pub(crate) fn mark_dirty(&mut self, id: NodeId) {
        if let Some(n) = self.node_opt_mut(id) {
            n.matrix_dirty = true;
        }
    }

    /// Mark every owned node in the backend subtree of `object` dirty.
    pub(crate) fn mark_subtree_dirty(&mut self, object: ObjectId) {
        let mut owned: SmallVec<[NodeId; 16]> = SmallVec::new();
        self.graph.traverse(object, |o| {
            if let Some(&n) = self.owners.get(&o) {
                owned.push(n);
            }
        });
        for n in owned {
            self.mark_dirty(n);
        }
    }

    fn owner_dirty(&self, object: ObjectId) -> bool {
        self.owner_of(object)
            .and_then(|n| self.node_opt(n))
            .is_some_and(|n| n.matrix_dirty)
    }

    fn refresh_subtree(&mut self, object: ObjectId) {
        trace!(?object, "recomposing world matrices");
        self.graph.update_matrix_world(object);
        let mut owned: SmallVec<[NodeId; 16]> = SmallVec::new();
        self.graph.traverse(object, |o| {
            if let Some(&n) = self.owners.get(&o) {
                owned.push(n);
            }
        });
        for n in owned {
            if let Some(node) = self.node_opt_mut(n) {
                node.matrix_dirty = false;
            }
        }
    }

    // --- internals ---

    pub(crate) fn node_opt(&self, id: NodeId) -> Option<&Node> {
        let n = self.nodes.get(id.idx())?.as_ref()?;
        (n.generation == id.1).then_some(n)
    }

    pub(crate) fn node_opt_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        let n = self.nodes.get_mut(id.idx())?.as_mut()?;
        if n.generation != id.1 {
            return None;
        }
        Some(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graphics::Silhouette;

    #[test]
    fn new_node_defaults() {
        let mut tree = DisplayTree::new();
        let n = tree.create_node();
        assert_eq!(tree.alpha(n), Some(1.0));
        assert_eq!(tree.touchable(n), Some(true));
        assert_eq!(tree.opaque(n), Some(false));
        assert_eq!(tree.visible(n), Some(true));
        assert_eq!(tree.is_matrix_dirty(n), Some(true));
        assert_eq!(tree.parent(n), None);
        assert!(!tree.is_on_stage(n));
        assert!(tree.is_on_stage(tree.stage()));
    }

    #[test]
    fn stale_ids_are_ignored() {
        let mut tree = DisplayTree::new();
        let n = tree.create_node();
        tree.dispose(n).unwrap();
        tree.set_alpha(n, 0.5);
        tree.set_name(n, "gone");
        assert_eq!(tree.alpha(n), None);
        assert_eq!(tree.name(n), None);
        let reused = tree.create_node();
        assert_ne!(reused, n);
        assert_eq!(reused.idx(), n.idx());
    }

    #[test]
    fn registry_maps_objects_back_to_nodes() {
        let mut tree = DisplayTree::new();
        let n = tree.create_node();
        let object = tree.object_of(n).unwrap();
        assert_eq!(tree.owner_of(object), Some(n));
        let raw = tree.graph_mut().create();
        assert_eq!(tree.owner_of(raw), None);
    }

    #[test]
    fn validation_clears_dirty_subtree() {
        let mut tree = DisplayTree::new();
        let stage = tree.stage();
        let a = tree.create_node();
        let b = tree.create_node();
        tree.add_child(stage, a).unwrap();
        tree.add_child(a, b).unwrap();
        tree.set_position(a, 10.0, 20.0, 0.0);
        tree.validate_matrix(b);
        assert_eq!(tree.is_matrix_dirty(stage), Some(false));
        assert_eq!(tree.is_matrix_dirty(a), Some(false));
        assert_eq!(tree.is_matrix_dirty(b), Some(false));

        let world = tree.graph().local_to_world(tree.object_of(b).unwrap(), DVec3::ZERO);
        assert_eq!(world, Some(DVec3::new(10.0, -20.0, 0.0)));
    }

    #[test]
    fn validate_all_reaches_nested_dirty_nodes() {
        let mut tree = DisplayTree::new();
        let stage = tree.stage();
        let a = tree.create_node();
        let b = tree.create_node();
        tree.add_child(stage, a).unwrap();
        tree.add_child(a, b).unwrap();
        tree.validate_all();
        tree.set_x(b, 5.0);
        assert_eq!(tree.is_matrix_dirty(a), Some(false));
        tree.validate_all();
        assert_eq!(tree.is_matrix_dirty(b), Some(false));
    }

    #[test]
    fn set_layer_covers_subtree_and_add_child_copies_mask() {
        let mut tree = DisplayTree::with_options(StageOptions {
            ui_layer: 3,
            ..StageOptions::default()
        });
        let a = tree.create_node();
        let b = tree.create_node();
        assert_eq!(tree.layers(a), Some(Layers::single(3)));
        tree.add_child(a, b).unwrap();
        tree.set_layer(a, 7);
        assert_eq!(tree.layers(b), Some(Layers::single(7)));

        let c = tree.create_node();
        tree.add_child(b, c).unwrap();
        assert_eq!(tree.layers(c), Some(Layers::single(7)));
    }

    #[test]
    fn graphics_follow_size() {
        let mut tree = DisplayTree::new();
        let n = tree.create_node();
        tree.set_size(n, 40.0, 30.0);
        tree.set_graphics(n, Some(Graphics::new(Silhouette::Rect)));
        assert_eq!(
            tree.graphics(n).map(Graphics::draw_rect),
            Some(Rect::new(0.0, 0.0, 40.0, 30.0))
        );
        tree.set_size(n, 10.0, 10.0);
        assert_eq!(
            tree.graphics(n).map(Graphics::draw_rect),
            Some(Rect::new(0.0, 0.0, 10.0, 10.0))
        );
    }

    #[test]
    fn node_cannot_mask_itself() {
        let mut tree = DisplayTree::new();
        let n = tree.create_node();
        tree.set_mask(n, Some(n));
        assert_eq!(tree.mask(n), None);
    }
}
