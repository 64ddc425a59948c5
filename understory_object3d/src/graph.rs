// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Object graph: structure, TRS properties, and world-matrix composition.

use alloc::string::String;
use alloc::{vec, vec::Vec};
use glam::{DMat4, DQuat, DVec3};

use crate::types::{Layers, ObjectId};

/// Quaternion for XYZ-ordered Euler angles (radians).
///
/// The resulting rotation applies `z` first, then `y`, then `x`, matching the
/// matrix product `Rx * Ry * Rz`.
#[must_use]
pub fn euler_to_quat(rotation: DVec3) -> DQuat {
    DQuat::from_rotation_x(rotation.x)
        * DQuat::from_rotation_y(rotation.y)
        * DQuat::from_rotation_z(rotation.z)
}

/// Compose a local matrix from translation, XYZ Euler rotation, and scale.
#[must_use]
pub fn compose_trs(position: DVec3, rotation: DVec3, scale: DVec3) -> DMat4 {
    DMat4::from_scale_rotation_translation(scale, euler_to_quat(rotation), position)
}

#[derive(Clone, Debug)]
struct Object3d {
    generation: u32,
    name: String,
    position: DVec3,
    rotation: DVec3,
    scale: DVec3,
    visible: bool,
    scene: bool,
    layers: Layers,
    parent: Option<ObjectId>,
    children: Vec<ObjectId>,
    matrix: DMat4,
    matrix_world: DMat4,
}

impl Object3d {
    fn new(generation: u32, scene: bool) -> Self {
        Self {
            generation,
            name: String::new(),
            position: DVec3::ZERO,
            rotation: DVec3::ZERO,
            scale: DVec3::ONE,
            visible: true,
            scene,
            layers: Layers::default(),
            parent: None,
            children: Vec::new(),
            matrix: DMat4::IDENTITY,
            matrix_world: DMat4::IDENTITY,
        }
    }
}

/// An arena of 3D objects linked into ordered parent/child trees.
///
/// Objects carry a translation, an XYZ Euler rotation, and a scale. World
/// matrices are cached; they only reflect property changes after
/// [`Graph::update_matrix_world`] has been called on the object or one of its
/// ancestors.
///
/// ```rust
/// use glam::DVec3;
/// use understory_object3d::Graph;
///
/// let mut graph = Graph::new();
/// let parent = graph.create();
/// let child = graph.create();
/// graph.insert_child(parent, usize::MAX, child);
/// graph.set_position(parent, DVec3::new(10.0, 0.0, 0.0));
/// graph.set_position(child, DVec3::new(0.0, 5.0, 0.0));
/// graph.update_matrix_world(parent);
///
/// let world = graph.local_to_world(child, DVec3::ZERO).unwrap();
/// assert_eq!(world, DVec3::new(10.0, 5.0, 0.0));
/// ```
pub struct Graph {
    /// slots
    objects: Vec<Option<Object3d>>,
    /// last generation per slot (persists across frees)
    generations: Vec<u32>,
    free_list: Vec<usize>,
}

impl core::fmt::Debug for Graph {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let total = self.objects.len();
        let alive = self.objects.iter().filter(|o| o.is_some()).count();
        f.debug_struct("Graph")
            .field("objects_total", &total)
            .field("objects_alive", &alive)
            .field("free_list", &self.free_list.len())
            .finish_non_exhaustive()
    }
}

impl Default for Graph {
    fn default() -> Self {
        Self::new()
    }
}

impl Graph {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self {
            objects: Vec::new(),
            generations: Vec::new(),
            free_list: Vec::new(),
        }
    }

    /// Create a detached object with an identity transform.
    pub fn create(&mut self) -> ObjectId {
        self.alloc(false)
    }

    /// Create a detached scene root.
    ///
    /// Scene objects mark the top of a rendered tree; see [`Graph::is_scene`].
    pub fn create_scene(&mut self) -> ObjectId {
        self.alloc(true)
    }

    fn alloc(&mut self, scene: bool) -> ObjectId {
        let (idx, generation) = if let Some(idx) = self.free_list.pop() {
            let generation = self.generations[idx].saturating_add(1);
            self.generations[idx] = generation;
            self.objects[idx] = Some(Object3d::new(generation, scene));
            #[allow(
                clippy::cast_possible_truncation,
                reason = "ObjectId uses 32-bit indices by design."
            )]
            (idx as u32, generation)
        } else {
            let generation = 1_u32;
            self.objects.push(Some(Object3d::new(generation, scene)));
            self.generations.push(generation);
            #[allow(
                clippy::cast_possible_truncation,
                reason = "ObjectId uses 32-bit indices by design."
            )]
            ((self.objects.len() - 1) as u32, generation)
        };
        ObjectId::new(idx, generation)
    }

    /// Destroy an object.
    ///
    /// The object is unlinked from its parent. Its children are not destroyed;
    /// they become detached roots.
    pub fn destroy(&mut self, id: ObjectId) {
        if !self.is_alive(id) {
            return;
        }
        self.detach(id);
        let children = core::mem::take(&mut self.object_mut(id).children);
        for child in children {
            if let Some(c) = self.object_opt_mut(child) {
                c.parent = None;
            }
        }
        self.objects[id.idx()] = None;
        self.free_list.push(id.idx());
    }

    /// Returns true if `id` refers to a live object.
    pub fn is_alive(&self, id: ObjectId) -> bool {
        self.objects
            .get(id.idx())
            .and_then(|o| o.as_ref())
            .map(|o| o.generation == id.1)
            .unwrap_or(false)
    }

    // --- properties ---

    /// Local translation.
    pub fn position(&self, id: ObjectId) -> Option<DVec3> {
        self.object_opt(id).map(|o| o.position)
    }

    /// Set the local translation.
    pub fn set_position(&mut self, id: ObjectId, position: DVec3) {
        if let Some(o) = self.object_opt_mut(id) {
            o.position = position;
        }
    }

    /// Local XYZ Euler rotation in radians.
    pub fn rotation(&self, id: ObjectId) -> Option<DVec3> {
        self.object_opt(id).map(|o| o.rotation)
    }

    /// Set the local XYZ Euler rotation in radians.
    pub fn set_rotation(&mut self, id: ObjectId, rotation: DVec3) {
        if let Some(o) = self.object_opt_mut(id) {
            o.rotation = rotation;
        }
    }

    /// Local scale.
    pub fn scale(&self, id: ObjectId) -> Option<DVec3> {
        self.object_opt(id).map(|o| o.scale)
    }

    /// Set the local scale.
    pub fn set_scale(&mut self, id: ObjectId, scale: DVec3) {
        if let Some(o) = self.object_opt_mut(id) {
            o.scale = scale;
        }
    }

    /// Whether the object (and therefore its subtree) is drawn and pickable.
    pub fn visible(&self, id: ObjectId) -> Option<bool> {
        self.object_opt(id).map(|o| o.visible)
    }

    /// Show or hide the object.
    pub fn set_visible(&mut self, id: ObjectId, visible: bool) {
        if let Some(o) = self.object_opt_mut(id) {
            o.visible = visible;
        }
    }

    /// Debug name.
    pub fn name(&self, id: ObjectId) -> Option<&str> {
        self.object_opt(id).map(|o| o.name.as_str())
    }

    /// Set the debug name.
    pub fn set_name(&mut self, id: ObjectId, name: impl Into<String>) {
        if let Some(o) = self.object_opt_mut(id) {
            o.name = name.into();
        }
    }

    /// Render layers of the object.
    pub fn layers(&self, id: ObjectId) -> Option<Layers> {
        self.object_opt(id).map(|o| o.layers)
    }

    /// Replace the render layers of the object (not its descendants).
    pub fn set_layers(&mut self, id: ObjectId, layers: Layers) {
        if let Some(o) = self.object_opt_mut(id) {
            o.layers = layers;
        }
    }

    /// Whether the object was created with [`Graph::create_scene`].
    pub fn is_scene(&self, id: ObjectId) -> bool {
        self.object_opt(id).is_some_and(|o| o.scene)
    }

    // --- structure ---

    /// Parent of a live object, or `None` for roots and stale ids.
    pub fn parent(&self, id: ObjectId) -> Option<ObjectId> {
        self.object_opt(id).and_then(|o| o.parent)
    }

    /// Ordered children of an object, or an empty slice if `id` is stale.
    pub fn children(&self, id: ObjectId) -> &[ObjectId] {
        self.object_opt(id).map_or(&[], |o| o.children.as_slice())
    }

    /// Topmost ancestor of `id` (or `id` itself when it has no parent).
    pub fn root(&self, id: ObjectId) -> Option<ObjectId> {
        if !self.is_alive(id) {
            return None;
        }
        Some(self.ancestors(id).last().unwrap_or(id))
    }

    /// Iterate the ancestors of `id`, nearest first. `id` itself is excluded.
    pub fn ancestors(&self, id: ObjectId) -> Ancestors<'_> {
        Ancestors {
            graph: self,
            next: self.parent(id),
        }
    }

    /// Position of `child` within its parent's children.
    pub fn index_of(&self, child: ObjectId) -> Option<usize> {
        let parent = self.parent(child)?;
        self.children(parent).iter().position(|&c| c == child)
    }

    /// Insert `child` into `parent`'s children at `index`.
    ///
    /// The child is detached from its current parent first. An index past the
    /// end appends. Returns the index the child ended up at, or `None` if either
    /// id is stale or the two are the same object.
    pub fn insert_child(
        &mut self,
        parent: ObjectId,
        index: usize,
        child: ObjectId,
    ) -> Option<usize> {
        if parent == child || !self.is_alive(parent) || !self.is_alive(child) {
            return None;
        }
        self.detach(child);
        let p = self.object_mut(parent);
        let index = index.min(p.children.len());
        p.children.insert(index, child);
        self.object_mut(child).parent = Some(parent);
        Some(index)
    }

    /// Unlink `child` from its parent, returning the index it occupied.
    pub fn detach(&mut self, child: ObjectId) -> Option<usize> {
        let parent = self.parent(child)?;
        let p = self.object_mut(parent);
        let index = p.children.iter().position(|&c| c == child)?;
        p.children.remove(index);
        self.object_mut(child).parent = None;
        Some(index)
    }

    /// Visit `id` and its descendants in pre-order (children in list order).
    pub fn traverse(&self, id: ObjectId, mut f: impl FnMut(ObjectId)) {
        if !self.is_alive(id) {
            return;
        }
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            f(current);
            stack.extend(self.children(current).iter().rev().copied());
        }
    }

    // --- matrices ---

    /// Recompose local matrices for `id` and all of its descendants, then
    /// recompute their world matrices from the parent's cached world matrix.
    pub fn update_matrix_world(&mut self, id: ObjectId) {
        if !self.is_alive(id) {
            return;
        }
        let parent_world = self
            .parent(id)
            .and_then(|p| self.object_opt(p))
            .map_or(DMat4::IDENTITY, |p| p.matrix_world);

        let mut stack = vec![(id, parent_world)];
        while let Some((current, parent_world)) = stack.pop() {
            let o = self.object_mut(current);
            o.matrix = compose_trs(o.position, o.rotation, o.scale);
            o.matrix_world = parent_world * o.matrix;
            let world = o.matrix_world;
            for &child in o.children.iter().rev() {
                stack.push((child, world));
            }
        }
    }

    /// Cached local matrix as of the last [`Graph::update_matrix_world`].
    pub fn matrix(&self, id: ObjectId) -> Option<DMat4> {
        self.object_opt(id).map(|o| o.matrix)
    }

    /// Cached world matrix as of the last [`Graph::update_matrix_world`].
    pub fn matrix_world(&self, id: ObjectId) -> Option<DMat4> {
        self.object_opt(id).map(|o| o.matrix_world)
    }

    /// Transform a world-space point into the object's local space.
    ///
    /// A degenerate world matrix (zero scale) yields non-finite components.
    pub fn world_to_local(&self, id: ObjectId, point: DVec3) -> Option<DVec3> {
        self.object_opt(id)
            .map(|o| o.matrix_world.inverse().transform_point3(point))
    }

    /// Transform a world-space direction into the object's local space.
    ///
    /// Unlike a rotation-only mapping this applies the inverse scale too, so
    /// a world line maps onto the matching local line.
    pub fn world_direction_to_local(&self, id: ObjectId, direction: DVec3) -> Option<DVec3> {
        self.object_opt(id)
            .map(|o| o.matrix_world.inverse().transform_vector3(direction))
    }

    /// Transform a local point into world space.
    pub fn local_to_world(&self, id: ObjectId, point: DVec3) -> Option<DVec3> {
        self.object_opt(id)
            .map(|o| o.matrix_world.transform_point3(point))
    }

    /// Rotation part of the cached world matrix.
    pub fn world_quaternion(&self, id: ObjectId) -> Option<DQuat> {
        self.object_opt(id)
            .map(|o| o.matrix_world.to_scale_rotation_translation().1)
    }

    // --- internals ---

    fn object_opt(&self, id: ObjectId) -> Option<&Object3d> {
        let o = self.objects.get(id.idx())?.as_ref()?;
        (o.generation == id.1).then_some(o)
    }

    fn object_opt_mut(&mut self, id: ObjectId) -> Option<&mut Object3d> {
        let o = self.objects.get_mut(id.idx())?.as_mut()?;
        if o.generation != id.1 {
            return None;
        }
        Some(o)
    }

    /// Panics if `id` is stale; only used after a liveness check.
    fn object_mut(&mut self, id: ObjectId) -> &mut Object3d {
        self.objects[id.idx()].as_mut().expect("dangling ObjectId")
    }
}

/// Iterator over an object's ancestors, nearest first.
///
/// Returned by [`Graph::ancestors`].
#[derive(Clone, Debug)]
pub struct Ancestors<'a> {
    graph: &'a Graph,
    next: Option<ObjectId>,
}

impl Iterator for Ancestors<'_> {
    type Item = ObjectId;

    fn next(&mut self) -> Option<ObjectId> {
        let current = self.next?;
        self.next = self.graph.parent(current);
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::f64::consts::FRAC_PI_2;

    fn approx(a: DVec3, b: DVec3) -> bool {
        (a - b).abs().max_element() < 1e-9
    }

    #[test]
    fn insert_detaches_and_clamps() {
        let mut g = Graph::new();
        let a = g.create();
        let b = g.create();
        let c = g.create();
        assert_eq!(g.insert_child(a, 10, c), Some(0));
        assert_eq!(g.insert_child(b, 0, c), Some(0));
        assert!(g.children(a).is_empty());
        assert_eq!(g.children(b), &[c]);
        assert_eq!(g.parent(c), Some(b));
        assert_eq!(g.insert_child(c, 0, c), None);
    }

    #[test]
    fn destroy_orphans_children_and_bumps_generation() {
        let mut g = Graph::new();
        let a = g.create();
        let b = g.create();
        g.insert_child(a, 0, b);
        g.destroy(a);
        assert!(!g.is_alive(a));
        assert_eq!(g.parent(b), None);
        let again = g.create();
        assert_eq!(again.index(), a.index());
        assert!(again.generation() > a.generation());
        assert_eq!(g.position(a), None);
    }

    #[test]
    fn ancestors_and_root() {
        let mut g = Graph::new();
        let scene = g.create_scene();
        let a = g.create();
        let b = g.create();
        g.insert_child(scene, 0, a);
        g.insert_child(a, 0, b);
        let chain: Vec<_> = g.ancestors(b).collect();
        assert_eq!(chain, vec![a, scene]);
        assert_eq!(g.root(b), Some(scene));
        assert!(g.is_scene(scene));
        assert!(!g.is_scene(a));
    }

    #[test]
    fn traverse_is_pre_order() {
        let mut g = Graph::new();
        let r = g.create();
        let a = g.create();
        let b = g.create();
        let a1 = g.create();
        g.insert_child(r, usize::MAX, a);
        g.insert_child(r, usize::MAX, b);
        g.insert_child(a, usize::MAX, a1);
        let mut seen = Vec::new();
        g.traverse(r, |id| seen.push(id));
        assert_eq!(seen, vec![r, a, a1, b]);
    }

    #[test]
    fn world_matrix_composes_rotation_and_scale() {
        let mut g = Graph::new();
        let p = g.create();
        let c = g.create();
        g.insert_child(p, 0, c);
        g.set_rotation(p, DVec3::new(0.0, 0.0, FRAC_PI_2));
        g.set_scale(p, DVec3::new(2.0, 2.0, 2.0));
        g.set_position(c, DVec3::new(1.0, 0.0, 0.0));
        g.update_matrix_world(p);

        let w = g.local_to_world(c, DVec3::ZERO).unwrap();
        assert!(approx(w, DVec3::new(0.0, 2.0, 0.0)), "{w:?}");
        let back = g.world_to_local(c, w).unwrap();
        assert!(approx(back, DVec3::ZERO), "{back:?}");

        let q = g.world_quaternion(c).unwrap();
        assert!(approx(q * DVec3::X, DVec3::Y));
    }

    #[test]
    fn world_directions_follow_scale() {
        let mut g = Graph::new();
        let a = g.create();
        g.set_scale(a, DVec3::new(1.0, 3.0, 1.0));
        g.set_rotation(a, DVec3::new(FRAC_PI_2 / 3.0, 0.0, 0.0));
        g.update_matrix_world(a);

        // Two world points and the direction between them stay consistent.
        let p = DVec3::new(4.0, -7.0, 12.0);
        let d = DVec3::new(0.0, 0.0, -5.0);
        let lp = g.world_to_local(a, p).unwrap();
        let lq = g.world_to_local(a, p + d).unwrap();
        let ld = g.world_direction_to_local(a, d).unwrap();
        assert!(approx(lq - lp, ld), "{ld:?} vs {:?}", lq - lp);
    }

    #[test]
    fn world_matrix_is_cached_until_updated() {
        let mut g = Graph::new();
        let a = g.create();
        g.update_matrix_world(a);
        g.set_position(a, DVec3::new(3.0, 0.0, 0.0));
        assert_eq!(g.local_to_world(a, DVec3::ZERO), Some(DVec3::ZERO));
        g.update_matrix_world(a);
        assert_eq!(
            g.local_to_world(a, DVec3::ZERO),
            Some(DVec3::new(3.0, 0.0, 0.0))
        );
    }

    #[test]
    fn euler_order_is_xyz() {
        let r = DVec3::new(0.3, -0.7, 1.1);
        let m = DMat4::from_rotation_x(r.x)
            * DMat4::from_rotation_y(r.y)
            * DMat4::from_rotation_z(r.z);
        let v = DVec3::new(1.0, 2.0, 3.0);
        assert!(approx(euler_to_quat(r) * v, m.transform_vector3(v)));
    }
}
