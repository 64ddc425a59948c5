// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Clip engine and the per-frame update pass.

use glam::DVec3;
use kurbo::Rect;
use smallvec::SmallVec;
use tracing::trace;
use understory_object3d::{ObjectId, Plane};

use crate::tree::DisplayTree;
use crate::types::NodeId;

/// Four world-space half-planes bounding a clip rectangle.
///
/// Coordinates are the backend's (`y` up). A point is kept when its distance
/// to every plane is non-negative.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ClipPlanes {
    /// `x >= x0`.
    pub left: Plane,
    /// `x <= x1`.
    pub right: Plane,
    /// `y <= y1`.
    pub bottom: Plane,
    /// `y >= y0`.
    pub top: Plane,
}

impl Default for ClipPlanes {
    fn default() -> Self {
        Self {
            left: Plane::new(DVec3::X, 0.0),
            right: Plane::new(DVec3::NEG_X, 0.0),
            bottom: Plane::new(DVec3::NEG_Y, 0.0),
            top: Plane::new(DVec3::Y, 0.0),
        }
    }
}

impl ClipPlanes {
    /// Planes bounding a world rect.
    pub fn from_rect(rect: Rect) -> Self {
        let mut planes = Self::default();
        planes.set_rect(rect);
        planes
    }

    /// Move the planes onto a world rect, keeping their normals.
    pub fn set_rect(&mut self, rect: Rect) {
        self.left.constant = -rect.x0;
        self.right.constant = rect.x1;
        self.bottom.constant = rect.y1;
        self.top.constant = -rect.y0;
    }

    /// The world rect the planes bound.
    pub fn to_rect(&self) -> Rect {
        Rect::new(
            -self.left.constant,
            -self.top.constant,
            self.right.constant,
            self.bottom.constant,
        )
    }

    /// Whether a world point is on the kept side of all four planes.
    pub fn contains(&self, point: DVec3) -> bool {
        [self.left, self.right, self.bottom, self.top]
            .iter()
            .all(|p| p.distance_to_point(point) >= 0.0)
    }
}

/// Output of the update pass for one node.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct RenderState {
    /// Effective clip, if the node or an ancestor clips.
    pub clip_planes: Option<ClipPlanes>,
    /// Product of the node's and its ancestors' alpha.
    pub alpha: f64,
}

impl Default for RenderState {
    fn default() -> Self {
        Self {
            clip_planes: None,
            alpha: 1.0,
        }
    }
}

impl DisplayTree {
    /// Compute the node's render state from what its ancestors pass down.
    ///
    /// With a clip rect, the rect is taken to world space, intersected with the
    /// inherited clip, and stored in the node's planes. Without one, the
    /// inherited planes pass through unchanged.
    pub fn update(&mut self, id: NodeId, inherited: Option<ClipPlanes>, alpha: f64) {
        let Some(n) = self.node_opt(id) else {
            return;
        };
        let (object, clip_rect) = (n.object, n.clip_rect);

        let mut clip_planes = inherited;
        if let Some(clip) = clip_rect {
            self.validate_if_enabled(id);
            let Some(mut world) = self.world_clip_rect(object, clip) else {
                return;
            };
            if let Some(parent) = inherited {
                world = world.intersect(parent.to_rect());
            }
            trace!(?id, ?world, "clip rect");
            let Some(n) = self.node_opt_mut(id) else {
                return;
            };
            let planes = n.clip_planes.get_or_insert_with(ClipPlanes::default);
            planes.set_rect(world);
            clip_planes = Some(*planes);
        }

        if let Some(n) = self.node_opt_mut(id) {
            n.render_state = RenderState {
                clip_planes,
                alpha: n.alpha * alpha,
            };
        }
    }

    /// Run the update pass over everything attached to the stage, including
    /// nodes below raw backend objects.
    pub fn traverse_update(&mut self) {
        if !self.options.disable_matrix_validation {
            self.validate_all();
        }
        let stage = self.stage;
        let Some(root) = self.object_of(stage) else {
            return;
        };
        self.update(stage, None, 1.0);
        self.traverse_update_from(root, None, 1.0);
    }

    fn traverse_update_from(&mut self, object: ObjectId, clip: Option<ClipPlanes>, alpha: f64) {
        let (clip, alpha) = match self.owner_of(object).and_then(|n| self.node_opt(n)) {
            Some(n) => (
                if n.clip_rect.is_some() {
                    n.clip_planes
                } else {
                    clip
                },
                alpha * n.alpha,
            ),
            None => (clip, alpha),
        };
        let children: SmallVec<[ObjectId; 16]> = self.graph.children(object).into();
        for child in children {
            if let Some(owner) = self.owner_of(child) {
                self.update(owner, clip, alpha);
            }
            if !self.graph.children(child).is_empty() {
                self.traverse_update_from(child, clip, alpha);
            }
        }
    }

    /// Result of the last update pass for the node.
    pub fn render_state(&self, id: NodeId) -> Option<RenderState> {
        self.node_opt(id).map(|n| n.render_state)
    }

    /// The node's own clip planes, once an update has allocated them.
    ///
    /// `None` while the node has no clip rect, even if planes from an earlier
    /// update are still allocated.
    pub fn clip_planes(&self, id: NodeId) -> Option<ClipPlanes> {
        let n = self.node_opt(id)?;
        n.clip_rect.and(n.clip_planes)
    }

    /// A local clip rect in backend world coordinates.
    fn world_clip_rect(&self, object: ObjectId, clip: Rect) -> Option<Rect> {
        let flipped = self.corner_bounds(object, clip, None)?;
        Some(Rect::new(flipped.x0, -flipped.y1, flipped.x1, -flipped.y0))
    }
}
