// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Transform properties and the pivot calculator.
//!
//! Positions are stored on the backend object with `y` negated. Rotation about
//! the view axis is stored negated and in radians. The scale of the view axis
//! mirrors the horizontal scale so content keeps its proportions in depth.
//!
//! The pivot is a fraction of the content size. It never moves the node by
//! itself: changing the pivot, rotation, scale, or size shifts the stored
//! position so that the pivot point stays where it is on screen.

use glam::DVec3;
use kurbo::{Rect, Size, Vec2};
use understory_object3d::euler_to_quat;

use crate::tree::DisplayTree;
use crate::types::NodeId;

impl DisplayTree {
    // --- position ---

    /// Horizontal position in the parent's space.
    pub fn x(&self, id: NodeId) -> Option<f64> {
        self.graph.position(self.object_of(id)?).map(|p| p.x)
    }

    /// Vertical position in the parent's space (down is positive).
    pub fn y(&self, id: NodeId) -> Option<f64> {
        self.graph.position(self.object_of(id)?).map(|p| -p.y)
    }

    /// Depth offset toward the viewer.
    pub fn z(&self, id: NodeId) -> Option<f64> {
        self.graph.position(self.object_of(id)?).map(|p| p.z)
    }

    /// Set the horizontal position.
    pub fn set_x(&mut self, id: NodeId, x: f64) {
        if let (Some(y), Some(z)) = (self.y(id), self.z(id)) {
            self.set_position(id, x, y, z);
        }
    }

    /// Set the vertical position.
    pub fn set_y(&mut self, id: NodeId, y: f64) {
        if let (Some(x), Some(z)) = (self.x(id), self.z(id)) {
            self.set_position(id, x, y, z);
        }
    }

    /// Set the depth offset.
    pub fn set_z(&mut self, id: NodeId, z: f64) {
        if let (Some(x), Some(y)) = (self.x(id), self.y(id)) {
            self.set_position(id, x, y, z);
        }
    }

    /// Set the position of the node's origin (its content's top-left corner).
    pub fn set_position(&mut self, id: NodeId, x: f64, y: f64, z: f64) {
        let Some(object) = self.object_of(id) else {
            return;
        };
        self.graph.set_position(object, DVec3::new(x, -y, z));
        self.mark_dirty(id);
    }

    /// Set the position of the pivot point instead of the origin.
    pub fn set_position_pivot(&mut self, id: NodeId, x: f64, y: f64, z: f64) {
        let Some(offset) = self.node_opt(id).map(|n| n.pivot_offset) else {
            return;
        };
        self.set_position(id, x - offset.x, y + offset.y, z - offset.z);
    }

    // --- size ---

    /// Width of the content rect.
    pub fn width(&self, id: NodeId) -> Option<f64> {
        self.size(id).map(|s| s.width)
    }

    /// Height of the content rect.
    pub fn height(&self, id: NodeId) -> Option<f64> {
        self.size(id).map(|s| s.height)
    }

    /// Size of the content rect.
    pub fn size(&self, id: NodeId) -> Option<Size> {
        self.node_opt(id).map(|n| n.size)
    }

    /// The untransformed content rect, anchored at the local origin.
    pub fn content_rect(&self, id: NodeId) -> Option<Rect> {
        self.node_opt(id).map(|n| n.content_rect())
    }

    /// Set the content width.
    pub fn set_width(&mut self, id: NodeId, width: f64) {
        if let Some(h) = self.height(id) {
            self.set_size(id, width, h);
        }
    }

    /// Set the content height.
    pub fn set_height(&mut self, id: NodeId, height: f64) {
        if let Some(w) = self.width(id) {
            self.set_size(id, w, height);
        }
    }

    /// Set the content size, re-anchoring around the pivot.
    pub fn set_size(&mut self, id: NodeId, width: f64, height: f64) {
        let size = Size::new(width, height);
        let Some(n) = self.node_opt_mut(id) else {
            return;
        };
        if n.size == size {
            return;
        }
        n.size = size;
        let rect = n.content_rect();
        if let Some(g) = n.graphics.as_mut() {
            g.set_draw_rect(rect);
        }
        self.apply_pivot(id);
    }

    // --- rotation and scale ---

    /// Rotation about the view axis in degrees, clockwise on screen.
    pub fn rotation(&self, id: NodeId) -> Option<f64> {
        self.graph
            .rotation(self.object_of(id)?)
            .map(|r| -r.z.to_degrees())
    }

    /// Rotation about the horizontal axis in degrees.
    pub fn rotation_x(&self, id: NodeId) -> Option<f64> {
        self.graph
            .rotation(self.object_of(id)?)
            .map(|r| r.x.to_degrees())
    }

    /// Rotation about the vertical axis in degrees.
    pub fn rotation_y(&self, id: NodeId) -> Option<f64> {
        self.graph
            .rotation(self.object_of(id)?)
            .map(|r| r.y.to_degrees())
    }

    /// Set the rotation about the view axis, in degrees.
    pub fn set_rotation(&mut self, id: NodeId, degrees: f64) {
        self.update_rotation(id, |r| r.z = -degrees.to_radians());
    }

    /// Set the rotation about the horizontal axis, in degrees.
    pub fn set_rotation_x(&mut self, id: NodeId, degrees: f64) {
        self.update_rotation(id, |r| r.x = degrees.to_radians());
    }

    /// Set the rotation about the vertical axis, in degrees.
    pub fn set_rotation_y(&mut self, id: NodeId, degrees: f64) {
        self.update_rotation(id, |r| r.y = degrees.to_radians());
    }

    fn update_rotation(&mut self, id: NodeId, f: impl FnOnce(&mut DVec3)) {
        let Some(object) = self.object_of(id) else {
            return;
        };
        let Some(mut rotation) = self.graph.rotation(object) else {
            return;
        };
        f(&mut rotation);
        self.graph.set_rotation(object, rotation);
        self.apply_pivot(id);
        self.mark_dirty(id);
    }

    /// Horizontal scale.
    pub fn scale_x(&self, id: NodeId) -> Option<f64> {
        self.graph.scale(self.object_of(id)?).map(|s| s.x)
    }

    /// Vertical scale.
    pub fn scale_y(&self, id: NodeId) -> Option<f64> {
        self.graph.scale(self.object_of(id)?).map(|s| s.y)
    }

    /// Set the scale, re-anchoring around the pivot.
    pub fn set_scale(&mut self, id: NodeId, sx: f64, sy: f64) {
        let Some(object) = self.object_of(id) else {
            return;
        };
        self.graph.set_scale(object, DVec3::new(sx, sy, sx));
        self.apply_pivot(id);
        self.mark_dirty(id);
    }

    // --- pivot ---

    /// Pivot as a fraction of the content size.
    pub fn pivot(&self, id: NodeId) -> Option<Vec2> {
        self.node_opt(id).map(|n| n.pivot)
    }

    /// Horizontal pivot fraction.
    pub fn pivot_x(&self, id: NodeId) -> Option<f64> {
        self.pivot(id).map(|p| p.x)
    }

    /// Vertical pivot fraction.
    pub fn pivot_y(&self, id: NodeId) -> Option<f64> {
        self.pivot(id).map(|p| p.y)
    }

    /// Pivot point relative to the stored position, in the parent's basis
    /// (backend convention, `y` up).
    pub fn pivot_offset(&self, id: NodeId) -> Option<DVec3> {
        self.node_opt(id).map(|n| n.pivot_offset)
    }

    /// Move the pivot without moving the node on screen.
    ///
    /// ```rust
    /// use understory_display_tree::DisplayTree;
    ///
    /// let mut tree = DisplayTree::new();
    /// let n = tree.create_node();
    /// tree.set_size(n, 100.0, 50.0);
    /// tree.set_position(n, 10.0, 10.0, 0.0);
    /// tree.set_pivot(n, 0.5, 0.5);
    /// // Unrotated and unscaled: the origin stays put.
    /// assert_eq!(tree.x(n), Some(10.0));
    /// // Rotating now turns the node around its center.
    /// tree.set_rotation(n, 180.0);
    /// assert!((tree.x(n).unwrap() - 110.0).abs() < 1e-9);
    /// assert!((tree.y(n).unwrap() - 60.0).abs() < 1e-9);
    /// ```
    pub fn set_pivot(&mut self, id: NodeId, px: f64, py: f64) {
        let Some(n) = self.node_opt(id) else {
            return;
        };
        let pivot = Vec2::new(px, py);
        if n.pivot == pivot {
            return;
        }
        let delta = DVec3::new(
            (px - n.pivot.x) * n.size.width,
            (n.pivot.y - py) * n.size.height,
            0.0,
        );
        let old_offset = n.pivot_offset;
        let Some(new_offset) = self.compute_pivot_offset(id, pivot) else {
            return;
        };
        if let Some(n) = self.node_opt_mut(id) {
            n.pivot = pivot;
            n.pivot_offset = new_offset;
        }
        self.shift_position(id, old_offset - new_offset + delta);
    }

    /// Set the horizontal pivot fraction.
    pub fn set_pivot_x(&mut self, id: NodeId, px: f64) {
        if let Some(py) = self.pivot_y(id) {
            self.set_pivot(id, px, py);
        }
    }

    /// Set the vertical pivot fraction.
    pub fn set_pivot_y(&mut self, id: NodeId, py: f64) {
        if let Some(px) = self.pivot_x(id) {
            self.set_pivot(id, px, py);
        }
    }

    /// Re-anchor around the current pivot after rotation, scale, or size
    /// changed.
    pub(crate) fn apply_pivot(&mut self, id: NodeId) {
        let Some(n) = self.node_opt(id) else {
            return;
        };
        if n.pivot == Vec2::ZERO {
            return;
        }
        let (pivot, old_offset) = (n.pivot, n.pivot_offset);
        let Some(new_offset) = self.compute_pivot_offset(id, pivot) else {
            return;
        };
        if let Some(n) = self.node_opt_mut(id) {
            n.pivot_offset = new_offset;
        }
        self.shift_position(id, old_offset - new_offset);
    }

    /// `R · S · (px · w, -py · h, 0)` with the node's current rotation and scale.
    fn compute_pivot_offset(&self, id: NodeId, pivot: Vec2) -> Option<DVec3> {
        let n = self.node_opt(id)?;
        let rotation = self.graph.rotation(n.object)?;
        let scale = self.graph.scale(n.object)?;
        let local = DVec3::new(pivot.x * n.size.width, -pivot.y * n.size.height, 0.0);
        Some(euler_to_quat(rotation) * (scale * local))
    }

    fn shift_position(&mut self, id: NodeId, delta: DVec3) {
        let Some(object) = self.object_of(id) else {
            return;
        };
        if let Some(position) = self.graph.position(object) {
            self.graph.set_position(object, position + delta);
        }
        self.mark_dirty(id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn public_y_is_negated_internally() {
        let mut tree = DisplayTree::new();
        let n = tree.create_node();
        tree.set_position(n, 3.0, 4.0, 5.0);
        let object = tree.object_of(n).unwrap();
        assert_eq!(tree.graph().position(object), Some(DVec3::new(3.0, -4.0, 5.0)));
        assert_eq!((tree.x(n), tree.y(n), tree.z(n)), (Some(3.0), Some(4.0), Some(5.0)));
        tree.set_y(n, -1.0);
        assert_eq!(tree.y(n), Some(-1.0));
        assert_eq!(tree.x(n), Some(3.0));
    }

    #[test]
    fn rotation_is_negated_degrees() {
        let mut tree = DisplayTree::new();
        let n = tree.create_node();
        tree.set_rotation(n, 90.0);
        let object = tree.object_of(n).unwrap();
        let r = tree.graph().rotation(object).unwrap();
        assert!(approx(r.z, -core::f64::consts::FRAC_PI_2));
        assert!(approx(tree.rotation(n).unwrap(), 90.0));
        tree.set_rotation_x(n, 30.0);
        assert!(approx(tree.rotation_x(n).unwrap(), 30.0));
    }

    #[test]
    fn scale_mirrors_x_onto_depth() {
        let mut tree = DisplayTree::new();
        let n = tree.create_node();
        tree.set_scale(n, 2.0, 3.0);
        let object = tree.object_of(n).unwrap();
        assert_eq!(tree.graph().scale(object), Some(DVec3::new(2.0, 3.0, 2.0)));
    }

    #[test]
    fn pivot_offset_tracks_rotation_and_scale() {
        let mut tree = DisplayTree::new();
        let n = tree.create_node();
        tree.set_size(n, 100.0, 40.0);
        tree.set_pivot(n, 0.5, 0.5);
        let off = tree.pivot_offset(n).unwrap();
        assert!(approx(off.x, 50.0) && approx(off.y, -20.0), "{off:?}");
        tree.set_scale(n, 2.0, 2.0);
        let off = tree.pivot_offset(n).unwrap();
        assert!(approx(off.x, 100.0) && approx(off.y, -40.0), "{off:?}");
    }

    #[test]
    fn scaling_keeps_pivot_point_fixed() {
        let mut tree = DisplayTree::new();
        let n = tree.create_node();
        tree.set_size(n, 100.0, 100.0);
        tree.set_pivot(n, 0.5, 0.5);
        tree.set_scale(n, 2.0, 2.0);
        // Center stays at (50, 50), so the origin moves to (-50, -50).
        assert!(approx(tree.x(n).unwrap(), -50.0));
        assert!(approx(tree.y(n).unwrap(), -50.0));
    }

    #[test]
    fn resizing_keeps_pivot_point_fixed() {
        let mut tree = DisplayTree::new();
        let n = tree.create_node();
        tree.set_size(n, 100.0, 100.0);
        tree.set_pivot(n, 1.0, 1.0);
        tree.set_size(n, 50.0, 20.0);
        assert!(approx(tree.x(n).unwrap(), 50.0));
        assert!(approx(tree.y(n).unwrap(), 80.0));
    }

    #[test]
    fn position_pivot_places_the_pivot() {
        let mut tree = DisplayTree::new();
        let n = tree.create_node();
        tree.set_size(n, 20.0, 10.0);
        tree.set_pivot(n, 0.5, 0.5);
        tree.set_position_pivot(n, 100.0, 100.0, 0.0);
        assert!(approx(tree.x(n).unwrap(), 90.0));
        assert!(approx(tree.y(n).unwrap(), 95.0));
    }

    #[test]
    fn pivot_change_under_rotation_keeps_depth() {
        let mut tree = DisplayTree::new();
        let n = tree.create_node();
        tree.set_size(n, 80.0, 60.0);
        tree.set_rotation_y(n, 40.0);
        tree.set_position(n, 5.0, 6.0, 7.0);
        let z0 = tree.z(n).unwrap();
        tree.set_pivot(n, 0.3, 0.9);
        tree.set_pivot(n, 0.0, 0.0);
        assert!(approx(tree.z(n).unwrap(), z0));
    }
}
