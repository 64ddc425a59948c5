// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Rectangle transforms and bounds.

use glam::DVec3;
use kurbo::{Point, Rect};
use understory_object3d::ObjectId;

use crate::tree::DisplayTree;
use crate::types::NodeId;

impl DisplayTree {
    /// Bounds of the node's content rect in `target`'s space (or `y`-down
    /// world space for `None`).
    ///
    /// Rotated content yields the axis-aligned box around the transformed
    /// corners, which is larger than the content itself.
    pub fn get_bounds(&mut self, id: NodeId, target: Option<NodeId>) -> Option<Rect> {
        let content = self.content_rect(id)?;
        if target == Some(id) {
            return Some(content);
        }
        self.transform_rect(id, content, target)
    }

    /// Map a local rect into `target`'s space (or `y`-down world space for
    /// `None`) and return the axis-aligned box around the result.
    pub fn transform_rect(
        &mut self,
        id: NodeId,
        rect: Rect,
        target: Option<NodeId>,
    ) -> Option<Rect> {
        if target == Some(id) {
            return self.is_alive(id).then_some(rect);
        }
        let object = self.object_of(id)?;
        let target_object = match target {
            Some(t) => Some(self.object_of(t)?),
            None => None,
        };
        if let Some(fast) = self.axis_aligned_in_parent(object, rect, target_object) {
            return Some(fast);
        }

        self.validate_if_enabled(id);
        if let Some(t) = target {
            self.validate_if_enabled(t);
        }
        self.corner_bounds(object, rect, target_object)
    }

    /// Closed form for an unrotated node mapped into its direct parent.
    fn axis_aligned_in_parent(
        &self,
        object: ObjectId,
        rect: Rect,
        target: Option<ObjectId>,
    ) -> Option<Rect> {
        let parent = self.graph.parent(object)?;
        if target != Some(parent) || self.graph.rotation(object)? != DVec3::ZERO {
            return None;
        }
        let position = self.graph.position(object)?;
        let scale = self.graph.scale(object)?;
        let (x, y) = (position.x, -position.y);
        Some(
            Rect::new(
                x + rect.x0 * scale.x,
                y + rect.y0 * scale.y,
                x + rect.x1 * scale.x,
                y + rect.y1 * scale.y,
            )
            .abs(),
        )
    }

    /// Axis-aligned box around the four mapped corners.
    pub(crate) fn corner_bounds(
        &self,
        object: ObjectId,
        rect: Rect,
        target: Option<ObjectId>,
    ) -> Option<Rect> {
        let corners = [
            Point::new(rect.x0, rect.y0),
            Point::new(rect.x1, rect.y0),
            Point::new(rect.x0, rect.y1),
            Point::new(rect.x1, rect.y1),
        ];
        let mut out = Rect::new(
            f64::INFINITY,
            f64::INFINITY,
            f64::NEG_INFINITY,
            f64::NEG_INFINITY,
        );
        for corner in corners {
            let p = self.map_point(object, corner, target)?;
            out.x0 = out.x0.min(p.x);
            out.y0 = out.y0.min(p.y);
            out.x1 = out.x1.max(p.x);
            out.y1 = out.y1.max(p.y);
        }
        Some(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: Rect, b: Rect) -> bool {
        (a.x0 - b.x0).abs() < 1e-9
            && (a.y0 - b.y0).abs() < 1e-9
            && (a.x1 - b.x1).abs() < 1e-9
            && (a.y1 - b.y1).abs() < 1e-9
    }

    #[test]
    fn own_space_is_content_rect() {
        let mut tree = DisplayTree::new();
        let n = tree.create_node();
        tree.set_size(n, 30.0, 20.0);
        tree.set_rotation(n, 33.0);
        assert_eq!(tree.get_bounds(n, Some(n)), Some(Rect::new(0.0, 0.0, 30.0, 20.0)));
    }

    #[test]
    fn parent_fast_path_handles_negative_scale() {
        let mut tree = DisplayTree::new();
        let stage = tree.stage();
        let n = tree.create_node();
        tree.add_child(stage, n).unwrap();
        tree.set_size(n, 10.0, 10.0);
        tree.set_position(n, 100.0, 100.0, 0.0);
        tree.set_scale(n, -1.0, 2.0);
        let bounds = tree.get_bounds(n, Some(stage)).unwrap();
        assert_eq!(bounds, Rect::new(90.0, 100.0, 100.0, 120.0));
    }

    #[test]
    fn rotated_bounds_are_conservative() {
        let mut tree = DisplayTree::new();
        let stage = tree.stage();
        let n = tree.create_node();
        tree.add_child(stage, n).unwrap();
        tree.set_size(n, 100.0, 100.0);
        tree.set_pivot(n, 0.5, 0.5);
        tree.set_rotation(n, 45.0);
        let bounds = tree.get_bounds(n, Some(stage)).unwrap();
        let half = 50.0 * core::f64::consts::SQRT_2;
        assert!(
            close(bounds, Rect::new(50.0 - half, 50.0 - half, 50.0 + half, 50.0 + half)),
            "{bounds:?}"
        );
    }

    #[test]
    fn rect_into_grandparent_composes() {
        let mut tree = DisplayTree::new();
        let stage = tree.stage();
        let outer = tree.create_node();
        let inner = tree.create_node();
        tree.add_child(stage, outer).unwrap();
        tree.add_child(outer, inner).unwrap();
        tree.set_position(outer, 10.0, 20.0, 0.0);
        tree.set_scale(outer, 2.0, 2.0);
        tree.set_position(inner, 5.0, 5.0, 0.0);
        let r = tree
            .transform_rect(inner, Rect::new(0.0, 0.0, 10.0, 5.0), Some(stage))
            .unwrap();
        assert!(close(r, Rect::new(20.0, 30.0, 40.0, 40.0)), "{r:?}");
        let world = tree.transform_rect(inner, Rect::new(0.0, 0.0, 10.0, 5.0), None).unwrap();
        assert!(close(world, r), "{world:?}");
    }
}
