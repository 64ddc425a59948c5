// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Custom hit-test strategies.

use kurbo::{Point, Rect};

use crate::tree::DisplayTree;
use crate::types::NodeId;

/// Decides whether a local point hits a node.
///
/// When a node has a hit area, the area replaces both the clip-rect early
/// reject and the content-rect test of the opaque fallback.
pub trait HitArea: core::fmt::Debug {
    /// Whether `local` (in the node's local space) is a hit.
    ///
    /// `content_rect` is the node's untransformed content rect.
    fn hit_test(&self, tree: &DisplayTree, content_rect: Rect, local: Point) -> bool;
}

/// Hit inside a fixed local rect, or inside the content rect.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct RectHitTest {
    /// Rect to test against; `None` means the node's content rect.
    pub rect: Option<Rect>,
}

impl RectHitTest {
    /// Hit area that follows the content rect.
    pub const fn content() -> Self {
        Self { rect: None }
    }

    /// Hit area fixed to `rect`.
    pub const fn new(rect: Rect) -> Self {
        Self { rect: Some(rect) }
    }
}

impl HitArea for RectHitTest {
    fn hit_test(&self, _tree: &DisplayTree, content_rect: Rect, local: Point) -> bool {
        self.rect.unwrap_or(content_rect).contains(local)
    }
}

/// Hit against the drawn outline of another node.
///
/// The point is taken from the space of the shape's parent into the shape's
/// own space, then tested against its [`Graphics`](crate::Graphics)
/// silhouette. A shape without graphics is never hit. Typically the shape is a
/// child of the node that uses it, so the node's local space is the shape's
/// parent space.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ShapeHitTest {
    /// Node providing the silhouette.
    pub shape: NodeId,
}

impl ShapeHitTest {
    /// Hit area following `shape`'s outline.
    pub const fn new(shape: NodeId) -> Self {
        Self { shape }
    }
}

impl HitArea for ShapeHitTest {
    fn hit_test(&self, tree: &DisplayTree, _content_rect: Rect, local: Point) -> bool {
        let Some(graphics) = tree.graphics(self.shape) else {
            return false;
        };
        let Some(object) = tree.object_of(self.shape) else {
            return false;
        };
        let local = match tree.parent(self.shape).and_then(|p| tree.object_of(p)) {
            Some(parent) => match tree.map_point(parent, local, Some(object)) {
                Some(p) => p,
                None => return false,
            },
            None => local,
        };
        graphics.contains(local)
    }
}
