// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Drawn content attached to a node.

use kurbo::{Affine, BezPath, Ellipse, Point, Rect, RoundedRect, Shape};

/// Outline of a node's drawn content, stretched to fill the draw rect.
#[derive(Clone, Debug, PartialEq)]
pub enum Silhouette {
    /// The whole draw rect.
    Rect,
    /// The draw rect with rounded corners.
    RoundedRect {
        /// Corner radius in local units.
        radius: f64,
    },
    /// The ellipse inscribed in the draw rect.
    Ellipse,
    /// A filled path authored inside `bounds`.
    ///
    /// `bounds` is mapped onto the draw rect, so the path scales with the node.
    /// A path with empty `bounds` is used as is.
    Path {
        /// The outline.
        path: BezPath,
        /// Reference rect the path was authored in.
        bounds: Rect,
    },
}

/// Drawn content of a node.
///
/// The tree keeps [`Graphics::draw_rect`] in sync with the node's content rect;
/// the silhouette is what [`ShapeHitTest`](crate::ShapeHitTest) tests against.
#[derive(Clone, Debug, PartialEq)]
pub struct Graphics {
    silhouette: Silhouette,
    draw_rect: Rect,
}

impl Graphics {
    /// Create graphics with an empty draw rect.
    pub fn new(silhouette: Silhouette) -> Self {
        Self {
            silhouette,
            draw_rect: Rect::ZERO,
        }
    }

    /// The outline.
    pub fn silhouette(&self) -> &Silhouette {
        &self.silhouette
    }

    /// Replace the outline.
    pub fn set_silhouette(&mut self, silhouette: Silhouette) {
        self.silhouette = silhouette;
    }

    /// Local rect the silhouette is stretched to.
    pub fn draw_rect(&self) -> Rect {
        self.draw_rect
    }

    /// Set the rect the silhouette is stretched to.
    pub fn set_draw_rect(&mut self, rect: Rect) {
        self.draw_rect = rect;
    }

    /// Whether a local point lies inside the drawn outline.
    pub fn contains(&self, pt: Point) -> bool {
        let rect = self.draw_rect;
        if rect.width() <= 0.0 || rect.height() <= 0.0 {
            return false;
        }
        match &self.silhouette {
            Silhouette::Rect => rect.contains(pt),
            Silhouette::RoundedRect { radius } => RoundedRect::from_rect(rect, *radius).contains(pt),
            Silhouette::Ellipse => Ellipse::from_rect(rect).contains(pt),
            Silhouette::Path { path, bounds } => {
                if bounds.width() <= 0.0 || bounds.height() <= 0.0 {
                    return path.contains(pt);
                }
                let to_authored = Affine::translate(bounds.origin().to_vec2())
                    * Affine::scale_non_uniform(
                        bounds.width() / rect.width(),
                        bounds.height() / rect.height(),
                    )
                    * Affine::translate(-rect.origin().to_vec2());
                path.contains(to_authored * pt)
            }
        }
    }
}
