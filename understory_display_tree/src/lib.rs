// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=understory_display_tree --heading-base-level=0

//! Understory Display Tree: 2D display nodes on top of a 3D object graph.
//!
//! UI code wants `x`/`y` with `y` growing downward, rotation and scale about a
//! pivot, a content rect, rectangular clips, and front-to-back picking. Renderers
//! want a `y`-up 3D object tree with world matrices. This crate sits between the
//! two: every node wraps an object of an [`understory_object3d::Graph`] and
//! translates 2D semantics into backend transforms.
//!
//! - Transform: position, rotation (degrees, clockwise on screen), scale, and a
//!   fractional pivot. Changing the pivot never moves the node; changing rotation,
//!   scale, or size keeps the pivot point fixed.
//! - Coordinates: [`DisplayTree::world_to_local`], [`DisplayTree::local_to_world`],
//!   [`DisplayTree::global_to_local`], [`DisplayTree::local_to_global`], and
//!   [`DisplayTree::transform_point`]. Points that are not on a node's content
//!   plane are projected onto it along the view direction.
//! - Bounds: [`DisplayTree::get_bounds`] and [`DisplayTree::transform_rect`] with a
//!   closed form for unrotated nodes in their parent; otherwise a loose AABB of
//!   the transformed corners.
//! - Clipping: [`DisplayTree::update`] and [`DisplayTree::traverse_update`]
//!   intersect each clip rect with the inherited clip and publish four world
//!   [`ClipPlanes`] plus the composed alpha as a [`RenderState`].
//! - Picking: [`DisplayTree::pick`] and [`DisplayTree::hit_test`] walk children
//!   front to back, honoring visibility, touch flags, masks, custom
//!   [`HitArea`]s, and per-subtree camera overrides.
//! - Composition: `add_child`/`remove_child`/`set_child_index` with
//!   [`StageEvent`] notifications when subtrees enter or leave the stage.
//!
//! ## Lazy matrices
//!
//! Setters only mark nodes dirty. Conversions and picks validate the ancestor
//! chain first: dirty ancestors are recomposed root first, then the node itself.
//! Batch code can validate once and switch this off with
//! [`DisplayTree::set_matrix_validation_disabled`].
//!
//! ## Example
//!
//! ```rust
//! use kurbo::Point;
//! use understory_display_tree::DisplayTree;
//!
//! let mut tree = DisplayTree::new();
//! let stage = tree.stage();
//!
//! let card = tree.create_node();
//! tree.set_size(card, 100.0, 60.0);
//! tree.set_pivot(card, 0.5, 0.5);
//! tree.set_position_pivot(card, 200.0, 200.0, 0.0);
//! tree.set_rotation(card, 90.0);
//! tree.set_opaque(card, true);
//! tree.add_child(stage, card).unwrap();
//!
//! // Turned a quarter around its center: now 60 wide and 100 tall.
//! assert_eq!(tree.pick(Point::new(200.0, 245.0), false), Some(card));
//! assert_eq!(tree.pick(Point::new(245.0, 200.0), false), None);
//!
//! let local = tree.global_to_local(card, Point::new(200.0, 200.0)).unwrap();
//! assert!((local - Point::new(50.0, 30.0)).hypot() < 1e-9);
//! ```
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

mod bounds;
mod clip;
mod compose;
mod coords;
mod error;
mod events;
mod graphics;
mod hit_area;
mod options;
mod transform;
mod tree;
mod types;

pub use clip::{ClipPlanes, RenderState};
pub use error::DisplayError;
pub use events::{ListenerId, StageEvent};
pub use graphics::{Graphics, Silhouette};
pub use hit_area::{HitArea, RectHitTest, ShapeHitTest};
pub use hit_test::HitTestContext;
pub use options::StageOptions;
pub use tree::DisplayTree;
pub use types::{NodeFlags, NodeId};

pub use understory_object3d;
