// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=understory_object3d --heading-base-level=0

//! Understory Object3D: a minimal 3D object graph.
//!
//! This crate is the storage and math layer that 2D display trees are built on.
//! It owns transforms and hierarchy, but knows nothing about 2D conventions such
//! as a downward `y` axis, pivots, or content rectangles.
//!
//! - [`Graph`]: arena of objects with generational [`ObjectId`] handles, ordered
//!   children, translation, XYZ Euler rotation, scale, visibility, [`Layers`], and names.
//! - [`Graph::update_matrix_world`]: recomposes a subtree's local and world matrices.
//!   World matrices are cached and read by [`Graph::world_to_local`],
//!   [`Graph::world_direction_to_local`], [`Graph::local_to_world`], and
//!   [`Graph::world_quaternion`].
//! - [`Ray`] and [`Plane`]: the primitives used for picking and clipping.
//! - [`Camera`]: orthographic or perspective projection with
//!   [`Camera::screen_to_world`] and [`Camera::world_to_screen`].
//!
//! All math is `f64` and uses [`glam`]; screen-space values use [`kurbo`].
//!
//! ```rust
//! use glam::DVec3;
//! use kurbo::{Point, Size};
//! use understory_object3d::{Camera, Graph, Plane};
//!
//! let mut graph = Graph::new();
//! let scene = graph.create_scene();
//! let panel = graph.create();
//! graph.insert_child(scene, 0, panel);
//! graph.set_position(panel, DVec3::new(100.0, -50.0, 0.0));
//! graph.update_matrix_world(scene);
//!
//! // Pick through the default UI camera and express the hit in panel space.
//! let camera = Camera::ui(Size::new(800.0, 600.0));
//! let ray = camera.screen_to_world(Point::new(110.0, 60.0));
//! let world = ray.intersect_plane(&Plane::XY).unwrap();
//! let local = graph.world_to_local(panel, world).unwrap();
//! assert!((local - DVec3::new(10.0, -10.0, 0.0)).length() < 1e-9);
//! ```
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

mod camera;
mod geometry;
mod graph;
mod types;

pub use camera::{Camera, Projection};
pub use geometry::{Plane, Ray};
pub use graph::{Ancestors, Graph, compose_trs, euler_to_quat};
pub use types::{Layers, ObjectId};

pub use glam;
