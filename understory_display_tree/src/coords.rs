// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Coordinate conversion between local, world, and screen spaces.
//!
//! *World* here is the backend's space (`y` up). *Local* is a node's own space
//! in screen convention (`y` down, origin at the content's top-left corner).
//! *Global* is screen pixels as seen through the node's render camera.

use glam::DVec3;
use kurbo::Point;
use understory_object3d::{Camera, ObjectId, Plane, Ray};

use crate::tree::DisplayTree;
use crate::types::NodeId;

impl DisplayTree {
    /// Convert a world point into the node's local space.
    ///
    /// When the point does not land on the node's `z = 0` plane it is slid
    /// along `direction` (default `+z`, taken into the node's frame) onto that
    /// plane, so flat input still hits content that is offset or tilted in depth.
    pub fn world_to_local(
        &mut self,
        id: NodeId,
        world: DVec3,
        direction: Option<DVec3>,
    ) -> Option<DVec3> {
        self.validate_if_enabled(id);
        self.project_to_local(self.object_of(id)?, world, direction)
    }

    /// Convert a local point into world space.
    pub fn local_to_world(&mut self, id: NodeId, local: DVec3) -> Option<DVec3> {
        self.validate_if_enabled(id);
        self.graph
            .local_to_world(self.object_of(id)?, DVec3::new(local.x, -local.y, local.z))
    }

    /// Convert a screen point into the node's local space through its render
    /// camera.
    pub fn global_to_local(&mut self, id: NodeId, screen: Point) -> Option<Point> {
        self.validate_if_enabled(id);
        let ray = self.render_camera(id).screen_to_world(screen);
        let local = self.project_to_local(self.object_of(id)?, ray.origin, Some(ray.direction))?;
        Some(Point::new(local.x, local.y))
    }

    /// Convert a local point into screen space through the node's render camera.
    pub fn local_to_global(&mut self, id: NodeId, local: Point) -> Option<Point> {
        self.validate_if_enabled(id);
        let world = self
            .graph
            .local_to_world(self.object_of(id)?, DVec3::new(local.x, -local.y, 0.0))?;
        Some(self.render_camera(id).world_to_screen(world))
    }

    /// Map a local point into `target`'s local space, or into world space with
    /// `y` pointing down when `target` is `None`.
    ///
    /// The mapping is a plain change of basis; depth is dropped rather than
    /// projected.
    pub fn transform_point(
        &mut self,
        id: NodeId,
        point: Point,
        target: Option<NodeId>,
    ) -> Option<Point> {
        if target == Some(id) {
            return self.is_alive(id).then_some(point);
        }
        self.validate_if_enabled(id);
        if let Some(t) = target {
            self.validate_if_enabled(t);
        }
        let target = match target {
            Some(t) => Some(self.object_of(t)?),
            None => None,
        };
        self.map_point(self.object_of(id)?, point, target)
    }

    /// Camera used to draw the node: the nearest override on the node or its
    /// ancestors, else the default camera.
    pub fn render_camera(&self, id: NodeId) -> Camera {
        let Some(object) = self.object_of(id) else {
            return self.camera;
        };
        core::iter::once(object)
            .chain(self.graph.ancestors(object))
            .filter_map(|o| self.owner_of(o))
            .find_map(|n| self.camera(n))
            .unwrap_or(self.camera)
    }

    /// World to local without validation, with the depth correction and the
    /// `y` flip.
    pub(crate) fn project_to_local(
        &self,
        object: ObjectId,
        world: DVec3,
        direction: Option<DVec3>,
    ) -> Option<DVec3> {
        let mut local = self.graph.world_to_local(object, world)?;
        if local.z != 0.0 {
            let dir = self
                .graph
                .world_direction_to_local(object, direction.unwrap_or(DVec3::Z))?;
            if let Some(t) = Ray::new(local, dir).plane_parameter(&Plane::XY) {
                local = Ray::new(local, dir).at(t);
            }
        }
        local.y = -local.y;
        Some(local)
    }

    /// Local point of `from` into local space of `to` (or `y`-down world),
    /// without validation.
    pub(crate) fn map_point(
        &self,
        from: ObjectId,
        point: Point,
        to: Option<ObjectId>,
    ) -> Option<Point> {
        let world = self
            .graph
            .local_to_world(from, DVec3::new(point.x, -point.y, 0.0))?;
        let mapped = match to {
            Some(to) => self.graph.world_to_local(to, world)?,
            None => world,
        };
        Some(Point::new(mapped.x, -mapped.y))
    }
}
