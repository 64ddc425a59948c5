// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Rays and planes.

use glam::DVec3;

/// A plane `normal · p + constant = 0`.
///
/// Points with a positive [`Plane::distance_to_point`] lie on the side the
/// normal points to. Renderers treat that side as the kept side of a clip plane.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Plane {
    /// Unit normal.
    pub normal: DVec3,
    /// Signed offset along the normal.
    pub constant: f64,
}

impl Plane {
    /// The `z = 0` plane, facing `+z`.
    pub const XY: Self = Self {
        normal: DVec3::Z,
        constant: 0.0,
    };

    /// Create a plane from a normal and constant.
    pub const fn new(normal: DVec3, constant: f64) -> Self {
        Self { normal, constant }
    }

    /// Plane through `point` with the given normal.
    pub fn from_normal_and_coplanar_point(normal: DVec3, point: DVec3) -> Self {
        Self {
            normal,
            constant: -point.dot(normal),
        }
    }

    /// Signed distance from the plane to `point`.
    #[inline]
    pub fn distance_to_point(&self, point: DVec3) -> f64 {
        self.normal.dot(point) + self.constant
    }
}

/// A half-line `origin + t * direction`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Ray {
    /// Start of the ray.
    pub origin: DVec3,
    /// Direction (not required to be normalized).
    pub direction: DVec3,
}

impl Ray {
    /// Create a ray.
    pub const fn new(origin: DVec3, direction: DVec3) -> Self {
        Self { origin, direction }
    }

    /// Point at parameter `t`.
    #[inline]
    pub fn at(&self, t: f64) -> DVec3 {
        self.origin + self.direction * t
    }

    /// Parameter where the supporting line meets `plane`, which may be negative.
    ///
    /// Returns `Some(0.0)` when the ray lies in the plane and `None` when it is
    /// parallel to the plane without touching it.
    pub fn plane_parameter(&self, plane: &Plane) -> Option<f64> {
        let denom = plane.normal.dot(self.direction);
        if denom == 0.0 {
            return (plane.distance_to_point(self.origin) == 0.0).then_some(0.0);
        }
        Some(-plane.distance_to_point(self.origin) / denom)
    }

    /// Intersection with `plane` in front of the origin.
    pub fn intersect_plane(&self, plane: &Plane) -> Option<DVec3> {
        let t = self.plane_parameter(plane)?;
        (t >= 0.0).then(|| self.at(t))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ray_hits_plane_in_front_only() {
        let ray = Ray::new(DVec3::new(1.0, 2.0, 10.0), DVec3::NEG_Z);
        assert_eq!(ray.intersect_plane(&Plane::XY), Some(DVec3::new(1.0, 2.0, 0.0)));

        let away = Ray::new(DVec3::new(1.0, 2.0, 10.0), DVec3::Z);
        assert_eq!(away.plane_parameter(&Plane::XY), Some(-10.0));
        assert_eq!(away.intersect_plane(&Plane::XY), None);
    }

    #[test]
    fn parallel_ray_misses() {
        let ray = Ray::new(DVec3::new(0.0, 0.0, 1.0), DVec3::X);
        assert_eq!(ray.plane_parameter(&Plane::XY), None);
        let inside = Ray::new(DVec3::ZERO, DVec3::X);
        assert_eq!(inside.plane_parameter(&Plane::XY), Some(0.0));
    }

    #[test]
    fn coplanar_point_constant() {
        let plane = Plane::from_normal_and_coplanar_point(DVec3::X, DVec3::new(5.0, 1.0, 1.0));
        assert_eq!(plane.constant, -5.0);
        assert_eq!(plane.distance_to_point(DVec3::new(7.0, 0.0, 0.0)), 2.0);
        assert_eq!(plane.distance_to_point(DVec3::new(3.0, 0.0, 0.0)), -2.0);
    }
}
