// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Cameras and screen projection.

use glam::{DMat4, DVec3};
use kurbo::{Point, Size};

use crate::geometry::Ray;
use crate::types::Layers;

/// Projection of a [`Camera`].
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Projection {
    /// Parallel projection of the view-space box.
    Orthographic {
        /// Left edge of the view volume.
        left: f64,
        /// Right edge of the view volume.
        right: f64,
        /// Bottom edge of the view volume.
        bottom: f64,
        /// Top edge of the view volume.
        top: f64,
        /// Near clip distance.
        near: f64,
        /// Far clip distance.
        far: f64,
    },
    /// Pinhole projection; the aspect ratio follows the camera viewport.
    Perspective {
        /// Vertical field of view in radians.
        fov_y: f64,
        /// Near clip distance.
        near: f64,
        /// Far clip distance.
        far: f64,
    },
}

/// A camera looking down its local `-z` axis.
///
/// Screen coordinates are in viewport pixels with the origin at the top left
/// and `y` growing downward.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Camera {
    /// How view space maps to clip space.
    pub projection: Projection,
    /// Camera-to-world matrix.
    pub world: DMat4,
    /// Size of the screen area the camera renders into.
    pub viewport: Size,
    /// Layers the camera renders.
    pub layers: Layers,
}

impl Camera {
    /// Default near plane of [`Camera::ui`].
    pub const UI_NEAR: f64 = 0.1;
    /// Default far plane of [`Camera::ui`].
    pub const UI_FAR: f64 = 2000.0;
    /// Distance of the [`Camera::ui`] eye from the `z = 0` plane.
    pub const UI_EYE_Z: f64 = 1000.0;

    /// Orthographic camera for 2D content.
    ///
    /// One world unit equals one pixel. Screen `(x, y)` maps to world
    /// `(x, -y)` on the `z = 0` plane.
    ///
    /// ```rust
    /// use glam::DVec3;
    /// use kurbo::{Point, Size};
    /// use understory_object3d::Camera;
    ///
    /// let camera = Camera::ui(Size::new(800.0, 600.0));
    /// let screen = camera.world_to_screen(DVec3::new(120.0, -40.0, 0.0));
    /// assert!((screen - Point::new(120.0, 40.0)).hypot() < 1e-9);
    /// ```
    pub fn ui(viewport: Size) -> Self {
        Self {
            projection: Projection::Orthographic {
                left: 0.0,
                right: viewport.width,
                bottom: -viewport.height,
                top: 0.0,
                near: Self::UI_NEAR,
                far: Self::UI_FAR,
            },
            world: DMat4::from_translation(DVec3::new(0.0, 0.0, Self::UI_EYE_Z)),
            viewport,
            layers: Layers::default(),
        }
    }

    /// Perspective camera placed by `world`.
    pub fn perspective(fov_y: f64, near: f64, far: f64, world: DMat4, viewport: Size) -> Self {
        Self {
            projection: Projection::Perspective { fov_y, near, far },
            world,
            viewport,
            layers: Layers::default(),
        }
    }

    /// Replace the viewport, keeping a [`Camera::ui`] volume in sync with it.
    pub fn set_viewport(&mut self, viewport: Size) {
        if let Projection::Orthographic {
            right,
            bottom,
            left,
            top,
            ..
        } = &mut self.projection
            && *left == 0.0
            && *top == 0.0
            && *right == self.viewport.width
            && *bottom == -self.viewport.height
        {
            *right = viewport.width;
            *bottom = -viewport.height;
        }
        self.viewport = viewport;
    }

    /// View-to-clip matrix.
    pub fn projection_matrix(&self) -> DMat4 {
        match self.projection {
            Projection::Orthographic {
                left,
                right,
                bottom,
                top,
                near,
                far,
            } => DMat4::orthographic_rh(left, right, bottom, top, near, far),
            Projection::Perspective { fov_y, near, far } => {
                let aspect = if self.viewport.height > 0.0 {
                    self.viewport.width / self.viewport.height
                } else {
                    1.0
                };
                DMat4::perspective_rh(fov_y, aspect, near, far)
            }
        }
    }

    /// World-to-clip matrix.
    pub fn view_projection(&self) -> DMat4 {
        self.projection_matrix() * self.world.inverse()
    }

    /// Camera position in world space.
    pub fn eye(&self) -> DVec3 {
        self.world.transform_point3(DVec3::ZERO)
    }

    /// Ray through a screen point, starting on the near plane.
    pub fn screen_to_world(&self, screen: Point) -> Ray {
        let (nx, ny) = self.screen_to_ndc(screen);
        let inverse = self.view_projection().inverse();
        let near = inverse.project_point3(DVec3::new(nx, ny, 0.0));
        let far = inverse.project_point3(DVec3::new(nx, ny, 1.0));
        Ray::new(near, (far - near).normalize_or_zero())
    }

    /// Project a world point onto the screen.
    pub fn world_to_screen(&self, world: DVec3) -> Point {
        let ndc = self.view_projection().project_point3(world);
        Point::new(
            (ndc.x + 1.0) * 0.5 * self.viewport.width,
            (1.0 - ndc.y) * 0.5 * self.viewport.height,
        )
    }

    fn screen_to_ndc(&self, screen: Point) -> (f64, f64) {
        let w = if self.viewport.width > 0.0 {
            self.viewport.width
        } else {
            1.0
        };
        let h = if self.viewport.height > 0.0 {
            self.viewport.height
        } else {
            1.0
        };
        (screen.x / w * 2.0 - 1.0, 1.0 - screen.y / h * 2.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Plane;

    fn approx(a: DVec3, b: DVec3) -> bool {
        (a - b).abs().max_element() < 1e-6
    }

    #[test]
    fn ui_camera_maps_screen_to_negated_world_y() {
        let camera = Camera::ui(Size::new(1920.0, 1080.0));
        let ray = camera.screen_to_world(Point::new(300.0, 200.0));
        assert!(approx(ray.direction, DVec3::NEG_Z), "{:?}", ray.direction);
        let hit = ray.intersect_plane(&Plane::XY).unwrap();
        assert!(approx(hit, DVec3::new(300.0, -200.0, 0.0)), "{hit:?}");
    }

    #[test]
    fn ui_camera_round_trips() {
        let camera = Camera::ui(Size::new(640.0, 480.0));
        let p = Point::new(17.5, 402.0);
        let ray = camera.screen_to_world(p);
        let back = camera.world_to_screen(ray.origin);
        assert!((back - p).hypot() < 1e-6);
    }

    #[test]
    fn viewport_change_resizes_ui_volume() {
        let mut camera = Camera::ui(Size::new(100.0, 100.0));
        camera.set_viewport(Size::new(200.0, 50.0));
        assert_eq!(camera, Camera::ui(Size::new(200.0, 50.0)));
    }

    #[test]
    fn perspective_center_ray_points_forward() {
        let world = DMat4::from_translation(DVec3::new(0.0, 0.0, 500.0));
        let camera = Camera::perspective(
            core::f64::consts::FRAC_PI_4,
            1.0,
            5000.0,
            world,
            Size::new(800.0, 600.0),
        );
        let ray = camera.screen_to_world(Point::new(400.0, 300.0));
        assert!(approx(ray.direction, DVec3::NEG_Z));
        let hit = ray.intersect_plane(&Plane::XY).unwrap();
        assert!(approx(hit, DVec3::ZERO), "{hit:?}");
        let screen = camera.world_to_screen(DVec3::ZERO);
        assert!((screen - Point::new(400.0, 300.0)).hypot() < 1e-6);
    }
}
