//! Camera component
//!
//! A camera is a node like any other: its view matrix is the inverse of its
//! resolved world transform, so it can ride along the hierarchy (a camera
//! mounted on a turret, for instance).

use bevy_ecs::component::Component;
use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec4};

use super::{GlobalTransform, NodeId};

/// Camera projection type
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Projection {
    Perspective {
        fov_y: f32,
        aspect: f32,
        near: f32,
        far: f32,
    },
    Orthographic {
        left: f32,
        right: f32,
        bottom: f32,
        top: f32,
        near: f32,
        far: f32,
    },
}

impl Default for Projection {
    fn default() -> Self {
        // 2.0 is the aspect of a default 300x150 canvas
        Projection::perspective(75.0, 2.0, 0.1, 1000.0)
    }
}

impl Projection {
    /// Perspective projection; the field of view is given in degrees.
    pub fn perspective(fov_y_degrees: f32, aspect: f32, near: f32, far: f32) -> Self {
        Projection::Perspective {
            fov_y: fov_y_degrees.to_radians(),
            aspect,
            near,
            far,
        }
    }

    /// Orthographic box centred on the view axis.
    pub fn orthographic(width: f32, height: f32, near: f32, far: f32) -> Self {
        let half_w = width / 2.0;
        let half_h = height / 2.0;
        Projection::Orthographic {
            left: -half_w,
            right: half_w,
            bottom: -half_h,
            top: half_h,
            near,
            far,
        }
    }

    /// Right-handed projection matrix.
    pub fn matrix(&self) -> Mat4 {
        match self {
            Projection::Perspective {
                fov_y,
                aspect,
                near,
                far,
            } => Mat4::perspective_rh(*fov_y, *aspect, *near, *far),
            Projection::Orthographic {
                left,
                right,
                bottom,
                top,
                near,
                far,
            } => Mat4::orthographic_rh(*left, *right, *bottom, *top, *near, *far),
        }
    }

    /// Near clip distance
    pub fn near(&self) -> f32 {
        match self {
            Projection::Perspective { near, .. } => *near,
            Projection::Orthographic { near, .. } => *near,
        }
    }

    /// Far clip distance
    pub fn far(&self) -> f32 {
        match self {
            Projection::Perspective { far, .. } => *far,
            Projection::Orthographic { far, .. } => *far,
        }
    }

    /// Aspect ratio for perspective projections, `None` for orthographic.
    pub fn aspect(&self) -> Option<f32> {
        match self {
            Projection::Perspective { aspect, .. } => Some(*aspect),
            Projection::Orthographic { .. } => None,
        }
    }

    /// Sets the aspect ratio. Orthographic projections are left unchanged.
    pub fn set_aspect(&mut self, aspect: f32) {
        if let Projection::Perspective { aspect: a, .. } = self {
            *a = aspect;
        }
    }
}

/// Camera attached to a node
#[derive(Component, Debug, Clone, Copy, PartialEq, Default)]
pub struct Camera {
    pub projection: Projection,
}

impl Camera {
    /// Creates a perspective camera; the field of view is given in degrees.
    pub fn perspective(fov_y_degrees: f32, aspect: f32, near: f32, far: f32) -> Self {
        Self {
            projection: Projection::perspective(fov_y_degrees, aspect, near, far),
        }
    }

    /// Get the projection matrix
    pub fn projection_matrix(&self) -> Mat4 {
        self.projection.matrix()
    }

    /// Update aspect ratio from surface dimensions. Zero-height surfaces are ignored.
    pub fn set_aspect(&mut self, width: f32, height: f32) {
        if height > 0.0 {
            self.projection.set_aspect(width / height);
        }
    }

    /// Build camera uniform data from the camera node's resolved world transform.
    pub fn uniform_data(&self, world: &GlobalTransform) -> CameraUniformData {
        let view = world.inverse().to_matrix();
        let proj = self.projection_matrix();
        let view_proj = proj * view;

        CameraUniformData {
            view,
            proj,
            view_proj,
            inv_view: world.to_matrix(),
            inv_proj: proj.inverse(),
            position: world.translation().extend(1.0),
            near_far: Vec4::new(self.projection.near(), self.projection.far(), 0.0, 0.0),
        }
    }
}

/// Part of the output surface a view draws into.
///
/// Coordinates are fractions of the surface with the origin at the bottom-left
/// corner, so a viewport survives resizes unchanged.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    /// X offset (0-1 normalized).
    pub x: f32,
    /// Y offset from the bottom edge (0-1 normalized).
    pub y: f32,
    /// Width (0-1 normalized).
    pub width: f32,
    /// Height (0-1 normalized).
    pub height: f32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self::FULL
    }
}

impl Viewport {
    /// Full viewport covering the entire surface.
    pub const FULL: Self = Self::new(0.0, 0.0, 1.0, 1.0);
    pub const LEFT_HALF: Self = Self::new(0.0, 0.0, 0.5, 1.0);
    pub const RIGHT_HALF: Self = Self::new(0.5, 0.0, 0.5, 1.0);

    /// Creates a viewport with the given normalized coordinates.
    #[inline]
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Non-empty and inside the unit square.
    pub fn is_valid(&self) -> bool {
        const EPSILON: f32 = 1e-6;
        self.width > 0.0
            && self.height > 0.0
            && self.x >= 0.0
            && self.y >= 0.0
            && self.x + self.width <= 1.0 + EPSILON
            && self.y + self.height <= 1.0 + EPSILON
    }

    /// Pixel rectangle `(x, y, width, height)` on a surface of the given size.
    ///
    /// Edges are rounded to whole pixels, so neighbouring viewports share an
    /// edge without a gap.
    pub fn to_pixels(&self, target_width: u32, target_height: u32) -> (u32, u32, u32, u32) {
        let (w, h) = (target_width as f32, target_height as f32);
        let left = (self.x * w).round();
        let bottom = (self.y * h).round();
        let right = ((self.x + self.width) * w).round().min(w);
        let top = ((self.y + self.height) * h).round().min(h);
        (
            left as u32,
            bottom as u32,
            (right - left).max(0.0) as u32,
            (top - bottom).max(0.0) as u32,
        )
    }

    /// Returns the aspect ratio of this viewport, `None` when it has no height.
    #[inline]
    pub fn aspect_ratio(&self, target_width: u32, target_height: u32) -> Option<f32> {
        let w = self.width * target_width as f32;
        let h = self.height * target_height as f32;
        (h > 0.0).then(|| w / h)
    }
}

/// A camera node drawing into a viewport
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct View {
    pub camera: NodeId,
    pub viewport: Viewport,
}

impl View {
    pub fn full(camera: NodeId) -> Self {
        Self {
            camera,
            viewport: Viewport::FULL,
        }
    }
}

/// Camera uniform data handed across the renderer boundary
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct CameraUniformData {
    pub view: Mat4,
    pub proj: Mat4,
    pub view_proj: Mat4,
    pub inv_view: Mat4,
    pub inv_proj: Mat4,
    pub position: Vec4,
    pub near_far: Vec4,
}
