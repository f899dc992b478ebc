//! Projection and model transforms for the stereo camera.
//!
//! All functions here are pure: the scene renderer feeds them the current
//! pose and eye offset and uploads the results as shader uniforms.

use std::f32::consts::TAU;

use cgmath::{Matrix4, Rad, Vector3};

use crate::config::DemoConfig;

/// cgmath builds OpenGL clip space (z in [-1, 1]); wgpu wants z in [0, 1].
#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: Matrix4<f32> = Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
);

/// Wraps an angle into `[0, 2π)`.
///
/// Works for arbitrarily negative input, unlike adding one period before
/// taking the remainder.
pub fn wrap_angle(angle: f32) -> f32 {
    let wrapped = angle.rem_euclid(TAU);
    // rem_euclid rounds tiny negatives up to exactly TAU
    if wrapped >= TAU { 0.0 } else { wrapped }
}

/// Parameters of an off-axis stereo perspective.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StereoPerspective {
    pub fovy: Rad<f32>,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    /// Distance at which both eyes see the same image.
    pub convergence: f32,
}

impl StereoPerspective {
    pub fn from_config(config: &DemoConfig) -> Self {
        Self {
            fovy: config.fovy.into(),
            aspect: config.display.aspect_ratio(),
            near: config.near,
            far: config.far,
            convergence: config.convergence,
        }
    }

    /// Projection for one eye.
    ///
    /// `eye_offset` is the interocular distance, signed by eye: the camera sits
    /// at `x = eye_offset / 2` and the frustum is sheared so the plane at
    /// `convergence` stays centered for both eyes.
    pub fn projection(&self, eye_offset: f32) -> Matrix4<f32> {
        let half = eye_offset / 2.0;
        let top = self.near * (self.fovy.0 / 2.0).tan();
        let right = top * self.aspect;
        let shift = half * self.near / self.convergence;

        let frustum = cgmath::frustum(
            -right - shift,
            right - shift,
            -top,
            top,
            self.near,
            self.far,
        );
        OPENGL_TO_WGPU_MATRIX * frustum * Matrix4::from_translation(Vector3::new(-half, 0.0, 0.0))
    }
}

/// Peak tilt about the view axis while bouncing, in radians.
pub const BOUNCE_TILT: f32 = 0.25;
/// Peak hop height while bouncing, in model units.
pub const BOUNCE_HEIGHT: f32 = 4.0;

/// Orientation of the model for one frame.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ModelPose {
    /// Tilt towards or away from the viewer.
    pub angle_x: f32,
    /// Rotation around the vertical axis.
    pub angle_y: f32,
    /// Phase of the bounce; 0 is at rest.
    pub bounce: f32,
}

impl ModelPose {
    /// Upright, not bouncing, turned by `angle_y`.
    pub fn turned(angle_y: f32) -> Self {
        Self {
            angle_y,
            ..Default::default()
        }
    }
}

/// Places the model in front of the camera, applies the bounce, then tilts
/// and turns it.
///
/// The bounce rocks the model about the view axis and lifts it by
/// `|sin(bounce)|`, so it lands once per half period.
pub fn model_view(translation: Vector3<f32>, pose: &ModelPose) -> Matrix4<f32> {
    let bounce = pose.bounce.sin();
    Matrix4::from_translation(translation)
        * Matrix4::from_angle_z(Rad(bounce * BOUNCE_TILT))
        * Matrix4::from_translation(Vector3::new(0.0, bounce.abs() * BOUNCE_HEIGHT, 0.0))
        * Matrix4::from_angle_x(Rad(pose.angle_x))
        * Matrix4::from_angle_y(Rad(pose.angle_y))
}

/// GPU layout of the scene shader's uniform block.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct SceneUniform {
    pub projection: [[f32; 4]; 4],
    pub model_view: [[f32; 4]; 4],
    /// `xyz` is the view-space direction towards the light, `w` the share of
    /// the colour that depends on it.
    pub light: [f32; 4],
}

impl SceneUniform {
    pub fn new(projection: Matrix4<f32>, model_view: Matrix4<f32>, light: [f32; 4]) -> Self {
        Self {
            projection: projection.into(),
            model_view: model_view.into(),
            light,
        }
    }
}
