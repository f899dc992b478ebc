//! Tunables for the demo.
//!
//! There is no config file: everything lives in [`DemoConfig::default`] and is
//! threaded explicitly into the renderer, the frame controller and the loop.

use cgmath::{Deg, Vector3};

/// Per-eye resolution and window presentation.
#[derive(Debug, Clone)]
pub struct DisplayConfig {
    pub title: String,
    /// Width of one eye's render target in pixels.
    pub eye_width: u32,
    /// Height of one eye's render target in pixels.
    pub eye_height: u32,
    /// Integer upscale applied when the eyes are shown in the window.
    pub window_scale: u32,
    pub vsync: bool,
}

impl DisplayConfig {
    pub fn aspect_ratio(&self) -> f32 {
        self.eye_width as f32 / self.eye_height as f32
    }

    /// Window size fitting both eyes side by side.
    pub fn window_size(&self) -> (u32, u32) {
        (
            2 * self.eye_width * self.window_scale,
            self.eye_height * self.window_scale,
        )
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            title: "Maxwell (stereo)".to_string(),
            eye_width: 400,
            eye_height: 240,
            window_scale: 2,
            vsync: true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DemoConfig {
    pub display: DisplayConfig,
    pub initial_angle: f32,
    /// Radians added or removed per frame while a d-pad direction is held.
    pub angle_step: f32,
    /// Radians added per frame while auto-spin is on.
    pub spin_step: f32,
    /// Bounce phase added per frame while bouncing.
    pub bounce_step: f32,
    /// Circle pad readings closer to center than this count as zero.
    pub circle_deadzone: i16,
    /// Radians per circle pad unit, per frame.
    pub circle_scale: f32,
    /// Maps the normalized slider reading onto the eye offset.
    pub slider_scale: f32,
    pub initial_slider: f32,
    /// Amount one slider key press moves the reading.
    pub slider_nudge: f32,
    pub fovy: Deg<f32>,
    pub near: f32,
    pub far: f32,
    /// Distance of the plane both eyes converge on.
    pub convergence: f32,
    pub model_translation: Vector3<f32>,
    /// View-space light direction in `xyz`, directional share in `w`.
    pub light: [f32; 4],
    /// RGBA, sRGB encoded.
    pub clear_color: [u8; 4],
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            display: DisplayConfig::default(),
            initial_angle: 4.0,
            angle_step: 0.1,
            spin_step: 0.0625,
            bounce_step: 0.116_923_66,
            circle_deadzone: 20,
            circle_scale: 1.0 / 2048.0,
            slider_scale: 0.125,
            initial_slider: 0.0,
            slider_nudge: 0.1,
            fovy: Deg(45.0),
            near: 0.01,
            far: 100.0,
            convergence: 3.0,
            model_translation: Vector3::new(0.0, -10.0, -40.0),
            light: [0.0, 0.577_350_26, 0.577_350_26, 0.577_350_26],
            clear_color: [0x80, 0x80, 0x80, 0xff],
        }
    }
}
