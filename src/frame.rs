//! Per-frame orchestration of the two eye targets.

use crate::{
    backend::{Eye, GraphicsBackend},
    config::DemoConfig,
    data_structures::texture::srgb_color,
    error::GraphicsResult,
};

/// One eye pass that was drawn during a frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pass {
    pub eye: Eye,
    pub eye_offset: f32,
}

/// What [`FrameController::run_frame`] drew, in order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameReport {
    pub passes: Vec<Pass>,
}

impl FrameReport {
    pub fn is_stereo(&self) -> bool {
        self.passes.len() == 2
    }
}

pub struct FrameController<B: GraphicsBackend> {
    left: B::Target,
    right: B::Target,
    clear: wgpu::Color,
}

impl<B: GraphicsBackend> FrameController<B> {
    pub fn new(backend: &mut B, config: &DemoConfig) -> GraphicsResult<Self> {
        let size = [config.display.eye_width, config.display.eye_height];
        let clear = srgb_color(config.clear_color);
        let left = backend.create_target(Eye::Left, size, clear)?;
        let right = match backend.create_target(Eye::Right, size, clear) {
            Ok(right) => right,
            Err(e) => {
                backend.release_target(left);
                return Err(e);
            }
        };
        Ok(Self { left, right, clear })
    }

    pub fn target(&self, eye: Eye) -> &B::Target {
        match eye {
            Eye::Left => &self.left,
            Eye::Right => &self.right,
        }
    }

    /// Clears the target for `eye` and makes it the draw destination.
    pub fn select_target(&self, backend: &mut B, eye: Eye) -> GraphicsResult<()> {
        backend.select_target(self.target(eye), self.clear)
    }

    /// Renders one frame: the left eye always, the right eye only when
    /// `depth` is positive. `draw` receives the signed eye offset.
    pub fn run_frame<F>(&self, backend: &mut B, depth: f32, mut draw: F) -> GraphicsResult<FrameReport>
    where
        F: FnMut(&mut B, f32) -> GraphicsResult<()>,
    {
        let mut report = FrameReport::default();
        backend.begin_frame()?;

        self.select_target(backend, Eye::Left)?;
        draw(backend, -depth)?;
        report.passes.push(Pass {
            eye: Eye::Left,
            eye_offset: -depth,
        });

        if depth > 0.0 {
            self.select_target(backend, Eye::Right)?;
            draw(backend, depth)?;
            report.passes.push(Pass {
                eye: Eye::Right,
                eye_offset: depth,
            });
        }

        backend.end_frame()?;
        Ok(report)
    }

    /// Releases the right target, then the left.
    pub fn free(self, backend: &mut B) {
        backend.release_target(self.right);
        backend.release_target(self.left);
    }
}
