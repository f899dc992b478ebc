//! Lifecycle of the demo and the desktop event loop.
//!
//! [`Demo`] owns the backend together with the scene and the eye targets and
//! advances one frame per [`Demo::tick`]. It is independent of winit: tests
//! feed it snapshots through [`run_loop`], while [`run`] drives it from a
//! window.
//!
//! Each tick:
//! 1. Stop if Start is held
//! 2. Apply reset, toggles, rotation and bounce to the pose
//! 3. Turn the slider reading into an eye offset
//! 4. Draw the left eye, and the right eye when the offset is positive
//! 5. Present

use std::sync::Arc;

use anyhow::Context as _;
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::{KeyEvent, WindowEvent},
    event_loop::{ActiveEventLoop, EventLoop},
    keyboard::PhysicalKey,
    window::Window,
};

use crate::{
    assets::ModelAssets,
    backend::GraphicsBackend,
    camera::{ModelPose, wrap_angle},
    config::DemoConfig,
    context::Context,
    error::{GraphicsError, GraphicsResult},
    frame::{FrameController, FrameReport},
    input::{InputSnapshot, InputSource, InputState, StereoSlider, circle_pad_rotation},
    scene::SceneRenderer,
};

/// Mutable state carried between frames.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DemoState {
    /// Rotation around the vertical axis, always in `[0, 2π)`.
    pub angle: f32,
    /// Tilt around the horizontal axis, always in `[0, 2π)`.
    pub angle_x: f32,
    pub auto_spin: bool,
    pub bouncing: bool,
    /// Bounce phase in `[0, 2π)`; 0 whenever bouncing is off.
    pub bounce_pos: f32,
}

impl DemoState {
    pub fn new(config: &DemoConfig) -> Self {
        Self {
            angle: wrap_angle(config.initial_angle),
            angle_x: 0.0,
            auto_spin: false,
            bouncing: false,
            bounce_pos: 0.0,
        }
    }

    pub fn apply(&mut self, input: &InputSnapshot, config: &DemoConfig) {
        if input.reset_view {
            self.angle = wrap_angle(config.initial_angle);
            self.angle_x = 0.0;
        }
        if input.toggle_spin {
            self.auto_spin = !self.auto_spin;
            log::info!("auto-spin {}", if self.auto_spin { "on" } else { "off" });
        }
        if input.toggle_bounce {
            self.bouncing = !self.bouncing;
            if !self.bouncing {
                self.bounce_pos = 0.0;
            }
            log::info!("bounce {}", if self.bouncing { "on" } else { "off" });
        }

        let [yaw, pitch] =
            circle_pad_rotation(input.circle_pad, config.circle_deadzone, config.circle_scale);
        let mut delta = input.rotate_delta + yaw;
        if self.auto_spin {
            delta += config.spin_step;
        }
        if self.bouncing {
            self.bounce_pos = wrap_angle(self.bounce_pos + config.bounce_step);
        }
        self.angle = wrap_angle(self.angle + delta);
        self.angle_x = wrap_angle(self.angle_x + pitch);
    }

    pub fn pose(&self) -> ModelPose {
        ModelPose {
            angle_x: self.angle_x,
            angle_y: self.angle,
            bounce: self.bounce_pos,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum LoopControl {
    Continue(FrameReport),
    Exit,
}

pub struct Demo<B: GraphicsBackend> {
    backend: B,
    scene: SceneRenderer<B>,
    frames: FrameController<B>,
    state: DemoState,
    config: DemoConfig,
}

impl<B: GraphicsBackend> Demo<B> {
    pub fn new(mut backend: B, config: DemoConfig, assets: &ModelAssets) -> GraphicsResult<Self> {
        let scene = SceneRenderer::new(&mut backend, assets, &config)?;
        let frames = match FrameController::new(&mut backend, &config) {
            Ok(frames) => frames,
            Err(e) => {
                scene.free(&mut backend);
                return Err(e);
            }
        };
        Ok(Self {
            backend,
            scene,
            frames,
            state: DemoState::new(&config),
            config,
        })
    }

    pub fn state(&self) -> &DemoState {
        &self.state
    }

    pub fn config(&self) -> &DemoConfig {
        &self.config
    }

    pub fn frames(&self) -> &FrameController<B> {
        &self.frames
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn tick(&mut self, input: &InputSnapshot) -> GraphicsResult<LoopControl> {
        if input.exit_requested {
            return Ok(LoopControl::Exit);
        }
        self.state.apply(input, &self.config);

        let depth = input.stereo_depth(self.config.slider_scale);
        let pose = self.state.pose();
        let scene = &self.scene;
        let report = self
            .frames
            .run_frame(&mut self.backend, depth, |backend, eye_offset| {
                scene.render_scene(backend, &pose, eye_offset)
            })?;
        Ok(LoopControl::Continue(report))
    }

    /// Frees the scene, then the targets, and returns the backend.
    pub fn shutdown(self) -> B {
        let Self {
            mut backend,
            scene,
            frames,
            ..
        } = self;
        scene.free(&mut backend);
        frames.free(&mut backend);
        log::info!("demo shut down");
        backend
    }
}

/// Frames drawn by [`run_loop`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoopSummary {
    pub frames: Vec<FrameReport>,
    /// Frames dropped because the surface was temporarily unavailable.
    pub skipped: usize,
}

/// Ticks `demo` with snapshots from `input` until the source runs dry or
/// Start is held.
pub fn run_loop<B, I>(demo: &mut Demo<B>, input: &mut I) -> GraphicsResult<LoopSummary>
where
    B: GraphicsBackend,
    I: InputSource,
{
    let mut summary = LoopSummary::default();
    while let Some(snapshot) = input.poll() {
        match demo.tick(&snapshot) {
            Ok(LoopControl::Continue(report)) => summary.frames.push(report),
            Ok(LoopControl::Exit) => break,
            Err(e) if e.is_transient() => {
                log::warn!("skipping frame: {}", e);
                summary.skipped += 1;
            }
            Err(e) => return Err(e),
        }
    }
    Ok(summary)
}

pub const CONTROLS: &[(&str, &str)] = &[
    ("Left / Right", "rotate"),
    ("I / J / K / L", "circle pad: turn and tilt"),
    ("Up / Down", "3D depth"),
    ("A", "toggle auto-spin"),
    ("B", "toggle bounce"),
    ("X", "reset view"),
    ("Escape / Enter", "exit"),
];

pub fn print_controls() {
    println!("Controls:");
    for (keys, action) in CONTROLS {
        println!("  {keys:<16}{action}");
    }
}

pub struct App {
    async_runtime: tokio::runtime::Runtime,
    config: DemoConfig,
    input: InputState,
    demo: Option<Demo<Context>>,
    error: Option<GraphicsError>,
}

impl App {
    pub fn new(config: DemoConfig) -> anyhow::Result<Self> {
        let async_runtime = tokio::runtime::Builder::new_current_thread()
            .build()
            .context("creating the async runtime")?;
        let slider = StereoSlider::new(config.initial_slider, config.slider_nudge);
        let input = InputState::new(config.angle_step, slider);
        Ok(Self {
            async_runtime,
            config,
            input,
            demo: None,
            error: None,
        })
    }

    fn init(&mut self, event_loop: &ActiveEventLoop) -> GraphicsResult<Demo<Context>> {
        let (width, height) = self.config.display.window_size();
        let window_attributes = Window::default_attributes()
            .with_title(self.config.display.title.clone())
            .with_inner_size(PhysicalSize::new(width, height));
        let window = Arc::new(
            event_loop
                .create_window(window_attributes)
                .map_err(|e| GraphicsError::Platform(e.to_string()))?,
        );

        let ctx = self
            .async_runtime
            .block_on(Context::new(window.clone(), &self.config.display))?;
        let demo = Demo::new(ctx, self.config.clone(), &ModelAssets::maxwell())?;
        window.request_redraw();
        Ok(demo)
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, error: GraphicsError) {
        log::error!("{}", error);
        self.error = Some(error);
        self.shutdown(event_loop);
    }

    fn shutdown(&mut self, event_loop: &ActiveEventLoop) {
        if let Some(demo) = self.demo.take() {
            // the backend owns the window; dropping it last closes it
            let backend = demo.shutdown();
            drop(backend);
        }
        event_loop.exit();
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let Some(demo) = &mut self.demo else {
            return;
        };
        let snapshot = self.input.snapshot();
        match demo.tick(&snapshot) {
            Ok(LoopControl::Continue(_)) => {}
            Ok(LoopControl::Exit) => return self.shutdown(event_loop),
            Err(e) if e.is_transient() => log::warn!("skipping frame: {}", e),
            Err(e) => return self.fail(event_loop, e),
        }
        if let Some(window) = demo.backend().window() {
            window.request_redraw();
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.demo.is_some() || self.error.is_some() {
            return;
        }
        match self.init(event_loop) {
            Ok(demo) => self.demo = Some(demo),
            Err(e) => self.fail(event_loop, e),
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => self.shutdown(event_loop),
            WindowEvent::Resized(size) => {
                if let Some(demo) = &mut self.demo {
                    demo.backend_mut().resize(size.width, size.height);
                }
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(code),
                        state,
                        ..
                    },
                ..
            } => self.input.handle_key(code, state),
            WindowEvent::RedrawRequested => self.redraw(event_loop),
            _ => {}
        }
    }
}

pub fn run(config: DemoConfig) -> anyhow::Result<()> {
    if let Err(e) = env_logger::try_init() {
        println!("Warning: Could not initialize logger: {}", e);
    };
    print_controls();

    let event_loop = EventLoop::new().context("creating the event loop")?;
    let mut app = App::new(config)?;
    event_loop.run_app(&mut app).context("running the event loop")?;

    if let Some(e) = app.error.take() {
        return Err(e).context("the demo stopped on a graphics error");
    }
    Ok(())
}
