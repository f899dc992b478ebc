//! Logical buttons, the virtual depth slider and per-frame input snapshots.
//!
//! The loop never looks at keyboard events directly. The window feeds key
//! presses into an [`InputState`], and once per frame the loop takes an
//! [`InputSnapshot`] out of it.

use std::collections::HashSet;

use winit::{event::ElementState, keyboard::KeyCode};

/// The handheld's buttons as the demo sees them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Button {
    Start,
    DPadLeft,
    DPadRight,
    /// Toggles auto-spin.
    A,
    /// Toggles the bounce.
    B,
    /// Resets the view.
    X,
    SliderUp,
    SliderDown,
    CircleUp,
    CircleDown,
    CircleLeft,
    CircleRight,
}

impl Button {
    pub fn from_key_code(code: KeyCode) -> Option<Self> {
        match code {
            KeyCode::Escape | KeyCode::Enter => Some(Button::Start),
            KeyCode::ArrowLeft => Some(Button::DPadLeft),
            KeyCode::ArrowRight => Some(Button::DPadRight),
            KeyCode::KeyA => Some(Button::A),
            KeyCode::KeyB => Some(Button::B),
            KeyCode::KeyX => Some(Button::X),
            KeyCode::ArrowUp => Some(Button::SliderUp),
            KeyCode::ArrowDown => Some(Button::SliderDown),
            KeyCode::KeyI => Some(Button::CircleUp),
            KeyCode::KeyK => Some(Button::CircleDown),
            KeyCode::KeyJ => Some(Button::CircleLeft),
            KeyCode::KeyL => Some(Button::CircleRight),
            _ => None,
        }
    }
}

/// Everything the loop body needs to know about one frame of input.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct InputSnapshot {
    pub exit_requested: bool,
    /// Signed angle change for this frame in radians.
    pub rotate_delta: f32,
    /// Normalized slider reading, 0 means no stereo.
    pub stereo_reading: f32,
    pub toggle_spin: bool,
    pub toggle_bounce: bool,
    pub reset_view: bool,
    /// Raw circle pad position, `[x, y]` with up and right positive.
    pub circle_pad: [i16; 2],
}

impl InputSnapshot {
    /// Eye offset for the frame. Readings are clamped to `[0, 1]` first.
    pub fn stereo_depth(&self, scale: f32) -> f32 {
        stereo_depth(self.stereo_reading, scale)
    }
}

/// Full deflection of the circle pad along one axis.
pub const CIRCLE_PAD_MAX: i16 = 156;

/// Turns a circle pad position into `[yaw, pitch]` radians for one frame.
///
/// Each axis below `deadzone` in magnitude reads as zero so a resting pad
/// does not drift the model.
pub fn circle_pad_rotation(position: [i16; 2], deadzone: i16, scale: f32) -> [f32; 2] {
    position.map(|axis| {
        if axis.unsigned_abs() < deadzone.unsigned_abs() {
            0.0
        } else {
            f32::from(axis) * scale
        }
    })
}

pub fn stereo_depth(reading: f32, scale: f32) -> f32 {
    reading.clamp(0.0, 1.0) * scale
}

/// Where the loop pulls its snapshots from. `None` means the platform wants
/// the program to end.
pub trait InputSource {
    fn poll(&mut self) -> Option<InputSnapshot>;
}

/// Replays a fixed list of snapshots, then reports exit.
impl InputSource for std::vec::IntoIter<InputSnapshot> {
    fn poll(&mut self) -> Option<InputSnapshot> {
        self.next()
    }
}

/// A 3D depth slider emulated with two keys.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StereoSlider {
    reading: f32,
    nudge: f32,
}

impl StereoSlider {
    pub fn new(reading: f32, nudge: f32) -> Self {
        Self {
            reading: reading.clamp(0.0, 1.0),
            nudge,
        }
    }

    pub fn reading(&self) -> f32 {
        self.reading
    }

    pub fn raise(&mut self) {
        self.reading = (self.reading + self.nudge).clamp(0.0, 1.0);
    }

    pub fn lower(&mut self) {
        self.reading = (self.reading - self.nudge).clamp(0.0, 1.0);
    }
}

/// Button state accumulated between frames.
#[derive(Debug)]
pub struct InputState {
    held: HashSet<Button>,
    pressed: HashSet<Button>,
    slider: StereoSlider,
    angle_step: f32,
}

impl InputState {
    pub fn new(angle_step: f32, slider: StereoSlider) -> Self {
        Self {
            held: HashSet::new(),
            pressed: HashSet::new(),
            slider,
            angle_step,
        }
    }

    pub fn handle_key(&mut self, code: KeyCode, state: ElementState) {
        if let Some(button) = Button::from_key_code(code) {
            self.handle_button(button, state.is_pressed());
        }
    }

    pub fn handle_button(&mut self, button: Button, is_pressed: bool) {
        if !is_pressed {
            self.held.remove(&button);
            return;
        }
        // key repeat arrives as more presses; only the first one counts
        if !self.held.insert(button) {
            return;
        }
        self.pressed.insert(button);
        match button {
            Button::SliderUp => self.slider.raise(),
            Button::SliderDown => self.slider.lower(),
            _ => return,
        }
        log::info!("3D slider at {:.1}", self.slider.reading());
    }

    pub fn is_held(&self, button: Button) -> bool {
        self.held.contains(&button)
    }

    /// Circle pad emulated with four keys, each pushing it fully one way.
    pub fn circle_pad(&self) -> [i16; 2] {
        let axis = |negative, positive| {
            let mut value = 0;
            if self.is_held(negative) {
                value -= CIRCLE_PAD_MAX;
            }
            if self.is_held(positive) {
                value += CIRCLE_PAD_MAX;
            }
            value
        };
        [
            axis(Button::CircleLeft, Button::CircleRight),
            axis(Button::CircleDown, Button::CircleUp),
        ]
    }

    /// Reads the current frame and forgets edge-triggered presses.
    pub fn snapshot(&mut self) -> InputSnapshot {
        let mut rotate_delta = 0.0;
        if self.is_held(Button::DPadLeft) {
            rotate_delta -= self.angle_step;
        }
        if self.is_held(Button::DPadRight) {
            rotate_delta += self.angle_step;
        }
        let snapshot = InputSnapshot {
            exit_requested: self.is_held(Button::Start) || self.pressed.contains(&Button::Start),
            rotate_delta,
            stereo_reading: self.slider.reading(),
            toggle_spin: self.pressed.contains(&Button::A),
            toggle_bounce: self.pressed.contains(&Button::B),
            reset_view: self.pressed.contains(&Button::X),
            circle_pad: self.circle_pad(),
        };
        self.pressed.clear();
        snapshot
    }
}
