#![allow(dead_code)]

pub mod mock_backend;

use maxwell_stereo::{
    assets::ModelAssets, config::DemoConfig, flow::Demo, input::InputSnapshot,
};

use mock_backend::MockBackend;

pub fn mock_demo() -> Demo<MockBackend> {
    mock_demo_with(DemoConfig::default())
}

pub fn mock_demo_with(config: DemoConfig) -> Demo<MockBackend> {
    match Demo::new(MockBackend::new(), config, &ModelAssets::maxwell()) {
        Ok(demo) => demo,
        Err(e) => panic!("demo setup failed: {e}"),
    }
}

/// A frame with the d-pad at `rotate_delta` and the slider at `reading`.
pub fn frame_input(rotate_delta: f32, reading: f32) -> InputSnapshot {
    InputSnapshot {
        rotate_delta,
        stereo_reading: reading,
        ..Default::default()
    }
}
