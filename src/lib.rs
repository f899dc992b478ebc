//! maxwell-stereo
//!
//! A small stereoscopic 3D demo: a textured cat model spun with the arrow keys
//! and drawn once per eye into two off-screen targets, which the window shows
//! side by side. A depth slider controls how far apart the eyes are; at zero
//! only the left eye is rendered.
//!
//! High-level modules
//! - `assets`: model, textures and shader embedded at build time
//! - `backend`: the `GraphicsBackend` trait the scene and frame code draw through
//! - `camera`: stereo projection, model-view transform and angle wrapping
//! - `config`: every tunable constant of the demo
//! - `context`: the wgpu implementation of `GraphicsBackend`
//! - `data_structures`: vertices, textures and materials
//! - `flow`: per-frame update and the winit event loop
//! - `frame`: left/right target selection and the per-frame pass order
//! - `input`: keyboard mapping, held/pressed tracking and the depth slider
//! - `pipelines`: the scene and side-by-side present pipelines
//! - `scene`: the cat and how it is drawn
//!

pub mod assets;
pub mod backend;
pub mod camera;
pub mod config;
pub mod context;
pub mod data_structures;
pub mod error;
pub mod flow;
pub mod frame;
pub mod input;
pub mod pipelines;
pub mod scene;
