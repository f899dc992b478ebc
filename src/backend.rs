//! The seam between the demo and the GPU.
//!
//! [`GraphicsBackend`] is the whole surface the scene renderer and the frame
//! controller need: resource creation, a begin/select/draw/end frame protocol
//! and explicit release. [`crate::context::Context`] implements it on top
//! of wgpu; tests drive the same code through a recording mock.

use image::RgbaImage;

use crate::{camera::SceneUniform, data_structures::vertex::Vertex, error::GraphicsResult};

/// Which half of the stereo display a render target feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Eye {
    Left,
    Right,
}

impl Eye {
    pub fn label(&self) -> &'static str {
        match self {
            Eye::Left => "left eye",
            Eye::Right => "right eye",
        }
    }
}

pub trait GraphicsBackend {
    /// Compiled shader program.
    type Program;
    /// GPU-visible vertex or index memory.
    type Buffer;
    type Texture;
    type Target;

    fn create_program(&mut self, label: &str, source: &str) -> GraphicsResult<Self::Program>;

    /// Makes `program` the one draws go through.
    fn bind_program(&mut self, program: &Self::Program);

    fn upload_vertices(&mut self, label: &str, vertices: &[Vertex]) -> GraphicsResult<Self::Buffer>;

    /// Makes `buffer` the vertex source for subsequent indexed draws.
    fn bind_vertices(&mut self, buffer: &Self::Buffer);

    fn upload_indices(&mut self, label: &str, indices: &[u16]) -> GraphicsResult<Self::Buffer>;

    /// `filter` applies to both minification and magnification.
    fn create_texture(
        &mut self,
        label: &str,
        image: &RgbaImage,
        filter: wgpu::FilterMode,
    ) -> GraphicsResult<Self::Texture>;

    /// Allocates a color + depth/stencil surface feeding `eye`, already
    /// cleared to `clear`.
    fn create_target(
        &mut self,
        eye: Eye,
        size: [u32; 2],
        clear: wgpu::Color,
    ) -> GraphicsResult<Self::Target>;

    /// Starts recording a frame. Blocks until the display can take another one.
    fn begin_frame(&mut self) -> GraphicsResult<()>;

    /// Clears `target` and directs following draws into it.
    fn select_target(&mut self, target: &Self::Target, clear: wgpu::Color) -> GraphicsResult<()>;

    /// Sets the vertex shader's projection and model-view matrices for the
    /// selected target.
    fn set_uniforms(&mut self, uniform: &SceneUniform) -> GraphicsResult<()>;

    /// Binds `texture` to unit 0 and draws `count` indices as a triangle list.
    fn draw_indexed(
        &mut self,
        texture: &Self::Texture,
        indices: &Self::Buffer,
        count: u32,
    ) -> GraphicsResult<()>;

    /// Submits everything recorded since [`begin_frame`](Self::begin_frame)
    /// and presents it.
    fn end_frame(&mut self) -> GraphicsResult<()>;

    fn release_buffer(&mut self, buffer: Self::Buffer);
    fn release_texture(&mut self, texture: Self::Texture);
    fn release_target(&mut self, target: Self::Target);
    fn release_program(&mut self, program: Self::Program);
}
