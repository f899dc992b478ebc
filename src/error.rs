use thiserror::Error;

/// Everything that can go wrong while bringing up or driving the GPU.
///
/// None of these are recovered from: the loop either skips a frame on a
/// transient surface problem or hands the error up to `main`.
#[derive(Debug, Error)]
pub enum GraphicsError {
    #[error("no compatible graphics adapter: {0}")]
    NoAdapter(String),
    #[error("failed to open the graphics device: {0}")]
    RequestDevice(String),
    #[error("failed to create the window surface: {0}")]
    CreateSurface(String),
    #[error("swapchain failure: {0}")]
    Surface(#[from] wgpu::SurfaceError),
    #[error("failed to decode texture `{label}`: {source}")]
    TextureDecode {
        label: String,
        #[source]
        source: image::ImageError,
    },
    #[error("mesh `{name}` is malformed: {reason}")]
    InvalidMesh { name: String, reason: String },
    #[error("draw call issued outside of a frame")]
    NoFrame,
    #[error("platform failure: {0}")]
    Platform(String),
}

impl GraphicsError {
    /// Surface hiccups that go away after reconfiguring or waiting a frame.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            GraphicsError::Surface(
                wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated | wgpu::SurfaceError::Timeout
            )
        )
    }
}

pub type GraphicsResult<T> = Result<T, GraphicsError>;
