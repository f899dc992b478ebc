//! A drawable piece of the model: its own indices and texture over the shared
//! vertex buffer.

use crate::{
    backend::GraphicsBackend,
    data_structures::texture::decode_texture,
    error::{GraphicsError, GraphicsResult},
};

pub struct Material<B: GraphicsBackend> {
    name: String,
    indices: B::Buffer,
    texture: B::Texture,
    count: u32,
}

impl<B: GraphicsBackend> Material<B> {
    /// Copies `indices` into GPU memory and decodes `texture_data` with
    /// bilinear filtering.
    ///
    /// `vertex_count` is the length of the vertex buffer the indices point
    /// into; the index list must be a non-empty triangle list inside it.
    pub fn new(
        backend: &mut B,
        name: &str,
        indices: &[u16],
        vertex_count: usize,
        texture_data: &[u8],
    ) -> GraphicsResult<Self> {
        validate_indices(name, indices, vertex_count)?;
        let count = u32::try_from(indices.len()).map_err(|_| GraphicsError::InvalidMesh {
            name: name.to_string(),
            reason: "too many indices".to_string(),
        })?;

        let image = decode_texture(texture_data, name)?;
        let indices = backend.upload_indices(name, indices)?;
        let texture = match backend.create_texture(name, &image, wgpu::FilterMode::Linear) {
            Ok(texture) => texture,
            Err(e) => {
                backend.release_buffer(indices);
                return Err(e);
            }
        };
        log::debug!(
            "material `{}`: {} triangles, {}x{} texture",
            name,
            count / 3,
            image.width(),
            image.height()
        );

        Ok(Self {
            name: name.to_string(),
            indices,
            texture,
            count,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn index_count(&self) -> u32 {
        self.count
    }

    pub fn draw(&self, backend: &mut B) -> GraphicsResult<()> {
        backend.draw_indexed(&self.texture, &self.indices, self.count)
    }

    /// Hands the index buffer and texture back to the backend.
    pub fn free(self, backend: &mut B) {
        log::debug!("releasing material `{}`", self.name);
        backend.release_buffer(self.indices);
        backend.release_texture(self.texture);
    }
}

/// Checks that `indices` forms a triangle list inside a buffer of
/// `vertex_count` vertices.
pub fn validate_indices(name: &str, indices: &[u16], vertex_count: usize) -> GraphicsResult<()> {
    let invalid = |reason: String| GraphicsError::InvalidMesh {
        name: name.to_string(),
        reason,
    };
    if indices.is_empty() {
        return Err(invalid("no indices".to_string()));
    }
    if indices.len() % 3 != 0 {
        return Err(invalid(format!(
            "{} indices do not form whole triangles",
            indices.len()
        )));
    }
    if let Some(index) = indices.iter().find(|&&i| i as usize >= vertex_count) {
        return Err(invalid(format!(
            "index {index} out of range for {vertex_count} vertices"
        )));
    }
    Ok(())
}
