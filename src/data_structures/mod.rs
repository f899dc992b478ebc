//! Engine data structures: vertices, textures and materials.
//!
//! - `vertex` is the interleaved position + texture coordinate layout
//! - `texture` contains the GPU texture wrapper, creation utilities and the PNG decoder
//! - `material` is one index list and texture drawn over the shared vertex buffer

pub mod material;
pub mod texture;
pub mod vertex;
