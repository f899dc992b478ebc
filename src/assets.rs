//! Model, textures and shader baked into the binary.
//!
//! `build.rs` turns `assets/maxwell.obj` into the constants below and copies
//! the textures next to them in `OUT_DIR`.

use crate::data_structures::vertex::Vertex;

mod baked {
    include!(concat!(env!("OUT_DIR"), "/maxwell.rs"));
}

pub static SCENE_SHADER: &str = include_str!("pipelines/scene.wgsl");
pub static BODY_TEXTURE: &[u8] = include_bytes!(concat!(env!("OUT_DIR"), "/assets/body.png"));
pub static WHISKERS_TEXTURE: &[u8] =
    include_bytes!(concat!(env!("OUT_DIR"), "/assets/whiskers.png"));

/// Index list plus texture container for one material.
#[derive(Debug, Clone, Copy)]
pub struct MaterialAsset {
    pub name: &'static str,
    pub indices: &'static [u16],
    pub texture: &'static [u8],
}

/// Everything the scene renderer uploads at startup.
#[derive(Debug, Clone, Copy)]
pub struct ModelAssets {
    pub vertices: &'static [Vertex],
    pub body: MaterialAsset,
    pub whiskers: MaterialAsset,
    pub shader: &'static str,
}

impl ModelAssets {
    /// The cat.
    pub fn maxwell() -> Self {
        Self {
            vertices: bytemuck::cast_slice(baked::MODEL_VERTICES),
            body: MaterialAsset {
                name: "body",
                indices: baked::BODY_INDICES,
                texture: BODY_TEXTURE,
            },
            whiskers: MaterialAsset {
                name: "whiskers",
                indices: baked::WHISKERS_INDICES,
                texture: WHISKERS_TEXTURE,
            },
            shader: SCENE_SHADER,
        }
    }

    /// Materials in draw order.
    pub fn materials(&self) -> [MaterialAsset; 2] {
        [self.body, self.whiskers]
    }
}
