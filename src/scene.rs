//! The cat: shader program, shared vertex buffer and the two materials drawn
//! over it.

use cgmath::Vector3;

use crate::{
    assets::ModelAssets,
    backend::GraphicsBackend,
    camera::{ModelPose, SceneUniform, StereoPerspective, model_view},
    config::DemoConfig,
    data_structures::material::Material,
    error::GraphicsResult,
};

pub struct SceneRenderer<B: GraphicsBackend> {
    program: B::Program,
    vertices: B::Buffer,
    body: Material<B>,
    whiskers: Material<B>,
    perspective: StereoPerspective,
    translation: Vector3<f32>,
    light: [f32; 4],
}

impl<B: GraphicsBackend> SceneRenderer<B> {
    /// Compiles and binds the shader, uploads and binds the vertex buffer and
    /// builds body then whiskers.
    ///
    /// On failure everything created so far is handed back to the backend.
    pub fn new(backend: &mut B, assets: &ModelAssets, config: &DemoConfig) -> GraphicsResult<Self> {
        let program = backend.create_program("Scene Shader", assets.shader)?;
        backend.bind_program(&program);

        let vertices = match backend.upload_vertices("maxwell", assets.vertices) {
            Ok(vertices) => vertices,
            Err(e) => {
                backend.release_program(program);
                return Err(e);
            }
        };
        backend.bind_vertices(&vertices);

        let vertex_count = assets.vertices.len();
        let body = match Material::new(
            backend,
            assets.body.name,
            assets.body.indices,
            vertex_count,
            assets.body.texture,
        ) {
            Ok(body) => body,
            Err(e) => {
                backend.release_buffer(vertices);
                backend.release_program(program);
                return Err(e);
            }
        };
        let whiskers = match Material::new(
            backend,
            assets.whiskers.name,
            assets.whiskers.indices,
            vertex_count,
            assets.whiskers.texture,
        ) {
            Ok(whiskers) => whiskers,
            Err(e) => {
                body.free(backend);
                backend.release_buffer(vertices);
                backend.release_program(program);
                return Err(e);
            }
        };
        log::info!(
            "scene ready: {} vertices, {} + {} indices",
            vertex_count,
            body.index_count(),
            whiskers.index_count()
        );

        Ok(Self {
            program,
            vertices,
            body,
            whiskers,
            perspective: StereoPerspective::from_config(config),
            translation: config.model_translation,
            light: config.light,
        })
    }

    /// Draws the model in `pose` into the selected target, seen from an eye
    /// displaced by `eye_offset`.
    pub fn render_scene(
        &self,
        backend: &mut B,
        pose: &ModelPose,
        eye_offset: f32,
    ) -> GraphicsResult<()> {
        let uniform = self.uniform(pose, eye_offset);
        backend.set_uniforms(&uniform)?;
        self.body.draw(backend)?;
        self.whiskers.draw(backend)
    }

    pub fn uniform(&self, pose: &ModelPose, eye_offset: f32) -> SceneUniform {
        SceneUniform::new(
            self.perspective.projection(eye_offset),
            model_view(self.translation, pose),
            self.light,
        )
    }

    pub fn materials(&self) -> [&Material<B>; 2] {
        [&self.body, &self.whiskers]
    }

    pub fn free(self, backend: &mut B) {
        self.body.free(backend);
        self.whiskers.free(backend);
        backend.release_buffer(self.vertices);
        backend.release_program(self.program);
        log::info!("scene released");
    }
}
