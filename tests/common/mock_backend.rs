use std::{
    cell::RefCell,
    collections::{HashSet, VecDeque},
    rc::Rc,
};

use image::RgbaImage;
use maxwell_stereo::{
    backend::{Eye, GraphicsBackend},
    camera::SceneUniform,
    data_structures::vertex::Vertex,
    error::{GraphicsError, GraphicsResult},
};

/// Handle to a resource living in the mock. Not `Clone`, so a handle can only
/// be released once.
#[derive(Debug)]
pub struct MockHandle {
    pub id: u32,
    pub label: String,
}

#[derive(Debug)]
pub struct MockTarget {
    pub id: u32,
    pub eye: Eye,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    CreateProgram(String),
    BindProgram(String),
    UploadVertices(usize),
    BindVertices,
    UploadIndices { label: String, len: usize },
    CreateTexture { label: String, width: u32, height: u32 },
    CreateTarget(Eye),
    BeginFrame,
    SelectTarget(Eye),
    SetUniforms,
    Draw { texture: String, count: u32 },
    EndFrame,
    ReleaseBuffer(String),
    ReleaseTexture(String),
    ReleaseTarget(Eye),
    ReleaseProgram(String),
}

/// Ids of the resources not yet released. Shared so a test can still look at
/// it after the backend has been moved into a failed constructor.
pub type LiveSet = Rc<RefCell<HashSet<u32>>>;

/// Records every call and checks resources are used only while alive.
#[derive(Debug, Default)]
pub struct MockBackend {
    pub events: Vec<Event>,
    pub uniforms: Vec<SceneUniform>,
    /// `begin_frame` fails with these, one per call, before succeeding again.
    pub frame_errors: VecDeque<GraphicsError>,
    /// `create_texture` fails for this label.
    pub fail_texture: Option<&'static str>,
    /// `create_target` fails for this eye.
    pub fail_target: Option<Eye>,
    live: LiveSet,
    next_id: u32,
    in_frame: bool,
    target_selected: bool,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn live_resources(&self) -> usize {
        self.live.borrow().len()
    }

    pub fn live_set(&self) -> LiveSet {
        Rc::clone(&self.live)
    }

    pub fn clear_events(&mut self) {
        self.events.clear();
        self.uniforms.clear();
    }

    /// Labels of the textures drawn, in order.
    pub fn draws(&self) -> Vec<String> {
        self.events
            .iter()
            .filter_map(|event| match event {
                Event::Draw { texture, .. } => Some(texture.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn selected_targets(&self) -> Vec<Eye> {
        self.events
            .iter()
            .filter_map(|event| match event {
                Event::SelectTarget(eye) => Some(*eye),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, wanted: &Event) -> usize {
        self.events.iter().filter(|event| *event == wanted).count()
    }

    fn alloc(&mut self, label: &str) -> MockHandle {
        self.next_id += 1;
        self.live.borrow_mut().insert(self.next_id);
        MockHandle {
            id: self.next_id,
            label: label.to_string(),
        }
    }

    fn assert_live(&self, id: u32, what: &str) {
        assert!(self.live.borrow().contains(&id), "{what} {id} used after release");
    }

    fn release(&mut self, id: u32, what: &str) {
        assert!(self.live.borrow_mut().remove(&id), "{what} {id} released twice");
    }
}

impl GraphicsBackend for MockBackend {
    type Program = MockHandle;
    type Buffer = MockHandle;
    type Texture = MockHandle;
    type Target = MockTarget;

    fn create_program(&mut self, label: &str, source: &str) -> GraphicsResult<MockHandle> {
        assert!(!source.is_empty());
        self.events.push(Event::CreateProgram(label.to_string()));
        Ok(self.alloc(label))
    }

    fn bind_program(&mut self, program: &MockHandle) {
        self.assert_live(program.id, "program");
        self.events.push(Event::BindProgram(program.label.clone()));
    }

    fn upload_vertices(&mut self, label: &str, vertices: &[Vertex]) -> GraphicsResult<MockHandle> {
        self.events.push(Event::UploadVertices(vertices.len()));
        Ok(self.alloc(label))
    }

    fn bind_vertices(&mut self, buffer: &MockHandle) {
        self.assert_live(buffer.id, "vertex buffer");
        self.events.push(Event::BindVertices);
    }

    fn upload_indices(&mut self, label: &str, indices: &[u16]) -> GraphicsResult<MockHandle> {
        self.events.push(Event::UploadIndices {
            label: label.to_string(),
            len: indices.len(),
        });
        Ok(self.alloc(label))
    }

    fn create_texture(
        &mut self,
        label: &str,
        image: &RgbaImage,
        _filter: wgpu::FilterMode,
    ) -> GraphicsResult<MockHandle> {
        if self.fail_texture == Some(label) {
            return Err(GraphicsError::Platform(format!("no room for `{label}`")));
        }
        self.events.push(Event::CreateTexture {
            label: label.to_string(),
            width: image.width(),
            height: image.height(),
        });
        Ok(self.alloc(label))
    }

    fn create_target(
        &mut self,
        eye: Eye,
        size: [u32; 2],
        _clear: wgpu::Color,
    ) -> GraphicsResult<MockTarget> {
        assert!(size[0] > 0 && size[1] > 0);
        if self.fail_target == Some(eye) {
            return Err(GraphicsError::Platform(format!("no room for the {} target", eye.label())));
        }
        self.events.push(Event::CreateTarget(eye));
        let handle = self.alloc(eye.label());
        Ok(MockTarget { id: handle.id, eye })
    }

    fn begin_frame(&mut self) -> GraphicsResult<()> {
        if let Some(e) = self.frame_errors.pop_front() {
            return Err(e);
        }
        self.events.push(Event::BeginFrame);
        self.in_frame = true;
        self.target_selected = false;
        Ok(())
    }

    fn select_target(&mut self, target: &MockTarget, _clear: wgpu::Color) -> GraphicsResult<()> {
        self.assert_live(target.id, "target");
        if !self.in_frame {
            return Err(GraphicsError::NoFrame);
        }
        self.events.push(Event::SelectTarget(target.eye));
        self.target_selected = true;
        Ok(())
    }

    fn set_uniforms(&mut self, uniform: &SceneUniform) -> GraphicsResult<()> {
        if !self.target_selected {
            return Err(GraphicsError::NoFrame);
        }
        self.events.push(Event::SetUniforms);
        self.uniforms.push(*uniform);
        Ok(())
    }

    fn draw_indexed(
        &mut self,
        texture: &MockHandle,
        indices: &MockHandle,
        count: u32,
    ) -> GraphicsResult<()> {
        self.assert_live(texture.id, "texture");
        self.assert_live(indices.id, "index buffer");
        if !self.target_selected {
            return Err(GraphicsError::NoFrame);
        }
        self.events.push(Event::Draw {
            texture: texture.label.clone(),
            count,
        });
        Ok(())
    }

    fn end_frame(&mut self) -> GraphicsResult<()> {
        if !self.in_frame {
            return Err(GraphicsError::NoFrame);
        }
        self.events.push(Event::EndFrame);
        self.in_frame = false;
        self.target_selected = false;
        Ok(())
    }

    fn release_buffer(&mut self, buffer: MockHandle) {
        self.release(buffer.id, "buffer");
        self.events.push(Event::ReleaseBuffer(buffer.label));
    }

    fn release_texture(&mut self, texture: MockHandle) {
        self.release(texture.id, "texture");
        self.events.push(Event::ReleaseTexture(texture.label));
    }

    fn release_target(&mut self, target: MockTarget) {
        self.release(target.id, "target");
        self.events.push(Event::ReleaseTarget(target.eye));
    }

    fn release_program(&mut self, program: MockHandle) {
        self.release(program.id, "program");
        self.events.push(Event::ReleaseProgram(program.label));
    }
}
