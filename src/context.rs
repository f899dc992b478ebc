//! The wgpu implementation of [`GraphicsBackend`].
//!
//! [`Context`] owns the device and queue, the bound shader program and the
//! commands recorded for the current frame. Draws are recorded per eye target
//! and encoded in [`end_frame`](GraphicsBackend::end_frame); when a window is
//! attached the two eye targets are then composited side by side into it.

use std::{collections::HashMap, iter, sync::Arc};

use bytemuck::Zeroable;
use image::RgbaImage;
use wgpu::util::DeviceExt;
use winit::window::Window;

use crate::{
    backend::{Eye, GraphicsBackend},
    camera::SceneUniform,
    config::DisplayConfig,
    data_structures::{texture::Texture, vertex::Vertex},
    error::{GraphicsError, GraphicsResult},
    pipelines::{
        basic::{mk_scene_pipeline, texture_layout, uniform_layout},
        present::{mk_present_bind_group, mk_present_pipeline, present_layout},
    },
};

/// A compiled scene shader.
#[derive(Clone, Debug)]
pub struct ScenePipeline {
    pub pipeline: wgpu::RenderPipeline,
}

#[derive(Clone, Debug)]
pub struct GpuBuffer {
    pub buffer: wgpu::Buffer,
    pub len: u32,
}

/// A material texture together with the bind group the scene shader reads it through.
#[derive(Clone, Debug)]
pub struct MaterialTexture {
    pub texture: Texture,
    pub bind_group: wgpu::BindGroup,
}

/// Off-screen color and depth/stencil surface for one eye.
#[derive(Debug)]
pub struct EyeTarget {
    pub eye: Eye,
    pub color: Texture,
    pub depth: Texture,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
}

/// Everything drawn into one target during the current frame.
struct PendingPass {
    eye: Eye,
    color: wgpu::TextureView,
    depth: wgpu::TextureView,
    clear: wgpu::Color,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    draws: Vec<PendingDraw>,
}

struct PendingDraw {
    bind_group: wgpu::BindGroup,
    indices: wgpu::Buffer,
    count: u32,
}

/// The window half of the context: swapchain plus compositing pipeline.
struct Presenter {
    window: Arc<Window>,
    surface: wgpu::Surface<'static>,
    config: wgpu::SurfaceConfiguration,
    pipeline: wgpu::RenderPipeline,
    frame: Option<wgpu::SurfaceTexture>,
}

pub struct Context {
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    texture_layout: wgpu::BindGroupLayout,
    uniform_layout: wgpu::BindGroupLayout,
    present_layout: wgpu::BindGroupLayout,
    program: Option<wgpu::RenderPipeline>,
    vertices: Option<wgpu::Buffer>,
    eye_bind_groups: HashMap<Eye, wgpu::BindGroup>,
    presenter: Option<Presenter>,
    passes: Vec<PendingPass>,
    in_frame: bool,
}

impl Context {
    /// Opens the GPU and attaches it to `window`.
    pub async fn new(window: Arc<Window>, display: &DisplayConfig) -> GraphicsResult<Self> {
        let size = window.inner_size();

        // The instance is a handle to our GPU
        // Backends::PRIMARY => Vulkan + Metal + DX12 + Browser WebGPU
        log::info!("wgpu setup");
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });

        let surface = instance
            .create_surface(window.clone())
            .map_err(|e| GraphicsError::CreateSurface(e.to_string()))?;

        let adapter = request_adapter(&instance, Some(&surface)).await?;
        let (device, queue) = request_device(&adapter).await?;

        let surface_caps = surface.get_capabilities(&adapter);
        // The eye targets are sRGB; an sRGB swapchain keeps the composite byte-exact.
        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first().copied())
            .ok_or_else(|| GraphicsError::CreateSurface("surface reports no formats".to_string()))?;
        let present_mode = if display.vsync {
            wgpu::PresentMode::AutoVsync
        } else {
            wgpu::PresentMode::AutoNoVsync
        };
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode,
            alpha_mode: surface_caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let mut context = Self::from_device(device, queue);
        let pipeline = mk_present_pipeline(&context.device, surface_format, &context.present_layout);
        context.presenter = Some(Presenter {
            window,
            surface,
            config,
            pipeline,
            frame: None,
        });
        Ok(context)
    }

    /// Opens the GPU without a window. Frames are rendered and submitted but
    /// never presented.
    pub async fn headless() -> GraphicsResult<Self> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });
        let adapter = request_adapter(&instance, None).await?;
        let (device, queue) = request_device(&adapter).await?;
        Ok(Self::from_device(device, queue))
    }

    fn from_device(device: wgpu::Device, queue: wgpu::Queue) -> Self {
        let texture_layout = texture_layout(&device);
        let uniform_layout = uniform_layout(&device);
        let present_layout = present_layout(&device);
        Self {
            device,
            queue,
            texture_layout,
            uniform_layout,
            present_layout,
            program: None,
            vertices: None,
            eye_bind_groups: HashMap::new(),
            presenter: None,
            passes: Vec::new(),
            in_frame: false,
        }
    }

    pub fn window(&self) -> Option<&Arc<Window>> {
        self.presenter.as_ref().map(|presenter| &presenter.window)
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        if let Some(presenter) = &mut self.presenter {
            if width > 0 && height > 0 {
                presenter.config.width = width;
                presenter.config.height = height;
                presenter.surface.configure(&self.device, &presenter.config);
            }
        }
    }

    fn current_pass(&mut self) -> GraphicsResult<&mut PendingPass> {
        self.passes.last_mut().ok_or(GraphicsError::NoFrame)
    }

    fn encode_passes(&self, encoder: &mut wgpu::CommandEncoder) -> GraphicsResult<()> {
        for pass in &self.passes {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some(pass.eye.label()),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &pass.color,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(pass.clear),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(clear_depth_stencil(&pass.depth)),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            if pass.draws.is_empty() {
                continue;
            }
            let (Some(program), Some(vertices)) = (&self.program, &self.vertices) else {
                return Err(GraphicsError::Platform(
                    "draw recorded without a bound program and vertex buffer".to_string(),
                ));
            };
            render_pass.set_pipeline(program);
            render_pass.set_bind_group(1, &pass.uniform_bind_group, &[]);
            render_pass.set_vertex_buffer(0, vertices.slice(..));
            for draw in &pass.draws {
                render_pass.set_bind_group(0, &draw.bind_group, &[]);
                render_pass.set_index_buffer(draw.indices.slice(..), wgpu::IndexFormat::Uint16);
                render_pass.draw_indexed(0..draw.count, 0, 0..1);
            }
        }
        Ok(())
    }

    /// Copies an eye target back to the CPU.
    #[cfg(feature = "integration-tests")]
    pub async fn read_target(&self, target: &EyeTarget) -> GraphicsResult<RgbaImage> {
        let size = target.color.texture.size();
        let unpadded = 4 * size.width;
        let padded = unpadded.div_ceil(wgpu::COPY_BYTES_PER_ROW_ALIGNMENT)
            * wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
        let output_buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Eye target readback"),
            size: (padded * size.height) as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Readback Encoder"),
            });
        encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                aspect: wgpu::TextureAspect::All,
                texture: &target.color.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
            },
            wgpu::TexelCopyBufferInfo {
                buffer: &output_buffer,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(padded),
                    rows_per_image: Some(size.height),
                },
            },
            size,
        );
        self.queue.submit(iter::once(encoder.finish()));

        let (tx, rx) = futures_intrusive::channel::shared::oneshot_channel();
        let buffer_slice = output_buffer.slice(..);
        buffer_slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });
        self.device
            .poll(wgpu::PollType::Wait {
                submission_index: None,
                timeout: Some(std::time::Duration::from_secs(3)),
            })
            .map_err(|e| GraphicsError::Platform(e.to_string()))?;
        rx.receive()
            .await
            .ok_or_else(|| GraphicsError::Platform("readback channel closed".to_string()))?
            .map_err(|e| GraphicsError::Platform(e.to_string()))?;

        let pixels = {
            let data = buffer_slice.get_mapped_range();
            data.chunks(padded as usize)
                .flat_map(|row| &row[..unpadded as usize])
                .copied()
                .collect::<Vec<u8>>()
        };
        output_buffer.unmap();
        RgbaImage::from_raw(size.width, size.height, pixels)
            .ok_or_else(|| GraphicsError::Platform("readback size mismatch".to_string()))
    }
}

async fn request_adapter(
    instance: &wgpu::Instance,
    surface: Option<&wgpu::Surface<'_>>,
) -> GraphicsResult<wgpu::Adapter> {
    let adapter = instance
        .request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::default(),
            compatible_surface: surface,
            force_fallback_adapter: false,
        })
        .await
        .map_err(|e| GraphicsError::NoAdapter(e.to_string()))?;
    log::info!("using adapter {:?}", adapter.get_info().name);
    Ok(adapter)
}

async fn request_device(adapter: &wgpu::Adapter) -> GraphicsResult<(wgpu::Device, wgpu::Queue)> {
    adapter
        .request_device(&wgpu::DeviceDescriptor {
            label: Some("maxwell device"),
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::downlevel_defaults(),
            memory_hints: Default::default(),
            ..Default::default()
        })
        .await
        .map_err(|e| GraphicsError::RequestDevice(e.to_string()))
}

fn clear_depth_stencil(view: &wgpu::TextureView) -> wgpu::RenderPassDepthStencilAttachment<'_> {
    wgpu::RenderPassDepthStencilAttachment {
        view,
        depth_ops: Some(wgpu::Operations {
            load: wgpu::LoadOp::Clear(1.0),
            store: wgpu::StoreOp::Store,
        }),
        stencil_ops: Some(wgpu::Operations {
            load: wgpu::LoadOp::Clear(0),
            store: wgpu::StoreOp::Store,
        }),
    }
}

impl GraphicsBackend for Context {
    type Program = ScenePipeline;
    type Buffer = GpuBuffer;
    type Texture = MaterialTexture;
    type Target = EyeTarget;

    fn create_program(&mut self, label: &str, source: &str) -> GraphicsResult<ScenePipeline> {
        let pipeline = mk_scene_pipeline(
            &self.device,
            label,
            source,
            &self.texture_layout,
            &self.uniform_layout,
        );
        Ok(ScenePipeline { pipeline })
    }

    fn bind_program(&mut self, program: &ScenePipeline) {
        self.program = Some(program.pipeline.clone());
    }

    fn upload_vertices(&mut self, label: &str, vertices: &[Vertex]) -> GraphicsResult<GpuBuffer> {
        let buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&format!("{label} Vertex Buffer")),
                contents: bytemuck::cast_slice(vertices),
                usage: wgpu::BufferUsages::VERTEX,
            });
        Ok(GpuBuffer {
            buffer,
            len: vertices.len() as u32,
        })
    }

    fn bind_vertices(&mut self, buffer: &GpuBuffer) {
        self.vertices = Some(buffer.buffer.clone());
    }

    fn upload_indices(&mut self, label: &str, indices: &[u16]) -> GraphicsResult<GpuBuffer> {
        let buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&format!("{label} Index Buffer")),
                contents: bytemuck::cast_slice(indices),
                usage: wgpu::BufferUsages::INDEX,
            });
        Ok(GpuBuffer {
            buffer,
            len: indices.len() as u32,
        })
    }

    fn create_texture(
        &mut self,
        label: &str,
        image: &RgbaImage,
        filter: wgpu::FilterMode,
    ) -> GraphicsResult<MaterialTexture> {
        let texture = Texture::from_image(&self.device, &self.queue, image, Some(label), filter);
        let sampler = texture
            .sampler
            .as_ref()
            .ok_or_else(|| GraphicsError::Platform(format!("texture `{label}` has no sampler")))?;
        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &self.texture_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&texture.view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(sampler),
                },
            ],
            label: Some(label),
        });
        Ok(MaterialTexture {
            texture,
            bind_group,
        })
    }

    fn create_target(
        &mut self,
        eye: Eye,
        size: [u32; 2],
        clear: wgpu::Color,
    ) -> GraphicsResult<EyeTarget> {
        let color = Texture::create_color_target(&self.device, size, eye.label());
        let depth = Texture::create_depth_texture(&self.device, size, eye.label());

        let uniform_buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(eye.label()),
                contents: bytemuck::cast_slice(&[SceneUniform::zeroed()]),
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            });
        let uniform_bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &self.uniform_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
            label: Some(eye.label()),
        });

        let sampler = color
            .sampler
            .as_ref()
            .ok_or_else(|| GraphicsError::Platform("eye target has no sampler".to_string()))?;
        let present_group = mk_present_bind_group(&self.device, &self.present_layout, &color, sampler);
        self.eye_bind_groups.insert(eye, present_group);

        // start from a cleared surface so the first frame never shows garbage
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Target Clear Encoder"),
            });
        {
            let _clear_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Target Clear"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &color.view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(clear),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(clear_depth_stencil(&depth.view)),
                occlusion_query_set: None,
                timestamp_writes: None,
            });
        }
        self.queue.submit(iter::once(encoder.finish()));
        log::info!("created {} target {}x{}", eye.label(), size[0], size[1]);

        Ok(EyeTarget {
            eye,
            color,
            depth,
            uniform_buffer,
            uniform_bind_group,
        })
    }

    fn begin_frame(&mut self) -> GraphicsResult<()> {
        self.passes.clear();
        self.in_frame = false;
        if let Some(presenter) = &mut self.presenter {
            match presenter.surface.get_current_texture() {
                Ok(frame) => presenter.frame = Some(frame),
                Err(e @ (wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated)) => {
                    // Reconfigure the surface if it's lost or outdated
                    let size = presenter.window.inner_size();
                    if size.width > 0 && size.height > 0 {
                        presenter.config.width = size.width;
                        presenter.config.height = size.height;
                    }
                    presenter.surface.configure(&self.device, &presenter.config);
                    return Err(e.into());
                }
                Err(e) => return Err(e.into()),
            }
        }
        self.in_frame = true;
        Ok(())
    }

    fn select_target(&mut self, target: &EyeTarget, clear: wgpu::Color) -> GraphicsResult<()> {
        if !self.in_frame {
            return Err(GraphicsError::NoFrame);
        }
        self.passes.push(PendingPass {
            eye: target.eye,
            color: target.color.view.clone(),
            depth: target.depth.view.clone(),
            clear,
            uniform_buffer: target.uniform_buffer.clone(),
            uniform_bind_group: target.uniform_bind_group.clone(),
            draws: Vec::new(),
        });
        Ok(())
    }

    fn set_uniforms(&mut self, uniform: &SceneUniform) -> GraphicsResult<()> {
        let pass = self.current_pass()?;
        let buffer = pass.uniform_buffer.clone();
        self.queue
            .write_buffer(&buffer, 0, bytemuck::cast_slice(&[*uniform]));
        Ok(())
    }

    fn draw_indexed(
        &mut self,
        texture: &MaterialTexture,
        indices: &GpuBuffer,
        count: u32,
    ) -> GraphicsResult<()> {
        let count = draw_count(count, indices.len)?;
        let pass = self.current_pass()?;
        pass.draws.push(PendingDraw {
            bind_group: texture.bind_group.clone(),
            indices: indices.buffer.clone(),
            count,
        });
        Ok(())
    }

    fn end_frame(&mut self) -> GraphicsResult<()> {
        if !self.in_frame {
            return Err(GraphicsError::NoFrame);
        }
        self.in_frame = false;

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });
        self.encode_passes(&mut encoder)?;
        let right_drawn = self.passes.iter().any(|pass| pass.eye == Eye::Right);
        self.passes.clear();

        let Some(presenter) = &mut self.presenter else {
            self.queue.submit(iter::once(encoder.finish()));
            return Ok(());
        };
        let Some(frame) = presenter.frame.take() else {
            self.queue.submit(iter::once(encoder.finish()));
            return Err(GraphicsError::NoFrame);
        };
        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Present Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                occlusion_query_set: None,
                timestamp_writes: None,
            });
            render_pass.set_pipeline(&presenter.pipeline);

            let half = presenter.config.width as f32 / 2.0;
            let height = presenter.config.height as f32;
            let left = self.eye_bind_groups.get(&Eye::Left);
            // mono: without a right pass this frame the left image goes to both halves
            let right = if right_drawn {
                self.eye_bind_groups.get(&Eye::Right)
            } else {
                left
            };
            for (x, group) in [(0.0, left), (half, right)] {
                if let Some(group) = group {
                    render_pass.set_viewport(x, 0.0, half, height, 0.0, 1.0);
                    render_pass.set_bind_group(0, group, &[]);
                    render_pass.draw(0..3, 0..1);
                }
            }
        }
        self.queue.submit(iter::once(encoder.finish()));
        presenter.window.pre_present_notify();
        frame.present();
        Ok(())
    }

    // Dropping a wgpu handle keeps the resource alive until submitted work
    // that uses it has finished.
    fn release_buffer(&mut self, buffer: GpuBuffer) {
        if self.vertices.as_ref() == Some(&buffer.buffer) {
            self.vertices = None;
        }
        log::debug!("released buffer of {} elements", buffer.len);
    }

    fn release_texture(&mut self, texture: MaterialTexture) {
        drop(texture);
    }

    fn release_target(&mut self, target: EyeTarget) {
        self.eye_bind_groups.remove(&target.eye);
        log::info!("released {} target", target.eye.label());
    }

    fn release_program(&mut self, program: ScenePipeline) {
        if self.program.as_ref() == Some(&program.pipeline) {
            self.program = None;
        }
    }
}

/// Number of indices to draw from a buffer holding `len` of them.
fn draw_count(count: u32, len: u32) -> GraphicsResult<u32> {
    if count > len {
        return Err(GraphicsError::InvalidMesh {
            name: "draw".to_string(),
            reason: format!("{count} indices requested from a buffer of {len}"),
        });
    }
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn draw_count_accepts_whole_and_partial_buffers() {
        assert_eq!(draw_count(36, 36).unwrap(), 36);
        assert_eq!(draw_count(6, 36).unwrap(), 6);
        assert_eq!(draw_count(0, 0).unwrap(), 0);
    }

    #[test]
    fn draw_count_rejects_reading_past_the_buffer() {
        assert!(matches!(
            draw_count(37, 36),
            Err(GraphicsError::InvalidMesh { .. })
        ));
    }
}
