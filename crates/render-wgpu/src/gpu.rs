use crate::mesh::MeshAtlas;
use crate::shaders;
use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};
use sceneview_common::Color;
use sceneview_render::{Camera, GraphicsContext, MeshKind, Model};
use wgpu::util::DeviceExt;

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;
const MAX_INSTANCES: usize = 4096;
const AMBIENT: f32 = 0.3;

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct FrameUniforms {
    view_proj: [[f32; 4]; 4],
    light_dir: [f32; 4],
}

impl FrameUniforms {
    fn new(view_proj: Mat4) -> Self {
        let light = Vec3::new(0.3, 1.0, 0.5).normalize();
        Self {
            view_proj: view_proj.to_cols_array_2d(),
            light_dir: [light.x, light.y, light.z, AMBIENT],
        }
    }
}

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct Instance {
    model: [[f32; 4]; 4],
    color: [f32; 4],
}

/// Draw calls collected between `begin` and `end`.
#[derive(Default)]
struct PendingFrame {
    clear: bool,
    view_proj: Option<Mat4>,
    bound: Option<MeshKind>,
    cubes: Vec<Instance>,
    planes: Vec<Instance>,
}

/// [`GraphicsContext`] backed by a wgpu device.
///
/// The host hands over a colour target with [`set_target`](Self::set_target)
/// before running the scene frame. Draws are batched per mesh kind and
/// submitted as one render pass in `end()`.
pub struct WgpuGraphics {
    device: wgpu::Device,
    queue: wgpu::Queue,
    pipeline: wgpu::RenderPipeline,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    instance_buffer: wgpu::Buffer,
    atlas: MeshAtlas,
    depth_view: wgpu::TextureView,
    surface_format: wgpu::TextureFormat,
    target: Option<wgpu::TextureView>,
    clear_color: Color,
    frame: Option<PendingFrame>,
}

impl WgpuGraphics {
    pub fn new(
        device: wgpu::Device,
        queue: wgpu::Queue,
        surface_format: wgpu::TextureFormat,
        width: u32,
        height: u32,
    ) -> Self {
        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("frame_uniforms"),
            contents: bytemuck::bytes_of(&FrameUniforms::new(Mat4::IDENTITY)),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("frame_bind_group_layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let uniform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("frame_bind_group"),
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("model_pipeline_layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("model_shader"),
            source: wgpu::ShaderSource::Wgsl(shaders::MODEL_SHADER.into()),
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("model_pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_model"),
                compilation_options: Default::default(),
                buffers: &[
                    wgpu::VertexBufferLayout {
                        array_stride: std::mem::size_of::<crate::mesh::Vertex>() as u64,
                        step_mode: wgpu::VertexStepMode::Vertex,
                        attributes: &wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3],
                    },
                    wgpu::VertexBufferLayout {
                        array_stride: std::mem::size_of::<Instance>() as u64,
                        step_mode: wgpu::VertexStepMode::Instance,
                        attributes: &wgpu::vertex_attr_array![
                            2 => Float32x4,
                            3 => Float32x4,
                            4 => Float32x4,
                            5 => Float32x4,
                            6 => Float32x4,
                        ],
                    },
                ],
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_model"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: surface_format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                // Planes are single-sided quads seen from both sides.
                cull_mode: None,
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: Default::default(),
                bias: Default::default(),
            }),
            multisample: Default::default(),
            multiview: None,
            cache: None,
        });

        let atlas = MeshAtlas::build();
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("mesh_vertices"),
            contents: bytemuck::cast_slice(&atlas.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("mesh_indices"),
            contents: bytemuck::cast_slice(&atlas.indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        let instance_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("model_instances"),
            size: (MAX_INSTANCES * std::mem::size_of::<Instance>()) as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let depth_view = create_depth_view(&device, width, height);
        tracing::debug!(?surface_format, width, height, "wgpu graphics ready");

        Self {
            device,
            queue,
            pipeline,
            uniform_buffer,
            uniform_bind_group,
            vertex_buffer,
            index_buffer,
            instance_buffer,
            atlas,
            depth_view,
            surface_format,
            target: None,
            clear_color: Color::default(),
            frame: None,
        }
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.surface_format
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.depth_view = create_depth_view(&self.device, width, height);
    }

    /// Colour target for the next frame. Consumed by `end()`.
    pub fn set_target(&mut self, view: wgpu::TextureView) {
        self.target = Some(view);
    }

    fn pending(&mut self, call: &str) -> Option<&mut PendingFrame> {
        if self.frame.is_none() {
            tracing::warn!(call, "graphics call outside begin/end ignored");
        }
        self.frame.as_mut()
    }

    fn submit(&mut self, frame: PendingFrame, target: &wgpu::TextureView) {
        let total = frame.cubes.len() + frame.planes.len();
        if total > MAX_INSTANCES {
            tracing::warn!(total, max = MAX_INSTANCES, "instance limit exceeded; extra models skipped");
        }
        let cubes = frame.cubes.len().min(MAX_INSTANCES);
        let planes = frame.planes.len().min(MAX_INSTANCES - cubes);
        let mut instances = Vec::with_capacity(cubes + planes);
        instances.extend_from_slice(&frame.cubes[..cubes]);
        instances.extend_from_slice(&frame.planes[..planes]);

        let view_proj = frame.view_proj.unwrap_or(Mat4::IDENTITY);
        self.queue.write_buffer(
            &self.uniform_buffer,
            0,
            bytemuck::bytes_of(&FrameUniforms::new(view_proj)),
        );
        if !instances.is_empty() {
            self.queue
                .write_buffer(&self.instance_buffer, 0, bytemuck::cast_slice(&instances));
        }

        let load = if frame.clear {
            let c = self.clear_color;
            wgpu::LoadOp::Clear(wgpu::Color {
                r: c.r as f64,
                g: c.g as f64,
                b: c.b as f64,
                a: c.a as f64,
            })
        } else {
            wgpu::LoadOp::Load
        };

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("scene_encoder"),
            });
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("scene_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: target,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load,
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                ..Default::default()
            });

            if !instances.is_empty() {
                pass.set_pipeline(&self.pipeline);
                pass.set_bind_group(0, &self.uniform_bind_group, &[]);
                pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
                pass.set_vertex_buffer(1, self.instance_buffer.slice(..));
                pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint16);

                let batches = [(MeshKind::Cube, 0..cubes), (MeshKind::Plane, cubes..cubes + planes)];
                for (mesh, range) in batches {
                    if range.is_empty() {
                        continue;
                    }
                    let mesh = self.atlas.range(mesh);
                    pass.draw_indexed(
                        mesh.indices.clone(),
                        mesh.base_vertex,
                        range.start as u32..range.end as u32,
                    );
                }
            }
        }
        self.queue.submit(std::iter::once(encoder.finish()));
    }
}

impl GraphicsContext for WgpuGraphics {
    fn begin(&mut self) {
        if self.frame.is_some() {
            tracing::warn!("begin called twice; discarding unfinished frame");
        }
        self.frame = Some(PendingFrame::default());
    }

    fn clear(&mut self) {
        if let Some(frame) = self.pending("clear") {
            frame.clear = true;
        }
    }

    fn clear_color(&mut self, color: Color) {
        self.clear_color = color;
    }

    fn use_model(&mut self, model: &Model) {
        if let Some(frame) = self.pending("use_model") {
            frame.bound = Some(model.mesh);
        }
    }

    fn update(&mut self, camera: &Camera, _model: &Model) {
        if let Some(frame) = self.pending("update") {
            frame.view_proj = Some(camera.view_projection());
        }
    }

    fn draw(&mut self, model: &Model) {
        let Some(frame) = self.pending("draw") else {
            return;
        };
        if frame.bound != Some(model.mesh) {
            tracing::trace!(model = %model.name, "draw without matching use_model");
        }
        let instance = Instance {
            model: model.model_matrix().to_cols_array_2d(),
            color: model.color.to_array(),
        };
        match model.mesh {
            MeshKind::Cube => frame.cubes.push(instance),
            MeshKind::Plane => frame.planes.push(instance),
        }
    }

    fn end(&mut self) {
        let Some(frame) = self.frame.take() else {
            tracing::warn!("end called without begin");
            return;
        };
        let Some(target) = self.target.take() else {
            tracing::warn!("no render target set; frame dropped");
            return;
        };
        self.submit(frame, &target);
    }
}

fn create_depth_view(device: &wgpu::Device, width: u32, height: u32) -> wgpu::TextureView {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("depth"),
        size: wgpu::Extent3d {
            width: width.max(1),
            height: height.max(1),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    texture.create_view(&Default::default())
}
