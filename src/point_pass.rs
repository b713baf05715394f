//! Unlit point rendering for the starfield.
//!
//! A `PointList` pipeline drawing position-only vertices with one uniform
//! color per cloud, depth-tested against the mesh pass depth buffer.

use glam::Mat4;

use crate::color::Color;
use crate::geometry::PointVertex;
use crate::gpu::GpuContext;
use crate::scene::PointCloud;

#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
struct PointUniforms {
    view_proj: [[f32; 4]; 4],
    color: [f32; 4],
}

/// GPU-resident copy of one point cloud.
pub(crate) struct GpuPoints {
    vertex_buffer: wgpu::Buffer,
    count: u32,
    uniform_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

pub(crate) struct PointPass {
    pipeline: wgpu::RenderPipeline,
    uniform_layout: wgpu::BindGroupLayout,
}

impl PointPass {
    pub fn new(gpu: &GpuContext) -> Self {
        let device = &gpu.device;

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Points Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/points.wgsl").into()),
        });

        let uniform_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Points Uniform Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Points Pipeline Layout"),
            bind_group_layouts: &[&uniform_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Points Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs"),
                buffers: &[PointVertex::LAYOUT],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: gpu.config.format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::PointList,
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: wgpu::TextureFormat::Depth32Float,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        Self {
            pipeline,
            uniform_layout,
        }
    }

    /// Upload a point cloud and allocate its uniform slot.
    pub fn upload(&self, gpu: &GpuContext, cloud: &PointCloud) -> GpuPoints {
        use wgpu::util::DeviceExt;

        let vertex_buffer = gpu
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Points Vertex Buffer"),
                contents: bytemuck::cast_slice(&cloud.points),
                usage: wgpu::BufferUsages::VERTEX,
            });

        let uniform_buffer = gpu.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Points Uniforms"),
            size: std::mem::size_of::<PointUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let bind_group = gpu.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Points Bind Group"),
            layout: &self.uniform_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        GpuPoints {
            vertex_buffer,
            count: cloud.points.len() as u32,
            uniform_buffer,
            bind_group,
        }
    }

    /// Write a cloud's per-frame uniforms.
    pub fn write_frame(&self, gpu: &GpuContext, points: &GpuPoints, view_proj: Mat4, color: Color) {
        let uniforms = PointUniforms {
            view_proj: view_proj.to_cols_array_2d(),
            color: color.to_array(),
        };
        gpu.queue
            .write_buffer(&points.uniform_buffer, 0, bytemuck::cast_slice(&[uniforms]));
    }

    /// Draw the given clouds into an already-begun main pass.
    pub fn render<'a>(
        &self,
        pass: &mut wgpu::RenderPass,
        clouds: impl Iterator<Item = &'a GpuPoints>,
    ) {
        pass.set_pipeline(&self.pipeline);
        for points in clouds {
            pass.set_bind_group(0, &points.bind_group, &[]);
            pass.set_vertex_buffer(0, points.vertex_buffer.slice(..));
            pass.draw(0..points.count, 0..1);
        }
    }
}
