use super::{point_shader, SceneBinding};
use crate::data::types::QUAD_VERTEX_COUNT;
use crate::renderer::instances::{point_vertex_layouts, InstanceBuffers};
use crate::renderer::targets::DEPTH_FORMAT;

/// Instanced, alpha-blended billboard points with morphing, color mapping,
/// selection highlighting and value filtering.
pub struct PointsPipeline {
    pipeline: wgpu::RenderPipeline,
}

impl PointsPipeline {
    pub fn new(
        device: &wgpu::Device,
        color_fmt: wgpu::TextureFormat,
        scene: &SceneBinding,
    ) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("shaders/points.wgsl"),
            source: wgpu::ShaderSource::Wgsl(point_shader!("points.wgsl").into()),
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Points PipelineLayout"),
            bind_group_layouts: &[&scene.layout],
            push_constant_ranges: &[],
        });

        let vbuf_layouts = point_vertex_layouts();

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Points Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: "vs_main",
                buffers: &vbuf_layouts,
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleStrip,
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: "fs_main",
                targets: &[Some(wgpu::ColorTargetState {
                    format: color_fmt,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
        });

        Self { pipeline }
    }

    pub fn draw<'a>(
        &'a self,
        rpass: &mut wgpu::RenderPass<'a>,
        scene: &'a SceneBinding,
        quad_vb: &'a wgpu::Buffer,
        instances: &'a InstanceBuffers,
    ) {
        if instances.count() == 0 {
            return;
        }
        rpass.set_pipeline(&self.pipeline);
        rpass.set_bind_group(0, &scene.bind_group, &[]);
        rpass.set_vertex_buffer(0, quad_vb.slice(..));
        instances.bind(rpass);
        rpass.draw(0..QUAD_VERTEX_COUNT, 0..instances.count());
    }
}
