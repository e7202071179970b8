//! Color-ID picking: renders instance indices into an integer target and
//! reads back the texel under the cursor.

use super::{point_shader, SceneBinding};
use crate::data::types::QUAD_VERTEX_COUNT;
use crate::renderer::instances::{point_vertex_layouts, InstanceBuffers};
use crate::renderer::readback;
use crate::renderer::targets::{Targets, DEPTH_FORMAT, ID_FORMAT};
use anyhow::{anyhow, Result};
use glam::DVec2;

/// Value of a picking texel no instance covers.
pub const NO_HIT: i32 = -1;

/// Maps a cursor position in logical window coordinates to a framebuffer
/// texel using the per-axis framebuffer/window ratio. Both the cursor and
/// the texture origin are top-left, so no vertical flip is needed.
/// Returns `None` outside the framebuffer or for degenerate sizes.
pub fn framebuffer_texel(cursor: DVec2, window: DVec2, framebuffer: (u32, u32)) -> Option<(u32, u32)> {
    let (fb_w, fb_h) = framebuffer;
    if window.x <= 0.0 || window.y <= 0.0 || fb_w == 0 || fb_h == 0 {
        return None;
    }
    if cursor.x < 0.0 || cursor.y < 0.0 {
        return None;
    }
    let x = (cursor.x * f64::from(fb_w) / window.x).floor();
    let y = (cursor.y * f64::from(fb_h) / window.y).floor();
    if x >= f64::from(fb_w) || y >= f64::from(fb_h) {
        return None;
    }
    Some((x as u32, y as u32))
}

pub struct PickingPipeline {
    pipeline: wgpu::RenderPipeline,
    readback: wgpu::Buffer,
}

impl PickingPipeline {
    pub fn new(device: &wgpu::Device, scene: &SceneBinding) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("shaders/picking.wgsl"),
            source: wgpu::ShaderSource::Wgsl(point_shader!("picking.wgsl").into()),
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Picking PipelineLayout"),
            bind_group_layouts: &[&scene.layout],
            push_constant_ranges: &[],
        });

        let vbuf_layouts = point_vertex_layouts();

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Picking Pipeline"),
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
                    format: ID_FORMAT,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
        });

        // One texel, but copies need a full aligned row.
        let readback = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Picking Readback"),
            size: u64::from(wgpu::COPY_BYTES_PER_ROW_ALIGNMENT),
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });

        Self { pipeline, readback }
    }

    /// Renders the ID pass and returns the instance index at `texel`, or
    /// `NO_HIT` when the texel is empty.
    pub fn pick(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        targets: &Targets,
        scene: &SceneBinding,
        quad_vb: &wgpu::Buffer,
        instances: &InstanceBuffers,
        texel: (u32, u32),
    ) -> Result<i32> {
        if texel.0 >= targets.width || texel.1 >= targets.height {
            return Err(anyhow!(
                "texel {:?} outside {}x{} pick target",
                texel,
                targets.width,
                targets.height
            ));
        }

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Picking Encoder"),
        });

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Picking Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &targets.pick_ids,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: f64::from(NO_HIT),
                            g: 0.0,
                            b: 0.0,
                            a: 0.0,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &targets.pick_depth,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            if instances.count() > 0 {
                pass.set_pipeline(&self.pipeline);
                pass.set_bind_group(0, &scene.bind_group, &[]);
                pass.set_vertex_buffer(0, quad_vb.slice(..));
                instances.bind(&mut pass);
                pass.draw(0..QUAD_VERTEX_COUNT, 0..instances.count());
            }
        }

        encoder.copy_texture_to_buffer(
            wgpu::ImageCopyTexture {
                texture: &targets.pick_ids_tex,
                mip_level: 0,
                origin: wgpu::Origin3d {
                    x: texel.0,
                    y: texel.1,
                    z: 0,
                },
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::ImageCopyBuffer {
                buffer: &self.readback,
                layout: wgpu::ImageDataLayout {
                    offset: 0,
                    bytes_per_row: Some(wgpu::COPY_BYTES_PER_ROW_ALIGNMENT),
                    rows_per_image: Some(1),
                },
            },
            wgpu::Extent3d {
                width: 1,
                height: 1,
                depth_or_array_layers: 1,
            },
        );

        queue.submit(std::iter::once(encoder.finish()));

        let bytes = readback::read_buffer(device, &self.readback)?;
        let id = bytes
            .get(..4)
            .map(bytemuck::pod_read_unaligned::<i32>)
            .ok_or_else(|| anyhow!("picking readback returned {} bytes", bytes.len()))?;
        Ok(id)
    }
}
