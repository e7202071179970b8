//! The rendering orchestrator. Owns the GPU context, render targets, the
//! instance streams and every pipeline. Created and dropped on the render
//! thread.

pub mod capture;
pub mod context;
pub mod instances;
pub mod pipelines;
pub mod readback;
pub mod targets;

use self::{
    context::GfxContext,
    instances::InstanceBuffers,
    pipelines::{
        gizmo::GizmoPipeline,
        picking::{PickingPipeline, NO_HIT},
        points::PointsPipeline,
        quad_buffer, SceneBinding,
    },
    targets::Targets,
};
use crate::data::{point_cloud::Dirty, PointCloud, SceneUniform};
use std::sync::Arc;
use winit::window::Window;

pub struct Renderer {
    pub gfx: GfxContext,
    pub targets: Targets,
    pub instances: InstanceBuffers,
    pub egui_renderer: egui_wgpu::Renderer,
    scene: SceneBinding,
    quad_vb: wgpu::Buffer,
    points: PointsPipeline,
    picking: PickingPipeline,
    gizmo: GizmoPipeline,
}

impl Renderer {
    pub async fn new(window: Arc<Window>, vsync: bool) -> anyhow::Result<Self> {
        let gfx = GfxContext::new(window, vsync).await?;
        let format = gfx.config.format;

        let targets = Targets::new(&gfx.device, gfx.size);
        let scene = SceneBinding::new(&gfx.device);
        let quad_vb = quad_buffer(&gfx.device);
        let instances = InstanceBuffers::new(&gfx.device);
        let points = PointsPipeline::new(&gfx.device, format, &scene);
        let picking = PickingPipeline::new(&gfx.device, &scene);
        let gizmo = GizmoPipeline::new(&gfx.device, format);

        let egui_renderer = egui_wgpu::Renderer::new(&gfx.device, format, None, 1);

        log::debug!("Renderer ready: surface {:?}, {}x{}", format, gfx.size.width, gfx.size.height);

        Ok(Self {
            gfx,
            targets,
            instances,
            egui_renderer,
            scene,
            quad_vb,
            points,
            picking,
            gizmo,
        })
    }

    pub fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.gfx.resize(new_size);
            self.targets.resize(&self.gfx.device, new_size);
        }
    }

    pub fn upload(&mut self, cloud: &PointCloud, dirty: Dirty) {
        self.instances
            .upload(&self.gfx.device, &self.gfx.queue, cloud, dirty);
    }

    /// Records the scene: clear to `background`, instanced points, then the
    /// axis gizmo. The caller composites the overlay and submits.
    pub fn render_scene(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        swap_view: &wgpu::TextureView,
        uniform: &SceneUniform,
        view_proj: glam::Mat4,
        background: [f32; 3],
    ) {
        self.scene.write(&self.gfx.queue, uniform);

        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Scene Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: swap_view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color {
                        r: f64::from(background[0]),
                        g: f64::from(background[1]),
                        b: f64::from(background[2]),
                        a: 1.0,
                    }),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &self.targets.depth,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        self.points
            .draw(&mut pass, &self.scene, &self.quad_vb, &self.instances);
        self.gizmo.draw(&mut pass, &self.gfx.queue, view_proj);
    }

    /// Runs the picking pass with `uniform` and returns the instance at
    /// `texel`, or -1 on a miss or any GPU failure.
    pub fn pick(&self, uniform: &SceneUniform, texel: (u32, u32)) -> i32 {
        self.scene.write(&self.gfx.queue, uniform);
        match self.picking.pick(
            &self.gfx.device,
            &self.gfx.queue,
            &self.targets,
            &self.scene,
            &self.quad_vb,
            &self.instances,
            texel,
        ) {
            Ok(id) => {
                log::debug!("Pick at {:?} -> {}", texel, id);
                id
            }
            Err(e) => {
                log::warn!("Picking failed: {:#}", e);
                NO_HIT
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::Camera;
    use crate::config::{LiveSettings, RendererConfig};
    use crate::renderer::capture::FrameCapture;
    use crate::staging::{PendingUploads, PointSet};
    use glam::Vec3;
    use winit::dpi::PhysicalSize;

    /// A device without a surface, or `None` on machines with no adapter.
    fn headless_device() -> Option<(wgpu::Device, wgpu::Queue)> {
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor::default());
        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::default(),
            compatible_surface: None,
            force_fallback_adapter: false,
        }))?;
        pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("Test Device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::downlevel_defaults(),
            },
            None,
        ))
        .ok()
    }

    #[test]
    fn pick_hits_a_lone_point_at_its_projected_center() {
        let Some((device, queue)) = headless_device() else {
            eprintln!("no GPU adapter; skipping");
            return;
        };
        let (width, height) = (256u32, 256u32);

        let targets = Targets::new(&device, PhysicalSize::new(width, height));
        let scene = SceneBinding::new(&device);
        let quad_vb = quad_buffer(&device);
        let mut instances = InstanceBuffers::new(&device);
        let picking = PickingPipeline::new(&device, &scene);

        let position = [0.5, -0.25, 0.0];
        let mut cloud = PointCloud::new();
        let dirty = cloud.apply(PendingUploads {
            current: Some(PointSet {
                positions: vec![position],
                values: vec![0.5],
            }),
            next: None,
        });
        instances.upload(&device, &queue, &cloud, dirty);

        let camera = Camera::new(width, height, 5.0);
        let mut live = LiveSettings::from_config(&RendererConfig::default());
        live.point_scale = 1.0;
        scene.write(&queue, &crate::app::scene_uniform(&camera, &live, &cloud, NO_HIT));

        let clip = camera.view_proj() * Vec3::from(position).extend(1.0);
        let ndc = clip.truncate() / clip.w;
        let center = (
            ((ndc.x + 1.0) * 0.5 * width as f32) as u32,
            ((1.0 - ndc.y) * 0.5 * height as f32) as u32,
        );

        let pick = |texel| {
            picking
                .pick(&device, &queue, &targets, &scene, &quad_vb, &instances, texel)
                .expect("pick")
        };
        assert_eq!(pick(center), 0);
        assert_eq!(pick((0, 0)), NO_HIT);
        assert_eq!(pick((width - 1, height - 1)), NO_HIT);
    }

    #[test]
    fn captured_frame_saves_as_full_size_ppm() {
        let Some((device, queue)) = headless_device() else {
            eprintln!("no GPU adapter; skipping");
            return;
        };
        // Not a multiple of the copy row alignment, so padding is stripped.
        let (width, height) = (100u32, 60u32);
        let format = wgpu::TextureFormat::Bgra8Unorm;

        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Offscreen Frame"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        // The overlay renderer targets the same surface format.
        let _overlay = egui_wgpu::Renderer::new(&device, format, None, 1);

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Offscreen Encoder"),
        });
        {
            let _pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Clear Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::RED),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
        }
        let capture = FrameCapture::record(&device, &mut encoder, &texture).expect("capturable format");
        queue.submit(std::iter::once(encoder.finish()));

        let image = capture.finish(&device).expect("readback");
        assert_eq!((image.width, image.height), (width, height));
        assert_eq!(&image.pixels[..3], &[255, 0, 0]);

        let path = std::env::temp_dir().join(format!("qsplot-capture-{}.ppm", std::process::id()));
        image.save_ppm(&path).expect("write ppm");
        let bytes = std::fs::read(&path).expect("read ppm");
        let _ = std::fs::remove_file(&path);

        let header = format!("P6\n{width} {height}\n255\n");
        assert!(bytes.starts_with(header.as_bytes()));
        assert_eq!(bytes.len(), header.len() + (width * height * 3) as usize);
    }
}
