use crate::{
    camera::Camera,
    color,
    config::{LiveSettings, RendererConfig},
    data::{PointCloud, SceneUniform},
    engine::Shared,
    interaction::{apply_pick, Action, Button, Interaction},
    renderer::{capture::FrameCapture, pipelines::picking::framebuffer_texel, Renderer},
    ui::{self, SelectionInfo},
};
use anyhow::Result;
use glam::DVec2;
use std::path::Path;
use std::sync::{atomic::Ordering, Arc};
use winit::{
    event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent},
    window::Window,
};

/// Pixel scroll deltas per wheel line.
const PIXELS_PER_LINE: f64 = 120.0;

/// Builds the per-frame uniforms shared by the display and picking passes.
/// A selection outside the current data highlights nothing.
pub fn scene_uniform(
    camera: &Camera,
    live: &LiveSettings,
    cloud: &PointCloud,
    selected: i32,
) -> SceneUniform {
    let in_range = usize::try_from(selected).is_ok_and(|i| i < cloud.render_count());
    let selected_color = if in_range {
        color::selection_color(
            live.color_mode,
            &cloud.current().values,
            &cloud.next().values,
            selected,
            live.morph_time,
        )
    } else {
        glam::Vec3::ZERO
    };

    SceneUniform {
        view_proj: camera.view_proj().to_cols_array_2d(),
        camera_right: camera.right().to_array(),
        point_scale: live.point_scale,
        camera_up: camera.up().to_array(),
        alpha: live.global_alpha,
        selected_color: selected_color.to_array(),
        morph_time: live.morph_time,
        color_mode: live.color_mode.index(),
        selected_id: selected,
        has_selection: u32::from(in_range),
        filter_enabled: u32::from(live.filter.enabled),
        filter_value: live.filter.value,
        filter_tolerance: live.filter.tolerance,
        _pad: [0.0; 2],
    }
}

/// Render-thread state: window, GPU resources, camera, overlay and the
/// mirror of the uploaded point data.
pub struct Viewer {
    window: Arc<Window>,
    renderer: Renderer,
    camera: Camera,
    interaction: Interaction,
    egui_ctx: egui::Context,
    egui_state: egui_winit::State,
    cloud: PointCloud,
    live: LiveSettings,
    selected: i32,
    shared: Arc<Shared>,
}

impl Viewer {
    pub async fn new(window: Arc<Window>, config: &RendererConfig, shared: Arc<Shared>) -> Result<Self> {
        let renderer = Renderer::new(window.clone(), config.vsync).await?;
        let size = renderer.gfx.size;
        let camera = Camera::new(size.width, size.height, config.camera_distance);

        let egui_ctx = egui::Context::default();
        let egui_state = egui_winit::State::new(
            egui_ctx.clone(),
            egui_ctx.viewport_id(),
            &*window,
            None,
            None,
        );

        let selected = shared.selected.load(Ordering::Acquire);

        Ok(Self {
            window,
            renderer,
            camera,
            interaction: Interaction::new(),
            egui_ctx,
            egui_state,
            cloud: PointCloud::new(),
            live: LiveSettings::from_config(config),
            selected,
            shared,
        })
    }

    pub fn window(&self) -> &Window {
        &self.window
    }

    pub fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.renderer.resize(new_size);
            self.camera.set_aspect(new_size.width, new_size.height);
        }
    }

    /// Reapplies the surface configuration after `Lost`/`Outdated`.
    pub fn recover_surface(&mut self) {
        let size = self.renderer.gfx.size;
        log::warn!("Surface lost; reconfiguring at {}x{}", size.width, size.height);
        self.renderer.gfx.reconfigure();
    }

    /// Routes a window event through the overlay first; camera and
    /// selection only see what the overlay did not consume.
    pub fn handle_event(&mut self, event: &WindowEvent) {
        let consumed = self.egui_state.on_window_event(&self.window, event).consumed;

        let action = match event {
            WindowEvent::Resized(size) => {
                self.resize(*size);
                None
            }
            WindowEvent::CursorMoved { position, .. } => self
                .interaction
                .cursor_moved(DVec2::new(position.x, position.y), consumed),
            WindowEvent::MouseInput { state, button, .. } => {
                let button = match button {
                    MouseButton::Left => Button::Left,
                    MouseButton::Right => Button::Right,
                    _ => return,
                };
                self.interaction
                    .button(button, *state == ElementState::Pressed, consumed)
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let lines = match delta {
                    MouseScrollDelta::LineDelta(_, y) => *y,
                    MouseScrollDelta::PixelDelta(p) => (p.y / PIXELS_PER_LINE) as f32,
                };
                self.interaction.scroll(lines, consumed)
            }
            _ => None,
        };

        match action {
            Some(Action::Orbit { dx, dy }) => self.camera.orbit(dx, dy),
            Some(Action::Zoom(delta)) => self.camera.zoom(delta),
            Some(Action::Pick(cursor)) => self.pick(cursor),
            None => {}
        }
    }

    fn pick(&mut self, cursor: DVec2) {
        let scale = self.window.scale_factor();
        let inner = self.window.inner_size();
        let window_logical = DVec2::new(f64::from(inner.width), f64::from(inner.height)) / scale;
        let framebuffer = (self.renderer.targets.width, self.renderer.targets.height);

        let picked = match framebuffer_texel(cursor / scale, window_logical, framebuffer) {
            Some(texel) => {
                let uniform = scene_uniform(&self.camera, &self.live, &self.cloud, self.selected);
                self.renderer.pick(&uniform, texel)
            }
            None => -1,
        };

        self.set_selected(apply_pick(self.selected, picked));
    }

    fn set_selected(&mut self, id: i32) {
        if id != self.selected {
            log::debug!("Selection {} -> {}", self.selected, id);
        }
        self.selected = id;
        self.shared.selected.store(id, Ordering::Release);
    }

    fn selection_info(&self) -> Option<SelectionInfo> {
        if self.selected < 0 {
            return None;
        }
        Some(SelectionInfo {
            id: self.selected,
            ticker: self.shared.staging.ticker(self.selected),
            value: usize::try_from(self.selected)
                .ok()
                .and_then(|i| self.cloud.interpolated(i, self.live.morph_time))
                .map(|(_, value)| value),
        })
    }

    /// One frame: drain staged data, build the overlay, draw the scene and
    /// overlay, present, then service a pending screenshot.
    pub fn render(&mut self) -> Result<(), wgpu::SurfaceError> {
        let pending = self.shared.staging.take_uploads();
        let dirty = self.cloud.apply(pending);
        if dirty.any() {
            self.renderer.upload(&self.cloud, dirty);
        }

        let labels = self.shared.staging.labels();
        let selection = self.selection_info();
        let egui_input = self.egui_state.take_egui_input(&self.window);
        self.egui_ctx.begin_frame(egui_input);
        let panel = ui::draw_controls(&self.egui_ctx, &mut self.live, &labels, selection.as_ref());
        let egui::FullOutput {
            platform_output,
            textures_delta,
            shapes,
            pixels_per_point,
            ..
        } = self.egui_ctx.end_frame();
        self.egui_state
            .handle_platform_output(&self.window, platform_output);

        if panel.reset_camera {
            self.camera.reset();
        }

        let frame = self.renderer.gfx.surface.get_current_texture()?;
        let swap_view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .renderer
            .gfx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Frame Encoder"),
            });

        let uniform = scene_uniform(&self.camera, &self.live, &self.cloud, self.selected);
        self.renderer.render_scene(
            &mut encoder,
            &swap_view,
            &uniform,
            self.camera.view_proj(),
            self.live.background_color,
        );

        let shapes = self.egui_ctx.tessellate(shapes, pixels_per_point);
        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [
                self.renderer.gfx.config.width,
                self.renderer.gfx.config.height,
            ],
            pixels_per_point,
        };

        for (id, delta) in &textures_delta.set {
            self.renderer.egui_renderer.update_texture(
                &self.renderer.gfx.device,
                &self.renderer.gfx.queue,
                *id,
                delta,
            );
        }

        self.renderer.egui_renderer.update_buffers(
            &self.renderer.gfx.device,
            &self.renderer.gfx.queue,
            &mut encoder,
            &shapes,
            &screen_descriptor,
        );

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Overlay Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &swap_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            self.renderer
                .egui_renderer
                .render(&mut render_pass, &shapes, &screen_descriptor);
        }

        for id in &textures_delta.free {
            self.renderer.egui_renderer.free_texture(id);
        }

        let capture = self.shared.staging.take_screenshot().and_then(|path| {
            if !self.renderer.gfx.readable {
                log::error!("Screenshot {} skipped: surface is not readable", path.display());
                return None;
            }
            match FrameCapture::record(&self.renderer.gfx.device, &mut encoder, &frame.texture) {
                Ok(capture) => Some((path, capture)),
                Err(e) => {
                    log::error!("Screenshot {} failed: {:#}", path.display(), e);
                    None
                }
            }
        });

        self.renderer
            .gfx
            .queue
            .submit(std::iter::once(encoder.finish()));
        self.window.pre_present_notify();
        frame.present();

        if let Some((path, capture)) = capture {
            self.save_capture(&path, capture);
        }

        Ok(())
    }

    fn save_capture(&self, path: &Path, capture: FrameCapture) {
        let result = capture
            .finish(&self.renderer.gfx.device)
            .and_then(|image| image.save_ppm(path).map(|()| image));
        match result {
            Ok(image) => log::info!(
                "Saved {}x{} screenshot to {}",
                image.width,
                image.height,
                path.display()
            ),
            Err(e) => log::error!("Screenshot {} failed: {:#}", path.display(), e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ColorMode;
    use crate::staging::{PendingUploads, PointSet};

    fn cloud(values: Vec<f32>, next: Option<Vec<f32>>) -> PointCloud {
        let n = values.len();
        let mut cloud = PointCloud::new();
        cloud.apply(PendingUploads {
            current: Some(PointSet {
                positions: vec![[0.0; 3]; n],
                values,
            }),
            next: next.map(|values| PointSet {
                positions: vec![[1.0; 3]; values.len()],
                values,
            }),
        });
        cloud
    }

    fn setup() -> (Camera, LiveSettings) {
        let config = RendererConfig::default();
        (
            Camera::new(config.window_width, config.window_height, config.camera_distance),
            LiveSettings::from_config(&config),
        )
    }

    #[test]
    fn no_selection_clears_flag_and_color() {
        let (camera, live) = setup();
        let u = scene_uniform(&camera, &live, &cloud(vec![0.0, 1.0], None), -1);
        assert_eq!(u.has_selection, 0);
        assert_eq!(u.selected_id, -1);
        assert_eq!(u.selected_color, [0.0; 3]);
    }

    #[test]
    fn selection_color_follows_morph_time() {
        let (camera, mut live) = setup();
        live.color_mode = ColorMode::Grayscale;
        live.morph_time = 1.0;
        let c = cloud(vec![0.0, 0.2], Some(vec![0.0, 0.8]));
        let u = scene_uniform(&camera, &live, &c, 1);
        assert_eq!(u.has_selection, 1);
        assert_eq!(u.selected_color, [0.8; 3]);
    }

    #[test]
    fn stale_selection_past_the_data_highlights_nothing() {
        let (camera, live) = setup();
        let u = scene_uniform(&camera, &live, &cloud(vec![0.5], None), 4);
        assert_eq!(u.has_selection, 0);
        assert_eq!(u.selected_id, 4);
    }

    #[test]
    fn uniform_carries_live_settings() {
        let (camera, mut live) = setup();
        live.filter.enabled = true;
        live.filter.value = 0.3;
        live.color_mode = ColorMode::CoolWarm;
        let u = scene_uniform(&camera, &live, &PointCloud::new(), -1);
        assert_eq!(u.filter_enabled, 1);
        assert_eq!(u.filter_value, 0.3);
        assert_eq!(u.color_mode, 1);
        assert_eq!(u.point_scale, live.point_scale);
        assert_eq!(u.camera_right, camera.right().to_array());
    }
}
