//! Off-screen render targets: the display depth buffer and the picking
//! framebuffer (instance IDs + its own depth).

pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;
/// One signed integer per pixel; -1 marks "no instance".
pub const ID_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::R32Sint;

pub struct Targets {
    // Private textures – keep alive for the lifetime of the views.
    _depth_tex: wgpu::Texture,
    _pick_depth_tex: wgpu::Texture,

    /// Read back by the picking pass, so the texture itself is public.
    pub pick_ids_tex: wgpu::Texture,

    pub depth: wgpu::TextureView,
    pub pick_ids: wgpu::TextureView,
    pub pick_depth: wgpu::TextureView,

    /// Framebuffer size in physical pixels.
    pub width: u32,
    pub height: u32,
}

impl Targets {
    pub fn new(device: &wgpu::Device, size: winit::dpi::PhysicalSize<u32>) -> Self {
        // Ensure non‑zero dimensions.
        let width = size.width.max(1);
        let height = size.height.max(1);

        let tex_size = wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        };

        let create_tex = |label: &str, format, usage| {
            device.create_texture(&wgpu::TextureDescriptor {
                label: Some(label),
                size: tex_size,
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format,
                usage,
                view_formats: &[],
            })
        };

        let depth_tex = create_tex(
            "Scene Depth Target",
            DEPTH_FORMAT,
            wgpu::TextureUsages::RENDER_ATTACHMENT,
        );

        let pick_ids_tex = create_tex(
            "Picking ID Target",
            ID_FORMAT,
            wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
        );

        let pick_depth_tex = create_tex(
            "Picking Depth Target",
            DEPTH_FORMAT,
            wgpu::TextureUsages::RENDER_ATTACHMENT,
        );

        Self {
            depth: depth_tex.create_view(&wgpu::TextureViewDescriptor::default()),
            pick_ids: pick_ids_tex.create_view(&wgpu::TextureViewDescriptor::default()),
            pick_depth: pick_depth_tex.create_view(&wgpu::TextureViewDescriptor::default()),
            _depth_tex: depth_tex,
            _pick_depth_tex: pick_depth_tex,
            pick_ids_tex,
            width,
            height,
        }
    }

    /// Recreates every target at the new framebuffer size.
    pub fn resize(&mut self, device: &wgpu::Device, size: winit::dpi::PhysicalSize<u32>) {
        *self = Self::new(device, size);
    }
}
