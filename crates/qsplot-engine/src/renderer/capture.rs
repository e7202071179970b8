//! Copies a presented frame into host memory for screenshots.

use super::readback::{padded_bytes_per_row, read_buffer};
use crate::screenshot::{PixelLayout, RgbImage};
use anyhow::{anyhow, Result};

/// Channel order of an 8-bit, 4-channel surface format, or `None` for formats
/// screenshots do not support.
pub fn pixel_layout(format: wgpu::TextureFormat) -> Option<PixelLayout> {
    use wgpu::TextureFormat as F;
    match format {
        F::Rgba8Unorm | F::Rgba8UnormSrgb => Some(PixelLayout::Rgba8),
        F::Bgra8Unorm | F::Bgra8UnormSrgb => Some(PixelLayout::Bgra8),
        _ => None,
    }
}

/// A texture-to-buffer copy recorded into a frame's encoder, read back after
/// the frame is submitted.
pub struct FrameCapture {
    buffer: wgpu::Buffer,
    width: u32,
    height: u32,
    bytes_per_row: u32,
    layout: PixelLayout,
}

impl FrameCapture {
    /// Records a copy of `texture` into a fresh readback buffer.
    pub fn record(
        device: &wgpu::Device,
        encoder: &mut wgpu::CommandEncoder,
        texture: &wgpu::Texture,
    ) -> Result<Self> {
        let layout = pixel_layout(texture.format())
            .ok_or_else(|| anyhow!("cannot capture surface format {:?}", texture.format()))?;
        let (width, height) = (texture.width(), texture.height());
        let bytes_per_row = padded_bytes_per_row(width, 4);

        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Screenshot Readback"),
            size: u64::from(bytes_per_row) * u64::from(height),
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });

        encoder.copy_texture_to_buffer(
            wgpu::ImageCopyTexture {
                texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::ImageCopyBuffer {
                buffer: &buffer,
                layout: wgpu::ImageDataLayout {
                    offset: 0,
                    bytes_per_row: Some(bytes_per_row),
                    rows_per_image: Some(height),
                },
            },
            wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
        );

        Ok(Self {
            buffer,
            width,
            height,
            bytes_per_row,
            layout,
        })
    }

    /// Waits for the copy and converts it to top-down RGB.
    pub fn finish(self, device: &wgpu::Device) -> Result<RgbImage> {
        let data = read_buffer(device, &self.buffer)?;
        Ok(RgbImage::from_padded_rows(
            &data,
            self.width,
            self.height,
            self.bytes_per_row,
            self.layout,
        ))
    }
}
