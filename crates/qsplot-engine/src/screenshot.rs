//! Screenshot encoding: raw GPU readback rows to a binary PPM (P6) file.

use anyhow::{Context, Result};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Channel order of the texture the pixels were read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelLayout {
    Rgba8,
    Bgra8,
}

/// Tightly packed RGB8 image, rows top to bottom.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RgbImage {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl RgbImage {
    /// Strips row padding and alpha and swizzles to RGB. Rows arrive top to
    /// bottom, as wgpu texture copies lay them out.
    pub fn from_padded_rows(
        data: &[u8],
        width: u32,
        height: u32,
        bytes_per_row: u32,
        layout: PixelLayout,
    ) -> Self {
        let (w, h, stride) = (width as usize, height as usize, bytes_per_row as usize);
        let mut pixels = Vec::with_capacity(w * h * 3);
        for y in 0..h {
            let row = &data[y * stride..y * stride + w * 4];
            for px in row.chunks_exact(4) {
                match layout {
                    PixelLayout::Rgba8 => pixels.extend_from_slice(&[px[0], px[1], px[2]]),
                    PixelLayout::Bgra8 => pixels.extend_from_slice(&[px[2], px[1], px[0]]),
                }
            }
        }
        Self {
            width,
            height,
            pixels,
        }
    }

    pub fn ppm_header(&self) -> String {
        format!("P6\n{} {}\n255\n", self.width, self.height)
    }

    pub fn write_ppm<W: Write>(&self, out: &mut W) -> std::io::Result<()> {
        out.write_all(self.ppm_header().as_bytes())?;
        out.write_all(&self.pixels)?;
        out.flush()
    }

    pub fn save_ppm(&self, path: &Path) -> Result<()> {
        let file = File::create(path)
            .with_context(|| format!("could not create {}", path.display()))?;
        let mut out = BufWriter::new(file);
        self.write_ppm(&mut out)
            .with_context(|| format!("could not write {}", path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 2×2 image with 8 bytes of row padding; rows are red/green then
    /// blue/white.
    fn padded_rgba() -> Vec<u8> {
        let mut data = Vec::new();
        data.extend_from_slice(&[255, 0, 0, 255, 0, 255, 0, 255]);
        data.extend_from_slice(&[0; 8]);
        data.extend_from_slice(&[0, 0, 255, 255, 255, 255, 255, 255]);
        data.extend_from_slice(&[0; 8]);
        data
    }

    #[test]
    fn strips_padding_and_alpha() {
        let img = RgbImage::from_padded_rows(&padded_rgba(), 2, 2, 16, PixelLayout::Rgba8);
        assert_eq!(img.pixels, vec![255, 0, 0, 0, 255, 0, 0, 0, 255, 255, 255, 255]);
    }

    #[test]
    fn swizzles_bgra() {
        let img = RgbImage::from_padded_rows(&padded_rgba(), 2, 2, 16, PixelLayout::Bgra8);
        assert_eq!(&img.pixels[..3], &[0, 0, 255]);
    }

    #[test]
    fn ppm_size_is_header_plus_pixels() {
        let img = RgbImage {
            width: 3,
            height: 2,
            pixels: vec![7; 3 * 2 * 3],
        };
        let mut out = Vec::new();
        img.write_ppm(&mut out).expect("in-memory write");
        assert!(out.starts_with(b"P6\n3 2\n255\n"));
        assert_eq!(out.len(), "P6\n3 2\n255\n".len() + 18);
    }

    #[test]
    fn save_ppm_reports_bad_paths() {
        let img = RgbImage { width: 1, height: 1, pixels: vec![0, 0, 0] };
        let bad = Path::new("/nonexistent-dir/for/sure/shot.ppm");
        assert!(img.save_ppm(bad).is_err());
    }

    #[test]
    fn save_ppm_writes_file() {
        let img = RgbImage { width: 2, height: 1, pixels: vec![1, 2, 3, 4, 5, 6] };
        let path = std::env::temp_dir().join(format!("qsplot-shot-{}.ppm", std::process::id()));
        img.save_ppm(&path).expect("temp dir is writable");
        let bytes = std::fs::read(&path).expect("written");
        std::fs::remove_file(&path).ok();
        assert_eq!(bytes, b"P6\n2 1\n255\n\x01\x02\x03\x04\x05\x06".to_vec());
    }
}
