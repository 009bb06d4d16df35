//! The two raster layers behind the drawing view.
//!
//! `persistent` holds committed ink and is what gets exported. `preview`
//! holds the dashed outline of a shape still being dragged. Both store
//! 0xAARRGGBB; alpha 0 is empty canvas.

use std::path::Path;

use image::RgbaImage;
use tracing::info;

use crate::error::Result;
use crate::raster::Surface;
use crate::types::FrameBuffer;

/// Transparent pixel; also what the eraser writes.
pub const CLEAR: u32 = 0x0000_0000;

/// Opaque ARGB from a 0xRRGGBB color.
#[inline]
pub fn opaque(rgb: u32) -> u32 {
    0xFF00_0000 | (rgb & 0x00FF_FFFF)
}

pub struct Layer {
    width: usize,
    height: usize,
    pixels: Vec<u32>,
}

impl Layer {
    pub fn new(width: usize, height: usize) -> Self {
        Self { width, height, pixels: vec![CLEAR; width * height] }
    }

    pub fn pixel(&self, x: usize, y: usize) -> Option<u32> {
        if x < self.width && y < self.height {
            Some(self.pixels[y * self.width + x])
        } else {
            None
        }
    }

    pub fn pixels(&self) -> &[u32] {
        &self.pixels
    }

    pub fn clear(&mut self) {
        self.pixels.iter_mut().for_each(|p| *p = CLEAR);
    }

    pub fn is_blank(&self) -> bool {
        self.pixels.iter().all(|&p| p >> 24 == 0)
    }

    /// Resize keeping the top-left aligned content; anything that no longer
    /// fits is cropped and new area starts transparent.
    pub fn resize_preserving(&mut self, width: usize, height: usize) {
        let mut next = vec![CLEAR; width * height];
        let copy_w = self.width.min(width);
        for y in 0..self.height.min(height) {
            let src = &self.pixels[y * self.width..y * self.width + copy_w];
            next[y * width..y * width + copy_w].copy_from_slice(src);
        }
        self.width = width;
        self.height = height;
        self.pixels = next;
    }

    /// Resize and drop all content.
    pub fn resize_cleared(&mut self, width: usize, height: usize) {
        *self = Layer::new(width, height);
    }

    /// Alpha-over this layer onto a 0x00RRGGBB screen buffer at (ox, oy).
    pub fn composite_onto(&self, fb: &mut FrameBuffer, ox: i32, oy: i32) {
        for y in 0..self.height {
            let sy = oy + y as i32;
            if sy < 0 || sy as usize >= fb.height {
                continue;
            }
            for x in 0..self.width {
                let sx = ox + x as i32;
                if sx < 0 || sx as usize >= fb.width {
                    continue;
                }
                let src = self.pixels[y * self.width + x];
                let a = src >> 24;
                if a == 0 {
                    continue;
                }
                let idx = sy as usize * fb.width + sx as usize;
                fb.pixels[idx] = if a == 0xFF { src & 0x00FF_FFFF } else { mix(fb.pixels[idx], src, a) };
            }
        }
    }

    fn to_rgba_image(&self) -> RgbaImage {
        RgbaImage::from_fn(self.width as u32, self.height as u32, |x, y| {
            let p = self.pixels[y as usize * self.width + x as usize];
            image::Rgba([(p >> 16) as u8, (p >> 8) as u8, p as u8, (p >> 24) as u8])
        })
    }
}

impl Surface for Layer {
    fn width(&self) -> usize {
        self.width
    }
    fn height(&self) -> usize {
        self.height
    }
    fn pixels_mut(&mut self) -> &mut [u32] {
        &mut self.pixels
    }
}

/// Straight-alpha blend of one ARGB pixel over an opaque RGB one.
#[inline]
fn mix(dst: u32, src: u32, a: u32) -> u32 {
    let inv = 255 - a;
    let ch = |shift: u32| {
        let s = (src >> shift) & 0xFF;
        let d = (dst >> shift) & 0xFF;
        ((s * a + d * inv + 127) / 255) << shift
    };
    ch(16) | ch(8) | ch(0)
}

/// Persistent + preview layer pair of one size.
pub struct Canvas {
    pub persistent: Layer,
    pub preview: Layer,
}

impl Canvas {
    pub fn new(width: usize, height: usize) -> Self {
        Self { persistent: Layer::new(width, height), preview: Layer::new(width, height) }
    }

    pub fn size(&self) -> (usize, usize) {
        (self.persistent.width, self.persistent.height)
    }

    /// Committed ink is read back and restored; the preview is simply reset.
    pub fn resize(&mut self, width: usize, height: usize) {
        if self.size() == (width, height) {
            return;
        }
        self.persistent.resize_preserving(width, height);
        self.preview.resize_cleared(width, height);
    }

    /// Draw both layers (ink, then preview) onto the screen at (ox, oy).
    pub fn composite_onto(&self, fb: &mut FrameBuffer, ox: i32, oy: i32) {
        self.persistent.composite_onto(fb, ox, oy);
        self.preview.composite_onto(fb, ox, oy);
    }

    /// Encode the committed layer as PNG bytes.
    pub fn encode_png(&self) -> Result<Vec<u8>> {
        let mut out = std::io::Cursor::new(Vec::new());
        self.persistent
            .to_rgba_image()
            .write_to(&mut out, image::ImageFormat::Png)?;
        Ok(out.into_inner())
    }

    /// Save the committed layer as a PNG file.
    pub fn export_png(&self, path: &Path) -> Result<()> {
        self.persistent.to_rgba_image().save_with_format(path, image::ImageFormat::Png)?;
        info!(path = %path.display(), "canvas exported");
        Ok(())
    }
}
