//! Output surface written one pixel per visible dot.
//!
//! The engine owns a single plane of packed pixels. The presentation layer
//! reads it between frames (after `clock` reported `frame_complete`).

use core::{fmt, str::FromStr};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::{SCREEN_HEIGHT, SCREEN_WIDTH, palette::Color};
use crate::error::Error;

/// Describes how a logical RGB color is packed into the byte buffer.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ColorFormat {
    /// 16-bit packed RGB using 5 bits per channel (0RRRRRGGGGGBBBBB).
    Rgb555,
    /// 16-bit packed RGB using 5/6/5 bits (RRRRRGGGGGGBBBBB).
    Rgb565,
    /// Packed 24-bit RGB, 3 bytes per pixel in R, G, B order.
    #[default]
    Rgb888,
    /// Packed 32-bit RGBA with constant opaque alpha.
    Rgba8888,
    /// Packed 32-bit BGRA with constant opaque alpha.
    Bgra8888,
    /// Packed 32-bit ARGB with constant opaque alpha.
    Argb8888,
}

impl ColorFormat {
    #[inline]
    pub const fn bytes_per_pixel(self) -> usize {
        match self {
            ColorFormat::Rgb555 | ColorFormat::Rgb565 => 2,
            ColorFormat::Rgb888 => 3,
            ColorFormat::Rgba8888 | ColorFormat::Bgra8888 | ColorFormat::Argb8888 => 4,
        }
    }

    /// Packs `color` into `out` (exactly `bytes_per_pixel` long).
    fn pack(self, color: Color, out: &mut [u8]) {
        match self {
            ColorFormat::Rgb555 => {
                let packed = (u16::from(color.r >> 3) << 10)
                    | (u16::from(color.g >> 3) << 5)
                    | u16::from(color.b >> 3);
                out.copy_from_slice(&packed.to_le_bytes());
            }
            ColorFormat::Rgb565 => {
                let packed = (u16::from(color.r >> 3) << 11)
                    | (u16::from(color.g >> 2) << 5)
                    | u16::from(color.b >> 3);
                out.copy_from_slice(&packed.to_le_bytes());
            }
            ColorFormat::Rgb888 => out.copy_from_slice(&[color.r, color.g, color.b]),
            ColorFormat::Rgba8888 => out.copy_from_slice(&[color.r, color.g, color.b, 0xFF]),
            ColorFormat::Bgra8888 => out.copy_from_slice(&[color.b, color.g, color.r, 0xFF]),
            ColorFormat::Argb8888 => out.copy_from_slice(&[0xFF, color.r, color.g, color.b]),
        }
    }

    /// Inverse of [`pack`](Self::pack). Lossy for the 16-bit formats.
    fn unpack(self, bytes: &[u8]) -> Color {
        match self {
            ColorFormat::Rgb555 => {
                let packed = u16::from_le_bytes([bytes[0], bytes[1]]);
                Color::new(
                    ((packed >> 10) as u8 & 0x1F) << 3,
                    ((packed >> 5) as u8 & 0x1F) << 3,
                    (packed as u8 & 0x1F) << 3,
                )
            }
            ColorFormat::Rgb565 => {
                let packed = u16::from_le_bytes([bytes[0], bytes[1]]);
                Color::new(
                    ((packed >> 11) as u8 & 0x1F) << 3,
                    ((packed >> 5) as u8 & 0x3F) << 2,
                    (packed as u8 & 0x1F) << 3,
                )
            }
            ColorFormat::Rgb888 | ColorFormat::Rgba8888 => Color::new(bytes[0], bytes[1], bytes[2]),
            ColorFormat::Bgra8888 => Color::new(bytes[2], bytes[1], bytes[0]),
            ColorFormat::Argb8888 => Color::new(bytes[1], bytes[2], bytes[3]),
        }
    }
}

impl fmt::Display for ColorFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ColorFormat::Rgb555 => "rgb555",
            ColorFormat::Rgb565 => "rgb565",
            ColorFormat::Rgb888 => "rgb888",
            ColorFormat::Rgba8888 => "rgba8888",
            ColorFormat::Bgra8888 => "bgra8888",
            ColorFormat::Argb8888 => "argb8888",
        };
        f.write_str(s)
    }
}

impl FromStr for ColorFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "rgb555" => Ok(ColorFormat::Rgb555),
            "rgb565" => Ok(ColorFormat::Rgb565),
            "rgb888" | "rgb" => Ok(ColorFormat::Rgb888),
            "rgba8888" | "rgba" => Ok(ColorFormat::Rgba8888),
            "bgra8888" | "bgra" => Ok(ColorFormat::Bgra8888),
            "argb8888" | "argb" => Ok(ColorFormat::Argb8888),
            _ => Err(Error::UnknownColorFormat(s.to_string())),
        }
    }
}

impl TryFrom<&str> for ColorFormat {
    type Error = Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// A 256x240 packed-pixel frame.
#[derive(Clone, PartialEq, Eq)]
pub struct FrameBuffer {
    pixels: Box<[u8]>,
    format: ColorFormat,
}

impl fmt::Debug for FrameBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrameBuffer")
            .field("format", &self.format)
            .field("len", &self.pixels.len())
            .finish()
    }
}

impl Default for FrameBuffer {
    fn default() -> Self {
        Self::new(ColorFormat::default())
    }
}

impl FrameBuffer {
    /// Creates a zeroed framebuffer sized to the screen.
    pub fn new(format: ColorFormat) -> Self {
        let len = SCREEN_WIDTH * SCREEN_HEIGHT * format.bytes_per_pixel();
        Self {
            pixels: vec![0; len].into_boxed_slice(),
            format,
        }
    }

    #[inline]
    pub fn format(&self) -> ColorFormat {
        self.format
    }

    /// Bytes per scanline.
    #[inline]
    pub fn pitch(&self) -> usize {
        SCREEN_WIDTH * self.format.bytes_per_pixel()
    }

    #[inline]
    pub fn len_bytes(&self) -> usize {
        self.pixels.len()
    }

    /// Raw packed pixels, row-major.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.pixels
    }

    /// Copies the packed frame into `dst`, which must match [`len_bytes`](Self::len_bytes).
    pub fn copy_to(&self, dst: &mut [u8]) -> Result<(), Error> {
        if dst.len() != self.pixels.len() {
            return Err(Error::BufferSize {
                expected: self.pixels.len(),
                actual: dst.len(),
            });
        }
        dst.copy_from_slice(&self.pixels);
        Ok(())
    }

    /// Writes a single pixel at `(x, y)`.
    #[inline]
    pub fn write_color(&mut self, x: usize, y: usize, color: Color) {
        let bpp = self.format.bytes_per_pixel();
        let idx = y * self.pitch() + x * bpp;
        self.format.pack(color, &mut self.pixels[idx..idx + bpp]);
    }

    /// Reads back the pixel at `(x, y)`.
    pub fn pixel(&self, x: usize, y: usize) -> Color {
        let bpp = self.format.bytes_per_pixel();
        let idx = y * self.pitch() + x * bpp;
        self.format.unpack(&self.pixels[idx..idx + bpp])
    }

    /// Fills every pixel with `color`.
    pub fn fill(&mut self, color: Color) {
        let bpp = self.format.bytes_per_pixel();
        let mut packed = [0u8; 4];
        self.format.pack(color, &mut packed[..bpp]);
        for chunk in self.pixels.chunks_exact_mut(bpp) {
            chunk.copy_from_slice(&packed[..bpp]);
        }
    }
}
