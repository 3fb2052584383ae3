use core::{fmt, str::FromStr};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{error::Error, ppu::buffer::ColorFormat, ppu::nametable::Mirroring};

/// Which mask state shortens odd frames by one dot.
///
/// Hardware skips the last pre-render dot on odd frames while rendering is
/// enabled. Some references gate it on the background bit alone; `Never`
/// turns the skip off for fixed-length frames.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum OddFrameSkip {
    /// Skip when background or sprite rendering is on.
    #[default]
    RenderingEnabled,
    /// Skip only when background rendering is on.
    BackgroundEnabled,
    Never,
}

impl OddFrameSkip {
    /// Whether the skip applies under the given enables.
    pub fn applies(self, background: bool, sprites: bool) -> bool {
        match self {
            OddFrameSkip::RenderingEnabled => background || sprites,
            OddFrameSkip::BackgroundEnabled => background,
            OddFrameSkip::Never => false,
        }
    }
}

impl fmt::Display for OddFrameSkip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            OddFrameSkip::RenderingEnabled => "rendering",
            OddFrameSkip::BackgroundEnabled => "background",
            OddFrameSkip::Never => "never",
        };
        f.write_str(s)
    }
}

impl FromStr for OddFrameSkip {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "rendering" | "rendering-enabled" => Ok(OddFrameSkip::RenderingEnabled),
            "background" | "background-enabled" => Ok(OddFrameSkip::BackgroundEnabled),
            "never" | "off" => Ok(OddFrameSkip::Never),
            _ => Err(Error::UnknownOddFrameSkip(s.to_string())),
        }
    }
}

/// Construction-time options for [`Ppu`](crate::Ppu).
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PpuConfig {
    /// Topology used when no cartridge is attached to the bus.
    pub mirroring: Mirroring,
    /// Pixel packing of the frame buffer.
    pub color_format: ColorFormat,
    pub odd_frame_skip: OddFrameSkip,
}

impl PpuConfig {
    pub fn with_mirroring(mut self, mirroring: Mirroring) -> Self {
        self.mirroring = mirroring;
        self
    }

    pub fn with_color_format(mut self, color_format: ColorFormat) -> Self {
        self.color_format = color_format;
        self
    }

    pub fn with_odd_frame_skip(mut self, odd_frame_skip: OddFrameSkip) -> Self {
        self.odd_frame_skip = odd_frame_skip;
        self
    }
}
