//! Color resolution: palette RAM mirroring, the 64-entry hardware color
//! table, and the greyscale/emphasis modifiers from the mask register.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::registers::Mask;
use crate::memory;

/// 24-bit RGB color.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const BLACK: Color = Color::new(0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Unpacks a `0xRRGGBB` literal.
    pub const fn from_rgb(rgb: u32) -> Self {
        Self::new((rgb >> 16) as u8, (rgb >> 8) as u8, rgb as u8)
    }
}

/// Fixed NTSC hardware color table (`0xRRGGBB`), indexed by 6-bit color.
///
/// `$0D/$1D/$2D/$3D` and the `$xE/$xF` columns render as black or grey.
pub const HARDWARE_COLORS: [u32; 64] = [
    // $00-$0F
    0x666666, 0x002A88, 0x1412A7, 0x3B00A4, 0x5C007E, 0x6E0040, 0x6C0600, 0x561D00,
    0x333500, 0x0B4800, 0x005200, 0x004F08, 0x00404D, 0x000000, 0x000000, 0x000000,
    // $10-$1F
    0xADADAD, 0x155FD9, 0x4240FF, 0x7527FE, 0xA01ACC, 0xB71E7B, 0xB53120, 0x994E00,
    0x6B6D00, 0x388700, 0x0C9300, 0x008F32, 0x007C8D, 0x000000, 0x000000, 0x000000,
    // $20-$2F
    0xFFFEFF, 0x64B0FF, 0x9290FF, 0xC676FF, 0xF36AFF, 0xFE6ECC, 0xFE8170, 0xEA9E22,
    0xBCBE00, 0x88D800, 0x5CE430, 0x45E082, 0x48CDDE, 0x4F4F4F, 0x000000, 0x000000,
    // $30-$3F
    0xFFFEFF, 0xC0DFFF, 0xD3D2FF, 0xE8C8FF, 0xFBC2FF, 0xFEC4EA, 0xFECCC5, 0xF7D8A5,
    0xE4E594, 0xCFEF96, 0xBDF4AB, 0xB3F3CC, 0xB5EBF2, 0xB8B8B8, 0x000000, 0x000000,
];

/// Index mask that collapses a color onto the greyscale column.
const GREYSCALE_MASK: u8 = 0x30;

/// Maps a palette address (`$3F00-$3FFF`) to a palette RAM offset.
///
/// The 32 bytes repeat every 32 addresses, and the sprite backdrop slots
/// `$3F10/$3F14/$3F18/$3F1C` alias `$3F00/$3F04/$3F08/$3F0C`.
#[inline]
pub fn palette_index(addr: u16) -> usize {
    let mut index = usize::from(addr) % memory::PALETTE_RAM_SIZE;
    if index >= 16 && index % 4 == 0 {
        index -= 16;
    }
    index
}

/// Turns 6-bit hardware colors into RGB honoring greyscale and emphasis.
///
/// All eight emphasis combinations are precomputed at construction.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ColorResolver {
    table: [[Color; 64]; 8],
}

impl Default for ColorResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl ColorResolver {
    pub fn new() -> Self {
        let mut table = [[Color::BLACK; 64]; 8];
        for (emphasis, row) in table.iter_mut().enumerate() {
            for (index, slot) in row.iter_mut().enumerate() {
                *slot = emphasize(Color::from_rgb(HARDWARE_COLORS[index]), emphasis as u8);
            }
        }
        Self { table }
    }

    /// Base table entry with no modifiers applied.
    #[inline]
    pub fn base(&self, hw_index: u8) -> Color {
        self.table[0][usize::from(hw_index & 0x3F)]
    }

    /// Resolves a hardware color index under the given mask state.
    ///
    /// Greyscale is applied to the index first, then emphasis to the RGB.
    #[inline]
    pub fn resolve(&self, hw_index: u8, mask: Mask) -> Color {
        let mut index = hw_index & 0x3F;
        if mask.greyscale() {
            index &= GREYSCALE_MASK;
        }
        self.table[usize::from(mask.emphasis())][usize::from(index)]
    }

    /// Resolves a 5-bit palette entry (`group * 4 + color`) through palette RAM,
    /// returning the 6-bit hardware index alongside the final color.
    #[inline]
    pub fn resolve_entry(&self, palette_ram: &[u8], entry: u8, mask: Mask) -> (u8, Color) {
        let hw_index = palette_ram[palette_index(u16::from(entry))] & 0x3F;
        (hw_index, self.resolve(hw_index, mask))
    }
}

/// Darkens the channels whose emphasis bit is clear (`emphasis` = `0bBGR`).
///
/// With no emphasis bit set the color passes through unchanged.
fn emphasize(color: Color, emphasis: u8) -> Color {
    if emphasis == 0 {
        return color;
    }
    let attenuate = |channel: u8, bit: u8| {
        if emphasis & bit != 0 {
            channel
        } else {
            (u16::from(channel) * 3 / 4).min(255) as u8
        }
    };
    Color::new(
        attenuate(color.r, 0b001),
        attenuate(color.g, 0b010),
        attenuate(color.b, 0b100),
    )
}
