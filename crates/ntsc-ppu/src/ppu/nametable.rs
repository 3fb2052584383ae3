use core::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{error::Error, memory};

/// Nametable mirroring topology selected by the cartridge.
///
/// The four logical nametables at `$2000/$2400/$2800/$2C00` are folded onto
/// physical 1 KiB pages of internal VRAM.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Mirroring {
    /// `$2000 = $2400`, `$2800 = $2C00` (vertical arrangement, horizontal mirroring).
    #[default]
    Horizontal,
    /// `$2000 = $2800`, `$2400 = $2C00`.
    Vertical,
    /// All four nametables show page A.
    SingleScreenLower,
    /// All four nametables show page B.
    SingleScreenUpper,
    /// Four distinct pages.
    FourScreen,
}

impl Mirroring {
    /// Physical page (0..=3) that backs logical nametable `table` (0..=3).
    #[inline]
    pub fn page(self, table: u16) -> u16 {
        let table = table & 0b11;
        match self {
            Mirroring::Horizontal => table >> 1,
            Mirroring::Vertical => table & 1,
            Mirroring::SingleScreenLower => 0,
            Mirroring::SingleScreenUpper => 1,
            Mirroring::FourScreen => table,
        }
    }

    /// Maps a video address in `$2000-$3EFF` to an offset in internal VRAM.
    #[inline]
    pub fn vram_offset(self, addr: u16) -> usize {
        let relative =
            (addr & memory::VRAM_MIRROR_MASK).wrapping_sub(memory::NAMETABLE_BASE) & 0x0FFF;
        let table = relative / memory::NAMETABLE_SIZE;
        let within = relative % memory::NAMETABLE_SIZE;
        (self.page(table) * memory::NAMETABLE_SIZE + within) as usize
    }
}

impl fmt::Display for Mirroring {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Mirroring::Horizontal => "horizontal",
            Mirroring::Vertical => "vertical",
            Mirroring::SingleScreenLower => "single-screen-a",
            Mirroring::SingleScreenUpper => "single-screen-b",
            Mirroring::FourScreen => "four-screen",
        };
        f.write_str(s)
    }
}

/// Raw topology codes as reported by mappers: 0 = horizontal, 1 = vertical,
/// 2/3 = single screen A/B, 4 = four screen.
impl TryFrom<u8> for Mirroring {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        let mirroring = match value {
            0 => Mirroring::Horizontal,
            1 => Mirroring::Vertical,
            2 => Mirroring::SingleScreenLower,
            3 => Mirroring::SingleScreenUpper,
            4 => Mirroring::FourScreen,
            other => return Err(Error::UnknownMirroring(other)),
        };
        Ok(mirroring)
    }
}
