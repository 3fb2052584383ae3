use super::sprite::Sprite;
use crate::ram::ppu::{SecondaryOamRam, SpriteLineRam};

/// Maximum sprites the hardware renders on one scanline.
pub(crate) const SPRITES_PER_LINE: usize = 8;

/// Outcome of scanning primary OAM for the next scanline.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub(crate) struct SpriteEvalState {
    /// Up to eight selected sprites, 4 bytes each, in OAM order. Unused
    /// slots hold `0xFF`.
    pub(crate) secondary_oam: SecondaryOamRam,
    /// Number of sprites selected for the next scanline (0..=8).
    pub(crate) count: u8,
    /// Sprite 0 is among the selected sprites.
    pub(crate) sprite0_in_range: bool,
    /// A ninth in-range sprite was found.
    pub(crate) overflow: bool,
}

impl SpriteEvalState {
    pub(crate) fn new() -> Self {
        Self {
            secondary_oam: SecondaryOamRam::filled(0xFF),
            ..Self::default()
        }
    }

    /// Dots 1..=64: secondary OAM is initialised to `0xFF`.
    pub(crate) fn clear(&mut self) {
        self.secondary_oam.fill(0xFF);
        self.count = 0;
        self.sprite0_in_range = false;
        self.overflow = false;
    }

    /// Scans all 64 entries for sprites covering `scanline` (so they appear
    /// on the following line) and copies the first eight into secondary OAM.
    pub(crate) fn evaluate(&mut self, oam: &[u8], scanline: i16, height: u8) {
        self.clear();
        for n in 0..oam.len() / Sprite::BYTES {
            let start = n * Sprite::BYTES;
            if Sprite::row_on(oam[start], scanline, height).is_none() {
                continue;
            }
            if usize::from(self.count) == SPRITES_PER_LINE {
                self.overflow = true;
                break;
            }
            let dst = usize::from(self.count) * Sprite::BYTES;
            self.secondary_oam[dst..dst + Sprite::BYTES]
                .copy_from_slice(&oam[start..start + Sprite::BYTES]);
            if n == 0 {
                self.sprite0_in_range = true;
            }
            self.count += 1;
        }
    }

    /// Decoded sprite held in secondary slot `slot`.
    pub(crate) fn sprite(&self, slot: usize) -> Sprite {
        Sprite::at(&self.secondary_oam, slot)
    }
}

/// Pattern data fetched during dots 257..=320 for the upcoming scanline.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub(crate) struct SpriteLineBuffers {
    pub(crate) attr: SpriteLineRam,
    pub(crate) x: SpriteLineRam,
    pub(crate) pattern_low: SpriteLineRam,
    pub(crate) pattern_high: SpriteLineRam,
    pub(crate) count: u8,
    pub(crate) sprite0_in_range: bool,
}

impl SpriteLineBuffers {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn clear(&mut self) {
        *self = Self::new();
    }

    pub(crate) fn set_meta(&mut self, idx: usize, attr: u8, x: u8) {
        if idx < SPRITES_PER_LINE {
            self.attr[idx] = attr;
            self.x[idx] = x;
        }
    }

    pub(crate) fn set_pattern_low(&mut self, idx: usize, value: u8) {
        if idx < SPRITES_PER_LINE {
            self.pattern_low[idx] = value;
        }
    }

    pub(crate) fn set_pattern_high(&mut self, idx: usize, value: u8) {
        if idx < SPRITES_PER_LINE {
            self.pattern_high[idx] = value;
        }
    }
}
