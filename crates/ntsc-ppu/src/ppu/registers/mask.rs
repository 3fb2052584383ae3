use bitflags::bitflags;

bitflags! {
    /// PPU mask register (`$2001`).
    ///
    /// Bit layout:
    /// ```text
    /// 7 6 5 4 3 2 1 0
    /// B G R S B s b g
    /// ```
    /// - `g`: greyscale
    /// - `b`: show background in leftmost 8 pixels
    /// - `s`: show sprites in leftmost 8 pixels
    /// - `B`: background enable
    /// - `S`: sprite enable
    /// - `R/G/B`: color emphasis bits
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Mask: u8 {
        const GREYSCALE = 0b0000_0001;
        const SHOW_BACKGROUND_LEFT = 0b0000_0010;
        const SHOW_SPRITES_LEFT = 0b0000_0100;
        const SHOW_BACKGROUND = 0b0000_1000;
        const SHOW_SPRITES = 0b0001_0000;
        const EMPHASIZE_RED = 0b0010_0000;
        const EMPHASIZE_GREEN = 0b0100_0000;
        const EMPHASIZE_BLUE = 0b1000_0000;

        const EMPHASIS = Self::EMPHASIZE_RED.bits()
            | Self::EMPHASIZE_GREEN.bits()
            | Self::EMPHASIZE_BLUE.bits();
    }
}

impl Mask {
    pub fn greyscale(self) -> bool {
        self.contains(Mask::GREYSCALE)
    }

    /// Emphasis bits shifted down to `0bBGR`.
    pub fn emphasis(self) -> u8 {
        (self & Mask::EMPHASIS).bits() >> 5
    }
}

/// Render enables derived from [`Mask`], recomputed on every mask write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct RenderFlags {
    pub background: bool,
    pub sprites: bool,
    pub background_left: bool,
    pub sprites_left: bool,
}

impl RenderFlags {
    pub fn from_mask(mask: Mask) -> Self {
        Self {
            background: mask.contains(Mask::SHOW_BACKGROUND),
            sprites: mask.contains(Mask::SHOW_SPRITES),
            background_left: mask.contains(Mask::SHOW_BACKGROUND_LEFT),
            sprites_left: mask.contains(Mask::SHOW_SPRITES_LEFT),
        }
    }

    /// Either layer enabled; gates fetches and address side effects.
    #[inline]
    pub fn rendering(self) -> bool {
        self.background || self.sprites
    }

    /// Whether the background is visible at column `x` (left clipping applied).
    #[inline]
    pub fn background_visible_at(self, x: usize) -> bool {
        self.background && (x >= 8 || self.background_left)
    }

    #[inline]
    pub fn sprites_visible_at(self, x: usize) -> bool {
        self.sprites && (x >= 8 || self.sprites_left)
    }
}
