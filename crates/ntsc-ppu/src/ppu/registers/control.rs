use bitflags::bitflags;

use crate::memory;

bitflags! {
    /// `PPUCTRL`, written through port 0.
    ///
    /// ```text
    /// 7 6 5 4 3 2 1 0
    /// N M S B s I n n
    /// ```
    /// `nn` picks the starting nametable and `I` widens the data port step to
    /// a full row. `s` and `B` pick the 8x8 sprite and background pattern
    /// halves, `S` switches sprites to 8x16. `M` is latched but has no effect.
    /// `N` drives the NMI line while vblank is flagged.
    #[derive(Default, Debug, PartialEq, Eq, Clone, Copy, Hash)]
    pub struct Control: u8 {
        const NAMETABLE = 0b0000_0011;
        const INCREMENT_32 = 0b0000_0100;
        const SPRITE_TABLE = 0b0000_1000;
        const BACKGROUND_TABLE = 0b0001_0000;
        const SPRITE_SIZE_16 = 0b0010_0000;
        const MASTER_SLAVE = 0b0100_0000;
        const GENERATE_NMI = 0b1000_0000;
    }
}

impl Control {
    /// Starting nametable, `0..=3`.
    pub fn nametable_index(self) -> u8 {
        self.bits() & 0b11
    }

    /// Step applied to `v` after a data port access outside rendering.
    pub fn vram_increment(self) -> u16 {
        match self.contains(Self::INCREMENT_32) {
            true => 32,
            false => 1,
        }
    }

    /// Pattern half used by 8x8 sprites. Tall sprites pick theirs per tile.
    pub fn sprite_pattern_table(self) -> u16 {
        pattern_half(self.contains(Self::SPRITE_TABLE))
    }

    pub fn background_pattern_table(self) -> u16 {
        pattern_half(self.contains(Self::BACKGROUND_TABLE))
    }

    /// Sprite height in rows (8 or 16).
    pub fn sprite_height(self) -> u8 {
        if self.contains(Self::SPRITE_SIZE_16) { 16 } else { 8 }
    }

    pub fn nmi_enabled(self) -> bool {
        self.intersects(Self::GENERATE_NMI)
    }
}

fn pattern_half(upper: bool) -> u16 {
    if upper {
        memory::PATTERN_TABLE_1
    } else {
        memory::PATTERN_TABLE_0
    }
}
