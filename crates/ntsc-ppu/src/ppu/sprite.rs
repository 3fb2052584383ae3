use bitflags::bitflags;

bitflags! {
    /// Attribute bits stored in sprite byte 2.
    ///
    /// Bit layout:
    /// ```text
    /// 7 6 5 4 3 2 1 0
    /// V H P . . . p p
    /// ```
    /// - `V`: Vertical flip
    /// - `H`: Horizontal flip
    /// - `P`: Priority (behind background when set)
    /// - `p`: Sprite palette select (0..=3)
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct SpriteAttributes: u8 {
        const PALETTE = 0b0000_0011;
        /// When set, sprite is drawn behind opaque background pixels.
        const PRIORITY_BEHIND_BACKGROUND = 0b0010_0000;
        const FLIP_HORIZONTAL = 0b0100_0000;
        const FLIP_VERTICAL = 0b1000_0000;
    }
}

impl SpriteAttributes {
    #[inline]
    pub fn palette(self) -> u8 {
        self.bits() & 0b11
    }
}

/// One decoded sprite entry from primary or secondary OAM.
///
/// Each sprite occupies four consecutive bytes:
/// - byte 0: Y position (top row minus one)
/// - byte 1: tile index
/// - byte 2: attribute bits (see [`SpriteAttributes`])
/// - byte 3: X position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Sprite {
    pub y: u8,
    pub tile: u8,
    pub attributes: SpriteAttributes,
    pub x: u8,
}

impl Sprite {
    pub const BYTES: usize = 4;

    #[inline]
    pub fn from_bytes(bytes: [u8; 4]) -> Self {
        Self {
            y: bytes[0],
            tile: bytes[1],
            attributes: SpriteAttributes::from_bits_retain(bytes[2]),
            x: bytes[3],
        }
    }

    /// Reads sprite `index` (0..=63) from a primary OAM slice.
    #[inline]
    pub fn at(oam: &[u8], index: usize) -> Self {
        let start = index * Self::BYTES;
        Self::from_bytes([oam[start], oam[start + 1], oam[start + 2], oam[start + 3]])
    }

    /// Row within the sprite covered by `scanline`, if any.
    #[inline]
    pub fn row_on(y: u8, scanline: i16, height: u8) -> Option<u8> {
        let row = scanline - i16::from(y);
        (0..i16::from(height)).contains(&row).then_some(row as u8)
    }

    /// Pattern table address of the plane-0 byte for `row` (0..height).
    ///
    /// 8x8 sprites use the control register's sprite table. 8x16 sprites
    /// take the table from tile bit 0 and pair tiles `n & 0xFE` (top) with
    /// `(n & 0xFE) + 1` (bottom). Vertical flip mirrors the row.
    pub fn pattern_addr(&self, row: u8, height: u8, sprite_table: u16) -> u16 {
        let row = if self.attributes.contains(SpriteAttributes::FLIP_VERTICAL) {
            height - 1 - row
        } else {
            row
        };
        if height == 16 {
            let table = u16::from(self.tile & 1) * 0x1000;
            let tile = u16::from(self.tile & 0xFE) + u16::from(row >> 3);
            table + tile * 16 + u16::from(row & 7)
        } else {
            sprite_table + u16::from(self.tile) * 16 + u16::from(row & 7)
        }
    }
}
