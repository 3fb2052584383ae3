/// 16-bit left-shifting register used by the background pipeline.
///
/// Layout:
///   [ high 8 bits | low 8 bits ]
///
/// The high byte holds pixels currently "in flight" toward the screen, the
/// low byte receives the next 8 pixels (or repeated palette bits).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
struct Shift16(u16);

impl Shift16 {
    /// Replaces the low byte, preserving the pixels still shifting out.
    #[inline]
    fn load_low_byte(&mut self, byte: u8) {
        self.0 = (self.0 & 0xFF00) | u16::from(byte);
    }

    /// Returns the bit at position `15 - fine_x`.
    ///
    /// Fine X selects which bit is visible instead of delaying the shifts.
    #[inline]
    fn bit_with_fine_x(&self, fine_x: u8) -> u8 {
        let shift = 15 - (fine_x & 0b111);
        ((self.0 >> shift) & 1) as u8
    }

    #[inline]
    fn shift(&mut self) {
        self.0 <<= 1;
    }
}

/// Background pixel produced for one dot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct BgPixel {
    /// Palette group from the attribute table (0..=3).
    pub palette: u8,
    /// Color index within the group (0..=3, 0 means backdrop).
    pub color: u8,
}

impl BgPixel {
    #[inline]
    pub fn is_opaque(self) -> bool {
        self.color != 0
    }
}

/// Bytes latched by the 8-dot fetch cycle, waiting for the next reload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub(crate) struct BgFetchLatch {
    pub(crate) tile: u8,
    /// Palette group already extracted from the attribute byte.
    pub(crate) palette: u8,
    pub(crate) pattern_low: u8,
    pub(crate) pattern_high: u8,
}

/// Background pixel pipeline emulating the four background shifters.
///
/// - 2 pattern shifters (bitplane 0 and bitplane 1),
/// - 2 attribute/palette shifters (palette bit 0 and bit 1).
///
/// Every 8 pixels the low bytes are reloaded from the fetch latch; every
/// rendering dot all four shift one bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct BgPipeline {
    pattern: [Shift16; 2],
    palette: [Shift16; 2],
}

impl BgPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Reloads the low bytes at a tile boundary.
    ///
    /// `tile_pattern` holds `[bitplane0, bitplane1]` for the tile row and
    /// `palette_index` the 2-bit group. Palette bits are replicated across
    /// all 8 pixels so the group stays constant for the whole tile.
    pub fn reload(&mut self, tile_pattern: [u8; 2], palette_index: u8) {
        for (shifter, pattern) in self.pattern.iter_mut().zip(tile_pattern) {
            shifter.load_low_byte(pattern);
        }
        for (i, shifter) in self.palette.iter_mut().enumerate() {
            let bit = (palette_index >> i) & 1;
            shifter.load_low_byte(if bit != 0 { 0xFF } else { 0x00 });
        }
    }

    /// Samples the current background pixel respecting fine X scroll.
    ///
    /// The high plane supplies the MSB of the color index.
    pub fn sample(&self, fine_x: u8) -> BgPixel {
        let pattern_bit0 = self.pattern[0].bit_with_fine_x(fine_x);
        let pattern_bit1 = self.pattern[1].bit_with_fine_x(fine_x);
        let palette_bit0 = self.palette[0].bit_with_fine_x(fine_x);
        let palette_bit1 = self.palette[1].bit_with_fine_x(fine_x);

        BgPixel {
            palette: (palette_bit1 << 1) | palette_bit0,
            color: (pattern_bit1 << 1) | pattern_bit0,
        }
    }

    /// Advances all background shifters by one bit (one dot).
    pub fn shift(&mut self) {
        for shifter in self.pattern.iter_mut().chain(self.palette.iter_mut()) {
            shifter.shift();
        }
    }
}
