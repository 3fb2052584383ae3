use super::VramAddr;

/// Internal VRAM register block using the `v/t/x/w` terminology.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct VramRegisters {
    /// Current VRAM address (`v`).
    pub v: VramAddr,
    /// Temporary VRAM address (`t`).
    pub t: VramAddr,
    /// Fine X scroll component (`x`, 0..7).
    pub x: u8,
    /// Write toggle (`w`): false => first write, true => second write.
    pub w: bool,
}

impl VramRegisters {
    /// Writes to `$2005` (PPUSCROLL), updating coarse X/Y and fine X/Y.
    pub fn write_scroll(&mut self, value: u8) {
        if !self.w {
            self.t.set_coarse_x(value >> 3);
            self.x = value & 0b111;
        } else {
            self.t.set_coarse_y(value >> 3);
            self.t.set_fine_y(value & 0b111);
        }
        self.w = !self.w;
    }

    /// Writes to `$2006` (PPUADDR). The first write sets the high six bits
    /// of `t` (bit 14 cleared), the second the low byte, after which `t` is
    /// loaded into `v`.
    pub fn write_addr(&mut self, value: u8) {
        if !self.w {
            let hi = u16::from(value & 0b0011_1111) << 8;
            let lo = self.t.raw() & 0x00FF;
            self.t.set_raw(hi | lo);
        } else {
            let hi = self.t.raw() & 0x7F00;
            self.t.set_raw(hi | u16::from(value));
            self.v = self.t;
        }
        self.w = !self.w;
    }

    /// Resets the write toggle so the next `$2005/$2006` write is treated
    /// as the first half of the pair.
    pub fn reset_latch(&mut self) {
        self.w = false;
    }

    /// Dot 257: `v` takes the horizontal scroll bits of `t`.
    #[inline]
    pub fn copy_horizontal_bits(&mut self) {
        self.v.copy_horizontal(self.t);
    }

    /// Pre-render dots 280..=304: `v` takes the vertical scroll bits of `t`.
    #[inline]
    pub fn copy_vertical_bits(&mut self) {
        self.v.copy_vertical(self.t);
    }
}
