use super::nametable::Mirroring;
use crate::memory;

/// Cartridge side of the video bus: pattern tables and nametable topology.
///
/// Mappers implement this to expose CHR ROM/RAM at `$0000-$1FFF` and to
/// report the current mirroring, which may change at runtime.
pub trait ChrBus {
    /// Reads a pattern byte (`addr` in `$0000-$1FFF`).
    fn chr_read(&mut self, addr: u16) -> u8;

    /// Writes a pattern byte. CHR ROM implementations ignore this.
    fn chr_write(&mut self, addr: u16, value: u8);

    /// Nametable topology currently selected by the cartridge.
    fn mirroring(&self) -> Mirroring;
}

/// Temporary view that lets the PPU reach the cartridge without storing it.
///
/// The host creates one of these per PPU call, so lifetimes remain explicit
/// and borrow-checked.
#[derive(Default)]
pub struct PpuBus<'a> {
    cartridge: Option<&'a mut dyn ChrBus>,
}

impl<'a> PpuBus<'a> {
    pub fn new(cartridge: Option<&'a mut dyn ChrBus>) -> Self {
        Self { cartridge }
    }

    /// Bus with nothing plugged in: pattern reads return 0.
    pub fn detached() -> Self {
        Self { cartridge: None }
    }

    pub fn with_cartridge(cartridge: &'a mut dyn ChrBus) -> Self {
        Self {
            cartridge: Some(cartridge),
        }
    }

    /// CHR bus read convenience method that always returns a byte.
    #[inline]
    pub fn chr_read(&mut self, addr: u16) -> u8 {
        match self.cartridge.as_deref_mut() {
            Some(cart) => cart.chr_read(addr & memory::PATTERN_TABLE_END),
            None => 0,
        }
    }

    #[inline]
    pub fn chr_write(&mut self, addr: u16, value: u8) {
        if let Some(cart) = self.cartridge.as_deref_mut() {
            cart.chr_write(addr & memory::PATTERN_TABLE_END, value);
        }
    }

    /// Cartridge topology, or `fallback` when nothing is attached.
    #[inline]
    pub fn mirroring(&self, fallback: Mirroring) -> Mirroring {
        self.cartridge
            .as_deref()
            .map_or(fallback, |cart| cart.mirroring())
    }
}

/// Plain 8 KiB pattern store with fixed mirroring (NROM-style boards).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChrRam {
    data: Box<[u8; memory::CHR_SIZE]>,
    mirroring: Mirroring,
    writable: bool,
}

impl ChrRam {
    /// Writable CHR RAM, zero filled.
    pub fn new(mirroring: Mirroring) -> Self {
        Self {
            data: Box::new([0; memory::CHR_SIZE]),
            mirroring,
            writable: true,
        }
    }

    /// Read-only CHR ROM. Shorter images repeat across the 8 KiB window.
    pub fn rom(image: &[u8], mirroring: Mirroring) -> Self {
        let mut data = Box::new([0; memory::CHR_SIZE]);
        if !image.is_empty() {
            for (dst, src) in data.iter_mut().zip(image.iter().cycle()) {
                *dst = *src;
            }
        }
        Self {
            data,
            mirroring,
            writable: false,
        }
    }

    pub fn set_mirroring(&mut self, mirroring: Mirroring) {
        self.mirroring = mirroring;
    }

    /// Writes one 16-byte tile (plane 0 rows then plane 1 rows) at `tile`
    /// in pattern table `table` (0 or 1). Ignores the write-protect flag.
    pub fn load_tile(&mut self, table: u8, tile: u8, planes: &[u8; 16]) {
        let base = usize::from(table & 1) * 0x1000 + usize::from(tile) * 16;
        self.data[base..base + 16].copy_from_slice(planes);
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data[..]
    }
}

impl ChrBus for ChrRam {
    fn chr_read(&mut self, addr: u16) -> u8 {
        self.data[usize::from(addr) & (memory::CHR_SIZE - 1)]
    }

    fn chr_write(&mut self, addr: u16, value: u8) {
        if self.writable {
            self.data[usize::from(addr) & (memory::CHR_SIZE - 1)] = value;
        }
    }

    fn mirroring(&self) -> Mirroring {
        self.mirroring
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detached_bus_reads_zero_and_uses_fallback_mirroring() {
        let mut bus = PpuBus::detached();
        assert_eq!(bus.chr_read(0x0123), 0);
        bus.chr_write(0x0123, 0xFF);
        assert_eq!(bus.mirroring(Mirroring::Vertical), Mirroring::Vertical);
    }

    #[test]
    fn chr_rom_ignores_writes() {
        let mut rom = ChrRam::rom(&[0xAB; 16], Mirroring::Vertical);
        let mut bus = PpuBus::with_cartridge(&mut rom);
        bus.chr_write(0x0000, 0x00);
        assert_eq!(bus.chr_read(0x0000), 0xAB);
        assert_eq!(bus.chr_read(0x1FFF), 0xAB, "short images repeat");
        assert_eq!(bus.mirroring(Mirroring::Horizontal), Mirroring::Vertical);
    }

    #[test]
    fn load_tile_targets_selected_table() {
        let mut chr = ChrRam::new(Mirroring::Horizontal);
        let mut planes = [0u8; 16];
        planes[0] = 0x81;
        planes[15] = 0x7E;
        chr.load_tile(1, 2, &planes);
        assert_eq!(chr.chr_read(0x1020), 0x81);
        assert_eq!(chr.chr_read(0x102F), 0x7E);
    }
}
