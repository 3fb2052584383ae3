//! Address map of the 14-bit video bus and the CPU-facing port window.

/// Mask applied to every video address bus access (14-bit address space).
pub const VRAM_MIRROR_MASK: u16 = 0x3FFF;

/// Lower and upper pattern halves.
pub const PATTERN_TABLE_0: u16 = 0x0000;
pub const PATTERN_TABLE_1: u16 = 0x1000;
/// `$0000-$1FFF`, served by the cartridge.
pub const CHR_SIZE: usize = 0x2000;
/// Last address (inclusive) routed to the cartridge pattern space.
pub const PATTERN_TABLE_END: u16 = 0x1FFF;

pub const NAMETABLE_BASE: u16 = 0x2000;
/// Size of a single logical nametable in bytes.
pub const NAMETABLE_SIZE: u16 = 0x0400;
/// Offset of the attribute table within a nametable.
pub const ATTRIBUTE_OFFSET: u16 = 0x03C0;

/// Internal nametable storage. The console ships 2 KiB; the extra 2 KiB back
/// four-screen topologies.
pub const VRAM_SIZE: usize = 0x1000;

/// Palette entries start here and repeat every 32 bytes up to `$3FFF`.
pub const PALETTE_BASE: u16 = 0x3F00;
pub const PALETTE_RAM_SIZE: usize = 0x20;

/// 64 sprites of 4 bytes each.
pub const OAM_RAM_SIZE: usize = 0x100;
/// Room for the 8 sprites selected for the next line.
pub const SECONDARY_OAM_RAM_SIZE: usize = 0x20;

/// Ports repeat every 8 bytes across `$2000-$3FFF`.
pub const REGISTER_SELECT_MASK: u16 = 0x0007;

/// CPU-visible PPU register ports.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Register {
    /// `PPUCTRL`, write only.
    Control = 0,
    /// `PPUMASK`, write only.
    Mask = 1,
    /// `PPUSTATUS`, read only.
    Status = 2,
    /// `OAMADDR`, write only.
    OamAddr = 3,
    /// `OAMDATA`, read/write.
    OamData = 4,
    /// `PPUSCROLL`, write twice.
    Scroll = 5,
    /// `PPUADDR`, write twice.
    Addr = 6,
    /// `PPUDATA`, read/write.
    Data = 7,
}

impl Register {
    /// Port selected by a CPU address; only the low three bits decode.
    pub const fn from_cpu_addr(addr: u16) -> Self {
        match addr & REGISTER_SELECT_MASK {
            0 => Register::Control,
            1 => Register::Mask,
            2 => Register::Status,
            3 => Register::OamAddr,
            4 => Register::OamData,
            5 => Register::Scroll,
            6 => Register::Addr,
            _ => Register::Data,
        }
    }

    /// First CPU address that selects this port.
    pub const fn addr(self) -> u16 {
        0x2000 + self as u16
    }
}
