#![allow(dead_code)]

use anyhow::{Result, ensure};
use ctor::ctor;
use ntsc_ppu::{ChrRam, ClockResult, Mirroring, Ppu, PpuBus, PpuConfig, Register};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// Tile whose plane 0 is fully set: every pixel has color index 1.
pub const SOLID_TILE: [u8; 16] = [
    0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
];

pub const DOTS_PER_FRAME: usize = 341 * 262;

#[ctor]
fn init_tracing() {
    let subscriber = FmtSubscriber::builder()
        .with_file(true)
        .with_line_number(true)
        .with_max_level(Level::DEBUG)
        .pretty()
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("Failed to set subscriber");
}

/// A PPU wired to an NROM-style CHR RAM board.
#[derive(Debug)]
pub struct Harness {
    pub ppu: Ppu,
    pub chr: ChrRam,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(PpuConfig::default())
    }

    pub fn with_config(config: PpuConfig) -> Self {
        Self {
            ppu: Ppu::with_config(config),
            chr: ChrRam::new(Mirroring::Horizontal),
        }
    }

    pub fn write(&mut self, register: Register, value: u8) {
        let mut bus = PpuBus::with_cartridge(&mut self.chr);
        self.ppu.write_port(register, value, &mut bus);
    }

    pub fn read(&mut self, register: Register) -> u8 {
        let mut bus = PpuBus::with_cartridge(&mut self.chr);
        self.ppu.read_port(register, &mut bus)
    }

    /// Points `v` at `addr` through two address writes.
    pub fn set_addr(&mut self, addr: u16) {
        self.write(Register::Addr, (addr >> 8) as u8);
        self.write(Register::Addr, addr as u8);
    }

    /// Writes `bytes` through the data port starting at `addr`.
    pub fn poke(&mut self, addr: u16, bytes: &[u8]) {
        self.set_addr(addr);
        for &byte in bytes {
            self.write(Register::Data, byte);
        }
    }

    /// Reads one byte through the data port, discarding the stale buffer
    /// for non-palette addresses.
    pub fn peek(&mut self, addr: u16) -> u8 {
        self.set_addr(addr);
        if addr < 0x3F00 {
            self.read(Register::Data);
            self.set_addr(addr);
        }
        self.read(Register::Data)
    }

    /// Resets `t` to nametable 0 scrolled by `(x, y)` pixels.
    pub fn scroll(&mut self, x: u8, y: u8) {
        self.write(Register::Control, 0x00);
        self.write(Register::Scroll, x);
        self.write(Register::Scroll, y);
    }

    /// Loads a full OAM page (unused entries should hold 0xFF).
    pub fn load_oam(&mut self, page: &[u8]) -> Result<()> {
        self.write(Register::OamAddr, 0x00);
        self.ppu.oam_dma(page)?;
        Ok(())
    }

    pub fn clock(&mut self) -> ClockResult {
        let mut bus = PpuBus::with_cartridge(&mut self.chr);
        self.ppu.clock(&mut bus)
    }

    /// Runs to the end of the current frame, returning whether NMI fired.
    pub fn run_frame(&mut self) -> bool {
        let mut bus = PpuBus::with_cartridge(&mut self.chr);
        self.ppu.run_frame(&mut bus)
    }

    pub fn clock_to(&mut self, scanline: i16, dot: u16) -> Result<()> {
        for _ in 0..DOTS_PER_FRAME * 2 {
            if self.ppu.scanline() == scanline && self.ppu.dot() == dot {
                return Ok(());
            }
            self.clock();
        }
        ensure!(
            self.ppu.scanline() == scanline && self.ppu.dot() == dot,
            "never reached scanline {scanline} dot {dot}"
        );
        Ok(())
    }
}

impl Default for Harness {
    fn default() -> Self {
        Self::new()
    }
}

/// OAM page with every sprite parked below the screen.
pub fn empty_oam() -> Vec<u8> {
    vec![0xFF; 256]
}

pub fn place_sprite(oam: &mut [u8], index: usize, y: u8, tile: u8, attributes: u8, x: u8) {
    oam[index * 4..index * 4 + 4].copy_from_slice(&[y, tile, attributes, x]);
}
