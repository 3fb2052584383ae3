//! Dot-accurate NTSC picture processing unit.
//!
//! The crate models the video chip of an 8-bit console: the `$2000-$2007`
//! register ports, the background and sprite pipelines, palette/color
//! resolution and the 262-line frame timing. A host drives it one dot at a
//! time and hands it a [`PpuBus`] each call so the cartridge can supply
//! pattern data and nametable mirroring.
//!
//! ```no_run
//! use ntsc_ppu::{ChrRam, Mirroring, Ppu, PpuBus};
//!
//! let mut ppu = Ppu::new();
//! let mut chr = ChrRam::new(Mirroring::Vertical);
//! let mut bus = PpuBus::with_cartridge(&mut chr);
//! ppu.cpu_write(0x2001, 0x1E, &mut bus);
//! loop {
//!     if ppu.clock(&mut bus).frame_complete {
//!         break;
//!     }
//! }
//! let _pixels = ppu.frame_buffer().as_bytes();
//! ```

pub mod config;
pub mod error;
pub mod memory;
pub mod observer;
pub mod ppu;
pub mod ram;

pub use config::{OddFrameSkip, PpuConfig};
pub use error::Error;
pub use memory::Register;
pub use observer::{ObserverStack, PixelTrace, PpuObserver};
pub use ppu::{
    ClockResult, Ppu, SCREEN_HEIGHT, SCREEN_WIDTH,
    buffer::{ColorFormat, FrameBuffer},
    nametable::Mirroring,
    palette::{Color, ColorResolver, HARDWARE_COLORS},
    pattern_bus::{ChrBus, ChrRam, PpuBus},
    registers::{Control, Mask, Status, VramAddr},
};
