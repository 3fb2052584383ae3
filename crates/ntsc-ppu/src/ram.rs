use std::ops::{Deref, DerefMut};

// Large blocks can live on the heap to keep `Ppu` cheap to move.
#[cfg(feature = "boxed-ram")]
type Cells<const N: usize> = Box<[u8; N]>;

#[cfg(not(feature = "boxed-ram"))]
type Cells<const N: usize> = [u8; N];

/// Fixed-size byte store backing every PPU-internal memory.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Ram<const N: usize>(Cells<N>);

pub mod ppu {
    use crate::memory;

    /// Nametable storage (CIRAM plus four-screen extension).
    pub type Vram = super::Ram<{ memory::VRAM_SIZE }>;
    pub type PaletteRam = super::Ram<{ memory::PALETTE_RAM_SIZE }>;
    pub type OamRam = super::Ram<{ memory::OAM_RAM_SIZE }>;
    pub type SecondaryOamRam = super::Ram<{ memory::SECONDARY_OAM_RAM_SIZE }>;
    /// One byte per sprite slot on the upcoming scanline.
    pub type SpriteLineRam = super::Ram<8>;
}

impl<const N: usize> Ram<N> {
    pub fn new() -> Self {
        Self(zeroed())
    }

    /// Creates a block with every byte set to `value`.
    pub fn filled(value: u8) -> Self {
        let mut ram = Self::new();
        ram.fill(value);
        ram
    }

    pub fn as_slice(&self) -> &[u8] {
        self.0.as_slice()
    }

    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        self.0.as_mut_slice()
    }
}

impl<const N: usize> Default for Ram<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> Deref for Ram<N> {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        self.as_slice()
    }
}

impl<const N: usize> DerefMut for Ram<N> {
    fn deref_mut(&mut self) -> &mut [u8] {
        self.as_mut_slice()
    }
}

#[cfg(feature = "boxed-ram")]
fn zeroed<const N: usize>() -> Cells<N> {
    Box::new([0; N])
}

#[cfg(not(feature = "boxed-ram"))]
fn zeroed<const N: usize>() -> Cells<N> {
    [0; N]
}
