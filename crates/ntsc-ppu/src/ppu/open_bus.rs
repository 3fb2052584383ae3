/// Frames after which an undriven latch bit decays to 0 (~600 ms at 60 Hz).
const DECAY_FRAMES: u64 = 36;

/// PPU I/O data latch ("open bus").
///
/// Every port write drives all eight bits. Reads drive only the bits the
/// port actually outputs; the rest come back from the latch. Each bit
/// remembers the frame it was last refreshed and reads as 0 once stale.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub(crate) struct PpuOpenBus {
    value: u8,
    refreshed: [u64; 8],
}

impl PpuOpenBus {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn reset(&mut self) {
        *self = Self::new();
    }

    /// Drives the bits selected by `mask` with `value`.
    pub(crate) fn drive(&mut self, mask: u8, value: u8, frame: u64) {
        self.decay(frame);
        self.value = (self.value & !mask) | (value & mask);
        for (bit, stamp) in self.refreshed.iter_mut().enumerate() {
            if mask & (1 << bit) != 0 {
                *stamp = frame;
            }
        }
    }

    /// Completes a port read: `driven` bits come from `value`, the rest from
    /// the latch. The driven bits refresh the latch.
    pub(crate) fn read(&mut self, driven: u8, value: u8, frame: u64) -> u8 {
        self.drive(driven, value, frame);
        self.value
    }

    /// Current latch contents after applying decay.
    pub(crate) fn sample(&mut self, frame: u64) -> u8 {
        self.decay(frame);
        self.value
    }

    /// Latch contents as a read would see them, without touching state.
    pub(crate) fn peek(&self, frame: u64) -> u8 {
        let mut value = self.value;
        for (bit, stamp) in self.refreshed.iter().enumerate() {
            if frame.saturating_sub(*stamp) > DECAY_FRAMES {
                value &= !(1 << bit);
            }
        }
        value
    }

    fn decay(&mut self, frame: u64) {
        self.value = self.peek(frame);
    }
}
