use std::{
    any::{Any, TypeId},
    collections::HashMap,
    fmt::Debug,
};

use dyn_clone::DynClone;

use crate::ppu::{
    background_pipeline::BgPixel, buffer::FrameBuffer, palette::Color,
    sprite_pipeline::SpritePixel,
};

/// Everything the compositor decided for one visible dot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PixelTrace {
    pub x: u8,
    pub y: u8,
    /// Background sample after left-column clipping.
    pub bg: BgPixel,
    /// Sprite sample after left-column clipping.
    pub sprite: SpritePixel,
    /// Palette RAM entry that won priority (`0x00-0x1F`).
    pub palette_entry: u8,
    /// 6-bit hardware color read from palette RAM.
    pub hw_index: u8,
    /// Final RGB after greyscale and emphasis.
    pub color: Color,
}

/// Hooks invoked by [`Ppu::clock`](crate::Ppu::clock) while it steps.
///
/// Every method has an empty default, so observers only implement what they
/// need. Observers see state, they never alter it.
pub trait PpuObserver: Any + DynClone + Debug + Send + 'static {
    /// An NMI edge was raised (vblank start or a late NMI enable).
    fn on_nmi(&mut self) {}

    /// Vertical blank flag was set at scanline 241, dot 1.
    fn on_vblank_start(&mut self) {}

    /// The last dot of the frame completed.
    fn on_frame_complete(&mut self, _frame: u64, _frame_buffer: &FrameBuffer) {}

    /// Called after every dot with the position that was just executed.
    fn on_scanline_dot(&mut self, _scanline: i16, _dot: u16) {}

    /// A visible pixel was composited and written.
    fn on_pixel(&mut self, _trace: &PixelTrace) {}
}

dyn_clone::clone_trait_object!(PpuObserver);

/// A set of observers keyed by type, dispatched as one.
#[derive(Debug, Default, Clone)]
pub struct ObserverStack {
    layers: HashMap<TypeId, Box<dyn PpuObserver>>,
}

impl ObserverStack {
    pub fn new() -> Self {
        Self {
            layers: HashMap::new(),
        }
    }

    /// Adds an observer, replacing (and returning) one of the same type.
    pub fn add<O>(&mut self, observer: O) -> Option<Box<dyn PpuObserver>>
    where
        O: PpuObserver,
    {
        self.layers.insert(TypeId::of::<O>(), Box::new(observer))
    }

    pub fn remove<O>(&mut self) -> Option<Box<dyn PpuObserver>>
    where
        O: PpuObserver,
    {
        self.layers.remove(&TypeId::of::<O>())
    }

    pub fn clear(&mut self) {
        self.layers.clear();
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    pub fn layer<O: PpuObserver>(&self) -> Option<&O> {
        let layer = self.layers.get(&TypeId::of::<O>())?;
        (layer.as_ref() as &dyn Any).downcast_ref::<O>()
    }

    pub fn layer_mut<O: PpuObserver>(&mut self) -> Option<&mut O> {
        let layer = self.layers.get_mut(&TypeId::of::<O>())?;
        (layer.as_mut() as &mut dyn Any).downcast_mut::<O>()
    }
}

impl PpuObserver for ObserverStack {
    fn on_nmi(&mut self) {
        for observer in self.layers.values_mut() {
            observer.on_nmi();
        }
    }

    fn on_vblank_start(&mut self) {
        for observer in self.layers.values_mut() {
            observer.on_vblank_start();
        }
    }

    fn on_frame_complete(&mut self, frame: u64, frame_buffer: &FrameBuffer) {
        for observer in self.layers.values_mut() {
            observer.on_frame_complete(frame, frame_buffer);
        }
    }

    fn on_scanline_dot(&mut self, scanline: i16, dot: u16) {
        for observer in self.layers.values_mut() {
            observer.on_scanline_dot(scanline, dot);
        }
    }

    fn on_pixel(&mut self, trace: &PixelTrace) {
        for observer in self.layers.values_mut() {
            observer.on_pixel(trace);
        }
    }
}
