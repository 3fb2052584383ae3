//! Picture Processing Unit (PPU) engine.
//!
//! The engine is driven one dot at a time through [`Ppu::clock`]. A frame is
//! 262 scanlines of 341 dots:
//!
//! - `-1`: pre-render line, clears the status flags and reloads vertical scroll
//! - `0..=239`: visible lines, one pixel per dot 1..=256
//! - `240`: post-render, idle
//! - `241..=260`: vertical blank, entered at dot 1 of line 241
//!
//! `(scanline, dot)` always names the next dot to execute. Register ports are
//! reached through [`Ppu::cpu_read`]/[`Ppu::cpu_write`]; pattern tables and the
//! nametable topology come from the cartridge through a [`PpuBus`] built per
//! call.

pub mod background_pipeline;
pub mod buffer;
pub mod nametable;
pub mod palette;
pub mod pattern_bus;
pub mod registers;
pub mod sprite;
pub mod sprite_pipeline;

mod open_bus;
mod sprite_state;

use core::{any::Any, fmt, mem};

use tracing::{debug, trace, warn};

use crate::{
    config::PpuConfig,
    error::Error,
    memory::{self, Register},
    observer::{PixelTrace, PpuObserver},
    ram::ppu::{PaletteRam, Vram},
};
use background_pipeline::{BgFetchLatch, BgPipeline, BgPixel};
use buffer::FrameBuffer;
use nametable::Mirroring;
use open_bus::PpuOpenBus;
use palette::{ColorResolver, palette_index};
use pattern_bus::PpuBus;
use registers::{Control, Mask, Registers, Status, VramAddr};
use sprite::Sprite;
use sprite_pipeline::{SpritePipeline, SpritePixel};
use sprite_state::{SPRITES_PER_LINE, SpriteEvalState, SpriteLineBuffers};

pub const SCREEN_WIDTH: usize = 256;
pub const SCREEN_HEIGHT: usize = 240;

const DOTS_PER_SCANLINE: u16 = 341;
const PRE_RENDER_SCANLINE: i16 = -1;
const LAST_VISIBLE_SCANLINE: i16 = 239;
const VBLANK_SCANLINE: i16 = 241;
const LAST_SCANLINE: i16 = 260;
/// Pre-render dot after which odd frames jump straight to `(0, 0)`.
const ODD_FRAME_SKIP_DOT: u16 = 339;

/// What happened during one [`Ppu::clock`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ClockResult {
    /// The last dot of the frame was executed; the frame buffer is complete.
    pub frame_complete: bool,
    /// An NMI edge was raised since the previous clock (vblank entry or a
    /// control write enabling NMI during vblank).
    pub nmi: bool,
}

#[derive(Clone)]
pub struct Ppu {
    /// CPU visible registers, OAM and the `v/t/x/w` latches.
    registers: Registers,
    /// Internal nametable storage.
    vram: Vram,
    /// Palette RAM. Addresses `$3F00-$3FFF` fold onto these 32 bytes.
    palette_ram: PaletteRam,
    /// I/O data latch feeding undriven read bits.
    open_bus: PpuOpenBus,
    bg_pipeline: BgPipeline,
    bg_latch: BgFetchLatch,
    /// Secondary OAM result for the next scanline.
    sprite_eval: SpriteEvalState,
    /// Sprite patterns fetched on dots 257..=320.
    sprite_line: SpriteLineBuffers,
    /// Sprites being drawn on the current scanline.
    sprite_pipeline: SpritePipeline,
    resolver: ColorResolver,
    frame_buffer: FrameBuffer,
    config: PpuConfig,
    /// Next scanline to execute (`-1..=260`).
    scanline: i16,
    /// Next dot to execute (`0..=340`).
    dot: u16,
    /// Completed frames since power-on.
    frame: u64,
    /// Current level of `vblank && nmi_enable`.
    nmi_line: bool,
    /// Edge raised outside `clock`, reported by the next clock.
    nmi_pending: bool,
    /// Status was read right before vblank would be set.
    suppress_vblank: bool,
    observer: Option<Box<dyn PpuObserver>>,
}

impl fmt::Debug for Ppu {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ppu")
            .field("registers", &self.registers)
            .field("scanline", &self.scanline)
            .field("dot", &self.dot)
            .field("frame", &self.frame)
            .field("nmi_line", &self.nmi_line)
            .field("config", &self.config)
            .field("observer", &self.observer)
            .finish()
    }
}

impl Default for Ppu {
    fn default() -> Self {
        Self::new()
    }
}

impl Ppu {
    /// Creates a PPU in its power-on state with the default configuration.
    pub fn new() -> Self {
        Self::with_config(PpuConfig::default())
    }

    pub fn with_config(config: PpuConfig) -> Self {
        debug!(
            mirroring = %config.mirroring,
            color_format = %config.color_format,
            odd_frame_skip = %config.odd_frame_skip,
            "creating ppu"
        );
        Self {
            registers: Registers::new(),
            vram: Vram::new(),
            palette_ram: PaletteRam::new(),
            open_bus: PpuOpenBus::new(),
            bg_pipeline: BgPipeline::new(),
            bg_latch: BgFetchLatch::default(),
            sprite_eval: SpriteEvalState::new(),
            sprite_line: SpriteLineBuffers::new(),
            sprite_pipeline: SpritePipeline::new(),
            resolver: ColorResolver::new(),
            frame_buffer: FrameBuffer::new(config.color_format),
            config,
            scanline: PRE_RENDER_SCANLINE,
            dot: 0,
            frame: 0,
            nmi_line: false,
            nmi_pending: false,
            suppress_vblank: false,
            observer: None,
        }
    }

    /// Restores the power-on state. Configuration, observer and the frame
    /// buffer contents are kept.
    pub fn reset(&mut self) {
        debug!(frame = self.frame, "resetting ppu");
        self.registers.reset();
        self.vram.fill(0);
        self.palette_ram.fill(0);
        self.open_bus.reset();
        self.bg_pipeline.clear();
        self.bg_latch = BgFetchLatch::default();
        self.sprite_eval.clear();
        self.sprite_line.clear();
        self.sprite_pipeline.clear();
        self.scanline = PRE_RENDER_SCANLINE;
        self.dot = 0;
        self.frame = 0;
        self.nmi_line = false;
        self.nmi_pending = false;
        self.suppress_vblank = false;
    }

    pub fn config(&self) -> &PpuConfig {
        &self.config
    }

    /// Replaces the topology used when no cartridge is attached.
    pub fn set_mirroring(&mut self, mirroring: Mirroring) {
        debug!(from = %self.config.mirroring, to = %mirroring, "mirroring override");
        self.config.mirroring = mirroring;
    }

    /// Installs an observer, returning the previous one.
    pub fn set_observer<O: PpuObserver>(&mut self, observer: O) -> Option<Box<dyn PpuObserver>> {
        self.observer.replace(Box::new(observer))
    }

    pub fn take_observer(&mut self) -> Option<Box<dyn PpuObserver>> {
        self.observer.take()
    }

    /// The installed observer, if it is an `O`.
    pub fn observer<O: PpuObserver>(&self) -> Option<&O> {
        let observer = self.observer.as_deref()?;
        (observer as &dyn Any).downcast_ref::<O>()
    }

    pub fn observer_mut<O: PpuObserver>(&mut self) -> Option<&mut O> {
        let observer = self.observer.as_deref_mut()?;
        (observer as &mut dyn Any).downcast_mut::<O>()
    }

    /// Handles CPU writes to the mirrored register window (`$2000-$3FFF`).
    pub fn cpu_write(&mut self, addr: u16, value: u8, bus: &mut PpuBus<'_>) {
        self.write_port(Register::from_cpu_addr(addr), value, bus);
    }

    /// Handles CPU reads from the mirrored register window (`$2000-$3FFF`).
    pub fn cpu_read(&mut self, addr: u16, bus: &mut PpuBus<'_>) -> u8 {
        self.read_port(Register::from_cpu_addr(addr), bus)
    }

    pub fn write_port(&mut self, register: Register, value: u8, bus: &mut PpuBus<'_>) {
        self.open_bus.drive(0xFF, value, self.frame);
        match register {
            Register::Control => {
                self.registers.write_control(value);
                self.raise_nmi_on_edge();
            }
            Register::Mask => self.registers.write_mask(value),
            Register::Status => {}
            Register::OamAddr => self.registers.oam_addr = value,
            Register::OamData => self.registers.write_oam_data(value),
            Register::Scroll => self.registers.vram.write_scroll(value),
            Register::Addr => self.registers.vram.write_addr(value),
            Register::Data => self.write_data(value, bus),
        }
    }

    pub fn read_port(&mut self, register: Register, bus: &mut PpuBus<'_>) -> u8 {
        match register {
            Register::Status => self.read_status(),
            Register::OamData => {
                let value = self.registers.read_oam_data();
                self.open_bus.read(0xFF, value, self.frame)
            }
            Register::Data => {
                let value = self.read_data(bus);
                self.open_bus.read(0xFF, value, self.frame)
            }
            // Write-only ports return whatever lingers on the latch.
            _ => self.open_bus.sample(self.frame),
        }
    }

    /// Status as a read would return it, without clearing anything.
    pub fn peek_status(&self) -> u8 {
        let flags = self.registers.status.bits() & Status::DRIVEN_MASK;
        flags | (self.open_bus.peek(self.frame) & !Status::DRIVEN_MASK)
    }

    /// Copies a 256-byte page into OAM starting at the OAM cursor.
    pub fn oam_dma(&mut self, page: &[u8]) -> Result<(), Error> {
        if page.len() != memory::OAM_RAM_SIZE {
            warn!(len = page.len(), "rejected oam dma page");
            return Err(Error::DmaPageLength { actual: page.len() });
        }
        for &byte in page {
            self.registers.write_oam_data(byte);
        }
        if let Some(&last) = page.last() {
            self.open_bus.drive(0xFF, last, self.frame);
        }
        Ok(())
    }

    /// Executes one dot and advances to the next.
    pub fn clock(&mut self, bus: &mut PpuBus<'_>) -> ClockResult {
        let scanline = self.scanline;
        let dot = self.dot;

        match scanline {
            PRE_RENDER_SCANLINE => {
                if dot == 1 {
                    self.registers.status.remove(
                        Status::VERTICAL_BLANK | Status::SPRITE_OVERFLOW | Status::SPRITE_ZERO_HIT,
                    );
                    self.update_nmi_line();
                    // Nothing is evaluated on this line, so line 0 has no sprites.
                    self.sprite_eval.clear();
                }
                self.render_dot(bus, scanline, dot);
            }
            0..=LAST_VISIBLE_SCANLINE => self.render_dot(bus, scanline, dot),
            VBLANK_SCANLINE if dot == 1 => self.enter_vblank(),
            _ => {}
        }

        if let Some(observer) = self.observer.as_mut() {
            observer.on_scanline_dot(scanline, dot);
        }

        let frame_complete = self.advance();
        if frame_complete {
            trace!(frame = self.frame, "frame complete");
            if let Some(observer) = self.observer.as_mut() {
                observer.on_frame_complete(self.frame, &self.frame_buffer);
            }
        }

        ClockResult {
            frame_complete,
            nmi: mem::take(&mut self.nmi_pending),
        }
    }

    /// Clocks until a frame completes, returning whether any NMI was raised.
    pub fn run_frame(&mut self, bus: &mut PpuBus<'_>) -> bool {
        let mut nmi = false;
        loop {
            let result = self.clock(bus);
            nmi |= result.nmi;
            if result.frame_complete {
                return nmi;
            }
        }
    }

    pub fn frame_buffer(&self) -> &FrameBuffer {
        &self.frame_buffer
    }

    /// Mutable access for hosts that want a known background before
    /// rendering is enabled.
    pub fn frame_buffer_mut(&mut self) -> &mut FrameBuffer {
        &mut self.frame_buffer
    }

    #[inline]
    pub fn scanline(&self) -> i16 {
        self.scanline
    }

    #[inline]
    pub fn dot(&self) -> u16 {
        self.dot
    }

    /// Completed frames since power-on or reset.
    #[inline]
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Level of the NMI output (`vblank && nmi_enable`).
    pub fn nmi_line(&self) -> bool {
        self.nmi_line
    }

    pub fn control(&self) -> Control {
        self.registers.control
    }

    pub fn mask(&self) -> Mask {
        self.registers.mask
    }

    pub fn status(&self) -> Status {
        self.registers.status
    }

    /// Current VRAM address `v`.
    pub fn vram_addr(&self) -> VramAddr {
        self.registers.vram.v
    }

    /// Temporary VRAM address `t`.
    pub fn temp_addr(&self) -> VramAddr {
        self.registers.vram.t
    }

    pub fn fine_x(&self) -> u8 {
        self.registers.vram.x
    }

    /// Shared first/second write toggle `w`.
    pub fn write_toggle(&self) -> bool {
        self.registers.vram.w
    }

    pub fn oam_addr(&self) -> u8 {
        self.registers.oam_addr
    }

    pub fn oam(&self) -> &[u8] {
        &self.registers.oam
    }

    pub fn palette_ram(&self) -> &[u8] {
        &self.palette_ram
    }

    pub fn vram(&self) -> &[u8] {
        &self.vram
    }

    fn read_status(&mut self) -> u8 {
        if self.scanline == VBLANK_SCANLINE && self.dot == 1 {
            trace!(frame = self.frame, "status read races vblank");
            self.suppress_vblank = true;
        }
        let flags = self.registers.status.bits() & Status::DRIVEN_MASK;
        self.registers.status.remove(Status::VERTICAL_BLANK);
        self.registers.vram.reset_latch();
        self.update_nmi_line();
        self.open_bus.read(Status::DRIVEN_MASK, flags, self.frame)
    }

    fn write_data(&mut self, value: u8, bus: &mut PpuBus<'_>) {
        let addr = self.registers.vram.v.bus_addr();
        self.write_vram(bus, addr, value);
        self.advance_data_addr();
    }

    fn read_data(&mut self, bus: &mut PpuBus<'_>) -> u8 {
        let addr = self.registers.vram.v.bus_addr();
        let value = if addr >= memory::PALETTE_BASE {
            // Palette reads are immediate; the buffer picks up the nametable
            // byte underneath.
            self.registers.vram_buffer = self.read_vram(bus, addr - 0x1000);
            self.read_vram(bus, addr)
        } else {
            let buffered = self.registers.vram_buffer;
            self.registers.vram_buffer = self.read_vram(bus, addr);
            buffered
        };
        self.advance_data_addr();
        value
    }

    fn advance_data_addr(&mut self) {
        if self.rendering_active() {
            self.registers.vram.v.increment_coarse_x();
            self.registers.vram.v.increment_y();
        } else {
            let step = self.registers.control.vram_increment();
            self.registers.vram.v.increment(step);
        }
    }

    /// Rendering enabled on a line that fetches (pre-render or visible).
    fn rendering_active(&self) -> bool {
        self.registers.render.rendering()
            && (PRE_RENDER_SCANLINE..=LAST_VISIBLE_SCANLINE).contains(&self.scanline)
    }

    fn read_vram(&self, bus: &mut PpuBus<'_>, addr: u16) -> u8 {
        let addr = addr & memory::VRAM_MIRROR_MASK;
        match addr {
            0..=memory::PATTERN_TABLE_END => bus.chr_read(addr),
            memory::NAMETABLE_BASE..memory::PALETTE_BASE => {
                self.vram[self.nametable_offset(bus, addr)]
            }
            _ => self.palette_ram[palette_index(addr)],
        }
    }

    fn write_vram(&mut self, bus: &mut PpuBus<'_>, addr: u16, value: u8) {
        let addr = addr & memory::VRAM_MIRROR_MASK;
        match addr {
            0..=memory::PATTERN_TABLE_END => bus.chr_write(addr, value),
            memory::NAMETABLE_BASE..memory::PALETTE_BASE => {
                let offset = self.nametable_offset(bus, addr);
                self.vram[offset] = value;
            }
            _ => self.palette_ram[palette_index(addr)] = value,
        }
    }

    fn nametable_offset(&self, bus: &PpuBus<'_>, addr: u16) -> usize {
        bus.mirroring(self.config.mirroring).vram_offset(addr)
    }

    /// Recomputes the NMI output and reports a rising edge.
    fn update_nmi_line(&mut self) -> bool {
        let level = self.registers.status.contains(Status::VERTICAL_BLANK)
            && self.registers.control.nmi_enabled();
        let edge = level && !self.nmi_line;
        self.nmi_line = level;
        edge
    }

    fn raise_nmi_on_edge(&mut self) {
        if self.update_nmi_line() {
            trace!(scanline = self.scanline, dot = self.dot, "nmi");
            self.nmi_pending = true;
            if let Some(observer) = self.observer.as_mut() {
                observer.on_nmi();
            }
        }
    }

    fn enter_vblank(&mut self) {
        if mem::take(&mut self.suppress_vblank) {
            return;
        }
        trace!(frame = self.frame, "vblank start");
        self.registers.status.insert(Status::VERTICAL_BLANK);
        if let Some(observer) = self.observer.as_mut() {
            observer.on_vblank_start();
        }
        self.raise_nmi_on_edge();
    }

    /// Moves `(scanline, dot)` past the dot just executed. Returns `true`
    /// when the frame wrapped.
    fn advance(&mut self) -> bool {
        if self.scanline == PRE_RENDER_SCANLINE
            && self.dot == ODD_FRAME_SKIP_DOT
            && self.frame % 2 == 1
            && self
                .config
                .odd_frame_skip
                .applies(self.registers.render.background, self.registers.render.sprites)
        {
            self.scanline = 0;
            self.dot = 0;
            return false;
        }

        self.dot += 1;
        if self.dot < DOTS_PER_SCANLINE {
            return false;
        }
        self.dot = 0;
        self.scanline += 1;
        if self.scanline > LAST_SCANLINE {
            self.scanline = PRE_RENDER_SCANLINE;
            self.frame = self.frame.wrapping_add(1);
            return true;
        }
        false
    }

    /// Fetch, shift and output work for pre-render and visible lines.
    fn render_dot(&mut self, bus: &mut PpuBus<'_>, scanline: i16, dot: u16) {
        if !self.registers.render.rendering() {
            return;
        }

        if matches!(dot, 2..=257 | 322..=337) {
            self.bg_pipeline.shift();
            if dot % 8 == 1 {
                let latch = self.bg_latch;
                self.bg_pipeline
                    .reload([latch.pattern_low, latch.pattern_high], latch.palette);
            }
        }

        if scanline >= 0 && (1..=256).contains(&dot) {
            self.render_pixel(usize::from(dot - 1), scanline as usize);
        }

        if matches!(dot, 1..=256 | 321..=336) {
            self.fetch_background(bus, dot);
        }

        match dot {
            256 => self.registers.vram.v.increment_y(),
            257 => self.registers.vram.copy_horizontal_bits(),
            280..=304 if scanline == PRE_RENDER_SCANLINE => {
                self.registers.vram.copy_vertical_bits();
            }
            _ => {}
        }

        if scanline >= 0 {
            match dot {
                1 => self.sprite_eval.clear(),
                256 => self.evaluate_sprites(scanline),
                _ => {}
            }
        }

        if (257..=320).contains(&dot) {
            self.registers.oam_addr = 0;
            self.fetch_sprite(bus, scanline, dot);
        }
    }

    fn fetch_background(&mut self, bus: &mut PpuBus<'_>, dot: u16) {
        let v = self.registers.vram.v;
        match (dot - 1) % 8 {
            0 => self.bg_latch.tile = self.read_vram(bus, v.tile_addr()),
            2 => {
                let attribute = self.read_vram(bus, v.attribute_addr());
                self.bg_latch.palette = (attribute >> v.attribute_shift()) & 0b11;
            }
            4 => self.bg_latch.pattern_low = bus.chr_read(self.bg_pattern_addr(v)),
            6 => self.bg_latch.pattern_high = bus.chr_read(self.bg_pattern_addr(v) + 8),
            7 => self.registers.vram.v.increment_coarse_x(),
            _ => {}
        }
    }

    fn bg_pattern_addr(&self, v: VramAddr) -> u16 {
        self.registers.control.background_pattern_table()
            + u16::from(self.bg_latch.tile) * 16
            + u16::from(v.fine_y())
    }

    fn evaluate_sprites(&mut self, scanline: i16) {
        let height = self.registers.control.sprite_height();
        self.sprite_eval
            .evaluate(&self.registers.oam, scanline, height);
        if self.sprite_eval.overflow {
            trace!(scanline, "sprite overflow");
            self.registers.status.insert(Status::SPRITE_OVERFLOW);
        }
    }

    /// Dots 257..=320: eight dots per secondary OAM slot.
    fn fetch_sprite(&mut self, bus: &mut PpuBus<'_>, scanline: i16, dot: u16) {
        let offset = usize::from(dot - 257);
        let slot = offset / 8;
        let step = offset % 8;

        let sprite = self.sprite_eval.sprite(slot);
        let in_range = slot < usize::from(self.sprite_eval.count);
        let height = self.registers.control.sprite_height();
        // Empty slots hold 0xFF and fetch tile 0xFF as a dummy.
        let row = Sprite::row_on(sprite.y, scanline, height).unwrap_or(0);
        let addr = sprite.pattern_addr(row, height, self.registers.control.sprite_pattern_table());

        match step {
            0 => {
                if slot == 0 {
                    self.sprite_line.clear();
                    self.sprite_line.count = self.sprite_eval.count;
                    self.sprite_line.sprite0_in_range = self.sprite_eval.sprite0_in_range;
                }
                self.sprite_line
                    .set_meta(slot, sprite.attributes.bits(), sprite.x);
            }
            4 => {
                let low = bus.chr_read(addr);
                self.sprite_line
                    .set_pattern_low(slot, if in_range { low } else { 0 });
            }
            6 => {
                let high = bus.chr_read(addr + 8);
                self.sprite_line
                    .set_pattern_high(slot, if in_range { high } else { 0 });
            }
            7 if slot == SPRITES_PER_LINE - 1 => {
                self.sprite_pipeline.load_scanline(&self.sprite_line);
            }
            _ => {}
        }
    }

    /// Composites background and sprite samples for pixel `(x, y)`.
    fn render_pixel(&mut self, x: usize, y: usize) {
        let render = self.registers.render;

        let mut bg = self.bg_pipeline.sample(self.registers.vram.x);
        if !render.background_visible_at(x) {
            bg = BgPixel::default();
        }
        let mut sprite = self.sprite_pipeline.sample_and_shift();
        if !render.sprites_visible_at(x) {
            sprite = SpritePixel::default();
        }

        if sprite.is_sprite0
            && sprite.is_opaque()
            && bg.is_opaque()
            && x != SCREEN_WIDTH - 1
            && !self.registers.status.contains(Status::SPRITE_ZERO_HIT)
        {
            trace!(x, y, "sprite 0 hit");
            self.registers.status.insert(Status::SPRITE_ZERO_HIT);
        }

        let palette_entry = if sprite.is_opaque() && (!bg.is_opaque() || !sprite.behind_background)
        {
            0x10 | (sprite.palette << 2) | sprite.color
        } else if bg.is_opaque() {
            (bg.palette << 2) | bg.color
        } else {
            0
        };

        let (hw_index, color) =
            self.resolver.resolve_entry(&self.palette_ram, palette_entry, self.registers.mask);
        self.frame_buffer.write_color(x, y, color);

        if let Some(observer) = self.observer.as_mut() {
            observer.on_pixel(&PixelTrace {
                x: x as u8,
                y: y as u8,
                bg,
                sprite,
                palette_entry,
                hw_index,
                color,
            });
        }
    }
}
