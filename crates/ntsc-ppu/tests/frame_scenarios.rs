mod common;

use anyhow::{Context, Result};
use common::{DOTS_PER_FRAME, Harness, SOLID_TILE, empty_oam, place_sprite};
use ntsc_ppu::{
    ChrBus, Color, HARDWARE_COLORS, ObserverStack, PixelTrace, PpuObserver, Register, Status,
};
use rand::{Rng, SeedableRng, rngs::StdRng};

const SHOW_ALL: u8 = 0x1E;

/// Tile 1 solid, palette 0 color 1 = `hw`, scroll reset.
fn solid_background(h: &mut Harness, hw: u8) {
    h.chr.load_tile(0, 1, &SOLID_TILE);
    h.poke(0x3F00, &[0x0F, hw, hw, hw]);
}

#[derive(Debug, Clone, Default)]
struct Counters {
    nmi: u32,
    vblank: u32,
    frames: Vec<u64>,
    dots: u64,
    pixels: u64,
    last_sprite0_pixel: Option<(u8, u8)>,
}

impl PpuObserver for Counters {
    fn on_nmi(&mut self) {
        self.nmi += 1;
    }

    fn on_vblank_start(&mut self) {
        self.vblank += 1;
    }

    fn on_frame_complete(&mut self, frame: u64, _frame_buffer: &ntsc_ppu::FrameBuffer) {
        self.frames.push(frame);
    }

    fn on_scanline_dot(&mut self, _scanline: i16, _dot: u16) {
        self.dots += 1;
    }

    fn on_pixel(&mut self, trace: &PixelTrace) {
        self.pixels += 1;
        if trace.sprite.is_sprite0 && trace.sprite.is_opaque() {
            self.last_sprite0_pixel = Some((trace.x, trace.y));
        }
    }
}

#[test]
fn nrom_solid_tile_renders_white() {
    let mut h = Harness::new();
    solid_background(&mut h, 0x30);
    h.poke(0x2000, &[0x01]);
    h.scroll(0, 0);
    h.write(Register::Mask, 0x0A);

    h.run_frame();

    let white = Color::from_rgb(HARDWARE_COLORS[0x30]);
    assert_eq!(h.ppu.frame_buffer().pixel(0, 0), white);
    assert_eq!(h.ppu.frame_buffer().pixel(7, 7), white);
    // Tile 0 is empty, so the next cell shows the backdrop.
    let backdrop = Color::from_rgb(HARDWARE_COLORS[0x0F]);
    assert_eq!(h.ppu.frame_buffer().pixel(8, 0), backdrop);
}

#[test]
fn hidden_left_column_shows_backdrop() {
    let mut h = Harness::new();
    solid_background(&mut h, 0x30);
    h.poke(0x2000, &[0x01, 0x01]);
    h.scroll(0, 0);
    h.write(Register::Mask, 0x08);

    h.run_frame();

    let backdrop = Color::from_rgb(HARDWARE_COLORS[0x0F]);
    assert_eq!(h.ppu.frame_buffer().pixel(0, 0), backdrop);
    assert_eq!(h.ppu.frame_buffer().pixel(8, 0), Color::from_rgb(HARDWARE_COLORS[0x30]));
}

#[test]
fn fine_x_scroll_shifts_the_picture() {
    let mut h = Harness::new();
    solid_background(&mut h, 0x16);
    h.poke(0x2001, &[0x01]);
    h.scroll(4, 0);
    h.write(Register::Mask, 0x0A);

    h.run_frame();

    let fb = h.ppu.frame_buffer();
    assert_eq!(fb.pixel(3, 0), Color::from_rgb(HARDWARE_COLORS[0x0F]));
    assert_eq!(fb.pixel(4, 0), Color::from_rgb(HARDWARE_COLORS[0x16]));
    assert_eq!(fb.pixel(11, 0), Color::from_rgb(HARDWARE_COLORS[0x16]));
    assert_eq!(fb.pixel(12, 0), Color::from_rgb(HARDWARE_COLORS[0x0F]));
}

#[test]
fn attribute_bits_select_the_palette_group() {
    let mut h = Harness::new();
    h.chr.load_tile(0, 1, &SOLID_TILE);
    h.poke(0x3F00, &[0x0F, 0x01, 0x01, 0x01, 0x0F, 0x2A, 0x2A, 0x2A]);
    // Cell (2, 0) lies in the top-right quadrant of attribute byte 0.
    h.poke(0x2002, &[0x01]);
    h.poke(0x23C0, &[0b0000_0100]);
    h.scroll(0, 0);
    h.write(Register::Mask, 0x0A);

    h.run_frame();

    assert_eq!(
        h.ppu.frame_buffer().pixel(16, 0),
        Color::from_rgb(HARDWARE_COLORS[0x2A])
    );
}

#[test]
fn red_emphasis_darkens_rendered_backdrop() {
    let mut h = Harness::new();
    h.poke(0x3F00, &[0x21]);
    h.scroll(0, 0);
    h.write(Register::Mask, 0x08 | 0x20);

    h.run_frame();

    assert_eq!(h.ppu.frame_buffer().pixel(40, 40), Color::new(100, 132, 191));
}

#[test]
fn greyscale_collapses_rendered_colors() {
    let mut h = Harness::new();
    h.poke(0x3F00, &[0x2A]);
    h.scroll(0, 0);
    h.write(Register::Mask, 0x08 | 0x01);

    h.run_frame();

    assert_eq!(
        h.ppu.frame_buffer().pixel(100, 100),
        Color::from_rgb(HARDWARE_COLORS[0x20])
    );
}

#[test]
fn frame_cadence_from_reset() {
    let mut h = Harness::new();
    let mut completed = 0;
    for _ in 0..DOTS_PER_FRAME {
        if h.clock().frame_complete {
            completed += 1;
        }
    }
    assert_eq!(completed, 1);
    assert_eq!((h.ppu.scanline(), h.ppu.dot()), (-1, 0));
}

#[test]
fn sprite_zero_hit_over_opaque_background() -> Result<()> {
    let mut h = Harness::new();
    solid_background(&mut h, 0x30);
    h.poke(0x3F11, &[0x16, 0x16, 0x16]);
    h.poke(0x2000 + 4 * 32 + 4, &[0x01]);
    let mut oam = empty_oam();
    place_sprite(&mut oam, 0, 31, 0x01, 0x00, 32);
    h.load_oam(&oam)?;
    h.scroll(0, 0);
    h.write(Register::Mask, SHOW_ALL);

    h.clock_to(32, 0)?;
    assert!(!h.ppu.status().contains(Status::SPRITE_ZERO_HIT));
    h.run_frame();
    assert!(h.ppu.status().contains(Status::SPRITE_ZERO_HIT));
    assert_eq!(h.ppu.peek_status() & 0x40, 0x40);
    // Sprite wins priority over the background.
    assert_eq!(
        h.ppu.frame_buffer().pixel(32, 32),
        Color::from_rgb(HARDWARE_COLORS[0x16])
    );

    // Cleared on the next pre-render line.
    h.clock_to(-1, 2)?;
    assert!(!h.ppu.status().contains(Status::SPRITE_ZERO_HIT));
    Ok(())
}

#[test]
fn sprite_zero_over_transparent_background_does_not_hit() -> Result<()> {
    let mut h = Harness::new();
    solid_background(&mut h, 0x30);
    h.poke(0x2000 + 4 * 32 + 4, &[0x01]);
    let mut oam = empty_oam();
    place_sprite(&mut oam, 0, 31, 0x01, 0x00, 100);
    h.load_oam(&oam)?;
    h.scroll(0, 0);
    h.write(Register::Mask, SHOW_ALL);

    h.run_frame();
    assert!(!h.ppu.status().contains(Status::SPRITE_ZERO_HIT));
    Ok(())
}

#[test]
fn sprite_zero_hit_requires_both_layers() -> Result<()> {
    let mut h = Harness::new();
    solid_background(&mut h, 0x30);
    h.poke(0x2000 + 4 * 32 + 4, &[0x01]);
    let mut oam = empty_oam();
    place_sprite(&mut oam, 0, 31, 0x01, 0x00, 32);
    h.load_oam(&oam)?;
    h.scroll(0, 0);
    h.write(Register::Mask, 0x14);

    h.run_frame();
    assert!(!h.ppu.status().contains(Status::SPRITE_ZERO_HIT));
    Ok(())
}

#[test]
fn behind_background_sprite_yields_to_opaque_background() -> Result<()> {
    let mut h = Harness::new();
    solid_background(&mut h, 0x30);
    h.poke(0x3F11, &[0x16, 0x16, 0x16]);
    h.poke(0x2000 + 4 * 32 + 4, &[0x01]);
    let mut oam = empty_oam();
    // Straddles the opaque tile (x 32..=39) and the empty one to its left.
    place_sprite(&mut oam, 1, 31, 0x01, 0x20, 28);
    h.load_oam(&oam)?;
    h.scroll(0, 0);
    h.write(Register::Mask, SHOW_ALL);

    h.run_frame();

    let fb = h.ppu.frame_buffer();
    assert_eq!(fb.pixel(29, 33), Color::from_rgb(HARDWARE_COLORS[0x16]));
    assert_eq!(fb.pixel(33, 33), Color::from_rgb(HARDWARE_COLORS[0x30]));
    Ok(())
}

#[test]
fn horizontal_flip_mirrors_sprite_row() -> Result<()> {
    let mut h = Harness::new();
    let mut tile = [0u8; 16];
    tile[..8].fill(0x80);
    h.chr.load_tile(0, 2, &tile);
    h.poke(0x3F11, &[0x16]);
    let mut oam = empty_oam();
    place_sprite(&mut oam, 0, 49, 0x02, 0x40, 80);
    h.load_oam(&oam)?;
    h.scroll(0, 0);
    h.write(Register::Mask, SHOW_ALL);

    h.run_frame();

    let fb = h.ppu.frame_buffer();
    let sprite = Color::from_rgb(HARDWARE_COLORS[0x16]);
    assert_ne!(fb.pixel(80, 50), sprite);
    assert_eq!(fb.pixel(87, 50), sprite);
    Ok(())
}

#[test]
fn eight_sprites_on_a_line_do_not_overflow() -> Result<()> {
    let mut h = Harness::new();
    let mut oam = empty_oam();
    for i in 0..8 {
        place_sprite(&mut oam, i, 50, 0, 0, (i * 16) as u8);
    }
    h.load_oam(&oam)?;
    h.write(Register::Mask, 0x18);

    h.run_frame();
    assert!(!h.ppu.status().contains(Status::SPRITE_OVERFLOW));
    Ok(())
}

#[test]
fn ninth_sprite_on_a_line_overflows() -> Result<()> {
    let mut h = Harness::new();
    let mut oam = empty_oam();
    for i in 0..9 {
        place_sprite(&mut oam, i, 50, 0, 0, (i * 16) as u8);
    }
    h.load_oam(&oam)?;
    h.write(Register::Mask, 0x18);

    h.clock_to(50, 0)?;
    assert!(!h.ppu.status().contains(Status::SPRITE_OVERFLOW));
    h.run_frame();
    assert!(h.ppu.status().contains(Status::SPRITE_OVERFLOW));
    Ok(())
}

#[test]
fn randomized_oam_overflow_matches_line_counts() -> Result<()> {
    let mut rng = StdRng::seed_from_u64(0x5eed);
    for _ in 0..8 {
        let mut h = Harness::new();
        let mut oam = empty_oam();
        let sprites = rng.random_range(1..=64);
        for i in 0..sprites {
            let y = rng.random_range(0..240) as u8;
            place_sprite(&mut oam, i, y, rng.random(), rng.random(), rng.random());
        }
        h.load_oam(&oam)?;
        h.write(Register::Mask, 0x18);

        let expected = (0..240i16).any(|line| {
            oam.chunks_exact(4)
                .filter(|s| (0..8).contains(&(line - i16::from(s[0]))))
                .count()
                > 8
        });

        h.run_frame();
        assert_eq!(
            h.ppu.status().contains(Status::SPRITE_OVERFLOW),
            expected,
            "oam: {oam:02X?}"
        );
    }
    Ok(())
}

#[test]
fn identical_inputs_render_identical_frames() -> Result<()> {
    let mut rng = StdRng::seed_from_u64(42);
    let mut chr = vec![0u8; 0x2000];
    rng.fill(chr.as_mut_slice());
    let mut nametable = vec![0u8; 0x400];
    rng.fill(nametable.as_mut_slice());
    let mut palette = [0u8; 32];
    rng.fill(&mut palette);
    let mut oam = vec![0u8; 256];
    rng.fill(oam.as_mut_slice());

    let render = || -> Result<Vec<u8>> {
        let mut h = Harness::new();
        for (addr, byte) in chr.iter().enumerate() {
            h.chr.chr_write(addr as u16, *byte);
        }
        h.poke(0x2000, &nametable);
        h.poke(0x3F00, &palette);
        h.load_oam(&oam)?;
        h.scroll(13, 7);
        h.write(Register::Mask, SHOW_ALL);
        h.run_frame();
        h.run_frame();
        let mut out = vec![0u8; h.ppu.frame_buffer().len_bytes()];
        h.ppu.frame_buffer().copy_to(&mut out)?;
        Ok(out)
    };

    let first = render().context("first render")?;
    let second = render().context("second render")?;
    assert!(first == second);
    Ok(())
}

#[test]
fn observers_see_nmi_vblank_frames_and_pixels() {
    let mut h = Harness::new();
    h.ppu.set_observer(Counters::default());
    h.write(Register::Control, 0x80);
    h.write(Register::Mask, 0x08);

    assert!(h.run_frame());
    assert!(h.run_frame());

    let counters = h.ppu.observer::<Counters>().cloned().unwrap_or_default();
    assert_eq!(counters.nmi, 2);
    assert_eq!(counters.vblank, 2);
    assert_eq!(counters.frames, vec![1, 2]);
    assert_eq!(counters.pixels, 2 * 256 * 240);
    // The second frame is odd and one dot shorter.
    assert_eq!(counters.dots, (2 * DOTS_PER_FRAME - 1) as u64);
}

#[test]
fn observer_stack_reports_sprite_zero_pixels() -> Result<()> {
    let mut h = Harness::new();
    let mut stack = ObserverStack::new();
    stack.add(Counters::default());
    h.ppu.set_observer(stack);

    h.chr.load_tile(0, 1, &SOLID_TILE);
    let mut oam = empty_oam();
    place_sprite(&mut oam, 0, 99, 0x01, 0x00, 120);
    h.load_oam(&oam)?;
    h.scroll(0, 0);
    h.write(Register::Mask, SHOW_ALL);
    h.run_frame();

    let last = h
        .ppu
        .observer::<ObserverStack>()
        .and_then(|stack| stack.layer::<Counters>())
        .and_then(|counters| counters.last_sprite0_pixel);
    assert_eq!(last, Some((127, 107)));
    Ok(())
}

#[test]
fn vblank_nmi_is_suppressed_by_racing_status_read() -> Result<()> {
    let mut h = Harness::new();
    h.write(Register::Control, 0x80);
    h.clock_to(241, 1)?;
    let status = h.read(Register::Status);
    assert_eq!(status & 0x80, 0);
    assert!(!h.run_frame());

    // The following frame is unaffected.
    assert!(h.run_frame());
    Ok(())
}
