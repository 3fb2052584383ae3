use super::{
    sprite::SpriteAttributes,
    sprite_state::{SPRITES_PER_LINE, SpriteLineBuffers},
};

/// A single sprite slot for the current scanline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
struct SpriteSlot {
    /// Pattern bitplane 0 (shifted left once per dot after X expires).
    pattern_low: u8,
    /// Pattern bitplane 1 (shifted left once per dot after X expires).
    pattern_high: u8,
    attributes: SpriteAttributes,
    /// X counter delaying sprite visibility.
    x_counter: u8,
    /// This slot holds OAM sprite 0.
    sprite0: bool,
}

/// Sprite pixel produced for a single dot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct SpritePixel {
    /// Sprite palette select (0..=3).
    pub palette: u8,
    /// Color index within the palette (0..=3, 0 means transparent).
    pub color: u8,
    /// Sprite yields to opaque background pixels.
    pub behind_background: bool,
    /// Pixel came from OAM sprite 0.
    pub is_sprite0: bool,
}

impl SpritePixel {
    #[inline]
    pub fn is_opaque(self) -> bool {
        self.color != 0
    }
}

/// Per-dot sprite output for the current scanline.
///
/// Each of the eight slots has two pattern shifters and an X counter. When
/// the counter reaches zero the shifters start outputting and advance once
/// per dot. Lower slots (lower OAM index) win among opaque pixels.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub(crate) struct SpritePipeline {
    slots: [SpriteSlot; SPRITES_PER_LINE],
    active_count: u8,
}

impl SpritePipeline {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn clear(&mut self) {
        *self = Self::new();
    }

    /// Loads the fetched sprites for the scanline about to be drawn.
    ///
    /// Horizontally flipped patterns are bit-reversed here so shifting left
    /// always walks pixels left-to-right on output.
    pub(crate) fn load_scanline(&mut self, line: &SpriteLineBuffers) {
        self.clear();
        self.active_count = line.count.min(SPRITES_PER_LINE as u8);

        for i in 0..usize::from(self.active_count) {
            let attributes = SpriteAttributes::from_bits_retain(line.attr[i]);
            let mut low = line.pattern_low[i];
            let mut high = line.pattern_high[i];
            if attributes.contains(SpriteAttributes::FLIP_HORIZONTAL) {
                low = low.reverse_bits();
                high = high.reverse_bits();
            }
            self.slots[i] = SpriteSlot {
                pattern_low: low,
                pattern_high: high,
                attributes,
                x_counter: line.x[i],
                sprite0: line.sprite0_in_range && i == 0,
            };
        }
    }

    /// Samples the current sprite pixel and advances active shifters by one dot.
    pub(crate) fn sample_and_shift(&mut self) -> SpritePixel {
        let mut chosen: Option<SpritePixel> = None;

        for slot in self.slots.iter_mut().take(usize::from(self.active_count)) {
            if slot.x_counter > 0 {
                slot.x_counter -= 1;
                continue;
            }

            let bit0 = (slot.pattern_low >> 7) & 1;
            let bit1 = (slot.pattern_high >> 7) & 1;
            let color = (bit1 << 1) | bit0;

            if chosen.is_none() && color != 0 {
                chosen = Some(SpritePixel {
                    palette: slot.attributes.palette(),
                    color,
                    behind_background: slot
                        .attributes
                        .contains(SpriteAttributes::PRIORITY_BEHIND_BACKGROUND),
                    is_sprite0: slot.sprite0,
                });
            }

            slot.pattern_low <<= 1;
            slot.pattern_high <<= 1;
        }

        chosen.unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(entries: &[(u8, u8, u8, u8)], sprite0: bool) -> SpriteLineBuffers {
        let mut line = SpriteLineBuffers::new();
        for (i, (attr, x, low, high)) in entries.iter().enumerate() {
            line.set_meta(i, *attr, *x);
            line.set_pattern_low(i, *low);
            line.set_pattern_high(i, *high);
        }
        line.count = entries.len() as u8;
        line.sprite0_in_range = sprite0;
        line
    }

    #[test]
    fn x_counter_delays_output() {
        let mut pipeline = SpritePipeline::new();
        pipeline.load_scanline(&line(&[(0, 2, 0xFF, 0x00)], true));
        assert!(!pipeline.sample_and_shift().is_opaque());
        assert!(!pipeline.sample_and_shift().is_opaque());
        let pixel = pipeline.sample_and_shift();
        assert_eq!(pixel.color, 1);
        assert!(pixel.is_sprite0);
    }

    #[test]
    fn lower_slot_wins_overlap() {
        let mut pipeline = SpritePipeline::new();
        pipeline.load_scanline(&line(&[(0x01, 0, 0xFF, 0xFF), (0x02, 0, 0xFF, 0x00)], false));
        let pixel = pipeline.sample_and_shift();
        assert_eq!(pixel.palette, 1);
        assert_eq!(pixel.color, 3);
    }

    #[test]
    fn transparent_front_sprite_reveals_the_next_one() {
        let mut pipeline = SpritePipeline::new();
        pipeline.load_scanline(&line(&[(0x01, 0, 0x00, 0x00), (0x22, 0, 0x80, 0x00)], false));
        let pixel = pipeline.sample_and_shift();
        assert_eq!(pixel.palette, 2);
        assert!(pixel.behind_background);
    }

    #[test]
    fn horizontal_flip_reverses_row() {
        let mut pipeline = SpritePipeline::new();
        pipeline.load_scanline(&line(&[(0x40, 0, 0x01, 0x00)], false));
        assert!(pipeline.sample_and_shift().is_opaque());
        for _ in 0..7 {
            assert!(!pipeline.sample_and_shift().is_opaque());
        }
    }
}
