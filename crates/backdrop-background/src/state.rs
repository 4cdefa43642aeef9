//! Background layer state management.

use backdrop_core::{ScaleMode, ThemeColor};
use rand::{SeedableRng, rngs::StdRng};
use ratatui::{
    Frame,
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::Paragraph,
};

use crate::animations::rain::{RainLayer, RainStyle};
use crate::animations::sprites::{SpriteLayer, SpriteSheet};
use crate::picture::{Picture, PictureLayer};

/// Brightness of the rain while the background filter is on.
const FILTERED_BRIGHTNESS: f32 = 0.45;
/// Brightness of the backdrop picture while the background filter is on.
const FILTERED_PICTURE: f32 = 0.35;
/// Upper half block: foreground paints the top pixel, background the bottom.
const HALF_BLOCK: &str = "\u{2580}";

/// Per-frame drawing options.
#[derive(Debug, Clone, Copy, Default)]
pub struct LayerOptions {
    /// Dim the picture and the rain so foreground text stands out.
    pub bg_filter: bool,
}

fn mix(a: ThemeColor, b: ThemeColor) -> ThemeColor {
    let avg = |x: u8, y: u8| ((u16::from(x) + u16::from(y)) / 2) as u8;
    ThemeColor::new(avg(a.r, b.r), avg(a.g, b.g), avg(a.b, b.b))
}

/// The picture, the rain and the sprites, bottom to top.
#[derive(Debug)]
pub struct BackgroundState {
    picture: PictureLayer,
    rain: RainLayer,
    sprites: SpriteLayer,
    sheet: SpriteSheet,
    /// Last known terminal width.
    last_width: u16,
    /// Last known terminal height.
    last_height: u16,
    rng: StdRng,
}

impl Default for BackgroundState {
    fn default() -> Self {
        Self::new()
    }
}

impl BackgroundState {
    /// Create a new background state seeded from the system clock.
    pub fn new() -> Self {
        use std::time::{SystemTime, UNIX_EPOCH};

        let seed = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(0);
        Self::with_seed(seed)
    }

    /// Create a background state with a fixed random seed.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            picture: PictureLayer::default(),
            rain: RainLayer::default(),
            sprites: SpriteLayer::default(),
            sheet: SpriteSheet::sentinel(),
            last_width: 0,
            last_height: 0,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Replace the sprite artwork.
    pub fn set_sheet(&mut self, sheet: SpriteSheet) {
        self.sheet = sheet;
    }

    /// Replace the backdrop picture; `None` removes it.
    pub fn set_picture(&mut self, picture: Option<Picture>) {
        self.picture.set_picture(picture);
    }

    pub fn set_scale_mode(&mut self, mode: ScaleMode) {
        self.picture.set_mode(mode);
    }

    pub fn picture(&self) -> &PictureLayer {
        &self.picture
    }

    pub fn rain(&self) -> &RainLayer {
        &self.rain
    }

    pub fn sprites(&self) -> &SpriteLayer {
        &self.sprites
    }

    /// Resize both layers when the viewport changed. Returns whether it did.
    pub fn resize(&mut self, width: u16, height: u16) -> bool {
        if width == self.last_width && height == self.last_height {
            return false;
        }
        self.picture.resize(width, height);
        self.rain.resize(width, height, &mut self.rng);
        self.sprites.resize(width, height);
        self.last_width = width;
        self.last_height = height;
        true
    }

    /// One rain timer tick.
    pub fn tick_rain(&mut self, style: RainStyle) {
        self.rain.tick(style, &mut self.rng);
    }

    pub fn set_sprites_enabled(&mut self, enabled: bool) {
        self.sprites.set_enabled(enabled, &mut self.rng);
    }

    /// One display frame of the sprite overlay.
    pub fn frame_sprites(&mut self, color: ThemeColor) {
        self.sprites.frame(&self.sheet, color, &mut self.rng);
    }

    /// Render the composed layers into `area`.
    pub fn render(&mut self, frame: &mut Frame, area: Rect, opts: LayerOptions) {
        self.resize(area.width, area.height);
        let (brightness, shade) = if opts.bg_filter {
            (FILTERED_BRIGHTNESS, FILTERED_PICTURE)
        } else {
            (1.0, 1.0)
        };

        let lines: Vec<Line> = (0..area.height)
            .map(|y| {
                let spans: Vec<Span> = (0..area.width)
                    .map(|x| {
                        if let Some(sprite) = self.sprites.render_char(x, y) {
                            return sprite;
                        }
                        let backdrop = self
                            .picture
                            .cell(x, y)
                            .map(|(top, bottom)| (top.scaled(shade), bottom.scaled(shade)));
                        match backdrop {
                            Some((top, bottom)) if self.rain.is_lit(x, y) => self
                                .rain
                                .render_char(x, y, brightness)
                                .patch_style(Style::new().bg(mix(top, bottom).color())),
                            Some((top, bottom)) => Span::styled(
                                HALF_BLOCK,
                                Style::new().fg(top.color()).bg(bottom.color()),
                            ),
                            None => self.rain.render_char(x, y, brightness),
                        }
                    })
                    .collect();
                Line::from(spans)
            })
            .collect();

        frame.render_widget(Paragraph::new(lines), area);
    }
}
