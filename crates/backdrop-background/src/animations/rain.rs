//! Digital rain (stateful, timer driven).
//!
//! The layer keeps a persistent cell buffer. Each tick fades the whole
//! buffer a little, which leaves trails behind the falling glyphs, then
//! writes one fresh glyph per column.

use backdrop_core::{Alphabet, ThemeColor};
use rand::Rng;
use ratatui::{
    style::{Color, Style},
    text::Span,
};

use crate::color::hsl_to_rgb;

/// Width of one rain column in terminal cells.
pub const GLYPH_WIDTH: u16 = 2;

/// Brightness kept by every cell on each tick.
const FADE: f32 = 0.9;

/// Cells dimmer than this are cleared.
const VISIBLE_FLOOR: f32 = 0.06;

/// Chance that a column past the bottom edge restarts at the top.
const RESET_CHANCE: f64 = 0.025;

/// How the glyphs of a tick are drawn.
#[derive(Debug, Clone, Copy)]
pub struct RainStyle {
    pub color: ThemeColor,
    pub alphabet: Alphabet,
    /// A random hue for every glyph on every tick.
    pub flashing: bool,
}

impl Default for RainStyle {
    fn default() -> Self {
        Self {
            color: ThemeColor::default(),
            alphabet: Alphabet::Matrix,
            flashing: false,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct RainCell {
    glyph: char,
    color: ThemeColor,
    intensity: f32,
}

/// The rain columns and their fading cell buffer.
#[derive(Debug, Default)]
pub struct RainLayer {
    /// Current row of every column.
    drops: Vec<u32>,
    cells: Vec<Option<RainCell>>,
    width: u16,
    height: u16,
}

impl RainLayer {
    /// Rebuild the columns for a new viewport, one per `GLYPH_WIDTH`
    /// cells, each starting at a random row. The buffer is cleared.
    pub fn resize(&mut self, width: u16, height: u16, rng: &mut impl Rng) {
        let columns = (width / GLYPH_WIDTH) as usize;
        let rows = u32::from(height.max(1));
        self.drops = (0..columns).map(|_| rng.random_range(0..rows)).collect();
        self.cells = vec![None; width as usize * height as usize];
        self.width = width;
        self.height = height;
    }

    pub fn column_count(&self) -> usize {
        self.drops.len()
    }

    /// Current row of every column.
    pub fn drops(&self) -> &[u32] {
        &self.drops
    }

    /// Advance the rain by one tick.
    pub fn tick(&mut self, style: RainStyle, rng: &mut impl Rng) {
        for cell in &mut self.cells {
            if let Some(c) = cell {
                c.intensity *= FADE;
                if c.intensity < VISIBLE_FLOOR {
                    *cell = None;
                }
            }
        }

        let height = u32::from(self.height);
        for (i, row) in self.drops.iter_mut().enumerate() {
            let color = if style.flashing {
                hsl_to_rgb(rng.random_range(0.0..360.0), 1.0, 0.5)
            } else {
                style.color
            };
            let glyph = style.alphabet.random_glyph(rng);

            if *row < height {
                let idx = *row as usize * self.width as usize + i * GLYPH_WIDTH as usize;
                if let Some(cell) = self.cells.get_mut(idx) {
                    *cell = Some(RainCell {
                        glyph,
                        color,
                        intensity: 1.0,
                    });
                }
            }

            if *row > height && rng.random_bool(RESET_CHANCE) {
                *row = 0;
            }
            *row += 1;
        }
    }

    /// Render the cell at `(x, y)`, scaled by `brightness`.
    pub fn render_char(&self, x: u16, y: u16, brightness: f32) -> Span<'static> {
        if x >= self.width || y >= self.height {
            return Span::raw(" ");
        }
        match self.cells[y as usize * self.width as usize + x as usize] {
            Some(cell) => {
                let color = cell.color.scaled(cell.intensity * brightness);
                Span::styled(cell.glyph.to_string(), Style::new().fg(color.color()))
            }
            None => Span::raw(" "),
        }
    }

    /// Whether `(x, y)` currently shows a glyph.
    pub fn is_lit(&self, x: u16, y: u16) -> bool {
        x < self.width
            && y < self.height
            && self.cells[y as usize * self.width as usize + x as usize].is_some()
    }

    /// Foreground color of a lit cell at full brightness.
    pub fn color_at(&self, x: u16, y: u16) -> Option<Color> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.cells[y as usize * self.width as usize + x as usize]
            .map(|c| c.color.scaled(c.intensity).color())
    }
}
