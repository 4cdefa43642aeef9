//! Floating sentinel sprites (stateful, redrawn every frame).

use backdrop_core::ThemeColor;
use rand::Rng;
use ratatui::{style::Style, text::Span};

/// Number of sprites on screen.
pub const SPRITE_COUNT: usize = 12;

/// Sway phase advance per frame.
const PHASE_STEP: f32 = 0.008;

/// Pixel sizes are converted with a nominal 9x18 px terminal cell.
const PX_PER_COL: f32 = 9.0;
const PX_PER_ROW: f32 = 18.0;

/// How far past the edges a sprite travels before it is recycled.
const MARGIN_ROWS: f32 = 200.0 / PX_PER_ROW;

/// One frame of a sprite as a grid of characters; spaces are transparent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpriteFrame {
    rows: Vec<Vec<char>>,
    width: usize,
}

impl SpriteFrame {
    /// Build a frame, padding short rows with spaces.
    pub fn from_rows(rows: &[&str]) -> Self {
        let width = rows.iter().map(|r| r.chars().count()).max().unwrap_or(0);
        let rows = rows
            .iter()
            .map(|r| {
                let mut row: Vec<char> = r.chars().collect();
                row.resize(width, ' ');
                row
            })
            .collect();
        Self { rows, width }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }

    fn glyph(&self, x: usize, y: usize) -> char {
        self.rows
            .get(y)
            .and_then(|row| row.get(x))
            .copied()
            .unwrap_or(' ')
    }
}

/// Something that yields the sprite image for a given frame.
pub trait SpriteSource {
    /// `None` while the source cannot be drawn yet.
    fn frame_at(&self, tick: u64) -> Option<&SpriteFrame>;
}

/// A looping sequence of frames.
#[derive(Debug, Clone, Default)]
pub struct SpriteSheet {
    frames: Vec<SpriteFrame>,
    ticks_per_frame: u64,
}

impl SpriteSheet {
    pub fn new(frames: Vec<SpriteFrame>, ticks_per_frame: u64) -> Self {
        Self {
            frames,
            ticks_per_frame: ticks_per_frame.max(1),
        }
    }

    /// The built-in two-frame sentinel.
    pub fn sentinel() -> Self {
        Self::new(
            vec![
                SpriteFrame::from_rows(&[
                    "  .-====-.",
                    " ( @    @ )=-",
                    "  '-====-'",
                    "  /|/||\\|\\",
                    " / / || \\ \\",
                ]),
                SpriteFrame::from_rows(&[
                    "  .-====-.",
                    " ( @    @ )=-",
                    "  '-====-'",
                    "  \\|\\||/|/",
                    "  \\ \\||/ /",
                ]),
            ],
            12,
        )
    }
}

impl SpriteSource for SpriteSheet {
    fn frame_at(&self, tick: u64) -> Option<&SpriteFrame> {
        if self.frames.is_empty() || self.frames.iter().all(|f| f.width() == 0) {
            return None;
        }
        let idx = (tick / self.ticks_per_frame) as usize % self.frames.len();
        self.frames.get(idx)
    }
}

/// Character seen in a mirror.
fn mirror(c: char) -> char {
    match c {
        '/' => '\\',
        '\\' => '/',
        '(' => ')',
        ')' => '(',
        '<' => '>',
        '>' => '<',
        '[' => ']',
        ']' => '[',
        '{' => '}',
        '}' => '{',
        other => other,
    }
}

/// A single floating sprite. Positions are in cells.
#[derive(Debug, Clone, PartialEq)]
pub struct Particle {
    pub x: f32,
    pub y: f32,
    /// Drawn width in cells.
    pub width: f32,
    /// Sway phase offset.
    pub phase: f32,
    /// Rows fallen per frame.
    pub speed: f32,
    pub sway: f32,
    pub opacity: f32,
    /// True when drawn mirrored (drifting left).
    pub mirrored: bool,
}

/// The sprite overlay.
#[derive(Debug, Default)]
pub struct SpriteLayer {
    particles: Vec<Particle>,
    enabled: bool,
    /// Shared sway oscillator.
    angle: f32,
    ticks: u64,
    cells: Vec<Option<(char, ThemeColor)>>,
    width: u16,
    height: u16,
}

impl SpriteLayer {
    /// Resize the overlay. The canvas is cleared; sprites keep their place.
    pub fn resize(&mut self, width: u16, height: u16) {
        self.width = width;
        self.height = height;
        self.cells = vec![None; width as usize * height as usize];
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    /// Turn the overlay on or off. Turning it on scatters a new set of
    /// sprites over the viewport.
    pub fn set_enabled(&mut self, enabled: bool, rng: &mut impl Rng) {
        if enabled && !self.enabled {
            self.init(rng);
        }
        self.enabled = enabled;
    }

    fn init(&mut self, rng: &mut impl Rng) {
        let width = f32::from(self.width.max(1));
        let height = f32::from(self.height.max(1));
        self.particles = (0..SPRITE_COUNT)
            .map(|_| {
                // nearer sprites are bigger, faster, swing more and are brighter
                let layer: f32 = rng.random_range(0.0..2.0);
                Particle {
                    x: rng.random_range(0.0..width),
                    y: rng.random_range(0.0..height),
                    width: (70.0 + layer * 60.0) / PX_PER_COL,
                    phase: rng.random_range(0.0..100.0),
                    speed: (0.5 + layer * 0.3) / PX_PER_ROW,
                    sway: 1.1 + layer,
                    opacity: 0.4 + layer * 0.4,
                    mirrored: false,
                }
            })
            .collect();
    }

    fn clear(&mut self) {
        self.cells.iter_mut().for_each(|c| *c = None);
    }

    /// Advance and redraw one display frame.
    ///
    /// Does nothing but clear the canvas when disabled, and leaves
    /// everything untouched when the source has no drawable frame yet.
    pub fn frame(&mut self, source: &dyn SpriteSource, color: ThemeColor, rng: &mut impl Rng) {
        if !self.enabled {
            self.clear();
            return;
        }
        let Some(art) = source.frame_at(self.ticks) else {
            return;
        };

        self.clear();
        self.ticks = self.ticks.wrapping_add(1);
        self.angle += PHASE_STEP;

        let width = f32::from(self.width.max(1));
        let bottom = f32::from(self.height) + MARGIN_ROWS;
        let mut particles = std::mem::take(&mut self.particles);
        for p in &mut particles {
            p.y += p.speed;
            let drift = (self.angle + p.phase).sin() * (p.sway * 1.2);
            p.x += drift / PX_PER_COL;
            if drift > 0.1 {
                p.mirrored = false;
            } else if drift < -0.1 {
                p.mirrored = true;
            }
            let tilt = drift * 0.05;

            self.draw(p, art, tilt, color);

            if p.y > bottom {
                p.y = -MARGIN_ROWS;
                p.x = rng.random_range(0.0..width);
            }
        }
        self.particles = particles;
    }

    /// Draw `art` scaled to the particle width, centred on it, sheared by
    /// `tilt` radians and mirrored when needed.
    fn draw(&mut self, p: &Particle, art: &SpriteFrame, tilt: f32, color: ThemeColor) {
        if art.width() == 0 || art.height() == 0 {
            return;
        }
        let w = p.width.round().max(1.0) as i32;
        let scale = w as f32 / art.width() as f32;
        let h = (art.height() as f32 * scale).round().max(1.0) as i32;
        let left = (p.x - w as f32 / 2.0).floor() as i32;
        let top = (p.y - h as f32 / 2.0).floor() as i32;
        // cells are about twice as tall as they are wide
        let shear = tilt.tan() * 2.0;
        let color = color.scaled(p.opacity.min(1.0));

        for ty in 0..h {
            let offset = (-(ty as f32 - h as f32 / 2.0) * shear).round() as i32;
            let cy = top + ty;
            if cy < 0 || cy >= i32::from(self.height) {
                continue;
            }
            let sy = ty as usize * art.height() / h as usize;
            for tx in 0..w {
                let cx = left + tx + offset;
                if cx < 0 || cx >= i32::from(self.width) {
                    continue;
                }
                let mut sx = tx as usize * art.width() / w as usize;
                if p.mirrored {
                    sx = art.width() - 1 - sx;
                }
                let mut glyph = art.glyph(sx, sy);
                if glyph == ' ' {
                    continue;
                }
                if p.mirrored {
                    glyph = mirror(glyph);
                }
                let idx = cy as usize * self.width as usize + cx as usize;
                self.cells[idx] = Some((glyph, color));
            }
        }
    }

    /// The sprite pixel at `(x, y)`, if any.
    pub fn render_char(&self, x: u16, y: u16) -> Option<Span<'static>> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.cells[y as usize * self.width as usize + x as usize].map(|(glyph, color)| {
            Span::styled(glyph.to_string(), Style::new().fg(color.color()))
        })
    }

    #[cfg(test)]
    fn lit_cells(&self) -> usize {
        self.cells.iter().filter(|c| c.is_some()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{SeedableRng, rngs::StdRng};

    fn layer(rng: &mut StdRng) -> SpriteLayer {
        let mut layer = SpriteLayer::default();
        layer.resize(120, 40);
        layer.set_enabled(true, rng);
        layer
    }

    #[test]
    fn test_init_particles_in_range() {
        let mut rng = StdRng::seed_from_u64(1);
        let layer = layer(&mut rng);
        assert_eq!(layer.particles().len(), SPRITE_COUNT);
        for p in layer.particles() {
            assert!((0.0..120.0).contains(&p.x));
            assert!((0.0..40.0).contains(&p.y));
            assert!(p.width >= 70.0 / PX_PER_COL && p.width < 190.0 / PX_PER_COL);
            assert!(p.opacity >= 0.4 && p.opacity < 1.2);
        }
    }

    #[test]
    fn test_frame_moves_and_draws() {
        let mut rng = StdRng::seed_from_u64(2);
        let mut layer = layer(&mut rng);
        let before = layer.particles().to_vec();
        layer.frame(&SpriteSheet::sentinel(), ThemeColor::default(), &mut rng);
        for (old, new) in before.iter().zip(layer.particles()) {
            assert!(new.y > old.y);
        }
        assert!(layer.lit_cells() > 0);
    }

    #[test]
    fn test_disabled_layer_clears_and_idles() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut layer = layer(&mut rng);
        layer.frame(&SpriteSheet::sentinel(), ThemeColor::default(), &mut rng);
        layer.set_enabled(false, &mut rng);
        let before = layer.particles().to_vec();
        layer.frame(&SpriteSheet::sentinel(), ThemeColor::default(), &mut rng);
        assert_eq!(layer.lit_cells(), 0);
        assert_eq!(layer.particles(), before.as_slice());
    }

    #[test]
    fn test_unready_source_skips_frame() {
        let mut rng = StdRng::seed_from_u64(4);
        let mut layer = layer(&mut rng);
        let before = layer.particles().to_vec();
        layer.frame(&SpriteSheet::default(), ThemeColor::default(), &mut rng);
        assert_eq!(layer.particles(), before.as_slice());
        assert_eq!(layer.lit_cells(), 0);
    }

    #[test]
    fn test_particle_recycled_to_top() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut layer = layer(&mut rng);
        layer.particles[0].y = 40.0 + MARGIN_ROWS;
        layer.frame(&SpriteSheet::sentinel(), ThemeColor::default(), &mut rng);
        let p = &layer.particles()[0];
        assert_eq!(p.y, -MARGIN_ROWS);
        assert!((0.0..120.0).contains(&p.x));
    }

    #[test]
    fn test_sprite_faces_its_drift() {
        let mut rng = StdRng::seed_from_u64(6);
        let mut layer = layer(&mut rng);
        // sin(angle + phase) is about 1 with this phase, so drift is positive
        layer.particles[0].phase = std::f32::consts::FRAC_PI_2;
        layer.particles[0].mirrored = true;
        layer.frame(&SpriteSheet::sentinel(), ThemeColor::default(), &mut rng);
        assert!(!layer.particles()[0].mirrored);

        layer.particles[0].phase = -std::f32::consts::FRAC_PI_2;
        layer.frame(&SpriteSheet::sentinel(), ThemeColor::default(), &mut rng);
        assert!(layer.particles()[0].mirrored);
    }

    #[test]
    fn test_sheet_loops_frames() {
        let sheet = SpriteSheet::sentinel();
        let first = sheet.frame_at(0).unwrap();
        let second = sheet.frame_at(12).unwrap();
        assert_ne!(first, second);
        assert_eq!(sheet.frame_at(24).unwrap(), first);
        assert_eq!(mirror('/'), '\\');
    }
}
