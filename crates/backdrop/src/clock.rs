//! The clock panel: big time, long date and the quote line.

use std::time::{Duration, Instant};

use backdrop_config::Settings;
use backdrop_core::{ClockOptions, Interval, format_date, format_time};
use backdrop_fonts::{FontStyle, GLYPH_HEIGHT, render_big};
use chrono::{NaiveDateTime, Timelike};
use rand::Rng;
use ratatui::{
    Frame,
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    widgets::{Block, Clear},
};

use crate::quotes::QuoteCycler;

pub const CLOCK_TICK: Duration = Duration::from_secs(1);

/// Chance per frame that the glitch effect jumps.
const GLITCH_CHANCE: f64 = 0.1;

/// How the panel looks, derived from the settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClockStyle {
    pub color: Color,
    pub font: FontStyle,
    /// Horizontal stretch of the big digits.
    pub stretch: usize,
    /// Blank cells between letters of the date and quote.
    pub letter_spacing: usize,
    pub glow: bool,
    pub transparent: bool,
}

impl ClockStyle {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            color: settings.effective_rain_color().color(),
            font: FontStyle::from_cyberpunk(settings.cyberpunk_font),
            stretch: stretch_for(settings.ui_scale),
            letter_spacing: spacing_for(settings.text_scale),
            glow: settings.glow,
            transparent: settings.transparent,
        }
    }
}

/// Map the 0.5..=2.0 panel scale onto 1..=4 columns per glyph column.
fn stretch_for(ui_scale: f32) -> usize {
    (ui_scale.clamp(0.5, 2.0) * 2.0).round() as usize
}

/// Map the 0.8..=2.0 text scale onto letter spacing.
fn spacing_for(text_scale: f32) -> usize {
    (text_scale.clamp(0.8, 2.0).round() as usize).saturating_sub(1)
}

fn widen(text: &str, spacing: usize) -> String {
    if spacing == 0 {
        return text.to_string();
    }
    let gap = " ".repeat(spacing);
    let chars: Vec<String> = text.chars().map(String::from).collect();
    chars.join(&gap)
}

/// Time and date text refreshed once a second.
#[derive(Debug, Clone)]
pub struct ClockView {
    timer: Interval,
    time: String,
    date: String,
    glitch_offset: i16,
}

impl ClockView {
    pub fn new(local: NaiveDateTime, opts: ClockOptions, now: Instant) -> Self {
        let mut view = Self {
            timer: Interval::new(CLOCK_TICK),
            time: String::new(),
            date: String::new(),
            glitch_offset: 0,
        };
        view.refresh(local, opts);
        view.timer.start(now);
        view
    }

    #[cfg(test)]
    pub fn time(&self) -> &str {
        &self.time
    }

    #[cfg(test)]
    pub fn date(&self) -> &str {
        &self.date
    }

    #[cfg(test)]
    pub fn glitch_offset(&self) -> i16 {
        self.glitch_offset
    }

    /// Recompute the text immediately, e.g. after a format toggle.
    pub fn refresh(&mut self, local: NaiveDateTime, opts: ClockOptions) {
        self.time = format_time(local.hour(), local.minute(), local.second(), opts);
        self.date = format_date(local.date());
    }

    /// Refresh when the second ticks over. Returns true if it did.
    pub fn tick(&mut self, now: Instant, local: NaiveDateTime, opts: ClockOptions) -> bool {
        if !self.timer.poll(now) {
            return false;
        }
        self.refresh(local, opts);
        true
    }

    /// Roll the glitch jitter for this frame.
    pub fn roll_glitch(&mut self, enabled: bool, intensity: u16, rng: &mut impl Rng) {
        if !enabled || intensity == 0 {
            self.glitch_offset = 0;
            return;
        }
        if rng.random_bool(GLITCH_CHANCE) {
            let max = intensity.min(i16::MAX as u16) as i16;
            self.glitch_offset = rng.random_range(-max..=max);
        } else {
            self.glitch_offset = 0;
        }
    }

    /// Draw the panel centered in `area`. Returns the panel rectangle.
    pub fn render(&self, frame: &mut Frame, area: Rect, style: &ClockStyle, quote: &QuoteCycler) -> Rect {
        let big = render_big(&self.time, style.font, style.stretch);
        let date = widen(&self.date, style.letter_spacing);
        let quote_text = widen(&format!("\"{}\"", quote.text()), style.letter_spacing);

        let content_width = big
            .iter()
            .map(|l| l.chars().count())
            .chain([date.chars().count(), quote_text.chars().count()])
            .max()
            .unwrap_or(0);
        let width = (content_width as u16).saturating_add(4);
        // border, digits, blank, date, blank, quote, border
        let height = GLYPH_HEIGHT as u16 + 6;
        let panel = centered(area, width, height, self.glitch_offset);

        let mut text_style = Style::new().fg(style.color);
        if style.glow {
            text_style = text_style.add_modifier(Modifier::BOLD);
        }
        let quote_style = if quote.is_faded() {
            Style::new().fg(Color::DarkGray)
        } else {
            text_style.add_modifier(Modifier::ITALIC)
        };

        if !style.transparent {
            frame.render_widget(Clear, panel);
            frame.render_widget(
                Block::bordered()
                    .border_style(Style::new().fg(style.color))
                    .style(Style::new().bg(Color::Black)),
                panel,
            );
        }

        let inner = panel.inner(ratatui::layout::Margin::new(1, 1));
        let buf = frame.buffer_mut();
        let skip_blank = style.transparent;
        for (row, line) in big.iter().enumerate() {
            put_centered(buf, inner, row as u16, line, text_style, skip_blank);
        }
        put_centered(buf, inner, GLYPH_HEIGHT as u16 + 1, &date, text_style, skip_blank);
        put_centered(buf, inner, GLYPH_HEIGHT as u16 + 3, &quote_text, quote_style, skip_blank);
        panel
    }
}

fn centered(area: Rect, width: u16, height: u16, offset: i16) -> Rect {
    let w = width.min(area.width);
    let h = height.min(area.height);
    let x = area.x + (area.width - w) / 2;
    let max_x = area.x + area.width - w;
    let x = (x as i32 + offset as i32).clamp(area.x as i32, max_x as i32) as u16;
    let y = area.y + (area.height - h) / 2;
    Rect::new(x, y, w, h)
}

/// Write one centered line. Blank cells are left alone when `skip_blank`
/// so the rain shows through.
fn put_centered(buf: &mut Buffer, area: Rect, row: u16, text: &str, style: Style, skip_blank: bool) {
    if row >= area.height {
        return;
    }
    let len = text.chars().count() as u16;
    let start = area.x + area.width.saturating_sub(len) / 2;
    let y = area.y + row;
    for (i, c) in text.chars().enumerate() {
        let x = start + i as u16;
        if x >= area.right() {
            break;
        }
        if skip_blank && c == ' ' {
            continue;
        }
        if let Some(cell) = buf.cell_mut((x, y)) {
            cell.set_char(c).set_style(style);
        }
    }
}

/// Dim every other row of `area`.
pub fn apply_scanlines(buf: &mut Buffer, area: Rect) {
    for y in (area.y..area.bottom()).filter(|y| y % 2 == 1) {
        for x in area.x..area.right() {
            if let Some(cell) = buf.cell_mut((x, y)) {
                cell.modifier.insert(Modifier::DIM);
            }
        }
    }
}
