//! The settings overlay.
//!
//! One row per option plus the media actions. Every adjustment is applied
//! to the live [`Settings`] at once and reported as a [`PanelEvent`] so the
//! app can re-apply the affected component; nothing is persisted until
//! the panel asks for [`PanelEvent::Save`].

use std::path::PathBuf;

use backdrop_config::{Settings, normalize_subreddits};
use backdrop_core::ThemeColor;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span},
    widgets::{Block, Clear, Paragraph},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    RainColor,
    RainSpeed,
    UiScale,
    TextScale,
    ShowMinutes,
    ShowSeconds,
    Use24Hour,
    MatrixGreen,
    Binary,
    CyberpunkFont,
    Flashing,
    Transparent,
    Glow,
    Scanline,
    BgFilter,
    Glitch,
    GlitchIntensity,
    ScaleMode,
    CycleQuotes,
    CustomQuote,
    Sprites,
    PhoneEnabled,
    PhoneFrequency,
    ChatEnabled,
    FeedEnabled,
    FeedSubreddits,
    UploadImage,
    UploadVideo,
    ClearBackdrop,
    UploadVoice,
    PurgeVoice,
    RestoreDefaults,
    Save,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Kind {
    Toggle,
    Slider { min: f32, max: f32, step: f32 },
    Choice,
    Text,
    Action,
}

impl Field {
    pub const ALL: [Field; 33] = [
        Field::RainColor,
        Field::RainSpeed,
        Field::UiScale,
        Field::TextScale,
        Field::ShowMinutes,
        Field::ShowSeconds,
        Field::Use24Hour,
        Field::MatrixGreen,
        Field::Binary,
        Field::CyberpunkFont,
        Field::Flashing,
        Field::Transparent,
        Field::Glow,
        Field::Scanline,
        Field::BgFilter,
        Field::Glitch,
        Field::GlitchIntensity,
        Field::ScaleMode,
        Field::CycleQuotes,
        Field::CustomQuote,
        Field::Sprites,
        Field::PhoneEnabled,
        Field::PhoneFrequency,
        Field::ChatEnabled,
        Field::FeedEnabled,
        Field::FeedSubreddits,
        Field::UploadImage,
        Field::UploadVideo,
        Field::ClearBackdrop,
        Field::UploadVoice,
        Field::PurgeVoice,
        Field::RestoreDefaults,
        Field::Save,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Field::RainColor => "Rain color",
            Field::RainSpeed => "Rain speed (ms)",
            Field::UiScale => "Clock size",
            Field::TextScale => "Text size",
            Field::ShowMinutes => "Show minutes",
            Field::ShowSeconds => "Show seconds",
            Field::Use24Hour => "24-hour clock",
            Field::MatrixGreen => "Classic green",
            Field::Binary => "Binary rain",
            Field::CyberpunkFont => "Cyberpunk font",
            Field::Flashing => "Rainbow rain",
            Field::Transparent => "Transparent panel",
            Field::Glow => "Glow",
            Field::Scanline => "Scanlines",
            Field::BgFilter => "Dim background",
            Field::Glitch => "Glitch",
            Field::GlitchIntensity => "Glitch intensity",
            Field::ScaleMode => "Backdrop fit",
            Field::CycleQuotes => "Cycle quotes",
            Field::CustomQuote => "Custom quote",
            Field::Sprites => "Sentinels",
            Field::PhoneEnabled => "Phone",
            Field::PhoneFrequency => "Call every (min)",
            Field::ChatEnabled => "Transmissions",
            Field::FeedEnabled => "Zion feed",
            Field::FeedSubreddits => "Subreddits",
            Field::UploadImage => "Upload image...",
            Field::UploadVideo => "Upload video...",
            Field::ClearBackdrop => "Clear backdrop",
            Field::UploadVoice => "Upload voice message...",
            Field::PurgeVoice => "Purge voice messages",
            Field::RestoreDefaults => "Restore defaults",
            Field::Save => "Save",
        }
    }

    fn kind(self) -> Kind {
        match self {
            Field::RainSpeed => Kind::Slider {
                min: 10.0,
                max: 150.0,
                step: 5.0,
            },
            Field::UiScale => Kind::Slider {
                min: 0.5,
                max: 2.0,
                step: 0.1,
            },
            Field::TextScale => Kind::Slider {
                min: 0.8,
                max: 2.0,
                step: 0.1,
            },
            Field::GlitchIntensity => Kind::Slider {
                min: 1.0,
                max: 20.0,
                step: 1.0,
            },
            Field::PhoneFrequency => Kind::Slider {
                min: 1.0,
                max: 60.0,
                step: 1.0,
            },
            Field::ScaleMode => Kind::Choice,
            Field::RainColor | Field::CustomQuote | Field::FeedSubreddits => Kind::Text,
            Field::UploadImage
            | Field::UploadVideo
            | Field::ClearBackdrop
            | Field::UploadVoice
            | Field::PurgeVoice
            | Field::RestoreDefaults
            | Field::Save => Kind::Action,
            _ => Kind::Toggle,
        }
    }

    /// Fields written to the store on their own as soon as they change.
    pub fn persists_immediately(self) -> bool {
        matches!(self, Field::FeedEnabled | Field::FeedSubreddits)
    }

    fn toggle_mut(self, s: &mut Settings) -> Option<&mut bool> {
        Some(match self {
            Field::ShowMinutes => &mut s.show_minutes,
            Field::ShowSeconds => &mut s.show_seconds,
            Field::Use24Hour => &mut s.use_24_hour,
            Field::MatrixGreen => &mut s.matrix_green,
            Field::Binary => &mut s.binary,
            Field::CyberpunkFont => &mut s.cyberpunk_font,
            Field::Flashing => &mut s.flashing,
            Field::Transparent => &mut s.transparent,
            Field::Glow => &mut s.glow,
            Field::Scanline => &mut s.scanline,
            Field::BgFilter => &mut s.bg_filter,
            Field::Glitch => &mut s.glitch,
            Field::CycleQuotes => &mut s.cycle_quotes,
            Field::Sprites => &mut s.sprites,
            Field::PhoneEnabled => &mut s.phone_enabled,
            Field::ChatEnabled => &mut s.chat_enabled,
            Field::FeedEnabled => &mut s.feed_enabled,
            _ => return None,
        })
    }

    fn slider_value(self, s: &Settings) -> f32 {
        match self {
            Field::RainSpeed => s.rain_speed as f32,
            Field::UiScale => s.ui_scale,
            Field::TextScale => s.text_scale,
            Field::GlitchIntensity => s.glitch_intensity as f32,
            Field::PhoneFrequency => s.phone_frequency as f32,
            _ => 0.0,
        }
    }

    fn set_slider_value(self, s: &mut Settings, value: f32) {
        match self {
            Field::RainSpeed => s.rain_speed = value.round() as u64,
            Field::UiScale => s.ui_scale = value,
            Field::TextScale => s.text_scale = value,
            Field::GlitchIntensity => s.glitch_intensity = value.round() as u16,
            Field::PhoneFrequency => s.phone_frequency = value.round() as u32,
            _ => {}
        }
    }

    fn text_value(self, s: &Settings) -> String {
        match self {
            Field::RainColor => s.rain_color.clone(),
            Field::CustomQuote => s.custom_quote.clone(),
            Field::FeedSubreddits => s.feed_subreddits.clone(),
            _ => String::new(),
        }
    }

    /// The value column of the row.
    pub fn value_text(self, s: &Settings) -> String {
        match self.kind() {
            Kind::Toggle => {
                let on = self.toggle_mut(&mut s.clone()).is_some_and(|v| *v);
                let mark = if on { "[x]" } else { "[ ]" };
                mark.to_string()
            }
            Kind::Slider { step, .. } => {
                let value = self.slider_value(s);
                if step < 1.0 {
                    format!("{value:.1}")
                } else {
                    format!("{value:.0}")
                }
            }
            Kind::Choice => format!("< {} >", s.scale_mode().as_str()),
            Kind::Text => self.text_value(s),
            Kind::Action => String::new(),
        }
    }

    /// Step a toggle, slider or choice. Returns whether anything changed.
    fn adjust(self, s: &mut Settings, delta: i32) -> bool {
        match self.kind() {
            Kind::Toggle => {
                let Some(value) = self.toggle_mut(s) else {
                    return false;
                };
                *value = !*value;
                if self == Field::CycleQuotes && s.cycle_quotes {
                    s.custom_quote.clear();
                }
                true
            }
            Kind::Slider { min, max, step } => {
                let old = self.slider_value(s);
                let raw = old + step * delta as f32;
                // keep tenths exact for the fractional sliders
                let next = ((raw * 10.0).round() / 10.0).clamp(min, max);
                if (next - old).abs() < f32::EPSILON {
                    return false;
                }
                self.set_slider_value(s, next);
                true
            }
            Kind::Choice => {
                let mode = s.scale_mode();
                let mode = if delta >= 0 { mode.next() } else { mode.next().next() };
                s.scale_mode = mode.as_str().to_string();
                true
            }
            Kind::Text | Kind::Action => false,
        }
    }

    /// Store edited text. Returns whether the value was accepted.
    fn commit_text(self, s: &mut Settings, text: &str) -> bool {
        match self {
            Field::RainColor => match ThemeColor::parse(text.trim()) {
                Some(color) => {
                    s.rain_color = color.to_hex();
                    true
                }
                None => false,
            },
            Field::CustomQuote => {
                s.custom_quote = text.to_string();
                if !text.trim().is_empty() {
                    s.cycle_quotes = false;
                }
                true
            }
            Field::FeedSubreddits => {
                s.feed_subreddits = normalize_subreddits(text);
                true
            }
            _ => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadKind {
    Image,
    Video,
    Voice,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Confirm {
    RestoreDefaults,
    PurgeVoice,
}

impl Confirm {
    fn question(self) -> &'static str {
        match self {
            Confirm::RestoreDefaults => "Hard Reset? (y/n)",
            Confirm::PurgeVoice => "Purge all messages? (y/n)",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Mode {
    Browse,
    Editing { buffer: String, original: String },
    Confirm(Confirm),
    Prompt { kind: UploadKind, buffer: String },
}

/// What the app has to do after a key press.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PanelEvent {
    Changed(Field),
    Save,
    Close,
    RestoreDefaults,
    Upload(UploadKind, PathBuf),
    ClearBackdrop,
    PurgeVoice,
}

#[derive(Debug)]
pub struct SettingsPanel {
    visible: bool,
    selected: usize,
    mode: Mode,
    /// One-line feedback such as "Messages stored."
    notice: Option<String>,
}

impl Default for SettingsPanel {
    fn default() -> Self {
        Self {
            visible: false,
            selected: 0,
            mode: Mode::Browse,
            notice: None,
        }
    }
}

impl SettingsPanel {
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn open(&mut self) {
        self.visible = true;
        self.mode = Mode::Browse;
        self.notice = None;
    }

    pub fn close(&mut self) {
        self.visible = false;
        self.mode = Mode::Browse;
    }

    pub fn selected(&self) -> Field {
        Field::ALL[self.selected]
    }

    pub fn set_notice(&mut self, notice: impl Into<String>) {
        self.notice = Some(notice.into());
    }

    #[cfg(test)]
    /// The confirmation question being asked, if any.
    pub fn question(&self) -> Option<&'static str> {
        match self.mode {
            Mode::Confirm(c) => Some(c.question()),
            _ => None,
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent, settings: &mut Settings) -> Option<PanelEvent> {
        match std::mem::replace(&mut self.mode, Mode::Browse) {
            Mode::Browse => self.browse_key(key, settings),
            Mode::Editing { buffer, original } => self.editing_key(key, settings, buffer, original),
            Mode::Confirm(confirm) => match key.code {
                KeyCode::Char('y') | KeyCode::Char('Y') => Some(match confirm {
                    Confirm::RestoreDefaults => PanelEvent::RestoreDefaults,
                    Confirm::PurgeVoice => PanelEvent::PurgeVoice,
                }),
                _ => None,
            },
            Mode::Prompt { kind, mut buffer } => match key.code {
                KeyCode::Enter => {
                    let path = buffer.trim();
                    if path.is_empty() {
                        None
                    } else {
                        Some(PanelEvent::Upload(kind, PathBuf::from(path)))
                    }
                }
                KeyCode::Esc => None,
                code => {
                    edit_buffer(&mut buffer, code);
                    self.mode = Mode::Prompt { kind, buffer };
                    None
                }
            },
        }
    }

    fn browse_key(&mut self, key: KeyEvent, settings: &mut Settings) -> Option<PanelEvent> {
        let field = self.selected();
        match (key.modifiers, key.code) {
            (KeyModifiers::CONTROL, KeyCode::Char('s')) => Some(PanelEvent::Save),
            (_, KeyCode::Esc | KeyCode::Char('s') | KeyCode::Char('q')) => Some(PanelEvent::Close),
            (_, KeyCode::Up | KeyCode::Char('k')) => {
                self.selected = (self.selected + Field::ALL.len() - 1) % Field::ALL.len();
                None
            }
            (_, KeyCode::Down | KeyCode::Char('j')) => {
                self.selected = (self.selected + 1) % Field::ALL.len();
                None
            }
            (_, KeyCode::Char('R')) => {
                self.mode = Mode::Confirm(Confirm::RestoreDefaults);
                None
            }
            (_, KeyCode::Left | KeyCode::Char('h')) => {
                field.adjust(settings, -1).then_some(PanelEvent::Changed(field))
            }
            (_, KeyCode::Right | KeyCode::Char('l')) => {
                field.adjust(settings, 1).then_some(PanelEvent::Changed(field))
            }
            (_, KeyCode::Enter | KeyCode::Char(' ')) => self.activate(field, settings),
            _ => None,
        }
    }

    fn activate(&mut self, field: Field, settings: &mut Settings) -> Option<PanelEvent> {
        match field.kind() {
            Kind::Text => {
                let original = field.text_value(settings);
                self.mode = Mode::Editing {
                    buffer: original.clone(),
                    original,
                };
                None
            }
            Kind::Action => match field {
                Field::UploadImage => self.prompt(UploadKind::Image),
                Field::UploadVideo => self.prompt(UploadKind::Video),
                Field::UploadVoice => self.prompt(UploadKind::Voice),
                Field::ClearBackdrop => Some(PanelEvent::ClearBackdrop),
                Field::PurgeVoice => {
                    self.mode = Mode::Confirm(Confirm::PurgeVoice);
                    None
                }
                Field::RestoreDefaults => {
                    self.mode = Mode::Confirm(Confirm::RestoreDefaults);
                    None
                }
                _ => Some(PanelEvent::Save),
            },
            _ => field.adjust(settings, 1).then_some(PanelEvent::Changed(field)),
        }
    }

    fn prompt(&mut self, kind: UploadKind) -> Option<PanelEvent> {
        self.mode = Mode::Prompt {
            kind,
            buffer: String::new(),
        };
        None
    }

    fn editing_key(
        &mut self,
        key: KeyEvent,
        settings: &mut Settings,
        mut buffer: String,
        original: String,
    ) -> Option<PanelEvent> {
        let field = self.selected();
        match key.code {
            KeyCode::Enter => field.commit_text(settings, &buffer).then_some(PanelEvent::Changed(field)),
            KeyCode::Esc => {
                let changed = field.text_value(settings) != original;
                if changed {
                    field.commit_text(settings, &original);
                }
                changed.then_some(PanelEvent::Changed(field))
            }
            code => {
                edit_buffer(&mut buffer, code);
                // the quote follows every keystroke
                let live = field == Field::CustomQuote;
                if live {
                    field.commit_text(settings, &buffer);
                }
                self.mode = Mode::Editing { buffer, original };
                live.then_some(PanelEvent::Changed(field))
            }
        }
    }

    pub fn render(&self, frame: &mut Frame, area: Rect, settings: &Settings, accent: Color) {
        let width = 56.min(area.width);
        let height = (Field::ALL.len() as u16 + 4).min(area.height);
        let [_, column, _] = Layout::horizontal([
            Constraint::Fill(1),
            Constraint::Length(width),
            Constraint::Fill(1),
        ])
        .areas(area);
        let [_, panel, _] = Layout::vertical([
            Constraint::Fill(1),
            Constraint::Length(height),
            Constraint::Fill(1),
        ])
        .areas(column);

        frame.render_widget(Clear, panel);
        let block = Block::bordered()
            .title(" SYSTEM CONFIG ")
            .border_style(Style::new().fg(accent))
            .style(Style::new().bg(Color::Black));
        let inner = block.inner(panel);
        frame.render_widget(block, panel);

        let [list_area, status_area] =
            Layout::vertical([Constraint::Fill(1), Constraint::Length(1)]).areas(inner);

        let label_width = 24usize;
        let lines: Vec<Line> = Field::ALL
            .iter()
            .enumerate()
            .map(|(i, field)| {
                let value = match (&self.mode, i == self.selected) {
                    (Mode::Editing { buffer, .. }, true) => format!("{buffer}_"),
                    _ => field.value_text(settings),
                };
                let row = Line::from(vec![
                    Span::raw(format!(" {:<label_width$}", field.label())),
                    Span::raw(value).fg(accent),
                ]);
                if i == self.selected {
                    row.style(Style::new().add_modifier(Modifier::REVERSED))
                } else {
                    row
                }
            })
            .collect();

        let visible = list_area.height as usize;
        let scroll = self.selected.saturating_sub(visible.saturating_sub(1));
        frame.render_widget(Paragraph::new(lines).scroll((scroll as u16, 0)), list_area);

        let status = match &self.mode {
            Mode::Confirm(c) => Line::from(c.question()).fg(Color::Red),
            Mode::Prompt { buffer, .. } => Line::from(format!("path: {buffer}_")),
            Mode::Editing { .. } => Line::from("Enter apply  Esc cancel").dark_gray(),
            Mode::Browse => match &self.notice {
                Some(notice) => Line::from(notice.as_str()).fg(accent),
                None => Line::from("↑↓ select  ←→ adjust  ^S save  R reset").dark_gray(),
            },
        };
        frame.render_widget(Paragraph::new(status), status_area);
    }
}

fn edit_buffer(buffer: &mut String, code: KeyCode) {
    match code {
        KeyCode::Backspace => {
            buffer.pop();
        }
        KeyCode::Char(c) => buffer.push(c),
        _ => {}
    }
}
