//! The main loop: owns every component, routes keys and draws the screen.

use std::path::Path;
use std::time::{Duration, Instant};

use backdrop_background::{BackgroundState, LayerOptions, Picture, RainStyle};
use backdrop_config::{
    Backdrop, MediaRepository, Settings, SettingsStore, decode_data_url, load_settings,
    mime_for_path,
};
use backdrop_core::Interval;
use chrono::Local;
use color_eyre::eyre::{Result, WrapErr, eyre};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use rand::{SeedableRng, rngs::StdRng};
use ratatui::{
    DefaultTerminal, Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span},
    widgets::{Block, Clear, Paragraph},
};
use tracing::{debug, info, warn};

use crate::audio::{AudioOutput, Narrator};
use crate::chat::ChatSimulator;
use crate::clock::{ClockStyle, ClockView, apply_scanlines};
use crate::feed::{ERROR_TEXT, FeedMonitor, FeedPanel, FeedState, LOADING_TEXT};
use crate::phone::{Phone, PhoneState};
use crate::quotes::QuoteCycler;
use crate::settings_panel::{Field, PanelEvent, SettingsPanel, UploadKind};

/// Event poll timeout, roughly one display frame.
const FRAME: Duration = Duration::from_millis(16);

const FEED_WIDTH: u16 = 46;
const CHAT_WIDTH: u16 = 48;
const CHAT_HEIGHT: u16 = 8;
const PHONE_WIDTH: u16 = 32;

/// Everything the app talks to outside its own state.
pub struct Backends {
    pub settings: Box<dyn SettingsStore>,
    pub media: MediaRepository,
    pub audio: Box<dyn AudioOutput>,
    pub narrator: Box<dyn Narrator>,
    pub feed: FeedMonitor,
}

pub struct App {
    running: bool,
    settings: Settings,
    store: Box<dyn SettingsStore>,
    media: MediaRepository,
    audio: Box<dyn AudioOutput>,
    narrator: Box<dyn Narrator>,
    background: BackgroundState,
    rain_timer: Interval,
    clock: ClockView,
    quotes: QuoteCycler,
    panel: SettingsPanel,
    feed: FeedMonitor,
    feed_panel: FeedPanel,
    phone: Phone,
    chat: ChatSimulator,
    /// Stored backdrop: "image", "video" or "none".
    backdrop_kind: &'static str,
    /// Backdrop kind and fit shown in the footer.
    status: String,
    rng: StdRng,
}

impl App {
    /// Load the settings and start every component.
    pub fn new(backends: Backends, now: Instant) -> Self {
        let settings = load_settings(backends.settings.as_ref());
        let clock = ClockView::new(Local::now().naive_local(), settings.clock_options(), now);
        let mut app = Self {
            running: false,
            settings,
            store: backends.settings,
            media: backends.media,
            audio: backends.audio,
            narrator: backends.narrator,
            background: BackgroundState::new(),
            rain_timer: Interval::new(Duration::from_millis(35)),
            clock,
            quotes: QuoteCycler::default(),
            panel: SettingsPanel::default(),
            feed: backends.feed,
            feed_panel: FeedPanel::default(),
            phone: Phone::default(),
            chat: ChatSimulator::default(),
            backdrop_kind: "none",
            status: String::new(),
            rng: StdRng::from_os_rng(),
        };
        app.apply_all(now);
        app
    }

    /// Run the application's main loop.
    pub fn run(mut self, mut terminal: DefaultTerminal) -> Result<()> {
        self.running = true;
        while self.running {
            self.tick(Instant::now());
            terminal.draw(|frame| self.render(frame))?;
            self.handle_crossterm_events()?;
        }
        Ok(())
    }

    /// Push the whole record into every component.
    fn apply_all(&mut self, now: Instant) {
        self.restart_rain(now);
        self.clock
            .refresh(Local::now().naive_local(), self.settings.clock_options());
        self.quotes
            .configure(&self.settings.custom_quote, self.settings.cycle_quotes, now);
        self.background.set_sprites_enabled(self.settings.sprites);
        self.phone.configure(
            self.settings.phone_enabled,
            self.settings.phone_frequency,
            now,
            self.audio.as_mut(),
        );
        self.chat
            .set_enabled(self.settings.chat_enabled, now, &mut self.rng);
        self.feed.configure(
            self.settings.feed_enabled,
            &self.settings.feed_subreddits,
            now,
        );
        self.reload_backdrop();
    }

    /// Re-apply the component a single field drives.
    fn apply_field(&mut self, field: Field, now: Instant) {
        match field {
            Field::RainSpeed => self.restart_rain(now),
            Field::ShowMinutes | Field::ShowSeconds | Field::Use24Hour => self
                .clock
                .refresh(Local::now().naive_local(), self.settings.clock_options()),
            Field::CycleQuotes | Field::CustomQuote => self.quotes.configure(
                &self.settings.custom_quote,
                self.settings.cycle_quotes,
                now,
            ),
            Field::Sprites => self.background.set_sprites_enabled(self.settings.sprites),
            Field::PhoneEnabled | Field::PhoneFrequency => self.phone.configure(
                self.settings.phone_enabled,
                self.settings.phone_frequency,
                now,
                self.audio.as_mut(),
            ),
            Field::ChatEnabled => {
                self.chat
                    .set_enabled(self.settings.chat_enabled, now, &mut self.rng)
            }
            Field::FeedEnabled | Field::FeedSubreddits => {
                self.feed.configure(
                    self.settings.feed_enabled,
                    &self.settings.feed_subreddits,
                    now,
                );
                self.feed_panel.clear_highlight(now);
            }
            Field::ScaleMode => self.refresh_status(),
            _ => {}
        }

        if field.persists_immediately() {
            self.persist_key(field);
        }
    }

    fn persist_key(&mut self, field: Field) {
        let key = match field {
            Field::FeedEnabled => "feed_enabled",
            _ => "feed_subreddits",
        };
        let Some(value) = self.settings.value_of(key) else {
            return;
        };
        if let Err(e) = self.store.set(key, value) {
            warn!(key, error = %e, "failed to persist setting");
        }
    }

    fn restart_rain(&mut self, now: Instant) {
        let period = Duration::from_millis(self.settings.rain_speed.max(1));
        self.rain_timer.restart(period, now);
    }

    /// Load the stored backdrop into the picture layer. A video is only
    /// reported in the footer.
    fn reload_backdrop(&mut self) {
        let (kind, picture) = match self.media.background() {
            Ok(Some(Backdrop::Image(url))) => {
                let picture = decode_data_url(&url)
                    .map_err(|e| e.to_string())
                    .and_then(|bytes| Picture::decode(&bytes));
                match picture {
                    Ok(picture) => ("image", Some(picture)),
                    Err(e) => {
                        warn!(error = %e, "failed to decode backdrop image");
                        ("image", None)
                    }
                }
            }
            Ok(Some(Backdrop::Video(_))) => ("video", None),
            Ok(None) => ("none", None),
            Err(e) => {
                debug!(error = %e, "failed to read backdrop");
                ("none", None)
            }
        };
        self.background.set_picture(picture);
        self.backdrop_kind = kind;
        self.refresh_status();
    }

    fn refresh_status(&mut self) {
        let mode = self.settings.scale_mode();
        self.background.set_scale_mode(mode);
        self.status = format!("backdrop: {} ({})", self.backdrop_kind, mode.as_str());
    }

    /// Advance every timer-driven component to `now`.
    pub fn tick(&mut self, now: Instant) {
        let color = self.settings.effective_rain_color();
        if self.rain_timer.poll(now) {
            self.background.tick_rain(RainStyle {
                color,
                alphabet: self.settings.alphabet(),
                flashing: self.settings.flashing,
            });
        }
        self.background.frame_sprites(color);

        self.clock.tick(
            now,
            Local::now().naive_local(),
            self.settings.clock_options(),
        );
        self.clock.roll_glitch(
            self.settings.glitch,
            self.settings.glitch_intensity,
            &mut self.rng,
        );
        self.quotes.tick(now);

        self.phone
            .tick(now, self.audio.as_mut(), self.narrator.as_mut());
        self.chat.tick(now, self.audio.as_mut(), &mut self.rng);

        // the fetch thread finishes on its own
        let _ = self.feed.tick(now);
        self.feed_panel.sync(&self.feed, &mut self.rng);
        self.feed_panel.tick(now, &mut self.rng);
    }

    /// Reads the crossterm events and updates the state of [`App`].
    fn handle_crossterm_events(&mut self) -> Result<()> {
        if event::poll(FRAME)? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    self.on_key_event(key, Instant::now())
                }
                // the background resizes itself on the next draw
                Event::Resize(_, _) => {}
                _ => {}
            }
        }
        Ok(())
    }

    fn on_key_event(&mut self, key: KeyEvent, now: Instant) {
        if self.panel.is_visible() {
            if let Some(event) = self.panel.handle_key(key, &mut self.settings) {
                self.on_panel_event(event, now);
            }
            return;
        }

        match (key.modifiers, key.code) {
            (_, KeyCode::Esc | KeyCode::Char('q'))
            | (KeyModifiers::CONTROL, KeyCode::Char('c') | KeyCode::Char('C')) => self.quit(),
            (_, KeyCode::Char('s')) => self.panel.open(),
            (_, KeyCode::Char('p')) => self.answer(now),
            (_, KeyCode::Tab) => self.feed_panel.highlight_next(now),
            (_, KeyCode::BackTab) => self.feed_panel.highlight_prev(now),
            (_, KeyCode::Enter) => self.open_highlighted(),
            _ => {}
        }
    }

    fn answer(&mut self, now: Instant) {
        if self.phone.state() != PhoneState::Ringing {
            return;
        }
        let messages = self.media.voice_messages().unwrap_or_else(|e| {
            warn!(error = %e, "failed to read voice messages");
            Vec::new()
        });
        self.phone
            .answer(now, messages, self.audio.as_mut(), &mut self.rng);
    }

    fn open_highlighted(&self) {
        let Some(url) = self.feed_panel.highlighted_url() else {
            return;
        };
        if let Err(e) = webbrowser::open(&url) {
            warn!(%url, error = %e, "failed to open link");
        }
    }

    fn on_panel_event(&mut self, event: PanelEvent, now: Instant) {
        match event {
            PanelEvent::Changed(field) => self.apply_field(field, now),
            PanelEvent::Save => match self.store.set_all(&self.settings) {
                Ok(()) => {
                    info!("settings saved");
                    self.panel.close();
                }
                Err(e) => {
                    warn!(error = %e, "failed to save settings");
                    self.panel.set_notice("Save failed");
                }
            },
            PanelEvent::Close => self.panel.close(),
            PanelEvent::RestoreDefaults => {
                if let Err(e) = self.restore_defaults() {
                    warn!(error = %e, "restore defaults incomplete");
                }
                self.settings = load_settings(self.store.as_ref());
                self.apply_all(now);
                self.panel.close();
            }
            PanelEvent::Upload(kind, path) => {
                let notice = match self.upload(kind, &path) {
                    Ok(()) if kind == UploadKind::Voice => "Messages stored.".to_string(),
                    Ok(()) => "Backdrop stored.".to_string(),
                    Err(e) => {
                        warn!(path = %path.display(), error = %e, "upload failed");
                        format!("Upload failed: {e}")
                    }
                };
                self.panel.set_notice(notice);
                if kind != UploadKind::Voice {
                    self.reload_backdrop();
                }
            }
            PanelEvent::ClearBackdrop => {
                if let Err(e) = self.media.clear_background() {
                    warn!(error = %e, "failed to clear backdrop");
                }
                self.reload_backdrop();
            }
            PanelEvent::PurgeVoice => {
                if let Err(e) = self.media.clear_voice_messages() {
                    warn!(error = %e, "failed to purge voice messages");
                }
            }
        }
    }

    /// Clear settings and media. Both are attempted even if one fails.
    fn restore_defaults(&mut self) -> Result<()> {
        let settings = self.store.clear().wrap_err("failed to clear settings");
        let media = self.media.clear_all().wrap_err("failed to clear media");
        match (settings, media) {
            (Ok(()), Ok(())) => {
                info!("restored defaults");
                Ok(())
            }
            (Err(e), Ok(())) | (Ok(()), Err(e)) => Err(e),
            (Err(settings), Err(media)) => Err(eyre!("{settings:#}; {media:#}")),
        }
    }

    fn upload(&mut self, kind: UploadKind, path: &Path) -> Result<()> {
        let bytes = std::fs::read(path)
            .wrap_err_with(|| format!("failed to read {}", path.display()))?;
        match kind {
            UploadKind::Image => {
                self.media.save_image(&bytes, mime_for_path(path))?;
            }
            UploadKind::Video => self.media.save_video(&bytes)?,
            UploadKind::Voice => {
                self.media.add_voice_message(&bytes)?;
            }
        }
        Ok(())
    }

    /// Set running to false to quit the application.
    fn quit(&mut self) {
        self.running = false;
    }

    /// Renders the user interface.
    fn render(&mut self, frame: &mut Frame) {
        let area = frame.area();
        let accent = self.settings.effective_rain_color().color();

        self.background.render(
            frame,
            area,
            LayerOptions {
                bg_filter: self.settings.bg_filter,
            },
        );

        let [main, footer] =
            Layout::vertical([Constraint::Fill(1), Constraint::Length(1)]).areas(area);

        let style = ClockStyle::from_settings(&self.settings);
        self.clock.render(frame, main, &style, &self.quotes);

        if self.feed_panel.state() != &FeedState::Hidden {
            self.render_feed(frame, main, accent);
        }
        if self.settings.phone_enabled {
            self.render_phone(frame, main, accent);
        }
        if self.chat.is_enabled() {
            self.render_chat(frame, main, accent);
        }
        self.render_footer(frame, footer, accent);

        if self.panel.is_visible() {
            self.panel.render(frame, area, &self.settings, accent);
        }
        if self.settings.scanline {
            apply_scanlines(frame.buffer_mut(), area);
        }
    }

    fn render_feed(&self, frame: &mut Frame, main: Rect, accent: Color) {
        let width = FEED_WIDTH.min(main.width);
        let height = (self.feed_panel.entries().len() as u16 * 2 + 2)
            .max(4)
            .min(main.height);
        let panel = Rect::new(main.right() - width, main.y, width, height);

        let lines: Vec<Line> = match self.feed_panel.state() {
            FeedState::Loading => vec![Line::from(LOADING_TEXT).dark_gray()],
            FeedState::Error => vec![Line::from(ERROR_TEXT).red()],
            _ => self
                .feed_panel
                .entries()
                .iter()
                .enumerate()
                .flat_map(|(i, entry)| {
                    let mut title = Style::new().fg(accent);
                    if self.feed_panel.highlighted() == Some(i) {
                        title = title.add_modifier(Modifier::BOLD | Modifier::REVERSED);
                    }
                    [
                        Line::from(Span::styled(entry.title.display().to_string(), title)),
                        Line::from(entry.item.meta()).dark_gray(),
                    ]
                })
                .collect(),
        };

        frame.render_widget(Clear, panel);
        frame.render_widget(
            Paragraph::new(lines).block(
                Block::bordered()
                    .title(" ZION NETWORK ")
                    .border_style(Style::new().fg(accent))
                    .style(Style::new().bg(Color::Black)),
            ),
            panel,
        );
    }

    fn render_phone(&self, frame: &mut Frame, main: Rect, accent: Color) {
        let width = PHONE_WIDTH.min(main.width);
        let height = 3.min(main.height);
        let panel = Rect::new(main.x, main.bottom() - height, width, height);
        let text = match self.phone.state() {
            PhoneState::Ringing => Line::from(vec![
                Span::styled(
                    self.phone.text().to_string(),
                    Style::new().fg(Color::Red).add_modifier(Modifier::SLOW_BLINK),
                ),
                Span::raw(" [p]").dark_gray(),
            ]),
            PhoneState::Receiving => Line::from(self.phone.text().to_string()).fg(accent),
            PhoneState::Idle => Line::from(self.phone.text().to_string()).dark_gray(),
        };
        frame.render_widget(Clear, panel);
        frame.render_widget(
            Paragraph::new(text).block(
                Block::bordered()
                    .title(" ☎ ")
                    .border_style(Style::new().fg(accent))
                    .style(Style::new().bg(Color::Black)),
            ),
            panel,
        );
    }

    fn render_chat(&self, frame: &mut Frame, main: Rect, accent: Color) {
        let width = CHAT_WIDTH.min(main.width);
        let height = CHAT_HEIGHT.min(main.height);
        let panel = Rect::new(main.right() - width, main.bottom() - height, width, height);
        let block = Block::bordered()
            .title(" TRANSMISSION ")
            .border_style(Style::new().fg(accent))
            .style(Style::new().bg(Color::Black));
        let inner = block.inner(panel);

        // newest line at the bottom
        let log = self.chat.log();
        let skip = log.len().saturating_sub(inner.height as usize);
        let lines: Vec<Line> = log
            .iter()
            .skip(skip)
            .map(|line| {
                Line::from(vec![
                    Span::styled(
                        format!("{}: ", line.speaker),
                        Style::new().fg(line.tone.color()).bold(),
                    ),
                    Span::raw(line.text),
                ])
            })
            .collect();

        frame.render_widget(Clear, panel);
        frame.render_widget(Paragraph::new(lines).block(block), panel);
    }

    fn render_footer(&self, frame: &mut Frame, area: Rect, accent: Color) {
        let help = Line::from(vec![
            "⚙ s".bold().fg(accent),
            " settings  ".dark_gray(),
            "p".bold().fg(accent),
            " answer  ".dark_gray(),
            "tab".bold().fg(accent),
            " feed  ".dark_gray(),
            "q".bold().fg(accent),
            " quit".dark_gray(),
        ]);
        let [left, right] =
            Layout::horizontal([Constraint::Fill(1), Constraint::Length(self.status.len() as u16 + 1)])
                .areas(area);
        frame.render_widget(help, left);
        frame.render_widget(Line::from(self.status.as_str()).dark_gray().right_aligned(), right);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;
    use std::sync::Arc;

    use backdrop_config::MemorySettingsStore;
    use backdrop_core::ScaleMode;
    use ratatui::{Terminal, backend::TestBackend};

    use crate::audio::tests::{RecordingAudio, RecordingNarrator};
    use crate::feed::FeedItem;

    fn offline_feed() -> FeedMonitor {
        FeedMonitor::with_fetcher(Arc::new(|_subs: &str| {
            Ok(vec![FeedItem {
                title: "Wake up".to_string(),
                permalink: "/r/matrix/comments/1/wake_up/".to_string(),
                subreddit: "matrix".to_string(),
                author: "trinity".to_string(),
            }])
        }))
    }

    fn app_with(store: MemorySettingsStore, finish: Rc<Cell<bool>>) -> App {
        let audio = RecordingAudio {
            finish,
            ..RecordingAudio::default()
        };
        App::new(
            Backends {
                settings: Box::new(store),
                media: MediaRepository::in_memory(),
                audio: Box::new(audio),
                narrator: Box::new(RecordingNarrator::default()),
                feed: offline_feed(),
            },
            Instant::now(),
        )
    }

    fn app() -> App {
        app_with(MemorySettingsStore::default(), Rc::default())
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn screen(app: &mut App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(120, 40)).unwrap();
        terminal.draw(|frame| app.render(frame)).unwrap();
        let buf = terminal.backend().buffer();
        (0..buf.area.height)
            .map(|y| {
                (0..buf.area.width)
                    .map(|x| buf[(x, y)].symbol().to_string())
                    .collect::<String>()
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn test_render_smoke() {
        let mut app = app();
        let now = Instant::now();
        for n in 0..10 {
            app.tick(now + FRAME * n);
        }
        let text = screen(&mut app);
        assert!(text.contains("settings"));
        assert!(text.contains("backdrop: none (cover)"));
        assert!(text.contains("There is no spoon."));
        assert!(text.contains("INCOMING SIGNAL..."));
        assert!(!text.contains("ZION NETWORK"));
    }

    #[test]
    fn test_stored_record_is_loaded() {
        let mut store = MemorySettingsStore::default();
        store.set("custom_quote", toml::Value::String("Dodge this.".into())).unwrap();
        let mut app = app_with(store, Rc::default());
        assert_eq!(app.settings.custom_quote, "Dodge this.");
        assert!(screen(&mut app).contains("\"Dodge this.\""));
    }

    #[test]
    fn test_settings_key_opens_panel_and_save_persists() {
        let mut app = app();
        let now = Instant::now();
        app.on_key_event(key(KeyCode::Char('s')), now);
        assert!(app.panel.is_visible());

        // rain color row is first; step down to rain speed and bump it
        app.on_key_event(key(KeyCode::Down), now);
        app.on_key_event(key(KeyCode::Right), now);
        assert_eq!(app.settings.rain_speed, 40);
        assert_eq!(app.rain_timer.period(), Duration::from_millis(40));
        assert!(app.store.get_all().unwrap().is_none());

        app.on_key_event(KeyEvent::new(KeyCode::Char('s'), KeyModifiers::CONTROL), now);
        assert!(!app.panel.is_visible());
        let stored = app.store.get_all().unwrap().unwrap();
        assert_eq!(stored.get("rain_speed"), Some(&toml::Value::Integer(40)));
        assert_eq!(stored.len(), Settings::keys().len());
    }

    #[test]
    fn test_feed_toggle_persists_single_key_and_fetches() {
        let mut app = app();
        let now = Instant::now();
        app.on_panel_event(PanelEvent::Changed(Field::FeedEnabled), now);
        // the live record still says disabled; flip it the way the panel does
        app.settings.feed_enabled = true;
        app.on_panel_event(PanelEvent::Changed(Field::FeedEnabled), now);

        let stored = app.store.get_all().unwrap().unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored.get("feed_enabled"), Some(&toml::Value::Boolean(true)));

        let mut later = now;
        while !matches!(app.feed_panel.state(), FeedState::Items(_)) {
            later += FRAME;
            app.tick(later);
            std::thread::sleep(Duration::from_millis(1));
            assert!(later < now + Duration::from_secs(60), "feed never arrived");
        }
        assert!(screen(&mut app).contains("ZION NETWORK"));
        assert!(screen(&mut app).contains("r/matrix • u/trinity"));

        app.on_key_event(key(KeyCode::Tab), later);
        assert_eq!(
            app.feed_panel.highlighted_url().as_deref(),
            Some("https://reddit.com/r/matrix/comments/1/wake_up/")
        );
    }

    #[test]
    fn test_answer_plays_voice_message() {
        let finish = Rc::new(Cell::new(false));
        let mut app = app_with(MemorySettingsStore::default(), finish.clone());
        let now = Instant::now();
        app.media.add_voice_message(b"RIFF").unwrap();

        // not ringing yet
        app.on_key_event(key(KeyCode::Char('p')), now);
        assert_eq!(app.phone.state(), PhoneState::Idle);

        app.phone.ring(app.audio.as_mut());
        app.on_key_event(key(KeyCode::Char('p')), now);
        assert_eq!(app.phone.state(), PhoneState::Receiving);
        assert_eq!(app.phone.text(), crate::phone::RECORDING_TEXT);

        finish.set(true);
        app.tick(now + FRAME);
        app.tick(now + Duration::from_secs(2));
        assert_eq!(app.phone.state(), PhoneState::Idle);
    }

    #[test]
    fn test_upload_and_restore_defaults() {
        let mut app = app();
        let now = Instant::now();
        let path = std::env::temp_dir().join(format!("backdrop-app-{}.png", std::process::id()));
        std::fs::write(&path, b"\x89PNG").unwrap();

        app.on_panel_event(PanelEvent::Upload(UploadKind::Image, path.clone()), now);
        assert!(matches!(app.media.background().unwrap(), Some(Backdrop::Image(url)) if url.starts_with("data:image/png;base64,")));
        assert_eq!(app.status, "backdrop: image (cover)");
        std::fs::remove_file(&path).unwrap();

        app.settings.rain_speed = 90;
        app.store.set_all(&app.settings).unwrap();
        app.on_panel_event(PanelEvent::RestoreDefaults, now);
        assert_eq!(app.settings, Settings::default());
        assert!(app.store.get_all().unwrap().is_none());
        assert!(app.media.background().unwrap().is_none());
        assert_eq!(app.status, "backdrop: none (cover)");
    }

    /// Settings store that cannot be cleared.
    #[derive(Default)]
    struct StuckStore(MemorySettingsStore);

    impl SettingsStore for StuckStore {
        fn get_all(&self) -> Result<Option<toml::Table>> {
            self.0.get_all()
        }

        fn set_all(&mut self, settings: &Settings) -> Result<()> {
            self.0.set_all(settings)
        }

        fn set(&mut self, key: &str, value: toml::Value) -> Result<()> {
            self.0.set(key, value)
        }

        fn clear(&mut self) -> Result<()> {
            Err(eyre!("read-only settings"))
        }
    }

    #[test]
    fn test_restore_defaults_clears_media_when_settings_stick() {
        let mut app = App::new(
            Backends {
                settings: Box::new(StuckStore::default()),
                media: MediaRepository::in_memory(),
                audio: Box::new(RecordingAudio::default()),
                narrator: Box::new(RecordingNarrator::default()),
                feed: offline_feed(),
            },
            Instant::now(),
        );
        app.media.save_video(b"\x00\x00\x00\x18ftypmp42").unwrap();
        app.media.add_voice_message(b"RIFF").unwrap();

        let err = app.restore_defaults().unwrap_err();
        assert!(format!("{err:#}").contains("failed to clear settings"));
        assert!(app.media.background().unwrap().is_none());
        assert!(app.media.voice_messages().unwrap().is_empty());
    }

    #[test]
    fn test_uploaded_image_is_drawn_and_fitted() {
        let mut app = app();
        let now = Instant::now();
        let path = std::env::temp_dir().join(format!("backdrop-wall-{}.png", std::process::id()));
        image::RgbImage::from_pixel(16, 8, image::Rgb([0, 0, 180]))
            .save(&path)
            .unwrap();

        app.on_panel_event(PanelEvent::Upload(UploadKind::Image, path.clone()), now);
        std::fs::remove_file(&path).unwrap();
        assert_eq!(app.status, "backdrop: image (cover)");

        let mut terminal = Terminal::new(TestBackend::new(120, 40)).unwrap();
        terminal.draw(|frame| app.render(frame)).unwrap();
        assert!(app.background.picture().is_visible());
        let Color::Rgb(r, _, b) = terminal.backend().buffer()[(0, 0)].bg else {
            panic!("backdrop cell has no rgb background");
        };
        assert!(r < 5 && b.abs_diff(180) < 5);

        app.settings.scale_mode = "contain".to_string();
        app.on_panel_event(PanelEvent::Changed(Field::ScaleMode), now);
        assert_eq!(app.background.picture().mode(), ScaleMode::Contain);
        assert_eq!(app.status, "backdrop: image (contain)");

        app.on_panel_event(PanelEvent::ClearBackdrop, now);
        assert!(!app.background.picture().is_visible());
        assert_eq!(app.status, "backdrop: none (contain)");
    }

    #[test]
    fn test_missing_upload_reports_failure() {
        let mut app = app();
        app.panel.open();
        app.on_panel_event(
            PanelEvent::Upload(UploadKind::Video, "/nonexistent/backdrop.mp4".into()),
            Instant::now(),
        );
        assert!(app.media.background().unwrap().is_none());
        assert!(screen(&mut app).contains("Upload failed"));
    }

    #[test]
    fn test_quit_keys() {
        let mut app = app();
        app.running = true;
        app.on_key_event(key(KeyCode::Char('q')), Instant::now());
        assert!(!app.running);
    }
}
