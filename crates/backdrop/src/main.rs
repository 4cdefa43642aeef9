mod app;
mod audio;
mod chat;
mod clock;
mod decrypt;
mod feed;
mod phone;
mod quotes;
mod script;
mod settings_panel;

use std::fs::{self, OpenOptions};
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Instant;

use backdrop_config::{CONFIG_ENV, FileSettingsStore, MediaRepository, Paths};
use clap::Parser;
use color_eyre::eyre::WrapErr;
use tracing_subscriber::EnvFilter;

use crate::app::{App, Backends};
use crate::audio::{AudioOutput, EspeakNarrator, TerminalBell};
use crate::feed::FeedMonitor;

/// Digital rain, a clock and a phone that rings, in your terminal.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    /// Settings file to read and save.
    #[arg(long, env = CONFIG_ENV)]
    config: Option<PathBuf>,

    /// Directory for uploaded media and the log file.
    #[arg(long)]
    data_dir: Option<PathBuf>,
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();

    let paths = Paths::resolve(cli.config, cli.data_dir)?;
    fs::create_dir_all(&paths.data_dir)
        .wrap_err_with(|| format!("failed to create {}", paths.data_dir.display()))?;
    init_logging(&paths);
    tracing::info!(settings = %paths.settings_file.display(), "starting backdrop");

    let backends = Backends {
        settings: Box::new(FileSettingsStore::new(&paths.settings_file)),
        media: MediaRepository::open(&paths.data_dir),
        audio: audio_output(),
        narrator: Box::new(EspeakNarrator::default()),
        feed: FeedMonitor::new(),
    };

    let terminal = ratatui::init();
    let result = App::new(backends, Instant::now()).run(terminal);
    ratatui::restore();
    result
}

/// Log to a file; the terminal belongs to the UI. Logging stays off when
/// the file cannot be opened.
fn init_logging(paths: &Paths) {
    let log_path = paths.log_file();
    let file = match OpenOptions::new().create(true).append(true).open(&log_path) {
        Ok(file) => file,
        Err(err) => {
            eprintln!("failed to open log file {}: {err}", log_path.display());
            return;
        }
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init();
}

#[cfg(feature = "audio")]
fn audio_output() -> Box<dyn AudioOutput> {
    match audio::RodioOutput::try_default() {
        Some(output) => Box::new(output),
        None => Box::new(TerminalBell),
    }
}

#[cfg(not(feature = "audio"))]
fn audio_output() -> Box<dyn AudioOutput> {
    Box::new(TerminalBell)
}
