mod assets;
mod audio;
mod audio_api;
mod config;
mod controller;
mod error;
mod loader;
mod scheduler;
mod settings;
mod shared;
mod tui;
mod visuals;

use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use anyhow::Context;
use crossterm::terminal;
use rand::rngs::StdRng;
use rand::SeedableRng;
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tracing::{debug, info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use assets::AssetCatalog;
use audio::AudioHandle;
use audio_api::AudioCommand;
use config::AmbienceConfig;
use controller::AmbientController;
use settings::{FileStore, KeyValueStore, MemoryStore, SettingsStore};
use shared::InputEvent;
use tui::bindings::ControlSet;

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let config = AmbienceConfig::load(config_path.as_deref()).context("failed to load config")?;
    init_logging(&config);
    info!(?config, "starting ambience");

    let catalog = AssetCatalog::new(config.app.clone(), config.static_root.clone());
    // no output device is not fatal; everything else still runs
    let audio = match audio::start_audio(&config.audio, catalog.clone()) {
        Ok(handle) => handle,
        Err(e) => {
            warn!("audio unavailable, running silent: {e:#}");
            AudioHandle::disabled()
        }
    };

    let store = SettingsStore::new(open_backend(&config));
    let mut controller =
        AmbientController::new(catalog, store, audio.graph_available(), StdRng::from_os_rng());
    forward(&audio, controller.start());
    let controls = ControlSet::from_hidden(&config.controls.hidden);

    terminal::enable_raw_mode()?;
    // Enable keyboard enhancement for real press/release detection.
    // Falls back gracefully if the terminal doesn't support it.
    let _ = crossterm::execute!(
        std::io::stdout(),
        crossterm::event::PushKeyboardEnhancementFlags(
            crossterm::event::KeyboardEnhancementFlags::REPORT_EVENT_TYPES
        )
    );
    let _guard = RawModeGuard; // auto drops when out of scope

    let backend = CrosstermBackend::new(std::io::stdout());
    let mut term = Terminal::new(backend)?;
    term.clear()?;

    let tick_rate = Duration::from_millis(config.tick_ms.max(1));
    let mut last_tick = Instant::now();
    let mut tui_state = tui::mode::TuiState::default();

    loop {
        let ds = controller.display_state();
        tui_state.panel_open = ds.panel_open;
        let focused = tui_state.focused(&controls);

        term.draw(|frame| {
            tui::view::render(frame, frame.area(), &ds, &controls, focused);
        })?;

        let events = tui::input::poll_input(tick_rate, &mut tui_state, &controls, &ds.controls)?;
        for event in events {
            if event == InputEvent::Quit {
                // save before quitting
                controller.persist();
                debug!(settings = ?controller.settings(), "final settings");
                info!(realistic = controller.realistic_mode(), "quitting");
                drop(term);
                drop(audio);
                return Ok(());
            }
            forward(&audio, controller.handle_input(event));
        }

        while let Some(event) = audio.poll_event() {
            forward(&audio, controller.on_audio_event(event));
        }

        let elapsed = last_tick.elapsed();
        last_tick = Instant::now();
        forward(&audio, controller.tick(elapsed));
    }
}

fn forward(audio: &AudioHandle, cmds: Vec<AudioCommand>) {
    for cmd in cmds {
        audio.send(cmd);
    }
}

// The terminal is in raw mode, so logs go to a file in the data dir.
fn init_logging(config: &AmbienceConfig) {
    let filter = EnvFilter::try_from_env("AMBIENCE_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("ambience=info"));

    let file = std::fs::create_dir_all(&config.data_dir)
        .and_then(|_| OpenOptions::new().create(true).append(true).open(config.log_file()));
    match file {
        Ok(file) => fmt()
            .with_env_filter(filter)
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .init(),
        // nowhere to write; stay quiet rather than scribble over the tui
        Err(_) => fmt().with_env_filter(filter).with_writer(std::io::sink).init(),
    }
}

// Falls back to an in-memory store (settings last for this run only)
// when the data dir can't be created.
fn open_backend(config: &AmbienceConfig) -> Box<dyn KeyValueStore> {
    match std::fs::create_dir_all(&config.data_dir) {
        Ok(()) => Box::new(FileStore::new(&config.data_dir)),
        Err(e) => {
            warn!(dir = %config.data_dir.display(), "settings will not persist: {e}");
            Box::new(MemoryStore::default())
        }
    }
}

struct RawModeGuard;
impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let _ = crossterm::execute!(
            std::io::stdout(),
            crossterm::event::PopKeyboardEnhancementFlags
        );
        let _ = terminal::disable_raw_mode();
    }
}
