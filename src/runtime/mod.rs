use std::env;
use std::path::PathBuf;
use std::sync::mpsc;

use crossterm::execute;
use crossterm::terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode};
use ratatui::{Terminal, backend::CrosstermBackend};
use tracing::{info, warn};

use crate::app::ViewState;
use crate::audio::{EngineEvent, RodioEngine};
use crate::library::{DirectorySource, LibraryEvent, spawn_scan};
use crate::mpris::{ControlCmd, spawn_mpris};
use crate::notify::DesktopNotifier;
use crate::session::PlaybackSession;

mod event_loop;
mod logging;
mod settings;

/// Command-line arguments: `simplay [--print-config] [DIR]`.
#[derive(Debug, Default, PartialEq, Eq)]
struct Args {
    dir: Option<PathBuf>,
    print_config: bool,
}

impl Args {
    fn parse(args: impl IntoIterator<Item = String>) -> Self {
        let mut parsed = Self::default();
        for arg in args {
            if arg == "--print-config" {
                parsed.print_config = true;
            } else if parsed.dir.is_none() {
                parsed.dir = Some(PathBuf::from(arg));
            }
        }
        parsed
    }
}

pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse(env::args().skip(1));
    let settings::Loaded { settings, warning } = settings::load_settings();

    if args.print_config {
        print!("{}", settings.to_toml()?);
        return Ok(());
    }

    match logging::init(&settings.logging) {
        Some(path) => info!(log = %path.display(), "simplay starting"),
        None => eprintln!("simplay: logging disabled (no writable log file)"),
    }
    if let Some(msg) = warning {
        warn!("{msg}");
        eprintln!("simplay: {msg}");
    }

    let dir = args
        .dir
        .or_else(|| env::current_dir().ok())
        .unwrap_or_else(|| PathBuf::from("Music"));

    let (library_tx, library_rx) = mpsc::channel::<LibraryEvent>();
    let (engine_tx, engine_rx) = mpsc::channel::<EngineEvent>();
    let (control_tx, control_rx) = mpsc::channel::<ControlCmd>();

    let engine = RodioEngine::new(engine_tx, &settings.audio);
    let mpris = settings
        .mpris
        .enabled
        .then(|| spawn_mpris(control_tx.clone(), &settings.mpris));
    let notifier = settings
        .notifications
        .enabled
        .then(|| DesktopNotifier::spawn(control_tx.clone(), &settings.notifications));
    let mut session = PlaybackSession::new(engine, mpris, notifier);

    let source = DirectorySource::new(dir, settings.library.clone());
    info!(dir = %source.root().display(), "scanning library");
    spawn_scan(source.clone(), library_tx.clone());

    let mut view = ViewState::new(settings.ui.follow_playback);
    let inbox = event_loop::Inbox {
        library_tx,
        library_rx,
        engine_rx,
        control_rx,
        snapshots: session.state_cell().subscribe(),
    };

    enable_raw_mode()?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut state = event_loop::EventLoopState::default();
    let run_result = event_loop::run(
        &mut terminal,
        &settings,
        &source,
        &mut view,
        &mut session,
        &inbox,
        &mut state,
    );

    session.release();
    info!("simplay stopped");

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    run_result
}

#[cfg(test)]
mod tests;
