use std::sync::mpsc::{Receiver, Sender};
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use ratatui::{Terminal, backend::CrosstermBackend};
use tracing::{debug, info};

use crate::app::ViewState;
use crate::audio::{Engine, EngineEvent};
use crate::config;
use crate::library::{DirectorySource, LibraryEvent, spawn_scan};
use crate::mpris::ControlCmd;
use crate::session::{MediaSession, Notifier, PlaybackSession, PlaybackState, SessionSnapshot};
use crate::ui;

/// Inbound channels drained once per tick.
pub struct Inbox {
    pub library_tx: Sender<LibraryEvent>,
    pub library_rx: Receiver<LibraryEvent>,
    pub engine_rx: Receiver<EngineEvent>,
    pub control_rx: Receiver<ControlCmd>,
    pub snapshots: Receiver<SessionSnapshot>,
}

/// State tracked by the runtime event loop across iterations.
#[derive(Debug, Default)]
pub struct EventLoopState {
    /// Internal two-key prefix state used for `gg` handling.
    pub pending_gg: bool,
}

/// Main terminal event loop: applies library, engine and control events to
/// the session, redraws and handles keys. Returns `Ok(())` on quit.
pub fn run<E, M, N>(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    settings: &config::Settings,
    source: &DirectorySource,
    view: &mut ViewState,
    session: &mut PlaybackSession<E, M, N>,
    inbox: &Inbox,
    state: &mut EventLoopState,
) -> Result<(), Box<dyn std::error::Error>>
where
    E: Engine,
    M: MediaSession,
    N: Notifier,
{
    loop {
        while let Ok(LibraryEvent::Scanned(outcome)) = inbox.library_rx.try_recv() {
            session.set_library(outcome.tracks.clone());
            view.apply_library(outcome);
        }

        while let Ok(ev) = inbox.engine_rx.try_recv() {
            session.handle_engine_event(ev);
        }

        while let Ok(cmd) = inbox.control_rx.try_recv() {
            if handle_control_cmd(cmd, view, session) {
                return Ok(());
            }
        }

        while let Ok(snapshot) = inbox.snapshots.try_recv() {
            view.apply_snapshot(&snapshot);
        }
        view.tick_position(session.position());

        terminal.draw(|f| ui::draw(f, view, source.root(), &settings.ui, &settings.controls))?;

        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                if handle_key_event(key, settings, source, view, session, inbox, state) {
                    return Ok(());
                }
            }
        }
    }
}

/// Apply a desktop transport request. Returns `true` when the app should quit.
fn handle_control_cmd<E, M, N>(
    cmd: ControlCmd,
    view: &mut ViewState,
    session: &mut PlaybackSession<E, M, N>,
) -> bool
where
    E: Engine,
    M: MediaSession,
    N: Notifier,
{
    debug!(?cmd, "control command");
    match cmd {
        ControlCmd::Quit => return true,
        ControlCmd::Play => session.play(),
        ControlCmd::Pause => session.pause(),
        ControlCmd::PlayPause => session.toggle(),
        ControlCmd::Stop => session.stop(),
        ControlCmd::Next => session.skip_next(),
        ControlCmd::Prev => session.skip_previous(),
        ControlCmd::Seek(offset) => session.seek_relative(offset),
        ControlCmd::SetPosition(position) => session.seek(position),
        ControlCmd::OpenUri(uri) => {
            session.load(Some(&uri));
            if session.state() == PlaybackState::Preparing {
                view.start_playing();
            }
        }
    }
    false
}

fn handle_key_event<E, M, N>(
    key: KeyEvent,
    settings: &config::Settings,
    source: &DirectorySource,
    view: &mut ViewState,
    session: &mut PlaybackSession<E, M, N>,
    inbox: &Inbox,
    state: &mut EventLoopState,
) -> bool
where
    E: Engine,
    M: MediaSession,
    N: Notifier,
{
    if key.code != KeyCode::Char('g') {
        state.pending_gg = false;
    }
    let seek_micros = settings.controls.seek_seconds.saturating_mul(1_000_000) as i64;

    match key.code {
        KeyCode::Char('q') => return true,
        KeyCode::Char('g') => {
            if state.pending_gg {
                state.pending_gg = false;
                view.top();
            } else {
                state.pending_gg = true;
            }
        }
        KeyCode::Char('G') => view.bottom(),
        KeyCode::Char('j') | KeyCode::Down => view.next(),
        KeyCode::Char('k') | KeyCode::Up => view.prev(),
        KeyCode::Enter => {
            if let Some(track) = view.selected_track() {
                let uri = track.uri();
                session.load(Some(&uri));
                view.start_playing();
            }
        }
        KeyCode::Char(' ') | KeyCode::Char('p') => session.toggle(),
        KeyCode::Char('l') => session.skip_next(),
        KeyCode::Char('h') => session.skip_previous(),
        KeyCode::Char('L') => session.seek_relative(seek_micros),
        KeyCode::Char('H') => session.seek_relative(-seek_micros),
        KeyCode::Char('s') => session.stop(),
        KeyCode::Char('m') => view.toggle_mini_player(),
        KeyCode::Char('r') => {
            info!(dir = %source.root().display(), "rescanning library");
            view.begin_rescan();
            spawn_scan(source.clone(), inbox.library_tx.clone());
        }
        _ => {}
    }
    false
}
