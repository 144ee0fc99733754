//! UI rendering helpers for the terminal user interface.
//!
//! This module contains functions to render the TUI using `ratatui`.

use std::path::Path;

use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style, Stylize},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, List, ListItem, ListState, Padding, Paragraph, Wrap},
};

use crate::app::{ViewState, format_duration};
use crate::config::{ControlsSettings, UiSettings};

const LEFT_PAD: Padding = Padding {
    left: 1,
    right: 0,
    top: 0,
    bottom: 0,
};

/// Render the controls help text, incorporating the seek step.
fn controls_text(seek_seconds: u64) -> String {
    let seek = format!("seek -/+{seek_seconds}s");
    [
        ("j/k", "up/down"),
        ("gg/G", "top/bottom"),
        ("enter", "play selected song"),
        ("space/p", "play/pause"),
        ("h/l", "prev/next song"),
        ("H/L", seek.as_str()),
        ("s", "stop"),
        ("m", "mini player"),
        ("r", "rescan"),
        ("q", "quit"),
    ]
    .iter()
    .map(|(k, v)| format!("[{k}] {v}"))
    .collect::<Vec<String>>()
    .join(" | ")
}

/// Render the entire UI into the provided `frame`.
pub fn draw(
    frame: &mut Frame,
    view: &ViewState,
    dir: &Path,
    ui_settings: &UiSettings,
    controls_settings: &ControlsSettings,
) {
    let status_height = if view.mini_player_expanded { 6 } else { 4 };
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(status_height),
            Constraint::Min(1),
            Constraint::Length(4),
        ])
        .split(frame.area());

    let header = Paragraph::new(ui_settings.header_text.as_str())
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" simplay ")
                .title_alignment(Alignment::Center),
        );
    frame.render_widget(header, chunks[0]);

    draw_status(frame, view, dir, chunks[1]);
    draw_tracks(frame, view, chunks[2]);

    let footer = Paragraph::new(controls_text(controls_settings.seek_seconds))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" controls ")
                .padding(LEFT_PAD),
        )
        .wrap(Wrap { trim: true });
    frame.render_widget(footer, chunks[3]);
}

/// Status box: library state until something plays, then the mini player.
fn draw_status(frame: &mut Frame, view: &ViewState, dir: &Path, area: Rect) {
    let block = Block::bordered().padding(LEFT_PAD);

    let Some(now_playing) = view.now_playing_line().filter(|_| view.playback_started) else {
        let text = format!("{} • Dir: {}", view.status_line(), dir.display());
        let mut status = Paragraph::new(text)
            .block(block.title(" status "))
            .wrap(Wrap { trim: true });
        if view.scanning {
            status = status.slow_blink();
        }
        frame.render_widget(status, area);
        return;
    };

    let block = block.title(format!(" {} ", view.status_line().to_lowercase()));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(1)])
        .split(inner);

    let marker = if view.is_playing { "▶" } else { "⏸" };
    let title = Paragraph::new(Line::from(vec![
        Span::raw(format!("{marker} ")),
        Span::styled(now_playing, Style::default().add_modifier(Modifier::BOLD)),
    ]));
    frame.render_widget(title, rows[0]);

    let elapsed = format_duration(view.position);
    let label = match view.now_playing_duration {
        Some(total) => format!("{elapsed} / {}", format_duration(total)),
        None => elapsed,
    };
    let gauge_height = if view.mini_player_expanded { rows[1].height.min(3) } else { 1 };
    let gauge_area = Rect {
        height: gauge_height.min(rows[1].height),
        ..rows[1]
    };
    let gauge = Gauge::default()
        .ratio(view.progress())
        .label(label)
        .gauge_style(Style::default().add_modifier(Modifier::REVERSED));
    frame.render_widget(gauge, gauge_area);
}

/// Truncate or pad `title` so mark, title, a space and `dur` fill `width` columns.
fn fit_title(title: &str, mark: &str, dur: &str, width: usize) -> String {
    let title_width = width.saturating_sub(dur.chars().count() + mark.chars().count());
    let title: String = title.chars().take(title_width).collect();
    format!("{title:<title_width$}")
}

fn draw_tracks(frame: &mut Frame, view: &ViewState, area: Rect) {
    // Only build ListItems for the visible window, centered on the selection when possible.
    let total = view.tracks.len();
    let list_height = area.height.saturating_sub(2) as usize;
    let sel_pos = view.selected.min(total.saturating_sub(1));
    let (start, end, selected_pos_in_visible) = if total <= list_height || list_height == 0 {
        (0, total, sel_pos)
    } else {
        let half = list_height / 2;
        let mut start = sel_pos.saturating_sub(half);
        if start + list_height > total {
            start = total - list_height;
        }
        (start, start + list_height, sel_pos - start)
    };

    let now_playing = view.now_playing_path.as_deref();
    let width = area.width.saturating_sub(6) as usize;
    let visible_items: Vec<ListItem> = view.tracks[start..end]
        .iter()
        .map(|track| {
            let dur = track
                .duration
                .map(format_duration)
                .unwrap_or_else(|| "--:--".to_string());
            let playing = Some(track.path.as_path()) == now_playing;
            let mark = if playing { "♪ " } else { "  " };
            let line = Line::from(vec![
                Span::raw(mark),
                Span::raw(fit_title(&track.title, mark, &dur, width)),
                Span::raw(" "),
                Span::styled(dur, Style::default().add_modifier(Modifier::DIM)),
            ]);
            if playing {
                ListItem::new(line).bold()
            } else {
                ListItem::new(line)
            }
        })
        .collect();

    let list = List::new(visible_items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!(" tracks ({total}) ")),
        )
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
        .highlight_symbol("> ");
    let mut state = ListState::default();
    if total > 0 {
        state.select(Some(selected_pos_in_visible));
    }
    frame.render_stateful_widget(list, area, &mut state);
}
