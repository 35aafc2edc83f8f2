pub mod render;
pub mod state;

use crate::engine::{DataState, EngineCommand};
use crate::filter::{distinct_collaborators, distinct_statuses};
use crate::record::{Project, KNOWN_STATUSES};
use crate::source::{SelectionMode, SourceTag};
use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use ratatui::prelude::*;
use state::UiState;
use std::io::stdout;
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, watch};

/// Run the dashboard. Reads data state from `state_rx`, sends refresh
/// commands on `cmd_tx`. Blocks until quit.
pub async fn run_tui(
    state_rx: watch::Receiver<DataState>,
    cmd_tx: mpsc::Sender<EngineCommand>,
    debounce: Duration,
) -> Result<()> {
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    let result = tui_loop(&mut terminal, state_rx, cmd_tx, debounce).await;

    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    result
}

async fn tui_loop(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    state_rx: watch::Receiver<DataState>,
    cmd_tx: mpsc::Sender<EngineCommand>,
    debounce: Duration,
) -> Result<()> {
    let mut ui = UiState::new(debounce);
    let mut filtered: Vec<Project> = Vec::new();
    let mut last_seq = u64::MAX;
    let mut dirty = false;

    loop {
        let data = state_rx.borrow().clone();

        // New resolution landed: refresh the derived option lists and the
        // filtered subset.
        if data.seq != last_seq {
            last_seq = data.seq;
            ui.status_options = distinct_statuses(&data.projects);
            if ui.status_options.is_empty() {
                ui.status_options = KNOWN_STATUSES.iter().map(|s| s.to_string()).collect();
            }
            ui.collaborator_options = distinct_collaborators(&data.projects);
            dirty = true;
        }

        if ui.commit_search_if_quiet(Instant::now()) {
            dirty = true;
        }

        if dirty {
            filtered = ui.refilter(&data.projects);
            dirty = false;
        }

        terminal.draw(|f| render::draw(f, &data, &ui, &filtered))?;

        // 50ms poll doubles as the debounce tick.
        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }

                if ui.search_focus {
                    match key.code {
                        KeyCode::Esc | KeyCode::Enter => ui.search_focus = false,
                        KeyCode::Backspace => {
                            ui.search_input.pop();
                            ui.note_search_keystroke(Instant::now());
                        }
                        KeyCode::Char(c) => {
                            ui.search_input.push(c);
                            ui.note_search_keystroke(Instant::now());
                        }
                        _ => {}
                    }
                    continue;
                }

                match key.code {
                    KeyCode::Char('q') => {
                        let _ = cmd_tx.send(EngineCommand::Shutdown).await;
                        return Ok(());
                    }
                    KeyCode::Char('/') => ui.search_focus = true,
                    KeyCode::Char('s') => {
                        ui.cycle_status();
                        dirty = true;
                    }
                    KeyCode::Char('p') => {
                        ui.cycle_priority();
                        dirty = true;
                    }
                    KeyCode::Char('i') => {
                        ui.cycle_irb();
                        dirty = true;
                    }
                    KeyCode::Char('o') => {
                        ui.cycle_collaborator();
                        dirty = true;
                    }
                    KeyCode::Char('c') => {
                        ui.clear_filters();
                        dirty = true;
                    }
                    KeyCode::Char('r') => {
                        let _ = cmd_tx.send(EngineCommand::Refresh(SelectionMode::Auto)).await;
                    }
                    KeyCode::Char('1') => {
                        let _ = cmd_tx
                            .send(EngineCommand::Refresh(SelectionMode::Only(SourceTag::Embedded)))
                            .await;
                    }
                    KeyCode::Char('2') => {
                        let _ = cmd_tx
                            .send(EngineCommand::Refresh(SelectionMode::Only(SourceTag::Json)))
                            .await;
                    }
                    KeyCode::Char('3') => {
                        let _ = cmd_tx
                            .send(EngineCommand::Refresh(SelectionMode::Only(SourceTag::Sheet)))
                            .await;
                    }
                    KeyCode::Char('4') => {
                        let _ = cmd_tx
                            .send(EngineCommand::Refresh(SelectionMode::Only(SourceTag::Local)))
                            .await;
                    }
                    KeyCode::Down => ui.select_next(filtered.len()),
                    KeyCode::Up => ui.select_prev(),
                    _ => {}
                }
            }
        }
    }
}
