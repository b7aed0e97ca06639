//! Full-screen terminal review
//!
//! Keys: Up/Down (or k/j) move, Enter confirms, 1-9 confirm directly,
//! Space/s skip, a auto-confirms the rest, Left/Backspace/b go back,
//! Esc/q/c or Ctrl-C cancel the rest.

use super::{DecisionSurface, ReviewAction, ReviewPrompt, SurfaceError};
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    terminal::{self, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
    Frame, Terminal,
};
use std::io::{stdout, IsTerminal, Stdout};

/// Review surface drawing on the alternate screen in raw mode
#[derive(Default)]
pub struct TerminalSurface {
    terminal: Option<Terminal<CrosstermBackend<Stdout>>>,
    raw_mode: bool,
}

impl TerminalSurface {
    pub fn new() -> Self {
        Self::default()
    }

    fn restore(&mut self) {
        self.terminal = None;
        if self.raw_mode {
            let _ = stdout().execute(LeaveAlternateScreen);
            let _ = terminal::disable_raw_mode();
            self.raw_mode = false;
        }
    }
}

impl DecisionSurface for TerminalSurface {
    fn name(&self) -> &'static str {
        "terminal"
    }

    fn open(&mut self, _total: usize) -> Result<(), SurfaceError> {
        if !stdout().is_terminal() {
            return Err(SurfaceError::Unavailable("stdout is not a terminal".to_string()));
        }

        terminal::enable_raw_mode()
            .map_err(|e| SurfaceError::Unavailable(format!("failed to enable raw mode: {}", e)))?;
        self.raw_mode = true;

        if let Err(e) = stdout().execute(EnterAlternateScreen) {
            self.restore();
            return Err(SurfaceError::Unavailable(format!(
                "failed to enter alternate screen: {}",
                e
            )));
        }

        match Terminal::new(CrosstermBackend::new(stdout())) {
            Ok(terminal) => {
                self.terminal = Some(terminal);
                Ok(())
            }
            Err(e) => {
                self.restore();
                Err(SurfaceError::Unavailable(format!("failed to create terminal: {}", e)))
            }
        }
    }

    fn prompt(&mut self, prompt: &ReviewPrompt<'_>) -> Result<ReviewAction, SurfaceError> {
        let terminal = self
            .terminal
            .as_mut()
            .ok_or_else(|| SurfaceError::Unavailable("terminal not open".to_string()))?;

        let count = prompt.item.candidates.len();
        let mut state = ListState::default();
        if count > 0 {
            let initial = prompt
                .previous
                .and_then(|d| d.selection())
                .filter(|idx| *idx < count)
                .unwrap_or(0);
            state.select(Some(initial));
        }

        loop {
            terminal.draw(|frame| draw(frame, prompt, &mut state))?;

            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                if let Some(action) = handle_key(key, &mut state, count) {
                    return Ok(action);
                }
            }
        }
    }

    fn close(&mut self) {
        self.restore();
    }
}

impl Drop for TerminalSurface {
    fn drop(&mut self) {
        self.restore();
    }
}

/// Apply one key press; returns an action when the item is finished
fn handle_key(key: KeyEvent, state: &mut ListState, count: usize) -> Option<ReviewAction> {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return Some(ReviewAction::CancelRemaining);
    }

    match key.code {
        KeyCode::Up | KeyCode::Char('k') => {
            if count > 0 {
                let current = state.selected().unwrap_or(0);
                state.select(Some(current.saturating_sub(1)));
            }
            None
        }
        KeyCode::Down | KeyCode::Char('j') => {
            if count > 0 {
                let next = state.selected().map(|i| (i + 1).min(count - 1)).unwrap_or(0);
                state.select(Some(next));
            }
            None
        }
        KeyCode::Enter => state.selected().filter(|i| *i < count).map(ReviewAction::Confirm),
        KeyCode::Char(c @ '1'..='9') => {
            let idx = c.to_digit(10).map(|d| d as usize - 1)?;
            (idx < count).then_some(ReviewAction::Confirm(idx))
        }
        KeyCode::Char(' ') | KeyCode::Char('s') => Some(ReviewAction::Skip),
        KeyCode::Char('a') => Some(ReviewAction::AutoConfirmRemaining),
        KeyCode::Left | KeyCode::Backspace | KeyCode::Char('b') => Some(ReviewAction::Back),
        KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('c') => Some(ReviewAction::CancelRemaining),
        _ => None,
    }
}

fn draw(frame: &mut Frame, prompt: &ReviewPrompt<'_>, state: &mut ListState) {
    let chunks = Layout::vertical([
        Constraint::Length(1),
        Constraint::Length(5),
        Constraint::Min(3),
        Constraint::Length(1),
    ])
    .split(frame.area());

    let title = Paragraph::new(Line::from(vec![Span::styled(
        format!(" Confirm match: item {} of {} ", prompt.position + 1, prompt.total),
        Style::default().fg(Color::Black).bg(Color::Cyan).add_modifier(Modifier::BOLD),
    )]));
    frame.render_widget(title, chunks[0]);

    let key = &prompt.item.key;
    let mut details = vec![
        Line::from(vec![
            Span::styled("Card: ", Style::default().fg(Color::DarkGray)),
            Span::styled(key.name.clone(), Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(format!(" {}", key.name_suffix)),
        ]),
        Line::from(format!(
            "Set: {} | Number: {} | Condition: {}",
            key.set_name,
            key.collector_number.as_deref().unwrap_or("?"),
            key.condition
        )),
        Line::from(format!("Collection rows waiting: {}", prompt.item.waiting_rows)),
    ];
    if let Some(previous) = prompt.previous {
        details.push(Line::from(Span::styled(
            format!("Previously: {:?}", previous),
            Style::default().fg(Color::Yellow),
        )));
    }
    let details = Paragraph::new(details).block(Block::default().borders(Borders::BOTTOM));
    frame.render_widget(details, chunks[1]);

    let rows: Vec<ListItem> = prompt
        .item
        .candidates
        .iter()
        .enumerate()
        .map(|(idx, c)| {
            let origin = if c.synthesized { " [authority]" } else { "" };
            ListItem::new(format!(
                "{:2}: {:<40} | {:<24} | #{:<5} | {:<20} | {:>4}{}",
                idx + 1,
                truncate(&c.product_name, 40),
                truncate(&c.set_name, 24),
                c.number,
                c.condition,
                c.score,
                origin
            ))
        })
        .collect();
    let list = List::new(rows)
        .block(Block::default().borders(Borders::ALL).title(" Candidates "))
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
        .highlight_symbol("> ");
    frame.render_stateful_widget(list, chunks[2], state);

    let help = Paragraph::new(
        " Enter confirm | 1-9 pick | Space skip | a auto-confirm rest | Left back | Esc cancel rest ",
    )
    .style(Style::default().fg(Color::DarkGray));
    frame.render_widget(help, chunks[3]);
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        text.to_string()
    } else {
        let mut out: String = text.chars().take(width.saturating_sub(1)).collect();
        out.push('…');
        out
    }
}
