use crossterm::event::{KeyCode, KeyModifiers};
use guestbook_app::{Guestbook, NoticeLevel, SessionState, UiProjection};
use guestbook_models::Entry;
use ratatui::{
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
    Frame,
};

use crate::app_state::{AppController, InputMode};
use crate::tui::Action;

const SPINNER: [&str; 4] = ["|", "/", "-", "\\"];

#[derive(Debug, Clone, Copy)]
enum Command {
    Activate,
    Refresh,
    Disconnect,
}

/// The single guestbook page: message field, context button, balance and
/// entry list.
pub struct GuestbookPage {
    guestbook: Guestbook,
    should_quit: bool,
    input_mode: InputMode,
    list_state: ListState,
    ticks: usize,
}

impl GuestbookPage {
    pub fn new(guestbook: Guestbook) -> Self {
        Self {
            guestbook,
            should_quit: false,
            input_mode: InputMode::Normal,
            list_state: ListState::default(),
            ticks: 0,
        }
    }

    /// Run `command` in the background; failures land in the notice line.
    fn run(&self, command: Command) {
        let guestbook = self.guestbook.clone();
        tokio::spawn(async move {
            let result = match command {
                Command::Activate => guestbook.activate().await,
                Command::Refresh => guestbook.refresh().await,
                Command::Disconnect => guestbook.disconnect().await,
            };
            guestbook.handle(result);
        });
    }

    fn edit(&self, f: impl FnOnce(&mut String)) {
        let mut message = self.guestbook.snapshot().pending_message;
        f(&mut message);
        self.guestbook.set_message(message);
    }

    fn scroll(&mut self, down: bool, len: usize) {
        if len == 0 {
            self.list_state.select(None);
            return;
        }
        let i = match self.list_state.selected() {
            Some(i) if down => (i + 1).min(len - 1),
            Some(i) => i.saturating_sub(1),
            None => 0,
        };
        self.list_state.select(Some(i));
    }
}

pub fn button_text(ui: &UiProjection) -> &'static str {
    if ui.is_busy {
        "Loading..."
    } else {
        ui.button.label()
    }
}

pub fn balance_text(ui: &UiProjection) -> Option<String> {
    ui.display_balance
        .as_ref()
        .map(|b| format!("Your balance: {b} tez"))
}

pub fn entry_line(entry: &Entry) -> String {
    format!(
        "{} {}: {}",
        entry.date.format("%Y-%m-%d %H:%M"),
        entry.address,
        entry.text
    )
}

impl AppController for GuestbookPage {
    fn update(&mut self, action: Action) {
        match action {
            Action::Key(key) => {
                if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
                    self.should_quit = true;
                    return;
                }
                match self.input_mode {
                    InputMode::Normal => match key.code {
                        KeyCode::Char('q') => self.should_quit = true,
                        KeyCode::Char('e' | 'i') => self.input_mode = InputMode::Editing,
                        KeyCode::Char('r') => self.run(Command::Refresh),
                        KeyCode::Char('d') => self.run(Command::Disconnect),
                        KeyCode::Enter => self.run(Command::Activate),
                        KeyCode::Down | KeyCode::Up => {
                            let len = self.guestbook.projection().display_entries.len();
                            self.scroll(key.code == KeyCode::Down, len);
                        }
                        _ => {}
                    },
                    InputMode::Editing => match key.code {
                        KeyCode::Enter => {
                            self.input_mode = InputMode::Normal;
                            self.run(Command::Activate);
                        }
                        KeyCode::Esc => self.input_mode = InputMode::Normal,
                        KeyCode::Char(c) => self.edit(|m| m.push(c)),
                        KeyCode::Backspace => self.edit(|m| {
                            m.pop();
                        }),
                        _ => {}
                    },
                }
            }
            Action::Tick => self.ticks = self.ticks.wrapping_add(1),
            Action::Resize(..) | Action::StateChanged => {}
        }
    }

    fn render(&mut self, f: &mut Frame) {
        let state = self.guestbook.snapshot();
        let ui = UiProjection::project(&state);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Length(3),
                Constraint::Min(0),
                Constraint::Length(1),
            ])
            .split(f.area());

        // Header: session and balance
        let (status, color) = match state.session {
            SessionState::Disconnected => ("DISCONNECTED".to_string(), Color::Red),
            SessionState::Connecting => ("CONNECTING...".to_string(), Color::Yellow),
            SessionState::Connected => (
                format!("CONNECTED {}", ui.account.as_deref().unwrap_or_default()),
                Color::Green,
            ),
        };
        let mut header = vec![Span::styled(
            status,
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        )];
        if let Some(balance) = balance_text(&ui) {
            header.push(Span::raw("   "));
            header.push(Span::raw(balance));
        }
        let title = format!("Guestbook - {}", self.guestbook.config().contract);
        f.render_widget(
            Paragraph::new(Line::from(header))
                .block(Block::default().borders(Borders::ALL).title(title)),
            chunks[0],
        );

        // Form: message field and context button
        let form = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Min(0), Constraint::Length(20)])
            .split(chunks[1]);
        let editing = self.input_mode == InputMode::Editing;
        let message = if editing {
            format!("{}_", state.pending_message)
        } else {
            state.pending_message.clone()
        };
        let field_style = if editing {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default()
        };
        f.render_widget(
            Paragraph::new(message)
                .style(field_style)
                .block(Block::default().borders(Borders::ALL).title("Message")),
            form[0],
        );

        let button = if ui.is_busy {
            format!("{} {}", SPINNER[self.ticks % SPINNER.len()], button_text(&ui))
        } else {
            button_text(&ui).to_string()
        };
        let button_style = if ui.can_connect || ui.can_submit {
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        f.render_widget(
            Paragraph::new(button)
                .style(button_style)
                .block(Block::default().borders(Borders::ALL)),
            form[1],
        );

        // Entries
        let items: Vec<ListItem> = ui
            .display_entries
            .iter()
            .map(|e| ListItem::new(entry_line(e)))
            .collect();
        let list = List::new(items)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(format!("Entries ({})", ui.display_entries.len())),
            )
            .highlight_style(Style::default().add_modifier(Modifier::BOLD).fg(Color::Yellow))
            .highlight_symbol(">> ");
        f.render_stateful_widget(list, chunks[2], &mut self.list_state);

        // Footer: notice or key help
        let footer = match &ui.notice {
            Some(notice) => {
                let color = match notice.level {
                    NoticeLevel::Info => Color::Green,
                    NoticeLevel::Error => Color::Red,
                };
                Line::from(Span::styled(notice.text.clone(), Style::default().fg(color)))
            }
            None => Line::from("e: edit  enter: connect/send  r: refresh  d: disconnect  q: quit"),
        };
        f.render_widget(Paragraph::new(footer), chunks[3]);
    }

    fn should_quit(&self) -> bool {
        self.should_quit
    }
}
