use std::{io, thread, time::Duration};

use anyhow::{Context, Result};
use chrono::Local;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame, Terminal,
};
use tokio::sync::mpsc;
use tracing::debug;
use ussdsim_core::{
    catalog::{Catalog, InfoKind, ItemAction, MenuItem},
    config::{is_service_code, AppConfig},
    session::{SessionController, SessionEvent},
};

const TICK_RATE: Duration = Duration::from_millis(250);
const MAX_FIELD_LEN: usize = 12;

#[derive(Debug, Clone)]
struct Theme {
    primary_fg: Color,
    accent: Color,
    muted: Color,
    success: Color,
    warning: Color,
    danger: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            primary_fg: Color::White,
            accent: Color::Cyan,
            muted: Color::DarkGray,
            success: Color::Green,
            warning: Color::Yellow,
            danger: Color::Red,
        }
    }
}

/// Which idle-screen field receives typed characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Focus {
    Dial,
    Credit,
}

enum AppEvent {
    Input(Event),
    Tick,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StatusKind {
    Neutral,
    Success,
    Warning,
    Error,
}

struct UiState {
    dial_input: String,
    credit_input: String,
    selection_input: String,
    focus: Focus,
    status: String,
    status_kind: StatusKind,
    should_quit: bool,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            dial_input: String::new(),
            credit_input: String::new(),
            selection_input: String::new(),
            focus: Focus::Dial,
            status: "Ready".to_string(),
            status_kind: StatusKind::Neutral,
            should_quit: false,
        }
    }
}

impl UiState {
    fn set_status(&mut self, message: impl Into<String>, kind: StatusKind) {
        self.status = message.into();
        self.status_kind = kind;
    }

    fn push_field_char(field: &mut String, ch: char) {
        if field.len() < MAX_FIELD_LEN {
            field.push(ch);
        }
    }
}

/// Simulated handset driving one subscriber line.
pub struct HandsetApp {
    config: AppConfig,
    catalog: Catalog,
    session: SessionController,
    state: UiState,
    theme: Theme,
}

impl HandsetApp {
    pub fn new(config: AppConfig, catalog: Catalog) -> Self {
        let session = SessionController::new(config.initial_balance);
        Self {
            config,
            catalog,
            session,
            state: UiState::default(),
            theme: Theme::default(),
        }
    }

    pub async fn run(&mut self) -> Result<()> {
        let mut stdout = io::stdout();
        enable_raw_mode().context("failed to enter raw mode")?;
        execute!(stdout, EnterAlternateScreen).context("failed to enter alternate screen")?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend).context("failed to create terminal")?;
        terminal.hide_cursor()?;
        terminal.clear()?;

        let (event_tx, mut event_rx) = mpsc::channel::<AppEvent>(128);
        spawn_input_thread(event_tx);

        self.state.set_status(
            format!("Dial {} to open the service menu", self.config.service_code),
            StatusKind::Neutral,
        );

        loop {
            terminal.draw(|frame| self.draw(frame))?;
            if self.state.should_quit {
                break;
            }

            match event_rx.recv().await {
                Some(AppEvent::Input(Event::Key(key))) => {
                    if key.kind == KeyEventKind::Press {
                        self.handle_key(key);
                    }
                }
                Some(AppEvent::Input(_)) | Some(AppEvent::Tick) => {}
                None => break,
            }

            if self.state.should_quit {
                break;
            }
        }

        restore_terminal(&mut terminal)
    }

    fn handle_key(&mut self, key: KeyEvent) {
        if key.modifiers.contains(KeyModifiers::CONTROL)
            && matches!(key.code, KeyCode::Char('c' | 'q'))
        {
            self.state.should_quit = true;
            return;
        }

        if self.session.current_menu().is_some() {
            self.handle_menu_key(key);
        } else {
            self.handle_idle_key(key);
        }
    }

    fn handle_idle_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => self.state.should_quit = true,
            KeyCode::Tab | KeyCode::BackTab => {
                self.state.focus = match self.state.focus {
                    Focus::Dial => Focus::Credit,
                    Focus::Credit => Focus::Dial,
                };
            }
            KeyCode::Enter => match self.state.focus {
                Focus::Dial => self.dial(),
                Focus::Credit => self.apply_credit(),
            },
            KeyCode::Backspace => {
                match self.state.focus {
                    Focus::Dial => self.state.dial_input.pop(),
                    Focus::Credit => self.state.credit_input.pop(),
                };
            }
            KeyCode::Char(ch) => match self.state.focus {
                Focus::Dial if ch.is_ascii_digit() || matches!(ch, '*' | '#') => {
                    UiState::push_field_char(&mut self.state.dial_input, ch);
                }
                Focus::Credit if ch.is_ascii_digit() => {
                    UiState::push_field_char(&mut self.state.credit_input, ch);
                }
                _ => {}
            },
            _ => {}
        }
    }

    fn handle_menu_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => {
                let event = self.session.cancel();
                self.state.selection_input.clear();
                self.apply_event(event);
            }
            KeyCode::Enter => {
                let raw = self.state.selection_input.clone();
                let event = self.session.select(&self.catalog, &raw);
                self.state.selection_input.clear();
                self.apply_event(event);
            }
            KeyCode::Backspace => {
                self.state.selection_input.pop();
            }
            KeyCode::Char(ch) if ch.is_ascii_digit() => {
                UiState::push_field_char(&mut self.state.selection_input, ch);
            }
            _ => {}
        }
    }

    fn dial(&mut self) {
        let code = self.state.dial_input.trim().to_string();
        self.state.dial_input.clear();
        if code.is_empty() {
            return;
        }

        if code == self.config.service_code {
            let event = self.session.open();
            self.apply_event(event);
        } else if is_service_code(&code) {
            self.state
                .set_status(format!("No service behind {code}"), StatusKind::Warning);
        } else {
            self.state
                .set_status(format!("Cannot dial '{code}'"), StatusKind::Error);
        }
    }

    fn apply_credit(&mut self) {
        let raw = self.state.credit_input.trim().to_string();
        self.state.credit_input.clear();
        if raw.is_empty() {
            return;
        }

        let currency = self.config.currency.clone();
        match raw.parse::<u64>() {
            Ok(amount) => match self.session.credit(amount) {
                Ok(balance) => {
                    debug!(amount, balance, "Credited via handset");
                    self.state.set_status(
                        format!("Credited {currency} {amount}. Balance: {currency} {balance}"),
                        StatusKind::Success,
                    );
                }
                Err(err) => self.state.set_status(err.to_string(), StatusKind::Error),
            },
            Err(_) => self
                .state
                .set_status(format!("'{raw}' is not an amount"), StatusKind::Error),
        }
    }

    fn apply_event(&mut self, event: SessionEvent) {
        let currency = self.config.currency.clone();
        match event {
            SessionEvent::Navigated(_) => {
                self.state.set_status(
                    "Reply with an option number. Esc goes back.",
                    StatusKind::Neutral,
                );
            }
            SessionEvent::PurchaseSucceeded { item, balance } => {
                self.state.set_status(
                    format!(
                        "Successfully purchased: {}. Balance: {currency} {balance}",
                        item.text
                    ),
                    StatusKind::Success,
                );
            }
            SessionEvent::PurchaseFailed { .. } => {
                self.state
                    .set_status("Insufficient balance", StatusKind::Warning);
            }
            SessionEvent::InfoShown { item, balance } => {
                let message = match item.action {
                    ItemAction::Info(InfoKind::Balance) => {
                        format!("Your balance is: {currency} {balance}")
                    }
                    _ => format!("{}: request received", item.text),
                };
                self.state.set_status(message, StatusKind::Neutral);
            }
            SessionEvent::SelectionRejected { reason } => {
                self.state.set_status(reason, StatusKind::Error);
            }
            SessionEvent::SessionEnded => {
                self.state.set_status("Session ended", StatusKind::Neutral);
            }
        }
    }

    fn draw(&mut self, frame: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(4),
                Constraint::Length(3),
                Constraint::Length(3),
                Constraint::Min(5),
                Constraint::Length(3),
            ])
            .split(frame.size());

        self.render_header(frame, chunks[0]);
        self.render_credit(frame, chunks[1]);
        self.render_dial(frame, chunks[2]);
        self.render_hint(frame, chunks[3]);
        self.render_status(frame, chunks[4]);

        if self.session.current_menu().is_some() {
            self.render_menu(frame);
        }
    }

    fn render_header(&self, frame: &mut Frame, area: Rect) {
        let currency = &self.config.currency;
        let clock = Local::now().format("%H:%M").to_string();
        let lines = vec![
            Line::from(vec![
                Span::styled("Phone: ", Style::default().fg(self.theme.muted)),
                Span::styled(
                    self.config.phone_number.clone(),
                    Style::default().fg(self.theme.primary_fg),
                ),
                Span::raw("   "),
                Span::styled(clock, Style::default().fg(self.theme.muted)),
            ]),
            Line::from(vec![
                Span::styled("Balance: ", Style::default().fg(self.theme.muted)),
                Span::styled(
                    format!("{currency} {}", self.session.balance()),
                    Style::default()
                        .fg(self.theme.accent)
                        .add_modifier(Modifier::BOLD),
                ),
            ]),
        ];
        let paragraph =
            Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title("Handset"));
        frame.render_widget(paragraph, area);
    }

    fn render_credit(&self, frame: &mut Frame, area: Rect) {
        let focused = self.state.focus == Focus::Credit && self.session.current_menu().is_none();
        let line = Line::from(vec![
            Span::styled("Amount: ", Style::default().fg(self.theme.muted)),
            Span::raw(self.state.credit_input.clone()),
        ]);
        frame.render_widget(self.field_paragraph(line, "Credit Account", focused), area);
        if focused {
            frame.set_cursor(
                area.x + 9 + self.state.credit_input.len() as u16,
                area.y + 1,
            );
        }
    }

    fn render_dial(&self, frame: &mut Frame, area: Rect) {
        let focused = self.state.focus == Focus::Dial && self.session.current_menu().is_none();
        let line = Line::from(vec![
            Span::styled("Dial: ", Style::default().fg(self.theme.muted)),
            Span::raw(self.state.dial_input.clone()),
        ]);
        frame.render_widget(self.field_paragraph(line, "Dialer", focused), area);
        if focused {
            frame.set_cursor(area.x + 7 + self.state.dial_input.len() as u16, area.y + 1);
        }
    }

    fn field_paragraph<'a>(&self, line: Line<'a>, title: &'a str, focused: bool) -> Paragraph<'a> {
        let border_style = if focused {
            Style::default().fg(self.theme.accent)
        } else {
            Style::default().fg(self.theme.muted)
        };
        Paragraph::new(line).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(border_style)
                .title(title),
        )
    }

    fn render_hint(&self, frame: &mut Frame, area: Rect) {
        let lines = vec![
            Line::from(format!(
                "Dial {} to open the service menu.",
                self.config.service_code
            )),
            Line::from(""),
            Line::from(vec![
                Span::styled("Tab", Style::default().add_modifier(Modifier::BOLD)),
                Span::raw(" switch field  "),
                Span::styled("Enter", Style::default().add_modifier(Modifier::BOLD)),
                Span::raw(" send  "),
                Span::styled("q", Style::default().add_modifier(Modifier::BOLD)),
                Span::raw(" quit"),
            ]),
        ];
        let paragraph = Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL))
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);
    }

    fn render_status(&self, frame: &mut Frame, area: Rect) {
        let style = match self.state.status_kind {
            StatusKind::Neutral => Style::default().fg(self.theme.primary_fg),
            StatusKind::Success => Style::default().fg(self.theme.success),
            StatusKind::Warning => Style::default().fg(self.theme.warning),
            StatusKind::Error => Style::default().fg(self.theme.danger),
        };
        let paragraph = Paragraph::new(Line::from(Span::styled(self.state.status.clone(), style)))
            .block(Block::default().borders(Borders::ALL).title("Status"))
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);
    }

    fn render_menu(&self, frame: &mut Frame) {
        let Some(menu_id) = self.session.current_menu() else {
            return;
        };
        let menu = self.catalog.menu(menu_id);

        let width = 44.min(frame.size().width.saturating_sub(2)).max(24);
        let height = (menu.len() as u16 + 4).min(frame.size().height.saturating_sub(2));
        let area = centered_rect(width, height, frame.size());
        frame.render_widget(Clear, area);

        let mut lines: Vec<Line> = menu
            .items()
            .iter()
            .enumerate()
            .map(|(index, item)| self.menu_line(index, item))
            .collect();
        lines.push(Line::from(""));
        lines.push(Line::from(vec![
            Span::styled("> ", Style::default().fg(self.theme.accent)),
            Span::raw(self.state.selection_input.clone()),
        ]));

        let paragraph = Paragraph::new(lines)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(self.theme.accent))
                    .title(self.config.service_code.clone()),
            )
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);

        let cursor_x = (area.x + 3 + self.state.selection_input.len() as u16)
            .min(area.x + area.width.saturating_sub(2));
        let cursor_y = (area.y + area.height).saturating_sub(2);
        frame.set_cursor(cursor_x, cursor_y);
    }

    fn menu_line(&self, index: usize, item: &MenuItem) -> Line<'static> {
        let currency = &self.config.currency;
        let label = match item.price() {
            Some(price) => format!("{index}. {} ({currency} {price})", item.text),
            None => format!("{index}. {}", item.text),
        };
        Line::from(Span::styled(
            label,
            Style::default().fg(self.theme.primary_fg),
        ))
    }
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    disable_raw_mode().context("failed to disable raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("failed to leave alternate screen")?;
    terminal.show_cursor()?;
    Ok(())
}

fn spawn_input_thread(sender: mpsc::Sender<AppEvent>) {
    thread::spawn(move || loop {
        match event::poll(TICK_RATE) {
            Ok(true) => match event::read() {
                Ok(evt) => {
                    if sender.blocking_send(AppEvent::Input(evt)).is_err() {
                        break;
                    }
                }
                Err(_) => break,
            },
            Ok(false) => {
                if sender.blocking_send(AppEvent::Tick).is_err() {
                    break;
                }
            }
            Err(_) => break,
        }
    });
}

fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width, height)
}
