//! Chat view
//!
//! One screen: scrolling message list, transient toast line, compose box.
//! Input events come off a dedicated reader thread; session changes arrive
//! over the runtime's broadcast channel.

use crate::compose::Compose;
use crate::identity::Identity;
use crate::noms;
use crate::runtime::{SessionHandle, UiEvent};
use crate::store::{Message, Role};
use crate::ui::markdown;
use crossterm::event::{Event as InputEvent, KeyCode, KeyEventKind, KeyModifiers};
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Color, Modifier, Style, Stylize};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use ratatui::{DefaultTerminal, Frame};
use std::io;
use std::time::{Duration, Instant};
use tokio::sync::broadcast;
use tokio::sync::mpsc;

/// Loading indicator frames, cycled twice a second.
const LOADING_FRAMES: [&str; 3] = [".", "..", "..."];

const TOAST_TTL: Duration = Duration::from_secs(4);

pub struct ChatApp {
    handle: SessionHandle,
    ui_rx: broadcast::Receiver<UiEvent>,
    identity: Identity,
    messages: Vec<Message>,
    awaiting: bool,
    compose: Compose,
    toast: Option<(String, Instant)>,
    loading_frame: usize,
    /// None: follow the newest message. Some: manual scroll offset from top.
    scroll: Option<u16>,
}

impl ChatApp {
    pub fn new(handle: SessionHandle, ui_rx: broadcast::Receiver<UiEvent>, identity: Identity) -> Self {
        Self {
            handle,
            ui_rx,
            identity,
            messages: Vec::new(),
            awaiting: false,
            compose: Compose::new(),
            toast: None,
            loading_frame: 0,
            scroll: None,
        }
    }

    pub async fn run(mut self, terminal: &mut DefaultTerminal) -> io::Result<()> {
        // Dedicated reader thread: crossterm reads are blocking, and a plain
        // OS thread dies with the process instead of stalling runtime
        // shutdown.
        let (input_tx, mut input_rx) = mpsc::channel::<InputEvent>(64);
        std::thread::spawn(move || loop {
            match crossterm::event::read() {
                Ok(event) => {
                    if input_tx.blocking_send(event).is_err() {
                        break;
                    }
                }
                Err(_) => break,
            }
        });

        let mut ticker = tokio::time::interval(Duration::from_millis(500));

        loop {
            terminal.draw(|frame| self.draw(frame))?;

            tokio::select! {
                Some(event) = input_rx.recv() => {
                    if self.handle_input(event).await {
                        return Ok(());
                    }
                }
                changed = self.ui_rx.recv() => match changed {
                    Ok(event) => self.apply(event),
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "renderer lagged behind session events");
                    }
                    Err(broadcast::error::RecvError::Closed) => return Ok(()),
                },
                _ = ticker.tick() => self.tick(),
            }
        }
    }

    /// Returns true when the app should quit.
    async fn handle_input(&mut self, event: InputEvent) -> bool {
        let InputEvent::Key(key) = event else {
            return false;
        };
        if key.kind != KeyEventKind::Press {
            return false;
        }

        match key.code {
            KeyCode::Esc => return true,
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => return true,
            KeyCode::Char('d') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.handle.download_sheet().await;
            }
            // Editing keys are inert while a dispatch is in flight; the
            // compose box is disabled, not queued into.
            KeyCode::Enter if key.modifiers.contains(KeyModifiers::SHIFT) => {
                if !self.awaiting {
                    self.compose.insert_newline();
                }
            }
            KeyCode::Enter => {
                if let Some(text) = self.compose.submit(self.awaiting) {
                    self.handle.submit(text).await;
                }
            }
            KeyCode::Backspace => {
                if !self.awaiting {
                    self.compose.backspace();
                }
            }
            KeyCode::PageUp => {
                let current = self.scroll.unwrap_or(u16::MAX);
                self.scroll = Some(current.saturating_sub(5));
            }
            KeyCode::PageDown => {
                if let Some(offset) = self.scroll {
                    self.scroll = Some(offset.saturating_add(5));
                }
            }
            KeyCode::End => self.scroll = None,
            KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                if !self.awaiting {
                    self.compose.insert_char(c);
                }
            }
            _ => {}
        }
        false
    }

    fn apply(&mut self, event: UiEvent) {
        match event {
            UiEvent::Init { messages, awaiting } => {
                self.messages = messages;
                self.awaiting = awaiting;
            }
            UiEvent::Message { message } => {
                self.messages.push(message);
                self.scroll = None;
            }
            UiEvent::Dispatch { awaiting } => {
                self.awaiting = awaiting;
                self.loading_frame = 0;
            }
            UiEvent::Toast { text } => {
                self.toast = Some((text, Instant::now()));
            }
            UiEvent::SheetSaved { path } => {
                tracing::info!(path = %path.display(), "spreadsheet saved");
            }
        }
    }

    fn tick(&mut self) {
        if self.awaiting {
            self.loading_frame = (self.loading_frame + 1) % LOADING_FRAMES.len();
        }
        if let Some((_, shown_at)) = &self.toast {
            if shown_at.elapsed() > TOAST_TTL {
                self.toast = None;
            }
        }
    }

    fn draw(&self, frame: &mut Frame<'_>) {
        let input_height = self.compose.visible_rows() as u16 + 2;
        let [messages_area, toast_area, input_area] = Layout::vertical([
            Constraint::Min(1),
            Constraint::Length(1),
            Constraint::Length(input_height),
        ])
        .areas(frame.area());

        self.draw_messages(frame, messages_area);
        self.draw_toast(frame, toast_area);
        self.draw_input(frame, input_area);
    }

    fn draw_messages(&self, frame: &mut Frame<'_>, area: Rect) {
        let mut lines: Vec<Line<'static>> = Vec::new();

        for message in &self.messages {
            match message.role {
                Role::User => {
                    lines.push(Line::from(Span::styled(
                        self.identity.display_name().to_string(),
                        Style::new().cyan().add_modifier(Modifier::BOLD),
                    )));
                    for text_line in message.text.split('\n') {
                        lines.push(Line::from(text_line.to_string()));
                    }
                }
                Role::Bot => {
                    lines.push(Line::from(Span::styled(
                        "NaurBotMX",
                        Style::new().green().add_modifier(Modifier::BOLD),
                    )));
                    lines.extend(markdown::render(&message.text));
                    for nom in noms::dedup(&message.noms) {
                        // Unmapped codes render nothing.
                        if let Some(asset) = noms::label_asset(nom, message.lang) {
                            lines.push(Line::from(Span::styled(
                                format!("[{nom} → {asset}]"),
                                Style::new().add_modifier(Modifier::DIM),
                            )));
                        }
                    }
                }
            }
            lines.push(Line::default());
        }

        if self.awaiting {
            lines.push(Line::from(Span::styled(
                LOADING_FRAMES[self.loading_frame].to_string(),
                Style::new().add_modifier(Modifier::DIM),
            )));
        }

        let total = lines.len() as u16;
        let visible = area.height;
        let bottom = total.saturating_sub(visible);
        let offset = match self.scroll {
            Some(offset) => offset.min(bottom),
            None => bottom,
        };

        let paragraph = Paragraph::new(lines)
            .wrap(Wrap { trim: false })
            .scroll((offset, 0));
        frame.render_widget(paragraph, area);
    }

    fn draw_toast(&self, frame: &mut Frame<'_>, area: Rect) {
        if let Some((text, _)) = &self.toast {
            let toast = Paragraph::new(Line::from(Span::styled(
                text.clone(),
                Style::new().fg(Color::Black).bg(Color::Yellow),
            )));
            frame.render_widget(toast, area);
        }
    }

    fn draw_input(&self, frame: &mut Frame<'_>, area: Rect) {
        let mut help = String::from("Enter send · Shift+Enter newline · Esc quit");
        if self.identity.is_authenticated() {
            help.push_str(" · Ctrl+D download sheet");
        }

        let block = Block::default()
            .borders(Borders::ALL)
            .title_bottom(Line::from(help).right_aligned());

        let content = if self.compose.text().is_empty() && !self.awaiting {
            Paragraph::new(Span::styled(
                "Write a message...",
                Style::new().add_modifier(Modifier::DIM),
            ))
        } else if self.awaiting {
            // Input is disabled while a dispatch is in flight.
            Paragraph::new(Span::styled(
                self.compose.text().to_string(),
                Style::new().add_modifier(Modifier::DIM),
            ))
        } else {
            Paragraph::new(self.compose.text().to_string())
        };

        frame.render_widget(content.block(block), area);
    }
}
