//! Bot-message markup rendering
//!
//! Bot replies may contain lightweight markdown; masking it through a real
//! event-stream parser keeps emphasis inside code spans and lists intact.
//! User text never goes through here, it renders verbatim.

use pulldown_cmark::{Event, Parser, Tag, TagEnd};
use ratatui::style::{Modifier, Style, Stylize};
use ratatui::text::{Line, Span};

/// Render markdown into styled terminal lines.
pub fn render(text: &str) -> Vec<Line<'static>> {
    let mut renderer = Renderer::default();
    for event in Parser::new(text) {
        renderer.handle(event);
    }
    renderer.finish()
}

#[derive(Default)]
struct Renderer {
    lines: Vec<Line<'static>>,
    spans: Vec<Span<'static>>,
    bold: usize,
    italic: usize,
    code_block: bool,
    list_depth: usize,
}

impl Renderer {
    fn handle(&mut self, event: Event<'_>) {
        match event {
            Event::Start(Tag::Paragraph) => self.blank_separator(),
            Event::End(TagEnd::Paragraph) => self.flush(),

            Event::Start(Tag::Heading { .. }) => {
                self.blank_separator();
                self.bold += 1;
            }
            Event::End(TagEnd::Heading(_)) => {
                self.flush();
                self.bold = self.bold.saturating_sub(1);
            }

            Event::Start(Tag::Strong) => self.bold += 1,
            Event::End(TagEnd::Strong) => self.bold = self.bold.saturating_sub(1),
            Event::Start(Tag::Emphasis) => self.italic += 1,
            Event::End(TagEnd::Emphasis) => self.italic = self.italic.saturating_sub(1),

            Event::Start(Tag::List(_)) => {
                if self.list_depth == 0 {
                    self.blank_separator();
                }
                self.list_depth += 1;
            }
            Event::End(TagEnd::List(_)) => self.list_depth = self.list_depth.saturating_sub(1),
            Event::Start(Tag::Item) => {
                self.flush();
                let indent = "  ".repeat(self.list_depth.saturating_sub(1));
                self.spans.push(Span::raw(format!("{indent}• ")));
            }
            Event::End(TagEnd::Item) => self.flush(),

            Event::Start(Tag::CodeBlock(_)) => {
                self.blank_separator();
                self.code_block = true;
            }
            Event::End(TagEnd::CodeBlock) => {
                self.flush();
                self.code_block = false;
            }

            Event::Text(text) => {
                if self.code_block {
                    for line in text.lines() {
                        self.lines.push(Line::from(Span::styled(
                            line.to_string(),
                            Style::default().add_modifier(Modifier::DIM),
                        )));
                    }
                } else {
                    let style = self.current_style();
                    self.spans.push(Span::styled(text.to_string(), style));
                }
            }
            Event::Code(code) => {
                self.spans
                    .push(Span::styled(code.to_string(), Style::new().yellow()));
            }

            Event::SoftBreak | Event::HardBreak => self.flush(),

            // Tables, footnotes, html and the rest have no terminal shape.
            _ => {}
        }
    }

    fn current_style(&self) -> Style {
        let mut style = Style::default();
        if self.bold > 0 {
            style = style.add_modifier(Modifier::BOLD);
        }
        if self.italic > 0 {
            style = style.add_modifier(Modifier::ITALIC);
        }
        style
    }

    /// End the current line, if it holds anything.
    fn flush(&mut self) {
        if !self.spans.is_empty() {
            self.lines.push(Line::from(std::mem::take(&mut self.spans)));
        }
    }

    /// Blank line between blocks, but never a leading one.
    fn blank_separator(&mut self) {
        self.flush();
        if !self.lines.is_empty() {
            self.lines.push(Line::default());
        }
    }

    fn finish(mut self) -> Vec<Line<'static>> {
        self.flush();
        self.lines
    }
}
