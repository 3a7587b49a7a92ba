//! Compose-box state machine
//!
//! Tracks the text being typed, how many rows the input affordance should
//! occupy, and the submit handshake: a submit trigger clears the box
//! synchronously and hands the pre-clear text to the dispatcher, so the box
//! is visually empty regardless of dispatch latency. Submit triggers while a
//! dispatch is in flight are ignored, even when invoked programmatically.

/// Rows beyond this scroll instead of growing the input further.
pub const MAX_VISIBLE_ROWS: usize = 5;

#[derive(Debug, Default)]
pub struct Compose {
    text: String,
}

impl Compose {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    pub fn insert_char(&mut self, c: char) {
        self.text.push(c);
    }

    /// Shift+Enter path: a literal newline, never a dispatch.
    pub fn insert_newline(&mut self) {
        self.text.push('\n');
    }

    pub fn backspace(&mut self) {
        self.text.pop();
    }

    /// Count of newline-delimited segments, minimum 1.
    pub fn line_count(&self) -> usize {
        self.text.split('\n').count().max(1)
    }

    /// Rows the input affordance should occupy, capped.
    pub fn visible_rows(&self) -> usize {
        self.line_count().min(MAX_VISIBLE_ROWS)
    }

    /// Handle a submit trigger.
    ///
    /// Ignored while a dispatch is in flight. Otherwise the compose state is
    /// cleared first and the pre-clear text returned for dispatch; emptiness
    /// is the dispatcher's precondition, not ours.
    pub fn submit(&mut self, awaiting: bool) -> Option<String> {
        if awaiting {
            return None;
        }
        if self.text.is_empty() {
            return None;
        }
        Some(std::mem::take(&mut self.text))
    }
}
