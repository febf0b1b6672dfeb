//! # Typewriter Engine
//!
//! Reveals one chunk's text character by character. The engine itself is a
//! plain state machine; the session drives it from a timer and reads the
//! visible prefix after each tick, so cancelling is just dropping into
//! [`TypewriterEngine::cancel`] with no timer callback left to fire a
//! stray character.

/// What a single tick accomplished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    /// One more character became visible.
    Revealed,
    /// The final character became visible; typing is complete.
    Finished,
    /// The engine was not typing; nothing happened.
    Idle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TypingState {
    Idle,
    Typing,
    Complete { skipped: bool },
}

/// Progressive reveal of one chunk of text.
#[derive(Debug)]
pub struct TypewriterEngine {
    text: String,
    /// Byte offset of the reveal cursor; always on a char boundary.
    cursor: usize,
    state: TypingState,
}

impl Default for TypewriterEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl TypewriterEngine {
    pub fn new() -> Self {
        Self {
            text: String::new(),
            cursor: 0,
            state: TypingState::Idle,
        }
    }

    /// Begin revealing a new text from the first character. An empty text
    /// completes immediately.
    pub fn start(&mut self, text: impl Into<String>) {
        self.text = text.into();
        self.cursor = 0;
        self.state = if self.text.is_empty() {
            TypingState::Complete { skipped: false }
        } else {
            TypingState::Typing
        };
    }

    /// Reveal the next character.
    pub fn tick(&mut self) -> Tick {
        if self.state != TypingState::Typing {
            return Tick::Idle;
        }
        match self.text[self.cursor..].chars().next() {
            Some(ch) => {
                self.cursor += ch.len_utf8();
                if self.cursor == self.text.len() {
                    self.state = TypingState::Complete { skipped: false };
                    Tick::Finished
                } else {
                    Tick::Revealed
                }
            }
            None => {
                self.state = TypingState::Complete { skipped: false };
                Tick::Finished
            }
        }
    }

    /// Jump straight to the full text. Only effective while typing;
    /// returns whether a skip happened.
    pub fn skip(&mut self) -> bool {
        if self.state != TypingState::Typing {
            return false;
        }
        self.cursor = self.text.len();
        self.state = TypingState::Complete { skipped: true };
        true
    }

    /// Drop the current text entirely. Nothing remains visible and
    /// subsequent ticks are no-ops until the next [`start`](Self::start).
    pub fn cancel(&mut self) {
        self.text.clear();
        self.cursor = 0;
        self.state = TypingState::Idle;
    }

    /// The currently visible prefix.
    pub fn visible(&self) -> &str {
        &self.text[..self.cursor]
    }

    /// The full text being revealed.
    pub fn full_text(&self) -> &str {
        &self.text
    }

    pub fn is_typing(&self) -> bool {
        self.state == TypingState::Typing
    }

    pub fn is_complete(&self) -> bool {
        matches!(self.state, TypingState::Complete { .. })
    }

    /// Whether the last completion came from a skip rather than the final
    /// tick.
    pub fn was_skipped(&self) -> bool {
        matches!(self.state, TypingState::Complete { skipped: true })
    }
}
