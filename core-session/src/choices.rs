//! # Choice Presenter
//!
//! Highlight tracking and commit over the three visible choices.
//! Directional moves wrap modulo the choice count.

use bridge_traits::story::Choice;

/// The visible choice list and its highlighted index.
#[derive(Debug, Default)]
pub struct ChoicePresenter {
    choices: Vec<Choice>,
    highlighted: usize,
    visible: bool,
}

impl ChoicePresenter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Show a choice list with the highlight on the first entry.
    pub fn present(&mut self, choices: Vec<Choice>) {
        self.choices = choices;
        self.highlighted = 0;
        self.visible = !self.choices.is_empty();
    }

    /// Hide and drop the current list.
    pub fn clear(&mut self) {
        self.choices.clear();
        self.highlighted = 0;
        self.visible = false;
    }

    /// Move the highlight to the next choice, wrapping at the end.
    pub fn next(&mut self) {
        if self.visible && !self.choices.is_empty() {
            self.highlighted = (self.highlighted + 1) % self.choices.len();
        }
    }

    /// Move the highlight to the previous choice, wrapping at the start.
    pub fn previous(&mut self) {
        if self.visible && !self.choices.is_empty() {
            self.highlighted = (self.highlighted + self.choices.len() - 1) % self.choices.len();
        }
    }

    /// Move the highlight directly (pointer hover). Out-of-range indexes
    /// are ignored.
    pub fn highlight(&mut self, index: usize) {
        if self.visible && index < self.choices.len() {
            self.highlighted = index;
        }
    }

    /// Commit the highlighted choice.
    pub fn commit(&self) -> Option<Choice> {
        if !self.visible {
            return None;
        }
        self.choices.get(self.highlighted).cloned()
    }

    pub fn highlighted(&self) -> usize {
        self.highlighted
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn choices(&self) -> &[Choice] {
        &self.choices
    }
}
