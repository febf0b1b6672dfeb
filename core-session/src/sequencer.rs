//! # Chunk Sequencer
//!
//! Owns the ordered chunk list and the playback position. The sequencer
//! never moves past the choices on its own; only choice selection (handled
//! by the session) leaves that state.

use bridge_traits::story::StoryChunk;

/// Result of one advance request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    /// Moved to the chunk at this index.
    Started(usize),
    /// The last chunk was already showing; the choices are now visible.
    ChoicesShown,
    /// Nothing to do: no story loaded, or choices already visible.
    Blocked,
}

/// Position tracker over one installment's chunks.
#[derive(Debug, Default)]
pub struct ChunkSequencer {
    chunks: Vec<StoryChunk>,
    index: usize,
    waiting_for_input: bool,
    choices_visible: bool,
}

impl ChunkSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the chunk list and reset to the first chunk.
    pub fn load(&mut self, chunks: Vec<StoryChunk>) {
        self.chunks = chunks;
        self.index = 0;
        self.waiting_for_input = false;
        self.choices_visible = false;
    }

    /// Drop the loaded story entirely.
    pub fn clear(&mut self) {
        self.load(Vec::new());
    }

    /// Move forward one step.
    pub fn advance(&mut self) -> Advance {
        if self.chunks.is_empty() || self.choices_visible {
            return Advance::Blocked;
        }
        self.waiting_for_input = false;
        if self.index + 1 >= self.chunks.len() {
            self.choices_visible = true;
            Advance::ChoicesShown
        } else {
            self.index += 1;
            Advance::Started(self.index)
        }
    }

    /// The chunk at the current position.
    pub fn current(&self) -> Option<&StoryChunk> {
        self.chunks.get(self.index)
    }

    /// The chunk one position ahead, for prefetching.
    pub fn peek_next(&self) -> Option<&StoryChunk> {
        self.chunks.get(self.index + 1)
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn set_waiting(&mut self, waiting: bool) {
        self.waiting_for_input = waiting;
    }

    pub fn waiting_for_input(&self) -> bool {
        self.waiting_for_input
    }

    pub fn choices_visible(&self) -> bool {
        self.choices_visible
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_traits::story::Expression;

    fn chunks(texts: &[&str]) -> Vec<StoryChunk> {
        texts
            .iter()
            .map(|text| StoryChunk::new(*text, Expression::Neutral))
            .collect()
    }

    #[test]
    fn advances_through_chunks_then_shows_choices() {
        let mut sequencer = ChunkSequencer::new();
        sequencer.load(chunks(&["one", "two", "three"]));

        assert_eq!(sequencer.index(), 0);
        assert_eq!(sequencer.advance(), Advance::Started(1));
        assert_eq!(sequencer.advance(), Advance::Started(2));
        assert_eq!(sequencer.advance(), Advance::ChoicesShown);
        assert!(sequencer.choices_visible());

        // The sequencer cannot move past the choices.
        assert_eq!(sequencer.advance(), Advance::Blocked);
        assert_eq!(sequencer.index(), 2);
    }

    #[test]
    fn single_chunk_story_goes_straight_to_choices() {
        let mut sequencer = ChunkSequencer::new();
        sequencer.load(chunks(&["only"]));
        assert_eq!(sequencer.advance(), Advance::ChoicesShown);
    }

    #[test]
    fn advance_without_story_is_blocked() {
        let mut sequencer = ChunkSequencer::new();
        assert_eq!(sequencer.advance(), Advance::Blocked);
    }

    #[test]
    fn load_resets_position_and_flags() {
        let mut sequencer = ChunkSequencer::new();
        sequencer.load(chunks(&["a", "b"]));
        sequencer.set_waiting(true);
        sequencer.advance();
        sequencer.advance();
        assert!(sequencer.choices_visible());

        sequencer.load(chunks(&["fresh"]));
        assert_eq!(sequencer.index(), 0);
        assert!(!sequencer.waiting_for_input());
        assert!(!sequencer.choices_visible());
    }

    #[test]
    fn peek_next_sees_one_ahead_only() {
        let mut sequencer = ChunkSequencer::new();
        sequencer.load(chunks(&["a", "b"]));
        assert_eq!(sequencer.peek_next().unwrap().text, "b");
        sequencer.advance();
        assert!(sequencer.peek_next().is_none());
    }
}
