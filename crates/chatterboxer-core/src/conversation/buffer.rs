use super::turn::{Role, Turn};

/// The conversation currently being authored.
///
/// Always starts with a single empty `system` turn. Turns are only ever
/// appended; the buffer is cleared wholesale by [`reset`](Self::reset).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationBuffer {
    turns: Vec<Turn>,
}

impl Default for ConversationBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl ConversationBuffer {
    pub fn new() -> Self {
        Self {
            turns: vec![Turn::system_empty()],
        }
    }

    /// Appends a turn. Empty text is allowed and nothing is de-duplicated.
    pub fn append(&mut self, role: Role, text: impl Into<String>) {
        self.turns.push(Turn::new(role, text));
    }

    /// Replaces the contents with a single empty system turn.
    pub fn reset(&mut self) {
        self.turns.clear();
        self.turns.push(Turn::system_empty());
    }

    /// Read-only view of the ordered turns.
    pub fn snapshot(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    /// A buffer is never empty; it holds at least the system turn.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// True when nothing has been appended since construction or the last reset.
    pub fn is_fresh(&self) -> bool {
        self.turns.len() == 1 && self.turns[0] == Turn::system_empty()
    }

    pub fn into_turns(self) -> Vec<Turn> {
        self.turns
    }
}
