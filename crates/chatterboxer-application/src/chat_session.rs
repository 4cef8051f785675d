use chatterboxer_core::{
    AggregateReport, ConversationBuffer, ConversationId, ConversationRepository, Role, Turn,
    error::Result,
};
use std::path::PathBuf;

/// Re-render hook invoked after every change to the authoring buffer.
pub trait ConversationObserver {
    fn conversation_changed(&mut self, turns: &[Turn]);
}

impl<F: FnMut(&[Turn])> ConversationObserver for F {
    fn conversation_changed(&mut self, turns: &[Turn]) {
        self(turns)
    }
}

/// Where the session is between user actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Turns have been added since the last rotation.
    Authoring,
    /// The buffer holds only the leading system turn.
    Idle,
}

/// A conversation that was written to storage by [`ChatSession::finalize`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedConversation {
    pub id: ConversationId,
    pub path: PathBuf,
    pub turns: usize,
}

/// Orchestrates authoring one conversation after another.
///
/// `ChatSession` is responsible for:
/// - Appending human and assistant turns to the buffer
/// - Saving the buffer under the next free ID and rotating to a fresh one
/// - Triggering aggregation of everything saved so far
///
/// The buffer is only reset after the repository confirms a save.
pub struct ChatSession<R: ConversationRepository> {
    repository: R,
    buffer: ConversationBuffer,
    next_id: ConversationId,
    observer: Option<Box<dyn ConversationObserver>>,
}

impl<R: ConversationRepository> ChatSession<R> {
    /// Opens a session whose first ID follows whatever is already on disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the repository cannot allocate an ID (for example the
    /// conversation directory is missing).
    pub fn open(repository: R) -> Result<Self> {
        let next_id = repository.next_id()?;
        tracing::info!("[Session] Opened; next conversation ID is {}", next_id);
        Ok(Self {
            repository,
            buffer: ConversationBuffer::new(),
            next_id,
            observer: None,
        })
    }

    pub fn set_observer(&mut self, observer: impl ConversationObserver + 'static) {
        self.observer = Some(Box::new(observer));
    }

    pub fn add_human(&mut self, text: impl Into<String>) {
        self.append(Role::Human, text.into());
    }

    pub fn add_assistant(&mut self, text: impl Into<String>) {
        self.append(Role::Assistant, text.into());
    }

    fn append(&mut self, role: Role, text: String) {
        tracing::debug!("[Session] Appending {} turn ({} bytes)", role, text.len());
        self.buffer.append(role, text);
        self.notify();
    }

    /// Saves the current conversation and starts a new one.
    ///
    /// On failure the buffer and the ID counter are left exactly as they were,
    /// so the user can retry.
    pub fn finalize(&mut self) -> Result<SavedConversation> {
        let id = self.next_id;
        let path = self
            .repository
            .save(self.buffer.snapshot(), id)
            .inspect_err(|e| {
                tracing::error!("[Session] Failed to save conversation {}: {}", id, e);
            })?;

        let saved = SavedConversation {
            id,
            path,
            turns: self.buffer.len(),
        };
        self.next_id += 1;
        self.buffer.reset();
        self.notify();
        Ok(saved)
    }

    /// Merges every saved conversation into the aggregate file.
    ///
    /// The conversation being authored is not included until it is finalized.
    pub fn aggregate_all(&self) -> Result<AggregateReport> {
        if self.state() == SessionState::Authoring {
            tracing::warn!(
                "[Session] Aggregating while conversation {} is still unsaved",
                self.next_id
            );
        }
        self.repository.aggregate()
    }

    pub fn snapshot(&self) -> &[Turn] {
        self.buffer.snapshot()
    }

    /// ID the current conversation will be saved under.
    pub fn current_id(&self) -> ConversationId {
        self.next_id
    }

    pub fn state(&self) -> SessionState {
        if self.buffer.is_fresh() {
            SessionState::Idle
        } else {
            SessionState::Authoring
        }
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }

    fn notify(&mut self) {
        if let Some(observer) = self.observer.as_mut() {
            observer.conversation_changed(self.buffer.snapshot());
        }
    }
}
