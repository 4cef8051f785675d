//! Conversation repository trait.
//!
//! Defines the persistence operations the chat session depends on, decoupling
//! it from the concrete on-disk format.

use crate::conversation::{ConversationId, Turn};
use crate::error::Result;
use std::path::PathBuf;

/// Outcome of merging every saved conversation into one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregateReport {
    /// Number of rows written to the aggregate.
    pub conversations: usize,
    /// Per-conversation files that were read.
    pub files: Vec<PathBuf>,
    pub destination: PathBuf,
}

/// Storage for finished conversations.
///
/// # Implementation Notes
///
/// - `save` must either fully replace the target file or leave it untouched.
/// - `aggregate` must not write a destination file if any source is unreadable.
pub trait ConversationRepository {
    /// Returns the smallest ID greater than every ID already on disk, or `0`.
    fn next_id(&self) -> Result<ConversationId>;

    /// Persists one conversation under `id`, overwriting any existing file.
    ///
    /// # Returns
    ///
    /// The path that was written.
    fn save(&self, conversation: &[Turn], id: ConversationId) -> Result<PathBuf>;

    /// Concatenates all saved conversations into the aggregate file.
    fn aggregate(&self) -> Result<AggregateReport>;
}

impl<R: ConversationRepository + ?Sized> ConversationRepository for &R {
    fn next_id(&self) -> Result<ConversationId> {
        (**self).next_id()
    }

    fn save(&self, conversation: &[Turn], id: ConversationId) -> Result<PathBuf> {
        (**self).save(conversation, id)
    }

    fn aggregate(&self) -> Result<AggregateReport> {
        (**self).aggregate()
    }
}

impl<R: ConversationRepository + ?Sized> ConversationRepository for Box<R> {
    fn next_id(&self) -> Result<ConversationId> {
        (**self).next_id()
    }

    fn save(&self, conversation: &[Turn], id: ConversationId) -> Result<PathBuf> {
        (**self).save(conversation, id)
    }

    fn aggregate(&self) -> Result<AggregateReport> {
        (**self).aggregate()
    }
}
