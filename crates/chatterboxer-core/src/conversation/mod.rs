//! Conversation domain model.

pub mod buffer;
pub mod turn;

pub use buffer::ConversationBuffer;
pub use turn::{Role, Turn};

/// Numeric identifier of a persisted conversation (`conversation_<id>`).
pub type ConversationId = u64;
