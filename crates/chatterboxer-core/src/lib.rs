pub mod config;
pub mod conversation;
pub mod error;
pub mod repository;

// Re-export common types
pub use conversation::{ConversationBuffer, ConversationId, Role, Turn};
pub use error::{ChatterError, Result};
pub use repository::{AggregateReport, ConversationRepository};
