pub mod conversation_store;
pub mod id_allocator;
pub mod parquet_codec;
pub mod paths;
pub mod storage;

pub use crate::conversation_store::ParquetConversationStore;
pub use crate::paths::SavePaths;
pub use crate::storage::ConfigStorage;
