//! Parquet-backed conversation store.
//!
//! Directory structure:
//! ```text
//! <save_dir>/
//! ├── individual_conversations/
//! │   ├── conversation_0.parquet   # column `conversation`, one row
//! │   └── conversation_1.parquet
//! └── conversations/
//!     └── conversations.parquet    # column `conversations`, one row per file
//! ```

use crate::id_allocator::{self, list_conversation_files};
use crate::parquet_codec::{
    AGGREGATE_COLUMN, CONVERSATION_COLUMN, encode, read_conversations, write_batch,
};
use crate::paths::{SavePaths, conversation_file_name};
use chatterboxer_core::{
    AggregateReport, ChatterError, ConversationId, ConversationRepository, Turn,
    config::{AggregateOrder, StorageConfig},
    error::Result,
};
use std::fs;
use std::path::{Path, PathBuf};

/// Writes one conversation to `directory/conversation_<id>.parquet`.
///
/// An existing file with the same name is replaced.
pub fn save(conversation: &[Turn], id: ConversationId, directory: &Path) -> Result<PathBuf> {
    if !directory.is_dir() {
        return Err(ChatterError::configuration(format!(
            "Conversation directory does not exist: {}",
            directory.display()
        )));
    }

    let path = directory.join(conversation_file_name(id));
    let batch = encode(&[conversation], CONVERSATION_COLUMN)?;
    write_batch(&path, &batch)?;

    tracing::info!(
        "[Store] Saved conversation {} ({} turns) to {}",
        id,
        conversation.len(),
        path.display()
    );
    Ok(path)
}

/// Concatenates every conversation file in `source_directory` into
/// `destination_path` under the `conversations` column.
///
/// Aborts on the first unreadable file; the destination is only written once
/// every source has decoded.
pub fn aggregate(
    source_directory: &Path,
    destination_path: &Path,
    order: AggregateOrder,
) -> Result<AggregateReport> {
    let mut files = list_conversation_files(source_directory)?;
    if order == AggregateOrder::ById {
        files.sort_by_key(|(id, _)| *id);
    }

    let mut conversations = Vec::with_capacity(files.len());
    for (id, path) in &files {
        let rows = read_conversations(path, CONVERSATION_COLUMN).inspect_err(|e| {
            tracing::error!("[Store] Aggregation aborted at conversation {}: {}", id, e);
        })?;
        if rows.len() != 1 {
            tracing::warn!(
                "[Store] {} holds {} rows, expected one",
                path.display(),
                rows.len()
            );
        }
        conversations.extend(rows);
    }

    if let Some(parent) = destination_path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let batch = encode(&conversations, AGGREGATE_COLUMN)?;
    write_batch(destination_path, &batch)?;

    tracing::info!(
        "[Store] Aggregated {} conversations from {} files into {}",
        conversations.len(),
        files.len(),
        destination_path.display()
    );

    Ok(AggregateReport {
        conversations: conversations.len(),
        files: files.into_iter().map(|(_, path)| path).collect(),
        destination: destination_path.to_path_buf(),
    })
}

/// Reads a single per-conversation file.
pub fn read_conversation(path: &Path) -> Result<Vec<Turn>> {
    let mut rows = read_conversations(path, CONVERSATION_COLUMN)?;
    if rows.len() != 1 {
        return Err(ChatterError::serialization(
            path.display().to_string(),
            format!("expected exactly one conversation, found {}", rows.len()),
        ));
    }
    Ok(rows.remove(0))
}

/// Reads every row of an aggregate file.
pub fn read_aggregate(path: &Path) -> Result<Vec<Vec<Turn>>> {
    read_conversations(path, AGGREGATE_COLUMN)
}

/// [`ConversationRepository`] over a [`SavePaths`] layout.
#[derive(Debug, Clone)]
pub struct ParquetConversationStore {
    paths: SavePaths,
    order: AggregateOrder,
}

impl ParquetConversationStore {
    pub fn new(paths: SavePaths, order: AggregateOrder) -> Self {
        Self { paths, order }
    }

    /// Builds the store and eagerly creates its directories.
    pub fn open(config: &StorageConfig) -> Result<Self> {
        let paths = SavePaths::from_config(config);
        paths.ensure()?;
        tracing::debug!(
            "[Store] Using save directory {} ({:?})",
            paths.root().display(),
            config.aggregate_order()
        );
        Ok(Self::new(paths, config.aggregate_order()))
    }

    pub fn paths(&self) -> &SavePaths {
        &self.paths
    }

    /// IDs of all saved conversations, ascending.
    pub fn saved_ids(&self) -> Result<Vec<ConversationId>> {
        let mut ids: Vec<_> = list_conversation_files(&self.paths.individual_dir())?
            .into_iter()
            .map(|(id, _)| id)
            .collect();
        ids.sort_unstable();
        Ok(ids)
    }

    pub fn load(&self, id: ConversationId) -> Result<Vec<Turn>> {
        read_conversation(&self.paths.individual_dir().join(conversation_file_name(id)))
    }
}

impl ConversationRepository for ParquetConversationStore {
    fn next_id(&self) -> Result<ConversationId> {
        id_allocator::next_id(&self.paths.individual_dir())
    }

    fn save(&self, conversation: &[Turn], id: ConversationId) -> Result<PathBuf> {
        save(conversation, id, &self.paths.individual_dir())
    }

    fn aggregate(&self) -> Result<AggregateReport> {
        aggregate(
            &self.paths.individual_dir(),
            &self.paths.aggregate_file(),
            self.order,
        )
    }
}
