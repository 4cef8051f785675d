//! Arrow/Parquet encoding of conversations.
//!
//! Each row is one conversation stored in a single column of type
//! `LargeList<Struct<from: LargeUtf8, value: LargeUtf8>>`. Per-conversation
//! files name the column `conversation`; the aggregate names it
//! `conversations`. 64-bit offsets keep large aggregates addressable.
//!
//! Decoding also accepts `List` and `Utf8`/`Utf8View` layouts so files
//! produced by other dataframe tooling remain readable.

use crate::storage::atomic_write;
use arrow::array::{
    Array, ArrayRef, AsArray, GenericListArray, LargeListArray, LargeStringArray,
    OffsetSizeTrait, StructArray,
};
use arrow::buffer::OffsetBuffer;
use arrow::compute::cast;
use arrow::datatypes::{DataType, Field, FieldRef, Fields, Schema};
use arrow::error::ArrowError;
use arrow::record_batch::RecordBatch;
use chatterboxer_core::{ChatterError, Role, Turn, error::Result};
use parquet::arrow::ArrowWriter;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;
use std::fs::File;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

pub const CONVERSATION_COLUMN: &str = "conversation";
pub const AGGREGATE_COLUMN: &str = "conversations";

const FROM_FIELD: &str = "from";
const VALUE_FIELD: &str = "value";
const ITEM_FIELD: &str = "item";

fn turn_fields() -> Fields {
    Fields::from(vec![
        Field::new(FROM_FIELD, DataType::LargeUtf8, false),
        Field::new(VALUE_FIELD, DataType::LargeUtf8, false),
    ])
}

fn arrow_internal(err: ArrowError) -> ChatterError {
    ChatterError::internal(format!("Failed to build Arrow data: {}", err))
}

/// Builds a record batch with one row per conversation under `column`.
pub fn encode<C: AsRef<[Turn]>>(conversations: &[C], column: &str) -> Result<RecordBatch> {
    // Arrow's string builders need an exact-size iterator.
    let turns: Vec<&Turn> = conversations
        .iter()
        .flat_map(|conversation| conversation.as_ref())
        .collect();

    let from = LargeStringArray::from_iter_values(
        turns.iter().map(|turn| <&'static str>::from(turn.role)),
    );
    let value = LargeStringArray::from_iter_values(turns.iter().map(|turn| turn.text.as_str()));
    let structs = StructArray::try_new(
        turn_fields(),
        vec![Arc::new(from) as ArrayRef, Arc::new(value) as ArrayRef],
        None,
    )
    .map_err(arrow_internal)?;

    let item: FieldRef = Arc::new(Field::new(
        ITEM_FIELD,
        DataType::Struct(turn_fields()),
        false,
    ));
    let offsets =
        OffsetBuffer::<i64>::from_lengths(conversations.iter().map(|c| c.as_ref().len()));
    let list = LargeListArray::try_new(item.clone(), offsets, Arc::new(structs), None)
        .map_err(arrow_internal)?;

    let schema = Schema::new(vec![Field::new(column, DataType::LargeList(item), false)]);
    RecordBatch::try_new(Arc::new(schema), vec![Arc::new(list) as ArrayRef]).map_err(arrow_internal)
}

/// Decodes every row of `batch`, requiring exactly one column named `column`.
///
/// `origin` names the source in any error.
pub fn decode(batch: &RecordBatch, column: &str, origin: &str) -> Result<Vec<Vec<Turn>>> {
    let schema = batch.schema();
    let names: Vec<&str> = schema.fields().iter().map(|f| f.name().as_str()).collect();
    if names != [column] {
        return Err(ChatterError::serialization(
            origin,
            format!("expected a single `{}` column, found {:?}", column, names),
        ));
    }

    let array = batch.column(0);
    match array.data_type() {
        DataType::List(_) => decode_list(array.as_list::<i32>(), origin),
        DataType::LargeList(_) => decode_list(array.as_list::<i64>(), origin),
        other => Err(ChatterError::serialization(
            origin,
            format!("column `{}` has type {}, expected a list of turns", column, other),
        )),
    }
}

fn decode_list<O: OffsetSizeTrait>(
    list: &GenericListArray<O>,
    origin: &str,
) -> Result<Vec<Vec<Turn>>> {
    let structs = list.values().as_struct_opt().ok_or_else(|| {
        ChatterError::serialization(
            origin,
            format!("list items have type {}, expected a struct", list.value_type()),
        )
    })?;
    let from = string_field(structs, FROM_FIELD, origin)?;
    let value = string_field(structs, VALUE_FIELD, origin)?;

    let offsets = list.value_offsets();
    let mut conversations = Vec::with_capacity(list.len());
    for row in 0..list.len() {
        if list.is_null(row) {
            return Err(ChatterError::serialization(
                origin,
                format!("row {} holds no conversation", row),
            ));
        }

        let (start, end) = (offsets[row].as_usize(), offsets[row + 1].as_usize());
        let mut turns = Vec::with_capacity(end - start);
        for index in start..end {
            if structs.is_null(index) || from.is_null(index) || value.is_null(index) {
                return Err(ChatterError::serialization(
                    origin,
                    format!("row {} contains an incomplete turn", row),
                ));
            }
            let role = Role::from_str(from.value(index)).map_err(|_| {
                ChatterError::serialization(
                    origin,
                    format!("row {} has unknown role {:?}", row, from.value(index)),
                )
            })?;
            turns.push(Turn::new(role, value.value(index)));
        }
        conversations.push(turns);
    }
    Ok(conversations)
}

fn string_field(structs: &StructArray, name: &str, origin: &str) -> Result<LargeStringArray> {
    let column = structs.column_by_name(name).ok_or_else(|| {
        ChatterError::serialization(origin, format!("turn struct is missing field `{}`", name))
    })?;

    if !matches!(
        column.data_type(),
        DataType::Utf8 | DataType::LargeUtf8 | DataType::Utf8View
    ) {
        return Err(ChatterError::serialization(
            origin,
            format!("turn field `{}` has type {}, expected a string", name, column.data_type()),
        ));
    }

    let utf8 = cast(column, &DataType::LargeUtf8)
        .map_err(|e| ChatterError::serialization(origin, e.to_string()))?;
    utf8.as_string_opt::<i64>()
        .cloned()
        .ok_or_else(|| ChatterError::internal(format!("cast of `{}` did not yield LargeUtf8", name)))
}

/// Writes `batch` to `path` as a Parquet file, replacing it atomically.
pub fn write_batch(path: &Path, batch: &RecordBatch) -> Result<()> {
    let props = WriterProperties::builder()
        .set_compression(Compression::SNAPPY)
        .build();

    atomic_write(path, |file| {
        let parquet_err =
            |e: parquet::errors::ParquetError| ChatterError::io(format!("Failed to write {}: {}", path.display(), e));

        let mut writer = ArrowWriter::try_new(file, batch.schema(), Some(props)).map_err(parquet_err)?;
        writer.write(batch).map_err(parquet_err)?;
        writer.into_inner().map_err(parquet_err)
    })
}

/// Reads every record batch stored in the Parquet file at `path`.
pub fn read_batches(path: &Path) -> Result<Vec<RecordBatch>> {
    let origin = path.display().to_string();
    let file = File::open(path)
        .map_err(|e| ChatterError::io(format!("Failed to open {}: {}", origin, e)))?;

    let reader = ParquetRecordBatchReaderBuilder::try_new(file)
        .and_then(|builder| builder.build())
        .map_err(|e| ChatterError::serialization(&origin, e.to_string()))?;

    reader
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| ChatterError::serialization(&origin, e.to_string()))
}

/// Reads and decodes all conversations stored under `column` in `path`.
pub fn read_conversations(path: &Path, column: &str) -> Result<Vec<Vec<Turn>>> {
    let origin = path.display().to_string();
    let mut conversations = Vec::new();
    for batch in read_batches(path)? {
        conversations.extend(decode(&batch, column, &origin)?);
    }
    Ok(conversations)
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{ListArray, StringArray};
    use parquet::basic::ZstdLevel;
    use tempfile::TempDir;

    fn sample() -> Vec<Turn> {
        vec![
            Turn::system_empty(),
            Turn::human("Hi"),
            Turn::assistant("Hello!"),
        ]
    }

    /// A `List<Struct<Utf8, Utf8>>` batch with one conversation.
    fn narrow_batch(roles: &[&str], texts: &[&str]) -> RecordBatch {
        let fields = Fields::from(vec![
            Field::new(FROM_FIELD, DataType::Utf8, false),
            Field::new(VALUE_FIELD, DataType::Utf8, false),
        ]);
        let structs = StructArray::try_new(
            fields.clone(),
            vec![
                Arc::new(StringArray::from(roles.to_vec())) as ArrayRef,
                Arc::new(StringArray::from(texts.to_vec())) as ArrayRef,
            ],
            None,
        )
        .unwrap();
        let item = Arc::new(Field::new(ITEM_FIELD, DataType::Struct(fields), false));
        let list = ListArray::try_new(
            item.clone(),
            OffsetBuffer::from_lengths([roles.len()]),
            Arc::new(structs),
            None,
        )
        .unwrap();
        let schema = Schema::new(vec![Field::new(CONVERSATION_COLUMN, DataType::List(item), false)]);
        RecordBatch::try_new(Arc::new(schema), vec![Arc::new(list) as ArrayRef]).unwrap()
    }

    /// The nullable large-offset layout dataframe libraries write by default.
    fn dataframe_batch(roles: &[&str], texts: &[&str]) -> RecordBatch {
        let fields = Fields::from(vec![
            Field::new(FROM_FIELD, DataType::LargeUtf8, true),
            Field::new(VALUE_FIELD, DataType::LargeUtf8, true),
        ]);
        let structs = StructArray::try_new(
            fields.clone(),
            vec![
                Arc::new(LargeStringArray::from(roles.to_vec())) as ArrayRef,
                Arc::new(LargeStringArray::from(texts.to_vec())) as ArrayRef,
            ],
            None,
        )
        .unwrap();
        let item = Arc::new(Field::new(ITEM_FIELD, DataType::Struct(fields), true));
        let list = LargeListArray::try_new(
            item.clone(),
            OffsetBuffer::from_lengths([roles.len()]),
            Arc::new(structs),
            None,
        )
        .unwrap();
        let schema = Schema::new(vec![Field::new(
            CONVERSATION_COLUMN,
            DataType::LargeList(item),
            true,
        )]);
        RecordBatch::try_new(Arc::new(schema), vec![Arc::new(list) as ArrayRef]).unwrap()
    }

    #[test]
    fn test_encode_layout() {
        let first = sample();
        let second = vec![Turn::system_empty()];
        let batch = encode(&[&first, &second], AGGREGATE_COLUMN).unwrap();

        assert_eq!(batch.num_rows(), 2);
        let schema = batch.schema();
        assert_eq!(schema.field(0).name(), AGGREGATE_COLUMN);
        assert!(matches!(schema.field(0).data_type(), DataType::LargeList(_)));
        assert_eq!(
            decode(&batch, AGGREGATE_COLUMN, "memory").unwrap(),
            vec![first, second]
        );
    }

    #[test]
    fn test_encode_multi_turn_conversations() {
        let conversations: Vec<Vec<Turn>> = (0..3)
            .map(|n| {
                let mut turns = sample();
                turns.push(Turn::human(format!("follow-up {}", n)));
                turns
            })
            .collect();

        let batch = encode(&conversations, AGGREGATE_COLUMN).unwrap();

        assert_eq!(batch.num_rows(), 3);
        assert_eq!(decode(&batch, AGGREGATE_COLUMN, "memory").unwrap(), conversations);
    }

    #[test]
    fn test_decode_rejects_wrong_column_name() {
        let batch = encode(&[&sample()], AGGREGATE_COLUMN).unwrap();
        let err = decode(&batch, CONVERSATION_COLUMN, "conversation_1.parquet").unwrap_err();
        assert!(err.is_serialization());
        assert_eq!(err.origin(), Some("conversation_1.parquet"));
    }

    #[test]
    fn test_decode_rejects_unknown_role() {
        let batch = narrow_batch(&["system", "narrator"], &["", "Once upon a time"]);

        let err = decode(&batch, CONVERSATION_COLUMN, "x").unwrap_err();
        assert!(err.to_string().contains("narrator"));
    }

    #[test]
    fn test_decode_accepts_narrow_list_and_gpt_role() {
        let batch = narrow_batch(&["system", "human", "gpt"], &["", "Hi", "Hello!"]);
        assert_eq!(decode(&batch, CONVERSATION_COLUMN, "x").unwrap(), vec![sample()]);
    }

    #[test]
    fn test_reads_zstd_dataframe_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("conversation_0.parquet");
        let batch = dataframe_batch(&["system", "human", "gpt"], &["", "Hi", "Hello!"]);

        let props = WriterProperties::builder()
            .set_compression(Compression::ZSTD(ZstdLevel::default()))
            .build();
        let file = File::create(&path).unwrap();
        let mut writer = ArrowWriter::try_new(file, batch.schema(), Some(props)).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();

        assert_eq!(
            read_conversations(&path, CONVERSATION_COLUMN).unwrap(),
            vec![sample()]
        );
    }

    #[test]
    fn test_parquet_file_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("conversation_0.parquet");
        let conversation = sample();

        write_batch(&path, &encode(&[&conversation], CONVERSATION_COLUMN).unwrap()).unwrap();

        assert_eq!(
            read_conversations(&path, CONVERSATION_COLUMN).unwrap(),
            vec![conversation]
        );
    }

    #[test]
    fn test_garbage_file_is_serialization_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("conversation_0.parquet");
        std::fs::write(&path, b"definitely not parquet").unwrap();

        let err = read_conversations(&path, CONVERSATION_COLUMN).unwrap_err();
        assert!(err.is_serialization());
        assert_eq!(err.origin(), Some(path.display().to_string().as_str()));
    }
}
