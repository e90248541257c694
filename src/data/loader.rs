use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use arrow::array::{Array, ArrayRef, AsArray};
use arrow::datatypes::{DataType, Float32Type, Float64Type, Int32Type, Int64Type};
use bytes::Bytes;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;
use zip::ZipArchive;

use super::error::LoadError;
use super::model::{MetadataValue, RawSampleTable, SampleSource};

/// Column prefixes copied into [`SampleSource::metadata`].
const METADATA_PREFIXES: [&str; 3] = ["acq_", "sample_", "process_"];

/// Marker between an archive path and the member it addresses.
pub const ARCHIVE_SEPARATOR: &str = ".zip:";

// ---------------------------------------------------------------------------
// Loader seam
// ---------------------------------------------------------------------------

/// Turns one discovered source path into a loaded sample.
pub trait LoadSource {
    fn load(&self, path: &str) -> Result<SampleSource, LoadError>;
}

/// Loads sources from the local filesystem, including zip archive members.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileLoader;

impl LoadSource for FileLoader {
    fn load(&self, path: &str) -> Result<SampleSource, LoadError> {
        load_source(path)
    }
}

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load one sample source.  Dispatch by extension.
///
/// `path` is either a plain file path or `<archive>.zip:<member>`.
///
/// Supported formats:
/// * `.tsv`     – tab separated export, optional `[t]`/`[f]` type row
/// * `.csv`     – comma separated, same layout
/// * `.json`    – `[{ "object_id": ..., "acq_imaged_volume": ... }, ...]`
/// * `.parquet` – one row per object, scalar columns
pub fn load_source(path: &str) -> Result<SampleSource, LoadError> {
    let (bytes, name) = match split_archive_path(path) {
        Some((archive, member)) => (read_archive_member(archive, member)?, member),
        None => (std::fs::read(path)?, path),
    };

    let table = parse_table(&extension(name), bytes)?;
    log::debug!(
        "Loaded {path}: {} rows, {} columns",
        table.len(),
        table.column_names().len()
    );
    Ok(into_source(table))
}

/// Split `dir/archive.zip:member.tsv` into `("dir/archive.zip", "member.tsv")`.
///
/// The `.zip` extension matches in any case, as in discovery.
pub fn split_archive_path(path: &str) -> Option<(&str, &str)> {
    let idx = path.to_ascii_lowercase().find(ARCHIVE_SEPARATOR)?;
    let archive_end = idx + ".zip".len();
    Some((&path[..archive_end], &path[idx + ARCHIVE_SEPARATOR.len()..]))
}

fn read_archive_member(archive: &str, member: &str) -> Result<Vec<u8>, LoadError> {
    let file = File::open(archive)?;
    let mut archive = ZipArchive::new(BufReader::new(file))?;
    let mut entry = archive.by_name(member)?;
    let mut buf = Vec::new();
    entry.read_to_end(&mut buf)?;
    Ok(buf)
}

fn extension(name: &str) -> String {
    Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase()
}

fn parse_table(ext: &str, bytes: Vec<u8>) -> Result<RawSampleTable, LoadError> {
    match ext {
        "tsv" | "txt" => parse_delimited(&bytes, b'\t'),
        "csv" => parse_delimited(&bytes, b','),
        "json" => parse_json(&bytes),
        "parquet" | "pq" => parse_parquet(Bytes::from(bytes)),
        other => Err(LoadError::UnsupportedExtension(other.to_string())),
    }
}

/// Every object row counts as one detected object.
fn into_source(table: RawSampleTable) -> SampleSource {
    let metadata: BTreeMap<String, MetadataValue> = table
        .column_names()
        .iter()
        .filter(|c| METADATA_PREFIXES.iter().any(|p| c.starts_with(*p)))
        .filter_map(|c| table.first(c).map(|v| (c.clone(), v.clone())))
        .collect();

    SampleSource {
        object_count: table.len(),
        metadata,
        table,
    }
}

// ---------------------------------------------------------------------------
// TSV / CSV loader
// ---------------------------------------------------------------------------

/// Header row with column names, one object per following row.
/// A second line made only of `[t]` / `[f]` markers (import format) is skipped.
fn parse_delimited(bytes: &[u8], delimiter: u8) -> Result<RawSampleTable, LoadError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .has_headers(true)
        .from_reader(bytes);

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    if headers.iter().all(|h| h.is_empty()) {
        return Err(LoadError::InvalidFormat("missing header row".to_string()));
    }

    let mut rows: Vec<Vec<MetadataValue>> = Vec::new();
    for (row_no, result) in reader.records().enumerate() {
        let record = result?;
        if row_no == 0 && is_type_row(&record) {
            continue;
        }
        rows.push(record.iter().map(guess_metadata_type).collect());
    }

    Ok(RawSampleTable::from_rows(headers, rows))
}

fn is_type_row(record: &csv::StringRecord) -> bool {
    !record.is_empty()
        && record
            .iter()
            .all(|cell| matches!(cell.trim(), "[t]" | "[f]"))
}

fn guess_metadata_type(s: &str) -> MetadataValue {
    let s = s.trim();
    if s.is_empty() {
        return MetadataValue::Null;
    }
    if let Ok(i) = s.parse::<i64>() {
        return MetadataValue::Integer(i);
    }
    if let Ok(f) = s.parse::<f64>() {
        return MetadataValue::Float(f);
    }
    if s == "true" || s == "false" {
        return MetadataValue::Bool(s == "true");
    }
    MetadataValue::String(s.to_string())
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Records-oriented JSON (`df.to_json(orient='records')`):
///
/// ```json
/// [
///   { "object_id": "a1", "object_lat": 43.6, "acq_imaged_volume": 2.5 },
///   ...
/// ]
/// ```
///
/// Columns are the union of keys, in the order they first appear.
fn parse_json(bytes: &[u8]) -> Result<RawSampleTable, LoadError> {
    let root: JsonValue = serde_json::from_slice(bytes)?;
    let records = root
        .as_array()
        .ok_or_else(|| LoadError::InvalidFormat("expected top-level JSON array".to_string()))?;

    let mut columns: Vec<String> = Vec::new();
    for (i, rec) in records.iter().enumerate() {
        let obj = rec
            .as_object()
            .ok_or_else(|| LoadError::InvalidFormat(format!("row {i} is not a JSON object")))?;
        for key in obj.keys() {
            if !columns.contains(key) {
                columns.push(key.clone());
            }
        }
    }

    let rows: Vec<Vec<MetadataValue>> = records
        .iter()
        .filter_map(JsonValue::as_object)
        .map(|obj| {
            columns
                .iter()
                .map(|c| obj.get(c).map(json_to_metadata).unwrap_or(MetadataValue::Null))
                .collect::<Vec<_>>()
        })
        .collect();

    Ok(RawSampleTable::from_rows(columns, rows))
}

fn json_to_metadata(val: &JsonValue) -> MetadataValue {
    match val {
        JsonValue::String(s) => MetadataValue::String(s.clone()),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                MetadataValue::Integer(i)
            } else if let Some(f) = n.as_f64() {
                MetadataValue::Float(f)
            } else {
                MetadataValue::String(n.to_string())
            }
        }
        JsonValue::Bool(b) => MetadataValue::Bool(*b),
        JsonValue::Null => MetadataValue::Null,
        other => MetadataValue::String(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// One row per object, scalar columns only (strings, ints, floats, bools).
/// Works with files written by both Pandas and Polars.
fn parse_parquet(bytes: Bytes) -> Result<RawSampleTable, LoadError> {
    let builder = ParquetRecordBatchReaderBuilder::try_new(bytes)?;
    let columns: Vec<String> = builder
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();
    let reader = builder.build()?;

    let mut rows: Vec<Vec<MetadataValue>> = Vec::new();
    for batch_result in reader {
        let batch = batch_result?;
        for row in 0..batch.num_rows() {
            rows.push(
                batch
                    .columns()
                    .iter()
                    .map(|col| extract_metadata_value(col, row))
                    .collect(),
            );
        }
    }

    Ok(RawSampleTable::from_rows(columns, rows))
}

/// Extract a single cell from an Arrow column at a given row.
fn extract_metadata_value(col: &ArrayRef, row: usize) -> MetadataValue {
    if col.is_null(row) {
        return MetadataValue::Null;
    }
    match col.data_type() {
        DataType::Utf8 => MetadataValue::String(col.as_string::<i32>().value(row).to_string()),
        DataType::LargeUtf8 => {
            MetadataValue::String(col.as_string::<i64>().value(row).to_string())
        }
        DataType::Int32 => MetadataValue::Integer(col.as_primitive::<Int32Type>().value(row) as i64),
        DataType::Int64 => MetadataValue::Integer(col.as_primitive::<Int64Type>().value(row)),
        DataType::Float32 => {
            MetadataValue::Float(col.as_primitive::<Float32Type>().value(row) as f64)
        }
        DataType::Float64 => MetadataValue::Float(col.as_primitive::<Float64Type>().value(row)),
        DataType::Boolean => MetadataValue::Bool(col.as_boolean().value(row)),
        other => MetadataValue::String(format!("{other:?}")),
    }
}
