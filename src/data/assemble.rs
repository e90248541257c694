use std::path::Path;

use chrono::{DateTime, NaiveDate, NaiveDateTime};

use super::discover::{DiscoverSources, FsDiscovery};
use super::error::PipelineError;
use super::loader::{FileLoader, LoadSource};
use super::model::{Dataset, SampleRecord};
use super::record::build_record;
use crate::config::Config;

const DATETIME_FORMATS: [&str; 7] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y%m%dT%H%M%S",
    "%Y%m%d%H%M%S",
];

/// ISO date-times with a numeric offset, colon optional (`+0200`, `+02:00`).
const OFFSET_DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f%z", "%Y-%m-%d %H:%M:%S%.f%z"];

const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%Y/%m/%d", "%Y%m%d"];

/// Build the dataset from the sample exports under `config.data.root`.
///
/// Runs the whole pipeline once; nothing is cached between calls.
pub fn initialize(config: &Config) -> Result<Dataset, PipelineError> {
    assemble(&FsDiscovery::default(), &FileLoader, &config.data.root)
}

/// Discover, load, build, dedup and date-normalize every sample under `root`.
///
/// Any source that fails to load aborts the run, as does a present date that
/// cannot be read.
pub fn assemble<D, L>(discovery: &D, loader: &L, root: &Path) -> Result<Dataset, PipelineError>
where
    D: DiscoverSources + ?Sized,
    L: LoadSource + ?Sized,
{
    let paths = discovery.discover(root)?;

    let mut records = Vec::with_capacity(paths.len());
    for path in &paths {
        let source = loader
            .load(path)
            .map_err(|source| PipelineError::SourceLoad {
                path: path.clone(),
                source,
            })?;
        let fields: Vec<String> = source
            .metadata
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect();
        log::debug!("{path}: {} objects, {}", source.object_count, fields.join(" "));
        records.push(build_record(&source.table, source.object_count, path)?);
    }

    let built = records.len();
    let mut records = dedup_keep_last(records);
    if records.len() < built {
        log::info!("Dropped {} duplicate records", built - records.len());
    }

    normalize_dates(&mut records)?;

    log::info!("Assembled {} records from {} sources", records.len(), paths.len());
    Ok(Dataset::from_records(records))
}

/// Drop every record that equals a later one, so the last of each group of
/// identical records survives in its own position.
pub fn dedup_keep_last(records: Vec<SampleRecord>) -> Vec<SampleRecord> {
    let keep: Vec<bool> = records
        .iter()
        .enumerate()
        .map(|(n, rec)| !records[n + 1..].contains(rec))
        .collect();

    records
        .into_iter()
        .zip(keep)
        .filter_map(|(rec, keep)| keep.then_some(rec))
        .collect()
}

/// Rewrite every present date as `YYYY-MM-DD`.
pub fn normalize_dates(records: &mut [SampleRecord]) -> Result<(), PipelineError> {
    for rec in records.iter_mut() {
        if let Some(raw) = rec.date.as_deref() {
            let date = normalize_date(raw).ok_or_else(|| PipelineError::DateNormalization {
                filename: rec.filename.clone(),
                value: raw.to_string(),
            })?;
            rec.date = Some(date);
        }
    }
    Ok(())
}

/// Calendar date of a timestamp, formatted `YYYY-MM-DD`.
///
/// Offsets are kept as written: the date is the local date of the timestamp.
pub fn normalize_date(raw: &str) -> Option<String> {
    parse_date(raw.trim()).map(|d| d.format("%Y-%m-%d").to_string())
}

fn parse_date(s: &str) -> Option<NaiveDate> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }
    if let Some(dt) = OFFSET_DATETIME_FORMATS
        .iter()
        .find_map(|f| DateTime::parse_from_str(s, f).ok())
    {
        return Some(dt.date_naive());
    }
    if let Some(dt) = DATETIME_FORMATS
        .iter()
        .find_map(|f| NaiveDateTime::parse_from_str(s, f).ok())
    {
        return Some(dt.date());
    }
    DATE_FORMATS
        .iter()
        .find_map(|f| NaiveDate::parse_from_str(s, f).ok())
}
