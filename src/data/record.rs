use super::error::PipelineError;
use super::extract::extract_or_default;
use super::model::{MetadataValue, RawSampleTable, SampleRecord};

// Metadata columns of the per-sample export.
pub const IMAGED_VOLUME: &str = "acq_imaged_volume";
pub const DILUTION_FACTOR: &str = "sample_dilution_factor";
pub const CONCENTRATED_SAMPLE_VOLUME: &str = "sample_concentrated_sample_volume";
pub const TOTAL_SAMPLE_VOLUME: &str = "sample_total_volume";
pub const DATETIME: &str = "acq_local_datetime";
pub const LATITUDE: &str = "object_lat";
pub const LONGITUDE: &str = "object_lon";

/// Separator between an archive and one of its members in a source path.
const ARCHIVE_QUALIFIER: &str = "zip:";

/// Sample identifier for a source path: the last path segment with any
/// `archive.zip:` qualifier removed, whatever the case of `zip`.
pub fn source_filename(source_path: &str) -> &str {
    let base = source_path
        .rsplit(|c: char| c == '/' || c == '\\')
        .next()
        .unwrap_or(source_path);
    match base.to_ascii_lowercase().rfind(ARCHIVE_QUALIFIER) {
        Some(idx) => &base[idx + ARCHIVE_QUALIFIER.len()..],
        None => base,
    }
}

/// Objects per millilitre.
///
/// The total sample volume is scaled by 1000 against the concentrated volume.
pub fn concentration(
    object_count: usize,
    imaged_volume: f64,
    dilution_factor: f64,
    concentrated_sample_volume: f64,
    total_sample_volume: f64,
) -> f64 {
    (object_count as f64 / imaged_volume)
        * dilution_factor
        * (concentrated_sample_volume / (total_sample_volume * 1000.0))
}

/// Build the normalized record of one sample.
///
/// Only fails when the concentration comes out infinite or NaN.
pub fn build_record(
    table: &RawSampleTable,
    object_count: usize,
    source_path: &str,
) -> Result<SampleRecord, PipelineError> {
    let filename = source_filename(source_path).to_string();

    let imaged_volume = extract_or_default(table, IMAGED_VOLUME, 1.0);
    let dilution_factor = extract_or_default(table, DILUTION_FACTOR, 1.0);
    let concentrated = extract_or_default(table, CONCENTRATED_SAMPLE_VOLUME, 1.0);
    let total = extract_or_default(table, TOTAL_SAMPLE_VOLUME, 1.0);

    let value = concentration(object_count, imaged_volume, dilution_factor, concentrated, total);
    if !value.is_finite() {
        return Err(PipelineError::NonFiniteConcentration { filename, value });
    }

    Ok(SampleRecord {
        filename,
        concentration: value,
        date: first_present(table, DATETIME).map(|v| v.to_string()),
        lat: first_present(table, LATITUDE).and_then(MetadataValue::as_f64),
        lon: first_present(table, LONGITUDE).and_then(MetadataValue::as_f64),
    })
}

fn first_present<'a>(table: &'a RawSampleTable, column: &str) -> Option<&'a MetadataValue> {
    table.first(column).filter(|v| !v.is_null())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(pairs: &[(&str, MetadataValue)]) -> RawSampleTable {
        RawSampleTable::from_rows(
            pairs.iter().map(|(c, _)| c.to_string()).collect(),
            vec![pairs.iter().map(|(_, v)| v.clone()).collect()],
        )
    }

    #[test]
    fn test_filename_strips_archive_qualifier() {
        assert_eq!(source_filename("archive.zip:sample_001.tsv"), "sample_001.tsv");
        assert_eq!(
            source_filename("/data/export/archive.zip:sample_001.tsv"),
            "sample_001.tsv"
        );
        assert_eq!(source_filename("/data/export/sample_002.tsv"), "sample_002.tsv");
        assert_eq!(source_filename("sample_003.tsv"), "sample_003.tsv");
        assert_eq!(source_filename("/data/export/CRUISE.ZIP:s1.tsv"), "s1.tsv");
    }

    #[test]
    fn test_concentration_example() {
        let c = concentration(100, 10.0, 2.0, 5.0, 25.0);
        assert!((c - 0.004).abs() < 1e-12);
    }

    #[test]
    fn test_build_record_derives_concentration() {
        let t = table(&[
            (IMAGED_VOLUME, MetadataValue::Float(10.0)),
            (DILUTION_FACTOR, MetadataValue::Integer(2)),
            (CONCENTRATED_SAMPLE_VOLUME, MetadataValue::String("5".into())),
            (TOTAL_SAMPLE_VOLUME, MetadataValue::Float(25.0)),
            (DATETIME, MetadataValue::String("2023-07-04T10:15:00".into())),
            (LATITUDE, MetadataValue::Float(43.68)),
            (LONGITUDE, MetadataValue::Float(7.32)),
        ]);
        let rec = build_record(&t, 100, "exports/a.zip:sample_001.tsv").unwrap();
        assert_eq!(rec.filename, "sample_001.tsv");
        assert!((rec.concentration - 0.004).abs() < 1e-12);
        assert_eq!(rec.date.as_deref(), Some("2023-07-04T10:15:00"));
        assert_eq!(rec.lat, Some(43.68));
        assert_eq!(rec.lon, Some(7.32));
    }

    #[test]
    fn test_build_record_defaults_missing_volumes() {
        let t = table(&[("object_id", MetadataValue::String("o1".into()))]);
        let rec = build_record(&t, 50, "sample.tsv").unwrap();
        // 50 / 1 * 1 * (1 / 1000)
        assert!((rec.concentration - 0.05).abs() < 1e-12);
        assert_eq!(rec.date, None);
        assert_eq!(rec.lat, None);
        assert_eq!(rec.lon, None);
    }

    #[test]
    fn test_null_location_is_absent() {
        let t = table(&[
            (LATITUDE, MetadataValue::Null),
            (LONGITUDE, MetadataValue::String("east".into())),
            (DATETIME, MetadataValue::Null),
        ]);
        let rec = build_record(&t, 1, "s.tsv").unwrap();
        assert_eq!(rec.lat, None);
        assert_eq!(rec.lon, None);
        assert_eq!(rec.date, None);
    }

    #[test]
    fn test_overflowing_concentration_is_flagged() {
        let t = table(&[(TOTAL_SAMPLE_VOLUME, MetadataValue::Float(1e-320))]);
        let err = build_record(&t, 10, "tiny.tsv").unwrap_err();
        assert!(matches!(
            err,
            PipelineError::NonFiniteConcentration { ref filename, .. } if filename == "tiny.tsv"
        ));
    }
}
