use std::io::Write;
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{ArrayRef, Float64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

use super::model::Dataset;

/// Output formats for the assembled dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ExportFormat {
    Csv,
    Json,
    Parquet,
}

/// Write the dataset with columns `filename, Objects/ml, date, lat, lon`.
pub fn write_dataset<W: Write + Send>(
    dataset: &Dataset,
    format: ExportFormat,
    writer: W,
) -> Result<()> {
    match format {
        ExportFormat::Csv => write_csv(dataset, writer),
        ExportFormat::Json => write_json(dataset, writer),
        ExportFormat::Parquet => write_parquet(dataset, writer),
    }
}

fn write_csv<W: Write>(dataset: &Dataset, writer: W) -> Result<()> {
    let mut out = csv::Writer::from_writer(writer);
    for record in dataset.records() {
        out.serialize(record).context("writing CSV row")?;
    }
    out.flush().context("flushing CSV output")?;
    Ok(())
}

fn write_json<W: Write>(dataset: &Dataset, mut writer: W) -> Result<()> {
    serde_json::to_writer_pretty(&mut writer, dataset.records()).context("writing JSON")?;
    writeln!(writer)?;
    Ok(())
}

fn write_parquet<W: Write + Send>(dataset: &Dataset, writer: W) -> Result<()> {
    let records = dataset.records();

    let schema = Arc::new(Schema::new(vec![
        Field::new("filename", DataType::Utf8, false),
        Field::new("Objects/ml", DataType::Float64, false),
        Field::new("date", DataType::Utf8, true),
        Field::new("lat", DataType::Float64, true),
        Field::new("lon", DataType::Float64, true),
    ]));

    let columns: Vec<ArrayRef> = vec![
        Arc::new(StringArray::from_iter_values(
            records.iter().map(|r| r.filename.as_str()),
        )),
        Arc::new(Float64Array::from_iter_values(
            records.iter().map(|r| r.concentration),
        )),
        Arc::new(StringArray::from(
            records.iter().map(|r| r.date.as_deref()).collect::<Vec<_>>(),
        )),
        Arc::new(Float64Array::from(
            records.iter().map(|r| r.lat).collect::<Vec<_>>(),
        )),
        Arc::new(Float64Array::from(
            records.iter().map(|r| r.lon).collect::<Vec<_>>(),
        )),
    ];

    let batch = RecordBatch::try_new(schema.clone(), columns).context("building record batch")?;
    let mut out = ArrowWriter::try_new(writer, schema, None).context("creating parquet writer")?;
    out.write(&batch).context("writing parquet batch")?;
    out.close().context("closing parquet writer")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::SampleRecord;
    use bytes::Bytes;
    use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

    fn dataset() -> Dataset {
        Dataset::from_records(vec![
            SampleRecord {
                filename: "sample_001.tsv".into(),
                concentration: 0.5,
                date: Some("2023-07-04".into()),
                lat: Some(43.5),
                lon: Some(7.25),
            },
            SampleRecord {
                filename: "sample_002.tsv".into(),
                concentration: 1.0,
                date: None,
                lat: None,
                lon: None,
            },
        ])
    }

    #[test]
    fn test_csv_columns() {
        let mut buf = Vec::new();
        write_dataset(&dataset(), ExportFormat::Csv, &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("filename,Objects/ml,date,lat,lon"));
        assert_eq!(lines.next(), Some("sample_001.tsv,0.5,2023-07-04,43.5,7.25"));
        assert_eq!(lines.next(), Some("sample_002.tsv,1.0,,,"));
    }

    #[test]
    fn test_json_records() {
        let mut buf = Vec::new();
        write_dataset(&dataset(), ExportFormat::Json, &mut buf).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&buf).unwrap();
        assert_eq!(value[0]["Objects/ml"], 0.5);
        assert!(value[1]["date"].is_null());
    }

    #[test]
    fn test_parquet_rows() {
        let mut buf = Vec::new();
        write_dataset(&dataset(), ExportFormat::Parquet, &mut buf).unwrap();
        let reader = ParquetRecordBatchReaderBuilder::try_new(Bytes::from(buf))
            .unwrap()
            .build()
            .unwrap();
        let rows: usize = reader.map(|b| b.unwrap().num_rows()).sum();
        assert_eq!(rows, 2);
    }
}
