use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

// ---------------------------------------------------------------------------
// MetadataValue – a single cell in a sample table
// ---------------------------------------------------------------------------

/// A dynamically-typed cell value as found in sample export tables.
#[derive(Debug, Clone, PartialEq)]
pub enum MetadataValue {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    Null,
}

impl fmt::Display for MetadataValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetadataValue::String(s) => write!(f, "{s}"),
            MetadataValue::Integer(i) => write!(f, "{i}"),
            MetadataValue::Float(v) => write!(f, "{v}"),
            MetadataValue::Bool(b) => write!(f, "{b}"),
            MetadataValue::Null => Ok(()),
        }
    }
}

impl MetadataValue {
    /// Interpret the value as an `f64`.
    ///
    /// Numeric strings are parsed after trimming, booleans count as 1/0.
    /// `Null` and anything unparsable yield `None`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            MetadataValue::Float(v) => Some(*v),
            MetadataValue::Integer(i) => Some(*i as f64),
            MetadataValue::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            MetadataValue::String(s) => s.trim().parse::<f64>().ok(),
            MetadataValue::Null => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, MetadataValue::Null)
    }
}

// ---------------------------------------------------------------------------
// RawSampleTable – one sample export, column oriented
// ---------------------------------------------------------------------------

/// A loosely-structured table of named columns, one per sample export.
///
/// Every column holds the same number of rows. Column order follows the
/// source header.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawSampleTable {
    columns: Vec<String>,
    cells: BTreeMap<String, Vec<MetadataValue>>,
    n_rows: usize,
}

impl RawSampleTable {
    /// Build a table from a header and row-major values.
    ///
    /// Short rows are padded with `Null`, extra cells are dropped.
    pub fn from_rows(columns: Vec<String>, rows: Vec<Vec<MetadataValue>>) -> Self {
        let n_rows = rows.len();
        let mut cells: BTreeMap<String, Vec<MetadataValue>> = columns
            .iter()
            .map(|c| (c.clone(), Vec::with_capacity(n_rows)))
            .collect();

        for row in rows {
            let mut row = row.into_iter();
            for col in &columns {
                let value = row.next().unwrap_or(MetadataValue::Null);
                if let Some(values) = cells.get_mut(col) {
                    values.push(value);
                }
            }
        }

        RawSampleTable {
            columns,
            cells,
            n_rows,
        }
    }

    /// Column names in header order.
    pub fn column_names(&self) -> &[String] {
        &self.columns
    }

    /// All values of a column, `None` when the column does not exist.
    pub fn column(&self, name: &str) -> Option<&[MetadataValue]> {
        self.cells.get(name).map(Vec::as_slice)
    }

    /// First-row value of a column. `None` if the column is missing or empty.
    pub fn first(&self, name: &str) -> Option<&MetadataValue> {
        self.column(name).and_then(|values| values.first())
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.n_rows
    }
}

// ---------------------------------------------------------------------------
// SampleSource – what the loader hands to the assembler
// ---------------------------------------------------------------------------

/// One loaded sample export.
#[derive(Debug, Clone)]
pub struct SampleSource {
    pub table: RawSampleTable,
    /// Number of detected objects (object rows) in the export.
    pub object_count: usize,
    /// First-row values of the acquisition / sample / process columns.
    pub metadata: BTreeMap<String, MetadataValue>,
}

// ---------------------------------------------------------------------------
// SampleRecord – one point on the map
// ---------------------------------------------------------------------------

/// The normalized per-sample record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SampleRecord {
    pub filename: String,
    /// Objects per millilitre.
    #[serde(rename = "Objects/ml")]
    pub concentration: f64,
    pub date: Option<String>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
}

// ---------------------------------------------------------------------------
// Dataset – the assembled, deduplicated records
// ---------------------------------------------------------------------------

/// Ordered records, discovery order after dedup.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    records: Vec<SampleRecord>,
}

impl Dataset {
    pub fn from_records(records: Vec<SampleRecord>) -> Self {
        Dataset { records }
    }

    pub fn records(&self) -> &[SampleRecord] {
        &self.records
    }

    /// Record at `index`, `None` when out of range.
    pub fn get(&self, index: usize) -> Option<&SampleRecord> {
        self.records.get(index)
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the dataset is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Smallest and largest concentration, `None` for an empty dataset.
    pub fn concentration_range(&self) -> Option<(f64, f64)> {
        let mut values = self.records.iter().map(|r| r.concentration);
        let first = values.next()?;
        Some(values.fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v))))
    }
}

impl std::ops::Index<usize> for Dataset {
    type Output = SampleRecord;

    fn index(&self, index: usize) -> &SampleRecord {
        &self.records[index]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(v: &str) -> MetadataValue {
        MetadataValue::String(v.to_string())
    }

    #[test]
    fn test_as_f64_variants() {
        assert_eq!(MetadataValue::Integer(3).as_f64(), Some(3.0));
        assert_eq!(MetadataValue::Float(2.5).as_f64(), Some(2.5));
        assert_eq!(s(" 4.25 ").as_f64(), Some(4.25));
        assert_eq!(MetadataValue::Bool(true).as_f64(), Some(1.0));
        assert_eq!(s("abc").as_f64(), None);
        assert_eq!(MetadataValue::Null.as_f64(), None);
    }

    #[test]
    fn test_display_null_is_blank() {
        assert_eq!(MetadataValue::Null.to_string(), "");
        assert_eq!(MetadataValue::Float(2.5).to_string(), "2.5");
    }

    #[test]
    fn test_table_from_rows_pads_short_rows() {
        let table = RawSampleTable::from_rows(
            vec!["a".into(), "b".into()],
            vec![vec![s("1"), s("2")], vec![s("3")]],
        );
        assert_eq!(table.len(), 2);
        assert_eq!(table.column("b").map(|c| c.len()), Some(2));
        assert_eq!(table.column("b").map(|c| c[1].clone()), Some(MetadataValue::Null));
        assert_eq!(table.first("a"), Some(&s("1")));
        assert!(table.first("missing").is_none());
    }

    #[test]
    fn test_empty_table_has_no_first_value() {
        let table = RawSampleTable::from_rows(vec!["a".into()], vec![]);
        assert!(table.column("a").is_some());
        assert_eq!(table.len(), 0);
        assert!(table.first("a").is_none());
    }

    #[test]
    fn test_concentration_range() {
        let rec = |c: f64| SampleRecord {
            filename: "f".into(),
            concentration: c,
            date: None,
            lat: None,
            lon: None,
        };
        let ds = Dataset::from_records(vec![rec(3.0), rec(1.0), rec(2.0)]);
        assert_eq!(ds.concentration_range(), Some((1.0, 3.0)));
        assert_eq!(Dataset::default().concentration_range(), None);
    }
}
