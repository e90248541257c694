use super::model::RawSampleTable;

/// Read a numeric metadata field from the first row of `table`.
///
/// Falls back to `default` when the column is missing, has no rows, holds a
/// value that does not parse as a number, or holds zero. A zero is read as
/// "not provided" rather than as a measured value. Null and non-finite values
/// are treated the same way.
pub fn extract_or_default(table: &RawSampleTable, column: &str, default: f64) -> f64 {
    table
        .first(column)
        .and_then(|value| value.as_f64())
        .filter(|v| *v != 0.0 && v.is_finite())
        .unwrap_or(default)
}
