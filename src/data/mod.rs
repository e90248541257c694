/// Data layer: sample loading, record derivation and dataset assembly.
///
/// Architecture:
/// ```text
///  <root>/**/*.tsv, <root>/**/*.zip:<member>.tsv
///        │
///        ▼
///   ┌──────────┐
///   │ discover  │  root → ordered source paths
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  path → RawSampleTable + object count
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  record   │  table → SampleRecord (extract: defaulted volumes)
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │ assemble  │  dedup (keep last) → YYYY-MM-DD dates → Dataset
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  export   │  Dataset → csv / json / parquet
///   └──────────┘
/// ```

pub mod assemble;
pub mod discover;
pub mod error;
pub mod export;
pub mod extract;
pub mod loader;
pub mod model;
pub mod record;
