/// Data layer: table model, the per-file stages, and batch orchestration.
///
/// Architecture:
/// ```text
///   .csv / .xlsx upload
///        │
///        ▼
///   ┌──────────┐
///   │  loader  │  bytes → Table (ParseError per file)
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │ cleaner  │  duplicates / fill numeric nulls / drop null rows
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐      ┌─────────┐
///   │  select  │ ───▶ │  chart  │  first 5 rows, numeric columns
///   └──────────┘      └─────────┘
///        │
///        ▼
///   ┌──────────┐
///   │ convert  │  Table → CSV / XLSX bytes
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │ archive  │  all conversions → one ZIP
///   └──────────┘
/// ```
///
/// `pipeline` runs the stages per file and memoizes them through `cache`.

pub mod archive;
pub mod cache;
pub mod chart;
pub mod cleaner;
pub mod convert;
pub mod error;
pub mod loader;
pub mod model;
pub mod pipeline;
pub mod select;
