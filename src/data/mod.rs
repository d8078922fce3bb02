/// Data layer: buoy table types, loading, filtering and projection.
///
/// Architecture:
/// ```text
///  .csv (URL or file) / .json / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  fetch, trim column names, parse Date → Dataset
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  date, then Appr_depth → new Dataset
///   └──────────┘
///        │
///        ├──────────────────┬──────────────────┐
///        ▼                  ▼                  ▼
///   ┌────────────┐   ┌────────────┐   ┌──────────┐
///   │ projection │   │ GridLayer  │   │ summary  │
///   │ + position │   │ descriptor │   │ avg Temp │
///   └────────────┘   └────────────┘   └──────────┘
/// ```

pub mod filter;
pub mod loader;
pub mod model;
pub mod projection;
pub mod summary;
