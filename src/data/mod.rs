//! Data layer: core types, loading, and filtering.
//!
//! Architecture:
//! ```text
//!  .parquet / .csv
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  loader   │  parse file → DataFrame, remap fuel codes
//!   └──────────┘
//!        │
//!        ▼
//!   ┌──────────┐
//!   │ DataFrame │  ordered named columns of Value cells
//!   └──────────┘
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  filter   │  classify columns, narrow sequentially
//!   └──────────┘
//! ```

pub mod filter;
pub mod frame;
pub mod loader;
