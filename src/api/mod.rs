//! Purpose: Define the stable public Rust API boundary for cinedex.
//! Exports: Record, store, query, statistics, and error types.
//! Role: Public, additive-only surface; hides the internal core modules.
//! Invariants: This module is the only public path to core types.
//! Invariants: Nothing exported here can mutate a loaded record store.

#[doc(hidden)]
pub use crate::core::error::to_exit_code;
pub use crate::core::csv::{FIELD_COUNT, RowError, parse_row, split_fields};
pub use crate::core::error::{Error, ErrorKind};
pub use crate::core::movie::Movie;
pub use crate::core::query::{DEFAULT_COUNT, QueryEngine};
pub use crate::core::stats::{LanguageCount, MovieStatistics, YearRange};
pub use crate::core::store::RecordStore;
