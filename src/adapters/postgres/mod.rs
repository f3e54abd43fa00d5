//! PostgreSQL adapters - Database implementations for the store and reader ports.
//!
//! - `PostgresRecordStore` - Transactional writes with row-level focus-area locks
//! - `PostgresFocusAreaReader` - Read-side queries
//!
//! The schema lives in `migrations/`.

mod focus_area_reader;
mod record_store;
mod rows;

pub use focus_area_reader::PostgresFocusAreaReader;
pub use record_store::{PostgresRecordStore, PostgresTransaction};
