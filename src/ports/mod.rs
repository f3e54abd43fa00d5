//! Ports - Interfaces between the application and infrastructure.
//!
//! - `RecordStore` / `RecordStoreTransaction` - transactional write side
//! - `FocusAreaReader` - read side for queries

mod focus_area_reader;
mod record_store;

pub use focus_area_reader::FocusAreaReader;
pub use record_store::{RecordStore, RecordStoreTransaction};
