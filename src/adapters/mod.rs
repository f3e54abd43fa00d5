//! Adapters - Infrastructure implementations of ports.
//!
//! - `http` - axum REST surface
//! - `memory` - in-memory store for tests and local runs
//! - `postgres` - PostgreSQL store and reader

pub mod http;
pub mod memory;
pub mod postgres;
