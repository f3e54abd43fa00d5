//! Focus Revisions - Versioned Focus-Area Content Engine
//!
//! This crate manages analysis packages made of named focus areas whose
//! content evolves through immutable versions. Edits arrive as patch sets
//! that are cloned-and-patched into a new version under optimistic
//! concurrency, and the stakeholder feedback that motivated them is resolved
//! in the same transaction.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
