//! Outbound adapters implementing the domain's driven ports.
//!
//! - [`persistence`]: PostgreSQL via Diesel.
//! - [`memory`]: in-process stores used when no database is configured.
//! - [`storage`]: uploaded file bytes on the local filesystem.

pub mod memory;
pub mod persistence;
pub mod storage;
