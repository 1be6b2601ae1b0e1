//! # Connector Layer
//!
//! External integrations implementing application interfaces:
//! - HTTP client for the indexing backend (and an in-process mock)
//! - Local key/value storage (JSON files, in-memory)
//! - Clocks driving the periodic loops
//! - CLI-facing container, router and controllers

pub mod adapter;
pub mod api;
pub mod storage;

pub use adapter::*;
pub use storage::*;
