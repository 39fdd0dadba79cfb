//! Infrastructure layer: adapters that satisfy the domain ports.
//!
//! - Worker CLI launcher and Unix signalling
//! - Configuration loading (figment)
//! - Logging initialization
//! - In-memory store adapters

pub mod config;
pub mod logging;
pub mod memory;
pub mod worker;
