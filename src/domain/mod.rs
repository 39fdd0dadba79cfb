//! Domain layer: models, errors, and port traits. No I/O lives here.

pub mod error;
pub mod models;
pub mod ports;

pub use error::ExecutionError;
