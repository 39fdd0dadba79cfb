//! Worker process infrastructure: the CLI launcher and Unix signalling.

pub mod cli_launcher;
pub mod signal;

pub use cli_launcher::{CliLauncherConfig, CliWorkerLauncher};
pub use signal::UnixProcessSignaler;
