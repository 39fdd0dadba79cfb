//! Unix signal delivery for worker processes.

use crate::domain::ports::ProcessSignaler;
use nix::sys::signal::{self, Signal};
use nix::unistd::Pid;
use tracing::debug;

/// Sends real SIGTERM/SIGKILL to worker pids.
///
/// Delivery failures are swallowed: the common case is a process that has
/// already exited, which is exactly the outcome the signal wanted.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnixProcessSignaler;

impl UnixProcessSignaler {
    fn send(pid: u32, sig: Signal) {
        let Ok(raw) = i32::try_from(pid) else {
            debug!(pid, "pid out of range, skipping signal");
            return;
        };
        if let Err(err) = signal::kill(Pid::from_raw(raw), sig) {
            debug!(pid, signal = ?sig, %err, "signal delivery failed, process likely gone");
        }
    }
}

impl ProcessSignaler for UnixProcessSignaler {
    fn terminate(&self, pid: u32) {
        Self::send(pid, Signal::SIGTERM);
    }

    fn kill(&self, pid: u32) {
        Self::send(pid, Signal::SIGKILL);
    }
}
