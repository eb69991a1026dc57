//! Device session abstraction.
//!
//! A session is one open administrative command channel to a single device,
//! used for the duration of one verification or rotation pass. The trait is
//! blocking on purpose: all ssh2 work happens inside `spawn_blocking`
//! closures, so implementations stay simple and the scripted mock needs no
//! async machinery.

#[cfg(test)]
pub mod mock;
pub mod ssh;

use crate::models::Device;

/// Errors from session operations. Connection-level kinds are distinguished
/// from per-command failures: a `Command` error leaves the session usable
/// and the caller continues with the next command.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("connection timed out: {0}")]
    ConnectTimeout(String),

    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("connection failed: {0}")]
    Connection(String),

    #[error("command failed: {0}")]
    Command(String),
}

/// One-shot command channel to a device. `close` must be called exactly once
/// on every exit path; implementations tolerate a redundant call.
pub trait DeviceSession: Send {
    fn run(&mut self, command: &str) -> Result<String, SessionError>;
    fn close(&mut self);
}

/// Opens sessions against devices. Implemented by the ssh2 driver and by
/// the scripted mock used in tests.
pub trait SessionFactory: Send + Sync {
    fn open(&self, device: &Device) -> Result<Box<dyn DeviceSession>, SessionError>;
}

pub mod dialect {
    /// Command issued once at session open for CLI families that require an
    /// explicit privileged mode. Other device types open as-is.
    pub fn privileged_command(device_type: &str) -> Option<&'static str> {
        match device_type {
            "cisco_ios" | "cisco_xe" | "cisco_nxos" | "arista_eos" => Some("enable"),
            _ => None,
        }
    }
}
