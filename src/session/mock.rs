//! Scripted mock sessions for testing pipelines without lab devices.
//!
//! Behavior is declared per host; command and close invocations are logged
//! so tests can assert ordering (e.g. rotation's create-then-delete).

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::{DeviceSession, SessionError, SessionFactory};
use crate::models::Device;

/// Connection-level failure modes a mock device can simulate.
#[derive(Debug, Clone, Copy)]
pub enum MockFailure {
    Timeout,
    Auth,
    Transport,
}

/// Scripted behavior for one mock device.
#[derive(Debug, Clone, Default)]
pub struct MockDevice {
    /// Command (or command substring) to canned output.
    script: Vec<(String, String)>,
    /// Command substrings that fail with a per-command error.
    failing: Vec<String>,
    connect_failure: Option<MockFailure>,
    /// Delay applied before the connection attempt resolves.
    connect_delay: Option<Duration>,
}

impl MockDevice {
    pub fn healthy() -> Self {
        Self::default()
    }

    pub fn unreachable(failure: MockFailure) -> Self {
        Self {
            connect_failure: Some(failure),
            ..Self::default()
        }
    }

    /// Canned output for a command; matched exactly first, then by substring.
    pub fn reply(mut self, command: &str, output: &str) -> Self {
        self.script.push((command.to_string(), output.to_string()));
        self
    }

    /// Commands containing this substring fail with a command error.
    pub fn failing_command(mut self, command: &str) -> Self {
        self.failing.push(command.to_string());
        self
    }

    pub fn delay(mut self, delay: Duration) -> Self {
        self.connect_delay = Some(delay);
        self
    }
}

/// Session factory answering from per-host scripts.
#[derive(Default)]
pub struct MockFactory {
    devices: HashMap<String, MockDevice>,
    command_log: Arc<Mutex<Vec<(String, String)>>>,
    close_log: Arc<Mutex<Vec<String>>>,
}

impl MockFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_device(mut self, host: &str, device: MockDevice) -> Self {
        self.devices.insert(host.to_string(), device);
        self
    }

    /// Commands observed for one host, in execution order.
    pub fn commands_for(&self, host: &str) -> Vec<String> {
        self.command_log
            .lock()
            .expect("mock command log poisoned")
            .iter()
            .filter(|(h, _)| h == host)
            .map(|(_, c)| c.clone())
            .collect()
    }

    /// Number of close() calls observed for one host.
    pub fn closes_for(&self, host: &str) -> usize {
        self.close_log
            .lock()
            .expect("mock close log poisoned")
            .iter()
            .filter(|h| h.as_str() == host)
            .count()
    }
}

impl SessionFactory for MockFactory {
    fn open(&self, device: &Device) -> Result<Box<dyn DeviceSession>, SessionError> {
        let mock = self
            .devices
            .get(&device.host)
            .ok_or_else(|| SessionError::Connection(format!("no mock for {}", device.host)))?;

        if let Some(delay) = mock.connect_delay {
            std::thread::sleep(delay);
        }

        if let Some(failure) = mock.connect_failure {
            return Err(match failure {
                MockFailure::Timeout => SessionError::ConnectTimeout(device.host.clone()),
                MockFailure::Auth => SessionError::AuthenticationFailed(device.host.clone()),
                MockFailure::Transport => {
                    SessionError::Connection(format!("{}: transport reset", device.host))
                }
            });
        }

        Ok(Box::new(MockSession {
            host: device.host.clone(),
            device: mock.clone(),
            command_log: self.command_log.clone(),
            close_log: self.close_log.clone(),
        }))
    }
}

struct MockSession {
    host: String,
    device: MockDevice,
    command_log: Arc<Mutex<Vec<(String, String)>>>,
    close_log: Arc<Mutex<Vec<String>>>,
}

impl DeviceSession for MockSession {
    fn run(&mut self, command: &str) -> Result<String, SessionError> {
        self.command_log
            .lock()
            .expect("mock command log poisoned")
            .push((self.host.clone(), command.to_string()));

        if self.device.failing.iter().any(|f| command.contains(f.as_str())) {
            return Err(SessionError::Command(format!(
                "{}: `{}` rejected",
                self.host, command
            )));
        }

        for (key, output) in &self.device.script {
            if command == key || command.contains(key.as_str()) {
                return Ok(output.clone());
            }
        }
        Ok(String::new())
    }

    fn close(&mut self) {
        self.close_log
            .lock()
            .expect("mock close log poisoned")
            .push(self.host.clone());
    }
}
