//! ssh2-backed session driver. Blocking; call from a spawn_blocking context.

use std::io::Read;
use std::net::TcpStream;
use std::time::Duration;

use super::{dialect, DeviceSession, SessionError, SessionFactory};
use crate::models::Device;

/// Keyboard-interactive prompt handler that always responds with the password
struct PasswordPrompt {
    password: String,
}

impl ssh2::KeyboardInteractivePrompt for PasswordPrompt {
    fn prompt<'a>(
        &mut self,
        _username: &str,
        _instructions: &str,
        prompts: &[ssh2::Prompt<'a>],
    ) -> Vec<String> {
        prompts.iter().map(|_| self.password.clone()).collect()
    }
}

/// Opens authenticated ssh2 sessions with a bounded connect timeout.
pub struct SshSessionFactory {
    connect_timeout: Duration,
}

impl SshSessionFactory {
    pub fn new(connect_timeout: Duration) -> Self {
        Self { connect_timeout }
    }

    fn connect(&self, device: &Device) -> Result<ssh2::Session, SessionError> {
        let addr = format!("{}:22", device.host);
        let sock_addr = addr
            .parse()
            .map_err(|e| SessionError::Connection(format!("invalid address {}: {}", addr, e)))?;

        let tcp = TcpStream::connect_timeout(&sock_addr, self.connect_timeout).map_err(|e| {
            match e.kind() {
                std::io::ErrorKind::TimedOut | std::io::ErrorKind::WouldBlock => {
                    SessionError::ConnectTimeout(format!("{}: {}", device.host, e))
                }
                _ => SessionError::Connection(format!("TCP connection failed: {}", e)),
            }
        })?;
        tcp.set_read_timeout(Some(self.connect_timeout)).ok();
        tcp.set_write_timeout(Some(self.connect_timeout)).ok();

        let mut session = ssh2::Session::new()
            .map_err(|e| SessionError::Connection(format!("failed to create SSH session: {}", e)))?;
        session.set_tcp_stream(tcp);
        session.set_timeout(self.connect_timeout.as_millis() as u32);
        session
            .handshake()
            .map_err(|e| SessionError::Connection(format!("SSH handshake failed: {}", e)))?;

        // Password auth first
        match session.userauth_password(&device.current_username, &device.current_password) {
            Ok(_) if session.authenticated() => return Ok(session),
            _ => {}
        }

        // Keyboard-interactive auth (needed for Arista EOS and similar)
        let mut prompter = PasswordPrompt {
            password: device.current_password.clone(),
        };
        let _ = session.userauth_keyboard_interactive(&device.current_username, &mut prompter);

        if session.authenticated() {
            Ok(session)
        } else {
            Err(SessionError::AuthenticationFailed(format!(
                "{}@{}: all methods exhausted",
                device.current_username, device.host
            )))
        }
    }
}

impl SessionFactory for SshSessionFactory {
    fn open(&self, device: &Device) -> Result<Box<dyn DeviceSession>, SessionError> {
        let session = self.connect(device)?;
        let mut ssh = SshSession {
            session,
            closed: false,
        };

        // Dialects such as cisco_ios require privileged mode before shows
        if let Some(command) = dialect::privileged_command(&device.device_type) {
            if let Err(e) = ssh.run(command) {
                ssh.close();
                return Err(SessionError::Connection(format!(
                    "failed to enter privileged mode: {}",
                    e
                )));
            }
        }

        Ok(Box::new(ssh))
    }
}

struct SshSession {
    session: ssh2::Session,
    closed: bool,
}

impl DeviceSession for SshSession {
    fn run(&mut self, command: &str) -> Result<String, SessionError> {
        let mut channel = self
            .session
            .channel_session()
            .map_err(|e| SessionError::Command(format!("failed to open channel: {}", e)))?;

        if let Err(e) = channel.exec(command) {
            let _ = channel.wait_close();
            return Err(SessionError::Command(format!(
                "failed to execute `{}`: {}",
                command, e
            )));
        }

        let mut output = String::new();
        if let Err(e) = channel.read_to_string(&mut output) {
            let _ = channel.wait_close();
            return Err(SessionError::Command(format!(
                "failed to read output of `{}`: {}",
                command, e
            )));
        }

        let _ = channel.wait_close();
        Ok(output)
    }

    fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        let _ = self.session.disconnect(None, "session closed", None);
    }
}

impl Drop for SshSession {
    fn drop(&mut self) {
        self.close();
    }
}
