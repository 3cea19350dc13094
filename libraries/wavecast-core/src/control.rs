//! Control-socket client
//!
//! Synchronous TCP client for the track scheduler. A request is a fixed
//! ASCII command; the response is whatever the peer writes before closing
//! the connection. Failures are surfaced to the caller, never retried.

use std::io::{Read, Write};
use std::net::TcpStream;

use tracing::debug;

use crate::error::Result;

/// Command asking the scheduler for the next track to play.
const NEXTSONG: &str = "NEXTSONG";

/// Client for the remote track scheduler.
#[derive(Debug, Clone)]
pub struct ControlClient {
    host: String,
    port: u16,
}

impl ControlClient {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Send one command and collect the reply until the peer closes the
    /// connection.
    pub fn send_command(&self, command: &str) -> Result<String> {
        let mut socket = TcpStream::connect((self.host.as_str(), self.port))?;
        socket.write_all(command.as_bytes())?;
        let mut reply = Vec::new();
        socket.read_to_end(&mut reply)?;
        debug!(command, bytes = reply.len(), "control reply");
        Ok(String::from_utf8_lossy(&reply).into_owned())
    }

    /// Ask the scheduler for the next song.
    pub fn next_song(&self) -> Result<String> {
        self.send_command(NEXTSONG)
    }
}
