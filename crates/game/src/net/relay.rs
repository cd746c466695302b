use std::io::{self, Read, Write};
use std::net::{Shutdown, SocketAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;

use super::envelope::MAX_LINE_BYTES;

pub const DEFAULT_RELAY_PORT: u16 = 27016;

const RECV_BUFFER_SIZE: usize = 4096;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connected,
    Disconnected,
}

#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("relay channel is closed")]
    Closed,
    #[error("relay i/o failed: {0}")]
    Io(#[from] io::Error),
}

/// Broadcast connection carrying one message per line. Sends are fire-and-forget.
pub trait RelayChannel {
    fn send(&mut self, line: &str) -> Result<(), RelayError>;

    /// Every complete line delivered since the last poll, in arrival order.
    fn poll(&mut self) -> Result<Vec<String>, RelayError>;

    fn is_open(&self) -> bool;

    fn close(&mut self);
}

pub struct TcpRelay {
    stream: TcpStream,
    peer_addr: SocketAddr,
    state: ConnectionState,
    inbound: Vec<u8>,
    outbound: Vec<u8>,
    recv_buffer: [u8; RECV_BUFFER_SIZE],
}

impl TcpRelay {
    pub fn connect<A: ToSocketAddrs>(addr: A, timeout: Duration) -> io::Result<Self> {
        let mut last_error = None;
        for candidate in addr.to_socket_addrs()? {
            match TcpStream::connect_timeout(&candidate, timeout) {
                Ok(stream) => return Self::from_stream(stream),
                Err(e) => last_error = Some(e),
            }
        }

        Err(last_error.unwrap_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidInput, "no relay address resolved")
        }))
    }

    pub fn from_stream(stream: TcpStream) -> io::Result<Self> {
        stream.set_nonblocking(true)?;
        stream.set_nodelay(true)?;
        let peer_addr = stream.peer_addr()?;

        log::info!("Connected to relay at {}", peer_addr);

        Ok(Self {
            stream,
            peer_addr,
            state: ConnectionState::Connected,
            inbound: Vec::with_capacity(RECV_BUFFER_SIZE),
            outbound: Vec::new(),
            recv_buffer: [0u8; RECV_BUFFER_SIZE],
        })
    }

    pub fn peer_addr(&self) -> SocketAddr {
        self.peer_addr
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    fn mark_disconnected(&mut self, reason: &str) {
        if self.state == ConnectionState::Connected {
            log::warn!("Relay connection to {} lost: {}", self.peer_addr, reason);
        }
        self.state = ConnectionState::Disconnected;
        self.outbound.clear();
    }

    fn flush(&mut self) -> Result<(), RelayError> {
        while !self.outbound.is_empty() {
            match self.stream.write(&self.outbound) {
                Ok(0) => {
                    self.mark_disconnected("write returned zero bytes");
                    return Err(RelayError::Closed);
                }
                Ok(written) => {
                    self.outbound.drain(..written);
                }
                Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => break,
                Err(ref e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    self.mark_disconnected(&e.to_string());
                    return Err(RelayError::Io(e));
                }
            }
        }
        Ok(())
    }

    fn split_lines(&mut self) -> Vec<String> {
        let mut lines = Vec::new();

        while let Some(end) = self.inbound.iter().position(|&b| b == b'\n') {
            let mut raw: Vec<u8> = self.inbound.drain(..=end).collect();
            raw.pop();
            if raw.last() == Some(&b'\r') {
                raw.pop();
            }
            if raw.is_empty() {
                continue;
            }

            match String::from_utf8(raw) {
                Ok(line) => lines.push(line),
                Err(_) => log::debug!("Dropping non-utf8 relay line"),
            }
        }

        if self.inbound.len() > MAX_LINE_BYTES {
            log::warn!(
                "Dropping {} buffered relay bytes without a line break",
                self.inbound.len()
            );
            self.inbound.clear();
        }

        lines
    }
}

impl RelayChannel for TcpRelay {
    fn send(&mut self, line: &str) -> Result<(), RelayError> {
        if self.state != ConnectionState::Connected {
            return Err(RelayError::Closed);
        }

        self.outbound.extend_from_slice(line.as_bytes());
        self.outbound.push(b'\n');
        self.flush()
    }

    fn poll(&mut self) -> Result<Vec<String>, RelayError> {
        if self.state != ConnectionState::Connected {
            return Ok(Vec::new());
        }

        self.flush()?;

        loop {
            match self.stream.read(&mut self.recv_buffer) {
                Ok(0) => {
                    self.mark_disconnected("closed by relay");
                    break;
                }
                Ok(size) => self.inbound.extend_from_slice(&self.recv_buffer[..size]),
                Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => break,
                Err(ref e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    self.mark_disconnected(&e.to_string());
                    return Err(RelayError::Io(e));
                }
            }
        }

        Ok(self.split_lines())
    }

    fn is_open(&self) -> bool {
        self.state == ConnectionState::Connected
    }

    fn close(&mut self) {
        if self.state == ConnectionState::Connected {
            let _ = self.flush();
            let _ = self.stream.shutdown(Shutdown::Both);
            log::info!("Closed relay connection to {}", self.peer_addr);
        }
        self.state = ConnectionState::Disconnected;
    }
}
