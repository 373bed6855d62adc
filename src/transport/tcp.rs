//! TCP connector with connect, read and write timeouts.

use std::net::{SocketAddr, TcpStream};
use std::time::Duration;

use super::Connector;
use crate::error::{PilotError, Result};

/// Connects to a fixed socket address.
#[derive(Clone, Debug)]
pub struct TcpConnector {
    addr: SocketAddr,
    timeout: Duration,
}

impl TcpConnector {
    /// Parse the address up front. The timeout bounds connecting and every
    /// read and write on the opened stream.
    pub fn new(addr: &str, timeout: Duration) -> Result<Self> {
        let addr: SocketAddr = addr
            .parse()
            .map_err(|e| PilotError::Config(format!("Invalid address {}: {}", addr, e)))?;
        if timeout.is_zero() {
            return Err(PilotError::Config("Connection timeout must be > 0".into()));
        }
        Ok(Self { addr, timeout })
    }
}

impl Connector for TcpConnector {
    type Stream = TcpStream;

    fn connect(&mut self) -> Result<TcpStream> {
        let stream = TcpStream::connect_timeout(&self.addr, self.timeout)?;
        stream.set_read_timeout(Some(self.timeout))?;
        stream.set_write_timeout(Some(self.timeout))?;
        stream.set_nodelay(true)?;
        Ok(stream)
    }

    fn peer(&self) -> String {
        self.addr.to_string()
    }
}
