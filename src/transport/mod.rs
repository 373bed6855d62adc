//! Reconnecting byte streams for the request/response clients.
//!
//! Both peers (flight controller MSP port, simulator telemetry port) answer
//! every request with exactly one frame. Once a read fails part-way through a
//! frame, the bytes still in flight belong to the failed exchange and would
//! be parsed as the start of the next response. A [`Session`] therefore
//! drops the stream on any failed exchange and connects again on the next
//! request.

mod tcp;

#[cfg(test)]
pub(crate) mod mock;

pub use tcp::TcpConnector;

use std::io::{Read, Write};

use tracing::{info, warn};

use crate::error::Result;

/// Opens fresh streams to one peer.
pub trait Connector {
    type Stream: Read + Write;

    /// Open a new stream
    fn connect(&mut self) -> Result<Self::Stream>;

    /// Peer description for logs
    fn peer(&self) -> String;
}

/// A stream that is replaced after every failed exchange.
pub struct Session<C: Connector> {
    connector: C,
    stream: Option<C::Stream>,
    /// Streams opened so far
    connects: u32,
}

impl<C: Connector> Session<C> {
    /// Create a session. Nothing is opened until [`Session::open`] or the
    /// first exchange.
    pub fn new(connector: C) -> Self {
        Self {
            connector,
            stream: None,
            connects: 0,
        }
    }

    /// Open the stream now if there is none.
    pub fn open(&mut self) -> Result<()> {
        self.stream()?;
        Ok(())
    }

    /// Run one request/response exchange.
    ///
    /// Any error drops the stream, so a half-read frame never leaks into the
    /// next exchange.
    pub fn exchange<T>(&mut self, f: impl FnOnce(&mut C::Stream) -> Result<T>) -> Result<T> {
        let result = f(self.stream()?);
        if let Err(e) = &result {
            warn!(
                "Exchange with {} failed, dropping connection: {}",
                self.connector.peer(),
                e
            );
            self.stream = None;
        }
        result
    }

    /// Release the stream without reconnecting.
    pub fn disconnect(&mut self) -> Option<C::Stream> {
        self.stream.take()
    }

    fn stream(&mut self) -> Result<&mut C::Stream> {
        let stream = match self.stream.take() {
            Some(stream) => stream,
            None => {
                let stream = self.connector.connect()?;
                self.connects += 1;
                if self.connects == 1 {
                    info!("Connected to {}", self.connector.peer());
                } else {
                    info!(
                        "Reconnected to {} (connection #{})",
                        self.connector.peer(),
                        self.connects
                    );
                }
                stream
            }
        };
        Ok(self.stream.insert(stream))
    }
}
