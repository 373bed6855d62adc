//! Scripted connector for unit tests.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::io::{self, Read, Write};
use std::rc::Rc;

use super::Connector;
use crate::error::{PilotError, Result};

/// One step of what a mock stream delivers to its reader.
#[derive(Clone, Debug)]
pub enum Chunk {
    Data(Vec<u8>),
    /// The read times out
    Stall,
}

#[derive(Default)]
struct Inner {
    /// Scripts for the connections still to be accepted
    pending: VecDeque<Vec<Chunk>>,
    /// Bytes written, one buffer per opened connection
    written: Vec<Vec<u8>>,
}

/// Connector handing out scripted streams. Clones share state, so a test
/// keeps one handle while the client owns another.
#[derive(Clone, Default)]
pub struct MockConnector {
    inner: Rc<RefCell<Inner>>,
}

impl MockConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the script of the next connection
    pub fn accept(&self, script: Vec<Chunk>) {
        self.inner.borrow_mut().pending.push_back(script);
    }

    /// Queue a connection that delivers `bytes` and then end of stream
    pub fn accept_bytes(&self, bytes: Vec<u8>) {
        self.accept(vec![Chunk::Data(bytes)]);
    }

    /// Connections opened so far
    pub fn connects(&self) -> usize {
        self.inner.borrow().written.len()
    }

    /// Bytes written on the n-th connection (0-based)
    pub fn written(&self, connection: usize) -> Vec<u8> {
        self.inner
            .borrow()
            .written
            .get(connection)
            .cloned()
            .unwrap_or_default()
    }
}

impl Connector for MockConnector {
    type Stream = MockStream;

    fn connect(&mut self) -> Result<MockStream> {
        let mut inner = self.inner.borrow_mut();
        let script = inner.pending.pop_front().ok_or_else(|| {
            PilotError::Connection(io::Error::new(
                io::ErrorKind::ConnectionRefused,
                "no scripted connection",
            ))
        })?;
        inner.written.push(Vec::new());
        Ok(MockStream {
            input: script.into(),
            index: inner.written.len() - 1,
            inner: Rc::clone(&self.inner),
        })
    }

    fn peer(&self) -> String {
        "mock".to_string()
    }
}

pub struct MockStream {
    input: VecDeque<Chunk>,
    index: usize,
    inner: Rc<RefCell<Inner>>,
}

impl Read for MockStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.input.front_mut() {
            None => Ok(0),
            Some(Chunk::Stall) => {
                self.input.pop_front();
                Err(io::Error::new(io::ErrorKind::TimedOut, "read timed out"))
            }
            Some(Chunk::Data(data)) => {
                let n = data.len().min(buf.len());
                buf[..n].copy_from_slice(&data[..n]);
                data.drain(..n);
                if data.is_empty() {
                    self.input.pop_front();
                }
                Ok(n)
            }
        }
    }
}

impl Write for MockStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inner.borrow_mut().written[self.index].extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
