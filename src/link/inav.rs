//! MSP client for an INAV flight controller (or its SITL build) over TCP.

use std::io::{Read, Write};
use std::time::Duration;

use tracing::{debug, info};

use super::FlightLink;
use crate::control::RcFrame;
use crate::error::{PilotError, Result};
use crate::planning::Waypoint;
use crate::protocol::msp::{self, Direction, Frame, MSP_RAW_GPS, MSP_SET_RAW_RC, MSP_SET_WP};
use crate::protocol::RawGps;
use crate::transport::{Connector, Session, TcpConnector};

/// Frames for other commands skipped while waiting for a response
const MAX_STALE_FRAMES: usize = 4;

/// MSP request/response client.
///
/// Generic over the connector so the exchange can be exercised without a
/// socket. A failed exchange drops the connection and the next request opens
/// a new one; after [`FlightLink::close`] the link stays closed.
pub struct InavLink<C: Connector = TcpConnector> {
    session: Session<C>,
    closed: bool,
}

impl InavLink<TcpConnector> {
    /// Connect with timeout. The same timeout bounds every response read.
    pub fn connect_timeout(addr: &str, timeout: Duration) -> Result<Self> {
        let mut link = Self::new(TcpConnector::new(addr, timeout)?);
        link.session.open()?;
        Ok(link)
    }
}

impl<C: Connector> InavLink<C> {
    pub fn new(connector: C) -> Self {
        Self {
            session: Session::new(connector),
            closed: false,
        }
    }

    /// Send one request and read its response frame.
    fn request(&mut self, command: u8, payload: &[u8]) -> Result<Frame> {
        if self.closed {
            return Err(PilotError::Protocol("Flight controller link closed".into()));
        }

        let buf = msp::encode_request(command, payload)?;
        let frame = self.session.exchange(|stream| {
            stream.write_all(&buf)?;
            stream.flush()?;
            read_response(stream, command)
        })?;

        // A complete error frame leaves the stream in sync
        if frame.direction == Direction::Error {
            return Err(PilotError::Protocol(format!(
                "Flight controller rejected command {}",
                command
            )));
        }
        Ok(frame)
    }
}

/// Read frames until the one answering `command`.
///
/// Late answers to earlier requests are discarded.
fn read_response<R: Read>(stream: &mut R, command: u8) -> Result<Frame> {
    for _ in 0..=MAX_STALE_FRAMES {
        let frame = msp::read_frame(stream)?;
        if frame.command == command {
            return Ok(frame);
        }
        debug!(
            "Discarding MSP frame for command {} while waiting for {}",
            frame.command, command
        );
    }
    Err(PilotError::Protocol(format!(
        "No response for command {} within {} frames",
        command,
        MAX_STALE_FRAMES + 1
    )))
}

impl<C: Connector> FlightLink for InavLink<C> {
    fn send_rc(&mut self, frame: &RcFrame) -> Result<()> {
        self.request(MSP_SET_RAW_RC, &msp::rc_payload(frame))?;
        Ok(())
    }

    fn set_waypoint(&mut self, waypoint: &Waypoint) -> Result<()> {
        self.request(MSP_SET_WP, &msp::waypoint_payload(waypoint))?;
        Ok(())
    }

    fn gps_fix(&mut self) -> Result<Option<RawGps>> {
        let frame = self.request(MSP_RAW_GPS, &[])?;
        let gps = RawGps::parse(&frame.payload)?;
        Ok(gps.has_position().then_some(gps))
    }

    fn close(&mut self) -> Result<()> {
        self.closed = true;
        if let Some(mut stream) = self.session.disconnect() {
            stream.flush()?;
            info!("Flight controller link closed");
        }
        Ok(())
    }
}
