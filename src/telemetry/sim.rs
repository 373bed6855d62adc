//! Simulator kinematics client.
//!
//! # Wire format
//!
//! Request and response are length-prefixed JSON frames:
//!
//! ```text
//! ┌──────────────────┬──────────────────────────┐
//! │ Length (4 bytes) │ JSON payload             │
//! │ Big-endian u32   │                          │
//! └──────────────────┴──────────────────────────┘
//! ```
//!
//! Request: `{"command":"get_kinematics"}`.
//! Response: `{"location":[x,y,z],"orientation":[qx,qy,qz,qw]}`; either field
//! may be absent.
//!
//! A read that fails part-way through a frame drops the connection; the next
//! snapshot request connects again.

use std::io::{Read, Write};
use std::time::Duration;

use serde::Serialize;

use super::{Telemetry, VehicleState};
use crate::error::{PilotError, Result};
use crate::transport::{Connector, Session, TcpConnector};

/// Upper bound on a response frame (1MB)
const MAX_MESSAGE_SIZE: usize = 1024 * 1024;

#[derive(Serialize)]
struct Request<'a> {
    command: &'a str,
}

const KINEMATICS_REQUEST: Request<'static> = Request {
    command: "get_kinematics",
};

/// Telemetry client for the simulator's kinematics service.
pub struct SimTelemetry<C: Connector = TcpConnector> {
    session: Session<C>,
}

impl SimTelemetry<TcpConnector> {
    /// Connect with timeout. The same timeout bounds every response read.
    pub fn connect_timeout(addr: &str, timeout: Duration) -> Result<Self> {
        let mut sim = Self::new(TcpConnector::new(addr, timeout)?);
        sim.session.open()?;
        Ok(sim)
    }
}

impl<C: Connector> SimTelemetry<C> {
    pub fn new(connector: C) -> Self {
        Self {
            session: Session::new(connector),
        }
    }
}

fn write_frame<W: Write>(stream: &mut W, payload: &[u8]) -> Result<()> {
    let len = payload.len() as u32;
    stream.write_all(&len.to_be_bytes())?;
    stream.write_all(payload)?;
    stream.flush()?;
    Ok(())
}

fn read_frame<R: Read>(stream: &mut R) -> Result<Vec<u8>> {
    let mut len_buf = [0u8; 4];
    stream.read_exact(&mut len_buf)?;
    let len = u32::from_be_bytes(len_buf) as usize;

    if len > MAX_MESSAGE_SIZE {
        return Err(PilotError::Protocol(format!(
            "Telemetry frame too large: {} bytes",
            len
        )));
    }

    let mut payload = vec![0u8; len];
    stream.read_exact(&mut payload)?;
    Ok(payload)
}

impl<C: Connector> Telemetry for SimTelemetry<C> {
    fn vehicle_state(&mut self) -> Result<VehicleState> {
        let request = serde_json::to_vec(&KINEMATICS_REQUEST)?;
        let payload = self.session.exchange(|stream| {
            write_frame(stream, &request)?;
            read_frame(stream)
        })?;

        // A whole frame was read, so bad JSON does not desync the stream
        let state: VehicleState = serde_json::from_slice(&payload)?;
        Ok(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::mock::{Chunk, MockConnector};

    fn framed(json: &str) -> Vec<u8> {
        let mut buf = (json.len() as u32).to_be_bytes().to_vec();
        buf.extend_from_slice(json.as_bytes());
        buf
    }

    fn client(responses: &[&str]) -> (SimTelemetry<MockConnector>, MockConnector) {
        let connector = MockConnector::new();
        connector.accept_bytes(responses.iter().flat_map(|r| framed(r)).collect());
        (SimTelemetry::new(connector.clone()), connector)
    }

    const HOVER: &str = r#"{"location":[1.0,2.0,30.5],"orientation":[0.0,0.0,0.0,1.0]}"#;

    #[test]
    fn test_full_snapshot() {
        let (mut sim, connector) = client(&[HOVER]);
        let state = sim.vehicle_state().unwrap();

        assert_eq!(state.location, Some([1.0, 2.0, 30.5]));
        assert_eq!(state.yaw_rad(), 0.0);
        assert_eq!(connector.written(0), framed(r#"{"command":"get_kinematics"}"#));
    }

    #[test]
    fn test_partial_snapshot() {
        let (mut sim, _) = client(&[r#"{"location":[0.0,0.0,4.0]}"#, r#"{}"#]);

        let state = sim.vehicle_state().unwrap();
        assert_eq!(state.altitude_m(), Some(4.0));
        assert!(state.orientation.is_none());

        let state = sim.vehicle_state().unwrap();
        assert_eq!(state, VehicleState::default());
    }

    #[test]
    fn test_garbage_is_protocol_error() {
        let (mut sim, connector) = client(&["not json", HOVER]);
        assert!(matches!(sim.vehicle_state(), Err(PilotError::Protocol(_))));

        // Framing survived, the same connection serves the next snapshot
        assert_eq!(sim.vehicle_state().unwrap().altitude_m(), Some(30.5));
        assert_eq!(connector.connects(), 1);
    }

    #[test]
    fn test_oversized_frame_rejected() {
        let connector = MockConnector::new();
        let mut input = ((MAX_MESSAGE_SIZE + 1) as u32).to_be_bytes().to_vec();
        input.extend_from_slice(b"{}");
        connector.accept_bytes(input);
        let mut sim = SimTelemetry::new(connector);

        assert!(matches!(sim.vehicle_state(), Err(PilotError::Protocol(_))));
    }

    #[test]
    fn test_closed_stream_is_connection_error() {
        let (mut sim, _) = client(&[]);
        assert!(matches!(sim.vehicle_state(), Err(PilotError::Connection(_))));
    }

    #[test]
    fn test_stalled_frame_then_healthy_connection() {
        let connector = MockConnector::new();
        let late = framed(r#"{"location":[9.0,9.0,9.0]}"#);
        let (head, tail) = late.split_at(10);
        // Snapshot stalls mid-payload; its tail arrives after the timeout
        connector.accept(vec![
            Chunk::Data(head.to_vec()),
            Chunk::Stall,
            Chunk::Data(tail.to_vec()),
            Chunk::Data(framed(r#"{"location":[9.0,9.0,9.0]}"#)),
        ]);
        connector.accept_bytes([framed(HOVER), framed(HOVER)].concat());
        let mut sim = SimTelemetry::new(connector.clone());

        assert!(matches!(sim.vehicle_state(), Err(PilotError::Connection(_))));
        for _ in 0..2 {
            let state = sim.vehicle_state().unwrap();
            assert_eq!(state.location, Some([1.0, 2.0, 30.5]));
        }
        assert_eq!(connector.connects(), 2);
    }

    #[test]
    fn test_reconnect_waits_for_simulator() {
        let connector = MockConnector::new();
        connector.accept_bytes(framed(HOVER)[..3].to_vec());
        let mut sim = SimTelemetry::new(connector.clone());

        assert!(sim.vehicle_state().is_err());
        // Simulator still down
        assert!(matches!(sim.vehicle_state(), Err(PilotError::Connection(_))));

        connector.accept_bytes(framed(HOVER));
        assert_eq!(sim.vehicle_state().unwrap().altitude_m(), Some(30.5));
        assert_eq!(connector.connects(), 2);
    }
}
