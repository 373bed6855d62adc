//! MSP v1 (MultiWii Serial Protocol) framing and payload codecs.
//!
//! # Frame layout
//!
//! ```text
//! ┌─────┬─────┬───────────┬──────┬─────┬─────────────────┬──────────┐
//! │ '$' │ 'M' │ direction │ size │ cmd │ payload[size]   │ checksum │
//! └─────┴─────┴───────────┴──────┴─────┴─────────────────┴──────────┘
//! ```
//!
//! - **direction**: `<` request (host → FC), `>` response, `!` error
//! - **checksum**: XOR of size, cmd and every payload byte
//! - Multi-byte payload fields are little-endian
//!
//! Every request is answered with exactly one frame; `SET_*` commands are
//! acknowledged with an empty response.

use std::io::Read;

use tracing::debug;

use crate::control::RcFrame;
use crate::error::{PilotError, Result};
use crate::planning::Waypoint;

const PREAMBLE_0: u8 = b'$';
const PREAMBLE_1: u8 = b'M';

/// Header bytes before the payload: '$', 'M', direction, size, cmd
pub const HEADER_SIZE: usize = 5;

/// Stray bytes tolerated before a preamble
pub const MAX_SKIPPED_BYTES: usize = 512;

/// `MSP_RAW_GPS`: fix type, satellites, lat/lon, altitude, speed, course
pub const MSP_RAW_GPS: u8 = 106;
/// `MSP_SET_RAW_RC`: override RC channels
pub const MSP_SET_RAW_RC: u8 = 200;
/// `MSP_SET_WP`: write one waypoint table entry
pub const MSP_SET_WP: u8 = 209;

/// Waypoint record size on the wire
pub const WAYPOINT_PAYLOAD_SIZE: usize = 21;
/// RC override payload size (7 channels × u16)
pub const RC_PAYLOAD_SIZE: usize = 14;

/// Minimum RAW_GPS payload carrying a position (fix, sats, lat, lon)
const RAW_GPS_MIN_SIZE: usize = 10;

/// Message direction byte.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum Direction {
    /// Sent by host, processed by flight controller
    Request = b'<',
    /// Reply from the flight controller
    Response = b'>',
    /// Flight controller could not process the request
    Error = b'!',
}

impl Direction {
    fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            b'<' => Some(Direction::Request),
            b'>' => Some(Direction::Response),
            b'!' => Some(Direction::Error),
            _ => None,
        }
    }
}

/// A decoded MSP frame.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    pub direction: Direction,
    pub command: u8,
    pub payload: Vec<u8>,
}

/// XOR checksum over size, command and payload.
pub fn checksum(command: u8, payload: &[u8]) -> u8 {
    payload
        .iter()
        .fold(payload.len() as u8 ^ command, |crc, b| crc ^ b)
}

/// Encode a request frame.
pub fn encode_request(command: u8, payload: &[u8]) -> Result<Vec<u8>> {
    encode(Direction::Request, command, payload)
}

/// Encode a frame in any direction.
pub fn encode(direction: Direction, command: u8, payload: &[u8]) -> Result<Vec<u8>> {
    if payload.len() > u8::MAX as usize {
        return Err(PilotError::Protocol(format!(
            "MSP v1 payload too large: {} bytes",
            payload.len()
        )));
    }

    let mut buf = Vec::with_capacity(HEADER_SIZE + payload.len() + 1);
    buf.push(PREAMBLE_0);
    buf.push(PREAMBLE_1);
    buf.push(direction as u8);
    buf.push(payload.len() as u8);
    buf.push(command);
    buf.extend_from_slice(payload);
    buf.push(checksum(command, payload));
    Ok(buf)
}

/// Consume bytes up to and including the next `$M` preamble.
fn sync_preamble<R: Read>(reader: &mut R) -> Result<()> {
    let mut byte = [0u8; 1];
    let mut previous = None;

    for consumed in 0..MAX_SKIPPED_BYTES + 2 {
        reader.read_exact(&mut byte)?;
        if previous == Some(PREAMBLE_0) && byte[0] == PREAMBLE_1 {
            if consumed > 1 {
                debug!("Skipped {} stray bytes before MSP preamble", consumed - 1);
            }
            return Ok(());
        }
        previous = Some(byte[0]);
    }

    Err(PilotError::Protocol(format!(
        "No MSP preamble within {} bytes",
        MAX_SKIPPED_BYTES
    )))
}

/// Read one frame from a byte stream.
///
/// Bytes before the next `$M` preamble are skipped. Truncated frames surface
/// as I/O errors from the reader; malformed ones as protocol errors.
pub fn read_frame<R: Read>(reader: &mut R) -> Result<Frame> {
    sync_preamble(reader)?;

    // direction, size, cmd
    let mut header = [0u8; HEADER_SIZE - 2];
    reader.read_exact(&mut header)?;

    let direction = Direction::from_byte(header[0]).ok_or_else(|| {
        PilotError::Protocol(format!("Bad MSP direction: {:#04x}", header[0]))
    })?;
    let size = header[1] as usize;
    let command = header[2];

    let mut payload = vec![0u8; size];
    reader.read_exact(&mut payload)?;

    let mut crc = [0u8; 1];
    reader.read_exact(&mut crc)?;

    let expected = checksum(command, &payload);
    if crc[0] != expected {
        return Err(PilotError::Protocol(format!(
            "MSP checksum mismatch for cmd {}: expected {:#04x}, got {:#04x}",
            command, expected, crc[0]
        )));
    }

    Ok(Frame {
        direction,
        command,
        payload,
    })
}

/// Serialize a waypoint into the `MSP_SET_WP` record.
pub fn waypoint_payload(wp: &Waypoint) -> [u8; WAYPOINT_PAYLOAD_SIZE] {
    let mut buf = [0u8; WAYPOINT_PAYLOAD_SIZE];
    buf[0] = wp.sequence;
    buf[1] = wp.action;
    buf[2..6].copy_from_slice(&wp.latitude.to_le_bytes());
    buf[6..10].copy_from_slice(&wp.longitude.to_le_bytes());
    buf[10..14].copy_from_slice(&wp.altitude_cm.to_le_bytes());
    buf[14..16].copy_from_slice(&wp.speed_cms.to_le_bytes());
    buf[16..18].copy_from_slice(&wp.param1.to_le_bytes());
    buf[18..20].copy_from_slice(&wp.param2.to_le_bytes());
    buf[20] = wp.flag;
    buf
}

/// Serialize an RC frame into the `MSP_SET_RAW_RC` payload.
pub fn rc_payload(frame: &RcFrame) -> [u8; RC_PAYLOAD_SIZE] {
    let mut buf = [0u8; RC_PAYLOAD_SIZE];
    for (chunk, value) in buf.chunks_exact_mut(2).zip(frame.channels.iter()) {
        chunk.copy_from_slice(&value.to_le_bytes());
    }
    buf
}

/// Decoded `MSP_RAW_GPS` response.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RawGps {
    pub fix_type: u8,
    pub num_sat: u8,
    /// Latitude (degrees × 1e7)
    pub latitude: i32,
    /// Longitude (degrees × 1e7)
    pub longitude: i32,
    pub altitude_m: Option<i16>,
    pub ground_speed: Option<u16>,
    pub ground_course: Option<u16>,
}

impl RawGps {
    /// Parse the response payload. Fields after lat/lon are optional.
    pub fn parse(payload: &[u8]) -> Result<Self> {
        if payload.len() < RAW_GPS_MIN_SIZE {
            return Err(PilotError::Protocol(format!(
                "RAW_GPS payload too short: {} bytes",
                payload.len()
            )));
        }

        let i32_at = |i: usize| {
            i32::from_le_bytes([payload[i], payload[i + 1], payload[i + 2], payload[i + 3]])
        };
        let u16_at = |i: usize| {
            payload
                .get(i..i + 2)
                .map(|b| u16::from_le_bytes([b[0], b[1]]))
        };

        Ok(Self {
            fix_type: payload[0],
            num_sat: payload[1],
            latitude: i32_at(2),
            longitude: i32_at(6),
            altitude_m: u16_at(10).map(|v| v as i16),
            ground_speed: u16_at(12),
            ground_course: u16_at(14),
        })
    }

    /// Lat/lon of zero means the receiver has no fix yet.
    pub fn has_position(&self) -> bool {
        self.latitude != 0 && self.longitude != 0
    }
}
