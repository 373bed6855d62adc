//! Flight controller wire protocol.

pub mod msp;

pub use msp::{Direction, Frame, RawGps};
