//! Decoding of the fixed-layout telemetry frame sent by the data logger.
//!
//! A frame is exactly [`WIRE_LENGTH`] bytes. Fields are extracted by absolute
//! offset (see [`layout`]) rather than by reinterpreting memory, and reserved
//! ranges between fields are skipped.
//!
//! The checksum and end marker are carried through to [`RawFrame`] but never
//! used to reject a frame.

mod error;
pub mod layout;

use std::borrow::Cow;

pub use error::FrameError;
pub use layout::{END_MARKER, PAYLOAD_LENGTH, START_MARKER, WIRE_LENGTH};
use layout::{array_at, put_at};

use crate::byte_order::{read_network_u16, read_network_u32, write_network_u16, write_network_u32};

/// Wire-exact representation of one inverter packet.
///
/// All integer fields hold the raw, unscaled values found on the wire. See
/// [`InverterRecord`](crate::record::InverterRecord) for the converted form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawFrame {
    /// Start marker, normally [`START_MARKER`].
    pub start: u8,
    /// Declared payload length; must equal [`PAYLOAD_LENGTH`].
    pub length: u8,
    pub control_code: [u8; 2],
    pub id1: [u8; 4],
    pub id2: [u8; 4],
    pub command: u8,
    pub protocol_type: [u8; 2],
    /// Inverter serial number, ASCII padded with NULs or spaces.
    pub serial: [u8; 16],
    /// Heat-sink temperature in tenths of a degree Celsius.
    pub temperature: u16,
    pub vdc1: u16,
    pub vdc2: u16,
    pub adc1: u16,
    pub adc2: u16,
    pub aac: u16,
    pub vac: u16,
    /// Grid frequency in hundredths of a hertz.
    pub fac: u16,
    /// Single-phase output power in watts.
    pub pnow: u16,
    pub yesterday: u16,
    pub today: u16,
    /// Lifetime energy in tenths of a kWh.
    pub total: u32,
    pub status: u16,
    pub month: u16,
    pub last_month: u16,
    pub checksum: u8,
    /// End marker, normally [`END_MARKER`].
    pub end: u8,
}

impl Default for RawFrame {
    /// An all-zero measurement frame with valid markers and length byte.
    fn default() -> Self {
        Self {
            start: START_MARKER,
            length: PAYLOAD_LENGTH,
            control_code: [0; 2],
            id1: [0; 4],
            id2: [0; 4],
            command: 0,
            protocol_type: [0; 2],
            serial: [0; 16],
            temperature: 0,
            vdc1: 0,
            vdc2: 0,
            adc1: 0,
            adc2: 0,
            aac: 0,
            vac: 0,
            fac: 0,
            pnow: 0,
            yesterday: 0,
            today: 0,
            total: 0,
            status: 0,
            month: 0,
            last_month: 0,
            checksum: 0,
            end: END_MARKER,
        }
    }
}

/// Ensure `received` bytes make up exactly one frame.
///
/// # Errors
///
/// Returns [`FrameError::WireLength`] when `received` differs from
/// [`WIRE_LENGTH`].
pub const fn check_wire_length(received: usize) -> Result<(), FrameError> {
    if received == WIRE_LENGTH {
        Ok(())
    } else {
        Err(FrameError::WireLength {
            received,
            expected: WIRE_LENGTH,
        })
    }
}

impl RawFrame {
    /// Decode and validate a frame.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError::WireLength`] if `bytes` is not exactly
    /// [`WIRE_LENGTH`] long and [`FrameError::InvalidPacketLength`] if the
    /// declared-length byte is not [`PAYLOAD_LENGTH`].
    ///
    /// # Examples
    ///
    /// ```
    /// use ginlong_monitor::frame::{FrameError, RawFrame};
    ///
    /// let mut wire = RawFrame::default().to_bytes();
    /// assert!(RawFrame::decode(&wire).is_ok());
    ///
    /// wire[1] = 88;
    /// assert!(matches!(
    ///     RawFrame::decode(&wire),
    ///     Err(FrameError::InvalidPacketLength { declared: 88, .. })
    /// ));
    /// ```
    pub fn decode(bytes: &[u8]) -> Result<Self, FrameError> {
        let frame = Self::from_wire(bytes)?;
        frame.validate()?;
        Ok(frame)
    }

    /// Extract every field without checking the declared length.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError::WireLength`] if `bytes` is not exactly
    /// [`WIRE_LENGTH`] long.
    pub fn from_wire(bytes: &[u8]) -> Result<Self, FrameError> {
        let wire: &[u8; WIRE_LENGTH] =
            bytes.try_into().map_err(|_| FrameError::WireLength {
                received: bytes.len(),
                expected: WIRE_LENGTH,
            })?;
        let u16_at = |offset| read_network_u16(array_at(wire, offset));

        Ok(Self {
            start: wire[layout::START],
            length: wire[layout::LENGTH],
            control_code: array_at(wire, layout::CONTROL_CODE),
            id1: array_at(wire, layout::ID1),
            id2: array_at(wire, layout::ID2),
            command: wire[layout::COMMAND],
            protocol_type: array_at(wire, layout::PROTOCOL_TYPE),
            serial: array_at(wire, layout::SERIAL),
            temperature: u16_at(layout::TEMPERATURE),
            vdc1: u16_at(layout::VDC1),
            vdc2: u16_at(layout::VDC2),
            adc1: u16_at(layout::ADC1),
            adc2: u16_at(layout::ADC2),
            aac: u16_at(layout::AAC),
            vac: u16_at(layout::VAC),
            fac: u16_at(layout::FAC),
            pnow: u16_at(layout::PNOW),
            yesterday: u16_at(layout::YESTERDAY),
            today: u16_at(layout::TODAY),
            total: read_network_u32(array_at(wire, layout::TOTAL)),
            status: u16_at(layout::STATUS),
            month: u16_at(layout::MONTH),
            last_month: u16_at(layout::LAST_MONTH),
            checksum: wire[layout::CHECKSUM],
            end: wire[layout::END],
        })
    }

    /// Check the declared-length byte.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError::InvalidPacketLength`] if it is not
    /// [`PAYLOAD_LENGTH`].
    pub const fn validate(&self) -> Result<(), FrameError> {
        if self.length == PAYLOAD_LENGTH {
            Ok(())
        } else {
            Err(FrameError::InvalidPacketLength {
                declared: self.length,
                expected: PAYLOAD_LENGTH,
            })
        }
    }

    /// Encode the frame back into its wire form. Reserved ranges are zeroed.
    #[must_use]
    pub fn to_bytes(&self) -> [u8; WIRE_LENGTH] {
        let mut wire = [0; WIRE_LENGTH];
        wire[layout::START] = self.start;
        wire[layout::LENGTH] = self.length;
        put_at(&mut wire, layout::CONTROL_CODE, &self.control_code);
        put_at(&mut wire, layout::ID1, &self.id1);
        put_at(&mut wire, layout::ID2, &self.id2);
        wire[layout::COMMAND] = self.command;
        put_at(&mut wire, layout::PROTOCOL_TYPE, &self.protocol_type);
        put_at(&mut wire, layout::SERIAL, &self.serial);
        for (offset, value) in [
            (layout::TEMPERATURE, self.temperature),
            (layout::VDC1, self.vdc1),
            (layout::VDC2, self.vdc2),
            (layout::ADC1, self.adc1),
            (layout::ADC2, self.adc2),
            (layout::AAC, self.aac),
            (layout::VAC, self.vac),
            (layout::FAC, self.fac),
            (layout::PNOW, self.pnow),
            (layout::YESTERDAY, self.yesterday),
            (layout::TODAY, self.today),
            (layout::STATUS, self.status),
            (layout::MONTH, self.month),
            (layout::LAST_MONTH, self.last_month),
        ] {
            put_at(&mut wire, offset, &write_network_u16(value));
        }
        put_at(&mut wire, layout::TOTAL, &write_network_u32(self.total));
        wire[layout::CHECKSUM] = self.checksum;
        wire[layout::END] = self.end;
        wire
    }

    /// Serial number as text with trailing NUL and space padding removed.
    #[must_use]
    pub fn serial_text(&self) -> Cow<'_, str> {
        let end = self
            .serial
            .iter()
            .rposition(|b| *b != 0 && *b != b' ')
            .map_or(0, |i| i + 1);
        String::from_utf8_lossy(&self.serial[..end])
    }
}

/// Sum of the bytes from the length field up to the checksum, modulo 256.
///
/// Returns `None` when `wire` is not a full frame. The dispatcher never calls
/// this; it exists for offline inspection of captured frames.
#[must_use]
pub fn checksum(wire: &[u8]) -> Option<u8> {
    if wire.len() != WIRE_LENGTH {
        return None;
    }
    Some(
        wire[layout::CHECKSUM_SPAN]
            .iter()
            .fold(0u8, |acc, b| acc.wrapping_add(*b)),
    )
}
