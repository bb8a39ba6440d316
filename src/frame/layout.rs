//! Byte offsets of every field in the 103-byte inverter frame.
//!
//! Offsets are absolute positions from the start marker. Gaps between
//! consecutive fields are reserved padding and are never read.

/// Total size of one frame on the wire, including start and end markers.
pub const WIRE_LENGTH: usize = 103;

/// Value the declared-length byte must hold for a frame to be accepted.
pub const PAYLOAD_LENGTH: u8 = 89;

/// Sentinel carried in the first byte of every frame.
pub const START_MARKER: u8 = 0x68;

/// Sentinel carried in the last byte of every frame.
pub const END_MARKER: u8 = 0x16;

pub(crate) const START: usize = 0;
pub(crate) const LENGTH: usize = 1;
pub(crate) const CONTROL_CODE: usize = 2;
pub(crate) const ID1: usize = 4;
pub(crate) const ID2: usize = 8;
pub(crate) const COMMAND: usize = 12;
pub(crate) const PROTOCOL_TYPE: usize = 13;
pub(crate) const SERIAL: usize = 15;
pub(crate) const SERIAL_LEN: usize = 16;
pub(crate) const TEMPERATURE: usize = 31;
pub(crate) const VDC1: usize = 33;
pub(crate) const VDC2: usize = 35;
// 37..39 reserved
pub(crate) const ADC1: usize = 39;
pub(crate) const ADC2: usize = 41;
// 43..45 reserved
pub(crate) const AAC: usize = 45;
// 47..51 reserved
pub(crate) const VAC: usize = 51;
// 53..57 reserved
pub(crate) const FAC: usize = 57;
pub(crate) const PNOW: usize = 59;
// 61..67 reserved
pub(crate) const YESTERDAY: usize = 67;
pub(crate) const TODAY: usize = 69;
pub(crate) const TOTAL: usize = 71;
// 75..79 reserved
pub(crate) const STATUS: usize = 79;
// 81..87 reserved
pub(crate) const MONTH: usize = 87;
// 89..91 reserved
pub(crate) const LAST_MONTH: usize = 91;
// 93..101 reserved
pub(crate) const CHECKSUM: usize = 101;
pub(crate) const END: usize = 102;

/// Bytes covered by the checksum: the length byte up to, not including, the
/// checksum itself.
pub(crate) const CHECKSUM_SPAN: core::ops::Range<usize> = LENGTH..CHECKSUM;

const _: () = assert!(END + 1 == WIRE_LENGTH);
const _: () = assert!(SERIAL + SERIAL_LEN == TEMPERATURE);

/// Copy `N` bytes starting at `offset` out of a full-size frame.
///
/// Every offset in this module is a compile-time constant inside
/// [`WIRE_LENGTH`], so the slice is always in range.
pub(crate) fn array_at<const N: usize>(wire: &[u8; WIRE_LENGTH], offset: usize) -> [u8; N] {
    let mut out = [0; N];
    out.copy_from_slice(&wire[offset..offset + N]);
    out
}

pub(crate) fn put_at(wire: &mut [u8; WIRE_LENGTH], offset: usize, bytes: &[u8]) {
    wire[offset..offset + bytes.len()].copy_from_slice(bytes);
}
