//! Helpers for explicit network byte-order conversions.
//!
//! The inverter logger writes every multi-byte field big-endian. Keeping the
//! conversions here scopes the Clippy expectations to the conversion points so
//! the frame layout code stays explicit about wire endianness.

/// Parse a network-order `u16` from its on-wire representation.
///
/// # Examples
///
/// ```
/// use ginlong_monitor::byte_order::read_network_u16;
///
/// assert_eq!(read_network_u16([0x10, 0x15]), 0x1015);
/// ```
#[must_use]
pub fn read_network_u16(bytes: [u8; 2]) -> u16 {
    #[expect(
        clippy::big_endian_bytes,
        reason = "Network byte order requires big-endian bytes."
    )]
    u16::from_be_bytes(bytes)
}

/// Parse a network-order `u32` from its on-wire representation.
///
/// # Examples
///
/// ```
/// use ginlong_monitor::byte_order::read_network_u32;
///
/// assert_eq!(read_network_u32([0x00, 0x01, 0x86, 0xa0]), 100_000);
/// ```
#[must_use]
pub fn read_network_u32(bytes: [u8; 4]) -> u32 {
    #[expect(
        clippy::big_endian_bytes,
        reason = "Network byte order requires big-endian bytes."
    )]
    u32::from_be_bytes(bytes)
}

/// Serialise a `u16` in network byte order (big-endian).
#[must_use]
pub fn write_network_u16(value: u16) -> [u8; 2] {
    #[expect(
        clippy::big_endian_bytes,
        reason = "Network byte order requires big-endian bytes."
    )]
    value.to_be_bytes()
}

/// Serialise a `u32` in network byte order (big-endian).
#[must_use]
pub fn write_network_u32(value: u32) -> [u8; 4] {
    #[expect(
        clippy::big_endian_bytes,
        reason = "Network byte order requires big-endian bytes."
    )]
    value.to_be_bytes()
}
