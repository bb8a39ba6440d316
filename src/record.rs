//! Conversion of raw frames into engineering units.
//!
//! [`InverterRecord`] is what gets published. Its JSON form keeps the
//! `PascalCase` keys downstream dashboards already consume.

use std::fmt;

use serde::Serialize;

use crate::frame::{FrameError, RawFrame};

/// Raw status code reported while the inverter is idle but grid-connected.
pub const STATUS_READY: u16 = 0x0000;
/// Raw status code reported while the inverter feeds the grid.
pub const STATUS_GENERATING: u16 = 0x0003;
/// Raw status code reported when the grid is absent.
pub const STATUS_NO_GRID: u16 = 0x1015;

/// Operating state of the inverter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Status {
    #[serde(rename = "Ready")]
    Ready,
    #[serde(rename = "Generating")]
    Generating,
    #[serde(rename = "No grid")]
    NoGrid,
    /// Reported as generating but producing no power, i.e. done for the day.
    #[serde(rename = "Off")]
    Off,
    #[serde(rename = "Unknown")]
    Unknown,
}

impl Status {
    /// Look up a raw status code. Codes outside the known set map to
    /// [`Status::Unknown`]; [`Status::Off`] is never produced here.
    #[must_use]
    pub const fn from_code(code: u16) -> Self {
        match code {
            STATUS_READY => Self::Ready,
            STATUS_GENERATING => Self::Generating,
            STATUS_NO_GRID => Self::NoGrid,
            _ => Self::Unknown,
        }
    }

    /// Human-readable label, identical to the serialized form.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Ready => "Ready",
            Self::Generating => "Generating",
            Self::NoGrid => "No grid",
            Self::Off => "Off",
            Self::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.label()) }
}

/// Decoded, unit-correct measurements from one frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct InverterRecord {
    /// Heat-sink temperature in °C.
    pub temperature: f64,
    /// DC string 1 voltage in V.
    pub vdc1: f64,
    /// DC string 2 voltage in V.
    pub vdc2: f64,
    /// DC string 1 current in A.
    pub adc1: f64,
    /// DC string 2 current in A.
    pub adc2: f64,
    /// AC output current in A.
    pub aac: f64,
    /// AC output voltage in V.
    pub vac: f64,
    /// Grid frequency in Hz.
    pub fac: f64,
    /// Output power in W, corrected for three phases.
    #[serde(rename = "PNow")]
    pub pnow: u16,
    /// Energy produced yesterday in kWh.
    pub yesterday: f64,
    /// Energy produced today in kWh.
    pub today: f64,
    /// Lifetime energy in kWh.
    pub total: f64,
    /// Energy produced this month in kWh, unscaled.
    pub month: u16,
    /// Energy produced last month in kWh, unscaled.
    pub last_month: u16,
    pub status: Status,
}

/// Scale single-phase power up to an estimate of the three-phase total.
///
/// The logger only reports one phase, so the raw value is multiplied by √3
/// and then truncated. Results beyond `u16::MAX` saturate.
///
/// ```
/// use ginlong_monitor::record::corrected_power;
///
/// assert_eq!(corrected_power(1000), 1732);
/// assert_eq!(corrected_power(0), 0);
/// ```
#[must_use]
#[expect(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    reason = "truncation toward zero is the documented rounding and the value is never negative"
)]
pub fn corrected_power(raw: u16) -> u16 { (f64::from(raw) * 3f64.sqrt()) as u16 }

fn tenths(raw: u16) -> f64 { f64::from(raw) / 10.0 }

fn hundredths(raw: u16) -> f64 { f64::from(raw) / 100.0 }

impl InverterRecord {
    /// Convert a raw frame.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError::InvalidPacketLength`] if the frame's declared
    /// length is wrong. Nothing else can fail.
    ///
    /// # Examples
    ///
    /// ```
    /// use ginlong_monitor::{frame::RawFrame, record::{InverterRecord, Status}};
    ///
    /// let frame = RawFrame {
    ///     temperature: 253,
    ///     fac: 5000,
    ///     status: 0x0003,
    ///     ..RawFrame::default()
    /// };
    /// let record = InverterRecord::from_frame(&frame).unwrap();
    /// assert_eq!(record.temperature, 25.3);
    /// assert_eq!(record.fac, 50.0);
    /// assert_eq!(record.status, Status::Off);
    /// ```
    pub fn from_frame(frame: &RawFrame) -> Result<Self, FrameError> {
        frame.validate()?;

        let pnow = corrected_power(frame.pnow);
        let status = if frame.status == STATUS_GENERATING && pnow == 0 {
            Status::Off
        } else {
            Status::from_code(frame.status)
        };

        Ok(Self {
            temperature: tenths(frame.temperature),
            vdc1: tenths(frame.vdc1),
            vdc2: tenths(frame.vdc2),
            adc1: tenths(frame.adc1),
            adc2: tenths(frame.adc2),
            aac: tenths(frame.aac),
            vac: tenths(frame.vac),
            fac: hundredths(frame.fac),
            pnow,
            yesterday: hundredths(frame.yesterday),
            today: hundredths(frame.today),
            total: f64::from(frame.total) / 10.0,
            month: frame.month,
            last_month: frame.last_month,
            status,
        })
    }

    /// Decode a wire buffer and convert it in one step.
    ///
    /// # Errors
    ///
    /// Propagates any [`FrameError`] from [`RawFrame::decode`].
    pub fn from_wire(bytes: &[u8]) -> Result<Self, FrameError> {
        Self::from_frame(&RawFrame::decode(bytes)?)
    }
}

impl TryFrom<&RawFrame> for InverterRecord {
    type Error = FrameError;

    fn try_from(frame: &RawFrame) -> Result<Self, Self::Error> { Self::from_frame(frame) }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use rstest::rstest;

    use super::*;
    use crate::frame::PAYLOAD_LENGTH;

    fn convert(frame: RawFrame) -> InverterRecord {
        InverterRecord::from_frame(&frame).expect("valid frame converts")
    }

    #[test]
    fn tenths_fields_are_scaled() {
        let record = convert(RawFrame {
            temperature: 253,
            vdc1: 3012,
            vdc2: 2987,
            adc1: 41,
            adc2: 39,
            aac: 52,
            vac: 2301,
            ..RawFrame::default()
        });
        assert_eq!(record.temperature, 25.3);
        assert_eq!(record.vdc1, 301.2);
        assert_eq!(record.vdc2, 298.7);
        assert_eq!(record.adc1, 4.1);
        assert_eq!(record.adc2, 3.9);
        assert_eq!(record.aac, 5.2);
        assert_eq!(record.vac, 230.1);
    }

    #[test]
    fn hundredths_and_energy_fields_are_scaled() {
        let record = convert(RawFrame {
            fac: 5000,
            yesterday: 1234,
            today: 567,
            total: 100_005,
            month: 250,
            last_month: 310,
            ..RawFrame::default()
        });
        assert_eq!(record.fac, 50.0);
        assert_eq!(record.yesterday, 12.34);
        assert_eq!(record.today, 5.67);
        assert_eq!(record.total, 10_000.5);
        assert_eq!(record.month, 250);
        assert_eq!(record.last_month, 310);
    }

    #[rstest]
    #[case(0, 0)]
    #[case(1, 1)]
    #[case(1000, 1732)]
    #[case(2500, 4330)]
    #[case(u16::MAX, u16::MAX)]
    fn power_is_multiplied_then_truncated(#[case] raw: u16, #[case] expected: u16) {
        assert_eq!(corrected_power(raw), expected);
    }

    #[rstest]
    #[case::ready(STATUS_READY, 0, Status::Ready)]
    #[case::generating(STATUS_GENERATING, 10, Status::Generating)]
    #[case::off(STATUS_GENERATING, 0, Status::Off)]
    #[case::no_grid(STATUS_NO_GRID, 0, Status::NoGrid)]
    #[case::ready_with_power(STATUS_READY, 500, Status::Ready)]
    #[case::unknown(0x0004, 0, Status::Unknown)]
    #[case::unknown_high(0xffff, 100, Status::Unknown)]
    fn status_is_mapped(#[case] code: u16, #[case] pnow: u16, #[case] expected: Status) {
        let record = convert(RawFrame {
            status: code,
            pnow,
            ..RawFrame::default()
        });
        assert_eq!(record.status, expected);
    }

    #[test]
    fn wrong_declared_length_produces_no_record() {
        let frame = RawFrame {
            length: PAYLOAD_LENGTH + 1,
            ..RawFrame::default()
        };
        assert_eq!(
            InverterRecord::try_from(&frame),
            Err(FrameError::InvalidPacketLength {
                declared: PAYLOAD_LENGTH + 1,
                expected: PAYLOAD_LENGTH,
            })
        );
    }

    #[test]
    fn serializes_with_legacy_keys() {
        let record = convert(RawFrame {
            temperature: 200,
            status: STATUS_NO_GRID,
            pnow: 1000,
            last_month: 7,
            ..RawFrame::default()
        });
        let json = serde_json::to_value(&record).expect("serialize record");
        assert_eq!(json["Temperature"], 20.0);
        assert_eq!(json["PNow"], 1732);
        assert_eq!(json["LastMonth"], 7);
        assert_eq!(json["Status"], "No grid");
        assert_eq!(json.as_object().map(serde_json::Map::len), Some(15));
    }

    proptest! {
        #[test]
        fn off_only_when_generating_without_power(status in any::<u16>(), pnow in any::<u16>()) {
            let record = convert(RawFrame { status, pnow, ..RawFrame::default() });
            let off = status == STATUS_GENERATING && corrected_power(pnow) == 0;
            prop_assert_eq!(record.status == Status::Off, off);
            if !off {
                prop_assert_eq!(record.status, Status::from_code(status));
            }
        }

        #[test]
        fn conversion_is_deterministic(bytes in proptest::collection::vec(any::<u8>(), 103)) {
            let mut bytes = bytes;
            bytes[1] = PAYLOAD_LENGTH;
            let first = InverterRecord::from_wire(&bytes);
            let second = InverterRecord::from_wire(&bytes);
            prop_assert!(first.is_ok());
            prop_assert_eq!(first, second);
        }
    }
}
