//! Human-readable dump of a captured frame, used by the `parse` subcommand.

use std::fmt;

use crate::{
    frame::{self, FrameError, RawFrame},
    record::InverterRecord,
};

/// Printable view of one frame: header fields followed by the converted
/// measurements when the frame passes validation.
#[derive(Debug)]
pub struct FrameReport {
    frame: RawFrame,
    computed_checksum: Option<u8>,
    record: Result<InverterRecord, FrameError>,
}

impl FrameReport {
    /// Build a report from raw wire bytes.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError::WireLength`] if `wire` is not a full frame. A bad
    /// declared length is reported inside the output instead.
    pub fn new(wire: &[u8]) -> Result<Self, FrameError> {
        let frame = RawFrame::from_wire(wire)?;
        Ok(Self {
            frame,
            computed_checksum: frame::checksum(wire),
            record: InverterRecord::from_frame(&frame),
        })
    }

    /// Converted record, if the frame is valid.
    #[must_use]
    pub fn record(&self) -> Option<&InverterRecord> { self.record.as_ref().ok() }
}

struct Hex<'a>(&'a [u8]);

impl fmt::Display for Hex<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("0x")?;
        self.0.iter().try_for_each(|b| write!(f, "{b:02x}"))
    }
}

impl fmt::Display for FrameReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let raw = &self.frame;
        writeln!(f, "Start: {:#04x}", raw.start)?;
        writeln!(f, "Length: {:#04x}", raw.length)?;
        writeln!(f, "Control code: {}", Hex(&raw.control_code))?;
        writeln!(f, "Id: {}", Hex(&raw.id1))?;
        writeln!(f, "Id2: {}", Hex(&raw.id2))?;
        writeln!(f, "Command: {:#04x}", raw.command)?;
        writeln!(f, "Protocol: {}", Hex(&raw.protocol_type))?;
        writeln!(f, "Serial: {}", raw.serial_text())?;
        writeln!(f, "Status: {:#06x}", raw.status)?;
        writeln!(f, "End: {:#04x}", raw.end)?;
        match self.computed_checksum {
            Some(sum) if sum == raw.checksum => writeln!(f, "Checksum: {:#04x} (ok)", raw.checksum)?,
            Some(sum) => writeln!(
                f,
                "Checksum: {:#04x} (computed {sum:#04x}, not validated)",
                raw.checksum
            )?,
            None => writeln!(f, "Checksum: {:#04x}", raw.checksum)?,
        }

        let record = match &self.record {
            Ok(record) => record,
            Err(e) => return writeln!(f, "Invalid packet: {e}"),
        };
        writeln!(f, "Temperature: {} *C", record.temperature)?;
        writeln!(f, "Vdc1: {} V", record.vdc1)?;
        writeln!(f, "Vdc2: {} V", record.vdc2)?;
        writeln!(f, "Adc1: {} A", record.adc1)?;
        writeln!(f, "Adc2: {} A", record.adc2)?;
        writeln!(f, "Vac: {} V", record.vac)?;
        writeln!(f, "Aac: {} A", record.aac)?;
        writeln!(f, "Fac: {} Hz", record.fac)?;
        writeln!(f, "Power now: {} W", record.pnow)?;
        writeln!(f, "Yesterday energy: {} kWh", record.yesterday)?;
        writeln!(f, "Today energy: {} kWh", record.today)?;
        writeln!(f, "Total energy: {} kWh", record.total)?;
        writeln!(f, "Month energy: {} kWh", record.month)?;
        writeln!(f, "Last month energy: {} kWh", record.last_month)?;
        writeln!(f, "Inverter status: {}", record.status)
    }
}
