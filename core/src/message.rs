//! Telemetry message and its wire formats
//!
//! The collector parses two text encodings of the same message:
//!
//! - UDP payload: `voltage,<sequence>,<device id>,<value>` (no newline)
//! - LoRa payload: `voltage:<sequence>:<device id>:<value>`, carried inside
//!   an `AT+SEND` command (see [`crate::transport::lora`])
//!
//! Both are pure functions of the message fields.

use core::fmt::Write;

use heapless::String;

use crate::error::FormatError;
use crate::reading::Reading;

/// Capacity of a rendered payload
///
/// The longest possible payload (`u32::MAX` sequence, `u16::MAX` id, a
/// negative full-scale hundredths value) is well under half of this.
pub const PAYLOAD_CAPACITY: usize = 64;

/// Kind tag of battery voltage messages
pub const VOLTAGE_KIND: &str = "voltage";

/// Rendered payload text
pub type Payload = String<PAYLOAD_CAPACITY>;

/// One telemetry record, immutable once built
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TelemetryMessage {
    kind: &'static str,
    sequence: u32,
    device_id: u16,
    value: Reading,
}

impl TelemetryMessage {
    /// Build a voltage message
    pub const fn voltage(sequence: u32, device_id: u16, value: Reading) -> Self {
        Self {
            kind: VOLTAGE_KIND,
            sequence,
            device_id,
            value,
        }
    }

    pub const fn kind(&self) -> &'static str {
        self.kind
    }

    pub const fn sequence(&self) -> u32 {
        self.sequence
    }

    pub const fn device_id(&self) -> u16 {
        self.device_id
    }

    pub const fn value(&self) -> Reading {
        self.value
    }

    /// Comma-delimited UDP payload
    pub fn udp_payload(&self) -> Result<Payload, FormatError> {
        self.render(',')
    }

    /// Colon-delimited LoRa payload, without the AT envelope
    pub fn lora_payload(&self) -> Result<Payload, FormatError> {
        self.render(':')
    }

    fn render(&self, delimiter: char) -> Result<Payload, FormatError> {
        let mut out = Payload::new();
        write!(
            out,
            "{kind}{d}{seq}{d}{id}{d}{value}",
            kind = self.kind,
            seq = self.sequence,
            id = self.device_id,
            value = self.value,
            d = delimiter,
        )?;
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> TelemetryMessage {
        TelemetryMessage::voltage(7, 42, Reading::from_raw(12345.0))
    }

    #[test]
    fn test_udp_payload() {
        assert_eq!(sample().udp_payload().unwrap().as_str(), "voltage,7,42,12345.0");
    }

    #[test]
    fn test_lora_payload() {
        assert_eq!(sample().lora_payload().unwrap().as_str(), "voltage:7:42:12345.0");
    }

    #[test]
    fn test_payload_is_pure() {
        let a = TelemetryMessage::voltage(3, 9, Reading::from_raw(-17.25));
        let b = TelemetryMessage::voltage(3, 9, Reading::from_raw(-17.25));
        assert_eq!(a.udp_payload().unwrap(), b.udp_payload().unwrap());
        assert_eq!(a.lora_payload().unwrap(), b.lora_payload().unwrap());
    }

    #[test]
    fn test_worst_case_fits() {
        let msg = TelemetryMessage::voltage(u32::MAX, u16::MAX, Reading::from_raw(-65535.0));
        assert_eq!(
            msg.udp_payload().unwrap().as_str(),
            "voltage,4294967295,65535,-65535.0"
        );
    }

    #[test]
    fn test_kind_tag() {
        assert_eq!(sample().kind(), "voltage");
    }
}
