//! Platform-agnostic core logic for the voltage telemetry node
//!
//! This crate contains the sampling and delivery pipeline. It has NO
//! hardware dependencies: everything physical arrives through the traits in
//! `voltnode-hal` plus the `embedded-hal` / `embedded-io` families.
//!
//! ## Pipeline
//!
//! ```text
//! TelemetryLoop ──acquire──▶ Sampler ──▶ Reading
//!       │
//!       ├─ TelemetryMessage { voltage, sequence, device id, value }
//!       │
//!       └──send (3x)──▶ Transport ──▶ WiFi (UDP)  │ LoRa (AT+SEND)
//!                           │
//!                    ConnectionManager (WiFi association, reset on timeout)
//! ```
//!
//! Everything runs sequentially on one execution context. Waits are plain
//! awaited delays and time limits are bounded retry counts.

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]
#![deny(warnings)]

// Must come first so the other modules see the logging macros.
#[macro_use]
mod fmt;

pub mod config;
pub mod connection;
pub mod error;
pub mod message;
pub mod reading;
pub mod sampler;
pub mod telemetry;
pub mod transport;

#[cfg(test)]
pub(crate) mod testing;

pub use config::{CollectorConfig, LoraConfig, NodeConfig, TransportKind, WifiConfig};
pub use connection::{ConnectionManager, ConnectionState};
pub use error::{ConnectionError, FormatError};
pub use message::TelemetryMessage;
pub use reading::Reading;
pub use sampler::{ReadingSource, Sampler};
pub use telemetry::{CalibrationBench, TelemetryLoop};
pub use transport::{LoraTransport, NodeTransport, Transport, WifiTransport};
