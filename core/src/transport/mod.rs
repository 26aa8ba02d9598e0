//! Message delivery
//!
//! A [`Transport`] pushes one [`TelemetryMessage`] towards the collector.
//! There is no acknowledgement at any layer, so reliability comes from
//! repetition: every send transmits the same serialized message
//! [`SEND_REPEATS`] times, [`RETRANSMIT_PAUSE_MS`] apart, with one
//! indicator pulse per physical attempt.
//!
//! # Fire-and-forget
//!
//! `send` has no error return. Transport failures are logged and dropped;
//! a missing message shows up as a gap in the sequence numbers the
//! collector receives. Do not turn this into an error path: the control
//! loop has nothing useful to do with one.

pub mod lora;
pub mod wifi;

pub use lora::LoraTransport;
pub use wifi::WifiTransport;

use core::future::Future;

use embedded_hal_async::delay::DelayNs;
use voltnode_hal::{DatagramSocket, Indicator, SystemReset, WifiStation};

use crate::message::TelemetryMessage;

/// Physical transmissions per message
pub const SEND_REPEATS: usize = 3;

/// Pause between two transmissions of the same message
pub const RETRANSMIT_PAUSE_MS: u32 = 500;

/// Indicator on-time for one pulse
pub const PULSE_MS: u32 = 100;

/// Delivery of telemetry to the collector
pub trait Transport {
    /// Bring the transport up; called once before the first send
    fn start(&mut self) -> impl Future<Output = ()>;

    /// Keep the transport usable; called at the top of every cycle
    fn maintain(&mut self) -> impl Future<Output = ()> {
        async {}
    }

    /// Transmit `message` [`SEND_REPEATS`] times. Best effort, never fails.
    fn send(&mut self, message: &TelemetryMessage) -> impl Future<Output = ()>;
}

/// The transport the node was configured with
///
/// Chosen once at boot; call sites only ever see [`Transport`].
pub enum NodeTransport<W, S, R, U, I, D> {
    Wifi(WifiTransport<W, S, R, I, D>),
    Lora(LoraTransport<U, I, D>),
}

impl<W, S, R, U, I, D> Transport for NodeTransport<W, S, R, U, I, D>
where
    W: WifiStation,
    S: DatagramSocket,
    R: SystemReset,
    U: embedded_io_async::Read + embedded_io_async::Write + embedded_io::ReadReady,
    I: Indicator,
    D: DelayNs,
{
    async fn start(&mut self) {
        match self {
            Self::Wifi(wifi) => wifi.start().await,
            Self::Lora(lora) => lora.start().await,
        }
    }

    async fn maintain(&mut self) {
        match self {
            Self::Wifi(wifi) => wifi.maintain().await,
            Self::Lora(lora) => lora.maintain().await,
        }
    }

    async fn send(&mut self, message: &TelemetryMessage) {
        match self {
            Self::Wifi(wifi) => wifi.send(message).await,
            Self::Lora(lora) => lora.send(message).await,
        }
    }
}
