//! Top-level control loop
//!
//! Each cycle, unconditionally:
//!
//! 1. let the transport repair its link (WiFi only)
//! 2. acquire a reading
//! 3. wrap it in a message with the current sequence number
//! 4. send it (three physical transmissions)
//! 5. bump the sequence number, whatever happened in step 4
//! 6. sleep [`CYCLE_INTERVAL_MS`]
//!
//! The loop never returns. It ends with power loss, a watchdog, or the
//! connection manager's reset.

use embedded_hal_async::delay::DelayNs;
use voltnode_hal::Indicator;

use crate::message::TelemetryMessage;
use crate::reading::Reading;
use crate::sampler::ReadingSource;
use crate::transport::{Transport, PULSE_MS, RETRANSMIT_PAUSE_MS};

/// Pause between two telemetry cycles
pub const CYCLE_INTERVAL_MS: u32 = 60_000;

/// Pause between two bench readings in calibration mode
pub const CALIBRATION_INTERVAL_MS: u32 = 250;

/// Pulses in the boot signal
pub const STARTUP_PULSES: usize = 3;

/// Blink the boot signal: three pulses half a second apart
pub async fn startup_signal<I: Indicator, D: DelayNs>(indicator: &mut I, delay: &mut D) {
    for pulse in 0..STARTUP_PULSES {
        if pulse > 0 {
            delay.delay_ms(RETRANSMIT_PAUSE_MS).await;
        }
        indicator.pulse(PULSE_MS).await;
    }
}

/// Periodic sample-and-send loop
pub struct TelemetryLoop<S, T, D> {
    source: S,
    transport: T,
    delay: D,
    device_id: u16,
    sequence: u32,
}

impl<S, T, D> TelemetryLoop<S, T, D>
where
    S: ReadingSource,
    T: Transport,
    D: DelayNs,
{
    /// New loop starting at sequence number 0
    pub fn new(source: S, transport: T, delay: D, device_id: u16) -> Self {
        Self {
            source,
            transport,
            delay,
            device_id,
            sequence: 0,
        }
    }

    /// Sequence number the next message will carry
    pub fn sequence(&self) -> u32 {
        self.sequence
    }

    /// Bring the transport up
    pub async fn start(&mut self) {
        info!("Starting telemetry as device {}", self.device_id);
        self.transport.start().await;
    }

    /// Run one full cycle, including the trailing sleep
    ///
    /// Returns the message that was handed to the transport.
    pub async fn cycle(&mut self) -> TelemetryMessage {
        self.transport.maintain().await;

        let value = self.source.acquire();
        let message = TelemetryMessage::voltage(self.sequence, self.device_id, value);
        self.transport.send(&message).await;

        self.sequence = self.sequence.wrapping_add(1);
        self.delay.delay_ms(CYCLE_INTERVAL_MS).await;
        message
    }

    /// Start the transport and cycle forever
    pub async fn run(mut self) -> ! {
        self.start().await;
        loop {
            self.cycle().await;
        }
    }
}

/// Bench loop for calibrating the divider against a meter
///
/// Logs a reading every [`CALIBRATION_INTERVAL_MS`]; no transport involved.
pub struct CalibrationBench<S, D> {
    source: S,
    delay: D,
}

impl<S, D> CalibrationBench<S, D>
where
    S: ReadingSource,
    D: DelayNs,
{
    pub fn new(source: S, delay: D) -> Self {
        Self { source, delay }
    }

    /// Take and log one reading, then wait out the interval
    pub async fn step(&mut self) -> Reading {
        let reading = self.source.acquire();
        info!("{}", reading);
        self.delay.delay_ms(CALIBRATION_INTERVAL_MS).await;
        reading
    }

    pub async fn run(mut self) -> ! {
        loop {
            self.step().await;
        }
    }
}
