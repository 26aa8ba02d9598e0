//! Denoised differential ADC acquisition
//!
//! The sense input is read against a second ADC input tied to analog
//! ground, which cancels most of the converter's offset. An auxiliary
//! supply is switched into low-noise mode for the duration of the batch
//! only, since it costs power.
//!
//! The algorithm is fixed for calibration compatibility with deployed
//! collectors:
//!
//! 1. power gate HIGH
//! 2. [`SAMPLE_COUNT`] samples of `primary - reference`
//! 3. power gate LOW, before any arithmetic
//! 4. arithmetic mean of the batch

use core::convert::Infallible;

use embedded_hal::digital::OutputPin;
use voltnode_hal::AdcChannel;

use crate::reading::Reading;

/// Differential samples per reading
pub const SAMPLE_COUNT: usize = 100;

/// Anything that produces a reading on demand
pub trait ReadingSource {
    /// Take one complete reading
    fn acquire(&mut self) -> Reading;
}

/// Differential ADC sampler with power-gated acquisition
pub struct Sampler<P, R, G> {
    primary: P,
    reference: R,
    gate: G,
}

impl<P, R, G> Sampler<P, R, G>
where
    P: AdcChannel,
    R: AdcChannel,
    G: OutputPin<Error = Infallible>,
{
    /// Take ownership of both ADC inputs and the power gate
    ///
    /// The gate is driven LOW immediately so the node idles in low-power
    /// mode regardless of the pin's reset state.
    pub fn new(primary: P, reference: R, mut gate: G) -> Self {
        gate.set_low().unwrap_or_else(|never| match never {});
        Self {
            primary,
            reference,
            gate,
        }
    }

    /// Release the hardware handles
    pub fn release(self) -> (P, R, G) {
        (self.primary, self.reference, self.gate)
    }
}

impl<P, R, G> ReadingSource for Sampler<P, R, G>
where
    P: AdcChannel,
    R: AdcChannel,
    G: OutputPin<Error = Infallible>,
{
    fn acquire(&mut self) -> Reading {
        self.gate.set_high().unwrap_or_else(|never| match never {});

        let mut samples = [0i32; SAMPLE_COUNT];
        for sample in samples.iter_mut() {
            *sample = i32::from(self.primary.read()) - i32::from(self.reference.read());
        }

        self.gate.set_low().unwrap_or_else(|never| match never {});

        let reading = Reading::mean_of(&samples);
        debug!("Acquired raw voltage {}", reading);
        reading
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Event, EventLog, FakeAdc, FakeGate};

    fn sampler(
        log: &EventLog,
        primary: Vec<u16>,
        reference: Vec<u16>,
    ) -> Sampler<FakeAdc, FakeAdc, FakeGate> {
        Sampler::new(
            FakeAdc::new(log, "primary", primary),
            FakeAdc::new(log, "reference", reference),
            FakeGate::new(log),
        )
    }

    #[test]
    fn test_mean_of_differences() {
        let log = EventLog::default();
        let primary: Vec<u16> = (0..100).map(|i| 1000 + i).collect();
        let reference = vec![200; 100];
        let mut sampler = sampler(&log, primary, reference);

        // sum(800..900) / 100
        assert_eq!(sampler.acquire().raw(), 849.5);
    }

    #[test]
    fn test_reference_above_primary_reads_negative() {
        let log = EventLog::default();
        let mut sampler = sampler(&log, vec![100; 100], vec![350; 100]);
        assert_eq!(sampler.acquire().raw(), -250.0);
    }

    #[test]
    fn test_common_offset_cancels() {
        let primary: Vec<u16> = (0..100).map(|i| 3000 + (i * 37) % 500).collect();
        let reference: Vec<u16> = (0..100).map(|i| 40 + (i * 11) % 60).collect();

        let log = EventLog::default();
        let base = sampler(&log, primary.clone(), reference.clone()).acquire();

        for offset in [1u16, 17, 1000, 20000] {
            let shifted = sampler(
                &log,
                primary.iter().map(|s| s + offset).collect(),
                reference.iter().map(|s| s + offset).collect(),
            )
            .acquire();
            assert_eq!(base.raw().to_bits(), shifted.raw().to_bits());
        }
    }

    #[test]
    fn test_gate_brackets_exactly_one_batch() {
        let log = EventLog::default();
        let mut sampler = sampler(&log, vec![5; 100], vec![1; 100]);
        log.clear();

        sampler.acquire();

        let events = log.take();
        assert_eq!(events.first(), Some(&Event::GateHigh));
        assert_eq!(events.last(), Some(&Event::GateLow));
        let reads = events
            .iter()
            .filter(|e| matches!(e, Event::AdcRead(_)))
            .count();
        assert_eq!(reads, 2 * SAMPLE_COUNT);
        assert_eq!(events.len(), 2 * SAMPLE_COUNT + 2);
    }

    #[test]
    fn test_new_parks_gate_low() {
        let log = EventLog::default();
        let _sampler = sampler(&log, vec![], vec![]);
        assert_eq!(log.take(), vec![Event::GateLow]);
    }

    #[test]
    fn test_reads_alternate_primary_then_reference() {
        let log = EventLog::default();
        let mut sampler = sampler(&log, vec![9; 100], vec![3; 100]);
        log.clear();
        sampler.acquire();

        let events = log.take();
        assert_eq!(events[1], Event::AdcRead("primary"));
        assert_eq!(events[2], Event::AdcRead("reference"));
        assert_eq!(events[3], Event::AdcRead("primary"));
    }
}
