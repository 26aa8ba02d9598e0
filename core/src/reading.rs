//! Raw voltage reading
//!
//! A reading is the mean of a batch of differential ADC samples. It stays
//! in raw converter units; the collector owns the conversion to volts.

/// Mean of a batch of differential ADC samples, in raw units
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Reading(f64);

impl Reading {
    /// Wrap an already-averaged raw value
    pub const fn from_raw(raw: f64) -> Self {
        Self(raw)
    }

    /// Arithmetic mean of `samples`
    ///
    /// The sum is exact in `i64` and divided once, so identical samples
    /// always give a bit-identical reading. An empty batch reads as zero.
    pub fn mean_of(samples: &[i32]) -> Self {
        if samples.is_empty() {
            return Self(0.0);
        }
        let sum: i64 = samples.iter().map(|&s| i64::from(s)).sum();
        Self(sum as f64 / samples.len() as f64)
    }

    /// Raw averaged value
    pub const fn raw(self) -> f64 {
        self.0
    }
}

/// Wire text of the value: shortest round-trip decimal, always with a
/// fractional part (`12345.0`, `123.45`, `-0.5`).
impl core::fmt::Display for Reading {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{:?}", self.0)
    }
}
