//! Analog input channels

/// A single-ended ADC input
///
/// Samples are left-justified to 16 bits regardless of the converter's
/// native resolution, so `u16::MAX` is always full scale. The collector's
/// calibration assumes this scaling.
pub trait AdcChannel {
    /// Take one conversion
    ///
    /// Reads are treated as infallible. A faulty converter shows up as
    /// implausible values at the collector.
    fn read(&mut self) -> u16;
}

impl<T: AdcChannel + ?Sized> AdcChannel for &mut T {
    fn read(&mut self) -> u16 {
        (**self).read()
    }
}

/// Widen a right-aligned 12-bit conversion to the 16-bit scale
///
/// The top nibble is replicated into the low bits so that 0xFFF maps to
/// 0xFFFF rather than 0xFFF0.
pub const fn scale_12_to_16(raw: u16) -> u16 {
    let raw = raw & 0x0FFF;
    (raw << 4) | (raw >> 8)
}
