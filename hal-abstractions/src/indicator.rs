//! Visual status indicator

/// Fire-and-forget visual pulse, usually the board's status LED
pub trait Indicator {
    /// Switch the indicator on for `duration_ms`, then off again
    fn pulse(&mut self, duration_ms: u32) -> impl core::future::Future<Output = ()>;
}

impl<T: Indicator + ?Sized> Indicator for &mut T {
    fn pulse(&mut self, duration_ms: u32) -> impl core::future::Future<Output = ()> {
        (**self).pulse(duration_ms)
    }
}
