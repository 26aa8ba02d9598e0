#![deny(unsafe_code)]
#![deny(warnings)]
//! Board bindings for the platform-neutral node traits

use embassy_stm32::adc::{Adc, AnyAdcChannel, Instance};
use embassy_stm32::gpio::Output;
use embassy_time::Timer;
use voltnode_hal::{AdcChannel, Indicator, SystemReset};

/// One analog input with its own converter
///
/// The primary and reference inputs live on ADC1 and ADC2 so that a
/// reading pair is taken back to back without re-muxing one converter.
pub struct AdcInput<T: Instance> {
    adc: Adc<'static, T>,
    channel: AnyAdcChannel<T>,
}

impl<T: Instance> AdcInput<T> {
    pub fn new(adc: Adc<'static, T>, channel: AnyAdcChannel<T>) -> Self {
        Self { adc, channel }
    }
}

impl<T: Instance> AdcChannel for AdcInput<T> {
    fn read(&mut self) -> u16 {
        voltnode_hal::adc::scale_12_to_16(self.adc.blocking_read(&mut self.channel))
    }
}

/// On-board red LED (PC1)
pub struct StatusLed(pub Output<'static>);

impl Indicator for StatusLed {
    async fn pulse(&mut self, duration_ms: u32) {
        self.0.set_high();
        Timer::after_millis(u64::from(duration_ms)).await;
        self.0.set_low();
    }
}

/// Cortex-M system reset through the SCB
pub struct ChipReset;

impl SystemReset for ChipReset {
    fn reset(&mut self) {
        cortex_m::peripheral::SCB::sys_reset();
    }
}

/// Presents an `embedded-io` 0.6 UART through the 0.7 traits
pub struct RadioUart<U>(pub U);

impl<U: embedded_io_06::ErrorType> embedded_io::ErrorType for RadioUart<U> {
    type Error = embedded_io::ErrorKind;
}

impl<U: embedded_io_async_06::Read> embedded_io_async::Read for RadioUart<U> {
    async fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        self.0
            .read(buf)
            .await
            .map_err(|_| embedded_io::ErrorKind::Other)
    }
}

impl<U: embedded_io_async_06::Write> embedded_io_async::Write for RadioUart<U> {
    async fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        self.0
            .write(buf)
            .await
            .map_err(|_| embedded_io::ErrorKind::Other)
    }

    async fn flush(&mut self) -> Result<(), Self::Error> {
        self.0.flush().await.map_err(|_| embedded_io::ErrorKind::Other)
    }
}

impl<U: embedded_io_06::ReadReady> embedded_io::ReadReady for RadioUart<U> {
    fn read_ready(&mut self) -> Result<bool, Self::Error> {
        self.0.read_ready().map_err(|_| embedded_io::ErrorKind::Other)
    }
}
