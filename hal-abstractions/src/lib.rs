//! Hardware abstraction traits for the voltage telemetry node
//!
//! This crate defines the narrow interfaces the sampling and delivery
//! pipeline consumes. Board crates implement them on top of their HAL;
//! host tests implement them with fakes.
//!
//! The power gate is any `embedded_hal::digital::OutputPin`, pauses use
//! `embedded_hal_async::delay::DelayNs` and the radio UART is any
//! `embedded-io-async` byte stream, so none of those get a trait here.

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]
#![deny(warnings)]

pub mod adc;
pub mod indicator;
pub mod network;
pub mod system;

pub use adc::AdcChannel;
pub use indicator::Indicator;
pub use network::{DatagramSocket, LinkError, WifiStation};
pub use system::SystemReset;
