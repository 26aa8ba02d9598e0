//! Pipeline error types

/// Message text did not fit its fixed-capacity buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FormatError {
    /// Rendered text exceeds the buffer capacity
    Overflow,
}

impl core::fmt::Display for FormatError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Overflow => write!(f, "Message exceeds buffer capacity"),
        }
    }
}

impl core::error::Error for FormatError {}

impl From<core::fmt::Error> for FormatError {
    fn from(_: core::fmt::Error) -> Self {
        Self::Overflow
    }
}

/// Connection establishment failures
///
/// Both variants are fatal: the manager requests a device reset before
/// returning them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConnectionError {
    /// Association not reached within the poll ceiling
    Timeout,
    /// Collector host name did not resolve
    ResolveFailed,
}

impl core::fmt::Display for ConnectionError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Timeout => write!(f, "Connection timeout"),
            Self::ResolveFailed => write!(f, "Collector address resolution failed"),
        }
    }
}

impl core::error::Error for ConnectionError {}
