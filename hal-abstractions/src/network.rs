//! WiFi station and datagram socket interfaces
//!
//! These cover exactly what the telemetry node needs from an IP stack:
//! associate with an access point, report association status, resolve the
//! collector once, and fire datagrams at it. Addresses use `core::net` so
//! the traits stay independent of any particular network stack.

use core::future::Future;
use core::net::{Ipv4Addr, SocketAddrV4};

/// Link-layer and socket errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkError {
    /// Radio or co-processor failed to come up
    RadioInit,
    /// Access point refused the association request
    JoinRejected,
    /// Host name did not resolve to an IPv4 address
    ResolveFailed,
    /// Operation needs an associated link
    NotConnected,
    /// Datagram could not be queued for transmission
    SendFailed,
}

impl core::fmt::Display for LinkError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::RadioInit => write!(f, "Radio initialization failed"),
            Self::JoinRejected => write!(f, "Association rejected"),
            Self::ResolveFailed => write!(f, "Name resolution failed"),
            Self::NotConnected => write!(f, "Link not connected"),
            Self::SendFailed => write!(f, "Datagram send failed"),
        }
    }
}

impl core::error::Error for LinkError {}

impl embedded_io::Error for LinkError {
    fn kind(&self) -> embedded_io::ErrorKind {
        match self {
            Self::NotConnected => embedded_io::ErrorKind::NotConnected,
            Self::JoinRejected => embedded_io::ErrorKind::ConnectionRefused,
            Self::ResolveFailed => embedded_io::ErrorKind::AddrNotAvailable,
            Self::SendFailed => embedded_io::ErrorKind::BrokenPipe,
            Self::RadioInit => embedded_io::ErrorKind::Other,
        }
    }
}

/// WiFi station interface
pub trait WifiStation {
    /// Power up the radio with its regulatory domain fixed to `country`
    /// (ISO 3166 alpha-2). Called once before the first association.
    fn activate(&mut self, country: &str) -> impl Future<Output = Result<(), LinkError>>;

    /// Issue an association request to the access point
    ///
    /// Completion of this call does not imply the link is usable; callers
    /// poll [`WifiStation::is_connected`] for that.
    fn join(&mut self, ssid: &str, password: &str)
        -> impl Future<Output = Result<(), LinkError>>;

    /// Whether the station is associated and holds an IPv4 address
    fn is_connected(&mut self) -> bool;

    /// Address assigned to this station, if any
    fn local_address(&self) -> Option<Ipv4Addr>;

    /// Resolve `host` to an IPv4 socket address on `port`
    fn resolve(
        &mut self,
        host: &str,
        port: u16,
    ) -> impl Future<Output = Result<SocketAddrV4, LinkError>>;
}

/// Connectionless datagram socket
pub trait DatagramSocket {
    /// Queue `payload` for transmission to `remote`. Never waits for a reply.
    fn send_to(
        &mut self,
        payload: &[u8],
        remote: SocketAddrV4,
    ) -> impl Future<Output = Result<(), LinkError>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_io::Error as _;

    #[test]
    fn test_error_display() {
        assert_eq!(LinkError::ResolveFailed.to_string(), "Name resolution failed");
        assert_eq!(LinkError::SendFailed.to_string(), "Datagram send failed");
    }

    #[test]
    fn test_error_kind_mapping() {
        assert_eq!(
            LinkError::NotConnected.kind(),
            embedded_io::ErrorKind::NotConnected
        );
        assert_eq!(LinkError::RadioInit.kind(), embedded_io::ErrorKind::Other);
    }
}
