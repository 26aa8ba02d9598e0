//! WiFi association state machine
//!
//! ```text
//! Disconnected ──join──▶ Connecting{polls} ──status up──▶ Connected
//!                              │
//!                              └── polls == CONNECT_POLL_LIMIT ──▶ Failed ──▶ device reset
//! ```
//!
//! The station status is polled once per [`CONNECT_POLL_INTERVAL_MS`] for at
//! most [`CONNECT_POLL_LIMIT`] polls. `Failed` is terminal: the manager
//! requests a full device restart and never tries to recover in-process.
//!
//! The collector address is resolved on the first successful association
//! and cached for the lifetime of the process; reconnects reuse it.

use core::net::SocketAddrV4;

use embedded_hal_async::delay::DelayNs;
use voltnode_hal::{Indicator, SystemReset, WifiStation};

use crate::config::{CollectorConfig, WifiConfig};
use crate::error::ConnectionError;
use crate::transport::PULSE_MS;

/// Status polls before giving up on an association
pub const CONNECT_POLL_LIMIT: u8 = 30;

/// Pause between status polls
pub const CONNECT_POLL_INTERVAL_MS: u32 = 1000;

/// Pause between logging the failure and pulling the reset
pub const RESET_GRACE_MS: u32 = 1000;

/// Association state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConnectionState {
    /// No association, none in progress
    Disconnected,
    /// Association requested; `polls` status checks have come back down
    Connecting { polls: u8 },
    /// Associated with an address
    Connected,
    /// Poll ceiling exceeded; a reset is pending
    Failed,
}

impl ConnectionState {
    /// State after one status poll that observed `connected`
    ///
    /// Only `Connecting` moves. The ceiling edge fires on the poll that
    /// brings the down-count to [`CONNECT_POLL_LIMIT`].
    pub const fn after_poll(self, connected: bool) -> Self {
        match self {
            Self::Connecting { .. } if connected => Self::Connected,
            Self::Connecting { polls } if polls.saturating_add(1) >= CONNECT_POLL_LIMIT => {
                Self::Failed
            }
            Self::Connecting { polls } => Self::Connecting { polls: polls + 1 },
            other => other,
        }
    }

    /// Polls left before the ceiling, while connecting
    pub const fn polls_remaining(self) -> u8 {
        match self {
            Self::Connecting { polls } => CONNECT_POLL_LIMIT.saturating_sub(polls),
            _ => 0,
        }
    }
}

/// Owns the station and the reset line, and the collector address once known
pub struct ConnectionManager<W, R> {
    station: W,
    reset: R,
    wifi: WifiConfig,
    collector: CollectorConfig,
    state: ConnectionState,
    server: Option<SocketAddrV4>,
    activated: bool,
}

impl<W, R> ConnectionManager<W, R>
where
    W: WifiStation,
    R: SystemReset,
{
    pub fn new(station: W, reset: R, wifi: WifiConfig, collector: CollectorConfig) -> Self {
        Self {
            station,
            reset,
            wifi,
            collector,
            state: ConnectionState::Disconnected,
            server: None,
            activated: false,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Collector address, cached after the first successful association
    pub fn server_address(&self) -> Option<SocketAddrV4> {
        self.server
    }

    #[cfg(test)]
    pub(crate) fn station_mut(&mut self) -> &mut W {
        &mut self.station
    }

    /// Whether the station currently reports an association
    pub fn is_connected(&mut self) -> bool {
        self.station.is_connected()
    }

    /// Run the state machine to `Connected` and return the collector address
    ///
    /// On timeout or resolution failure a device reset is requested before
    /// the error is returned; on hardware the return never happens.
    pub async fn establish<I, D>(
        &mut self,
        indicator: &mut I,
        delay: &mut D,
    ) -> Result<SocketAddrV4, ConnectionError>
    where
        I: Indicator,
        D: DelayNs,
    {
        if !self.activated {
            if let Err(e) = self.station.activate(self.wifi.country).await {
                warn!("WiFi radio activation failed: {}", e);
            }
            self.activated = true;
        }

        if let Err(e) = self.associate(indicator, delay).await {
            return Err(self.fail(e, delay).await);
        }

        if let Some(server) = self.server {
            return Ok(server);
        }

        match self
            .station
            .resolve(self.collector.host, self.collector.port)
            .await
        {
            Ok(server) => {
                info!(
                    "Collector {} resolved to {}:{}",
                    self.collector.host,
                    server.ip().octets(),
                    server.port()
                );
                self.server = Some(server);
                Ok(server)
            }
            Err(e) => {
                error!("Cannot resolve collector {}: {}", self.collector.host, e);
                Err(self.fail(ConnectionError::ResolveFailed, delay).await)
            }
        }
    }

    /// Re-enter the state machine if the association was lost
    ///
    /// Returns `true` if a reconnect was performed.
    pub async fn reconnect_if_lost<I, D>(
        &mut self,
        indicator: &mut I,
        delay: &mut D,
    ) -> Result<bool, ConnectionError>
    where
        I: Indicator,
        D: DelayNs,
    {
        if self.station.is_connected() {
            return Ok(false);
        }
        warn!("Lost association with {}", self.wifi.ssid);
        self.state = ConnectionState::Disconnected;
        self.establish(indicator, delay).await?;
        if let Some(ip) = self.station.local_address() {
            info!("Reconnected as IP {}", ip.octets());
        }
        Ok(true)
    }

    async fn associate<I, D>(
        &mut self,
        indicator: &mut I,
        delay: &mut D,
    ) -> Result<(), ConnectionError>
    where
        I: Indicator,
        D: DelayNs,
    {
        info!("Connecting to {} ...", self.wifi.ssid);
        indicator.pulse(PULSE_MS).await;
        if let Err(e) = self.station.join(self.wifi.ssid, self.wifi.password).await {
            // Status polling decides the outcome; a rejected request just
            // means the polls come back down.
            warn!("Join request to {} failed: {}", self.wifi.ssid, e);
        }

        self.state = ConnectionState::Connecting { polls: 0 };
        loop {
            let connected = self.station.is_connected();
            self.state = self.state.after_poll(connected);
            match self.state {
                ConnectionState::Connected => break,
                ConnectionState::Failed => return Err(ConnectionError::Timeout),
                ConnectionState::Disconnected | ConnectionState::Connecting { .. } => {
                    info!(
                        " waiting for connection to {} countdown {}",
                        self.wifi.ssid,
                        self.state.polls_remaining()
                    );
                    indicator.pulse(PULSE_MS).await;
                    delay.delay_ms(CONNECT_POLL_INTERVAL_MS).await;
                }
            }
        }

        match self.station.local_address() {
            Some(ip) => info!("Connected as IP {}", ip.octets()),
            None => info!("Connected to {}", self.wifi.ssid),
        }
        Ok(())
    }

    async fn fail<D: DelayNs>(&mut self, cause: ConnectionError, delay: &mut D) -> ConnectionError {
        self.state = ConnectionState::Failed;
        error!("Failed to connect to {} ({}), rebooting", self.wifi.ssid, cause);
        delay.delay_ms(RESET_GRACE_MS).await;
        self.reset.reset();
        cause
    }
}
