//! UDP over a WiFi station link

use core::net::SocketAddrV4;

use embedded_hal_async::delay::DelayNs;
use voltnode_hal::{DatagramSocket, Indicator, SystemReset, WifiStation};

use super::{Transport, PULSE_MS, RETRANSMIT_PAUSE_MS, SEND_REPEATS};
use crate::connection::ConnectionManager;
use crate::message::TelemetryMessage;

/// Sends comma-delimited payloads as UDP datagrams to the collector
///
/// The collector address comes from the [`ConnectionManager`], which
/// resolves it once on the first association.
pub struct WifiTransport<W, S, R, I, D> {
    link: ConnectionManager<W, R>,
    socket: S,
    indicator: I,
    delay: D,
}

impl<W, S, R, I, D> WifiTransport<W, S, R, I, D>
where
    W: WifiStation,
    S: DatagramSocket,
    R: SystemReset,
    I: Indicator,
    D: DelayNs,
{
    pub fn new(link: ConnectionManager<W, R>, socket: S, indicator: I, delay: D) -> Self {
        Self {
            link,
            socket,
            indicator,
            delay,
        }
    }

    pub fn link(&self) -> &ConnectionManager<W, R> {
        &self.link
    }

    async fn transmit(&mut self, payload: &[u8], server: SocketAddrV4) {
        if let Err(e) = self.socket.send_to(payload, server).await {
            warn!("UDP send failed: {}", e);
        }
    }
}

impl<W, S, R, I, D> Transport for WifiTransport<W, S, R, I, D>
where
    W: WifiStation,
    S: DatagramSocket,
    R: SystemReset,
    I: Indicator,
    D: DelayNs,
{
    async fn start(&mut self) {
        if let Ok(server) = self.link.establish(&mut self.indicator, &mut self.delay).await {
            info!("Server is {}:{}", server.ip().octets(), server.port());
        }
    }

    async fn maintain(&mut self) {
        // Failure already requested a reset; nothing left to do here.
        let _ = self
            .link
            .reconnect_if_lost(&mut self.indicator, &mut self.delay)
            .await;
    }

    async fn send(&mut self, message: &TelemetryMessage) {
        let Some(server) = self.link.server_address() else {
            warn!("No collector address yet, dropping message {}", message.sequence());
            return;
        };
        let payload = match message.udp_payload() {
            Ok(payload) => payload,
            Err(e) => {
                warn!("Cannot format message {}: {}", message.sequence(), e);
                return;
            }
        };
        info!("{}", payload.as_str());

        for attempt in 0..SEND_REPEATS {
            if attempt > 0 {
                self.delay.delay_ms(RETRANSMIT_PAUSE_MS).await;
            }
            self.transmit(payload.as_bytes(), server).await;
            self.indicator.pulse(PULSE_MS).await;
        }
    }
}
