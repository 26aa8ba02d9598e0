//! LoRa radio driven by AT commands over a UART
//!
//! The radio (a RYLR-style module) is treated as a dumb pipe: each command
//! is written with a CRLF terminator, then whatever the radio says within
//! [`RADIO_RESPONSE_WAIT_MS`] is drained and logged without being parsed.
//!
//! Wire format of a telemetry send:
//!
//! ```text
//! AT+SEND=<server id>,<payload length>,voltage:<sequence>:<device id>:<value>\r\n
//! ```

use core::fmt::Write as _;

use embedded_hal_async::delay::DelayNs;
use heapless::String;
use voltnode_hal::Indicator;

use super::{Transport, PULSE_MS, RETRANSMIT_PAUSE_MS, SEND_REPEATS};
use crate::config::LoraConfig;
use crate::error::FormatError;
use crate::fmt::Debug2Format;
use crate::message::TelemetryMessage;

/// Wait after each command before draining the radio's reply
pub const RADIO_RESPONSE_WAIT_MS: u32 = 500;

/// Capacity of one rendered command, without the CRLF
pub const COMMAND_CAPACITY: usize = 96;

const LINE_END: &[u8] = b"\r\n";

/// Rendered command text
pub type CommandLine = String<COMMAND_CAPACITY>;

/// Commands understood by the radio
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AtCommand<'a> {
    /// `AT+ADDRESS=<address>`: this radio's address
    Address(u16),
    /// `AT+NETWORKID=<id>`
    NetworkId(u8),
    /// `AT+BAND=<hz>`
    Band(u32),
    /// `AT+SEND=<address>,<length>,<payload>`
    Send { address: u16, payload: &'a str },
}

impl AtCommand<'_> {
    /// Render the command line, without the CRLF terminator
    pub fn render(&self) -> Result<CommandLine, FormatError> {
        let mut line = CommandLine::new();
        match self {
            Self::Address(address) => write!(line, "AT+ADDRESS={address}")?,
            Self::NetworkId(id) => write!(line, "AT+NETWORKID={id}")?,
            Self::Band(hz) => write!(line, "AT+BAND={hz}")?,
            Self::Send { address, payload } => {
                write!(line, "AT+SEND={address},{},{payload}", payload.len())?
            }
        }
        Ok(line)
    }
}

/// Longest valid UTF-8 prefix of `bytes`
fn printable(bytes: &[u8]) -> &str {
    match core::str::from_utf8(bytes) {
        Ok(text) => text,
        Err(e) => core::str::from_utf8(&bytes[..e.valid_up_to()]).unwrap_or_default(),
    }
}

/// Sends colon-delimited payloads through an AT-command LoRa radio
pub struct LoraTransport<U, I, D> {
    uart: U,
    indicator: I,
    delay: D,
    device_id: u16,
    config: LoraConfig,
}

impl<U, I, D> LoraTransport<U, I, D>
where
    U: embedded_io_async::Read + embedded_io_async::Write + embedded_io::ReadReady,
    I: Indicator,
    D: DelayNs,
{
    pub fn new(uart: U, indicator: I, delay: D, device_id: u16, config: LoraConfig) -> Self {
        Self {
            uart,
            indicator,
            delay,
            device_id,
            config,
        }
    }

    /// Program the radio's address, network id and band
    pub async fn configure(&mut self) {
        let setup = [
            AtCommand::Address(self.device_id),
            AtCommand::NetworkId(self.config.network_id),
            AtCommand::Band(self.config.band_hz),
        ];
        for command in &setup {
            self.command(command).await;
        }
    }

    /// Write one command, wait, then log whatever the radio answered
    pub async fn command(&mut self, command: &AtCommand<'_>) {
        let line = match command.render() {
            Ok(line) => line,
            Err(e) => {
                warn!("Cannot render radio command: {}", e);
                return;
            }
        };
        info!("{}", line.as_str());
        if let Err(e) = self.write_line(&line).await {
            warn!("Radio write failed: {}", Debug2Format(&embedded_io::Error::kind(&e)));
        }
        self.delay.delay_ms(RADIO_RESPONSE_WAIT_MS).await;
        self.drain_responses().await;
    }

    async fn write_line(&mut self, line: &str) -> Result<(), U::Error> {
        self.uart.write_all(line.as_bytes()).await?;
        self.uart.write_all(LINE_END).await?;
        self.uart.flush().await
    }

    async fn drain_responses(&mut self) {
        let mut buf = [0u8; 64];
        loop {
            match self.uart.read_ready() {
                Ok(true) => {}
                Ok(false) => break,
                Err(e) => {
                    warn!("Radio status failed: {}", Debug2Format(&embedded_io::Error::kind(&e)));
                    break;
                }
            }
            match self.uart.read(&mut buf).await {
                Ok(0) => break,
                Ok(n) => info!("Response: {}", printable(&buf[..n])),
                Err(e) => {
                    warn!("Radio read failed: {}", Debug2Format(&embedded_io::Error::kind(&e)));
                    break;
                }
            }
        }
    }
}

impl<U, I, D> Transport for LoraTransport<U, I, D>
where
    U: embedded_io_async::Read + embedded_io_async::Write + embedded_io::ReadReady,
    I: Indicator,
    D: DelayNs,
{
    async fn start(&mut self) {
        self.configure().await;
    }

    async fn send(&mut self, message: &TelemetryMessage) {
        let payload = match message.lora_payload() {
            Ok(payload) => payload,
            Err(e) => {
                warn!("Cannot format message {}: {}", message.sequence(), e);
                return;
            }
        };
        let command = AtCommand::Send {
            address: self.config.server_id,
            payload: &payload,
        };

        for attempt in 0..SEND_REPEATS {
            if attempt > 0 {
                self.delay.delay_ms(RETRANSMIT_PAUSE_MS).await;
            }
            self.command(&command).await;
            self.indicator.pulse(PULSE_MS).await;
        }
    }
}
