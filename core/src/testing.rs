//! Host-side fakes for the hardware traits
//!
//! Every fake appends to a shared [`EventLog`] so tests can assert the
//! relative order of gate, ADC, radio, socket, indicator and delay activity.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::convert::Infallible;
use std::net::{Ipv4Addr, SocketAddrV4};
use std::rc::Rc;

use voltnode_hal::{AdcChannel, DatagramSocket, Indicator, LinkError, SystemReset, WifiStation};

use crate::message::TelemetryMessage;
use crate::reading::Reading;
use crate::sampler::ReadingSource;
use crate::transport::Transport;

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    GateHigh,
    GateLow,
    AdcRead(&'static str),
    Pulse(u32),
    Delay(u32),
    Reset,
    Activate(String),
    Join(String),
    StatusPoll,
    Resolve(String),
    Datagram(String, SocketAddrV4),
    UartLine(String),
    UartRead(String),
    TransportStart,
    TransportMaintain,
    TransportSend(String),
}

#[derive(Clone, Default)]
pub struct EventLog(Rc<RefCell<Vec<Event>>>);

impl EventLog {
    pub fn push(&self, event: Event) {
        self.0.borrow_mut().push(event);
    }

    pub fn take(&self) -> Vec<Event> {
        std::mem::take(&mut *self.0.borrow_mut())
    }

    pub fn clear(&self) {
        self.0.borrow_mut().clear();
    }
}

pub struct FakeAdc {
    log: EventLog,
    name: &'static str,
    samples: VecDeque<u16>,
}

impl FakeAdc {
    pub fn new(log: &EventLog, name: &'static str, samples: Vec<u16>) -> Self {
        Self {
            log: log.clone(),
            name,
            samples: samples.into(),
        }
    }
}

impl AdcChannel for FakeAdc {
    fn read(&mut self) -> u16 {
        self.log.push(Event::AdcRead(self.name));
        self.samples.pop_front().unwrap_or(0)
    }
}

pub struct FakeGate {
    log: EventLog,
}

impl FakeGate {
    pub fn new(log: &EventLog) -> Self {
        Self { log: log.clone() }
    }
}

impl embedded_hal::digital::ErrorType for FakeGate {
    type Error = Infallible;
}

impl embedded_hal::digital::OutputPin for FakeGate {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.log.push(Event::GateLow);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.log.push(Event::GateHigh);
        Ok(())
    }
}

pub struct FakeIndicator {
    log: EventLog,
}

impl FakeIndicator {
    pub fn new(log: &EventLog) -> Self {
        Self { log: log.clone() }
    }
}

impl Indicator for FakeIndicator {
    async fn pulse(&mut self, duration_ms: u32) {
        self.log.push(Event::Pulse(duration_ms));
    }
}

pub struct FakeDelay {
    log: EventLog,
}

impl FakeDelay {
    pub fn new(log: &EventLog) -> Self {
        Self { log: log.clone() }
    }
}

impl embedded_hal_async::delay::DelayNs for FakeDelay {
    async fn delay_ns(&mut self, ns: u32) {
        self.log.push(Event::Delay(ns / 1_000_000));
    }

    async fn delay_ms(&mut self, ms: u32) {
        self.log.push(Event::Delay(ms));
    }
}

pub struct FakeReset {
    log: EventLog,
}

impl FakeReset {
    pub fn new(log: &EventLog) -> Self {
        Self { log: log.clone() }
    }
}

impl SystemReset for FakeReset {
    fn reset(&mut self) {
        self.log.push(Event::Reset);
    }
}

/// WiFi station that comes up after a configurable number of down polls
pub struct FakeStation {
    log: EventLog,
    down_polls: Option<u32>,
    polls_since_join: u32,
    joined: bool,
    linked: bool,
    reject_join: bool,
    resolvable: bool,
}

impl FakeStation {
    pub const COLLECTOR: SocketAddrV4 = SocketAddrV4::new(Ipv4Addr::new(192, 168, 1, 10), 5005);

    /// Associates on the first poll after joining
    pub fn new(log: &EventLog) -> Self {
        Self {
            log: log.clone(),
            down_polls: Some(0),
            polls_since_join: 0,
            joined: false,
            linked: false,
            reject_join: false,
            resolvable: true,
        }
    }

    /// Report down for the first `polls` polls after each join
    pub fn connect_after(mut self, polls: u32) -> Self {
        self.down_polls = Some(polls);
        self
    }

    pub fn never_connect(mut self) -> Self {
        self.down_polls = None;
        self
    }

    pub fn reject_join(mut self) -> Self {
        self.reject_join = true;
        self
    }

    pub fn unresolvable(mut self) -> Self {
        self.resolvable = false;
        self
    }

    pub fn drop_link(&mut self) {
        self.joined = false;
        self.linked = false;
    }
}

impl WifiStation for FakeStation {
    async fn activate(&mut self, country: &str) -> Result<(), LinkError> {
        self.log.push(Event::Activate(country.into()));
        Ok(())
    }

    async fn join(&mut self, ssid: &str, _password: &str) -> Result<(), LinkError> {
        self.log.push(Event::Join(ssid.into()));
        self.joined = true;
        self.polls_since_join = 0;
        if self.reject_join {
            Err(LinkError::JoinRejected)
        } else {
            Ok(())
        }
    }

    fn is_connected(&mut self) -> bool {
        self.log.push(Event::StatusPoll);
        if !self.joined {
            return false;
        }
        if !self.linked {
            self.polls_since_join += 1;
            self.linked = matches!(self.down_polls, Some(n) if self.polls_since_join > n);
        }
        self.linked
    }

    fn local_address(&self) -> Option<Ipv4Addr> {
        self.linked.then_some(Ipv4Addr::new(192, 168, 1, 23))
    }

    async fn resolve(&mut self, host: &str, port: u16) -> Result<SocketAddrV4, LinkError> {
        self.log.push(Event::Resolve(host.into()));
        if self.resolvable {
            Ok(SocketAddrV4::new(*Self::COLLECTOR.ip(), port))
        } else {
            Err(LinkError::ResolveFailed)
        }
    }
}

pub struct FakeSocket {
    log: EventLog,
    fail: bool,
}

impl FakeSocket {
    pub fn new(log: &EventLog) -> Self {
        Self {
            log: log.clone(),
            fail: false,
        }
    }

    /// Every send errors without reaching the wire
    pub fn failing(log: &EventLog) -> Self {
        Self {
            log: log.clone(),
            fail: true,
        }
    }
}

impl DatagramSocket for FakeSocket {
    async fn send_to(&mut self, payload: &[u8], remote: SocketAddrV4) -> Result<(), LinkError> {
        if self.fail {
            return Err(LinkError::SendFailed);
        }
        let text = String::from_utf8_lossy(payload).into_owned();
        self.log.push(Event::Datagram(text, remote));
        Ok(())
    }
}

/// Radio UART that answers every CRLF-terminated line with `+OK`
pub struct FakeUart {
    log: EventLog,
    line: Vec<u8>,
    rx: VecDeque<u8>,
    answer: bool,
}

impl FakeUart {
    pub fn new(log: &EventLog) -> Self {
        Self {
            log: log.clone(),
            line: Vec::new(),
            rx: VecDeque::new(),
            answer: true,
        }
    }

    /// Never answers
    pub fn silent(log: &EventLog) -> Self {
        Self {
            answer: false,
            ..Self::new(log)
        }
    }
}

impl embedded_io::ErrorType for FakeUart {
    type Error = Infallible;
}

impl embedded_io_async::Write for FakeUart {
    async fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        for &byte in buf {
            self.line.push(byte);
            if self.line.ends_with(b"\r\n") {
                let text = String::from_utf8_lossy(&self.line[..self.line.len() - 2]).into_owned();
                self.log.push(Event::UartLine(text));
                self.line.clear();
                if self.answer {
                    self.rx.extend(b"+OK\r\n");
                }
            }
        }
        Ok(buf.len())
    }

    async fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

impl embedded_io_async::Read for FakeUart {
    async fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        let n = buf.len().min(self.rx.len());
        for (slot, byte) in buf.iter_mut().zip(self.rx.drain(..n)) {
            *slot = byte;
        }
        let text = String::from_utf8_lossy(&buf[..n]);
        self.log.push(Event::UartRead(text.trim_end().into()));
        Ok(n)
    }
}

impl embedded_io::ReadReady for FakeUart {
    fn read_ready(&mut self) -> Result<bool, Self::Error> {
        Ok(!self.rx.is_empty())
    }
}

/// Reading source replaying fixed values
pub struct FakeSource {
    values: VecDeque<f64>,
    fallback: f64,
}

impl FakeSource {
    pub fn constant(value: f64) -> Self {
        Self {
            values: VecDeque::new(),
            fallback: value,
        }
    }

    pub fn sequence(values: &[f64]) -> Self {
        Self {
            values: values.iter().copied().collect(),
            fallback: 0.0,
        }
    }
}

impl ReadingSource for FakeSource {
    fn acquire(&mut self) -> Reading {
        Reading::from_raw(self.values.pop_front().unwrap_or(self.fallback))
    }
}

/// Transport double that logs lifecycle calls and the UDP rendering of sends
pub struct RecordingTransport {
    log: EventLog,
    fail: bool,
}

impl RecordingTransport {
    pub fn new(log: &EventLog) -> Self {
        Self {
            log: log.clone(),
            fail: false,
        }
    }

    /// Every send is lost
    pub fn failing(log: &EventLog) -> Self {
        Self {
            log: log.clone(),
            fail: true,
        }
    }
}

impl Transport for RecordingTransport {
    async fn start(&mut self) {
        self.log.push(Event::TransportStart);
    }

    async fn maintain(&mut self) {
        self.log.push(Event::TransportMaintain);
    }

    async fn send(&mut self, message: &TelemetryMessage) {
        if self.fail {
            return;
        }
        let payload = message.udp_payload().unwrap();
        self.log.push(Event::TransportSend(payload.as_str().into()));
    }
}
