#![deny(unsafe_code)]
#![deny(warnings)]
//! WiFi hardware layer module
//!
//! WiFi comes from an ESP32 co-processor running the esp-hosted firmware on
//! SPI2. The co-processor presents an Ethernet-like device to embassy-net;
//! association is handled through its control channel.

use core::net::{Ipv4Addr, SocketAddrV4};

use defmt::{info, warn};
use embassy_embedded_hal::shared_bus::asynch::spi::SpiDevice as SpiDeviceBus;
use embassy_net::dns::DnsQueryType;
use embassy_net::udp::{PacketMetadata, UdpSocket};
use embassy_net::{IpAddress, IpEndpoint, Stack};
use embassy_net_esp_hosted::{Control, NetDriver, Runner};
use embassy_stm32::exti::ExtiInput;
use embassy_stm32::gpio::Output;
use embassy_stm32::mode::Async;
use embassy_stm32::spi::Spi;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use static_cell::StaticCell;
use voltnode_hal::{DatagramSocket, LinkError, WifiStation};

type SpiBus = SpiDeviceBus<'static, CriticalSectionRawMutex, Spi<'static, Async>, Output<'static>>;

/// Runner for the co-processor link; must be polled for the device to work
pub type EspRunner = Runner<'static, SpiBus, ExtiInput<'static>, Output<'static>>;

/// Co-processor peripherals bundle
pub struct EspPeripherals<'a> {
    pub spi: Spi<'a, Async>,
    pub cs: Output<'a>,
    pub reset: Output<'a>,
    pub handshake: ExtiInput<'a>,
    pub ready: ExtiInput<'a>,
}

/// Bring up the ESP32 co-processor
///
/// Returns the network device for embassy-net, the control handle used for
/// association, and the runner.
pub async fn init_esp_hosted(
    periph: EspPeripherals<'static>,
) -> (NetDriver<'static>, Control<'static>, EspRunner) {
    let EspPeripherals {
        spi,
        cs,
        reset,
        handshake,
        ready,
    } = periph;

    type SpiBusType = embassy_sync::mutex::Mutex<CriticalSectionRawMutex, Spi<'static, Async>>;
    static SPI_BUS: StaticCell<SpiBusType> = StaticCell::new();
    let spi_bus = SPI_BUS.init(embassy_sync::mutex::Mutex::new(spi));
    let spi_device = SpiDeviceBus::new(spi_bus, cs);

    static STATE: StaticCell<embassy_net_esp_hosted::State> = StaticCell::new();
    let state = STATE.init(embassy_net_esp_hosted::State::new());

    let (device, control, runner) =
        embassy_net_esp_hosted::new(state, spi_device, handshake, ready, reset).await;

    info!("ESP32 co-processor initialized");

    (device, control, runner)
}

/// WiFi station on top of the esp-hosted control channel and embassy-net
pub struct EspStation {
    control: Control<'static>,
    stack: Stack<'static>,
}

impl EspStation {
    pub fn new(control: Control<'static>, stack: Stack<'static>) -> Self {
        Self { control, stack }
    }
}

impl WifiStation for EspStation {
    async fn activate(&mut self, country: &str) -> Result<(), LinkError> {
        // The esp-hosted firmware takes its regulatory domain from its own
        // build configuration.
        info!("Activating WiFi radio (country {})", country);
        self.control.init().await.map_err(|e| {
            warn!("Co-processor init failed: {}", defmt::Debug2Format(&e));
            LinkError::RadioInit
        })
    }

    async fn join(&mut self, ssid: &str, password: &str) -> Result<(), LinkError> {
        self.control.connect(ssid, password).await.map_err(|e| {
            warn!("Join {} failed: {}", ssid, defmt::Debug2Format(&e));
            LinkError::JoinRejected
        })
    }

    fn is_connected(&mut self) -> bool {
        self.stack.is_link_up() && self.stack.is_config_up()
    }

    fn local_address(&self) -> Option<Ipv4Addr> {
        self.stack.config_v4().map(|config| config.address.address())
    }

    async fn resolve(&mut self, host: &str, port: u16) -> Result<SocketAddrV4, LinkError> {
        if let Ok(ip) = host.parse::<Ipv4Addr>() {
            return Ok(SocketAddrV4::new(ip, port));
        }

        let addresses = self
            .stack
            .dns_query(host, DnsQueryType::A)
            .await
            .map_err(|e| {
                warn!("DNS query for {} failed: {:?}", host, e);
                LinkError::ResolveFailed
            })?;

        addresses
            .iter()
            .find_map(|address| match address {
                IpAddress::Ipv4(ip) => Some(SocketAddrV4::new(*ip, port)),
                #[allow(unreachable_patterns)]
                _ => None,
            })
            .ok_or(LinkError::ResolveFailed)
    }
}

const SOCKET_META: usize = 4;
const SOCKET_BUFFER: usize = 256;

/// Send-only UDP socket bound to an ephemeral port
pub struct UdpSender {
    socket: UdpSocket<'static>,
}

impl UdpSender {
    /// Bind the node's single UDP socket
    ///
    /// May only be called once; the buffers live in statics.
    pub fn bind(stack: Stack<'static>) -> Result<Self, LinkError> {
        static RX_META: StaticCell<[PacketMetadata; SOCKET_META]> = StaticCell::new();
        static TX_META: StaticCell<[PacketMetadata; SOCKET_META]> = StaticCell::new();
        static RX_BUFFER: StaticCell<[u8; SOCKET_BUFFER]> = StaticCell::new();
        static TX_BUFFER: StaticCell<[u8; SOCKET_BUFFER]> = StaticCell::new();

        let mut socket = UdpSocket::new(
            stack,
            RX_META.init([PacketMetadata::EMPTY; SOCKET_META]),
            RX_BUFFER.init([0; SOCKET_BUFFER]),
            TX_META.init([PacketMetadata::EMPTY; SOCKET_META]),
            TX_BUFFER.init([0; SOCKET_BUFFER]),
        );

        socket.bind(0).map_err(|e| {
            warn!("UDP bind failed: {:?}", e);
            LinkError::SendFailed
        })?;

        Ok(Self { socket })
    }
}

impl DatagramSocket for UdpSender {
    async fn send_to(&mut self, payload: &[u8], remote: SocketAddrV4) -> Result<(), LinkError> {
        let endpoint = IpEndpoint::new(IpAddress::Ipv4(*remote.ip()), remote.port());
        self.socket.send_to(payload, endpoint).await.map_err(|e| {
            warn!("UDP send failed: {:?}", e);
            match e {
                embassy_net::udp::SendError::NoRoute => LinkError::NotConnected,
                _ => LinkError::SendFailed,
            }
        })
    }
}
