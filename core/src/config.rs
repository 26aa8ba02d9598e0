//! Node configuration
//!
//! Typed view of the node's static settings. How the values get onto the
//! device is the board's business; this crate only consumes them.

/// Which transport carries telemetry to the collector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransportKind {
    /// UDP datagrams over a WiFi station link
    Wifi,
    /// AT-command LoRa radio on a UART
    Lora,
}

impl TransportKind {
    /// Parse a transport name, case-insensitively (`"wifi"` or `"lora"`)
    pub fn from_name(name: &str) -> Option<Self> {
        if name.eq_ignore_ascii_case("wifi") {
            Some(Self::Wifi)
        } else if name.eq_ignore_ascii_case("lora") {
            Some(Self::Lora)
        } else {
            None
        }
    }
}

/// WiFi access point settings
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct WifiConfig {
    /// Access point SSID
    pub ssid: &'static str,
    /// WPA passphrase
    pub password: &'static str,
    /// Regulatory domain, ISO 3166 alpha-2
    pub country: &'static str,
}

impl Default for WifiConfig {
    fn default() -> Self {
        Self {
            ssid: "voltnode",
            password: "",
            country: "AU",
        }
    }
}

/// Where UDP telemetry goes
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CollectorConfig {
    /// Collector host name or dotted-quad address
    pub host: &'static str,
    /// Collector UDP port
    pub port: u16,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            host: "192.168.1.1",
            port: 5005,
        }
    }
}

/// LoRa radio settings
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LoraConfig {
    /// Radio address of the collector's receiver
    pub server_id: u16,
    /// Network id shared by all radios in the deployment
    pub network_id: u8,
    /// Carrier frequency in Hz
    pub band_hz: u32,
}

impl Default for LoraConfig {
    fn default() -> Self {
        Self {
            server_id: 2,
            network_id: 5,
            band_hz: 915_000_000,
        }
    }
}

/// Complete node configuration
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct NodeConfig {
    /// Identifier reported in every message; also the node's radio address
    pub device_id: u16,
    /// Transport selected at boot
    pub transport: TransportKind,
    pub wifi: WifiConfig,
    pub collector: CollectorConfig,
    pub lora: LoraConfig,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            device_id: 1,
            transport: TransportKind::Lora,
            wifi: WifiConfig::default(),
            collector: CollectorConfig::default(),
            lora: LoraConfig::default(),
        }
    }
}
