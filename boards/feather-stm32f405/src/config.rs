#![deny(unsafe_code)]
#![deny(warnings)]
//! Build-time node configuration
//!
//! Settings are baked into the image from environment variables at compile
//! time, e.g.
//!
//! ```text
//! VOLTNODE_TRANSPORT=wifi VOLTNODE_SSID=shed VOLTNODE_PASSWORD=... cargo run --release
//! ```
//!
//! Unset or unparseable values fall back to the defaults in `voltnode-core`.

use core::str::FromStr;

use defmt::warn;
use voltnode_core::{CollectorConfig, LoraConfig, NodeConfig, TransportKind, WifiConfig};

/// Parse `value` or warn and keep `default`
fn parse_or<T: FromStr + Copy + defmt::Format>(name: &str, value: Option<&str>, default: T) -> T {
    match value {
        None => default,
        Some(text) => text.parse().unwrap_or_else(|_| {
            warn!("Ignoring {}={}, using {}", name, text, default);
            default
        }),
    }
}

/// Assemble the node configuration from the build environment
pub fn node_config() -> NodeConfig {
    let defaults = NodeConfig::default();

    let transport = match option_env!("VOLTNODE_TRANSPORT") {
        None => defaults.transport,
        Some(name) => TransportKind::from_name(name).unwrap_or_else(|| {
            warn!("Unknown transport {}, using {}", name, defaults.transport);
            defaults.transport
        }),
    };

    NodeConfig {
        device_id: parse_or(
            "VOLTNODE_DEVICE_ID",
            option_env!("VOLTNODE_DEVICE_ID"),
            defaults.device_id,
        ),
        transport,
        wifi: WifiConfig {
            ssid: option_env!("VOLTNODE_SSID").unwrap_or(defaults.wifi.ssid),
            password: option_env!("VOLTNODE_PASSWORD").unwrap_or(defaults.wifi.password),
            country: option_env!("VOLTNODE_COUNTRY").unwrap_or(defaults.wifi.country),
        },
        collector: CollectorConfig {
            host: option_env!("VOLTNODE_COLLECTOR_HOST").unwrap_or(defaults.collector.host),
            port: parse_or(
                "VOLTNODE_COLLECTOR_PORT",
                option_env!("VOLTNODE_COLLECTOR_PORT"),
                defaults.collector.port,
            ),
        },
        lora: LoraConfig {
            server_id: parse_or(
                "VOLTNODE_LORA_SERVER_ID",
                option_env!("VOLTNODE_LORA_SERVER_ID"),
                defaults.lora.server_id,
            ),
            network_id: parse_or(
                "VOLTNODE_LORA_NETWORK_ID",
                option_env!("VOLTNODE_LORA_NETWORK_ID"),
                defaults.lora.network_id,
            ),
            band_hz: parse_or(
                "VOLTNODE_LORA_BAND_HZ",
                option_env!("VOLTNODE_LORA_BAND_HZ"),
                defaults.lora.band_hz,
            ),
        },
    }
}
