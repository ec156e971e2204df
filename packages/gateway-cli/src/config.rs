//! Command-line configuration, parsed into [`zwave_gateway::config::GatewayConfig`].
//!
//! Discovering `own_node_id`/`home_id` normally happens over the radio via
//! `MemoryGetID`, which is explicitly out of scope at the
//! wire level — this binary takes them as flags instead.

use std::net::Ipv6Addr;

use clap::Parser;
use zwave_gateway::config::{GatewayConfig, RfRegion};
use zwave_logging::Loglevel;

#[derive(Debug, Parser)]
#[command(name = "zwave-gateway", about = "Z-Wave <-> IP gateway control plane")]
pub struct Args {
    /// Path to the serial port the Z-Wave radio is attached to.
    #[arg(long)]
    pub serial_port: String,

    /// Baud rate for the serial connection.
    #[arg(long, default_value_t = 115_200)]
    pub baud_rate: u32,

    /// This gateway's own node ID, as reported by `MemoryGetID`.
    #[arg(long)]
    pub own_node_id: u16,

    /// This gateway's home ID, as reported by `MemoryGetID`.
    #[arg(long, value_parser = parse_hex_u32)]
    pub home_id: u32,

    /// Local UDP port to receive Z/IP packets on.
    #[arg(long, default_value_t = 41230)]
    pub udp_port: u16,

    #[arg(long)]
    pub pan_prefix: Ipv6Addr,
    #[arg(long)]
    pub lan_addr: Ipv6Addr,
    #[arg(long)]
    pub gw_addr: Ipv6Addr,
    #[arg(long)]
    pub unsolicited_dest: Option<Ipv6Addr>,
    #[arg(long, default_value_t = 4123)]
    pub unsolicited_port: u16,

    /// 16-byte network key, hex-encoded. Omit to run without S0.
    #[arg(long, value_parser = parse_psk)]
    pub psk: Option<Vec<u8>>,

    #[arg(long)]
    pub manufacturer_id: u16,
    #[arg(long)]
    pub product_type: u16,
    #[arg(long)]
    pub product_id: u16,

    #[arg(long, value_enum, default_value_t = CliRfRegion::Eu)]
    pub rfregion: CliRfRegion,

    /// How chatty the per-component loggers (GW/NMS/RD/BRIDGE) should be.
    #[arg(long, value_enum, default_value_t = CliLoglevel::Info)]
    pub log_level: CliLoglevel,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum CliLoglevel {
    Error,
    Warn,
    Info,
    Verbose,
    Debug,
    Silly,
}

impl From<CliLoglevel> for Loglevel {
    fn from(value: CliLoglevel) -> Self {
        match value {
            CliLoglevel::Error => Loglevel::Error,
            CliLoglevel::Warn => Loglevel::Warn,
            CliLoglevel::Info => Loglevel::Info,
            CliLoglevel::Verbose => Loglevel::Verbose,
            CliLoglevel::Debug => Loglevel::Debug,
            CliLoglevel::Silly => Loglevel::Silly,
        }
    }
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum CliRfRegion {
    Eu,
    Us,
    Anz,
    Hk,
    In,
    Il,
    Ru,
    Cn,
    UsLr,
    Jp,
    Kr,
}

impl From<CliRfRegion> for RfRegion {
    fn from(value: CliRfRegion) -> Self {
        match value {
            CliRfRegion::Eu => RfRegion::Eu,
            CliRfRegion::Us => RfRegion::Us,
            CliRfRegion::Anz => RfRegion::Anz,
            CliRfRegion::Hk => RfRegion::Hk,
            CliRfRegion::In => RfRegion::In,
            CliRfRegion::Il => RfRegion::Il,
            CliRfRegion::Ru => RfRegion::Ru,
            CliRfRegion::Cn => RfRegion::Cn,
            CliRfRegion::UsLr => RfRegion::UsLr,
            CliRfRegion::Jp => RfRegion::Jp,
            CliRfRegion::Kr => RfRegion::Kr,
        }
    }
}

fn parse_hex_u32(s: &str) -> Result<u32, String> {
    let s = s.strip_prefix("0x").unwrap_or(s);
    u32::from_str_radix(s, 16).map_err(|e| e.to_string())
}

fn parse_psk(s: &str) -> Result<Vec<u8>, String> {
    hex::decode(s).map_err(|e| e.to_string())
}

impl Args {
    pub fn to_gateway_config(&self) -> GatewayConfig {
        let builder = GatewayConfig::builder()
            .pan_prefix(self.pan_prefix)
            .lan_addr(self.lan_addr)
            .gw_addr(self.gw_addr)
            .unsolicited_port(self.unsolicited_port)
            .psk(self.psk.clone().unwrap_or_default())
            .manufacturer_id(self.manufacturer_id)
            .product_type(self.product_type)
            .product_id(self.product_id)
            .rfregion(self.rfregion.into());
        match self.unsolicited_dest {
            Some(dest) => builder.unsolicited_dest(dest).build(),
            None => builder.build(),
        }
    }
}
