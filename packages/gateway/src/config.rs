use std::net::Ipv6Addr;
use typed_builder::TypedBuilder;

/// RF region for the radio's RF profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RfRegion {
    #[default]
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

/// Configuration struct consumed by the gateway; parsing it from a file or
/// CLI flags is out of scope here and left to
/// `zwave-gateway-cli`.
#[derive(Debug, Clone, TypedBuilder)]
pub struct GatewayConfig {
    pub pan_prefix: Ipv6Addr,
    pub lan_addr: Ipv6Addr,
    #[builder(default = 64)]
    pub tun_prefix_length: u8,
    pub gw_addr: Ipv6Addr,
    #[builder(default, setter(strip_option))]
    pub unsolicited_dest: Option<Ipv6Addr>,
    #[builder(default = 4123)]
    pub unsolicited_port: u16,
    #[builder(default, setter(into))]
    pub psk: Vec<u8>,
    #[builder(default = 16)]
    pub client_key_size: usize,
    pub manufacturer_id: u16,
    pub product_type: u16,
    pub product_id: u16,
    #[builder(default = 1)]
    pub hardware_version: u8,
    #[builder(default)]
    pub rfregion: RfRegion,
    #[builder(default = 0)]
    pub tx_powerlevel: i8,
    #[builder(default = 0)]
    pub max_lr_tx_powerlevel: i8,
    #[builder(default = 64)]
    pub zw_lbt: u8,
    #[builder(default, setter(into))]
    pub extra_classes: Vec<u16>,
    #[builder(default, setter(into))]
    pub sec_extra_classes: Vec<u16>,
    #[builder(default = true)]
    pub enable_smart_start: bool,
    #[builder(default = false)]
    pub ipv4_disable: bool,
    #[builder(default = false)]
    pub clear_eeprom: bool,
}

/// Compile-time pool sizes.
pub mod pool_sizes {
    pub const S0_TX_SESSIONS: usize = 4;
    pub const S0_RX_SESSIONS: usize = 4;
    pub const SEND_PIPELINE_QUEUE_DEPTH: usize = 8;
    pub const SEND_REQUEST_ENTRIES: usize = 4;
    pub const PROBE_COMPLETION_NOTIFIERS: usize = 3;
    pub const MAX_IP_ASSOCIATIONS: usize = 10;
    pub const VIRTUAL_NODE_ALLOC_RETRY_CAP: u32 = 10;
    /// Upper bound on pre-allocated virtual nodes,
    /// which also sizes the temporary-association pool (one virtual node
    /// backs at most one live temporary association at a time).
    pub const MAX_CLASSIC_TEMP_ASSOCIATIONS: usize = 8;
}
