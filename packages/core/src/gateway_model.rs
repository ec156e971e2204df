//! Data model shared by the gateway's components: security schemes, the
//! transmission-parameter bundle, the IP-side connection descriptor, and the
//! resource-directory/bridge row types.
//!
//! Grounded in `sl_ts_param.h` (`security_scheme_t`, `ts_param_t`) and
//! `sl_bridge.h` from the original firmware, re-expressed with the arena +
//! typed-enum idioms the rest of this workspace uses (see
//! `definitions::node_id` for the `NodeId` wrapper this module builds on).

use crate::definitions::{EndpointIndex, NodeId};
use std::net::Ipv6Addr;
use std::time::{Duration, Instant};

/// Ordered security scheme, highest wins. Two sentinels (`Auto`, `Net`) are
/// never stored on a node; they are resolved to a concrete scheme by policy
/// before being used for a transmission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SecurityScheme {
    NoScheme,
    UseCrc16,
    S0,
    S2Unauthenticated,
    S2Authenticated,
    S2Access,
}

/// Sentinel schemes that are resolved to a concrete [`SecurityScheme`]
/// before a send; kept distinct from `SecurityScheme` so they can never
/// accidentally be stored as a node's granted scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemeSelector {
    /// A concrete scheme to use.
    Scheme(SecurityScheme),
    /// Pick the scheme via policy (highest scheme this node and the
    /// gateway have in common).
    Auto,
    /// Use the highest scheme this gateway owns, irrespective of the node.
    Net,
}

impl From<SecurityScheme> for SchemeSelector {
    fn from(value: SecurityScheme) -> Self {
        SchemeSelector::Scheme(value)
    }
}

bitflags::bitflags! {
    /// Which security schemes a node has been granted, as a bitmask. Never
    /// manipulated with raw integer arithmetic outside this module.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct SecurityFlags: u8 {
        const S0                  = 0b0000_0001;
        const S2_UNAUTHENTICATED  = 0b0000_0010;
        const S2_AUTHENTICATED    = 0b0000_0100;
        const S2_ACCESS           = 0b0000_1000;
    }
}

impl SecurityFlags {
    pub fn highest_scheme(&self) -> SecurityScheme {
        if self.contains(SecurityFlags::S2_ACCESS) {
            SecurityScheme::S2Access
        } else if self.contains(SecurityFlags::S2_AUTHENTICATED) {
            SecurityScheme::S2Authenticated
        } else if self.contains(SecurityFlags::S2_UNAUTHENTICATED) {
            SecurityScheme::S2Unauthenticated
        } else if self.contains(SecurityFlags::S0) {
            SecurityScheme::S0
        } else {
            SecurityScheme::NoScheme
        }
    }
}

/// Lowest node id reserved for long-range nodes; ids below this are
/// "classic" 8/16-bit node ids.
pub const LONG_RANGE_NODE_ID_START: u16 = 256;
/// One past the highest valid long-range node id.
pub const LONG_RANGE_NODE_ID_END: u16 = 4000;
/// One past the highest valid classic node id.
pub const CLASSIC_NODE_ID_END: u16 = 232;

pub fn is_lr_node(id: NodeId) -> bool {
    let raw: u16 = id.into();
    raw >= LONG_RANGE_NODE_ID_START
}

/// Whether `id` is an assignable node id (rejects `0`, the classic
/// reserved gap `233..255`, and anything at/above the long-range cap).
pub fn is_valid_node_id(id: NodeId) -> bool {
    let raw: u16 = id.into();
    (1..=CLASSIC_NODE_ID_END).contains(&raw)
        || (LONG_RANGE_NODE_ID_START..LONG_RANGE_NODE_ID_END).contains(&raw)
}

/// Transmission parameter bundle, carried alongside every outbound frame
/// through the send pipeline and the S0 engine. Grounded in `ts_param_t`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TsParam {
    pub snode: NodeId,
    pub dnode: NodeId,
    pub sendpoint: EndpointIndex,
    pub dendpoint: EndpointIndex,
    pub scheme: SchemeSelector,
    pub tx_flags: TxFlags,
    pub rx_flags: RxFlags,
    pub is_mcast_with_followup: bool,
    pub force_verify_delivery: bool,
    pub is_multicommand: bool,
    pub discard_timeout: Option<Duration>,
}

impl TsParam {
    /// Builds the reply parameters: source/destination and endpoints swap,
    /// flags and scheme carry over unchanged.
    pub fn reply(&self) -> TsParam {
        TsParam {
            snode: self.dnode,
            dnode: self.snode,
            sendpoint: self.dendpoint,
            dendpoint: self.sendpoint,
            ..*self
        }
    }
}

bitflags::bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct TxFlags: u16 {
        const ACK        = 0b0000_0001;
        const AUTO_ROUTE  = 0b0000_0010;
        const EXPLORE     = 0b0000_0100;
        const NO_ROUTE    = 0b0000_1000;
        const MULTICAST   = 0b0001_0000;
    }
}

bitflags::bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct RxFlags: u16 {
        const LOW_POWER = 0b0000_0001;
        const BROADCAST  = 0b0000_0010;
        const MULTICAST  = 0b0000_0100;
    }
}

/// IP-side analogue of [`TsParam`]. Grounded in `zwave_connection_t`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZWaveConnection {
    pub local_ip6: Ipv6Addr,
    pub remote_ip6: Ipv6Addr,
    pub local_port: u16,
    pub remote_port: u16,
    pub lendpoint: EndpointIndex,
    pub rendpoint: EndpointIndex,
    pub seq: u8,
    pub scheme: SecurityScheme,
    pub rx_flags: RxFlags,
    pub tx_flags: TxFlags,
}

impl ZWaveConnection {
    pub fn reply(&self) -> ZWaveConnection {
        ZWaveConnection {
            local_ip6: self.remote_ip6,
            remote_ip6: self.local_ip6,
            local_port: self.remote_port,
            remote_port: self.local_port,
            lendpoint: self.rendpoint,
            rendpoint: self.lendpoint,
            ..*self
        }
    }
}

/// Resource directory per-node interview state. The terminal states
/// (`Done`, `ProbeFail`, `Failing`) are where `node_is_alive`/
/// `node_is_unreachable` (§4.E) take effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeProbeState {
    Created,
    ProbeNodeInfo,
    ProbeProductId,
    EnumerateEndpoints,
    FindEndpoints,
    ProbeEndpoints,
    CheckWuCcVersion,
    GetWuCap,
    SetWuInterval,
    AssignReturnRoute,
    ProbeWakeUpInterval,
    Done,
    ProbeFail,
    Failing,
}

impl NodeProbeState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            NodeProbeState::Done | NodeProbeState::ProbeFail | NodeProbeState::Failing
        )
    }

    /// The single successor state reached by an ordinary (non-failure)
    /// advance, or `None` if this is already terminal. Mirrors the linear
    /// walk in the same order as this struct's `next()` companion.
    pub fn next(&self) -> Option<NodeProbeState> {
        use NodeProbeState::*;
        Some(match self {
            Created => ProbeNodeInfo,
            ProbeNodeInfo => ProbeProductId,
            ProbeProductId => EnumerateEndpoints,
            EnumerateEndpoints => FindEndpoints,
            FindEndpoints => ProbeEndpoints,
            ProbeEndpoints => CheckWuCcVersion,
            CheckWuCcVersion => GetWuCap,
            GetWuCap => SetWuInterval,
            SetWuInterval => AssignReturnRoute,
            AssignReturnRoute => ProbeWakeUpInterval,
            ProbeWakeUpInterval => Done,
            Done | ProbeFail | Failing => return None,
        })
    }
}

/// Per-endpoint interview sub-FSM.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointProbeState {
    ProbeInfo,
    ProbeAggregatedEndpoints,
    ProbeSec2C2,
    ProbeSec2C1,
    ProbeSec2C0,
    ProbeSec0,
    ProbeVersion,
    ProbeZwavePlus,
    MdnsProbe,
    Done,
}

impl EndpointProbeState {
    pub fn next(&self, is_root: bool) -> Option<EndpointProbeState> {
        use EndpointProbeState::*;
        Some(match self {
            ProbeInfo if is_root => ProbeSec2C2,
            ProbeInfo => ProbeAggregatedEndpoints,
            ProbeAggregatedEndpoints => ProbeSec2C2,
            ProbeSec2C2 => ProbeSec2C1,
            ProbeSec2C1 => ProbeSec2C0,
            ProbeSec2C0 => ProbeSec0,
            ProbeSec0 => ProbeVersion,
            ProbeVersion => ProbeZwavePlus,
            ProbeZwavePlus => MdnsProbe,
            MdnsProbe => Done,
            Done => return None,
        })
    }
}

bitflags::bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct NodePropertiesFlags: u16 {
        const JUST_ADDED = 0b0000_0001;
        const ADDED_BY_ME = 0b0000_0010;
        const LOW_POWER = 0b0000_0100;
        const FLIRS = 0b0000_1000;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProbeFlags {
    #[default]
    Pending,
    Completed,
}

/// A node row in the resource directory.
#[derive(Debug, Clone)]
pub struct NodeDbEntry {
    pub node_id: NodeId,
    pub state: NodeProbeState,
    pub security_flags: SecurityFlags,
    pub node_properties_flags: NodePropertiesFlags,
    pub probe_flags: ProbeFlags,
    pub manufacturer_id: Option<u16>,
    pub product_type: Option<u16>,
    pub product_id: Option<u16>,
    pub wakeup_interval: Option<Duration>,
    pub last_update: Option<Instant>,
    pub last_awake: Option<Instant>,
    pub endpoints: Vec<EndpointDbEntry>,
    /// Refcount guarding persistence frees: the persistence layer must
    /// not free an entry whose refcount is nonzero.
    refcount: u32,
}

impl NodeDbEntry {
    pub fn new(node_id: NodeId) -> Self {
        Self {
            node_id,
            state: NodeProbeState::Created,
            security_flags: SecurityFlags::empty(),
            node_properties_flags: NodePropertiesFlags::JUST_ADDED,
            probe_flags: ProbeFlags::Pending,
            manufacturer_id: None,
            product_type: None,
            product_id: None,
            wakeup_interval: None,
            last_update: None,
            last_awake: None,
            endpoints: vec![EndpointDbEntry::new(EndpointIndex::Root)],
            refcount: 0,
        }
    }

    pub fn acquire(&mut self) {
        self.refcount += 1;
    }

    /// Releases a reference; returns whether the entry is now free to
    /// persist/evict.
    pub fn release(&mut self) -> bool {
        self.refcount = self.refcount.saturating_sub(1);
        self.refcount == 0
    }

    pub fn is_alive(&self) -> bool {
        matches!(self.state, NodeProbeState::Done)
    }
}

#[derive(Debug, Clone)]
pub struct EndpointDbEntry {
    pub endpoint_id: EndpointIndex,
    pub state: EndpointProbeState,
    pub command_classes: Vec<u16>,
    pub installer_icon: Option<u16>,
    pub user_icon: Option<u16>,
}

impl EndpointDbEntry {
    pub fn new(endpoint_id: EndpointIndex) -> Self {
        Self {
            endpoint_id,
            state: EndpointProbeState::ProbeInfo,
            command_classes: Vec::new(),
            installer_icon: None,
            user_icon: None,
        }
    }
}

/// Persistent (peer-configured) IP association kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IpAssociationType {
    Normal,
    Proxy,
    Case2,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IpAssociation {
    pub virtual_id: NodeId,
    pub resource_ip6: Ipv6Addr,
    pub resource_port: u16,
    pub resource_endpoint: EndpointIndex,
    pub han_node: NodeId,
    pub han_endpoint: EndpointIndex,
    pub kind: IpAssociationType,
}

pub const MAX_IP_ASSOCIATIONS: usize = 10;

/// Ephemeral association created the first time an IP peer addresses a
/// mesh node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TemporaryAssociation {
    pub virtual_id_static: NodeId,
    pub virtual_id_active: NodeId,
    pub resource_ip6: Ipv6Addr,
    pub resource_port: u16,
    pub resource_endpoint: EndpointIndex,
    pub was_dtls: bool,
    pub is_long_range: bool,
}
