//! Component H: command dispatch table.
//!
//! A static table of `(cmd_class, minimal_scheme, version, handler)`
//! entries. Grounded in `zwave-cc::commandclass`'s per-CC-trait dispatch
//! (`impl_cc_command_class!`-driven enum_dispatch) but kept as a plain
//! data table here: dynamic dispatch for command handlers is a table of
//! function pointers, with `minimal_scheme` and `version` remaining
//! data-driven.

use zwave_core::definitions::EndpointIndex;
use zwave_core::gateway_model::{RxFlags, SecurityScheme, ZWaveConnection};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchResult {
    Handled,
    NotSupported,
    ClassNotSupported,
    ParseError,
    Busy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOrigin {
    Radio,
    Ip,
}

pub type Handler = fn(&ZWaveConnection, &[u8]) -> DispatchResult;

pub struct HandlerEntry {
    pub cmd_class: u16,
    pub minimal_scheme: SecurityScheme,
    pub version: u8,
    pub handler: Handler,
}

/// `COMMAND_CLASS_SUPERVISION`, `SUPERVISION_GET` — the sole entry on
/// the multicast/broadcast allowlist.
pub const CC_SUPERVISION: u16 = 0x6c;
pub const SUPERVISION_GET: u8 = 0x01;

/// Command classes treated as network-management for the purposes of
/// the radio-origin rejection rule.
pub const NETWORK_MANAGEMENT_CLASSES: &[u16] = &[
    0x34, // NETWORK_MANAGEMENT_INCLUSION
    0x4d, // NETWORK_MANAGEMENT_BASIC
    0x52, // NETWORK_MANAGEMENT_PROXY
    0x67, // NETWORK_MANAGEMENT_INSTALLATION_MAINTENANCE
    0x78, // NODE_PROVISIONING
];

fn is_network_management_class(cmd_class: u16) -> bool {
    NETWORK_MANAGEMENT_CLASSES.contains(&cmd_class)
}

fn is_multicast_allowlisted(cmd_class: u16, cmd: u8) -> bool {
    cmd_class == CC_SUPERVISION && cmd == SUPERVISION_GET
}

pub struct DispatchTable {
    entries: Vec<HandlerEntry>,
}

impl Default for DispatchTable {
    fn default() -> Self {
        Self::new()
    }
}

impl DispatchTable {
    pub fn new() -> Self {
        Self { entries: Vec::new() }
    }

    pub fn register(&mut self, entry: HandlerEntry) {
        self.entries.retain(|e| e.cmd_class != entry.cmd_class);
        self.entries.push(entry);
    }

    fn find(&self, cmd_class: u16) -> Option<&HandlerEntry> {
        self.entries.iter().find(|e| e.cmd_class == cmd_class)
    }

    /// Dispatches one inbound frame, applying the three rules in order:
    /// scheme floor, multicast/broadcast allowlist, then radio-origin
    /// rejection of network-management classes.
    #[allow(clippy::too_many_arguments)]
    pub fn dispatch(
        &self,
        cmd_class: u16,
        cmd: u8,
        endpoint: EndpointIndex,
        origin: FrameOrigin,
        conn: &ZWaveConnection,
        payload: &[u8],
    ) -> DispatchResult {
        let Some(entry) = self.find(cmd_class) else {
            return DispatchResult::ClassNotSupported;
        };

        if conn.scheme < entry.minimal_scheme {
            return DispatchResult::NotSupported;
        }

        let is_mcast_or_bcast = conn
            .rx_flags
            .intersects(RxFlags::MULTICAST | RxFlags::BROADCAST);
        if is_mcast_or_bcast && !is_multicast_allowlisted(cmd_class, cmd) {
            return DispatchResult::NotSupported;
        }

        if origin == FrameOrigin::Radio
            && endpoint == EndpointIndex::Root
            && is_network_management_class(cmd_class)
        {
            return DispatchResult::NotSupported;
        }

        (entry.handler)(conn, payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv6Addr;

    fn conn(scheme: SecurityScheme, rx_flags: RxFlags) -> ZWaveConnection {
        ZWaveConnection {
            local_ip6: Ipv6Addr::UNSPECIFIED,
            remote_ip6: Ipv6Addr::UNSPECIFIED,
            local_port: 4123,
            remote_port: 4123,
            lendpoint: EndpointIndex::Root,
            rendpoint: EndpointIndex::Root,
            seq: 0,
            scheme,
            rx_flags,
            tx_flags: Default::default(),
        }
    }

    fn always_handled(_conn: &ZWaveConnection, _payload: &[u8]) -> DispatchResult {
        DispatchResult::Handled
    }

    #[test]
    fn unregistered_class_is_not_supported() {
        let table = DispatchTable::new();
        let result = table.dispatch(
            0x20,
            0x01,
            EndpointIndex::Root,
            FrameOrigin::Ip,
            &conn(SecurityScheme::NoScheme, RxFlags::empty()),
            &[],
        );
        assert_eq!(result, DispatchResult::ClassNotSupported);
    }

    #[test]
    fn below_minimal_scheme_is_rejected() {
        let mut table = DispatchTable::new();
        table.register(HandlerEntry {
            cmd_class: 0x20,
            minimal_scheme: SecurityScheme::S0,
            version: 1,
            handler: always_handled,
        });
        let result = table.dispatch(
            0x20,
            0x01,
            EndpointIndex::Root,
            FrameOrigin::Ip,
            &conn(SecurityScheme::NoScheme, RxFlags::empty()),
            &[],
        );
        assert_eq!(result, DispatchResult::NotSupported);
    }

    #[test]
    fn multicast_is_rejected_unless_allowlisted() {
        let mut table = DispatchTable::new();
        table.register(HandlerEntry {
            cmd_class: 0x20,
            minimal_scheme: SecurityScheme::NoScheme,
            version: 1,
            handler: always_handled,
        });
        let result = table.dispatch(
            0x20,
            0x01,
            EndpointIndex::Root,
            FrameOrigin::Ip,
            &conn(SecurityScheme::NoScheme, RxFlags::MULTICAST),
            &[],
        );
        assert_eq!(result, DispatchResult::NotSupported);

        table.register(HandlerEntry {
            cmd_class: CC_SUPERVISION,
            minimal_scheme: SecurityScheme::NoScheme,
            version: 1,
            handler: always_handled,
        });
        let result = table.dispatch(
            CC_SUPERVISION,
            SUPERVISION_GET,
            EndpointIndex::Root,
            FrameOrigin::Ip,
            &conn(SecurityScheme::NoScheme, RxFlags::MULTICAST),
            &[],
        );
        assert_eq!(result, DispatchResult::Handled);
    }

    #[test]
    fn network_management_is_rejected_from_radio_but_not_ip() {
        let mut table = DispatchTable::new();
        table.register(HandlerEntry {
            cmd_class: 0x34,
            minimal_scheme: SecurityScheme::NoScheme,
            version: 1,
            handler: always_handled,
        });
        let radio_result = table.dispatch(
            0x34,
            0x01,
            EndpointIndex::Root,
            FrameOrigin::Radio,
            &conn(SecurityScheme::NoScheme, RxFlags::empty()),
            &[],
        );
        assert_eq!(radio_result, DispatchResult::NotSupported);

        let ip_result = table.dispatch(
            0x34,
            0x01,
            EndpointIndex::Root,
            FrameOrigin::Ip,
            &conn(SecurityScheme::NoScheme, RxFlags::empty()),
            &[],
        );
        assert_eq!(ip_result, DispatchResult::Handled);
    }
}
