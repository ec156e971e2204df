//! Component F: bridge / virtual-node / association layer.
//!
//! A virtual node is a node id the controller owns on the gateway's
//! behalf; this module tracks the pool of such ids, the IPv4 NAT table
//! recovered from the original firmware's `ipv46_nat.c`, and both
//! flavors of IP association. Grounded in the
//! arena/index idiom `packages/core/src/gateway_model.rs` already uses
//! for node/endpoint ownership — the temporary-association pool here is
//! a `VecDeque` for the same reason: cheap oldest-first eviction without
//! back-pointers.

use std::collections::{HashMap, VecDeque};
use std::net::Ipv6Addr;
use std::time::{Duration, Instant};

use zwave_core::definitions::{EndpointIndex, NodeId};
use zwave_core::gateway_model::{IpAssociation, IpAssociationType, TemporaryAssociation};

use crate::config::pool_sizes::{MAX_IP_ASSOCIATIONS, VIRTUAL_NODE_ALLOC_RETRY_CAP};
use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeState {
    Booting,
    Initialized,
    InitFail,
}

/// Cooldown enforced between two successful `SetSlaveLearnMode` virtual
/// node allocations during bridge init.
pub const VIRTUAL_NODE_ALLOC_COOLDOWN: Duration = Duration::from_secs(2);

/// Outcome of one `SetSlaveLearnMode` attempt, reported by whatever
/// drives the radio for bridge init.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlaveLearnModeOutcome {
    Added(NodeId),
    Failed,
}

/// IPv4-mapped (`::ffff:a.b.c.d`) to node id table, recovered from
/// `ipv46_nat.c`. Capacity bound to the classic node
/// id space; entries created lazily on first resolution, evicted LRU
/// when full.
pub struct Ipv4NatTable {
    capacity: usize,
    order: VecDeque<[u8; 4]>,
    entries: HashMap<[u8; 4], NodeId>,
}

impl Ipv4NatTable {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            order: VecDeque::new(),
            entries: HashMap::new(),
        }
    }

    pub fn lookup(&self, ipv4: [u8; 4]) -> Option<NodeId> {
        self.entries.get(&ipv4).copied()
    }

    /// Inserts or refreshes a mapping, evicting the least-recently-used
    /// entry if the table is at capacity and `ipv4` is new.
    pub fn insert(&mut self, ipv4: [u8; 4], node: NodeId) {
        if !self.entries.contains_key(&ipv4) && self.entries.len() >= self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.entries.remove(&oldest);
            }
        }
        self.order.retain(|k| k != &ipv4);
        self.order.push_back(ipv4);
        self.entries.insert(ipv4, node);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Extracts the mapped IPv4 octets from `::ffff:a.b.c.d`, or `None` if
/// `addr` isn't in that form.
pub fn as_ipv4_mapped(addr: &Ipv6Addr) -> Option<[u8; 4]> {
    addr.to_ipv4_mapped().map(|v4| v4.octets())
}

/// How a destination IPv6 address resolves to a mesh node id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolvedDestination {
    MeshNode(NodeId),
    Gateway,
    Unresolved,
}

/// Resolves `dest` against the mesh prefix, the gateway's own LAN
/// address, or (for IPv4-mapped addresses) the NAT table.
pub fn resolve_destination(
    dest: &Ipv6Addr,
    pan_prefix: &Ipv6Addr,
    prefix_length: u8,
    gw_addr: &Ipv6Addr,
    nat: &Ipv4NatTable,
) -> ResolvedDestination {
    if dest == gw_addr {
        return ResolvedDestination::Gateway;
    }
    if shares_prefix(dest, pan_prefix, prefix_length) {
        let segments = dest.segments();
        let node_id: u16 = segments[7];
        return ResolvedDestination::MeshNode(NodeId::from(node_id));
    }
    if let Some(ipv4) = as_ipv4_mapped(dest) {
        if let Some(node) = nat.lookup(ipv4) {
            return ResolvedDestination::MeshNode(node);
        }
    }
    ResolvedDestination::Unresolved
}

fn shares_prefix(addr: &Ipv6Addr, prefix: &Ipv6Addr, prefix_length: u8) -> bool {
    let addr_bits = u128::from_be_bytes(addr.octets());
    let prefix_bits = u128::from_be_bytes(prefix.octets());
    if prefix_length == 0 {
        return true;
    }
    let mask = !0u128 << (128 - prefix_length as u32);
    (addr_bits & mask) == (prefix_bits & mask)
}

/// Key identifying one temporary association.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TempAssocKey {
    pub peer_ip: Ipv6Addr,
    pub peer_port: u16,
    pub rx_endpoint: EndpointIndex,
}

struct TempAssocSlot {
    key: TempAssocKey,
    assoc: TemporaryAssociation,
    fw_locked_until: Option<Instant>,
}

/// The virtual-node pool, IPv4 NAT table, temporary/persistent
/// association tables, and bridge lifecycle state. One instance per
/// gateway.
pub struct Bridge {
    state: BridgeState,
    virtual_nodes: Vec<NodeId>,
    learn_mode_attempts: u32,
    nat: Ipv4NatTable,
    temp_associations: VecDeque<TempAssocSlot>,
    temp_capacity: usize,
    ip_associations: Vec<IpAssociation>,
}

impl Bridge {
    pub fn new(temp_capacity: usize, nat_capacity: usize) -> Self {
        Self {
            state: BridgeState::Booting,
            virtual_nodes: Vec::new(),
            learn_mode_attempts: 0,
            nat: Ipv4NatTable::new(nat_capacity),
            temp_associations: VecDeque::new(),
            temp_capacity,
            ip_associations: Vec::new(),
        }
    }

    pub fn state(&self) -> BridgeState {
        self.state
    }

    /// Feeds one `SetSlaveLearnMode` result into the bounded init chain
    /// (retry cap `VIRTUAL_NODE_ALLOC_RETRY_CAP`, cooldown enforced by
    /// the caller waiting `VIRTUAL_NODE_ALLOC_COOLDOWN` between calls).
    /// Call repeatedly until `state()` leaves `Booting`.
    pub fn feed_slave_learn_mode_result(&mut self, outcome: SlaveLearnModeOutcome, target_count: usize) {
        if self.state != BridgeState::Booting {
            return;
        }
        match outcome {
            SlaveLearnModeOutcome::Added(node) => {
                self.virtual_nodes.push(node);
                self.learn_mode_attempts = 0;
                if self.virtual_nodes.len() >= target_count {
                    self.state = BridgeState::Initialized;
                }
            }
            SlaveLearnModeOutcome::Failed => {
                self.learn_mode_attempts += 1;
                if self.learn_mode_attempts > VIRTUAL_NODE_ALLOC_RETRY_CAP {
                    self.state = BridgeState::InitFail;
                }
            }
        }
    }

    pub fn virtual_node_count(&self) -> usize {
        self.virtual_nodes.len()
    }

    pub fn nat_table(&self) -> &Ipv4NatTable {
        &self.nat
    }

    pub fn nat_table_mut(&mut self) -> &mut Ipv4NatTable {
        &mut self.nat
    }

    /// Looks up (or creates) the temporary association for `key`. On
    /// creation, if the pool is at capacity, evicts the oldest entry not
    /// currently firmware-locked; fails if every entry is locked.
    pub fn get_or_create_temp_association(
        &mut self,
        key: TempAssocKey,
        virtual_id: NodeId,
        is_long_range: bool,
    ) -> Result<NodeId> {
        if let Some(slot) = self.temp_associations.iter().find(|s| s.key == key) {
            return Ok(slot.assoc.virtual_id_active);
        }

        if self.temp_associations.len() >= self.temp_capacity {
            self.evict_one_unlocked()?;
        }

        let assoc = TemporaryAssociation {
            virtual_id_static: virtual_id,
            virtual_id_active: virtual_id,
            resource_ip6: key.peer_ip,
            resource_port: key.peer_port,
            resource_endpoint: key.rx_endpoint,
            was_dtls: false,
            is_long_range,
        };
        self.temp_associations.push_back(TempAssocSlot {
            key,
            assoc,
            fw_locked_until: None,
        });
        Ok(virtual_id)
    }

    fn evict_one_unlocked(&mut self) -> Result<()> {
        let now = Instant::now();
        let index = self
            .temp_associations
            .iter()
            .position(|s| !s.fw_locked_until.is_some_and(|until| now < until));
        match index {
            Some(i) => {
                self.temp_associations.remove(i);
                Ok(())
            }
            None => Err(Error::PoolExhausted("all temporary associations are firmware-locked")),
        }
    }

    /// Marks the temporary association for `key` as firmware-update
    /// locked for 60s; eviction skips it until the lock
    /// expires.
    pub fn lock_for_firmware_update(&mut self, key: TempAssocKey) {
        if let Some(slot) = self.temp_associations.iter_mut().find(|s| s.key == key) {
            slot.fw_locked_until = Some(Instant::now() + Duration::from_secs(60));
        }
    }

    pub fn temp_association_count(&self) -> usize {
        self.temp_associations.len()
    }

    /// Adds a persistent IP association; fails once `MAX_IP_ASSOCIATIONS`
    /// is reached.
    pub fn add_ip_association(&mut self, assoc: IpAssociation) -> Result<()> {
        if self.ip_associations.len() >= MAX_IP_ASSOCIATIONS {
            return Err(Error::PoolExhausted("IP association table full"));
        }
        self.ip_associations.push(assoc);
        Ok(())
    }

    pub fn ip_associations(&self) -> &[IpAssociation] {
        &self.ip_associations
    }

    pub fn remove_ip_association(&mut self, virtual_id: NodeId) {
        self.ip_associations.retain(|a| a.virtual_id != virtual_id);
    }

    pub fn ip_associations_by_type(&self, kind: IpAssociationType) -> impl Iterator<Item = &IpAssociation> {
        self.ip_associations.iter().filter(move |a| a.kind == kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pan_prefix() -> Ipv6Addr {
        "fd00:aaaa::".parse().unwrap()
    }

    #[test]
    fn mesh_node_resolves_from_low_bits() {
        let gw = "fd00:bbbb::1".parse().unwrap();
        let nat = Ipv4NatTable::new(4);
        let dest: Ipv6Addr = "fd00:aaaa::7".parse().unwrap();
        let resolved = resolve_destination(&dest, &pan_prefix(), 64, &gw, &nat);
        assert_eq!(resolved, ResolvedDestination::MeshNode(NodeId::new(7u16)));
    }

    #[test]
    fn gateway_address_resolves_to_gateway() {
        let gw: Ipv6Addr = "fd00:bbbb::1".parse().unwrap();
        let nat = Ipv4NatTable::new(4);
        let resolved = resolve_destination(&gw, &pan_prefix(), 64, &gw, &nat);
        assert_eq!(resolved, ResolvedDestination::Gateway);
    }

    #[test]
    fn ipv4_mapped_address_uses_nat_table() {
        let gw = "fd00:bbbb::1".parse().unwrap();
        let mut nat = Ipv4NatTable::new(4);
        nat.insert([10, 0, 0, 5], NodeId::new(42u8));
        let dest: Ipv6Addr = "::ffff:10.0.0.5".parse().unwrap();
        let resolved = resolve_destination(&dest, &pan_prefix(), 64, &gw, &nat);
        assert_eq!(resolved, ResolvedDestination::MeshNode(NodeId::new(42u8)));
    }

    #[test]
    fn nat_table_evicts_lru_when_full() {
        let mut nat = Ipv4NatTable::new(2);
        nat.insert([1, 1, 1, 1], NodeId::new(1u8));
        nat.insert([2, 2, 2, 2], NodeId::new(2u8));
        nat.insert([3, 3, 3, 3], NodeId::new(3u8));
        assert_eq!(nat.lookup([1, 1, 1, 1]), None);
        assert_eq!(nat.lookup([2, 2, 2, 2]), Some(NodeId::new(2u8)));
        assert_eq!(nat.lookup([3, 3, 3, 3]), Some(NodeId::new(3u8)));
    }

    fn temp_key(port: u16) -> TempAssocKey {
        TempAssocKey {
            peer_ip: "fd00:cccc::1".parse().unwrap(),
            peer_port: port,
            rx_endpoint: EndpointIndex::Root,
        }
    }

    #[test]
    fn temp_association_eviction_skips_firmware_locked_entries() {
        let mut bridge = Bridge::new(2, 4);
        bridge
            .get_or_create_temp_association(temp_key(1), NodeId::new(100u8), false)
            .unwrap();
        bridge
            .get_or_create_temp_association(temp_key(2), NodeId::new(101u8), false)
            .unwrap();
        bridge.lock_for_firmware_update(temp_key(1));

        // Pool full; oldest (key 1) is locked, so key 2 should be evicted.
        bridge
            .get_or_create_temp_association(temp_key(3), NodeId::new(102u8), false)
            .unwrap();
        assert_eq!(bridge.temp_association_count(), 2);
        assert!(bridge.temp_associations.iter().any(|s| s.key == temp_key(1)));
        assert!(bridge.temp_associations.iter().any(|s| s.key == temp_key(3)));
    }

    #[test]
    fn temp_association_eviction_fails_when_all_locked() {
        let mut bridge = Bridge::new(1, 4);
        bridge
            .get_or_create_temp_association(temp_key(1), NodeId::new(100u8), false)
            .unwrap();
        bridge.lock_for_firmware_update(temp_key(1));
        let result = bridge.get_or_create_temp_association(temp_key(2), NodeId::new(101u8), false);
        assert!(matches!(result, Err(Error::PoolExhausted(_))));
    }

    #[test]
    fn bridge_init_reaches_initialized_after_target_count() {
        let mut bridge = Bridge::new(4, 4);
        bridge.feed_slave_learn_mode_result(SlaveLearnModeOutcome::Added(NodeId::new(50u8)), 2);
        assert_eq!(bridge.state(), BridgeState::Booting);
        bridge.feed_slave_learn_mode_result(SlaveLearnModeOutcome::Added(NodeId::new(51u8)), 2);
        assert_eq!(bridge.state(), BridgeState::Initialized);
    }

    #[test]
    fn bridge_init_fails_after_retry_cap_exceeded() {
        let mut bridge = Bridge::new(4, 4);
        for _ in 0..=VIRTUAL_NODE_ALLOC_RETRY_CAP {
            bridge.feed_slave_learn_mode_result(SlaveLearnModeOutcome::Failed, 2);
        }
        assert_eq!(bridge.state(), BridgeState::InitFail);
    }

    #[test]
    fn ip_association_table_caps_at_ten() {
        let mut bridge = Bridge::new(4, 4);
        for i in 0..MAX_IP_ASSOCIATIONS {
            bridge
                .add_ip_association(IpAssociation {
                    virtual_id: NodeId::new(i as u8 + 10),
                    resource_ip6: "fd00::1".parse().unwrap(),
                    resource_port: 4123,
                    resource_endpoint: EndpointIndex::Root,
                    han_node: NodeId::new(1u8),
                    han_endpoint: EndpointIndex::Root,
                    kind: IpAssociationType::Normal,
                })
                .unwrap();
        }
        let result = bridge.add_ip_association(IpAssociation {
            virtual_id: NodeId::new(200u8),
            resource_ip6: "fd00::1".parse().unwrap(),
            resource_port: 4123,
            resource_endpoint: EndpointIndex::Root,
            han_node: NodeId::new(1u8),
            han_endpoint: EndpointIndex::Root,
            kind: IpAssociationType::Normal,
        });
        assert!(matches!(result, Err(Error::PoolExhausted(_))));
    }
}
