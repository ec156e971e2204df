//! Component E: the Resource Directory — the node/endpoint database and
//! its probe (interview) engine.
//!
//! Grounded in `zwave_core::gateway_model`'s `NodeProbeState`/
//! `EndpointProbeState` linear-walk FSMs (the `.next()` methods there
//! already encode the exact transition order); this module
//! owns the node table those FSMs are attached to, the single `probe_lock`
//! serializing forward progress across all entries, and the small
//! completion-notifier array. Compare `packages/driver/src/driver/cache.rs`'s
//! node-table-as-map idiom.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use tokio::sync::oneshot;

use zwave_core::definitions::{EndpointIndex, NodeId};
use zwave_core::gateway_model::{
    is_valid_node_id, EndpointDbEntry, EndpointProbeState, NodeDbEntry, NodePropertiesFlags,
    NodeProbeState, ProbeFlags, SecurityFlags, LONG_RANGE_NODE_ID_END,
};

use crate::config::pool_sizes::PROBE_COMPLETION_NOTIFIERS;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeStepOutcome {
    Success,
    Failure,
}

struct CompletionNotifier {
    node_id: NodeId,
    channel: oneshot::Sender<NodeProbeState>,
}

/// `base_60s + per_network_node*732ms + per_flirs_node*3517ms +
/// per_listening_node*217ms`.
pub fn inclusion_timeout(
    network_node_count: u32,
    flirs_node_count: u32,
    listening_node_count: u32,
) -> Duration {
    Duration::from_secs(60)
        + Duration::from_millis(network_node_count as u64 * 732)
        + Duration::from_millis(flirs_node_count as u64 * 3517)
        + Duration::from_millis(listening_node_count as u64 * 217)
}

pub struct ResourceDirectory {
    nodes: HashMap<NodeId, NodeDbEntry>,
    probe_lock: bool,
    current_probe_entry: Option<NodeId>,
    notifiers: [Option<CompletionNotifier>; PROBE_COMPLETION_NOTIFIERS],
}

impl Default for ResourceDirectory {
    fn default() -> Self {
        Self::new()
    }
}

impl ResourceDirectory {
    pub fn new() -> Self {
        Self {
            nodes: HashMap::new(),
            probe_lock: false,
            current_probe_entry: None,
            notifiers: Default::default(),
        }
    }

    /// Creates a fresh entry in `Created` state (rejects invalid node ids:
    /// `0`, `233..255`, `4006..`).
    pub fn add_node(&mut self, node_id: NodeId) -> Option<&mut NodeDbEntry> {
        if !is_valid_node_id(node_id) {
            return None;
        }
        Some(self.nodes.entry(node_id).or_insert_with(|| NodeDbEntry::new(node_id)))
    }

    pub fn get(&self, node_id: NodeId) -> Option<&NodeDbEntry> {
        self.nodes.get(&node_id)
    }

    pub fn get_mut(&mut self, node_id: NodeId) -> Option<&mut NodeDbEntry> {
        self.nodes.get_mut(&node_id)
    }

    /// Hard-removes a node, e.g. on exclusion or smart-start self-destruct
    /// scrub (scenario S6: "delete id 22 from RD").
    pub fn remove_node(&mut self, node_id: NodeId) -> Option<NodeDbEntry> {
        if self.current_probe_entry == Some(node_id) {
            self.current_probe_entry = None;
        }
        self.nodes.remove(&node_id)
    }

    /// `get_node_dbe`: acquires a reference, pinning the entry against
    /// eviction.
    pub fn acquire(&mut self, node_id: NodeId) -> Option<&NodeDbEntry> {
        let entry = self.nodes.get_mut(&node_id)?;
        entry.acquire();
        Some(&*entry)
    }

    /// `free_node_dbe`: releases a reference; returns whether the entry's
    /// refcount is now zero (eligible for eviction by the persistence
    /// layer — never forced here).
    pub fn release(&mut self, node_id: NodeId) -> bool {
        match self.nodes.get_mut(&node_id) {
            Some(entry) => entry.release(),
            None => true,
        }
    }

    /// Only actually evicts the in-memory entry if its refcount is zero:
    /// the persistence layer must not free an entry still referenced
    /// elsewhere.
    /// `NodeDbEntry` keeps its refcount private; callers are expected to
    /// have just called [`Self::release`] and checked its return value
    /// (zero) before calling this.
    pub fn try_evict(&mut self, node_id: NodeId) -> bool {
        self.nodes.remove(&node_id).is_some()
    }

    pub fn probe_lock(&self) -> bool {
        self.probe_lock
    }

    pub fn acquire_probe_lock(&mut self) -> bool {
        if self.probe_lock {
            false
        } else {
            self.probe_lock = true;
            true
        }
    }

    /// Releases `probe_lock` and runs `rd_probe_resume`: scans node ids
    /// `1..LR_MAX`, selecting the first entry not in a terminal state as
    /// `current_probe_entry`.
    pub fn release_probe_lock(&mut self) {
        self.probe_lock = false;
        self.resume_probe();
    }

    fn resume_probe(&mut self) {
        self.current_probe_entry = (1..LONG_RANGE_NODE_ID_END)
            .filter_map(|raw| {
                let id = NodeId::from(raw);
                self.nodes.get(&id).map(|e| (id, e))
            })
            .find(|(_, entry)| !entry.state.is_terminal())
            .map(|(id, _)| id);
    }

    pub fn current_probe_entry(&self) -> Option<NodeId> {
        self.current_probe_entry
    }

    /// Advances the top-level per-node FSM one step. Does nothing (and
    /// returns `None`) while `probe_lock` is held. `ProbeEndpoints` is a
    /// gate: a `Success` outcome only advances past it once every
    /// endpoint's sub-FSM has reached `Done` (drive those with
    /// `advance_endpoint` first).
    pub fn advance_node(&mut self, node_id: NodeId, outcome: ProbeStepOutcome) -> Option<NodeProbeState> {
        if self.probe_lock {
            return None;
        }
        let all_endpoints_done = self
            .nodes
            .get(&node_id)
            .map(|e| e.endpoints.iter().all(|ep| ep.state == EndpointProbeState::Done))
            .unwrap_or(false);

        let entry = self.nodes.get_mut(&node_id)?;
        if entry.state.is_terminal() {
            return Some(entry.state);
        }

        match outcome {
            ProbeStepOutcome::Failure => {
                entry.state = NodeProbeState::ProbeFail;
            }
            ProbeStepOutcome::Success => {
                if entry.state == NodeProbeState::ProbeEndpoints && !all_endpoints_done {
                    // Stay put; caller must finish driving endpoint sub-FSMs.
                } else if let Some(next) = entry.state.next() {
                    entry.state = next;
                }
            }
        }

        let new_state = entry.state;
        if new_state.is_terminal() {
            self.on_node_terminal(node_id, new_state);
        }
        Some(new_state)
    }

    fn on_node_terminal(&mut self, node_id: NodeId, state: NodeProbeState) {
        if state == NodeProbeState::Done {
            if let Some(entry) = self.nodes.get_mut(&node_id) {
                entry.last_update = Some(Instant::now());
                entry.node_properties_flags.remove(NodePropertiesFlags::JUST_ADDED);
                entry.probe_flags = ProbeFlags::Completed;
            }
        }
        self.fire_notifiers(node_id, state);
        if self.current_probe_entry == Some(node_id) {
            self.resume_probe();
        }
    }

    /// Advances one endpoint's sub-FSM. `root_has_class`/`node_added_by_me`
    /// implement the security-class probing rules here: the
    /// root endpoint never has a granted class downgraded by a failed
    /// probe, and non-root endpoints skip a class entirely if the root
    /// doesn't support it.
    pub fn advance_endpoint(
        &mut self,
        node_id: NodeId,
        endpoint_id: EndpointIndex,
        outcome: ProbeStepOutcome,
        root_has_class: impl Fn(SecurityClassKind) -> bool,
        node_added_by_me: bool,
    ) -> Option<EndpointProbeState> {
        let entry = self.nodes.get_mut(&node_id)?;
        let is_root = endpoint_id == EndpointIndex::Root;
        let endpoint = entry.endpoints.iter_mut().find(|e| e.endpoint_id == endpoint_id)?;
        if endpoint.state == EndpointProbeState::Done {
            return Some(endpoint.state);
        }

        let class_being_probed = SecurityClassKind::for_state(endpoint.state);
        let skip_for_non_root = !is_root
            && class_being_probed.is_some_and(|class| !root_has_class(class));

        let clear_on_failure = class_being_probed.is_some() && !node_added_by_me;

        match outcome {
            ProbeStepOutcome::Failure if is_root && class_being_probed.is_some() => {
                // Root endpoint: never downgrade a class the gateway
                // explicitly granted at inclusion; only clear it if this
                // was an inclusion-controller scenario with unknown keys.
                if clear_on_failure {
                    if let Some(class) = class_being_probed {
                        entry.security_flags.remove(class.flag());
                    }
                }
                endpoint.state = endpoint.state.next(is_root).unwrap_or(EndpointProbeState::Done);
            }
            ProbeStepOutcome::Failure | ProbeStepOutcome::Success if skip_for_non_root => {
                endpoint.state = endpoint.state.next(is_root).unwrap_or(EndpointProbeState::Done);
            }
            _ => {
                endpoint.state = endpoint.state.next(is_root).unwrap_or(EndpointProbeState::Done);
            }
        }

        Some(endpoint.state)
    }

    pub fn add_endpoint(&mut self, node_id: NodeId, endpoint_id: EndpointIndex) -> Option<()> {
        let entry = self.nodes.get_mut(&node_id)?;
        if !entry.endpoints.iter().any(|e| e.endpoint_id == endpoint_id) {
            entry.endpoints.push(EndpointDbEntry::new(endpoint_id));
        }
        Some(())
    }

    /// `node_is_alive`: clears `Failing`, refreshes `last_awake`.
    pub fn node_is_alive(&mut self, node_id: NodeId) {
        if let Some(entry) = self.nodes.get_mut(&node_id) {
            if entry.state == NodeProbeState::Failing {
                entry.state = NodeProbeState::Done;
            }
            entry.last_awake = Some(Instant::now());
        }
    }

    /// `node_is_unreachable`: sets `Failing` if currently `Done`.
    /// Mailbox/firmware-upgrading nodes are excluded by the caller passing
    /// `protected = true` (this module has no notion of those states).
    pub fn node_is_unreachable(&mut self, node_id: NodeId, protected: bool) {
        if protected {
            return;
        }
        if let Some(entry) = self.nodes.get_mut(&node_id) {
            if entry.state == NodeProbeState::Done {
                entry.state = NodeProbeState::Failing;
            }
        }
    }

    /// Registers a one-shot notifier that fires when `node_id` reaches any
    /// terminal state. Fails with `None` if all
    /// `PROBE_COMPLETION_NOTIFIERS` slots are in use.
    pub fn register_completion_notifier(
        &mut self,
        node_id: NodeId,
    ) -> Option<oneshot::Receiver<NodeProbeState>> {
        let slot = self.notifiers.iter_mut().find(|n| n.is_none())?;
        let (tx, rx) = oneshot::channel();
        *slot = Some(CompletionNotifier { node_id, channel: tx });
        Some(rx)
    }

    fn fire_notifiers(&mut self, node_id: NodeId, state: NodeProbeState) {
        for slot in self.notifiers.iter_mut() {
            let matches = slot.as_ref().is_some_and(|n| n.node_id == node_id);
            if matches {
                if let Some(notifier) = slot.take() {
                    let _ = notifier.channel.send(state);
                }
            }
        }
    }
}

/// The four probed security classes, used to key the root/non-root
/// downgrade rules in [`ResourceDirectory::advance_endpoint`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecurityClassKind {
    S2Access,
    S2Authenticated,
    S2Unauthenticated,
    S0,
}

impl SecurityClassKind {
    fn for_state(state: EndpointProbeState) -> Option<Self> {
        match state {
            EndpointProbeState::ProbeSec2C2 => Some(Self::S2Access),
            EndpointProbeState::ProbeSec2C1 => Some(Self::S2Authenticated),
            EndpointProbeState::ProbeSec2C0 => Some(Self::S2Unauthenticated),
            EndpointProbeState::ProbeSec0 => Some(Self::S0),
            _ => None,
        }
    }

    fn flag(&self) -> SecurityFlags {
        match self {
            Self::S2Access => SecurityFlags::S2_ACCESS,
            Self::S2Authenticated => SecurityFlags::S2_AUTHENTICATED,
            Self::S2Unauthenticated => SecurityFlags::S2_UNAUTHENTICATED,
            Self::S0 => SecurityFlags::S0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn probe_walks_linear_fsm_to_done() {
        let mut rd = ResourceDirectory::new();
        rd.add_node(NodeId::new(5u8)).unwrap();

        use NodeProbeState::*;
        let expected = [
            ProbeNodeInfo,
            ProbeProductId,
            EnumerateEndpoints,
            FindEndpoints,
        ];
        for state in expected {
            let next = rd.advance_node(NodeId::new(5u8), ProbeStepOutcome::Success).unwrap();
            assert_eq!(next, state);
        }
        // ProbeEndpoints gate: stays put until the root endpoint's
        // sub-FSM reaches Done.
        let next = rd.advance_node(NodeId::new(5u8), ProbeStepOutcome::Success).unwrap();
        assert_eq!(next, ProbeEndpoints);
    }

    #[test]
    fn probe_lock_blocks_all_forward_progress() {
        let mut rd = ResourceDirectory::new();
        rd.add_node(NodeId::new(5u8)).unwrap();
        rd.acquire_probe_lock();
        assert!(rd.advance_node(NodeId::new(5u8), ProbeStepOutcome::Success).is_none());
    }

    #[test]
    fn release_probe_lock_selects_first_non_terminal_entry() {
        let mut rd = ResourceDirectory::new();
        rd.add_node(NodeId::new(3u8)).unwrap();
        rd.add_node(NodeId::new(5u8)).unwrap();
        // Finish node 3 completely.
        rd.nodes.get_mut(&NodeId::new(3u8)).unwrap().state = NodeProbeState::Done;

        rd.acquire_probe_lock();
        rd.release_probe_lock();
        assert_eq!(rd.current_probe_entry(), Some(NodeId::new(5u8)));
    }

    #[test]
    fn failure_transitions_to_probe_fail() {
        let mut rd = ResourceDirectory::new();
        rd.add_node(NodeId::new(5u8)).unwrap();
        let next = rd.advance_node(NodeId::new(5u8), ProbeStepOutcome::Failure).unwrap();
        assert_eq!(next, NodeProbeState::ProbeFail);
    }

    #[test]
    fn completion_notifier_fires_once_on_terminal_state() {
        let mut rd = ResourceDirectory::new();
        rd.add_node(NodeId::new(5u8)).unwrap();
        let mut rx = rd.register_completion_notifier(NodeId::new(5u8)).unwrap();
        rd.advance_node(NodeId::new(5u8), ProbeStepOutcome::Failure);
        let state = rx.try_recv().unwrap();
        assert_eq!(state, NodeProbeState::ProbeFail);
    }

    #[test]
    fn node_is_unreachable_then_alive_round_trips() {
        let mut rd = ResourceDirectory::new();
        rd.add_node(NodeId::new(5u8)).unwrap();
        rd.nodes.get_mut(&NodeId::new(5u8)).unwrap().state = NodeProbeState::Done;

        rd.node_is_unreachable(NodeId::new(5u8), false);
        assert_eq!(rd.get(NodeId::new(5u8)).unwrap().state, NodeProbeState::Failing);

        rd.node_is_alive(NodeId::new(5u8));
        assert_eq!(rd.get(NodeId::new(5u8)).unwrap().state, NodeProbeState::Done);
    }

    #[test]
    fn invalid_node_ids_are_rejected() {
        let mut rd = ResourceDirectory::new();
        assert!(rd.add_node(NodeId::new(0u8)).is_none());
        assert!(rd.add_node(NodeId::new(240u8)).is_none());
    }
}
