//! Component G: the network management state machine.
//!
//! Hand-rolled as a plain state enum + `match`-driven transition method
//! rather than `zwave_core::state_machine!`'s declarative macro: that
//! macro suits `packages/driver/src/driver/serial_api_machine.rs`'s small,
//! linear `SerialApiMachine`, but this FSM's ~30 states and
//! cross-component side effects (calling out to the security,
//! send-pipeline, resource-directory and bridge components) are easier
//! to keep correct as explicit code — the same judgment call
//! `zwave_core::security::SecurityManager` itself makes, which is
//! hand-rolled too.
//!
//! The FSM never performs I/O directly: `handle` returns a list of
//! [`NmAction`]s for the owning actor to carry out (send a frame, start a
//! timer, call into another component) rather than calling back into
//! them directly, replacing 'callback + user pointer' with an enum of
//! completion messages.

pub mod event;
pub mod state;

use std::time::Duration;

use zwave_core::definitions::NodeId;

pub use event::{CC_ASSOCIATION, CC_IP_ASSOCIATION, CC_SECURITY, NmsEvent, NodeInfoFrame, SecurityOutcome};
pub use state::{LearnMode, NmsFlags, NmsState};

/// The reply the FSM wants delivered to the peer that issued the
/// current command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NmReply {
    NodeAddStatus {
        seq_no: u8,
        status: NodeAddStatusCode,
        new_node_id: Option<NodeId>,
        dsk: Vec<u8>,
        /// The probed node's command-class list, `COMMAND_CLASS_ASSOCIATION`
        /// rewritten to `COMMAND_CLASS_IP_ASSOCIATION` (spec.md §4.G step 8).
        endpoint_command_classes: Vec<u16>,
    },
    FailedNodeRemoveStatus {
        seq_no: u8,
        status: u8,
        node_id: NodeId,
    },
    ReplaceFailedStatus {
        seq_no: u8,
        status: u8,
    },
    Busy {
        seq_no: u8,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeAddStatusCode {
    Done,
    Failed,
    SecurityFailed,
}

/// Side effects the owning actor must carry out; none of these are
/// implemented here (the radio façade's wire-level controller operations
/// are explicitly out of scope here).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NmAction {
    StartAddNodeToNetwork { smart_start: bool },
    StopAddNodeToNetwork,
    StartSetLearnMode(LearnMode),
    StopLearnMode,
    SecurityAddBegin { node_id: NodeId, is_controller: bool },
    ReleaseProbeLock,
    SendNop { node_id: NodeId },
    RemoveFailedNode { node_id: NodeId },
    ReplaceFailedNode { node_id: NodeId },
    DeleteFromRdAndNat { node_id: NodeId },
    RequestInclusionControllerHandover { node_id: NodeId, is_replace: bool },
    SetTimer(Duration),
    CancelTimer,
    EmitReply(NmReply),
}

/// `NODE_ADD_STATUS`'s endpoint/command-class list reports `IP_ASSOCIATION`
/// in place of the node's own `ASSOCIATION` support, since the gateway
/// proxies group reports over IP rather than handing out the radio-side
/// command class (spec.md §4.G step 8, scenario S2).
fn rewrite_association_to_ip(command_classes: &[u16]) -> Vec<u16> {
    command_classes
        .iter()
        .map(|&cc| if cc == CC_ASSOCIATION { CC_IP_ASSOCIATION } else { cc })
        .collect()
}

/// Retry budgets for bounded re-exploration and self-destruct removal.
const NWI_NWE_RETRY_CAP: u32 = 4;
const SELF_DESTRUCT_REMOVAL_RETRY_CAP: u32 = 1;

pub struct NetworkManagement {
    state: NmsState,
    flags: NmsFlags,
    seq_no: Option<u8>,
    pending_node: Option<NodeId>,
    captured_nif: Option<NodeInfoFrame>,
    dsk: Option<[u8; 16]>,
    retry_count: u32,
    learn_mode: Option<LearnMode>,
    /// Whether this gateway currently holds the S0 network key (drives
    /// the "if the gateway holds S0 ..." branch in step 6 of the happy
    /// path).
    gateway_has_s0: bool,
}

impl NetworkManagement {
    pub fn new(gateway_has_s0: bool) -> Self {
        Self {
            state: NmsState::Idle,
            flags: NmsFlags::empty(),
            seq_no: None,
            pending_node: None,
            captured_nif: None,
            dsk: None,
            retry_count: 0,
            learn_mode: None,
            gateway_has_s0,
        }
    }

    pub fn state(&self) -> NmsState {
        self.state
    }

    pub fn flags(&self) -> NmsFlags {
        self.flags
    }

    fn reset_to_idle(&mut self) {
        self.state = NmsState::Idle;
        self.flags = NmsFlags::empty();
        self.seq_no = None;
        self.pending_node = None;
        self.captured_nif = None;
        self.dsk = None;
        self.retry_count = 0;
        self.learn_mode = None;
    }

    /// Processes one event from the mailbox. Handlers run to completion
    /// before the next event is considered — there is no re-entrancy,
    /// matching the single-threaded manager loop.
    pub fn handle(&mut self, event: NmsEvent) -> Vec<NmAction> {
        use NmsEvent::*;

        // §4.G / §8 property 7: "NM serialisation" — a second NodeAdd
        // while busy is rejected rather than silently dropped.
        if !self.state.is_idle() {
            if let NodeAdd { seq_no } | NodeAddS2 { seq_no } = &event {
                return vec![NmAction::EmitReply(NmReply::Busy { seq_no: *seq_no })];
            }
        }

        match (self.state, event) {
 // ---- Inclusion happy path ----
            (NmsState::Idle, NodeAdd { seq_no }) => {
                self.seq_no = Some(seq_no);
                self.state = NmsState::WaitingForAdd;
                vec![
                    NmAction::StartAddNodeToNetwork { smart_start: false },
                    NmAction::SetTimer(Duration::from_secs(2400)),
                ]
            }
            (NmsState::Idle, NodeAddSmartStart { seq_no }) => {
                self.seq_no = Some(seq_no);
                self.flags.insert(NmsFlags::SMART_START_INCLUSION);
                self.state = NmsState::WaitingForAdd;
                vec![
                    NmAction::StartAddNodeToNetwork { smart_start: true },
                    NmAction::SetTimer(Duration::from_secs(2400)),
                ]
            }
            (NmsState::WaitingForAdd, AddNodeFound) => {
                self.state = NmsState::NodeFound;
                vec![NmAction::SetTimer(Duration::from_secs(60))]
            }
            (NmsState::NodeFound, AddController(nif)) => self.capture_nif(nif, true),
            (NmsState::NodeFound, AddEndNode(nif)) => self.capture_nif(nif, false),
            (NmsState::WaitForProtocol, AddProtocolDone) => {
                vec![NmAction::StopAddNodeToNetwork]
            }
            (NmsState::WaitForProtocol, AddNodeStatusDone) => self.on_add_node_status_done(),
            (NmsState::WaitForProtocol, AddNodeStatusSflndDone) => self.on_add_node_status_done(),
            (NmsState::PrepareSucInclusion, ProxyComplete { status }) => {
                self.flags.insert(NmsFlags::PROXY_INCLUSION);
                self.node_properties_after_handoff(status == 0)
            }
            (NmsState::WaitForSecureAdd, SecurityDone(outcome)) => self.on_security_done(outcome),
            (NmsState::WaitForProbeAfterAdd, NodeProbeDone { node_id })
                if self.pending_node == Some(node_id) =>
            {
                self.state = NmsState::WaitDhcp;
                let reply = self.build_node_add_status(NodeAddStatusCode::Done);
                vec![NmAction::SetTimer(Duration::from_secs(5)), NmAction::EmitReply(reply)]
            }
            (NmsState::WaitDhcp, DhcpDone) | (NmsState::WaitDhcp, Timeout) => {
                self.reset_to_idle();
                vec![NmAction::CancelTimer]
            }

            // ---- Security key bookkeeping ----
            (_, SecurityDskSet { dsk }) => {
                self.dsk = Some(dsk);
                vec![]
            }
            (_, SecurityReqKeys) | (_, SecurityKeyChallenge) | (_, SecurityKeysSet) => vec![],

            // ---- Smart-start self-destruct (scenario S6) ----
            (NmsState::WaitForSelfDestruct, Timeout) => {
                self.state = NmsState::WaitForTxToSelfDestruct;
                let node_id = self.pending_node.expect("self-destruct always has a pending node");
                vec![NmAction::SendNop { node_id }]
            }
            (NmsState::WaitForTxToSelfDestruct, TxDoneSelfDestruct) => {
                self.state = NmsState::WaitForSelfDestructRemoval;
                let node_id = self.pending_node.expect("self-destruct always has a pending node");
                vec![
                    NmAction::RemoveFailedNode { node_id },
                    NmAction::SetTimer(Duration::from_secs(20)),
                ]
            }
            (NmsState::WaitForSelfDestructRemoval, RemoveFailedOk { node_id }) => {
                self.reset_to_idle();
                vec![
                    NmAction::EmitReply(NmReply::NodeAddStatus {
                        seq_no: 0,
                        status: NodeAddStatusCode::Failed,
                        new_node_id: Some(node_id),
                        dsk: Vec::new(),
                        endpoint_command_classes: Vec::new(),
                    }),
                    NmAction::DeleteFromRdAndNat { node_id },
                ]
            }
            (NmsState::WaitForSelfDestructRemoval, RemoveFailedFail { node_id }) => {
                if self.retry_count < SELF_DESTRUCT_REMOVAL_RETRY_CAP {
                    self.retry_count += 1;
                    self.state = NmsState::WaitForSelfDestructRemovalRetry;
                    vec![NmAction::SetTimer(Duration::from_secs(240))]
                } else {
                    self.reset_to_idle();
                    vec![NmAction::EmitReply(NmReply::NodeAddStatus {
                        seq_no: 0,
                        status: NodeAddStatusCode::SecurityFailed,
                        new_node_id: Some(node_id),
                        dsk: Vec::new(),
                        endpoint_command_classes: Vec::new(),
                    })]
                }
            }
            (NmsState::WaitForSelfDestructRemovalRetry, Timeout) => {
                self.state = NmsState::WaitForSelfDestructRemoval;
                let node_id = self.pending_node.expect("self-destruct always has a pending node");
                vec![
                    NmAction::RemoveFailedNode { node_id },
                    NmAction::SetTimer(Duration::from_secs(20)),
                ]
            }

            // ---- Failed-node removal (scenario S3) ----
            (NmsState::Idle, FailedNodeRemove { node_id, seq_no }) => {
                self.seq_no = Some(seq_no);
                self.pending_node = Some(node_id);
                self.state = NmsState::WaitingForFailNodeRemoval;
                vec![NmAction::RemoveFailedNode { node_id }]
            }
            (NmsState::WaitingForFailNodeRemoval, RemoveFailedOk { node_id }) => {
                let seq_no = self.seq_no.unwrap_or(0);
                self.reset_to_idle();
                vec![NmAction::EmitReply(NmReply::FailedNodeRemoveStatus {
                    seq_no,
                    status: 0x00,
                    node_id,
                })]
            }
            (NmsState::WaitingForFailNodeRemoval, RemoveFailedFail { node_id }) => {
                let seq_no = self.seq_no.unwrap_or(0);
                self.reset_to_idle();
                vec![NmAction::EmitReply(NmReply::FailedNodeRemoveStatus {
                    seq_no,
                    status: 0x01,
                    node_id,
                })]
            }

            // ---- Replace-failed ----
            (NmsState::Idle, ReplaceFailedStart { node_id, seq_no })
            | (NmsState::Idle, ReplaceFailedStartS2 { node_id, seq_no }) => {
                self.seq_no = Some(seq_no);
                self.pending_node = Some(node_id);
                self.state = NmsState::ReplaceFailedReq;
                vec![NmAction::ReplaceFailedNode { node_id }]
            }
            (NmsState::ReplaceFailedReq, ReplaceFailedDone) => {
                let seq_no = self.seq_no.unwrap_or(0);
                self.reset_to_idle();
                vec![NmAction::EmitReply(NmReply::ReplaceFailedStatus { seq_no, status: 0x00 })]
            }
            (NmsState::ReplaceFailedReq, ReplaceFailedFail) => {
                let seq_no = self.seq_no.unwrap_or(0);
                self.reset_to_idle();
                vec![NmAction::EmitReply(NmReply::ReplaceFailedStatus { seq_no, status: 0x01 })]
            }
            (NmsState::ReplaceFailedReq, ReplaceFailedStop) => {
                self.reset_to_idle();
                vec![NmAction::CancelTimer]
            }

            // ---- Exclusion / learn mode ----
            (NmsState::Idle, LearnSet { mode }) => self.start_learn_mode(mode),
            (NmsState::LearnMode, Timeout) | (NmsState::LearnModeRetry, Timeout) => {
                self.retry_learn_mode()
            }
            (NmsState::LearnMode, NodeInfo(nif)) | (NmsState::LearnModeStarted, NodeInfo(nif)) => {
                self.captured_nif = Some(nif);
                self.reset_to_idle();
                vec![NmAction::StopLearnMode]
            }

            // ---- Inclusion-controller delegation ----
            (NmsState::Idle, StartProxyInclusion { node_id }) => {
                self.pending_node = Some(node_id);
                self.state = NmsState::ProxyInclusionWaitNif;
                vec![NmAction::RequestInclusionControllerHandover { node_id, is_replace: false }]
            }
            (NmsState::Idle, StartProxyReplace { node_id }) => {
                self.pending_node = Some(node_id);
                self.state = NmsState::ProxyInclusionWaitNif;
                vec![NmAction::RequestInclusionControllerHandover { node_id, is_replace: true }]
            }
            (NmsState::ProxyInclusionWaitNif, ProxyComplete { status: _ }) => {
                self.reset_to_idle();
                vec![]
            }
            (NmsState::ProxyInclusionWaitNif, Timeout) => {
 // 4*60+2s budget elapsed with no COMPLETE.
                self.reset_to_idle();
                vec![NmAction::CancelTimer]
            }

            // ---- Stop / abandon ----
            (_, NodeAddStop) => {
                self.reset_to_idle();
                vec![NmAction::StopAddNodeToNetwork]
            }
            (_, AddFailed) | (_, AddNotPrimary) => {
                self.reset_to_idle();
                vec![NmAction::EmitReply(NmReply::NodeAddStatus {
                    seq_no: 0,
                    status: NodeAddStatusCode::Failed,
                    new_node_id: None,
                    dsk: Vec::new(),
                    endpoint_command_classes: Vec::new(),
                })]
            }

            // Any Timeout not matched above never leaves the FSM
 // partially in a sub-state.
            (_, Timeout) => {
                self.reset_to_idle();
                vec![NmAction::CancelTimer]
            }

            // Events with no effect in the current state are ignored.
            _ => vec![],
        }
    }

    fn capture_nif(&mut self, nif: NodeInfoFrame, is_controller: bool) -> Vec<NmAction> {
        self.pending_node = Some(nif.node_id);
        let _ = is_controller;
        self.captured_nif = Some(nif);
        self.state = NmsState::WaitForProtocol;
        vec![]
    }

    fn on_add_node_status_done(&mut self) -> Vec<NmAction> {
        let mut actions = vec![NmAction::StopAddNodeToNetwork];
        if self.flags.contains(NmsFlags::PROXY_INCLUSION) {
            self.state = NmsState::PrepareSucInclusion;
            return actions;
        }
        self.flags.insert(NmsFlags::LEARNMODE_NEW);
        actions.extend(self.begin_security_or_synthesise());
        actions
    }

    fn node_properties_after_handoff(&mut self, sis_supports_ic: bool) -> Vec<NmAction> {
        let _ = sis_supports_ic;
        self.begin_security_or_synthesise()
    }

    fn begin_security_or_synthesise(&mut self) -> Vec<NmAction> {
        let node_id = self.pending_node.expect("node id captured before security begins");
        let nif_has_security = self
            .captured_nif
            .as_ref()
            .is_some_and(|nif| nif.command_classes.contains(&CC_SECURITY));
        let is_controller = self.captured_nif.as_ref().is_some_and(|n| n.is_controller);

        if self.gateway_has_s0 && nif_has_security {
            self.state = NmsState::WaitForSecureAdd;
            vec![NmAction::SecurityAddBegin { node_id, is_controller }]
        } else {
            self.on_security_done(SecurityOutcome::Done { flags: 0 })
        }
    }

    fn on_security_done(&mut self, outcome: SecurityOutcome) -> Vec<NmAction> {
        match outcome {
            SecurityOutcome::Done { .. } => {
                self.state = NmsState::WaitForProbeAfterAdd;
                vec![NmAction::ReleaseProbeLock]
            }
            SecurityOutcome::KnownBad => {
                if self.flags.contains(NmsFlags::SMART_START_INCLUSION) {
                    self.state = NmsState::WaitForSelfDestruct;
                    vec![NmAction::SetTimer(Duration::from_secs(3))]
                } else {
                    self.state = NmsState::WaitForProbeAfterAdd;
                    vec![NmAction::ReleaseProbeLock]
                }
            }
        }
    }

    fn build_node_add_status(&self, status: NodeAddStatusCode) -> NmReply {
        NmReply::NodeAddStatus {
            seq_no: self.seq_no.unwrap_or(0),
            status,
            new_node_id: self.pending_node,
            dsk: self.dsk.map(|d| d.to_vec()).unwrap_or_default(),
            endpoint_command_classes: self
                .captured_nif
                .as_ref()
                .map(|nif| rewrite_association_to_ip(&nif.command_classes))
                .unwrap_or_default(),
        }
    }

    fn start_learn_mode(&mut self, mode: LearnMode) -> Vec<NmAction> {
        self.learn_mode = Some(mode);
        self.retry_count = 0;
        match mode {
            LearnMode::Classic => {
                self.state = NmsState::LearnModeStarted;
                vec![NmAction::StartSetLearnMode(mode)]
            }
            LearnMode::Nwi | LearnMode::Nwe => {
                self.state = NmsState::LearnMode;
                vec![NmAction::StartSetLearnMode(mode), NmAction::SetTimer(Duration::from_secs(4))]
            }
        }
    }

    fn retry_learn_mode(&mut self) -> Vec<NmAction> {
        let mode = self.learn_mode.expect("learn mode set before retries begin");
        if self.retry_count >= NWI_NWE_RETRY_CAP {
            self.reset_to_idle();
            return vec![NmAction::StopLearnMode];
        }
        self.retry_count += 1;
        self.state = NmsState::LearnModeRetry;
        vec![NmAction::StartSetLearnMode(mode), NmAction::SetTimer(Duration::from_secs(4))]
    }

    /// Builds the classic+long-range node-list bitmask reply, trimmed to
    /// the minimal byte length that fits the highest set bit.
    pub fn build_node_list(node_ids: &[NodeId]) -> Vec<u8> {
        let highest: u16 = node_ids.iter().map(|n| u16::from(*n)).max().unwrap_or(0);
        let byte_len = (highest as usize / 8) + 1;
        let mut mask = vec![0u8; byte_len.max(1)];
        for node in node_ids {
            let raw: u16 = (*node).into();
            if raw == 0 {
                continue;
            }
            let idx = (raw - 1) as usize;
            let byte = idx / 8;
            let bit = idx % 8;
            if byte < mask.len() {
                mask[byte] |= 1 << bit;
            }
        }
        mask
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nif(node_id: u8, classes: &[u16]) -> NodeInfoFrame {
        NodeInfoFrame {
            node_id: NodeId::new(node_id),
            basic_device_class: 0x04,
            generic_device_class: 0x11,
            specific_device_class: 0x01,
            command_classes: classes.to_vec(),
            is_controller: false,
        }
    }

    /// Scenario S2: inclusion of a non-controller end node with S0.
    #[test]
    fn inclusion_happy_path_with_s0() {
        let mut nms = NetworkManagement::new(true);

        let actions = nms.handle(NmsEvent::NodeAdd { seq_no: 7 });
        assert_eq!(nms.state(), NmsState::WaitingForAdd);
        assert!(actions.contains(&NmAction::StartAddNodeToNetwork { smart_start: false }));

        nms.handle(NmsEvent::AddNodeFound);
        assert_eq!(nms.state(), NmsState::NodeFound);

        nms.handle(NmsEvent::AddEndNode(nif(12, &[0x04, 0x11, 0x01, CC_SECURITY, CC_ASSOCIATION, 0x86])));
        assert_eq!(nms.state(), NmsState::WaitForProtocol);

        nms.handle(NmsEvent::AddProtocolDone);
        let actions = nms.handle(NmsEvent::AddNodeStatusDone);
        assert_eq!(nms.state(), NmsState::WaitForSecureAdd);
        assert!(actions
            .iter()
            .any(|a| matches!(a, NmAction::SecurityAddBegin { node_id, .. } if *node_id == NodeId::new(12u8))));

        nms.handle(NmsEvent::SecurityDone(SecurityOutcome::Done { flags: 0x01 }));
        assert_eq!(nms.state(), NmsState::WaitForProbeAfterAdd);

        let actions = nms.handle(NmsEvent::NodeProbeDone { node_id: NodeId::new(12u8) });
        assert_eq!(nms.state(), NmsState::WaitDhcp);
        let reply = actions
            .iter()
            .find_map(|a| match a {
                NmAction::EmitReply(r) => Some(r.clone()),
                _ => None,
            })
            .unwrap();
        assert_eq!(
            reply,
            NmReply::NodeAddStatus {
                seq_no: 7,
                status: NodeAddStatusCode::Done,
                new_node_id: Some(NodeId::new(12u8)),
                dsk: Vec::new(),
                endpoint_command_classes: vec![0x04, 0x11, 0x01, CC_SECURITY, CC_IP_ASSOCIATION, 0x86],
            }
        );

        nms.handle(NmsEvent::DhcpDone);
        assert_eq!(nms.state(), NmsState::Idle);
    }

    /// Scenario S3: failed-node removal.
    #[test]
    fn failed_node_removal_replies_synchronously() {
        let mut nms = NetworkManagement::new(true);
        nms.handle(NmsEvent::FailedNodeRemove { node_id: NodeId::new(3u8), seq_no: 9 });
        assert_eq!(nms.state(), NmsState::WaitingForFailNodeRemoval);

        let actions = nms.handle(NmsEvent::RemoveFailedFail { node_id: NodeId::new(3u8) });
        assert_eq!(nms.state(), NmsState::Idle);
        assert_eq!(
            actions,
            vec![NmAction::EmitReply(NmReply::FailedNodeRemoveStatus {
                seq_no: 9,
                status: 0x01,
                node_id: NodeId::new(3u8),
            })]
        );
    }

    /// Scenario S6: smart-start self-destruct, remove-failed succeeds on
    /// the first attempt.
    #[test]
    fn smart_start_self_destruct_removes_node() {
        let mut nms = NetworkManagement::new(true);
        nms.handle(NmsEvent::NodeAddSmartStart { seq_no: 1 });
        nms.handle(NmsEvent::AddNodeFound);
        nms.handle(NmsEvent::AddEndNode(nif(22, &[0x04, 0x11, 0x01, CC_SECURITY])));
        nms.handle(NmsEvent::AddProtocolDone);
        nms.handle(NmsEvent::AddNodeStatusDone);
        assert_eq!(nms.state(), NmsState::WaitForSecureAdd);

        let actions = nms.handle(NmsEvent::SecurityDone(SecurityOutcome::KnownBad));
        assert_eq!(nms.state(), NmsState::WaitForSelfDestruct);
        assert!(actions.contains(&NmAction::SetTimer(Duration::from_secs(3))));

        let actions = nms.handle(NmsEvent::Timeout);
        assert_eq!(nms.state(), NmsState::WaitForTxToSelfDestruct);
        assert_eq!(actions, vec![NmAction::SendNop { node_id: NodeId::new(22u8) }]);

        let actions = nms.handle(NmsEvent::TxDoneSelfDestruct);
        assert_eq!(nms.state(), NmsState::WaitForSelfDestructRemoval);
        assert!(actions.contains(&NmAction::RemoveFailedNode { node_id: NodeId::new(22u8) }));

        let actions = nms.handle(NmsEvent::RemoveFailedOk { node_id: NodeId::new(22u8) });
        assert_eq!(nms.state(), NmsState::Idle);
        assert!(actions.contains(&NmAction::DeleteFromRdAndNat { node_id: NodeId::new(22u8) }));
        assert!(actions.iter().any(|a| matches!(
            a,
            NmAction::EmitReply(NmReply::NodeAddStatus { status: NodeAddStatusCode::Failed, .. })
        )));
    }

    #[test]
    fn smart_start_self_destruct_retries_once_then_reports_security_failed() {
        let mut nms = NetworkManagement::new(true);
        nms.handle(NmsEvent::NodeAddSmartStart { seq_no: 1 });
        nms.handle(NmsEvent::AddNodeFound);
        nms.handle(NmsEvent::AddEndNode(nif(22, &[0x04, 0x11, 0x01, CC_SECURITY])));
        nms.handle(NmsEvent::AddProtocolDone);
        nms.handle(NmsEvent::AddNodeStatusDone);
        nms.handle(NmsEvent::SecurityDone(SecurityOutcome::KnownBad));
        nms.handle(NmsEvent::Timeout);
        nms.handle(NmsEvent::TxDoneSelfDestruct);

        let actions = nms.handle(NmsEvent::RemoveFailedFail { node_id: NodeId::new(22u8) });
        assert_eq!(nms.state(), NmsState::WaitForSelfDestructRemovalRetry);
        assert!(actions.contains(&NmAction::SetTimer(Duration::from_secs(240))));

        nms.handle(NmsEvent::Timeout);
        assert_eq!(nms.state(), NmsState::WaitForSelfDestructRemoval);

        let actions = nms.handle(NmsEvent::RemoveFailedFail { node_id: NodeId::new(22u8) });
        assert_eq!(nms.state(), NmsState::Idle);
        assert!(actions.iter().any(|a| matches!(
            a,
            NmAction::EmitReply(NmReply::NodeAddStatus {
                status: NodeAddStatusCode::SecurityFailed,
                ..
            })
        )));
    }

    #[test]
    fn second_node_add_while_busy_is_rejected_as_busy() {
        let mut nms = NetworkManagement::new(true);
        nms.handle(NmsEvent::NodeAdd { seq_no: 1 });
        let actions = nms.handle(NmsEvent::NodeAdd { seq_no: 2 });
        assert_eq!(actions, vec![NmAction::EmitReply(NmReply::Busy { seq_no: 2 })]);
    }

    #[test]
    fn node_list_trims_to_minimal_byte_length() {
        let ids = vec![NodeId::new(1u8), NodeId::new(9u8)];
        let mask = NetworkManagement::build_node_list(&ids);
        assert_eq!(mask.len(), 2);
        assert_eq!(mask[0], 0b0000_0001);
        assert_eq!(mask[1], 0b0000_0001);
    }

    #[test]
    fn node_add_status_rewrites_association_to_ip_association() {
        assert_eq!(
            rewrite_association_to_ip(&[CC_SECURITY, CC_ASSOCIATION, 0x86]),
            vec![CC_SECURITY, CC_IP_ASSOCIATION, 0x86]
        );
        // A NIF with no `ASSOCIATION` support is passed through unchanged.
        assert_eq!(rewrite_association_to_ip(&[CC_SECURITY, 0x86]), vec![CC_SECURITY, 0x86]);
    }
}
