//! Events accepted by the network management state machine. The FSM's
//! mailbox is strictly FIFO/serial — see
//! `NetworkManagement::handle` in `mod.rs`.

use zwave_core::definitions::NodeId;

use super::state::LearnMode;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecurityOutcome {
    Done { flags: u8 },
    KnownBad,
}

/// A node's protocol info / NIF as captured mid-inclusion.
/// `command_classes` are used to test for `COMMAND_CLASS_SECURITY`
/// membership (the gateway only invokes S0 bootstrap if both the gateway
/// holds S0 and the node's NIF advertises it).
#[derive(Debug, Clone)]
pub struct NodeInfoFrame {
    pub node_id: NodeId,
    pub basic_device_class: u8,
    pub generic_device_class: u8,
    pub specific_device_class: u8,
    pub command_classes: Vec<u16>,
    pub is_controller: bool,
}

pub const CC_SECURITY: u16 = 0x98;
/// Rewritten to [`CC_IP_ASSOCIATION`] in the `NODE_ADD_STATUS` endpoint
/// command-class list (spec.md §4.G step 8 / scenario S2).
pub const CC_ASSOCIATION: u16 = 0x85;
pub const CC_IP_ASSOCIATION: u16 = 0x5c;

#[derive(Debug, Clone)]
pub enum NmsEvent {
    NodeAdd { seq_no: u8 },
    NodeAddS2 { seq_no: u8 },
    NodeAddStop,
    NodeAddSmartStart { seq_no: u8 },
    AddLearnReady,
    AddNodeFound,
    AddController(NodeInfoFrame),
    AddProtocolDone,
    AddEndNode(NodeInfoFrame),
    AddFailed,
    AddNotPrimary,
    AddNodeStatusDone,
    AddNodeStatusSflndDone,
    SecurityDone(SecurityOutcome),
    SecurityReqKeys,
    SecurityKeyChallenge,
    SecurityKeysSet,
    SecurityDskSet { dsk: [u8; 16] },
    NodeProbeDone { node_id: NodeId },
    DhcpDone,
    ReplaceFailedStart { node_id: NodeId, seq_no: u8 },
    ReplaceFailedStartS2 { node_id: NodeId, seq_no: u8 },
    ReplaceFailedStop,
    ReplaceFailedDone,
    ReplaceFailedFail,
    LearnSet { mode: LearnMode },
    RequestNodeList { seq_no: u8 },
    RequestFailedNodeList { seq_no: u8 },
    ProxyComplete { status: u8 },
    StartProxyInclusion { node_id: NodeId },
    StartProxyReplace { node_id: NodeId },
    NodeInfo(NodeInfoFrame),
    FrameReceived,
    AllProbed,
    Timeout,
    MdnsExit,
    S0Started,
    TxDoneSelfDestruct,
    RemoveFailedOk { node_id: NodeId },
    RemoveFailedFail { node_id: NodeId },
    NeighborUpdateAfterSecureAddDone,
    FailedNodeRemove { node_id: NodeId, seq_no: u8 },
}
