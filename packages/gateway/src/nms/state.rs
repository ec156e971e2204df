//! States and sub-state flags for the network management state machine.
//!
//! Each `…Retry` twin behaves as its non-retry counterpart but counts
//! against a bounded-retry budget (4 repeats for NWI/NWE exploration, 1
//! for self-destruct removal).

use bitflags::bitflags;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NmsState {
    Idle,
    WaitingForAdd,
    WaitingForAddRetry,
    NodeFound,
    WaitForProtocol,
    WaitForSecureAdd,
    WaitForProbeAfterAdd,
    WaitDhcp,
    SetDefault,
    LearnMode,
    LearnModeRetry,
    LearnModeStarted,
    WaitForSecureLearn,
    WaitForMdns,
    ReplaceFailedReq,
    ReplaceFailedReqRetry,
    PrepareSucInclusion,
    WaitForSucInclusion,
    ProxyInclusionWaitNif,
    WaitForSelfDestruct,
    WaitForTxToSelfDestruct,
    WaitForSelfDestructRemoval,
    WaitForSelfDestructRemovalRetry,
    WaitForNeighborUpdateAfterSecureAdd,
    WaitingForNodeRemoval,
    WaitingForFailNodeRemoval,
    WaitingForNodeNeighUpdate,
    WaitingForReturnRouteAssign,
    WaitingForReturnRouteDelete,
    WaitingForProbe,
    NetworkUpdate,
    WaitForNodeInfoProbe,
    SendingNodeInfo,
    RemovingAssociations,
}

impl NmsState {
    pub fn is_idle(&self) -> bool {
        matches!(self, NmsState::Idle)
    }

    /// Whether this is a `…Retry` twin of another state, for retry-budget
    /// bookkeeping.
    pub fn is_retry(&self) -> bool {
        matches!(
            self,
            NmsState::WaitingForAddRetry
                | NmsState::LearnModeRetry
                | NmsState::ReplaceFailedReqRetry
                | NmsState::WaitForSelfDestructRemovalRetry
        )
    }
}

bitflags! {
    /// Sub-state flags carried alongside `NmsState`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct NmsFlags: u16 {
        const S2_ADD                  = 0b0000_0000_0001;
        const PROXY_INCLUSION         = 0b0000_0000_0010;
        const LEARNMODE_NEW           = 0b0000_0000_0100;
        const LEARNMODE_NWI           = 0b0000_0000_1000;
        const LEARNMODE_NWE           = 0b0000_0001_0000;
        const CONTROLLER_REPLICATION  = 0b0000_0010_0000;
        const SMART_START_INCLUSION   = 0b0000_0100_0000;
        const REPORT_DSK              = 0b0000_1000_0000;
        const CSA_INCLUSION           = 0b0001_0000_0000;
    }
}

/// Learn-mode variants, mirroring the `LearnSet` event payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LearnMode {
    Classic,
    Nwi,
    Nwe,
}
