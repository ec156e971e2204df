//! The gateway context: a single owned struct replacing the global
//! mutable state that `router_cfg`/`MyNodeID`/`homeID`/the nonce table/
//! the virtual-node bitmask/the send queues/the NMS struct amounted to in
//! the black-box firmware: global mutable state protected by interrupt
//! disabling is replaced with a single owned `GatewayCtx` passed by
//! reference, with per-component sub-contexts exposing only what they
//! need.
//!
//! Grounded in `packages/driver/src/driver.rs`'s `Driver` struct, which
//! plays the same role elsewhere in this workspace: one top-level owner
//! of the serial-API actor, the awaited-registry, and the node/value
//! databases, handed to callers as `&Driver`/`&mut Driver` rather than
//! reached for through statics.

use std::sync::Arc;

use zwave_core::definitions::NodeId;
use zwave_core::security::{SecurityManager, SecurityManagerOptions};
use zwave_logging::loggers::{BridgeLogger, GatewayLogger, NmsLogger, RdLogger};
use zwave_logging::ImmutableLogger;

use crate::bridge::Bridge;
use crate::config::pool_sizes;
use crate::config::GatewayConfig;
use crate::dispatch::DispatchTable;
use crate::nms::NetworkManagement;
use crate::radio::{RadioBackend, RadioFacade};
use crate::resource_directory::ResourceDirectory;
use crate::security::SecurityEngine;
use crate::send_pipeline::SendPipeline;
use crate::send_request::SendRequestRegistry;

/// The four per-component loggers, all wrapping the same sink. Kept as one
/// bundle so `GatewayCtx::new` only takes one extra constructor argument.
pub struct GatewayLoggers {
    pub gateway: GatewayLogger,
    pub nms: NmsLogger,
    pub resource_directory: RdLogger,
    pub bridge: BridgeLogger,
}

impl GatewayLoggers {
    pub fn new(sink: Arc<dyn ImmutableLogger>) -> Self {
        Self {
            gateway: GatewayLogger::new(sink.clone()),
            nms: NmsLogger::new(sink.clone()),
            resource_directory: RdLogger::new(sink.clone()),
            bridge: BridgeLogger::new(sink),
        }
    }
}

/// Everything the control plane owns, gathered behind one handle. Every
/// component (A-H) is reachable as a field rather than through its own
/// global; callers that only need one component borrow that field
/// directly (e.g. `&ctx.resource_directory`) instead of the whole
/// context, matching the per-component sub-context note above.
pub struct GatewayCtx {
    pub config: GatewayConfig,
    pub own_node_id: NodeId,
    pub home_id: u32,
    pub radio: RadioFacade,
    pub security: SecurityEngine,
    pub send_pipeline: SendPipeline,
    pub send_requests: Arc<SendRequestRegistry>,
    pub resource_directory: ResourceDirectory,
    pub bridge: Bridge,
    pub nms: NetworkManagement,
    pub dispatch: DispatchTable,
    pub logs: GatewayLoggers,
}

impl GatewayCtx {
    /// Assembles the context from a config, the gateway's own identity on
    /// the mesh (as reported by `MemoryGetID`), and the
    /// radio backend to drive component A with.
    pub fn new(
        config: GatewayConfig,
        own_node_id: NodeId,
        home_id: u32,
        radio_backend: Arc<dyn RadioBackend>,
        log_sink: Arc<dyn ImmutableLogger>,
    ) -> Self {
        let gateway_has_s0 = !config.psk.is_empty();
        let security_manager = SecurityManager::new(SecurityManagerOptions {
            own_node_id,
            network_key: config.psk.clone(),
        });
        let logs = GatewayLoggers::new(log_sink);
        logs.gateway.info(format!(
            "gateway context initialized, own node id {own_node_id}, home id {home_id:08x}"
        ));

        Self {
            own_node_id,
            home_id,
            radio: RadioFacade::new(radio_backend),
            security: SecurityEngine::new(security_manager),
            send_pipeline: SendPipeline::new(),
            send_requests: SendRequestRegistry::with_capacity(pool_sizes::SEND_REQUEST_ENTRIES),
            resource_directory: ResourceDirectory::new(),
            bridge: Bridge::new(
                pool_sizes::MAX_CLASSIC_TEMP_ASSOCIATIONS,
                pool_sizes::MAX_IP_ASSOCIATIONS,
            ),
            nms: NetworkManagement::new(gateway_has_s0),
            dispatch: DispatchTable::new(),
            config,
            logs,
        }
    }

    /// Whether this gateway currently holds the S0 network key, i.e.
    /// whether a PSK was configured.
    pub fn gateway_has_s0(&self) -> bool {
        !self.config.psk.is_empty()
    }

    /// Drains every queue/session timer that has no dedicated async task
    /// of its own: discard timers on the send pipeline and expired S0 RX
    /// reassembly sessions. Every timer callback enqueues an event to the
    /// owning component rather than mutating its state directly — here
    /// the owning component is this tick itself. Callers
    /// drive this from their own event loop, e.g. once per second.
    pub fn run_periodic_maintenance(&mut self) {
        for callback in self.send_pipeline.expire_discards() {
            let _ = callback.send(crate::send_pipeline::SendStatus::Fail);
        }
        self.security.expire_rx_sessions();
    }

    /// Tears down every piece of per-node state when a node leaves the
    /// network: aborts its outstanding `SendRequest` waits (component D)
    /// and removes it from the resource directory (component E). The
    /// bridge's NAT/association entries for the node are left to the
    /// caller, since eviction there competes with firmware-update locks
    /// that this context has no opinion on.
    pub fn forget_node(&mut self, node_id: NodeId) {
        self.send_requests.abort_requests_for(node_id);
        self.resource_directory.remove_node(node_id);
        self.logs
            .resource_directory
            .info(format!("node {node_id} forgotten, outstanding requests aborted"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use futures::future::BoxFuture;
    use std::net::Ipv6Addr;
    use zwave_core::gateway_model::TxFlags;

    struct NullBackend;
    impl RadioBackend for NullBackend {
        fn submit(
            &self,
            _snode: NodeId,
            _dnode: NodeId,
            _frame: Bytes,
            _tx_flags: TxFlags,
        ) -> BoxFuture<'_, ()> {
            Box::pin(async move {})
        }

        fn abort(&self) -> BoxFuture<'_, ()> {
            Box::pin(async move {})
        }
    }

    struct NullLogger;
    impl ImmutableLogger for NullLogger {
        fn log(&self, _log: zwave_logging::LogInfo, _level: zwave_logging::Loglevel) {}
        fn log_level(&self) -> zwave_logging::Loglevel {
            zwave_logging::Loglevel::Error
        }
        fn set_log_level(&self, _level: zwave_logging::Loglevel) {}
    }

    fn test_config() -> GatewayConfig {
        GatewayConfig::builder()
            .pan_prefix(Ipv6Addr::UNSPECIFIED)
            .lan_addr(Ipv6Addr::UNSPECIFIED)
            .gw_addr(Ipv6Addr::UNSPECIFIED)
            .psk(vec![0u8; 16])
            .manufacturer_id(0)
            .product_type(0)
            .product_id(0)
            .build()
    }

    #[test]
    fn new_ctx_reflects_s0_capability_from_psk() {
        let ctx = GatewayCtx::new(
            test_config(),
            NodeId::new(1u8),
            0x1234_5678,
            Arc::new(NullBackend),
            Arc::new(NullLogger),
        );
        assert!(ctx.gateway_has_s0());
    }

    #[test]
    fn forget_node_clears_resource_directory_entry() {
        let mut ctx = GatewayCtx::new(
            test_config(),
            NodeId::new(1u8),
            0x1234_5678,
            Arc::new(NullBackend),
            Arc::new(NullLogger),
        );
        ctx.resource_directory.add_node(NodeId::new(9u8));
        assert!(ctx.resource_directory.get(NodeId::new(9u8)).is_some());
        ctx.forget_node(NodeId::new(9u8));
        assert!(ctx.resource_directory.get(NodeId::new(9u8)).is_none());
    }

    #[test]
    fn run_periodic_maintenance_is_callable_on_a_fresh_context() {
        let mut ctx = GatewayCtx::new(
            test_config(),
            NodeId::new(1u8),
            0x1234_5678,
            Arc::new(NullBackend),
            Arc::new(NullLogger),
        );
        ctx.run_periodic_maintenance();
    }
}
