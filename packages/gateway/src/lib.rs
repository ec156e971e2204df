//! `zwave-gateway`: the control-plane components that sit between a
//! Z-Wave radio and its IP-side clients — Security Scheme 0 transport,
//! the two-level send pipeline, the request/reply matcher, resource
//! directory (node database + probe engine), bridge/virtual-node layer,
//! and the network management state machine.
//!
//! Grounded throughout in `packages/driver`'s actor/mailbox idiom and
//! `packages/core`'s security and gateway data-model modules; see
//! `DESIGN.md` at the workspace root for the full grounding ledger.

pub mod bridge;
pub mod config;
pub mod ctx;
pub mod dispatch;
pub mod error;
pub mod nms;
pub mod radio;
pub mod resource_directory;
pub mod security;
pub mod send_pipeline;
pub mod send_request;
pub mod zip;
