//! Component D: the `SendRequest` matcher — a fixed-size pool of
//! outstanding request/reply waits layered on top of the send pipeline.
//!
//! Grounded on `packages/driver/src/driver/awaited.rs`'s
//! `AwaitedRegistry`/`AwaitedRef` pattern: a predicate-matching registry
//! whose entries race a timeout against a oneshot reply, auto-removing
//! themselves on drop. Unlike that registry (unbounded `Vec`), this pool
//! is fixed at `SEND_REQUEST_ENTRIES` concurrent outstanding requests
//! (config::pool_sizes) and exposes `abort_requests_for` to
//! fail every pending entry for a node (e.g. on node removal).

use bytes::Bytes;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::oneshot;

use zwave_core::definitions::NodeId;
use zwave_core::util::MaybeSleep;

use crate::config::pool_sizes::SEND_REQUEST_ENTRIES;
use crate::error::{Error, Result};

/// A reply frame together with the command class/command it carries,
/// as surfaced by whatever decodes inbound application frames.
#[derive(Debug, Clone)]
pub struct ReplyFrame {
    pub snode: NodeId,
    pub cc: u16,
    pub cmd: u8,
    pub payload: Bytes,
}

type Predicate = Box<dyn Fn(&ReplyFrame) -> bool + Send + Sync>;

struct Entry {
    id: u64,
    node: NodeId,
    predicate: Predicate,
    channel: oneshot::Sender<ReplyFrame>,
}

/// A pending request; resolves to the matching reply or times out.
pub struct PendingRequest {
    id: u64,
    registry: Arc<SendRequestRegistry>,
    timeout: Duration,
    channel: Option<oneshot::Receiver<ReplyFrame>>,
}

impl PendingRequest {
    /// Awaits the matching reply, racing it against the configured
    /// timeout. Removes its own entry from the registry on drop,
    /// regardless of which branch resolves first.
    pub async fn wait(mut self) -> Result<ReplyFrame> {
        let sleep = MaybeSleep::new(Some(self.timeout));
        let receiver = self.channel.take().expect("wait may only be called once");
        tokio::select! {
            result = receiver => result.map_err(|_| Error::Internal("send request channel closed".into())),
            _ = sleep => Err(Error::Timeout),
        }
    }
}

impl Drop for PendingRequest {
    fn drop(&mut self) {
        self.registry.remove(self.id);
    }
}

/// The fixed pool of outstanding request/reply waits. One instance per
/// gateway, shared via `Arc` with whatever dispatches inbound frames.
pub struct SendRequestRegistry {
    capacity: usize,
    next_id: Mutex<u64>,
    entries: Mutex<Vec<Entry>>,
}

impl SendRequestRegistry {
    pub fn new() -> Arc<Self> {
        Self::with_capacity(SEND_REQUEST_ENTRIES)
    }

    pub fn with_capacity(capacity: usize) -> Arc<Self> {
        Arc::new(Self {
            capacity,
            next_id: Mutex::new(0),
            entries: Mutex::new(Vec::new()),
        })
    }

    /// Registers a wait for a reply matching `predicate` from `node`,
    /// returning a [`PendingRequest`] to await. Fails with
    /// [`Error::PoolExhausted`] if all `SEND_REQUEST_ENTRIES` slots are
    /// in use.
    pub fn register(
        self: &Arc<Self>,
        node: NodeId,
        timeout: Duration,
        predicate: Predicate,
    ) -> Result<PendingRequest> {
        let mut entries = self.entries.lock().expect("send request registry poisoned");
        if entries.len() >= self.capacity {
            return Err(Error::PoolExhausted("send request pool exhausted"));
        }
        let id = {
            let mut next_id = self.next_id.lock().expect("send request id counter poisoned");
            let id = *next_id;
            *next_id += 1;
            id
        };
        let (tx, rx) = oneshot::channel();
        entries.push(Entry {
            id,
            node,
            predicate,
            channel: tx,
        });
        Ok(PendingRequest {
            id,
            registry: self.clone(),
            timeout,
            channel: Some(rx),
        })
    }

    /// Convenience wrapper matching the spec's named shape: wait for a
    /// specific `(cc, cmd)` pair from `node`.
    pub fn send_request(
        self: &Arc<Self>,
        node: NodeId,
        expected_cc: u16,
        expected_cmd: u8,
        timeout_ms: u64,
    ) -> Result<PendingRequest> {
        self.register(
            node,
            Duration::from_millis(timeout_ms),
            Box::new(move |frame| frame.cc == expected_cc && frame.cmd == expected_cmd),
        )
    }

    /// Offers an inbound frame to every registered entry from the same
    /// node; the first whose predicate matches consumes it and is
    /// removed. Entries that don't match, or belong to a different node,
    /// are left untouched. Returns `true` if some entry consumed the
    /// frame.
    pub fn offer(&self, frame: ReplyFrame) -> bool {
        let mut entries = self.entries.lock().expect("send request registry poisoned");
        let index = entries
            .iter()
            .position(|e| e.node == frame.snode && (e.predicate)(&frame));
        match index {
            Some(i) => {
                let entry = entries.remove(i);
                let _ = entry.channel.send(frame);
                true
            }
            None => false,
        }
    }

    /// Fails every pending request directed at `node` by dropping its
    /// channel (the waiter observes this as `Error::Internal`), e.g. on
    /// node removal.
    pub fn abort_requests_for(&self, node: NodeId) {
        let mut entries = self.entries.lock().expect("send request registry poisoned");
        entries.retain(|e| e.node != node);
    }

    fn remove(&self, id: u64) {
        let mut entries = self.entries.lock().expect("send request registry poisoned");
        entries.retain(|e| e.id != id);
    }

    pub fn len(&self) -> usize {
        self.entries.lock().expect("send request registry poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(snode: u8, cc: u16, cmd: u8) -> ReplyFrame {
        ReplyFrame {
            snode: NodeId::new(snode),
            cc,
            cmd,
            payload: Bytes::new(),
        }
    }

    #[tokio::test]
    async fn matching_reply_resolves_the_wait() {
        let registry = SendRequestRegistry::new();
        let pending = registry
            .send_request(NodeId::new(5u8), 0x20, 0x03, 1000)
            .unwrap();

        assert!(registry.offer(frame(5, 0x20, 0x03)));

        let reply = pending.wait().await.unwrap();
        assert_eq!(reply.snode, NodeId::new(5u8));
    }

    #[tokio::test]
    async fn non_matching_frame_is_left_for_other_entries() {
        let registry = SendRequestRegistry::new();
        let pending = registry
            .send_request(NodeId::new(5u8), 0x20, 0x03, 1000)
            .unwrap();

        assert!(!registry.offer(frame(5, 0x25, 0x01)));
        assert!(!registry.offer(frame(6, 0x20, 0x03)));
        assert_eq!(registry.len(), 1);

        assert!(registry.offer(frame(5, 0x20, 0x03)));
        let reply = pending.wait().await.unwrap();
        assert_eq!(reply.cmd, 0x03);
    }

    #[tokio::test]
    async fn timeout_fires_when_no_reply_arrives() {
        let registry = SendRequestRegistry::new();
        let pending = registry
            .send_request(NodeId::new(5u8), 0x20, 0x03, 10)
            .unwrap();
        let result = pending.wait().await;
        assert!(matches!(result, Err(Error::Timeout)));
    }

    #[tokio::test]
    async fn pool_exhaustion_is_rejected() {
        let registry = SendRequestRegistry::new();
        let mut pending = Vec::new();
        for _ in 0..SEND_REQUEST_ENTRIES {
            pending.push(
                registry
                    .send_request(NodeId::new(5u8), 0x20, 0x03, 1000)
                    .unwrap(),
            );
        }
        let result = registry.send_request(NodeId::new(5u8), 0x20, 0x03, 1000);
        assert!(matches!(result, Err(Error::PoolExhausted(_))));
    }

    #[tokio::test]
    async fn abort_requests_for_node_drops_its_waits() {
        let registry = SendRequestRegistry::new();
        let pending = registry
            .send_request(NodeId::new(5u8), 0x20, 0x03, 1000)
            .unwrap();
        registry.abort_requests_for(NodeId::new(5u8));
        let result = pending.wait().await;
        assert!(matches!(result, Err(Error::Internal(_))));
    }

    #[tokio::test]
    async fn dropping_pending_request_frees_its_slot() {
        let registry = SendRequestRegistry::new();
        {
            let _pending = registry
                .send_request(NodeId::new(5u8), 0x20, 0x03, 1000)
                .unwrap();
            assert_eq!(registry.len(), 1);
        }
        assert_eq!(registry.len(), 0);
    }
}
