//! Component C: the two-level send pipeline.
//!
//! `appl_queue` carries application-level submissions (endpoint/security
//! encapsulation still to be composed); `ll_queue` carries frames that are
//! ready for the radio. Both are fixed-capacity FIFOs; both have exactly
//! one "in-flight" slot, matching component A's single-in-flight radio
//! invariant one level up.
//!
//! Grounded in the mailbox + explicit-step idiom of
//! `packages/driver/src/driver/actor.rs`: rather than spawning a timer
//! task per entry, callers poll `expire_discards` from their own event
//! loop tick: every timer callback enqueues an event to the owning
//! component rather than mutating its state directly — here that owning
//! component's event loop is the caller's.

use bytes::Bytes;
use std::collections::{HashMap, VecDeque};
use std::time::{Duration, Instant};
use tokio::sync::oneshot;

use zwave_core::definitions::NodeId;
use zwave_core::gateway_model::TsParam;

use crate::error::{Error, Result};

pub const QUEUE_CAPACITY: usize = 8;
/// Fixed extra delay added to the reported transmit ticks when starting a
/// per-destination backoff window.
const BACKOFF_FIXED_MS: u64 = 250;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendStatus {
    Ok,
    NoAck,
    Fail,
    Error,
    RoutingNotIdle,
    RequeueQueued,
    Requeue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntryId(u64);

struct QueueEntry {
    id: EntryId,
    frame: Bytes,
    param: TsParam,
    discard_at: Option<Instant>,
    callback: oneshot::Sender<SendStatus>,
}

/// A handle returned to the application-level caller of
/// [`SendPipeline::send_data_appl`] or [`SendPipeline::send`]; use
/// [`SendPipeline::abort`] to cancel, or await `result` for the eventual
/// (exactly-once) callback.
pub struct SendHandle {
    pub id: EntryId,
    pub result: oneshot::Receiver<SendStatus>,
}

/// One job popped off a queue, ready for the caller to act on: compose
/// encapsulation and hand to the low-level queue (for `appl_queue` jobs),
/// or submit to the radio façade directly (for `ll_queue` jobs).
pub struct Job {
    pub id: EntryId,
    pub frame: Bytes,
    pub param: TsParam,
}

pub struct SendPipeline {
    appl_queue: VecDeque<QueueEntry>,
    ll_queue: VecDeque<QueueEntry>,
    appl_in_flight: Option<(EntryId, oneshot::Sender<SendStatus>)>,
    ll_in_flight: Option<(EntryId, oneshot::Sender<SendStatus>, NodeId)>,
    /// Destination node -> instant the backoff window ends.
    backoff: HashMap<NodeId, Instant>,
    next_id: u64,
}

impl Default for SendPipeline {
    fn default() -> Self {
        Self::new()
    }
}

impl SendPipeline {
    pub fn new() -> Self {
        Self {
            appl_queue: VecDeque::new(),
            ll_queue: VecDeque::new(),
            appl_in_flight: None,
            ll_in_flight: None,
            backoff: HashMap::new(),
            next_id: 0,
        }
    }

    fn alloc_id(&mut self) -> EntryId {
        let id = EntryId(self.next_id);
        self.next_id += 1;
        id
    }

    /// `send_data_appl`: enqueues an application-level submission.
    pub fn send_data_appl(
        &mut self,
        frame: Bytes,
        param: TsParam,
        discard_timeout: Option<Duration>,
    ) -> Result<SendHandle> {
        self.push(true, frame, param, discard_timeout)
    }

    /// `send`: enqueues a low-level (radio-ready) submission directly,
    /// bypassing encapsulation composition.
    pub fn send(
        &mut self,
        frame: Bytes,
        param: TsParam,
        discard_timeout: Option<Duration>,
    ) -> Result<SendHandle> {
        self.push(false, frame, param, discard_timeout)
    }

    fn push(
        &mut self,
        appl: bool,
        frame: Bytes,
        param: TsParam,
        discard_timeout: Option<Duration>,
    ) -> Result<SendHandle> {
        let q = if appl {
            &mut self.appl_queue
        } else {
            &mut self.ll_queue
        };
        if q.len() >= QUEUE_CAPACITY {
            return Err(Error::PoolExhausted("send pipeline queue full"));
        }
        let id = self.alloc_id();
        let (tx, rx) = oneshot::channel();
        q.push_back(QueueEntry {
            id,
            frame,
            param,
            discard_at: discard_timeout.map(|d| Instant::now() + d),
            callback: tx,
        });
        Ok(SendHandle { id, result: rx })
    }

    /// Called on a `SendNext` event: pops the head-most eligible entry of
    /// `appl_queue` if no application session is in flight and the
    /// destination isn't under backoff.
    pub fn next_appl_job(&mut self) -> Option<Job> {
        if self.appl_in_flight.is_some() {
            return None;
        }
        let entry = self.take_eligible(true)?;
        let job = Job {
            id: entry.id,
            frame: entry.frame,
            param: entry.param,
        };
        self.appl_in_flight = Some((entry.id, entry.callback));
        Some(job)
    }

    /// Called on a `SendNextLL` event: pops the head-most eligible entry
    /// of `ll_queue` iff no radio send is currently outstanding.
    pub fn next_ll_job(&mut self) -> Option<Job> {
        if self.ll_in_flight.is_some() {
            return None;
        }
        let entry = self.take_eligible(false)?;
        let job = Job {
            id: entry.id,
            frame: entry.frame,
            param: entry.param,
        };
        self.ll_in_flight = Some((entry.id, entry.callback, job.param.dnode));
        Some(job)
    }

    fn take_eligible(&mut self, appl: bool) -> Option<QueueEntry> {
        let now = Instant::now();
        let q = if appl {
            &mut self.appl_queue
        } else {
            &mut self.ll_queue
        };
        let idx = q
            .iter()
            .position(|e| !backed_off(&self.backoff, e.param.dnode, now))?;
        q.remove(idx)
    }

    /// Composition of the in-flight `appl_queue` job failed before it ever
    /// reached the radio. Frees the in-flight slot and delivers `status`
    /// to the original caller.
    pub fn appl_job_failed(&mut self, id: EntryId, status: SendStatus) {
        if self.appl_in_flight.as_ref().map(|(i, _)| *i) == Some(id) {
            let (_, callback) = self.appl_in_flight.take().unwrap();
            let _ = callback.send(status);
        }
    }

    /// Composition of the in-flight `appl_queue` job succeeded: frees the
    /// `appl_queue` in-flight slot and re-enqueues the composed frame onto
    /// `ll_queue`, carrying the *original* caller's callback forward so it
    /// still fires exactly once, from the low-level completion.
    pub fn appl_job_to_ll(
        &mut self,
        id: EntryId,
        frame: Bytes,
        param: TsParam,
        discard_timeout: Option<Duration>,
    ) -> Result<()> {
        if self.appl_in_flight.as_ref().map(|(i, _)| *i) != Some(id) {
            return Ok(());
        }
        let (_, callback) = self.appl_in_flight.take().unwrap();
        if self.ll_queue.len() >= QUEUE_CAPACITY {
            let _ = callback.send(SendStatus::Fail);
            return Err(Error::PoolExhausted("send pipeline queue full"));
        }
        self.ll_queue.push_back(QueueEntry {
            id,
            frame,
            param,
            discard_at: discard_timeout.map(|d| Instant::now() + d),
            callback,
        });
        Ok(())
    }

    /// The radio callback for the in-flight low-level job arrived.
    /// Starts/clears the backoff window, frees the in-flight slot,
    /// and returns the job's callback for the caller to deliver.
    pub fn on_ll_complete(
        &mut self,
        id: EntryId,
        status: SendStatus,
        transmit_ticks: Option<u16>,
        first_byte_is_get: bool,
    ) -> Option<oneshot::Sender<SendStatus>> {
        let (stored_id, callback, dnode) = self.ll_in_flight.take()?;
        if stored_id != id {
            self.ll_in_flight = Some((stored_id, callback, dnode));
            return None;
        }
        if status == SendStatus::Ok && first_byte_is_get {
            let ticks = transmit_ticks.unwrap_or(0) as u64;
            let backoff = Duration::from_millis(ticks * 10 + BACKOFF_FIXED_MS);
            self.backoff.insert(dnode, Instant::now() + backoff);
        }
        Some(callback)
    }

    /// Cancels the backoff window for `dnode`, e.g. on receiving the
    /// matching report.
    pub fn cancel_backoff(&mut self, dnode: NodeId) {
        self.backoff.remove(&dnode);
    }

    /// Drops any queue entry whose discard timer has elapsed, delivering
    /// `Fail`. Returns the callbacks to fire.
    pub fn expire_discards(&mut self) -> Vec<oneshot::Sender<SendStatus>> {
        let now = Instant::now();
        let mut fired = Vec::new();
        for q in [&mut self.appl_queue, &mut self.ll_queue] {
            let mut remaining = VecDeque::with_capacity(q.len());
            while let Some(entry) = q.pop_front() {
                if entry.discard_at.is_some_and(|at| now >= at) {
                    fired.push(entry.callback);
                } else {
                    remaining.push_back(entry);
                }
            }
            *q = remaining;
        }
        fired
    }

    /// Removes a queued (not yet in-flight) entry, delivering `Fail` and
    /// returning `true`; or, if the entry is the in-flight one, leaves it
    /// alone and returns `false` (the caller must invoke the radio
    /// façade's `abort()` and let the normal callback fire instead).
    pub fn abort(&mut self, id: EntryId) -> bool {
        for q in [&mut self.appl_queue, &mut self.ll_queue] {
            if let Some(idx) = q.iter().position(|e| e.id == id) {
                let entry = q.remove(idx).unwrap();
                let _ = entry.callback.send(SendStatus::Fail);
                return true;
            }
        }
        false
    }

    pub fn appl_queue_len(&self) -> usize {
        self.appl_queue.len()
    }

    pub fn ll_queue_len(&self) -> usize {
        self.ll_queue.len()
    }
}

fn backed_off(backoff: &HashMap<NodeId, Instant>, dnode: NodeId, now: Instant) -> bool {
    backoff.get(&dnode).is_some_and(|until| now < *until)
}

#[cfg(test)]
mod tests {
    use super::*;
    use zwave_core::gateway_model::{RxFlags, SchemeSelector, TxFlags};

    fn param(dnode: u8) -> TsParam {
        TsParam {
            snode: NodeId::new(1u8),
            dnode: NodeId::new(dnode),
            sendpoint: Default::default(),
            dendpoint: Default::default(),
            scheme: SchemeSelector::Auto,
            tx_flags: TxFlags::empty(),
            rx_flags: RxFlags::empty(),
            is_mcast_with_followup: false,
            force_verify_delivery: false,
            is_multicommand: false,
            discard_timeout: None,
        }
    }

    #[test]
    fn backoff_blocks_same_destination_but_not_others() {
        let mut pipeline = SendPipeline::new();
        let handle9 = pipeline
            .send(Bytes::from_static(&[0x20, 0x02]), param(9), None)
            .unwrap();
        let job = pipeline.next_ll_job().unwrap();
        assert_eq!(job.id, handle9.id);

        let cb = pipeline.on_ll_complete(job.id, SendStatus::Ok, Some(200), true);
        cb.unwrap().send(SendStatus::Ok).ok();
        // backoff window ~2250ms now active for node 9.

        let _handle9b = pipeline
            .send(Bytes::from_static(&[0x20, 0x02]), param(9), None)
            .unwrap();
        assert!(pipeline.next_ll_job().is_none(), "node 9 should be backed off");

        let handle10 = pipeline
            .send(Bytes::from_static(&[0x20, 0x02]), param(10), None)
            .unwrap();
        let job = pipeline.next_ll_job().unwrap();
        assert_eq!(job.id, handle10.id);
    }

    #[test]
    fn cancel_backoff_unblocks_queue() {
        let mut pipeline = SendPipeline::new();
        let _first = pipeline
            .send(Bytes::from_static(&[0x20, 0x02]), param(9), None)
            .unwrap();
        let job = pipeline.next_ll_job().unwrap();
        pipeline
            .on_ll_complete(job.id, SendStatus::Ok, Some(200), true)
            .unwrap()
            .send(SendStatus::Ok)
            .ok();

        let queued = pipeline
            .send(Bytes::from_static(&[0x20, 0x03]), param(9), None)
            .unwrap();
        assert!(pipeline.next_ll_job().is_none());

        pipeline.cancel_backoff(NodeId::new(9u8));
        let job = pipeline.next_ll_job().unwrap();
        assert_eq!(job.id, queued.id);
    }

    #[test]
    fn queue_capacity_is_enforced() {
        let mut pipeline = SendPipeline::new();
        for i in 0..QUEUE_CAPACITY {
            pipeline
                .send(Bytes::from_static(&[0x00]), param(i as u8 + 2), None)
                .unwrap();
        }
        let result = pipeline.send(Bytes::from_static(&[0x00]), param(200), None);
        assert!(matches!(result, Err(Error::PoolExhausted(_))));
    }

    #[test]
    fn discard_timeout_fails_queued_entry() {
        let mut pipeline = SendPipeline::new();
        let mut handle = pipeline
            .send(
                Bytes::from_static(&[0x00]),
                param(9),
                Some(Duration::from_millis(0)),
            )
            .unwrap();
        std::thread::sleep(Duration::from_millis(5));
        let fired = pipeline.expire_discards();
        assert_eq!(fired.len(), 1);
        fired.into_iter().next().unwrap().send(SendStatus::Fail).ok();
        assert_eq!(handle.result.try_recv().unwrap(), SendStatus::Fail);
    }

    #[test]
    fn abort_queued_entry_delivers_fail_exactly_once() {
        let mut pipeline = SendPipeline::new();
        // Fill the in-flight slot so the next entry stays queued.
        let _first = pipeline.send(Bytes::from_static(&[0x00]), param(9), None).unwrap();
        pipeline.next_ll_job().unwrap();

        let mut handle = pipeline.send(Bytes::from_static(&[0x01]), param(10), None).unwrap();
        let removed = pipeline.abort(handle.id);
        assert!(removed);
        let status = handle.result.try_recv().unwrap();
        assert_eq!(status, SendStatus::Fail);
    }
}
