//! Component B: Security Scheme 0 (S0) transport engine.
//!
//! Owns the nonce-driven TX/RX session pools for encrypted unicast,
//! layered on top of `zwave_core::security::SecurityManager` (the nonce
//! table + key derivation, already grounded on
//! `packages/core/src/security/manager.rs`) and the same AES-128-OFB /
//! CBC-MAC primitives `zwave-cc`'s security command class uses
//! (`packages/cc/src/commandclass/security.rs`).
//!
//! This module operates on raw `(class, cmd, payload)` frames rather than
//! the `zwave-cc` `CC` enum: the gateway's send pipeline (component C) and
//! S0 engine only need to encrypt/authenticate/fragment opaque payloads,
//! never to interpret them, and the session bookkeeping (fragment
//! reassembly across two physically distinct radio frames) has no home in
//! `zwave-cc`'s per-CC parsing/serialization traits.

use bytes::Bytes;
use std::time::{Duration, Instant};

use zwave_core::definitions::NodeId;
use zwave_core::security::{
    compute_mac, decrypt_aes_ofb, encrypt_aes_ofb, MAC_SIZE, S0Nonce, SecurityManager,
    S0_HALF_NONCE_SIZE,
};

use crate::error::{Error, Result, SecurityFailReason};

pub const CC_SECURITY: u8 = 0x98;
pub const SECURITY_NONCE_GET: u8 = 0x40;
pub const SECURITY_NONCE_REPORT: u8 = 0x80;
pub const SECURITY_MESSAGE_ENCAPSULATION: u8 = 0x81;
pub const SECURITY_MESSAGE_ENCAPSULATION_NONCE_GET: u8 = 0xc1;

/// Flags byte bit layout.
mod flags {
    pub const SEQUENCED: u8 = 0b1000_0000;
    pub const SECOND_FRAME: u8 = 0b0100_0000;
    pub const SEQ_MASK: u8 = 0b0000_1111;
}

/// Default timeouts for the nonce-report wait.
pub const NONCE_REPORT_TIMEOUT: Duration = Duration::from_secs(2);
pub const NONCE_REPORT_TIMEOUT_LEARN_MODE: Duration = Duration::from_secs(10);
pub const FRAGMENT_TIMEOUT: Duration = Duration::from_millis(1500);

pub const TX_SESSION_POOL_SIZE: usize = 4;
pub const RX_SESSION_POOL_SIZE: usize = 4;
/// Largest plaintext (single segment) carried in one radio frame, for a
/// controller whose `max_frame` is the common 46-byte payload budget.
pub const DEFAULT_MAX_SINGLE_SEGMENT: usize = 46 - 20;
/// Largest reassembled plaintext the RX session buffer accepts
/// (mirrors the RX session's `msg_buf[<=128]` bound).
pub const RX_MSG_BUF_MAX: usize = 128;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxOutcome {
    Done,
    Fail(SecurityFailReason),
}

/// State of a single outbound S0 session. One session exists per
/// `(snode, dnode)` pair at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TxState {
    NonceGet,
    NonceGetSent,
    EncMsg,
    EncMsgSent,
    EncMsg2,
    EncMsg2Sent,
    Done,
    Fail,
}

/// What the caller of [`SecurityEngine::tx_step`] must do in response to a
/// state transition: send a frame, arm a timer, or deliver the final
/// result to the waiting application callback.
#[derive(Debug, Clone)]
pub enum TxAction {
    /// Send `frame` (unencrypted `SECURITY_NONCE_GET`), then call
    /// [`SecurityEngine::on_radio_tx_complete`] when the radio callback
    /// fires.
    SendFrame { frame: Bytes },
    /// Wait up to `timeout` for the next driving event (nonce report,
    /// radio callback) before calling [`SecurityEngine::tx_timeout`].
    ArmTimer { timeout: Duration },
    /// The session has reached a terminal state; deliver this outcome to
    /// the application callback and free the session slot.
    Deliver(TxOutcome),
}

struct TxSession {
    snode: NodeId,
    dnode: NodeId,
    state: TxState,
    /// Remaining plaintext segments still to send, in order.
    segments: Vec<Bytes>,
    learn_mode: bool,
}

/// Buffers a fragment pending its other half, or `None` while idle.
/// One reassembly slot for an in-progress S0 RX session:
/// `{snode, dnode, state, seq_nr, msg_buf, msg_len, expiry}`.
struct RxSession {
    snode: NodeId,
    dnode: NodeId,
    seq_nr: u8,
    buf: Bytes,
    expiry: Instant,
}

/// Result of decrypting+validating one inbound S0 frame.
pub enum RxOutcome {
    /// A complete plaintext CC frame is ready for dispatch.
    Delivered(Bytes),
    /// This was the first of two fragments; buffered, nothing to deliver
    /// yet. The caller should reply with a fresh `SECURITY_NONCE_REPORT`
    /// if the inbound outer command was `..._NONCE_GET` and the nonce
    /// budget allows it.
    Buffered { needs_nonce_report: bool },
    /// Structurally invalid or replayed; dropped silently rather than
    /// surfaced as a `ProtocolViolation`.
    Dropped,
}

/// Component B proper: owns the nonce table (via [`SecurityManager`]) and
/// the fixed TX/RX session pools.
pub struct SecurityEngine {
    manager: SecurityManager,
    tx_sessions: [Option<TxSession>; TX_SESSION_POOL_SIZE],
    rx_sessions: [Option<RxSession>; RX_SESSION_POOL_SIZE],
    max_single_segment: usize,
}

impl SecurityEngine {
    pub fn new(manager: SecurityManager) -> Self {
        Self {
            manager,
            tx_sessions: Default::default(),
            rx_sessions: Default::default(),
            max_single_segment: DEFAULT_MAX_SINGLE_SEGMENT,
        }
    }

    pub fn manager(&self) -> &SecurityManager {
        &self.manager
    }

    pub fn manager_mut(&mut self) -> &mut SecurityManager {
        &mut self.manager
    }

    /// Begins sending `plaintext` to `dnode` under S0. Returns the handle
    /// to drive via [`Self::tx_step`] plus the
    /// first action to take (always `SendFrame` with a `SECURITY_NONCE_GET`).
    pub fn begin_tx(
        &mut self,
        dnode: NodeId,
        plaintext: Bytes,
        learn_mode: bool,
    ) -> Result<(usize, TxAction)> {
        if self.tx_sessions.iter().flatten().any(|s| s.dnode == dnode) {
            // at most one TX session per (snode, dnode) at a time.
            return Err(Error::Busy);
        }
        let slot = self
            .tx_sessions
            .iter()
            .position(|s| s.is_none())
            .ok_or(Error::PoolExhausted("S0 TX session pool exhausted"))?;

        let segments = split_segments(&plaintext, self.max_single_segment);
        let own = self.manager.own_node_id();
        self.tx_sessions[slot] = Some(TxSession {
            snode: own,
            dnode,
            state: TxState::NonceGet,
            segments,
            learn_mode,
        });

        let frame = build_nonce_get_frame();
        self.tx_sessions[slot].as_mut().unwrap().state = TxState::NonceGetSent;
        Ok((slot, TxAction::SendFrame { frame }))
    }

    /// Drives the session forward on receipt of a `SECURITY_NONCE_REPORT`
    /// for `(snode, dnode)`. Registers+blacklists the nonce, then composes
    /// and returns the next frame to send.
    pub fn on_nonce_report(&mut self, slot: usize, nonce: S0Nonce) -> Result<TxAction> {
        let session = self
            .tx_sessions
            .get_mut(slot)
            .and_then(|s| s.as_mut())
            .ok_or(Error::Internal("unknown S0 TX session".into()))?;
        if session.state != TxState::NonceGetSent && session.state != TxState::EncMsg2 {
            return Err(Error::Internal("nonce report in unexpected TX state".into()));
        }
        self.manager
            .blacklist_nonce(session.snode, nonce.id());

        let session = self.tx_sessions[slot].as_mut().unwrap();
        let is_first = matches!(session.state, TxState::NonceGetSent);
        let remaining = session.segments.len();

        let (frame, next_state) = if remaining <= 1 {
            let plaintext = session.segments.first().cloned().unwrap_or_default();
            // A lone segment (single-frame message) carries flags=0x00; the
            // closing segment of a two-segment message must still carry
            // `sequenced | second_frame` with the same seq nibble the first
            // segment used, or the receiver can't tell it apart from an
            // unrelated single-segment message and never reassembles them.
            let frame = if is_first {
                build_encapsulation_frame(&self.manager, session.dnode, &nonce, 0, false, false, &plaintext)
            } else {
                build_encapsulation_frame(&self.manager, session.dnode, &nonce, 1, true, true, &plaintext)
            };
            (frame, if is_first { TxState::EncMsg } else { TxState::EncMsg2 })
        } else {
            let first = session.segments[0].clone();
            let seq = 1u8;
            let frame = build_encapsulation_frame(
                &self.manager,
                session.dnode,
                &nonce,
                seq,
                true,
                false,
                &first,
            );
            (frame, TxState::EncMsg)
        };
        session.state = match next_state {
            TxState::EncMsg => TxState::EncMsgSent,
            TxState::EncMsg2 => TxState::EncMsg2Sent,
            other => other,
        };
        Ok(TxAction::SendFrame { frame })
    }

    /// Drives the session forward on the radio callback for the
    /// most-recently-sent frame.
    pub fn on_radio_tx_complete(&mut self, slot: usize, ok: bool) -> Result<TxAction> {
        let session = self
            .tx_sessions
            .get_mut(slot)
            .and_then(|s| s.as_mut())
            .ok_or(Error::Internal("unknown S0 TX session".into()))?;
        if !ok {
            self.tx_sessions[slot] = None;
            return Ok(TxAction::Deliver(TxOutcome::Fail(
                SecurityFailReason::BootstrapTimeout,
            )));
        }
        let timeout = if session.learn_mode {
            NONCE_REPORT_TIMEOUT_LEARN_MODE
        } else {
            NONCE_REPORT_TIMEOUT
        };
        match session.state {
            TxState::NonceGetSent => Ok(TxAction::ArmTimer { timeout }),
            TxState::EncMsgSent => {
                if session.segments.len() > 1 {
                    session.segments.remove(0);
                    session.state = TxState::EncMsg2;
                    Ok(TxAction::ArmTimer {
                        timeout: FRAGMENT_TIMEOUT,
                    })
                } else {
                    self.tx_sessions[slot] = None;
                    Ok(TxAction::Deliver(TxOutcome::Done))
                }
            }
            TxState::EncMsg2Sent => {
                self.tx_sessions[slot] = None;
                Ok(TxAction::Deliver(TxOutcome::Done))
            }
            _ => Err(Error::Internal("radio callback in unexpected TX state".into())),
        }
    }

    /// The session's timer expired without the expected driving event.
    pub fn tx_timeout(&mut self, slot: usize) -> TxAction {
        self.tx_sessions[slot] = None;
        TxAction::Deliver(TxOutcome::Fail(SecurityFailReason::BootstrapTimeout))
    }

    pub fn abort_tx(&mut self, slot: usize) {
        self.tx_sessions[slot] = None;
    }

    /// RX flow. `cmd` distinguishes
    /// `SECURITY_MESSAGE_ENCAPSULATION` from the `_NONCE_GET` variant.
    #[allow(clippy::too_many_arguments)]
    pub fn handle_inbound(
        &mut self,
        snode: NodeId,
        dnode: NodeId,
        cmd: u8,
        sender_iv: &[u8],
        ciphertext: &[u8],
        receiver_iv_byte0: u8,
        mac: &[u8],
    ) -> Result<RxOutcome> {
        if self.manager.is_nonce_blacklisted(snode, receiver_iv_byte0) {
            return Ok(RxOutcome::Dropped);
        }
        let Some(receiver_nonce) = self.manager.try_get_own_nonce(receiver_iv_byte0) else {
            return Err(Error::SecurityFail(SecurityFailReason::NonceUnknown));
        };

        // `cmd` is whichever of the two encapsulation commands the sender
        // actually used as the MAC's header byte (`build_encapsulation_frame`
        // uses `_NONCE_GET` for an unsent-second-fragment first segment).
        let auth_data = build_auth_data(cmd, snode, dnode, ciphertext);
        let expected_mac = compute_mac(&auth_data, self.manager.auth_key());
        if expected_mac != mac {
            return Err(Error::SecurityFail(SecurityFailReason::MacMismatch));
        }

        let iv = [sender_iv, receiver_nonce.get()].concat();
        let plaintext = decrypt_aes_ofb(ciphertext, self.manager.enc_key(), &iv);
        if plaintext.is_empty() {
            return Ok(RxOutcome::Dropped);
        }
        self.manager.blacklist_nonce(snode, receiver_iv_byte0);

        let flags_byte = plaintext[0];
        let payload = Bytes::copy_from_slice(&plaintext[1..]);
        let sequenced = flags_byte & flags::SEQUENCED != 0;
        let second_frame = flags_byte & flags::SECOND_FRAME != 0;
        let seq_nr = flags_byte & flags::SEQ_MASK;

        if !sequenced {
            return Ok(RxOutcome::Delivered(payload));
        }

        if !second_frame {
            // First fragment: buffer it.
            let slot = self
                .rx_sessions
                .iter()
                .position(|s| s.is_none())
                .ok_or(Error::PoolExhausted("S0 RX session pool exhausted"))
                .or_else(|_| self.reclaim_expired_rx())?;
            self.rx_sessions[slot] = Some(RxSession {
                snode,
                dnode,
                seq_nr,
                buf: payload,
                expiry: Instant::now() + FRAGMENT_TIMEOUT,
            });
            let needs_nonce_report = cmd == SECURITY_MESSAGE_ENCAPSULATION_NONCE_GET
                && self.manager.can_issue_nonce(self.manager.own_node_id());
            return Ok(RxOutcome::Buffered { needs_nonce_report });
        }

        // Second fragment: must match a buffered session by (snode,dnode,seq_nr).
        let slot = self.rx_sessions.iter().position(|s| {
            s.as_ref()
                .is_some_and(|s| s.snode == snode && s.dnode == dnode && s.seq_nr == seq_nr)
        });
        let Some(slot) = slot else {
            return Ok(RxOutcome::Dropped);
        };
        let first = self.rx_sessions[slot].take().unwrap();
        let mut full = Vec::with_capacity(first.buf.len() + payload.len());
        full.extend_from_slice(&first.buf);
        full.extend_from_slice(&payload);
        if full.len() > RX_MSG_BUF_MAX {
            return Ok(RxOutcome::Dropped);
        }
        Ok(RxOutcome::Delivered(Bytes::from(full)))
    }

    fn reclaim_expired_rx(&mut self) -> Result<usize> {
        let now = Instant::now();
        let slot = self
            .rx_sessions
            .iter()
            .position(|s| s.as_ref().is_some_and(|s| now >= s.expiry));
        match slot {
            Some(slot) => {
                self.rx_sessions[slot] = None;
                Ok(slot)
            }
            None => Err(Error::PoolExhausted("S0 RX session pool exhausted")),
        }
    }

    /// Sweeps RX sessions whose fragment-reassembly window has elapsed.
    pub fn expire_rx_sessions(&mut self) {
        let now = Instant::now();
        for slot in self.rx_sessions.iter_mut() {
            if slot.as_ref().is_some_and(|s| now >= s.expiry) {
                *slot = None;
            }
        }
    }
}

/// Splits `plaintext` into one or two wire segments, step
/// 3: everything fits in one frame if it's within budget, otherwise it's
/// split into exactly two.
fn split_segments(plaintext: &Bytes, max_single_segment: usize) -> Vec<Bytes> {
    if plaintext.len() <= max_single_segment {
        vec![plaintext.clone()]
    } else {
        let mid = max_single_segment;
        vec![
            plaintext.slice(0..mid),
            plaintext.slice(mid..plaintext.len()),
        ]
    }
}

fn build_nonce_get_frame() -> Bytes {
    Bytes::from_static(&[CC_SECURITY, SECURITY_NONCE_GET])
}

/// MAC input : `security_header_byte || src || dst || (N+1) || (flags||plaintext)`.
/// Here `ciphertext` already *is* `flags||plaintext` encrypted, and OFB is
/// length-preserving, so `ciphertext.len() == N+1` (the length of
/// `flags||plaintext`) and the length field is just `ciphertext.len()`,
/// matching `zwave-cc`'s `S0AuthData` layout.
fn build_auth_data(security_header_byte: u8, snode: NodeId, dnode: NodeId, ciphertext: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(4 + ciphertext.len());
    out.push(security_header_byte);
    out.push(u16::from(snode) as u8);
    out.push(u16::from(dnode) as u8);
    out.push(ciphertext.len() as u8);
    out.extend_from_slice(ciphertext);
    out
}

/// Builds one `SECURITY_MESSAGE_ENCAPSULATION[_NONCE_GET]` wire frame,
/// bit-exact down to the flags byte and MAC placement.
fn build_encapsulation_frame(
    manager: &SecurityManager,
    dnode: NodeId,
    receiver_nonce: &S0Nonce,
    seq_nr: u8,
    sequenced: bool,
    second_frame: bool,
    plaintext: &[u8],
) -> Bytes {
    let sender_nonce = S0Nonce::random();
    let mut flags_and_plaintext = Vec::with_capacity(1 + plaintext.len());
    let mut flags_byte = 0u8;
    if sequenced {
        flags_byte |= flags::SEQUENCED;
    }
    if second_frame {
        flags_byte |= flags::SECOND_FRAME;
    }
    flags_byte |= seq_nr & flags::SEQ_MASK;
    flags_and_plaintext.push(flags_byte);
    flags_and_plaintext.extend_from_slice(plaintext);

    let iv = [sender_nonce.get().as_ref(), receiver_nonce.get().as_ref()].concat();
    let ciphertext = encrypt_aes_ofb(&flags_and_plaintext, manager.enc_key(), &iv);

    let auth_data = build_auth_data(
        if sequenced && !second_frame {
            SECURITY_MESSAGE_ENCAPSULATION_NONCE_GET
        } else {
            SECURITY_MESSAGE_ENCAPSULATION
        },
        manager.own_node_id(),
        dnode,
        &ciphertext,
    );
    let mac = compute_mac(&auth_data, manager.auth_key());

    let cmd = if sequenced && !second_frame {
        SECURITY_MESSAGE_ENCAPSULATION_NONCE_GET
    } else {
        SECURITY_MESSAGE_ENCAPSULATION
    };

    let mut out = Vec::with_capacity(2 + S0_HALF_NONCE_SIZE + ciphertext.len() + 1 + MAC_SIZE);
    out.push(CC_SECURITY);
    out.push(cmd);
    out.extend_from_slice(sender_nonce.get());
    out.extend_from_slice(&ciphertext);
    out.push(receiver_nonce.id());
    out.extend_from_slice(&mac);
    Bytes::from(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use zwave_core::security::SecurityManagerOptions;

    fn engine(own: u8) -> SecurityEngine {
        SecurityEngine::new(SecurityManager::new(SecurityManagerOptions {
            own_node_id: NodeId::new(own),
            network_key: vec![0x42; 16],
        }))
    }

    #[test]
    fn single_segment_happy_path_s1() {
        // Scenario S1: gateway (1) -> node 5, short payload, single segment.
        let mut tx = engine(1u8);
        // `rx` must share the network key with `tx`.
        let mut rx = SecurityEngine::new(SecurityManager::new(SecurityManagerOptions {
            own_node_id: NodeId::new(5u8),
            network_key: vec![0x42; 16],
        }));

        let dnode = NodeId::new(5u8);
        let plaintext = Bytes::from_static(&[0x20, 0x02]); // CC_BASIC, BASIC_GET

        let (slot, action) = tx.begin_tx(dnode, plaintext.clone(), false).unwrap();
        assert!(matches!(action, TxAction::SendFrame { .. }));

        // Node replies with a NONCE_REPORT; register the nonce for rx's own perspective.
        let nonce = rx.manager_mut().generate_nonce(NodeId::new(1u8));
        let action = tx.on_nonce_report(slot, nonce.clone()).unwrap();
        let TxAction::SendFrame { frame } = action else {
            panic!("expected SendFrame");
        };
        assert_eq!(frame[0], CC_SECURITY);
        assert_eq!(frame[1], SECURITY_MESSAGE_ENCAPSULATION);

        let sender_iv = &frame[2..2 + S0_HALF_NONCE_SIZE];
        let ciphertext_len = frame.len() - 2 - S0_HALF_NONCE_SIZE - 1 - MAC_SIZE;
        let ciphertext = &frame[2 + S0_HALF_NONCE_SIZE..2 + S0_HALF_NONCE_SIZE + ciphertext_len];
        let receiver_iv_byte0 = frame[2 + S0_HALF_NONCE_SIZE + ciphertext_len];
        let mac = &frame[frame.len() - MAC_SIZE..];

        let outcome = rx
            .handle_inbound(
                NodeId::new(1u8),
                NodeId::new(5u8),
                SECURITY_MESSAGE_ENCAPSULATION,
                sender_iv,
                ciphertext,
                receiver_iv_byte0,
                mac,
            )
            .unwrap();
        let RxOutcome::Delivered(received) = outcome else {
            panic!("expected a delivered plaintext, got {:?}", match outcome {
                RxOutcome::Dropped => "Dropped",
                RxOutcome::Buffered { .. } => "Buffered",
                _ => unreachable!(),
            });
        };
        assert_eq!(received, plaintext);

        let action = tx.on_radio_tx_complete(slot, true).unwrap();
        assert!(matches!(action, TxAction::Deliver(TxOutcome::Done)));
    }

    #[test]
    fn two_segment_fragmentation_s4() {
        // Scenario S4: 40-byte plaintext, max_frame = 46 => segments of 26 + 14.
        let mut tx = SecurityEngine::new(SecurityManager::new(SecurityManagerOptions {
            own_node_id: NodeId::new(1u8),
            network_key: vec![0x11; 16],
        }));
        tx.max_single_segment = 46 - 20;

        let plaintext = Bytes::from(vec![0xAB; 40]);
        let (slot, _first_action) = tx.begin_tx(NodeId::new(7u8), plaintext, false).unwrap();

        let nonce1 = S0Nonce::random();
        let action = tx.on_nonce_report(slot, nonce1.clone()).unwrap();
        let TxAction::SendFrame { frame: first } = action else {
            panic!()
        };
        assert_eq!(first[1], SECURITY_MESSAGE_ENCAPSULATION_NONCE_GET);
        assert_eq!(
            decrypt_flags_byte(&tx, &nonce1, &first),
            flags::SEQUENCED | 1,
            "first segment must carry sequenced + seq nibble 1, second_frame clear"
        );

        let action = tx.on_radio_tx_complete(slot, true).unwrap();
        assert!(matches!(action, TxAction::ArmTimer { .. }));

        let nonce2 = S0Nonce::random();
        let action = tx.on_nonce_report(slot, nonce2.clone()).unwrap();
        let TxAction::SendFrame { frame: second } = action else {
            panic!()
        };
        assert_eq!(second[1], SECURITY_MESSAGE_ENCAPSULATION);
        assert_eq!(
            decrypt_flags_byte(&tx, &nonce2, &second),
            flags::SEQUENCED | flags::SECOND_FRAME | 1,
            "closing segment must carry sequenced + second_frame + the same seq nibble as the first"
        );

        let action = tx.on_radio_tx_complete(slot, true).unwrap();
        assert!(matches!(action, TxAction::Deliver(TxOutcome::Done)));
    }

    /// Decrypts just enough of an encapsulation frame to read back its flags
    /// byte, given the receiver nonce `begin_tx`'s caller supplied.
    fn decrypt_flags_byte(engine: &SecurityEngine, receiver_nonce: &S0Nonce, frame: &[u8]) -> u8 {
        let sender_iv = &frame[2..2 + S0_HALF_NONCE_SIZE];
        let ciphertext_len = frame.len() - 2 - S0_HALF_NONCE_SIZE - 1 - MAC_SIZE;
        let ciphertext = &frame[2 + S0_HALF_NONCE_SIZE..2 + S0_HALF_NONCE_SIZE + ciphertext_len];
        let iv = [sender_iv, receiver_nonce.get()].concat();
        let plaintext = decrypt_aes_ofb(ciphertext, engine.manager().enc_key(), &iv);
        plaintext[0]
    }

    #[test]
    fn pool_exhaustion_returns_error() {
        let mut tx = engine(1u8);
        for i in 0..TX_SESSION_POOL_SIZE {
            tx.begin_tx(NodeId::new(2u8 + i as u8), Bytes::from_static(&[1, 2]), false)
                .unwrap();
        }
        let result = tx.begin_tx(
            NodeId::new(2u8 + TX_SESSION_POOL_SIZE as u8),
            Bytes::from_static(&[1, 2]),
            false,
        );
        assert!(matches!(result, Err(Error::PoolExhausted(_))));
    }

    #[test]
    fn second_session_to_same_destination_is_busy() {
        let mut tx = engine(1u8);
        tx.begin_tx(NodeId::new(5u8), Bytes::from_static(&[1]), false)
            .unwrap();
        let result = tx.begin_tx(NodeId::new(5u8), Bytes::from_static(&[2]), false);
        assert!(matches!(result, Err(Error::Busy)));
    }
}
