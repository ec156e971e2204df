//! Minimal Z-Wave serial API framing: SOF/ACK/NAK/CAN control bytes plus
//! the `[SOF][len][payload...][checksum]` data frame envelope.
//!
//! The wire-level Serial API itself is treated as a black box here
//! (`AddNodeToNetwork`/`SendData`/etc. are never reimplemented); this is
//! just enough framing for [`crate::radio::SerialRadioBackend`] to hand a
//! `RadioBackend::submit` frame to a real UART and to recover control bytes
//! and data frames from the bytes that come back.

pub const SOF: u8 = 0x01;
pub const ACK: u8 = 0x06;
pub const NAK: u8 = 0x15;
pub const CAN: u8 = 0x18;

/// Wraps `payload` (the bytes `RadioBackend::submit` was given) in the
/// `[SOF][len][payload][checksum]` envelope.
pub fn encode_data_frame(payload: &[u8]) -> Vec<u8> {
    let len = payload.len() as u8 + 1;
    let mut out = Vec::with_capacity(payload.len() + 3);
    out.push(SOF);
    out.push(len);
    out.extend_from_slice(payload);
    out.push(checksum(&out));
    out
}

fn checksum(frame_so_far: &[u8]) -> u8 {
    // XOR of everything after SOF, folded with the traditional 0xff seed.
    frame_so_far[1..].iter().fold(0xff, |acc, b| acc ^ b)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedFrame {
    Ack,
    Nak,
    Can,
    Data(Vec<u8>),
}

/// Consumes one frame from the front of `buf` if a complete one is present,
/// returning it along with how many bytes were consumed. Leading bytes that
/// are neither a control byte nor a `SOF` are garbage and are skipped
/// silently (the radio occasionally sends noise while booting).
pub fn try_parse_frame(buf: &[u8]) -> Option<(ParsedFrame, usize)> {
    match *buf.first()? {
        ACK => Some((ParsedFrame::Ack, 1)),
        NAK => Some((ParsedFrame::Nak, 1)),
        CAN => Some((ParsedFrame::Can, 1)),
        SOF => {
            let len = *buf.get(1)? as usize;
            let total = len + 2;
            if buf.len() < total {
                return None;
            }
            let payload = buf[2..total - 1].to_vec();
            Some((ParsedFrame::Data(payload), total))
        }
        _ => Some((ParsedFrame::Can, 1)), // treat stray bytes as discardable garbage
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_then_parse_round_trips() {
        let payload = [0x13, 0x01, 0x02, 0x25, 0x01];
        let frame = encode_data_frame(&payload);
        let (parsed, consumed) = try_parse_frame(&frame).unwrap();
        assert_eq!(consumed, frame.len());
        assert_eq!(parsed, ParsedFrame::Data(payload.to_vec()));
    }

    #[test]
    fn control_bytes_are_single_byte_frames() {
        assert_eq!(try_parse_frame(&[ACK]), Some((ParsedFrame::Ack, 1)));
        assert_eq!(try_parse_frame(&[NAK]), Some((ParsedFrame::Nak, 1)));
        assert_eq!(try_parse_frame(&[CAN]), Some((ParsedFrame::Can, 1)));
    }

    #[test]
    fn incomplete_data_frame_returns_none() {
        let payload = [0x13, 0x01, 0x02];
        let frame = encode_data_frame(&payload);
        assert_eq!(try_parse_frame(&frame[..frame.len() - 1]), None);
    }
}
