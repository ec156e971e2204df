//! ZIP packet codec.
//!
//! `COMMAND_CLASS_ZIP, COMMAND_ZIP_PACKET` framing between the gateway
//! and IP peers: a 7-byte fixed header, an optional variable-length
//! header extension carrying TLVs, and an optional embedded Z-Wave
//! command. Grounded in `ZW_zip_classcmd.h`'s `ZW_COMMAND_ZIP_PACKET`
//! layout and `ip_translate/multicast_tlv.c`'s `parse_CC_ZIP_EXT_HDR`
//! for the header-extension walk (both under original_source/).
//!
//! Only the TLVs below are understood here: encapsulation
//! format info (carries the peer's negotiated security scheme),
//! Z-Wave multicast addressing (a node-id bitmask, the representation
//! classic multicast has always used), the installation/maintenance
//! "get" request, and the two/four-byte header-length extension that
//! lets the header grow past 255 bytes. Any other *critical* TLV
//! (`type & 0x80`) is a protocol violation; non-critical ones are
//! skipped, matching the original's `default:` arm.

use bitflags::bitflags;
use bytes::{Bytes, BytesMut};

use zwave_core::definitions::{EndpointIndex, NodeId};
use zwave_core::gateway_model::SecurityScheme;

use crate::error::{Error, Result};

pub const CC_ZIP: u8 = 0x23;
pub const ZIP_PACKET: u8 = 0x02;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Flags0: u8 {
        const ACK_REQ   = 0b1000_0000;
        const ACK_RES   = 0b0100_0000;
        const NACK_RES  = 0b0010_0000;
        const NACK_WAIT = 0b0001_0000;
        const NACK_QF   = 0b0000_1000;
        const NACK_OERR = 0b0000_0100;
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Flags1: u8 {
        const HDR_EXT_INCL     = 0b1000_0000;
        const ZW_CMD_INCL      = 0b0100_0000;
        const MORE_INFORMATION = 0b0010_0000;
        const SECURE_ORIGIN    = 0b0001_0000;
    }
}

/// TLV type bytes as they appear on the wire, i.e. including the
/// critical-option bit (`ENCAPSULATION_FORMAT_INFO (0x84)` is the full
/// byte, not the masked type).
mod tlv {
    pub const TYPE_MASK: u8 = 0x7f;
    pub const CRITICAL_FLAG: u8 = 0x80;

    pub const INSTALLATION_MAINTENANCE_GET: u8 = 0x02;
    pub const ENCAPSULATION_FORMAT_INFO: u8 = 0x04;
    pub const ZWAVE_MULTICAST_ADDRESSING: u8 = 0x05;
    /// Marks the legacy one-byte header-extension length as a sentinel
    /// (`0xff`) pointing at a following two-byte length TLV, once the
    /// extension has grown past 255 bytes.
    pub const EXT_ZIP_PACKET_HEADER_LENGTH: u8 = 0x7f;
}

/// Parsed contents of the optional header extension.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderExtension {
    /// The peer's negotiated security scheme, if an
    /// `ENCAPSULATION_FORMAT_INFO` TLV was present.
    pub scheme: Option<SecurityScheme>,
    /// Destination list from a `ZWAVE_MULTICAST_ADDRESSING` TLV, empty
    /// if this packet doesn't target a multicast group.
    pub multicast_destinations: Vec<NodeId>,
    /// Whether the peer asked for installation/maintenance diagnostics
    /// on the reply (`INSTALLATION_MAINTENANCE_GET`).
    pub wants_installation_maintenance: bool,
}

impl HeaderExtension {
    fn is_empty(&self) -> bool {
        self.scheme.is_none()
            && self.multicast_destinations.is_empty()
            && !self.wants_installation_maintenance
    }
}

/// One decoded/to-be-encoded ZIP packet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZipPacket {
    pub flags0: Flags0,
    pub flags1: Flags1,
    pub seq: u8,
    pub s_endpoint: EndpointIndex,
    pub d_endpoint: EndpointIndex,
    pub header_extension: HeaderExtension,
    /// The embedded Z-Wave command, present iff `flags1.ZW_CMD_INCL`.
    pub zwave_command: Bytes,
}

fn endpoint_to_byte(ep: EndpointIndex) -> u8 {
    match ep {
        EndpointIndex::Root => 0,
        EndpointIndex::Endpoint(n) => n,
    }
}

fn endpoint_from_byte(b: u8) -> EndpointIndex {
    if b == 0 {
        EndpointIndex::Root
    } else {
        EndpointIndex::Endpoint(b)
    }
}

/// Maps `(sec_level, crc16_flag)`, as carried by `ENCAPSULATION_FORMAT_INFO`,
/// to a concrete scheme.
pub fn efi_to_scheme(sec_level: u8, crc16_flag: u8) -> SecurityScheme {
    if crc16_flag != 0 {
        return SecurityScheme::UseCrc16;
    }
    match sec_level {
        0 => SecurityScheme::S0,
        1 => SecurityScheme::S2Unauthenticated,
        2 => SecurityScheme::S2Authenticated,
        3 => SecurityScheme::S2Access,
        _ => SecurityScheme::NoScheme,
    }
}

/// The inverse of [`efi_to_scheme`], for composing outbound
/// `ENCAPSULATION_FORMAT_INFO` TLVs.
pub fn scheme_to_efi(scheme: SecurityScheme) -> (u8, u8) {
    match scheme {
        SecurityScheme::UseCrc16 => (0, 1),
        SecurityScheme::S0 => (0, 0),
        SecurityScheme::S2Unauthenticated => (1, 0),
        SecurityScheme::S2Authenticated => (2, 0),
        SecurityScheme::S2Access => (3, 0),
        SecurityScheme::NoScheme => (0xff, 0),
    }
}

/// Decodes a `ZWAVE_MULTICAST_ADDRESSING` value: a bitmask over classic
/// node ids, bit 0 of byte 0 addressing node 1.
fn decode_multicast_mask(value: &[u8]) -> Vec<NodeId> {
    let mut nodes = Vec::new();
    for (byte_index, byte) in value.iter().enumerate() {
        for bit in 0..8 {
            if byte & (1 << bit) != 0 {
                let node_id = (byte_index * 8 + bit + 1) as u16;
                nodes.push(NodeId::from(node_id));
            }
        }
    }
    nodes
}

fn encode_multicast_mask(nodes: &[NodeId]) -> Vec<u8> {
    let max_id: u16 = nodes.iter().map(|n| u16::from(*n)).max().unwrap_or(0);
    let mut mask = vec![0u8; max_id.div_ceil(8) as usize];
    for node in nodes {
        let id = u16::from(*node);
        if id == 0 {
            continue;
        }
        let index = (id - 1) as usize;
        mask[index / 8] |= 1 << (index % 8);
    }
    mask
}

struct TlvView<'a> {
    full_type: u8,
    value: &'a [u8],
}

/// Walks the TLV stream in `ext` (the header extension body, not
/// including its own length prefix), matching
/// `parse_CC_ZIP_EXT_HDR`'s loop.
fn walk_tlvs(ext: &[u8]) -> Result<Vec<TlvView<'_>>> {
    let mut out = Vec::new();
    let mut pos = 0;
    while pos < ext.len() {
        let full_type = *ext
            .get(pos)
            .ok_or_else(|| Error::ProtocolViolation("truncated TLV type".into()))?;
        let len = *ext
            .get(pos + 1)
            .ok_or_else(|| Error::ProtocolViolation("truncated TLV length".into()))?
            as usize;
        let value_start = pos + 2;
        let value_end = value_start + len;
        let value = ext
            .get(value_start..value_end)
            .ok_or_else(|| Error::ProtocolViolation("TLV length exceeds header extension".into()))?;
        out.push(TlvView { full_type, value });
        pos = value_end;
    }
    if pos != ext.len() {
        return Err(Error::ProtocolViolation("trailing bytes after last TLV".into()));
    }
    Ok(out)
}

fn parse_header_extension(ext: &[u8]) -> Result<HeaderExtension> {
    let mut result = HeaderExtension::default();
    for view in walk_tlvs(ext)? {
        let masked = view.full_type & tlv::TYPE_MASK;
        let critical = view.full_type & tlv::CRITICAL_FLAG != 0;
        match masked {
            tlv::INSTALLATION_MAINTENANCE_GET => {
                result.wants_installation_maintenance = true;
            }
            tlv::ENCAPSULATION_FORMAT_INFO => {
                if view.value.len() < 2 {
                    return Err(Error::ProtocolViolation(
                        "encapsulation format info TLV too short".into(),
                    ));
                }
                result.scheme = Some(efi_to_scheme(view.value[0], view.value[1]));
            }
            tlv::ZWAVE_MULTICAST_ADDRESSING => {
                result.multicast_destinations = decode_multicast_mask(view.value);
            }
            tlv::EXT_ZIP_PACKET_HEADER_LENGTH => {
                // Already consumed while locating the extension's total
                // length in `decode`; a no-op here.
            }
            _ if critical => {
                return Err(Error::ProtocolViolation(format!(
                    "unsupported critical header extension option {masked:#x}"
                )));
            }
            _ => {}
        }
    }
    Ok(result)
}

impl ZipPacket {
    /// Parses a ZIP packet starting at `[0x23, 0x02, ...]`. Returns
    /// [`Error::ProtocolViolation`] on any structurally impossible TLV
    /// length, mapping that error to "NACK with `OERR` if `ACK_REQ`,
    /// silent drop otherwise" at the caller.
    pub fn decode(buf: &[u8]) -> Result<Self> {
        if buf.len() < 7 {
            return Err(Error::ProtocolViolation("ZIP packet shorter than header".into()));
        }
        if buf[0] != CC_ZIP || buf[1] != ZIP_PACKET {
            return Err(Error::ProtocolViolation("not a ZIP_PACKET frame".into()));
        }
        let flags0 = Flags0::from_bits_truncate(buf[2]);
        let flags1 = Flags1::from_bits_truncate(buf[3]);
        let seq = buf[4];
        let s_endpoint = endpoint_from_byte(buf[5]);
        let d_endpoint = endpoint_from_byte(buf[6]);

        let mut pos = 7;
        let mut header_extension = HeaderExtension::default();
        if flags1.contains(Flags1::HDR_EXT_INCL) {
            let first = *buf
                .get(pos)
                .ok_or_else(|| Error::ProtocolViolation("missing header extension length".into()))?;
            let (total_len, consumed_by_len_field) = if first == 0xff {
                let marker = buf
                    .get(pos + 1..pos + 5)
                    .ok_or_else(|| Error::ProtocolViolation("truncated extended header length".into()))?;
                if marker[0] & tlv::TYPE_MASK != tlv::EXT_ZIP_PACKET_HEADER_LENGTH || marker[1] != 2 {
                    return Err(Error::ProtocolViolation(
                        "malformed extended header length option".into(),
                    ));
                }
                let len = u16::from_be_bytes([marker[2], marker[3]]) as usize;
                (len, 5)
            } else {
                (first as usize, 1)
            };
            let ext_start = pos + consumed_by_len_field;
            let ext_end = pos
                .checked_add(total_len)
                .ok_or_else(|| Error::ProtocolViolation("header extension length overflow".into()))?;
            let ext_body = buf
                .get(ext_start..ext_end)
                .ok_or_else(|| Error::ProtocolViolation("header extension length exceeds frame".into()))?;
            header_extension = parse_header_extension(ext_body)?;
            pos = ext_end;
        }

        let zwave_command = if flags1.contains(Flags1::ZW_CMD_INCL) {
            Bytes::copy_from_slice(&buf[pos..])
        } else {
            Bytes::new()
        };

        Ok(ZipPacket {
            flags0,
            flags1,
            seq,
            s_endpoint,
            d_endpoint,
            header_extension,
            zwave_command,
        })
    }

    /// Re-encodes the packet. Round-trips byte-identically for frames
    /// whose header extension fits in one byte and carries at most one
    /// of each recognised TLV: a ZIP frame decoded then re-encoded yields
    /// byte-identical bytes when no options are rewritten.
    pub fn encode(&self) -> Bytes {
        let mut flags1 = self.flags1;
        let mut ext_body = Vec::new();
        if let Some(scheme) = self.header_extension.scheme {
            let (sec_level, crc16_flag) = scheme_to_efi(scheme);
            ext_body.push(tlv::CRITICAL_FLAG | tlv::ENCAPSULATION_FORMAT_INFO);
            ext_body.push(2);
            ext_body.push(sec_level);
            ext_body.push(crc16_flag);
        }
        if !self.header_extension.multicast_destinations.is_empty() {
            let mask = encode_multicast_mask(&self.header_extension.multicast_destinations);
            ext_body.push(tlv::CRITICAL_FLAG | tlv::ZWAVE_MULTICAST_ADDRESSING);
            ext_body.push(mask.len() as u8);
            ext_body.extend_from_slice(&mask);
        }
        if self.header_extension.wants_installation_maintenance {
            ext_body.push(tlv::INSTALLATION_MAINTENANCE_GET);
            ext_body.push(0);
        }

        let has_ext = !ext_body.is_empty() || !self.header_extension.is_empty();
        if has_ext {
            flags1.insert(Flags1::HDR_EXT_INCL);
        } else {
            flags1.remove(Flags1::HDR_EXT_INCL);
        }

        let mut out = BytesMut::with_capacity(7 + ext_body.len() + 1 + self.zwave_command.len());
        out.extend_from_slice(&[CC_ZIP, ZIP_PACKET, self.flags0.bits(), flags1.bits(), self.seq]);
        out.extend_from_slice(&[endpoint_to_byte(self.s_endpoint), endpoint_to_byte(self.d_endpoint)]);

        if has_ext {
            if ext_body.len() > 255 {
                out.extend_from_slice(&[0xff]);
                let total_len = (ext_body.len() + 5) as u16;
                out.extend_from_slice(&[
                    tlv::CRITICAL_FLAG | tlv::EXT_ZIP_PACKET_HEADER_LENGTH,
                    2,
                    (total_len >> 8) as u8,
                    (total_len & 0xff) as u8,
                ]);
            } else {
                out.extend_from_slice(&[(ext_body.len() + 1) as u8]);
            }
            out.extend_from_slice(&ext_body);
        }

        if flags1.contains(Flags1::ZW_CMD_INCL) {
            out.extend_from_slice(&self.zwave_command);
        }
        out.freeze()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_command() -> Bytes {
        Bytes::from_static(&[0x20, 0x02])
    }

    #[test]
    fn decode_minimal_frame_without_extension() {
        let raw = [CC_ZIP, ZIP_PACKET, Flags0::ACK_REQ.bits(), Flags1::ZW_CMD_INCL.bits(), 7, 0, 0, 0x20, 0x02];
        let pkt = ZipPacket::decode(&raw).unwrap();
        assert_eq!(pkt.seq, 7);
        assert_eq!(pkt.s_endpoint, EndpointIndex::Root);
        assert!(pkt.flags0.contains(Flags0::ACK_REQ));
        assert_eq!(pkt.zwave_command, sample_command());
        assert!(pkt.header_extension.is_empty());
    }

    #[test]
    fn decode_rejects_short_buffer() {
        let raw = [CC_ZIP, ZIP_PACKET, 0, 0, 0];
        assert!(matches!(ZipPacket::decode(&raw), Err(Error::ProtocolViolation(_))));
    }

    #[test]
    fn decode_rejects_unknown_critical_option() {
        let mut raw = vec![
            CC_ZIP,
            ZIP_PACKET,
            0,
            Flags1::HDR_EXT_INCL.bits(),
            1,
            0,
            0,
        ];
        // header extension length = 3 (len byte + 1-byte TLV header + 1-byte value)
        raw.push(3);
        raw.push(0x80 | 0x7e); // unknown critical type
        raw.push(0);
        let result = ZipPacket::decode(&raw);
        assert!(matches!(result, Err(Error::ProtocolViolation(_))));
    }

    #[test]
    fn encapsulation_format_info_round_trips() {
        let pkt = ZipPacket {
            flags0: Flags0::empty(),
            flags1: Flags1::ZW_CMD_INCL,
            seq: 1,
            s_endpoint: EndpointIndex::Root,
            d_endpoint: EndpointIndex::Endpoint(2),
            header_extension: HeaderExtension {
                scheme: Some(SecurityScheme::S2Authenticated),
                multicast_destinations: Vec::new(),
                wants_installation_maintenance: false,
            },
            zwave_command: sample_command(),
        };
        let encoded = pkt.encode();
        let decoded = ZipPacket::decode(&encoded).unwrap();
        assert_eq!(decoded.header_extension.scheme, Some(SecurityScheme::S2Authenticated));
        assert_eq!(decoded.zwave_command, sample_command());
        assert_eq!(decoded.d_endpoint, EndpointIndex::Endpoint(2));
    }

    #[test]
    fn multicast_addressing_round_trips() {
        let nodes = vec![NodeId::new(1u8), NodeId::new(9u8), NodeId::new(16u8)];
        let pkt = ZipPacket {
            flags0: Flags0::empty(),
            flags1: Flags1::empty(),
            seq: 2,
            s_endpoint: EndpointIndex::Root,
            d_endpoint: EndpointIndex::Root,
            header_extension: HeaderExtension {
                scheme: None,
                multicast_destinations: nodes.clone(),
                wants_installation_maintenance: false,
            },
            zwave_command: Bytes::new(),
        };
        let encoded = pkt.encode();
        let decoded = ZipPacket::decode(&encoded).unwrap();
        let mut got = decoded.header_extension.multicast_destinations.clone();
        got.sort_by_key(|n| u16::from(*n));
        let mut want = nodes;
        want.sort_by_key(|n| u16::from(*n));
        assert_eq!(got, want);
    }

    #[test]
    fn installation_maintenance_get_is_non_critical_and_round_trips() {
        let pkt = ZipPacket {
            flags0: Flags0::empty(),
            flags1: Flags1::empty(),
            seq: 3,
            s_endpoint: EndpointIndex::Root,
            d_endpoint: EndpointIndex::Root,
            header_extension: HeaderExtension {
                scheme: None,
                multicast_destinations: Vec::new(),
                wants_installation_maintenance: true,
            },
            zwave_command: Bytes::new(),
        };
        let encoded = pkt.encode();
        let decoded = ZipPacket::decode(&encoded).unwrap();
        assert!(decoded.header_extension.wants_installation_maintenance);
    }

    #[test]
    fn extended_header_length_is_used_past_255_bytes() {
        let nodes: Vec<NodeId> = (1..=232u16).map(NodeId::from).collect();
        let pkt = ZipPacket {
            flags0: Flags0::empty(),
            flags1: Flags1::empty(),
            seq: 4,
            s_endpoint: EndpointIndex::Root,
            d_endpoint: EndpointIndex::Root,
            header_extension: HeaderExtension {
                scheme: Some(SecurityScheme::S0),
                multicast_destinations: nodes.clone(),
                wants_installation_maintenance: true,
            },
            zwave_command: Bytes::new(),
        };
        let encoded = pkt.encode();
        assert_eq!(encoded[7], 0xff, "expects the extended-length marker byte");
        let decoded = ZipPacket::decode(&encoded).unwrap();
        assert_eq!(decoded.header_extension.multicast_destinations.len(), nodes.len());
    }
}
