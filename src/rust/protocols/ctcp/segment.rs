// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

use crate::{
    protocols::ctcp::SeqNumber,
    runtime::{fail::Fail, network::consts::MAX_SEGMENT_DATA_SIZE},
};
use ::libc::EBADMSG;
use ::std::fmt;

/// Size of the fixed segment header, in bytes.
pub const CTCP_HEADER_SIZE: usize = 18;

// Byte offset of the checksum field within the header.
const CKSUM_OFFSET: usize = 16;

/// Segment flags.
///
/// The wire carries a 32-bit flag word, but only two bits are meaningful;
/// the rest are reserved and transmitted as zero. Unknown bits are ignored
/// on receive.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Flags {
    pub ack: bool,
    pub fin: bool,
}

impl Flags {
    const FIN: u32 = 1 << 0;
    const ACK: u32 = 1 << 4;

    fn to_bits(self) -> u32 {
        let mut bits: u32 = 0;
        if self.fin {
            bits |= Self::FIN;
        }
        if self.ack {
            bits |= Self::ACK;
        }
        bits
    }

    fn from_bits(bits: u32) -> Self {
        Self {
            ack: (bits & Self::ACK) != 0,
            fin: (bits & Self::FIN) != 0,
        }
    }
}

/// Fixed segment header.
///
/// On the wire the header is 18 bytes, all integer fields big-endian:
/// `seqno` (4), `ackno` (4), `len` (2, header plus payload), `flags` (4),
/// `window` (2), `cksum` (2). The `len` and `cksum` fields are derived at
/// serialization time and are not stored here.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct CtcpHeader {
    /// Sequence number of the first payload byte; for a zero-length control
    /// segment, the number the next data byte would get.
    pub seqno: SeqNumber,
    /// Next in-order byte the sender expects to receive.
    pub ackno: SeqNumber,
    pub flags: Flags,
    /// Advertised free receive-buffer space, in bytes.
    pub window: u16,
}

impl CtcpHeader {
    pub fn new(seqno: SeqNumber, ackno: SeqNumber, flags: Flags, window: u16) -> Self {
        Self {
            seqno,
            ackno,
            flags,
            window,
        }
    }

    /// Serializes this header plus `payload` into a wire-ready segment,
    /// stamping the checksum computed over the assembled bytes with the
    /// checksum field held at zero.
    pub fn serialize(&self, payload: &[u8]) -> Vec<u8> {
        debug_assert!(payload.len() <= MAX_SEGMENT_DATA_SIZE);
        let len: usize = CTCP_HEADER_SIZE + payload.len();
        let mut buf: Vec<u8> = Vec::with_capacity(len);
        buf.extend_from_slice(&u32::from(self.seqno).to_be_bytes());
        buf.extend_from_slice(&u32::from(self.ackno).to_be_bytes());
        buf.extend_from_slice(&(len as u16).to_be_bytes());
        buf.extend_from_slice(&self.flags.to_bits().to_be_bytes());
        buf.extend_from_slice(&self.window.to_be_bytes());
        buf.extend_from_slice(&[0u8; 2]);
        buf.extend_from_slice(payload);

        let checksum: u16 = segment_checksum(&buf);
        buf[CKSUM_OFFSET..CKSUM_OFFSET + 2].copy_from_slice(&checksum.to_be_bytes());
        buf
    }

    /// Parses a segment from the exact bytes delivered by the substrate,
    /// returning the header and a view of the payload.
    ///
    /// The advertised `len` is never trusted beyond the received byte count,
    /// and a checksum mismatch rejects the segment. Callers drop rejected
    /// segments silently.
    pub fn parse(buf: &[u8]) -> Result<(Self, &[u8]), Fail> {
        if buf.len() < CTCP_HEADER_SIZE {
            return Err(Fail::new(EBADMSG, "segment shorter than header"));
        }

        let len: usize = u16::from_be_bytes([buf[8], buf[9]]) as usize;
        if len < CTCP_HEADER_SIZE {
            return Err(Fail::new(EBADMSG, "segment length field too small"));
        }
        if len > buf.len() {
            return Err(Fail::new(EBADMSG, "segment length field exceeds received bytes"));
        }
        if len - CTCP_HEADER_SIZE > MAX_SEGMENT_DATA_SIZE {
            return Err(Fail::new(EBADMSG, "segment payload exceeds maximum segment size"));
        }

        // Validate over the exact `len` bytes received.
        let segment: &[u8] = &buf[..len];
        let received_cksum: u16 = u16::from_be_bytes([segment[16], segment[17]]);
        if received_cksum != segment_checksum(segment) {
            return Err(Fail::new(EBADMSG, "segment checksum mismatch"));
        }

        let header: CtcpHeader = Self {
            seqno: SeqNumber::from(u32::from_be_bytes([buf[0], buf[1], buf[2], buf[3]])),
            ackno: SeqNumber::from(u32::from_be_bytes([buf[4], buf[5], buf[6], buf[7]])),
            flags: Flags::from_bits(u32::from_be_bytes([buf[10], buf[11], buf[12], buf[13]])),
            window: u16::from_be_bytes([buf[14], buf[15]]),
        };
        Ok((header, &segment[CTCP_HEADER_SIZE..]))
    }
}

impl fmt::Display for CtcpHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "seqno={} ackno={} flags=[{}{}] window={}",
            self.seqno,
            self.ackno,
            if self.flags.ack { "A" } else { "" },
            if self.flags.fin { "F" } else { "" },
            self.window,
        )
    }
}

/// Computes the RFC 1071 Internet checksum over a segment: the
/// one's-complement of the one's-complement sum of its 16-bit big-endian
/// words, with the checksum field held at zero and an odd trailing byte
/// padded with zero.
fn segment_checksum(segment: &[u8]) -> u16 {
    let mut state: u32 = 0;

    // The fixed header, with the checksum word contributing zero. The
    // checksum field sits at an even offset, so word alignment is preserved
    // across the skip.
    for chunk in segment[..CKSUM_OFFSET].chunks_exact(2) {
        state += u16::from_be_bytes([chunk[0], chunk[1]]) as u32;
    }

    // The payload.
    let mut chunks = segment[CTCP_HEADER_SIZE..].chunks_exact(2);
    for chunk in &mut chunks {
        state += u16::from_be_bytes([chunk[0], chunk[1]]) as u32;
    }
    if let Some(&byte) = chunks.remainder().first() {
        state += u16::from_be_bytes([byte, 0]) as u32;
    }

    // Fold the end-around carries. A u32 accumulator would need 2^16
    // additions to overflow, far beyond any segment we accept.
    while state > 0xFFFF {
        state -= 0xFFFF;
    }
    !state as u16
}

// Unit tests for the segment codec.
#[cfg(test)]
mod tests {
    use super::{CtcpHeader, Flags, CKSUM_OFFSET, CTCP_HEADER_SIZE};
    use crate::{
        protocols::ctcp::SeqNumber,
        runtime::network::consts::MAX_SEGMENT_DATA_SIZE,
    };
    use ::anyhow::Result;

    fn sample_header() -> CtcpHeader {
        CtcpHeader::new(
            SeqNumber::from(1),
            SeqNumber::from(7),
            Flags { ack: true, fin: false },
            4096,
        )
    }

    #[test]
    fn serialize_parse_roundtrip() -> Result<()> {
        let payload: &[u8] = b"hello\n";
        let wire: Vec<u8> = sample_header().serialize(payload);
        crate::ensure_eq!(wire.len(), CTCP_HEADER_SIZE + payload.len());

        let (header, parsed_payload) = match CtcpHeader::parse(&wire) {
            Ok(parsed) => parsed,
            Err(e) => anyhow::bail!("parse rejected a valid segment: {:?}", e),
        };
        crate::ensure_eq!(header, sample_header());
        crate::ensure_eq!(parsed_payload, payload);

        Ok(())
    }

    #[test]
    fn zero_length_control_segment() -> Result<()> {
        let header: CtcpHeader = CtcpHeader::new(
            SeqNumber::from(42),
            SeqNumber::from(42),
            Flags { ack: true, fin: true },
            0,
        );
        let wire: Vec<u8> = header.serialize(&[]);
        crate::ensure_eq!(wire.len(), CTCP_HEADER_SIZE);

        let (parsed, payload) = match CtcpHeader::parse(&wire) {
            Ok(parsed) => parsed,
            Err(e) => anyhow::bail!("parse rejected a valid segment: {:?}", e),
        };
        crate::ensure_eq!(parsed.flags.fin, true);
        crate::ensure_eq!(parsed.flags.ack, true);
        crate::ensure_eq!(payload.len(), 0);

        Ok(())
    }

    #[test]
    fn corrupt_byte_is_rejected() -> Result<()> {
        let mut wire: Vec<u8> = sample_header().serialize(b"hello\n");
        // Flip one payload bit.
        let last: usize = wire.len() - 1;
        wire[last] ^= 0x40;
        crate::ensure_eq!(CtcpHeader::parse(&wire).is_err(), true);

        // A corrupted checksum field itself is also caught.
        let mut wire: Vec<u8> = sample_header().serialize(b"hello\n");
        wire[CKSUM_OFFSET] ^= 0x01;
        crate::ensure_eq!(CtcpHeader::parse(&wire).is_err(), true);

        Ok(())
    }

    #[test]
    fn truncated_segment_is_rejected() -> Result<()> {
        let wire: Vec<u8> = sample_header().serialize(b"hello\n");

        // Shorter than the fixed header.
        crate::ensure_eq!(CtcpHeader::parse(&wire[..CTCP_HEADER_SIZE - 1]).is_err(), true);

        // The length field claims more bytes than were received.
        crate::ensure_eq!(CtcpHeader::parse(&wire[..wire.len() - 1]).is_err(), true);

        Ok(())
    }

    #[test]
    fn length_field_is_not_trusted() -> Result<()> {
        // Craft a segment whose length field undershoots the datagram:
        // parsing succeeds over exactly `len` bytes and ignores the rest.
        let mut wire: Vec<u8> = sample_header().serialize(b"hi");
        wire.extend_from_slice(b"trailing junk");
        let (_, payload) = match CtcpHeader::parse(&wire) {
            Ok(parsed) => parsed,
            Err(e) => anyhow::bail!("parse rejected a valid segment: {:?}", e),
        };
        crate::ensure_eq!(payload, b"hi".as_slice());

        // A length field smaller than the header is invalid.
        let mut wire: Vec<u8> = sample_header().serialize(b"hi");
        wire[8..10].copy_from_slice(&(CTCP_HEADER_SIZE as u16 - 1).to_be_bytes());
        crate::ensure_eq!(CtcpHeader::parse(&wire).is_err(), true);

        Ok(())
    }

    #[test]
    fn oversized_payload_is_rejected() -> Result<()> {
        // Hand-build a segment over the compile-time payload bound; the
        // serializer refuses to produce one, so forge the length field.
        let wire: Vec<u8> = sample_header().serialize(&[0u8; MAX_SEGMENT_DATA_SIZE]);
        let mut forged: Vec<u8> = wire.clone();
        forged.extend_from_slice(&[0u8; 8]);
        forged[8..10].copy_from_slice(&((CTCP_HEADER_SIZE + MAX_SEGMENT_DATA_SIZE + 8) as u16).to_be_bytes());
        crate::ensure_eq!(CtcpHeader::parse(&forged).is_err(), true);

        Ok(())
    }

    #[test]
    fn reserved_flag_bits_are_ignored() -> Result<()> {
        let mut wire: Vec<u8> = sample_header().serialize(&[]);
        // Set a reserved flag bit and restamp the checksum so the segment
        // still validates.
        wire[10..14].copy_from_slice(&(super::Flags::ACK | 0x8000_0000u32).to_be_bytes());
        wire[CKSUM_OFFSET..CKSUM_OFFSET + 2].copy_from_slice(&[0, 0]);
        let checksum: u16 = super::segment_checksum(&wire);
        wire[CKSUM_OFFSET..CKSUM_OFFSET + 2].copy_from_slice(&checksum.to_be_bytes());

        let (header, _) = match CtcpHeader::parse(&wire) {
            Ok(parsed) => parsed,
            Err(e) => anyhow::bail!("parse rejected a valid segment: {:?}", e),
        };
        crate::ensure_eq!(header.flags, Flags { ack: true, fin: false });

        Ok(())
    }
}
