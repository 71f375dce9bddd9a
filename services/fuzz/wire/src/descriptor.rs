//! Send descriptor attached to every outbound SCTP message.
//!
//! The descriptor is encoded in the kernel's `struct sctp_sndrcvinfo` layout.
//! Every field is host byte order except the payload protocol id, which the
//! kernel passes through to the peer untouched and therefore has to be in
//! network byte order already.

use bytes::{BufMut, Bytes, BytesMut};
use serde::{Deserialize, Serialize};

/// Size of `struct sctp_sndrcvinfo`
pub const SNDRCVINFO_SIZE: usize = 32;

/// Stream used when the configuration does not name one
pub const DEFAULT_STREAM_ID: u16 = 1;

/// Payload protocol id used when the configuration does not name one
pub const DEFAULT_PPID: u32 = 1;

/// Stream id and payload protocol id for an outbound message.
///
/// `sinfo_flags` is always sent as zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendDescriptor {
    /// Stream within the association
    pub stream_id: u16,
    /// Payload protocol id, host order here and swapped on encode
    pub payload_id: u32,
}

impl Default for SendDescriptor {
    fn default() -> Self {
        Self::new(DEFAULT_STREAM_ID, DEFAULT_PPID)
    }
}

impl SendDescriptor {
    /// Create a descriptor
    pub fn new(stream_id: u16, payload_id: u32) -> Self {
        Self {
            stream_id,
            payload_id,
        }
    }

    /// Same descriptor on a different stream
    pub fn with_stream(self, stream_id: u16) -> Self {
        Self { stream_id, ..self }
    }

    /// Encode as `sctp_sndrcvinfo`
    pub fn encode(&self, buf: &mut BytesMut) {
        buf.reserve(SNDRCVINFO_SIZE);
        buf.put_u16_ne(self.stream_id);
        buf.put_u16_ne(0); // ssn
        buf.put_u16_ne(0); // flags
        buf.put_u16_ne(0); // padding before the u32 fields
        buf.put_u32(self.payload_id);
        buf.put_u32_ne(0); // context
        buf.put_u32_ne(0); // timetolive
        buf.put_u32_ne(0); // tsn
        buf.put_u32_ne(0); // cumtsn
        buf.put_i32_ne(0); // assoc_id
    }

    /// Encode into a fresh buffer
    pub fn to_bytes(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(SNDRCVINFO_SIZE);
        self.encode(&mut buf);
        buf.freeze()
    }

    /// Read back the fields this side sets, ignoring the kernel-filled ones
    #[cfg(test)]
    pub(crate) fn decode(buf: &mut Bytes) -> Option<Self> {
        use bytes::Buf;

        if buf.len() < SNDRCVINFO_SIZE {
            return None;
        }

        let stream_id = buf.get_u16_ne();
        buf.advance(6); // ssn, flags, padding
        let payload_id = buf.get_u32();
        buf.advance(SNDRCVINFO_SIZE - 12);

        Some(Self {
            stream_id,
            payload_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_descriptor() {
        let desc = SendDescriptor::default();
        assert_eq!(desc.stream_id, 1);
        assert_eq!(desc.payload_id, 1);
    }

    #[test]
    fn test_with_stream_keeps_ppid() {
        let desc = SendDescriptor::new(1, 46).with_stream(7);
        assert_eq!(desc.stream_id, 7);
        assert_eq!(desc.payload_id, 46);
    }

    #[test]
    fn test_encode_layout() {
        let bytes = SendDescriptor::new(0x0102, 0x0A0B0C0D).to_bytes();
        assert_eq!(bytes.len(), SNDRCVINFO_SIZE);

        // stream id is host order
        assert_eq!(&bytes[0..2], &0x0102u16.to_ne_bytes());
        // ssn, flags and padding are zero
        assert!(bytes[2..8].iter().all(|b| *b == 0));
        // ppid is network order regardless of host
        assert_eq!(&bytes[8..12], &[0x0A, 0x0B, 0x0C, 0x0D]);
        assert!(bytes[12..].iter().all(|b| *b == 0));
    }

    #[test]
    fn test_decode_kernel_filled_fields() {
        let mut raw = BytesMut::new();
        SendDescriptor::new(3, 60).encode(&mut raw);
        // kernel writes tsn and assoc_id on the receive path
        raw[20..24].copy_from_slice(&99u32.to_ne_bytes());
        raw[28..32].copy_from_slice(&5i32.to_ne_bytes());

        let mut bytes = raw.freeze();
        let decoded = SendDescriptor::decode(&mut bytes).unwrap();
        assert_eq!(decoded, SendDescriptor::new(3, 60));
        assert!(bytes.is_empty());
    }

    #[test]
    fn test_decode_short_buffer() {
        let mut short = Bytes::from_static(&[0u8; 10]);
        assert_eq!(SendDescriptor::decode(&mut short), None);
        assert_eq!(short.len(), 10);
    }
}
