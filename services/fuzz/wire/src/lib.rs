//! SCTP send descriptor encoding and ancillary control message framing.
//!
//! This crate provides the low-level wire pieces a fuzz session attaches to
//! outbound SCTP messages: the per-message send descriptor (stream id,
//! payload protocol id) in the kernel's `sctp_sndrcvinfo` layout, and
//! the `cmsghdr` framing used to pass it on the ancillary channel.
//!
//! ## Layout
//!
//! ```text
//! struct sctp_sndrcvinfo (32 bytes, host byte order unless noted)
//! +--------+--------+--------+--------+----------------+
//! | stream | ssn    | flags  | pad    | ppid (network) |
//! | u16    | u16    | u16    | u16    | u32            |
//! +--------+--------+--------+--------+----------------+
//! | context u32 | ttl u32 | tsn u32 | cumtsn u32 | assoc_id i32 |
//! +-------------+---------+---------+------------+--------------+
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod control;
pub mod descriptor;

// Re-export main types
pub use control::{encode_sndrcv, sndrcv_space};
pub use descriptor::{SendDescriptor, DEFAULT_PPID, DEFAULT_STREAM_ID, SNDRCVINFO_SIZE};

/// Protocol number of SCTP (`IPPROTO_SCTP`)
pub const IPPROTO_SCTP: i32 = 132;

/// Socket option level for SCTP options (`SOL_SCTP`)
pub const SOL_SCTP: i32 = 132;

/// Socket option installing the default send descriptor
pub const SCTP_DEFAULT_SEND_PARAM: i32 = 10;

/// Ancillary message type carrying a `sctp_sndrcvinfo`
pub const SCTP_SNDRCV: i32 = 1;

/// Largest payload a session will ever hand to the transport
pub const MAX_PAYLOAD_SIZE: usize = 65534;
