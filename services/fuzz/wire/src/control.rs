//! Ancillary control message framing for the descriptor-tagged send path.

use bytes::{Bytes, BytesMut};

use crate::{SendDescriptor, IPPROTO_SCTP, SCTP_SNDRCV, SNDRCVINFO_SIZE};

/// Bytes needed for one `SCTP_SNDRCV` control message, padding included
pub fn sndrcv_space() -> usize {
    // SAFETY: CMSG_SPACE only does arithmetic on its argument
    unsafe { libc::CMSG_SPACE(SNDRCVINFO_SIZE as libc::c_uint) as usize }
}

fn header_len() -> usize {
    // SAFETY: CMSG_LEN only does arithmetic on its argument
    unsafe { libc::CMSG_LEN(0) as usize }
}

/// Frame a descriptor as a `cmsghdr` + `sctp_sndrcvinfo` control buffer
pub fn encode_sndrcv(descriptor: &SendDescriptor) -> Bytes {
    let mut buf = BytesMut::zeroed(sndrcv_space());

    // SAFETY: cmsghdr is plain old data, zeroed is a valid value
    let mut hdr: libc::cmsghdr = unsafe { std::mem::zeroed() };
    // SAFETY: CMSG_LEN only does arithmetic on its argument
    hdr.cmsg_len = unsafe { libc::CMSG_LEN(SNDRCVINFO_SIZE as libc::c_uint) } as _;
    hdr.cmsg_level = IPPROTO_SCTP;
    hdr.cmsg_type = SCTP_SNDRCV;

    // SAFETY: buf holds at least CMSG_SPACE bytes, which covers the header;
    // the write is unaligned so BytesMut alignment does not matter
    unsafe {
        std::ptr::write_unaligned(buf.as_mut_ptr().cast::<libc::cmsghdr>(), hdr);
    }

    let offset = header_len();
    buf[offset..offset + SNDRCVINFO_SIZE].copy_from_slice(&descriptor.to_bytes());
    buf.freeze()
}
