//! Record header codec.
//!
//! The first byte of every record is `0b0000_1kkk`: bit 3 is a fixed
//! signature, bits 0..2 give the count *k* of little-endian schema-version
//! bytes that follow, and bits 4..7 are reserved zero. Version 0 encodes as
//! the lone byte `0x08`; otherwise *k* is the smallest 1..=7 such that the
//! version fits in `8k` bits. Seven bytes bound the version below 2^56.

/// Signature plus reserved bit, checked on decode.
const SIGNATURE_MASK: u8 = 0x18;
const SIGNATURE: u8 = 0x08;
const VERSION_BYTES_MASK: u8 = 0x07;

/// Largest encodable schema version.
pub const MAX_VERSION: u64 = (1 << 56) - 1;

/// Number of version bytes needed for `version`. Panics above [`MAX_VERSION`].
pub(crate) fn version_bytes(version: u64) -> usize {
    assert!(
        version <= MAX_VERSION,
        "schema version {version} does not fit the 7-byte header limit"
    );
    if version == 0 {
        0
    } else {
        (64 - version.leading_zeros() as usize).div_ceil(8)
    }
}

/// Appends the header byte and version bytes to `buf`; returns the header
/// length (1..=8).
pub(crate) fn append_header(buf: &mut Vec<u8>, version: u64) -> usize {
    let k = version_bytes(version);
    buf.push(SIGNATURE | k as u8);
    buf.extend_from_slice(&version.to_le_bytes()[..k]);
    k + 1
}

/// Decodes `(header_len, version)` from the front of an encoded record.
/// Panics on a corrupt signature or a truncated header.
pub(crate) fn decode_header(buf: &[u8]) -> (usize, u64) {
    assert!(!buf.is_empty(), "empty record has no header");
    assert_eq!(
        buf[0] & SIGNATURE_MASK,
        SIGNATURE,
        "byte 0x{:02x} is not a row header",
        buf[0]
    );
    let k = (buf[0] & VERSION_BYTES_MASK) as usize;
    assert!(buf.len() > k, "record truncated inside the header");
    let mut version = 0u64;
    for (i, &b) in buf[1..=k].iter().enumerate() {
        version |= (b as u64) << (8 * i);
    }
    (k + 1, version)
}
