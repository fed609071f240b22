//! Payload chunking: bytes to 16-bit carrier values and back.
//!
//! Each chunk is CHUNK_SIZE bytes read big-endian. A payload whose length
//! is not a multiple of CHUNK_SIZE is right-padded with zero bytes, so
//! `chunk(p).len() == ceil(p.len() / CHUNK_SIZE)`.

/// Bytes carried by one packet's identifier field.
pub const CHUNK_SIZE: usize = 2;

/// Split a payload into big-endian u16 chunks, zero-padding the tail.
pub fn chunk(payload: &[u8]) -> Vec<u16> {
    payload
        .chunks(CHUNK_SIZE)
        .map(|c| match *c {
            [hi, lo] => u16::from_be_bytes([hi, lo]),
            [hi] => u16::from_be_bytes([hi, 0]),
            _ => unreachable!("chunks() yields 1..=CHUNK_SIZE bytes"),
        })
        .collect()
}

/// Expand chunks back into bytes. The result is always a multiple of
/// CHUNK_SIZE long; padding added by `chunk` is not removed.
pub fn unchunk(chunks: &[u16]) -> Vec<u8> {
    chunks.iter().flat_map(|c| c.to_be_bytes()).collect()
}

/// Trim trailing zero bytes. Validation compares payloads modulo padding.
pub fn strip_padding(bytes: &[u8]) -> &[u8] {
    let end = bytes.iter().rposition(|&b| b != 0).map_or(0, |i| i + 1);
    &bytes[..end]
}
