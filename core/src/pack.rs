use crate::engine::Frame;
use crate::FRAME_BYTES;

pub fn pack_i16le(dst: &mut [u8], n: i16) {
    dst[..2].copy_from_slice(&n.to_le_bytes());
}

pub fn pack_u16le(dst: &mut [u8], n: u16) {
    dst[..2].copy_from_slice(&n.to_le_bytes());
}

pub fn pack_u32le(dst: &mut [u8], n: u32) {
    dst[..4].copy_from_slice(&n.to_le_bytes());
}

/// Serializes `frames` as interleaved little-endian samples, left first.
///
/// `dst` must hold exactly `frames.len() * FRAME_BYTES` bytes.
pub fn pack_frames(dst: &mut [u8], frames: &[Frame]) {
    assert_eq!(dst.len(), frames.len() * FRAME_BYTES, "packed block size mismatch");

    for (bytes, frame) in dst.chunks_exact_mut(FRAME_BYTES).zip(frames) {
        let (left, right) = bytes.split_at_mut(2);
        pack_i16le(left, frame.left);
        pack_i16le(right, frame.right);
    }
}

/// Inverse of [`pack_frames`]; a trailing partial frame is ignored.
pub fn unpack_frames(src: &[u8]) -> Vec<Frame> {
    src.chunks_exact(FRAME_BYTES)
        .map(|bytes| {
            Frame::new(
                i16::from_le_bytes([bytes[0], bytes[1]]),
                i16::from_le_bytes([bytes[2], bytes[3]]),
            )
        })
        .collect()
}
