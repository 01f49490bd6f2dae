use crate::engine::Frame;

/// Linearly ramps the stream tail to silence.
///
/// `frames_remaining` counts the frames still to be produced, this block
/// included. The factor for a frame is its distance from the end of the
/// stream over `fade_frames`, so the last frame of the stream is scaled by
/// `1 / fade_frames` rather than forced to zero. Calling this block by block
/// gives the same result as one call over the whole stream.
///
/// When the window is longer than what remains, the ramp is already in
/// progress at the first frame and keeps the same slope.
pub fn fade_frames(frames: &mut [Frame], frames_remaining: u64, fade_frames: u64) {
    let count = frames.len() as u64;
    debug_assert!(count <= frames_remaining);

    if fade_frames == 0 || frames_remaining.saturating_sub(count) > fade_frames {
        return;
    }

    let start = frames_remaining.saturating_sub(fade_frames) as usize;
    let window = fade_frames as f64;

    for (i, frame) in frames.iter_mut().enumerate().skip(start) {
        let factor = frames_remaining.saturating_sub(i as u64) as f64 / window;
        *frame = frame.map(|s| (f64::from(s) * factor) as i16);
    }
}
