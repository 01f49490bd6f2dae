use std::fmt;

use crate::SAMPLE_RATE;

const FRAMES_PER_MILLI: u64 = SAMPLE_RATE as u64 / 1000;

/// A frame count displayed as `MM:SS.mmm`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameTime(pub u64);

impl fmt::Display for FrameTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let millis = self.0 / FRAMES_PER_MILLI;
        let secs = millis / 1000;
        write!(f, "{:02}:{:02}.{:03}", secs / 60, secs % 60, millis % 1000)
    }
}

pub fn frame_to_time(frames: u64) -> String {
    FrameTime(frames).to_string()
}
