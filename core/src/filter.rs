use crate::engine::{Frame, PostFilter};

const GAIN_BITS: u32 = 8;
pub const GAIN_UNIT: u32 = 1 << GAIN_BITS;
const BASS_NORM: u32 = 8;

#[derive(Clone, Copy, Debug, Default)]
struct Channel {
    p1: i64,
    pp1: i64,
    sum: i64,
}

impl Channel {
    fn step(&mut self, x: i16, gain: i64) -> i16 {
        let x = i64::from(x);

        // low-pass: two-tap FIR, coefficients 0.25 and 0.75
        let f = x + self.p1;
        self.p1 = x * 3;

        // high-pass: leaky integrator
        let delta = f - self.pp1;
        self.pp1 = f;
        let s = self.sum >> (GAIN_BITS + 2);
        self.sum += delta * gain - (self.sum >> BASS_NORM);

        s.clamp(i64::from(i16::MIN), i64::from(i16::MAX)) as i16
    }
}

/// The output filter SNES players put after the DSP: removes DC, softens
/// the top end a little and applies gain.
#[derive(Clone, Debug)]
pub struct SpcFilter {
    gain: i64,
    left: Channel,
    right: Channel,
}

impl SpcFilter {
    pub fn new() -> SpcFilter {
        SpcFilter {
            gain: i64::from(GAIN_UNIT),
            left: Channel::default(),
            right: Channel::default(),
        }
    }
}

impl Default for SpcFilter {
    fn default() -> SpcFilter {
        SpcFilter::new()
    }
}

impl PostFilter for SpcFilter {
    fn clear(&mut self) {
        self.left = Channel::default();
        self.right = Channel::default();
    }

    fn set_gain(&mut self, gain: u32) {
        self.gain = i64::from(gain);
    }

    fn run(&mut self, frames: &mut [Frame]) {
        let gain = self.gain;
        for frame in frames {
            frame.left = self.left.step(frame.left, gain);
            frame.right = self.right.step(frame.right, gain);
        }
    }
}
