#[cfg(feature = "snes-spc")]
mod snes_spc;

#[cfg(feature = "snes-spc")]
pub use snes_spc::SnesSpc;

/// One stereo output frame.
///
/// The layout matches the interleaved `short` buffers that native engines
/// fill, so a `[Frame]` can be handed to them as `left, right, left, ...`.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Frame {
    pub left: i16,
    pub right: i16,
}

impl Frame {
    pub const SILENCE: Frame = Frame::new(0, 0);

    pub const fn new(left: i16, right: i16) -> Frame {
        Frame { left, right }
    }

    pub fn map(self, f: impl Fn(i16) -> i16) -> Frame {
        Frame::new(f(self.left), f(self.right))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("{0}")]
    Rejected(String),

    #[error("emulation failed: {0}")]
    Play(String),

    #[error("no synthesis engine in this build (enable the `snes-spc` feature)")]
    Unavailable,
}

/// An emulated SPC700 + S-DSP that renders a loaded state capture.
pub trait SynthesisEngine {
    /// Restores processor, DSP and RAM state from a raw `.spc` image.
    fn load(&mut self, image: &[u8]) -> Result<(), EngineError>;

    /// Zeroes the echo region so stale RAM is not played back as echo.
    fn clear_echo(&mut self);

    /// Fills `out` with the next `out.len()` frames.
    fn play(&mut self, out: &mut [Frame]) -> Result<(), EngineError>;
}

/// Output shaping applied to raw engine frames, in place.
pub trait PostFilter {
    fn clear(&mut self);

    /// `gain` is in units of 1/256; 256 leaves the level unchanged.
    fn set_gain(&mut self, gain: u32);

    fn run(&mut self, frames: &mut [Frame]);
}

impl<T: SynthesisEngine + ?Sized> SynthesisEngine for Box<T> {
    fn load(&mut self, image: &[u8]) -> Result<(), EngineError> {
        (**self).load(image)
    }

    fn clear_echo(&mut self) {
        (**self).clear_echo()
    }

    fn play(&mut self, out: &mut [Frame]) -> Result<(), EngineError> {
        (**self).play(out)
    }
}

impl<T: PostFilter + ?Sized> PostFilter for Box<T> {
    fn clear(&mut self) {
        (**self).clear()
    }

    fn set_gain(&mut self, gain: u32) {
        (**self).set_gain(gain)
    }

    fn run(&mut self, frames: &mut [Frame]) {
        (**self).run(frames)
    }
}

/// The engine this build was compiled with.
#[cfg(feature = "snes-spc")]
pub fn default_engine() -> Result<Box<dyn SynthesisEngine>, EngineError> {
    let spc = SnesSpc::new()?;
    Ok(Box::new(spc))
}

#[cfg(not(feature = "snes-spc"))]
pub fn default_engine() -> Result<Box<dyn SynthesisEngine>, EngineError> {
    Err(EngineError::Unavailable)
}
