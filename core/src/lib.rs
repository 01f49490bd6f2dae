pub mod decode;
pub mod engine;
mod error;
pub mod fade;
pub mod filter;
pub mod pack;
pub mod tag;
pub mod time;
pub mod wav;

pub use decode::{convert, Decoder, State, SUMMARY_TARGET};
pub use engine::{Frame, PostFilter, SynthesisEngine};
pub use error::Error;
pub use filter::SpcFilter;
pub use tag::Metadata;

/// Output rate of the S-DSP.
pub const SAMPLE_RATE: u32 = 32000;
pub const CHANNELS: u16 = 2;

/// Frames requested from the engine per pass.
pub const BLOCK_FRAMES: usize = 4096;

/// Bytes of one packed stereo frame.
pub const FRAME_BYTES: usize = 2 * CHANNELS as usize;

/// Gain the hardware itself applies.
pub const ACCURATE_AMP: u32 = 0x100;
pub const DEFAULT_AMP: u32 = 0x180;
