use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::engine::{Frame, PostFilter, SynthesisEngine};
use crate::error::Error;
use crate::fade::fade_frames;
use crate::pack::pack_frames;
use crate::tag::Metadata;
use crate::time::FrameTime;
use crate::wav::{self, WavHeader};
use crate::{BLOCK_FRAMES, DEFAULT_AMP, FRAME_BYTES};

/// Log target of the run summary, so it can stay visible when other
/// messages are filtered out.
pub const SUMMARY_TARGET: &str = "spc2wav::summary";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum State {
    Init,
    HeaderWritten,
    Decoding,
    Done,
    Failed,
}

/// Drives an engine block by block into a WAV stream.
///
/// One sample block and one byte block are allocated up front and reused
/// for every pass.
pub struct Decoder<E, F> {
    engine: E,
    filter: F,
    amp: u32,
    state: State,
    frames: Vec<Frame>,
    bytes: Vec<u8>,
}

impl<E: SynthesisEngine, F: PostFilter> Decoder<E, F> {
    pub fn new(engine: E, filter: F, amp: u32) -> Decoder<E, F> {
        Decoder {
            engine,
            filter,
            amp,
            state: State::Init,
            frames: vec![Frame::SILENCE; BLOCK_FRAMES],
            bytes: vec![0; BLOCK_FRAMES * FRAME_BYTES],
        }
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn amp(&self) -> u32 {
        self.amp
    }

    /// Reads the tags and hands the image to the engine. The image is
    /// dropped once the engine has it.
    pub fn load(&mut self, image: Vec<u8>) -> Result<Metadata, Error> {
        let result = self.load_image(image);
        self.track(result)
    }

    fn load_image(&mut self, image: Vec<u8>) -> Result<Metadata, Error> {
        let metadata = Metadata::parse(&image)?;
        self.engine.load(&image).map_err(Error::EngineLoad)?;
        drop(image);
        Ok(metadata)
    }

    /// Writes a header for `total_frames`, then renders that many frames.
    pub fn run<W: Write>(&mut self, out: &mut W, total_frames: u64, fade: u64) -> Result<(), Error> {
        let result = self.render(out, total_frames, fade);
        self.track(result)
    }

    fn render<W: Write>(&mut self, out: &mut W, total_frames: u64, fade: u64) -> Result<(), Error> {
        let header = WavHeader::for_frames(wav::FORMAT, total_frames)?;

        self.engine.clear_echo();
        self.filter.clear();
        self.filter.set_gain(self.amp);

        wav::write_header(out, &header)?;
        self.state = State::HeaderWritten;
        log::debug!("header written: {} data bytes", header.data_len);

        let mut remaining = total_frames;
        while remaining > 0 {
            self.state = State::Decoding;

            let count = remaining.min(BLOCK_FRAMES as u64) as usize;
            let frames = &mut self.frames[..count];
            let bytes = &mut self.bytes[..count * FRAME_BYTES];

            self.engine.play(frames).map_err(Error::Engine)?;
            self.filter.run(frames);
            fade_frames(frames, remaining, fade);
            pack_frames(bytes, frames);
            wav::write_frames(out, bytes)?;

            remaining -= count as u64;
            log::debug!("block of {} frames, {} remaining", count, remaining);
        }

        self.state = State::Done;
        Ok(())
    }

    fn track<T>(&mut self, result: Result<T, Error>) -> Result<T, Error> {
        if result.is_err() {
            self.state = State::Failed;
        }
        result
    }
}

/// Renders the capture at `input` into a WAV file at `output`.
///
/// A failed run leaves whatever was already written in place.
pub fn convert<E, F>(input: &Path, output: &Path, decoder: &mut Decoder<E, F>) -> Result<Metadata, Error>
where
    E: SynthesisEngine,
    F: PostFilter,
{
    let image = fs::read(input).map_err(|source| Error::SourceRead {
        path: input.to_owned(),
        source,
    })?;
    let metadata = decoder.load(image)?;

    let file = File::create(output).map_err(|source| {
        decoder.state = State::Failed;
        Error::OutputOpen {
            path: output.to_owned(),
            source,
        }
    })?;
    let mut out = BufWriter::new(file);

    log_summary(input, output, decoder.amp(), &metadata);

    let at_output = |err: Error| match err {
        Error::Wav(source) => Error::OutputWrite {
            path: output.to_owned(),
            source,
        },
        err => err,
    };

    decoder
        .run(&mut out, metadata.total_frames(), metadata.fade_frames())
        .map_err(at_output)?;
    if let Err(err) = out.flush() {
        decoder.state = State::Failed;
        return Err(at_output(Error::Wav(err.into())));
    }

    log::info!(target: SUMMARY_TARGET, "Wrote {}", output.display());
    Ok(metadata)
}

fn log_summary(input: &Path, output: &Path, amp: u32, meta: &Metadata) {
    let kind = if amp == DEFAULT_AMP { "default" } else { "custom" };

    log::info!(target: SUMMARY_TARGET, "Decoding {} to {}", input.display(), output.display());
    log::info!(target: SUMMARY_TARGET, "Applying gain: 0x{:04x} ({})", amp, kind);
    log::info!(target: SUMMARY_TARGET, "Length: {}", FrameTime(meta.total_frames()));
    log::info!(target: SUMMARY_TARGET, "  Play length: {}", FrameTime(meta.play_frames()));
    log::info!(target: SUMMARY_TARGET, "  Fade length: {}", FrameTime(meta.fade_frames()));
    log::info!(target: SUMMARY_TARGET, "Title: {}", meta.song);
    log::info!(target: SUMMARY_TARGET, "Game: {}", meta.game);
    log::info!(target: SUMMARY_TARGET, "Artist: {}", meta.artist);
    log::info!(target: SUMMARY_TARGET, "Dumper: {}", meta.dumper);
    log::info!(target: SUMMARY_TARGET, "Comment: {}", meta.comment);
    log::info!(target: SUMMARY_TARGET, "Publisher: {}", meta.publisher);
    log::info!(target: SUMMARY_TARGET, "Year: {}", meta.year);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::EngineError;

    /// Counts up from 1 on the left, down from -1 on the right.
    #[derive(Default)]
    struct Counter {
        next: i16,
        echo_cleared: bool,
        requests: Vec<usize>,
    }

    impl SynthesisEngine for Counter {
        fn load(&mut self, _image: &[u8]) -> Result<(), EngineError> {
            Ok(())
        }

        fn clear_echo(&mut self) {
            self.echo_cleared = true;
        }

        fn play(&mut self, out: &mut [Frame]) -> Result<(), EngineError> {
            self.requests.push(out.len());
            for frame in out {
                self.next = self.next.wrapping_add(1);
                *frame = Frame::new(self.next, self.next.wrapping_neg());
            }
            Ok(())
        }
    }

    #[derive(Default)]
    struct Bypass {
        gain: Option<u32>,
    }

    impl PostFilter for Bypass {
        fn clear(&mut self) {}

        fn set_gain(&mut self, gain: u32) {
            self.gain = Some(gain);
        }

        fn run(&mut self, _frames: &mut [Frame]) {}
    }

    #[test]
    fn blocks_are_capped_at_4096_frames() {
        let mut decoder = Decoder::new(Counter::default(), Bypass::default(), 0x100);
        let mut out = Vec::new();
        decoder.run(&mut out, 10_000, 0).unwrap();

        assert_eq!(decoder.engine.requests, [4096, 4096, 1808]);
        assert!(decoder.engine.echo_cleared);
        assert_eq!(decoder.filter.gain, Some(0x100));
        assert_eq!(decoder.state(), State::Done);
        assert_eq!(out.len(), 44 + 10_000 * 4);
    }

    #[test]
    fn samples_stream_in_order() {
        let mut decoder = Decoder::new(Counter::default(), Bypass::default(), DEFAULT_AMP);
        let mut out = Vec::new();
        decoder.run(&mut out, 5000, 0).unwrap();

        let frames = crate::pack::unpack_frames(&out[44..]);
        assert_eq!(frames.len(), 5000);
        assert_eq!(frames[0], Frame::new(1, -1));
        assert_eq!(frames[4096], Frame::new(4097, -4097));
        assert_eq!(frames[4999], Frame::new(5000, -5000));
    }

    #[test]
    fn empty_stream_is_header_only() {
        let mut decoder = Decoder::new(Counter::default(), Bypass::default(), DEFAULT_AMP);
        let mut out = Vec::new();
        decoder.run(&mut out, 0, 0).unwrap();

        assert_eq!(out.len(), 44);
        assert!(decoder.engine.requests.is_empty());
        assert_eq!(decoder.state(), State::Done);
    }

    /// Accepts `limit` bytes, then reports a full device.
    struct Full {
        limit: usize,
    }

    impl Write for Full {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            if self.limit == 0 {
                return Err(std::io::Error::new(std::io::ErrorKind::Other, "no space left"));
            }
            let n = buf.len().min(self.limit);
            self.limit -= n;
            Ok(n)
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn write_failure_mid_stream_fails_decoder() {
        let mut decoder = Decoder::new(Counter::default(), Bypass::default(), DEFAULT_AMP);
        let mut out = Full { limit: 44 + 4096 * 4 };
        let err = decoder.run(&mut out, 10_000, 0).unwrap_err();

        assert!(matches!(err, Error::Wav(_)));
        assert_eq!(decoder.engine.requests, [4096, 4096]);
        assert_eq!(decoder.state(), State::Failed);
    }

    #[test]
    fn rejected_image_fails_decoder() {
        let mut decoder = Decoder::new(Counter::default(), Bypass::default(), DEFAULT_AMP);
        let err = decoder.load(vec![0; 16]).unwrap_err();

        assert!(matches!(err, Error::Metadata(_)));
        assert_eq!(decoder.state(), State::Failed);
    }
}
