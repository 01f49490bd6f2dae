use std::io::{self, Write};

use hound::{SampleFormat, WavSpec};

use crate::pack::{pack_u16le, pack_u32le};
use crate::{CHANNELS, SAMPLE_RATE};

pub const HEADER_LEN: usize = 44;

/// Bytes of the RIFF chunk that follow its size field, excluding sample data.
const RIFF_OVERHEAD: u32 = HEADER_LEN as u32 - 8;
const FMT_CHUNK_LEN: u32 = 16;
const FORMAT_PCM: u16 = 1;

/// Format of everything this crate writes.
pub const FORMAT: WavSpec = WavSpec {
    channels: CHANNELS,
    sample_rate: SAMPLE_RATE,
    bits_per_sample: 16,
    sample_format: SampleFormat::Int,
};

#[derive(Debug, thiserror::Error)]
pub enum WavError {
    #[error("{frames} frames do not fit in a RIFF container")]
    TooLong { frames: u64 },

    #[error(transparent)]
    Io(#[from] io::Error),
}

/// A canonical 44-byte PCM header whose data length is fixed up front.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WavHeader {
    pub spec: WavSpec,
    pub data_len: u32,
}

impl WavHeader {
    pub fn for_frames(spec: WavSpec, total_frames: u64) -> Result<WavHeader, WavError> {
        let block_align = u64::from(spec.channels) * u64::from(spec.bits_per_sample / 8);
        let data_len = total_frames
            .checked_mul(block_align)
            .filter(|&len| len + u64::from(RIFF_OVERHEAD) <= u64::from(u32::MAX))
            .ok_or(WavError::TooLong { frames: total_frames })?;

        Ok(WavHeader {
            spec,
            data_len: data_len as u32,
        })
    }

    pub fn block_align(&self) -> u16 {
        self.spec.channels * (self.spec.bits_per_sample / 8)
    }

    pub fn byte_rate(&self) -> u32 {
        self.spec.sample_rate * u32::from(self.block_align())
    }

    pub fn riff_len(&self) -> u32 {
        self.data_len + RIFF_OVERHEAD
    }

    pub fn to_bytes(&self) -> [u8; HEADER_LEN] {
        let mut header = [0u8; HEADER_LEN];

        header[0..4].copy_from_slice(b"RIFF");
        pack_u32le(&mut header[4..8], self.riff_len());
        header[8..12].copy_from_slice(b"WAVE");

        header[12..16].copy_from_slice(b"fmt ");
        pack_u32le(&mut header[16..20], FMT_CHUNK_LEN);
        pack_u16le(&mut header[20..22], FORMAT_PCM);
        pack_u16le(&mut header[22..24], self.spec.channels);
        pack_u32le(&mut header[24..28], self.spec.sample_rate);
        pack_u32le(&mut header[28..32], self.byte_rate());
        pack_u16le(&mut header[32..34], self.block_align());
        pack_u16le(&mut header[34..36], self.spec.bits_per_sample);

        header[36..40].copy_from_slice(b"data");
        pack_u32le(&mut header[40..44], self.data_len);

        header
    }
}

pub fn write_header<W: Write>(w: &mut W, header: &WavHeader) -> Result<(), WavError> {
    w.write_all(&header.to_bytes())?;
    Ok(())
}

/// Appends packed sample bytes. A short write is an error, not a retry.
pub fn write_frames<W: Write>(w: &mut W, bytes: &[u8]) -> Result<(), WavError> {
    w.write_all(bytes)?;
    Ok(())
}
