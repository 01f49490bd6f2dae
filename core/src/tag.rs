//! ID666 tags and their xid6 extension.
//!
//! Lengths are kept in ticks of 1/64000 s, twice the 32 kHz frame count.

const SIGNATURE: &[u8] = b"SNES-SPC700 Sound File Data";

/// Header, RAM, DSP registers and IPL ROM; xid6 data follows.
pub const SPC_BODY_LEN: usize = 0x10200;

const TAG_FLAG: usize = 0x23;
const TAG_PRESENT: u8 = 26;

const SONG: usize = 0x2E;
const GAME: usize = 0x4E;
const DUMPER: usize = 0x6E;
const COMMENT: usize = 0x7E;
const DATE: usize = 0x9E;
const PLAY_SECS: usize = 0xA9;
const FADE_MILLIS: usize = 0xAC;
const TEXT_ARTIST: usize = 0xB1;
const BINARY_ARTIST: usize = 0xB0;

pub const TICKS_PER_SECOND: u64 = 64000;
const TICKS_PER_MILLI: u64 = TICKS_PER_SECOND / 1000;
const DEFAULT_PLAY_SECS: u64 = 180;
const DEFAULT_FADE_MILLIS: u64 = 10_000;

#[derive(Debug, thiserror::Error)]
pub enum TagError {
    #[error("file is too short to be an SPC image ({0} bytes)")]
    Truncated(usize),

    #[error("missing SPC file signature")]
    BadSignature,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Metadata {
    pub song: String,
    pub game: String,
    pub artist: String,
    pub dumper: String,
    pub comment: String,
    pub publisher: String,
    pub year: u32,

    /// Playback before the fade starts, in ticks.
    pub play_len: u64,
    pub fade_len: u64,
    pub total_len: u64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Layout {
    Text,
    Binary,
}

impl Metadata {
    pub fn parse(image: &[u8]) -> Result<Metadata, TagError> {
        if image.len() < SPC_BODY_LEN {
            return Err(TagError::Truncated(image.len()));
        }
        if !image.starts_with(SIGNATURE) {
            return Err(TagError::BadSignature);
        }

        let mut meta = Metadata::default();
        let (secs, millis) = if image[TAG_FLAG] == TAG_PRESENT {
            meta.read_id666(image)
        } else {
            (0, 0)
        };

        let play_secs = if secs == 0 { DEFAULT_PLAY_SECS } else { secs };
        let fade_millis = if secs == 0 && millis == 0 {
            DEFAULT_FADE_MILLIS
        } else {
            millis
        };
        meta.play_len = play_secs * TICKS_PER_SECOND;
        meta.fade_len = fade_millis * TICKS_PER_MILLI;

        if let Some(chunk) = xid6_chunk(&image[SPC_BODY_LEN..]) {
            meta.read_xid6(chunk);
        }

        meta.total_len = meta.play_len + meta.fade_len;
        Ok(meta)
    }

    pub fn total_frames(&self) -> u64 {
        self.total_len / 2
    }

    pub fn play_frames(&self) -> u64 {
        self.play_len / 2
    }

    pub fn fade_frames(&self) -> u64 {
        self.fade_len / 2
    }

    /// Fills the text fields; returns the raw (seconds, fade millis) pair.
    fn read_id666(&mut self, image: &[u8]) -> (u64, u64) {
        self.song = text(&image[SONG..SONG + 32]);
        self.game = text(&image[GAME..GAME + 32]);
        self.dumper = text(&image[DUMPER..DUMPER + 16]);
        self.comment = text(&image[COMMENT..COMMENT + 32]);

        match detect_layout(image) {
            Layout::Text => {
                self.artist = text(&image[TEXT_ARTIST..TEXT_ARTIST + 32]);
                self.year = text_year(&image[DATE..DATE + 11]);
                (
                    ascii_number(&image[PLAY_SECS..PLAY_SECS + 3]),
                    ascii_number(&image[FADE_MILLIS..FADE_MILLIS + 5]),
                )
            }
            Layout::Binary => {
                self.artist = text(&image[BINARY_ARTIST..BINARY_ARTIST + 32]);
                self.year = u32::from(u16::from_le_bytes([image[DATE + 2], image[DATE + 3]]));
                (
                    le_uint(&image[PLAY_SECS..PLAY_SECS + 3]),
                    le_uint(&image[FADE_MILLIS..FADE_MILLIS + 4]),
                )
            }
        }
    }

    fn read_xid6(&mut self, mut data: &[u8]) {
        let mut intro = None;
        let mut looped = None;
        let mut end = None;
        let mut loop_count = 1u64;

        while let Some((sub, rest)) = SubChunk::split(data) {
            data = rest;
            match sub.id {
                0x01 => self.song = text(sub.data),
                0x02 => self.game = text(sub.data),
                0x03 => self.artist = text(sub.data),
                0x04 => self.dumper = text(sub.data),
                0x05 => self.year = sub.int() / 10_000,
                0x07 => self.comment = text(sub.data),
                0x13 => self.publisher = text(sub.data),
                0x14 => self.year = sub.int(),
                0x30 => intro = Some(u64::from(sub.int())),
                0x31 => looped = Some(u64::from(sub.int())),
                0x32 => end = Some(u64::from(sub.int())),
                0x33 => self.fade_len = u64::from(sub.int()),
                0x35 => loop_count = u64::from(sub.int()).max(1),
                id => log::debug!("xid6: skipping subchunk {:02x}", id),
            }
        }

        if intro.is_some() || looped.is_some() || end.is_some() {
            self.play_len =
                intro.unwrap_or(0) + looped.unwrap_or(0) * loop_count + end.unwrap_or(0);
        }
    }
}

struct SubChunk<'a> {
    id: u8,
    kind: u8,
    len: u16,
    data: &'a [u8],
}

impl<'a> SubChunk<'a> {
    /// Splits one subchunk off `data`; `None` once nothing complete is left.
    fn split(data: &'a [u8]) -> Option<(SubChunk<'a>, &'a [u8])> {
        let header = data.get(..4)?;
        let (id, kind) = (header[0], header[1]);
        let len = u16::from_le_bytes([header[2], header[3]]);
        let rest = &data[4..];

        // type 0 keeps its value in the length field
        if kind == 0 {
            return Some((SubChunk { id, kind, len, data: &[] }, rest));
        }

        let size = usize::from(len);
        let body = rest.get(..size)?;
        let padded = (size + 3) & !3;
        let rest = rest.get(padded..).unwrap_or(&[]);
        Some((SubChunk { id, kind, len, data: body }, rest))
    }

    fn int(&self) -> u32 {
        if self.kind == 0 {
            u32::from(self.len)
        } else {
            le_uint(&self.data[..self.data.len().min(4)]) as u32
        }
    }
}

fn xid6_chunk(trailer: &[u8]) -> Option<&[u8]> {
    if !trailer.starts_with(b"xid6") {
        return None;
    }
    let size = u32::from_le_bytes(trailer.get(4..8)?.try_into().ok()?) as usize;
    let body = &trailer[8..];
    if body.len() < size {
        log::warn!("xid6 chunk truncated: {} of {} bytes", body.len(), size);
    }
    Some(&body[..size.min(body.len())])
}

/// Text dumpers write ASCII digits (or nothing) where binary ones write
/// raw integers; a separator in the date is the strongest hint.
fn detect_layout(image: &[u8]) -> Layout {
    let date = &image[DATE..PLAY_SECS];
    let lengths = &image[PLAY_SECS..TEXT_ARTIST];
    let digit_or_nul = |b: &u8| *b == 0 || b.is_ascii_digit();

    let date_is_text = date
        .iter()
        .all(|b| digit_or_nul(b) || *b == b'/' || *b == b'-');
    if date_is_text && lengths.iter().all(digit_or_nul) {
        Layout::Text
    } else {
        Layout::Binary
    }
}

fn text(raw: &[u8]) -> String {
    let end = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
    String::from_utf8_lossy(&raw[..end]).trim_end().to_owned()
}

fn ascii_number(raw: &[u8]) -> u64 {
    raw.iter()
        .take_while(|b| b.is_ascii_digit())
        .fold(0, |n, b| n * 10 + u64::from(b - b'0'))
}

fn le_uint(raw: &[u8]) -> u64 {
    raw.iter()
        .rev()
        .fold(0, |n, &b| (n << 8) | u64::from(b))
}

/// Accepts `MM/DD/YYYY`, `YYYY-MM-DD` and similar; the year is the
/// four-digit field.
fn text_year(raw: &[u8]) -> u32 {
    text(raw)
        .split(|c: char| c == '/' || c == '-')
        .find(|part| part.len() == 4 && part.bytes().all(|b| b.is_ascii_digit()))
        .and_then(|year| year.parse().ok())
        .unwrap_or(0)
}
