use std::fmt;

use crate::shared::constants::DIVX_FOURCC;

/// Output video codec.
///
/// Only MPEG-4 Part 2 is produced; it is the codec behind the DivX
/// four-character code and plays in every common container.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Codec {
    #[default]
    Mpeg4,
}

impl Codec {
    /// Four-character code used to tag the stream in AVI containers.
    pub fn fourcc(self) -> [u8; 4] {
        match self {
            Codec::Mpeg4 => DIVX_FOURCC,
        }
    }

    /// Fourcc packed little-endian, as stored in a stream's codec tag.
    pub fn codec_tag(self) -> u32 {
        u32::from_le_bytes(self.fourcc())
    }
}

impl fmt::Display for Codec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Codec::Mpeg4 => f.write_str("mpeg4"),
        }
    }
}

/// Parameters a video writer is opened with.
#[derive(Clone, Debug, PartialEq)]
pub struct VideoMetadata {
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    pub total_frames: usize,
    pub codec: Codec,
}
