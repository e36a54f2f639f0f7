/// Extension of frame files picked up from the input directory.
pub const FRAME_EXTENSION: &str = "ppm";

/// Separates the frame index from the rest of the file stem.
pub const SORT_KEY_SEPARATOR: char = '_';

pub const DIVX_FOURCC: [u8; 4] = *b"DIVX";

/// Container extensions that get the DivX fourcc on the video stream.
pub const AVI_EXTENSIONS: &[&str] = &["avi"];

/// Emit a progress line every N frames.
pub const PROGRESS_THROTTLE_FRAMES: usize = 25;
