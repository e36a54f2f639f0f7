use std::path::PathBuf;

use thiserror::Error;

/// Error type returned across infrastructure seams (decoders, writers).
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Everything that can stop a conversion run. None of these are recovered
/// from locally; the CLI reports them and exits non-zero.
#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("failed to read frame directory {dir}: {source}")]
    ReadDir {
        dir: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("no .{extension} frames found in {dir}")]
    NoFrames { dir: PathBuf, extension: String },
    #[error("frame name {path} does not end in _<index>")]
    FrameName { path: PathBuf },
    #[error("failed to decode frame {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: BoxError,
    },
    #[error("frame {path} is {width}x{height}, expected {expected_width}x{expected_height}")]
    FrameSize {
        path: PathBuf,
        width: u32,
        height: u32,
        expected_width: u32,
        expected_height: u32,
    },
    #[error("failed to open video writer for {path}: {source}")]
    OpenWriter {
        path: PathBuf,
        #[source]
        source: BoxError,
    },
    #[error("failed to write frame {path}: {source}")]
    WriteFrame {
        path: PathBuf,
        #[source]
        source: BoxError,
    },
    #[error("failed to finalize video {path}: {source}")]
    Finalize {
        path: PathBuf,
        #[source]
        source: BoxError,
    },
}
