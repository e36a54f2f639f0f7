use std::path::{Path, PathBuf};

use super::video_writer::VideoWriter;
use crate::shared::error::ConvertError;
use crate::shared::frame::Frame;
use crate::shared::video_metadata::VideoMetadata;

/// An opened [`VideoWriter`] that is closed exactly once.
///
/// A session only exists after a successful `open`, so a writer can never
/// be closed without having been opened. [`WriterSession::finish`] closes
/// it and reports close errors; if the session is dropped before that
/// (an earlier frame failed), `Drop` closes it and logs the outcome.
///
/// Frames must all match the resolution the session was opened with.
pub struct WriterSession<'a, W: VideoWriter + ?Sized> {
    writer: &'a mut W,
    path: PathBuf,
    width: u32,
    height: u32,
    frames_written: usize,
    finalized: bool,
}

impl<'a, W: VideoWriter + ?Sized> WriterSession<'a, W> {
    pub fn open(
        writer: &'a mut W,
        path: &Path,
        metadata: &VideoMetadata,
    ) -> Result<Self, ConvertError> {
        writer
            .open(path, metadata)
            .map_err(|source| ConvertError::OpenWriter {
                path: path.to_path_buf(),
                source,
            })?;

        log::debug!(
            "Opened {} writer for {} ({}x{} @ {} fps)",
            metadata.codec,
            path.display(),
            metadata.width,
            metadata.height,
            metadata.fps
        );

        Ok(Self {
            writer,
            path: path.to_path_buf(),
            width: metadata.width,
            height: metadata.height,
            frames_written: 0,
            finalized: false,
        })
    }

    /// Appends one frame. `source` names the file the frame came from and
    /// is only used for error reporting.
    pub fn write(&mut self, frame: &Frame, source: &Path) -> Result<(), ConvertError> {
        if frame.dimensions() != (self.width, self.height) {
            return Err(ConvertError::FrameSize {
                path: source.to_path_buf(),
                width: frame.width(),
                height: frame.height(),
                expected_width: self.width,
                expected_height: self.height,
            });
        }

        self.writer
            .write(frame)
            .map_err(|source_err| ConvertError::WriteFrame {
                path: source.to_path_buf(),
                source: source_err,
            })?;
        self.frames_written += 1;
        Ok(())
    }

    pub fn frames_written(&self) -> usize {
        self.frames_written
    }

    /// Closes the writer and returns the number of frames written.
    pub fn finish(mut self) -> Result<usize, ConvertError> {
        self.finalized = true;
        self.writer
            .close()
            .map_err(|source| ConvertError::Finalize {
                path: self.path.clone(),
                source,
            })?;
        Ok(self.frames_written)
    }
}

impl<W: VideoWriter + ?Sized> Drop for WriterSession<'_, W> {
    fn drop(&mut self) {
        if self.finalized {
            return;
        }
        self.finalized = true;
        match self.writer.close() {
            Ok(()) => log::warn!(
                "Closed {} early after {} frames",
                self.path.display(),
                self.frames_written
            ),
            Err(e) => log::warn!("Failed to close {}: {e}", self.path.display()),
        }
    }
}
