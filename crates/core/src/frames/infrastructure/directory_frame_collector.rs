use std::fs;
use std::path::{Path, PathBuf};

use crate::frames::domain::frame_collector::FrameCollector;
use crate::shared::constants::FRAME_EXTENSION;
use crate::shared::error::ConvertError;

/// Lists a single directory (non-recursive) for files with one extension.
///
/// The extension match is exact and case-sensitive: `frame_1.PPM` is not
/// a `ppm` frame.
pub struct DirectoryFrameCollector {
    extension: String,
}

impl DirectoryFrameCollector {
    pub fn new() -> Self {
        Self::with_extension(FRAME_EXTENSION)
    }

    pub fn with_extension(extension: impl Into<String>) -> Self {
        Self {
            extension: extension.into(),
        }
    }

    fn matches(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext == self.extension)
            .unwrap_or(false)
    }
}

impl Default for DirectoryFrameCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameCollector for DirectoryFrameCollector {
    fn collect(&self, dir: &Path) -> Result<Vec<PathBuf>, ConvertError> {
        let read_dir_error = |source| ConvertError::ReadDir {
            dir: dir.to_path_buf(),
            source,
        };

        let mut frames = Vec::new();
        for entry in fs::read_dir(dir).map_err(read_dir_error)? {
            let entry = entry.map_err(read_dir_error)?;
            let path = entry.path();
            if self.matches(&path) && path.is_file() {
                frames.push(path);
            }
        }

        if frames.is_empty() {
            return Err(ConvertError::NoFrames {
                dir: dir.to_path_buf(),
                extension: self.extension.clone(),
            });
        }

        log::debug!(
            "Found {} .{} frames in {}",
            frames.len(),
            self.extension,
            dir.display()
        );
        Ok(frames)
    }
}
