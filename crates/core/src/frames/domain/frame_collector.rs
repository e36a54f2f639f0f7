use std::path::{Path, PathBuf};

use crate::shared::error::ConvertError;

/// Finds the frame files that make up a sequence.
///
/// Returns paths in no particular order; ordering is the orderer's job.
/// An empty result is an error, not an empty vector.
pub trait FrameCollector: Send {
    fn collect(&self, dir: &Path) -> Result<Vec<PathBuf>, ConvertError>;
}
