use std::path::Path;

use crate::shared::error::BoxError;
use crate::shared::frame::Frame;

/// Decodes one still image file into an RGB [`Frame`].
pub trait FrameDecoder: Send {
    /// `index` is the frame's position in the sorted sequence and is
    /// carried on the returned frame.
    fn decode(&self, path: &Path, index: usize) -> Result<Frame, BoxError>;
}
