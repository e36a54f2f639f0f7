use std::path::Path;

use crate::shared::error::BoxError;
use crate::shared::frame::Frame;
use crate::video::domain::frame_decoder::FrameDecoder;

/// Decodes still images with the `image` crate and converts them to RGB8.
///
/// The format is detected from the file extension, so PPM/PGM/PBM and the
/// other formats `image` was built with all decode. Alpha is dropped and
/// grayscale is expanded to three channels.
pub struct ImageFrameDecoder;

impl ImageFrameDecoder {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ImageFrameDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameDecoder for ImageFrameDecoder {
    fn decode(&self, path: &Path, index: usize) -> Result<Frame, BoxError> {
        let img = image::open(path)?;
        log::trace!(
            "Decoded {} ({}x{}, {} channels)",
            path.display(),
            img.width(),
            img.height(),
            img.color().channel_count()
        );

        let rgb = img.into_rgb8();
        let (width, height) = rgb.dimensions();
        if width == 0 || height == 0 {
            return Err(format!("image has no pixels: {width}x{height}").into());
        }
        Ok(Frame::new(rgb.into_raw(), width, height, 3, index))
    }
}
