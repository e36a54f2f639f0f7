use std::path::{Path, PathBuf};

use crate::shared::constants::AVI_EXTENSIONS;
use crate::shared::error::BoxError;
use crate::shared::frame::Frame;
use crate::shared::video_metadata::{Codec, VideoMetadata};
use crate::video::domain::video_writer::VideoWriter;

/// Encodes RGB frames via ffmpeg-next (libavformat + libavcodec).
///
/// Output is MPEG-4 Part 2 in YUV420P; the container is picked from the
/// output file extension. AVI outputs are tagged `DIVX`.
pub struct FfmpegWriter {
    output_path: Option<PathBuf>,
    octx: Option<ffmpeg_next::format::context::Output>,
    encoder: Option<ffmpeg_next::codec::encoder::video::Encoder>,
    scaler: Option<ffmpeg_next::software::scaling::Context>,
    width: u32,
    height: u32,
    encoder_time_base: ffmpeg_next::Rational,
    stream_time_base: ffmpeg_next::Rational,
    frame_count: usize,
    video_stream_index: usize,
}

// Safety: FfmpegWriter is only used from a single thread at a time.
// The raw pointers inside ffmpeg types are not shared across threads.
unsafe impl Send for FfmpegWriter {}

impl FfmpegWriter {
    pub fn new() -> Self {
        Self {
            output_path: None,
            octx: None,
            encoder: None,
            scaler: None,
            width: 0,
            height: 0,
            encoder_time_base: ffmpeg_next::Rational(0, 1),
            stream_time_base: ffmpeg_next::Rational(0, 1),
            frame_count: 0,
            video_stream_index: 0,
        }
    }

    pub fn frame_count(&self) -> usize {
        self.frame_count
    }
}

impl Default for FfmpegWriter {
    fn default() -> Self {
        Self::new()
    }
}

fn codec_id(codec: Codec) -> ffmpeg_next::codec::Id {
    match codec {
        Codec::Mpeg4 => ffmpeg_next::codec::Id::MPEG4,
    }
}

fn is_avi(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| AVI_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Moves every packet the encoder has ready into the container.
fn drain_packets(
    encoder: &mut ffmpeg_next::codec::encoder::video::Encoder,
    octx: &mut ffmpeg_next::format::context::Output,
    stream_index: usize,
    encoder_time_base: ffmpeg_next::Rational,
    stream_time_base: ffmpeg_next::Rational,
) -> Result<(), BoxError> {
    let mut encoded = ffmpeg_next::Packet::empty();
    while encoder.receive_packet(&mut encoded).is_ok() {
        encoded.set_stream(stream_index);
        encoded.rescale_ts(encoder_time_base, stream_time_base);
        encoded.write_interleaved(octx)?;
    }
    Ok(())
}

impl VideoWriter for FfmpegWriter {
    fn open(&mut self, path: &Path, metadata: &VideoMetadata) -> Result<(), BoxError> {
        if self.encoder.is_some() {
            return Err("FfmpegWriter: already open".into());
        }
        if metadata.width == 0 || metadata.height == 0 {
            return Err(format!(
                "invalid resolution {}x{}",
                metadata.width, metadata.height
            )
            .into());
        }
        let fps = i32::try_from(metadata.fps)
            .ok()
            .filter(|fps| *fps > 0)
            .ok_or_else(|| format!("invalid frame rate {}", metadata.fps))?;

        ffmpeg_next::init()?;
        ffmpeg_next::util::log::set_level(ffmpeg_next::util::log::Level::Error);

        let mut octx = ffmpeg_next::format::output(path)?;

        let global_header = octx
            .format()
            .flags()
            .contains(ffmpeg_next::format::Flags::GLOBAL_HEADER);

        let codec = ffmpeg_next::encoder::find(codec_id(metadata.codec))
            .ok_or_else(|| format!("{} encoder not found", metadata.codec))?;

        let time_base = ffmpeg_next::Rational(1, fps);

        let mut ost = octx.add_stream(Some(codec))?;
        ost.set_time_base(time_base);
        ost.set_rate(ffmpeg_next::Rational(fps, 1));

        let mut encoder_ctx = ffmpeg_next::codec::context::Context::new_with_codec(codec)
            .encoder()
            .video()?;

        encoder_ctx.set_width(metadata.width);
        encoder_ctx.set_height(metadata.height);
        encoder_ctx.set_format(ffmpeg_next::format::Pixel::YUV420P);
        encoder_ctx.set_time_base(time_base);
        encoder_ctx.set_frame_rate(Some(ffmpeg_next::Rational(fps, 1)));

        if global_header {
            encoder_ctx.set_flags(ffmpeg_next::codec::Flags::GLOBAL_HEADER);
        }

        let encoder = encoder_ctx.open_with(ffmpeg_next::Dictionary::new())?;
        ost.set_parameters(&encoder);

        if is_avi(path) {
            unsafe {
                (*ost.parameters().as_mut_ptr()).codec_tag = metadata.codec.codec_tag();
            }
        }

        let video_stream_index = ost.index();

        octx.write_header()?;

        // The muxer may pick its own time base during write_header.
        let stream_time_base = octx
            .stream(video_stream_index)
            .ok_or("output stream missing after header")?
            .time_base();

        // RGB -> YUV
        let scaler = ffmpeg_next::software::scaling::Context::get(
            ffmpeg_next::format::Pixel::RGB24,
            metadata.width,
            metadata.height,
            ffmpeg_next::format::Pixel::YUV420P,
            metadata.width,
            metadata.height,
            ffmpeg_next::software::scaling::Flags::BILINEAR,
        )?;

        self.output_path = Some(path.to_path_buf());
        self.width = metadata.width;
        self.height = metadata.height;
        self.encoder_time_base = time_base;
        self.stream_time_base = stream_time_base;
        self.video_stream_index = video_stream_index;
        self.octx = Some(octx);
        self.encoder = Some(encoder);
        self.scaler = Some(scaler);
        self.frame_count = 0;

        Ok(())
    }

    fn write(&mut self, frame: &Frame) -> Result<(), BoxError> {
        let (Some(encoder), Some(scaler), Some(octx)) = (
            self.encoder.as_mut(),
            self.scaler.as_mut(),
            self.octx.as_mut(),
        ) else {
            return Err("FfmpegWriter: not opened".into());
        };

        if frame.dimensions() != (self.width, self.height) || frame.channels() != 3 {
            return Err(format!(
                "expected {}x{} RGB frame, got {}x{} with {} channels",
                self.width,
                self.height,
                frame.width(),
                frame.height(),
                frame.channels()
            )
            .into());
        }

        let mut rgb_frame = ffmpeg_next::util::frame::video::Video::new(
            ffmpeg_next::format::Pixel::RGB24,
            self.width,
            self.height,
        );

        // Copy pixel data, respecting stride
        let row_len = frame.row_len();
        let stride = rgb_frame.stride(0);
        let data = rgb_frame.data_mut(0);
        for (row, src_row) in frame.data().chunks_exact(row_len).enumerate() {
            let dst_start = row * stride;
            data[dst_start..dst_start + row_len].copy_from_slice(src_row);
        }

        let mut yuv_frame = ffmpeg_next::util::frame::video::Video::empty();
        scaler.run(&rgb_frame, &mut yuv_frame)?;
        yuv_frame.set_pts(Some(self.frame_count as i64));

        encoder.send_frame(&yuv_frame)?;
        drain_packets(
            encoder,
            octx,
            self.video_stream_index,
            self.encoder_time_base,
            self.stream_time_base,
        )?;

        self.frame_count += 1;
        Ok(())
    }

    fn close(&mut self) -> Result<(), BoxError> {
        // Release everything up front so a failed flush still leaves the
        // writer closed.
        let encoder = self.encoder.take();
        let octx = self.octx.take();
        self.scaler = None;

        if let (Some(mut encoder), Some(mut octx)) = (encoder, octx) {
            encoder.send_eof()?;
            drain_packets(
                &mut encoder,
                &mut octx,
                self.video_stream_index,
                self.encoder_time_base,
                self.stream_time_base,
            )?;
            octx.write_trailer()?;

            if let Some(path) = self.output_path.take() {
                log::debug!("Finalized {} ({} frames)", path.display(), self.frame_count);
            }
        }

        Ok(())
    }
}
