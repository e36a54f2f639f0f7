use std::path::PathBuf;
use std::time::Instant;

use crate::frames::domain::frame_collector::FrameCollector;
use crate::frames::domain::frame_orderer;
use crate::shared::constants::FRAME_EXTENSION;
use crate::shared::error::ConvertError;
use crate::shared::run_config::RunConfig;
use crate::shared::video_metadata::{Codec, VideoMetadata};
use crate::video::domain::frame_decoder::FrameDecoder;
use crate::video::domain::video_writer::VideoWriter;
use crate::video::domain::writer_session::WriterSession;

use super::pipeline_logger::PipelineLogger;

/// Outcome of a successful conversion.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConversionReport {
    pub output_path: PathBuf,
    pub frames_written: usize,
    pub width: u32,
    pub height: u32,
    pub fps: u32,
}

/// Frame directory -> video: collect -> order -> decode -> encode -> finalize.
///
/// Everything up to the first decode happens before the writer is opened,
/// so an empty directory or a badly named frame never creates the output
/// file. Once opened, the writer is finalized on every exit path.
pub struct ConvertFramesUseCase {
    collector: Box<dyn FrameCollector>,
    decoder: Box<dyn FrameDecoder>,
    writer: Box<dyn VideoWriter>,
    logger: Box<dyn PipelineLogger>,
    codec: Codec,
}

impl ConvertFramesUseCase {
    pub fn new(
        collector: Box<dyn FrameCollector>,
        decoder: Box<dyn FrameDecoder>,
        writer: Box<dyn VideoWriter>,
        logger: Box<dyn PipelineLogger>,
    ) -> Self {
        Self {
            collector,
            decoder,
            writer,
            logger,
            codec: Codec::default(),
        }
    }

    pub fn execute(&mut self, config: &RunConfig) -> Result<ConversionReport, ConvertError> {
        let paths = self.collector.collect(&config.input_dir)?;
        let files = frame_orderer::order(paths)?;
        let total = files.len();
        self.logger.info(&format!(
            "Converting {total} frames from {}",
            config.input_dir.display()
        ));

        let Some((first_file, rest)) = files.split_first() else {
            return Err(ConvertError::NoFrames {
                dir: config.input_dir.clone(),
                extension: FRAME_EXTENSION.to_string(),
            });
        };

        let decode_start = Instant::now();
        let first = self
            .decoder
            .decode(&first_file.path, 0)
            .map_err(|source| ConvertError::Decode {
                path: first_file.path.clone(),
                source,
            })?;
        self.logger
            .timing("decode", decode_start.elapsed().as_secs_f64() * 1000.0);

        let (width, height) = first.dimensions();
        let metadata = VideoMetadata {
            width,
            height,
            fps: config.fps,
            total_frames: total,
            codec: self.codec,
        };

        let mut session = WriterSession::open(&mut *self.writer, &config.output_path, &metadata)?;

        let encode_start = Instant::now();
        session.write(&first, &first_file.path)?;
        self.logger
            .timing("encode", encode_start.elapsed().as_secs_f64() * 1000.0);
        self.logger.progress(1, total);
        drop(first);

        for (offset, file) in rest.iter().enumerate() {
            let index = offset + 1;

            let decode_start = Instant::now();
            let frame = self
                .decoder
                .decode(&file.path, index)
                .map_err(|source| ConvertError::Decode {
                    path: file.path.clone(),
                    source,
                })?;
            self.logger
                .timing("decode", decode_start.elapsed().as_secs_f64() * 1000.0);

            let encode_start = Instant::now();
            session.write(&frame, &file.path)?;
            self.logger
                .timing("encode", encode_start.elapsed().as_secs_f64() * 1000.0);
            self.logger.progress(index + 1, total);
        }

        let frames_written = session.finish()?;
        self.logger.info(&format!(
            "Wrote {frames_written} frames ({width}x{height} @ {} fps) to {}",
            config.fps,
            config.output_path.display()
        ));
        self.logger.summary();

        Ok(ConversionReport {
            output_path: config.output_path.clone(),
            frames_written,
            width,
            height,
            fps: config.fps,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frames::infrastructure::directory_frame_collector::DirectoryFrameCollector;
    use crate::pipeline::pipeline_logger::NullPipelineLogger;
    use crate::shared::error::BoxError;
    use crate::shared::frame::Frame;
    use crate::video::infrastructure::ffmpeg_writer::FfmpegWriter;
    use crate::video::infrastructure::image_frame_decoder::ImageFrameDecoder;
    use std::collections::HashMap;
    use std::path::Path;
    use std::sync::{Arc, Mutex};

    // --- Stubs ---

    struct StubCollector {
        paths: Vec<PathBuf>,
    }

    impl StubCollector {
        fn new(names: &[&str]) -> Self {
            Self {
                paths: names.iter().map(PathBuf::from).collect(),
            }
        }
    }

    impl FrameCollector for StubCollector {
        fn collect(&self, dir: &Path) -> Result<Vec<PathBuf>, ConvertError> {
            if self.paths.is_empty() {
                return Err(ConvertError::NoFrames {
                    dir: dir.to_path_buf(),
                    extension: "ppm".to_string(),
                });
            }
            Ok(self.paths.clone())
        }
    }

    /// Produces frames whose first byte is the sort key, so the written
    /// order can be checked from the recorded pixel data.
    struct StubDecoder {
        sizes: HashMap<String, (u32, u32)>,
        fail_on: Option<String>,
        decoded: Arc<Mutex<Vec<String>>>,
    }

    impl StubDecoder {
        fn new() -> Self {
            Self {
                sizes: HashMap::new(),
                fail_on: None,
                decoded: Arc::new(Mutex::new(Vec::new())),
            }
        }
    }

    impl FrameDecoder for StubDecoder {
        fn decode(&self, path: &Path, index: usize) -> Result<Frame, BoxError> {
            let name = path.to_string_lossy().into_owned();
            self.decoded.lock().unwrap().push(name.clone());
            if self.fail_on.as_deref() == Some(name.as_str()) {
                return Err("corrupt frame".into());
            }
            let (w, h) = self.sizes.get(&name).copied().unwrap_or((4, 4));
            let key = crate::frames::domain::frame_file::sort_key(path).unwrap();
            let mut data = vec![0u8; (w * h * 3) as usize];
            data[0] = key as u8;
            Ok(Frame::new(data, w, h, 3, index))
        }
    }

    #[derive(Default)]
    struct WriterLog {
        opened: Option<VideoMetadata>,
        keys: Vec<u8>,
        indices: Vec<usize>,
        closes: usize,
    }

    struct RecordingWriter {
        log: Arc<Mutex<WriterLog>>,
    }

    impl RecordingWriter {
        fn new() -> Self {
            Self {
                log: Arc::new(Mutex::new(WriterLog::default())),
            }
        }
    }

    impl VideoWriter for RecordingWriter {
        fn open(&mut self, _path: &Path, metadata: &VideoMetadata) -> Result<(), BoxError> {
            self.log.lock().unwrap().opened = Some(metadata.clone());
            Ok(())
        }

        fn write(&mut self, frame: &Frame) -> Result<(), BoxError> {
            let mut log = self.log.lock().unwrap();
            log.keys.push(frame.data()[0]);
            log.indices.push(frame.index());
            Ok(())
        }

        fn close(&mut self) -> Result<(), BoxError> {
            self.log.lock().unwrap().closes += 1;
            Ok(())
        }
    }

    // --- Helpers ---

    fn config() -> RunConfig {
        RunConfig::new("frames", "out.avi", 24)
    }

    fn use_case(
        collector: StubCollector,
        decoder: StubDecoder,
        writer: RecordingWriter,
    ) -> ConvertFramesUseCase {
        ConvertFramesUseCase::new(
            Box::new(collector),
            Box::new(decoder),
            Box::new(writer),
            Box::new(NullPipelineLogger),
        )
    }

    // --- Tests ---

    #[test]
    fn test_writes_frames_in_numeric_order() {
        let writer = RecordingWriter::new();
        let log = writer.log.clone();

        let report = use_case(
            StubCollector::new(&["frame_2.ppm", "frame_10.ppm", "frame_1.ppm"]),
            StubDecoder::new(),
            writer,
        )
        .execute(&config())
        .unwrap();

        assert_eq!(report.frames_written, 3);
        let log = log.lock().unwrap();
        assert_eq!(log.keys, vec![1, 2, 10]);
        assert_eq!(log.indices, vec![0, 1, 2]);
        assert_eq!(log.closes, 1);
    }

    #[test]
    fn test_writer_opened_with_first_frame_size_and_fps() {
        let writer = RecordingWriter::new();
        let log = writer.log.clone();
        let mut decoder = StubDecoder::new();
        decoder.sizes.insert("clip_0.ppm".to_string(), (640, 480));
        decoder.sizes.insert("clip_1.ppm".to_string(), (640, 480));

        let report = use_case(
            StubCollector::new(&["clip_1.ppm", "clip_0.ppm"]),
            decoder,
            writer,
        )
        .execute(&config())
        .unwrap();

        let opened = log.lock().unwrap().opened.clone().unwrap();
        assert_eq!((opened.width, opened.height), (640, 480));
        assert_eq!(opened.fps, 24);
        assert_eq!(opened.total_frames, 2);
        assert_eq!(opened.codec, Codec::Mpeg4);
        assert_eq!((report.width, report.height, report.fps), (640, 480, 24));
    }

    #[test]
    fn test_first_frame_decoded_once() {
        let decoder = StubDecoder::new();
        let decoded = decoder.decoded.clone();

        use_case(
            StubCollector::new(&["a_0.ppm", "a_1.ppm", "a_2.ppm"]),
            decoder,
            RecordingWriter::new(),
        )
        .execute(&config())
        .unwrap();

        assert_eq!(
            *decoded.lock().unwrap(),
            vec!["a_0.ppm", "a_1.ppm", "a_2.ppm"]
        );
    }

    #[test]
    fn test_no_frames_never_opens_writer() {
        let writer = RecordingWriter::new();
        let log = writer.log.clone();

        let err = use_case(StubCollector::new(&[]), StubDecoder::new(), writer)
            .execute(&config())
            .unwrap_err();

        assert!(matches!(err, ConvertError::NoFrames { .. }));
        let log = log.lock().unwrap();
        assert!(log.opened.is_none());
        assert_eq!(log.closes, 0);
    }

    #[test]
    fn test_bad_name_fails_before_open() {
        let writer = RecordingWriter::new();
        let log = writer.log.clone();
        let decoder = StubDecoder::new();
        let decoded = decoder.decoded.clone();

        let err = use_case(
            StubCollector::new(&["frame_1.ppm", "frame_final.ppm", "frame_2.ppm"]),
            decoder,
            writer,
        )
        .execute(&config())
        .unwrap_err();

        assert!(matches!(err, ConvertError::FrameName { .. }));
        assert!(decoded.lock().unwrap().is_empty());
        assert!(log.lock().unwrap().opened.is_none());
    }

    #[test]
    fn test_first_frame_decode_error_never_opens_writer() {
        let writer = RecordingWriter::new();
        let log = writer.log.clone();
        let mut decoder = StubDecoder::new();
        decoder.fail_on = Some("a_0.ppm".to_string());

        let err = use_case(
            StubCollector::new(&["a_0.ppm", "a_1.ppm"]),
            decoder,
            writer,
        )
        .execute(&config())
        .unwrap_err();

        assert!(matches!(err, ConvertError::Decode { ref path, .. } if path == Path::new("a_0.ppm")));
        assert!(log.lock().unwrap().opened.is_none());
    }

    #[test]
    fn test_later_decode_error_aborts_and_finalizes() {
        let writer = RecordingWriter::new();
        let log = writer.log.clone();
        let mut decoder = StubDecoder::new();
        decoder.fail_on = Some("a_1.ppm".to_string());
        let decoded = decoder.decoded.clone();

        let err = use_case(
            StubCollector::new(&["a_0.ppm", "a_1.ppm", "a_2.ppm"]),
            decoder,
            writer,
        )
        .execute(&config())
        .unwrap_err();

        assert!(matches!(err, ConvertError::Decode { ref path, .. } if path == Path::new("a_1.ppm")));
        assert_eq!(*decoded.lock().unwrap(), vec!["a_0.ppm", "a_1.ppm"]);
        let log = log.lock().unwrap();
        assert_eq!(log.keys, vec![0]);
        assert_eq!(log.closes, 1);
    }

    #[test]
    fn test_resolution_change_is_fatal_and_finalizes() {
        let writer = RecordingWriter::new();
        let log = writer.log.clone();
        let mut decoder = StubDecoder::new();
        decoder.sizes.insert("a_0.ppm".to_string(), (640, 480));
        decoder.sizes.insert("a_1.ppm".to_string(), (320, 240));

        let err = use_case(
            StubCollector::new(&["a_0.ppm", "a_1.ppm", "a_2.ppm"]),
            decoder,
            writer,
        )
        .execute(&config())
        .unwrap_err();

        assert!(matches!(
            err,
            ConvertError::FrameSize {
                width: 320,
                height: 240,
                expected_width: 640,
                expected_height: 480,
                ..
            }
        ));
        let log = log.lock().unwrap();
        assert_eq!(log.keys, vec![0]);
        assert_eq!(log.closes, 1);
    }

    // --- End to end through the image crate and ffmpeg ---

    fn write_frames(dir: &Path, names: &[&str], width: u32, height: u32) {
        for (i, name) in names.iter().enumerate() {
            let shade = (i * 60) as u8;
            image::RgbImage::from_pixel(width, height, image::Rgb([shade, 128, 255 - shade]))
                .save(dir.join(name))
                .unwrap();
        }
    }

    fn real_use_case() -> ConvertFramesUseCase {
        ConvertFramesUseCase::new(
            Box::new(DirectoryFrameCollector::new()),
            Box::new(ImageFrameDecoder::new()),
            Box::new(FfmpegWriter::new()),
            Box::new(NullPipelineLogger),
        )
    }

    /// What a written file decodes back to: stream rate and the mean luma
    /// of every frame in presentation order.
    struct DecodedVideo {
        fps: f64,
        lumas: Vec<f64>,
    }

    fn mean_luma(frame: &ffmpeg_next::util::frame::video::Video) -> f64 {
        let (width, height) = (frame.width() as usize, frame.height() as usize);
        let stride = frame.stride(0);
        let plane = frame.data(0);
        let total: u64 = (0..height)
            .flat_map(move |y| &plane[y * stride..y * stride + width])
            .map(|&v| v as u64)
            .sum();
        total as f64 / (width * height) as f64
    }

    fn decode_video(path: &Path) -> DecodedVideo {
        ffmpeg_next::init().unwrap();
        let mut ictx = ffmpeg_next::format::input(&path).unwrap();
        let stream = ictx
            .streams()
            .best(ffmpeg_next::media::Type::Video)
            .unwrap();
        let index = stream.index();
        let rate = stream.rate();
        let codec_ctx =
            ffmpeg_next::codec::context::Context::from_parameters(stream.parameters()).unwrap();
        let mut decoder = codec_ctx.decoder().video().unwrap();

        let mut lumas = Vec::new();
        let mut decoded = ffmpeg_next::util::frame::video::Video::empty();
        for (s, packet) in ictx.packets() {
            if s.index() == index {
                decoder.send_packet(&packet).unwrap();
                while decoder.receive_frame(&mut decoded).is_ok() {
                    lumas.push(mean_luma(&decoded));
                }
            }
        }
        decoder.send_eof().unwrap();
        while decoder.receive_frame(&mut decoded).is_ok() {
            lumas.push(mean_luma(&decoded));
        }
        DecodedVideo {
            fps: rate.numerator() as f64 / rate.denominator() as f64,
            lumas,
        }
    }

    #[test]
    fn test_end_to_end_three_clip_frames_at_24_fps() {
        let frames_dir = tempfile::tempdir().unwrap();
        let out_dir = tempfile::tempdir().unwrap();
        write_frames(
            frames_dir.path(),
            &["clip_0.ppm", "clip_1.ppm", "clip_2.ppm"],
            4,
            4,
        );
        let output = out_dir.path().join("clip.avi");

        let report = real_use_case()
            .execute(&RunConfig::new(frames_dir.path(), &output, 24))
            .unwrap();

        assert_eq!(report.frames_written, 3);
        assert_eq!((report.width, report.height), (4, 4));
        let video = decode_video(&output);
        assert_eq!(video.lumas.len(), 3);
        assert!((video.fps - 24.0).abs() < 1e-6, "fps was {}", video.fps);
    }

    #[test]
    fn test_end_to_end_empty_dir_creates_no_output() {
        let frames_dir = tempfile::tempdir().unwrap();
        let out_dir = tempfile::tempdir().unwrap();
        std::fs::write(frames_dir.path().join("readme.txt"), "no frames here").unwrap();
        let output = out_dir.path().join("empty.avi");

        let err = real_use_case()
            .execute(&RunConfig::new(frames_dir.path(), &output, 24))
            .unwrap_err();

        assert!(matches!(err, ConvertError::NoFrames { .. }));
        assert!(!output.exists());
    }

    #[test]
    fn test_end_to_end_bad_name_creates_no_output() {
        let frames_dir = tempfile::tempdir().unwrap();
        let out_dir = tempfile::tempdir().unwrap();
        write_frames(
            frames_dir.path(),
            &["frame_1.ppm", "frame_final.ppm"],
            4,
            4,
        );
        let output = out_dir.path().join("bad.avi");

        let err = real_use_case()
            .execute(&RunConfig::new(frames_dir.path(), &output, 24))
            .unwrap_err();

        assert!(matches!(err, ConvertError::FrameName { .. }));
        assert!(!output.exists());
    }

    #[test]
    fn test_end_to_end_rerun_is_repeatable() {
        let frames_dir = tempfile::tempdir().unwrap();
        let out_dir = tempfile::tempdir().unwrap();
        // Gray level rises with the key; written out of key order.
        let shades = [("s_3.ppm", 150u8), ("s_1.ppm", 30), ("s_20.ppm", 210), ("s_2.ppm", 90)];
        for (name, gray) in shades {
            image::RgbImage::from_pixel(16, 16, image::Rgb([gray, gray, gray]))
                .save(frames_dir.path().join(name))
                .unwrap();
        }
        let output = out_dir.path().join("again.avi");
        let config = RunConfig::new(frames_dir.path(), &output, 12);

        let first = real_use_case().execute(&config).unwrap();
        let first_video = decode_video(&output);
        let second = real_use_case().execute(&config).unwrap();
        let second_video = decode_video(&output);

        assert_eq!(first, second);
        assert_eq!(first_video.fps, second_video.fps);

        // BT.601 limited range: Y = 16 + 219 * gray / 255.
        let expected: Vec<f64> = [30.0, 90.0, 150.0, 210.0]
            .iter()
            .map(|gray| 16.0 + 219.0 * gray / 255.0)
            .collect();
        assert_eq!(first_video.lumas.len(), expected.len());
        for (got, want) in first_video.lumas.iter().zip(&expected) {
            assert!((got - want).abs() < 20.0, "luma {got} far from {want}");
        }
        assert!(first_video.lumas.windows(2).all(|w| w[0] < w[1]));

        let rounded = |lumas: &[f64]| lumas.iter().map(|l| l.round() as i64).collect::<Vec<_>>();
        assert_eq!(rounded(&first_video.lumas), rounded(&second_video.lumas));
    }
}
