use std::path::PathBuf;
use std::process;

use clap::Parser;

use ppmreel_core::frames::infrastructure::directory_frame_collector::DirectoryFrameCollector;
use ppmreel_core::pipeline::convert_frames_use_case::ConvertFramesUseCase;
use ppmreel_core::pipeline::pipeline_logger::StdoutPipelineLogger;
use ppmreel_core::shared::run_config::RunConfig;
use ppmreel_core::video::infrastructure::ffmpeg_writer::FfmpegWriter;
use ppmreel_core::video::infrastructure::image_frame_decoder::ImageFrameDecoder;

/// Stitch numbered PPM frames (`name_<index>.ppm`) into a video.
#[derive(Parser, Debug)]
#[command(name = "ppmreel", version)]
struct Cli {
    /// Directory holding the frames, relative to the working directory.
    image_path: PathBuf,

    /// Output video file; the container follows the extension (e.g. .avi, .mp4).
    video_path: PathBuf,

    /// Frames per second.
    #[arg(value_parser = clap::value_parser!(u32).range(1..))]
    fps: u32,
}

impl Cli {
    fn into_config(self) -> RunConfig {
        RunConfig::new(self.image_path, self.video_path, self.fps)
    }
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let cwd = std::env::current_dir()?;
    let config = cli.into_config().resolve(&cwd);
    log::debug!("{config:?}");

    let mut use_case = ConvertFramesUseCase::new(
        Box::new(DirectoryFrameCollector::new()),
        Box::new(ImageFrameDecoder::new()),
        Box::new(FfmpegWriter::new()),
        Box::new(StdoutPipelineLogger::default()),
    );
    let report = use_case.execute(&config)?;

    log::info!(
        "Output written to {} ({} frames)",
        report.output_path.display(),
        report.frames_written
    );
    Ok(())
}
