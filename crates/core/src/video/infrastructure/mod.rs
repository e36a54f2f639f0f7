pub mod ffmpeg_writer;
pub mod image_frame_decoder;
