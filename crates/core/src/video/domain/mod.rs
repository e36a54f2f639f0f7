pub mod frame_decoder;
pub mod video_writer;
pub mod writer_session;
