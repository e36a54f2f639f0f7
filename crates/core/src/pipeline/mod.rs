pub mod convert_frames_use_case;
pub mod pipeline_logger;
