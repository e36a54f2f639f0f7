pub mod constants;
pub mod error;
pub mod frame;
pub mod run_config;
pub mod video_metadata;
