pub mod frame_collector;
pub mod frame_file;
pub mod frame_orderer;
