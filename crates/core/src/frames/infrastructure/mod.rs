pub mod directory_frame_collector;
