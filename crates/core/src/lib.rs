//! Stitches a directory of numbered still frames (`name_<index>.ppm`) into
//! a single video file.
//!
//! The crate is split the same way at every level: `domain` modules hold
//! the traits and pure logic, `infrastructure` modules implement them on
//! top of the filesystem, the `image` crate and FFmpeg.

pub mod frames;
pub mod pipeline;
pub mod shared;
pub mod video;
