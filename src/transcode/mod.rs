//! Audio transcoding pipeline
//!
//! This module builds and runs the transcode topology:
//! - Audio decoder initialization from the source stream
//! - Resampling to the profile's rate and channel layout
//! - Rechunking PCM into encoder-sized frames
//! - AAC encoding and MPEG-4 muxing into the output file

pub mod decoder;
pub mod encoder;
pub mod fifo;
pub mod resampler;
pub mod topology;

pub use topology::{PipelineControl, Topology};
