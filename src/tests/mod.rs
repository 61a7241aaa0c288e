//! Integration tests
//!
//! End-to-end transcodes of synthesized WAV files.

pub mod e2e;
pub mod fixtures;
