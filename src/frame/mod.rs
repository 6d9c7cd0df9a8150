//! Frame generation
//!
//! This module provides:
//! - Test-pattern rasterization (flat field, rectangle, ellipse, sweep bar)
//! - Uncompressed 24-bit BMP encoding
//! - Sequence-numbered frame production

pub mod image;
pub mod producer;

pub use producer::{
    Frame, FrameProducer, ProduceError, DEFAULT_FRAME_HEIGHT, DEFAULT_FRAME_WIDTH,
    MAX_FRAME_DIMENSION,
};
