//! Sequence-numbered frame production
//!
//! The producer turns a tick (or a direct request) into one freshly
//! rendered frame. Production is pure computation; it never touches the
//! network or the filesystem, so a tick can invoke it inline.

use std::sync::atomic::{AtomicU64, Ordering};

use base64::engine::general_purpose;
use base64::Engine as _;
use bytes::Bytes;
use chrono::{DateTime, Utc};

use super::image::{encode_bmp, render_test_pattern};

/// Default frame width in pixels
pub const DEFAULT_FRAME_WIDTH: u32 = 400;
/// Default frame height in pixels
pub const DEFAULT_FRAME_HEIGHT: u32 = 300;
/// Largest encodable dimension
pub const MAX_FRAME_DIMENSION: u32 = 4096;

/// Error type for frame production
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProduceError {
    /// Dimensions are zero or exceed [`MAX_FRAME_DIMENSION`]
    InvalidDimensions { width: u32, height: u32 },
}

impl std::fmt::Display for ProduceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProduceError::InvalidDimensions { width, height } => {
                write!(f, "Invalid frame dimensions: {}x{}", width, height)
            }
        }
    }
}

impl std::error::Error for ProduceError {}

/// One unit of broadcast payload
///
/// Cheap to clone; the encoded image is reference-counted via `Bytes`.
#[derive(Debug, Clone)]
pub struct Frame {
    /// Generation sequence number, monotonically increasing per process.
    /// Used for human-readable naming only, not an ordering guarantee.
    pub seq: u64,
    /// Human-readable frame name embedding the sequence number
    pub name: String,
    /// Encoded image bytes
    pub data: Bytes,
    /// Image width in pixels
    pub width: u32,
    /// Image height in pixels
    pub height: u32,
    /// Generation timestamp
    pub timestamp: DateTime<Utc>,
}

impl Frame {
    /// File-style image name
    pub fn image_name(&self) -> String {
        format!("{}.bmp", self.name)
    }

    /// Image bytes as base64 text, the form that crosses the wire
    pub fn data_base64(&self) -> String {
        general_purpose::STANDARD.encode(&self.data)
    }
}

/// Generates frames on demand
///
/// Stateless apart from the sequence counter, which advances on every
/// successful production; scheduler ticks and direct requests share it.
pub struct FrameProducer {
    width: u32,
    height: u32,
    next_seq: AtomicU64,
}

impl FrameProducer {
    /// Create a producer with the default 400x300 dimensions
    pub fn new() -> Self {
        Self::with_dimensions(DEFAULT_FRAME_WIDTH, DEFAULT_FRAME_HEIGHT)
    }

    /// Create a producer with custom dimensions
    ///
    /// Dimensions are validated at production time, so a misconfigured
    /// producer skips ticks instead of failing construction.
    pub fn with_dimensions(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            next_seq: AtomicU64::new(0),
        }
    }

    /// Produce one frame
    pub fn produce(&self) -> Result<Frame, ProduceError> {
        if self.width == 0
            || self.height == 0
            || self.width > MAX_FRAME_DIMENSION
            || self.height > MAX_FRAME_DIMENSION
        {
            return Err(ProduceError::InvalidDimensions {
                width: self.width,
                height: self.height,
            });
        }

        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
        let pixels = render_test_pattern(self.width, self.height, seq);
        let data = encode_bmp(self.width, self.height, &pixels);

        Ok(Frame {
            seq,
            name: format!("frame_{}", seq),
            data,
            width: self.width,
            height: self.height,
            timestamp: Utc::now(),
        })
    }

    /// Next sequence number to be assigned
    pub fn sequence(&self) -> u64 {
        self.next_seq.load(Ordering::Relaxed)
    }
}

impl Default for FrameProducer {
    fn default() -> Self {
        Self::new()
    }
}
