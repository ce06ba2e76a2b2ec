//! Animation recording and playback for grid sketches.
//!
//! Any state implementing [`FrameSource`] can be captured frame by frame and
//! replayed later as [`GridFrame`]s.
//!
//! # File Format
//!
//! The `.skan` (sketch animation) format:
//!
//! ```text
//! Header (48 bytes):
//!   Magic: "SKAN" (4 bytes)
//!   Version: u16
//!   Flags: u16 (compression)
//!   Width: u32
//!   Height: u32
//!   Channels: u32
//!   Frame count: u64
//!   Seconds per frame: f32
//!   Reserved: 16 bytes
//!
//! Frame data (variable):
//!   Each frame is channels * height * width * 4 bytes (f32, little-endian),
//!   optionally LZ4 compressed
//!
//! Frame index table (frame_count * 16 bytes, end of file):
//!   Offset: u64
//!   Stored size: u64
//! ```

mod format;
mod player;
mod recorder;
mod source;

pub use format::{
    ANIMATION_MAGIC, ANIMATION_VERSION, AnimationFlags, AnimationHeader, CompressionType,
    FrameIndex,
};
pub use player::{AnimationPlayer, FrameIterator};
pub use recorder::{AnimationRecorder, AnimationStats, RecorderConfig};
pub use source::{FrameSource, GridFrame};
