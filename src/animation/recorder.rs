//! Animation recorder for capturing sketch frames.

use std::fs::File;
use std::io::{self, BufWriter, Seek, SeekFrom, Write};
use std::path::Path;

use super::FrameSource;
use super::format::{
    AnimationFlags, AnimationHeader, CompressionType, FrameIndex, compress_lz4, encode_channel,
};

/// Configuration for animation recording.
#[derive(Debug, Clone)]
pub struct RecorderConfig {
    /// Compression type to use.
    pub compression: CompressionType,
    /// Record every Nth frame (1 = every frame).
    pub frame_skip: u32,
    /// Maximum frames to record (0 = unlimited).
    pub max_frames: u64,
    /// Playback interval stored in the header.
    pub seconds_per_frame: f32,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            compression: CompressionType::None,
            frame_skip: 1,
            max_frames: 0,
            seconds_per_frame: 1.0 / 60.0,
        }
    }
}

/// Animation recorder that captures grid frames to a `.skan` file.
///
/// Usage:
/// ```ignore
/// let mut recorder = AnimationRecorder::create("out.skan", &state, Default::default())?;
/// for _ in 0..600 {
///     propagator.frame(&mut state);
///     recorder.record_frame(&state)?;
/// }
/// recorder.finalize()?;
/// ```
pub struct AnimationRecorder {
    writer: BufWriter<File>,
    header: AnimationHeader,
    frame_indices: Vec<FrameIndex>,
    config: RecorderConfig,
    frames_written: u64,
    step_counter: u32,
    encode_buffer: Vec<u8>,
}

impl AnimationRecorder {
    /// Create a recorder for frames of `width × height × channels`.
    pub fn new<P: AsRef<Path>>(
        path: P,
        width: usize,
        height: usize,
        channels: usize,
        config: RecorderConfig,
    ) -> io::Result<Self> {
        let mut writer = BufWriter::new(File::create(path)?);

        let header = AnimationHeader {
            width: width as u32,
            height: height as u32,
            channels: channels as u32,
            frame_count: 0,
            seconds_per_frame: config.seconds_per_frame,
            flags: AnimationFlags {
                compression: config.compression,
            },
        };

        // Placeholder; rewritten with the frame count on finalize.
        header.write_to(&mut writer)?;

        log::debug!(
            "Recording {}x{}x{} frames ({:?} compression)",
            width,
            height,
            channels,
            config.compression
        );

        Ok(Self {
            writer,
            encode_buffer: Vec::with_capacity(header.frame_size()),
            header,
            frame_indices: Vec::new(),
            config,
            frames_written: 0,
            step_counter: 0,
        })
    }

    /// Create a recorder shaped like `source`.
    pub fn create<P: AsRef<Path>, S: FrameSource + ?Sized>(
        path: P,
        source: &S,
        config: RecorderConfig,
    ) -> io::Result<Self> {
        let (width, height) = source.dimensions();
        Self::new(path, width, height, source.channels().len(), config)
    }

    /// Record a frame.
    ///
    /// Returns true if the frame was written (frames may be skipped per config).
    pub fn record_frame<S: FrameSource + ?Sized>(&mut self, source: &S) -> io::Result<bool> {
        self.step_counter += 1;
        if self.step_counter < self.config.frame_skip {
            return Ok(false);
        }
        self.step_counter = 0;

        if self.config.max_frames > 0 && self.frames_written >= self.config.max_frames {
            return Ok(false);
        }

        let (width, height) = source.dimensions();
        let channels = source.channels();
        if width as u32 != self.header.width
            || height as u32 != self.header.height
            || channels.len() as u32 != self.header.channels
        {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!(
                    "Frame shape {}x{}x{} does not match recording {}x{}x{}",
                    width,
                    height,
                    channels.len(),
                    self.header.width,
                    self.header.height,
                    self.header.channels
                ),
            ));
        }

        self.encode_buffer.clear();
        for channel in &channels {
            encode_channel(channel, &mut self.encode_buffer);
        }

        let offset = self.writer.stream_position()?;
        let size = match self.header.flags.compression {
            CompressionType::None => {
                self.writer.write_all(&self.encode_buffer)?;
                self.encode_buffer.len()
            }
            CompressionType::Lz4 => {
                let compressed = compress_lz4(&self.encode_buffer);
                self.writer.write_all(&compressed)?;
                compressed.len()
            }
        };

        self.frame_indices.push(FrameIndex {
            offset,
            size: size as u64,
        });
        self.frames_written += 1;

        Ok(true)
    }

    /// Finalize the animation file.
    ///
    /// Writes the trailing frame index table and the final frame count.
    pub fn finalize(mut self) -> io::Result<AnimationStats> {
        let index_offset = self.writer.stream_position()?;
        for index in &self.frame_indices {
            index.write_to(&mut self.writer)?;
        }
        let total_bytes = self.writer.stream_position()?;

        self.header.frame_count = self.frames_written;
        self.writer.seek(SeekFrom::Start(0))?;
        self.header.write_to(&mut self.writer)?;
        self.writer.flush()?;

        let data_bytes = index_offset.saturating_sub(AnimationHeader::SIZE as u64);
        let stats = AnimationStats {
            frame_count: self.frames_written,
            total_bytes,
            average_frame_size: data_bytes.checked_div(self.frames_written).unwrap_or(0),
            compression: self.header.flags.compression,
        };
        log::info!("Recorded {}", stats);
        Ok(stats)
    }

    /// Number of frames recorded so far.
    pub fn frames_written(&self) -> u64 {
        self.frames_written
    }
}

/// Statistics from a recording session.
#[derive(Debug, Clone)]
pub struct AnimationStats {
    /// Total frames recorded.
    pub frame_count: u64,
    /// Total file size in bytes.
    pub total_bytes: u64,
    /// Average stored frame size.
    pub average_frame_size: u64,
    /// Compression used.
    pub compression: CompressionType,
}

impl std::fmt::Display for AnimationStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} frames, {} bytes total, {} bytes/frame avg ({:?} compression)",
            self.frame_count, self.total_bytes, self.average_frame_size, self.compression
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::GridFrame;
    use crate::compute::VantWorld;
    use crate::schema::{Seed, VantConfig};
    use std::fs;
    use tempfile::tempdir;

    fn frame() -> GridFrame {
        GridFrame::single(16, 8, (0..128).map(|i| i as f32).collect())
    }

    #[test]
    fn test_recorder_basic() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("basic.skan");

        let source = frame();
        let mut recorder = AnimationRecorder::create(&path, &source, Default::default()).unwrap();
        for _ in 0..10 {
            assert!(recorder.record_frame(&source).unwrap());
        }

        let stats = recorder.finalize().unwrap();
        assert_eq!(stats.frame_count, 10);
        assert_eq!(stats.average_frame_size, 128 * 4);
        let expected = (AnimationHeader::SIZE + 10 * 128 * 4 + 10 * FrameIndex::SIZE) as u64;
        assert_eq!(stats.total_bytes, expected);
        assert_eq!(fs::metadata(&path).unwrap().len(), expected);
    }

    #[test]
    fn test_recorder_frame_skip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("skip.skan");
        let config = RecorderConfig {
            frame_skip: 5,
            ..Default::default()
        };

        let source = frame();
        let mut recorder = AnimationRecorder::create(&path, &source, config).unwrap();
        // Frames 5, 10, 15, 20.
        for _ in 0..20 {
            recorder.record_frame(&source).unwrap();
        }
        assert_eq!(recorder.finalize().unwrap().frame_count, 4);
    }

    #[test]
    fn test_recorder_max_frames() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("max.skan");
        let config = RecorderConfig {
            max_frames: 5,
            ..Default::default()
        };

        let source = frame();
        let mut recorder = AnimationRecorder::create(&path, &source, config).unwrap();
        for _ in 0..100 {
            recorder.record_frame(&source).unwrap();
        }
        assert_eq!(recorder.finalize().unwrap().frame_count, 5);
    }

    #[test]
    fn test_shape_mismatch_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("shape.skan");

        let mut recorder = AnimationRecorder::create(&path, &frame(), Default::default()).unwrap();
        let other = GridFrame::zeros(16, 8, 2);
        let err = recorder.record_frame(&other).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }

    #[test]
    fn test_records_vant_world() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("vants.skan");
        let config = VantConfig::default();
        let world = VantWorld::from_seed(&Seed::default(), &config);

        let mut recorder = AnimationRecorder::create(&path, &world, Default::default()).unwrap();
        recorder.record_frame(&world).unwrap();
        let stats = recorder.finalize().unwrap();

        assert_eq!(stats.average_frame_size, (512 * 384 * 2 * 4) as u64);
    }
}
