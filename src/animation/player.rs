//! Animation player for reading back recorded sketches.

use std::fs::File;
use std::io::{self, BufReader, Read, Seek, SeekFrom};
use std::path::Path;

use super::GridFrame;
use super::format::{AnimationHeader, CompressionType, FrameIndex, decode_channel, decompress_lz4};

/// Random-access reader for `.skan` files.
///
/// Usage:
/// ```ignore
/// let mut player = AnimationPlayer::open("out.skan")?;
/// let frame = player.read_frame(100)?;
/// for frame in player.frames() {
///     let frame = frame?;
/// }
/// ```
pub struct AnimationPlayer {
    reader: BufReader<File>,
    header: AnimationHeader,
    frame_indices: Vec<FrameIndex>,
    read_buffer: Vec<u8>,
}

impl AnimationPlayer {
    /// Open an animation file for playback.
    pub fn open<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let mut reader = BufReader::new(File::open(path)?);
        let header = AnimationHeader::read_from(&mut reader)?;

        // The index table sits at the end of the file.
        let file_len = reader.seek(SeekFrom::End(0))?;
        let index_start = header
            .frame_count
            .checked_mul(FrameIndex::SIZE as u64)
            .and_then(|index_size| file_len.checked_sub(index_size))
            .filter(|&start| start >= AnimationHeader::SIZE as u64)
            .ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!(
                        "File too short for {} frame index entries",
                        header.frame_count
                    ),
                )
            })?;
        reader.seek(SeekFrom::Start(index_start))?;

        let frame_indices = (0..header.frame_count)
            .map(|_| FrameIndex::read_from(&mut reader))
            .collect::<io::Result<Vec<_>>>()?;

        if let Some(bad) = frame_indices.iter().position(|index| {
            index.offset < AnimationHeader::SIZE as u64
                || index.offset.checked_add(index.size).is_none_or(|end| end > index_start)
        }) {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("Frame {} lies outside the frame data", bad),
            ));
        }

        log::debug!(
            "Opened {}x{}x{} animation with {} frames",
            header.width,
            header.height,
            header.channels,
            header.frame_count
        );

        Ok(Self {
            reader,
            read_buffer: Vec::new(),
            header,
            frame_indices,
        })
    }

    pub fn header(&self) -> &AnimationHeader {
        &self.header
    }

    pub fn frame_count(&self) -> u64 {
        self.header.frame_count
    }

    /// Grid `(width, height)`.
    pub fn dimensions(&self) -> (usize, usize) {
        (self.header.width as usize, self.header.height as usize)
    }

    /// Channels per frame.
    pub fn channels(&self) -> usize {
        self.header.channels as usize
    }

    pub fn seconds_per_frame(&self) -> f32 {
        self.header.seconds_per_frame
    }

    /// Read a frame by index.
    pub fn read_frame(&mut self, frame_index: u64) -> io::Result<GridFrame> {
        let (width, height) = self.dimensions();
        let mut frame = GridFrame::zeros(width, height, self.channels());
        self.read_frame_into(frame_index, &mut frame)?;
        Ok(frame)
    }

    /// Read a frame into an existing buffer of the right shape.
    pub fn read_frame_into(&mut self, frame_index: u64, frame: &mut GridFrame) -> io::Result<()> {
        let index = *self
            .frame_indices
            .get(frame_index as usize)
            .ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!(
                        "Frame index {} out of range ({} frames)",
                        frame_index, self.header.frame_count
                    ),
                )
            })?;

        if (frame.width, frame.height) != self.dimensions()
            || frame.channels.len() != self.channels()
        {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "Frame buffer shape does not match animation",
            ));
        }

        self.reader.seek(SeekFrom::Start(index.offset))?;
        self.read_buffer.resize(index.size as usize, 0);
        self.reader.read_exact(&mut self.read_buffer)?;

        if self.header.flags.compression == CompressionType::Lz4 {
            self.read_buffer = decompress_lz4(&self.read_buffer)?;
        }
        if self.read_buffer.len() != self.header.frame_size() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!(
                    "Frame {} holds {} bytes, expected {}",
                    frame_index,
                    self.read_buffer.len(),
                    self.header.frame_size()
                ),
            ));
        }

        let channel_bytes = self.header.cells() * 4;
        for (channel, bytes) in frame
            .channels
            .iter_mut()
            .zip(self.read_buffer.chunks_exact(channel_bytes))
        {
            decode_channel(bytes, channel)?;
        }

        Ok(())
    }

    /// Iterate over all frames in order.
    pub fn frames(&mut self) -> FrameIterator<'_> {
        FrameIterator {
            player: self,
            current: 0,
        }
    }
}

/// Iterator over animation frames.
pub struct FrameIterator<'a> {
    player: &'a mut AnimationPlayer,
    current: u64,
}

impl Iterator for FrameIterator<'_> {
    type Item = io::Result<GridFrame>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.current >= self.player.frame_count() {
            return None;
        }
        let result = self.player.read_frame(self.current);
        self.current += 1;
        Some(result)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = (self.player.frame_count() - self.current) as usize;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for FrameIterator<'_> {}
