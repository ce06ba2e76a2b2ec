//! Binary layout of `.skan` sketch animation files.

use std::io::{self, Read, Write};

/// Magic bytes identifying a sketch animation file.
pub const ANIMATION_MAGIC: &[u8; 4] = b"SKAN";

/// Current format version.
pub const ANIMATION_VERSION: u16 = 1;

/// Compression type for frame data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum CompressionType {
    /// No compression (raw f32 data).
    #[default]
    None = 0,
    /// LZ4 fast compression.
    Lz4 = 1,
}

impl CompressionType {
    pub fn from_u8(v: u8) -> Option<Self> {
        match v {
            0 => Some(CompressionType::None),
            1 => Some(CompressionType::Lz4),
            _ => None,
        }
    }
}

/// Animation file header flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AnimationFlags {
    /// Compression type (lower 4 bits).
    pub compression: CompressionType,
}

impl AnimationFlags {
    pub fn to_u16(self) -> u16 {
        self.compression as u16
    }

    pub fn from_u16(v: u16) -> io::Result<Self> {
        let compression = CompressionType::from_u8((v & 0x0F) as u8).ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("Unknown SKAN compression: {}", v & 0x0F),
            )
        })?;
        Ok(Self { compression })
    }
}

/// File header.
#[derive(Debug, Clone, PartialEq)]
pub struct AnimationHeader {
    pub width: u32,
    pub height: u32,
    /// Fields stored per frame.
    pub channels: u32,
    /// Total number of frames.
    pub frame_count: u64,
    /// Playback interval between recorded frames.
    pub seconds_per_frame: f32,
    pub flags: AnimationFlags,
}

impl AnimationHeader {
    /// Size of header in bytes.
    /// Magic(4) + Version(2) + Flags(2) + Width(4) + Height(4) + Channels(4) +
    /// FrameCount(8) + SecondsPerFrame(4) + Reserved(16) = 48
    pub const SIZE: usize = 48;

    /// Cells per channel.
    pub fn cells(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Size of one uncompressed frame in bytes.
    pub fn frame_size(&self) -> usize {
        self.cells() * self.channels as usize * 4
    }

    pub fn write_to<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_all(ANIMATION_MAGIC)?;
        w.write_all(&ANIMATION_VERSION.to_le_bytes())?;
        w.write_all(&self.flags.to_u16().to_le_bytes())?;
        w.write_all(&self.width.to_le_bytes())?;
        w.write_all(&self.height.to_le_bytes())?;
        w.write_all(&self.channels.to_le_bytes())?;
        w.write_all(&self.frame_count.to_le_bytes())?;
        w.write_all(&self.seconds_per_frame.to_le_bytes())?;
        w.write_all(&[0u8; 16])?;
        Ok(())
    }

    pub fn read_from<R: Read>(r: &mut R) -> io::Result<Self> {
        let mut bytes = [0u8; Self::SIZE];
        r.read_exact(&mut bytes)?;

        if &bytes[0..4] != ANIMATION_MAGIC {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "Invalid SKAN magic bytes",
            ));
        }

        let u16_at = |at: usize| u16::from_le_bytes([bytes[at], bytes[at + 1]]);
        let u32_at = |at: usize| {
            u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
        };

        let version = u16_at(4);
        if version != ANIMATION_VERSION {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("Unsupported SKAN version: {}", version),
            ));
        }

        let mut frame_count = [0u8; 8];
        frame_count.copy_from_slice(&bytes[20..28]);

        let header = Self {
            flags: AnimationFlags::from_u16(u16_at(6))?,
            width: u32_at(8),
            height: u32_at(12),
            channels: u32_at(16),
            frame_count: u64::from_le_bytes(frame_count),
            seconds_per_frame: f32::from_bits(u32_at(28)),
        };

        if header.width == 0 || header.height == 0 || header.channels == 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!(
                    "Empty frame shape {}x{}x{}",
                    header.width, header.height, header.channels
                ),
            ));
        }
        let frame_bytes = (header.width as u64)
            .checked_mul(header.height as u64)
            .and_then(|cells| cells.checked_mul(header.channels as u64))
            .and_then(|values| values.checked_mul(4));
        if frame_bytes.is_none_or(|bytes| usize::try_from(bytes).is_err()) {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "Frame size overflows the address space",
            ));
        }

        Ok(header)
    }
}

/// Index entry for a single frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameIndex {
    /// Byte offset from start of file.
    pub offset: u64,
    /// Stored size in bytes (equals uncompressed if no compression).
    pub size: u64,
}

impl FrameIndex {
    /// Size of one index entry in bytes.
    pub const SIZE: usize = 16;

    pub fn write_to<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_all(&self.offset.to_le_bytes())?;
        w.write_all(&self.size.to_le_bytes())?;
        Ok(())
    }

    pub fn read_from<R: Read>(r: &mut R) -> io::Result<Self> {
        let mut bytes = [0u8; Self::SIZE];
        r.read_exact(&mut bytes)?;
        let (offset, size) = bytes.split_at(8);
        Ok(Self {
            offset: u64::from_le_bytes(offset.try_into().unwrap_or_default()),
            size: u64::from_le_bytes(size.try_into().unwrap_or_default()),
        })
    }
}

/// Append a channel as little-endian `f32`s.
pub fn encode_channel(data: &[f32], out: &mut Vec<u8>) {
    out.reserve(data.len() * 4);
    for v in data {
        out.extend_from_slice(&v.to_le_bytes());
    }
}

/// Decode little-endian `f32`s into `output`.
pub fn decode_channel(bytes: &[u8], output: &mut [f32]) -> io::Result<()> {
    if bytes.len() != output.len() * 4 {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!(
                "Channel size mismatch: {} bytes vs {} floats",
                bytes.len(),
                output.len()
            ),
        ));
    }
    for (v, b) in output.iter_mut().zip(bytes.chunks_exact(4)) {
        *v = f32::from_le_bytes([b[0], b[1], b[2], b[3]]);
    }
    Ok(())
}

/// Compress data using LZ4.
#[cfg(feature = "lz4")]
pub fn compress_lz4(data: &[u8]) -> Vec<u8> {
    lz4_flex::compress_prepend_size(data)
}

/// Decompress LZ4 data.
#[cfg(feature = "lz4")]
pub fn decompress_lz4(data: &[u8]) -> io::Result<Vec<u8>> {
    lz4_flex::decompress_size_prepended(data)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}

/// Without the `lz4` feature, "compressed" frames are stored raw.
#[cfg(not(feature = "lz4"))]
pub fn compress_lz4(data: &[u8]) -> Vec<u8> {
    data.to_vec()
}

#[cfg(not(feature = "lz4"))]
pub fn decompress_lz4(data: &[u8]) -> io::Result<Vec<u8>> {
    Ok(data.to_vec())
}
