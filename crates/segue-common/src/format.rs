//! PCM format descriptions.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Sample encoding of decoded PCM.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SampleEncoding {
    /// Unsigned 8-bit
    U8,
    /// Signed 16-bit little endian
    S16,
    /// 32-bit float little endian
    F32,
}

impl SampleEncoding {
    /// Size of one sample in bytes.
    #[must_use]
    pub const fn bytes_per_sample(self) -> usize {
        match self {
            Self::U8 => 1,
            Self::S16 => 2,
            Self::F32 => 4,
        }
    }

    const fn to_bits(self) -> u64 {
        match self {
            Self::U8 => 0,
            Self::S16 => 1,
            Self::F32 => 2,
        }
    }

    const fn from_bits(bits: u64) -> Self {
        match bits {
            0 => Self::U8,
            2 => Self::F32,
            _ => Self::S16,
        }
    }
}

/// Rate, channel layout and encoding of a PCM stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AudioFormat {
    /// Sample rate in Hz
    pub rate: u32,
    /// Number of interleaved channels
    pub channels: u16,
    /// Sample encoding
    pub encoding: SampleEncoding,
}

impl AudioFormat {
    /// CD quality: 44.1 kHz stereo 16-bit.
    pub const CD: Self = Self::new(44_100, 2, SampleEncoding::S16);

    /// Creates a new format.
    #[must_use]
    pub const fn new(rate: u32, channels: u16, encoding: SampleEncoding) -> Self {
        Self {
            rate,
            channels,
            encoding,
        }
    }

    /// Checks if the layout is stereo.
    #[must_use]
    pub const fn is_stereo(&self) -> bool {
        self.channels == 2
    }

    /// Size of one interleaved frame in bytes.
    #[must_use]
    pub const fn frame_size(&self) -> usize {
        self.channels as usize * self.encoding.bytes_per_sample()
    }

    /// Packs the format into a single word so it can live in an atomic.
    #[must_use]
    pub const fn to_bits(self) -> u64 {
        ((self.rate as u64) << 32) | ((self.channels as u64) << 16) | self.encoding.to_bits()
    }

    /// Inverse of [`AudioFormat::to_bits`].
    #[must_use]
    pub const fn from_bits(bits: u64) -> Self {
        Self {
            rate: (bits >> 32) as u32,
            channels: ((bits >> 16) & 0xFFFF) as u16,
            encoding: SampleEncoding::from_bits(bits & 0xFF),
        }
    }
}

impl Default for AudioFormat {
    fn default() -> Self {
        Self::CD
    }
}

impl fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} Hz, {} ch, {:?}", self.rate, self.channels, self.encoding)
    }
}
