//! Music Decoders
//!
//! Decoders turn a [`MusicSource`] into raw PCM on demand. The engine only
//! needs four things from them: the output format, a pull-style `decode`,
//! `rewind`, and a way to open one from a source.
//!
//! # Ownership
//!
//! A decoder is wrapped in a [`SharedDecoder`] as soon as it is opened.
//! Slots keep a clone for format queries and reuse, players keep a clone
//! for decoding, and dynamic graphs may reference the same track from
//! several presets. The decoder is released when the last clone drops,
//! which is what lets a slot close a source while the audio context is
//! still finishing a pull against it.
//!
//! Only the audio context decodes. The control context touches the lock
//! once per player construction (to rewind), so the audio side never waits
//! on it for longer than a rewind.

use std::fmt;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use ahash::AHashMap;
use parking_lot::{Mutex, RwLock};
use rodio::Source;
use tracing::{debug, warn};

use segue_common::{AudioFormat, MusicSource, ResourceError, SampleEncoding};

/// A source of decoded PCM.
pub trait StreamDecoder: Send {
    /// Format of the PCM this decoder produces.
    fn format(&self) -> AudioFormat;

    /// Decodes up to `buffer.len()` bytes and returns how many were written.
    ///
    /// Returns 0 once the source is exhausted.
    fn decode(&mut self, buffer: &mut [u8]) -> usize;

    /// Seeks back to the start of the source.
    fn rewind(&mut self);
}

/// Reference-counted handle to a decoder.
#[derive(Clone)]
pub struct SharedDecoder {
    format: AudioFormat,
    inner: Arc<Mutex<Box<dyn StreamDecoder>>>,
}

impl fmt::Debug for SharedDecoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedDecoder")
            .field("format", &self.format)
            .field("holders", &Arc::strong_count(&self.inner))
            .finish_non_exhaustive()
    }
}

impl SharedDecoder {
    /// Wraps a decoder.
    pub fn new<D: StreamDecoder + 'static>(decoder: D) -> Self {
        Self::from_boxed(Box::new(decoder))
    }

    /// Wraps an already boxed decoder.
    #[must_use]
    pub fn from_boxed(decoder: Box<dyn StreamDecoder>) -> Self {
        Self {
            format: decoder.format(),
            inner: Arc::new(Mutex::new(decoder)),
        }
    }

    /// Output format. Does not touch the decoder lock.
    #[must_use]
    pub const fn format(&self) -> AudioFormat {
        self.format
    }

    /// Sample rate in Hz.
    #[must_use]
    pub const fn rate(&self) -> u32 {
        self.format.rate
    }

    /// Checks if the decoder produces stereo.
    #[must_use]
    pub const fn is_stereo(&self) -> bool {
        self.format.is_stereo()
    }

    /// Decodes into `buffer`, returning the number of bytes written.
    pub fn decode(&self, buffer: &mut [u8]) -> usize {
        self.inner.lock().decode(buffer)
    }

    /// Rewinds the decoder to the start of its source.
    pub fn rewind(&self) {
        self.inner.lock().rewind();
    }

    /// Decodes into `buffer` unless `stopped` returns true once the lock is held.
    ///
    /// A player checks its own run state here, so a stop requested before
    /// another player rewinds this decoder is always seen before decoding.
    pub fn decode_unless(&self, buffer: &mut [u8], stopped: impl FnOnce() -> bool) -> Option<usize> {
        let mut decoder = self.inner.lock();
        if stopped() {
            return None;
        }
        Some(decoder.decode(buffer))
    }

    /// Rewinds unless `stopped` returns true once the lock is held.
    pub fn rewind_unless(&self, stopped: impl FnOnce() -> bool) -> bool {
        let mut decoder = self.inner.lock();
        if stopped() {
            return false;
        }
        decoder.rewind();
        true
    }

    /// Checks if both handles point at the same decoder.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Number of live handles to this decoder.
    #[must_use]
    pub fn holders(&self) -> usize {
        Arc::strong_count(&self.inner)
    }
}

/// Opens decoders for music sources.
pub trait DecoderProvider {
    /// Opens a fresh decoder positioned at the start of `source`.
    fn open(&self, source: &MusicSource) -> Result<SharedDecoder, ResourceError>;
}

/// Decoder over PCM held in memory.
#[derive(Debug, Clone)]
pub struct MemoryDecoder {
    format: AudioFormat,
    data: Arc<[u8]>,
    position: usize,
}

impl MemoryDecoder {
    /// Creates a decoder over `data`, interpreted as `format`.
    pub fn new(format: AudioFormat, data: impl Into<Arc<[u8]>>) -> Self {
        Self {
            format,
            data: data.into(),
            position: 0,
        }
    }

    /// Total length of the source in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Checks if the source holds no audio.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Bytes left before exhaustion.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.data.len() - self.position
    }
}

impl StreamDecoder for MemoryDecoder {
    fn format(&self) -> AudioFormat {
        self.format
    }

    fn decode(&mut self, buffer: &mut [u8]) -> usize {
        let count = buffer.len().min(self.remaining());
        buffer[..count].copy_from_slice(&self.data[self.position..self.position + count]);
        self.position += count;
        count
    }

    fn rewind(&mut self) {
        self.position = 0;
    }
}

/// In-memory asset table mapping sources to PCM.
///
/// Each `open` returns an independent decoder over shared sample data.
#[derive(Debug, Default)]
pub struct MemoryDecoderProvider {
    assets: RwLock<AHashMap<MusicSource, (AudioFormat, Arc<[u8]>)>>,
}

impl MemoryDecoderProvider {
    /// Creates an empty asset table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers PCM for a source, replacing any previous entry.
    pub fn insert(&self, source: impl Into<MusicSource>, format: AudioFormat, data: impl Into<Arc<[u8]>>) {
        self.assets
            .write()
            .insert(source.into(), (format, data.into()));
    }
}

impl DecoderProvider for MemoryDecoderProvider {
    fn open(&self, source: &MusicSource) -> Result<SharedDecoder, ResourceError> {
        let assets = self.assets.read();
        let (format, data) = assets
            .get(source)
            .ok_or_else(|| ResourceError::SourceUnavailable {
                source_name: source.to_string(),
                message: "not registered".to_string(),
            })?;
        Ok(SharedDecoder::new(MemoryDecoder::new(*format, Arc::clone(data))))
    }
}

/// Streams a compressed file from disk through rodio's decoders.
///
/// Produces signed 16-bit little endian PCM.
pub struct RodioDecoder {
    path: PathBuf,
    decoder: rodio::Decoder<BufReader<File>>,
    format: AudioFormat,
}

impl fmt::Debug for RodioDecoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RodioDecoder")
            .field("path", &self.path)
            .field("format", &self.format)
            .finish_non_exhaustive()
    }
}

impl RodioDecoder {
    /// Opens and probes a file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ResourceError> {
        let path = path.as_ref();
        let decoder = Self::open_decoder(path)?;
        let format = AudioFormat::new(decoder.sample_rate(), decoder.channels(), SampleEncoding::S16);

        debug!("Opened music decoder for {:?} ({})", path, format);

        Ok(Self {
            path: path.to_path_buf(),
            decoder,
            format,
        })
    }

    fn open_decoder(path: &Path) -> Result<rodio::Decoder<BufReader<File>>, ResourceError> {
        let unavailable = |message: String| ResourceError::SourceUnavailable {
            source_name: path.display().to_string(),
            message,
        };

        let file = File::open(path).map_err(|e| unavailable(e.to_string()))?;
        rodio::Decoder::new(BufReader::new(file))
            .map_err(|e| ResourceError::DecodeFailed(format!("{}: {e}", path.display())))
    }
}

impl StreamDecoder for RodioDecoder {
    fn format(&self) -> AudioFormat {
        self.format
    }

    fn decode(&mut self, buffer: &mut [u8]) -> usize {
        let mut written = 0;
        for chunk in buffer.chunks_exact_mut(2) {
            match self.decoder.next() {
                Some(sample) => {
                    chunk.copy_from_slice(&sample.to_le_bytes());
                    written += 2;
                },
                None => break,
            }
        }
        written
    }

    fn rewind(&mut self) {
        if self.decoder.try_seek(Duration::ZERO).is_ok() {
            return;
        }

        // Some formats cannot seek; reopening lands on the first sample.
        match Self::open_decoder(&self.path) {
            Ok(decoder) => self.decoder = decoder,
            Err(e) => warn!("Failed to rewind {:?}: {e}", self.path),
        }
    }
}

/// Opens files from disk with [`RodioDecoder`].
#[derive(Debug, Clone, Default)]
pub struct FileDecoderProvider {
    root: Option<PathBuf>,
}

impl FileDecoderProvider {
    /// Creates a provider resolving sources relative to the working directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a provider resolving relative sources under `root`.
    #[must_use]
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Some(root.into()),
        }
    }

    fn resolve(&self, source: &MusicSource) -> PathBuf {
        match &self.root {
            Some(root) if source.path().is_relative() => root.join(source.path()),
            _ => source.path().to_path_buf(),
        }
    }
}

impl DecoderProvider for FileDecoderProvider {
    fn open(&self, source: &MusicSource) -> Result<SharedDecoder, ResourceError> {
        RodioDecoder::open(self.resolve(source)).map(SharedDecoder::new)
    }
}
