//! Rodio Music Backend
//!
//! Plays [`MusicPlayer`]s on the default sound card.
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │                 RodioOutput                  │
//! │  OutputStream ── Sink[player 0] ◄─ PlayerSource
//! │               ── Sink[player 1] ◄─ PlayerSource
//! └──────────────────────────────────────────────┘
//! ```
//!
//! Each player gets its own sink. The sink's source, a [`PlayerSource`],
//! runs on rodio's mixer thread and is the only caller of
//! [`MusicPlayer::get_next_data`]. The control side keeps just the sink
//! and the player's handle, and [`RodioOutput::update`] mirrors gain
//! changes onto the sink once per game tick. Gain is recomputed only for
//! players whose parameters changed, or for all of them after a volume
//! change.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use rodio::{OutputStream, OutputStreamHandle, Sink, Source};
use tracing::{debug, info, warn};

use segue_common::{AudioFormat, ResourceError, SampleEncoding};

use crate::music_handoff::ParameterReader;

use crate::music_output::{AudioCategory, MusicOutput, VolumeSettings};
use crate::music_player::{MusicPlayer, PlayerHandle};

/// Frames pulled from a player per chunk.
pub const DEFAULT_BUFFER_FRAMES: usize = 4096;

/// Largest frame the chunk buffer is sized for (8 channels of f32).
const MAX_FRAME_BYTES: usize = 8 * 4;

/// Chunks tried when a segment switch yields no data.
const MAX_EMPTY_CHUNKS: usize = 4;

/// Adapts a [`MusicPlayer`] to rodio's pull-based [`Source`].
///
/// Data is pulled in chunks of one format. A new chunk is fetched as soon
/// as the last sample of the previous one is handed out, so rodio always
/// sees the upcoming chunk's channel count and rate at frame boundaries.
pub struct PlayerSource {
    player: MusicPlayer,
    buffer: Vec<u8>,
    frames: usize,
    read: usize,
    filled: usize,
    format: AudioFormat,
    ending: bool,
    finished: bool,
}

impl fmt::Debug for PlayerSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlayerSource")
            .field("format", &self.format)
            .field("read", &self.read)
            .field("filled", &self.filled)
            .field("finished", &self.finished)
            .finish_non_exhaustive()
    }
}

impl PlayerSource {
    /// Wraps `player`, priming the first chunk.
    #[must_use]
    pub fn new(player: MusicPlayer, frames: usize) -> Self {
        let frames = frames.max(1);
        let mut source = Self {
            format: player.format(),
            buffer: vec![0; frames * MAX_FRAME_BYTES],
            player,
            frames,
            read: 0,
            filled: 0,
            ending: false,
            finished: false,
        };
        source.refill();
        source
    }

    fn refill(&mut self) {
        self.read = 0;
        self.filled = 0;
        if self.ending || self.player.should_stop() {
            self.finish();
            return;
        }

        for _ in 0..MAX_EMPTY_CHUNKS {
            let format = self.player.format();
            let frame = format.frame_size().max(1);
            let want = (self.frames * frame).min(self.buffer.len()) / frame * frame;

            let written = self.player.get_next_data(&mut self.buffer[..want]);
            let changed = self.player.take_format_change();
            if written > 0 {
                self.format = format;
                self.filled = written - written % format.encoding.bytes_per_sample();
                self.ending = written < want && !changed;
                return;
            }
            if !changed {
                break;
            }
        }
        self.finish();
    }

    fn finish(&mut self) {
        if !self.finished {
            self.finished = true;
            self.player.mark_stopped();
        }
    }
}

fn sample_to_f32(bytes: &[u8], encoding: SampleEncoding) -> f32 {
    match encoding {
        SampleEncoding::U8 => (f32::from(bytes[0]) - 128.0) / 128.0,
        SampleEncoding::S16 => f32::from(i16::from_le_bytes([bytes[0], bytes[1]])) / 32768.0,
        SampleEncoding::F32 => f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
    }
}

impl Iterator for PlayerSource {
    type Item = f32;

    fn next(&mut self) -> Option<f32> {
        if self.finished {
            return None;
        }

        let width = self.format.encoding.bytes_per_sample();
        let sample = sample_to_f32(&self.buffer[self.read..self.read + width], self.format.encoding);
        self.read += width;
        if self.read >= self.filled {
            self.refill();
        }
        Some(sample)
    }
}

impl Source for PlayerSource {
    fn current_frame_len(&self) -> Option<usize> {
        if self.finished {
            return Some(0);
        }
        Some(self.filled.saturating_sub(self.read) / self.format.encoding.bytes_per_sample())
    }

    fn channels(&self) -> u16 {
        self.format.channels
    }

    fn sample_rate(&self) -> u32 {
        self.format.rate
    }

    fn total_duration(&self) -> Option<Duration> {
        None
    }
}

struct MusicSink {
    sink: Sink,
    player: PlayerHandle,
    reader: ParameterReader,
}

/// Music output on the default sound card.
pub struct RodioOutput {
    /// The output stream (must be kept alive).
    _stream: OutputStream,
    handle: OutputStreamHandle,
    sinks: Mutex<Vec<MusicSink>>,
    volumes: RwLock<VolumeSettings>,
    buffer_frames: usize,
    volumes_dirty: AtomicBool,
    /// Cleared once [`RodioOutput::stop_all`] has released the device.
    active: AtomicBool,
}

impl fmt::Debug for RodioOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RodioOutput")
            .field("sinks", &self.sinks.lock().len())
            .field("active", &self.active.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

impl RodioOutput {
    /// Opens the default output device.
    pub fn new() -> Result<Self, ResourceError> {
        Self::with_buffer_frames(DEFAULT_BUFFER_FRAMES)
    }

    /// Opens the default output device with a custom chunk size.
    pub fn with_buffer_frames(buffer_frames: usize) -> Result<Self, ResourceError> {
        let (stream, handle) =
            OutputStream::try_default().map_err(|e| ResourceError::OutputInitFailed(e.to_string()))?;

        info!("Music output initialized ({buffer_frames} frames per chunk)");

        Ok(Self {
            _stream: stream,
            handle,
            sinks: Mutex::new(Vec::new()),
            volumes: RwLock::new(VolumeSettings::default()),
            buffer_frames,
            volumes_dirty: AtomicBool::new(false),
            active: AtomicBool::new(true),
        })
    }

    /// Sets a category volume; applied on the next [`RodioOutput::update`].
    pub fn set_volume(&self, category: AudioCategory, volume: f32) {
        self.volumes.write().set(category, volume);
        self.volumes_dirty.store(true, Ordering::Release);
    }

    /// Replaces all category volumes.
    pub fn set_volumes(&self, volumes: VolumeSettings) {
        *self.volumes.write() = volumes;
        self.volumes_dirty.store(true, Ordering::Release);
    }

    /// Applies changed gains and drops sinks whose player is done.
    pub fn update(&self) {
        let refresh = self.volumes_dirty.swap(false, Ordering::AcqRel);
        let volumes = self.volumes.read().clone();
        let mut sinks = self.sinks.lock();
        let before = sinks.len();
        sinks.retain_mut(|entry| {
            if !entry.player.is_active() || entry.sink.empty() {
                entry.sink.stop();
                return false;
            }
            if entry.player.poll_parameters(&mut entry.reader) || refresh {
                entry.sink.set_volume(entry.player.output_gain(&volumes).gain);
            }
            true
        });

        let reaped = before - sinks.len();
        if reaped > 0 {
            debug!("Released {reaped} music sink(s)");
        }
    }

    /// Stops every player, releases its sink and deactivates the device.
    ///
    /// Later [`MusicOutput::start`] calls hand back already stopped players.
    pub fn stop_all(&self) {
        self.active.store(false, Ordering::Release);
        let released: Vec<MusicSink> = self.sinks.lock().drain(..).collect();
        for entry in &released {
            entry.player.ask_stop();
            entry.sink.stop();
        }
        if !released.is_empty() {
            debug!("Stopped {} music sink(s)", released.len());
        }
    }

    /// Number of sinks currently owned.
    #[must_use]
    pub fn playing_count(&self) -> usize {
        self.sinks.lock().len()
    }
}

impl MusicOutput for RodioOutput {
    fn is_initialized(&self) -> bool {
        true
    }

    fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    fn is_paused(&self) -> bool {
        false
    }

    fn volumes(&self) -> VolumeSettings {
        self.volumes.read().clone()
    }

    fn start(&self, player: MusicPlayer) -> PlayerHandle {
        let handle = player.handle();
        if !self.is_active() {
            player.mark_stopped();
            return handle;
        }
        let sink = match Sink::try_new(&self.handle) {
            Ok(sink) => sink,
            Err(e) => {
                warn!("Failed to create music sink: {e}");
                player.mark_stopped();
                return handle;
            },
        };

        let reader = handle.parameter_reader();
        let volumes = self.volumes.read().clone();
        sink.set_volume(player.set_up_output_idle(&volumes).gain);
        debug!("Starting music player ({})", player.format());
        sink.append(PlayerSource::new(player, self.buffer_frames));

        self.sinks.lock().push(MusicSink {
            sink,
            player: handle.clone(),
            reader,
        });
        handle
    }
}
