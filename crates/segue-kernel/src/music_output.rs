//! Music output devices.
//!
//! A [`MusicOutput`] is anything that can own players and pull PCM from
//! them: the rodio-backed device used by the engine, or the
//! [`OfflineOutput`] that renders on the caller's thread.

use std::sync::atomic::{AtomicBool, Ordering};

use ahash::AHashMap;
use parking_lot::{Mutex, RwLock};
use tracing::{debug, trace};

use segue_common::{AudioFormat, GraphError};

use crate::music_decoder::SharedDecoder;
use crate::music_graph::Preset;
use crate::music_handoff::MusicParameters;
use crate::music_player::{MusicPlayer, PlayerHandle};

/// Audio category for volume mixing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AudioCategory {
    /// Master volume (affects all audio).
    Master,
    /// Background music.
    Music,
    /// Sound effects.
    Sfx,
}

impl AudioCategory {
    /// Get the default volume for this category.
    #[must_use]
    pub const fn default_volume(&self) -> f32 {
        match self {
            Self::Master | Self::Sfx => 1.0,
            Self::Music => 0.7,
        }
    }
}

/// Per-category volume settings.
#[derive(Debug, Clone, PartialEq)]
pub struct VolumeSettings {
    volumes: AHashMap<AudioCategory, f32>,
}

impl Default for VolumeSettings {
    fn default() -> Self {
        let volumes = [AudioCategory::Master, AudioCategory::Music, AudioCategory::Sfx]
            .into_iter()
            .map(|category| (category, category.default_volume()))
            .collect();
        Self { volumes }
    }
}

impl VolumeSettings {
    /// Get volume for a category.
    #[must_use]
    pub fn get(&self, category: AudioCategory) -> f32 {
        self.volumes.get(&category).copied().unwrap_or(1.0)
    }

    /// Set volume for a category, clamped to [0, 1].
    pub fn set(&mut self, category: AudioCategory, volume: f32) {
        self.volumes.insert(category, volume.clamp(0.0, 1.0));
    }

    /// Category volume scaled by master.
    #[must_use]
    pub fn effective(&self, category: AudioCategory) -> f32 {
        self.get(AudioCategory::Master) * self.get(category)
    }
}

/// Gain a device applies to one music stream.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OutputGain {
    /// Ceiling for this stream: master × music.
    pub max_gain: f32,
    /// Applied gain: master × music × track volume.
    pub gain: f32,
}

impl OutputGain {
    /// Gain for a music stream at `track_volume`.
    #[must_use]
    pub fn music(volumes: &VolumeSettings, track_volume: f32) -> Self {
        let max_gain = volumes.effective(AudioCategory::Music);
        Self {
            max_gain,
            gain: max_gain * track_volume,
        }
    }
}

/// A device that owns music players and pulls audio from them.
///
/// Methods take `&self`; implementations guard their player lists
/// internally so slots can share one output.
pub trait MusicOutput {
    /// Checks if the device was initialized.
    fn is_initialized(&self) -> bool;

    /// Checks if the device is currently producing audio.
    fn is_active(&self) -> bool;

    /// Checks if output is paused.
    fn is_paused(&self) -> bool;

    /// Current category volumes.
    fn volumes(&self) -> VolumeSettings;

    /// Hands `player` to the device and returns its control handle.
    fn start(&self, player: MusicPlayer) -> PlayerHandle;

    /// Starts a simple player over `decoder`.
    fn play_music(&self, decoder: SharedDecoder, parameters: MusicParameters) -> PlayerHandle {
        self.start(MusicPlayer::new(decoder, parameters))
    }

    /// Starts a dynamic player over `presets`.
    fn play_dynamic_music(
        &self,
        presets: &[Preset],
        start_preset: usize,
        start_segment: usize,
        parameters: MusicParameters,
    ) -> Result<PlayerHandle, GraphError> {
        let player = MusicPlayer::new_dynamic(presets, start_preset, start_segment, parameters)?;
        Ok(self.start(player))
    }
}

/// One player's contribution to an offline render pass.
#[derive(Debug, Clone)]
pub struct RenderedBlock {
    /// Player that produced the block.
    pub handle: PlayerHandle,
    /// Format of `data`.
    pub format: AudioFormat,
    /// Gain the device would apply.
    pub gain: OutputGain,
    /// `gain` was recomputed during this pass.
    pub gain_updated: bool,
    /// Raw PCM.
    pub data: Vec<u8>,
    /// The player reached the end of its stream.
    pub ended: bool,
}

#[derive(Debug)]
struct OfflinePlayer {
    player: MusicPlayer,
    gain: OutputGain,
}

/// Device that renders on the caller's thread instead of a sound card.
///
/// Used for headless runs and tests: each [`OfflineOutput::render`] call
/// is one audio-context pass over every live player. Gains are cached per
/// player and recomputed only after a parameter or volume change.
#[derive(Debug)]
pub struct OfflineOutput {
    players: Mutex<Vec<OfflinePlayer>>,
    volumes: RwLock<VolumeSettings>,
    volumes_dirty: AtomicBool,
    initialized: AtomicBool,
    active: AtomicBool,
    paused: AtomicBool,
}

impl Default for OfflineOutput {
    fn default() -> Self {
        Self::new()
    }
}

impl OfflineOutput {
    /// Creates an initialized, active, unpaused device.
    #[must_use]
    pub fn new() -> Self {
        Self {
            players: Mutex::new(Vec::new()),
            volumes: RwLock::new(VolumeSettings::default()),
            volumes_dirty: AtomicBool::new(false),
            initialized: AtomicBool::new(true),
            active: AtomicBool::new(true),
            paused: AtomicBool::new(false),
        }
    }

    /// Marks the device as (un)initialized.
    pub fn set_initialized(&self, initialized: bool) {
        self.initialized.store(initialized, Ordering::Relaxed);
    }

    /// Marks the device as (in)active.
    pub fn set_active(&self, active: bool) {
        self.active.store(active, Ordering::Relaxed);
    }

    /// Pauses or resumes rendering.
    pub fn set_paused(&self, paused: bool) {
        self.paused.store(paused, Ordering::Relaxed);
    }

    /// Sets a category volume.
    pub fn set_volume(&self, category: AudioCategory, volume: f32) {
        self.volumes.write().set(category, volume);
        self.volumes_dirty.store(true, Ordering::Release);
    }

    /// Number of players the device still owns.
    #[must_use]
    pub fn player_count(&self) -> usize {
        self.players.lock().len()
    }

    /// Pulls up to `length` bytes from every live player.
    ///
    /// Players that were asked to stop are dropped before pulling, and
    /// players whose stream ended are dropped after.
    pub fn render(&self, length: usize) -> Vec<RenderedBlock> {
        if self.paused.load(Ordering::Relaxed) {
            return Vec::new();
        }

        let refresh = self.volumes_dirty.swap(false, Ordering::AcqRel);
        let volumes = self.volumes.read().clone();
        let mut blocks = Vec::new();
        self.players.lock().retain_mut(|OfflinePlayer { player, gain }| {
            if player.should_stop() {
                player.mark_stopped();
                return false;
            }

            let gain_updated = player.load_parameter_updates() || refresh;
            if gain_updated {
                *gain = player.set_up_output_idle(&volumes);
                trace!("Music gain now {:.3}", gain.gain);
            }

            let format = player.format();
            let mut data = vec![0u8; length];
            let written = player.get_next_data(&mut data);
            data.truncate(written);

            let ended = written < length && !player.take_format_change();
            if ended {
                debug!("Music stream ended");
                player.mark_stopped();
            }

            blocks.push(RenderedBlock {
                handle: player.handle(),
                format,
                gain: *gain,
                gain_updated,
                data,
                ended,
            });
            !ended
        });
        blocks
    }
}

impl MusicOutput for OfflineOutput {
    fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::Relaxed)
    }

    fn is_active(&self) -> bool {
        self.active.load(Ordering::Relaxed)
    }

    fn is_paused(&self) -> bool {
        self.paused.load(Ordering::Relaxed)
    }

    fn volumes(&self) -> VolumeSettings {
        self.volumes.read().clone()
    }

    fn start(&self, player: MusicPlayer) -> PlayerHandle {
        let handle = player.handle();
        let gain = player.set_up_output_idle(&self.volumes.read());
        self.players.lock().push(OfflinePlayer { player, gain });
        handle
    }
}
