//! Engine configuration.
//!
//! Volumes, tick rate, level music and run settings. Loaded from
//! `segue.toml`; a missing or malformed file falls back to defaults.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use segue_gameplay::{DEFAULT_EXTENSIONS, DEFAULT_MUSIC_DIR};
use segue_kernel::{AudioCategory, VolumeSettings, DEFAULT_BUFFER_FRAMES};

/// Configuration file name.
const CONFIG_FILE: &str = "segue.toml";

/// Music engine configuration parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MusicConfig {
    // === Audio Settings ===
    /// Master volume (0.0 - 1.0)
    pub master_volume: f32,
    /// Music volume (0.0 - 1.0)
    pub music_volume: f32,
    /// Frames pulled from a player per device chunk
    pub buffer_frames: usize,

    // === Timing ===
    /// Game ticks per second
    pub tick_rate: u32,
    /// Length of the closing fade, in ticks
    pub fade_out_ticks: u32,
    /// How long to run, in seconds (0 = until interrupted)
    pub run_seconds: u64,
    /// How long the intro plays before the level starts, in seconds
    pub intro_seconds: u64,

    // === Level Music ===
    /// Intro track
    pub intro: Option<PathBuf>,
    /// Level tracks, played in order unless `random_order` is set
    pub playlist: Vec<PathBuf>,
    /// Shuffle the level playlist
    pub random_order: bool,
    /// Classic song used when the playlist is empty
    pub classic_song: i32,
    /// Directory holding classic `NN.<ext>` songs
    pub music_dir: PathBuf,
    /// Extensions tried for classic songs, in order
    pub extensions: Vec<String>,
}

impl Default for MusicConfig {
    fn default() -> Self {
        Self {
            // Audio
            master_volume: 1.0,
            music_volume: AudioCategory::Music.default_volume(),
            buffer_frames: DEFAULT_BUFFER_FRAMES,

            // Timing
            tick_rate: 60,
            fade_out_ticks: 120,
            run_seconds: 0,
            intro_seconds: 5,

            // Level music
            intro: None,
            playlist: Vec::new(),
            random_order: false,
            classic_song: 1,
            music_dir: PathBuf::from(DEFAULT_MUSIC_DIR),
            extensions: DEFAULT_EXTENSIONS.iter().map(ToString::to_string).collect(),
        }
    }
}

impl MusicConfig {
    /// Load configuration from `segue.toml` in the working directory.
    /// Returns default config if the file doesn't exist.
    pub fn load() -> Self {
        Self::load_from(CONFIG_FILE)
    }

    /// Load configuration from a specific path.
    /// Returns default config if the file doesn't exist or is invalid.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();

        if !path.exists() {
            info!("Config file not found, using defaults");
            return Self::default();
        }

        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) => {
                warn!("Failed to read config file: {e}");
                return Self::default();
            },
        };

        match toml::from_str(&contents) {
            Ok(config) => {
                info!("Loaded config from {}", path.display());
                config
            },
            Err(e) => {
                warn!("Failed to parse config file: {e}");
                Self::default()
            },
        }
    }

    /// Save configuration to a specific path.
    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> io::Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        fs::write(path, contents)?;

        info!("Saved config to {}", path.display());
        Ok(())
    }

    /// Validate and clamp configuration values to sensible ranges.
    pub fn validate(&mut self) {
        // Audio
        self.master_volume = self.master_volume.clamp(0.0, 1.0);
        self.music_volume = self.music_volume.clamp(0.0, 1.0);
        self.buffer_frames = self.buffer_frames.clamp(256, 65_536);

        // Timing
        self.tick_rate = self.tick_rate.clamp(10, 1000);

        // Level music
        if self.extensions.is_empty() {
            warn!("No classic music extensions configured, using defaults");
            self.extensions = DEFAULT_EXTENSIONS.iter().map(ToString::to_string).collect();
        }
    }

    /// Category volumes for the output device.
    #[must_use]
    pub fn volumes(&self) -> VolumeSettings {
        let mut volumes = VolumeSettings::default();
        volumes.set(AudioCategory::Master, self.master_volume);
        volumes.set(AudioCategory::Music, self.music_volume);
        volumes
    }
}
