//! Classic numbered level music.
//!
//! Classic songs live in a music directory as `NN.<ext>` (two-digit song
//! number). Extensions are tried in order and the first file that exists
//! wins.

use std::path::PathBuf;

use tracing::debug;

use segue_common::MusicSource;

/// Default directory classic songs are looked up in.
pub const DEFAULT_MUSIC_DIR: &str = "Music";

/// Default extensions, in lookup order.
pub const DEFAULT_EXTENSIONS: [&str; 2] = ["ogg", "mp3"];

/// Resolves a level's song number to a playable source.
pub trait LevelTrackResolver {
    /// Returns the source for `song`, or `None` if no file exists.
    fn resolve(&self, song: u32) -> Option<MusicSource>;
}

/// Looks up `<music_dir>/NN.<ext>` on disk.
#[derive(Debug, Clone)]
pub struct ClassicTrackResolver {
    music_dir: PathBuf,
    extensions: Vec<String>,
}

impl Default for ClassicTrackResolver {
    fn default() -> Self {
        Self::new(DEFAULT_MUSIC_DIR)
    }
}

impl ClassicTrackResolver {
    /// Creates a resolver over `music_dir` with the default extensions.
    #[must_use]
    pub fn new(music_dir: impl Into<PathBuf>) -> Self {
        Self {
            music_dir: music_dir.into(),
            extensions: DEFAULT_EXTENSIONS.iter().map(ToString::to_string).collect(),
        }
    }

    /// Replaces the extension list (lookup order is preserved).
    #[must_use]
    pub fn with_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extensions = extensions.into_iter().map(Into::into).collect();
        self
    }

    /// Candidate paths for `song`, in lookup order.
    #[must_use]
    pub fn candidates(&self, song: u32) -> Vec<PathBuf> {
        self.extensions
            .iter()
            .map(|ext| self.music_dir.join(format!("{song:02}.{ext}")))
            .collect()
    }
}

impl LevelTrackResolver for ClassicTrackResolver {
    fn resolve(&self, song: u32) -> Option<MusicSource> {
        let found = self.candidates(song).into_iter().find(|path| path.is_file());
        if found.is_none() {
            debug!("No classic music file for song {song} in {:?}", self.music_dir);
        }
        found.map(MusicSource::from)
    }
}
