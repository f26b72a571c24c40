//! References to decodable music sources.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// A logical reference to a compressed or streamed music source.
///
/// Usually a file path; decoders are free to interpret it as a key into
/// an in-memory asset table instead. Two sources are the same source iff
/// their paths compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MusicSource {
    path: PathBuf,
}

impl MusicSource {
    /// Creates a source from a path or asset key.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the underlying path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Checks whether the source exists on disk.
    #[must_use]
    pub fn exists(&self) -> bool {
        self.path.exists()
    }
}

impl fmt::Display for MusicSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path.display())
    }
}

impl From<&str> for MusicSource {
    fn from(path: &str) -> Self {
        Self::new(path)
    }
}

impl From<PathBuf> for MusicSource {
    fn from(path: PathBuf) -> Self {
        Self::new(path)
    }
}
