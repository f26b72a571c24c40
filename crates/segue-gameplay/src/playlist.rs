//! Level music playlist.
//!
//! Tracks queued for the level slot, picked either in order (wrapping) or
//! at random. A single queued track is simply looped by the slot; with two
//! or more the slot plays each once and the playlist chooses the next.

use fastrand::Rng;
use tracing::debug;

use segue_common::MusicSource;

/// Ordered level tracks plus selection state.
#[derive(Debug, Clone)]
pub struct LevelPlaylist {
    tracks: Vec<MusicSource>,
    cursor: usize,
    random_order: bool,
    rng: Rng,
    classic_song: Option<u32>,
}

impl Default for LevelPlaylist {
    fn default() -> Self {
        Self::new()
    }
}

impl LevelPlaylist {
    /// Creates an empty, sequential playlist.
    #[must_use]
    pub fn new() -> Self {
        Self::with_seed(0)
    }

    /// Creates an empty playlist with a fixed shuffle seed.
    #[must_use]
    pub fn with_seed(seed: u64) -> Self {
        Self {
            tracks: Vec::new(),
            cursor: 0,
            random_order: false,
            rng: Rng::with_seed(seed),
            classic_song: None,
        }
    }

    /// Appends a track.
    ///
    /// Returns true once more than one track is queued, meaning the level
    /// slot should stop looping so the end of a track advances the list.
    pub fn push_back(&mut self, source: MusicSource) -> bool {
        debug!("Queued level music {source}");
        self.tracks.push(source);
        self.tracks.len() > 1
    }

    /// Picks the next track to play.
    ///
    /// A sole track is returned without moving the cursor.
    pub fn next_track(&mut self) -> Option<MusicSource> {
        let index = match self.tracks.len() {
            0 => return None,
            1 => 0,
            len if self.random_order => {
                self.cursor = self.rng.usize(..len);
                self.cursor
            },
            len => {
                let index = self.cursor % len;
                self.cursor = (index + 1) % len;
                index
            },
        };
        self.tracks.get(index).cloned()
    }

    /// Empties the playlist and forgets any classic song.
    pub fn clear(&mut self) {
        self.tracks.clear();
        self.cursor = 0;
        self.classic_song = None;
    }

    /// Reseeds shuffling and restarts from the first track.
    pub fn seed(&mut self, tick: u32) {
        self.rng.seed(u64::from(tick));
        self.cursor = 0;
    }

    /// Enables or disables random order.
    pub fn set_random(&mut self, random: bool) {
        self.random_order = random;
    }

    /// Checks if tracks are picked at random.
    #[must_use]
    pub const fn is_random(&self) -> bool {
        self.random_order
    }

    /// Number of queued tracks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    /// Checks if no track is queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// Queued tracks in order.
    #[must_use]
    pub fn tracks(&self) -> &[MusicSource] {
        &self.tracks
    }

    /// Classic song number the playlist was built from, if any.
    #[must_use]
    pub const fn classic_song(&self) -> Option<u32> {
        self.classic_song
    }

    /// Remembers which classic song the playlist holds.
    pub fn set_classic_song(&mut self, song: u32) {
        self.classic_song = Some(song);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn playlist(names: &[&str]) -> LevelPlaylist {
        let mut list = LevelPlaylist::new();
        for name in names {
            list.push_back(MusicSource::new(*name));
        }
        list
    }

    #[test]
    fn test_empty_playlist_has_no_track() {
        assert_eq!(LevelPlaylist::new().next_track(), None);
    }

    #[test]
    fn test_push_back_reports_multiple_tracks() {
        let mut list = LevelPlaylist::new();
        assert!(!list.push_back(MusicSource::new("a.ogg")));
        assert!(list.push_back(MusicSource::new("b.ogg")));
    }

    #[test]
    fn test_single_track_repeats() {
        let mut list = playlist(&["a.ogg"]);
        list.set_random(true);
        for _ in 0..3 {
            assert_eq!(list.next_track(), Some(MusicSource::new("a.ogg")));
        }
    }

    #[test]
    fn test_sequential_wraps() {
        let mut list = playlist(&["a.ogg", "b.ogg"]);
        let picked: Vec<_> = (0..3).filter_map(|_| list.next_track()).collect();
        assert_eq!(
            picked,
            vec![MusicSource::new("a.ogg"), MusicSource::new("b.ogg"), MusicSource::new("a.ogg")]
        );
    }

    #[test]
    fn test_random_stays_in_range_and_is_seeded() {
        let names = ["a.ogg", "b.ogg", "c.ogg", "d.ogg"];
        let mut first = playlist(&names);
        let mut second = playlist(&names);
        first.set_random(true);
        second.set_random(true);
        first.seed(1234);
        second.seed(1234);

        for _ in 0..32 {
            let track = first.next_track().expect("non-empty");
            assert!(first.tracks().contains(&track));
            assert_eq!(Some(track), second.next_track());
        }
    }

    #[test]
    fn test_clear_resets_everything() {
        let mut list = playlist(&["a.ogg", "b.ogg"]);
        list.set_classic_song(3);
        list.next_track();

        list.clear();
        assert!(list.is_empty());
        assert_eq!(list.classic_song(), None);
        assert_eq!(list.next_track(), None);

        list.push_back(MusicSource::new("c.ogg"));
        list.push_back(MusicSource::new("d.ogg"));
        assert_eq!(list.next_track(), Some(MusicSource::new("c.ogg")));
    }
}
