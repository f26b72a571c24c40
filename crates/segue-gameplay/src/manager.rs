//! Music manager.
//!
//! Owns every music slot and drives them from the game loop:
//!
//! ```text
//! ┌──────────────────────── MusicManager ────────────────────────┐
//! │ slots[0] Intro   (reserved)                                  │
//! │ slots[1] Level   (reserved, fed by LevelPlaylist)            │
//! │ slots[2..]       (handed out by load / load_dynamic)         │
//! │                                                              │
//! │ output: dyn MusicOutput   provider: dyn DecoderProvider      │
//! │ clock:  dyn AudioClock    resolver: dyn LevelTrackResolver   │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! The manager is constructed explicitly and passed to whatever runs the
//! game loop, which calls [`MusicManager::idle`] once per tick.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, info, warn};

use segue_common::{AudioClock, GraphError, MusicResult, MusicSource, SlotId, SlotTarget, RESERVED_SLOTS};
use segue_kernel::{DecoderProvider, MusicOutput};

use crate::classic::LevelTrackResolver;
use crate::game_phase::GamePhase;
use crate::playlist::LevelPlaylist;
use crate::slot::{DynamicSlot, MusicSlot};

/// Owner of all music slots.
pub struct MusicManager {
    slots: Vec<MusicSlot>,
    output: Arc<dyn MusicOutput>,
    provider: Arc<dyn DecoderProvider>,
    clock: Arc<dyn AudioClock>,
    resolver: Option<Box<dyn LevelTrackResolver>>,
    playlist: LevelPlaylist,
}

impl fmt::Debug for MusicManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MusicManager")
            .field("slots", &self.slots)
            .field("playlist", &self.playlist)
            .field("has_resolver", &self.resolver.is_some())
            .finish_non_exhaustive()
    }
}

impl MusicManager {
    /// Creates a manager holding only the reserved intro and level slots.
    pub fn new(
        output: Arc<dyn MusicOutput>,
        provider: Arc<dyn DecoderProvider>,
        clock: Arc<dyn AudioClock>,
    ) -> Self {
        Self {
            slots: vec![MusicSlot::standard(SlotId::INTRO), MusicSlot::standard(SlotId::LEVEL)],
            output,
            provider,
            clock,
            resolver: None,
            playlist: LevelPlaylist::new(),
        }
    }

    /// Sets the resolver used by [`MusicManager::set_classic_level_music`].
    #[must_use]
    pub fn with_resolver(mut self, resolver: impl LevelTrackResolver + 'static) -> Self {
        self.resolver = Some(Box::new(resolver));
        self
    }

    fn slot_at(&self, id: SlotId) -> MusicResult<&MusicSlot> {
        self.slots
            .get(id.index())
            .ok_or(GraphError::InvalidSlot(id).into())
    }

    fn slot_at_mut(&mut self, id: SlotId) -> MusicResult<&mut MusicSlot> {
        self.slots
            .get_mut(id.index())
            .ok_or(GraphError::InvalidSlot(id).into())
    }

    fn level_slot_mut(&mut self) -> &mut MusicSlot {
        &mut self.slots[SlotId::LEVEL.index()]
    }

    /// Opens `source` into a new standard slot.
    ///
    /// Nothing is appended if the source cannot be opened.
    pub fn load(&mut self, source: &MusicSource, looping: bool, volume: f32) -> MusicResult<SlotId> {
        let id = SlotId::new(self.slots.len());
        let mut slot = MusicSlot::standard(id);
        slot.open(source, self.provider.as_ref())?;
        slot.set_parameters(looping, volume);
        self.slots.push(slot);

        info!("Loaded music {source} into slot {id}");
        Ok(id)
    }

    /// Appends a new dynamic slot at `volume`.
    pub fn load_dynamic(&mut self, volume: f32) -> SlotId {
        let id = SlotId::new(self.slots.len());
        let mut slot = MusicSlot::dynamic(id);
        slot.set_parameters(true, volume);
        self.slots.push(slot);

        info!("Created dynamic music slot {id}");
        id
    }

    /// Starts a slot.
    pub fn play(&mut self, id: SlotId) -> MusicResult<()> {
        let output = Arc::clone(&self.output);
        self.slot_at_mut(id)?.play(output.as_ref())
    }

    /// Stops a slot and releases its source or graph.
    pub fn close(&mut self, id: SlotId) -> MusicResult<()> {
        self.slot_at_mut(id)?.close();
        Ok(())
    }

    /// Sets loop flag and volume of a slot.
    pub fn set_parameters(&mut self, id: SlotId, looping: bool, volume: f32) -> MusicResult<()> {
        self.slot_at_mut(id)?.set_parameters(looping, volume);
        Ok(())
    }

    /// Arms a fade on one slot or on every slot.
    ///
    /// Returns true if at least one fade was armed.
    pub fn fade(&mut self, target: SlotTarget, limit: f32, duration: u32, stop_on_zero: bool) -> bool {
        let now = self.clock.current_tick();
        match target {
            SlotTarget::All => self
                .slots
                .iter_mut()
                .fold(false, |armed, slot| slot.fade(limit, duration, stop_on_zero, now) || armed),
            SlotTarget::Slot(id) => self
                .slot_at_mut(id)
                .is_ok_and(|slot| slot.fade(limit, duration, stop_on_zero, now)),
        }
    }

    /// Pauses one slot, or pauses everything and drops all loaded slots.
    pub fn pause(&mut self, target: SlotTarget) {
        match target {
            SlotTarget::All => {
                for slot in &mut self.slots {
                    slot.pause();
                }
                for mut slot in self.slots.drain(RESERVED_SLOTS..) {
                    slot.close();
                }
                debug!("Paused all music");
            },
            SlotTarget::Slot(id) => {
                if let Ok(slot) = self.slot_at_mut(id) {
                    slot.pause();
                }
            },
        }
    }

    /// Checks if one slot, or any slot, is playing.
    #[must_use]
    pub fn playing(&self, target: SlotTarget) -> bool {
        match target {
            SlotTarget::All => self.slots.iter().any(MusicSlot::playing),
            SlotTarget::Slot(id) => self.slot_at(id).is_ok_and(MusicSlot::playing),
        }
    }

    /// User-loaded slot by id.
    ///
    /// Reserved slots are driven through the intro and level operations.
    pub fn slot(&self, id: SlotId) -> MusicResult<&MusicSlot> {
        if id.is_reserved() {
            return Err(GraphError::InvalidSlot(id).into());
        }
        self.slot_at(id)
    }

    /// Mutable user-loaded slot by id.
    pub fn slot_mut(&mut self, id: SlotId) -> MusicResult<&mut MusicSlot> {
        if id.is_reserved() {
            return Err(GraphError::InvalidSlot(id).into());
        }
        self.slot_at_mut(id)
    }

    /// Dynamic data of a user-loaded dynamic slot.
    pub fn dynamic_slot_mut(&mut self, id: SlotId) -> MusicResult<&mut DynamicSlot> {
        self.slot_mut(id)?
            .as_dynamic_mut()
            .ok_or(GraphError::WrongSlotKind {
                slot: id,
                expected: "dynamic",
            }
            .into())
    }

    /// Opens `source` into a dynamic slot's track pool.
    pub fn load_track(&mut self, id: SlotId, source: &MusicSource) -> MusicResult<usize> {
        let provider = Arc::clone(&self.provider);
        self.dynamic_slot_mut(id)?
            .load_track(source, provider.as_ref())
    }

    /// Asks a playing dynamic slot to move to `preset`.
    pub fn set_preset_transition(&self, id: SlotId, preset: usize) -> MusicResult<()> {
        self.slot(id)?.request_preset_transition(preset)
    }

    /// Number of slots, reserved ones included.
    #[must_use]
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// The reserved intro slot.
    #[must_use]
    pub fn intro_slot(&self) -> &MusicSlot {
        &self.slots[SlotId::INTRO.index()]
    }

    /// The reserved level slot.
    #[must_use]
    pub fn level_slot(&self) -> &MusicSlot {
        &self.slots[SlotId::LEVEL.index()]
    }

    /// Opens the intro music.
    pub fn setup_intro_music(&mut self, source: &MusicSource) -> MusicResult<()> {
        let provider = Arc::clone(&self.provider);
        self.slots[SlotId::INTRO.index()].open(source, provider.as_ref())
    }

    /// Replays the intro music from full volume if it is not playing.
    pub fn restart_intro_music(&mut self) {
        let output = Arc::clone(&self.output);
        let intro = &mut self.slots[SlotId::INTRO.index()];
        if !intro.is_initialized() || intro.playing() {
            return;
        }

        intro.set_parameters(true, 1.0);
        if let Err(e) = intro.play(output.as_ref()) {
            warn!("Failed to start intro music: {e}");
        }
    }

    /// Stops level music and releases its source.
    pub fn stop_level_music(&mut self) {
        self.level_slot_mut().close();
    }

    /// Empties the level playlist and restores looping at full volume.
    pub fn clear_level_music(&mut self) {
        self.playlist.clear();
        self.level_slot_mut().set_parameters(true, 1.0);
    }

    /// Queues a level track.
    ///
    /// Once two tracks are queued the level slot stops looping and goes
    /// back to full volume.
    pub fn push_back_level_music(&mut self, source: MusicSource) {
        if self.playlist.push_back(source) {
            self.level_slot_mut().set_parameters(false, 1.0);
        }
    }

    /// Picks the next level track from the playlist.
    pub fn next_level_music(&mut self) -> Option<MusicSource> {
        self.playlist.next_track()
    }

    /// Enables or disables random level track order.
    pub fn level_music_random(&mut self, random: bool) {
        self.playlist.set_random(random);
    }

    /// Reseeds level track shuffling from the audio clock.
    pub fn seed_level_music(&mut self) {
        self.playlist.seed(self.clock.current_tick());
    }

    /// Queues classic song `song` unless a playlist is already set.
    ///
    /// Negative song numbers are ignored.
    pub fn set_classic_level_music(&mut self, song: i32) {
        if !self.playlist.is_empty() {
            return;
        }
        let Ok(song) = u32::try_from(song) else {
            return;
        };
        let Some(resolver) = &self.resolver else {
            debug!("No classic music resolver for song {song}");
            return;
        };

        if let Some(source) = resolver.resolve(song) {
            self.push_back_level_music(source);
            self.playlist.set_classic_song(song);
        }
    }

    /// Checks if the level playlist came from a classic song.
    #[must_use]
    pub fn has_classic_level_music(&self) -> bool {
        self.playlist.classic_song().is_some()
    }

    /// The level playlist.
    #[must_use]
    pub const fn playlist(&self) -> &LevelPlaylist {
        &self.playlist
    }

    /// Per-tick maintenance: starts level music and advances fades.
    pub fn idle(&mut self, phase: GamePhase) {
        if !self.output.is_initialized() || !self.output.is_active() || self.output.is_paused() {
            return;
        }

        if phase.is_in_progress() && !self.level_slot().playing() {
            self.start_level_music();
        }

        let now = self.clock.current_tick();
        for slot in &mut self.slots {
            slot.step_fade(now);
        }
    }

    fn start_level_music(&mut self) {
        let Some(source) = self.playlist.next_track() else {
            return;
        };
        let looping = self.playlist.len() == 1;
        let output = Arc::clone(&self.output);
        let provider = Arc::clone(&self.provider);

        let level = self.level_slot_mut();
        if let Err(e) = level.open(&source, provider.as_ref()) {
            debug!("Skipping level music {source}: {e}");
            return;
        }
        level.set_parameters(looping, 1.0);
        match level.play(output.as_ref()) {
            Ok(()) => info!("Playing level music {source}"),
            Err(e) => debug!("Failed to start level music {source}: {e}"),
        }
    }

    /// Stops and releases every slot; only the reserved ones remain.
    pub fn shutdown(&mut self) {
        for slot in &mut self.slots {
            slot.close();
        }
        self.slots.truncate(RESERVED_SLOTS);
    }
}

impl Drop for MusicManager {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classic::ClassicTrackResolver;
    use segue_common::{AudioFormat, ManualClock};
    use segue_kernel::{MemoryDecoderProvider, OfflineOutput};
    use std::fs;

    const TRACK_BYTES: usize = 64;

    struct Rig {
        output: Arc<OfflineOutput>,
        clock: Arc<ManualClock>,
        manager: MusicManager,
    }

    fn rig() -> Rig {
        let provider = Arc::new(MemoryDecoderProvider::new());
        for (name, byte) in [("a.ogg", 1u8), ("b.ogg", 2), ("intro.ogg", 9)] {
            provider.insert(name, AudioFormat::CD, vec![byte; TRACK_BYTES]);
        }
        let output = Arc::new(OfflineOutput::new());
        let clock = Arc::new(ManualClock::starting_at(1_000));
        let manager = MusicManager::new(output.clone(), provider, clock.clone());
        Rig { output, clock, manager }
    }

    fn source(name: &str) -> MusicSource {
        MusicSource::new(name)
    }

    #[test]
    fn test_new_manager_has_reserved_slots() {
        let rig = rig();
        assert_eq!(rig.manager.slot_count(), RESERVED_SLOTS);
        assert!(!rig.manager.playing(SlotTarget::All));
        assert!(rig.manager.slot(SlotId::LEVEL).is_err());
    }

    #[test]
    fn test_load_appends_slot() {
        let mut rig = rig();
        let id = rig.manager.load(&source("a.ogg"), false, 0.5).expect("registered");
        assert_eq!(id, SlotId::new(2));

        let slot = rig.manager.slot(id).expect("loaded slot");
        assert!(slot.is_initialized());
        assert!(!slot.parameters().looping);
        assert!((slot.volume() - 0.5).abs() < f32::EPSILON);
    }

    #[test]
    fn test_load_failure_appends_nothing() {
        let mut rig = rig();
        let err = rig
            .manager
            .load(&source("missing.ogg"), true, 1.0)
            .expect_err("not registered");
        assert!(err.is_resource());
        assert_eq!(rig.manager.slot_count(), RESERVED_SLOTS);
    }

    #[test]
    fn test_play_and_pause_single_slot() {
        let mut rig = rig();
        let id = rig.manager.load(&source("a.ogg"), true, 1.0).expect("registered");
        rig.manager.play(id).expect("output available");
        assert!(rig.manager.playing(id.into()));
        assert!(rig.manager.playing(SlotTarget::All));

        rig.manager.pause(id.into());
        assert!(!rig.manager.playing(id.into()));
        assert_eq!(rig.manager.slot_count(), 3);
    }

    #[test]
    fn test_pause_all_drops_loaded_slots() {
        let mut rig = rig();
        let a = rig.manager.load(&source("a.ogg"), true, 1.0).expect("registered");
        rig.manager.load_dynamic(1.0);
        rig.manager.play(a).expect("output available");

        rig.manager.pause(SlotTarget::All);
        assert_eq!(rig.manager.slot_count(), RESERVED_SLOTS);
        assert!(!rig.manager.playing(SlotTarget::All));
        assert!(rig.manager.slot(a).is_err());
    }

    #[test]
    fn test_fade_to_silence_pauses_after_duration() {
        let mut rig = rig();
        let id = rig.manager.load(&source("a.ogg"), true, 1.0).expect("registered");
        rig.manager.play(id).expect("output available");
        assert!(rig.manager.fade(id.into(), 0.0, 30, true));

        let mut last = 1.0;
        for _ in 1..30 {
            rig.clock.advance();
            rig.manager.idle(GamePhase::Menu);
            let volume = rig.manager.slot(id).expect("loaded slot").volume();
            assert!(volume > 0.0 && volume < last, "volume {volume} after {last}");
            assert!(rig.manager.playing(id.into()));
            last = volume;
        }

        rig.clock.advance();
        rig.manager.idle(GamePhase::Menu);
        let slot = rig.manager.slot(id).expect("loaded slot");
        assert_eq!(slot.volume(), 0.0);
        assert!(!slot.is_fading());
        assert!(!rig.manager.playing(id.into()));
    }

    #[test]
    fn test_fade_up_keeps_playing() {
        let mut rig = rig();
        let id = rig.manager.load(&source("a.ogg"), true, 0.0).expect("registered");
        rig.manager.play(id).expect("output available");
        assert!(rig.manager.fade(id.into(), 1.0, 10, true));

        rig.clock.advance_by(10);
        rig.manager.idle(GamePhase::Menu);
        assert_eq!(rig.manager.slot(id).expect("loaded slot").volume(), 1.0);
        assert!(rig.manager.playing(id.into()));
    }

    #[test]
    fn test_fade_requires_playing_slot() {
        let mut rig = rig();
        let id = rig.manager.load(&source("a.ogg"), true, 1.0).expect("registered");
        assert!(!rig.manager.fade(id.into(), 0.0, 10, true));
        assert!(!rig.manager.fade(SlotTarget::All, 0.0, 10, true));
        assert!(!rig.manager.fade(SlotId::new(9).into(), 0.0, 10, true));
    }

    #[test]
    fn test_second_level_track_resets_level_parameters() {
        let mut rig = rig();
        rig.manager.set_parameters(SlotId::LEVEL, true, 0.3).expect("level slot");

        rig.manager.push_back_level_music(source("a.ogg"));
        let parameters = rig.manager.level_slot().parameters();
        assert!(parameters.looping);
        assert!((parameters.volume - 0.3).abs() < f32::EPSILON);

        rig.manager.push_back_level_music(source("b.ogg"));
        let parameters = rig.manager.level_slot().parameters();
        assert!(!parameters.looping);
        assert!((parameters.volume - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_idle_starts_level_music_in_order() {
        let mut rig = rig();
        rig.manager.push_back_level_music(source("a.ogg"));
        rig.manager.push_back_level_music(source("b.ogg"));
        assert!(!rig.manager.level_slot().parameters().looping);

        rig.manager.idle(GamePhase::Menu);
        assert!(!rig.manager.level_slot().playing());

        rig.manager.idle(GamePhase::InProgress);
        assert!(rig.manager.level_slot().playing());
        assert_eq!(rig.output.render(TRACK_BYTES)[0].data, vec![1u8; TRACK_BYTES]);

        // Non-looping: the next pull is empty and ends the stream.
        assert!(rig.output.render(TRACK_BYTES)[0].ended);
        assert!(!rig.manager.level_slot().playing());

        rig.manager.idle(GamePhase::InProgress);
        assert_eq!(rig.output.render(TRACK_BYTES)[0].data, vec![2u8; TRACK_BYTES]);
    }

    #[test]
    fn test_single_level_track_loops() {
        let mut rig = rig();
        rig.manager.push_back_level_music(source("a.ogg"));
        rig.manager.idle(GamePhase::InProgress);

        assert!(rig.manager.level_slot().parameters().looping);
        let blocks = rig.output.render(TRACK_BYTES * 3);
        assert!(!blocks[0].ended);
        assert!(rig.manager.level_slot().playing());
    }

    #[test]
    fn test_idle_noop_when_output_unavailable() {
        let mut rig = rig();
        rig.manager.push_back_level_music(source("a.ogg"));

        rig.output.set_active(false);
        rig.manager.idle(GamePhase::InProgress);
        assert!(!rig.manager.level_slot().playing());

        rig.output.set_active(true);
        rig.output.set_paused(true);
        rig.manager.idle(GamePhase::InProgress);
        assert!(!rig.manager.level_slot().playing());
    }

    #[test]
    fn test_idle_without_playlist_does_nothing() {
        let mut rig = rig();
        rig.manager.idle(GamePhase::InProgress);
        assert!(!rig.manager.level_slot().playing());
    }

    #[test]
    fn test_clear_level_music_resets_playlist_and_parameters() {
        let mut rig = rig();
        rig.manager.push_back_level_music(source("a.ogg"));
        rig.manager.push_back_level_music(source("b.ogg"));
        rig.manager.push_back_level_music(source("a.ogg"));

        rig.manager.clear_level_music();
        assert_eq!(rig.manager.next_level_music(), None);
        let params = rig.manager.level_slot().parameters();
        assert!(params.looping);
        assert_eq!(params.volume, 1.0);
    }

    #[test]
    fn test_sequential_level_music_wraps() {
        let mut rig = rig();
        rig.manager.push_back_level_music(source("a.ogg"));
        rig.manager.push_back_level_music(source("b.ogg"));

        assert_eq!(rig.manager.next_level_music(), Some(source("a.ogg")));
        assert_eq!(rig.manager.next_level_music(), Some(source("b.ogg")));
        assert_eq!(rig.manager.next_level_music(), Some(source("a.ogg")));
    }

    #[test]
    fn test_random_level_music_is_reproducible_per_seed() {
        let mut first = rig();
        let mut second = rig();
        for rig in [&mut first, &mut second] {
            for name in ["a.ogg", "b.ogg", "intro.ogg"] {
                rig.manager.push_back_level_music(source(name));
            }
            rig.manager.level_music_random(true);
            rig.manager.seed_level_music();
        }

        for _ in 0..16 {
            assert_eq!(first.manager.next_level_music(), second.manager.next_level_music());
        }
    }

    #[test]
    fn test_stop_level_music_closes_slot() {
        let mut rig = rig();
        rig.manager.push_back_level_music(source("a.ogg"));
        rig.manager.idle(GamePhase::InProgress);

        rig.manager.stop_level_music();
        assert!(!rig.manager.level_slot().playing());
        assert!(!rig.manager.level_slot().is_initialized());
    }

    #[test]
    fn test_intro_music_restart() {
        let mut rig = rig();
        rig.manager.restart_intro_music();
        assert!(!rig.manager.intro_slot().playing());

        rig.manager.setup_intro_music(&source("intro.ogg")).expect("registered");
        rig.manager.restart_intro_music();
        assert!(rig.manager.intro_slot().playing());
        assert_eq!(rig.output.render(4)[0].data, vec![9u8; 4]);
    }

    #[test]
    fn test_classic_level_music() {
        let dir = tempfile::tempdir().expect("temp dir");
        fs::write(dir.path().join("05.mp3"), b"mp3").expect("write");

        let mut rig = rig();
        rig.manager = MusicManager::new(
            rig.output.clone(),
            Arc::new(MemoryDecoderProvider::new()),
            rig.clock.clone(),
        )
        .with_resolver(ClassicTrackResolver::new(dir.path()));

        rig.manager.set_classic_level_music(-1);
        rig.manager.set_classic_level_music(6);
        assert!(!rig.manager.has_classic_level_music());

        rig.manager.set_classic_level_music(5);
        assert!(rig.manager.has_classic_level_music());
        assert_eq!(
            rig.manager.next_level_music().map(|s| s.path().to_path_buf()),
            Some(dir.path().join("05.mp3"))
        );

        rig.manager.clear_level_music();
        assert!(!rig.manager.has_classic_level_music());
    }

    #[test]
    fn test_classic_ignored_when_playlist_set() {
        let dir = tempfile::tempdir().expect("temp dir");
        fs::write(dir.path().join("01.ogg"), b"ogg").expect("write");

        let mut rig = rig();
        rig.manager = MusicManager::new(
            rig.output.clone(),
            Arc::new(MemoryDecoderProvider::new()),
            rig.clock.clone(),
        )
        .with_resolver(ClassicTrackResolver::new(dir.path()));

        rig.manager.push_back_level_music(source("a.ogg"));
        rig.manager.set_classic_level_music(1);
        assert!(!rig.manager.has_classic_level_music());
        assert_eq!(rig.manager.playlist().len(), 1);
    }

    #[test]
    fn test_dynamic_slot_through_manager() {
        let mut rig = rig();
        let id = rig.manager.load_dynamic(0.8);
        let calm = rig.manager.load_track(id, &source("a.ogg")).expect("registered");
        let tense = rig.manager.load_track(id, &source("b.ogg")).expect("registered");
        assert!(rig.manager.load_track(id, &source("missing.ogg")).is_err());

        let dynamic = rig.manager.dynamic_slot_mut(id).expect("dynamic slot");
        let explore = dynamic.add_preset();
        let combat = dynamic.add_preset();
        dynamic.add_segment_to_preset(explore, calm).expect("valid");
        dynamic.add_segment_to_preset(combat, tense).expect("valid");
        dynamic.set_next_segment(explore, 0, combat, 0).expect("valid");
        assert!(dynamic.set_next_segment(explore, 0, combat, 1).is_err());

        assert!(rig.manager.set_preset_transition(id, combat).is_err());
        rig.manager.play(id).expect("valid graph");
        rig.manager.set_preset_transition(id, combat).expect("playing");

        let blocks = rig.output.render(TRACK_BYTES + 8);
        assert_eq!(&blocks[0].data[TRACK_BYTES..], &[2u8; 8]);
        assert!((blocks[0].gain.gain - 0.8 * 0.7).abs() < 1e-6);
    }

    #[test]
    fn test_dynamic_accessors_reject_standard_and_reserved_slots() {
        let mut rig = rig();
        let id = rig.manager.load(&source("a.ogg"), true, 1.0).expect("registered");
        assert!(rig.manager.dynamic_slot_mut(id).expect_err("standard").is_configuration());
        assert!(rig.manager.dynamic_slot_mut(SlotId::LEVEL).is_err());
        assert!(rig.manager.load_track(SlotId::new(7), &source("a.ogg")).is_err());
    }

    #[test]
    fn test_drop_stops_players() {
        let rig = rig();
        let Rig { output, mut manager, .. } = rig;
        let id = manager.load(&source("a.ogg"), true, 1.0).expect("registered");
        manager.play(id).expect("output available");
        drop(manager);

        assert!(output.render(4).is_empty());
        assert_eq!(output.player_count(), 0);
    }
}
