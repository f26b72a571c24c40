//! Music Players
//!
//! A player turns either a single looping track or a dynamic preset graph
//! into a continuous pull-based PCM stream.
//!
//! # Architecture
//!
//! ```text
//!  control context                         audio context
//! ┌──────────────┐    Arc<PlayerShared>    ┌──────────────┐
//! │ PlayerHandle │────────────┬────────────│ MusicPlayer  │
//! │  (slots)     │            │            │  (device)    │
//! └──────────────┘            ▼            └──────────────┘
//!                 parameters  · ParameterCell
//!                 transition  · TransitionCell
//!                 state       · AtomicU8
//!                 format      · AtomicU64
//!                 position    · AtomicU64
//! ```
//!
//! The device owns the [`MusicPlayer`] and is the only caller of
//! [`MusicPlayer::get_next_data`]. Slots keep a [`PlayerHandle`] and only
//! ever publish into the shared atomics, so neither context waits on the
//! other.

use std::fmt;
use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;

use segue_common::{AudioFormat, GraphError};

use crate::music_decoder::SharedDecoder;
use crate::music_graph::{Preset, PresetGraph};
use crate::music_handoff::{MusicParameters, ParameterCell, ParameterReader, TransitionCell};
use crate::music_output::{OutputGain, VolumeSettings};

/// Upper bound on rewinds or segment switches within one pull.
///
/// Keeps a graph of zero-length segments from spinning the audio context.
pub const MAX_SOURCE_SWITCHES_PER_PULL: usize = 64;

/// Mixing priority of music players.
///
/// Above the maximum sound-effect volume (1.0), so a shared device that
/// runs out of voices keeps music over effects.
pub const MUSIC_PRIORITY: f32 = 5.0;

const NO_POSITION: u64 = u64::MAX;

/// Lifecycle of a player as seen from both contexts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerState {
    /// Device is pulling from the player.
    Playing,
    /// Control context asked the device to stop.
    StopRequested,
    /// Device will not pull again.
    Stopped,
}

impl PlayerState {
    const fn to_raw(self) -> u8 {
        match self {
            Self::Playing => 0,
            Self::StopRequested => 1,
            Self::Stopped => 2,
        }
    }

    const fn from_raw(raw: u8) -> Self {
        match raw {
            0 => Self::Playing,
            1 => Self::StopRequested,
            _ => Self::Stopped,
        }
    }
}

#[derive(Debug)]
struct PlayerShared {
    parameters: ParameterCell,
    transition: TransitionCell,
    preset_count: usize,
    state: AtomicU8,
    format: AtomicU64,
    position: AtomicU64,
}

impl PlayerShared {
    fn new(parameters: MusicParameters, format: AudioFormat, preset_count: usize) -> Self {
        Self {
            parameters: ParameterCell::new(parameters),
            transition: TransitionCell::new(),
            preset_count,
            state: AtomicU8::new(PlayerState::Playing.to_raw()),
            format: AtomicU64::new(format.to_bits()),
            position: AtomicU64::new(NO_POSITION),
        }
    }

    fn state(&self) -> PlayerState {
        PlayerState::from_raw(self.state.load(Ordering::Acquire))
    }

    fn is_stopping(&self) -> bool {
        self.state() != PlayerState::Playing
    }

    fn publish_position(&self, preset: usize, segment: usize) {
        let packed = ((preset as u64) << 32) | segment as u64;
        self.position.store(packed, Ordering::Release);
    }

    fn position(&self) -> Option<(usize, usize)> {
        match self.position.load(Ordering::Acquire) {
            NO_POSITION => None,
            packed => Some(((packed >> 32) as usize, (packed & 0xFFFF_FFFF) as usize)),
        }
    }
}

/// Control-side handle to a running player.
#[derive(Debug, Clone)]
pub struct PlayerHandle {
    shared: Arc<PlayerShared>,
}

impl PlayerHandle {
    /// Publishes new volume/loop parameters. Never blocks.
    pub fn update_parameters(&self, parameters: MusicParameters) {
        self.shared.parameters.store(parameters);
    }

    /// Most recently published parameters.
    #[must_use]
    pub fn parameters(&self) -> MusicParameters {
        self.shared.parameters.load()
    }

    /// Asks a dynamic player to move to `preset` at the next segment boundary.
    ///
    /// Later requests replace earlier ones that have not been honored yet.
    pub fn request_preset_transition(&self, preset: usize) -> Result<(), GraphError> {
        if preset >= self.shared.preset_count {
            return Err(GraphError::InvalidPreset(preset));
        }
        self.shared.transition.request(preset);
        Ok(())
    }

    /// Preset request not yet honored, if any.
    #[must_use]
    pub fn pending_transition(&self) -> Option<usize> {
        self.shared.transition.pending()
    }

    /// Checks if this handle drives a preset graph.
    #[must_use]
    pub fn is_dynamic(&self) -> bool {
        self.shared.preset_count > 0
    }

    /// Checks if the device is still pulling from the player.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.shared.state() == PlayerState::Playing
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> PlayerState {
        self.shared.state()
    }

    /// Stops the player.
    ///
    /// Returns immediately. The device observes the request before its
    /// next pull and drops the player; decoders are released when the last
    /// handle to them goes away, so an in-flight pull stays valid.
    pub fn ask_stop(&self) {
        let _ = self.shared.state.compare_exchange(
            PlayerState::Playing.to_raw(),
            PlayerState::StopRequested.to_raw(),
            Ordering::AcqRel,
            Ordering::Acquire,
        );
    }

    /// Format of the segment currently being decoded.
    #[must_use]
    pub fn format(&self) -> AudioFormat {
        AudioFormat::from_bits(self.shared.format.load(Ordering::Acquire))
    }

    /// Current `(preset, segment)` of a dynamic player.
    #[must_use]
    pub fn current_segment(&self) -> Option<(usize, usize)> {
        self.shared.position()
    }

    /// Reader that reports only parameters published after this call.
    #[must_use]
    pub fn parameter_reader(&self) -> ParameterReader {
        ParameterReader::new(&self.shared.parameters)
    }

    /// Checks `reader` for parameters published since its last poll.
    pub fn poll_parameters(&self, reader: &mut ParameterReader) -> bool {
        reader.poll(&self.shared.parameters).is_some()
    }

    /// Gain the device should apply for the current parameters.
    #[must_use]
    pub fn output_gain(&self, volumes: &VolumeSettings) -> OutputGain {
        OutputGain::music(volumes, self.shared.parameters.load().volume)
    }

    /// Checks if both handles refer to the same player.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.shared, &other.shared)
    }
}

#[derive(Debug)]
struct GraphCursor {
    presets: Vec<Preset>,
    preset: usize,
    segment: usize,
}

/// Audio-side player; owned by the output device.
pub struct MusicPlayer {
    shared: Arc<PlayerShared>,
    reader: ParameterReader,
    decoder: SharedDecoder,
    format: AudioFormat,
    format_changed: bool,
    graph: Option<GraphCursor>,
}

impl fmt::Debug for MusicPlayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MusicPlayer")
            .field("format", &self.format)
            .field("state", &self.shared.state())
            .field("position", &self.shared.position())
            .finish_non_exhaustive()
    }
}

impl MusicPlayer {
    /// Creates a player over one track, rewound to its start.
    #[must_use]
    pub fn new(decoder: SharedDecoder, parameters: MusicParameters) -> Self {
        Self::build(decoder, parameters, None)
    }

    /// Creates a player walking `presets` from `(start_preset, start_segment)`.
    pub fn new_dynamic(
        presets: &[Preset],
        start_preset: usize,
        start_segment: usize,
        parameters: MusicParameters,
    ) -> Result<Self, GraphError> {
        let segment = presets
            .get(start_preset)
            .ok_or(GraphError::InvalidPreset(start_preset))?
            .segment(start_segment)
            .ok_or(GraphError::InvalidSegment {
                preset: start_preset,
                segment: start_segment,
            })?;

        let decoder = segment.decoder().clone();
        let cursor = GraphCursor {
            presets: presets.to_vec(),
            preset: start_preset,
            segment: start_segment,
        };
        Ok(Self::build(decoder, parameters, Some(cursor)))
    }

    /// Creates a player from a graph's presets and entry point.
    pub fn from_graph(graph: &PresetGraph, parameters: MusicParameters) -> Result<Self, GraphError> {
        graph.validate_start()?;
        let (preset, segment) = graph.starting_segment();
        Self::new_dynamic(graph.presets(), preset, segment, parameters)
    }

    fn build(decoder: SharedDecoder, parameters: MusicParameters, graph: Option<GraphCursor>) -> Self {
        decoder.rewind();
        let format = decoder.format();
        let preset_count = graph.as_ref().map_or(0, |g| g.presets.len());
        let shared = Arc::new(PlayerShared::new(parameters, format, preset_count));
        if let Some(cursor) = &graph {
            shared.publish_position(cursor.preset, cursor.segment);
        }

        Self {
            reader: ParameterReader::new(&shared.parameters),
            shared,
            decoder,
            format,
            format_changed: false,
            graph,
        }
    }

    /// Control-side handle sharing this player's state.
    #[must_use]
    pub fn handle(&self) -> PlayerHandle {
        PlayerHandle {
            shared: Arc::clone(&self.shared),
        }
    }

    /// Output format of the data returned by the next pull.
    #[must_use]
    pub const fn format(&self) -> AudioFormat {
        self.format
    }

    /// Mixing priority.
    #[must_use]
    pub const fn priority(&self) -> f32 {
        MUSIC_PRIORITY
    }

    /// Fills `buffer` with PCM and returns the number of bytes written.
    ///
    /// A short count means either the stream ended (non-looping source
    /// exhausted) or, for dynamic players, that the next segment has a
    /// different format; [`MusicPlayer::take_format_change`] tells the two
    /// apart. Runs on the audio context: no locks beyond the decoder's,
    /// no allocation, no logging.
    ///
    /// The run state is checked while the decoder lock is held, so once
    /// [`PlayerHandle::ask_stop`] has returned this player never reads
    /// from or rewinds a decoder again, even one a newer player shares.
    pub fn get_next_data(&mut self, buffer: &mut [u8]) -> usize {
        let looping = self.shared.parameters.load().looping;
        let mut written = 0;
        let mut switches = 0;
        let mut after_rewind = false;

        loop {
            let shared = &self.shared;
            let Some(produced) = self
                .decoder
                .decode_unless(&mut buffer[written..], || shared.is_stopping())
            else {
                break;
            };
            written += produced;
            if written == buffer.len() || switches == MAX_SOURCE_SWITCHES_PER_PULL {
                break;
            }
            switches += 1;

            if self.graph.is_some() {
                if self.advance_segment() {
                    self.format_changed = true;
                    break;
                }
            } else {
                // Empty source: a rewind produced nothing, stop spinning.
                if !looping || (after_rewind && produced == 0) {
                    break;
                }
                let shared = &self.shared;
                if !self.decoder.rewind_unless(|| shared.is_stopping()) {
                    break;
                }
                after_rewind = true;
            }
        }

        written
    }

    /// Moves to the next segment; returns true if the format changed.
    fn advance_segment(&mut self) -> bool {
        let Some(cursor) = self.graph.as_mut() else {
            return false;
        };

        let current = &cursor.presets[cursor.preset].segments()[cursor.segment];
        let requested = self
            .shared
            .transition
            .pending()
            .and_then(|preset| current.next_segment(preset).map(|segment| (preset, segment)));

        let (preset, segment) = match requested {
            Some(next) => {
                self.shared.transition.settle(next.0);
                next
            },
            None => (
                cursor.preset,
                current.next_segment(cursor.preset).unwrap_or(0),
            ),
        };

        // Track-pool decoders outlive players, so the incoming one may
        // have been left mid-stream.
        let shared = &self.shared;
        self.decoder.rewind_unless(|| shared.is_stopping());
        self.decoder = cursor.presets[preset].segments()[segment].decoder().clone();
        self.decoder.rewind_unless(|| shared.is_stopping());
        cursor.preset = preset;
        cursor.segment = segment;
        self.shared.publish_position(preset, segment);

        let format = self.decoder.format();
        if format == self.format {
            return false;
        }
        self.format = format;
        self.shared.format.store(format.to_bits(), Ordering::Release);
        true
    }

    /// Returns and clears the "format changed during the last pull" flag.
    pub fn take_format_change(&mut self) -> bool {
        std::mem::take(&mut self.format_changed)
    }

    /// Checks for parameters published since the last call.
    ///
    /// Devices use this to recompute gain only when something changed.
    pub fn load_parameter_updates(&mut self) -> bool {
        self.reader.poll(&self.shared.parameters).is_some()
    }

    /// Computes the idle-time gain: music category × master × track volume.
    #[must_use]
    pub fn set_up_output_idle(&self, volumes: &VolumeSettings) -> OutputGain {
        OutputGain::music(volumes, self.shared.parameters.load().volume)
    }

    /// Checks if the control context asked for a stop or the stream ended.
    #[must_use]
    pub fn should_stop(&self) -> bool {
        self.shared.is_stopping()
    }

    /// Confirms that the device will not pull from this player again.
    pub fn mark_stopped(&self) {
        self.shared
            .state
            .store(PlayerState::Stopped.to_raw(), Ordering::Release);
    }

    /// Current `(preset, segment)` of a dynamic player.
    #[must_use]
    pub fn current_segment(&self) -> Option<(usize, usize)> {
        self.graph.as_ref().map(|g| (g.preset, g.segment))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::music_decoder::MemoryDecoder;
    use crate::music_output::AudioCategory;
    use proptest::prelude::*;
    use segue_common::SampleEncoding;

    fn pcm(format: AudioFormat, bytes: &[u8]) -> SharedDecoder {
        SharedDecoder::new(MemoryDecoder::new(format, bytes.to_vec()))
    }

    fn looped(looping: bool) -> MusicParameters {
        MusicParameters::new(looping, 1.0)
    }

    #[test]
    fn test_simple_player_fills_exactly() {
        let mut player = MusicPlayer::new(pcm(AudioFormat::CD, &[1, 2, 3, 4, 5, 6, 7, 8]), looped(true));
        let mut buf = [0u8; 4];
        assert_eq!(player.get_next_data(&mut buf), 4);
        assert_eq!(buf, [1, 2, 3, 4]);
    }

    #[test]
    fn test_looping_wraps_source() {
        let mut player = MusicPlayer::new(pcm(AudioFormat::CD, &[1, 2, 3]), looped(true));
        let mut buf = [0u8; 8];
        assert_eq!(player.get_next_data(&mut buf), 8);
        assert_eq!(buf, [1, 2, 3, 1, 2, 3, 1, 2]);

        let mut next = [0u8; 2];
        assert_eq!(player.get_next_data(&mut next), 2);
        assert_eq!(next, [3, 1]);
    }

    #[test]
    fn test_non_looping_short_read_once() {
        let mut player = MusicPlayer::new(pcm(AudioFormat::CD, &[9; 6]), looped(false));
        let mut buf = [0u8; 4];
        assert_eq!(player.get_next_data(&mut buf), 4);
        assert_eq!(player.get_next_data(&mut buf), 2);
        assert!(!player.take_format_change());
        assert_eq!(player.get_next_data(&mut buf), 0);
        assert_eq!(player.get_next_data(&mut buf), 0);
    }

    #[test]
    fn test_loop_flag_read_per_pull() {
        let mut player = MusicPlayer::new(pcm(AudioFormat::CD, &[5; 4]), looped(true));
        let handle = player.handle();
        handle.update_parameters(looped(false));

        let mut buf = [0u8; 6];
        assert_eq!(player.get_next_data(&mut buf), 4);
    }

    #[test]
    fn test_empty_looping_source_terminates() {
        let mut player = MusicPlayer::new(pcm(AudioFormat::CD, &[]), looped(true));
        let mut buf = [0u8; 16];
        assert_eq!(player.get_next_data(&mut buf), 0);
    }

    #[test]
    fn test_player_rewinds_shared_decoder_on_start() {
        let decoder = pcm(AudioFormat::CD, &[1, 2, 3, 4]);
        let mut scratch = [0u8; 3];
        decoder.decode(&mut scratch);

        let mut player = MusicPlayer::new(decoder, looped(false));
        let mut buf = [0u8; 4];
        assert_eq!(player.get_next_data(&mut buf), 4);
        assert_eq!(buf, [1, 2, 3, 4]);
    }

    #[test]
    fn test_parameter_updates_detected_once() {
        let mut player = MusicPlayer::new(pcm(AudioFormat::CD, &[0; 4]), looped(true));
        assert!(!player.load_parameter_updates());
        player.handle().update_parameters(MusicParameters::new(true, 0.5));
        assert!(player.load_parameter_updates());
        assert!(!player.load_parameter_updates());
    }

    #[test]
    fn test_handle_reader_sees_only_later_parameters() {
        let player = MusicPlayer::new(pcm(AudioFormat::CD, &[0; 4]), looped(true));
        let handle = player.handle();
        handle.update_parameters(MusicParameters::new(true, 0.5));

        let mut reader = handle.parameter_reader();
        assert!(!handle.poll_parameters(&mut reader));

        handle.update_parameters(MusicParameters::new(true, 0.25));
        assert!(handle.poll_parameters(&mut reader));
        assert!(!handle.poll_parameters(&mut reader));
    }

    #[test]
    fn test_output_gain() {
        let player = MusicPlayer::new(pcm(AudioFormat::CD, &[0; 4]), MusicParameters::new(true, 0.5));
        let mut volumes = VolumeSettings::default();
        volumes.set(AudioCategory::Master, 0.8);
        volumes.set(AudioCategory::Music, 0.5);

        let gain = player.set_up_output_idle(&volumes);
        assert!((gain.max_gain - 0.4).abs() < 1e-6);
        assert!((gain.gain - 0.2).abs() < 1e-6);
        assert_eq!(player.priority(), MUSIC_PRIORITY);
    }

    #[test]
    fn test_stop_protocol() {
        let player = MusicPlayer::new(pcm(AudioFormat::CD, &[0; 4]), looped(true));
        let handle = player.handle();
        assert!(handle.is_active());

        handle.ask_stop();
        assert!(!handle.is_active());
        assert_eq!(handle.state(), PlayerState::StopRequested);
        assert!(player.should_stop());

        player.mark_stopped();
        assert_eq!(handle.state(), PlayerState::Stopped);

        // A late stop request does not resurrect the player.
        handle.ask_stop();
        assert_eq!(handle.state(), PlayerState::Stopped);
    }

    #[test]
    fn test_stopped_player_leaves_shared_decoder_alone() {
        let decoder = pcm(AudioFormat::CD, &[1, 2, 3, 4, 5, 6, 7, 8]);
        let mut old = MusicPlayer::new(decoder.clone(), looped(true));
        let mut buf = [0u8; 2];
        assert_eq!(old.get_next_data(&mut buf), 2);

        // Stop, then restart on the same decoder before the device drops
        // the old player.
        old.handle().ask_stop();
        let mut restarted = MusicPlayer::new(decoder, looped(true));

        let mut late = [0u8; 4];
        assert_eq!(old.get_next_data(&mut late), 0);

        let mut buf = [0u8; 4];
        assert_eq!(restarted.get_next_data(&mut buf), 4);
        assert_eq!(buf, [1, 2, 3, 4]);
    }

    #[test]
    fn test_simple_handle_rejects_transitions() {
        let player = MusicPlayer::new(pcm(AudioFormat::CD, &[0; 4]), looped(true));
        let handle = player.handle();
        assert!(!handle.is_dynamic());
        assert_eq!(handle.request_preset_transition(0), Err(GraphError::InvalidPreset(0)));
        assert_eq!(handle.current_segment(), None);
    }

    const MONO: AudioFormat = AudioFormat::new(22_050, 1, SampleEncoding::S16);

    /// Preset A: [a0, a1], preset B: [b0, b1, b2 (mono)].
    /// Edges: a0 -A-> a1, a1 -A-> a0, a0 -B-> b2, b2 -B-> b0.
    fn dynamic_graph() -> PresetGraph {
        let mut graph = PresetGraph::new();
        let tracks = [
            pcm(AudioFormat::CD, &[0xA0; 4]),
            pcm(AudioFormat::CD, &[0xA1; 4]),
            pcm(AudioFormat::CD, &[0xB0; 4]),
            pcm(AudioFormat::CD, &[0xB1; 4]),
            pcm(MONO, &[0xB2; 4]),
        ]
        .map(|t| graph.add_track(t));

        let a = graph.add_preset();
        let b = graph.add_preset();
        graph.add_segment_to_preset(a, tracks[0]).expect("valid");
        graph.add_segment_to_preset(a, tracks[1]).expect("valid");
        graph.add_segment_to_preset(b, tracks[2]).expect("valid");
        graph.add_segment_to_preset(b, tracks[3]).expect("valid");
        graph.add_segment_to_preset(b, tracks[4]).expect("valid");

        graph.set_next_segment(a, 0, a, 1).expect("valid");
        graph.set_next_segment(a, 1, a, 0).expect("valid");
        graph.set_next_segment(a, 0, b, 2).expect("valid");
        graph.set_next_segment(b, 2, b, 0).expect("valid");
        graph
    }

    #[test]
    fn test_dynamic_follows_current_preset_edges() {
        let mut player = MusicPlayer::from_graph(&dynamic_graph(), looped(true)).expect("valid graph");
        let mut buf = [0u8; 12];
        assert_eq!(player.get_next_data(&mut buf), 12);
        assert_eq!(&buf[..4], &[0xA0; 4]);
        assert_eq!(&buf[4..8], &[0xA1; 4]);
        assert_eq!(&buf[8..], &[0xA0; 4]);
    }

    #[test]
    fn test_dynamic_transition_changes_format() {
        let mut player = MusicPlayer::from_graph(&dynamic_graph(), looped(true)).expect("valid graph");
        let handle = player.handle();
        handle.request_preset_transition(1).expect("valid preset");

        let mut buf = [0u8; 8];
        // a0 is drained, then the switch to mono b2 truncates the pull.
        assert_eq!(player.get_next_data(&mut buf), 4);
        assert_eq!(&buf[..4], &[0xA0; 4]);
        assert!(player.take_format_change());
        assert!(!player.take_format_change());
        assert_eq!(player.format(), MONO);
        assert_eq!(handle.format(), MONO);
        assert_eq!(handle.current_segment(), Some((1, 2)));
        assert_eq!(handle.pending_transition(), None);

        assert_eq!(player.get_next_data(&mut buf), 4);
        assert_eq!(&buf[..4], &[0xB2; 4]);
        assert!(player.take_format_change());
        assert_eq!(player.format(), AudioFormat::CD);
        assert_eq!(player.current_segment(), Some((1, 0)));
    }

    #[test]
    fn test_request_without_edge_stays_pending() {
        let mut player = MusicPlayer::from_graph(&dynamic_graph(), looped(true)).expect("valid graph");
        let handle = player.handle();

        let mut buf = [0u8; 8];
        assert_eq!(player.get_next_data(&mut buf), 8);
        assert_eq!(handle.current_segment(), Some((0, 1)));

        // a1 has no edge to B; playback stays on A and keeps the request.
        handle.request_preset_transition(1).expect("valid preset");
        let mut buf = [0u8; 4];
        assert_eq!(player.get_next_data(&mut buf), 4);
        assert_eq!(&buf, &[0xA0; 4]);
        assert_eq!(handle.current_segment(), Some((0, 0)));
        assert_eq!(handle.pending_transition(), Some(1));
    }

    #[test]
    fn test_missing_edge_falls_back_to_first_segment() {
        let mut graph = dynamic_graph();
        graph.select_starting_segment(1, 1).expect("valid start");
        let mut player = MusicPlayer::from_graph(&graph, looped(true)).expect("valid graph");

        let mut buf = [0u8; 8];
        assert_eq!(player.get_next_data(&mut buf), 8);
        assert_eq!(&buf[4..], &[0xB0; 4]);
        assert_eq!(player.current_segment(), Some((1, 0)));
    }

    #[test]
    fn test_last_request_wins_at_boundary() {
        let mut player = MusicPlayer::from_graph(&dynamic_graph(), looped(true)).expect("valid graph");
        let handle = player.handle();
        handle.request_preset_transition(1).expect("valid preset");
        handle.request_preset_transition(0).expect("valid preset");

        let mut buf = [0u8; 8];
        assert_eq!(player.get_next_data(&mut buf), 8);
        assert_eq!(&buf[4..], &[0xA1; 4]);
        assert_eq!(handle.current_segment(), Some((0, 1)));
    }

    #[test]
    fn test_invalid_transition_rejected() {
        let player = MusicPlayer::from_graph(&dynamic_graph(), looped(true)).expect("valid graph");
        let handle = player.handle();
        assert_eq!(handle.request_preset_transition(2), Err(GraphError::InvalidPreset(2)));
        assert_eq!(handle.pending_transition(), None);
    }

    #[test]
    fn test_segment_switch_starts_incoming_track_from_top() {
        let mut graph = PresetGraph::new();
        let first = graph.add_track(pcm(AudioFormat::CD, &[0, 1, 2, 3, 4, 5, 6, 7]));
        let second = graph.add_track(pcm(AudioFormat::CD, &[100, 101, 102, 103, 104, 105, 106, 107]));
        let preset = graph.add_preset();
        graph.add_segment_to_preset(preset, first).expect("valid");
        graph.add_segment_to_preset(preset, second).expect("valid");
        graph.set_next_segment(preset, 0, preset, 1).expect("valid");
        graph.set_next_segment(preset, 1, preset, 0).expect("valid");

        // Leaves the second track half read.
        let mut earlier = MusicPlayer::from_graph(&graph, looped(true)).expect("valid graph");
        let mut buf = [0u8; 12];
        assert_eq!(earlier.get_next_data(&mut buf), 12);
        earlier.handle().ask_stop();
        drop(earlier);

        let mut player = MusicPlayer::from_graph(&graph, looped(true)).expect("valid graph");
        let mut buf = [0u8; 16];
        assert_eq!(player.get_next_data(&mut buf), 16);
        assert_eq!(&buf[..8], &[0, 1, 2, 3, 4, 5, 6, 7]);
        assert_eq!(&buf[8..], &[100, 101, 102, 103, 104, 105, 106, 107]);
    }

    #[test]
    fn test_zero_length_segment_cycle_is_bounded() {
        let mut graph = PresetGraph::new();
        let empty = graph.add_track(pcm(AudioFormat::CD, &[]));
        let preset = graph.add_preset();
        graph.add_segment_to_preset(preset, empty).expect("valid");
        graph.set_next_segment(preset, 0, preset, 0).expect("valid");

        let mut player = MusicPlayer::from_graph(&graph, looped(true)).expect("valid graph");
        let mut buf = [0u8; 32];
        assert_eq!(player.get_next_data(&mut buf), 0);
    }

    #[test]
    fn test_dynamic_start_validation() {
        let graph = dynamic_graph();
        assert!(MusicPlayer::new_dynamic(graph.presets(), 2, 0, looped(true)).is_err());
        assert!(MusicPlayer::new_dynamic(graph.presets(), 0, 2, looped(true)).is_err());
        assert!(MusicPlayer::from_graph(&PresetGraph::new(), looped(true)).is_err());
    }

    proptest! {
        #[test]
        fn looping_stream_repeats_source(
            source in proptest::collection::vec(any::<u8>(), 2..64),
            pulls in proptest::collection::vec(1usize..100, 1..8),
        ) {
            let mut player = MusicPlayer::new(pcm(AudioFormat::CD, &source), looped(true));
            let mut stream = Vec::new();
            for len in &pulls {
                let mut buf = vec![0u8; *len];
                prop_assert_eq!(player.get_next_data(&mut buf), *len);
                stream.extend_from_slice(&buf);
            }

            let expected: Vec<u8> = source.iter().copied().cycle().take(stream.len()).collect();
            prop_assert_eq!(stream, expected);
        }
    }
}
