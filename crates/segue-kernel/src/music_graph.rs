//! Dynamic Music Graph
//!
//! Static data model for non-linear music:
//!
//! - A **track** is an opened decoder in the graph's pool.
//! - A **segment** is a track placed inside a preset, plus outgoing edges
//!   mapping "requested preset" to "next segment within that preset".
//! - A **preset** is an ordered list of segments (one musical mood).
//!
//! ```text
//!   Preset 0 (calm)            Preset 1 (combat)
//!   ┌─────────┐  calm          ┌─────────┐
//!   │ seg 0   │───────────┐    │ seg 0   │
//!   └─────────┘           ▼    └─────────┘
//!   ┌─────────┐      ┌─────────┐    ▲
//!   │ seg 1   │◄─────│ ...     │    │ combat
//!   └─────────┘      └─────────┘────┘
//! ```
//!
//! Every edge is validated against both endpoint presets when it is added,
//! so a player walking the graph never meets a dangling index.

use ahash::AHashMap;
use tracing::debug;

use segue_common::GraphError;

use crate::music_decoder::SharedDecoder;

/// One decodable unit inside a preset.
#[derive(Debug, Clone)]
pub struct Segment {
    decoder: SharedDecoder,
    transitions: AHashMap<usize, usize>,
}

impl Segment {
    /// Creates a segment with no outgoing edges.
    #[must_use]
    pub fn new(decoder: SharedDecoder) -> Self {
        Self {
            decoder,
            transitions: AHashMap::new(),
        }
    }

    /// Decoder backing this segment.
    #[must_use]
    pub const fn decoder(&self) -> &SharedDecoder {
        &self.decoder
    }

    /// Segment to play next if `preset` is requested, if an edge exists.
    #[must_use]
    pub fn next_segment(&self, preset: usize) -> Option<usize> {
        self.transitions.get(&preset).copied()
    }

    /// Number of outgoing edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.transitions.len()
    }

    fn set_next_segment(&mut self, preset: usize, segment: usize) {
        self.transitions.insert(preset, segment);
    }
}

/// Ordered segments representing one musical state.
#[derive(Debug, Clone, Default)]
pub struct Preset {
    segments: Vec<Segment>,
}

impl Preset {
    /// Creates an empty preset.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a segment and returns its index.
    pub fn add_segment(&mut self, segment: Segment) -> usize {
        self.segments.push(segment);
        self.segments.len() - 1
    }

    /// Segment at `index`.
    #[must_use]
    pub fn segment(&self, index: usize) -> Option<&Segment> {
        self.segments.get(index)
    }

    /// All segments in order.
    #[must_use]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Number of segments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Checks if the preset has no segments.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

/// Track pool, presets and entry point of a dynamic music graph.
#[derive(Debug, Clone, Default)]
pub struct PresetGraph {
    tracks: Vec<SharedDecoder>,
    presets: Vec<Preset>,
    start_preset: usize,
    start_segment: usize,
}

impl PresetGraph {
    /// Creates an empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an opened decoder to the track pool and returns its index.
    pub fn add_track(&mut self, decoder: SharedDecoder) -> usize {
        self.tracks.push(decoder);
        self.tracks.len() - 1
    }

    /// Adds an empty preset and returns its index.
    pub fn add_preset(&mut self) -> usize {
        self.presets.push(Preset::new());
        self.presets.len() - 1
    }

    /// Appends pooled `track` as a new segment of `preset`.
    pub fn add_segment_to_preset(&mut self, preset: usize, track: usize) -> Result<usize, GraphError> {
        let decoder = self
            .tracks
            .get(track)
            .cloned()
            .ok_or(GraphError::InvalidTrack(track))?;
        let target = self
            .presets
            .get_mut(preset)
            .ok_or(GraphError::InvalidPreset(preset))?;

        let index = target.add_segment(Segment::new(decoder));
        debug!("Added track {track} to preset {preset} as segment {index}");
        Ok(index)
    }

    /// Checks that `segment` exists within `preset`.
    #[must_use]
    pub fn is_segment_index_valid(&self, preset: usize, segment: usize) -> bool {
        self.presets
            .get(preset)
            .is_some_and(|p| segment < p.len())
    }

    fn check_segment(&self, preset: usize, segment: usize) -> Result<(), GraphError> {
        match self.presets.get(preset) {
            None => Err(GraphError::InvalidPreset(preset)),
            Some(p) if segment >= p.len() => Err(GraphError::InvalidSegment { preset, segment }),
            Some(_) => Ok(()),
        }
    }

    /// Designates the segment a new player starts from.
    pub fn select_starting_segment(&mut self, preset: usize, segment: usize) -> Result<(), GraphError> {
        self.check_segment(preset, segment)?;
        self.start_preset = preset;
        self.start_segment = segment;
        Ok(())
    }

    /// Adds the edge `(preset, segment) --target_preset--> (target_preset, target_segment)`.
    pub fn set_next_segment(
        &mut self,
        preset: usize,
        segment: usize,
        target_preset: usize,
        target_segment: usize,
    ) -> Result<(), GraphError> {
        self.check_segment(preset, segment)?;
        self.check_segment(target_preset, target_segment)?;

        self.presets[preset].segments[segment].set_next_segment(target_preset, target_segment);
        Ok(())
    }

    /// Entry point as `(preset, segment)`.
    #[must_use]
    pub const fn starting_segment(&self) -> (usize, usize) {
        (self.start_preset, self.start_segment)
    }

    /// Checks that the entry point names a real segment.
    pub fn validate_start(&self) -> Result<(), GraphError> {
        if self.presets.iter().all(Preset::is_empty) {
            return Err(GraphError::EmptyGraph);
        }
        self.check_segment(self.start_preset, self.start_segment)
    }

    /// Presets in index order.
    #[must_use]
    pub fn presets(&self) -> &[Preset] {
        &self.presets
    }

    /// Preset at `index`.
    #[must_use]
    pub fn preset(&self, index: usize) -> Option<&Preset> {
        self.presets.get(index)
    }

    /// Number of presets.
    #[must_use]
    pub fn preset_count(&self) -> usize {
        self.presets.len()
    }

    /// Number of pooled tracks.
    #[must_use]
    pub fn track_count(&self) -> usize {
        self.tracks.len()
    }

    /// Releases every track and preset and resets the entry point.
    pub fn clear(&mut self) {
        self.tracks.clear();
        self.presets.clear();
        self.start_preset = 0;
        self.start_segment = 0;
    }
}
