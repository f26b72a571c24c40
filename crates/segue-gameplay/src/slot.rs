//! Music slots.
//!
//! A slot is the game-thread side of one music stream. It owns what the
//! stream plays (an opened source, or a preset graph), the parameters the
//! game last asked for, an optional fade, and the handle of the player the
//! device is currently pulling from.
//!
//! Both variants share one control surface: `play`, `pause`, `close`,
//! `fade`, `set_parameters`. Only the data they play differs.

use tracing::{debug, warn};

use segue_common::{GraphError, MusicResult, MusicSource, ResourceError, SlotId};
use segue_kernel::{DecoderProvider, MusicOutput, MusicParameters, PlayerHandle, PresetGraph, SharedDecoder};

use crate::fade::{Fade, FadeDirection};

/// Slot playing a single opened source.
#[derive(Debug, Clone, Default)]
pub struct StandardSlot {
    source: Option<MusicSource>,
    decoder: Option<SharedDecoder>,
}

impl StandardSlot {
    /// Source currently opened.
    #[must_use]
    pub fn source(&self) -> Option<&MusicSource> {
        self.source.as_ref()
    }

    /// Decoder of the opened source.
    #[must_use]
    pub fn decoder(&self) -> Option<&SharedDecoder> {
        self.decoder.as_ref()
    }
}

/// Slot playing a preset graph.
#[derive(Debug, Clone, Default)]
pub struct DynamicSlot {
    graph: PresetGraph,
}

impl DynamicSlot {
    /// Opens `source` into the track pool and returns its track index.
    pub fn load_track(&mut self, source: &MusicSource, provider: &dyn DecoderProvider) -> MusicResult<usize> {
        let decoder = provider.open(source).map_err(|e| {
            warn!("Failed to load dynamic track {source}: {e}");
            e
        })?;
        let track = self.graph.add_track(decoder);
        debug!("Loaded dynamic track {source} as track {track}");
        Ok(track)
    }

    /// Adds an empty preset and returns its index.
    pub fn add_preset(&mut self) -> usize {
        self.graph.add_preset()
    }

    /// Appends pooled `track` to `preset`, returning the segment index.
    pub fn add_segment_to_preset(&mut self, preset: usize, track: usize) -> Result<usize, GraphError> {
        self.graph.add_segment_to_preset(preset, track)
    }

    /// Checks that `segment` exists within `preset`.
    #[must_use]
    pub fn is_segment_index_valid(&self, preset: usize, segment: usize) -> bool {
        self.graph.is_segment_index_valid(preset, segment)
    }

    /// Designates the entry point of the next player.
    pub fn select_starting_segment(&mut self, preset: usize, segment: usize) -> Result<(), GraphError> {
        self.graph.select_starting_segment(preset, segment)
    }

    /// Adds a transition edge.
    pub fn set_next_segment(
        &mut self,
        preset: usize,
        segment: usize,
        target_preset: usize,
        target_segment: usize,
    ) -> Result<(), GraphError> {
        self.graph
            .set_next_segment(preset, segment, target_preset, target_segment)
    }

    /// The graph a new player is built from.
    #[must_use]
    pub const fn graph(&self) -> &PresetGraph {
        &self.graph
    }
}

/// What a slot plays.
#[derive(Debug, Clone)]
pub enum SlotKind {
    /// One source.
    Standard(StandardSlot),
    /// A preset graph.
    Dynamic(DynamicSlot),
}

/// One controllable music stream.
#[derive(Debug, Clone)]
pub struct MusicSlot {
    id: SlotId,
    kind: SlotKind,
    player: Option<PlayerHandle>,
    parameters: MusicParameters,
    fade: Option<Fade>,
}

impl MusicSlot {
    fn with_kind(id: SlotId, kind: SlotKind) -> Self {
        Self {
            id,
            kind,
            player: None,
            parameters: MusicParameters::default(),
            fade: None,
        }
    }

    /// Creates an empty standard slot.
    #[must_use]
    pub fn standard(id: SlotId) -> Self {
        Self::with_kind(id, SlotKind::Standard(StandardSlot::default()))
    }

    /// Creates a dynamic slot with an empty graph.
    #[must_use]
    pub fn dynamic(id: SlotId) -> Self {
        Self::with_kind(id, SlotKind::Dynamic(DynamicSlot::default()))
    }

    /// Position of this slot in the manager.
    #[must_use]
    pub const fn id(&self) -> SlotId {
        self.id
    }

    /// Variant data.
    #[must_use]
    pub const fn kind(&self) -> &SlotKind {
        &self.kind
    }

    /// Checks if this is a dynamic slot.
    #[must_use]
    pub const fn is_dynamic(&self) -> bool {
        matches!(self.kind, SlotKind::Dynamic(_))
    }

    /// Dynamic variant data, if this is a dynamic slot.
    #[must_use]
    pub fn as_dynamic(&self) -> Option<&DynamicSlot> {
        match &self.kind {
            SlotKind::Dynamic(dynamic) => Some(dynamic),
            SlotKind::Standard(_) => None,
        }
    }

    /// Mutable dynamic variant data, if this is a dynamic slot.
    pub fn as_dynamic_mut(&mut self) -> Option<&mut DynamicSlot> {
        match &mut self.kind {
            SlotKind::Dynamic(dynamic) => Some(dynamic),
            SlotKind::Standard(_) => None,
        }
    }

    /// Checks if the slot has something to play.
    ///
    /// Dynamic slots are always initialized.
    #[must_use]
    pub const fn is_initialized(&self) -> bool {
        match &self.kind {
            SlotKind::Standard(standard) => standard.decoder.is_some(),
            SlotKind::Dynamic(_) => true,
        }
    }

    /// Opens `source` for playback.
    ///
    /// Reopening the source that is already open does nothing. Opening a
    /// different one closes the current source first.
    pub fn open(&mut self, source: &MusicSource, provider: &dyn DecoderProvider) -> MusicResult<()> {
        let already_open = match &self.kind {
            SlotKind::Standard(standard) => {
                standard.decoder.is_some() && standard.source.as_ref() == Some(source)
            },
            SlotKind::Dynamic(_) => {
                return Err(GraphError::WrongSlotKind {
                    slot: self.id,
                    expected: "standard",
                }
                .into())
            },
        };
        if already_open {
            return Ok(());
        }

        self.close();
        let decoder = provider.open(source).map_err(|e| {
            warn!("Failed to open music {source} in slot {}: {e}", self.id);
            e
        })?;

        debug!("Slot {} opened {source} ({})", self.id, decoder.format());
        if let SlotKind::Standard(standard) = &mut self.kind {
            standard.source = Some(source.clone());
            standard.decoder = Some(decoder);
        }
        Ok(())
    }

    /// Starts playback.
    ///
    /// Does nothing if the slot is already playing.
    pub fn play(&mut self, output: &dyn MusicOutput) -> MusicResult<()> {
        if self.playing() {
            return Ok(());
        }
        if !output.is_initialized() {
            return Err(ResourceError::NoOutput.into());
        }

        let handle = match &self.kind {
            SlotKind::Standard(standard) => {
                let decoder = standard.decoder.clone().ok_or(ResourceError::NoSource)?;
                output.play_music(decoder, self.parameters)
            },
            SlotKind::Dynamic(dynamic) => {
                dynamic.graph.validate_start()?;
                let (preset, segment) = dynamic.graph.starting_segment();
                output.play_dynamic_music(dynamic.graph.presets(), preset, segment, self.parameters)?
            },
        };

        debug!("Slot {} started playing", self.id);
        self.player = Some(handle);
        Ok(())
    }

    /// Stops playback and cancels any fade. Idempotent.
    pub fn pause(&mut self) {
        if let Some(player) = self.player.take() {
            player.ask_stop();
            debug!("Slot {} paused", self.id);
        }
        self.fade = None;
    }

    /// Stops playback and releases what the slot plays.
    pub fn close(&mut self) {
        self.pause();
        match &mut self.kind {
            SlotKind::Standard(standard) => {
                standard.source = None;
                standard.decoder = None;
            },
            SlotKind::Dynamic(dynamic) => dynamic.graph.clear(),
        }
    }

    /// Checks if the device is still pulling from this slot's player.
    #[must_use]
    pub fn playing(&self) -> bool {
        self.player.as_ref().is_some_and(PlayerHandle::is_active)
    }

    /// Handle of the current player.
    #[must_use]
    pub const fn player(&self) -> Option<&PlayerHandle> {
        self.player.as_ref()
    }

    /// Current parameters.
    #[must_use]
    pub const fn parameters(&self) -> MusicParameters {
        self.parameters
    }

    /// Current volume.
    #[must_use]
    pub const fn volume(&self) -> f32 {
        self.parameters.volume
    }

    /// Sets loop flag and volume, forwarding them to a running player.
    pub fn set_parameters(&mut self, looping: bool, volume: f32) {
        self.parameters = MusicParameters::new(looping, volume);
        if let Some(player) = &self.player {
            player.update_parameters(self.parameters);
        }
    }

    /// Sets the volume, keeping the loop flag.
    pub fn set_volume(&mut self, volume: f32) {
        self.set_parameters(self.parameters.looping, volume);
    }

    /// Arms a fade from the current volume to `limit`.
    ///
    /// Returns false without effect if the slot is not playing or already
    /// sits at `limit`.
    pub fn fade(&mut self, limit: f32, duration: u32, stop_on_zero: bool, now: u32) -> bool {
        if !self.playing() || self.parameters.volume == limit {
            return false;
        }
        self.fade = Some(Fade::new(now, duration, self.parameters.volume, limit, stop_on_zero));
        true
    }

    /// Checks if a fade is armed.
    #[must_use]
    pub const fn is_fading(&self) -> bool {
        self.fade.is_some()
    }

    /// Armed fade, if any.
    #[must_use]
    pub const fn active_fade(&self) -> Option<&Fade> {
        self.fade.as_ref()
    }

    /// Direction and interpolated volume of the armed fade at `now`.
    #[must_use]
    pub fn compute_fading_volume(&self, now: u32) -> Option<(FadeDirection, f32)> {
        self.fade.map(|fade| fade.compute(now))
    }

    /// Advances the armed fade to `now`, pausing if it faded to silence.
    pub fn step_fade(&mut self, now: u32) {
        let Some(fade) = self.fade else {
            return;
        };

        let step = fade.step(now);
        self.set_volume(step.volume);
        if step.finished {
            self.fade = None;
            if step.pause {
                self.pause();
            }
        }
    }

    /// Asks the dynamic player to move to `preset` at the next boundary.
    pub fn request_preset_transition(&self, preset: usize) -> MusicResult<()> {
        if !self.is_dynamic() {
            return Err(GraphError::WrongSlotKind {
                slot: self.id,
                expected: "dynamic",
            }
            .into());
        }
        match &self.player {
            Some(player) if player.is_active() => Ok(player.request_preset_transition(preset)?),
            _ => Err(GraphError::NotPlaying.into()),
        }
    }
}
