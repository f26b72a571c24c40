//! Application driver.
//!
//! Opens the output device, builds the music manager and runs the intro,
//! level and fade-out phases on a fixed-rate tick loop.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use segue_common::{AudioClock, ManualClock, MusicSource, SlotId, SlotTarget};
use segue_gameplay::{ClassicTrackResolver, GamePhase, MusicManager};
use segue_kernel::{FileDecoderProvider, MusicOutput, RodioOutput};

use crate::config::MusicConfig;
use crate::timing::TickTimer;
use crate::Args;

/// Everything the tick loop drives.
struct Session {
    output: Arc<RodioOutput>,
    clock: Arc<ManualClock>,
    manager: MusicManager,
    timer: TickTimer,
}

impl Session {
    /// Runs one game tick.
    fn tick(&mut self, phase: GamePhase) {
        self.clock.advance();
        self.manager.idle(phase);
    }

    /// Ticks in `phase` until `limit` ticks have run (`None` = no limit)
    /// or `done` returns true.
    fn run_phase(
        &mut self,
        phase: GamePhase,
        limit: Option<u64>,
        mut done: impl FnMut(&MusicManager) -> bool,
    ) {
        debug!("Entering {phase:?} for {limit:?} ticks");
        let mut ran = 0u64;
        loop {
            let dt = self.timer.delta_time();
            for _ in 0..self.timer.accumulate(dt) {
                self.tick(phase);
                ran += 1;
            }
            self.output.update();

            if limit.is_some_and(|limit| ran >= limit) || (ran > 0 && done(&self.manager)) {
                return;
            }
            self.timer.sleep_remainder();
        }
    }
}

/// Builds a manager over `output` with classic lookup from the config.
pub fn build_manager(
    config: &MusicConfig,
    output: Arc<dyn MusicOutput>,
    clock: Arc<dyn AudioClock>,
) -> MusicManager {
    let resolver =
        ClassicTrackResolver::new(&config.music_dir).with_extensions(config.extensions.clone());
    MusicManager::new(output, Arc::new(FileDecoderProvider::new()), clock).with_resolver(resolver)
}

/// Queues level music: explicit tracks, else the configured playlist,
/// else the configured classic song.
pub fn queue_level_music(manager: &mut MusicManager, tracks: &[PathBuf], config: &MusicConfig) {
    manager.clear_level_music();

    let tracks = if tracks.is_empty() { config.playlist.as_slice() } else { tracks };
    for track in tracks {
        manager.push_back_level_music(MusicSource::from(track.clone()));
    }

    if manager.playlist().is_empty() {
        manager.set_classic_level_music(config.classic_song);
        if !manager.has_classic_level_music() {
            warn!("No level music found for classic song {}", config.classic_song);
        }
    }
}

/// Run the music engine.
pub fn run(args: &Args, config: &MusicConfig) -> Result<()> {
    let output = Arc::new(
        RodioOutput::with_buffer_frames(config.buffer_frames)
            .context("Failed to open audio output")?,
    );
    output.set_volumes(config.volumes());

    let clock = Arc::new(ManualClock::default());
    let manager = build_manager(config, Arc::clone(&output) as Arc<dyn MusicOutput>, clock.clone());
    let mut session = Session {
        output,
        clock,
        manager,
        timer: TickTimer::new(config.tick_rate),
    };
    let fade_ticks = config.fade_out_ticks;

    // Intro
    if let Some(intro) = args.intro.as_ref().or(config.intro.as_ref()) {
        match session.manager.setup_intro_music(&MusicSource::from(intro.clone())) {
            Ok(()) => {
                session.manager.restart_intro_music();
                let ticks = session.timer.ticks_for(config.intro_seconds);
                session.run_phase(GamePhase::Menu, Some(ticks), |m| {
                    !m.playing(SlotTarget::Slot(SlotId::INTRO))
                });
                session.manager.fade(SlotTarget::Slot(SlotId::INTRO), 0.0, fade_ticks, true);
            },
            Err(e) => warn!("Skipping intro {}: {e}", intro.display()),
        }
    }

    // Level
    queue_level_music(&mut session.manager, &args.tracks, config);
    session.manager.level_music_random(args.random || config.random_order);
    session.manager.seed_level_music();
    info!(
        "Level playlist: {} track(s), {} order",
        session.manager.playlist().len(),
        if session.manager.playlist().is_random() { "random" } else { "sequential" }
    );

    let seconds = args.seconds.unwrap_or(config.run_seconds);
    let limit = (seconds > 0).then(|| session.timer.ticks_for(seconds));
    session.run_phase(GamePhase::InProgress, limit, |m| {
        m.playlist().is_empty() && !m.level_slot().playing()
    });
    if session.manager.playlist().is_empty() {
        warn!("No level music queued, stopping");
    }

    // Fade out
    if session.manager.fade(SlotTarget::All, 0.0, fade_ticks, true) {
        let grace = u64::from(fade_ticks) + u64::from(session.timer.tick_rate());
        session.run_phase(GamePhase::Over, Some(grace), |m| !m.playing(SlotTarget::All));
    }

    session.manager.shutdown();
    session.output.update();
    let lingering = session.output.playing_count();
    if lingering > 0 {
        debug!("Releasing {lingering} music sink(s) still draining");
    }
    session.output.stop_all();
    Ok(())
}
