#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Wave lifecycle state machine.
//!
//! The controller walks `Idle → Populating → InProgress → Clearing → Idle`
//! once per wave, asking the composition curve for each wave's mix and
//! delegating population bookkeeping to the [`PopulationScheduler`] it owns.
//! It starts in [`ControllerMode::Legacy`] and does nothing until enabled.

use std::time::Duration;

use swarm_waves_core::{
    Command, ControllerMode, DebugSnapshot, EntityHandle, Event, Position, WaveConfig, WaveInfo,
    WavePhase, WaveTarget,
};
use swarm_waves_pool::{DamageOutcome, PoolError};
use swarm_waves_system_composition::composition;
use swarm_waves_system_population::{KillOutcome, PopulationScheduler};

/// Drives the wave progression.
#[derive(Debug)]
pub struct WaveController {
    config: WaveConfig,
    scheduler: PopulationScheduler,
    mode: ControllerMode,
    phase: WavePhase,
    wave: u32,
    clear_elapsed: Duration,
}

impl WaveController {
    /// Creates a controller with a freshly warmed pool.
    pub fn new(config: WaveConfig) -> Result<Self, PoolError> {
        let scheduler = PopulationScheduler::from_config(&config)?;
        Ok(Self::with_scheduler(config, scheduler))
    }

    /// Creates a controller around an existing scheduler.
    ///
    /// A zero maximum wave is raised to one and the starting wave is clamped
    /// into `1..=max_wave`.
    #[must_use]
    pub fn with_scheduler(mut config: WaveConfig, scheduler: PopulationScheduler) -> Self {
        config.max_wave = config.max_wave.max(1);
        config.starting_wave = config.starting_wave.clamp(1, config.max_wave);
        Self {
            wave: config.starting_wave,
            config,
            scheduler,
            mode: ControllerMode::Legacy,
            phase: WavePhase::Idle,
            clear_elapsed: Duration::ZERO,
        }
    }

    /// Executes a command, appending the resulting events to `out`.
    pub fn apply(&mut self, command: Command, out: &mut Vec<Event>) -> Result<(), PoolError> {
        match command {
            Command::Tick { dt } => self.tick(dt, out)?,
            Command::EntityKilled { handle } => {
                let _ = self.on_entity_killed(handle, out)?;
            }
            Command::EntitiesKilled { handles } => self.on_entities_killed(&handles, out)?,
            Command::SetEnabled { enabled } => self.set_enabled(enabled, out),
            Command::SetReferencePoint { position } => self.set_reference_point(position),
            Command::Restart => self.restart(out),
        }
        Ok(())
    }

    /// Advances the state machine by `dt` of simulated time.
    ///
    /// Entities eliminated since the previous tick are released first, so a
    /// wave whose last kill was reported during the frame completes on this tick.
    pub fn tick(&mut self, dt: Duration, out: &mut Vec<Event>) -> Result<(), PoolError> {
        if self.mode == ControllerMode::Legacy {
            return Ok(());
        }

        self.scheduler.sweep(out);
        self.scheduler.advance(dt);

        match self.phase {
            WavePhase::Idle => self.start_wave(out)?,
            WavePhase::Populating => self.resume_population(out),
            WavePhase::InProgress => {
                if self.scheduler.is_cleared() {
                    self.phase = WavePhase::Clearing;
                    self.clear_elapsed = Duration::ZERO;
                    tracing::info!(wave = self.wave, "wave completed");
                    out.push(Event::WaveCompleted { wave: self.wave });
                }
            }
            WavePhase::Clearing => {
                self.clear_elapsed = self.clear_elapsed.saturating_add(dt);
                if self.clear_elapsed >= self.config.clear_duration() {
                    self.finish_clearing(out);
                }
            }
            WavePhase::Finished => {}
        }
        Ok(())
    }

    /// Reports a kill to the scheduler. Kills outside a running wave are ignored.
    pub fn on_entity_killed(
        &mut self,
        handle: EntityHandle,
        out: &mut Vec<Event>,
    ) -> Result<KillOutcome, PoolError> {
        if self.phase != WavePhase::InProgress {
            tracing::warn!(?handle, phase = ?self.phase, "kill reported outside a running wave");
            return Ok(KillOutcome::Ignored);
        }
        self.scheduler.on_entity_killed(handle, out)
    }

    /// Reports several kills observed within one frame, processed last to first.
    pub fn on_entities_killed(
        &mut self,
        handles: &[EntityHandle],
        out: &mut Vec<Event>,
    ) -> Result<(), PoolError> {
        if self.phase != WavePhase::InProgress {
            tracing::warn!(
                count = handles.len(),
                phase = ?self.phase,
                "kills reported outside a running wave"
            );
            return Ok(());
        }
        self.scheduler.on_entities_killed(handles, out)
    }

    /// Switches between wave and legacy mode.
    ///
    /// Disabling aborts a running wave. A wave already cleared finishes its
    /// clearing immediately so the progression is not lost.
    pub fn set_enabled(&mut self, enabled: bool, out: &mut Vec<Event>) {
        let mode = if enabled {
            ControllerMode::Wave
        } else {
            ControllerMode::Legacy
        };
        if mode == self.mode {
            return;
        }

        if !enabled {
            match self.phase {
                WavePhase::Populating | WavePhase::InProgress => self.abort(out),
                WavePhase::Clearing => self.finish_clearing(out),
                WavePhase::Idle | WavePhase::Finished => {}
            }
        }

        self.mode = mode;
        tracing::info!(?mode, wave = self.wave, "wave controller mode changed");
        out.push(Event::ModeChanged { mode });
    }

    /// Aborts any wave and rewinds to the starting wave.
    pub fn restart(&mut self, out: &mut Vec<Event>) {
        if matches!(self.phase, WavePhase::Populating | WavePhase::InProgress) {
            self.abort(out);
        } else {
            self.scheduler.reset(out);
        }
        self.wave = self.config.starting_wave;
        self.phase = WavePhase::Idle;
        self.clear_elapsed = Duration::ZERO;
        tracing::info!(wave = self.wave, "wave progression restarted");
    }

    /// Moves the point new entities are placed around.
    pub fn set_reference_point(&mut self, position: Position) {
        self.scheduler.set_reference_point(position);
    }

    /// Applies damage to a live entity; stale handles yield `None`.
    ///
    /// A [`DamageOutcome::Killed`] result must still be reported as a kill.
    pub fn apply_damage(&mut self, handle: EntityHandle, amount: f32) -> Option<DamageOutcome> {
        self.scheduler.apply_damage(handle, amount)
    }

    /// Active mode.
    #[must_use]
    pub fn mode(&self) -> ControllerMode {
        self.mode
    }

    /// Lifecycle phase.
    #[must_use]
    pub fn phase(&self) -> WavePhase {
        self.phase
    }

    /// Current wave number.
    #[must_use]
    pub fn wave(&self) -> u32 {
        self.wave
    }

    /// Effective configuration.
    #[must_use]
    pub fn config(&self) -> &WaveConfig {
        &self.config
    }

    /// Scheduler owned by the controller.
    #[must_use]
    pub fn scheduler(&self) -> &PopulationScheduler {
        &self.scheduler
    }

    /// Progress projection for HUD collaborators.
    #[must_use]
    pub fn wave_info(&self) -> WaveInfo {
        let counters = self.scheduler.counters();
        WaveInfo {
            wave: self.wave,
            max_wave: self.config.max_wave,
            total_target: self
                .scheduler
                .target()
                .map_or(0, |target| target.total_target()),
            killed: counters.killed,
            active: counters.active,
            reserve_remaining: counters.reserve_remaining,
            is_clearing: self.phase == WavePhase::Clearing,
            progress: (self.wave - 1) as f32 / self.config.max_wave as f32,
        }
    }

    /// Full diagnostic view.
    #[must_use]
    pub fn debug_snapshot(&self) -> DebugSnapshot {
        DebugSnapshot {
            mode: self.mode,
            phase: self.phase,
            wave: self.wave,
            clear_elapsed: self.clear_elapsed,
            next_wave_target: (self.wave < self.config.max_wave)
                .then(|| WaveTarget::new(self.wave + 1, self.config.active_cap)),
            population: self.scheduler.snapshot(),
            pool: self.scheduler.pool().stats(),
        }
    }

    fn start_wave(&mut self, out: &mut Vec<Event>) -> Result<(), PoolError> {
        self.phase = WavePhase::Populating;
        let target = WaveTarget::new(self.wave, self.config.active_cap);
        out.push(Event::WaveStarted {
            wave: self.wave,
            total_target: target.total_target(),
            initial: target.initial_count(),
            reserve: target.reserve_count(),
        });
        if let Err(error) = self
            .scheduler
            .start_wave(target, &composition(self.wave), out)
        {
            tracing::error!(wave = self.wave, %error, "wave population failed");
            self.scheduler.reset(out);
            self.phase = WavePhase::Idle;
            return Err(error);
        }
        self.phase = WavePhase::InProgress;
        Ok(())
    }

    /// Promotes a wave left in `Populating` only when its population is whole;
    /// anything else is discarded and the wave is started again.
    fn resume_population(&mut self, out: &mut Vec<Event>) {
        let whole = self.scheduler.target().is_some_and(|target| {
            target.wave() == self.wave
                && self.scheduler.counters().accounted() == target.total_target()
        });
        if whole {
            self.phase = WavePhase::InProgress;
            return;
        }
        tracing::warn!(wave = self.wave, "discarding incomplete wave population");
        self.scheduler.reset(out);
        self.phase = WavePhase::Idle;
    }

    fn finish_clearing(&mut self, out: &mut Vec<Event>) {
        self.clear_elapsed = Duration::ZERO;
        if self.wave >= self.config.max_wave {
            self.phase = WavePhase::Finished;
            tracing::info!(final_wave = self.wave, "final wave cleared");
            out.push(Event::CampaignCompleted {
                final_wave: self.wave,
            });
            return;
        }

        self.wave += 1;
        self.phase = WavePhase::Idle;
        tracing::debug!(next_wave = self.wave, "clearing finished");
        out.push(Event::ClearingFinished {
            next_wave: self.wave,
        });
    }

    fn abort(&mut self, out: &mut Vec<Event>) {
        let killed = self.scheduler.counters().killed;
        tracing::warn!(wave = self.wave, killed, "wave aborted");
        out.push(Event::WaveAborted {
            wave: self.wave,
            killed,
        });
        self.scheduler.reset(out);
        self.phase = WavePhase::Idle;
        self.clear_elapsed = Duration::ZERO;
    }
}
