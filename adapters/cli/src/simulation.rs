use std::time::Duration;

use anyhow::{bail, Context, Result};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use swarm_waves_core::{Command, EntityHandle, Event, WaveConfig, WavePhase};
use swarm_waves_pool::DamageOutcome;
use swarm_waves_system_wave_control::WaveController;

/// Ticks without a completed wave after which the run is considered stuck.
const STALL_LIMIT: u64 = 1_000_000;

/// Tunables of the headless combat stand-in.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Driver {
    pub(crate) waves: u32,
    pub(crate) tick: Duration,
    pub(crate) hits_per_tick: u32,
    pub(crate) damage_per_hit: f32,
    pub(crate) seed: u64,
}

/// Outcome of one cleared wave.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub(crate) struct WaveSummary {
    pub(crate) wave: u32,
    pub(crate) total_target: u32,
    pub(crate) ticks: u64,
    pub(crate) peak_live: usize,
}

/// Runs the controller against randomly targeted hits until the requested
/// number of waves has been cleared or the progression ends.
pub(crate) struct Simulation {
    controller: WaveController,
    driver: Driver,
    rng: ChaCha8Rng,
    live: Vec<EntityHandle>,
    events: Vec<Event>,
    kills: Vec<EntityHandle>,
    current: Option<WaveSummary>,
    summaries: Vec<WaveSummary>,
}

impl Simulation {
    pub(crate) fn new(config: WaveConfig, driver: Driver) -> Result<Self> {
        let controller = WaveController::new(config).context("failed to warm entity pool")?;
        Ok(Self {
            controller,
            driver,
            rng: ChaCha8Rng::seed_from_u64(driver.seed),
            live: Vec::new(),
            events: Vec::new(),
            kills: Vec::new(),
            current: None,
            summaries: Vec::new(),
        })
    }

    pub(crate) fn run(&mut self) -> Result<&[WaveSummary]> {
        self.submit(Command::SetEnabled { enabled: true })?;

        let mut idle_ticks = 0u64;
        while (self.summaries.len() as u32) < self.driver.waves
            && self.controller.phase() != WavePhase::Finished
        {
            let cleared = self.summaries.len();
            self.submit(Command::Tick {
                dt: self.driver.tick,
            })?;
            self.strike()?;

            if let Some(current) = self.current.as_mut() {
                current.ticks += 1;
                current.peak_live = current.peak_live.max(self.live.len());
            }

            idle_ticks = if self.summaries.len() > cleared {
                0
            } else {
                idle_ticks + 1
            };
            if idle_ticks > STALL_LIMIT {
                bail!(
                    "wave {} made no progress for {STALL_LIMIT} ticks",
                    self.controller.wave()
                );
            }
        }
        Ok(&self.summaries)
    }

    pub(crate) fn controller(&self) -> &WaveController {
        &self.controller
    }

    fn submit(&mut self, command: Command) -> Result<()> {
        self.events.clear();
        self.controller
            .apply(command, &mut self.events)
            .context("wave controller failed")?;
        for event in self.events.drain(..) {
            match event {
                Event::EntitySpawned { handle, .. } => self.live.push(handle),
                Event::EntityReleased { handle } => self.live.retain(|live| *live != handle),
                Event::WaveStarted {
                    wave, total_target, ..
                } => {
                    self.current = Some(WaveSummary {
                        wave,
                        total_target,
                        ticks: 0,
                        peak_live: self.live.len(),
                    });
                }
                Event::WaveCompleted { wave } => {
                    if let Some(summary) = self.current.take() {
                        tracing::debug!(wave, ticks = summary.ticks, "simulated wave cleared");
                        self.summaries.push(summary);
                    }
                }
                Event::WaveAborted { wave, killed } => {
                    tracing::warn!(wave, killed, "wave aborted during simulation");
                    self.current = None;
                }
                Event::ClearingFinished { .. }
                | Event::CampaignCompleted { .. }
                | Event::ModeChanged { .. } => {}
            }
        }
        Ok(())
    }

    /// Lands random hits on live entities and reports the kills as one batch.
    fn strike(&mut self) -> Result<()> {
        if self.controller.phase() != WavePhase::InProgress {
            return Ok(());
        }

        self.kills.clear();
        for _ in 0..self.driver.hits_per_tick {
            if self.live.is_empty() {
                break;
            }
            let index = self.rng.gen_range(0..self.live.len());
            let handle = self.live[index];
            match self.controller.apply_damage(handle, self.driver.damage_per_hit) {
                Some(DamageOutcome::Killed) => {
                    let _ = self.live.swap_remove(index);
                    self.kills.push(handle);
                }
                Some(DamageOutcome::Survived { .. }) => {}
                None => {
                    let _ = self.live.swap_remove(index);
                }
            }
        }

        if self.kills.is_empty() {
            return Ok(());
        }
        let handles = std::mem::take(&mut self.kills);
        self.submit(Command::EntitiesKilled { handles })
    }
}
