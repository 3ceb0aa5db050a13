#[cfg(feature = "python")]
use pyo3::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::config::SimulationConfig;
use crate::constants::PROBABILITY_TOLERANCE;
use crate::error::{RaceOddsError, Result};
use crate::grid::GridEntry;
use crate::trial::simulate_trial;

/// One starter in a simulation run.
///
/// Only the win tally changes once the run starts.
#[cfg_attr(feature = "python", pyclass(get_all))]
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SimulationEntry {
    pub competitor_id: String,
    pub team_id: String,
    pub grid_position: u32,

    /// Blended pre-race win probability
    pub win_probability: f64,

    /// Trials won
    pub win_count: u64,

    /// Share of executed trials won, in percent
    pub win_percentage: f64,
}

impl SimulationEntry {
    pub fn new(grid: &GridEntry, win_probability: f64) -> Self {
        SimulationEntry {
            competitor_id: grid.competitor_id.clone(),
            team_id: grid.team_id.clone(),
            grid_position: grid.grid_position,
            win_probability,
            win_count: 0,
            win_percentage: 0.0,
        }
    }
}

/// Result of a Monte Carlo run.
#[derive(Clone, Debug, Serialize)]
pub struct SimulationOutcome {
    /// Entries in input order with tallies filled in
    pub entries: Vec<SimulationEntry>,

    pub trials_requested: usize,

    /// Trials actually executed; below `trials_requested` only when cancelled
    pub trials_run: u64,

    /// Executed trials in which every competitor with a chance failed
    pub no_winner_trials: u64,

    /// Base seed the run was derived from
    pub seed: u64,
}

impl SimulationOutcome {
    /// Entries sorted by descending win percentage, ties broken by grid position.
    pub fn ranked(&self) -> Vec<&SimulationEntry> {
        let mut ranked: Vec<&SimulationEntry> = self.entries.iter().collect();
        ranked.sort_by(|a, b| {
            b.win_percentage
                .total_cmp(&a.win_percentage)
                .then(a.grid_position.cmp(&b.grid_position))
        });
        ranked
    }

    pub fn total_wins(&self) -> u64 {
        self.entries.iter().map(|e| e.win_count).sum()
    }

    pub fn is_complete(&self) -> bool {
        self.trials_run == self.trials_requested as u64
    }

    pub fn get(&self, competitor_id: &str) -> Option<&SimulationEntry> {
        self.entries.iter().find(|e| e.competitor_id == competitor_id)
    }
}

/// Private accumulator owned by one chunk of trials.
#[derive(Clone, Debug)]
struct ChunkTally {
    wins: Vec<u64>,
    trials: u64,
    no_winner: u64,
}

impl ChunkTally {
    fn new(n_competitors: usize) -> Self {
        ChunkTally {
            wins: vec![0; n_competitors],
            trials: 0,
            no_winner: 0,
        }
    }

    fn merge(mut self, other: ChunkTally) -> Self {
        for (total, wins) in self.wins.iter_mut().zip(other.wins) {
            *total += wins;
        }
        self.trials += other.trials;
        self.no_winner += other.no_winner;
        self
    }
}

/// Monte Carlo race simulator.
///
/// Trials are cut into fixed-size chunks. Chunk `k` draws from its own
/// ChaCha8 stream `k` under the base seed, so a run is reproducible for a
/// given seed, trial count and chunk size whether chunks run on the rayon
/// pool or one after another.
#[derive(Clone, Debug)]
pub struct MonteCarloSimulator {
    config: SimulationConfig,
}

impl MonteCarloSimulator {
    pub fn new(config: SimulationConfig) -> Result<Self> {
        config.validate()?;
        Ok(MonteCarloSimulator { config })
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Run every requested trial.
    pub fn run(&self, entries: &[SimulationEntry]) -> Result<SimulationOutcome> {
        self.run_until(entries, &AtomicBool::new(false))
    }

    /// Run trials until done or until `cancel` is raised.
    ///
    /// A cancelled run reports the trials it executed and computes
    /// percentages over those alone.
    pub fn run_until(&self, entries: &[SimulationEntry], cancel: &AtomicBool) -> Result<SimulationOutcome> {
        let probs = validated_probabilities(entries)?;
        let seed = self.config.seed.unwrap_or_else(rand::random);
        let n_chunks = self.config.n_simulations.div_ceil(self.config.chunk_size);

        tracing::debug!(
            competitors = probs.len(),
            trials = self.config.n_simulations,
            chunks = n_chunks,
            seed,
            parallel = self.config.parallel,
            "starting monte carlo run"
        );

        let run_chunk = |chunk: usize| self.run_chunk(&probs, seed, chunk, cancel);
        let tally = if self.config.parallel {
            (0..n_chunks)
                .into_par_iter()
                .map(run_chunk)
                .reduce(|| ChunkTally::new(probs.len()), ChunkTally::merge)
        } else {
            (0..n_chunks)
                .map(run_chunk)
                .fold(ChunkTally::new(probs.len()), ChunkTally::merge)
        };

        if tally.trials < self.config.n_simulations as u64 {
            tracing::warn!(
                requested = self.config.n_simulations,
                executed = tally.trials,
                "simulation cancelled before all trials ran"
            );
        }

        let mut results: Vec<SimulationEntry> = entries.to_vec();
        for (entry, &wins) in results.iter_mut().zip(&tally.wins) {
            entry.win_count = wins;
            entry.win_percentage = if tally.trials > 0 {
                wins as f64 / tally.trials as f64 * 100.0
            } else {
                0.0
            };
        }

        Ok(SimulationOutcome {
            entries: results,
            trials_requested: self.config.n_simulations,
            trials_run: tally.trials,
            no_winner_trials: tally.no_winner,
            seed,
        })
    }

    fn run_chunk(&self, probs: &[f64], seed: u64, chunk: usize, cancel: &AtomicBool) -> ChunkTally {
        let start = chunk * self.config.chunk_size;
        let len = self.config.chunk_size.min(self.config.n_simulations - start);

        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        rng.set_stream(chunk as u64);

        let mut tally = ChunkTally::new(probs.len());
        let mut survivors = Vec::with_capacity(probs.len());
        for _ in 0..len {
            if cancel.load(Ordering::Relaxed) {
                break;
            }
            tally.trials += 1;
            match simulate_trial(probs, self.config.dnf_prob, &mut rng, &mut survivors) {
                Some(winner) => tally.wins[winner] += 1,
                None => tally.no_winner += 1,
            }
        }
        tally
    }
}

/// Dense probability vector indexed like `entries`.
fn validated_probabilities(entries: &[SimulationEntry]) -> Result<Vec<f64>> {
    if entries.is_empty() {
        return Err(RaceOddsError::invalid("no competitors to simulate"));
    }
    for entry in entries {
        if !entry.win_probability.is_finite() || entry.win_probability < 0.0 {
            return Err(RaceOddsError::invalid(format!(
                "{} has invalid win probability {}",
                entry.competitor_id, entry.win_probability
            )));
        }
    }
    let total: f64 = entries.iter().map(|e| e.win_probability).sum();
    if (total - 1.0).abs() > PROBABILITY_TOLERANCE {
        return Err(RaceOddsError::DegenerateDistribution { total });
    }
    Ok(entries.iter().map(|e| e.win_probability).collect())
}
