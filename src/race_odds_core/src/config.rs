//! Configuration for a race forecast

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_CHUNK_SIZE, DEFAULT_DNF_PROB, DEFAULT_GRID_WEIGHT, DEFAULT_N_SIMULATIONS,
    DEFAULT_PENALTY_POSITION, DEFAULT_PERF_WEIGHT,
};
use crate::error::{RaceOddsError, Result};
use crate::grid::GridScoring;

/// Everything a forecast run needs, passed explicitly to each stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForecastConfig {
    /// Season whose results feed the performance score
    pub season: u32,

    /// Round of the target event; results from this round onward are ignored.
    /// When unset every stored round is used.
    pub target_round: Option<u32>,

    /// Event identifier handed to the data source for the grid
    pub event: String,

    /// Finishing position charged for any non-finish
    pub penalty_position: u32,

    /// Weight of season performance in the blend
    pub perf_weight: f64,

    /// Weight of grid position in the blend
    pub grid_weight: f64,

    /// Grid scoring model
    pub grid_scoring: GridScoring,

    /// Per-trial failure-to-finish probability, identical for every starter
    pub dnf_prob: f64,

    /// Number of Monte Carlo trials
    pub n_simulations: usize,

    /// Base seed; drawn from entropy when unset
    pub seed: Option<u64>,

    /// Trials per independently seeded chunk
    pub chunk_size: usize,

    /// Run chunks on the rayon pool
    pub parallel: bool,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        ForecastConfig {
            season: 2025,
            target_round: None,
            event: String::new(),
            penalty_position: DEFAULT_PENALTY_POSITION,
            perf_weight: DEFAULT_PERF_WEIGHT,
            grid_weight: DEFAULT_GRID_WEIGHT,
            grid_scoring: GridScoring::default(),
            dnf_prob: DEFAULT_DNF_PROB,
            n_simulations: DEFAULT_N_SIMULATIONS,
            seed: None,
            chunk_size: DEFAULT_CHUNK_SIZE,
            parallel: true,
        }
    }
}

impl ForecastConfig {
    /// Parse a TOML document; missing keys take their defaults.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: ForecastConfig = toml::from_str(text)
            .map_err(|e| RaceOddsError::invalid(format!("bad forecast config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.penalty_position == 0 {
            return Err(RaceOddsError::invalid("penalty_position must be at least 1"));
        }
        if self.target_round == Some(0) {
            return Err(RaceOddsError::invalid("target_round must be at least 1"));
        }
        self.blend().validate()?;
        self.simulation().validate()
    }

    pub fn blend(&self) -> BlendConfig {
        BlendConfig::new(self.perf_weight, self.grid_weight)
    }

    pub fn simulation(&self) -> SimulationConfig {
        SimulationConfig {
            n_simulations: self.n_simulations,
            dnf_prob: self.dnf_prob,
            seed: self.seed,
            chunk_size: self.chunk_size,
            parallel: self.parallel,
        }
    }
}

/// Blend weights for performance and grid score.
///
/// The weights need not sum to 1; the blend is renormalized.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BlendConfig {
    pub perf_weight: f64,
    pub grid_weight: f64,
}

impl BlendConfig {
    pub fn new(perf_weight: f64, grid_weight: f64) -> Self {
        BlendConfig {
            perf_weight,
            grid_weight,
        }
    }

    pub fn validate(&self) -> Result<()> {
        for (name, weight) in [("perf_weight", self.perf_weight), ("grid_weight", self.grid_weight)] {
            if !weight.is_finite() || weight < 0.0 {
                return Err(RaceOddsError::invalid(format!(
                    "{} must be a non-negative number, got {}",
                    name, weight
                )));
            }
        }
        Ok(())
    }
}

impl Default for BlendConfig {
    fn default() -> Self {
        BlendConfig::new(DEFAULT_PERF_WEIGHT, DEFAULT_GRID_WEIGHT)
    }
}

/// Monte Carlo settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    pub n_simulations: usize,
    pub dnf_prob: f64,
    pub seed: Option<u64>,
    pub chunk_size: usize,
    pub parallel: bool,
}

impl SimulationConfig {
    pub fn new(n_simulations: usize, dnf_prob: f64, seed: Option<u64>) -> Self {
        SimulationConfig {
            n_simulations,
            dnf_prob,
            seed,
            ..SimulationConfig::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.n_simulations == 0 {
            return Err(RaceOddsError::invalid("trial count must be at least 1"));
        }
        if self.chunk_size == 0 {
            return Err(RaceOddsError::invalid("chunk_size must be at least 1"));
        }
        if !(0.0..=1.0).contains(&self.dnf_prob) {
            return Err(RaceOddsError::invalid(format!(
                "dnf_prob must lie in [0, 1], got {}",
                self.dnf_prob
            )));
        }
        Ok(())
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        SimulationConfig {
            n_simulations: DEFAULT_N_SIMULATIONS,
            dnf_prob: DEFAULT_DNF_PROB,
            seed: None,
            chunk_size: DEFAULT_CHUNK_SIZE,
            parallel: true,
        }
    }
}
