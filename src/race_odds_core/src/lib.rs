//! Race Odds Core - Monte Carlo race win-probability engine.
//!
//! Season results are reduced to a normalized performance score, blended
//! with the starting grid into per-driver win probabilities, and fed to a
//! seeded, parallel Monte Carlo simulation with random retirements. Python
//! bindings are available behind the `python` feature.

pub mod config;
pub mod constants;
pub mod error;
pub mod forecast;
pub mod grid;
pub mod performance;
#[cfg(feature = "python")]
mod python;
pub mod report;
pub mod results;
pub mod simulation;
pub mod source;
pub mod trial;
pub mod win_prob;

pub use config::{BlendConfig, ForecastConfig, SimulationConfig};
pub use constants::{
    DEFAULT_DNF_PROB, DEFAULT_GRID_WEIGHT, DEFAULT_N_SIMULATIONS, DEFAULT_PENALTY_POSITION, DEFAULT_PERF_WEIGHT,
};
pub use error::{RaceOddsError, Result};
pub use forecast::{forecast, forecast_until, RaceForecast};
pub use grid::{linear_grid_score, score_grid, GridEntry, GridScoring, GridSlot};
pub use performance::{min_normalized_score, score_performance, PerformanceScore};
pub use report::{format_performance, format_standings, win_interval};
pub use results::{FinishStatus, ResultRecord, ResultStore};
pub use simulation::{MonteCarloSimulator, SimulationEntry, SimulationOutcome};
pub use source::{InMemorySource, RaceDataSource};
pub use trial::simulate_trial;
pub use win_prob::blend_win_probabilities;
