//! Python bindings used by the data-retrieval scripts.

use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;

use crate::config::{BlendConfig, ForecastConfig, SimulationConfig};
use crate::constants::{
    DEFAULT_DNF_PROB, DEFAULT_GRID_WEIGHT, DEFAULT_N_SIMULATIONS, DEFAULT_PENALTY_POSITION, DEFAULT_PERF_WEIGHT,
};
use crate::error::RaceOddsError;
use crate::grid::{score_grid, GridEntry, GridScoring, GridSlot};
use crate::performance::{score_performance, PerformanceScore};
use crate::report::win_interval;
use crate::results::{FinishStatus, ResultRecord, ResultStore};
use crate::simulation::{MonteCarloSimulator, SimulationEntry};
use crate::win_prob::blend_win_probabilities;

impl From<RaceOddsError> for PyErr {
    fn from(err: RaceOddsError) -> PyErr {
        PyValueError::new_err(err.to_string())
    }
}

/// (competitor, team, round, position, status label)
type ResultRow = (String, String, u32, u32, String);

/// (competitor, team, grid position)
type GridRow = (String, String, i32);

fn to_records(rows: Vec<ResultRow>, target_round: Option<u32>) -> Result<Vec<ResultRecord>, RaceOddsError> {
    let records = rows
        .into_iter()
        .map(|(id, team, round, pos, status)| ResultRecord::new(id, team, round, pos, FinishStatus::from_label(&status)))
        .collect::<Result<Vec<_>, _>>()?;
    let store = ResultStore::from_records(records)?;
    Ok(match target_round {
        Some(round) => store.completed_before(round),
        None => store.records().to_vec(),
    })
}

fn to_slots(rows: Vec<GridRow>) -> Vec<GridSlot> {
    rows.into_iter()
        .map(|(id, team, pos)| GridSlot::new(id, team, pos))
        .collect()
}

/// Score season form from result rows.
#[pyfunction]
#[pyo3(signature = (results, penalty_position = DEFAULT_PENALTY_POSITION, target_round = None))]
fn py_score_performance(
    results: Vec<ResultRow>,
    penalty_position: u32,
    target_round: Option<u32>,
) -> PyResult<Vec<PerformanceScore>> {
    let records = to_records(results, target_round)?;
    Ok(score_performance(&records, penalty_position)?)
}

/// Score a starting grid.
#[pyfunction]
#[pyo3(signature = (grid, prior_table = false))]
fn py_score_grid(grid: Vec<GridRow>, prior_table: bool) -> PyResult<Vec<GridEntry>> {
    let scoring = if prior_table {
        GridScoring::PriorTable
    } else {
        GridScoring::Linear
    };
    Ok(score_grid(&to_slots(grid), scoring)?)
}

/// Blend, then simulate the race.
///
/// Returns (entries, trials_run, no_winner_trials, seed). The GIL is
/// released while trials run.
#[pyfunction]
#[pyo3(signature = (
    results,
    grid,
    perf_weight = DEFAULT_PERF_WEIGHT,
    grid_weight = DEFAULT_GRID_WEIGHT,
    dnf_prob = DEFAULT_DNF_PROB,
    n_simulations = DEFAULT_N_SIMULATIONS,
    seed = None,
    penalty_position = DEFAULT_PENALTY_POSITION,
    target_round = None
))]
#[allow(clippy::too_many_arguments)]
fn py_simulate_race(
    py: Python<'_>,
    results: Vec<ResultRow>,
    grid: Vec<GridRow>,
    perf_weight: f64,
    grid_weight: f64,
    dnf_prob: f64,
    n_simulations: usize,
    seed: Option<u64>,
    penalty_position: u32,
    target_round: Option<u32>,
) -> PyResult<(Vec<SimulationEntry>, u64, u64, u64)> {
    let records = to_records(results, target_round)?;
    let slots = to_slots(grid);

    let outcome = py.allow_threads(move || {
        let scores = score_performance(&records, penalty_position)?;
        let grid = score_grid(&slots, GridScoring::Linear)?;
        let entries = blend_win_probabilities(&scores, &grid, &BlendConfig::new(perf_weight, grid_weight))?;
        MonteCarloSimulator::new(SimulationConfig::new(n_simulations, dnf_prob, seed))?.run(&entries)
    })?;

    let mut entries = outcome.entries;
    entries.sort_by(|a, b| b.win_percentage.total_cmp(&a.win_percentage));
    Ok((entries, outcome.trials_run, outcome.no_winner_trials, outcome.seed))
}

/// Wilson interval (percent) for a simulated win share.
#[pyfunction]
#[pyo3(signature = (wins, trials, confidence = 0.95))]
fn py_win_interval(wins: u64, trials: u64, confidence: f64) -> PyResult<(f64, f64)> {
    Ok(win_interval(wins, trials, confidence)?)
}

/// Validate a TOML forecast config and return it normalized as TOML.
#[pyfunction]
fn py_check_config(text: &str) -> PyResult<String> {
    let config = ForecastConfig::from_toml_str(text)?;
    toml::to_string(&config).map_err(|e| PyValueError::new_err(e.to_string()))
}

/// Python module definition
#[pymodule]
fn race_odds_core(m: &Bound<'_, PyModule>) -> PyResult<()> {
    // Classes
    m.add_class::<PerformanceScore>()?;
    m.add_class::<GridEntry>()?;
    m.add_class::<SimulationEntry>()?;

    // Functions
    m.add_function(wrap_pyfunction!(py_score_performance, m)?)?;
    m.add_function(wrap_pyfunction!(py_score_grid, m)?)?;
    m.add_function(wrap_pyfunction!(py_simulate_race, m)?)?;
    m.add_function(wrap_pyfunction!(py_win_interval, m)?)?;
    m.add_function(wrap_pyfunction!(py_check_config, m)?)?;

    // Constants
    m.add("DEFAULT_PENALTY_POSITION", DEFAULT_PENALTY_POSITION)?;
    m.add("DEFAULT_DNF_PROB", DEFAULT_DNF_PROB)?;
    m.add("DEFAULT_N_SIMULATIONS", DEFAULT_N_SIMULATIONS)?;
    m.add("DEFAULT_PERF_WEIGHT", DEFAULT_PERF_WEIGHT)?;
    m.add("DEFAULT_GRID_WEIGHT", DEFAULT_GRID_WEIGHT)?;

    Ok(())
}
