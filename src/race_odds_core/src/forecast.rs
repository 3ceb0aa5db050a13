use serde::Serialize;
use std::sync::atomic::AtomicBool;

use crate::config::ForecastConfig;
use crate::error::Result;
use crate::grid::{score_grid, GridEntry};
use crate::performance::{score_performance, PerformanceScore};
use crate::results::ResultStore;
use crate::simulation::{MonteCarloSimulator, SimulationOutcome};
use crate::source::RaceDataSource;
use crate::win_prob::blend_win_probabilities;

/// Everything derived for one target event.
#[derive(Clone, Debug, Serialize)]
pub struct RaceForecast {
    pub season: u32,
    pub event: String,

    /// Rounds that contributed to the performance scores
    pub scored_rounds: Vec<u32>,

    pub performance: Vec<PerformanceScore>,
    pub grid: Vec<GridEntry>,
    pub outcome: SimulationOutcome,
}

/// Forecast the target event end to end.
pub fn forecast<S: RaceDataSource + ?Sized>(config: &ForecastConfig, source: &S) -> Result<RaceForecast> {
    forecast_until(config, source, &AtomicBool::new(false))
}

/// Forecast the target event, stopping the simulation early if `cancel` is raised.
pub fn forecast_until<S: RaceDataSource + ?Sized>(
    config: &ForecastConfig,
    source: &S,
    cancel: &AtomicBool,
) -> Result<RaceForecast> {
    config.validate()?;
    let simulator = MonteCarloSimulator::new(config.simulation())?;

    let upto_round = config.target_round.map(|round| round - 1);
    let store = ResultStore::from_records(source.fetch_season_results(config.season, upto_round)?)?;
    let records = match config.target_round {
        Some(round) => store.completed_before(round),
        None => store.records().to_vec(),
    };
    let scored_rounds = ResultStore::from_records(records.clone())?.rounds();

    tracing::info!(
        season = config.season,
        rounds = scored_rounds.len(),
        records = records.len(),
        "loaded season results"
    );

    let performance = score_performance(&records, config.penalty_position)?;

    let slots = source.fetch_event_grid(config.season, &config.event)?;
    let grid = score_grid(&slots, config.grid_scoring)?;
    tracing::info!(event = %config.event, starters = grid.len(), "loaded event grid");

    let entries = blend_win_probabilities(&performance, &grid, &config.blend())?;
    let outcome = simulator.run_until(&entries, cancel)?;

    tracing::info!(
        trials = outcome.trials_run,
        no_winner = outcome.no_winner_trials,
        seed = outcome.seed,
        "simulation finished"
    );

    Ok(RaceForecast {
        season: config.season,
        event: config.event.clone(),
        scored_rounds,
        performance,
        grid,
        outcome,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RaceOddsError;
    use crate::grid::GridSlot;
    use crate::results::{FinishStatus, ResultRecord};
    use crate::source::InMemorySource;

    fn record(id: &str, team: &str, round: u32, pos: u32, status: FinishStatus) -> ResultRecord {
        ResultRecord::new(id, team, round, pos, status).unwrap()
    }

    fn season() -> InMemorySource {
        InMemorySource::new(2025)
            .with_results(vec![
                record("A", "T1", 1, 1, FinishStatus::Finished),
                record("A", "T1", 2, 3, FinishStatus::Finished),
                record("B", "T2", 1, 5, FinishStatus::Finished),
                record("B", "T2", 2, 5, FinishStatus::Finished),
                // The target round itself must never leak into the scores
                record("B", "T2", 3, 1, FinishStatus::Finished),
            ])
            .with_grid(
                "Hungary",
                vec![
                    GridSlot::new("A", "T1", 1),
                    GridSlot::new("B", "T2", 3),
                    GridSlot::new("C", "T3", 2),
                ],
            )
    }

    fn config() -> ForecastConfig {
        ForecastConfig {
            season: 2025,
            target_round: Some(3),
            event: "Hungary".to_string(),
            dnf_prob: 0.0,
            n_simulations: 100_000,
            seed: Some(2025),
            ..ForecastConfig::default()
        }
    }

    #[test]
    fn test_three_car_forecast() {
        let result = forecast(&config(), &season()).unwrap();

        assert_eq!(result.scored_rounds, vec![1, 2]);
        assert_eq!(result.performance.len(), 2);

        let outcome = &result.outcome;
        assert_eq!(outcome.get("B").unwrap().win_count, 0);
        assert_eq!(outcome.get("B").unwrap().win_probability, 0.0);
        assert!((outcome.get("A").unwrap().win_probability - 1.0 / 1.15).abs() < 1e-12);
        assert!((outcome.get("C").unwrap().win_probability - 0.15 / 1.15).abs() < 1e-12);
        assert_eq!(outcome.total_wins(), 100_000);
    }

    #[test]
    fn test_forecast_is_reproducible() {
        let mut cfg = config();
        cfg.dnf_prob = 0.02;
        let first = forecast(&cfg, &season()).unwrap();
        let second = forecast(&cfg, &season()).unwrap();
        assert_eq!(first.outcome.entries, second.outcome.entries);
    }

    #[test]
    fn test_no_history_is_insufficient() {
        let mut cfg = config();
        cfg.target_round = Some(1);
        let err = forecast(&cfg, &season()).unwrap_err();
        assert!(matches!(err, RaceOddsError::InsufficientData(_)));
    }

    #[test]
    fn test_all_rounds_when_target_unset() {
        let mut cfg = config();
        cfg.target_round = None;
        let result = forecast(&cfg, &season()).unwrap();
        assert_eq!(result.scored_rounds, vec![1, 2, 3]);
    }

    #[test]
    fn test_missing_grid_is_source_error() {
        let mut cfg = config();
        cfg.event = "Monza".to_string();
        assert!(matches!(forecast(&cfg, &season()), Err(RaceOddsError::Source(_))));
    }

    #[test]
    fn test_invalid_config_fails_before_fetching() {
        let mut cfg = config();
        cfg.n_simulations = 0;
        assert!(matches!(forecast(&cfg, &season()), Err(RaceOddsError::InvalidInput(_))));
    }
}
