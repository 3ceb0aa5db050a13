use statrs::distribution::{ContinuousCDF, Normal};
use std::fmt::Write;

use crate::error::{RaceOddsError, Result};
use crate::performance::PerformanceScore;
use crate::simulation::SimulationOutcome;

/// Wilson score interval for a simulated win share, in percent.
///
/// # Arguments
/// * `wins` - Trials won
/// * `trials` - Trials executed
/// * `confidence` - Two-sided confidence level in (0, 1)
///
/// # Returns
/// (lower, upper) bounds in percent
pub fn win_interval(wins: u64, trials: u64, confidence: f64) -> Result<(f64, f64)> {
    if !(confidence > 0.0 && confidence < 1.0) {
        return Err(RaceOddsError::invalid(format!(
            "confidence must lie in (0, 1), got {}",
            confidence
        )));
    }
    if trials == 0 {
        return Ok((0.0, 100.0));
    }

    let normal = Normal::new(0.0, 1.0).map_err(|e| RaceOddsError::invalid(e.to_string()))?;
    let z = normal.inverse_cdf(0.5 + confidence / 2.0);

    let n = trials as f64;
    let p = wins as f64 / n;
    let z2 = z * z;
    let denom = 1.0 + z2 / n;
    let centre = (p + z2 / (2.0 * n)) / denom;
    let half_width = z * ((p * (1.0 - p) / n) + z2 / (4.0 * n * n)).sqrt() / denom;

    Ok((
        ((centre - half_width) * 100.0).max(0.0),
        ((centre + half_width) * 100.0).min(100.0),
    ))
}

/// Plain-text standings sorted by descending win percentage.
pub fn format_standings(outcome: &SimulationOutcome) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<4} {:<8} {:<16} {:>5} {:>9} {:>8}",
        "Rank", "Driver", "Team", "Grid", "Prior %", "Win %"
    );
    for (rank, entry) in outcome.ranked().iter().enumerate() {
        let _ = writeln!(
            out,
            "{:<4} {:<8} {:<16} {:>5} {:>9.2} {:>8.2}",
            rank + 1,
            entry.competitor_id,
            entry.team_id,
            entry.grid_position,
            entry.win_probability * 100.0,
            entry.win_percentage
        );
    }
    let _ = writeln!(
        out,
        "{} of {} trials run, {} without a finisher (seed {})",
        outcome.trials_run, outcome.trials_requested, outcome.no_winner_trials, outcome.seed
    );
    out
}

/// Plain-text performance table, best normalized score first.
pub fn format_performance(scores: &[PerformanceScore]) -> String {
    let mut sorted: Vec<&PerformanceScore> = scores.iter().collect();
    sorted.sort_by(|a, b| b.normalized_score.total_cmp(&a.normalized_score));

    let mut out = String::new();
    let _ = writeln!(out, "{:<8} {:<16} {:>10} {:>10}", "Driver", "Team", "AvgFinish", "NormScore");
    for score in sorted {
        let _ = writeln!(
            out,
            "{:<8} {:<16} {:>10.2} {:>10.3}",
            score.competitor_id, score.team_id, score.average_adjusted_finish, score.normalized_score
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::SimulationEntry;

    fn outcome() -> SimulationOutcome {
        let entry = |id: &str, grid: u32, prob: f64, wins: u64| SimulationEntry {
            competitor_id: id.to_string(),
            team_id: "McLaren".to_string(),
            grid_position: grid,
            win_probability: prob,
            win_count: wins,
            win_percentage: wins as f64 / 10.0,
        };
        SimulationOutcome {
            entries: vec![entry("PIA", 1, 0.4, 300), entry("NOR", 2, 0.6, 690)],
            trials_requested: 1000,
            trials_run: 1000,
            no_winner_trials: 10,
            seed: 42,
        }
    }

    #[test]
    fn test_interval_brackets_estimate() {
        let (lo, hi) = win_interval(300, 1000, 0.95).unwrap();
        assert!(lo < 30.0 && hi > 30.0);
        assert!(hi - lo < 6.0);
        assert!((lo - 27.2).abs() < 0.2, "lower bound was {}", lo);
    }

    #[test]
    fn test_interval_edges() {
        let (lo, hi) = win_interval(0, 500, 0.95).unwrap();
        assert!(lo < 1e-9);
        assert!(hi > 0.0 && hi < 1.0);

        assert_eq!(win_interval(0, 0, 0.9).unwrap(), (0.0, 100.0));
        assert!(win_interval(1, 10, 1.0).is_err());
        assert!(win_interval(1, 10, 0.0).is_err());
    }

    #[test]
    fn test_standings_sorted_by_win_share() {
        let table = format_standings(&outcome());
        let nor = table.find("NOR").unwrap();
        let pia = table.find("PIA").unwrap();
        assert!(nor < pia);
        assert!(table.contains("1000 of 1000 trials run, 10 without a finisher (seed 42)"));
    }

    #[test]
    fn test_performance_table_best_first() {
        let score = |id: &str, norm: f64| PerformanceScore {
            competitor_id: id.to_string(),
            team_id: "Ferrari".to_string(),
            average_adjusted_finish: 5.0,
            raw_score: 0.2,
            normalized_score: norm,
        };
        let table = format_performance(&[score("HAM", 0.2), score("LEC", 0.9)]);
        assert!(table.find("LEC").unwrap() < table.find("HAM").unwrap());
    }
}
