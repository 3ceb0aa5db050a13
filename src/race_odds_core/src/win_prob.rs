use std::collections::HashMap;

use crate::config::BlendConfig;
use crate::error::{RaceOddsError, Result};
use crate::grid::GridEntry;
use crate::performance::{min_normalized_score, PerformanceScore};
use crate::simulation::SimulationEntry;

/// Blend season form and grid position into a win probability per starter.
///
/// Every grid entry receives a probability. Starters with no scored history
/// take the weakest normalized score in the field.
///
/// # Arguments
/// * `scores` - Performance scores for competitors with history
/// * `grid` - Scored grid for the target event
/// * `weights` - Relative weight of performance and grid score
///
/// # Returns
/// Simulation entries in grid order whose probabilities sum to 1.0
pub fn blend_win_probabilities(
    scores: &[PerformanceScore],
    grid: &[GridEntry],
    weights: &BlendConfig,
) -> Result<Vec<SimulationEntry>> {
    weights.validate()?;
    if grid.is_empty() {
        return Err(RaceOddsError::invalid("cannot blend an empty grid"));
    }

    let by_competitor: HashMap<&str, &PerformanceScore> =
        scores.iter().map(|s| (s.competitor_id.as_str(), s)).collect();
    let fallback = min_normalized_score(scores);

    let final_scores: Vec<f64> = grid
        .iter()
        .map(|entry| {
            let normalized = match by_competitor.get(entry.competitor_id.as_str()) {
                Some(score) => score.normalized_score,
                None => {
                    tracing::warn!(
                        competitor = %entry.competitor_id,
                        fallback,
                        "no season history, using weakest field score"
                    );
                    fallback
                }
            };
            weights.perf_weight * normalized + weights.grid_weight * entry.grid_score
        })
        .collect();

    let total: f64 = final_scores.iter().sum();
    if !(total > 0.0) || !total.is_finite() {
        return Err(RaceOddsError::DegenerateDistribution { total });
    }

    let entries: Vec<SimulationEntry> = grid
        .iter()
        .zip(final_scores)
        .map(|(entry, score)| SimulationEntry::new(entry, score / total))
        .collect();

    tracing::debug!(
        entries = entries.len(),
        perf_weight = weights.perf_weight,
        grid_weight = weights.grid_weight,
        "blended win probabilities"
    );

    Ok(entries)
}
