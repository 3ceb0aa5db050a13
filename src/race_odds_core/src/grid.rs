#[cfg(feature = "python")]
use pyo3::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::constants::grid_prior_score;
use crate::error::{RaceOddsError, Result};

/// A competitor's starting slot as delivered by the data source.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GridSlot {
    pub competitor_id: String,
    pub team_id: String,
    pub grid_position: i32,
}

impl GridSlot {
    pub fn new(competitor_id: impl Into<String>, team_id: impl Into<String>, grid_position: i32) -> Self {
        GridSlot {
            competitor_id: competitor_id.into(),
            team_id: team_id.into(),
            grid_position,
        }
    }
}

/// How a starting position is turned into a [0, 1] score.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GridScoring {
    /// Linear from pole (1.0) to the back of the grid (0.0)
    #[default]
    Linear,

    /// Fixed per-position win prior, rescaled so pole scores 1.0
    PriorTable,
}

/// A validated grid slot with its score.
#[cfg_attr(feature = "python", pyclass(get_all))]
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct GridEntry {
    pub competitor_id: String,
    pub team_id: String,
    pub grid_position: u32,
    pub grid_score: f64,
}

/// Linear grid score for one position given the field's extremes.
///
/// A grid where every slot shares the same position (in practice a single
/// competitor) scores 1.0.
pub fn linear_grid_score(grid_position: u32, min_position: u32, max_position: u32) -> f64 {
    if max_position == min_position {
        1.0
    } else {
        1.0 - f64::from(grid_position - 1) / f64::from(max_position - 1)
    }
}

/// Score every slot on the grid.
///
/// # Returns
/// Entries sorted by grid position
pub fn score_grid(slots: &[GridSlot], scoring: GridScoring) -> Result<Vec<GridEntry>> {
    if slots.is_empty() {
        return Err(RaceOddsError::invalid("grid is empty"));
    }

    let mut seen_positions = HashSet::new();
    let mut seen_competitors = HashSet::new();
    let mut positions = Vec::with_capacity(slots.len());
    for slot in slots {
        if slot.grid_position <= 0 {
            return Err(RaceOddsError::invalid(format!(
                "{} has non-positive grid position {}",
                slot.competitor_id, slot.grid_position
            )));
        }
        let position = slot.grid_position as u32;
        if !seen_positions.insert(position) {
            return Err(RaceOddsError::invalid(format!("grid position {} is taken twice", position)));
        }
        if !seen_competitors.insert(slot.competitor_id.as_str()) {
            return Err(RaceOddsError::invalid(format!(
                "{} appears twice on the grid",
                slot.competitor_id
            )));
        }
        positions.push(position);
    }

    let min_position = positions.iter().copied().min().unwrap_or(1);
    let max_position = positions.iter().copied().max().unwrap_or(1);

    let mut entries: Vec<GridEntry> = slots
        .iter()
        .zip(positions)
        .map(|(slot, position)| {
            let grid_score = match scoring {
                GridScoring::Linear => linear_grid_score(position, min_position, max_position),
                GridScoring::PriorTable => grid_prior_score(position),
            };
            GridEntry {
                competitor_id: slot.competitor_id.clone(),
                team_id: slot.team_id.clone(),
                grid_position: position,
                grid_score,
            }
        })
        .collect();
    entries.sort_by_key(|e| e.grid_position);

    tracing::debug!(entries = entries.len(), max_position, ?scoring, "scored grid");

    Ok(entries)
}
