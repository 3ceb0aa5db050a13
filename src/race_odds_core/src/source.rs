use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::{RaceOddsError, Result};
use crate::grid::GridSlot;
use crate::results::ResultRecord;

/// Provider of season results and event grids.
///
/// Implementations may return a partial season when some rounds cannot be
/// loaded; missing rounds are left out rather than zero-filled.
pub trait RaceDataSource {
    /// Results for every available round up to and including `upto_round`.
    fn fetch_season_results(&self, season: u32, upto_round: Option<u32>) -> Result<Vec<ResultRecord>>;

    /// Starting grid for one event.
    fn fetch_event_grid(&self, season: u32, event: &str) -> Result<Vec<GridSlot>>;
}

/// Season data already loaded into memory.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct InMemorySource {
    pub season: u32,
    pub results: Vec<ResultRecord>,

    /// Grids keyed by event identifier
    pub grids: HashMap<String, Vec<GridSlot>>,
}

impl InMemorySource {
    pub fn new(season: u32) -> Self {
        InMemorySource {
            season,
            ..InMemorySource::default()
        }
    }

    pub fn with_results(mut self, results: Vec<ResultRecord>) -> Self {
        self.results = results;
        self
    }

    pub fn with_grid(mut self, event: impl Into<String>, grid: Vec<GridSlot>) -> Self {
        self.grids.insert(event.into(), grid);
        self
    }

    fn check_season(&self, season: u32) -> Result<()> {
        if season != self.season {
            return Err(RaceOddsError::Source(format!(
                "season {} is not loaded (have {})",
                season, self.season
            )));
        }
        Ok(())
    }
}

impl RaceDataSource for InMemorySource {
    fn fetch_season_results(&self, season: u32, upto_round: Option<u32>) -> Result<Vec<ResultRecord>> {
        self.check_season(season)?;
        Ok(self
            .results
            .iter()
            .filter(|r| upto_round.map_or(true, |round| r.round_number <= round))
            .cloned()
            .collect())
    }

    fn fetch_event_grid(&self, season: u32, event: &str) -> Result<Vec<GridSlot>> {
        self.check_season(season)?;
        self.grids
            .get(event)
            .cloned()
            .ok_or_else(|| RaceOddsError::Source(format!("no grid for event '{}'", event)))
    }
}
