use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::error::{RaceOddsError, Result};

/// Classification of a competitor's result in one round.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FinishStatus {
    Finished,
    DidNotFinish,
    Other,
}

impl FinishStatus {
    /// Map a provider status label onto a classification.
    ///
    /// Only an exact "Finished" counts as a classified finish; lapped
    /// finishers ("+1 Lap") and disqualifications fall into `Other`.
    pub fn from_label(label: &str) -> Self {
        match label.trim() {
            "Finished" => FinishStatus::Finished,
            s if s.eq_ignore_ascii_case("dnf")
                || s.eq_ignore_ascii_case("retired")
                || s.eq_ignore_ascii_case("did not finish") =>
            {
                FinishStatus::DidNotFinish
            }
            _ => FinishStatus::Other,
        }
    }

    pub fn is_finished(self) -> bool {
        self == FinishStatus::Finished
    }
}

/// One competitor's result in one completed round.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ResultRecord {
    pub competitor_id: String,
    pub team_id: String,
    pub round_number: u32,
    pub finishing_position: u32,
    pub status: FinishStatus,
}

impl ResultRecord {
    pub fn new(
        competitor_id: impl Into<String>,
        team_id: impl Into<String>,
        round_number: u32,
        finishing_position: u32,
        status: FinishStatus,
    ) -> Result<Self> {
        let record = ResultRecord {
            competitor_id: competitor_id.into(),
            team_id: team_id.into(),
            round_number,
            finishing_position,
            status,
        };
        record.validate()?;
        Ok(record)
    }

    /// Position used for scoring: the real position for a classified
    /// finish, the penalty position otherwise.
    pub fn adjusted_position(&self, penalty_position: u32) -> u32 {
        if self.status.is_finished() {
            self.finishing_position
        } else {
            penalty_position
        }
    }

    fn validate(&self) -> Result<()> {
        if self.competitor_id.is_empty() {
            return Err(RaceOddsError::invalid("result record has an empty competitor id"));
        }
        if self.round_number == 0 {
            return Err(RaceOddsError::invalid(format!(
                "result for {} has round number 0",
                self.competitor_id
            )));
        }
        if self.finishing_position == 0 {
            return Err(RaceOddsError::invalid(format!(
                "result for {} in round {} has finishing position 0",
                self.competitor_id, self.round_number
            )));
        }
        Ok(())
    }
}

/// Season results, one row per (competitor, round).
///
/// Rounds that could not be fetched are simply absent.
#[derive(Clone, Debug, Default)]
pub struct ResultStore {
    records: Vec<ResultRecord>,
}

impl ResultStore {
    pub fn new() -> Self {
        ResultStore { records: Vec::new() }
    }

    /// Build a store, rejecting malformed rows and duplicate
    /// (competitor, round) pairs.
    pub fn from_records(records: Vec<ResultRecord>) -> Result<Self> {
        let mut store = ResultStore::new();
        for record in records {
            store.insert(record)?;
        }
        Ok(store)
    }

    pub fn insert(&mut self, record: ResultRecord) -> Result<()> {
        record.validate()?;
        let duplicate = self.records.iter().any(|r| {
            r.competitor_id == record.competitor_id && r.round_number == record.round_number
        });
        if duplicate {
            return Err(RaceOddsError::invalid(format!(
                "duplicate result for {} in round {}",
                record.competitor_id, record.round_number
            )));
        }
        self.records.push(record);
        Ok(())
    }

    pub fn records(&self) -> &[ResultRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records from rounds strictly before `round`.
    pub fn completed_before(&self, round: u32) -> Vec<ResultRecord> {
        self.records
            .iter()
            .filter(|r| r.round_number < round)
            .cloned()
            .collect()
    }

    /// Highest round number present in the store.
    pub fn latest_round(&self) -> Option<u32> {
        self.records.iter().map(|r| r.round_number).max()
    }

    /// Distinct rounds present, ascending.
    pub fn rounds(&self) -> Vec<u32> {
        self.records
            .iter()
            .map(|r| r.round_number)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}
