#[cfg(feature = "python")]
use pyo3::prelude::*;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::error::{RaceOddsError, Result};
use crate::results::ResultRecord;

/// Season-to-date form of one competitor.
#[cfg_attr(feature = "python", pyclass(get_all))]
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PerformanceScore {
    pub competitor_id: String,

    /// Team in the competitor's latest scored round
    pub team_id: String,

    /// Mean finishing position with non-finishes charged the penalty position
    pub average_adjusted_finish: f64,

    /// Inverse of the average finish (higher is better)
    pub raw_score: f64,

    /// Min-max normalized raw score across the field, in [0, 1]
    pub normalized_score: f64,
}

struct FinishTally<'a> {
    team_id: &'a str,
    latest_round: u32,
    position_sum: u64,
    count: u32,
}

/// Reduce season results to one normalized score per competitor.
///
/// Records must already be restricted to rounds before the target event.
/// When every competitor has the same raw score the field is scored a
/// uniform 1.0 rather than dividing by a zero range.
///
/// # Arguments
/// * `records` - Results of completed rounds
/// * `penalty_position` - Position charged for any non-finish
///
/// # Returns
/// Scores sorted by competitor id
pub fn score_performance(records: &[ResultRecord], penalty_position: u32) -> Result<Vec<PerformanceScore>> {
    if penalty_position == 0 {
        return Err(RaceOddsError::invalid("penalty position must be at least 1"));
    }
    if records.is_empty() {
        return Err(RaceOddsError::InsufficientData(
            "no completed results to score".to_string(),
        ));
    }

    let mut tallies: BTreeMap<&str, FinishTally> = BTreeMap::new();
    for record in records {
        let tally = tallies.entry(record.competitor_id.as_str()).or_insert(FinishTally {
            team_id: record.team_id.as_str(),
            latest_round: record.round_number,
            position_sum: 0,
            count: 0,
        });
        if record.round_number >= tally.latest_round {
            tally.latest_round = record.round_number;
            tally.team_id = record.team_id.as_str();
        }
        tally.position_sum += u64::from(record.adjusted_position(penalty_position));
        tally.count += 1;
    }

    let mut scores: Vec<PerformanceScore> = tallies
        .into_iter()
        .map(|(competitor_id, tally)| {
            let average = tally.position_sum as f64 / f64::from(tally.count);
            PerformanceScore {
                competitor_id: competitor_id.to_string(),
                team_id: tally.team_id.to_string(),
                average_adjusted_finish: average,
                raw_score: 1.0 / average,
                normalized_score: 0.0,
            }
        })
        .collect();

    let (min, max) = scores.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), s| {
        (lo.min(s.raw_score), hi.max(s.raw_score))
    });
    let range = max - min;
    for score in &mut scores {
        score.normalized_score = if range > 0.0 {
            (score.raw_score - min) / range
        } else {
            1.0
        };
    }

    tracing::debug!(
        competitors = scores.len(),
        records = records.len(),
        uniform = range <= 0.0,
        "scored season performance"
    );

    Ok(scores)
}

/// Lowest normalized score in a set, used for competitors without history.
pub fn min_normalized_score(scores: &[PerformanceScore]) -> f64 {
    scores
        .iter()
        .map(|s| s.normalized_score)
        .reduce(f64::min)
        .unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::results::FinishStatus;
    use proptest::prelude::*;

    fn record(id: &str, team: &str, round: u32, pos: u32, status: FinishStatus) -> ResultRecord {
        ResultRecord::new(id, team, round, pos, status).unwrap()
    }

    fn find<'a>(scores: &'a [PerformanceScore], id: &str) -> &'a PerformanceScore {
        scores.iter().find(|s| s.competitor_id == id).unwrap()
    }

    #[test]
    fn test_best_and_worst_normalized() {
        let records = vec![
            record("A", "T1", 1, 1, FinishStatus::Finished),
            record("A", "T1", 2, 3, FinishStatus::Finished),
            record("B", "T2", 1, 5, FinishStatus::Finished),
            record("B", "T2", 2, 5, FinishStatus::Finished),
        ];

        let scores = score_performance(&records, 20).unwrap();

        let a = find(&scores, "A");
        let b = find(&scores, "B");
        assert!((a.average_adjusted_finish - 2.0).abs() < 1e-12);
        assert!((a.raw_score - 0.5).abs() < 1e-12);
        assert!((a.normalized_score - 1.0).abs() < 1e-12);
        assert!((b.average_adjusted_finish - 5.0).abs() < 1e-12);
        assert!(b.normalized_score.abs() < 1e-12);
    }

    #[test]
    fn test_non_finish_charged_penalty() {
        // A retirement from P2 must count as P20, not P2
        let records = vec![
            record("A", "T1", 1, 2, FinishStatus::DidNotFinish),
            record("A", "T1", 2, 4, FinishStatus::Finished),
            record("B", "T2", 1, 10, FinishStatus::Finished),
        ];

        let scores = score_performance(&records, 20).unwrap();
        assert!((find(&scores, "A").average_adjusted_finish - 12.0).abs() < 1e-12);
    }

    #[test]
    fn test_penalty_is_configurable() {
        let records = vec![
            record("A", "T1", 1, 1, FinishStatus::Other),
            record("B", "T2", 1, 3, FinishStatus::Finished),
        ];

        let scores = score_performance(&records, 25).unwrap();
        assert!((find(&scores, "A").average_adjusted_finish - 25.0).abs() < 1e-12);
    }

    #[test]
    fn test_uniform_when_all_equal() {
        let records = vec![
            record("A", "T1", 1, 4, FinishStatus::Finished),
            record("B", "T2", 1, 2, FinishStatus::Finished),
            record("B", "T2", 2, 6, FinishStatus::Finished),
        ];

        let scores = score_performance(&records, 20).unwrap();
        for score in &scores {
            assert!(score.normalized_score.is_finite());
            assert_eq!(score.normalized_score, 1.0);
        }
    }

    #[test]
    fn test_single_competitor_uniform() {
        let records = vec![record("A", "T1", 1, 7, FinishStatus::Finished)];
        let scores = score_performance(&records, 20).unwrap();
        assert_eq!(scores.len(), 1);
        assert_eq!(scores[0].normalized_score, 1.0);
    }

    #[test]
    fn test_empty_records_insufficient() {
        let err = score_performance(&[], 20).unwrap_err();
        assert!(matches!(err, RaceOddsError::InsufficientData(_)));
    }

    #[test]
    fn test_zero_penalty_rejected() {
        let records = vec![record("A", "T1", 1, 1, FinishStatus::Finished)];
        assert!(matches!(
            score_performance(&records, 0),
            Err(RaceOddsError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_team_from_latest_round() {
        let records = vec![
            record("LAW", "RBR", 2, 12, FinishStatus::Finished),
            record("LAW", "RB", 3, 9, FinishStatus::Finished),
            record("LAW", "RBR", 1, 11, FinishStatus::Finished),
        ];

        let scores = score_performance(&records, 20).unwrap();
        assert_eq!(scores[0].team_id, "RB");
    }

    #[test]
    fn test_min_normalized_score() {
        assert_eq!(min_normalized_score(&[]), 0.0);

        let records = vec![
            record("A", "T1", 1, 1, FinishStatus::Finished),
            record("B", "T2", 1, 2, FinishStatus::Finished),
            record("C", "T3", 1, 4, FinishStatus::Finished),
        ];
        let scores = score_performance(&records, 20).unwrap();
        assert_eq!(min_normalized_score(&scores), 0.0);
    }

    proptest! {
        #[test]
        fn prop_normalized_in_unit_interval(
            rows in prop::collection::vec((0usize..6, 1u32..25, any::<bool>()), 1..60)
        ) {
            let records: Vec<ResultRecord> = rows
                .iter()
                .enumerate()
                .map(|(i, &(who, pos, finished))| {
                    let status = if finished { FinishStatus::Finished } else { FinishStatus::DidNotFinish };
                    record(&format!("D{}", who), "T", i as u32 + 1, pos, status)
                })
                .collect();

            let scores = score_performance(&records, 20).unwrap();
            for s in &scores {
                prop_assert!(s.normalized_score >= 0.0 && s.normalized_score <= 1.0);
                prop_assert!((s.raw_score - 1.0 / s.average_adjusted_finish).abs() < 1e-12);
            }
            prop_assert!(scores.iter().any(|s| s.normalized_score == 1.0));
        }
    }
}
