/// Finishing position charged to any result that is not a classified finish
pub const DEFAULT_PENALTY_POSITION: u32 = 20;

/// Per-trial probability that a competitor fails to finish
pub const DEFAULT_DNF_PROB: f64 = 0.02;

/// Number of Monte Carlo trials per forecast
pub const DEFAULT_N_SIMULATIONS: usize = 10_000;

/// Weight of the season performance score in the blend
pub const DEFAULT_PERF_WEIGHT: f64 = 0.7;

/// Weight of the grid score in the blend
pub const DEFAULT_GRID_WEIGHT: f64 = 0.3;

/// Trials per independently seeded chunk
pub const DEFAULT_CHUNK_SIZE: usize = 4096;

/// Allowed drift of a probability vector's sum away from 1.0
pub const PROBABILITY_TOLERANCE: f64 = 1e-6;

/// Grid prior win probabilities for P1 through P10
pub const GRID_PRIOR_PROBS: [f64; 10] = [0.25, 0.20, 0.15, 0.10, 0.08, 0.07, 0.05, 0.04, 0.03, 0.02];

/// Grid prior for every position behind P10
pub const GRID_PRIOR_TAIL: f64 = 0.01;

/// Grid prior for a 1-based position, rescaled so pole scores 1.0
pub fn grid_prior_score(grid_position: u32) -> f64 {
    let prior = match grid_position {
        0 => 0.0,
        p => GRID_PRIOR_PROBS
            .get((p - 1) as usize)
            .copied()
            .unwrap_or(GRID_PRIOR_TAIL),
    };
    prior / GRID_PRIOR_PROBS[0]
}
