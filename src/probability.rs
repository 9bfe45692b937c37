//! Exact win/loss probabilities for a two-party dice race.
//!
//! Player and house each add one die per remaining stage to a running sum.
//! The distribution of the future increment is built by repeated discrete
//! convolution of the single-die uniform distribution, and the race is then
//! settled by enumerating every (player, house) pair of future sums. No
//! sampling is involved: the numbers are the exact ground truth a perfectly
//! calibrated participant would report.
//!
//! Ties are losses for the player. There is no push category, so `win` and
//! `loss` are exhaustive and sum to one.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

/// Tolerance used when checking that `win + loss == 1`.
pub const PROBABILITY_TOLERANCE: f64 = 1e-9;

/// Probability of winning and losing the race from the player's side.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WinLoss {
    pub win: f64,
    pub loss: f64,
}

impl WinLoss {
    pub const CERTAIN_WIN: WinLoss = WinLoss {
        win: 1.0,
        loss: 0.0,
    };
    pub const CERTAIN_LOSS: WinLoss = WinLoss {
        win: 0.0,
        loss: 1.0,
    };

    /// Shannon entropy of this two-outcome distribution, in bits.
    pub fn entropy(&self) -> f64 {
        entropy(self.win, self.loss)
    }

    pub fn total(&self) -> f64 {
        self.win + self.loss
    }

    pub fn is_normalized(&self) -> bool {
        (self.total() - 1.0).abs() < PROBABILITY_TOLERANCE
    }
}

/// Distribution of the sum of some number of fair dice.
///
/// Entry `i` of [`SumDistribution::probabilities`] is the probability that the
/// sum equals `min_sum + i`.
#[derive(Debug, Clone, PartialEq)]
pub struct SumDistribution {
    min_sum: u32,
    probabilities: Vec<f64>,
}

impl SumDistribution {
    /// Distribution of "no further dice": the increment is 0 with certainty.
    fn degenerate() -> Self {
        Self {
            min_sum: 0,
            probabilities: vec![1.0],
        }
    }

    pub fn min_sum(&self) -> u32 {
        self.min_sum
    }

    pub fn max_sum(&self) -> u32 {
        self.min_sum + self.probabilities.len() as u32 - 1
    }

    /// Number of distinct sums with non-zero probability.
    pub fn support_len(&self) -> usize {
        self.probabilities.len()
    }

    pub fn probabilities(&self) -> &[f64] {
        &self.probabilities
    }

    /// Probability of an exact sum; 0 outside the support.
    pub fn probability_of(&self, sum: u32) -> f64 {
        sum.checked_sub(self.min_sum)
            .and_then(|offset| self.probabilities.get(offset as usize))
            .copied()
            .unwrap_or(0.0)
    }

    /// Iterate `(sum, probability)` pairs in increasing order of sum.
    pub fn iter(&self) -> impl Iterator<Item = (u32, f64)> + '_ {
        self.probabilities
            .iter()
            .enumerate()
            .map(|(offset, &p)| (self.min_sum + offset as u32, p))
    }
}

/// Full discrete convolution of two probability vectors.
///
/// Returns an empty vector when either input is empty.
pub fn convolve(a: &[f64], b: &[f64]) -> Vec<f64> {
    if a.is_empty() || b.is_empty() {
        return Vec::new();
    }
    let mut result = vec![0.0; a.len() + b.len() - 1];
    for (i, &pa) in a.iter().enumerate() {
        for (j, &pb) in b.iter().enumerate() {
            result[i + j] += pa * pb;
        }
    }
    result
}

/// Distribution of the sum of `remaining_stages` fair dice with `sides` faces.
///
/// With no stages left (or a die without faces) the increment is 0 with
/// probability one.
pub fn outcome_distribution(remaining_stages: u32, sides: u32) -> SumDistribution {
    if remaining_stages == 0 || sides == 0 {
        return SumDistribution::degenerate();
    }

    let die = vec![1.0 / f64::from(sides); sides as usize];
    let mut probabilities = die.clone();
    for _ in 1..remaining_stages {
        probabilities = convolve(&probabilities, &die);
    }

    SumDistribution {
        min_sum: remaining_stages,
        probabilities,
    }
}

/// Probability mass of the three orderings of the final sums.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct RaceMasses {
    ahead: f64,
    tied: f64,
    behind: f64,
}

fn race_masses(
    player_current: i64,
    house_current: i64,
    remaining_stages: u32,
    sides: u32,
) -> RaceMasses {
    // Both sides roll the same dice, so one distribution serves both.
    let future = outcome_distribution(remaining_stages, sides);
    let mut masses = RaceMasses::default();

    for (player_added, player_prob) in future.iter() {
        let player_final = player_current + i64::from(player_added);
        for (house_added, house_prob) in future.iter() {
            let house_final = house_current + i64::from(house_added);
            let joint = player_prob * house_prob;
            match player_final.cmp(&house_final) {
                Ordering::Greater => masses.ahead += joint,
                Ordering::Equal => masses.tied += joint,
                Ordering::Less => masses.behind += joint,
            }
        }
    }

    masses
}

/// Exact probability that the player finishes strictly ahead of the house.
///
/// # Examples
///
/// ```
/// use wagerlab::probability::win_loss_probabilities;
///
/// // One die each from level: 15 of 36 outcomes are strict player wins.
/// let p = win_loss_probabilities(0, 0, 1, 6);
/// assert!((p.win - 15.0 / 36.0).abs() < 1e-12);
/// assert!((p.win + p.loss - 1.0).abs() < 1e-12);
/// ```
pub fn win_loss_probabilities(
    player_current: i64,
    house_current: i64,
    remaining_stages: u32,
    sides: u32,
) -> WinLoss {
    if remaining_stages == 0 {
        return if player_current > house_current {
            WinLoss::CERTAIN_WIN
        } else {
            WinLoss::CERTAIN_LOSS
        };
    }

    // Summed masses can overshoot 1 by a few ulps on decided boards.
    let masses = race_masses(player_current, house_current, remaining_stages, sides);
    WinLoss {
        win: masses.ahead.clamp(0.0, 1.0),
        loss: (masses.tied + masses.behind).clamp(0.0, 1.0),
    }
}

/// Exact probability that the race ends level.
///
/// Ties are folded into `loss` by [`win_loss_probabilities`]; this exposes
/// the size of that fold, which is what breaks the naive player/house
/// symmetry.
pub fn tie_probability(
    player_current: i64,
    house_current: i64,
    remaining_stages: u32,
    sides: u32,
) -> f64 {
    if remaining_stages == 0 {
        return if player_current == house_current {
            1.0
        } else {
            0.0
        };
    }
    race_masses(player_current, house_current, remaining_stages, sides)
        .tied
        .clamp(0.0, 1.0)
}

/// Two-outcome Shannon entropy in bits. Zero-probability terms contribute 0.
///
/// Inputs are clamped to `[0, 1]` and the result is never negative (nor
/// `-0.0`), so a certain outcome always reports exactly `0`.
pub fn entropy(win: f64, loss: f64) -> f64 {
    let bits: f64 = [win, loss]
        .into_iter()
        .map(|p| p.clamp(0.0, 1.0))
        .filter(|&p| p > 0.0)
        .map(|p| -p * p.log2())
        .sum();
    bits.max(0.0) + 0.0
}

/// Ground truth frozen at a belief-elicitation point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GroundTruth {
    /// Stages still to be rolled, including the one about to be rolled.
    pub remaining_stages: u32,
    pub probabilities: WinLoss,
    pub entropy: f64,
}

impl GroundTruth {
    /// Evaluate the engine for the given race position.
    pub fn evaluate(
        player_current: i64,
        house_current: i64,
        remaining_stages: u32,
        sides: u32,
    ) -> Self {
        let probabilities =
            win_loss_probabilities(player_current, house_current, remaining_stages, sides);
        debug_assert!(
            probabilities.is_normalized(),
            "win + loss must sum to one, got {}",
            probabilities.total()
        );
        Self {
            remaining_stages,
            probabilities,
            entropy: probabilities.entropy(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < PROBABILITY_TOLERANCE,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn convolution_of_two_dice_is_triangular() {
        let die = vec![1.0 / 6.0; 6];
        let two = convolve(&die, &die);
        assert_eq!(two.len(), 11);
        assert_close(two[0], 1.0 / 36.0);
        assert_close(two[5], 6.0 / 36.0);
        assert_close(two[10], 1.0 / 36.0);
        assert_close(two.iter().sum(), 1.0);
    }

    #[test]
    fn certain_outcomes_have_positive_zero_entropy() {
        for (win, loss) in [(1.0, 0.0), (0.0, 1.0), (1.0 + 1e-15, 0.0)] {
            let h = entropy(win, loss);
            assert_eq!(h, 0.0);
            assert!(h.is_sign_positive(), "entropy({win}, {loss}) = {h}");
            assert_eq!(h.to_string(), "0");
        }
    }

    #[test]
    fn decided_boards_stay_in_range() {
        for (p, h, remaining) in [(40, 0, 5), (20, 5, 1), (0, 40, 5), (5, 20, 1)] {
            let probs = win_loss_probabilities(p, h, remaining, 6);
            assert!((0.0..=1.0).contains(&probs.win), "win {}", probs.win);
            assert!((0.0..=1.0).contains(&probs.loss), "loss {}", probs.loss);
            let h = probs.entropy();
            assert!(h >= 0.0 && h.is_sign_positive(), "entropy {h}");
        }
    }

    #[test]
    fn convolve_with_empty_is_empty() {
        assert!(convolve(&[], &[0.5, 0.5]).is_empty());
    }

    #[test]
    fn distribution_is_indexed_from_minimum_sum() {
        let dist = outcome_distribution(3, 6);
        assert_eq!(dist.min_sum(), 3);
        assert_eq!(dist.max_sum(), 18);
        assert_eq!(dist.support_len(), 6 * 3 - 3 + 1);
        assert_close(dist.probability_of(3), 1.0 / 216.0);
        assert_close(dist.probability_of(10), 27.0 / 216.0);
        assert_eq!(dist.probability_of(2), 0.0);
        assert_eq!(dist.probability_of(19), 0.0);
        assert_close(dist.iter().map(|(_, p)| p).sum(), 1.0);
    }

    #[test]
    fn zero_stages_distribution_is_degenerate() {
        let dist = outcome_distribution(0, 6);
        assert_eq!(dist.iter().collect::<Vec<_>>(), vec![(0, 1.0)]);
    }

    #[test]
    fn base_case_is_exact_and_ties_lose() {
        assert_eq!(win_loss_probabilities(9, 8, 0, 6), WinLoss::CERTAIN_WIN);
        assert_eq!(win_loss_probabilities(8, 8, 0, 6), WinLoss::CERTAIN_LOSS);
        assert_eq!(win_loss_probabilities(3, 8, 0, 6), WinLoss::CERTAIN_LOSS);
    }

    #[test]
    fn reference_positions_match_hand_counts() {
        // Fresh three-stage race.
        let start = win_loss_probabilities(0, 0, 3, 6);
        let tie = tie_probability(0, 0, 3, 6);
        assert_close(start.win, (1.0 - tie) / 2.0);
        assert_close(start.loss, (1.0 + tie) / 2.0);

        // Player five ahead with one die left: only (1, 6) loses.
        let ahead = win_loss_probabilities(10, 5, 1, 6);
        assert_close(ahead.win, 35.0 / 36.0);
        assert_close(ahead.loss, 1.0 / 36.0);

        // Player five behind with one die left: cannot overtake.
        let behind = win_loss_probabilities(5, 10, 1, 6);
        assert_close(behind.win, 0.0);
        assert_close(behind.loss, 1.0);

        // Level with two dice left: P(tie) = 146/1296.
        let level = win_loss_probabilities(7, 7, 2, 6);
        assert_close(tie_probability(7, 7, 2, 6), 146.0 / 1296.0);
        assert_close(level.win, 575.0 / 1296.0);
        assert_close(level.loss, 721.0 / 1296.0);
    }

    #[test]
    fn entropy_extremes() {
        assert_close(entropy(0.5, 0.5), 1.0);
        assert_eq!(entropy(1.0, 0.0), 0.0);
        assert_eq!(entropy(0.0, 1.0), 0.0);
        assert!(entropy(0.9, 0.1) < 1.0);
    }

    #[test]
    fn ground_truth_freezes_entropy_with_probabilities() {
        let truth = GroundTruth::evaluate(0, 0, 1, 6);
        assert_eq!(truth.remaining_stages, 1);
        assert_close(truth.entropy, entropy(15.0 / 36.0, 21.0 / 36.0));
    }
}
