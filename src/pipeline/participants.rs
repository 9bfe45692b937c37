//! Automated participants for piloting the task

use rand::{Rng, SeedableRng, rngs::StdRng};

use crate::{
    ports::Participant,
    probability::win_loss_probabilities,
    session::SessionView,
    types::Action,
};

/// Exact win probability for the board on screen.
fn exact_win_probability(view: &SessionView) -> f64 {
    win_loss_probabilities(
        view.player_sum,
        view.house_sum,
        view.remaining_stages(),
        view.dice_sides,
    )
    .win
}

/// Bets with the odds: adds when ahead of `threshold`, retracts when behind.
fn action_for(win: f64, threshold: f64) -> Action {
    if win > threshold {
        Action::Add
    } else if win < 1.0 - threshold {
        Action::Retract
    } else {
        Action::Hold
    }
}

/// Reports the exact ground truth and bets with it.
///
/// Every belief it reports scores the best Brier score available in
/// expectation, which makes it the reference point for accuracy payments.
#[derive(Debug, Clone)]
pub struct OracleParticipant {
    threshold: f64,
}

impl OracleParticipant {
    pub fn new() -> Self {
        Self { threshold: 0.5 }
    }

    /// Only add when the win probability exceeds `threshold`, only retract
    /// when it is below `1 - threshold`.
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold.clamp(0.5, 1.0);
        self
    }
}

impl Default for OracleParticipant {
    fn default() -> Self {
        Self::new()
    }
}

impl Participant for OracleParticipant {
    fn name(&self) -> &str {
        "oracle"
    }

    fn choose_action(&mut self, view: &SessionView) -> Action {
        action_for(exact_win_probability(view), self.threshold)
    }

    fn report_belief(&mut self, view: &SessionView) -> f64 {
        exact_win_probability(view) * 100.0
    }
}

/// Always takes the same action and reports the same belief.
#[derive(Debug, Clone)]
pub struct ConstantParticipant {
    action: Action,
    belief_percent: f64,
    questionnaire_answer: u8,
}

impl ConstantParticipant {
    pub fn new(action: Action, belief_percent: f64) -> Self {
        Self {
            action,
            belief_percent,
            questionnaire_answer: 0,
        }
    }

    pub fn with_questionnaire_answer(mut self, answer: u8) -> Self {
        self.questionnaire_answer = answer;
        self
    }
}

impl Participant for ConstantParticipant {
    fn name(&self) -> &str {
        "constant"
    }

    fn answer_item(&mut self, _item: usize, _question: &str) -> u8 {
        self.questionnaire_answer
    }

    fn choose_action(&mut self, _view: &SessionView) -> Action {
        self.action
    }

    fn report_belief(&mut self, _view: &SessionView) -> f64 {
        self.belief_percent
    }
}

/// Oracle beliefs perturbed by uniform noise, with random exploration of
/// actions.
pub struct NoisyParticipant {
    /// Half-width of the belief noise, in percentage points
    noise: f64,
    /// Probability of picking a uniformly random action
    exploration: f64,
    rng: StdRng,
}

impl NoisyParticipant {
    pub fn new(noise: f64, exploration: f64, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_os_rng(),
        };
        Self {
            noise: noise.abs(),
            exploration: exploration.clamp(0.0, 1.0),
            rng,
        }
    }
}

impl Participant for NoisyParticipant {
    fn name(&self) -> &str {
        "noisy"
    }

    fn answer_item(&mut self, _item: usize, _question: &str) -> u8 {
        self.rng.random_range(0..=3)
    }

    fn choose_action(&mut self, view: &SessionView) -> Action {
        if self.rng.random_bool(self.exploration) {
            Action::ALL[self.rng.random_range(0..Action::ALL.len())]
        } else {
            action_for(exact_win_probability(view), 0.5)
        }
    }

    fn report_belief(&mut self, view: &SessionView) -> f64 {
        let exact = exact_win_probability(view) * 100.0;
        if self.noise == 0.0 {
            return exact;
        }
        // Out-of-range reports are left for the session to clamp.
        exact + self.rng.random_range(-self.noise..=self.noise)
    }

    fn set_rng_seed(&mut self, seed: u64) {
        self.rng = StdRng::seed_from_u64(seed);
    }
}
