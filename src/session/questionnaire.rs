//! Problem Gambling Severity Index items asked before the first trial.

use serde::{Deserialize, Serialize};

/// Highest score a single item can take ("almost always").
pub const MAX_ITEM_SCORE: u8 = 3;

/// Fixed questionnaire items, asked in order.
pub const ITEMS: [&str; 9] = [
    "Have you bet more than you could really afford to lose?",
    "Have you needed to gamble with larger amounts to get the same feeling of excitement?",
    "When you gambled, did you go back another day to try to win back the money you lost?",
    "Have you borrowed money or sold anything to get money to gamble?",
    "Have you felt you might have a problem with gambling?",
    "Has gambling caused you any health problems, including stress or anxiety?",
    "Have people criticised your betting or told you that you had a gambling problem, regardless of whether or not you thought it was true?",
    "Has your gambling caused any financial problems for you or your household?",
    "Have you felt guilty about the way you gamble or what happens when you gamble?",
];

/// Labels for the four answer levels.
pub const ANSWER_LABELS: [&str; 4] = ["Never", "Sometimes", "Most of the time", "Almost always"];

/// Answers collected so far, with the running total.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionnaireAnswers {
    answers: Vec<u8>,
    total: u32,
}

impl QuestionnaireAnswers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the next answer, clamped to `0..=3`. Returns the stored value.
    pub fn record(&mut self, value: u8) -> u8 {
        let value = value.min(MAX_ITEM_SCORE);
        self.answers.push(value);
        self.total += u32::from(value);
        value
    }

    pub fn answers(&self) -> &[u8] {
        &self.answers
    }

    pub fn total(&self) -> u32 {
        self.total
    }

    /// Index of the next unanswered item.
    pub fn next_item(&self) -> usize {
        self.answers.len()
    }

    /// Text of the next unanswered item, if any remain.
    pub fn next_question(&self) -> Option<&'static str> {
        ITEMS.get(self.next_item()).copied()
    }

    pub fn is_complete(&self) -> bool {
        self.answers.len() >= ITEMS.len()
    }

    pub fn clear(&mut self) {
        self.answers.clear();
        self.total = 0;
    }
}
