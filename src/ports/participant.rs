//! Participant port - automated decision makers
//!
//! Real participants answer through a presentation layer. For piloting and
//! for tests the same input surface is driven by implementations of this
//! trait.

use crate::{session::SessionView, types::Action};

/// Something that can answer every prompt a session puts up.
pub trait Participant: Send {
    /// Display name used in logs and summaries
    fn name(&self) -> &str;

    /// Answer questionnaire item `item` (0-based). Values above 3 are clamped
    /// by the session.
    fn answer_item(&mut self, _item: usize, _question: &str) -> u8 {
        0
    }

    /// Choose a bet adjustment for the current stage.
    fn choose_action(&mut self, view: &SessionView) -> Action;

    /// Report a win probability as a percentage in `0..=100`.
    fn report_belief(&mut self, view: &SessionView) -> f64;

    /// Reseed any internal randomness.
    fn set_rng_seed(&mut self, _seed: u64) {}
}
