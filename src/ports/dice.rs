//! Dice port: the only source of randomness in a trial.

/// Supplies die faces to the session.
///
/// Each stage asks for two faces, player first and house second.
pub trait DiceRoller: Send {
    /// Roll one die with faces `1..=sides`.
    fn roll(&mut self, sides: u32) -> u32;
}
