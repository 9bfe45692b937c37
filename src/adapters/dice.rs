//! Dice adapters: seeded random dice and scripted faces for tests and demos.

use rand::{Rng, SeedableRng, rngs::StdRng};

use crate::{Error, Result, ports::DiceRoller};

/// Fair dice backed by a `StdRng`.
#[derive(Debug, Clone)]
pub struct SeededDice {
    rng: StdRng,
}

impl SeededDice {
    /// Seeded dice are reproducible; `None` draws a seed from the OS.
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self { rng }
    }
}

impl DiceRoller for SeededDice {
    fn roll(&mut self, sides: u32) -> u32 {
        self.rng.random_range(1..=sides.max(1))
    }
}

/// Dice that replay a fixed sequence of faces, cycling when exhausted.
///
/// Faces are consumed in call order, which for a session is player, house,
/// player, house, ...
#[derive(Debug, Clone)]
pub struct ScriptedDice {
    faces: Vec<u32>,
    cursor: usize,
}

impl ScriptedDice {
    /// # Errors
    ///
    /// Returns [`Error::EmptyDiceScript`] for an empty script and
    /// [`Error::InvalidDieFace`] for a face of 0.
    pub fn new(faces: Vec<u32>) -> Result<Self> {
        if faces.is_empty() {
            return Err(Error::EmptyDiceScript);
        }
        if let Some(&face) = faces.iter().find(|&&face| face == 0) {
            return Err(Error::InvalidDieFace { face });
        }
        Ok(Self { faces, cursor: 0 })
    }

    /// Interleave per-party roll sequences into call order.
    ///
    /// The shorter sequence bounds the number of stages scripted.
    pub fn from_rolls(player: &[u32], house: &[u32]) -> Result<Self> {
        let faces = player
            .iter()
            .zip(house)
            .flat_map(|(&p, &h)| [p, h])
            .collect();
        Self::new(faces)
    }

    /// Faces handed out so far.
    pub fn rolls_made(&self) -> usize {
        self.cursor
    }
}

impl DiceRoller for ScriptedDice {
    fn roll(&mut self, sides: u32) -> u32 {
        let face = self.faces[self.cursor % self.faces.len()];
        self.cursor += 1;
        face.clamp(1, sides.max(1))
    }
}
