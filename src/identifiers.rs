//! Participant identifiers.
//!
//! Every exported row carries the participant tag, so it is a dedicated type
//! rather than a loose `String`.

use std::{borrow::Borrow, fmt};

use rand::{Rng, distr::Alphanumeric};
use serde::{Deserialize, Serialize};

/// Number of random characters after the `P-` prefix.
const GENERATED_TAG_LEN: usize = 9;

/// Identifier for the participant running a session.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParticipantId(String);

impl ParticipantId {
    /// Create a participant identifier from an existing tag.
    ///
    /// # Examples
    ///
    /// ```
    /// use wagerlab::identifiers::ParticipantId;
    ///
    /// let id = ParticipantId::new("P-LAB042");
    /// assert_eq!(id.as_str(), "P-LAB042");
    /// ```
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Generate a random tag of the form `P-XXXXXXXXX` (upper-case alphanumeric).
    pub fn generate<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let tag: String = rng
            .sample_iter(&Alphanumeric)
            .take(GENERATED_TAG_LEN)
            .map(|b| char::from(b).to_ascii_uppercase())
            .collect();
        Self(format!("P-{tag}"))
    }

    /// Get the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Convert the identifier into its inner String.
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl PartialEq<&str> for ParticipantId {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == *other
    }
}

impl Borrow<str> for ParticipantId {
    fn borrow(&self) -> &str {
        self.as_str()
    }
}

impl From<String> for ParticipantId {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for ParticipantId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl AsRef<str> for ParticipantId {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

#[cfg(test)]
mod tests {
    use rand::{SeedableRng, rngs::StdRng};

    use super::*;

    #[test]
    fn generated_ids_have_prefix_and_uppercase_tag() {
        let mut rng = StdRng::seed_from_u64(7);
        let id = ParticipantId::generate(&mut rng);
        let tag = id.as_str().strip_prefix("P-").unwrap();
        assert_eq!(tag.len(), GENERATED_TAG_LEN);
        assert!(
            tag.chars()
                .all(|c| c.is_ascii_digit() || c.is_ascii_uppercase())
        );
    }

    #[test]
    fn generation_is_deterministic_for_a_seed() {
        let a = ParticipantId::generate(&mut StdRng::seed_from_u64(11));
        let b = ParticipantId::generate(&mut StdRng::seed_from_u64(11));
        assert_eq!(a, b);
    }
}
