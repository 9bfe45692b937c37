//! Dependency injection container for experiment sessions.
//!
//! The container owns the recorder shared by every session it creates and
//! decides which dice each session gets.

use std::sync::Arc;

use rand::{SeedableRng, rngs::StdRng};

use super::config::ExperimentConfig;
use crate::{
    Result,
    adapters::{InMemoryRecorder, SeededDice},
    identifiers::ParticipantId,
    ports::{DiceRoller, Recorder},
    session::TrialSession,
};

/// Application with dependency injection.
///
/// # Examples
///
/// ## Production usage
///
/// ```
/// use wagerlab::app::{App, ExperimentConfig};
///
/// let app = App::new();
/// let session = app.create_session(ExperimentConfig::default().with_seed(42))?;
/// assert_eq!(session.wealth(), 500);
/// # Ok::<(), wagerlab::Error>(())
/// ```
///
/// ## Testing with dependency injection
///
/// ```
/// use wagerlab::app::App;
/// use wagerlab::adapters::InMemoryRecorder;
///
/// let recorder = InMemoryRecorder::new();
/// let app = App::for_testing()
///     .with_recorder(recorder.clone())
///     .with_default_seed(42)
///     .build();
/// ```
pub struct App {
    /// Recorder shared by all sessions created by this app
    recorder: Arc<dyn Recorder>,
    /// Default random seed (None = non-deterministic)
    default_seed: Option<u64>,
}

impl App {
    /// Create a new app with an in-memory recorder and no default seed.
    pub fn new() -> Self {
        Self {
            recorder: Arc::new(InMemoryRecorder::new()),
            default_seed: None,
        }
    }

    /// Create a builder for constructing an app with custom dependencies.
    pub fn for_testing() -> AppBuilder {
        AppBuilder::new()
    }

    /// Get the recorder.
    pub fn recorder(&self) -> Arc<dyn Recorder> {
        Arc::clone(&self.recorder)
    }

    /// Create a session with seeded dice.
    ///
    /// The seed comes from the config, falling back to the app default. With
    /// a seed, a missing participant id is derived from it as well, so a
    /// seeded session is fully reproducible.
    pub fn create_session(&self, config: ExperimentConfig) -> Result<TrialSession> {
        let seed = config.seed.or(self.default_seed);
        self.create_session_with_dice(config, Box::new(SeededDice::new(seed)))
    }

    /// Create a session with caller-supplied dice.
    pub fn create_session_with_dice(
        &self,
        mut config: ExperimentConfig,
        dice: Box<dyn DiceRoller>,
    ) -> Result<TrialSession> {
        let seed = config.seed.or(self.default_seed);
        if config.participant_id.is_none()
            && let Some(seed) = seed
        {
            // Offset so the tag stream differs from the dice stream.
            let mut rng = StdRng::seed_from_u64(seed.wrapping_add(0x5eed));
            config.participant_id = Some(ParticipantId::generate(&mut rng));
        }
        config.seed = seed;

        TrialSession::new(config, self.recorder(), dice)
    }
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for constructing an app with custom dependencies.
pub struct AppBuilder {
    recorder: Option<Arc<dyn Recorder>>,
    default_seed: Option<u64>,
}

impl AppBuilder {
    /// Create a new app builder.
    pub fn new() -> Self {
        Self {
            recorder: None,
            default_seed: None,
        }
    }

    /// Set a custom recorder.
    pub fn with_recorder<R: Recorder + 'static>(mut self, recorder: R) -> Self {
        self.recorder = Some(Arc::new(recorder));
        self
    }

    /// Use a recorder the caller keeps a handle to.
    pub fn with_shared_recorder(mut self, recorder: Arc<dyn Recorder>) -> Self {
        self.recorder = Some(recorder);
        self
    }

    /// Set a default random seed for every session created by the app.
    pub fn with_default_seed(mut self, seed: u64) -> Self {
        self.default_seed = Some(seed);
        self
    }

    /// Build the app. Without a recorder, an `InMemoryRecorder` is used.
    pub fn build(self) -> App {
        App {
            recorder: self
                .recorder
                .unwrap_or_else(|| Arc::new(InMemoryRecorder::new())),
            default_seed: self.default_seed,
        }
    }
}

impl Default for AppBuilder {
    fn default() -> Self {
        Self::new()
    }
}
