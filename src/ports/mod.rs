//! Ports (trait boundaries) for external collaborators.
//!
//! These traits are owned by the session and implemented by adapters, so the
//! state machine never depends on storage, randomness sources or output
//! formats directly.

pub mod dice;
pub mod observer;
pub mod participant;
pub mod recorder;

pub use dice::DiceRoller;
pub use observer::SessionObserver;
pub use participant::Participant;
pub use recorder::Recorder;
