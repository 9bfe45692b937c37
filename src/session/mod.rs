//! The trial state machine and the records it produces.

mod machine;
pub mod phase;
pub mod questionnaire;
pub mod trial;
mod view;

pub use machine::TrialSession;
pub use phase::{Continuation, EndReason, Phase, Transition};
pub use questionnaire::QuestionnaireAnswers;
pub use trial::{StageRoll, StageSnapshot, Trial, TrialRecord};
pub use view::{SessionView, TrialResult};
