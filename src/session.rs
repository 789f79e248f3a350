//! Session state
//!
//! Everything scoped to one interactive session: login flag, pending input,
//! transcript, feedback, rating and display settings.

mod controller;
mod emoji;
mod transcript;
mod types;

#[cfg(test)]
mod proptests;

pub use controller::{PipelinePermit, SessionController};
pub use emoji::expand_shortcodes;
pub(crate) use transcript::serialize_timestamp;
pub use transcript::{Message, Role, TIMESTAMP_FORMAT};
pub use types::{
    AuthError, Credentials, FeedbackEntry, SessionSnapshot, Theme, ValidationError, GREETING,
    QUICK_PROMPTS,
};
