//! Feedback pipeline: validate → classify → compose → dispatch → log.

pub mod composer;
pub mod dispatcher;
pub mod model;
pub mod rating;
pub mod store;
pub mod validation;

pub use dispatcher::{NotificationDispatcher, Sleeper, TokioSleeper};
pub use model::{
    Category, DispatchOutcome, FeedbackPayload, FeedbackRecord, IncomingMessage, SurveyRequest,
};
pub use store::FeedbackStore;
