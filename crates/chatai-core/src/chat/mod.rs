//! Question/answer flow over history and the answer service

mod session;

pub use session::{ChatSession, SubmitOutcome, FAILURE_MESSAGE, LOADING_MESSAGE};
