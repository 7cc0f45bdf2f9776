//! Interaction history
//!
//! Ordered question/answer log, written through to a key-value surface on
//! every mutation.

mod store;
mod types;

pub use store::{HISTORY_KEY, HistoryStore};
pub use types::Interaction;
