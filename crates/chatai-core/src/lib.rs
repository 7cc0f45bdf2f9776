//! chatai-core: question/answer core library
//!
//! Asks a generative-language service one question at a time and keeps a
//! persisted, editable history of question/answer pairs.

pub mod chat;
pub mod config;
pub mod error;
pub mod history;
pub mod llm;
pub mod storage;

pub use chat::{ChatSession, SubmitOutcome, FAILURE_MESSAGE, LOADING_MESSAGE};
pub use config::{Config, LlmConfig, StorageBackend, StorageConfig};
pub use error::{Error, Result};
pub use history::{HistoryStore, Interaction, HISTORY_KEY};
pub use llm::{AnswerService, GeminiClient};
pub use storage::{open_backend, FileKvStore, KeyValueStore, MemoryKvStore, SqliteKvStore};
