//! Answer request flow
//!
//! Ties the answer service to the history store: a submitted question shows a
//! placeholder, asks the service, and records the answer either as a new
//! entry or in place of the entry being edited.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, info, warn};

use crate::history::{HistoryStore, Interaction};
use crate::llm::AnswerService;
use crate::{Error, Result};

/// Shown while a request is in flight
pub const LOADING_MESSAGE: &str = "Loading your answer... \n It might take up to 10 seconds";

/// Shown in place of the answer when the service fails
pub const FAILURE_MESSAGE: &str = "Sorry - Something went wrong. Please try again!";

/// What a finished submit produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The service answered and the answer was recorded at `index`
    Answered {
        answer: String,
        index: usize,
        /// `true` when an existing entry was replaced
        replaced: bool,
    },
    /// The service failed; history was not touched
    Failed { message: String },
}

#[derive(Debug, Default)]
struct ChatState {
    draft: String,
    answer: String,
    edit_index: Option<usize>,
    /// Edit target removed by a delete or clear since the edit began
    removed_target: Option<usize>,
}

/// Clears the busy flag when the request finishes, however it finishes
struct BusyGuard<'a>(&'a AtomicBool);

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// One chat surface over a history store and an answer service.
///
/// Only one request may be in flight; a second `submit` while busy is
/// rejected with [`Error::Busy`] rather than queued.
pub struct ChatSession {
    store: Mutex<HistoryStore>,
    service: Arc<dyn AnswerService>,
    state: Mutex<ChatState>,
    busy: AtomicBool,
}

impl ChatSession {
    pub fn new(store: HistoryStore, service: Arc<dyn AnswerService>) -> Self {
        Self {
            store: Mutex::new(store),
            service,
            state: Mutex::new(ChatState::default()),
            busy: AtomicBool::new(false),
        }
    }

    fn store(&self) -> MutexGuard<'_, HistoryStore> {
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn state(&self) -> MutexGuard<'_, ChatState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Ask the service and record the answer.
    ///
    /// Service failures are not errors here: they become
    /// [`SubmitOutcome::Failed`] with the fixed fallback message displayed.
    /// Errors are returned for an empty question, a busy session, a stale
    /// edit target, or a storage failure while recording.
    pub async fn submit(&self, question: &str) -> Result<SubmitOutcome> {
        if question.trim().is_empty() {
            return Err(Error::EmptyQuestion);
        }
        if self
            .busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!("Rejecting submit while a request is in flight");
            return Err(Error::Busy);
        }
        let _guard = BusyGuard(&self.busy);

        let editing = {
            let mut state = self.state();
            state.draft = question.to_string();
            state.answer = LOADING_MESSAGE.to_string();
            state.removed_target = None;
            state.edit_index.is_some()
        };

        let answer = match self.service.answer(question).await {
            Ok(answer) => answer,
            Err(e) => {
                if e.is_service_failure() {
                    warn!("Answer service failed: {}", e);
                } else {
                    warn!("Answer service returned an unexpected error: {}", e);
                }
                self.state().answer = FAILURE_MESSAGE.to_string();
                return Ok(SubmitOutcome::Failed {
                    message: FAILURE_MESSAGE.to_string(),
                });
            }
        };

        // deletes made while the request ran may have moved or removed the target
        let (edit_index, removed_target) = {
            let mut state = self.state();
            state.answer = answer.clone();
            if editing {
                (state.edit_index.take(), state.removed_target.take())
            } else {
                (None, None)
            }
        };

        if let Some(index) = removed_target.filter(|_| edit_index.is_none()) {
            let len = self.store().len();
            warn!("Edit target {} was removed while answering; answer not saved", index);
            return Err(Error::OutOfRange { index, len });
        }

        match edit_index {
            Some(index) => {
                self.store().replace_at(index, question, answer.as_str())?;
                info!("Replaced history entry {}", index);
                Ok(SubmitOutcome::Answered {
                    answer,
                    index,
                    replaced: true,
                })
            }
            None => {
                let index = self.store().append(question, answer.as_str())?.len() - 1;
                info!("Appended history entry {}", index);
                Ok(SubmitOutcome::Answered {
                    answer,
                    index,
                    replaced: false,
                })
            }
        }
    }

    /// Load the entry at `index` into the draft and mark it as the edit target
    pub fn begin_edit(&self, index: usize) -> Result<Interaction> {
        let item = {
            let store = self.store();
            store.get(index).cloned().ok_or(Error::OutOfRange {
                index,
                len: store.len(),
            })?
        };

        let mut state = self.state();
        state.draft = item.question.clone();
        state.answer = item.answer.clone();
        state.edit_index = Some(index);
        state.removed_target = None;
        Ok(item)
    }

    /// Drop the edit target; the next submit appends
    pub fn cancel_edit(&self) {
        let mut state = self.state();
        state.edit_index = None;
        state.removed_target = None;
    }

    /// Clear the draft question and the displayed answer
    pub fn clear_draft(&self) {
        let mut state = self.state();
        state.draft.clear();
        state.answer.clear();
    }

    /// Remove a history entry, keeping the edit target pointing at the same entry
    pub fn delete_history_item(&self, index: usize) -> Result<Vec<Interaction>> {
        let records = self.store().delete_at(index)?.to_vec();

        let mut state = self.state();
        match state.edit_index {
            Some(i) if i == index => {
                state.edit_index = None;
                state.removed_target = Some(index);
            }
            Some(i) if i > index => state.edit_index = Some(i - 1),
            _ => {}
        }
        Ok(records)
    }

    /// Remove all history, including the persisted key
    pub fn clear_history(&self) -> Result<()> {
        self.store().clear()?;
        let mut state = self.state();
        if let Some(index) = state.edit_index.take() {
            state.removed_target = Some(index);
        }
        Ok(())
    }

    pub fn history(&self) -> Vec<Interaction> {
        self.store().records().to_vec()
    }

    pub fn history_len(&self) -> usize {
        self.store().len()
    }

    /// The displayed answer: empty, the placeholder, an answer, or the failure message
    pub fn answer(&self) -> String {
        self.state().answer.clone()
    }

    pub fn draft(&self) -> String {
        self.state().draft.clone()
    }

    pub fn edit_index(&self) -> Option<usize> {
        self.state().edit_index
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Label for the submit action
    pub fn submit_label(&self) -> &'static str {
        if self.edit_index().is_some() {
            "Update Answer"
        } else {
            "Generate Answer"
        }
    }

    /// Give the history store back
    pub fn into_store(self) -> HistoryStore {
        self.store.into_inner().unwrap_or_else(PoisonError::into_inner)
    }
}
