use thiserror::Error;

use crate::storage::{new_essay_id, EssayRecord, EssayStore};

/// Body length at which the one-shot warning fires (roughly 30 lines).
pub const BODY_WARN_CHARS: usize = 2000;

pub const BODY_WARN_NOTICE: &str =
    "Heads up: the essay reached 2000 characters (about 30 lines).";

#[derive(Debug, Error)]
pub enum DraftError {
    /// Trimmed title or body is empty; nothing was written.
    #[error("the essay cannot be empty")]
    EmptyEssay,
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    Created(EssayRecord),
    Updated(EssayRecord),
}

impl SaveOutcome {
    pub fn record(&self) -> &EssayRecord {
        match self {
            SaveOutcome::Created(record) | SaveOutcome::Updated(record) => record,
        }
    }
}

/// Length-warning state machine: `Quiet` below the threshold, `Warned` once
/// the crossing has been announced. Dropping back below re-arms it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WarnState {
    Quiet,
    Warned,
}

/// Transient title/body text for the new and edit flows. Validates before
/// delegating to the store, so an empty essay never reaches storage.
#[derive(Debug, Clone)]
pub struct EssayDraft {
    title: String,
    body: String,
    editing: Option<String>,
    warn_state: WarnState,
}

impl EssayDraft {
    pub fn new() -> Self {
        Self {
            title: String::new(),
            body: String::new(),
            editing: None,
            warn_state: WarnState::Quiet,
        }
    }

    /// Edit flow: state starts from the stored record instead of empty.
    pub fn for_record(record: &EssayRecord) -> Self {
        let mut draft = Self::new();
        draft.title = record.title.clone();
        draft.body = record.body.clone();
        draft.editing = Some(record.id.clone());
        draft.sync_warn_state();
        draft
    }

    /// Pre-populates a new draft, e.g. from a remote essay model.
    pub fn with_template(title: &str, body: &str) -> Self {
        let mut draft = Self::new();
        draft.title = title.to_string();
        draft.body = body.to_string();
        draft.sync_warn_state();
        draft
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn is_editing(&self) -> bool {
        self.editing.is_some()
    }

    pub fn set_title(&mut self, title: &str) {
        self.title = title.to_string();
    }

    /// Replaces the body text. Returns the warning notice exactly once per
    /// upward crossing of [`BODY_WARN_CHARS`].
    pub fn set_body(&mut self, body: &str) -> Option<&'static str> {
        self.body = body.to_string();
        let above = self.body.chars().count() >= BODY_WARN_CHARS;
        match (self.warn_state, above) {
            (WarnState::Quiet, true) => {
                self.warn_state = WarnState::Warned;
                Some(BODY_WARN_NOTICE)
            }
            (WarnState::Warned, false) => {
                self.warn_state = WarnState::Quiet;
                None
            }
            _ => None,
        }
    }

    /// Validates and writes the draft: append for a new essay, in-place
    /// update when editing. No storage write happens on validation failure.
    pub fn save(&self, store: &EssayStore) -> Result<SaveOutcome, DraftError> {
        if self.title.trim().is_empty() || self.body.trim().is_empty() {
            return Err(DraftError::EmptyEssay);
        }

        match &self.editing {
            Some(id) => {
                store.update(id, &self.title, &self.body)?;
                Ok(SaveOutcome::Updated(EssayRecord {
                    id: id.clone(),
                    title: self.title.clone(),
                    body: self.body.clone(),
                }))
            }
            None => {
                let record = EssayRecord {
                    id: new_essay_id(),
                    title: self.title.clone(),
                    body: self.body.clone(),
                };
                store.append(record.clone())?;
                Ok(SaveOutcome::Created(record))
            }
        }
    }

    fn sync_warn_state(&mut self) {
        // Pre-populated text that is already long should not re-announce.
        self.warn_state = if self.body.chars().count() >= BODY_WARN_CHARS {
            WarnState::Warned
        } else {
            WarnState::Quiet
        };
    }
}

impl Default for EssayDraft {
    fn default() -> Self {
        Self::new()
    }
}
