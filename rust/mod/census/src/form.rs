use std::sync::Arc;

use census_core::ServiceError;
use thiserror::Error;
use tracing::{error, info};

use crate::model::{CensusFields, CensusRecord, DraftMode, Field};
use crate::store::CensusStore;

/// Submission refused because required fields are empty.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Please fill out all fields")]
pub struct ValidationError {
    /// Empty fields, in form order.
    pub missing: Vec<Field>,
}

#[derive(Error, Debug)]
pub enum SubmitError {
    /// Nothing was written.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The write failed; the draft is left as it was.
    #[error("storage error: {0}")]
    Storage(#[source] ServiceError),
}

impl From<SubmitError> for ServiceError {
    fn from(err: SubmitError) -> Self {
        match err {
            SubmitError::Validation(e) => ServiceError::Validation(e.to_string()),
            SubmitError::Storage(e) => e,
        }
    }
}

/// What a successful submit did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    Created(i64),
    /// `rows_affected` is 0 when the edited record no longer exists.
    Updated { id: i64, rows_affected: u64 },
}

/// Controller behind the census entry screen.
///
/// Holds the draft being typed in, whether a submit creates or edits, and
/// the record list as last read from the store. One operation runs at a
/// time; every method completes its store call before returning.
pub struct EntryForm {
    store: Arc<CensusStore>,
    draft: CensusFields,
    mode: DraftMode,
    records: Vec<CensusRecord>,
}

impl EntryForm {
    /// Prepare the store and load the current records.
    pub fn mount(store: Arc<CensusStore>) -> Result<Self, ServiceError> {
        store.initialize()?;
        let records = store.get_all();
        Ok(Self {
            store,
            draft: CensusFields::default(),
            mode: DraftMode::Create,
            records,
        })
    }

    pub fn draft(&self) -> &CensusFields {
        &self.draft
    }

    pub fn draft_mut(&mut self) -> &mut CensusFields {
        &mut self.draft
    }

    pub fn mode(&self) -> DraftMode {
        self.mode
    }

    pub fn records(&self) -> &[CensusRecord] {
        &self.records
    }

    pub fn set_field(&mut self, field: Field, value: impl Into<String>) {
        self.draft.set(field, value);
    }

    /// Load stored record `id` into the draft and switch to edit mode.
    pub fn edit(&mut self, id: i64) -> Result<(), ServiceError> {
        let record = self
            .store
            .get(id)?
            .ok_or_else(|| ServiceError::NotFound(format!("census record {id}")))?;
        self.edit_record(&record);
        Ok(())
    }

    /// Same as [`EntryForm::edit`] for a record already in hand.
    pub fn edit_record(&mut self, record: &CensusRecord) {
        self.draft = record.fields.clone();
        self.mode = DraftMode::Edit(record.id);
    }

    /// Validate the draft and write it.
    ///
    /// On success the draft is cleared, the mode returns to create and the
    /// record list is re-read. On any failure the draft and mode are kept.
    pub fn submit(&mut self) -> Result<SubmitOutcome, SubmitError> {
        let missing = self.draft.missing();
        if !missing.is_empty() {
            return Err(ValidationError { missing }.into());
        }

        let outcome = match self.mode {
            DraftMode::Create => self.store.insert(&self.draft).map(|id| {
                info!(id, "census data created");
                SubmitOutcome::Created(id)
            }),
            DraftMode::Edit(id) => self.store.update(id, &self.draft).map(|rows_affected| {
                info!(id, rows_affected, "census data updated");
                SubmitOutcome::Updated { id, rows_affected }
            }),
        }
        .map_err(|e| {
            error!("error submitting census data: {e}");
            SubmitError::Storage(e)
        })?;

        self.reset();
        self.refresh();
        Ok(outcome)
    }

    /// Clear the draft and return to create mode.
    pub fn reset(&mut self) {
        self.draft = CensusFields::default();
        self.mode = DraftMode::Create;
    }

    /// Re-read the record list from the store.
    pub fn refresh(&mut self) {
        self.records = self.store.get_all();
    }
}
