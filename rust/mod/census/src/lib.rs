//! Census unit data entry.
//!
//! [`CensusStore`] persists [`CensusRecord`]s in a single SQLite table.
//! [`EntryForm`] holds the twelve-field draft, checks that every field is
//! filled in, and inserts or updates through the store.

pub mod form;
pub mod model;
pub mod store;

pub use form::{EntryForm, SubmitError, SubmitOutcome, ValidationError};
pub use model::{CensusFields, CensusRecord, DraftMode, Field};
pub use store::CensusStore;
