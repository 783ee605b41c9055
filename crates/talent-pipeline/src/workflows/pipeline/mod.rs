//! Candidate pipeline and offer workflow.
//!
//! The engine owns every candidate and each candidate's single offer. It is a synchronous
//! in-memory store; after each successful mutation it hands a full snapshot to a
//! [`SnapshotStore`]. Durability failures are reported beside the result and never undo the
//! change.

pub mod domain;
mod engine;
pub mod legacy;
pub mod letter;
mod offer;
pub mod persistence;
pub mod router;
pub mod search;
mod store;

#[cfg(test)]
mod tests;

pub use domain::{
    Candidate, CandidateId, CandidateMessage, InvalidStateError, NewCandidate, OfferDetails,
    OfferDraft, OfferRecord, OfferState, OfferStatus, PipelineError, ScheduledInterview, Stage,
    StageCount, TimeSlot, ValidationError,
};
pub use engine::{Committed, PipelineEngine};
pub use legacy::LegacyTalentState;
pub use letter::{LetterFormat, OfferLetterExport};
pub use persistence::{
    JsonFileSnapshotStore, MemorySnapshotStore, NullSnapshotStore, PersistenceError,
    PipelineSnapshot, SnapshotStore,
};
pub use router::{pipeline_router, SharedPipeline};
pub use search::{CandidatePage, CandidateQuery, SortOrder};
pub use store::CandidateStore;
