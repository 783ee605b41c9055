use std::sync::Arc;

use chrono::NaiveDateTime;

use super::domain::{
    require_text, Candidate, CandidateId, CandidateMessage, NewCandidate, OfferDraft,
    OfferRecord, PipelineError, ScheduledInterview, Stage, StageCount, ValidationError,
};
use super::letter::{self, LetterFormat, OfferLetterExport};
use super::offer;
use super::persistence::{PersistenceError, PipelineSnapshot, SnapshotStore};
use super::search::{CandidatePage, CandidateQuery};
use super::store::CandidateStore;

/// Result of a mutation that was applied in memory.
///
/// `warning` carries the durability failure, if any. The mutation itself is never rolled back.
#[derive(Debug)]
pub struct Committed<T> {
    pub value: T,
    pub warning: Option<PersistenceError>,
}

impl<T> Committed<T> {
    pub fn into_value(self) -> T {
        self.value
    }

    pub fn is_durable(&self) -> bool {
        self.warning.is_none()
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Committed<U> {
        Committed {
            value: f(self.value),
            warning: self.warning,
        }
    }

    fn unchanged(value: T) -> Self {
        Self {
            value,
            warning: None,
        }
    }
}

/// Façade owning the candidate collection and every candidate's offer.
///
/// The engine is synchronous and performs no locking; callers sharing it across threads must
/// serialize access themselves.
pub struct PipelineEngine<S> {
    candidates: CandidateStore,
    persistence: Arc<S>,
}

impl<S> PipelineEngine<S>
where
    S: SnapshotStore + 'static,
{
    pub fn new(persistence: Arc<S>) -> Self {
        Self::with_store(CandidateStore::new(), persistence)
    }

    pub fn with_store(candidates: CandidateStore, persistence: Arc<S>) -> Self {
        Self {
            candidates,
            persistence,
        }
    }

    /// Rebuild the engine from the last snapshot, or start empty when none exists.
    pub fn restore(persistence: Arc<S>) -> Result<Self, PersistenceError> {
        let candidates = match persistence.load()? {
            Some(snapshot) => snapshot.into_store()?,
            None => CandidateStore::new(),
        };
        Ok(Self::with_store(candidates, persistence))
    }

    pub fn store(&self) -> &CandidateStore {
        &self.candidates
    }

    pub fn snapshot(&self) -> PipelineSnapshot {
        PipelineSnapshot::capture(&self.candidates)
    }

    pub fn add_candidate(
        &mut self,
        new: NewCandidate,
    ) -> Result<Committed<Candidate>, PipelineError> {
        let candidate = self.candidates.add_candidate(new)?;
        Ok(self.commit(candidate))
    }

    /// Add several candidates in order with a single snapshot write.
    ///
    /// Every entry is validated before any is added, so a bad entry leaves the store untouched.
    pub fn import_candidates(
        &mut self,
        batch: Vec<NewCandidate>,
    ) -> Result<Committed<Vec<Candidate>>, PipelineError> {
        for new in &batch {
            require_text("name", &new.name)?;
            require_text("job_title", &new.job_title)?;
        }

        let mut added = Vec::with_capacity(batch.len());
        for new in batch {
            added.push(self.candidates.add_candidate(new)?);
        }
        Ok(self.commit(added))
    }

    pub fn get(&self, id: &CandidateId) -> Result<Candidate, PipelineError> {
        self.candidates
            .get(id)
            .cloned()
            .ok_or_else(|| PipelineError::NotFound(id.clone()))
    }

    pub fn list_by_stage(&self, stage: Stage) -> Vec<Candidate> {
        self.candidates.list_by_stage(stage)
    }

    pub fn count_by_stage(&self, stage: Stage) -> usize {
        self.candidates.count_by_stage(stage)
    }

    pub fn stage_counts(&self) -> Vec<StageCount> {
        self.candidates.stage_counts()
    }

    pub fn move_stage(
        &mut self,
        id: &CandidateId,
        stage: Stage,
    ) -> Result<Committed<Candidate>, PipelineError> {
        let candidate = self.candidates.move_stage(id, stage)?;
        Ok(self.commit(candidate))
    }

    /// Move to `Rejected`. Rejecting an already rejected candidate changes nothing.
    ///
    /// Any offer is left exactly as it was.
    pub fn reject_candidate(
        &mut self,
        id: &CandidateId,
    ) -> Result<Committed<Candidate>, PipelineError> {
        let current = self.get(id)?;
        if current.stage == Stage::Rejected {
            return Ok(Committed::unchanged(current));
        }
        self.move_stage(id, Stage::Rejected)
    }

    pub fn update_notes(
        &mut self,
        id: &CandidateId,
        text: &str,
    ) -> Result<Committed<()>, PipelineError> {
        self.candidates.update_notes(id, text)?;
        Ok(self.commit(()))
    }

    pub fn send_offer(
        &mut self,
        id: &CandidateId,
        draft: &OfferDraft,
    ) -> Result<Committed<OfferRecord>, PipelineError> {
        let record = offer::send_offer(self.candidates.get_mut(id)?, draft)?;
        Ok(self.commit(record))
    }

    pub fn mark_accepted(
        &mut self,
        id: &CandidateId,
    ) -> Result<Committed<OfferRecord>, PipelineError> {
        let record = offer::mark_accepted(self.candidates.get_mut(id)?)?;
        Ok(self.commit(record))
    }

    pub fn mark_declined(
        &mut self,
        id: &CandidateId,
    ) -> Result<Committed<OfferRecord>, PipelineError> {
        let record = offer::mark_declined(self.candidates.get_mut(id)?)?;
        Ok(self.commit(record))
    }

    pub fn render_offer_letter(&self, id: &CandidateId) -> Result<String, PipelineError> {
        letter::render_offer_letter(&self.get(id)?)
    }

    pub fn export_offer_letter(
        &self,
        id: &CandidateId,
        format: LetterFormat,
    ) -> Result<OfferLetterExport, PipelineError> {
        letter::export_offer_letter(&self.get(id)?, format)
    }

    pub fn filtered_view<P>(&self, predicate: P) -> Vec<Candidate>
    where
        P: Fn(&Candidate) -> bool,
    {
        self.candidates.filtered(predicate)
    }

    pub fn search(&self, query: &CandidateQuery) -> CandidatePage {
        query.paginate(self.filtered_view(|candidate| query.matches(candidate)))
    }

    pub fn add_tag(
        &mut self,
        id: &CandidateId,
        tag: &str,
    ) -> Result<Committed<Candidate>, PipelineError> {
        let tag = require_text("tag", tag)?;
        let candidate = self.candidates.get_mut(id)?;
        if !candidate.tags.insert(tag) {
            return Ok(Committed::unchanged(candidate.clone()));
        }
        let candidate = candidate.clone();
        Ok(self.commit(candidate))
    }

    pub fn remove_tag(
        &mut self,
        id: &CandidateId,
        tag: &str,
    ) -> Result<Committed<Candidate>, PipelineError> {
        let tag = require_text("tag", tag)?;
        let candidate = self.candidates.get_mut(id)?;
        if !candidate.tags.remove(&tag) {
            return Ok(Committed::unchanged(candidate.clone()));
        }
        let candidate = candidate.clone();
        Ok(self.commit(candidate))
    }

    pub fn post_message(
        &mut self,
        id: &CandidateId,
        author: &str,
        body: &str,
        sent_on: NaiveDateTime,
    ) -> Result<Committed<CandidateMessage>, PipelineError> {
        let message = CandidateMessage {
            sent_on,
            author: require_text("author", author)?,
            body: require_text("body", body)?,
        };
        self.candidates.get_mut(id)?.messages.push(message.clone());
        Ok(self.commit(message))
    }

    pub fn schedule_interview(
        &mut self,
        id: &CandidateId,
        interview: ScheduledInterview,
    ) -> Result<Committed<ScheduledInterview>, PipelineError> {
        let interview = ScheduledInterview {
            interviewer: require_text("interviewer", &interview.interviewer)?,
            ..interview
        };

        let candidate = self.candidates.get_mut(id)?;
        let taken = candidate
            .interviews
            .iter()
            .any(|booked| booked.date == interview.date && booked.slot == interview.slot);
        if taken {
            return Err(ValidationError::SlotTaken {
                date: interview.date,
                slot: interview.slot,
            }
            .into());
        }

        candidate.interviews.push(interview.clone());
        candidate
            .interviews
            .sort_by_key(|booked| (booked.date, booked.slot));
        Ok(self.commit(interview))
    }

    fn commit<T>(&self, value: T) -> Committed<T> {
        let warning = self.persistence.save(&self.snapshot()).err();
        Committed { value, warning }
    }
}
