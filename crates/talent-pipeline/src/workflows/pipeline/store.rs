use std::collections::BTreeSet;

use super::domain::{
    require_text, Candidate, CandidateId, NewCandidate, PipelineError, Stage, StageCount,
    ValidationError,
};
use super::persistence::PersistenceError;

/// In-memory candidate collection, newest first.
#[derive(Debug, Clone)]
pub struct CandidateStore {
    candidates: Vec<Candidate>,
    next_sequence: u64,
}

impl Default for CandidateStore {
    fn default() -> Self {
        Self {
            candidates: Vec::new(),
            next_sequence: 1,
        }
    }
}

impl CandidateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a store from candidates already in display order.
    ///
    /// Fails when an existing `cand-` id leaves no room for another sequence number.
    pub(crate) fn from_parts(
        candidates: Vec<Candidate>,
        next_sequence: u64,
    ) -> Result<Self, PersistenceError> {
        let mut floor = 1;
        for candidate in &candidates {
            if let Some(sequence) = parse_sequence(&candidate.id) {
                floor = sequence
                    .checked_add(1)
                    .filter(|next| *next < u64::MAX)
                    .ok_or_else(|| {
                        PersistenceError::Corrupt(format!(
                            "candidate id {} exhausts the id sequence",
                            candidate.id
                        ))
                    })?
                    .max(floor);
            }
        }

        if next_sequence == u64::MAX {
            return Err(PersistenceError::Corrupt(
                "next id sequence is out of range".to_string(),
            ));
        }

        Ok(Self {
            candidates,
            next_sequence: next_sequence.max(floor),
        })
    }

    pub(crate) fn next_sequence(&self) -> u64 {
        self.next_sequence
    }

    pub fn add_candidate(&mut self, new: NewCandidate) -> Result<Candidate, ValidationError> {
        let name = require_text("name", &new.name)?;
        let job_title = require_text("job_title", &new.job_title)?;

        let candidate = Candidate {
            id: self.allocate_id(),
            name,
            job_title,
            stage: new.stage.unwrap_or_default(),
            notes: new.notes.unwrap_or_default(),
            skills: new
                .skills
                .iter()
                .map(|skill| skill.trim())
                .filter(|skill| !skill.is_empty())
                .map(str::to_string)
                .collect(),
            location: new
                .location
                .map(|location| location.trim().to_string())
                .filter(|location| !location.is_empty()),
            tags: BTreeSet::new(),
            messages: Vec::new(),
            interviews: Vec::new(),
            offer: None,
        };

        self.candidates.insert(0, candidate.clone());
        Ok(candidate)
    }

    pub fn get(&self, id: &CandidateId) -> Option<&Candidate> {
        self.candidates.iter().find(|candidate| &candidate.id == id)
    }

    pub(crate) fn get_mut(&mut self, id: &CandidateId) -> Result<&mut Candidate, PipelineError> {
        self.candidates
            .iter_mut()
            .find(|candidate| &candidate.id == id)
            .ok_or_else(|| PipelineError::NotFound(id.clone()))
    }

    pub fn list_by_stage(&self, stage: Stage) -> Vec<Candidate> {
        self.filtered(|candidate| candidate.stage == stage)
    }

    pub fn count_by_stage(&self, stage: Stage) -> usize {
        self.candidates
            .iter()
            .filter(|candidate| candidate.stage == stage)
            .count()
    }

    pub fn stage_counts(&self) -> Vec<StageCount> {
        Stage::ordered()
            .into_iter()
            .map(|stage| StageCount {
                stage,
                stage_label: stage.label(),
                count: self.count_by_stage(stage),
            })
            .collect()
    }

    pub fn move_stage(&mut self, id: &CandidateId, stage: Stage) -> Result<Candidate, PipelineError> {
        let candidate = self.get_mut(id)?;
        candidate.stage = stage;
        Ok(candidate.clone())
    }

    pub fn update_notes(&mut self, id: &CandidateId, text: &str) -> Result<(), PipelineError> {
        let candidate = self.get_mut(id)?;
        candidate.notes = text.to_string();
        Ok(())
    }

    pub fn filtered<P>(&self, predicate: P) -> Vec<Candidate>
    where
        P: Fn(&Candidate) -> bool,
    {
        self.candidates
            .iter()
            .filter(|candidate| predicate(candidate))
            .cloned()
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Candidate> {
        self.candidates.iter()
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    fn allocate_id(&mut self) -> CandidateId {
        loop {
            let id = CandidateId(format!("cand-{:06}", self.next_sequence));
            self.next_sequence = self.next_sequence.saturating_add(1);
            if self.get(&id).is_none() {
                return id;
            }
        }
    }
}

fn parse_sequence(id: &CandidateId) -> Option<u64> {
    id.as_str().strip_prefix("cand-")?.parse().ok()
}
