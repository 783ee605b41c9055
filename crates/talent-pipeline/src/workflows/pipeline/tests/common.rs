use std::sync::{Arc, Mutex};

use axum::response::Response;
use chrono::NaiveDate;
use serde_json::Value;

use crate::workflows::pipeline::domain::{
    CandidateId, NewCandidate, OfferDraft, ScheduledInterview, TimeSlot,
};
use crate::workflows::pipeline::persistence::{
    MemorySnapshotStore, PersistenceError, PipelineSnapshot, SnapshotStore,
};
use crate::workflows::pipeline::{pipeline_router, PipelineEngine, SharedPipeline};

pub(super) fn jane_doe() -> NewCandidate {
    NewCandidate::new("Jane Doe", "Frontend Developer")
}

pub(super) fn jane_offer() -> OfferDraft {
    OfferDraft::new("Frontend Developer", "$80,000", "2025-01-01")
}

pub(super) fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
}

pub(super) fn interview(day: u32, slot: &str) -> ScheduledInterview {
    ScheduledInterview {
        date: date(2025, 3, day),
        slot: slot.parse::<TimeSlot>().expect("valid slot"),
        interviewer: "Morgan Lee".to_string(),
        notes: String::new(),
    }
}

pub(super) fn build_engine() -> (PipelineEngine<MemorySnapshotStore>, Arc<MemorySnapshotStore>) {
    let snapshots = Arc::new(MemorySnapshotStore::default());
    (PipelineEngine::new(snapshots.clone()), snapshots)
}

/// Engine seeded with three candidates; returns ids oldest first.
pub(super) fn seeded_engine() -> (
    PipelineEngine<MemorySnapshotStore>,
    Arc<MemorySnapshotStore>,
    Vec<CandidateId>,
) {
    let (mut engine, snapshots) = build_engine();
    let seeds = [
        NewCandidate::new("Jane Doe", "Frontend Developer")
            .with_skills(["React", "TypeScript"])
            .with_location("Lagos"),
        NewCandidate::new("Sam Okafor", "Data Analyst")
            .with_skills(["SQL", "Python"])
            .with_location("Nairobi"),
        NewCandidate::new("Ava Chen", "Backend Developer")
            .with_skills(["Rust", "PostgreSQL"])
            .with_location("Lagos")
            .with_stage(crate::workflows::pipeline::Stage::Interview),
    ];

    let ids = seeds
        .into_iter()
        .map(|seed| {
            engine
                .add_candidate(seed)
                .expect("seed candidate is valid")
                .into_value()
                .id
        })
        .collect();

    (engine, snapshots, ids)
}

/// Snapshot target that always fails, used to prove mutations survive durability errors.
#[derive(Default)]
pub(super) struct FailingSnapshotStore {
    pub(super) attempts: Mutex<usize>,
}

impl FailingSnapshotStore {
    pub(super) fn attempts(&self) -> usize {
        *self.attempts.lock().expect("attempt mutex poisoned")
    }
}

impl SnapshotStore for FailingSnapshotStore {
    fn save(&self, _snapshot: &PipelineSnapshot) -> Result<(), PersistenceError> {
        *self.attempts.lock().expect("attempt mutex poisoned") += 1;
        Err(PersistenceError::Unavailable("quota exceeded".to_string()))
    }

    fn load(&self) -> Result<Option<PipelineSnapshot>, PersistenceError> {
        Ok(None)
    }
}

pub(super) fn shared(
    engine: PipelineEngine<MemorySnapshotStore>,
) -> SharedPipeline<MemorySnapshotStore> {
    Arc::new(Mutex::new(engine))
}

pub(super) fn router_with(engine: PipelineEngine<MemorySnapshotStore>) -> axum::Router {
    pipeline_router(shared(engine))
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
