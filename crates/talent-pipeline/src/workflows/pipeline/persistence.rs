use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::domain::{
    Candidate, CandidateId, CandidateMessage, OfferDetails, OfferRecord, OfferState, OfferStatus,
    ScheduledInterview, Stage,
};
use super::store::CandidateStore;

pub const SNAPSHOT_VERSION: u32 = 1;

/// Full serialized state used for persistence round-trips. Keys are snake_case throughout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineSnapshot {
    pub version: u32,
    pub next_sequence: u64,
    pub candidates: Vec<CandidateSnapshot>,
}

/// Serialized candidate. Absent offers are written with the `none` status sentinel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateSnapshot {
    pub id: CandidateId,
    pub name: String,
    pub job_title: String,
    pub stage: Stage,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    #[serde(default)]
    pub messages: Vec<CandidateMessage>,
    #[serde(default)]
    pub interviews: Vec<ScheduledInterview>,
    pub offer_status: OfferStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offer_details: Option<OfferDetails>,
}

impl From<&Candidate> for CandidateSnapshot {
    fn from(candidate: &Candidate) -> Self {
        Self {
            id: candidate.id.clone(),
            name: candidate.name.clone(),
            job_title: candidate.job_title.clone(),
            stage: candidate.stage,
            notes: candidate.notes.clone(),
            skills: candidate.skills.clone(),
            location: candidate.location.clone(),
            tags: candidate.tags.clone(),
            messages: candidate.messages.clone(),
            interviews: candidate.interviews.clone(),
            offer_status: candidate.offer_status(),
            offer_details: candidate.offer.as_ref().map(|offer| offer.details.clone()),
        }
    }
}

impl TryFrom<CandidateSnapshot> for Candidate {
    type Error = PersistenceError;

    fn try_from(snapshot: CandidateSnapshot) -> Result<Self, Self::Error> {
        let offer = offer_from_parts(&snapshot.id, snapshot.offer_status, snapshot.offer_details)?;

        Ok(Candidate {
            id: snapshot.id,
            name: snapshot.name,
            job_title: snapshot.job_title,
            stage: snapshot.stage,
            notes: snapshot.notes,
            skills: snapshot.skills,
            location: snapshot.location,
            tags: snapshot.tags,
            messages: snapshot.messages,
            interviews: snapshot.interviews,
            offer,
        })
    }
}

/// Join the serialized status sentinel and details back into an optional record.
pub(crate) fn offer_from_parts(
    id: &CandidateId,
    status: OfferStatus,
    details: Option<OfferDetails>,
) -> Result<Option<OfferRecord>, PersistenceError> {
    let state = match status {
        OfferStatus::None => return Ok(None),
        OfferStatus::Sent => OfferState::Sent,
        OfferStatus::Accepted => OfferState::Accepted,
        OfferStatus::Declined => OfferState::Declined,
    };

    let details = details.ok_or_else(|| {
        PersistenceError::Corrupt(format!(
            "candidate {id} has offer status {status} but no offer details"
        ))
    })?;

    Ok(Some(OfferRecord {
        status: state,
        details,
    }))
}

impl PipelineSnapshot {
    pub fn capture(store: &CandidateStore) -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            next_sequence: store.next_sequence(),
            candidates: store.iter().map(CandidateSnapshot::from).collect(),
        }
    }

    pub fn into_store(self) -> Result<CandidateStore, PersistenceError> {
        if self.version > SNAPSHOT_VERSION {
            return Err(PersistenceError::Corrupt(format!(
                "snapshot version {} is newer than supported version {}",
                self.version, SNAPSHOT_VERSION
            )));
        }

        let mut seen = BTreeSet::new();
        let mut candidates = Vec::with_capacity(self.candidates.len());
        for snapshot in self.candidates {
            if !seen.insert(snapshot.id.clone()) {
                return Err(PersistenceError::Corrupt(format!(
                    "duplicate candidate id {}",
                    snapshot.id
                )));
            }
            candidates.push(Candidate::try_from(snapshot)?);
        }

        CandidateStore::from_parts(candidates, self.next_sequence)
    }
}

/// Durable target notified after every successful mutation.
pub trait SnapshotStore: Send + Sync {
    fn save(&self, snapshot: &PipelineSnapshot) -> Result<(), PersistenceError>;
    fn load(&self) -> Result<Option<PipelineSnapshot>, PersistenceError>;
}

/// Durability side effect failure. In-memory state stays authoritative.
#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("snapshot io failed for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("snapshot serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("snapshot is inconsistent: {0}")]
    Corrupt(String),
    #[error("snapshot store unavailable: {0}")]
    Unavailable(String),
}

/// Keeps the latest snapshot in memory.
#[derive(Debug, Default, Clone)]
pub struct MemorySnapshotStore {
    latest: Arc<Mutex<Option<PipelineSnapshot>>>,
    saves: Arc<Mutex<usize>>,
}

impl MemorySnapshotStore {
    pub fn with_snapshot(snapshot: PipelineSnapshot) -> Self {
        Self {
            latest: Arc::new(Mutex::new(Some(snapshot))),
            saves: Arc::default(),
        }
    }

    pub fn latest(&self) -> Option<PipelineSnapshot> {
        self.latest.lock().ok().and_then(|guard| guard.clone())
    }

    pub fn save_count(&self) -> usize {
        self.saves.lock().map(|guard| *guard).unwrap_or_default()
    }
}

impl SnapshotStore for MemorySnapshotStore {
    fn save(&self, snapshot: &PipelineSnapshot) -> Result<(), PersistenceError> {
        let mut latest = self
            .latest
            .lock()
            .map_err(|_| PersistenceError::Unavailable("snapshot mutex poisoned".to_string()))?;
        *latest = Some(snapshot.clone());
        if let Ok(mut saves) = self.saves.lock() {
            *saves += 1;
        }
        Ok(())
    }

    fn load(&self) -> Result<Option<PipelineSnapshot>, PersistenceError> {
        let latest = self
            .latest
            .lock()
            .map_err(|_| PersistenceError::Unavailable("snapshot mutex poisoned".to_string()))?;
        Ok(latest.clone())
    }
}

/// Discards every snapshot.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSnapshotStore;

impl SnapshotStore for NullSnapshotStore {
    fn save(&self, _snapshot: &PipelineSnapshot) -> Result<(), PersistenceError> {
        Ok(())
    }

    fn load(&self) -> Result<Option<PipelineSnapshot>, PersistenceError> {
        Ok(None)
    }
}

/// Pretty-printed JSON snapshot on disk, replaced atomically on every save.
#[derive(Debug, Clone)]
pub struct JsonFileSnapshotStore {
    path: PathBuf,
}

impl JsonFileSnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> PersistenceError {
        PersistenceError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl SnapshotStore for JsonFileSnapshotStore {
    fn save(&self, snapshot: &PipelineSnapshot) -> Result<(), PersistenceError> {
        let payload = serde_json::to_vec_pretty(snapshot)?;

        if let Some(parent) = self.path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| self.io_error(source))?;
        }

        let staging = self.path.with_extension("json.tmp");
        fs::write(&staging, payload).map_err(|source| self.io_error(source))?;
        fs::rename(&staging, &self.path).map_err(|source| self.io_error(source))?;

        debug!(
            path = %self.path.display(),
            candidates = snapshot.candidates.len(),
            "pipeline snapshot written"
        );
        Ok(())
    }

    fn load(&self) -> Result<Option<PipelineSnapshot>, PersistenceError> {
        let raw = match fs::read(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(self.io_error(source)),
        };

        let snapshot = serde_json::from_slice(&raw)?;
        debug!(path = %self.path.display(), "pipeline snapshot loaded");
        Ok(Some(snapshot))
    }
}
