use chrono::NaiveDate;
use metrics_exporter_prometheus::PrometheusHandle;
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use talent_pipeline::config::PersistenceConfig;
use talent_pipeline::workflows::pipeline::{
    JsonFileSnapshotStore, MemorySnapshotStore, PersistenceError, PipelineSnapshot, SnapshotStore,
};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Snapshot target selected from `PIPELINE_STATE_PATH`.
#[derive(Debug, Clone)]
pub(crate) enum PipelineStore {
    File(JsonFileSnapshotStore),
    Memory(MemorySnapshotStore),
}

impl PipelineStore {
    pub(crate) fn from_config(config: &PersistenceConfig) -> Self {
        match &config.state_path {
            Some(path) => Self::File(JsonFileSnapshotStore::new(path.clone())),
            None => Self::Memory(MemorySnapshotStore::default()),
        }
    }

    pub(crate) fn describe(&self) -> String {
        match self {
            Self::File(store) => store.path().display().to_string(),
            Self::Memory(_) => "in-memory".to_string(),
        }
    }
}

impl SnapshotStore for PipelineStore {
    fn save(&self, snapshot: &PipelineSnapshot) -> Result<(), PersistenceError> {
        match self {
            Self::File(store) => store.save(snapshot),
            Self::Memory(store) => store.save(snapshot),
        }
    }

    fn load(&self) -> Result<Option<PipelineSnapshot>, PersistenceError> {
        match self {
            Self::File(store) => store.load(),
            Self::Memory(store) => store.load(),
        }
    }
}

/// CLI `--state-path` wins over the configured path.
pub(crate) fn persistence_config(
    mut config: PersistenceConfig,
    state_path: Option<PathBuf>,
) -> PersistenceConfig {
    if let Some(path) = state_path {
        config.state_path = Some(path);
    }
    config
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}
