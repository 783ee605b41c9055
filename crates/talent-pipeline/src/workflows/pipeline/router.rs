use std::sync::{Arc, Mutex};

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
    Json, Router,
};
use chrono::{NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::warn;

use super::domain::{CandidateId, NewCandidate, OfferDraft, PipelineError, ScheduledInterview, Stage};
use super::engine::{Committed, PipelineEngine};
use super::letter::LetterFormat;
use super::persistence::SnapshotStore;
use super::search::CandidateQuery;

/// Engine shared between request handlers behind a single writer lock.
pub type SharedPipeline<S> = Arc<Mutex<PipelineEngine<S>>>;

/// Router builder exposing the pipeline commands and queries over HTTP.
pub fn pipeline_router<S>(pipeline: SharedPipeline<S>) -> Router
where
    S: SnapshotStore + 'static,
{
    Router::new()
        .route(
            "/api/v1/pipeline/candidates",
            post(add_handler::<S>).get(search_handler::<S>),
        )
        .route("/api/v1/pipeline/stages", get(stage_counts_handler::<S>))
        .route(
            "/api/v1/pipeline/candidates/:candidate_id",
            get(candidate_handler::<S>),
        )
        .route(
            "/api/v1/pipeline/candidates/:candidate_id/stage",
            post(move_stage_handler::<S>),
        )
        .route(
            "/api/v1/pipeline/candidates/:candidate_id/reject",
            post(reject_handler::<S>),
        )
        .route(
            "/api/v1/pipeline/candidates/:candidate_id/notes",
            put(notes_handler::<S>),
        )
        .route(
            "/api/v1/pipeline/candidates/:candidate_id/tags",
            post(add_tag_handler::<S>).delete(remove_tag_request_handler::<S>),
        )
        .route(
            "/api/v1/pipeline/candidates/:candidate_id/tags/:tag",
            delete(remove_tag_handler::<S>),
        )
        .route(
            "/api/v1/pipeline/candidates/:candidate_id/messages",
            post(message_handler::<S>),
        )
        .route(
            "/api/v1/pipeline/candidates/:candidate_id/interviews",
            post(interview_handler::<S>),
        )
        .route(
            "/api/v1/pipeline/candidates/:candidate_id/offer",
            post(send_offer_handler::<S>),
        )
        .route(
            "/api/v1/pipeline/candidates/:candidate_id/offer/accept",
            post(accept_offer_handler::<S>),
        )
        .route(
            "/api/v1/pipeline/candidates/:candidate_id/offer/decline",
            post(decline_offer_handler::<S>),
        )
        .route(
            "/api/v1/pipeline/candidates/:candidate_id/offer/letter",
            get(letter_handler::<S>),
        )
        .with_state(pipeline)
}

#[derive(Debug, Deserialize)]
pub(crate) struct StageChange {
    pub(crate) stage: Stage,
}

#[derive(Debug, Deserialize)]
pub(crate) struct NotesUpdate {
    #[serde(default)]
    pub(crate) notes: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TagChange {
    pub(crate) tag: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct MessageRequest {
    pub(crate) author: String,
    pub(crate) body: String,
    #[serde(default)]
    pub(crate) sent_on: Option<NaiveDateTime>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct LetterRequest {
    #[serde(default)]
    pub(crate) format: Option<String>,
}

/// Payload returned by every mutating route.
#[derive(Debug, Serialize)]
struct MutationView<T> {
    data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    warning: Option<String>,
}

pub(crate) async fn add_handler<S>(
    State(pipeline): State<SharedPipeline<S>>,
    Json(new): Json<NewCandidate>,
) -> Response
where
    S: SnapshotStore + 'static,
{
    command(pipeline, StatusCode::CREATED, move |engine| {
        engine.add_candidate(new)
    })
    .await
}

pub(crate) async fn search_handler<S>(
    State(pipeline): State<SharedPipeline<S>>,
    Query(query): Query<CandidateQuery>,
) -> Response
where
    S: SnapshotStore + 'static,
{
    match pipeline.lock() {
        Ok(engine) => (StatusCode::OK, Json(engine.search(&query))).into_response(),
        Err(_) => poisoned_response(),
    }
}

pub(crate) async fn stage_counts_handler<S>(State(pipeline): State<SharedPipeline<S>>) -> Response
where
    S: SnapshotStore + 'static,
{
    match pipeline.lock() {
        Ok(engine) => (StatusCode::OK, Json(engine.stage_counts())).into_response(),
        Err(_) => poisoned_response(),
    }
}

pub(crate) async fn candidate_handler<S>(
    State(pipeline): State<SharedPipeline<S>>,
    Path(candidate_id): Path<String>,
) -> Response
where
    S: SnapshotStore + 'static,
{
    let id = CandidateId(candidate_id);
    let result = match pipeline.lock() {
        Ok(engine) => engine.get(&id),
        Err(_) => return poisoned_response(),
    };

    match result {
        Ok(candidate) => (StatusCode::OK, Json(candidate)).into_response(),
        Err(err) => pipeline_error_response(err),
    }
}

pub(crate) async fn move_stage_handler<S>(
    State(pipeline): State<SharedPipeline<S>>,
    Path(candidate_id): Path<String>,
    Json(change): Json<StageChange>,
) -> Response
where
    S: SnapshotStore + 'static,
{
    let id = CandidateId(candidate_id);
    command(pipeline, StatusCode::OK, move |engine| {
        engine.move_stage(&id, change.stage)
    })
    .await
}

pub(crate) async fn reject_handler<S>(
    State(pipeline): State<SharedPipeline<S>>,
    Path(candidate_id): Path<String>,
) -> Response
where
    S: SnapshotStore + 'static,
{
    let id = CandidateId(candidate_id);
    command(pipeline, StatusCode::OK, move |engine| engine.reject_candidate(&id)).await
}

pub(crate) async fn notes_handler<S>(
    State(pipeline): State<SharedPipeline<S>>,
    Path(candidate_id): Path<String>,
    Json(update): Json<NotesUpdate>,
) -> Response
where
    S: SnapshotStore + 'static,
{
    let id = CandidateId(candidate_id);
    command(pipeline, StatusCode::OK, move |engine| {
        let committed = engine.update_notes(&id, &update.notes)?;
        let candidate = engine.get(&id)?;
        Ok(committed.map(|()| candidate))
    })
    .await
}

pub(crate) async fn add_tag_handler<S>(
    State(pipeline): State<SharedPipeline<S>>,
    Path(candidate_id): Path<String>,
    Json(change): Json<TagChange>,
) -> Response
where
    S: SnapshotStore + 'static,
{
    let id = CandidateId(candidate_id);
    command(pipeline, StatusCode::OK, move |engine| {
        engine.add_tag(&id, &change.tag)
    })
    .await
}

pub(crate) async fn remove_tag_handler<S>(
    State(pipeline): State<SharedPipeline<S>>,
    Path((candidate_id, tag)): Path<(String, String)>,
) -> Response
where
    S: SnapshotStore + 'static,
{
    let id = CandidateId(candidate_id);
    command(pipeline, StatusCode::OK, move |engine| engine.remove_tag(&id, &tag)).await
}

pub(crate) async fn remove_tag_request_handler<S>(
    State(pipeline): State<SharedPipeline<S>>,
    Path(candidate_id): Path<String>,
    Json(change): Json<TagChange>,
) -> Response
where
    S: SnapshotStore + 'static,
{
    let id = CandidateId(candidate_id);
    command(pipeline, StatusCode::OK, move |engine| {
        engine.remove_tag(&id, &change.tag)
    })
    .await
}

pub(crate) async fn message_handler<S>(
    State(pipeline): State<SharedPipeline<S>>,
    Path(candidate_id): Path<String>,
    Json(request): Json<MessageRequest>,
) -> Response
where
    S: SnapshotStore + 'static,
{
    let id = CandidateId(candidate_id);
    let sent_on = request
        .sent_on
        .unwrap_or_else(|| Utc::now().naive_utc());
    command(pipeline, StatusCode::CREATED, move |engine| {
        engine.post_message(&id, &request.author, &request.body, sent_on)
    })
    .await
}

pub(crate) async fn interview_handler<S>(
    State(pipeline): State<SharedPipeline<S>>,
    Path(candidate_id): Path<String>,
    Json(interview): Json<ScheduledInterview>,
) -> Response
where
    S: SnapshotStore + 'static,
{
    let id = CandidateId(candidate_id);
    command(pipeline, StatusCode::CREATED, move |engine| {
        engine.schedule_interview(&id, interview)
    })
    .await
}

pub(crate) async fn send_offer_handler<S>(
    State(pipeline): State<SharedPipeline<S>>,
    Path(candidate_id): Path<String>,
    Json(draft): Json<OfferDraft>,
) -> Response
where
    S: SnapshotStore + 'static,
{
    let id = CandidateId(candidate_id);
    command(pipeline, StatusCode::CREATED, move |engine| {
        engine.send_offer(&id, &draft)
    })
    .await
}

pub(crate) async fn accept_offer_handler<S>(
    State(pipeline): State<SharedPipeline<S>>,
    Path(candidate_id): Path<String>,
) -> Response
where
    S: SnapshotStore + 'static,
{
    let id = CandidateId(candidate_id);
    command(pipeline, StatusCode::OK, move |engine| engine.mark_accepted(&id)).await
}

pub(crate) async fn decline_offer_handler<S>(
    State(pipeline): State<SharedPipeline<S>>,
    Path(candidate_id): Path<String>,
) -> Response
where
    S: SnapshotStore + 'static,
{
    let id = CandidateId(candidate_id);
    command(pipeline, StatusCode::OK, move |engine| engine.mark_declined(&id)).await
}

pub(crate) async fn letter_handler<S>(
    State(pipeline): State<SharedPipeline<S>>,
    Path(candidate_id): Path<String>,
    Query(request): Query<LetterRequest>,
) -> Response
where
    S: SnapshotStore + 'static,
{
    let format = match request.format.as_deref().map(str::trim) {
        None | Some("") | Some("html") => LetterFormat::Html,
        Some("text") | Some("txt") => LetterFormat::Text,
        Some(other) => {
            let payload = json!({
                "error": format!("unsupported letter format '{other}'"),
            });
            return (StatusCode::BAD_REQUEST, Json(payload)).into_response();
        }
    };

    let id = CandidateId(candidate_id);
    let result = match pipeline.lock() {
        Ok(engine) => engine.export_offer_letter(&id, format),
        Err(_) => return poisoned_response(),
    };

    match result {
        Ok(export) => {
            let disposition = format!("attachment; filename=\"{}\"", export.filename);
            (
                StatusCode::OK,
                [
                    (header::CONTENT_TYPE, export.content_type.to_string()),
                    (header::CONTENT_DISPOSITION, disposition),
                ],
                export.body,
            )
                .into_response()
        }
        Err(err) => pipeline_error_response(err),
    }
}

/// Apply a mutation off the async executor; snapshot writes may touch the filesystem.
async fn command<S, T, F>(pipeline: SharedPipeline<S>, success: StatusCode, apply: F) -> Response
where
    S: SnapshotStore + 'static,
    T: Serialize + Send + 'static,
    F: FnOnce(&mut PipelineEngine<S>) -> Result<Committed<T>, PipelineError> + Send + 'static,
{
    let outcome = tokio::task::spawn_blocking(move || {
        let mut engine = pipeline.lock().map_err(|_| ())?;
        Ok::<_, ()>(apply(&mut *engine))
    })
    .await;

    let result = match outcome {
        Ok(Ok(result)) => result,
        Ok(Err(())) => return poisoned_response(),
        Err(err) => {
            warn!(error = %err, "pipeline command task failed");
            return poisoned_response();
        }
    };

    match result {
        Ok(committed) => {
            let warning = committed.warning.map(|err| {
                warn!(error = %err, "pipeline change applied without durable snapshot");
                err.to_string()
            });
            let view = MutationView {
                data: committed.value,
                warning,
            };
            (success, Json(view)).into_response()
        }
        Err(err) => pipeline_error_response(err),
    }
}

pub(crate) fn pipeline_error_response(err: PipelineError) -> Response {
    let status = match &err {
        PipelineError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        PipelineError::NotFound(_) => StatusCode::NOT_FOUND,
        PipelineError::InvalidState(_) => StatusCode::CONFLICT,
    };
    let payload = json!({
        "error": err.to_string(),
    });
    (status, Json(payload)).into_response()
}

fn poisoned_response() -> Response {
    let payload = json!({
        "error": "pipeline state unavailable",
    });
    (StatusCode::INTERNAL_SERVER_ERROR, Json(payload)).into_response()
}
