use crate::errors::AppError;
use crate::models::{ClickOutcome, Histogram, HistoryEntry, PeakActivity, SessionCreated, SessionStats};
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use chrono::Local;
use tracing::{debug, info};

pub async fn create_session(State(state): State<AppState>) -> (StatusCode, Json<SessionCreated>) {
    let (session_id, session_start) = state.create_session().await;
    info!(session_id, "session started");
    (
        StatusCode::CREATED,
        Json(SessionCreated {
            session_id,
            session_start,
        }),
    )
}

pub async fn delete_session(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<StatusCode, AppError> {
    if state.remove_session(id).await {
        info!(session_id = id, "session closed");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::not_found(format!("no session {id}")))
    }
}

pub async fn click(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<ClickOutcome>, AppError> {
    let handle = state.session(id).await?;
    let outcome = handle.session.lock().await.on_click(handle.now(), &Local)?;
    debug!(session_id = id, click = outcome.entry.click_number, "click");
    Ok(Json(outcome))
}

pub async fn clear(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<StatusCode, AppError> {
    let handle = state.session(id).await?;
    handle.session.lock().await.on_clear();
    info!(session_id = id, "history cleared");
    Ok(StatusCode::NO_CONTENT)
}

pub async fn get_stats(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<SessionStats>, AppError> {
    let handle = state.session(id).await?;
    let stats = handle.session.lock().await.read_stats(handle.now());
    Ok(Json(stats))
}

pub async fn get_histogram(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<Histogram>, AppError> {
    let handle = state.session(id).await?;
    let histogram = handle.session.lock().await.read_histogram(handle.now());
    Ok(Json(histogram))
}

pub async fn get_peak(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<PeakActivity>, AppError> {
    let handle = state.session(id).await?;
    let peak = handle.session.lock().await.read_peak(handle.now());
    debug!(session_id = id, peak = %peak.describe(), "peak read");
    Ok(Json(peak))
}

pub async fn get_history(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<Vec<HistoryEntry>>, AppError> {
    let handle = state.session(id).await?;
    let entries = handle.session.lock().await.history(&Local);
    Ok(Json(entries))
}

pub async fn export(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<impl IntoResponse, AppError> {
    let handle = state.session(id).await?;
    let export = handle.session.lock().await.on_export_request(handle.now(), &Local)?;
    info!(session_id = id, filename = %export.filename, bytes = export.content.len(), "csv export");

    let headers = [
        (header::CONTENT_TYPE, export.mime_type.to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", export.filename),
        ),
    ];
    Ok((headers, export.content))
}
