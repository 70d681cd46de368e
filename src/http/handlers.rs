//! Route handlers (spec §6). Each handler validates nothing beyond what
//! [`crate::orchestrator::Orchestrator`] already validates — a
//! [`QaError::InvalidArgument`] maps to 400, [`QaError::Unavailable`] to
//! 503, anything else to 500, mirroring the status-tuple idiom used for
//! fallible handlers across the pack (`(StatusCode, String)` as the error
//! type of `Result`).

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use axum::Router;

use crate::error::QaError;
use crate::orchestrator::Orchestrator;
use crate::store::DocumentInput;

use super::types::*;

#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<Orchestrator>,
}

pub fn router(orchestrator: Arc<Orchestrator>) -> Router {
    let state = AppState { orchestrator };
    Router::new()
        .route("/api/v1/autocomplete", post(autocomplete))
        .route("/api/v1/similar-queries", post(similar_queries))
        .route("/api/v1/related-queries", post(related_queries))
        .route("/api/v1/feedback", post(feedback))
        .route("/api/v1/documents", post(add_document))
        .route("/api/v1/documents/bulk", post(bulk_add_document))
        .route("/api/v1/health", get(health))
        .with_state(state)
}

fn map_error(err: QaError) -> (StatusCode, Json<ErrorResponse>) {
    let status = match &err {
        QaError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
        QaError::Unavailable(_) | QaError::Timeout(_) => StatusCode::SERVICE_UNAVAILABLE,
        QaError::NotFound(_) => StatusCode::NOT_FOUND,
        QaError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(ErrorResponse { error: err.to_string() }))
}

async fn autocomplete(
    State(state): State<AppState>,
    Json(req): Json<AutocompleteRequest>,
) -> Response {
    let result = state
        .orchestrator
        .get_suggestions(
            &req.query,
            req.user_id.as_deref(),
            req.limit,
            req.min_score,
            req.context.as_ref(),
        )
        .await;

    match result {
        Ok(suggestions) => Json(SuggestionsResponse {
            query: req.query,
            total: suggestions.len(),
            suggestions,
        })
        .into_response(),
        Err(e) => map_error(e).into_response(),
    }
}

async fn similar_queries(
    State(state): State<AppState>,
    Json(req): Json<SimilarQueriesRequest>,
) -> Response {
    match state
        .orchestrator
        .get_similar_queries(&req.query, req.user_id.as_deref(), req.limit)
        .await
    {
        Ok(similar_queries) => Json(SimilarQueriesResponse {
            query: req.query,
            total: similar_queries.len(),
            similar_queries,
        })
        .into_response(),
        Err(e) => map_error(e).into_response(),
    }
}

async fn related_queries(
    State(state): State<AppState>,
    Json(req): Json<RelatedQueriesRequest>,
) -> Response {
    match state
        .orchestrator
        .get_related_queries(&req.query, req.user_id.as_deref(), req.limit)
        .await
    {
        Ok(related_queries) => Json(RelatedQueriesResponse {
            query: req.query,
            total: related_queries.len(),
            related_queries,
        })
        .into_response(),
        Err(e) => map_error(e).into_response(),
    }
}

async fn feedback(State(state): State<AppState>, Json(req): Json<FeedbackRequest>) -> Response {
    match state
        .orchestrator
        .record_feedback(&req.query, &req.selected_suggestion, req.user_id.as_deref(), req.timestamp)
        .await
    {
        Ok(()) => Json(FeedbackResponse {
            success: true,
            message: "feedback recorded".to_string(),
        })
        .into_response(),
        Err(e) => map_error(e).into_response(),
    }
}

async fn add_document(State(state): State<AppState>, Json(req): Json<AddDocumentRequest>) -> Response {
    let keywords = req.keywords.into_iter().collect();
    match state
        .orchestrator
        .add_document(&req.text, req.doc_id, keywords, req.metadata)
        .await
    {
        Ok(id) => Json(AddDocumentResponse {
            success: true,
            message: "document added".to_string(),
            id,
        })
        .into_response(),
        Err(e) => map_error(e).into_response(),
    }
}

async fn bulk_add_document(
    State(state): State<AppState>,
    Json(req): Json<BulkAddDocumentRequest>,
) -> Response {
    let items = req
        .documents
        .into_iter()
        .map(|d| DocumentInput {
            id: d.doc_id,
            text: d.text,
            keywords: d.keywords.into_iter().collect(),
            metadata: d.metadata,
        })
        .collect();

    let result = state.orchestrator.bulk_add_document(items).await;
    Json(BulkAddDocumentResponse {
        success_count: result.success_count,
        error_count: result.error_count,
        message: format!("{} succeeded, {} failed", result.success_count, result.error_count),
    })
    .into_response()
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        lexical_connected: state.orchestrator.lexical_connected(),
        vector_connected: state.orchestrator.vector_connected(),
        behavior_connected: state.orchestrator.behavior_connected(),
    })
}
