//! Request/response bodies for the HTTP surface (spec §6 table).

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::context::QueryContext;
use crate::data::Suggestion;

fn default_limit() -> usize {
    10
}

#[derive(Debug, Deserialize)]
pub struct AutocompleteRequest {
    pub query: String,
    pub user_id: Option<String>,
    #[serde(default = "default_limit")]
    pub limit: usize,
    pub context: Option<QueryContext>,
    pub min_score: Option<f32>,
}

#[derive(Debug, Serialize)]
pub struct SuggestionsResponse {
    pub query: String,
    pub suggestions: Vec<Suggestion>,
    pub total: usize,
}

#[derive(Debug, Deserialize)]
pub struct SimilarQueriesRequest {
    pub query: String,
    pub user_id: Option<String>,
    #[serde(default = "default_limit")]
    pub limit: usize,
}

#[derive(Debug, Serialize)]
pub struct SimilarQueriesResponse {
    pub query: String,
    pub similar_queries: Vec<Suggestion>,
    pub total: usize,
}

#[derive(Debug, Deserialize)]
pub struct RelatedQueriesRequest {
    pub query: String,
    pub user_id: Option<String>,
    #[serde(default = "default_limit")]
    pub limit: usize,
}

#[derive(Debug, Serialize)]
pub struct RelatedQueriesResponse {
    pub query: String,
    pub related_queries: Vec<Suggestion>,
    pub total: usize,
}

#[derive(Debug, Deserialize)]
pub struct FeedbackRequest {
    pub query: String,
    pub selected_suggestion: String,
    pub user_id: Option<String>,
    pub timestamp: Option<chrono::DateTime<chrono::Utc>>,
}

#[derive(Debug, Serialize)]
pub struct FeedbackResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct AddDocumentRequest {
    pub text: String,
    pub doc_id: Option<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Serialize)]
pub struct AddDocumentResponse {
    pub success: bool,
    pub message: String,
    pub id: String,
}

#[derive(Debug, Deserialize)]
pub struct BulkAddDocumentRequest {
    pub documents: Vec<AddDocumentRequest>,
}

#[derive(Debug, Serialize)]
pub struct BulkAddDocumentResponse {
    pub success_count: usize,
    pub error_count: usize,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub lexical_connected: bool,
    pub vector_connected: bool,
    pub behavior_connected: bool,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}
