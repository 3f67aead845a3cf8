use std::path::PathBuf;

use axum::{extract::State, http::StatusCode, Json};
use axum_extra::extract::Query;
use serde::Deserialize;

use crate::api::state::AppState;
use crate::domain::{DialogTurn, SessionKey};

pub const INGEST_SUCCESS: &str = "documents successfully added";

#[derive(Debug, Deserialize)]
pub struct AddFilesQuery {
    #[serde(default)]
    pub doc_paths: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct SessionQuery {
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub conversation_id: String,
}

#[derive(Debug, Deserialize)]
pub struct QuestionsQuery {
    #[serde(default)]
    pub questions: Vec<String>,
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub conversation_id: String,
}

pub async fn add_new_txt_files_to_db(
    State(state): State<AppState>,
    Query(query): Query<AddFilesQuery>,
) -> Result<Json<&'static str>, StatusCode> {
    let paths: Vec<PathBuf> = query.doc_paths.iter().map(PathBuf::from).collect();

    state
        .document_service
        .ingest_files(&paths)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to ingest documents");
            StatusCode::INTERNAL_SERVER_ERROR
        })?;

    Ok(Json(INGEST_SUCCESS))
}

pub async fn get_dialog_history(
    State(state): State<AppState>,
    Query(query): Query<SessionQuery>,
) -> Result<Json<Vec<DialogTurn>>, StatusCode> {
    let key = SessionKey::new(query.user_id, query.conversation_id);

    let turns = state.qa_service.history(&key).await.map_err(|e| {
        tracing::error!(error = %e, "Failed to read dialog history");
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    Ok(Json(turns))
}

pub async fn process_question_and_get_answer(
    State(state): State<AppState>,
    Query(query): Query<QuestionsQuery>,
) -> Result<Json<Vec<String>>, StatusCode> {
    let key = SessionKey::new(query.user_id, query.conversation_id);

    let answers = state
        .qa_service
        .answer(&query.questions, &key)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, session = %key, "Failed to answer questions");
            StatusCode::INTERNAL_SERVER_ERROR
        })?;

    Ok(Json(answers))
}
