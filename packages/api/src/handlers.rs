use axum::extract::State;
use axum::Json;
use promptgate_core::ParsedReview;

use crate::error::ApiError;
use crate::extract::AppJson;
use crate::models::{
    CompletionRequest, CompletionResponse, ParseReviewRequest, StatusMessage, TranslateRequest,
    TranslateResponse,
};
use crate::state::AppState;

pub async fn root() -> Json<StatusMessage> {
    Json(StatusMessage {
        message: "promptgate is running",
    })
}

pub async fn health() -> &'static str {
    "OK"
}

pub async fn translate(
    State(state): State<AppState>,
    AppJson(req): AppJson<TranslateRequest>,
) -> Result<Json<TranslateResponse>, ApiError> {
    let translated = state.service.translate_text(&req.text, &req.style).await?;
    Ok(Json(TranslateResponse { translated }))
}

pub async fn parse_review(
    State(state): State<AppState>,
    AppJson(req): AppJson<ParseReviewRequest>,
) -> Result<Json<ParsedReview>, ApiError> {
    let parsed = state.service.parse_review(&req.review).await?;
    Ok(Json(parsed))
}

pub async fn completion(
    State(state): State<AppState>,
    AppJson(req): AppJson<CompletionRequest>,
) -> Result<Json<CompletionResponse>, ApiError> {
    let completion = state.service.complete(&req.prompt).await?;
    Ok(Json(CompletionResponse { completion }))
}
