//! Axum handlers for `/chat` and `/health`.
//!
//! The chat body is read as raw bytes and validated here rather than through
//! the `Json` extractor, so every rejection is the same `{"error": ...}`
//! shape and no LLM or downstream call happens before validation passes.

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{Value, json};
use tracing::{Instrument, info, info_span, warn};
use uuid::Uuid;

use super::AppState;

const INVALID_BODY: &str = "Invalid or missing JSON body";
const MISSING_QUESTION: &str = "Missing 'question' in request body";

// ── Request types ─────────────────────────────────────────────────────────────

#[derive(Debug, PartialEq, Eq)]
pub(super) struct ChatRequest {
    pub question: String,
    pub subject_id: String,
}

/// Parse a `/chat` body. `patientId` may be a string or a number; absent or
/// null falls back to `default_subject`.
pub(super) fn parse_chat_request(body: &[u8], default_subject: &str) -> Result<ChatRequest, &'static str> {
    let value: Value = serde_json::from_slice(body).map_err(|_| INVALID_BODY)?;
    let Value::Object(obj) = value else {
        return Err(INVALID_BODY);
    };

    let question = match obj.get("question") {
        Some(Value::String(q)) if !q.is_empty() => q.clone(),
        _ => return Err(MISSING_QUESTION),
    };

    let subject_id = match obj.get("patientId") {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => default_subject.to_string(),
    };

    Ok(ChatRequest { question, subject_id })
}

fn json_error(status: StatusCode, msg: impl std::fmt::Display) -> Response {
    (status, Json(json!({ "error": msg.to_string() }))).into_response()
}

// ── Handlers ──────────────────────────────────────────────────────────────────

/// POST /chat
pub(super) async fn chat(State(state): State<AppState>, body: Bytes) -> Response {
    let req = match parse_chat_request(&body, state.orchestrator.default_subject_id()) {
        Ok(req) => req,
        Err(msg) => {
            warn!(body_len = body.len(), "rejected chat request: {msg}");
            return json_error(StatusCode::BAD_REQUEST, msg);
        }
    };

    let request_id = Uuid::new_v4();
    let span = info_span!("chat", %request_id, subject_id = %req.subject_id);

    async move {
        info!(question_len = req.question.len(), "chat request");
        match state.orchestrator.handle(&req.question, &req.subject_id).await {
            Ok(resp) => (StatusCode::OK, Json(resp)).into_response(),
            Err(e) => json_error(StatusCode::BAD_GATEWAY, e),
        }
    }
    .instrument(span)
    .await
}

/// GET /health
pub(super) async fn health(State(state): State<AppState>) -> Response {
    let body = json!({
        "status": "ok",
        "provider": state.orchestrator.provider().kind(),
        "apis": state.orchestrator.registry().names(),
    });
    (StatusCode::OK, Json(body)).into_response()
}
