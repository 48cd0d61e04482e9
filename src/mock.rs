//! Stub downstream APIs for local runs and integration tests.
//!
//! ```text
//! GET /order    — fixed order
//! GET /payment  — fixed payment
//! GET /patient  — echoes patientId
//! GET /lab      — fixed lab result
//! GET /health   — plain-text "ok"
//! ```
//!
//! Every data route requires the `patientId` query parameter; axum answers
//! `400` when it is missing.

use axum::{Json, Router, extract::Query, routing::get};
use serde::Deserialize;
use serde_json::{Value, json};

#[derive(Debug, Deserialize)]
pub struct SubjectQuery {
    #[serde(rename = "patientId")]
    patient_id: String,
}

pub fn router() -> Router {
    Router::new()
        .route("/order", get(order))
        .route("/payment", get(payment))
        .route("/patient", get(patient))
        .route("/lab", get(lab))
        .route("/health", get(|| async { "ok" }))
}

async fn order(Query(_): Query<SubjectQuery>) -> Json<Value> {
    Json(json!({ "orderId": "12345", "date": "2025-09-10", "items": ["X-ray Scan"] }))
}

async fn payment(Query(_): Query<SubjectQuery>) -> Json<Value> {
    Json(json!({ "amount": "199.99", "status": "Paid" }))
}

async fn patient(Query(q): Query<SubjectQuery>) -> Json<Value> {
    Json(json!({ "patientId": q.patient_id, "name": "John Doe", "insurance": "BlueCross" }))
}

async fn lab(Query(_): Query<SubjectQuery>) -> Json<Value> {
    Json(json!({ "labTest": "Blood Test", "result": "Normal" }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    async fn get_json(uri: &str) -> (StatusCode, Value) {
        let resp = router()
            .oneshot(Request::get(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = resp.status();
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    #[tokio::test]
    async fn fixed_payloads_ignore_subject() {
        let (status, a) = get_json("/payment?patientId=1").await;
        let (_, b) = get_json("/payment?patientId=2").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(a, b);
        assert_eq!(a, json!({"amount": "199.99", "status": "Paid"}));
    }

    #[tokio::test]
    async fn patient_echoes_subject() {
        let (status, body) = get_json("/patient?patientId=abc-9").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"patientId": "abc-9", "name": "John Doe", "insurance": "BlueCross"}));
    }

    #[tokio::test]
    async fn lab_and_order_payloads() {
        assert_eq!(get_json("/lab?patientId=1").await.1["labTest"], "Blood Test");
        assert_eq!(get_json("/order?patientId=1").await.1["items"], json!(["X-ray Scan"]));
    }

    #[tokio::test]
    async fn missing_subject_rejected() {
        let (status, _) = get_json("/order").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
