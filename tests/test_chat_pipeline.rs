//! End-to-end `/chat` tests against the real mock backend and a stub
//! `/v1/chat/completions` server, both on ephemeral ports.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::body::{Body, to_bytes};
use axum::extract::State;
use axum::http::{Request, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tower::ServiceExt;

use api_orchestrator::config::Config;
use api_orchestrator::orchestrator::Orchestrator;
use api_orchestrator::registry::ApiEntry;
use api_orchestrator::{mock, server};

// ── Stub LLM ──────────────────────────────────────────────────────────────────

#[derive(Clone)]
struct StubLlm {
    /// Reply to the routing prompt.
    selection: &'static str,
    /// Status for the summary prompt; anything but 200 fails the call.
    summary_status: u16,
    calls: Arc<AtomicUsize>,
    /// Every prompt received, with the temperature it was sent at.
    prompts: Arc<Mutex<Vec<(String, f64)>>>,
}

impl StubLlm {
    fn new(selection: &'static str, summary_status: u16) -> Self {
        Self {
            selection,
            summary_status,
            calls: Arc::new(AtomicUsize::new(0)),
            prompts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().iter().map(|(p, _)| p.clone()).collect()
    }

    fn temperatures(&self) -> Vec<f64> {
        self.prompts.lock().unwrap().iter().map(|(_, t)| *t).collect()
    }
}

async fn completions(State(stub): State<StubLlm>, Json(req): Json<Value>) -> Response {
    stub.calls.fetch_add(1, Ordering::SeqCst);
    let prompt = req["messages"][0]["content"].as_str().unwrap_or_default().to_string();
    let temperature = req["temperature"].as_f64().unwrap_or(f64::NAN);
    stub.prompts.lock().unwrap().push((prompt.clone(), temperature));

    let content = if prompt.contains("You are an API orchestrator") {
        stub.selection.to_string()
    } else if stub.summary_status != 200 {
        let status = StatusCode::from_u16(stub.summary_status).unwrap();
        let body = json!({"error": {"message": "model overloaded", "code": "overloaded"}});
        return (status, Json(body)).into_response();
    } else {
        "Your order 12345 from Sept 10 covers an X-ray Scan, and the $199.99 payment is in.".to_string()
    };

    Json(json!({
        "choices": [{ "message": { "role": "assistant", "content": content } }],
        "usage": { "prompt_tokens": 10, "completion_tokens": 5 }
    }))
    .into_response()
}

// ── Harness ───────────────────────────────────────────────────────────────────

async fn spawn(app: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

struct Harness {
    app: Router,
    llm: StubLlm,
}

/// Default registry pointed at a fresh mock backend, plus `extra` entries.
async fn harness(llm: StubLlm, fallback_on_error: bool, extra: Vec<ApiEntry>) -> Harness {
    let backend = spawn(mock::router()).await;
    let llm_base = spawn(
        Router::new()
            .route("/v1/chat/completions", post(completions))
            .with_state(llm.clone()),
    )
    .await;

    let mut cfg = Config::test_default();
    cfg.llm.provider = "openai".into();
    cfg.llm.openai.api_base_url = format!("{llm_base}/v1/chat/completions");
    cfg.llm.openai.timeout_seconds = 5;
    cfg.llm_api_key = Some("sk-test".into());
    cfg.summarizer.fallback_on_error = fallback_on_error;
    for api in &mut cfg.apis {
        api.url = api.url.replace("http://localhost:8001", &backend);
    }
    cfg.apis.extend(extra.into_iter().map(|mut api| {
        api.url = api.url.replace("{backend}", &backend);
        api
    }));

    let orchestrator = Orchestrator::from_config(&cfg).unwrap();
    Harness { app: server::router(Arc::new(orchestrator)), llm }
}

async fn post_chat(app: &Router, body: &'static str) -> (StatusCode, Value) {
    let req = Request::post("/chat")
        .header("content-type", "application/json")
        .body(Body::from(body))
        .unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn order_and_payment_end_to_end() {
    let h = harness(StubLlm::new(r#"["OrderAPI","PaymentAPI"]"#, 200), true, vec![]).await;

    let (status, body) =
        post_chat(&h.app, r#"{"question":"What's my order status and payment?"}"#).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["data"],
        json!({
            "OrderAPI": {"orderId": "12345", "date": "2025-09-10", "items": ["X-ray Scan"]},
            "PaymentAPI": {"amount": "199.99", "status": "Paid"}
        })
    );
    assert!(!body["answer"].as_str().unwrap().is_empty());
    assert_eq!(h.llm.calls(), 2);
    assert_eq!(h.llm.temperatures(), [0.0, 0.5]);

    let prompts = h.llm.prompts();
    assert!(prompts[0].contains("What's my order status and payment?"));
    assert!(prompts[0].contains("LabAPI: Fetch lab test results"));
    assert!(prompts[1].contains("\"orderId\": \"12345\""));
}

#[tokio::test]
async fn empty_selection_still_summarizes() {
    let h = harness(StubLlm::new("None of these APIs apply.", 200), true, vec![]).await;

    let (status, body) = post_chat(&h.app, r#"{"question":"What's the weather?"}"#).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"], json!({}));
    assert_eq!(h.llm.calls(), 2);
    assert!(h.llm.prompts()[1].contains("Here is the raw API data:\n{}"));
}

#[tokio::test]
async fn missing_question_makes_no_calls() {
    let h = harness(StubLlm::new(r#"["OrderAPI"]"#, 200), true, vec![]).await;

    let (status, body) = post_chat(&h.app, r#"{"patientId":"55"}"#).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"error": "Missing 'question' in request body"}));

    let (status, body) = post_chat(&h.app, "not json").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"error": "Invalid or missing JSON body"}));

    assert_eq!(h.llm.calls(), 0);
}

#[tokio::test]
async fn unknown_names_dropped_and_failures_isolated() {
    let extra = vec![
        ApiEntry {
            name: "ArchiveAPI".into(),
            url: "{backend}/archive".into(),
            description: "Fetch archived records".into(),
        },
        ApiEntry {
            name: "BillingAPI".into(),
            url: "{backend}/billing".into(),
            description: "Fetch billing history".into(),
        },
    ];
    let selection = r#"Call these: ["LabAPI", "ArchiveAPI", "GhostAPI", "BillingAPI", "PatientAPI"]"#;
    let h = harness(StubLlm::new(selection, 200), true, extra).await;

    let (status, body) =
        post_chat(&h.app, r#"{"question":"labs and records?","patientId":"p-9"}"#).await;

    assert_eq!(status, StatusCode::OK);
    let data = body["data"].as_object().unwrap();
    // 4 known names selected, 2 of them 404 on the mock backend.
    assert_eq!(data.len(), 4);
    assert!(!data.contains_key("GhostAPI"));
    assert_eq!(data["ArchiveAPI"], json!({"error": "API returned status 404"}));
    assert_eq!(data["BillingAPI"], json!({"error": "API returned status 404"}));
    assert_eq!(data["LabAPI"], json!({"labTest": "Blood Test", "result": "Normal"}));
    assert_eq!(data["PatientAPI"]["patientId"], "p-9");
}

#[tokio::test]
async fn default_subject_sent_downstream() {
    let h = harness(StubLlm::new(r#"["PatientAPI"]"#, 200), true, vec![]).await;

    let (_, body) = post_chat(&h.app, r#"{"question":"who am I?"}"#).await;

    assert_eq!(body["data"]["PatientAPI"]["patientId"], "123");
}

#[tokio::test]
async fn summarizer_failure_falls_back_to_data() {
    let h = harness(StubLlm::new(r#"["PaymentAPI"]"#, 503), true, vec![]).await;

    let (status, body) = post_chat(&h.app, r#"{"question":"did I pay?"}"#).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["answer"],
        "I retrieved the requested information but could not summarize it right now."
    );
    assert_eq!(body["data"], json!({"PaymentAPI": {"amount": "199.99", "status": "Paid"}}));
}

#[tokio::test]
async fn summarizer_failure_without_fallback_is_502() {
    let h = harness(StubLlm::new(r#"["PaymentAPI"]"#, 500), false, vec![]).await;

    let (status, body) = post_chat(&h.app, r#"{"question":"did I pay?"}"#).await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    let err = body["error"].as_str().unwrap();
    assert!(err.starts_with("summarizer failed"));
    assert!(err.contains("model overloaded"));
}

#[tokio::test]
async fn router_llm_failure_degrades_to_no_apis() {
    // Nothing listens on the LLM URL, so both calls fail; fallback answers.
    let mut cfg = Config::test_default();
    cfg.llm.provider = "openai".into();
    let dead = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = dead.local_addr().unwrap();
    drop(dead);
    cfg.llm.openai.api_base_url = format!("http://{addr}/v1/chat/completions");
    cfg.llm.openai.timeout_seconds = 5;
    let app = server::router(Arc::new(Orchestrator::from_config(&cfg).unwrap()));

    let (status, body) = post_chat(&app, r#"{"question":"order?"}"#).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"], json!({}));
    assert!(!body["answer"].as_str().unwrap().is_empty());
}
