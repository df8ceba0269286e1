//! `HttpMathApi` against an in-process axum backend.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::Router;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::Json;
use serde_json::{Value, json};

use mathchat::net::types::FeedbackRequest;
use mathchat::{ApiError, ChatController, HttpMathApi, MathApi};

type Captured = Arc<Mutex<Vec<Value>>>;

async fn serve(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve");
    });
    format!("http://{addr}")
}

fn client(base_url: &str) -> HttpMathApi {
    HttpMathApi::new(base_url, None, None).expect("client")
}

async fn recent(Query(params): Query<HashMap<String, String>>) -> Json<Value> {
    let limit: usize = params
        .get("limit")
        .and_then(|l| l.parse().ok())
        .unwrap_or(0);
    let rows: Vec<Value> = (1..=limit.min(2))
        .map(|id| {
            json!({
                "id": id,
                "query": format!("question {id}"),
                "answer": format!("answer {id}"),
                "source": "knowledge_base",
                "confidence_score": 0.8,
                "created_at": format!("2024-05-0{id}T12:00:00"),
            })
        })
        .collect();
    Json(json!({ "conversations": rows }))
}

async fn query(State(seen): State<Captured>, Json(body): Json<Value>) -> Json<Value> {
    seen.lock().expect("lock").push(body.clone());
    Json(json!({
        "conversation_id": 42,
        "query": body["query"],
        "answer": "x = 5",
        "source": "web_search",
        "confidence_score": 0.75,
        "kb_matches": 0,
    }))
}

async fn feedback(State(seen): State<Captured>, Json(body): Json<Value>) -> Json<Value> {
    seen.lock().expect("lock").push(body);
    Json(json!({ "status": "success", "message": "Feedback saved", "feedback_id": 9 }))
}

fn backend(seen: Captured) -> Router {
    Router::new()
        .route("/api/conversations/recent", get(recent))
        .route("/api/topic-title", post(|| async { Json(json!({ "title": "Linear equations" })) }))
        .route("/api/query", post(query))
        .route("/api/feedback", post(feedback))
        .route(
            "/api/stats",
            get(|| async {
                Json(json!({
                    "total_conversations": 3,
                    "total_feedback": 1,
                    "avg_rating": 4.0,
                    "source_distribution": { "knowledge_base": 2, "web_search": 1 },
                    "avg_confidence_by_source": { "knowledge_base": 0.9 },
                }))
            }),
        )
        .route("/api/health", get(|| async { Json(json!({ "status": "healthy" })) }))
        .with_state(seen)
}

#[tokio::test]
async fn recent_passes_limit_and_decodes_rows() {
    let base = serve(backend(Captured::default())).await;
    let rows = client(&base)
        .recent_conversations(50)
        .await
        .expect("recent");
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].id, 1);
    assert_eq!(rows[1].query, "question 2");
    assert_eq!(rows[1].created_at.as_deref(), Some("2024-05-02T12:00:00"));

    let one = client(&base).recent_conversations(1).await.expect("recent");
    assert_eq!(one.len(), 1);
}

#[tokio::test]
async fn trailing_slash_on_base_url_is_ignored() {
    let base = serve(backend(Captured::default())).await;
    let api = client(&format!("{base}/"));
    assert_eq!(api.base_url(), base);
    assert_eq!(api.topic_title("Solve: 2x + 5 = 15").await.expect("title"), "Linear equations");
}

#[tokio::test]
async fn query_posts_json_body() {
    let seen = Captured::default();
    let base = serve(backend(seen.clone())).await;
    let response = client(&base).query("Solve: 2x + 5 = 15").await.expect("query");
    assert_eq!(response.answer, "x = 5");
    assert_eq!(response.source.as_deref(), Some("web_search"));
    assert_eq!(response.confidence_score, Some(0.75));
    assert_eq!(response.conversation_id, Some(42));
    assert_eq!(seen.lock().expect("lock").as_slice(), &[json!({ "query": "Solve: 2x + 5 = 15" })]);
}

#[tokio::test]
async fn feedback_sends_nulls_explicitly() {
    let seen = Captured::default();
    let base = serve(backend(seen.clone())).await;
    let request = FeedbackRequest {
        query: "What is 2+2?".into(),
        answer: "4".into(),
        rating: 5,
        is_correct: true,
        correction: None,
        notes: None,
        conversation_id: Some(7),
    };
    let response = client(&base).submit_feedback(&request).await.expect("feedback");
    assert_eq!(response.status, "success");
    assert_eq!(response.feedback_id, Some(9));

    let body = seen.lock().expect("lock")[0].clone();
    assert_eq!(
        body,
        json!({
            "query": "What is 2+2?",
            "answer": "4",
            "rating": 5,
            "is_correct": true,
            "correction": null,
            "notes": null,
            "conversation_id": 7,
        })
    );
}

#[tokio::test]
async fn stats_and_health() {
    let base = serve(backend(Captured::default())).await;
    let api = client(&base);
    let stats = api.stats().await.expect("stats");
    assert_eq!(stats.total_conversations, 3);
    assert_eq!(stats.source_distribution.get("knowledge_base"), Some(&2));
    assert_eq!(api.health().await.expect("health")["status"], "healthy");
}

#[tokio::test]
async fn non_success_status_is_response_error() {
    let app = Router::new().route(
        "/api/query",
        post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "model offline") }),
    );
    let base = serve(app).await;
    let err = client(&base).query("q").await.expect_err("500");
    assert_eq!(err, ApiError::Response { status: 500, body: "model offline".into() });
}

#[tokio::test]
async fn malformed_body_is_parse_error() {
    let app = Router::new()
        .route("/api/query", post(|| async { "not json" }))
        .route("/api/topic-title", post(|| async { Json(json!({ "title": "   " })) }));
    let base = serve(app).await;
    let api = client(&base);
    assert!(matches!(api.query("q").await, Err(ApiError::Parse(_))));
    assert!(matches!(api.topic_title("q").await, Err(ApiError::Parse(_))));
}

#[tokio::test]
async fn unreachable_backend_is_request_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    drop(listener);
    let err = client(&format!("http://{addr}")).health().await.expect_err("refused");
    assert!(matches!(err, ApiError::Request(_)));
}

#[tokio::test]
async fn full_session_over_http() {
    let seen = Captured::default();
    let base = serve(backend(seen.clone())).await;
    let api: Arc<dyn MathApi> = Arc::new(client(&base));
    let mut controller = ChatController::new(api, 50);

    controller.load_recent().await;
    assert_eq!(controller.state().conversations.len(), 2);

    controller.new_conversation();
    controller.send_message("Solve: 2x + 5 = 15").await;
    let conv = controller.state().active_conversation().expect("active");
    assert_eq!(conv.title, "Linear equations");
    assert_eq!(conv.messages.len(), 2);
    let answer = conv.messages[1].id;

    assert!(controller.rate(answer, 5, None).await);
    let bodies = seen.lock().expect("lock").clone();
    let feedback = bodies.last().expect("feedback body");
    assert_eq!(feedback["query"], "Solve: 2x + 5 = 15");
    assert_eq!(feedback["is_correct"], true);
    assert_eq!(feedback["correction"], Value::Null);
    assert_eq!(feedback["conversation_id"], 42);
}
