use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::Value;
use shot_review::cli::ServeArgs;
use shot_review::web::server::build_router;
use std::fs;
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

const PAYLOAD: &str = r#"{
    "analysis": {"shots": [
        {"timestamp_of_outcome": "0:01.0", "result": "missed",
         "shot_type": "Jump shot", "feedback": "Bend your knees."},
        {"timestamp_of_outcome": "0:02.5", "result": "made",
         "shot_type": "Layup", "feedback": "Good finish."}
    ]},
    "tracking": [
        {"frame": 0, "timestamp": 0.0, "head_x": 0.5, "head_y": 0.5},
        {"frame": 60, "timestamp": 2.0, "head_x": 0.2, "head_y": 0.3}
    ],
    "metadata": {"fps": 30.0, "width": 1920, "height": 1080}
}"#;

struct Fixture {
    payloads: TempDir,
    _reviews: TempDir,
    app: Router,
}

fn fixture() -> Fixture {
    let payloads = tempfile::tempdir().unwrap();
    let reviews = tempfile::tempdir().unwrap();
    fs::write(payloads.path().join("session1.json"), PAYLOAD).unwrap();
    fs::write(
        payloads.path().join("failed.json"),
        r#"{"analysis": {"error": "Failed to parse analysis", "raw_response": "?"}}"#,
    )
    .unwrap();

    let args = ServeArgs {
        host: "127.0.0.1".parse().unwrap(),
        port: 0,
        payload_root: payloads.path().to_string_lossy().to_string(),
        review_root: reviews.path().to_string_lossy().to_string(),
        static_dir: None,
    };
    let app = build_router(Arc::new(args));
    Fixture {
        payloads,
        _reviews: reviews,
        app,
    }
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    send(app, Request::get(uri).body(Body::empty()).unwrap()).await
}

async fn get_text(app: &Router, uri: &str) -> (StatusCode, String) {
    let request = Request::get(uri).body(Body::empty()).unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

/// Split an SSE body into `(event, data)` pairs, skipping keep-alive comments.
fn sse_events(body: &str) -> Vec<(String, Value)> {
    body.split("\n\n")
        .filter_map(|record| {
            let mut event = None;
            let mut data = Value::Null;
            for line in record.lines() {
                if let Some(name) = line.strip_prefix("event:") {
                    event = Some(name.trim().to_string());
                } else if let Some(payload) = line.strip_prefix("data:") {
                    data = serde_json::from_str(payload.trim()).unwrap_or(Value::Null);
                }
            }
            event.map(|e| (e, data))
        })
        .collect()
}

fn frame_payloads(events: &[(String, Value)]) -> Vec<&Value> {
    events
        .iter()
        .filter(|(event, _)| event == "frame")
        .map(|(_, data)| data)
        .collect()
}

async fn create(app: &Router, payload_path: &str) -> (StatusCode, Value) {
    let body = serde_json::json!({ "payload_path": payload_path }).to_string();
    let request = Request::post("/api/reviews")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body))
        .unwrap();
    send(app, request).await
}

#[tokio::test]
async fn test_payloads_are_listed() {
    let fx = fixture();
    let (status, body) = get(&fx.app, "/api/payloads").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_import_and_query_review() {
    let fx = fixture();

    let (status, body) = create(&fx.app, "session1.json").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["review_id"], "session1");

    let (status, body) = get(&fx.app, "/api/reviews").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["name"], "session1");

    let (status, body) = get(&fx.app, "/api/reviews/session1/shots?active=1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["active"], 1);
    assert_eq!(body["shots"][0]["badge"], "MISSED");
    assert_eq!(body["shots"][1]["active"], true);
    assert_eq!(body["summary"]["made"], 1);

    let (status, body) = get(
        &fx.app,
        "/api/reviews/session1/overlay?t=1.9&width=800&height=450",
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["sample"]["timestamp"], 2.0);
    let anchor_x = body["marker"]["anchor"]["x"].as_f64().unwrap();
    let anchor_y = body["marker"]["anchor"]["y"].as_f64().unwrap();
    assert!((anchor_x - 160.0).abs() < 1e-6);
    assert!((anchor_y - 135.0).abs() < 1e-6);
    assert_eq!(body["marker"]["label"], "PLAYER");
}

#[tokio::test]
async fn test_overlay_hidden_before_layout() {
    let fx = fixture();
    create(&fx.app, "session1.json").await;
    let (status, body) = get(
        &fx.app,
        "/api/reviews/session1/overlay?t=0.0&width=0&height=450",
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["marker"].is_null());
    assert!(body["display"].is_null());
}

#[tokio::test]
async fn test_error_statuses() {
    let fx = fixture();

    let (status, _) = get(&fx.app, "/api/reviews/nope/shots").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = create(&fx.app, "failed.json").await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);

    let (status, _) = create(&fx.app, "missing.json").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let absolute = fx.payloads.path().join("session1.json");
    let (status, _) = create(&fx.app, &absolute.to_string_lossy()).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = create(&fx.app, "session1.json").await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = get(&fx.app, "/api/reviews/session1/shots?active=9").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_overlay_stream_frames_and_completion() {
    let fx = fixture();
    create(&fx.app, "session1.json").await;

    // at 64x one tick covers 3.2s of media, so only the start frame fits
    let (status, body) = get_text(
        &fx.app,
        "/api/reviews/session1/overlay/stream?width=800&height=450&speed=64&start=1.9",
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let events = sse_events(&body);
    let frames = frame_payloads(&events);
    assert_eq!(frames.len(), 1);
    assert!((frames[0]["time"].as_f64().unwrap() - 1.9).abs() < 1e-9);
    let anchor = &frames[0]["marker"]["anchor"];
    assert!((anchor["x"].as_f64().unwrap() - 160.0).abs() < 1e-6);
    assert!((anchor["y"].as_f64().unwrap() - 135.0).abs() < 1e-6);
    assert_eq!(events.last().unwrap().0, "complete");

    // without a start the stream begins at the first tracking sample
    let (_, body) = get_text(
        &fx.app,
        "/api/reviews/session1/overlay/stream?width=800&height=450&speed=64",
    )
    .await;
    let events = sse_events(&body);
    let frames = frame_payloads(&events);
    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0]["time"], 0.0);
    assert_eq!(events.last().unwrap().0, "complete");
}

#[tokio::test]
async fn test_overlay_stream_invalid_speed_plays_in_real_time() {
    let fx = fixture();
    create(&fx.app, "session1.json").await;

    let (status, body) = get_text(
        &fx.app,
        "/api/reviews/session1/overlay/stream?width=800&height=450&speed=-3&start=1.5",
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let events = sse_events(&body);
    let frames = frame_payloads(&events);
    // 1.5s to 2.0s in 50 ms steps
    assert_eq!(frames.len(), 11);
    let step = frames[1]["time"].as_f64().unwrap() - frames[0]["time"].as_f64().unwrap();
    assert!((step - 0.05).abs() < 1e-9);
    assert_eq!(events.last().unwrap().0, "complete");
}

#[tokio::test]
async fn test_overlay_stream_rejects_start_outside_tracking() {
    let fx = fixture();
    create(&fx.app, "session1.json").await;

    let (status, _) = get_text(
        &fx.app,
        "/api/reviews/session1/overlay/stream?width=800&height=450&speed=0.1&start=-1e12",
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = get_text(
        &fx.app,
        "/api/reviews/session1/overlay/stream?width=800&height=450&start=30",
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_overlay_stream_rejects_runaway_tracking_span() {
    let payloads = tempfile::tempdir().unwrap();
    let reviews = tempfile::tempdir().unwrap();
    fs::write(
        payloads.path().join("runaway.json"),
        r#"{
            "analysis": {"shots": []},
            "tracking": [
                {"timestamp": 0.0, "head_x": 0.5, "head_y": 0.5},
                {"timestamp": 1e12, "head_x": 0.5, "head_y": 0.5}
            ],
            "metadata": {"width": 1920, "height": 1080}
        }"#,
    )
    .unwrap();
    let app = build_router(Arc::new(ServeArgs {
        host: "127.0.0.1".parse().unwrap(),
        port: 0,
        payload_root: payloads.path().to_string_lossy().to_string(),
        review_root: reviews.path().to_string_lossy().to_string(),
        static_dir: None,
    }));

    let (status, _) = create(&app, "runaway.json").await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = get_text(
        &app,
        "/api/reviews/runaway/overlay/stream?width=800&height=450",
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
