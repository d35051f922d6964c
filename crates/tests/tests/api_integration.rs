use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::body::{to_bytes, Body};
use axum::extract::State;
use axum::http::{HeaderMap, Request, StatusCode};
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{json, Value};
use stroll_api::{build_app, AppConfig};
use stroll_core::{ResponseMode, GENERIC_FAILURE_MESSAGE};
use tower::ServiceExt;
use url::Url;

#[derive(Clone)]
struct FakeGemini {
    status: StatusCode,
    reply: Value,
    calls: Arc<AtomicUsize>,
    bodies: Arc<Mutex<Vec<Value>>>,
    keys: Arc<Mutex<Vec<String>>>,
}

impl FakeGemini {
    fn new(status: StatusCode, reply: Value) -> Self {
        Self {
            status,
            reply,
            calls: Arc::new(AtomicUsize::new(0)),
            bodies: Arc::new(Mutex::new(Vec::new())),
            keys: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn last_body(&self) -> Value {
        self.bodies.lock().unwrap().last().cloned().unwrap()
    }

    /// Serves `generateContent` on an ephemeral port and returns the base URL.
    async fn spawn(&self) -> String {
        let router = Router::new()
            .route("/v1beta/models/{call}", post(generate_content))
            .with_state(self.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}/v1beta")
    }
}

async fn generate_content(
    State(fake): State<FakeGemini>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    fake.calls.fetch_add(1, Ordering::SeqCst);
    fake.bodies.lock().unwrap().push(body);
    if let Some(key) = headers.get("x-goog-api-key").and_then(|v| v.to_str().ok()) {
        fake.keys.lock().unwrap().push(key.to_string());
    }
    (fake.status, Json(fake.reply.clone()))
}

fn text_reply(text: &str) -> Value {
    json!({
        "candidates": [{
            "content": { "parts": [{ "text": text }] },
            "finishReason": "STOP"
        }]
    })
}

fn porto_itinerary() -> Value {
    json!({
        "tourName": "Ribeira Bites",
        "summary": "A riverside eating walk.",
        "totalDistance": "2.1 km",
        "stops": [
            {
                "name": "Mercado do Bolhão",
                "description": "Historic market hall.",
                "timeToSpend": "20 minutes",
                "lat": 41.1488,
                "lng": -8.6059
            },
            {
                "name": "Conga",
                "description": "Famous bifanas.",
                "timeToSpend": "25 minutes",
                "lat": 41.1466,
                "lng": -8.6089
            }
        ],
        "directions": [{
            "from": "Mercado do Bolhão",
            "to": "Conga",
            "instructions": "Head south on Rua de Sá da Bandeira.",
            "fromLatLng": { "latitude": 41.1488, "longitude": -8.6059 },
            "toLatLng": { "latitude": 41.1466, "longitude": -8.6089 }
        }]
    })
}

fn config(base_url: String, api_key: Option<&str>, mode: ResponseMode) -> AppConfig {
    AppConfig {
        gemini_api_key: api_key.map(ToString::to_string),
        maps_api_key: Some("maps-test-key".to_string()),
        gemini_base_url: base_url,
        response_mode: mode,
        ..AppConfig::default()
    }
}

fn tour_request(body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/v1/tour")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn read_json(response: axum::response::Response) -> Value {
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&body).unwrap()
}

fn porto_food() -> Value {
    json!({
        "category": "food",
        "location": "Porto",
        "duration": 90,
        "latLng": { "latitude": 41.1496, "longitude": -8.6109 }
    })
}

#[tokio::test]
async fn health_reports_capabilities() {
    let fake = FakeGemini::new(StatusCode::OK, text_reply("{}"));
    let app = build_app(config(fake.spawn().await, Some("real-key"), ResponseMode::Structured))
        .await
        .expect("app should build");

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let parsed = read_json(response).await;
    assert_eq!(parsed["status"], "ok");
    assert_eq!(parsed["capabilities"]["model_configured"], true);
    assert_eq!(parsed["capabilities"]["map_images"], true);
    assert_eq!(parsed["capabilities"]["response_mode"], "structured");
    assert_eq!(parsed["capabilities"]["model"], "gemini-2.5-flash");
    assert_eq!(parsed["metrics"]["tours_requested_total"], 0);
}

#[tokio::test]
async fn structured_tour_comes_back_with_map_images() {
    let fake = FakeGemini::new(
        StatusCode::OK,
        text_reply(&porto_itinerary().to_string()),
    );
    let app = build_app(config(fake.spawn().await, Some("real-key"), ResponseMode::Structured))
        .await
        .unwrap();

    let response = app.oneshot(tour_request(porto_food())).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let parsed = read_json(response).await;
    assert_eq!(parsed["mode"], "structured");
    assert_eq!(parsed["tourName"], "Ribeira Bites");
    assert_eq!(parsed["stops"].as_array().unwrap().len(), 2);

    let image = parsed["stops"][0]["imageUrl"].as_str().unwrap();
    let image = Url::parse(image).unwrap();
    assert_eq!(image.host_str(), Some("maps.googleapis.com"));
    assert!(image
        .query_pairs()
        .any(|(key, value)| key == "key" && value == "maps-test-key"));
    assert!(parsed["directions"][0]["mapUrl"].is_string());

    assert_eq!(fake.calls(), 1);
    assert_eq!(*fake.keys.lock().unwrap(), vec!["real-key".to_string()]);
    let sent = fake.last_body();
    let prompt = sent["contents"][0]["parts"][0]["text"].as_str().unwrap();
    assert!(prompt.contains("Porto"));
    assert!(prompt.contains("90 minutes"));
    assert_eq!(sent["generationConfig"]["responseMimeType"], "application/json");
    assert!(sent.get("tools").is_none());
}

#[tokio::test]
async fn grounded_tour_links_a_walking_route() {
    let fake = FakeGemini::new(
        StatusCode::OK,
        json!({
            "candidates": [{
                "content": { "parts": [{ "text": "## Porto old town\n1. Sé do Porto\n2. Ribeira" }] },
                "groundingMetadata": {
                    "groundingChunks": [
                        { "maps": { "title": "Sé do Porto", "uri": "https://maps.google.com/?cid=1" } },
                        { "maps": { "title": "Ribeira", "uri": "https://maps.google.com/?cid=2" } },
                        { "maps": { "title": "Sé do Porto", "uri": "https://maps.google.com/?cid=1" } }
                    ]
                }
            }]
        }),
    );
    let app = build_app(config(fake.spawn().await, Some("real-key"), ResponseMode::Grounded))
        .await
        .unwrap();

    let response = app.oneshot(tour_request(porto_food())).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let parsed = read_json(response).await;
    assert_eq!(parsed["mode"], "grounded");
    assert_eq!(parsed["groundingChunks"].as_array().unwrap().len(), 3);

    let route = Url::parse(parsed["routeUrl"].as_str().unwrap()).unwrap();
    let pairs = route.query_pairs().into_owned().collect::<Vec<_>>();
    assert!(pairs.contains(&("origin".to_string(), "Sé do Porto".to_string())));
    assert!(pairs.contains(&("destination".to_string(), "Ribeira".to_string())));
    assert!(pairs.contains(&("travelmode".to_string(), "walking".to_string())));
    assert!(!pairs.iter().any(|(key, _)| key == "waypoints"));

    let sent = fake.last_body();
    assert_eq!(sent["tools"], json!([{ "googleMaps": {} }]));
    assert_eq!(
        sent["toolConfig"]["retrievalConfig"]["latLng"]["latitude"],
        41.1496
    );
}

#[tokio::test]
async fn placeholder_key_fails_without_calling_the_model() {
    let fake = FakeGemini::new(StatusCode::OK, text_reply("{}"));
    let app = build_app(config(
        fake.spawn().await,
        Some("PLACEHOLDER_API_KEY"),
        ResponseMode::Structured,
    ))
    .await
    .unwrap();

    let response = app.oneshot(tour_request(porto_food())).await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(read_json(response).await, json!({ "error": GENERIC_FAILURE_MESSAGE }));
    assert_eq!(fake.calls(), 0);
}

#[tokio::test]
async fn invalid_requests_share_the_generic_error() {
    let fake = FakeGemini::new(StatusCode::OK, text_reply("{}"));
    let app = build_app(config(fake.spawn().await, Some("real-key"), ResponseMode::Structured))
        .await
        .unwrap();

    let bad_category = json!({ "category": "karaoke", "location": "Porto", "duration": 60 });
    let bad_duration = json!({ "category": "art", "location": "Porto", "duration": 45 });
    let blank_location = json!({ "category": "art", "location": "   ", "duration": 60 });

    for body in [bad_category, bad_duration, blank_location] {
        let response = app.clone().oneshot(tour_request(body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(read_json(response).await["error"], GENERIC_FAILURE_MESSAGE);
    }

    let not_json = Request::builder()
        .method("POST")
        .uri("/v1/tour")
        .header("content-type", "application/json")
        .body(Body::from("category=food"))
        .unwrap();
    let response = app.oneshot(not_json).await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(read_json(response).await["error"], GENERIC_FAILURE_MESSAGE);

    assert_eq!(fake.calls(), 0);
}

#[tokio::test]
async fn upstream_failure_is_reported_once() {
    let fake = FakeGemini::new(
        StatusCode::SERVICE_UNAVAILABLE,
        json!({ "error": { "code": 503, "message": "overloaded", "status": "UNAVAILABLE" } }),
    );
    let app = build_app(config(fake.spawn().await, Some("real-key"), ResponseMode::Structured))
        .await
        .unwrap();

    let response = app.clone().oneshot(tour_request(porto_food())).await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(read_json(response).await["error"], GENERIC_FAILURE_MESSAGE);
    assert_eq!(fake.calls(), 1);

    let health = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let parsed = read_json(health).await;
    assert_eq!(parsed["metrics"]["upstream_failures_total"], 1);
}

#[tokio::test]
async fn unparsable_structured_reply_is_an_error() {
    let fake = FakeGemini::new(StatusCode::OK, text_reply("Here is your tour: a lovely walk."));
    let app = build_app(config(fake.spawn().await, Some("real-key"), ResponseMode::Structured))
        .await
        .unwrap();

    let response = app.oneshot(tour_request(porto_food())).await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(read_json(response).await["error"], GENERIC_FAILURE_MESSAGE);
}

#[tokio::test]
async fn catalog_is_served() {
    let app = build_app(config(
        "http://127.0.0.1:9/v1beta".to_string(),
        None,
        ResponseMode::Structured,
    ))
    .await
    .unwrap();

    let response = app
        .oneshot(Request::builder().uri("/v1/catalog").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let parsed = read_json(response).await;
    let slugs = parsed["categories"]
        .as_array()
        .unwrap()
        .iter()
        .map(|category| category["slug"].as_str().unwrap().to_string())
        .collect::<Vec<_>>();
    assert!(slugs.contains(&"hidden_gems".to_string()));
}
