// SPDX-FileCopyrightText: 2026 Ecoroute Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Full-stack checks: TOML config, Electricity Maps and Ollama over HTTP
//! (both mocked), the routing engine, and the gateway router.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use ecoroute_core::ModelBackend;
use ecoroute_gateway::{GatewaySettings, GatewayState, router};
use ecoroute_ollama::OllamaBackend;
use ecoroute_router::RoutingEngine;
use serde_json::{Value, json};
use tower::ServiceExt;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

struct Stack {
    carbon_api: MockServer,
    ollama: MockServer,
    state: GatewayState,
}

async fn mount_intensity(server: &MockServer, value: f64) {
    Mock::given(method("GET"))
        .and(path("/carbon-intensity/latest"))
        .and(query_param("zone", "IN-NO"))
        .and(header("auth-token", "e2e-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "zone": "IN-NO",
            "carbonIntensity": value,
            "updatedAt": "2026-03-01T12:00:00.000Z",
            "isEstimated": false
        })))
        .mount(server)
        .await;
}

async fn mount_loads(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .and(body_partial_json(json!({"prompt": ""})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "response": "",
            "done": true,
            "done_reason": "load"
        })))
        .mount(server)
        .await;
}

async fn mount_answer(server: &MockServer, tag: &str, answer: &str) {
    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .and(body_partial_json(json!({"model": tag, "raw": true})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "model": tag,
            "response": format!(" {answer}\n"),
            "done": true
        })))
        .mount(server)
        .await;
}

async fn stack(intensity: f64) -> Stack {
    let carbon_api = MockServer::start().await;
    let ollama = MockServer::start().await;
    mount_intensity(&carbon_api, intensity).await;
    mount_loads(&ollama).await;

    let toml = format!(
        r#"
[carbon]
provider = "electricity_maps"
api_key = "e2e-token"
api_base_url = "{carbon}"

[ollama]
base_url = "{ollama}"
"#,
        carbon = carbon_api.uri(),
        ollama = ollama.uri(),
    );
    let config = ecoroute_config::load_and_validate_str(&toml).unwrap();

    let backend: Arc<dyn ModelBackend> = Arc::new(OllamaBackend::new(&config.ollama).unwrap());
    let carbon = ecoroute_carbon::build_reader(&config.carbon).unwrap();
    let engine = RoutingEngine::start(&config, backend).await.unwrap();
    let state = GatewayState::new(Arc::new(engine), carbon, GatewaySettings::from(&config));

    Stack {
        carbon_api,
        ollama,
        state,
    }
}

async fn ask(state: &GatewayState, body: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri("/api/ask")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    let response = router(state.clone()).oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

#[tokio::test]
async fn clean_grid_sends_code_to_code_model() {
    let s = stack(80.0).await;
    mount_answer(&s.ollama, "codellama:7b-instruct", "fn parse() {}").await;

    let (status, body) = ask(
        &s.state,
        json!({"text": "write a rust function to parse json"}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["model"], "codellama");
    assert_eq!(body["response"], "fn parse() {}");
    assert_eq!(body["carbon_intensity"], 80.0);
    assert_eq!(body["carbon_status"], "live");
    assert_eq!(body["selection"]["tier"], "low");
}

#[tokio::test]
async fn dirty_grid_stays_on_baseline() {
    let s = stack(520.0).await;
    mount_answer(&s.ollama, "tinyllama:1.1b", "Hello!").await;

    let (status, body) = ask(&s.state, json!({"text": "write a rust function"})).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["model"], "tinyllama");
    assert_eq!(body["selection"]["tier"], "high");
    assert_eq!(body["response"], "Hello!");
}

#[tokio::test]
async fn missing_code_model_falls_back_to_baseline_answer() {
    let s = stack(80.0).await;
    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .and(body_partial_json(json!({"model": "codellama:7b-instruct", "raw": true})))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "error": "model 'codellama:7b-instruct' not found"
        })))
        .mount(&s.ollama)
        .await;
    mount_answer(&s.ollama, "tinyllama:1.1b", "Try a loop.").await;

    let (status, body) = ask(&s.state, json!({"text": "debug this python code"})).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["selected_model"], "codellama");
    assert_eq!(body["model"], "tinyllama");
    assert_eq!(body["fell_back"], true);
    assert_eq!(body["response"], "Try a loop.");
}

#[tokio::test]
async fn carbon_reading_is_cached_across_requests() {
    let s = stack(80.0).await;
    mount_answer(&s.ollama, "codellama:7b-instruct", "ok").await;

    for _ in 0..3 {
        let (status, _) = ask(&s.state, json!({"text": "write python code"})).await;
        assert_eq!(status, StatusCode::OK);
    }

    let fetches = s.carbon_api.received_requests().await.unwrap();
    assert_eq!(fetches.len(), 1);
}
