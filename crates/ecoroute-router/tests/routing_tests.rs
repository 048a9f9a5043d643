// SPDX-FileCopyrightText: 2026 Ecoroute Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end routing through the public engine API with a mock backend.

use std::sync::Arc;
use std::time::Duration;

use ecoroute_core::{CarbonReading, CarbonTier, ReadingSource, SelectionStage, TaskKind};
use ecoroute_router::RoutingEngine;
use ecoroute_test_utils::{MockBackend, test_config};

fn reading(value: f64) -> CarbonReading {
    CarbonReading::new(value, ReadingSource::Mock)
}

async fn started() -> (Arc<MockBackend>, Arc<RoutingEngine>) {
    let backend = Arc::new(MockBackend::new());
    let engine = RoutingEngine::start(&test_config(), backend.clone())
        .await
        .expect("baseline loads");
    (backend, Arc::new(engine))
}

#[tokio::test]
async fn python_question_on_clean_grid_routes_to_code_model() {
    let (_, engine) = started().await;
    let selection = engine
        .select("explain this python function", &reading(80.0), None)
        .await
        .unwrap();

    assert_eq!(selection.model_id, "codellama");
    assert_eq!(selection.tier, CarbonTier::Low);
    assert_eq!(selection.stage, SelectionStage::Code);
    assert!(selection.profile.is_code);
    assert!(selection.profile.is_complex);
}

#[tokio::test]
async fn dirty_grid_keeps_everything_on_baseline() {
    let (backend, engine) = started().await;
    for query in [
        "hello",
        "write a python sorting algorithm",
        "analyze and compare these two detailed proposals",
    ] {
        let selection = engine.select(query, &reading(520.0), None).await.unwrap();
        assert_eq!(selection.model_id, "tinyllama", "query: {query}");
        assert_eq!(selection.tier, CarbonTier::High);
    }
    assert_eq!(backend.total_loads(), 1);
}

#[tokio::test]
async fn long_prose_with_code_substrings_stays_on_baseline() {
    let (backend, engine) = started().await;
    let selection = engine
        .select(
            "tell me a story about the terror that fixed the prefix of an old village \
             beside two quiet rivers under northern mountains long ago",
            &reading(150.0),
            None,
        )
        .await
        .unwrap();

    assert_eq!(selection.tier, CarbonTier::Medium);
    assert!(selection.profile.is_complex);
    assert_eq!(selection.profile.capability_hint, TaskKind::General);
    assert_eq!(selection.model_id, "tinyllama");
    assert_eq!(backend.load_count("codellama"), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_code_queries_share_one_load() {
    let (backend, engine) = started().await;
    backend.set_load_latency("codellama", Duration::from_millis(50));

    let mut handles = Vec::new();
    for i in 0..12 {
        let engine = engine.clone();
        handles.push(tokio::spawn(async move {
            engine
                .select(&format!("debug rust snippet {i}"), &reading(150.0), None)
                .await
        }));
    }
    for handle in handles {
        let selection = handle.await.unwrap().unwrap();
        assert_eq!(selection.model_id, "codellama");
    }

    assert_eq!(backend.load_count("codellama"), 1);
    assert_eq!(engine.ledger().len(), 12);
}

#[tokio::test(start_paused = true)]
async fn timed_out_code_load_can_succeed_later() {
    let (backend, engine) = started().await;
    backend.set_load_latency("codellama", Duration::from_secs(120));

    let first = engine
        .select("fix my java code", &reading(50.0), None)
        .await
        .unwrap();
    assert_eq!(first.model_id, "tinyllama");
    assert!(first.fallback_occurred);

    backend.set_load_latency("codellama", Duration::from_millis(10));
    let second = engine
        .select("fix my java code", &reading(50.0), None)
        .await
        .unwrap();
    assert_eq!(second.model_id, "codellama");
    assert!(!second.fallback_occurred);
    assert_eq!(backend.load_count("codellama"), 2);
}

#[tokio::test]
async fn ledger_tracks_history_and_averages() {
    let (_, engine) = started().await;
    engine.select("hello", &reading(50.0), None).await.unwrap();
    engine
        .select("write rust code", &reading(50.0), None)
        .await
        .unwrap();

    let history = engine.ledger().history(10);
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].chosen_model_id, "tinyllama");
    assert_eq!(history[1].chosen_model_id, "codellama");
    assert_eq!(history[1].profile.capability_hint, TaskKind::Code);

    let metrics = engine.ledger().metrics();
    assert_eq!(metrics.total_requests, 2);
    // tinyllama saves 95%, codellama nothing.
    assert!((metrics.average_carbon_savings - 0.475).abs() < 1e-9);
    assert!((metrics.average_performance_score - 0.825).abs() < 1e-9);
}

#[tokio::test]
async fn ask_falls_back_once_when_selected_model_cannot_generate() {
    let (backend, engine) = started().await;
    backend.fail_generate("codellama");

    let answer = engine
        .ask("implement a binary tree in rust", &reading(40.0), None, 128)
        .await
        .unwrap();

    assert_eq!(answer.selection.model_id, "codellama");
    assert_eq!(answer.generation.model_id, "tinyllama");
    assert!(answer.generation.fell_back);
    assert_eq!(backend.generate_count("codellama"), 1);
    assert_eq!(backend.generate_count("tinyllama"), 1);
}

#[tokio::test]
async fn selection_serializes_for_clients() {
    let (_, engine) = started().await;
    let selection = engine.select("hello", &reading(120.0), None).await.unwrap();
    let json = serde_json::to_value(&selection).unwrap();

    assert_eq!(json["model_id"], "tinyllama");
    assert_eq!(json["tier"], "medium");
    assert_eq!(json["stage"], "baseline");
    assert_eq!(json["carbon_source"], "mock");
    assert_eq!(json["profile"]["capability_hint"], "general");
}
