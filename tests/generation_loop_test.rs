//! End-to-end iteration-loop scenarios against a scripted completion
//! client and an in-memory prompt store.

mod common;

use std::sync::Arc;

use chrono::Utc;
use rand::rngs::StdRng;
use rand::SeedableRng;

use common::{judge_json, Scripted, ScriptedClient};
use predikant::services::stylometry;
use predikant::{
    Config, GenerationTask, InMemoryPromptStore, PromptRepository, RunOutcome, ScoreBreakdown,
    SermonGenerator, StoredPrompt,
};

const SERMON_TEXT: &str =
    "Gemeente! Wat betekent dit woord vandaag voor ons? Niet dat wij God vinden, maar dat God \
     ons vindt. Dat is de omkering waar alles om draait. En toch blijven wij zoeken, alsof het \
     heil een prestatie zou zijn.";

/// Overall score the controller computes for `SERMON_TEXT` given a
/// uniform judge dimension (0-10 scale) and a clean discipline rating.
fn expected_overall(dimension: f64) -> f64 {
    let analysis = stylometry::analyze(SERMON_TEXT);
    let stylometric = stylometry::compute_score(&analysis, &Config::default().stylometry);
    ScoreBreakdown::blend(stylometric.score, dimension / 10.0, 1.0)
}

fn task(max_iterations: u32, target_score: f64) -> GenerationTask {
    GenerationTask {
        scripture_text: "Jakobus 5:13-18".to_string(),
        scripture_context: "Het gelovige gebed zal de zieke redden.".to_string(),
        reference_sermons: vec![],
        max_iterations,
        target_score,
    }
}

fn generator(
    client: Arc<ScriptedClient>,
    store: Arc<InMemoryPromptStore>,
) -> SermonGenerator<StdRng> {
    SermonGenerator::new(client, store, Config::default(), StdRng::seed_from_u64(1))
}

#[tokio::test]
async fn test_run_terminates_early_when_target_met() {
    // Iteration 1 scores low, iteration 2 scores high enough
    let client = Arc::new(ScriptedClient::new(vec![
        Scripted::Text(SERMON_TEXT.to_string()),
        Scripted::Text(judge_json(2.0, 10.0)),
        Scripted::Text(SERMON_TEXT.to_string()),
        Scripted::Text(judge_json(10.0, 10.0)),
    ]));
    let store = Arc::new(InMemoryPromptStore::new());

    let target = expected_overall(10.0) - 0.01;
    assert!(expected_overall(2.0) < target, "iteration 1 must miss the target");

    let report = generator(Arc::clone(&client), Arc::clone(&store))
        .run(&task(5, target))
        .await
        .unwrap();

    assert_eq!(report.outcome, RunOutcome::TargetMet);
    assert_eq!(report.best.iteration, 2);
    assert!(report.best.score.overall >= target);
    // Two generation calls plus two judge calls, nothing further
    assert_eq!(client.calls(), 4);

    // The winning prompt is persisted with no parent (baseline run)
    let stored = report.stored.expect("prompt should be persisted");
    assert_eq!(stored.version, 1);
    assert_eq!(stored.parent_version, None);
    assert_eq!(store.history().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_exhausted_run_returns_numerically_best_attempt() {
    // Five iterations, all below target; iteration 2 is the best
    let dimensions = [2.0, 6.0, 4.0, 3.0, 5.0];
    let mut script = Vec::new();
    for dimension in dimensions {
        script.push(Scripted::Text(SERMON_TEXT.to_string()));
        script.push(Scripted::Text(judge_json(dimension, 10.0)));
    }
    let client = Arc::new(ScriptedClient::new(script));
    let store = Arc::new(InMemoryPromptStore::new());

    let report = generator(Arc::clone(&client), Arc::clone(&store))
        .run(&task(5, 0.99))
        .await
        .unwrap();

    assert_eq!(report.outcome, RunOutcome::IterationsExhausted);
    assert_eq!(report.best.iteration, 2);
    assert!((report.best.score.overall - expected_overall(6.0)).abs() < 1e-9);
    assert_eq!(client.calls(), 10);

    // Cumulative token counters cover the generations up to the best attempt
    assert_eq!(report.best.input_tokens, 200);
    assert_eq!(report.best.output_tokens, 400);

    // The best prompt is persisted even though the target was missed
    let stored = report.stored.expect("prompt should be persisted");
    let best = store.current_best().await.unwrap().unwrap();
    assert_eq!(best.version, stored.version);
    assert!((best.score - report.best.score.overall).abs() < 1e-12);
}

#[tokio::test]
async fn test_run_evolves_from_stored_baseline() {
    let store = Arc::new(InMemoryPromptStore::new());
    store
        .seed(StoredPrompt {
            system_prompt: "Eerder geëvolueerd prompt.\n\nSTRUCTUUR:\n1. Opening".to_string(),
            score: 0.5,
            timestamp: Utc::now(),
            scripture_text: "Matteüs 5:9".to_string(),
            iteration: 3,
            tokens_used: 999,
            version: 1,
            parent_version: None,
            improvements: None,
        })
        .await;

    let client = Arc::new(ScriptedClient::new(vec![
        Scripted::Text(SERMON_TEXT.to_string()),
        Scripted::Text(judge_json(10.0, 10.0)),
    ]));

    let target = expected_overall(10.0) - 0.01;
    let report = generator(Arc::clone(&client), Arc::clone(&store))
        .run(&task(5, target))
        .await
        .unwrap();

    // The attempt descends from the stored baseline
    assert_eq!(report.best.prompt_version, 1);
    assert!(report.best.system_prompt.starts_with("Eerder geëvolueerd prompt."));

    let stored = report.stored.unwrap();
    assert_eq!(stored.version, 2);
    assert_eq!(stored.parent_version, Some(1));
}

#[tokio::test]
async fn test_generation_error_aborts_run_without_persistence() {
    let client = Arc::new(ScriptedClient::new(vec![Scripted::Error(
        "service exploded".to_string(),
    )]));
    let store = Arc::new(InMemoryPromptStore::new());

    let result = generator(Arc::clone(&client), Arc::clone(&store))
        .run(&task(5, 0.85))
        .await;

    assert!(result.is_err());
    assert!(store.history().await.unwrap().is_empty());
    assert!(store.current_best().await.unwrap().is_none());
}

#[tokio::test]
async fn test_judgment_error_aborts_run_without_persistence() {
    let client = Arc::new(ScriptedClient::new(vec![
        Scripted::Text(SERMON_TEXT.to_string()),
        Scripted::Error("judge unavailable".to_string()),
    ]));
    let store = Arc::new(InMemoryPromptStore::new());

    let result = generator(Arc::clone(&client), Arc::clone(&store))
        .run(&task(5, 0.85))
        .await;

    assert!(result.is_err());
    assert!(store.history().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_unparseable_judge_response_degrades_instead_of_aborting() {
    // The judge returns prose instead of JSON; the run continues on
    // midpoint sub-scores and still persists at exhaustion
    let client = Arc::new(ScriptedClient::new(vec![
        Scripted::Text(SERMON_TEXT.to_string()),
        Scripted::Text("vandaag helaas geen JSON".to_string()),
    ]));
    let store = Arc::new(InMemoryPromptStore::new());

    let report = generator(Arc::clone(&client), Arc::clone(&store))
        .run(&task(1, 0.99))
        .await
        .unwrap();

    assert_eq!(report.outcome, RunOutcome::IterationsExhausted);
    assert!((report.best.score.qualitative - 0.5).abs() < 1e-12);
    assert!((report.best.score.discipline - 0.5).abs() < f64::EPSILON);
    assert!(report.stored.is_some());
}

#[tokio::test]
async fn test_disabled_persistence_stores_nothing() {
    let client = Arc::new(ScriptedClient::new(vec![
        Scripted::Text(SERMON_TEXT.to_string()),
        Scripted::Text(judge_json(10.0, 10.0)),
    ]));
    let store = Arc::new(InMemoryPromptStore::new());

    let report = generator(Arc::clone(&client), Arc::clone(&store))
        .persist_best(false)
        .run(&task(1, 0.0))
        .await
        .unwrap();

    assert_eq!(report.outcome, RunOutcome::TargetMet);
    assert!(report.stored.is_none());
    assert!(store.history().await.unwrap().is_empty());
}
