//! Persistence behaviour of the file-backed prompt store across
//! separate store instances over the same directory.

use predikant::{JsonPromptStore, NewPromptVersion, PromptRepository};

fn version(text: &str, score: f64) -> NewPromptVersion {
    NewPromptVersion {
        system_prompt: text.to_string(),
        score,
        scripture_text: "Johannes 3:16".to_string(),
        iteration: 1,
        tokens_used: 1234,
        parent_version: None,
        improvements: None,
    }
}

#[tokio::test]
async fn test_sole_entry_roundtrips_byte_identical() {
    let dir = tempfile::tempdir().unwrap();
    let prompt_text = "Je bent Eberhard Jüngel.\n\nSTRUCTUUR:\n1. Opening — \"Gemeente!\"\n";

    let stored = {
        let store = JsonPromptStore::new(dir.path());
        store.persist(version(prompt_text, 0.77)).await.unwrap()
    };

    // A fresh instance over the same directory serves the same record
    let reopened = JsonPromptStore::new(dir.path());
    let best = reopened.current_best().await.unwrap().unwrap();
    assert_eq!(best.system_prompt, prompt_text);
    assert_eq!(best.version, stored.version);
    assert_eq!(best.version, 1);
}

#[tokio::test]
async fn test_highest_scoring_entry_wins_retrieval() {
    let dir = tempfile::tempdir().unwrap();
    let store = JsonPromptStore::new(dir.path());

    store.persist(version("eerste prompt", 0.6)).await.unwrap();
    store.persist(version("beste prompt", 0.9)).await.unwrap();
    store.persist(version("latere mindere prompt", 0.7)).await.unwrap();

    let best = store.current_best().await.unwrap().unwrap();
    assert_eq!(best.system_prompt, "beste prompt");
    assert_eq!(best.version, 2);
}

#[tokio::test]
async fn test_versions_never_reused_across_reloads() {
    let dir = tempfile::tempdir().unwrap();

    for expected_version in 1..=4_u32 {
        // New instance per persist simulates separate process runs
        let store = JsonPromptStore::new(dir.path());
        let stored = store
            .persist(version("prompt", 0.1 * f64::from(expected_version)))
            .await
            .unwrap();
        assert_eq!(stored.version, expected_version);
    }

    let store = JsonPromptStore::new(dir.path());
    let history = store.history().await.unwrap();
    let versions: Vec<u32> = history.iter().map(|p| p.version).collect();
    assert_eq!(versions, vec![1, 2, 3, 4]);

    let stats = store.stats().await.unwrap();
    assert_eq!(stats.total_versions, 4);
    assert_eq!(stats.latest_version, 4);
    assert!((stats.score_improvement - 0.3).abs() < 1e-12);
}
