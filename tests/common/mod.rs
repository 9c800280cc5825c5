//! Common test utilities for integration tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use anyhow::{anyhow, Result};
use async_trait::async_trait;

use predikant::{Completion, CompletionClient, CompletionRequest};

/// One scripted completion outcome.
pub enum Scripted {
    /// Respond with this text and fixed token counts.
    Text(String),
    /// Fail the request terminally.
    Error(String),
}

/// Completion client that replays a fixed script of responses.
///
/// The controller alternates generation and judgment calls, so scripts
/// interleave sermon texts and judge JSON payloads in call order.
pub struct ScriptedClient {
    responses: Mutex<VecDeque<Scripted>>,
    calls: AtomicU32,
}

impl ScriptedClient {
    pub fn new(responses: Vec<Scripted>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            calls: AtomicU32::new(0),
        }
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CompletionClient for ScriptedClient {
    async fn complete(&self, _request: CompletionRequest) -> Result<Completion> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.responses.lock().unwrap().pop_front() {
            Some(Scripted::Text(text)) => Ok(Completion {
                text,
                input_tokens: 100,
                output_tokens: 200,
            }),
            Some(Scripted::Error(message)) => Err(anyhow!(message)),
            None => panic!("scripted client exhausted its responses"),
        }
    }
}

/// A judge verdict payload with every dimension at `dimension` (0-10)
/// and the given discipline score.
pub fn judge_json(dimension: f64, discipline: f64) -> String {
    format!(
        r#"{{
            "show_dont_tell_discipline": {{"score": {discipline}, "feedback": ""}},
            "theological_score": {dimension},
            "metaphorical_score": {dimension},
            "transformation_score": {dimension},
            "rhetorical_score": {dimension},
            "coherence_score": {dimension},
            "language_score": {dimension},
            "flow_score": {dimension},
            "humor_score": {dimension},
            "length_score": {dimension},
            "feedback_details": {{
                "theological": "De kern ontbreekt nog.",
                "metaphorical": "Gebruik meer verrassende beelden.",
                "transformation": "N/A",
                "rhetorical": "N/A",
                "coherence": "N/A",
                "language_and_flow": "N/A",
                "humor": "N/A"
            }},
            "overall_assessment": "De preek is te kort en mist diepgang."
        }}"#
    )
}
