//! Iterative sermon generation with prompt evolution.
//!
//! The controller drives bounded generate-score-evolve iterations for
//! one task: generate a candidate against the current instruction
//! prompt, score it, and either stop on target or fold the feedback
//! into an evolved prompt for the next attempt. The best prompt of the
//! run is persisted at the terminal state only.

use std::cmp::Ordering;
use std::sync::Arc;

use anyhow::{Context, Result};
use rand::seq::SliceRandom;
use rand::Rng;
use tracing::{debug, info};

use crate::domain::models::attempt::{CandidateAttempt, GenerationTask, Solution};
use crate::domain::models::config::Config;
use crate::domain::models::prompt::{NewPromptVersion, StoredPrompt};
use crate::domain::ports::{CompletionClient, CompletionRequest, PromptRepository};
use crate::infrastructure::artifacts::ArtifactWriter;
use crate::services::evolution::{evolve_prompt, extract_learnings};
use crate::services::judgment::SermonScorer;

/// Baseline instruction payload, used when the store holds no prompts yet.
pub const BASE_SYSTEM_PROMPT: &str = include_str!("../../prompts/base_system.txt");

const FEEDBACK_HEADER: &str = "\n\nFEEDBACK OP EERDERE POGINGEN:\n\
    De volgende eerdere pogingen zijn beoordeeld. Leer van de feedback om een betere preek te \
    schrijven.\n\n";
const FEEDBACK_FOOTER: &str = "\nVerbeter deze punten in je nieuwe preek.";

/// Terminal state of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// A candidate reached the task's target score.
    TargetMet,
    /// The iteration budget ran out; the best attempt is returned anyway.
    IterationsExhausted,
}

/// Result of one completed run.
#[derive(Debug)]
pub struct RunReport {
    /// Best candidate found across the run
    pub best: CandidateAttempt,

    /// How the run terminated
    pub outcome: RunOutcome,

    /// The prompt version persisted at run end, if persistence was enabled
    pub stored: Option<StoredPrompt>,
}

/// Iteration controller for sermon generation.
///
/// Owns its candidate attempts and solutions for the duration of a run;
/// prompts are only ever read and written through the injected
/// [`PromptRepository`]. The random source is injected so runs can be
/// made reproducible with a seed.
pub struct SermonGenerator<R: Rng + Send> {
    client: Arc<dyn CompletionClient>,
    scorer: SermonScorer,
    store: Arc<dyn PromptRepository>,
    artifacts: Option<ArtifactWriter>,
    config: Config,
    rng: R,
    persist_best: bool,
}

impl<R: Rng + Send> SermonGenerator<R> {
    pub fn new(
        client: Arc<dyn CompletionClient>,
        store: Arc<dyn PromptRepository>,
        config: Config,
        rng: R,
    ) -> Self {
        let scorer = SermonScorer::new(Arc::clone(&client), &config);
        Self {
            client,
            scorer,
            store,
            artifacts: None,
            config,
            rng,
            persist_best: true,
        }
    }

    /// Write per-iteration artifacts to disk.
    pub fn with_artifacts(mut self, writer: ArtifactWriter) -> Self {
        self.artifacts = Some(writer);
        self
    }

    /// Enable or disable persisting the best prompt at run end.
    pub fn persist_best(mut self, enabled: bool) -> Self {
        self.persist_best = enabled;
        self
    }

    /// Run the full generate-score-evolve loop for one task.
    ///
    /// Returns the best candidate found, the terminal state, and the
    /// persisted prompt version. Any unrecovered completion-client error
    /// aborts the run without persisting anything.
    pub async fn run(&mut self, task: &GenerationTask) -> Result<RunReport> {
        let (base_prompt, parent_version) = match self.store.current_best().await? {
            Some(best) => {
                info!(
                    version = best.version,
                    score = best.score,
                    "starting from stored prompt"
                );
                (best.system_prompt, best.version)
            }
            None => {
                info!("no stored prompts, starting from baseline");
                (BASE_SYSTEM_PROMPT.to_string(), 0)
            }
        };

        let mut solutions: Vec<Solution> = Vec::new();
        let mut all_learnings: Vec<String> = Vec::new();
        let mut best: Option<CandidateAttempt> = None;
        let mut best_score = -1.0_f64;
        let mut total_input_tokens = 0_u64;
        let mut total_output_tokens = 0_u64;
        let mut current_prompt = base_prompt.clone();

        for iteration in 1..=task.max_iterations {
            info!(iteration, max = task.max_iterations, "generating candidate");

            let system_prompt = self.prompt_with_feedback(&current_prompt, &solutions);
            let user = self.build_user_message(task);

            let completion = self
                .client
                .complete(CompletionRequest {
                    model: self.config.models.generator.clone(),
                    system: system_prompt.clone(),
                    user,
                    temperature: self.config.generator.temperature,
                    max_tokens: self.config.generator.max_tokens,
                })
                .await
                .context("sermon generation request failed")?;
            total_input_tokens += completion.input_tokens;
            total_output_tokens += completion.output_tokens;

            let score = self
                .scorer
                .score(&completion.text, &task.scripture_text)
                .await
                .context("sermon judgment request failed")?;

            info!(
                iteration,
                overall = score.overall,
                stylometric = score.stylometric,
                qualitative = score.qualitative,
                discipline = score.discipline,
                chars = completion.text.chars().count(),
                "candidate scored"
            );

            let attempt = CandidateAttempt {
                text: completion.text,
                score,
                iteration,
                input_tokens: total_input_tokens,
                output_tokens: total_output_tokens,
                system_prompt,
                prompt_version: parent_version,
            };

            let is_new_best = attempt.score.overall > best_score;
            if is_new_best {
                best_score = attempt.score.overall;
                best = Some(attempt.clone());
            }

            if let Some(writer) = &self.artifacts {
                writer.write_iteration(&attempt, is_new_best).await?;
            }

            if attempt.score.overall >= task.target_score {
                info!(
                    iteration,
                    target = task.target_score,
                    "target score reached"
                );
                let stored = self
                    .persist_prompt(task, &attempt, &all_learnings, parent_version)
                    .await?;
                return Ok(RunReport {
                    best: attempt,
                    outcome: RunOutcome::TargetMet,
                    stored,
                });
            }

            // Below target: fold this attempt into the feedback loop
            let feedback = attempt.score.combined_feedback();
            let new_learnings = extract_learnings(&feedback, attempt.score.overall);
            solutions.push(Solution {
                sermon: attempt.text,
                feedback,
                score: attempt.score.overall,
            });

            if !new_learnings.is_empty() {
                all_learnings.extend(new_learnings);
                current_prompt = evolve_prompt(&base_prompt, &all_learnings);
                info!(
                    learnings = all_learnings.len(),
                    "prompt evolved with accumulated learnings"
                );
            }
        }

        let best = best.context("run produced no candidate attempts")?;
        info!(
            best_score = best.score.overall,
            iteration = best.iteration,
            "iteration budget exhausted"
        );

        let stored = self
            .persist_prompt(task, &best, &all_learnings, parent_version)
            .await?;
        Ok(RunReport {
            best,
            outcome: RunOutcome::IterationsExhausted,
            stored,
        })
    }

    async fn persist_prompt(
        &self,
        task: &GenerationTask,
        attempt: &CandidateAttempt,
        all_learnings: &[String],
        parent_version: u32,
    ) -> Result<Option<StoredPrompt>> {
        if !self.persist_best {
            return Ok(None);
        }

        let stored = self
            .store
            .persist(NewPromptVersion {
                system_prompt: attempt.system_prompt.clone(),
                score: attempt.score.overall,
                scripture_text: task.scripture_text.clone(),
                iteration: attempt.iteration,
                tokens_used: attempt.input_tokens + attempt.output_tokens,
                parent_version: (parent_version > 0).then_some(parent_version),
                improvements: (!all_learnings.is_empty()).then(|| all_learnings.to_vec()),
            })
            .await
            .context("failed to persist prompt version")?;
        info!(version = stored.version, "prompt version persisted");
        Ok(Some(stored))
    }

    /// Instruction prompt for this iteration: the current prompt plus an
    /// optional feedback block drawn from prior solutions.
    fn prompt_with_feedback(&mut self, current_prompt: &str, solutions: &[Solution]) -> String {
        match self.feedback_block(solutions) {
            Some(block) => format!("{current_prompt}{block}"),
            None => current_prompt.to_string(),
        }
    }

    /// Feedback block over a sampled subset of the highest-scoring prior
    /// solutions: rank, keep the top few, then include each independently
    /// with the configured probability.
    fn feedback_block(&mut self, solutions: &[Solution]) -> Option<String> {
        if solutions.is_empty() {
            return None;
        }

        let mut ranked: Vec<&Solution> = solutions.iter().collect();
        ranked.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
        ranked.truncate(self.config.iteration.max_solutions_in_feedback);

        let probability = self.config.iteration.selection_probability;
        let selected: Vec<&Solution> = ranked
            .into_iter()
            .filter(|_| self.rng.gen::<f64>() < probability)
            .collect();
        if selected.is_empty() {
            return None;
        }

        let blocks = selected
            .iter()
            .enumerate()
            .map(|(i, solution)| {
                format!(
                    "--- Poging {} (score: {:.2}) ---\nFeedback: {}\n",
                    i + 1,
                    solution.score,
                    solution.feedback
                )
            })
            .collect::<Vec<_>>()
            .join("\n");

        debug!(included = selected.len(), "feedback block assembled");
        Some(format!("{FEEDBACK_HEADER}{blocks}{FEEDBACK_FOOTER}"))
    }

    fn build_user_message(&mut self, task: &GenerationTask) -> String {
        let examples = self.examples_block(&task.reference_sermons);
        format!(
            "Schrijf een preek over de volgende Bijbeltekst:\n\nBIJBELTEKST: {}\n\nCONTEXT: {}\n\
             {examples}\n\nSchrijf nu een volledige Jüngel-preek over deze tekst. Zorg dat de \
             preek minimaal 10.000 karakters is.",
            task.scripture_text, task.scripture_context
        )
    }

    /// Randomly sampled reference fragments, each a fixed character
    /// window with an ellipsis when the source continues past it.
    fn examples_block(&mut self, reference_sermons: &[String]) -> String {
        if reference_sermons.is_empty() {
            return String::new();
        }

        let count = self.config.examples.count.min(reference_sermons.len());
        let sampled: Vec<&String> = reference_sermons
            .choose_multiple(&mut self.rng, count)
            .collect();

        let mut block =
            String::from("\n\nVOORBEELDEN VAN JÜNGEL-STIJL (ter inspiratie, niet om te kopiëren):\n");
        for (i, sermon) in sampled.iter().enumerate() {
            let (fragment, truncated) = char_window(
                sermon,
                self.config.examples.fragment_start,
                self.config.examples.fragment_length,
            );
            block.push_str(&format!(
                "\n--- Voorbeeld {} ---\n{}{}\n",
                i + 1,
                fragment,
                if truncated { "..." } else { "" }
            ));
        }
        block
    }
}

/// Character-based window `[start, start + len)` into `text`, plus
/// whether the text continues past the window.
fn char_window(text: &str, start: usize, len: usize) -> (String, bool) {
    let fragment: String = text.chars().skip(start).take(len).collect();
    let truncated = text.chars().count() > start + len;
    (fragment, truncated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::Completion;
    use crate::infrastructure::store::memory::InMemoryPromptStore;
    use async_trait::async_trait;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    struct StubClient;

    #[async_trait]
    impl CompletionClient for StubClient {
        async fn complete(&self, _request: CompletionRequest) -> Result<Completion> {
            Ok(Completion {
                text: String::new(),
                input_tokens: 0,
                output_tokens: 0,
            })
        }
    }

    fn generator(seed: u64) -> SermonGenerator<StdRng> {
        SermonGenerator::new(
            Arc::new(StubClient),
            Arc::new(InMemoryPromptStore::new()),
            Config::default(),
            StdRng::seed_from_u64(seed),
        )
    }

    fn solution(score: f64) -> Solution {
        Solution {
            sermon: "preek".to_string(),
            feedback: format!("feedback bij score {score:.2}"),
            score,
        }
    }

    #[test]
    fn test_char_window_plain() {
        let (fragment, truncated) = char_window("abcdefghij", 2, 3);
        assert_eq!(fragment, "cde");
        assert!(truncated);
    }

    #[test]
    fn test_char_window_to_end_is_not_truncated() {
        let (fragment, truncated) = char_window("abcdef", 2, 10);
        assert_eq!(fragment, "cdef");
        assert!(!truncated);
    }

    #[test]
    fn test_char_window_is_character_based() {
        // Multibyte text must be windowed by characters, not bytes
        let (fragment, truncated) = char_window("Jüngels geheim", 0, 7);
        assert_eq!(fragment, "Jüngels");
        assert!(truncated);
    }

    #[test]
    fn test_feedback_block_empty_solutions() {
        let mut generator = generator(7);
        assert!(generator.feedback_block(&[]).is_none());
    }

    #[test]
    fn test_feedback_block_ranks_best_first() {
        let mut generator = generator(7);
        // Probability 1.0 removes sampling noise
        generator.config.iteration.selection_probability = 1.0;

        let solutions = vec![solution(0.3), solution(0.9), solution(0.6)];
        let block = generator.feedback_block(&solutions).unwrap();

        let best = block.find("score: 0.90").unwrap();
        let mid = block.find("score: 0.60").unwrap();
        let worst = block.find("score: 0.30").unwrap();
        assert!(best < mid && mid < worst);
    }

    #[test]
    fn test_feedback_block_caps_at_configured_maximum() {
        let mut generator = generator(7);
        generator.config.iteration.selection_probability = 1.0;
        generator.config.iteration.max_solutions_in_feedback = 2;

        let solutions = vec![solution(0.1), solution(0.2), solution(0.3), solution(0.4)];
        let block = generator.feedback_block(&solutions).unwrap();
        assert_eq!(block.matches("--- Poging").count(), 2);
        assert!(!block.contains("score: 0.10"));
    }

    #[test]
    fn test_feedback_block_zero_probability_selects_nothing() {
        let mut generator = generator(7);
        generator.config.iteration.selection_probability = 0.0;
        assert!(generator.feedback_block(&[solution(0.5)]).is_none());
    }

    #[test]
    fn test_prompt_with_feedback_appends_block() {
        let mut generator = generator(7);
        generator.config.iteration.selection_probability = 1.0;

        let with = generator.prompt_with_feedback("BASIS", &[solution(0.5)]);
        assert!(with.starts_with("BASIS"));
        assert!(with.contains("FEEDBACK OP EERDERE POGINGEN"));
        assert!(with.ends_with("Verbeter deze punten in je nieuwe preek."));

        let without = generator.prompt_with_feedback("BASIS", &[]);
        assert_eq!(without, "BASIS");
    }

    #[test]
    fn test_examples_block_samples_configured_count() {
        let mut generator = generator(7);
        generator.config.examples.count = 2;
        generator.config.examples.fragment_start = 0;
        generator.config.examples.fragment_length = 50;

        let sermons: Vec<String> = (0..5).map(|i| format!("Referentiepreek nummer {i}.")).collect();
        let block = generator.examples_block(&sermons);
        assert_eq!(block.matches("--- Voorbeeld").count(), 2);
        assert!(block.contains("VOORBEELDEN VAN JÜNGEL-STIJL"));
    }

    #[test]
    fn test_examples_block_appends_ellipsis_when_window_truncates() {
        let mut generator = generator(7);
        generator.config.examples.count = 1;
        generator.config.examples.fragment_start = 0;
        generator.config.examples.fragment_length = 10;

        let sermons = vec!["Deze preek is duidelijk langer dan tien karakters.".to_string()];
        let block = generator.examples_block(&sermons);
        assert!(block.contains("Deze preek..."));
    }

    #[test]
    fn test_examples_block_empty_reference_list() {
        let mut generator = generator(7);
        assert!(generator.examples_block(&[]).is_empty());
    }

    #[test]
    fn test_seeded_rng_reproduces_sampling() {
        let sermons: Vec<String> = (0..20).map(|i| format!("Preek nummer {i} met inhoud.")).collect();

        let mut first = generator(42);
        first.config.examples.count = 3;
        let mut second = generator(42);
        second.config.examples.count = 3;

        assert_eq!(first.examples_block(&sermons), second.examples_block(&sermons));
    }

    #[test]
    fn test_base_prompt_carries_structure_marker() {
        // The evolver splices learnings in front of this section
        assert!(BASE_SYSTEM_PROMPT.contains("STRUCTUUR"));
    }
}
