//! Per-iteration run artifacts.
//!
//! Each iteration leaves three files behind: a human-readable
//! sermon-plus-scorecard document, the raw instruction prompt used, and
//! a machine-readable scorecard record. The running best additionally
//! refreshes `best_sermon.txt`.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::debug;

use crate::domain::models::attempt::CandidateAttempt;

/// Machine-readable scorecard for one iteration.
#[derive(Debug, Serialize)]
struct ScorecardRecord {
    iteration: u32,
    overall_score: f64,
    stylometric_score: f64,
    qualitative_score: f64,
    theological_score: f64,
    metaphorical_score: f64,
    transformation_score: f64,
    rhetorical_score: f64,
    coherence_score: f64,
    language_score: f64,
    flow_score: f64,
    humor_score: f64,
    discipline_score: f64,
    is_best: bool,
    sermon_length: usize,
}

/// Writes iteration artifacts under `<output_root>/iterations/<run_id>/`.
pub struct ArtifactWriter {
    run_dir: PathBuf,
}

impl ArtifactWriter {
    pub fn new(output_root: impl AsRef<Path>, run_id: &str) -> Self {
        Self {
            run_dir: output_root.as_ref().join("iterations").join(run_id),
        }
    }

    pub fn run_dir(&self) -> &Path {
        &self.run_dir
    }

    /// Write the artifacts for one scored iteration.
    pub async fn write_iteration(&self, attempt: &CandidateAttempt, is_best: bool) -> Result<()> {
        tokio::fs::create_dir_all(&self.run_dir)
            .await
            .with_context(|| format!("failed to create {}", self.run_dir.display()))?;

        let iteration = attempt.iteration;

        let sermon_path = self.run_dir.join(format!("iter_{iteration:02}_sermon.txt"));
        tokio::fs::write(&sermon_path, scorecard_document(attempt))
            .await
            .with_context(|| format!("failed to write {}", sermon_path.display()))?;

        let prompt_path = self.run_dir.join(format!("iter_{iteration:02}_prompt.txt"));
        tokio::fs::write(&prompt_path, &attempt.system_prompt)
            .await
            .with_context(|| format!("failed to write {}", prompt_path.display()))?;

        let scores_path = self.run_dir.join(format!("iter_{iteration:02}_scores.json"));
        let record = scorecard_record(attempt, is_best);
        tokio::fs::write(&scores_path, serde_json::to_vec_pretty(&record)?)
            .await
            .with_context(|| format!("failed to write {}", scores_path.display()))?;

        if is_best {
            let best_path = self.run_dir.join("best_sermon.txt");
            let document = format!(
                "Beste iteratie: {}\nScore: {:.2}\n{}\n\n{}",
                iteration,
                attempt.score.overall,
                "=".repeat(60),
                attempt.text
            );
            tokio::fs::write(&best_path, document)
                .await
                .with_context(|| format!("failed to write {}", best_path.display()))?;
        }

        debug!(iteration, is_best, dir = %self.run_dir.display(), "iteration artifacts written");
        Ok(())
    }
}

fn scorecard_document(attempt: &CandidateAttempt) -> String {
    let score = &attempt.score;
    let dims = &score.dimensions;
    format!(
        "Iteratie: {}\n\
         Score: {:.2}\n\
         Stilometrie: {:.2}\n\
         Theologie (Kreuzestheologie): {:.2}\n\
         Metaforische Waarheid: {:.2}\n\
         Haben→Sein Transformatie: {:.2}\n\
         Retoriek: {:.2}\n\
         Coherentie: {:.2}\n\
         Taal: {:.2}\n\
         Flow: {:.2}\n\
         Humor: {:.2}\n\
         Show Don't Tell multiplier: {:.2}\n\
         {}\n\n{}",
        attempt.iteration,
        score.overall,
        score.stylometric,
        dims.theological,
        dims.metaphorical,
        dims.transformation,
        dims.rhetorical,
        dims.coherence,
        dims.language,
        dims.flow,
        dims.humor,
        score.discipline,
        "=".repeat(60),
        attempt.text
    )
}

fn scorecard_record(attempt: &CandidateAttempt, is_best: bool) -> ScorecardRecord {
    let score = &attempt.score;
    let dims = &score.dimensions;
    ScorecardRecord {
        iteration: attempt.iteration,
        overall_score: score.overall,
        stylometric_score: score.stylometric,
        qualitative_score: score.qualitative,
        theological_score: dims.theological,
        metaphorical_score: dims.metaphorical,
        transformation_score: dims.transformation,
        rhetorical_score: dims.rhetorical,
        coherence_score: dims.coherence,
        language_score: dims.language,
        flow_score: dims.flow,
        humor_score: dims.humor,
        discipline_score: score.discipline,
        is_best,
        sermon_length: attempt.text.chars().count(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::score::{DimensionScores, ScoreBreakdown};

    fn attempt(iteration: u32, overall: f64) -> CandidateAttempt {
        CandidateAttempt {
            text: "Gemeente! Dit is de preek.".to_string(),
            score: ScoreBreakdown {
                overall,
                stylometric: 0.4,
                qualitative: 0.6,
                discipline: 1.0,
                dimensions: DimensionScores {
                    theological: 0.6,
                    metaphorical: 0.6,
                    transformation: 0.6,
                    rhetorical: 0.6,
                    coherence: 0.6,
                    language: 0.6,
                    flow: 0.6,
                    humor: 0.6,
                },
                stylometric_feedback: "De preek is te kort.".to_string(),
                judge_feedback: "Overall: redelijk".to_string(),
            },
            iteration,
            input_tokens: 100,
            output_tokens: 200,
            system_prompt: "Schrijf een preek.".to_string(),
            prompt_version: 0,
        }
    }

    #[tokio::test]
    async fn test_write_iteration_creates_three_files() {
        let dir = tempfile::tempdir().unwrap();
        let writer = ArtifactWriter::new(dir.path(), "20260807_120000");

        writer.write_iteration(&attempt(1, 0.5), false).await.unwrap();

        let run_dir = writer.run_dir();
        assert!(run_dir.join("iter_01_sermon.txt").exists());
        assert!(run_dir.join("iter_01_prompt.txt").exists());
        assert!(run_dir.join("iter_01_scores.json").exists());
        assert!(!run_dir.join("best_sermon.txt").exists());
    }

    #[tokio::test]
    async fn test_write_iteration_refreshes_best() {
        let dir = tempfile::tempdir().unwrap();
        let writer = ArtifactWriter::new(dir.path(), "20260807_120000");

        writer.write_iteration(&attempt(1, 0.5), true).await.unwrap();
        writer.write_iteration(&attempt(2, 0.7), true).await.unwrap();

        let best = tokio::fs::read_to_string(writer.run_dir().join("best_sermon.txt"))
            .await
            .unwrap();
        assert!(best.starts_with("Beste iteratie: 2"));
    }

    #[tokio::test]
    async fn test_scorecard_json_is_machine_readable() {
        let dir = tempfile::tempdir().unwrap();
        let writer = ArtifactWriter::new(dir.path(), "run");

        writer.write_iteration(&attempt(3, 0.42), false).await.unwrap();

        let raw = tokio::fs::read(writer.run_dir().join("iter_03_scores.json"))
            .await
            .unwrap();
        let parsed: serde_json::Value = serde_json::from_slice(&raw).unwrap();
        assert_eq!(parsed["iteration"], 3);
        assert!((parsed["overall_score"].as_f64().unwrap() - 0.42).abs() < f64::EPSILON);
        assert_eq!(parsed["is_best"], false);
    }
}
