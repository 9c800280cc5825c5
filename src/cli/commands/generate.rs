//! `predikant generate`: run one full generation loop for a scripture
//! passage and write the resulting sermon to the output directory.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use chrono::Local;
use clap::Args;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Deserialize;
use tracing::info;

use crate::domain::models::attempt::GenerationTask;
use crate::domain::models::config::Config;
use crate::infrastructure::artifacts::ArtifactWriter;
use crate::infrastructure::claude::{ClaudeClient, ClaudeClientConfig};
use crate::infrastructure::store::JsonPromptStore;
use crate::services::generation::{RunOutcome, SermonGenerator};

#[derive(Debug, Args)]
pub struct GenerateArgs {
    /// Scripture reference, e.g. "Jakobus 5:13-18"
    pub scripture: String,

    /// Scripture passage text
    #[arg(long, conflicts_with = "context_file")]
    pub context: Option<String>,

    /// File containing the scripture passage text
    #[arg(long)]
    pub context_file: Option<PathBuf>,

    /// Directory with reference sermon JSON files (each with a "tekst" field)
    #[arg(long)]
    pub references: Option<PathBuf>,

    /// Override the configured iteration budget
    #[arg(long)]
    pub max_iterations: Option<u32>,

    /// Override the configured target score
    #[arg(long)]
    pub target_score: Option<f64>,

    /// Seed for the sampling RNG, for reproducible runs
    #[arg(long)]
    pub seed: Option<u64>,

    /// Do not persist the best prompt at run end
    #[arg(long)]
    pub no_store: bool,

    /// Do not write per-iteration artifacts
    #[arg(long)]
    pub no_artifacts: bool,
}

/// One reference sermon as exported by the corpus tooling.
#[derive(Debug, Deserialize)]
struct ReferenceSermon {
    tekst: String,
}

pub async fn execute(args: GenerateArgs, config: Config) -> Result<()> {
    let scripture_context = match (&args.context, &args.context_file) {
        (Some(text), _) => text.clone(),
        (None, Some(path)) => tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("failed to read {}", path.display()))?
            .trim()
            .to_string(),
        (None, None) => bail!("provide the passage via --context or --context-file"),
    };

    let reference_sermons = match &args.references {
        Some(dir) => load_reference_sermons(dir).await?,
        None => Vec::new(),
    };
    info!(count = reference_sermons.len(), "reference sermons loaded");

    let client = ClaudeClient::new(ClaudeClientConfig::from_env(&config.api, &config.retry)?)?;
    let store = Arc::new(JsonPromptStore::new(&config.store.prompts_dir));

    let rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let task = GenerationTask {
        scripture_text: args.scripture.clone(),
        scripture_context,
        reference_sermons,
        max_iterations: args.max_iterations.unwrap_or(config.iteration.max_iterations),
        target_score: args.target_score.unwrap_or(config.iteration.target_score),
    };

    let run_id = Local::now().format("%Y%m%d_%H%M%S").to_string();
    let output_dir = PathBuf::from(&config.store.output_dir);

    let mut generator = SermonGenerator::new(Arc::new(client), store, config, rng)
        .persist_best(!args.no_store);
    if !args.no_artifacts {
        generator = generator.with_artifacts(ArtifactWriter::new(&output_dir, &run_id));
    }

    let report = generator.run(&task).await?;
    let best = &report.best;

    println!("{}", "=".repeat(60));
    match report.outcome {
        RunOutcome::TargetMet => println!(
            "Target score {:.2} bereikt in iteratie {}.",
            task.target_score, best.iteration
        ),
        RunOutcome::IterationsExhausted => println!(
            "Maximum van {} iteraties bereikt; beste resultaat uit iteratie {}.",
            task.max_iterations, best.iteration
        ),
    }
    println!("Finale score: {:.2}", best.score.overall);
    println!("  Stilometrie: {:.2}", best.score.stylometric);
    println!("  Kwalitatief: {:.2}", best.score.qualitative);
    println!("  Discipline:  {:.2}", best.score.discipline);
    if let Some(stored) = &report.stored {
        println!("Prompt opgeslagen als v{}", stored.version);
    }
    println!(
        "Tokens gebruikt: {} input, {} output",
        best.input_tokens, best.output_tokens
    );

    let (sermon_path, prompt_path) =
        write_final_sermon(&output_dir, &run_id, &task, &report).await?;
    println!("Preek opgeslagen in: {}", sermon_path.display());
    println!("Prompt opgeslagen in: {}", prompt_path.display());

    Ok(())
}

async fn load_reference_sermons(dir: &Path) -> Result<Vec<String>> {
    let mut sermons = Vec::new();
    let mut entries = tokio::fs::read_dir(dir)
        .await
        .with_context(|| format!("failed to read reference directory {}", dir.display()))?;

    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("json") {
            continue;
        }
        let bytes = tokio::fs::read(&path)
            .await
            .with_context(|| format!("failed to read {}", path.display()))?;
        let sermon: ReferenceSermon = serde_json::from_slice(&bytes)
            .with_context(|| format!("failed to parse {}", path.display()))?;
        sermons.push(sermon.tekst);
    }

    if sermons.is_empty() {
        bail!("no reference sermons found in {}", dir.display());
    }
    Ok(sermons)
}

async fn write_final_sermon(
    output_dir: &Path,
    run_id: &str,
    task: &GenerationTask,
    report: &crate::services::generation::RunReport,
) -> Result<(PathBuf, PathBuf)> {
    tokio::fs::create_dir_all(output_dir)
        .await
        .with_context(|| format!("failed to create {}", output_dir.display()))?;

    let best = &report.best;
    let sermon_path = output_dir.join(format!("sermon_{run_id}.txt"));
    let document = format!(
        "Bijbeltekst: {}\nPrompt versie: v{}\nScore: {:.2}\nIteraties: {}\n\n{}\n\n{}",
        task.scripture_text,
        best.prompt_version,
        best.score.overall,
        best.iteration,
        "=".repeat(60),
        best.text
    );
    tokio::fs::write(&sermon_path, document)
        .await
        .with_context(|| format!("failed to write {}", sermon_path.display()))?;

    let prompt_path = output_dir.join(format!("sermon_{run_id}_prompt.txt"));
    tokio::fs::write(&prompt_path, &best.system_prompt)
        .await
        .with_context(|| format!("failed to write {}", prompt_path.display()))?;

    Ok((sermon_path, prompt_path))
}
