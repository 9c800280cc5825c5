//! `predikant stats|best|history`: inspect the prompt-evolution store.

use anyhow::Result;
use comfy_table::{presets::UTF8_FULL, Cell, ContentArrangement, Table};

use crate::domain::models::config::Config;
use crate::domain::ports::PromptRepository;
use crate::infrastructure::store::JsonPromptStore;

const PROMPT_PREVIEW_CHARS: usize = 2000;

pub async fn stats(config: Config) -> Result<()> {
    let store = JsonPromptStore::new(&config.store.prompts_dir);
    let stats = store.stats().await?;

    println!("--- Prompt Evolutie Status ---");
    if stats.total_versions == 0 {
        println!("Geen opgeslagen prompts. De eerste run start met het basis prompt.");
        return Ok(());
    }

    println!("Totaal versies: {}", stats.total_versions);
    println!("Beste score: {:.2}", stats.best_score);
    println!("Gemiddelde score: {:.2}", stats.avg_score);
    println!("Laatste versie: v{}", stats.latest_version);
    if stats.score_improvement.abs() > f64::EPSILON {
        println!(
            "Score verbetering (v1 -> laatste): {:+.2}",
            stats.score_improvement
        );
    }
    Ok(())
}

pub async fn best(config: Config, full: bool) -> Result<()> {
    let store = JsonPromptStore::new(&config.store.prompts_dir);
    let Some(best) = store.current_best().await? else {
        println!("Geen opgeslagen prompts gevonden.");
        println!("Het basis prompt wordt gebruikt bij de eerste run.");
        return Ok(());
    };

    println!("HUIDIGE BESTE PROMPT (v{})", best.version);
    println!("Score: {:.2}", best.score);
    println!("Opgeslagen: {}", best.timestamp.format("%Y-%m-%d %H:%M:%S"));
    println!("Bijbeltekst: {}", best.scripture_text);
    println!("Iteratie: {}", best.iteration);
    println!("Tokens gebruikt: {}", best.tokens_used);

    if let Some(improvements) = &best.improvements {
        println!("\nGeleerde verbeteringen ({}):", improvements.len());
        for improvement in improvements.iter().take(5) {
            println!("  - {}", truncate_chars(improvement, 80));
        }
    }

    println!("\n--- PROMPT INHOUD ---");
    if full {
        println!("{}", best.system_prompt);
    } else {
        let total = best.system_prompt.chars().count();
        println!("{}", truncate_chars(&best.system_prompt, PROMPT_PREVIEW_CHARS));
        if total > PROMPT_PREVIEW_CHARS {
            println!(
                "\n... [{} karakters weggelaten, gebruik --full] ...",
                total - PROMPT_PREVIEW_CHARS
            );
        }
    }
    Ok(())
}

pub async fn history(config: Config) -> Result<()> {
    let store = JsonPromptStore::new(&config.store.prompts_dir);
    let history = store.history().await?;

    if history.is_empty() {
        println!("Geen prompt geschiedenis gevonden.");
        return Ok(());
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            "Versie",
            "Score",
            "Opgeslagen",
            "Bijbeltekst",
            "Parent",
            "Verbeteringen",
        ]);

    for entry in &history {
        table.add_row(vec![
            Cell::new(format!("v{}", entry.version)),
            Cell::new(format!("{:.2}", entry.score)),
            Cell::new(entry.timestamp.format("%Y-%m-%d %H:%M").to_string()),
            Cell::new(truncate_chars(&entry.scripture_text, 30)),
            Cell::new(
                entry
                    .parent_version
                    .map_or_else(|| "-".to_string(), |v| format!("v{v}")),
            ),
            Cell::new(
                entry
                    .improvements
                    .as_ref()
                    .map_or_else(|| "-".to_string(), |i| i.len().to_string()),
            ),
        ]);
    }

    println!("{table}");
    Ok(())
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
    let truncated: String = text.chars().take(max_chars).collect();
    if text.chars().count() > max_chars {
        format!("{truncated}...")
    } else {
        truncated
    }
}
