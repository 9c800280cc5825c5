//! Learning extraction and prompt evolution.
//!
//! Low-scoring feedback is mined for actionable corrective statements,
//! which are spliced into a copy of the baseline instruction prompt as a
//! delimited block. Both operations are pure and deterministic.

/// Scores above this threshold carry no corrective signal.
pub const HIGH_QUALITY_THRESHOLD: f64 = 0.8;

/// Cap on learnings extracted per feedback round.
const MAX_LEARNINGS_PER_EXTRACTION: usize = 5;

/// Cap on learnings spliced into an evolved prompt (most recent win).
const MAX_LEARNINGS_IN_PROMPT: usize = 10;

/// Structural section the improvements block is inserted before.
const STRUCTURE_MARKER: &str = "STRUCTUUR:";

/// Header delimiting the improvements block inside an evolved prompt.
const LEARNINGS_HEADER: &str = "\n\nGELEERDE VERBETERINGEN (uit eerdere iteraties):\n";

/// Markers signalling actionable feedback: excess/deficiency, omission,
/// suggestion, avoidance, emphasis.
const ACTIONABLE_MARKERS: [&str; 12] = [
    "te kort",
    "te lang",
    "te weinig",
    "te veel",
    "ontbreekt",
    "mist",
    "zou moeten",
    "probeer",
    "voeg toe",
    "vermijd",
    "gebruik meer",
    "gebruik minder",
];

/// Extract concrete improvement points from feedback text.
///
/// High scores return nothing: there is nothing to correct. Otherwise
/// feedback lines containing an actionable marker are retained, with two
/// common declarative phrasings rewritten into imperative form, capped
/// at five learnings per call.
pub fn extract_learnings(feedback: &str, score: f64) -> Vec<String> {
    if score > HIGH_QUALITY_THRESHOLD {
        return Vec::new();
    }

    let mut learnings = Vec::new();
    for line in feedback.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let lowered = line.to_lowercase();
        if !ACTIONABLE_MARKERS
            .iter()
            .any(|marker| lowered.contains(marker))
        {
            continue;
        }

        let learning = if line.starts_with('-') {
            line.to_string()
        } else {
            line.replace("De preek is", "Vermijd dat de preek")
                .replace("Er is", "Zorg voor")
        };
        learnings.push(learning);

        if learnings.len() == MAX_LEARNINGS_PER_EXTRACTION {
            break;
        }
    }

    learnings
}

/// Splice accumulated learnings into a copy of the base prompt.
///
/// The improvements block lands immediately before the `STRUCTUUR:`
/// section when the base prompt has one, otherwise at the end. Only the
/// ten most recent learnings are included. An empty learnings list
/// returns the base prompt unchanged.
pub fn evolve_prompt(base_prompt: &str, learnings: &[String]) -> String {
    if learnings.is_empty() {
        return base_prompt.to_string();
    }

    let recent = &learnings[learnings.len().saturating_sub(MAX_LEARNINGS_IN_PROMPT)..];
    let mut block = String::from(LEARNINGS_HEADER);
    for learning in recent {
        block.push_str("- ");
        block.push_str(learning);
        block.push('\n');
    }

    match base_prompt.split_once(STRUCTURE_MARKER) {
        Some((before, after)) => format!("{before}{block}\n{STRUCTURE_MARKER}{after}"),
        None => format!("{base_prompt}{block}"),
    }
}
