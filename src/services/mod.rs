//! Service layer: scoring, evolution, and the iteration controller.

pub mod evolution;
pub mod generation;
pub mod judgment;
pub mod stylometry;

pub use generation::{RunOutcome, RunReport, SermonGenerator};
pub use judgment::SermonScorer;
