//! Port traits: boundaries the service layer depends on.

pub mod completion;
pub mod prompt_repository;

pub use completion::{Completion, CompletionClient, CompletionRequest};
pub use prompt_repository::PromptRepository;
