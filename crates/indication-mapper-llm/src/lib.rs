//! Ollama wrapper for assistance-program inference.
//!
//! This crate turns patient-assistance program files into structured
//! eligibility requirements, using a local Ollama model where it helps and
//! keyword rules where it fails.

pub mod extraction;
pub mod ollama;
pub mod program;
pub mod prompts;

pub use extraction::*;
pub use ollama::*;
pub use program::*;
pub use prompts::*;
