// Clippy allows for reasonable defaults
// These suppress warnings where the suggested change doesn't improve readability
#![allow(clippy::new_without_default)] // Default not always appropriate for stateful types
#![allow(clippy::derivable_impls)] // Explicit Default impls can be clearer
#![allow(clippy::field_reassign_with_default)] // Builder pattern is clearer
#![allow(clippy::unnecessary_map_or)] // map_or can be clearer than alternatives
#![allow(clippy::redundant_closure)] // |x| f(x) can be clearer than f

// Module declarations
pub mod agents;
pub mod commands;
pub mod config;
pub mod events;
pub mod models;
pub mod parsers;
mod utils;

// Re-export models for use in commands
pub use models::*;
pub use parsers::{extract_suggestion, ExtractionOptions, SuggestionExtractor};
