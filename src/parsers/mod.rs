// Parsers for assistant replies
//
// - structured_output: JSON payload recovery and recommendation normalization
// - fallback: heuristics for free-form prose
// - suggestion: the two-phase extractor built on both

pub mod fallback;
pub mod structured_output;
pub mod suggestion;

pub use suggestion::{
    extract_suggestion, extract_suggestion_with, ExtractionOptions, SuggestionExtractor,
};
