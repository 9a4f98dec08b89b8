//! Suggestion extraction over a conversation transcript
//!
//! Phase 1 walks assistant turns newest-first looking for a structured
//! `{"recommendation": ...}` payload. Phase 2 falls back to heuristics over
//! the newest assistant turn only. Both phases are pure: malformed content is
//! a non-match, never an error.

use crate::models::{ChatTurn, SuggestionResult};
use crate::parsers::fallback::{fallback_suggestion, DEFAULT_MIN_FALLBACK_LEN};
use crate::parsers::structured_output::structured_suggestion;
use serde::{Deserialize, Serialize};

/// Tunables for suggestion extraction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionOptions {
    /// Minimum length (chars) of an unstructured fallback candidate
    pub min_fallback_len: usize,
    /// Render extra string fields of a structured recommendation under their own header
    pub surface_extra_fields: bool,
}

impl Default for ExtractionOptions {
    fn default() -> Self {
        Self {
            min_fallback_len: DEFAULT_MIN_FALLBACK_LEN,
            surface_extra_fields: true,
        }
    }
}

/// Finds the best suggestion in a transcript
#[derive(Debug, Clone, Default)]
pub struct SuggestionExtractor {
    options: ExtractionOptions,
}

impl SuggestionExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: ExtractionOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ExtractionOptions {
        &self.options
    }

    /// Return the best suggestion for `turns`, or None when there is nothing to offer
    pub fn extract(&self, turns: &[ChatTurn]) -> Option<SuggestionResult> {
        self.structured(turns).or_else(|| self.unstructured(turns))
    }

    /// Phase 1: newest assistant turn carrying a structured payload wins
    fn structured(&self, turns: &[ChatTurn]) -> Option<SuggestionResult> {
        assistant_turns_newest_first(turns).find_map(|turn| {
            if turn.content.trim().is_empty() {
                return None;
            }
            let result = structured_suggestion(&turn.content, self.options.surface_extra_fields);
            if result.is_some() {
                log::debug!("Structured suggestion found in turn {}", turn.id);
            }
            result
        })
    }

    /// Phase 2: heuristics over the newest assistant turn only
    fn unstructured(&self, turns: &[ChatTurn]) -> Option<SuggestionResult> {
        let latest = assistant_turns_newest_first(turns).next()?;
        fallback_suggestion(&latest.content, self.options.min_fallback_len)
            .map(SuggestionResult::plain)
    }
}

fn assistant_turns_newest_first(turns: &[ChatTurn]) -> impl Iterator<Item = &ChatTurn> {
    turns.iter().rev().filter(|t| t.is_assistant())
}

/// Extract with default options
pub fn extract_suggestion(turns: &[ChatTurn]) -> Option<SuggestionResult> {
    SuggestionExtractor::new().extract(turns)
}

/// Extract with explicit options
pub fn extract_suggestion_with(
    turns: &[ChatTurn],
    options: &ExtractionOptions,
) -> Option<SuggestionResult> {
    SuggestionExtractor::with_options(options.clone()).extract(turns)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transcript(turns: &[(&str, &str)]) -> Vec<ChatTurn> {
        turns
            .iter()
            .map(|(role, content)| match *role {
                "user" => ChatTurn::user(*content),
                _ => ChatTurn::assistant(*content),
            })
            .collect()
    }

    #[test]
    fn test_empty_transcript_has_no_suggestion() {
        assert!(extract_suggestion(&[]).is_none());
    }

    #[test]
    fn test_user_only_transcript_has_no_suggestion() {
        let turns = transcript(&[("user", "Help me write a description for my agent please")]);
        assert!(extract_suggestion(&turns).is_none());
    }

    #[test]
    fn test_whitespace_assistant_turn_has_no_suggestion() {
        let turns = transcript(&[("user", "hi"), ("assistant", "  \n ")]);
        assert!(extract_suggestion(&turns).is_none());
    }

    #[test]
    fn test_structured_in_older_turn_beats_prose_in_newer_turn() {
        let turns = transcript(&[
            ("assistant", r#"{"recommendation": "Older structured draft"}"#),
            ("user", "thanks"),
            ("assistant", "Glad it helps! Anything else you would like to change?"),
        ]);
        let result = extract_suggestion(&turns).unwrap();
        assert_eq!(result.recommendation, "Older structured draft");
    }

    #[test]
    fn test_fallback_only_looks_at_newest_assistant_turn() {
        let turns = transcript(&[
            ("assistant", "\"An older quoted suggestion that is long enough.\""),
            ("user", "ok"),
            ("assistant", "Sounds good."),
        ]);
        let result = extract_suggestion(&turns).unwrap();
        assert_eq!(result.recommendation, "Sounds good.");
        assert!(result.reasoning.is_none());
    }

    #[test]
    fn test_json_without_recommendation_falls_through_to_older_turn() {
        let turns = transcript(&[
            ("assistant", "```json\n{\"recommendation\": \"From the fence\"}\n```"),
            ("assistant", r#"{"status": "ok"}"#),
        ]);
        let result = extract_suggestion(&turns).unwrap();
        assert_eq!(result.recommendation, "From the fence");
    }

    #[test]
    fn test_custom_options_disable_extras() {
        let turns = transcript(&[(
            "assistant",
            r#"{"recommendation": {"role": "Tutor.", "audience": "Students"}}"#,
        )]);
        let options = ExtractionOptions {
            surface_extra_fields: false,
            ..Default::default()
        };
        let result = extract_suggestion_with(&turns, &options).unwrap();
        assert_eq!(result.recommendation, "Tutor.");
    }
}
