// Structured output parser - recovers `{"recommendation": ...}` payloads from assistant replies

use crate::models::{StructuredRecommendation, SuggestionResult};
use regex::Regex;
use serde_json::{Map, Value};
use std::sync::OnceLock;

/// Literal key an embedded object must contain to be considered a payload
const RECOMMENDATION_TOKEN: &str = "\"recommendation\"";

/// Fields of a structured recommendation that get dedicated sections
const KNOWN_FIELDS: [&str; 3] = ["role", "capabilities", "constraints"];

/// Locates a JSON value inside an assistant reply
pub type JsonStrategy = fn(&str) -> Option<Value>;

/// JSON strategies in precedence order.
/// The first strategy that yields a usable recommendation decides the turn.
pub const JSON_STRATEGIES: &[(&str, JsonStrategy)] = &[
    ("direct", parse_direct),
    ("fenced_block", parse_fenced_block),
    ("embedded_object", parse_embedded_object),
];

/// Parse the whole reply as JSON
pub fn parse_direct(content: &str) -> Option<Value> {
    serde_json::from_str(content).ok()
}

static JSON_FENCE_PATTERN: OnceLock<Regex> = OnceLock::new();

fn get_json_fence_pattern() -> &'static Regex {
    JSON_FENCE_PATTERN.get_or_init(|| Regex::new(r"```(?:json)?\s*([\s\S]*?)```").unwrap())
}

/// Parse the interior of the first ``` / ```json fenced block
pub fn parse_fenced_block(content: &str) -> Option<Value> {
    let interior = get_json_fence_pattern().captures(content)?.get(1)?.as_str();
    serde_json::from_str(interior).ok()
}

/// Parse the first `{...}` object span that contains the literal `"recommendation"`.
///
/// Candidate spans start at each `{` from left to right and end where the
/// object closes, so surrounding prose (or a trailing brace in prose) does
/// not break the parse.
pub fn parse_embedded_object(content: &str) -> Option<Value> {
    if !content.contains(RECOMMENDATION_TOKEN) {
        return None;
    }

    for (start, _) in content.match_indices('{') {
        let rest = &content[start..];
        let mut stream = serde_json::Deserializer::from_str(rest).into_iter::<Value>();
        if let Some(Ok(value)) = stream.next() {
            let span = &rest[..stream.byte_offset()];
            if value.is_object() && span.contains(RECOMMENDATION_TOKEN) {
                return Some(value);
            }
        }
    }

    None
}

/// Run the JSON strategies against one reply.
///
/// Valid JSON without a usable recommendation does not end the search, so a
/// later strategy can still find the payload in the same reply.
pub fn structured_suggestion(content: &str, surface_extras: bool) -> Option<SuggestionResult> {
    JSON_STRATEGIES.iter().find_map(|(name, strategy)| {
        let value = strategy(content)?;
        let result = suggestion_from_payload(&value, surface_extras);
        match result {
            Some(_) => log::trace!("Recommendation located by '{}' strategy", name),
            None => log::trace!("'{}' strategy found JSON without a recommendation", name),
        }
        result
    })
}

/// Build a suggestion from a located JSON payload.
/// Returns None unless the payload carries a non-empty recommendation.
pub fn suggestion_from_payload(payload: &Value, surface_extras: bool) -> Option<SuggestionResult> {
    let object = payload.as_object()?;
    let recommendation = parse_recommendation(object.get("recommendation")?)?;
    let text = normalize_recommendation(&recommendation, surface_extras);
    if text.is_empty() {
        return None;
    }

    Some(SuggestionResult {
        recommendation: text,
        reasoning: optional_text(object.get("reasoning")),
        comments: optional_text(object.get("comments")),
    })
}

/// Interpret the `recommendation` field as text or a structured object
pub fn parse_recommendation(value: &Value) -> Option<StructuredRecommendation> {
    match value {
        Value::String(text) => Some(StructuredRecommendation::Text(text.clone())),
        Value::Object(map) => Some(structured_from_map(map)),
        _ => None,
    }
}

fn structured_from_map(map: &Map<String, Value>) -> StructuredRecommendation {
    let role = map
        .get("role")
        .and_then(|v| v.as_str())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());

    let extras = map
        .iter()
        .filter(|(key, _)| !KNOWN_FIELDS.contains(&key.as_str()))
        .filter_map(|(key, value)| {
            let text = value.as_str()?.trim();
            (!text.is_empty()).then(|| (key.clone(), text.to_string()))
        })
        .collect();

    StructuredRecommendation::Structured {
        role,
        capabilities: string_list(map.get("capabilities")),
        constraints: string_list(map.get("constraints")),
        extras,
    }
}

fn string_list(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(|v| v.as_array())
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item.as_str())
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        })
        .unwrap_or_default()
}

fn optional_text(value: Option<&Value>) -> Option<String> {
    value
        .and_then(|v| v.as_str())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Flatten a recommendation into presentable text.
///
/// Structured recommendations render as the role line, a numbered
/// "Capabilities:" section, a numbered "Guidelines:" section, and (when
/// `surface_extras` is set) one section per other string field.
pub fn normalize_recommendation(
    recommendation: &StructuredRecommendation,
    surface_extras: bool,
) -> String {
    match recommendation {
        StructuredRecommendation::Text(text) => text.trim().to_string(),
        StructuredRecommendation::Structured {
            role,
            capabilities,
            constraints,
            extras,
        } => {
            let mut parts: Vec<String> = Vec::new();

            if let Some(role) = role {
                parts.push(role.clone());
            }
            push_numbered_section(&mut parts, "Capabilities", capabilities);
            push_numbered_section(&mut parts, "Guidelines", constraints);

            if surface_extras {
                for (key, value) in extras {
                    parts.push(format!("\n{}:", section_header(key)));
                    parts.push(value.clone());
                }
            }

            parts.join("\n").trim().to_string()
        }
    }
}

fn push_numbered_section(parts: &mut Vec<String>, header: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }
    parts.push(format!("\n{}:", header));
    for (idx, item) in items.iter().enumerate() {
        parts.push(format!("{}. {}", idx + 1, item));
    }
}

/// `tone_of_voice` -> `Tone of voice`
fn section_header(key: &str) -> String {
    let spaced = key.replace(['_', '-'], " ");
    let mut chars = spaced.trim().chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
