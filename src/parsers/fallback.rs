// Unstructured fallback - pulls a usable suggestion out of free-form assistant prose

use regex::Regex;
use std::sync::OnceLock;

/// Default minimum length (in characters) of a fallback candidate
pub const DEFAULT_MIN_FALLBACK_LEN: usize = 20;

/// Paragraph openers that read as clarifying questions rather than drafts
const QUESTION_OPENERS: [&str; 3] = ["would you", "do you", "let me know"];

/// Finds a candidate suggestion in prose, given the minimum candidate length
pub type FallbackStrategy = fn(&str, usize) -> Option<String>;

/// Fallback strategies in precedence order, first match wins
pub const FALLBACK_STRATEGIES: &[(&str, FallbackStrategy)] = &[
    ("fenced_block", fenced_block),
    ("double_quoted", double_quoted),
    ("smart_quoted", smart_quoted),
    ("single_quoted", single_quoted),
    ("lead_in", lead_in),
    ("statement_paragraph", statement_paragraph),
];

/// Run the fallback strategies; the trimmed content is the last resort.
/// Blank content yields None.
pub fn fallback_suggestion(content: &str, min_len: usize) -> Option<String> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return None;
    }

    let min_len = min_len.max(1);
    for (name, strategy) in FALLBACK_STRATEGIES {
        if let Some(text) = strategy(content, min_len) {
            log::debug!("Fallback suggestion matched by '{}' strategy", name);
            return Some(text);
        }
    }

    log::debug!("No fallback strategy matched, using whole reply");
    Some(trimmed.to_string())
}

// Compiled regex patterns
static FENCE_PATTERN: OnceLock<Regex> = OnceLock::new();
static LEAD_IN_PATTERN: OnceLock<Regex> = OnceLock::new();
static BLANK_LINE_PATTERN: OnceLock<Regex> = OnceLock::new();

fn get_fence_pattern() -> &'static Regex {
    // A language tag is only recognized when followed by a newline
    FENCE_PATTERN.get_or_init(|| {
        Regex::new(r"```(?:[\w+-]+[ \t]*\r?\n|[ \t]*\r?\n?)([\s\S]*?)```").unwrap()
    })
}

fn get_lead_in_pattern() -> &'static Regex {
    LEAD_IN_PATTERN.get_or_init(|| {
        Regex::new(r"(?i)\b(?:suggested|here['\x{2019}]s|here is)\b[^:\n]*:").unwrap()
    })
}

fn get_blank_line_pattern() -> &'static Regex {
    BLANK_LINE_PATTERN.get_or_init(|| Regex::new(r"\r?\n[ \t]*\r?\n").unwrap())
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// First fenced block whose trimmed interior is long enough
pub fn fenced_block(content: &str, min_len: usize) -> Option<String> {
    get_fence_pattern()
        .captures_iter(content)
        .filter_map(|cap| cap.get(1).map(|m| m.as_str().trim()))
        .find(|interior| char_len(interior) >= min_len)
        .map(|interior| interior.to_string())
}

fn delimited_span(content: &str, open: char, close: char, min_len: usize) -> Option<String> {
    let pattern = format!(
        "{}([^{}]{{{},}}){}",
        regex::escape(&open.to_string()),
        regex::escape(&close.to_string()),
        min_len,
        regex::escape(&close.to_string()),
    );
    let re = Regex::new(&pattern).ok()?;
    let text = re.captures(content)?.get(1)?.as_str().trim();
    (!text.is_empty()).then(|| text.to_string())
}

/// `"..."` span
pub fn double_quoted(content: &str, min_len: usize) -> Option<String> {
    delimited_span(content, '"', '"', min_len)
}

/// `“...”` span
pub fn smart_quoted(content: &str, min_len: usize) -> Option<String> {
    delimited_span(content, '\u{201C}', '\u{201D}', min_len)
}

/// `'...'` span
pub fn single_quoted(content: &str, min_len: usize) -> Option<String> {
    delimited_span(content, '\'', '\'', min_len)
}

/// Text introduced by "Suggested ...:", "Here's ...:" or "Here is ...:",
/// up to the next blank line
pub fn lead_in(content: &str, min_len: usize) -> Option<String> {
    let lead = get_lead_in_pattern().find(content)?;
    let rest = content[lead.end()..].trim_start();

    let captured = match get_blank_line_pattern().find(rest) {
        Some(m) => &rest[..m.start()],
        None => rest,
    }
    .trim();

    (char_len(captured) >= min_len).then(|| captured.to_string())
}

/// First long-enough paragraph that is not a clarifying question
pub fn statement_paragraph(content: &str, min_len: usize) -> Option<String> {
    get_blank_line_pattern()
        .split(content)
        .map(str::trim)
        .filter(|p| char_len(p) >= min_len)
        .find(|p| !is_clarifying_question(p))
        .map(|p| p.to_string())
}

fn is_clarifying_question(paragraph: &str) -> bool {
    if paragraph.ends_with('?') {
        return true;
    }
    let lowered = paragraph.to_lowercase();
    QUESTION_OPENERS
        .iter()
        .any(|opener| lowered.starts_with(opener))
}

#[cfg(test)]
mod tests {
    use super::*;

    const MIN: usize = DEFAULT_MIN_FALLBACK_LEN;

    #[test]
    fn test_fenced_block_long_enough() {
        let content = "Here you go:\n```\nYou are a patient tutor for algebra.\n```";
        assert_eq!(
            fenced_block(content, MIN).as_deref(),
            Some("You are a patient tutor for algebra.")
        );
    }

    #[test]
    fn test_fenced_block_strips_language_tag() {
        let content = "```markdown\nYou are a patient tutor for algebra.\n```";
        assert_eq!(
            fenced_block(content, MIN).as_deref(),
            Some("You are a patient tutor for algebra.")
        );
    }

    #[test]
    fn test_fenced_block_skips_short_blocks() {
        let content = "```\nshort\n```\nthen\n```\nA much longer block of suggested text.\n```";
        assert_eq!(
            fenced_block(content, MIN).as_deref(),
            Some("A much longer block of suggested text.")
        );
    }

    #[test]
    fn test_double_quoted() {
        let content = "Sure! Here's a draft:\n\n\"This is a sufficiently long quoted suggestion text.\"";
        assert_eq!(
            double_quoted(content, MIN).as_deref(),
            Some("This is a sufficiently long quoted suggestion text.")
        );
    }

    #[test]
    fn test_double_quoted_too_short() {
        assert!(double_quoted("Call it \"Helper\" maybe", MIN).is_none());
    }

    #[test]
    fn test_smart_quoted() {
        let content = "Try: \u{201C}A concise assistant for billing questions.\u{201D}";
        assert_eq!(
            smart_quoted(content, MIN).as_deref(),
            Some("A concise assistant for billing questions.")
        );
    }

    #[test]
    fn test_single_quoted() {
        let content = "Try 'A concise assistant for billing questions.' instead";
        assert_eq!(
            single_quoted(content, MIN).as_deref(),
            Some("A concise assistant for billing questions.")
        );
    }

    #[test]
    fn test_lead_in_captures_until_blank_line() {
        let content = "Here is an improved version:\n\nAn assistant that triages support tickets.\n\nWant changes?";
        assert_eq!(
            lead_in(content, MIN).as_deref(),
            Some("An assistant that triages support tickets.")
        );
    }

    #[test]
    fn test_lead_in_is_case_insensitive() {
        let content = "SUGGESTED: Summarizes meeting notes into action items.";
        assert_eq!(
            lead_in(content, MIN).as_deref(),
            Some("Summarizes meeting notes into action items.")
        );
    }

    #[test]
    fn test_lead_in_accepts_curly_apostrophe() {
        let content = "Here\u{2019}s the revised one:\nAn agent that books meeting rooms.";
        assert_eq!(
            lead_in(content, MIN).as_deref(),
            Some("An agent that books meeting rooms.")
        );
    }

    #[test]
    fn test_patterns_are_reused_across_calls() {
        let content = "```\nYou are a patient tutor for algebra.\n```";
        let first = fenced_block(content, MIN);
        let second = fenced_block(content, MIN);
        assert_eq!(first, second);
        assert!(std::ptr::eq(get_fence_pattern(), get_fence_pattern()));
    }

    #[test]
    fn test_lead_in_requires_colon() {
        let content = "Here is a draft of at least twenty characters for you.";
        assert!(lead_in(content, MIN).is_none());
    }

    #[test]
    fn test_statement_paragraph_skips_questions() {
        let content =
            "Would you like me to proceed?\n\nHere is a draft of at least twenty characters for you.";
        assert_eq!(
            statement_paragraph(content, MIN).as_deref(),
            Some("Here is a draft of at least twenty characters for you.")
        );
    }

    #[test]
    fn test_statement_paragraph_skips_openers() {
        let content = "Let me know if this sounds right to you.\n\nDo you want a formal tone instead.\n\nAn agent that books meeting rooms.";
        assert_eq!(
            statement_paragraph(content, MIN).as_deref(),
            Some("An agent that books meeting rooms.")
        );
    }

    #[test]
    fn test_fallback_suggestion_uses_whole_reply_last() {
        assert_eq!(
            fallback_suggestion("  Short reply.  ", MIN).as_deref(),
            Some("Short reply.")
        );
    }

    #[test]
    fn test_fallback_suggestion_blank() {
        assert!(fallback_suggestion("   \n\t", MIN).is_none());
    }

    #[test]
    fn test_fallback_suggestion_precedence() {
        // Quoted span beats the lead-in on the same reply
        let content = "Sure! Here's a draft:\n\n\"This is a sufficiently long quoted suggestion text.\"";
        assert_eq!(
            fallback_suggestion(content, MIN).as_deref(),
            Some("This is a sufficiently long quoted suggestion text.")
        );
    }

    #[test]
    fn test_fallback_respects_custom_min_len() {
        let content = "Call it \"Helper bot\" maybe";
        assert_eq!(
            fallback_suggestion(content, 5).as_deref(),
            Some("Helper bot")
        );
    }
}
