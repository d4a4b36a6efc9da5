//! Structured extraction: recover a JSON value from free-form model text.
//!
//! Strategies run in a fixed order on the trimmed response and the first one
//! that parses wins. Each strategy tries its candidate as-is, then once more
//! after [`repair_json`]. A failed parse only ever falls through to the next
//! strategy; nothing in here panics on malformed input.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use serde_json::Value;

use super::repair::repair_json;

/// Whole response is one fenced block. A language tag only counts as one
/// when a line break follows it, so "```42```" still yields `42`.
static WHOLE_FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\A```(?:[\w+-]*[ \t]*\r?\n)?(.*?)\r?\n?```\z").unwrap());

/// Any fenced block anywhere in the response.
static ANY_FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```(?:[\w+-]*[ \t]*\r?\n)?(.*?)\r?\n?```").unwrap());

static OPENING_FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\A```(?:[\w+-]*[ \t]*\r?\n)?").unwrap());

static CLOSING_FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\r?\n?```\z").unwrap());

/// Upper bound on closing braces tried by truncation recovery. Each cut is a
/// full parse of the prefix, so the scan stops after this many candidates.
const MAX_TRUNCATION_CUTS: usize = 256;

/// Which strategy recovered the value. Diagnostic only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionStrategy {
    /// The whole trimmed response parsed.
    Direct,
    /// The response was a single fenced block.
    FencedBlock,
    /// Substring from the first `{` to the last `}`.
    BoundarySearch,
    /// First fenced block anywhere in the text that parsed.
    FencedSearch,
    /// Longest prefix ending in `}` that parsed. Opt-in.
    TrailingTruncation,
}

impl ExtractionStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Direct => "direct",
            Self::FencedBlock => "fenced_block",
            Self::BoundarySearch => "boundary_search",
            Self::FencedSearch => "fenced_search",
            Self::TrailingTruncation => "trailing_truncation",
        }
    }
}

impl std::fmt::Display for ExtractionStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of structured extraction. A `Recovered` value is always
/// syntactically valid JSON; its shape is not checked yet.
#[derive(Debug, Clone, PartialEq)]
pub enum ExtractionOutcome {
    Recovered {
        value: Value,
        strategy: ExtractionStrategy,
        /// True when the value only parsed after control-character repair.
        repaired: bool,
    },
    Failed {
        reason: String,
    },
}

impl ExtractionOutcome {
    pub fn is_recovered(&self) -> bool {
        matches!(self, Self::Recovered { .. })
    }

    pub fn strategy(&self) -> Option<ExtractionStrategy> {
        match self {
            Self::Recovered { strategy, .. } => Some(*strategy),
            Self::Failed { .. } => None,
        }
    }

    pub fn into_value(self) -> Option<Value> {
        match self {
            Self::Recovered { value, .. } => Some(value),
            Self::Failed { .. } => None,
        }
    }
}

/// Extract JSON using the four standard strategies.
pub fn extract_json(response: &str) -> ExtractionOutcome {
    extract_json_with(response, false)
}

/// Extract JSON, optionally falling back to truncation recovery once the
/// standard strategies are exhausted.
pub fn extract_json_with(response: &str, truncation_recovery: bool) -> ExtractionOutcome {
    let trimmed = response.trim();
    if trimmed.is_empty() {
        return ExtractionOutcome::Failed {
            reason: "Response is empty".to_string(),
        };
    }

    let mut tried = vec![ExtractionStrategy::Direct.as_str()];
    if let Some(outcome) = try_direct(trimmed) {
        return outcome;
    }

    tried.push(ExtractionStrategy::FencedBlock.as_str());
    if let Some(outcome) = try_fenced_block(trimmed) {
        return outcome;
    }

    tried.push(ExtractionStrategy::BoundarySearch.as_str());
    if let Some(outcome) = try_boundary_search(trimmed) {
        return outcome;
    }

    tried.push(ExtractionStrategy::FencedSearch.as_str());
    if let Some(outcome) = try_fenced_search(trimmed) {
        return outcome;
    }

    if truncation_recovery {
        tried.push(ExtractionStrategy::TrailingTruncation.as_str());
        if let Some(outcome) = try_trailing_truncation(trimmed) {
            return outcome;
        }
    }

    ExtractionOutcome::Failed {
        reason: format!(
            "Could not extract valid JSON from response (tried: {})",
            tried.join(", ")
        ),
    }
}

/// Parse a candidate as-is, then after repair.
fn parse_candidate(candidate: &str) -> Option<(Value, bool)> {
    if let Ok(value) = serde_json::from_str::<Value>(candidate) {
        return Some((value, false));
    }
    serde_json::from_str::<Value>(&repair_json(candidate))
        .ok()
        .map(|value| (value, true))
}

fn recovered(candidate: &str, strategy: ExtractionStrategy) -> Option<ExtractionOutcome> {
    parse_candidate(candidate).map(|(value, repaired)| {
        if repaired {
            tracing::debug!(strategy = %strategy, "JSON parsed after control-character repair");
        }
        ExtractionOutcome::Recovered {
            value,
            strategy,
            repaired,
        }
    })
}

fn try_direct(trimmed: &str) -> Option<ExtractionOutcome> {
    recovered(trimmed, ExtractionStrategy::Direct)
}

fn try_fenced_block(trimmed: &str) -> Option<ExtractionOutcome> {
    let captures = WHOLE_FENCE.captures(trimmed)?;
    let inner = captures.get(1)?.as_str().trim();
    recovered(inner, ExtractionStrategy::FencedBlock)
}

fn try_boundary_search(trimmed: &str) -> Option<ExtractionOutcome> {
    let start = trimmed.find('{')?;
    let end = trimmed.rfind('}')?;
    if start >= end {
        return None;
    }
    recovered(&trimmed[start..=end], ExtractionStrategy::BoundarySearch)
}

fn try_fenced_search(trimmed: &str) -> Option<ExtractionOutcome> {
    ANY_FENCE
        .captures_iter(trimmed)
        .filter_map(|c| c.get(1))
        .find_map(|m| recovered(m.as_str().trim(), ExtractionStrategy::FencedSearch))
}

fn try_trailing_truncation(trimmed: &str) -> Option<ExtractionOutcome> {
    let without_open = OPENING_FENCE.replace(trimmed, "");
    let stripped = CLOSING_FENCE.replace(&without_open, "");
    let candidate = stripped.trim();

    let outcome = candidate
        .rmatch_indices('}')
        .take(MAX_TRUNCATION_CUTS)
        .find_map(|(pos, _)| recovered(&candidate[..=pos], ExtractionStrategy::TrailingTruncation));

    if let Some(ExtractionOutcome::Recovered { .. }) = &outcome {
        tracing::info!(original_len = candidate.len(), "Recovered JSON by trailing truncation");
    }
    outcome
}

/// Bounded preview of raw model text for diagnostics. Never returns more than
/// `max_chars` characters of the input, and marks truncation.
pub fn bounded_preview(raw: &str, max_chars: usize) -> String {
    match raw.char_indices().nth(max_chars) {
        None => raw.to_string(),
        Some((byte_pos, _)) => format!("{}…[TRUNCATED]", &raw[..byte_pos]),
    }
}
