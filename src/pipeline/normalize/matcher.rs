//! Fuzzy matching of exercise names against the canonical catalog.
//!
//! Exact matches after normalization short-circuit at confidence 1.0.
//! Otherwise every entry is scored by normalized Levenshtein similarity,
//! containment relationships are floored at the containment boost, and the
//! best score wins if it clears the match threshold. Ties keep the entry seen
//! first. Cost is O(catalog × name²), fine for catalogs in the low hundreds.

use serde::Serialize;

use crate::models::CanonicalExercise;
use crate::pipeline_config::PipelineConfig;

/// Scoring thresholds for catalog matching.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchThresholds {
    pub match_threshold: f64,
    pub containment_boost: f64,
}

impl Default for MatchThresholds {
    fn default() -> Self {
        Self {
            match_threshold: 0.5,
            containment_boost: 0.85,
        }
    }
}

impl From<&PipelineConfig> for MatchThresholds {
    fn from(config: &PipelineConfig) -> Self {
        Self {
            match_threshold: config.match_threshold,
            containment_boost: config.containment_boost,
        }
    }
}

/// Best catalog candidate for a name. `exercise` is `None` when nothing
/// cleared the threshold; `confidence` is then the best score seen.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchResult<'a> {
    pub exercise: Option<&'a CanonicalExercise>,
    pub confidence: f64,
}

/// How the caller should treat a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchTier {
    AutoAccept,
    Review,
    NoMatch,
}

impl<'a> MatchResult<'a> {
    pub fn no_match(confidence: f64) -> Self {
        Self {
            exercise: None,
            confidence,
        }
    }

    pub fn is_match(&self) -> bool {
        self.exercise.is_some()
    }

    pub fn tier(&self, auto_accept_confidence: f64) -> MatchTier {
        match self.exercise {
            None => MatchTier::NoMatch,
            Some(_) if self.confidence >= auto_accept_confidence => MatchTier::AutoAccept,
            Some(_) => MatchTier::Review,
        }
    }
}

/// Lowercase, trim, and drop one trailing "s" unless the word ends in
/// "ss" or "us", so "press" keeps its "s".
pub fn normalize_exercise_name(name: &str) -> String {
    let lower = name.trim().to_lowercase();
    if lower.ends_with('s') && !lower.ends_with("ss") && !lower.ends_with("us") {
        lower[..lower.len() - 1].to_string()
    } else {
        lower
    }
}

pub fn find_best_match<'a>(name: &str, catalog: &'a [CanonicalExercise]) -> MatchResult<'a> {
    find_best_match_with(name, catalog, MatchThresholds::default())
}

pub fn find_best_match_with<'a>(
    name: &str,
    catalog: &'a [CanonicalExercise],
    thresholds: MatchThresholds,
) -> MatchResult<'a> {
    let query = normalize_exercise_name(name);
    if query.is_empty() || catalog.is_empty() {
        return MatchResult::no_match(0.0);
    }

    let mut best: Option<&CanonicalExercise> = None;
    let mut best_score = 0.0_f64;

    for exercise in catalog {
        let candidate = normalize_exercise_name(&exercise.name);

        if candidate == query {
            return MatchResult {
                exercise: Some(exercise),
                confidence: 1.0,
            };
        }

        let mut score = similarity(&query, &candidate);
        if !candidate.is_empty() && (query.contains(&candidate) || candidate.contains(&query)) {
            score = score.max(thresholds.containment_boost);
        }

        if best.is_none() || score > best_score {
            best = Some(exercise);
            best_score = score;
        }
    }

    if best_score < thresholds.match_threshold {
        return MatchResult::no_match(best_score);
    }

    MatchResult {
        exercise: best,
        confidence: best_score,
    }
}

/// Match every distinct name once, in first-seen order.
pub fn auto_match_exercises<'a, S: AsRef<str>>(
    names: &[S],
    catalog: &'a [CanonicalExercise],
    thresholds: MatchThresholds,
) -> Vec<(String, MatchResult<'a>)> {
    let mut matches: Vec<(String, MatchResult<'a>)> = Vec::new();
    for name in names {
        let name = name.as_ref();
        if matches.iter().any(|(seen, _)| seen == name) {
            continue;
        }
        let result = find_best_match_with(name, catalog, thresholds);
        if result.confidence < 1.0 {
            tracing::debug!(
                name = %name,
                confidence = result.confidence,
                matched = result.is_match(),
                "Inexact catalog match"
            );
        }
        matches.push((name.to_string(), result));
    }
    matches
}

/// `(max_len - distance) / max_len`, measured in characters.
fn similarity(a: &str, b: &str) -> f64 {
    let max_len = a.chars().count().max(b.chars().count());
    if max_len == 0 {
        return 1.0;
    }
    let distance = edit_distance(a, b);
    (max_len - distance) as f64 / max_len as f64
}

/// Levenshtein distance over chars, unit cost for insert, delete and
/// substitute. Two rolling rows.
fn edit_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() || b.is_empty() {
        return a.len().max(b.len());
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0usize; b.len() + 1];

    for (i, a_ch) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, b_ch) in b.iter().enumerate() {
            let substitution = prev[j] + usize::from(a_ch != b_ch);
            curr[j + 1] = substitution.min(prev[j + 1] + 1).min(curr[j] + 1);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}
