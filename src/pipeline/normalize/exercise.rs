//! Equipment-prefix normalization of exercise names.
//!
//! Models tend to fold the implement into the name ("DB Incline Press",
//! "Hax Deadlift"). The leading token is checked against a fixed alias table
//! and, when it matches, moved into the equipment field.
//!
//! Known false positive: names where the equipment word is part of the
//! movement itself ("Band Pull-Apart") are split as well.

use crate::models::{Equipment, ExerciseEntry};

/// Prefix aliases, lowercase. Order matters for display formatting: the
/// first alias for a piece of equipment is the one shown.
const EQUIPMENT_PREFIXES: &[(&str, Equipment)] = &[
    ("hax", Equipment::HaxBarbell),
    ("barbell", Equipment::Barbell),
    ("dumbbell", Equipment::Dumbbell),
    ("db", Equipment::Dumbbell),
    ("cable", Equipment::Cable),
    ("machine", Equipment::Machine),
    ("kettlebell", Equipment::Kettlebell),
    ("kb", Equipment::Kettlebell),
    ("band", Equipment::ResistanceBand),
    ("bodyweight", Equipment::Bodyweight),
    ("bw", Equipment::Bodyweight),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedExerciseName {
    pub name: String,
    pub equipment: Option<Equipment>,
}

/// Look up a single token in the alias table (case-insensitive).
pub fn equipment_for_prefix(token: &str) -> Option<Equipment> {
    let lower = token.to_lowercase();
    EQUIPMENT_PREFIXES
        .iter()
        .find(|(alias, _)| *alias == lower)
        .map(|(_, equipment)| *equipment)
}

/// Split a combined "equipment + exercise" name. Total: every input,
/// including empty and single-word strings, yields a result.
pub fn parse_exercise_name(full_name: &str) -> ParsedExerciseName {
    let trimmed = full_name.trim();
    let words: Vec<&str> = trimmed.split_whitespace().collect();

    if words.len() > 1 {
        if let Some(equipment) = equipment_for_prefix(words[0]) {
            return ParsedExerciseName {
                name: words[1..].join(" "),
                equipment: Some(equipment),
            };
        }
    }

    ParsedExerciseName {
        name: trimmed.to_string(),
        equipment: None,
    }
}

/// Combine a base name and its equipment for display
/// ("Bench Press" + Dumbbell → "Dumbbell Bench Press"). Bodyweight and
/// equipment outside the alias table leave the name as-is.
pub fn format_exercise_display(name: &str, equipment: &[String]) -> String {
    let Some(first) = equipment.first() else {
        return name.to_string();
    };

    let prefix = EQUIPMENT_PREFIXES
        .iter()
        .find(|(_, e)| e.as_str() == first.as_str())
        .filter(|(_, e)| *e != Equipment::Bodyweight)
        .map(|(alias, _)| *alias);

    match prefix {
        Some(alias) => format!("{} {name}", capitalize(alias)),
        None => name.to_string(),
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(c) => c.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Normalize one entry in place from its untouched `raw_name`. When no
/// equipment is inferred the model-supplied equipment list is kept.
pub fn normalize_exercise(entry: &mut ExerciseEntry) {
    let parsed = parse_exercise_name(&entry.raw_name);
    entry.name = parsed.name;
    if let Some(equipment) = parsed.equipment {
        entry.equipment = vec![equipment.as_str().to_string()];
    }
}

pub fn normalize_exercises(mut entries: Vec<ExerciseEntry>) -> Vec<ExerciseEntry> {
    for entry in &mut entries {
        normalize_exercise(entry);
    }
    entries
}
