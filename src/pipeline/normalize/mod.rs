//! Domain normalization applied to a validated program: equipment prefix
//! stripping, catalog matching, and positional renumbering.

pub mod exercise;
pub mod matcher;
pub mod sequence;

pub use exercise::{
    equipment_for_prefix, format_exercise_display, normalize_exercise, normalize_exercises,
    parse_exercise_name, ParsedExerciseName,
};
pub use matcher::{
    auto_match_exercises, find_best_match, find_best_match_with, normalize_exercise_name,
    MatchResult, MatchThresholds, MatchTier,
};
pub use sequence::{correct_sequence, infer_workouts_per_week};
