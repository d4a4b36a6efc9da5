use std::collections::HashMap;

use uuid::Uuid;

use super::extract::{bounded_preview, extract_json_with, ExtractionOutcome, ExtractionStrategy};
use super::validation::validate_program;
use super::RecoveryError;
use crate::models::{CanonicalExercise, MesocycleInfo, ValidatedProgram};
use crate::pipeline::normalize::{
    correct_sequence, find_best_match_with, infer_workouts_per_week, normalize_exercises,
    MatchResult, MatchThresholds, MatchTier,
};
use crate::pipeline_config::PipelineConfig;

/// A program that passed validation, with extraction diagnostics.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedResponse {
    pub program: ValidatedProgram,
    pub strategy: ExtractionStrategy,
    pub repaired: bool,
}

/// Catalog match for one exercise occurrence.
#[derive(Debug, Clone, PartialEq)]
pub struct ExerciseMatch<'a> {
    /// Index into `plan_data`.
    pub day: usize,
    /// Index into that day's `exercises`.
    pub exercise: usize,
    /// Normalized exercise name that was matched.
    pub name: String,
    pub result: MatchResult<'a>,
    pub tier: MatchTier,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedProgram<'a> {
    pub program: ValidatedProgram,
    pub workouts_per_week: u32,
    pub matches: Vec<ExerciseMatch<'a>>,
}

/// Output of a full pipeline run.
#[derive(Debug, Clone, PartialEq)]
pub struct RecoveredProgram<'a> {
    pub run_id: Uuid,
    pub program: ValidatedProgram,
    pub strategy: ExtractionStrategy,
    pub repaired: bool,
    pub workouts_per_week: u32,
    pub matches: Vec<ExerciseMatch<'a>>,
}

impl<'a> RecoveredProgram<'a> {
    /// Occurrences that need a human decision before import.
    pub fn needs_review(&self) -> impl Iterator<Item = &ExerciseMatch<'a>> {
        self.matches.iter().filter(|m| m.tier != MatchTier::AutoAccept)
    }
}

/// Raw text → validated program. Failures are logged here with a bounded
/// preview of the raw text; callers only see the typed error.
pub fn extract_and_validate(
    raw: &str,
    config: &PipelineConfig,
) -> Result<ValidatedResponse, RecoveryError> {
    if raw.trim().is_empty() {
        tracing::warn!("Model response is empty");
        return Err(RecoveryError::EmptyResponse);
    }

    let (value, strategy, repaired) = match extract_json_with(raw, config.truncation_recovery) {
        ExtractionOutcome::Recovered {
            value,
            strategy,
            repaired,
        } => (value, strategy, repaired),
        ExtractionOutcome::Failed { reason } => {
            let preview = bounded_preview(raw, config.preview_chars);
            tracing::warn!(
                reason = %reason,
                response_len = raw.len(),
                preview = %preview,
                "JSON extraction failed"
            );
            return Err(RecoveryError::Extraction { reason, preview });
        }
    };

    if strategy == ExtractionStrategy::Direct && !repaired {
        tracing::debug!(strategy = %strategy, "JSON extracted");
    } else {
        tracing::info!(strategy = %strategy, repaired, "JSON extracted with fallback");
    }

    match validate_program(&value) {
        Ok(program) => {
            tracing::debug!(
                program_type = %program.kind(),
                days = program.days().len(),
                exercises = program.exercise_count(),
                "Program validated"
            );
            Ok(ValidatedResponse {
                program,
                strategy,
                repaired,
            })
        }
        Err(violations) => {
            tracing::warn!(count = violations.len(), "Program failed validation");
            for violation in &violations {
                tracing::debug!(path = %violation.path, message = %violation.message, "Violation");
            }
            Err(RecoveryError::Validation(violations))
        }
    }
}

/// Workouts per week used for renumbering. Single sessions are one workout.
/// Multi-week plans always use `ceil(days / total_weeks)`; a stated value
/// is only compared against it.
fn resolve_workouts_per_week(program: &ValidatedProgram, config: &PipelineConfig) -> u32 {
    match program {
        ValidatedProgram::SingleSession(_) => 1,
        ValidatedProgram::MultiWeekPlan(plan) => {
            let total_weeks = plan
                .mesocycle_info
                .as_ref()
                .map(|m| m.total_weeks)
                .unwrap_or(config.default_total_weeks);
            let inferred = infer_workouts_per_week(plan.days.len(), total_weeks);

            let stated = plan.mesocycle_info.as_ref().and_then(|m| m.workouts_per_week);
            match stated {
                Some(stated) if stated != inferred => tracing::warn!(
                    stated,
                    inferred,
                    days = plan.days.len(),
                    total_weeks,
                    "Stated workouts per week disagrees with day count, using inferred"
                ),
                _ => tracing::debug!(
                    days = plan.days.len(),
                    total_weeks,
                    inferred,
                    "Inferred workouts per week"
                ),
            }
            inferred
        }
    }
}

/// Exercise normalization, catalog matching, then sequence correction.
pub fn normalize_program<'a>(
    mut program: ValidatedProgram,
    catalog: &'a [CanonicalExercise],
    config: &PipelineConfig,
) -> NormalizedProgram<'a> {
    for day in program.days_mut().iter_mut() {
        day.exercises = normalize_exercises(std::mem::take(&mut day.exercises));
    }

    let thresholds = MatchThresholds::from(config);
    let mut cache: HashMap<String, MatchResult<'a>> = HashMap::new();
    let mut matches = Vec::with_capacity(program.exercise_count());
    for (day_index, day) in program.days().iter().enumerate() {
        for (exercise_index, entry) in day.exercises.iter().enumerate() {
            let result = *cache
                .entry(entry.name.clone())
                .or_insert_with(|| find_best_match_with(&entry.name, catalog, thresholds));
            let tier = result.tier(config.auto_accept_confidence);
            if tier != MatchTier::AutoAccept {
                tracing::debug!(
                    day = day_index,
                    name = %entry.name,
                    confidence = result.confidence,
                    tier = ?tier,
                    "Catalog match below auto-accept"
                );
            }
            matches.push(ExerciseMatch {
                day: day_index,
                exercise: exercise_index,
                name: entry.name.clone(),
                result,
                tier,
            });
        }
    }

    let unmatched = matches.iter().filter(|m| m.tier == MatchTier::NoMatch).count();
    let review = matches.iter().filter(|m| m.tier == MatchTier::Review).count();
    if unmatched > 0 || review > 0 {
        tracing::info!(
            total = matches.len(),
            distinct = cache.len(),
            review,
            unmatched,
            "Catalog matching needs review"
        );
    }

    let workouts_per_week = resolve_workouts_per_week(&program, config);
    let days = std::mem::take(program.days_mut());
    *program.days_mut() = correct_sequence(days, workouts_per_week);

    if let ValidatedProgram::MultiWeekPlan(plan) = &mut program {
        let meso = plan.mesocycle_info.get_or_insert_with(|| MesocycleInfo {
            total_weeks: config.default_total_weeks,
            workouts_per_week: None,
            deload_weeks: Vec::new(),
            periodization_model: None,
            phase: None,
        });
        meso.workouts_per_week = Some(workouts_per_week);
    }

    NormalizedProgram {
        program,
        workouts_per_week,
        matches,
    }
}

/// Run every stage on one raw model response.
pub fn recover_program<'a>(
    raw: &str,
    catalog: &'a [CanonicalExercise],
    config: &PipelineConfig,
) -> Result<RecoveredProgram<'a>, RecoveryError> {
    let run_id = Uuid::new_v4();
    let _span = tracing::info_span!("recover_program", run_id = %run_id).entered();

    let validated = extract_and_validate(raw, config)?;
    let normalized = normalize_program(validated.program, catalog, config);

    Ok(RecoveredProgram {
        run_id,
        program: normalized.program,
        strategy: validated.strategy,
        repaired: validated.repaired,
        workouts_per_week: normalized.workouts_per_week,
        matches: normalized.matches,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn catalog() -> Vec<CanonicalExercise> {
        ["Back Squat", "Bench Press", "Deadlift", "Row", "Pull-up"]
            .iter()
            .map(|n| CanonicalExercise::new(n))
            .collect()
    }

    fn day(exercise: &str, week: u32, index: u32) -> serde_json::Value {
        json!({
            "week": week,
            "workout_index": index,
            "exercises": [{
                "name": exercise,
                "sets": [{"weight": 60, "reps": 8}]
            }],
            "coaching_notes": "Controlled eccentric."
        })
    }

    fn multi_week(days: Vec<serde_json::Value>, meso: serde_json::Value) -> String {
        json!({
            "program_type": "multi_week_plan",
            "rationale": "Three week strength block.",
            "valid_from": "2026-01-05",
            "valid_until": "2026-01-25",
            "mesocycle_info": meso,
            "plan_data": days
        })
        .to_string()
    }

    #[test]
    fn empty_response_is_its_own_error() {
        let config = PipelineConfig::default();
        assert_eq!(
            extract_and_validate("  \n ", &config),
            Err(RecoveryError::EmptyResponse)
        );
    }

    #[test]
    fn extraction_failure_carries_bounded_preview() {
        let config = PipelineConfig {
            preview_chars: 10,
            ..PipelineConfig::default()
        };
        let raw = "I'm sorry, I can't produce a program right now.";
        match extract_and_validate(raw, &config) {
            Err(RecoveryError::Extraction { reason, preview }) => {
                assert!(reason.contains("Could not extract valid JSON"));
                assert_eq!(preview, "I'm sorry,…[TRUNCATED]");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn validation_failure_lists_violations() {
        let config = PipelineConfig::default();
        let raw = r#"{"program_type": "single_session", "plan_data": []}"#;
        match extract_and_validate(raw, &config) {
            Err(RecoveryError::Validation(violations)) => {
                assert!(violations.iter().any(|v| v.path == "rationale"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn reports_strategy_and_repair() {
        let config = PipelineConfig::default();
        let body = json!({
            "program_type": "single_session",
            "rationale": "Technique focus session.",
            "plan_data": [day("Back Squat", 1, 1)]
        })
        .to_string()
        .replace("Controlled eccentric.", "Controlled\neccentric.");
        let raw = format!("Here it is:\n```json\n{body}\n```");
        let validated = extract_and_validate(&raw, &config).unwrap();
        assert_eq!(validated.strategy, ExtractionStrategy::BoundarySearch);
        assert!(validated.repaired);
    }

    #[test]
    fn normalizes_matches_and_renumbers() {
        let raw = multi_week(
            vec![
                day("Barbell Back Squat", 1, 1),
                day("DB Bench Press", 1, 1),
                day("Cable Row", 1, 1),
                day("Barbell Back Squat", 1, 1),
                day("Zottman Curl", 1, 1),
                day("Pull-ups", 1, 1),
            ],
            json!({"total_weeks": 3, "workouts_per_week": 2}),
        );
        let cat = catalog();
        let recovered = recover_program(&raw, &cat, &PipelineConfig::default()).unwrap();

        assert_eq!(recovered.workouts_per_week, 2);
        let positions: Vec<_> = recovered
            .program
            .days()
            .iter()
            .filter_map(|d| d.position())
            .collect();
        assert_eq!(positions, vec![(1, 1), (1, 2), (2, 1), (2, 2), (3, 1), (3, 2)]);

        let first = &recovered.program.days()[0].exercises[0];
        assert_eq!(first.raw_name, "Barbell Back Squat");
        assert_eq!(first.name, "Back Squat");
        assert_eq!(first.equipment, vec!["Barbell".to_string()]);

        assert_eq!(recovered.matches.len(), 6);
        assert_eq!(recovered.matches[0].tier, MatchTier::AutoAccept);
        assert_eq!(recovered.matches[0].result.exercise.unwrap().name, "Back Squat");
        assert_eq!(recovered.matches[2].name, "Row");
        assert_eq!(recovered.matches[5].result.confidence, 1.0);
        assert!(recovered.needs_review().any(|m| m.name == "Zottman Curl"));
    }

    #[test]
    fn infers_workouts_per_week_and_writes_it_back() {
        let raw = multi_week(
            (0..7).map(|_| day("Deadlift", 9, 9)).collect(),
            json!({"total_weeks": 2}),
        );
        let cat = catalog();
        let recovered = recover_program(&raw, &cat, &PipelineConfig::default()).unwrap();
        assert_eq!(recovered.workouts_per_week, 4);
        match &recovered.program {
            ValidatedProgram::MultiWeekPlan(plan) => {
                assert_eq!(plan.mesocycle_info.as_ref().unwrap().workouts_per_week, Some(4));
                assert_eq!(plan.days[6].position(), Some((2, 3)));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn missing_mesocycle_uses_default_weeks() {
        let raw = multi_week((0..8).map(|_| day("Deadlift", 1, 1)).collect(), json!(null));
        let config = PipelineConfig {
            default_total_weeks: 4,
            ..PipelineConfig::default()
        };
        let cat = catalog();
        let recovered = recover_program(&raw, &cat, &config).unwrap();
        assert_eq!(recovered.workouts_per_week, 2);
        assert_eq!(recovered.program.days()[7].position(), Some((4, 2)));
        match &recovered.program {
            ValidatedProgram::MultiWeekPlan(plan) => {
                let meso = plan.mesocycle_info.as_ref().unwrap();
                assert_eq!(meso.total_weeks, 4);
                assert_eq!(meso.workouts_per_week, Some(2));
                assert!(meso.deload_weeks.is_empty());
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn stated_workouts_per_week_is_not_trusted() {
        let raw = multi_week(
            (0..16).map(|_| day("Deadlift", 1, 1)).collect(),
            json!({"total_weeks": 4, "workouts_per_week": 3, "deload_weeks": [4]}),
        );
        let cat = catalog();
        let recovered = recover_program(&raw, &cat, &PipelineConfig::default()).unwrap();
        assert_eq!(recovered.workouts_per_week, 4);

        let last = recovered.program.days().last().and_then(|d| d.position());
        assert_eq!(last, Some((4, 4)));
        assert!(recovered
            .program
            .days()
            .iter()
            .all(|d| d.week.is_some_and(|w| w <= 4)));

        match &recovered.program {
            ValidatedProgram::MultiWeekPlan(plan) => {
                let meso = plan.mesocycle_info.as_ref().unwrap();
                assert_eq!(meso.workouts_per_week, Some(4));
                assert_eq!(meso.total_weeks, 4);
                assert_eq!(meso.deload_weeks, vec![4]);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn normalize_program_is_usable_without_extraction() {
        let value: serde_json::Value = serde_json::from_str(&multi_week(
            (0..3).map(|_| day("Barbell Back Squat", 2, 2)).collect(),
            json!({"total_weeks": 3}),
        ))
        .unwrap();
        let program = validate_program(&value).unwrap();
        assert_eq!(program.rationale(), "Three week strength block.");

        let cat = catalog();
        let normalized = normalize_program(program, &cat, &PipelineConfig::default());
        assert_eq!(normalized.workouts_per_week, 1);
        assert_eq!(normalized.program.days()[2].position(), Some((3, 1)));
        assert!(normalized.matches.iter().all(|m| m.tier == MatchTier::AutoAccept));
    }

    #[test]
    fn single_session_is_one_workout() {
        let raw = json!({
            "program_type": "single_session",
            "rationale": "Push day with heavier bench.",
            "plan_data": [day("Bench Press", 3, 2)]
        })
        .to_string();
        let cat = catalog();
        let recovered = recover_program(&raw, &cat, &PipelineConfig::default()).unwrap();
        assert_eq!(recovered.workouts_per_week, 1);
        assert_eq!(recovered.program.days()[0].position(), Some((1, 1)));
    }

    #[test]
    fn empty_catalog_marks_everything_unmatched() {
        let raw = json!({
            "program_type": "single_session",
            "rationale": "Push day with heavier bench.",
            "plan_data": [day("Bench Press", 1, 1)]
        })
        .to_string();
        let recovered = recover_program(&raw, &[], &PipelineConfig::default()).unwrap();
        assert_eq!(recovered.matches[0].tier, MatchTier::NoMatch);
        assert_eq!(recovered.matches[0].result.confidence, 0.0);
    }

    #[test]
    fn run_ids_are_unique() {
        let raw = json!({
            "program_type": "single_session",
            "rationale": "Push day with heavier bench.",
            "plan_data": [day("Bench Press", 1, 1)]
        })
        .to_string();
        let cat = catalog();
        let config = PipelineConfig::default();
        let a = recover_program(&raw, &cat, &config).unwrap();
        let b = recover_program(&raw, &cat, &config).unwrap();
        assert_ne!(a.run_id, b.run_id);
    }
}
