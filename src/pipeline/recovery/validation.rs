// Schema validation for extracted program JSON.
// Dispatches on `program_type`, then walks every field collecting violations
// instead of stopping at the first one. Reads the value only; a typed program
// is built solely when no violation was found.

use std::str::FromStr;
use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::models::{
    ExerciseEntry, MesocycleInfo, MultiWeekPlan, ProgramDay, ProgramKind, SetPrescription,
    SingleSession, ValidatedProgram,
};

const MIN_RATIONALE_CHARS: usize = 10;
const MIN_COACHING_NOTES_CHARS: usize = 5;

/// 12 weeks of daily sessions.
const MAX_PLAN_DAYS: usize = 84;
const MAX_TOTAL_WEEKS: u64 = 52;
const MAX_WORKOUTS_PER_WEEK: u64 = 14;

static ISO_DATE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").unwrap());

/// One schema violation, addressed by a dotted field path
/// (`plan_data[2].exercises[0].sets[1].reps`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    pub path: String,
    pub message: String,
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.path.is_empty() {
            write!(f, "{}", self.message)
        } else {
            write!(f, "{}: {}", self.path, self.message)
        }
    }
}

#[derive(Default)]
struct Violations(Vec<Violation>);

impl Violations {
    fn push(&mut self, path: &str, message: impl Into<String>) {
        self.0.push(Violation {
            path: path.to_string(),
            message: message.into(),
        });
    }
}

/// Validate a recovered JSON value against the program schema.
pub fn validate_program(value: &Value) -> Result<ValidatedProgram, Vec<Violation>> {
    let mut violations = Violations::default();

    let Some(obj) = value.as_object() else {
        violations.push("", format!("Expected object, received {}", type_name(value)));
        return Err(violations.0);
    };

    let kind = match obj.get("program_type") {
        None | Some(Value::Null) => {
            violations.push("program_type", "Required");
            None
        }
        Some(Value::String(s)) => match ProgramKind::from_str(s) {
            Ok(kind) => Some(kind),
            Err(_) => {
                violations.push(
                    "program_type",
                    format!(
                        "Invalid discriminator value. Expected 'single_session' | 'multi_week_plan', received '{s}'"
                    ),
                );
                None
            }
        },
        Some(other) => {
            violations.push(
                "program_type",
                format!("Expected string, received {}", type_name(other)),
            );
            None
        }
    };

    // Without a usable tag there is no variant schema to check against.
    let Some(kind) = kind else {
        return Err(violations.0);
    };

    let program = match kind {
        ProgramKind::SingleSession => {
            single_session(obj, &mut violations).map(ValidatedProgram::SingleSession)
        }
        ProgramKind::MultiWeekPlan => {
            multi_week_plan(obj, &mut violations).map(ValidatedProgram::MultiWeekPlan)
        }
    };

    match program {
        Some(program) if violations.0.is_empty() => Ok(program),
        _ => Err(violations.0),
    }
}

fn single_session(obj: &Map<String, Value>, v: &mut Violations) -> Option<SingleSession> {
    let rationale = required_string(obj, "rationale", "", MIN_RATIONALE_CHARS, v);
    let days = plan_days(obj, v, 1, 1);
    Some(SingleSession {
        rationale: rationale?,
        days: days?,
    })
}

fn multi_week_plan(obj: &Map<String, Value>, v: &mut Violations) -> Option<MultiWeekPlan> {
    let rationale = required_string(obj, "rationale", "", MIN_RATIONALE_CHARS, v);
    let valid_from = iso_date(obj, "valid_from", v);
    let valid_until = iso_date(obj, "valid_until", v);
    let mesocycle_info = match obj.get("mesocycle_info") {
        None | Some(Value::Null) => Some(None),
        Some(value) => mesocycle(value, "mesocycle_info", v).map(Some),
    };
    let days = plan_days(obj, v, 1, MAX_PLAN_DAYS);
    Some(MultiWeekPlan {
        rationale: rationale?,
        valid_from: valid_from?,
        valid_until: valid_until?,
        mesocycle_info: mesocycle_info?,
        days: days?,
    })
}

fn plan_days(
    obj: &Map<String, Value>,
    v: &mut Violations,
    min: usize,
    max: usize,
) -> Option<Vec<ProgramDay>> {
    let items = required_array(obj, "plan_data", "", v)?;
    let mut ok = check_length(items.len(), min, max, "plan_data", v);
    let mut days = Vec::with_capacity(items.len());
    for (i, item) in items.iter().enumerate() {
        match program_day(item, &format!("plan_data[{i}]"), v) {
            Some(day) => days.push(day),
            None => ok = false,
        }
    }
    ok.then_some(days)
}

fn program_day(value: &Value, path: &str, v: &mut Violations) -> Option<ProgramDay> {
    let obj = require_object(value, path, v)?;

    let is_deload = match obj.get("is_deload") {
        None | Some(Value::Null) => Some(false),
        Some(Value::Bool(b)) => Some(*b),
        Some(other) => {
            v.push(
                &join(path, "is_deload"),
                format!("Expected boolean, received {}", type_name(other)),
            );
            None
        }
    };

    let exercises = required_array(obj, "exercises", path, v).and_then(|items| {
        let field = join(path, "exercises");
        let mut ok = check_length(items.len(), 1, usize::MAX, &field, v);
        let mut entries = Vec::with_capacity(items.len());
        for (i, item) in items.iter().enumerate() {
            match exercise(item, &format!("{field}[{i}]"), v) {
                Some(entry) => entries.push(entry),
                None => ok = false,
            }
        }
        ok.then_some(entries)
    });

    let coaching_notes =
        required_string(obj, "coaching_notes", path, MIN_COACHING_NOTES_CHARS, v);

    Some(ProgramDay {
        week: advisory_ordinal(obj.get("week")),
        workout_index: advisory_ordinal(obj.get("workout_index")),
        is_deload: is_deload?,
        exercises: exercises?,
        coaching_notes: coaching_notes?,
    })
}

fn exercise(value: &Value, path: &str, v: &mut Violations) -> Option<ExerciseEntry> {
    let obj = require_object(value, path, v)?;

    let name = match obj.get("name") {
        None | Some(Value::Null) => {
            v.push(&join(path, "name"), "Exercise name is required");
            None
        }
        Some(Value::String(s)) if s.trim().is_empty() => {
            v.push(&join(path, "name"), "Exercise name cannot be empty");
            None
        }
        Some(Value::String(s)) => Some(s.as_str()),
        Some(other) => {
            v.push(
                &join(path, "name"),
                format!("Expected string, received {}", type_name(other)),
            );
            None
        }
    };

    let equipment = match obj.get("equipment") {
        None | Some(Value::Null) => Some(Vec::new()),
        Some(Value::Array(items)) => {
            let field = join(path, "equipment");
            let mut ok = true;
            let mut names = Vec::with_capacity(items.len());
            for (i, item) in items.iter().enumerate() {
                match item.as_str() {
                    Some(s) => names.push(s.to_string()),
                    None => {
                        v.push(
                            &format!("{field}[{i}]"),
                            format!("Expected string, received {}", type_name(item)),
                        );
                        ok = false;
                    }
                }
            }
            ok.then_some(names)
        }
        Some(other) => {
            v.push(
                &join(path, "equipment"),
                format!("Expected array, received {}", type_name(other)),
            );
            None
        }
    };

    let sets = required_array(obj, "sets", path, v).and_then(|items| {
        let field = join(path, "sets");
        let mut ok = check_length(items.len(), 1, usize::MAX, &field, v);
        let mut sets = Vec::with_capacity(items.len());
        for (i, item) in items.iter().enumerate() {
            match set_prescription(item, &format!("{field}[{i}]"), v) {
                Some(set) => sets.push(set),
                None => ok = false,
            }
        }
        ok.then_some(sets)
    });

    Some(ExerciseEntry::from_raw(name?, equipment?, sets?))
}

fn set_prescription(value: &Value, path: &str, v: &mut Violations) -> Option<SetPrescription> {
    let obj = require_object(value, path, v)?;

    let weight = match obj.get("weight") {
        None | Some(Value::Null) => {
            v.push(&join(path, "weight"), "Weight is required");
            None
        }
        Some(Value::Number(n)) => match n.as_f64() {
            Some(w) if w >= 0.0 => Some(w),
            _ => {
                v.push(
                    &join(path, "weight"),
                    "Weight must be 0 or greater (0 for bodyweight exercises)",
                );
                None
            }
        },
        Some(other) => {
            v.push(
                &join(path, "weight"),
                format!("Weight must be a number, received {}", type_name(other)),
            );
            None
        }
    };

    let reps = match obj.get("reps") {
        None | Some(Value::Null) => {
            v.push(&join(path, "reps"), "Reps is required");
            None
        }
        Some(Value::Number(n)) => match (n.as_u64(), n.as_f64()) {
            (Some(r), _) if r >= 1 && r <= u64::from(u32::MAX) => Some(r as u32),
            (Some(_), _) => {
                v.push(&join(path, "reps"), "Reps must be a positive number");
                None
            }
            (None, Some(f)) if f.fract() == 0.0 && f < 1.0 => {
                v.push(&join(path, "reps"), "Reps must be a positive number");
                None
            }
            _ => {
                v.push(&join(path, "reps"), "Reps must be a whole number");
                None
            }
        },
        Some(other) => {
            v.push(
                &join(path, "reps"),
                format!("Reps must be a number, received {}", type_name(other)),
            );
            None
        }
    };

    let notes = optional_string(obj, "notes", path, v);

    Some(SetPrescription {
        weight: weight?,
        reps: reps?,
        notes: notes?,
    })
}

fn mesocycle(value: &Value, path: &str, v: &mut Violations) -> Option<MesocycleInfo> {
    let obj = require_object(value, path, v)?;

    let total_weeks = match obj.get("total_weeks") {
        None | Some(Value::Null) => {
            v.push(&join(path, "total_weeks"), "Required");
            None
        }
        Some(value) => bounded_integer(value, &join(path, "total_weeks"), 1, MAX_TOTAL_WEEKS, v),
    };

    let workouts_per_week = match obj.get("workouts_per_week") {
        None | Some(Value::Null) => Some(None),
        Some(value) => bounded_integer(
            value,
            &join(path, "workouts_per_week"),
            1,
            MAX_WORKOUTS_PER_WEEK,
            v,
        )
        .map(Some),
    };

    let deload_weeks = match obj.get("deload_weeks") {
        None | Some(Value::Null) => Some(Vec::new()),
        Some(Value::Array(items)) => {
            let field = join(path, "deload_weeks");
            let mut ok = true;
            let mut weeks = Vec::with_capacity(items.len());
            for (i, item) in items.iter().enumerate() {
                match bounded_integer(item, &format!("{field}[{i}]"), 1, MAX_TOTAL_WEEKS, v) {
                    Some(w) => weeks.push(w),
                    None => ok = false,
                }
            }
            ok.then_some(weeks)
        }
        Some(other) => {
            v.push(
                &join(path, "deload_weeks"),
                format!("Expected array, received {}", type_name(other)),
            );
            None
        }
    };

    let periodization_model = optional_string(obj, "periodization_model", path, v);
    let phase = optional_string(obj, "phase", path, v);

    Some(MesocycleInfo {
        total_weeks: total_weeks?,
        workouts_per_week: workouts_per_week?,
        deload_weeks: deload_weeks?,
        periodization_model: periodization_model?,
        phase: phase?,
    })
}

// ═══════════════════════════════════════════
// Field helpers
// ═══════════════════════════════════════════

fn join(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_string()
    } else {
        format!("{path}.{key}")
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn require_object<'a>(
    value: &'a Value,
    path: &str,
    v: &mut Violations,
) -> Option<&'a Map<String, Value>> {
    match value.as_object() {
        Some(obj) => Some(obj),
        None => {
            v.push(path, format!("Expected object, received {}", type_name(value)));
            None
        }
    }
}

fn required_array<'a>(
    obj: &'a Map<String, Value>,
    key: &str,
    path: &str,
    v: &mut Violations,
) -> Option<&'a Vec<Value>> {
    match obj.get(key) {
        None | Some(Value::Null) => {
            v.push(&join(path, key), "Required");
            None
        }
        Some(Value::Array(items)) => Some(items),
        Some(other) => {
            v.push(
                &join(path, key),
                format!("Expected array, received {}", type_name(other)),
            );
            None
        }
    }
}

fn check_length(len: usize, min: usize, max: usize, field: &str, v: &mut Violations) -> bool {
    if min == max && len != min {
        v.push(field, format!("Array must contain exactly {min} element(s)"));
        false
    } else if len < min {
        v.push(field, format!("Array must contain at least {min} element(s)"));
        false
    } else if len > max {
        v.push(field, format!("Array must contain at most {max} element(s)"));
        false
    } else {
        true
    }
}

fn required_string(
    obj: &Map<String, Value>,
    key: &str,
    path: &str,
    min_chars: usize,
    v: &mut Violations,
) -> Option<String> {
    match obj.get(key) {
        None | Some(Value::Null) => {
            v.push(&join(path, key), "Required");
            None
        }
        Some(Value::String(s)) if s.chars().count() < min_chars => {
            v.push(
                &join(path, key),
                format!("String must contain at least {min_chars} character(s)"),
            );
            None
        }
        Some(Value::String(s)) => Some(s.clone()),
        Some(other) => {
            v.push(
                &join(path, key),
                format!("Expected string, received {}", type_name(other)),
            );
            None
        }
    }
}

/// `Some(None)` when absent or null, `None` on a type violation.
fn optional_string(
    obj: &Map<String, Value>,
    key: &str,
    path: &str,
    v: &mut Violations,
) -> Option<Option<String>> {
    match obj.get(key) {
        None | Some(Value::Null) => Some(None),
        Some(Value::String(s)) => Some(Some(s.clone())),
        Some(other) => {
            v.push(
                &join(path, key),
                format!("Expected string, received {}", type_name(other)),
            );
            None
        }
    }
}

fn bounded_integer(value: &Value, path: &str, min: u64, max: u64, v: &mut Violations) -> Option<u32> {
    match value.as_u64() {
        Some(n) if (min..=max).contains(&n) => Some(n as u32),
        Some(n) => {
            v.push(path, format!("Number must be between {min} and {max}, received {n}"));
            None
        }
        None if value.is_number() => {
            v.push(path, "Expected integer, received float");
            None
        }
        None => {
            v.push(path, format!("Expected integer, received {}", type_name(value)));
            None
        }
    }
}

fn iso_date(obj: &Map<String, Value>, key: &str, v: &mut Violations) -> Option<NaiveDate> {
    let raw = required_string(obj, key, "", 0, v)?;
    if !ISO_DATE.is_match(&raw) {
        v.push(key, "Invalid date format");
        return None;
    }
    match NaiveDate::parse_from_str(&raw, "%Y-%m-%d") {
        Ok(date) => Some(date),
        Err(_) => {
            v.push(key, format!("Invalid calendar date '{raw}'"));
            None
        }
    }
}

/// Week / workout ordinals are overwritten by sequence correction, so a
/// missing or malformed value is read as absent rather than rejected.
fn advisory_ordinal(value: Option<&Value>) -> Option<u32> {
    value
        .and_then(Value::as_u64)
        .and_then(|n| u32::try_from(n).ok())
}
