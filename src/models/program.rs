use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::enums::ProgramKind;

/// One prescribed set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetPrescription {
    /// Load in kilograms; 0 for bodyweight work.
    pub weight: f64,
    pub reps: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExerciseEntry {
    /// Name exactly as the model emitted it.
    pub raw_name: String,
    /// Name with any leading equipment prefix removed.
    pub name: String,
    pub equipment: Vec<String>,
    pub sets: Vec<SetPrescription>,
}

impl ExerciseEntry {
    /// Entry as read from the model, before normalization.
    pub fn from_raw(raw_name: &str, equipment: Vec<String>, sets: Vec<SetPrescription>) -> Self {
        Self {
            raw_name: raw_name.to_string(),
            name: raw_name.trim().to_string(),
            equipment,
            sets,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgramDay {
    /// Model-reported until sequence correction, authoritative after.
    pub week: Option<u32>,
    pub workout_index: Option<u32>,
    #[serde(default)]
    pub is_deload: bool,
    pub exercises: Vec<ExerciseEntry>,
    pub coaching_notes: String,
}

impl ProgramDay {
    pub fn position(&self) -> Option<(u32, u32)> {
        Some((self.week?, self.workout_index?))
    }
}

/// Periodization metadata attached to multi-week plans.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MesocycleInfo {
    pub total_weeks: u32,
    #[serde(default)]
    pub workouts_per_week: Option<u32>,
    #[serde(default)]
    pub deload_weeks: Vec<u32>,
    #[serde(default)]
    pub periodization_model: Option<String>,
    #[serde(default)]
    pub phase: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SingleSession {
    pub rationale: String,
    #[serde(rename = "plan_data")]
    pub days: Vec<ProgramDay>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultiWeekPlan {
    pub rationale: String,
    pub valid_from: NaiveDate,
    pub valid_until: NaiveDate,
    #[serde(default)]
    pub mesocycle_info: Option<MesocycleInfo>,
    #[serde(rename = "plan_data")]
    pub days: Vec<ProgramDay>,
}

/// Schema-checked program. Constructed only by validation; downstream code
/// may rely on every required field being present and correctly typed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "program_type", rename_all = "snake_case")]
pub enum ValidatedProgram {
    SingleSession(SingleSession),
    MultiWeekPlan(MultiWeekPlan),
}

impl ValidatedProgram {
    pub fn kind(&self) -> ProgramKind {
        match self {
            Self::SingleSession(_) => ProgramKind::SingleSession,
            Self::MultiWeekPlan(_) => ProgramKind::MultiWeekPlan,
        }
    }

    pub fn rationale(&self) -> &str {
        match self {
            Self::SingleSession(s) => &s.rationale,
            Self::MultiWeekPlan(p) => &p.rationale,
        }
    }

    pub fn days(&self) -> &[ProgramDay] {
        match self {
            Self::SingleSession(s) => &s.days,
            Self::MultiWeekPlan(p) => &p.days,
        }
    }

    pub fn days_mut(&mut self) -> &mut Vec<ProgramDay> {
        match self {
            Self::SingleSession(s) => &mut s.days,
            Self::MultiWeekPlan(p) => &mut p.days,
        }
    }

    pub fn exercise_count(&self) -> usize {
        self.days().iter().map(|d| d.exercises.len()).sum()
    }
}
