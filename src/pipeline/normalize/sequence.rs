//! Positional renumbering of program days.
//!
//! Models reliably get day order right and reliably get week numbers wrong,
//! so the list order is trusted and every `(week, workout_index)` pair is
//! recomputed from position. Day `i` (zero-based) lands on
//! `week = i / W + 1`, `workout_index = i % W + 1`.

use crate::models::ProgramDay;

/// Overwrite the week and workout index of every day from its position.
/// A `workouts_per_week` of zero is treated as one.
pub fn correct_sequence(mut days: Vec<ProgramDay>, workouts_per_week: u32) -> Vec<ProgramDay> {
    let per_week = if workouts_per_week == 0 {
        tracing::warn!("workouts_per_week is 0, treating as 1");
        1
    } else {
        workouts_per_week
    };

    let mut changed = 0usize;
    for (i, day) in days.iter_mut().enumerate() {
        let i = i as u32;
        let week = i / per_week + 1;
        let workout_index = i % per_week + 1;

        if day.week != Some(week) || day.workout_index != Some(workout_index) {
            tracing::debug!(
                position = i,
                old_week = ?day.week,
                old_index = ?day.workout_index,
                week,
                workout_index,
                "Renumbered program day"
            );
            changed += 1;
        }

        day.week = Some(week);
        day.workout_index = Some(workout_index);
    }

    tracing::info!(
        total = days.len(),
        changed,
        workouts_per_week = per_week,
        "Sequence correction complete"
    );

    days
}

/// `ceil(day_count / total_weeks)`, never below 1.
pub fn infer_workouts_per_week(day_count: usize, total_weeks: u32) -> u32 {
    if total_weeks == 0 || day_count == 0 {
        return 1;
    }
    let weeks = total_weeks as usize;
    (day_count.div_ceil(weeks)).max(1) as u32
}
