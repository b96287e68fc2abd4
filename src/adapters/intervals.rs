//! intervals.icu export adapter
//!
//! Maps the activity, wellness and calendar records of an intervals.icu
//! download to digest records. Units are converted to km, minutes and km/h.

use crate::rounding::round_to;
use crate::types::{
    ActivityRecord, PlannedWorkout, RawActivity, RawCalendarEvent, RawWellness, WellnessRecord,
};

use super::ExportAdapter;

/// intervals.icu export adapter
pub struct IntervalsAdapter;

impl ExportAdapter for IntervalsAdapter {
    fn activity(&self, raw: &RawActivity) -> ActivityRecord {
        let start = raw.start_date_local.as_deref().unwrap_or("");
        let distance = raw.distance.unwrap_or(0.0);
        let moving_time = raw.moving_time.unwrap_or(0.0);

        ActivityRecord {
            id: raw.id.clone(),
            date: slice_chars(start, 0, 10),
            time: slice_chars(start, 11, 16),
            activity_type: raw.activity_type.clone(),
            name: raw.name.clone(),
            description: raw.description.clone(),

            distance_km: round_to(distance / 1000.0, 2),
            moving_time_min: round_to(moving_time / 60.0, 1),
            elapsed_time_min: round_to(raw.elapsed_time.unwrap_or(0.0) / 60.0, 1),

            avg_pace_min_per_km: nonzero(raw.distance)
                .map(|d| round_to((moving_time / 60.0) / (d / 1000.0), 2)),
            avg_speed_kmh: nonzero(raw.average_speed).map(|v| round_to(v * 3.6, 1)),
            max_speed_kmh: nonzero(raw.max_speed).map(|v| round_to(v * 3.6, 1)),
            gap_pace: raw.gap.clone(),

            avg_hr: raw.average_heartrate.clone(),
            max_hr: raw.max_heartrate.clone(),
            hr_zone_times_sec: raw.icu_hr_zone_times.clone(),

            avg_cadence: nonzero(raw.average_cadence).map(|c| round_to(c, 1)),

            elevation_gain_m: round_to(raw.total_elevation_gain.unwrap_or(0.0), 0),
            elevation_loss_m: round_to(raw.total_elevation_loss.unwrap_or(0.0), 0),

            training_load: raw.icu_training_load.clone(),
            trimp: nonzero(raw.trimp).map(|t| round_to(t, 1)),
            calories: raw.calories.clone(),

            ctl_fitness: nonzero(raw.icu_ctl).map(|v| round_to(v, 1)),
            atl_fatigue: nonzero(raw.icu_atl).map(|v| round_to(v, 1)),

            pace_zone_times_sec: raw.pace_zone_times.clone(),
            device: raw.device_name.clone(),

            is_race: raw.race.unwrap_or(false),
            is_commute: raw.commute.unwrap_or(false),

            km_splits: None,
            peak_efforts: None,
            hr_zone_distribution: None,
        }
    }

    fn wellness(&self, raw: &RawWellness) -> WellnessRecord {
        let ctl = raw.ctl.unwrap_or(0.0);
        let atl = raw.atl.unwrap_or(0.0);

        WellnessRecord {
            date: raw.id.clone(),

            ctl_fitness: round_to(ctl, 1),
            atl_fatigue: round_to(atl, 1),
            tsb_form: round_to(ctl - atl, 1),
            ramp_rate: round_to(raw.ramp_rate.unwrap_or(0.0), 2),
            training_load: raw.ctl_load.clone(),

            resting_hr: raw.resting_hr.clone(),
            hrv: raw.hrv.clone(),
            hrv_sdnn: raw.hrv_sdnn.clone(),
            weight_kg: raw.weight.clone(),
            vo2max: raw.vo2max.clone(),

            sleep_hours: nonzero(raw.sleep_secs).map(|s| round_to(s / 3600.0, 1)),
            sleep_score: raw.sleep_score.clone(),
            sleep_quality: raw.sleep_quality.clone(),

            steps: raw.steps.clone(),

            soreness: raw.soreness.clone(),
            fatigue: raw.fatigue.clone(),
            stress: raw.stress.clone(),
            mood: raw.mood.clone(),
            motivation: raw.motivation.clone(),
            readiness: raw.readiness.clone(),

            sport_info: raw.sport_info.clone(),
        }
    }

    fn calendar_event(&self, raw: &RawCalendarEvent) -> PlannedWorkout {
        PlannedWorkout {
            id: raw.id.clone(),
            date: slice_chars(raw.start_date_local.as_deref().unwrap_or(""), 0, 10),
            event_type: raw.event_type.clone(),
            category: raw.category.clone(),
            name: raw.name.clone(),
            description: raw.description.clone(),
            planned_distance_km: nonzero(raw.distance).map(|d| round_to(d / 1000.0, 2)),
            planned_duration_min: nonzero(raw.moving_time).map(|t| round_to(t / 60.0, 1)),
            planned_load: raw.icu_training_load.clone(),
            completed: raw.paired_activity_id.is_some(),
            paired_activity_id: raw.paired_activity_id.clone(),
        }
    }
}

/// Characters `start..end` of an ISO timestamp, clipped to its length
fn slice_chars(s: &str, start: usize, end: usize) -> String {
    s.chars().skip(start).take(end.saturating_sub(start)).collect()
}

/// Treat zero the same as a missing value
fn nonzero(value: Option<f64>) -> Option<f64> {
    value.filter(|&v| v != 0.0)
}
