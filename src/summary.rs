//! Period summary
//!
//! Totals and averages over every flattened activity and wellness record of
//! an export. Averages only consider present, nonzero values.

use crate::config::DigestConfig;
use crate::rounding::round_to;
use crate::types::{ActivityRecord, WellnessRecord};
use serde::Serialize;
use std::collections::BTreeSet;

/// Date range covered by the export
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Period {
    pub start: Option<String>,
    pub end: Option<String>,
    /// Number of distinct wellness days
    pub days: usize,
}

/// Totals over all activities
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Totals {
    pub activities: usize,
    pub runs: usize,
    pub rides: usize,
    pub total_distance_km: f64,
    pub total_time_hours: f64,
    pub total_elevation_m: f64,
    pub total_training_load: f64,
    pub total_calories: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunningSummary {
    pub count: usize,
    pub distance_km: f64,
    pub time_hours: f64,
    pub avg_pace_min_per_km: Option<f64>,
    pub avg_hr: Option<f64>,
    pub elevation_gain_m: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CyclingSummary {
    pub count: usize,
    pub distance_km: f64,
    pub time_hours: f64,
    pub avg_speed_kmh: Option<f64>,
    pub avg_hr: Option<f64>,
}

/// Fitness and recovery trend across the wellness records
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FitnessTrend {
    pub ctl_start: Option<f64>,
    pub ctl_end: Option<f64>,
    pub ctl_change: Option<f64>,
    pub avg_resting_hr: Option<f64>,
    pub avg_sleep_hours: Option<f64>,
    pub avg_steps: f64,
}

/// Summary statistics for the whole export period
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PeriodSummary {
    pub period: Period,
    pub totals: Totals,
    pub running: RunningSummary,
    pub cycling: CyclingSummary,
    pub fitness_trend: FitnessTrend,
}

impl PeriodSummary {
    /// Summarize flattened records.
    ///
    /// `wellness` is taken in export order: the CTL trend runs from its first
    /// to its last record.
    pub fn calculate(
        activities: &[ActivityRecord],
        wellness: &[WellnessRecord],
        config: &DigestConfig,
    ) -> Self {
        let runs: Vec<&ActivityRecord> = activities
            .iter()
            .filter(|a| config.is_run(a.activity_type.as_deref()))
            .collect();
        let rides: Vec<&ActivityRecord> = activities
            .iter()
            .filter(|a| config.is_ride(a.activity_type.as_deref()))
            .collect();
        let all: Vec<&ActivityRecord> = activities.iter().collect();

        Self {
            period: period(activities, wellness),
            totals: Totals {
                activities: activities.len(),
                runs: runs.len(),
                rides: rides.len(),
                total_distance_km: round_to(sum_field(&all, |a| Some(a.distance_km)), 1),
                total_time_hours: round_to(sum_field(&all, |a| Some(a.moving_time_min)) / 60.0, 1),
                total_elevation_m: round_to(sum_field(&all, |a| Some(a.elevation_gain_m)), 0),
                total_training_load: round_to(
                    sum_field(&all, |a| a.training_load.as_ref().and_then(|n| n.as_f64())),
                    0,
                ),
                total_calories: round_to(
                    sum_field(&all, |a| a.calories.as_ref().and_then(|n| n.as_f64())),
                    0,
                ),
            },
            running: RunningSummary {
                count: runs.len(),
                distance_km: round_to(sum_field(&runs, |a| Some(a.distance_km)), 1),
                time_hours: round_to(sum_field(&runs, |a| Some(a.moving_time_min)) / 60.0, 1),
                avg_pace_min_per_km: avg_field(&runs, |a| a.avg_pace_min_per_km),
                avg_hr: avg_field(&runs, |a| a.avg_hr.as_ref().and_then(|n| n.as_f64())),
                elevation_gain_m: round_to(sum_field(&runs, |a| Some(a.elevation_gain_m)), 0),
            },
            cycling: CyclingSummary {
                count: rides.len(),
                distance_km: round_to(sum_field(&rides, |a| Some(a.distance_km)), 1),
                time_hours: round_to(sum_field(&rides, |a| Some(a.moving_time_min)) / 60.0, 1),
                avg_speed_kmh: avg_field(&rides, |a| a.avg_speed_kmh),
                avg_hr: avg_field(&rides, |a| a.avg_hr.as_ref().and_then(|n| n.as_f64())),
            },
            fitness_trend: fitness_trend(wellness),
        }
    }
}

fn period(activities: &[ActivityRecord], wellness: &[WellnessRecord]) -> Period {
    let mut dates: Vec<&str> = activities
        .iter()
        .map(|a| a.date.as_str())
        .filter(|d| !d.is_empty())
        .collect();
    dates.sort_unstable();

    let wellness_days: BTreeSet<&str> = wellness
        .iter()
        .filter_map(|w| w.date.as_deref())
        .filter(|d| !d.is_empty())
        .collect();

    Period {
        start: dates.first().map(|d| d.to_string()),
        end: dates.last().map(|d| d.to_string()),
        days: wellness_days.len(),
    }
}

fn fitness_trend(wellness: &[WellnessRecord]) -> FitnessTrend {
    let records: Vec<&WellnessRecord> = wellness.iter().collect();
    let first = wellness.first().map(|w| w.ctl_fitness);
    let last = wellness.last().map(|w| w.ctl_fitness);

    let ctl_change = match (first, last) {
        (Some(start), Some(end)) if wellness.len() >= 2 => Some(round_to(end - start, 1)),
        _ => None,
    };

    FitnessTrend {
        ctl_start: first,
        ctl_end: last,
        ctl_change,
        avg_resting_hr: avg_field(&records, |w| w.resting_hr.as_ref().and_then(|n| n.as_f64())),
        avg_sleep_hours: avg_field(&records, |w| w.sleep_hours),
        avg_steps: round_to(
            avg_field(&records, |w| w.steps.as_ref().and_then(|n| n.as_f64())).unwrap_or(0.0),
            0,
        ),
    }
}

/// Sum of a field, counting missing values as zero
fn sum_field<T>(items: &[&T], field: impl Fn(&T) -> Option<f64>) -> f64 {
    items
        .iter()
        .filter_map(|&item| field(item))
        .fold(0.0, |total, value| total + value)
}

/// Mean of the present, nonzero values of a field, 1 decimal place
fn avg_field<T>(items: &[&T], field: impl Fn(&T) -> Option<f64>) -> Option<f64> {
    let values: Vec<f64> = items
        .iter()
        .filter_map(|&item| field(item))
        .filter(|&v| v != 0.0)
        .collect();
    if values.is_empty() {
        return None;
    }
    let total = values.iter().fold(0.0, |total, value| total + value);
    Some(round_to(total / values.len() as f64, 1))
}
