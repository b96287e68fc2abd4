//! Peak sustained efforts
//!
//! For each fixed duration, finds the window with the fastest mean pace.
//! A window starting at sample `i` ends at the first sample `j` whose
//! timestamp is at least the duration past `time[i]`. Because time never
//! decreases, the end pointer only ever moves forward as the start advances,
//! so each duration is a single two-pointer sweep.

use super::streams::{window, StreamIndex};
use super::{mean_nonzero, mean_present};
use crate::rounding::{round_to, round_whole};
use serde::ser::{Serialize, SerializeStruct, Serializer};

/// Durations searched, in seconds, with their labels
pub const PEAK_DURATIONS: [(u32, &str); 4] =
    [(60, "1min"), (300, "5min"), (600, "10min"), (1200, "20min")];

/// Best window found for one duration
#[derive(Debug, Clone, PartialEq)]
pub struct PeakEffort {
    /// Requested window length in seconds
    pub duration_secs: u32,
    /// Duration label, e.g. "5min"
    pub label: &'static str,
    /// Mean pace over the window (min/km)
    pub pace_min_per_km: f64,
    /// Mean heart rate over the same window
    pub avg_hr: Option<u32>,
    /// First sample of the window
    pub start_index: usize,
    /// Last sample of the window (inclusive)
    pub end_index: usize,
}

impl PeakEffort {
    /// Key used in the serialized `peak_efforts` map
    pub fn key(&self) -> String {
        format!("peak_{}", self.label)
    }
}

impl Serialize for PeakEffort {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("PeakEffort", 2)?;
        state.serialize_field("pace_min_per_km", &self.pace_min_per_km)?;
        state.serialize_field("avg_hr", &self.avg_hr)?;
        state.end()
    }
}

/// Peak efforts of one activity, ordered by ascending duration.
///
/// Serializes as a map from `peak_<label>` to the effort.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PeakEfforts(Vec<PeakEffort>);

impl PeakEfforts {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PeakEffort> {
        self.0.iter()
    }

    /// Effort for a duration label such as "10min"
    pub fn get(&self, label: &str) -> Option<&PeakEffort> {
        self.0.iter().find(|effort| effort.label == label)
    }
}

impl Serialize for PeakEfforts {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.0.iter().map(|effort| (effort.key(), effort)))
    }
}

/// Finds the fastest sustained windows of an activity
pub struct PeakEffortFinder;

impl PeakEffortFinder {
    /// Search every duration in [`PEAK_DURATIONS`].
    ///
    /// Returns no efforts when the velocity stream is missing or empty.
    /// Durations longer than the activity are left out.
    pub fn find(streams: &StreamIndex<'_>) -> PeakEfforts {
        let time = streams.time();
        let velocity = streams.velocity();
        if time.is_empty() || velocity.is_empty() {
            return PeakEfforts::default();
        }
        let heartrate = streams.heartrate();

        let efforts = PEAK_DURATIONS
            .iter()
            .filter_map(|&(duration_secs, label)| {
                best_window(time, velocity, heartrate, f64::from(duration_secs)).map(|best| {
                    PeakEffort {
                        duration_secs,
                        label,
                        pace_min_per_km: round_to(best.pace, 2),
                        avg_hr: best.avg_hr.filter(|&hr| hr != 0.0).map(round_whole),
                        start_index: best.start,
                        end_index: best.end,
                    }
                })
            })
            .collect();

        PeakEfforts(efforts)
    }
}

struct Window {
    start: usize,
    end: usize,
    pace: f64,
    avg_hr: Option<f64>,
}

fn best_window(
    time: &[Option<f64>],
    velocity: &[Option<f64>],
    heartrate: &[Option<f64>],
    duration: f64,
) -> Option<Window> {
    let mut best: Option<Window> = None;
    let mut end = 0;

    for (start, started_at) in time.iter().enumerate() {
        let Some(started_at) = *started_at else { continue };

        end = end.max(start);
        while end < time.len() && !time[end].is_some_and(|t| t - started_at >= duration) {
            end += 1;
        }
        if end == time.len() {
            // Later starts cannot fit the duration either
            break;
        }

        let Some(avg_velocity) = mean_nonzero(window(velocity, start, end)) else {
            continue;
        };
        if avg_velocity <= 0.0 {
            continue;
        }

        let pace = (1000.0 / avg_velocity) / 60.0;
        if best.as_ref().map_or(true, |b| pace < b.pace) {
            best = Some(Window {
                start,
                end,
                pace,
                avg_hr: mean_present(window(heartrate, start, end)),
            });
        }
    }

    best
}
