//! Core types for the Training Digest pipeline
//!
//! Raw records as they appear in a platform export, and the flattened
//! records that make up the digest.

use crate::analytics::streams::is_core_channel;
use crate::analytics::{PeakEfforts, Split, ZoneDistribution};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier that exports write either as a string or as a number
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordId {
    Text(String),
    Number(i64),
}

impl Default for RecordId {
    fn default() -> Self {
        RecordId::Text(String::new())
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordId::Text(s) => f.write_str(s),
            RecordId::Number(n) => write!(f, "{n}"),
        }
    }
}

/// Samples of one stream.
///
/// Most streams are flat numeric arrays with optional gaps; a few (such as
/// `latlng`) carry nested values and are kept only as opaque JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StreamData {
    Numeric(Vec<Option<f64>>),
    Structured(Vec<serde_json::Value>),
}

/// One named stream of an activity.
///
/// The channels the analytics read (see [`crate::analytics::streams`]) must
/// be numeric; anything else fails deserialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "StreamRecord")]
pub struct RawStream {
    /// Stream name, e.g. "heartrate" or "velocity_smooth"
    #[serde(rename = "type")]
    pub name: String,
    pub data: StreamData,
}

/// Wire shape of a stream before its channel is checked
#[derive(Deserialize)]
struct StreamRecord {
    #[serde(rename = "type")]
    name: String,
    data: StreamData,
}

impl TryFrom<StreamRecord> for RawStream {
    type Error = String;

    fn try_from(record: StreamRecord) -> Result<Self, Self::Error> {
        if is_core_channel(&record.name) && matches!(record.data, StreamData::Structured(_)) {
            return Err(format!(
                "stream '{}' must be an array of numbers or nulls",
                record.name
            ));
        }
        Ok(Self {
            name: record.name,
            data: record.data,
        })
    }
}

/// Activity as exported in `activities-detailed.json`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawActivity {
    pub id: RecordId,
    pub start_date_local: Option<String>,
    #[serde(rename = "type")]
    pub activity_type: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    /// Metres
    pub distance: Option<f64>,
    /// Seconds
    pub moving_time: Option<f64>,
    /// Seconds
    pub elapsed_time: Option<f64>,
    /// m/s
    pub average_speed: Option<f64>,
    /// m/s
    pub max_speed: Option<f64>,
    /// Grade adjusted pace
    pub gap: Option<serde_json::Number>,
    pub average_heartrate: Option<serde_json::Number>,
    pub max_heartrate: Option<serde_json::Number>,
    pub icu_hr_zone_times: Option<serde_json::Value>,
    pub average_cadence: Option<f64>,
    pub total_elevation_gain: Option<f64>,
    pub total_elevation_loss: Option<f64>,
    pub icu_training_load: Option<serde_json::Number>,
    pub trimp: Option<f64>,
    pub calories: Option<serde_json::Number>,
    pub icu_ctl: Option<f64>,
    pub icu_atl: Option<f64>,
    pub pace_zone_times: Option<serde_json::Value>,
    pub device_name: Option<String>,
    pub race: Option<bool>,
    pub commute: Option<bool>,
}

/// Daily wellness record as exported in `wellness.json`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawWellness {
    /// ISO date of the record
    pub id: Option<String>,
    pub ctl: Option<f64>,
    pub atl: Option<f64>,
    #[serde(rename = "rampRate")]
    pub ramp_rate: Option<f64>,
    #[serde(rename = "ctlLoad")]
    pub ctl_load: Option<serde_json::Number>,
    #[serde(rename = "restingHR")]
    pub resting_hr: Option<serde_json::Number>,
    pub hrv: Option<serde_json::Number>,
    #[serde(rename = "hrvSDNN")]
    pub hrv_sdnn: Option<serde_json::Number>,
    pub weight: Option<serde_json::Number>,
    pub vo2max: Option<serde_json::Number>,
    #[serde(rename = "sleepSecs")]
    pub sleep_secs: Option<f64>,
    #[serde(rename = "sleepScore")]
    pub sleep_score: Option<serde_json::Number>,
    #[serde(rename = "sleepQuality")]
    pub sleep_quality: Option<serde_json::Number>,
    pub steps: Option<serde_json::Number>,
    pub soreness: Option<serde_json::Number>,
    pub fatigue: Option<serde_json::Number>,
    pub stress: Option<serde_json::Number>,
    pub mood: Option<serde_json::Number>,
    pub motivation: Option<serde_json::Number>,
    pub readiness: Option<serde_json::Number>,
    #[serde(rename = "sportInfo")]
    pub sport_info: Option<serde_json::Value>,
}

/// Calendar entry as exported in `calendar-events.json`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawCalendarEvent {
    pub id: Option<RecordId>,
    pub start_date_local: Option<String>,
    #[serde(rename = "type")]
    pub event_type: Option<String>,
    pub category: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    /// Metres
    pub distance: Option<f64>,
    /// Seconds
    pub moving_time: Option<f64>,
    pub icu_training_load: Option<serde_json::Number>,
    pub paired_activity_id: Option<RecordId>,
}

/// Athlete profile as exported in `athlete.json`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawAthlete {
    pub id: Option<RecordId>,
    pub name: Option<String>,
}

/// Flattened activity in the digest.
///
/// Absent values are left out of the JSON entirely.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ActivityRecord {
    pub id: RecordId,
    /// YYYY-MM-DD
    pub date: String,
    /// HH:MM
    pub time: String,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub activity_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    pub distance_km: f64,
    pub moving_time_min: f64,
    pub elapsed_time_min: f64,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub avg_pace_min_per_km: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avg_speed_kmh: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_speed_kmh: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gap_pace: Option<serde_json::Number>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub avg_hr: Option<serde_json::Number>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_hr: Option<serde_json::Number>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hr_zone_times_sec: Option<serde_json::Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub avg_cadence: Option<f64>,

    pub elevation_gain_m: f64,
    pub elevation_loss_m: f64,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub training_load: Option<serde_json::Number>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trimp: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub calories: Option<serde_json::Number>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub ctl_fitness: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub atl_fatigue: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub pace_zone_times_sec: Option<serde_json::Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub device: Option<String>,

    pub is_race: bool,
    pub is_commute: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub km_splits: Option<Vec<Split>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub peak_efforts: Option<PeakEfforts>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hr_zone_distribution: Option<ZoneDistribution>,
}

/// Flattened daily wellness record
#[derive(Debug, Clone, Default, Serialize)]
pub struct WellnessRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,

    pub ctl_fitness: f64,
    pub atl_fatigue: f64,
    pub tsb_form: f64,
    pub ramp_rate: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub training_load: Option<serde_json::Number>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub resting_hr: Option<serde_json::Number>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hrv: Option<serde_json::Number>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hrv_sdnn: Option<serde_json::Number>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight_kg: Option<serde_json::Number>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vo2max: Option<serde_json::Number>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub sleep_hours: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sleep_score: Option<serde_json::Number>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sleep_quality: Option<serde_json::Number>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub steps: Option<serde_json::Number>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub soreness: Option<serde_json::Number>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fatigue: Option<serde_json::Number>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stress: Option<serde_json::Number>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mood: Option<serde_json::Number>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub motivation: Option<serde_json::Number>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub readiness: Option<serde_json::Number>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub sport_info: Option<serde_json::Value>,
}

/// Flattened calendar event
#[derive(Debug, Clone, Default, Serialize)]
pub struct PlannedWorkout {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
    pub date: String,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub event_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub planned_distance_km: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub planned_duration_min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub planned_load: Option<serde_json::Number>,
    pub completed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paired_activity_id: Option<RecordId>,
}

/// Athlete block of the digest
#[derive(Debug, Clone, Default, Serialize)]
pub struct AthleteInfo {
    pub name: Option<String>,
    pub id: Option<RecordId>,
}

/// Complete digest written to disk
#[derive(Debug, Clone, Serialize)]
pub struct DigestPayload {
    pub export_id: String,
    /// Local time the digest was generated (ISO 8601)
    pub generated: String,
    pub athlete: AthleteInfo,
    pub summary: crate::summary::PeriodSummary,
    pub activities: Vec<ActivityRecord>,
    pub wellness: Vec<WellnessRecord>,
    pub planned_workouts: Vec<PlannedWorkout>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_streams_with_gaps_and_pairs() {
        let json = r#"[
            { "type": "heartrate", "data": [120, null, 131.5] },
            { "type": "latlng", "data": [[51.5, -0.1], [51.6, -0.1]] },
            { "type": "cadence", "data": [] }
        ]"#;
        let streams: Vec<RawStream> = serde_json::from_str(json).unwrap();

        assert_eq!(
            streams[0].data,
            StreamData::Numeric(vec![Some(120.0), None, Some(131.5)])
        );
        assert!(matches!(streams[1].data, StreamData::Structured(_)));
        assert_eq!(streams[2].data, StreamData::Numeric(vec![]));
    }

    #[test]
    fn test_core_channel_must_be_numeric() {
        let err = serde_json::from_str::<RawStream>(r#"{ "type": "heartrate", "data": ["a", "b"] }"#)
            .unwrap_err();
        assert!(err.to_string().contains("heartrate"), "{err}");

        let nested = r#"{ "type": "altitude", "data": [[1.0, 2.0]] }"#;
        assert!(serde_json::from_str::<RawStream>(nested).is_err());

        let other: RawStream =
            serde_json::from_str(r#"{ "type": "latlng", "data": [[51.5, -0.1]] }"#).unwrap();
        assert!(matches!(other.data, StreamData::Structured(_)));
    }

    #[test]
    fn test_record_id_forms() {
        let text: RecordId = serde_json::from_str(r#""i4242""#).unwrap();
        let number: RecordId = serde_json::from_str("4242").unwrap();

        assert_eq!(text.to_string(), "i4242");
        assert_eq!(number.to_string(), "4242");
        assert_eq!(serde_json::to_string(&number).unwrap(), "4242");
    }

    #[test]
    fn test_activity_tolerates_unknown_fields() {
        let json = r#"{
            "id": "i77",
            "type": "Run",
            "distance": 10012.4,
            "icu_weighted_avg_watts": 250,
            "average_heartrate": 151
        }"#;
        let activity: RawActivity = serde_json::from_str(json).unwrap();

        assert_eq!(activity.id, RecordId::Text("i77".to_string()));
        assert_eq!(activity.activity_type.as_deref(), Some("Run"));
        assert_eq!(activity.average_heartrate.map(|n| n.to_string()), Some("151".to_string()));
        assert!(activity.moving_time.is_none());
    }
}
