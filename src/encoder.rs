//! Digest encoding
//!
//! This module assembles flattened records and the period summary into the
//! final digest payload, ordered newest first.

use crate::error::DigestError;
use crate::summary::PeriodSummary;
use crate::types::{
    ActivityRecord, AthleteInfo, DigestPayload, PlannedWorkout, RawAthlete, WellnessRecord,
};
use chrono::Local;
use uuid::Uuid;

/// Length of generated export identifiers
pub const EXPORT_ID_LEN: usize = 5;

const EXPORT_ID_ALPHABET: &[u8; 36] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Supplies the identifier stamped on a digest and its file name
pub trait ExportIdSource: Send + Sync {
    fn next_id(&self) -> String;
}

/// Random 5-character upper-case alphanumeric identifiers
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomExportId;

impl ExportIdSource for RandomExportId {
    fn next_id(&self) -> String {
        // The leading UUID bytes are fully random
        Uuid::new_v4()
            .as_bytes()
            .iter()
            .take(EXPORT_ID_LEN)
            .map(|&b| EXPORT_ID_ALPHABET[usize::from(b) % EXPORT_ID_ALPHABET.len()] as char)
            .collect()
    }
}

/// Always hands out the same identifier
#[derive(Debug, Clone)]
pub struct FixedExportId(pub String);

impl ExportIdSource for FixedExportId {
    fn next_id(&self) -> String {
        self.0.clone()
    }
}

/// Digest encoder for producing the final payload
pub struct DigestEncoder {
    id_source: Box<dyn ExportIdSource>,
    workout_category: String,
}

impl Default for DigestEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl DigestEncoder {
    /// Create an encoder with random export ids
    pub fn new() -> Self {
        Self::with_id_source(Box::new(RandomExportId))
    }

    /// Create an encoder with a specific id source
    pub fn with_id_source(id_source: Box<dyn ExportIdSource>) -> Self {
        Self {
            id_source,
            workout_category: "WORKOUT".to_string(),
        }
    }

    /// Calendar category kept in `planned_workouts`
    pub fn with_workout_category(mut self, category: impl Into<String>) -> Self {
        self.workout_category = category.into();
        self
    }

    /// Assemble the digest payload.
    ///
    /// Activities and wellness are sorted by date, newest first, keeping
    /// export order among records of the same date.
    pub fn encode(
        &self,
        athlete: &RawAthlete,
        summary: PeriodSummary,
        mut activities: Vec<ActivityRecord>,
        mut wellness: Vec<WellnessRecord>,
        calendar: Vec<PlannedWorkout>,
    ) -> DigestPayload {
        activities.sort_by(|a, b| b.date.cmp(&a.date));
        wellness.sort_by(|a, b| {
            let a = a.date.as_deref().unwrap_or("");
            let b = b.date.as_deref().unwrap_or("");
            b.cmp(a)
        });

        let planned_workouts = calendar
            .into_iter()
            .filter(|event| event.category.as_deref() == Some(self.workout_category.as_str()))
            .collect();

        DigestPayload {
            export_id: self.id_source.next_id(),
            generated: Local::now().format("%Y-%m-%dT%H:%M:%S%.6f").to_string(),
            athlete: AthleteInfo {
                name: athlete.name.clone(),
                id: athlete.id.clone(),
            },
            summary,
            activities,
            wellness,
            planned_workouts,
        }
    }

    /// Encode to pretty JSON
    pub fn encode_to_json(payload: &DigestPayload) -> Result<String, DigestError> {
        serde_json::to_string_pretty(payload).map_err(DigestError::Json)
    }
}
