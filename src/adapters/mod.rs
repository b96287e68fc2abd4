//! Export record adapters
//!
//! This module provides adapters that flatten raw platform records into the
//! compact records of the digest.

mod intervals;

pub use intervals::IntervalsAdapter;

use crate::types::{
    ActivityRecord, PlannedWorkout, RawActivity, RawCalendarEvent, RawWellness, WellnessRecord,
};

/// Trait for export record adapters
pub trait ExportAdapter {
    /// Flatten one activity (without stream metrics)
    fn activity(&self, raw: &RawActivity) -> ActivityRecord;

    /// Flatten one day of wellness data
    fn wellness(&self, raw: &RawWellness) -> WellnessRecord;

    /// Flatten one calendar event
    fn calendar_event(&self, raw: &RawCalendarEvent) -> PlannedWorkout;
}
