//! Pipeline orchestration
//!
//! This module provides the public API for Training Digest.
//! It takes one export folder from raw JSON files to the written digest.

use crate::adapters::{ExportAdapter, IntervalsAdapter};
use crate::analytics::ActivityAnalyzer;
use crate::config::DigestConfig;
use crate::encoder::DigestEncoder;
use crate::error::DigestError;
use crate::export::{find_latest_download, write_digest, ExportBundle};
use crate::summary::PeriodSummary;
use crate::types::{ActivityRecord, DigestPayload};
use log::info;
use std::fs;
use std::path::{Path, PathBuf};

/// Outcome of one `combine_folder` run
#[derive(Debug, Clone, PartialEq)]
pub struct DigestReport {
    pub folder: PathBuf,
    pub output_path: PathBuf,
    pub size_bytes: u64,
    pub export_id: String,
    pub activities: usize,
    pub wellness: usize,
    pub planned_workouts: usize,
    pub runs_with_splits: usize,
    pub activities_with_peaks: usize,
    pub summary: PeriodSummary,
}

impl DigestReport {
    /// Output size in kilobytes
    pub fn size_kb(&self) -> f64 {
        self.size_bytes as f64 / 1024.0
    }
}

/// Builds digests from export folders.
///
/// Pipeline stages:
/// 1. ExportAdapter - Flatten raw records
/// 2. ActivityAnalyzer - Add splits, peak efforts and zones from streams
/// 3. PeriodSummary - Totals and trends over the export period
/// 4. DigestEncoder - Sort, filter and stamp the payload
pub struct DigestProcessor {
    config: DigestConfig,
    adapter: IntervalsAdapter,
    analyzer: ActivityAnalyzer,
    encoder: DigestEncoder,
}

impl Default for DigestProcessor {
    fn default() -> Self {
        Self::new(DigestConfig::default())
    }
}

impl DigestProcessor {
    /// Create a processor from a config
    pub fn new(config: DigestConfig) -> Self {
        Self::with_encoder(config, DigestEncoder::new())
    }

    /// Create a processor with a specific encoder.
    ///
    /// The encoder keeps the config's workout category.
    pub fn with_encoder(config: DigestConfig, encoder: DigestEncoder) -> Self {
        Self {
            analyzer: ActivityAnalyzer::from_config(&config),
            adapter: IntervalsAdapter,
            encoder: encoder.with_workout_category(config.workout_category.clone()),
            config,
        }
    }

    pub fn config(&self) -> &DigestConfig {
        &self.config
    }

    /// Turn a loaded export into a digest payload
    pub fn process(&self, bundle: &ExportBundle) -> DigestPayload {
        let mut activities: Vec<ActivityRecord> = bundle
            .activities
            .iter()
            .map(|raw| self.adapter.activity(raw))
            .collect();

        if !bundle.streams.is_empty() {
            info!("Analyzing streams for {} activities", activities.len());
            self.analyze_activities(bundle, &mut activities);
        }

        let wellness: Vec<_> = bundle
            .wellness
            .iter()
            .map(|raw| self.adapter.wellness(raw))
            .collect();
        let calendar: Vec<_> = bundle
            .calendar
            .iter()
            .map(|raw| self.adapter.calendar_event(raw))
            .collect();

        info!("Calculating summary statistics");
        let summary = PeriodSummary::calculate(&activities, &wellness, &self.config);

        self.encoder
            .encode(&bundle.athlete, summary, activities, wellness, calendar)
    }

    /// Locate the export folder, build its digest and write it next to the
    /// export files.
    pub fn combine_folder(&self, explicit: Option<&Path>) -> Result<DigestReport, DigestError> {
        let folder = find_latest_download(&self.config.data_dir, explicit)?;
        let bundle = ExportBundle::load(&folder)?;
        let payload = self.process(&bundle);

        let output_path = write_digest(&folder, &self.config.output_prefix, &payload)?;
        let size_bytes = fs::metadata(&output_path)?.len();
        info!("Wrote {} ({} bytes)", output_path.display(), size_bytes);

        Ok(DigestReport {
            folder,
            output_path,
            size_bytes,
            export_id: payload.export_id,
            activities: payload.activities.len(),
            wellness: payload.wellness.len(),
            planned_workouts: payload.planned_workouts.len(),
            runs_with_splits: payload
                .activities
                .iter()
                .filter(|a| a.km_splits.is_some())
                .count(),
            activities_with_peaks: payload
                .activities
                .iter()
                .filter(|a| a.peak_efforts.is_some())
                .count(),
            summary: payload.summary,
        })
    }

    #[cfg(not(feature = "parallel"))]
    fn analyze_activities(&self, bundle: &ExportBundle, activities: &mut [ActivityRecord]) {
        for record in activities.iter_mut() {
            let streams = bundle.streams_for(&record.id);
            self.analyzer.enrich(record, streams);
        }
    }

    #[cfg(feature = "parallel")]
    fn analyze_activities(&self, bundle: &ExportBundle, activities: &mut [ActivityRecord]) {
        use rayon::prelude::*;

        activities.par_iter_mut().for_each(|record| {
            let streams = bundle.streams_for(&record.id);
            self.analyzer.enrich(record, streams);
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::FixedExportId;
    use crate::export::{ACTIVITIES_FILE, ATHLETE_FILE, CALENDAR_FILE, STREAMS_FILE, WELLNESS_FILE};
    use crate::types::{RawStream, RecordId};
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn make_test_processor() -> DigestProcessor {
        DigestProcessor::with_encoder(
            DigestConfig::default(),
            DigestEncoder::with_id_source(Box::new(FixedExportId("TEST1".to_string()))),
        )
    }

    fn make_test_streams() -> serde_json::Value {
        // 1 Hz, 5 m/s for 10 minutes
        json!([
            { "type": "time", "data": (0..600).collect::<Vec<i32>>() },
            { "type": "distance", "data": (0..600).map(|i| i * 5).collect::<Vec<i32>>() },
            { "type": "velocity_smooth", "data": vec![5.0; 600] },
            { "type": "heartrate", "data": vec![160; 600] },
            { "type": "latlng", "data": vec![[52.1, 4.3]; 600] }
        ])
    }

    fn make_test_bundle() -> ExportBundle {
        let activities = serde_json::from_value(json!([
            { "id": "i1", "type": "Run", "start_date_local": "2024-03-05T07:00:00",
              "distance": 2995.0, "moving_time": 600 },
            { "id": "i2", "type": "Ride", "start_date_local": "2024-03-09T17:30:00",
              "distance": 30000.0, "moving_time": 3600, "average_speed": 8.33 },
            { "id": "i3", "type": "Run", "start_date_local": "2024-03-07T06:45:00",
              "distance": 5000.0, "moving_time": 1500 }
        ]))
        .unwrap();
        let wellness = serde_json::from_value(json!([
            { "id": "2024-03-05", "ctl": 40.0, "atl": 45.0 },
            { "id": "2024-03-09", "ctl": 42.5, "atl": 50.0 }
        ]))
        .unwrap();
        let calendar = serde_json::from_value(json!([
            { "id": 1, "category": "WORKOUT", "name": "Tempo", "start_date_local": "2024-03-12T00:00:00" },
            { "id": 2, "category": "NOTE", "name": "Travel" }
        ]))
        .unwrap();

        let mut streams = HashMap::new();
        let parsed: Vec<RawStream> = serde_json::from_value(make_test_streams()).unwrap();
        streams.insert("i1".to_string(), parsed.clone());
        streams.insert("i2".to_string(), parsed);

        ExportBundle {
            folder: PathBuf::from("unused"),
            activities,
            wellness,
            calendar,
            athlete: serde_json::from_value(json!({ "id": "i99", "name": "Sam" })).unwrap(),
            streams,
        }
    }

    #[test]
    fn test_process_bundle() {
        let payload = make_test_processor().process(&make_test_bundle());

        assert_eq!(payload.export_id, "TEST1");
        let ids: Vec<String> = payload.activities.iter().map(|a| a.id.to_string()).collect();
        assert_eq!(ids, vec!["i2", "i3", "i1"]);

        let ride = &payload.activities[0];
        assert!(ride.km_splits.is_none());
        assert!(ride.peak_efforts.is_some());

        let run_with_streams = &payload.activities[2];
        // 2995 m covered
        assert_eq!(run_with_streams.km_splits.as_ref().map(Vec::len), Some(2));
        // 599 s of data covers the 1min and 5min windows only
        assert_eq!(run_with_streams.peak_efforts.as_ref().map(|p| p.len()), Some(2));

        let run_without_streams = &payload.activities[1];
        assert!(run_without_streams.km_splits.is_none());
        assert!(run_without_streams.peak_efforts.is_none());

        assert_eq!(payload.wellness[0].date.as_deref(), Some("2024-03-09"));
        assert_eq!(payload.planned_workouts.len(), 1);
        assert_eq!(payload.summary.totals.runs, 2);
        assert_eq!(payload.summary.fitness_trend.ctl_change, Some(2.5));
    }

    #[test]
    fn test_zone_bounds_from_config() {
        let config = DigestConfig {
            hr_zone_bounds: vec![150.0, 170.0],
            ..Default::default()
        };
        let processor = DigestProcessor::new(config);
        let payload = processor.process(&make_test_bundle());

        let zones = payload
            .activities
            .iter()
            .find(|a| a.id == RecordId::Text("i1".to_string()))
            .and_then(|a| a.hr_zone_distribution.as_ref())
            .unwrap();
        assert_eq!(zones.percent(2), Some(100.0));
    }

    #[test]
    fn test_combine_folder_writes_digest() {
        let dir = TempDir::new().unwrap();
        let folder = dir.path().join("2024-03-10");
        fs::create_dir(&folder).unwrap();

        let activities = json!([
            { "id": "i1", "type": "Run", "start_date_local": "2024-03-05T07:00:00", "distance": 2995.0 }
        ]);
        fs::write(folder.join(ACTIVITIES_FILE), activities.to_string()).unwrap();
        fs::write(folder.join(WELLNESS_FILE), "[]").unwrap();
        fs::write(folder.join(CALENDAR_FILE), "[]").unwrap();
        fs::write(folder.join(ATHLETE_FILE), r#"{ "id": "i99", "name": "Sam" }"#).unwrap();
        let streams = json!({ "i1": make_test_streams() });
        fs::write(folder.join(STREAMS_FILE), streams.to_string()).unwrap();

        let config = DigestConfig {
            data_dir: dir.path().to_path_buf(),
            ..Default::default()
        };
        let processor = DigestProcessor::with_encoder(
            config,
            DigestEncoder::with_id_source(Box::new(FixedExportId("ABCDE".to_string()))),
        );
        let report = processor.combine_folder(None).unwrap();

        assert_eq!(report.folder, folder);
        assert_eq!(report.output_path, folder.join("llm-ready-ABCDE.json"));
        assert_eq!(report.activities, 1);
        assert_eq!(report.runs_with_splits, 1);
        assert_eq!(report.activities_with_peaks, 1);
        assert!(report.size_bytes > 0);

        let written: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&report.output_path).unwrap()).unwrap();
        assert_eq!(written["export_id"], "ABCDE");
        assert_eq!(written["activities"][0]["km_splits"].as_array().map(Vec::len), Some(2));
    }

    #[test]
    fn test_combine_folder_without_downloads() {
        let dir = TempDir::new().unwrap();
        let config = DigestConfig {
            data_dir: dir.path().to_path_buf(),
            ..Default::default()
        };
        let err = DigestProcessor::new(config).combine_folder(None).unwrap_err();
        assert!(matches!(err, DigestError::NoDownloadFolders(_)));
    }
}
