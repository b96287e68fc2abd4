//! Stream analytics
//!
//! Turns the raw per-second streams of one activity into derived metrics:
//! kilometre splits, peak sustained efforts and heart rate zone
//! distributions. Missing or short streams are an expected condition here;
//! every calculator degrades to an empty result instead of failing.

mod peaks;
mod splits;
pub mod streams;
mod zones;

pub use peaks::{PeakEffort, PeakEffortFinder, PeakEfforts, PEAK_DURATIONS};
pub use splits::{Split, SplitCalculator, SPLIT_DISTANCE_M};
pub use streams::StreamIndex;
pub use zones::{ZoneDistribution, ZoneDistributor, ZoneShare};

use crate::config::DigestConfig;
use crate::types::{ActivityRecord, RawStream};
use log::debug;
use serde::Serialize;

/// Derived metrics of one activity
#[derive(Debug, Clone, Default, Serialize)]
pub struct ActivityMetrics {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub km_splits: Vec<Split>,
    #[serde(skip_serializing_if = "PeakEfforts::is_empty")]
    pub peak_efforts: PeakEfforts,
    #[serde(skip_serializing_if = "ZoneDistribution::is_empty")]
    pub hr_zone_distribution: ZoneDistribution,
}

impl ActivityMetrics {
    /// Attach the non-empty metrics to a flattened activity record.
    ///
    /// Empty results leave the record's keys absent, which downstream
    /// readers take as "not applicable".
    pub fn merge_into(self, record: &mut ActivityRecord) {
        if !self.km_splits.is_empty() {
            record.km_splits = Some(self.km_splits);
        }
        if !self.peak_efforts.is_empty() {
            record.peak_efforts = Some(self.peak_efforts);
        }
        if !self.hr_zone_distribution.is_empty() {
            record.hr_zone_distribution = Some(self.hr_zone_distribution);
        }
    }
}

/// Runs the calculators for one activity
#[derive(Debug, Clone)]
pub struct ActivityAnalyzer {
    split_activity_types: Vec<String>,
    hr_zone_bounds: Vec<f64>,
}

impl Default for ActivityAnalyzer {
    fn default() -> Self {
        Self::from_config(&DigestConfig::default())
    }
}

impl ActivityAnalyzer {
    /// Create an analyzer.
    ///
    /// Splits are only computed for activities whose type is listed in
    /// `split_activity_types`. Zone distributions are only computed when
    /// `hr_zone_bounds` is non-empty.
    pub fn new(split_activity_types: Vec<String>, hr_zone_bounds: Vec<f64>) -> Self {
        Self {
            split_activity_types,
            hr_zone_bounds,
        }
    }

    pub fn from_config(config: &DigestConfig) -> Self {
        Self::new(
            config.split_activity_types.clone(),
            config.hr_zone_bounds.clone(),
        )
    }

    /// Whether splits apply to this activity type
    pub fn wants_splits(&self, activity_type: Option<&str>) -> bool {
        activity_type.is_some_and(|t| self.split_activity_types.iter().any(|s| s == t))
    }

    /// Compute the metrics of one activity from its streams
    pub fn analyze(&self, activity_type: Option<&str>, streams: &[RawStream]) -> ActivityMetrics {
        let index = StreamIndex::new(streams);

        let km_splits = if self.wants_splits(activity_type) {
            SplitCalculator::calculate(&index)
        } else {
            Vec::new()
        };
        let peak_efforts = PeakEffortFinder::find(&index);
        let hr_zone_distribution = if self.hr_zone_bounds.is_empty() {
            ZoneDistribution::default()
        } else {
            ZoneDistributor::distribute(index.heartrate(), &self.hr_zone_bounds)
        };

        ActivityMetrics {
            km_splits,
            peak_efforts,
            hr_zone_distribution,
        }
    }

    /// Analyze the streams of a flattened record and merge the results into it.
    ///
    /// Records without streams are left untouched.
    pub fn enrich(&self, record: &mut ActivityRecord, streams: &[RawStream]) {
        if streams.is_empty() {
            return;
        }

        let metrics = self.analyze(record.activity_type.as_deref(), streams);
        debug!(
            "Activity {}: {} splits, {} peak efforts",
            record.id,
            metrics.km_splits.len(),
            metrics.peak_efforts.len()
        );
        metrics.merge_into(record);
    }
}

/// Mean of the present samples
pub(crate) fn mean_present(samples: &[Option<f64>]) -> Option<f64> {
    mean(samples.iter().flatten().copied())
}

/// Mean of the present, nonzero samples
pub(crate) fn mean_nonzero(samples: &[Option<f64>]) -> Option<f64> {
    mean(samples.iter().flatten().copied().filter(|&v| v != 0.0))
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values.fold((0.0, 0u32), |(sum, count), v| (sum + v, count + 1));
    if count == 0 {
        None
    } else {
        Some(sum / f64::from(count))
    }
}
