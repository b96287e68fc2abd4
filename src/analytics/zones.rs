//! Heart rate zone distribution
//!
//! Zones are given as ascending upper bounds. A sample lands in the first
//! zone whose bound is strictly above it. There is no catch-all zone: a
//! sample at or above the last bound is not classified and counts toward
//! no percentage. Callers wanting one supply a sentinel bound such as 255.

use crate::rounding::round_to;
use serde::ser::{Serialize, Serializer};

/// Share of classified samples in one zone
#[derive(Debug, Clone, PartialEq)]
pub struct ZoneShare {
    /// 1-based zone number
    pub zone: usize,
    /// Percentage of classified samples, 1 decimal place
    pub percent: f64,
}

/// Occupied zones in ascending zone order.
///
/// Serializes as a map from `zone_<n>_pct` to the percentage.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ZoneDistribution(Vec<ZoneShare>);

impl ZoneDistribution {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ZoneShare> {
        self.0.iter()
    }

    /// Percentage for a 1-based zone, `None` when the zone is unoccupied
    pub fn percent(&self, zone: usize) -> Option<f64> {
        self.0.iter().find(|s| s.zone == zone).map(|s| s.percent)
    }

    pub fn total_percent(&self) -> f64 {
        self.0.iter().fold(0.0, |total, s| total + s.percent)
    }
}

impl Serialize for ZoneDistribution {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(
            self.0
                .iter()
                .map(|share| (format!("zone_{}_pct", share.zone), share.percent)),
        )
    }
}

struct ZoneBucket {
    upper_bound: f64,
    samples: u32,
}

/// Buckets heart rate samples into zones
pub struct ZoneDistributor;

impl ZoneDistributor {
    /// Distribute heart rate samples over zones bounded by `upper_bounds`.
    ///
    /// Null and zero samples are skipped entirely.
    pub fn distribute(heartrate: &[Option<f64>], upper_bounds: &[f64]) -> ZoneDistribution {
        if heartrate.is_empty() || upper_bounds.is_empty() {
            return ZoneDistribution::default();
        }

        let mut buckets: Vec<ZoneBucket> = upper_bounds
            .iter()
            .map(|&upper_bound| ZoneBucket {
                upper_bound,
                samples: 0,
            })
            .collect();

        for hr in heartrate.iter().flatten().filter(|&&hr| hr != 0.0) {
            if let Some(bucket) = buckets.iter_mut().find(|b| *hr < b.upper_bound) {
                bucket.samples += 1;
            }
        }

        let classified: u32 = buckets.iter().map(|b| b.samples).sum();
        if classified == 0 {
            return ZoneDistribution::default();
        }

        let shares = buckets
            .iter()
            .enumerate()
            .filter(|(_, b)| b.samples > 0)
            .map(|(i, b)| ZoneShare {
                zone: i + 1,
                percent: round_to(100.0 * f64::from(b.samples) / f64::from(classified), 1),
            })
            .collect();

        ZoneDistribution(shares)
    }
}
