//! Per-kilometre splits
//!
//! Walks the cumulative distance stream and closes a split each time a
//! sample first reaches the next multiple of [`SPLIT_DISTANCE_M`]. Any
//! trailing partial kilometre is dropped.

use super::streams::{sample, window, StreamIndex, DISTANCE, TIME};
use super::{mean_nonzero, mean_present};
use crate::rounding::{round_to, round_whole};
use serde::Serialize;

/// Length of one split in metres
pub const SPLIT_DISTANCE_M: f64 = 1000.0;

/// Derived metrics for one completed kilometre
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Split {
    /// 1-based split ordinal
    pub km: u32,
    /// Elapsed minutes for this kilometre
    pub pace_min_per_km: f64,
    /// Mean heart rate (bpm)
    pub avg_hr: Option<u32>,
    /// Mean of nonzero cadence samples
    pub avg_cadence: Option<u32>,
    /// Sum of climbs only (metres)
    pub elevation_gain_m: f64,
}

/// Splits a distance/time stream pair into kilometres
pub struct SplitCalculator;

impl SplitCalculator {
    /// Compute the kilometre splits of one activity.
    ///
    /// Returns an empty list when the `distance` or `time` stream is missing,
    /// or when the activity never covers a full kilometre.
    pub fn calculate(streams: &StreamIndex<'_>) -> Vec<Split> {
        if !streams.contains(DISTANCE) || !streams.contains(TIME) {
            return Vec::new();
        }

        let distance = streams.distance();
        let time = streams.time();
        let heartrate = streams.heartrate();
        let cadence = streams.cadence();
        let altitude = streams.altitude();

        let mut splits = Vec::new();
        let mut km: u32 = 1;
        let mut last_idx = 0;
        let mut last_time = sample(time, 0).unwrap_or(0.0);

        for (i, dist) in distance.iter().enumerate() {
            let Some(dist) = *dist else { continue };
            if dist < f64::from(km) * SPLIT_DISTANCE_M {
                continue;
            }
            // A crossing without a timestamp closes at the next timed sample
            let Some(crossed_at) = sample(time, i) else {
                continue;
            };

            let pace = (crossed_at - last_time) / 60.0;

            // Averages cover (last_idx, i]; the boundary sample belongs to
            // the previous split
            let hr = window(heartrate, last_idx + 1, i);
            let avg_hr = mean_present(hr)
                .filter(|_| hr.iter().flatten().any(|&v| v != 0.0))
                .map(round_whole);
            let avg_cadence = mean_nonzero(window(cadence, last_idx + 1, i)).map(round_whole);

            // Climb is measured from the boundary sample onwards
            let elevation_gain = elevation_gain(window(altitude, last_idx, i));

            splits.push(Split {
                km,
                pace_min_per_km: round_to(pace, 2),
                avg_hr,
                avg_cadence,
                elevation_gain_m: round_to(elevation_gain, 1),
            });

            last_idx = i;
            last_time = crossed_at;
            km += 1;
        }

        splits
    }
}

/// Sum of positive deltas between consecutive present samples.
///
/// Gaps are bridged: a sample is compared with the last present one.
fn elevation_gain(altitude: &[Option<f64>]) -> f64 {
    let mut present = altitude.iter().flatten().copied();
    let Some(mut previous) = present.next() else {
        return 0.0;
    };

    present.fold(0.0, |gain, current| {
        let climb = (current - previous).max(0.0);
        previous = current;
        gain + climb
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::streams::{ALTITUDE, CADENCE, HEARTRATE};
    use crate::types::{RawStream, StreamData};
    use pretty_assertions::assert_eq;

    fn stream(name: &str, data: Vec<f64>) -> RawStream {
        RawStream {
            name: name.to_string(),
            data: StreamData::Numeric(data.into_iter().map(Some).collect()),
        }
    }

    /// Constant-rate run: `step_m` metres every `step_s` seconds
    fn make_test_run(samples: usize, step_s: f64, step_m: f64) -> Vec<RawStream> {
        vec![
            stream(TIME, (0..samples).map(|i| i as f64 * step_s).collect()),
            stream(DISTANCE, (0..samples).map(|i| i as f64 * step_m).collect()),
        ]
    }

    #[test]
    fn test_constant_rate_quantized_crossings() {
        // 41 samples, 30 s apart, 150 m apart: 6000 m in 1200 s
        let streams = make_test_run(41, 30.0, 150.0);
        let splits = SplitCalculator::calculate(&StreamIndex::new(&streams));

        assert_eq!(splits.len(), 6);
        let ordinals: Vec<u32> = splits.iter().map(|s| s.km).collect();
        assert_eq!(ordinals, vec![1, 2, 3, 4, 5, 6]);

        // Crossings land on sample boundaries, so single splits vary around
        // 200 s, but together they account for the whole 20 minutes
        let total: f64 = splits.iter().map(|s| s.pace_min_per_km).sum();
        assert!((total - 20.0).abs() < 0.01);
        for split in &splits {
            assert!(split.pace_min_per_km >= 3.0 && split.pace_min_per_km <= 3.5);
        }
    }

    #[test]
    fn test_constant_rate_exact_crossings() {
        // 250 m every 50 s: each kilometre takes exactly 200 s
        let streams = make_test_run(25, 50.0, 250.0);
        let splits = SplitCalculator::calculate(&StreamIndex::new(&streams));

        assert_eq!(splits.len(), 6);
        for split in &splits {
            assert_eq!(split.pace_min_per_km, 3.33);
            assert_eq!(split.avg_hr, None);
            assert_eq!(split.avg_cadence, None);
            assert_eq!(split.elevation_gain_m, 0.0);
        }
    }

    #[test]
    fn test_split_count_matches_whole_kilometres() {
        // Irregular but strictly increasing distance, max 4730 m
        let distance = vec![
            0.0, 310.0, 720.0, 999.0, 1400.0, 1990.0, 2600.0, 2999.9, 3350.0, 4001.0, 4730.0,
        ];
        let time: Vec<f64> = (0..distance.len()).map(|i| i as f64 * 60.0).collect();
        let streams = vec![stream(TIME, time), stream(DISTANCE, distance)];

        let splits = SplitCalculator::calculate(&StreamIndex::new(&streams));
        assert_eq!(splits.len(), 4);
        assert_eq!(
            splits.iter().map(|s| s.km).collect::<Vec<_>>(),
            vec![1, 2, 3, 4]
        );
        // The partial 730 m at the end is dropped
        assert_eq!(splits[0].pace_min_per_km, 4.0);
    }

    #[test]
    fn test_missing_required_streams() {
        let streams = vec![stream(DISTANCE, vec![0.0, 1500.0])];
        assert!(SplitCalculator::calculate(&StreamIndex::new(&streams)).is_empty());

        let streams = vec![stream(TIME, vec![0.0, 600.0])];
        assert!(SplitCalculator::calculate(&StreamIndex::new(&streams)).is_empty());

        let streams = vec![stream(TIME, vec![]), stream(DISTANCE, vec![])];
        assert!(SplitCalculator::calculate(&StreamIndex::new(&streams)).is_empty());
    }

    #[test]
    fn test_never_reaches_first_kilometre() {
        let streams = make_test_run(10, 30.0, 100.0);
        assert!(SplitCalculator::calculate(&StreamIndex::new(&streams)).is_empty());
    }

    #[test]
    fn test_stationary_samples_do_not_duplicate_splits() {
        let streams = vec![
            stream(TIME, vec![0.0, 150.0, 300.0, 310.0, 320.0, 450.0, 600.0]),
            stream(DISTANCE, vec![0.0, 500.0, 1000.0, 1000.0, 1000.0, 1500.0, 2000.0]),
        ];
        let splits = SplitCalculator::calculate(&StreamIndex::new(&streams));

        assert_eq!(splits.len(), 2);
        assert_eq!(splits[0].pace_min_per_km, 5.0);
        assert_eq!(splits[1].pace_min_per_km, 5.0);
    }

    #[test]
    fn test_heart_rate_and_cadence_averages() {
        let streams = vec![
            stream(TIME, vec![0.0, 100.0, 200.0, 300.0, 400.0]),
            stream(DISTANCE, vec![0.0, 500.0, 1000.0, 1500.0, 2000.0]),
            // Index 0 sits on the start boundary and is not averaged
            stream(HEARTRATE, vec![90.0, 140.0, 150.0, 160.0, 171.0]),
            stream(CADENCE, vec![0.0, 170.0, 0.0, 176.0, 181.0]),
        ];
        let splits = SplitCalculator::calculate(&StreamIndex::new(&streams));

        assert_eq!(splits.len(), 2);
        assert_eq!(splits[0].avg_hr, Some(145));
        assert_eq!(splits[0].avg_cadence, Some(170));
        // (160 + 171) / 2 = 165.5 rounds to even
        assert_eq!(splits[1].avg_hr, Some(166));
        // (176 + 181) / 2 = 178.5 rounds to even
        assert_eq!(splits[1].avg_cadence, Some(178));
    }

    #[test]
    fn test_all_zero_heart_rate_is_none() {
        let streams = vec![
            stream(TIME, vec![0.0, 200.0, 400.0]),
            stream(DISTANCE, vec![0.0, 600.0, 1200.0]),
            stream(HEARTRATE, vec![0.0, 0.0, 0.0]),
        ];
        let splits = SplitCalculator::calculate(&StreamIndex::new(&streams));
        assert_eq!(splits.len(), 1);
        assert_eq!(splits[0].avg_hr, None);
    }

    #[test]
    fn test_elevation_gain_ignores_descents() {
        let streams = vec![
            stream(TIME, vec![0.0, 100.0, 200.0, 300.0, 400.0]),
            stream(DISTANCE, vec![0.0, 500.0, 1000.0, 1500.0, 2000.0]),
            stream(ALTITUDE, vec![100.0, 104.5, 101.0, 90.0, 80.0]),
        ];
        let splits = SplitCalculator::calculate(&StreamIndex::new(&streams));

        assert_eq!(splits.len(), 2);
        assert_eq!(splits[0].elevation_gain_m, 4.5);
        // Strictly descending altitude never goes negative
        assert_eq!(splits[1].elevation_gain_m, 0.0);
    }

    #[test]
    fn test_flat_split_serializes_positive_zero_gain() {
        let descending = make_test_run(5, 100.0, 250.0)
            .into_iter()
            .chain([stream(ALTITUDE, vec![50.0, 49.0, 48.0, 47.0, 46.0])])
            .collect::<Vec<_>>();
        let without_altitude = make_test_run(5, 100.0, 250.0);

        for streams in [descending, without_altitude] {
            let splits = SplitCalculator::calculate(&StreamIndex::new(&streams));
            assert_eq!(splits.len(), 1);
            assert!(splits[0].elevation_gain_m.is_sign_positive());

            let json = serde_json::to_string(&splits[0]).unwrap();
            assert!(json.contains(r#""elevation_gain_m":0.0"#), "{json}");
        }
    }

    #[test]
    fn test_elevation_gain_bridges_missing_altitude() {
        assert_eq!(elevation_gain(&[Some(100.0), None, Some(130.0)]), 30.0);
        assert_eq!(elevation_gain(&[None, Some(100.0), None, None, Some(95.0), Some(97.5)]), 2.5);
        assert_eq!(elevation_gain(&[None, None]), 0.0);
        assert!(elevation_gain(&[]).is_sign_positive());
    }

    #[test]
    fn test_short_optional_streams_are_tolerated() {
        let streams = vec![
            stream(TIME, vec![0.0, 100.0, 200.0, 300.0, 400.0]),
            stream(DISTANCE, vec![0.0, 500.0, 1000.0, 1500.0, 2000.0]),
            stream(HEARTRATE, vec![130.0, 140.0]),
        ];
        let splits = SplitCalculator::calculate(&StreamIndex::new(&streams));

        assert_eq!(splits.len(), 2);
        assert_eq!(splits[0].avg_hr, Some(140));
        assert_eq!(splits[1].avg_hr, None);
    }

    #[test]
    fn test_null_samples_are_skipped() {
        let streams = vec![
            RawStream {
                name: TIME.to_string(),
                data: StreamData::Numeric(vec![Some(0.0), Some(100.0), None, Some(300.0)]),
            },
            RawStream {
                name: DISTANCE.to_string(),
                data: StreamData::Numeric(vec![Some(0.0), None, Some(1000.0), Some(1100.0)]),
            },
        ];
        let splits = SplitCalculator::calculate(&StreamIndex::new(&streams));

        // Crossing sample has no timestamp, so the split closes one later
        assert_eq!(splits.len(), 1);
        assert_eq!(splits[0].pace_min_per_km, 5.0);
    }
}
