//! Stream lookup for a single activity
//!
//! Streams are aligned by sample position; the index is the only notion of
//! time position the analytics have.

use crate::types::{RawStream, StreamData};
use log::warn;
use std::collections::HashMap;

/// Cumulative distance in metres
pub const DISTANCE: &str = "distance";
/// Elapsed time in seconds
pub const TIME: &str = "time";
/// Heart rate in bpm
pub const HEARTRATE: &str = "heartrate";
/// Cadence in steps (or revolutions) per minute
pub const CADENCE: &str = "cadence";
/// Smoothed velocity in m/s
pub const VELOCITY: &str = "velocity_smooth";
/// Barometric or GPS altitude in metres
pub const ALTITUDE: &str = "altitude";
/// Corrected altitude, used when `altitude` is missing
pub const FIXED_ALTITUDE: &str = "fixed_altitude";

/// Read-only lookup from stream name to its samples.
///
/// Borrows the parsed streams, so building an index copies nothing. When the
/// same name appears more than once, the last occurrence wins. Streams whose
/// data is not a flat numeric array (e.g. `latlng` pairs) are not indexed.
#[derive(Debug, Clone, Default)]
pub struct StreamIndex<'a> {
    streams: HashMap<&'a str, &'a [Option<f64>]>,
}

impl<'a> StreamIndex<'a> {
    /// Index the numeric streams of one activity
    pub fn new(streams: &'a [RawStream]) -> Self {
        let mut index = HashMap::with_capacity(streams.len());

        for stream in streams {
            match &stream.data {
                StreamData::Numeric(samples) => {
                    index.insert(stream.name.as_str(), samples.as_slice());
                }
                StreamData::Structured(_) => {
                    if is_core_channel(&stream.name) {
                        warn!("Stream '{}' is not numeric, ignoring it", stream.name);
                    }
                }
            }
        }

        Self { streams: index }
    }

    /// Whether a stream with this name was supplied
    pub fn contains(&self, name: &str) -> bool {
        self.streams.contains_key(name)
    }

    /// Samples for a stream, or an empty slice when it is absent
    pub fn get(&self, name: &str) -> &'a [Option<f64>] {
        self.streams.get(name).copied().unwrap_or(&[])
    }

    pub fn distance(&self) -> &'a [Option<f64>] {
        self.get(DISTANCE)
    }

    pub fn time(&self) -> &'a [Option<f64>] {
        self.get(TIME)
    }

    pub fn heartrate(&self) -> &'a [Option<f64>] {
        self.get(HEARTRATE)
    }

    pub fn cadence(&self) -> &'a [Option<f64>] {
        self.get(CADENCE)
    }

    pub fn velocity(&self) -> &'a [Option<f64>] {
        self.get(VELOCITY)
    }

    /// Altitude samples, falling back to `fixed_altitude` when `altitude`
    /// is absent or empty
    pub fn altitude(&self) -> &'a [Option<f64>] {
        let primary = self.get(ALTITUDE);
        if primary.is_empty() {
            self.get(FIXED_ALTITUDE)
        } else {
            primary
        }
    }
}

/// Channels read by the analytics, which must hold numeric samples
pub(crate) fn is_core_channel(name: &str) -> bool {
    matches!(
        name,
        DISTANCE | TIME | HEARTRATE | CADENCE | VELOCITY | ALTITUDE | FIXED_ALTITUDE
    )
}

/// Sample at `index`, treating indices past the end as missing
pub(crate) fn sample(samples: &[Option<f64>], index: usize) -> Option<f64> {
    samples.get(index).copied().flatten()
}

/// Samples in `start..=end`, clipped to what the stream actually holds
pub(crate) fn window(samples: &[Option<f64>], start: usize, end: usize) -> &[Option<f64>] {
    if start >= samples.len() || start > end {
        return &[];
    }
    &samples[start..=end.min(samples.len() - 1)]
}
