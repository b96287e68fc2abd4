//! Export folder handling
//!
//! Locates the newest download folder, loads its JSON files and writes the
//! digest next to them.

use crate::error::DigestError;
use crate::types::{
    DigestPayload, RawActivity, RawAthlete, RawCalendarEvent, RawStream, RawWellness, RecordId,
};
use log::{info, warn};
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

pub const ACTIVITIES_FILE: &str = "activities-detailed.json";
pub const WELLNESS_FILE: &str = "wellness.json";
pub const CALENDAR_FILE: &str = "calendar-events.json";
pub const ATHLETE_FILE: &str = "athlete.json";
/// Optional, and usually by far the largest file
pub const STREAMS_FILE: &str = "activity-streams.json";

/// Files every export folder must contain
pub const REQUIRED_FILES: [&str; 4] = [ACTIVITIES_FILE, WELLNESS_FILE, CALENDAR_FILE, ATHLETE_FILE];

/// Pick the export folder to process.
///
/// An explicit folder is used as is. Otherwise the most recently modified
/// sub-directory of `data_dir` is chosen.
pub fn find_latest_download(data_dir: &Path, explicit: Option<&Path>) -> Result<PathBuf, DigestError> {
    if let Some(folder) = explicit {
        return Ok(folder.to_path_buf());
    }

    let entries = match fs::read_dir(data_dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(DigestError::NoDownloadFolders(data_dir.display().to_string()));
        }
        Err(e) => return Err(e.into()),
    };

    let mut latest: Option<(std::time::SystemTime, PathBuf)> = None;
    for entry in entries {
        let entry = entry?;
        let metadata = entry.metadata()?;
        if !metadata.is_dir() {
            continue;
        }
        let modified = metadata.modified()?;
        if latest.as_ref().map_or(true, |(newest, _)| modified > *newest) {
            latest = Some((modified, entry.path()));
        }
    }

    latest
        .map(|(_, path)| path)
        .ok_or_else(|| DigestError::NoDownloadFolders(data_dir.display().to_string()))
}

/// Everything read from one export folder
#[derive(Debug, Clone, Default)]
pub struct ExportBundle {
    pub folder: PathBuf,
    pub activities: Vec<RawActivity>,
    pub wellness: Vec<RawWellness>,
    pub calendar: Vec<RawCalendarEvent>,
    pub athlete: RawAthlete,
    /// Streams keyed by activity id
    pub streams: HashMap<String, Vec<RawStream>>,
}

impl ExportBundle {
    /// Load an export folder
    pub fn load(folder: &Path) -> Result<Self, DigestError> {
        info!("Loading data from: {}", folder.display());

        let activities = read_json(&folder.join(ACTIVITIES_FILE))?;
        let wellness = read_json(&folder.join(WELLNESS_FILE))?;
        let calendar = read_json(&folder.join(CALENDAR_FILE))?;
        let athlete = read_json(&folder.join(ATHLETE_FILE))?;

        let streams_path = folder.join(STREAMS_FILE);
        let streams = if streams_path.exists() {
            info!("Loading activity streams (this may take a moment)...");
            read_json(&streams_path)?
        } else {
            warn!("No {} in {}, skipping stream metrics", STREAMS_FILE, folder.display());
            HashMap::new()
        };

        Ok(Self {
            folder: folder.to_path_buf(),
            activities,
            wellness,
            calendar,
            athlete,
            streams,
        })
    }

    /// Streams of one activity, empty when none were exported
    pub fn streams_for(&self, id: &RecordId) -> &[RawStream] {
        self.streams
            .get(&id.to_string())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

/// Read and parse one JSON file of the export
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, DigestError> {
    let json = match fs::read_to_string(path) {
        Ok(json) => json,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(DigestError::MissingFile(path.display().to_string()));
        }
        Err(e) => return Err(e.into()),
    };

    serde_json::from_str(&json).map_err(|source| DigestError::ParseError {
        file: path.display().to_string(),
        source,
    })
}

/// Path the digest for `export_id` is written to
pub fn digest_path(folder: &Path, prefix: &str, export_id: &str) -> PathBuf {
    folder.join(format!("{prefix}-{export_id}.json"))
}

/// Write the digest as pretty JSON into `folder` and return its path
pub fn write_digest(
    folder: &Path,
    prefix: &str,
    payload: &DigestPayload,
) -> Result<PathBuf, DigestError> {
    let path = digest_path(folder, prefix, &payload.export_id);
    let json = serde_json::to_string_pretty(payload)?;
    fs::write(&path, json)?;
    Ok(path)
}
