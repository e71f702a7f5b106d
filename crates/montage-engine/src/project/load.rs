use serde::Deserialize;
use thiserror::Error;

use super::migrate::{self, MigrationError};
use super::schema::{SequenceSnapshot, SNAPSHOT_VERSION};

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("failed to parse snapshot: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("unsupported snapshot version {0}")]
    UnsupportedVersion(u32),
    #[error("snapshot migration failed: {0}")]
    Migration(#[from] MigrationError),
}

/// Snapshots without a version field predate versioning.
fn legacy_version() -> u32 {
    1
}

#[derive(Deserialize)]
struct VersionHeader {
    #[serde(default = "legacy_version")]
    version: u32,
}

pub fn parse_snapshot(data: &[u8]) -> Result<SequenceSnapshot, SnapshotError> {
    let header: VersionHeader = serde_json::from_slice(data)?;
    match header.version {
        1 => Ok(migrate::from_v1(serde_json::from_slice(data)?)?),
        SNAPSHOT_VERSION => Ok(serde_json::from_slice(data)?),
        other => Err(SnapshotError::UnsupportedVersion(other)),
    }
}

impl SequenceSnapshot {
    pub fn from_json(json: &str) -> Result<Self, SnapshotError> {
        parse_snapshot(json.as_bytes())
    }

    pub fn to_json(&self) -> Result<String, SnapshotError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(any(test, feature = "fuzzing"))]
pub fn fuzz_parse_snapshot(data: &[u8]) {
    use std::sync::Arc;

    use crate::backend::HeadlessBackend;
    use crate::clips::MediaLibrary;
    use crate::config::SequenceConfig;
    use crate::core::sequence::SequenceModel;

    if let Ok(snapshot) = parse_snapshot(data) {
        let config = SequenceConfig {
            track_count: 4,
            ..SequenceConfig::default()
        };
        let mut sequence = SequenceModel::new(
            config,
            Arc::new(MediaLibrary::new()),
            Box::new(HeadlessBackend::new()),
        );
        let _ = sequence.load_snapshot(&snapshot);
        let _ = sequence.to_snapshot();
    }
}
