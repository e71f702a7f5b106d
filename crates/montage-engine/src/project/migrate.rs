use thiserror::Error;
use uuid::Uuid;

use super::schema::{
    PlacementEntry, SequenceSnapshot, SequenceSnapshotV1, TransitionEntry, SNAPSHOT_VERSION,
};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MigrationError {
    #[error("invalid snapshot schema: {0}")]
    Invalid(&'static str),
}

/// Gives every transition an identity and turns the in-track flag into a
/// placement.
pub fn from_v1(snapshot: SequenceSnapshotV1) -> Result<SequenceSnapshot, MigrationError> {
    let SequenceSnapshotV1 {
        transitions,
        clips,
        filters,
    } = snapshot;

    let transitions = transitions
        .into_iter()
        .map(|entry| {
            let placement = if entry.is_in_track {
                PlacementEntry::InTrack {
                    track_id: entry
                        .track_id
                        .ok_or(MigrationError::Invalid(
                            "in-track transition without trackId",
                        ))?,
                }
            } else {
                match (entry.track_a_id, entry.track_b_id) {
                    (Some(track_a_id), Some(track_b_id)) => PlacementEntry::CrossTrack {
                        track_a_id,
                        track_b_id,
                    },
                    _ => {
                        return Err(MigrationError::Invalid(
                            "cross-track transition without trackAId/trackBId",
                        ))
                    }
                }
            };
            Ok(TransitionEntry {
                uuid: Uuid::new_v4(),
                identifier: entry.identifier,
                begin: entry.begin,
                end: entry.end,
                placement,
                audio: entry.audio,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(SequenceSnapshot {
        version: SNAPSHOT_VERSION,
        transitions,
        clips,
        filters,
        track_filters: Vec::new(),
    })
}
