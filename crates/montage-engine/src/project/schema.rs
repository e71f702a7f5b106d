use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const SNAPSHOT_VERSION: u32 = 2;

fn current_version() -> u32 {
    SNAPSHOT_VERSION
}

/// Persisted state of a sequence, as handed to and read back from the
/// project file.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SequenceSnapshot {
    #[serde(default = "current_version")]
    pub version: u32,
    #[serde(default)]
    pub transitions: Vec<TransitionEntry>,
    #[serde(default)]
    pub clips: Vec<ClipEntry>,
    /// Effects applied to the whole sequence.
    #[serde(default)]
    pub filters: Vec<FilterEntry>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub track_filters: Vec<TrackFiltersEntry>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransitionEntry {
    pub uuid: Uuid,
    pub identifier: String,
    pub begin: i64,
    pub end: i64,
    #[serde(flatten)]
    pub placement: PlacementEntry,
    #[serde(default)]
    pub audio: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum PlacementEntry {
    InTrack {
        #[serde(rename = "trackId")]
        track_id: u32,
    },
    CrossTrack {
        #[serde(rename = "trackAId")]
        track_a_id: u32,
        #[serde(rename = "trackBId")]
        track_b_id: u32,
    },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClipEntry {
    pub uuid: Uuid,
    /// Catalog clip the instance was placed from.
    pub clip_uuid: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub begin: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<i64>,
    pub position: i64,
    pub track_id: u32,
    pub is_audio: bool,
    /// Set once the instance owns a private cut of the catalog clip.
    #[serde(default)]
    pub duplicated: bool,
    #[serde(default)]
    pub linked_clips: Vec<Uuid>,
    #[serde(default)]
    pub filters: Vec<FilterEntry>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uuid: Option<Uuid>,
    pub identifier: String,
    #[serde(default)]
    pub begin: i64,
    #[serde(default = "open_end")]
    pub end: i64,
}

fn open_end() -> i64 {
    -1
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackFiltersEntry {
    pub track_id: u32,
    pub audio: bool,
    pub filters: Vec<FilterEntry>,
}

/// Snapshot layout written before transitions carried their own identity.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SequenceSnapshotV1 {
    #[serde(default)]
    pub transitions: Vec<TransitionEntryV1>,
    #[serde(default)]
    pub clips: Vec<ClipEntry>,
    #[serde(default)]
    pub filters: Vec<FilterEntry>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransitionEntryV1 {
    pub identifier: String,
    pub begin: i64,
    pub end: i64,
    pub is_in_track: bool,
    #[serde(default)]
    pub track_id: Option<u32>,
    #[serde(default)]
    pub track_a_id: Option<u32>,
    #[serde(default)]
    pub track_b_id: Option<u32>,
    #[serde(default)]
    pub audio: bool,
}
