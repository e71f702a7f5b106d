use std::collections::BTreeSet;
use std::sync::Arc;

use uuid::Uuid;

use super::track::TrackType;
use crate::backend::{InputHandle, TransitionHandle};
use crate::clips::SourceClip;

/// A placement of a [`SourceClip`] on one track.
///
/// Instances are created and mutated by the sequence model only; everything
/// else sees them through shared references or as values handed back by
/// `remove_clip`.
#[derive(Debug, Clone)]
pub struct ClipInstance {
    pub(crate) uuid: Uuid,
    pub(crate) clip: Arc<SourceClip>,
    pub(crate) track_id: u32,
    pub(crate) position: i64,
    pub(crate) is_audio: bool,
    pub(crate) linked: BTreeSet<Uuid>,
    pub(crate) has_been_duplicated: bool,
    pub(crate) input: Option<InputHandle>,
}

impl ClipInstance {
    pub(crate) fn new(
        uuid: Uuid,
        clip: Arc<SourceClip>,
        track_id: u32,
        position: i64,
        is_audio: bool,
    ) -> Self {
        Self {
            uuid,
            clip,
            track_id,
            position,
            is_audio,
            linked: BTreeSet::new(),
            has_been_duplicated: false,
            input: None,
        }
    }

    pub fn uuid(&self) -> Uuid {
        self.uuid
    }

    pub fn clip(&self) -> &Arc<SourceClip> {
        &self.clip
    }

    pub fn track_id(&self) -> u32 {
        self.track_id
    }

    pub fn track_type(&self) -> TrackType {
        TrackType::from_is_audio(self.is_audio)
    }

    pub fn position(&self) -> i64 {
        self.position
    }

    pub fn is_audio(&self) -> bool {
        self.is_audio
    }

    pub fn length(&self) -> i64 {
        self.clip.length()
    }

    /// First frame after the instance.
    pub fn end(&self) -> i64 {
        self.position.saturating_add(self.clip.length())
    }

    pub fn begin_frame(&self) -> i64 {
        self.clip.begin()
    }

    pub fn end_frame(&self) -> i64 {
        self.clip.end()
    }

    pub fn linked(&self) -> &BTreeSet<Uuid> {
        &self.linked
    }

    pub fn is_linked_to(&self, other: Uuid) -> bool {
        self.linked.contains(&other)
    }

    pub fn has_been_duplicated(&self) -> bool {
        self.has_been_duplicated
    }
}

/// Where a transition lives. The variant is fixed at creation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TransitionPlacement {
    InTrack { track_id: u32 },
    CrossTrack { track_a: u32, track_b: u32 },
}

impl TransitionPlacement {
    pub fn is_in_track(&self) -> bool {
        matches!(self, Self::InTrack { .. })
    }

    pub fn tracks(&self) -> (u32, u32) {
        match *self {
            Self::InTrack { track_id } => (track_id, track_id),
            Self::CrossTrack { track_a, track_b } => (track_a, track_b),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TransitionInstance {
    pub(crate) uuid: Uuid,
    pub(crate) identifier: String,
    pub(crate) begin: i64,
    pub(crate) end: i64,
    pub(crate) placement: TransitionPlacement,
    pub(crate) track_type: TrackType,
    pub(crate) handle: Option<TransitionHandle>,
}

impl TransitionInstance {
    pub fn uuid(&self) -> Uuid {
        self.uuid
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn begin(&self) -> i64 {
        self.begin
    }

    /// Inclusive last frame.
    pub fn end(&self) -> i64 {
        self.end
    }

    pub fn length(&self) -> i64 {
        self.end.saturating_sub(self.begin).saturating_add(1)
    }

    pub fn placement(&self) -> TransitionPlacement {
        self.placement
    }

    pub fn track_type(&self) -> TrackType {
        self.track_type
    }
}
