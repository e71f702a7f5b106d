use thiserror::Error;
use uuid::Uuid;

use super::track::TrackType;
use crate::clips::ClipError;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CommandError {
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("sequence rejected {0}")]
    Rejected(&'static str),
    #[error("could not build command: {0}")]
    Construction(String),
    #[error("invariant violated: {0}")]
    InvariantViolation(String),
}

impl CommandError {
    pub fn construction(message: impl Into<String>) -> Self {
        Self::Construction(message.into())
    }

    pub fn invariant(message: impl Into<String>) -> Self {
        Self::InvariantViolation(message.into())
    }
}

/// Placement conflicts raised by a single [`Track`](crate::core::track::Track).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TrackError {
    #[error("placement [{position}, {position} + {length}) overlaps an existing placement")]
    Overlap { position: i64, length: i64 },
    #[error("placement {0} not found on track")]
    NotFound(Uuid),
    #[error("placement {0} already present on track")]
    Duplicate(Uuid),
    #[error("invalid placement length {0}")]
    InvalidLength(i64),
    #[error("invalid placement position {0}")]
    InvalidPosition(i64),
}

/// Why a sequence operation was refused. Public sequence operations log
/// this and report a sentinel instead.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SequenceError {
    #[error("no {kind:?} track with id {track_id}")]
    UnknownTrack { track_id: u32, kind: TrackType },
    #[error("unknown clip instance {0}")]
    UnknownClip(Uuid),
    #[error("unknown transition {0}")]
    UnknownTransition(Uuid),
    #[error("unknown effect {0}")]
    UnknownEffect(Uuid),
    #[error("identifier {0} is already in use")]
    DuplicateId(Uuid),
    #[error("clips {0} and {1} cannot be linked")]
    LinkRefused(Uuid, Uuid),
    #[error("in-track transition {0} cannot change tracks")]
    InTrackTransition(Uuid),
    #[error("effect {0} is already attached")]
    EffectAttached(Uuid),
    #[error("effect target is not on the timeline")]
    MissingEffectTarget,
    #[error("invalid boundaries {begin}..={end}")]
    InvalidBoundaries { begin: i64, end: i64 },
    #[error("engine refused the request: {0}")]
    Engine(String),
    #[error(transparent)]
    Track(#[from] TrackError),
    #[error(transparent)]
    Clip(#[from] ClipError),
}
