//! Montage Engine
//! ==============
//! Editing core of a non-linear video editor: source clips and their
//! catalog, typed tracks, the sequence model that keeps them consistent
//! with the compositing engine, and an undo history of structural edits.

pub mod backend;
pub mod clips;
pub mod config;
pub mod core;
pub mod project;
pub mod workflow;

pub use backend::{EngineBackend, HeadlessBackend};
pub use clips::{Media, MediaCatalog, MediaLibrary, SourceClip};
pub use config::{SequenceConfig, WorkflowConfig};
pub use crate::core::{
    Command, CommandError, EffectTarget, EngineEvent, HistoryEvent, SequenceEvent, SequenceModel,
    TrackType, UndoStack,
};
pub use project::{SequenceSnapshot, SnapshotError};
pub use workflow::{AddedClip, PlaybackState, Workflow};
