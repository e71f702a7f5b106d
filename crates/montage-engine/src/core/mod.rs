pub mod commands;
pub mod error;
pub mod events;
pub mod instance;
pub mod sequence;
pub mod track;

pub use commands::{Command, CommandKind, UndoStack};
pub use error::{CommandError, SequenceError, TrackError};
pub use events::{EngineEvent, EventHub, HistoryEvent, SequenceEvent};
pub use instance::{ClipInstance, TransitionInstance, TransitionPlacement};
pub use sequence::{EffectTarget, SequenceModel};
pub use track::{Placement, Track, TrackType};
