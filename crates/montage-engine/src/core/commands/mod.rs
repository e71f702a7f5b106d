//! Undoable edits of a [`SequenceModel`].
//!
//! A [`Command`] is valid from construction until one of its forward or
//! inverse steps is refused by the sequence. From then on it stays in the
//! history but both directions are no-ops. Refusals abort the remaining
//! steps of that run without unwinding the ones that already happened.

mod clip;
mod effect;
mod stack;
mod transition;

pub use clip::{AddClip, LinkClips, MoveClips, RemoveClips, ResizeClips, SplitClip, UnlinkClips};
pub use effect::{AddEffect, MoveEffect, RemoveEffect, ResizeEffect};
pub use stack::UndoStack;
pub use transition::{AddTransition, MoveTransition, MoveTransitionBetweenTracks, RemoveTransition};

use uuid::Uuid;

use crate::core::error::CommandError;
use crate::core::sequence::{EffectTarget, SequenceModel};
use crate::core::track::TrackType;

pub const INVALID_TEXT: &str = "Invalid action";

/// A command payload, or the inert payload plus the reason it could not be
/// built.
type Built<T> = Result<T, (T, CommandError)>;

#[derive(Debug, Clone)]
pub enum CommandKind {
    AddClip(AddClip),
    MoveClips(MoveClips),
    ResizeClips(ResizeClips),
    RemoveClips(RemoveClips),
    SplitClip(SplitClip),
    LinkClips(LinkClips),
    UnlinkClips(UnlinkClips),
    AddTransition(AddTransition),
    MoveTransition(MoveTransition),
    MoveTransitionBetweenTracks(MoveTransitionBetweenTracks),
    RemoveTransition(RemoveTransition),
    AddEffect(AddEffect),
    MoveEffect(MoveEffect),
    ResizeEffect(ResizeEffect),
    RemoveEffect(RemoveEffect),
}

#[derive(Debug, Clone)]
pub struct Command {
    kind: CommandKind,
    label: String,
    invalid: Option<CommandError>,
}

impl Command {
    fn new(kind: CommandKind, label: impl Into<String>) -> Self {
        Self {
            kind,
            label: label.into(),
            invalid: None,
        }
    }

    /// Wraps a payload whose construction may have failed. A failed
    /// payload still becomes a command, one that is invalid from the start.
    fn build<T>(
        built: Built<T>,
        wrap: fn(T) -> CommandKind,
        label: impl Into<String>,
    ) -> Self {
        match built {
            Ok(payload) => Self::new(wrap(payload), label),
            Err((payload, reason)) => Self {
                kind: wrap(payload),
                label: label.into(),
                invalid: Some(reason),
            },
        }
    }

    pub fn add_clip(library_uuid: Uuid, track_id: u32, position: i64) -> Self {
        Self::new(
            CommandKind::AddClip(AddClip::new(library_uuid, track_id, position)),
            format!("Adding clip to track {track_id}"),
        )
    }

    pub fn move_clip(sequence: &SequenceModel, uuid: Uuid, track_id: u32, position: i64) -> Self {
        Self::build(
            MoveClips::new(sequence, uuid, track_id, position),
            CommandKind::MoveClips,
            "Moving clip(s)",
        )
    }

    pub fn resize_clip(
        sequence: &SequenceModel,
        uuid: Uuid,
        begin: i64,
        end: i64,
        position: i64,
    ) -> Self {
        Self::build(
            ResizeClips::new(sequence, uuid, begin, end, position),
            CommandKind::ResizeClips,
            "Resizing clip",
        )
    }

    pub fn remove_clip(sequence: &SequenceModel, uuid: Uuid) -> Self {
        Self::build(
            RemoveClips::new(sequence, uuid),
            CommandKind::RemoveClips,
            "Removing clip",
        )
    }

    /// Splits `uuid` so that a new instance starting at source frame
    /// `new_clip_begin` is placed at `new_clip_position`; the original then
    /// ends one frame earlier.
    pub fn split_clip(
        sequence: &SequenceModel,
        uuid: Uuid,
        new_clip_position: i64,
        new_clip_begin: i64,
    ) -> Self {
        Self::build(
            SplitClip::new(sequence, uuid, new_clip_position, new_clip_begin),
            CommandKind::SplitClip,
            "Splitting clip",
        )
    }

    pub fn link_clips(a: Uuid, b: Uuid) -> Self {
        Self::new(CommandKind::LinkClips(LinkClips { a, b }), "Linking clip")
    }

    pub fn unlink_clips(a: Uuid, b: Uuid) -> Self {
        Self::new(
            CommandKind::UnlinkClips(UnlinkClips { a, b }),
            "Unlinking clips",
        )
    }

    pub fn add_transition(
        identifier: impl Into<String>,
        begin: i64,
        end: i64,
        track_id: u32,
        track_type: TrackType,
    ) -> Self {
        Self::new(
            CommandKind::AddTransition(AddTransition::in_track(
                identifier.into(),
                begin,
                end,
                track_id,
                track_type,
            )),
            "Adding transition",
        )
    }

    pub fn add_transition_between_tracks(
        identifier: impl Into<String>,
        begin: i64,
        end: i64,
        track_a: u32,
        track_b: u32,
        track_type: TrackType,
    ) -> Self {
        Self::new(
            CommandKind::AddTransition(AddTransition::cross_track(
                identifier.into(),
                begin,
                end,
                track_a,
                track_b,
                track_type,
            )),
            "Adding transition",
        )
    }

    pub fn move_transition(sequence: &SequenceModel, uuid: Uuid, begin: i64, end: i64) -> Self {
        Self::build(
            MoveTransition::new(sequence, uuid, begin, end),
            CommandKind::MoveTransition,
            "Moving transition",
        )
    }

    pub fn move_transition_between_tracks(
        sequence: &SequenceModel,
        uuid: Uuid,
        track_a: u32,
        track_b: u32,
    ) -> Self {
        Self::build(
            MoveTransitionBetweenTracks::new(sequence, uuid, track_a, track_b),
            CommandKind::MoveTransitionBetweenTracks,
            "Moving transition",
        )
    }

    pub fn remove_transition(uuid: Uuid) -> Self {
        Self::new(
            CommandKind::RemoveTransition(RemoveTransition::new(uuid)),
            "Removing transition",
        )
    }

    /// Builds the effect right away; an identifier the engine does not know
    /// yields a command that is invalid before it is ever pushed.
    pub fn add_effect(
        sequence: &mut SequenceModel,
        identifier: &str,
        target: EffectTarget,
    ) -> Self {
        Self::build(
            AddEffect::new(sequence, identifier, target),
            CommandKind::AddEffect,
            format!("Adding effect {identifier}"),
        )
    }

    pub fn move_effect(
        sequence: &SequenceModel,
        uuid: Uuid,
        target: EffectTarget,
        position: i64,
    ) -> Self {
        let name = effect_name(sequence, uuid);
        Self::build(
            MoveEffect::new(sequence, uuid, target, position),
            CommandKind::MoveEffect,
            format!("Moving effect {name}"),
        )
    }

    pub fn resize_effect(sequence: &SequenceModel, uuid: Uuid, begin: i64, end: i64) -> Self {
        let name = effect_name(sequence, uuid);
        Self::build(
            ResizeEffect::new(sequence, uuid, begin, end),
            CommandKind::ResizeEffect,
            format!("Resizing effect {name}"),
        )
    }

    pub fn remove_effect(sequence: &SequenceModel, uuid: Uuid) -> Self {
        let name = effect_name(sequence, uuid);
        Self::build(
            RemoveEffect::new(sequence, uuid),
            CommandKind::RemoveEffect,
            format!("Deleting effect {name}"),
        )
    }

    pub fn kind(&self) -> &CommandKind {
        &self.kind
    }

    /// Effect the command acts on, if any.
    pub(crate) fn effect(&self) -> Option<Uuid> {
        match &self.kind {
            CommandKind::AddEffect(command) => Some(command.effect()),
            CommandKind::MoveEffect(command) => Some(command.effect()),
            CommandKind::ResizeEffect(command) => Some(command.effect()),
            CommandKind::RemoveEffect(command) => Some(command.effect()),
            _ => None,
        }
    }

    /// Text shown in the history, "Invalid action" once invalidated.
    pub fn text(&self) -> &str {
        if self.invalid.is_some() {
            INVALID_TEXT
        } else {
            &self.label
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn is_valid(&self) -> bool {
        self.invalid.is_none()
    }

    pub fn invalid_reason(&self) -> Option<&CommandError> {
        self.invalid.as_ref()
    }

    /// Runs the forward action. Returns the reason when this run
    /// invalidated the command.
    pub fn redo(&mut self, sequence: &mut SequenceModel) -> Result<(), CommandError> {
        if self.invalid.is_some() {
            return Ok(());
        }
        let result = match &mut self.kind {
            CommandKind::AddClip(command) => command.redo(sequence),
            CommandKind::MoveClips(command) => command.redo(sequence),
            CommandKind::ResizeClips(command) => command.redo(sequence),
            CommandKind::RemoveClips(command) => command.redo(sequence),
            CommandKind::SplitClip(command) => command.redo(sequence),
            CommandKind::LinkClips(command) => command.redo(sequence),
            CommandKind::UnlinkClips(command) => command.redo(sequence),
            CommandKind::AddTransition(command) => command.redo(sequence),
            CommandKind::MoveTransition(command) => command.redo(sequence),
            CommandKind::MoveTransitionBetweenTracks(command) => command.redo(sequence),
            CommandKind::RemoveTransition(command) => command.redo(sequence),
            CommandKind::AddEffect(command) => command.redo(sequence),
            CommandKind::MoveEffect(command) => command.redo(sequence),
            CommandKind::ResizeEffect(command) => command.redo(sequence),
            CommandKind::RemoveEffect(command) => command.redo(sequence),
        };
        self.latch(result)
    }

    /// Runs the inverse action, with the same reporting as [`redo`](Self::redo).
    pub fn undo(&mut self, sequence: &mut SequenceModel) -> Result<(), CommandError> {
        if self.invalid.is_some() {
            return Ok(());
        }
        let result = match &mut self.kind {
            CommandKind::AddClip(command) => command.undo(sequence),
            CommandKind::MoveClips(command) => command.undo(sequence),
            CommandKind::ResizeClips(command) => command.undo(sequence),
            CommandKind::RemoveClips(command) => command.undo(sequence),
            CommandKind::SplitClip(command) => command.undo(sequence),
            CommandKind::LinkClips(command) => command.undo(sequence),
            CommandKind::UnlinkClips(command) => command.undo(sequence),
            CommandKind::AddTransition(command) => command.undo(sequence),
            CommandKind::MoveTransition(command) => command.undo(sequence),
            CommandKind::MoveTransitionBetweenTracks(command) => command.undo(sequence),
            CommandKind::RemoveTransition(command) => command.undo(sequence),
            CommandKind::AddEffect(command) => command.undo(sequence),
            CommandKind::MoveEffect(command) => command.undo(sequence),
            CommandKind::ResizeEffect(command) => command.undo(sequence),
            CommandKind::RemoveEffect(command) => command.undo(sequence),
        };
        self.latch(result)
    }

    fn latch(&mut self, result: Result<(), CommandError>) -> Result<(), CommandError> {
        if let Err(reason) = &result {
            tracing::warn!(label = %self.label, %reason, "command invalidated");
            self.invalid = Some(reason.clone());
        }
        result
    }

    /// Folds `next` into this command when both edit one clip each and
    /// `next`'s clip was linked to this command's clip when it was built.
    pub fn try_merge(&self, next: &Command) -> Option<Command> {
        if !self.is_valid() || !next.is_valid() {
            return None;
        }
        let kind = match (&self.kind, &next.kind) {
            (CommandKind::MoveClips(current), CommandKind::MoveClips(next)) => {
                CommandKind::MoveClips(current.merged_with(next)?)
            }
            (CommandKind::ResizeClips(current), CommandKind::ResizeClips(next)) => {
                CommandKind::ResizeClips(current.merged_with(next)?)
            }
            (CommandKind::RemoveClips(current), CommandKind::RemoveClips(next)) => {
                CommandKind::RemoveClips(current.merged_with(next)?)
            }
            _ => return None,
        };
        Some(Command::new(kind, self.label.clone()))
    }
}

fn effect_name(sequence: &SequenceModel, uuid: Uuid) -> String {
    sequence
        .effect(uuid)
        .map(|effect| effect.identifier().to_owned())
        .unwrap_or_default()
}
