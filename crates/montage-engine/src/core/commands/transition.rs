use uuid::Uuid;

use super::Built;
use crate::core::error::CommandError;
use crate::core::instance::{TransitionInstance, TransitionPlacement};
use crate::core::sequence::SequenceModel;
use crate::core::track::TrackType;

#[derive(Debug, Clone)]
pub struct AddTransition {
    identifier: String,
    begin: i64,
    end: i64,
    placement: TransitionPlacement,
    track_type: TrackType,
    uuid: Option<Uuid>,
    removed: Option<TransitionInstance>,
}

impl AddTransition {
    pub(super) fn in_track(
        identifier: String,
        begin: i64,
        end: i64,
        track_id: u32,
        track_type: TrackType,
    ) -> Self {
        Self::with_placement(
            identifier,
            begin,
            end,
            TransitionPlacement::InTrack { track_id },
            track_type,
        )
    }

    pub(super) fn cross_track(
        identifier: String,
        begin: i64,
        end: i64,
        track_a: u32,
        track_b: u32,
        track_type: TrackType,
    ) -> Self {
        Self::with_placement(
            identifier,
            begin,
            end,
            TransitionPlacement::CrossTrack { track_a, track_b },
            track_type,
        )
    }

    fn with_placement(
        identifier: String,
        begin: i64,
        end: i64,
        placement: TransitionPlacement,
        track_type: TrackType,
    ) -> Self {
        Self {
            identifier,
            begin,
            end,
            placement,
            track_type,
            uuid: None,
            removed: None,
        }
    }

    /// Id of the transition once the command has run.
    pub fn transition(&self) -> Option<Uuid> {
        self.uuid
    }

    pub(super) fn redo(&mut self, sequence: &mut SequenceModel) -> Result<(), CommandError> {
        if let Some(transition) = self.removed.take() {
            if !sequence.restore_transition(transition) {
                return Err(CommandError::Rejected("restoring a transition"));
            }
            return Ok(());
        }
        let uuid = match self.placement {
            TransitionPlacement::InTrack { track_id } => sequence.add_transition(
                &self.identifier,
                self.begin,
                self.end,
                track_id,
                self.track_type,
            ),
            TransitionPlacement::CrossTrack { track_a, track_b } => sequence
                .add_transition_between_tracks(
                    &self.identifier,
                    self.begin,
                    self.end,
                    track_a,
                    track_b,
                    self.track_type,
                ),
        };
        self.uuid = Some(uuid.ok_or(CommandError::Rejected("adding a transition"))?);
        Ok(())
    }

    pub(super) fn undo(&mut self, sequence: &mut SequenceModel) -> Result<(), CommandError> {
        let uuid = self.uuid.ok_or(CommandError::NotFound("transition"))?;
        let removed = sequence
            .remove_transition(uuid)
            .ok_or(CommandError::Rejected("removing the added transition"))?;
        self.removed = Some(removed);
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveTransition {
    uuid: Uuid,
    old_begin: i64,
    old_end: i64,
    new_begin: i64,
    new_end: i64,
}

impl MoveTransition {
    pub(super) fn new(sequence: &SequenceModel, uuid: Uuid, begin: i64, end: i64) -> Built<Self> {
        let mut command = Self {
            uuid,
            old_begin: 0,
            old_end: 0,
            new_begin: begin,
            new_end: end,
        };
        let Some(transition) = sequence.transition(uuid) else {
            return Err((command, CommandError::NotFound("transition")));
        };
        command.old_begin = transition.begin();
        command.old_end = transition.end();
        Ok(command)
    }

    pub(super) fn redo(&mut self, sequence: &mut SequenceModel) -> Result<(), CommandError> {
        if !sequence.move_transition(self.uuid, self.new_begin, self.new_end) {
            return Err(CommandError::Rejected("moving a transition"));
        }
        Ok(())
    }

    pub(super) fn undo(&mut self, sequence: &mut SequenceModel) -> Result<(), CommandError> {
        if !sequence.move_transition(self.uuid, self.old_begin, self.old_end) {
            return Err(CommandError::Rejected("moving a transition back"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveTransitionBetweenTracks {
    uuid: Uuid,
    old_tracks: (u32, u32),
    new_tracks: (u32, u32),
}

impl MoveTransitionBetweenTracks {
    pub(super) fn new(
        sequence: &SequenceModel,
        uuid: Uuid,
        track_a: u32,
        track_b: u32,
    ) -> Built<Self> {
        let mut command = Self {
            uuid,
            old_tracks: (0, 0),
            new_tracks: (track_a, track_b),
        };
        let Some(transition) = sequence.transition(uuid) else {
            return Err((command, CommandError::NotFound("transition")));
        };
        if transition.placement().is_in_track() {
            return Err((
                command,
                CommandError::construction("an in-track transition cannot change tracks"),
            ));
        }
        command.old_tracks = transition.placement().tracks();
        Ok(command)
    }

    pub(super) fn redo(&mut self, sequence: &mut SequenceModel) -> Result<(), CommandError> {
        let (track_a, track_b) = self.new_tracks;
        if !sequence.move_transition_between_tracks(self.uuid, track_a, track_b) {
            return Err(CommandError::Rejected("moving a transition between tracks"));
        }
        Ok(())
    }

    pub(super) fn undo(&mut self, sequence: &mut SequenceModel) -> Result<(), CommandError> {
        let (track_a, track_b) = self.old_tracks;
        if !sequence.move_transition_between_tracks(self.uuid, track_a, track_b) {
            return Err(CommandError::Rejected(
                "moving a transition back between tracks",
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct RemoveTransition {
    uuid: Uuid,
    removed: Option<TransitionInstance>,
}

impl RemoveTransition {
    pub(super) fn new(uuid: Uuid) -> Self {
        Self {
            uuid,
            removed: None,
        }
    }

    pub(super) fn redo(&mut self, sequence: &mut SequenceModel) -> Result<(), CommandError> {
        let removed = sequence
            .remove_transition(self.uuid)
            .ok_or(CommandError::Rejected("removing a transition"))?;
        self.removed = Some(removed);
        Ok(())
    }

    pub(super) fn undo(&mut self, sequence: &mut SequenceModel) -> Result<(), CommandError> {
        let transition = self
            .removed
            .take()
            .ok_or(CommandError::NotFound("removed transition"))?;
        if !sequence.restore_transition(transition) {
            return Err(CommandError::Rejected("restoring a transition"));
        }
        Ok(())
    }
}
