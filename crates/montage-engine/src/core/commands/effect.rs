use uuid::Uuid;

use super::Built;
use crate::core::error::CommandError;
use crate::core::sequence::{EffectTarget, SequenceModel};

/// Attaches an effect built when the command was constructed.
#[derive(Debug, Clone)]
pub struct AddEffect {
    uuid: Uuid,
    target: EffectTarget,
}

impl AddEffect {
    pub(super) fn new(
        sequence: &mut SequenceModel,
        identifier: &str,
        target: EffectTarget,
    ) -> Built<Self> {
        match sequence.create_effect(identifier) {
            Some(uuid) => Ok(Self { uuid, target }),
            None => Err((
                Self {
                    uuid: Uuid::nil(),
                    target,
                },
                CommandError::construction(format!("engine has no effect named {identifier:?}")),
            )),
        }
    }

    pub fn effect(&self) -> Uuid {
        self.uuid
    }

    pub(super) fn redo(&mut self, sequence: &mut SequenceModel) -> Result<(), CommandError> {
        if !sequence.attach_effect(self.uuid, self.target) {
            return Err(CommandError::Rejected("attaching an effect"));
        }
        Ok(())
    }

    pub(super) fn undo(&mut self, sequence: &mut SequenceModel) -> Result<(), CommandError> {
        sequence
            .detach_effect(self.uuid)
            .ok_or(CommandError::Rejected("detaching an effect"))?;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct EffectPlacement {
    target: EffectTarget,
    begin: i64,
    end: i64,
}

/// Shifts an effect to start at a new frame, keeping its length, and
/// optionally hands it over to another target.
#[derive(Debug, Clone)]
pub struct MoveEffect {
    uuid: Uuid,
    old: EffectPlacement,
    new: EffectPlacement,
}

impl MoveEffect {
    pub(super) fn new(
        sequence: &SequenceModel,
        uuid: Uuid,
        target: EffectTarget,
        position: i64,
    ) -> Built<Self> {
        let mut command = Self {
            uuid,
            old: EffectPlacement {
                target,
                begin: 0,
                end: -1,
            },
            new: EffectPlacement {
                target,
                begin: position,
                end: -1,
            },
        };
        let Some(effect) = sequence.effect(uuid) else {
            return Err((command, CommandError::NotFound("effect")));
        };
        let Some(current) = effect.target() else {
            return Err((
                command,
                CommandError::construction("effect is not attached"),
            ));
        };
        command.old = EffectPlacement {
            target: current,
            begin: effect.begin(),
            end: effect.end(),
        };
        if effect.end() != -1 {
            let end = effect
                .end()
                .checked_sub(effect.begin())
                .and_then(|span| span.checked_add(position));
            let Some(end) = end else {
                return Err((
                    command,
                    CommandError::construction(format!("effect cannot start at frame {position}")),
                ));
            };
            command.new.end = end;
        }
        Ok(command)
    }

    pub fn effect(&self) -> Uuid {
        self.uuid
    }

    pub(super) fn redo(&mut self, sequence: &mut SequenceModel) -> Result<(), CommandError> {
        place_effect(sequence, self.uuid, self.old.target, self.new)
    }

    pub(super) fn undo(&mut self, sequence: &mut SequenceModel) -> Result<(), CommandError> {
        place_effect(sequence, self.uuid, self.new.target, self.old)
    }
}

fn place_effect(
    sequence: &mut SequenceModel,
    uuid: Uuid,
    from: EffectTarget,
    to: EffectPlacement,
) -> Result<(), CommandError> {
    let retarget = from != to.target;
    if retarget {
        sequence
            .detach_effect(uuid)
            .ok_or(CommandError::Rejected("detaching an effect"))?;
    }
    if !sequence.set_effect_boundaries(uuid, to.begin, to.end) {
        return Err(CommandError::Rejected("moving an effect"));
    }
    if retarget && !sequence.attach_effect(uuid, to.target) {
        return Err(CommandError::Rejected("attaching an effect"));
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResizeEffect {
    uuid: Uuid,
    old_begin: i64,
    old_end: i64,
    new_begin: i64,
    new_end: i64,
}

impl ResizeEffect {
    pub(super) fn new(sequence: &SequenceModel, uuid: Uuid, begin: i64, end: i64) -> Built<Self> {
        let mut command = Self {
            uuid,
            old_begin: 0,
            old_end: -1,
            new_begin: begin,
            new_end: end,
        };
        let Some(effect) = sequence.effect(uuid) else {
            return Err((command, CommandError::NotFound("effect")));
        };
        command.old_begin = effect.begin();
        command.old_end = effect.end();
        Ok(command)
    }

    pub fn effect(&self) -> Uuid {
        self.uuid
    }

    pub(super) fn redo(&mut self, sequence: &mut SequenceModel) -> Result<(), CommandError> {
        if !sequence.set_effect_boundaries(self.uuid, self.new_begin, self.new_end) {
            return Err(CommandError::Rejected("resizing an effect"));
        }
        Ok(())
    }

    pub(super) fn undo(&mut self, sequence: &mut SequenceModel) -> Result<(), CommandError> {
        if !sequence.set_effect_boundaries(self.uuid, self.old_begin, self.old_end) {
            return Err(CommandError::Rejected("resizing an effect back"));
        }
        Ok(())
    }
}

/// Detaches an effect; undo re-attaches it where it was.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RemoveEffect {
    uuid: Uuid,
    target: EffectTarget,
}

impl RemoveEffect {
    pub(super) fn new(sequence: &SequenceModel, uuid: Uuid) -> Built<Self> {
        let mut command = Self {
            uuid,
            target: EffectTarget::Sequence,
        };
        let Some(effect) = sequence.effect(uuid) else {
            return Err((command, CommandError::NotFound("effect")));
        };
        let Some(target) = effect.target() else {
            return Err((
                command,
                CommandError::construction("effect is not attached"),
            ));
        };
        command.target = target;
        Ok(command)
    }

    pub fn effect(&self) -> Uuid {
        self.uuid
    }

    pub(super) fn redo(&mut self, sequence: &mut SequenceModel) -> Result<(), CommandError> {
        self.target = sequence
            .detach_effect(self.uuid)
            .ok_or(CommandError::Rejected("detaching an effect"))?;
        Ok(())
    }

    pub(super) fn undo(&mut self, sequence: &mut SequenceModel) -> Result<(), CommandError> {
        if !sequence.attach_effect(self.uuid, self.target) {
            return Err(CommandError::Rejected("re-attaching an effect"));
        }
        Ok(())
    }
}
