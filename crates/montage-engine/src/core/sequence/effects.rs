use tracing::{debug, warn};
use uuid::Uuid;

use super::SequenceModel;
use crate::backend::{FilterHandle, InputHandle};
use crate::core::error::SequenceError;
use crate::core::events::SequenceEvent;
use crate::core::track::TrackType;

/// Where an effect is applied.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EffectTarget {
    Sequence,
    Track {
        track_id: u32,
        track_type: TrackType,
    },
    Clip(Uuid),
}

#[derive(Debug, Clone)]
pub struct EffectInstance {
    pub(crate) uuid: Uuid,
    pub(crate) identifier: String,
    pub(crate) begin: i64,
    pub(crate) end: i64,
    pub(crate) filter: FilterHandle,
    pub(crate) target: Option<EffectTarget>,
}

impl EffectInstance {
    pub fn uuid(&self) -> Uuid {
        self.uuid
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn begin(&self) -> i64 {
        self.begin
    }

    /// Inclusive last frame, `-1` when the effect lasts until the end of
    /// its target.
    pub fn end(&self) -> i64 {
        self.end
    }

    pub fn target(&self) -> Option<EffectTarget> {
        self.target
    }
}

impl SequenceModel {
    pub fn effect(&self, uuid: Uuid) -> Option<&EffectInstance> {
        self.effects.get(&uuid)
    }

    pub fn effects_on(&self, target: EffectTarget) -> Vec<&EffectInstance> {
        self.effects
            .values()
            .filter(|effect| effect.target == Some(target))
            .collect()
    }

    /// Builds a detached effect. Fails when the engine does not know the
    /// identifier.
    pub fn create_effect(&mut self, identifier: &str) -> Option<Uuid> {
        self.create_effect_with(Uuid::new_v4(), identifier, 0, -1)
    }

    pub(crate) fn create_effect_with(
        &mut self,
        uuid: Uuid,
        identifier: &str,
        begin: i64,
        end: i64,
    ) -> Option<Uuid> {
        if self.effects.contains_key(&uuid) {
            warn!(%uuid, identifier, "effect identifier already in use");
            return None;
        }
        let filter = match self.backend.create_filter(identifier) {
            Ok(filter) => filter,
            Err(err) => {
                warn!(identifier, %err, "failed to create effect");
                return None;
            }
        };
        self.backend.set_filter_boundaries(filter, begin, end);
        self.effects.insert(
            uuid,
            EffectInstance {
                uuid,
                identifier: identifier.to_owned(),
                begin,
                end,
                filter,
                target: None,
            },
        );
        debug!(%uuid, identifier, "created effect");
        Some(uuid)
    }

    /// Drops a detached effect and its engine filter.
    pub fn discard_effect(&mut self, uuid: Uuid) -> bool {
        match self.effects.get(&uuid) {
            Some(effect) if effect.target.is_none() => {}
            _ => return false,
        }
        if let Some(effect) = self.effects.remove(&uuid) {
            self.backend.release_filter(effect.filter);
        }
        true
    }

    pub fn attach_effect(&mut self, uuid: Uuid, target: EffectTarget) -> bool {
        match self.try_attach_effect(uuid, target) {
            Ok(()) => {
                debug!(%uuid, ?target, "attached effect");
                self.events.emit(SequenceEvent::EffectsUpdated(target));
                true
            }
            Err(err) => {
                warn!(%uuid, ?target, ?err, "failed to attach effect");
                false
            }
        }
    }

    fn try_attach_effect(&mut self, uuid: Uuid, target: EffectTarget) -> Result<(), SequenceError> {
        let effect = self
            .effects
            .get(&uuid)
            .ok_or(SequenceError::UnknownEffect(uuid))?;
        if effect.target.is_some() {
            return Err(SequenceError::EffectAttached(uuid));
        }
        let filter = effect.filter;
        let input = self
            .target_input(target)
            .ok_or(SequenceError::MissingEffectTarget)?;
        self.backend.attach_effect(input, filter);
        if let Some(effect) = self.effects.get_mut(&uuid) {
            effect.target = Some(target);
        }
        Ok(())
    }

    /// Detaches an effect and reports where it was attached.
    pub fn detach_effect(&mut self, uuid: Uuid) -> Option<EffectTarget> {
        let Some(effect) = self.effects.get_mut(&uuid) else {
            warn!(%uuid, "cannot detach unknown effect");
            return None;
        };
        let Some(target) = effect.target.take() else {
            warn!(%uuid, "effect is not attached");
            return None;
        };
        let filter = effect.filter;
        if let Some(input) = self.target_input(target) {
            self.backend.detach_effect(input, filter);
        }
        debug!(%uuid, ?target, "detached effect");
        self.events.emit(SequenceEvent::EffectsUpdated(target));
        Some(target)
    }

    pub fn set_effect_boundaries(&mut self, uuid: Uuid, begin: i64, end: i64) -> bool {
        if begin < 0 || (end != -1 && end < begin) {
            let err = SequenceError::InvalidBoundaries { begin, end };
            warn!(%uuid, %err, "refused effect boundaries");
            return false;
        }
        let Some(effect) = self.effects.get_mut(&uuid) else {
            warn!(%uuid, "cannot resize unknown effect");
            return false;
        };
        effect.begin = begin;
        effect.end = end;
        let (filter, target) = (effect.filter, effect.target);
        self.backend.set_filter_boundaries(filter, begin, end);
        if let Some(target) = target {
            self.events.emit(SequenceEvent::EffectsUpdated(target));
        }
        true
    }

    pub(crate) fn target_input(&self, target: EffectTarget) -> Option<InputHandle> {
        match target {
            EffectTarget::Sequence => Some(self.root),
            EffectTarget::Track {
                track_id,
                track_type,
            } => self.track(track_id, track_type).map(|track| track.input()),
            EffectTarget::Clip(uuid) => self.clips.get(&uuid).and_then(|clip| clip.input),
        }
    }

    /// Effects follow a clip instance across engine inputs: they are
    /// detached when the instance leaves the timeline or swaps its input and
    /// attached again to the new one.
    pub(super) fn attach_clip_effects(&mut self, clip: Uuid, input: InputHandle) {
        let filters = self.clip_filters(clip);
        for filter in filters {
            self.backend.attach_effect(input, filter);
        }
    }

    pub(super) fn detach_clip_effects(&mut self, clip: Uuid, input: InputHandle) {
        let filters = self.clip_filters(clip);
        for filter in filters {
            self.backend.detach_effect(input, filter);
        }
    }

    fn clip_filters(&self, clip: Uuid) -> Vec<FilterHandle> {
        self.effects
            .values()
            .filter(|effect| effect.target == Some(EffectTarget::Clip(clip)))
            .map(|effect| effect.filter)
            .collect()
    }
}
