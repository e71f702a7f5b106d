use tracing::{debug, warn};
use uuid::Uuid;

use super::SequenceModel;
use crate::backend::{InputHandle, TransitionDesc};
use crate::clips::frame_count;
use crate::core::error::{SequenceError, TrackError};
use crate::core::events::SequenceEvent;
use crate::core::instance::{TransitionInstance, TransitionPlacement};
use crate::core::track::TrackType;

impl SequenceModel {
    pub fn transition(&self, uuid: Uuid) -> Option<&TransitionInstance> {
        self.transitions.get(&uuid)
    }

    pub fn transitions(&self) -> impl Iterator<Item = &TransitionInstance> {
        self.transitions.values()
    }

    /// Adds a transition between consecutive clips of one track.
    pub fn add_transition(
        &mut self,
        identifier: &str,
        begin: i64,
        end: i64,
        track_id: u32,
        track_type: TrackType,
    ) -> Option<Uuid> {
        self.create_transition(
            identifier,
            begin,
            end,
            TransitionPlacement::InTrack { track_id },
            track_type,
        )
    }

    /// Adds a transition blending two whole tracks.
    pub fn add_transition_between_tracks(
        &mut self,
        identifier: &str,
        begin: i64,
        end: i64,
        track_a: u32,
        track_b: u32,
        track_type: TrackType,
    ) -> Option<Uuid> {
        self.create_transition(
            identifier,
            begin,
            end,
            TransitionPlacement::CrossTrack { track_a, track_b },
            track_type,
        )
    }

    fn create_transition(
        &mut self,
        identifier: &str,
        begin: i64,
        end: i64,
        placement: TransitionPlacement,
        track_type: TrackType,
    ) -> Option<Uuid> {
        let transition = TransitionInstance {
            uuid: Uuid::new_v4(),
            identifier: identifier.to_owned(),
            begin,
            end,
            placement,
            track_type,
            handle: None,
        };
        let uuid = transition.uuid;
        match self.place_transition(transition) {
            Ok(()) => {
                debug!(%uuid, identifier, begin, end, ?placement, "added transition");
                Some(uuid)
            }
            Err(err) => {
                warn!(identifier, begin, end, ?placement, ?err, "failed to add transition");
                None
            }
        }
    }

    /// Puts back a transition returned by [`remove_transition`](Self::remove_transition)
    /// or read from a snapshot, keeping its identity.
    pub fn restore_transition(&mut self, mut transition: TransitionInstance) -> bool {
        let uuid = transition.uuid;
        transition.handle = None;
        match self.place_transition(transition) {
            Ok(()) => {
                debug!(%uuid, "restored transition");
                true
            }
            Err(err) => {
                warn!(%uuid, ?err, "failed to restore transition");
                false
            }
        }
    }

    fn place_transition(
        &mut self,
        mut transition: TransitionInstance,
    ) -> Result<(), SequenceError> {
        let uuid = transition.uuid;
        if self.transitions.contains_key(&uuid) {
            return Err(SequenceError::DuplicateId(uuid));
        }
        let length = ensure_span(transition.begin, transition.end)?;
        let composition = match transition.placement {
            TransitionPlacement::InTrack { track_id } => {
                let track = self.track_mut(track_id, transition.track_type)?;
                track.insert_transition(uuid, transition.begin, length)?;
                track.input()
            }
            TransitionPlacement::CrossTrack { track_a, track_b } => {
                self.ensure_track(track_a, transition.track_type)?;
                self.ensure_track(track_b, transition.track_type)?;
                self.root
            }
        };
        match self
            .backend
            .add_transition(composition, &describe(&transition))
        {
            Ok(handle) => transition.handle = Some(handle),
            Err(err) => {
                if let TransitionPlacement::InTrack { track_id } = transition.placement {
                    self.track_mut(track_id, transition.track_type)?
                        .remove_transition(uuid)?;
                }
                return Err(SequenceError::Engine(err.to_string()));
            }
        }
        self.transitions.insert(uuid, transition);
        self.events.emit(SequenceEvent::TransitionAdded(uuid));
        Ok(())
    }

    fn ensure_track(&self, track_id: u32, kind: TrackType) -> Result<InputHandle, SequenceError> {
        self.track(track_id, kind)
            .map(|track| track.input())
            .ok_or(SequenceError::UnknownTrack { track_id, kind })
    }

    /// Changes the frame span of a transition.
    pub fn move_transition(&mut self, uuid: Uuid, begin: i64, end: i64) -> bool {
        match self.try_move_transition(uuid, begin, end) {
            Ok(true) => {
                debug!(%uuid, begin, end, "moved transition");
                self.events.emit(SequenceEvent::TransitionMoved(uuid));
                true
            }
            Ok(false) => true,
            Err(err) => {
                warn!(%uuid, begin, end, ?err, "failed to move transition");
                false
            }
        }
    }

    fn try_move_transition(
        &mut self,
        uuid: Uuid,
        begin: i64,
        end: i64,
    ) -> Result<bool, SequenceError> {
        let transition = self
            .transitions
            .get(&uuid)
            .ok_or(SequenceError::UnknownTransition(uuid))?;
        if transition.begin == begin && transition.end == end {
            return Ok(false);
        }
        let length = ensure_span(begin, end)?;
        if let TransitionPlacement::InTrack { track_id } = transition.placement {
            let kind = transition.track_type;
            self.track_mut(track_id, kind)?
                .move_transition(uuid, begin, length)?;
        }
        self.update_transition(uuid, |transition| {
            transition.begin = begin;
            transition.end = end;
        });
        Ok(true)
    }

    /// Re-targets a cross-track transition. In-track transitions are
    /// refused.
    pub fn move_transition_between_tracks(
        &mut self,
        uuid: Uuid,
        track_a: u32,
        track_b: u32,
    ) -> bool {
        match self.try_move_transition_between_tracks(uuid, track_a, track_b) {
            Ok(true) => {
                debug!(%uuid, track_a, track_b, "moved transition between tracks");
                self.events.emit(SequenceEvent::TransitionMoved(uuid));
                true
            }
            Ok(false) => true,
            Err(err) => {
                warn!(%uuid, track_a, track_b, ?err, "failed to move transition between tracks");
                false
            }
        }
    }

    fn try_move_transition_between_tracks(
        &mut self,
        uuid: Uuid,
        track_a: u32,
        track_b: u32,
    ) -> Result<bool, SequenceError> {
        let transition = self
            .transitions
            .get(&uuid)
            .ok_or(SequenceError::UnknownTransition(uuid))?;
        let placement = TransitionPlacement::CrossTrack { track_a, track_b };
        match transition.placement {
            TransitionPlacement::InTrack { .. } => {
                return Err(SequenceError::InTrackTransition(uuid))
            }
            current if current == placement => return Ok(false),
            TransitionPlacement::CrossTrack { .. } => {}
        }
        let kind = transition.track_type;
        self.ensure_track(track_a, kind)?;
        self.ensure_track(track_b, kind)?;
        self.update_transition(uuid, |transition| transition.placement = placement);
        Ok(true)
    }

    fn update_transition(&mut self, uuid: Uuid, change: impl FnOnce(&mut TransitionInstance)) {
        if let Some(transition) = self.transitions.get_mut(&uuid) {
            change(transition);
            if let Some(handle) = transition.handle {
                let desc = describe(transition);
                self.backend.update_transition(handle, &desc);
            }
        }
    }

    pub fn remove_transition(&mut self, uuid: Uuid) -> Option<TransitionInstance> {
        let Some(mut transition) = self.transitions.remove(&uuid) else {
            warn!(%uuid, "cannot remove unknown transition");
            return None;
        };
        if let TransitionPlacement::InTrack { track_id } = transition.placement {
            let removed = self
                .track_mut(track_id, transition.track_type)
                .and_then(|track| track.remove_transition(uuid).map_err(Into::into));
            if let Err(err) = removed {
                warn!(%uuid, ?err, "in-track transition was not placed on its track");
            }
        }
        if let Some(handle) = transition.handle.take() {
            self.backend.remove_transition(handle);
        }
        debug!(%uuid, "removed transition");
        self.events.emit(SequenceEvent::TransitionRemoved(uuid));
        Some(transition)
    }
}

/// Frame count of a transition span, refused when it cannot be placed.
fn ensure_span(begin: i64, end: i64) -> Result<i64, SequenceError> {
    frame_count(begin, end).ok_or_else(|| {
        let length = end.saturating_sub(begin).saturating_add(1);
        TrackError::InvalidLength(length).into()
    })
}

fn describe(transition: &TransitionInstance) -> TransitionDesc {
    TransitionDesc {
        identifier: transition.identifier.clone(),
        begin: transition.begin,
        end: transition.end,
        tracks: match transition.placement {
            TransitionPlacement::InTrack { .. } => None,
            TransitionPlacement::CrossTrack { track_a, track_b } => Some((track_a, track_b)),
        },
    }
}
