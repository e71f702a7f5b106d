use std::collections::BTreeMap;
use std::sync::Arc;

use crossbeam_channel::Receiver;
use tracing::{debug, error, warn};
use uuid::Uuid;

use super::error::{CommandError, SequenceError};
use super::events::{EventHub, SequenceEvent};
use super::instance::{ClipInstance, TransitionInstance};
use super::track::{Track, TrackType};
use crate::backend::{Channel, EngineBackend, InputHandle};
use crate::clips::{MediaCatalog, SourceClip};
use crate::config::SequenceConfig;

mod effects;
mod info;
mod snapshot;
mod transitions;

pub use effects::{EffectInstance, EffectTarget};
pub use info::{ClipInfo, EffectInfo, TransitionInfo};
pub use snapshot::LoadSummary;

/// Single source of truth for the timeline.
///
/// Owns one audio and one video [`Track`] per index, every live clip and
/// transition instance, and the effects attached to them. Every structural
/// change is mirrored into the engine through [`EngineBackend`].
///
/// Public operations never fail loudly: rejected requests are logged and
/// reported as `false`/`None`, and visible state is left as it was.
pub struct SequenceModel {
    config: SequenceConfig,
    catalog: Arc<dyn MediaCatalog>,
    backend: Box<dyn EngineBackend>,
    root: InputHandle,
    lanes: Vec<InputHandle>,
    audio_tracks: Vec<Track>,
    video_tracks: Vec<Track>,
    clips: BTreeMap<Uuid, ClipInstance>,
    transitions: BTreeMap<Uuid, TransitionInstance>,
    effects: BTreeMap<Uuid, EffectInstance>,
    events: EventHub<SequenceEvent>,
}

impl SequenceModel {
    /// Builds the track tree: for every index a multitrack holding the audio
    /// track (video hidden) at 0 and the video track (audio hidden) at 1,
    /// itself set at that index of the root multitrack.
    pub fn new(
        config: SequenceConfig,
        catalog: Arc<dyn MediaCatalog>,
        mut backend: Box<dyn EngineBackend>,
    ) -> Self {
        let root = backend.create_multitrack();
        let count = config.track_count;
        let mut lanes = Vec::with_capacity(count);
        let mut audio_tracks = Vec::with_capacity(count);
        let mut video_tracks = Vec::with_capacity(count);
        for index in 0..count {
            let track_id = index as u32;
            let audio = backend.create_track();
            let video = backend.create_track();
            let lane = backend.create_multitrack();
            backend.set_sub_input(lane, audio, 0, 0);
            backend.hide_channel(lane, Channel::Video, 0);
            backend.set_sub_input(lane, video, 1, 0);
            backend.hide_channel(lane, Channel::Audio, 1);
            backend.set_sub_input(root, lane, index, 0);
            lanes.push(lane);
            audio_tracks.push(Track::new(track_id, TrackType::Audio, audio));
            video_tracks.push(Track::new(track_id, TrackType::Video, video));
        }
        Self {
            config,
            catalog,
            backend,
            root,
            lanes,
            audio_tracks,
            video_tracks,
            clips: BTreeMap::new(),
            transitions: BTreeMap::new(),
            effects: BTreeMap::new(),
            events: EventHub::new(),
        }
    }

    pub fn config(&self) -> &SequenceConfig {
        &self.config
    }

    pub fn catalog(&self) -> &Arc<dyn MediaCatalog> {
        &self.catalog
    }

    pub fn subscribe(&mut self) -> Receiver<SequenceEvent> {
        self.events.subscribe()
    }

    pub fn track_count(&self) -> usize {
        self.lanes.len()
    }

    pub fn root_input(&self) -> InputHandle {
        self.root
    }

    /// The multitrack combining the audio and video tracks of `track_id`.
    pub fn lane_input(&self, track_id: u32) -> Option<InputHandle> {
        self.lanes.get(track_id as usize).copied()
    }

    pub fn track(&self, track_id: u32, kind: TrackType) -> Option<&Track> {
        self.tracks(kind).get(track_id as usize)
    }

    fn tracks(&self, kind: TrackType) -> &[Track] {
        match kind {
            TrackType::Audio => &self.audio_tracks,
            TrackType::Video => &self.video_tracks,
        }
    }

    fn track_mut(&mut self, track_id: u32, kind: TrackType) -> Result<&mut Track, SequenceError> {
        let tracks = match kind {
            TrackType::Audio => &mut self.audio_tracks,
            TrackType::Video => &mut self.video_tracks,
        };
        tracks
            .get_mut(track_id as usize)
            .ok_or(SequenceError::UnknownTrack { track_id, kind })
    }

    pub fn clip(&self, uuid: Uuid) -> Option<&ClipInstance> {
        self.clips.get(&uuid)
    }

    pub fn clips(&self) -> impl Iterator<Item = &ClipInstance> {
        self.clips.values()
    }

    pub fn clip_count(&self) -> usize {
        self.clips.len()
    }

    /// Track id of a clip instance, `None` when the instance is unknown.
    pub fn track_id(&self, uuid: Uuid) -> Option<u32> {
        self.clips.get(&uuid).map(ClipInstance::track_id)
    }

    pub fn position(&self, uuid: Uuid) -> Option<i64> {
        self.clips.get(&uuid).map(ClipInstance::position)
    }

    pub fn track_clip_at(&self, track_id: u32, kind: TrackType, frame: i64) -> Option<Uuid> {
        self.track(track_id, kind)?
            .clip_at(frame)
            .map(|placement| placement.uuid)
    }

    /// First frame after the last clip of any track.
    pub fn length(&self) -> i64 {
        self.audio_tracks
            .iter()
            .chain(self.video_tracks.iter())
            .map(Track::end)
            .max()
            .unwrap_or(0)
    }

    pub fn engine_length(&self) -> i64 {
        self.backend.length(self.root)
    }

    pub fn engine_position(&self) -> i64 {
        self.backend.position(self.root)
    }

    /// Places `clip` on a track. Reusing `uuid` keeps the instance identity
    /// stable across undo/redo.
    pub fn add_clip(
        &mut self,
        clip: Arc<SourceClip>,
        track_id: u32,
        position: i64,
        uuid: Option<Uuid>,
        is_audio: bool,
    ) -> Option<Uuid> {
        let uuid = uuid.unwrap_or_else(Uuid::new_v4);
        let instance = ClipInstance::new(uuid, clip, track_id, position, is_audio);
        match self.place_clip(instance) {
            Ok(()) => {
                debug!(%uuid, track_id, position, is_audio, "added clip instance");
                Some(uuid)
            }
            Err(err) => {
                warn!(%uuid, track_id, position, ?err, "failed to add clip instance");
                None
            }
        }
    }

    /// Puts a previously removed instance back exactly as it was, re-linking
    /// it to every partner that is still on the timeline.
    pub fn restore_clip(&mut self, mut instance: ClipInstance) -> bool {
        let uuid = instance.uuid;
        let partners = std::mem::take(&mut instance.linked);
        instance.input = None;
        if let Err(err) = self.place_clip(instance) {
            warn!(%uuid, ?err, "failed to restore clip instance");
            return false;
        }
        for partner in partners {
            if self.clips.contains_key(&partner) {
                self.insert_link(uuid, partner);
            } else {
                debug!(%uuid, %partner, "dropping link to a clip that is no longer present");
            }
        }
        debug!(%uuid, "restored clip instance");
        true
    }

    fn place_clip(&mut self, mut instance: ClipInstance) -> Result<(), SequenceError> {
        let uuid = instance.uuid;
        if self.clips.contains_key(&uuid) {
            return Err(SequenceError::DuplicateId(uuid));
        }
        let (index, track_input) = {
            let track = self.track_mut(instance.track_id, instance.track_type())?;
            let index = track.insert_clip(uuid, instance.position, instance.length())?;
            (index, track.input())
        };
        let input = self.backend.create_clip_input(&instance.clip);
        self.backend
            .insert_sub_input(track_input, input, index, instance.position);
        instance.input = Some(input);
        self.attach_clip_effects(uuid, input);

        let clip = Arc::clone(&instance.clip);
        self.clips.insert(uuid, instance);
        self.refresh_on_timeline(&clip);
        self.events.emit(SequenceEvent::ClipAdded(uuid));
        Ok(())
    }

    /// Moves an instance, possibly to another track of the same type. The
    /// destination is checked before anything is detached.
    pub fn move_clip(&mut self, uuid: Uuid, track_id: u32, position: i64) -> bool {
        match self.try_move_clip(uuid, track_id, position) {
            Ok(true) => {
                debug!(%uuid, track_id, position, "moved clip instance");
                self.events.emit(SequenceEvent::ClipMoved(uuid));
                true
            }
            Ok(false) => true,
            Err(err) => {
                warn!(%uuid, track_id, position, ?err, "failed to move clip instance");
                false
            }
        }
    }

    fn try_move_clip(
        &mut self,
        uuid: Uuid,
        track_id: u32,
        position: i64,
    ) -> Result<bool, SequenceError> {
        let instance = self
            .clips
            .get(&uuid)
            .ok_or(SequenceError::UnknownClip(uuid))?;
        let (old_track, old_position) = (instance.track_id, instance.position);
        if old_track == track_id && old_position == position {
            return Ok(false);
        }
        let kind = instance.track_type();
        let length = instance.length();
        let input = instance.input;

        if old_track == track_id {
            let track = self.track_mut(track_id, kind)?;
            let relocation = track.move_clip(uuid, position)?;
            let track_input = track.input();
            if let Some(input) = input {
                self.backend.remove_sub_input(track_input, relocation.from);
                self.backend
                    .insert_sub_input(track_input, input, relocation.to, position);
            }
        } else {
            self.track_mut(track_id, kind)?
                .can_place_clip(position, length, None)?;
            let (old_index, source_input) = {
                let source = self.track_mut(old_track, kind)?;
                let (index, _) = source.remove_clip(uuid)?;
                (index, source.input())
            };
            let (new_index, dest_input) = {
                let dest = self.track_mut(track_id, kind)?;
                (dest.insert_clip(uuid, position, length)?, dest.input())
            };
            if let Some(input) = input {
                self.backend.remove_sub_input(source_input, old_index);
                self.backend
                    .insert_sub_input(dest_input, input, new_index, position);
            }
        }

        if let Some(instance) = self.clips.get_mut(&uuid) {
            instance.track_id = track_id;
            instance.position = position;
        }
        Ok(true)
    }

    /// Changes the source range and position of an instance. The first
    /// resize clones the source clip; later ones rewrite that clone.
    pub fn resize_clip(&mut self, uuid: Uuid, begin: i64, end: i64, position: i64) -> bool {
        match self.try_resize_clip(uuid, begin, end, position) {
            Ok(()) => {
                debug!(%uuid, begin, end, position, "resized clip instance");
                self.events.emit(SequenceEvent::ClipResized(uuid));
                true
            }
            Err(err) => {
                warn!(%uuid, begin, end, position, ?err, "failed to resize clip instance");
                false
            }
        }
    }

    fn try_resize_clip(
        &mut self,
        uuid: Uuid,
        begin: i64,
        end: i64,
        position: i64,
    ) -> Result<(), SequenceError> {
        let instance = self
            .clips
            .get(&uuid)
            .ok_or(SequenceError::UnknownClip(uuid))?;
        let kind = instance.track_type();
        let track_id = instance.track_id;
        let old_input = instance.input;
        let old_clip = Arc::clone(&instance.clip);
        let duplicate = !instance.has_been_duplicated;

        let clip = if duplicate {
            old_clip.cut(begin, end)?
        } else {
            old_clip.with_boundaries(begin, end)?
        };
        let clip = Arc::new(clip);
        self.track_mut(track_id, kind)?
            .can_place_clip(position, clip.length(), Some(uuid))?;

        let (relocation, track_input) = {
            let track = self.track_mut(track_id, kind)?;
            (track.resize_clip(uuid, position, clip.length())?, track.input())
        };
        if let Some(old_input) = old_input {
            self.detach_clip_effects(uuid, old_input);
            self.backend.remove_sub_input(track_input, relocation.from);
            self.backend.release(old_input);
        }
        let input = self.backend.create_clip_input(&clip);
        self.backend
            .insert_sub_input(track_input, input, relocation.to, position);
        self.attach_clip_effects(uuid, input);

        if let Some(instance) = self.clips.get_mut(&uuid) {
            instance.clip = Arc::clone(&clip);
            instance.position = position;
            instance.input = Some(input);
            if duplicate {
                debug!(%uuid, clip = %clip.uuid(), "duplicated source clip for resize");
                instance.has_been_duplicated = true;
            }
        }
        if duplicate {
            self.refresh_on_timeline(&clip);
            self.refresh_on_timeline(&old_clip);
        }
        Ok(())
    }

    /// Takes an instance off the timeline and hands it back so it can be
    /// restored with identical metadata.
    pub fn remove_clip(&mut self, uuid: Uuid) -> Option<ClipInstance> {
        let Some(mut instance) = self.clips.remove(&uuid) else {
            warn!(%uuid, "cannot remove unknown clip instance");
            return None;
        };
        let detached = self
            .track_mut(instance.track_id, instance.track_type())
            .and_then(|track| {
                let (index, _) = track.remove_clip(uuid)?;
                Ok((index, track.input()))
            });
        match detached {
            Ok((index, track_input)) => {
                if let Some(input) = instance.input.take() {
                    self.detach_clip_effects(uuid, input);
                    self.backend.remove_sub_input(track_input, index);
                    self.backend.release(input);
                }
            }
            Err(err) => error!(%uuid, ?err, "clip instance was not placed on its track"),
        }
        for partner in &instance.linked {
            if let Some(other) = self.clips.get_mut(partner) {
                other.linked.remove(&uuid);
                self.events
                    .emit(SequenceEvent::ClipUnlinked(uuid, *partner));
            }
        }
        self.refresh_on_timeline(&instance.clip);
        debug!(%uuid, "removed clip instance");
        self.events.emit(SequenceEvent::ClipRemoved(uuid));
        Some(instance)
    }

    pub fn link_clips(&mut self, a: Uuid, b: Uuid) -> bool {
        let linkable = a != b
            && self.clips.contains_key(&b)
            && self
                .clips
                .get(&a)
                .map(|clip| !clip.linked.contains(&b))
                .unwrap_or(false);
        if !linkable {
            warn!(err = %SequenceError::LinkRefused(a, b), "failed to link clips");
            return false;
        }
        self.insert_link(a, b);
        debug!(%a, %b, "linked clips");
        true
    }

    fn insert_link(&mut self, a: Uuid, b: Uuid) {
        if let Some(clip) = self.clips.get_mut(&a) {
            clip.linked.insert(b);
        }
        if let Some(clip) = self.clips.get_mut(&b) {
            clip.linked.insert(a);
        }
        self.events.emit(SequenceEvent::ClipLinked(a, b));
    }

    /// Both sides are always attempted. When only one side held the link,
    /// that side is put back so the relation stays symmetric, and the call
    /// reports failure.
    pub fn unlink_clips(&mut self, a: Uuid, b: Uuid) -> bool {
        if !self.clips.contains_key(&a) || !self.clips.contains_key(&b) {
            warn!(%a, %b, "cannot unlink unknown clip instances");
            return false;
        }
        let removed_a = self
            .clips
            .get_mut(&a)
            .map(|clip| clip.linked.remove(&b))
            .unwrap_or(false);
        let removed_b = self
            .clips
            .get_mut(&b)
            .map(|clip| clip.linked.remove(&a))
            .unwrap_or(false);
        match (removed_a, removed_b) {
            (true, true) => {
                debug!(%a, %b, "unlinked clips");
                self.events.emit(SequenceEvent::ClipUnlinked(a, b));
                true
            }
            (false, false) => {
                warn!(%a, %b, "clips were not linked");
                false
            }
            _ => {
                error!(%a, %b, "found a one-sided link; restoring it");
                if removed_a {
                    if let Some(clip) = self.clips.get_mut(&a) {
                        clip.linked.insert(b);
                    }
                }
                if removed_b {
                    if let Some(clip) = self.clips.get_mut(&b) {
                        clip.linked.insert(a);
                    }
                }
                false
            }
        }
    }

    /// Removes every clip, transition and effect.
    pub fn clear(&mut self) {
        let clips: Vec<Uuid> = self.clips.keys().copied().collect();
        for uuid in clips {
            self.remove_clip(uuid);
        }
        let transitions: Vec<Uuid> = self.transitions.keys().copied().collect();
        for uuid in transitions {
            self.remove_transition(uuid);
        }
        let effects = std::mem::take(&mut self.effects);
        for effect in effects.into_values() {
            if let Some(input) = effect.target.and_then(|target| self.target_input(target)) {
                self.backend.detach_effect(input, effect.filter);
            }
            self.backend.release_filter(effect.filter);
        }
        for track in self.audio_tracks.iter_mut().chain(&mut self.video_tracks) {
            track.clear();
        }
        debug!("cleared sequence");
        self.events.emit(SequenceEvent::Cleared);
    }

    fn refresh_on_timeline(&mut self, clip: &Arc<SourceClip>) {
        let present = self
            .clips
            .values()
            .any(|instance| instance.clip.uuid() == clip.uuid());
        if clip.is_on_timeline() != present {
            clip.set_on_timeline(present);
            self.events.emit(SequenceEvent::OnTimelineChanged {
                clip: clip.uuid(),
                on_timeline: present,
            });
        }
    }

    /// Verifies track ordering, placement bookkeeping and link symmetry.
    pub fn check_invariants(&self) -> Result<(), CommandError> {
        for track in self.audio_tracks.iter().chain(self.video_tracks.iter()) {
            if !track.is_consistent() {
                return Err(CommandError::invariant(format!(
                    "{:?} track {} has overlapping placements",
                    track.kind(),
                    track.id()
                )));
            }
            for placement in track.clips() {
                let Some(instance) = self.clips.get(&placement.uuid) else {
                    return Err(CommandError::invariant(format!(
                        "track {} holds unknown clip {}",
                        track.id(),
                        placement.uuid
                    )));
                };
                if instance.track_id != track.id()
                    || instance.track_type() != track.kind()
                    || instance.position != placement.position
                    || instance.length() != placement.length
                {
                    return Err(CommandError::invariant(format!(
                        "clip {} disagrees with its placement",
                        placement.uuid
                    )));
                }
            }
        }
        for instance in self.clips.values() {
            let placed = self
                .track(instance.track_id, instance.track_type())
                .map(|track| track.contains_clip(instance.uuid))
                .unwrap_or(false);
            if !placed {
                return Err(CommandError::invariant(format!(
                    "clip {} is not placed on its track",
                    instance.uuid
                )));
            }
            for partner in &instance.linked {
                let symmetric = self
                    .clips
                    .get(partner)
                    .map(|other| other.linked.contains(&instance.uuid))
                    .unwrap_or(false);
                if !symmetric {
                    return Err(CommandError::invariant(format!(
                        "link {} -> {} is not symmetric",
                        instance.uuid, partner
                    )));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::HeadlessBackend;
    use crate::clips::{Media, MediaLibrary};

    fn linked_pair() -> (SequenceModel, Uuid, Uuid) {
        let library = MediaLibrary::new();
        let clip = library.add_media(Media::new("take.mov", 20, true, true));
        let mut sequence = SequenceModel::new(
            SequenceConfig::default(),
            Arc::new(library),
            Box::new(HeadlessBackend::new()),
        );
        let audio = sequence
            .add_clip(Arc::clone(&clip), 0, 0, None, true)
            .unwrap();
        let video = sequence.add_clip(clip, 0, 0, None, false).unwrap();
        assert!(sequence.link_clips(audio, video));
        (sequence, audio, video)
    }

    #[test]
    fn one_sided_link_is_put_back_on_unlink() {
        let (mut sequence, audio, video) = linked_pair();
        let instance = sequence.clips.get_mut(&audio).unwrap();
        instance.linked.remove(&video);

        assert!(!sequence.unlink_clips(audio, video));
        assert!(!sequence.clip(audio).unwrap().is_linked_to(video));
        assert!(sequence.clip(video).unwrap().is_linked_to(audio));
        assert!(sequence.check_invariants().is_err());

        assert!(!sequence.unlink_clips(video, audio));
        assert!(sequence.clip(video).unwrap().is_linked_to(audio));
    }

    #[test]
    fn unlinking_twice_reports_the_missing_link() {
        let (mut sequence, audio, video) = linked_pair();
        assert!(sequence.unlink_clips(audio, video));
        assert!(!sequence.unlink_clips(audio, video));
        assert!(sequence.check_invariants().is_ok());
    }
}
