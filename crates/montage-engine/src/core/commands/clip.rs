use std::collections::BTreeSet;
use std::sync::Arc;

use uuid::Uuid;

use super::Built;
use crate::clips::SourceClip;
use crate::core::error::CommandError;
use crate::core::instance::ClipInstance;
use crate::core::sequence::SequenceModel;

/// Places a catalog clip on a track: one audio and/or one video instance,
/// linked together when both exist. The catalog is asked again on every
/// redo, and instance ids from the first run are reused afterwards.
#[derive(Debug, Clone)]
pub struct AddClip {
    library_uuid: Uuid,
    track_id: u32,
    position: i64,
    audio: Option<Uuid>,
    video: Option<Uuid>,
}

impl AddClip {
    pub(super) fn new(library_uuid: Uuid, track_id: u32, position: i64) -> Self {
        Self {
            library_uuid,
            track_id,
            position,
            audio: None,
            video: None,
        }
    }

    pub fn audio_instance(&self) -> Option<Uuid> {
        self.audio
    }

    pub fn video_instance(&self) -> Option<Uuid> {
        self.video
    }

    pub(super) fn redo(&mut self, sequence: &mut SequenceModel) -> Result<(), CommandError> {
        let clip = sequence
            .catalog()
            .lookup_clip(self.library_uuid)
            .ok_or(CommandError::NotFound("library clip"))?;
        let media = Arc::clone(clip.media());
        if !media.has_audio && !media.has_video {
            return Err(CommandError::Rejected("media without audio or video"));
        }
        if media.has_audio {
            let uuid = sequence
                .add_clip(
                    Arc::clone(&clip),
                    self.track_id,
                    self.position,
                    self.audio,
                    true,
                )
                .ok_or(CommandError::Rejected("adding the audio clip"))?;
            self.audio = Some(uuid);
        }
        if media.has_video {
            let uuid = sequence
                .add_clip(clip, self.track_id, self.position, self.video, false)
                .ok_or(CommandError::Rejected("adding the video clip"))?;
            self.video = Some(uuid);
        }
        if let (Some(audio), Some(video)) = (self.audio, self.video) {
            if !sequence.link_clips(audio, video) {
                return Err(CommandError::Rejected("linking the added clips"));
            }
        }
        Ok(())
    }

    pub(super) fn undo(&mut self, sequence: &mut SequenceModel) -> Result<(), CommandError> {
        for uuid in [self.audio, self.video].into_iter().flatten() {
            sequence
                .remove_clip(uuid)
                .ok_or(CommandError::Rejected("removing the added clip"))?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveEntry {
    pub uuid: Uuid,
    pub old_track: u32,
    pub old_position: i64,
    pub new_track: u32,
    pub new_position: i64,
}

#[derive(Debug, Clone)]
pub struct MoveClips {
    entries: Vec<MoveEntry>,
    linked: BTreeSet<Uuid>,
}

impl MoveClips {
    pub(super) fn new(
        sequence: &SequenceModel,
        uuid: Uuid,
        track_id: u32,
        position: i64,
    ) -> Built<Self> {
        let Some(clip) = sequence.clip(uuid) else {
            return Err((Self::inert(), CommandError::NotFound("clip")));
        };
        Ok(Self {
            entries: vec![MoveEntry {
                uuid,
                old_track: clip.track_id(),
                old_position: clip.position(),
                new_track: track_id,
                new_position: position,
            }],
            linked: clip.linked().clone(),
        })
    }

    fn inert() -> Self {
        Self {
            entries: Vec::new(),
            linked: BTreeSet::new(),
        }
    }

    pub fn entries(&self) -> &[MoveEntry] {
        &self.entries
    }

    pub(super) fn merged_with(&self, next: &Self) -> Option<Self> {
        let candidate = single_target(&self.entries, &next.entries, &self.linked, |e| e.uuid)?;
        let mut merged = self.clone();
        merged.entries.push(*candidate);
        Some(merged)
    }

    pub(super) fn redo(&mut self, sequence: &mut SequenceModel) -> Result<(), CommandError> {
        for entry in &self.entries {
            if !sequence.move_clip(entry.uuid, entry.new_track, entry.new_position) {
                return Err(CommandError::Rejected("moving a clip"));
            }
        }
        Ok(())
    }

    pub(super) fn undo(&mut self, sequence: &mut SequenceModel) -> Result<(), CommandError> {
        for entry in self.entries.iter().rev() {
            if !sequence.move_clip(entry.uuid, entry.old_track, entry.old_position) {
                return Err(CommandError::Rejected("moving a clip back"));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResizeEntry {
    pub uuid: Uuid,
    pub old_begin: i64,
    pub old_end: i64,
    pub old_position: i64,
    pub new_begin: i64,
    pub new_end: i64,
    pub new_position: i64,
}

#[derive(Debug, Clone)]
pub struct ResizeClips {
    entries: Vec<ResizeEntry>,
    linked: BTreeSet<Uuid>,
}

impl ResizeClips {
    pub(super) fn new(
        sequence: &SequenceModel,
        uuid: Uuid,
        begin: i64,
        end: i64,
        position: i64,
    ) -> Built<Self> {
        let Some(clip) = sequence.clip(uuid) else {
            return Err((
                Self {
                    entries: Vec::new(),
                    linked: BTreeSet::new(),
                },
                CommandError::NotFound("clip"),
            ));
        };
        Ok(Self {
            entries: vec![ResizeEntry {
                uuid,
                old_begin: clip.begin_frame(),
                old_end: clip.end_frame(),
                old_position: clip.position(),
                new_begin: begin,
                new_end: end,
                new_position: position,
            }],
            linked: clip.linked().clone(),
        })
    }

    pub fn entries(&self) -> &[ResizeEntry] {
        &self.entries
    }

    pub(super) fn merged_with(&self, next: &Self) -> Option<Self> {
        let candidate = single_target(&self.entries, &next.entries, &self.linked, |e| e.uuid)?;
        let mut merged = self.clone();
        merged.entries.push(*candidate);
        Some(merged)
    }

    pub(super) fn redo(&mut self, sequence: &mut SequenceModel) -> Result<(), CommandError> {
        for entry in &self.entries {
            if !sequence.resize_clip(
                entry.uuid,
                entry.new_begin,
                entry.new_end,
                entry.new_position,
            ) {
                return Err(CommandError::Rejected("resizing a clip"));
            }
        }
        Ok(())
    }

    pub(super) fn undo(&mut self, sequence: &mut SequenceModel) -> Result<(), CommandError> {
        for entry in self.entries.iter().rev() {
            if !sequence.resize_clip(
                entry.uuid,
                entry.old_begin,
                entry.old_end,
                entry.old_position,
            ) {
                return Err(CommandError::Rejected("resizing a clip back"));
            }
        }
        Ok(())
    }
}

/// Removes instances and keeps what was removed, so undo can put back the
/// very same instances.
#[derive(Debug, Clone)]
pub struct RemoveClips {
    targets: Vec<Uuid>,
    removed: Vec<ClipInstance>,
    linked: BTreeSet<Uuid>,
}

impl RemoveClips {
    pub(super) fn new(sequence: &SequenceModel, uuid: Uuid) -> Built<Self> {
        let Some(clip) = sequence.clip(uuid) else {
            return Err((
                Self {
                    targets: Vec::new(),
                    removed: Vec::new(),
                    linked: BTreeSet::new(),
                },
                CommandError::NotFound("clip"),
            ));
        };
        Ok(Self {
            targets: vec![uuid],
            removed: Vec::new(),
            linked: clip.linked().clone(),
        })
    }

    pub fn targets(&self) -> &[Uuid] {
        &self.targets
    }

    pub(super) fn merged_with(&self, next: &Self) -> Option<Self> {
        let candidate = single_target(&self.targets, &next.targets, &self.linked, |uuid| *uuid)?;
        let mut merged = self.clone();
        merged.targets.push(*candidate);
        merged.removed.extend(next.removed.iter().cloned());
        Some(merged)
    }

    pub(super) fn redo(&mut self, sequence: &mut SequenceModel) -> Result<(), CommandError> {
        self.removed.clear();
        for uuid in &self.targets {
            let instance = sequence
                .remove_clip(*uuid)
                .ok_or(CommandError::Rejected("removing a clip"))?;
            self.removed.push(instance);
        }
        Ok(())
    }

    pub(super) fn undo(&mut self, sequence: &mut SequenceModel) -> Result<(), CommandError> {
        while let Some(instance) = self.removed.pop() {
            if !sequence.restore_clip(instance) {
                return Err(CommandError::Rejected("restoring a removed clip"));
            }
        }
        Ok(())
    }
}

/// Cuts an instance in two at a source frame. The original keeps its
/// identity and ends one frame before the new instance begins.
#[derive(Debug, Clone)]
pub struct SplitClip {
    uuid: Uuid,
    track_id: u32,
    is_audio: bool,
    position: i64,
    old_begin: i64,
    old_end: i64,
    new_clip: Option<Arc<SourceClip>>,
    new_clip_position: i64,
    new_clip_begin: i64,
    new_instance: Option<Uuid>,
}

impl SplitClip {
    pub(super) fn new(
        sequence: &SequenceModel,
        uuid: Uuid,
        new_clip_position: i64,
        new_clip_begin: i64,
    ) -> Built<Self> {
        let mut split = Self {
            uuid,
            track_id: 0,
            is_audio: false,
            position: 0,
            old_begin: 0,
            old_end: 0,
            new_clip: None,
            new_clip_position,
            new_clip_begin,
            new_instance: None,
        };
        let Some(instance) = sequence.clip(uuid) else {
            return Err((split, CommandError::NotFound("clip")));
        };
        let clip = instance.clip();
        if new_clip_begin <= clip.begin() || new_clip_begin > clip.end() {
            return Err((
                split,
                CommandError::construction(format!(
                    "split frame {new_clip_begin} is outside {}..={}",
                    clip.begin(),
                    clip.end()
                )),
            ));
        }
        let new_clip = match clip.cut(new_clip_begin, clip.end()) {
            Ok(new_clip) => new_clip,
            Err(err) => return Err((split, CommandError::construction(err.to_string()))),
        };
        split.track_id = instance.track_id();
        split.is_audio = instance.is_audio();
        split.position = instance.position();
        split.old_begin = clip.begin();
        split.old_end = clip.end();
        split.new_clip = Some(Arc::new(new_clip));
        Ok(split)
    }

    pub fn new_instance(&self) -> Option<Uuid> {
        self.new_instance
    }

    pub(super) fn redo(&mut self, sequence: &mut SequenceModel) -> Result<(), CommandError> {
        let new_clip = self
            .new_clip
            .clone()
            .ok_or(CommandError::NotFound("split-off clip"))?;
        let shrunk_end = self.new_clip_begin - 1;
        if !sequence.resize_clip(self.uuid, self.old_begin, shrunk_end, self.position) {
            return Err(CommandError::Rejected("shrinking the split clip"));
        }
        let uuid = sequence
            .add_clip(
                new_clip,
                self.track_id,
                self.new_clip_position,
                self.new_instance,
                self.is_audio,
            )
            .ok_or(CommandError::Rejected("adding the split-off clip"))?;
        self.new_instance = Some(uuid);
        Ok(())
    }

    pub(super) fn undo(&mut self, sequence: &mut SequenceModel) -> Result<(), CommandError> {
        let uuid = self
            .new_instance
            .ok_or(CommandError::NotFound("split-off clip"))?;
        sequence
            .remove_clip(uuid)
            .ok_or(CommandError::Rejected("removing the split-off clip"))?;
        if !sequence.resize_clip(self.uuid, self.old_begin, self.old_end, self.position) {
            return Err(CommandError::Rejected("restoring the split clip"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkClips {
    pub a: Uuid,
    pub b: Uuid,
}

impl LinkClips {
    pub(super) fn redo(&mut self, sequence: &mut SequenceModel) -> Result<(), CommandError> {
        if !sequence.link_clips(self.a, self.b) {
            return Err(CommandError::Rejected("linking clips"));
        }
        Ok(())
    }

    pub(super) fn undo(&mut self, sequence: &mut SequenceModel) -> Result<(), CommandError> {
        if !sequence.unlink_clips(self.a, self.b) {
            return Err(CommandError::Rejected("unlinking clips"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnlinkClips {
    pub a: Uuid,
    pub b: Uuid,
}

impl UnlinkClips {
    pub(super) fn redo(&mut self, sequence: &mut SequenceModel) -> Result<(), CommandError> {
        if !sequence.unlink_clips(self.a, self.b) {
            return Err(CommandError::Rejected("unlinking clips"));
        }
        Ok(())
    }

    pub(super) fn undo(&mut self, sequence: &mut SequenceModel) -> Result<(), CommandError> {
        if !sequence.link_clips(self.a, self.b) {
            return Err(CommandError::Rejected("linking clips"));
        }
        Ok(())
    }
}

/// Merge rule shared by the multi-clip commands: each side must hold
/// exactly one clip, and the candidate's clip must be in the link set
/// recorded when the current command was built.
fn single_target<'a, T>(
    current: &[T],
    next: &'a [T],
    linked: &BTreeSet<Uuid>,
    uuid_of: impl Fn(&T) -> Uuid,
) -> Option<&'a T> {
    match (current, next) {
        ([_], [candidate]) if linked.contains(&uuid_of(candidate)) => Some(candidate),
        _ => None,
    }
}
