use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::TrackError;
use crate::backend::InputHandle;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackType {
    Audio,
    Video,
}

impl TrackType {
    pub fn from_is_audio(is_audio: bool) -> Self {
        if is_audio {
            Self::Audio
        } else {
            Self::Video
        }
    }

    pub fn is_audio(self) -> bool {
        matches!(self, Self::Audio)
    }
}

/// The half-open interval `[position, position + length)` an item occupies.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Placement {
    pub uuid: Uuid,
    pub position: i64,
    pub length: i64,
}

impl Placement {
    pub fn end(&self) -> i64 {
        self.position + self.length
    }

    pub fn contains(&self, frame: i64) -> bool {
        frame >= self.position && frame < self.end()
    }
}

#[derive(Debug, Default, Clone)]
struct Lane {
    items: Vec<Placement>,
}

impl Lane {
    fn index_of(&self, uuid: Uuid) -> Option<usize> {
        self.items.iter().position(|item| item.uuid == uuid)
    }

    /// Items never overlap, so both starts and ends are sorted and the first
    /// candidate can be found by bisection.
    fn ensure_free(
        &self,
        position: i64,
        length: i64,
        ignore: Option<Uuid>,
    ) -> Result<(), TrackError> {
        if length <= 0 {
            return Err(TrackError::InvalidLength(length));
        }
        if position < 0 {
            return Err(TrackError::InvalidPosition(position));
        }
        let end = position
            .checked_add(length)
            .ok_or(TrackError::InvalidPosition(position))?;
        let first = self.items.partition_point(|item| item.end() <= position);
        let conflict = self.items[first..]
            .iter()
            .take_while(|item| item.position < end)
            .any(|item| Some(item.uuid) != ignore);
        if conflict {
            return Err(TrackError::Overlap { position, length });
        }
        Ok(())
    }

    fn insert(&mut self, placement: Placement) -> Result<usize, TrackError> {
        if self.index_of(placement.uuid).is_some() {
            return Err(TrackError::Duplicate(placement.uuid));
        }
        self.ensure_free(placement.position, placement.length, None)?;
        let index = self
            .items
            .partition_point(|item| item.position < placement.position);
        self.items.insert(index, placement);
        Ok(index)
    }

    fn remove(&mut self, uuid: Uuid) -> Result<(usize, Placement), TrackError> {
        let index = self.index_of(uuid).ok_or(TrackError::NotFound(uuid))?;
        Ok((index, self.items.remove(index)))
    }

    fn replace(
        &mut self,
        uuid: Uuid,
        position: i64,
        length: i64,
    ) -> Result<Relocation, TrackError> {
        let from = self.index_of(uuid).ok_or(TrackError::NotFound(uuid))?;
        self.ensure_free(position, length, Some(uuid))?;
        self.items.remove(from);
        let to = self.items.partition_point(|item| item.position < position);
        self.items.insert(
            to,
            Placement {
                uuid,
                position,
                length,
            },
        );
        Ok(Relocation { from, to })
    }

    fn at(&self, frame: i64) -> Option<usize> {
        let index = self.items.partition_point(|item| item.end() <= frame);
        self.items
            .get(index)
            .filter(|item| item.contains(frame))
            .map(|_| index)
    }
}

/// Index of an item before and after it was re-placed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Relocation {
    pub from: usize,
    pub to: usize,
}

/// Ordered placements for one `(type, index)` pair.
///
/// Clips and in-track transitions live in two separate lanes; each lane is
/// kept sorted and collision free on its own. A track knows nothing about
/// linkage, cross-track moves or the engine beyond the handle of its input.
#[derive(Debug, Clone)]
pub struct Track {
    id: u32,
    kind: TrackType,
    input: InputHandle,
    clips: Lane,
    transitions: Lane,
}

impl Track {
    pub fn new(id: u32, kind: TrackType, input: InputHandle) -> Self {
        Self {
            id,
            kind,
            input,
            clips: Lane::default(),
            transitions: Lane::default(),
        }
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn kind(&self) -> TrackType {
        self.kind
    }

    pub fn input(&self) -> InputHandle {
        self.input
    }

    pub fn clips(&self) -> &[Placement] {
        &self.clips.items
    }

    pub fn transitions(&self) -> &[Placement] {
        &self.transitions.items
    }

    pub fn is_empty(&self) -> bool {
        self.clips.items.is_empty() && self.transitions.items.is_empty()
    }

    /// First frame after the last clip.
    pub fn end(&self) -> i64 {
        self.clips.items.last().map(Placement::end).unwrap_or(0)
    }

    pub fn contains_clip(&self, uuid: Uuid) -> bool {
        self.clips.index_of(uuid).is_some()
    }

    pub fn clip(&self, uuid: Uuid) -> Option<&Placement> {
        self.clips
            .index_of(uuid)
            .map(|index| &self.clips.items[index])
    }

    pub fn clip_index(&self, uuid: Uuid) -> Option<usize> {
        self.clips.index_of(uuid)
    }

    pub fn can_place_clip(
        &self,
        position: i64,
        length: i64,
        ignore: Option<Uuid>,
    ) -> Result<(), TrackError> {
        self.clips.ensure_free(position, length, ignore)
    }

    pub fn insert_clip(
        &mut self,
        uuid: Uuid,
        position: i64,
        length: i64,
    ) -> Result<usize, TrackError> {
        self.clips.insert(Placement {
            uuid,
            position,
            length,
        })
    }

    pub fn remove_clip(&mut self, uuid: Uuid) -> Result<(usize, Placement), TrackError> {
        self.clips.remove(uuid)
    }

    pub fn move_clip(&mut self, uuid: Uuid, position: i64) -> Result<Relocation, TrackError> {
        let length = self.clip(uuid).ok_or(TrackError::NotFound(uuid))?.length;
        self.clips.replace(uuid, position, length)
    }

    pub fn resize_clip(
        &mut self,
        uuid: Uuid,
        position: i64,
        length: i64,
    ) -> Result<Relocation, TrackError> {
        self.clips.replace(uuid, position, length)
    }

    pub fn clip_at(&self, frame: i64) -> Option<&Placement> {
        self.clips.at(frame).map(|index| &self.clips.items[index])
    }

    pub fn clip_index_at(&self, frame: i64) -> Option<usize> {
        self.clips.at(frame)
    }

    pub fn transition(&self, uuid: Uuid) -> Option<&Placement> {
        self.transitions
            .index_of(uuid)
            .map(|index| &self.transitions.items[index])
    }

    pub fn insert_transition(
        &mut self,
        uuid: Uuid,
        position: i64,
        length: i64,
    ) -> Result<usize, TrackError> {
        self.transitions.insert(Placement {
            uuid,
            position,
            length,
        })
    }

    pub fn move_transition(
        &mut self,
        uuid: Uuid,
        position: i64,
        length: i64,
    ) -> Result<Relocation, TrackError> {
        self.transitions.replace(uuid, position, length)
    }

    pub fn remove_transition(&mut self, uuid: Uuid) -> Result<(usize, Placement), TrackError> {
        self.transitions.remove(uuid)
    }

    pub(crate) fn clear(&mut self) {
        self.clips.items.clear();
        self.transitions.items.clear();
    }

    /// True when every lane is sorted and free of overlaps.
    pub fn is_consistent(&self) -> bool {
        [&self.clips, &self.transitions].iter().all(|lane| {
            lane.items
                .windows(2)
                .all(|pair| pair[0].end() <= pair[1].position)
                && lane.items.iter().all(|item| item.length > 0)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn track() -> Track {
        Track::new(0, TrackType::Video, InputHandle(1))
    }

    fn positions(track: &Track) -> Vec<(i64, i64)> {
        track
            .clips()
            .iter()
            .map(|p| (p.position, p.length))
            .collect()
    }

    #[test]
    fn inserts_keep_order_and_reject_overlap() {
        let mut track = track();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let c = Uuid::new_v4();
        assert_eq!(track.insert_clip(a, 100, 50).unwrap(), 0);
        assert_eq!(track.insert_clip(b, 0, 100).unwrap(), 0);
        assert_eq!(
            track.insert_clip(c, 120, 10),
            Err(TrackError::Overlap {
                position: 120,
                length: 10
            })
        );
        assert_eq!(
            track.insert_clip(c, 149, 10),
            Err(TrackError::Overlap {
                position: 149,
                length: 10
            })
        );
        assert_eq!(track.insert_clip(c, 150, 10).unwrap(), 2);
        assert_eq!(positions(&track), vec![(0, 100), (100, 50), (150, 10)]);
        assert!(track.is_consistent());
        assert_eq!(track.end(), 160);
    }

    #[test]
    fn rejects_degenerate_placements() {
        let mut track = track();
        let a = Uuid::new_v4();
        assert_eq!(
            track.insert_clip(a, 0, 0),
            Err(TrackError::InvalidLength(0))
        );
        assert_eq!(
            track.insert_clip(a, -5, 3),
            Err(TrackError::InvalidPosition(-5))
        );
        track.insert_clip(a, 0, 3).unwrap();
        assert_eq!(track.insert_clip(a, 10, 3), Err(TrackError::Duplicate(a)));
    }

    #[test]
    fn move_ignores_itself_but_not_neighbours() {
        let mut track = track();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        track.insert_clip(a, 0, 10).unwrap();
        track.insert_clip(b, 20, 10).unwrap();

        assert_eq!(
            track.move_clip(a, 5).unwrap(),
            Relocation { from: 0, to: 0 }
        );
        assert_eq!(
            track.move_clip(a, 15),
            Err(TrackError::Overlap {
                position: 15,
                length: 10
            })
        );
        assert_eq!(
            track.move_clip(a, 40).unwrap(),
            Relocation { from: 0, to: 1 }
        );
        assert_eq!(positions(&track), vec![(20, 10), (40, 10)]);
    }

    #[test]
    fn failed_resize_leaves_track_untouched() {
        let mut track = track();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        track.insert_clip(a, 0, 10).unwrap();
        track.insert_clip(b, 10, 10).unwrap();
        let before = positions(&track);

        assert!(track.resize_clip(a, 0, 11).is_err());
        assert_eq!(positions(&track), before);
        assert!(track.resize_clip(a, 2, 8).is_ok());
        assert_eq!(positions(&track), vec![(2, 8), (10, 10)]);
    }

    #[test]
    fn lookup_by_frame() {
        let mut track = track();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        track.insert_clip(a, 0, 10).unwrap();
        track.insert_clip(b, 30, 10).unwrap();

        assert_eq!(track.clip_at(9).map(|p| p.uuid), Some(a));
        assert_eq!(track.clip_at(10), None);
        assert_eq!(track.clip_at(35).map(|p| p.uuid), Some(b));
        assert_eq!(track.clip_index_at(39), Some(1));
        assert_eq!(track.clip_at(40), None);
    }

    #[test]
    fn transitions_use_their_own_lane() {
        let mut track = track();
        let clip = Uuid::new_v4();
        let t1 = Uuid::new_v4();
        let t2 = Uuid::new_v4();
        track.insert_clip(clip, 0, 100).unwrap();
        track.insert_transition(t1, 40, 20).unwrap();
        assert!(track.insert_transition(t2, 50, 20).is_err());
        track.insert_transition(t2, 60, 20).unwrap();
        assert!(track.move_transition(t1, 45, 20).is_err());
        assert_eq!(track.remove_transition(t1).unwrap().0, 0);
        assert!(track.transition(t1).is_none());
        assert!(track.is_consistent());
    }

    #[test]
    fn remove_unknown_reports_not_found() {
        let mut track = track();
        let ghost = Uuid::new_v4();
        assert_eq!(track.remove_clip(ghost), Err(TrackError::NotFound(ghost)));
    }
}
