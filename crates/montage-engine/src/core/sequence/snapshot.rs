use std::sync::Arc;

use tracing::{debug, warn};
use uuid::Uuid;

use super::{EffectTarget, SequenceModel};
use crate::core::instance::{ClipInstance, TransitionInstance, TransitionPlacement};
use crate::core::track::TrackType;
use crate::project::schema::{
    ClipEntry, FilterEntry, PlacementEntry, SequenceSnapshot, TrackFiltersEntry, TransitionEntry,
    SNAPSHOT_VERSION,
};

/// What a snapshot load managed to bring back.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LoadSummary {
    pub clips: usize,
    pub transitions: usize,
    pub effects: usize,
    /// Entries dropped because they referenced something unavailable.
    pub skipped: usize,
}

impl SequenceModel {
    pub fn to_snapshot(&self) -> SequenceSnapshot {
        let transitions = self
            .transitions
            .values()
            .map(|transition| TransitionEntry {
                uuid: transition.uuid,
                identifier: transition.identifier.clone(),
                begin: transition.begin,
                end: transition.end,
                placement: match transition.placement {
                    TransitionPlacement::InTrack { track_id } => {
                        PlacementEntry::InTrack { track_id }
                    }
                    TransitionPlacement::CrossTrack { track_a, track_b } => {
                        PlacementEntry::CrossTrack {
                            track_a_id: track_a,
                            track_b_id: track_b,
                        }
                    }
                },
                audio: transition.track_type.is_audio(),
            })
            .collect();

        let clips = self
            .clips
            .values()
            .map(|instance| {
                let clip = instance.clip();
                // Cuts that never made it into the catalog are saved against
                // the catalog clip they were cut from.
                let clip_uuid = if self.catalog.lookup_clip(clip.uuid()).is_some() {
                    clip.uuid()
                } else {
                    clip.origin()
                };
                ClipEntry {
                    uuid: instance.uuid,
                    clip_uuid,
                    begin: Some(clip.begin()),
                    end: Some(clip.end()),
                    position: instance.position,
                    track_id: instance.track_id,
                    is_audio: instance.is_audio,
                    duplicated: instance.has_been_duplicated,
                    linked_clips: instance.linked.iter().copied().collect(),
                    filters: self.filter_entries(EffectTarget::Clip(instance.uuid)),
                }
            })
            .collect();

        let track_filters = [TrackType::Audio, TrackType::Video]
            .into_iter()
            .flat_map(|track_type| {
                (0..self.track_count() as u32).map(move |track_id| (track_id, track_type))
            })
            .filter_map(|(track_id, track_type)| {
                let filters = self.filter_entries(EffectTarget::Track {
                    track_id,
                    track_type,
                });
                (!filters.is_empty()).then(|| TrackFiltersEntry {
                    track_id,
                    audio: track_type.is_audio(),
                    filters,
                })
            })
            .collect();

        SequenceSnapshot {
            version: SNAPSHOT_VERSION,
            transitions,
            clips,
            filters: self.filter_entries(EffectTarget::Sequence),
            track_filters,
        }
    }

    fn filter_entries(&self, target: EffectTarget) -> Vec<FilterEntry> {
        self.effects_on(target)
            .into_iter()
            .map(|effect| FilterEntry {
                uuid: Some(effect.uuid),
                identifier: effect.identifier.clone(),
                begin: effect.begin,
                end: effect.end,
            })
            .collect()
    }

    /// Replaces the current content with `snapshot`. Entries that reference
    /// unknown catalog clips, tracks or effects are logged and skipped.
    pub fn load_snapshot(&mut self, snapshot: &SequenceSnapshot) -> LoadSummary {
        self.clear();
        let mut summary = LoadSummary::default();

        for entry in &snapshot.transitions {
            let transition = TransitionInstance {
                uuid: entry.uuid,
                identifier: entry.identifier.clone(),
                begin: entry.begin,
                end: entry.end,
                placement: match entry.placement {
                    PlacementEntry::InTrack { track_id } => {
                        TransitionPlacement::InTrack { track_id }
                    }
                    PlacementEntry::CrossTrack {
                        track_a_id,
                        track_b_id,
                    } => TransitionPlacement::CrossTrack {
                        track_a: track_a_id,
                        track_b: track_b_id,
                    },
                },
                track_type: TrackType::from_is_audio(entry.audio),
                handle: None,
            };
            if self.restore_transition(transition) {
                summary.transitions += 1;
            } else {
                summary.skipped += 1;
            }
        }

        for entry in &snapshot.clips {
            match self.load_clip(entry) {
                Some(()) => summary.clips += 1,
                None => summary.skipped += 1,
            }
        }

        for entry in &snapshot.clips {
            if !self.clips.contains_key(&entry.uuid) {
                continue;
            }
            for partner in &entry.linked_clips {
                let already = self
                    .clips
                    .get(&entry.uuid)
                    .map(|clip| clip.linked.contains(partner))
                    .unwrap_or(true);
                if already {
                    continue;
                }
                if self.clips.contains_key(partner) && *partner != entry.uuid {
                    self.insert_link(entry.uuid, *partner);
                } else {
                    warn!(clip = %entry.uuid, %partner, "skipping link to a missing clip");
                }
            }
            self.load_filters(&entry.filters, EffectTarget::Clip(entry.uuid), &mut summary);
        }

        for entry in &snapshot.track_filters {
            let target = EffectTarget::Track {
                track_id: entry.track_id,
                track_type: TrackType::from_is_audio(entry.audio),
            };
            self.load_filters(&entry.filters, target, &mut summary);
        }
        self.load_filters(&snapshot.filters, EffectTarget::Sequence, &mut summary);

        debug!(?summary, "loaded sequence snapshot");
        summary
    }

    fn load_clip(&mut self, entry: &ClipEntry) -> Option<()> {
        let Some(base) = self.catalog.lookup_clip(entry.clip_uuid) else {
            warn!(
                clip = %entry.uuid,
                source = %entry.clip_uuid,
                "skipping clip with unknown source"
            );
            return None;
        };
        let begin = entry.begin.unwrap_or(base.begin());
        let end = entry.end.unwrap_or(base.end());
        let clip = if entry.duplicated || (begin, end) != (base.begin(), base.end()) {
            match base.cut(begin, end) {
                Ok(clip) => Arc::new(clip),
                Err(err) => {
                    warn!(clip = %entry.uuid, ?err, "skipping clip with an invalid range");
                    return None;
                }
            }
        } else {
            base
        };
        let mut instance = ClipInstance::new(
            entry.uuid,
            clip,
            entry.track_id,
            entry.position,
            entry.is_audio,
        );
        instance.has_been_duplicated = entry.duplicated;
        match self.place_clip(instance) {
            Ok(()) => Some(()),
            Err(err) => {
                warn!(clip = %entry.uuid, ?err, "skipping clip that cannot be placed");
                None
            }
        }
    }

    fn load_filters(
        &mut self,
        filters: &[FilterEntry],
        target: EffectTarget,
        summary: &mut LoadSummary,
    ) {
        for filter in filters {
            let uuid = filter.uuid.unwrap_or_else(Uuid::new_v4);
            let created =
                self.create_effect_with(uuid, &filter.identifier, filter.begin, filter.end);
            let Some(uuid) = created else {
                summary.skipped += 1;
                continue;
            };
            if self.attach_effect(uuid, target) {
                summary.effects += 1;
            } else {
                self.discard_effect(uuid);
                summary.skipped += 1;
            }
        }
    }
}
