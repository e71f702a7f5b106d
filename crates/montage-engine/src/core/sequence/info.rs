use serde::Serialize;
use uuid::Uuid;

use super::{EffectInstance, EffectTarget, SequenceModel};
use crate::core::instance::TransitionPlacement;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EffectInfo {
    pub uuid: Uuid,
    pub identifier: String,
    pub begin: i64,
    pub end: i64,
}

impl From<&EffectInstance> for EffectInfo {
    fn from(effect: &EffectInstance) -> Self {
        Self {
            uuid: effect.uuid,
            identifier: effect.identifier.clone(),
            begin: effect.begin,
            end: effect.end,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClipInfo {
    pub uuid: Uuid,
    pub clip_uuid: Uuid,
    pub name: String,
    pub begin: i64,
    pub end: i64,
    pub length: i64,
    pub duration_secs: f64,
    pub audio: bool,
    pub position: i64,
    pub track_id: u32,
    pub linked_clips: Vec<Uuid>,
    pub filters: Vec<EffectInfo>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransitionInfo {
    pub uuid: Uuid,
    pub identifier: String,
    pub begin: i64,
    pub end: i64,
    pub length: i64,
    pub is_in_track: bool,
    pub track_a_id: u32,
    pub track_b_id: u32,
    pub audio: bool,
}

impl SequenceModel {
    pub fn clip_info(&self, uuid: Uuid) -> Option<ClipInfo> {
        let instance = self.clips.get(&uuid)?;
        let clip = instance.clip();
        let fps = self.config.fps;
        Some(ClipInfo {
            uuid,
            clip_uuid: clip.uuid(),
            name: clip.media().title.clone(),
            begin: clip.begin(),
            end: clip.end(),
            length: clip.length(),
            duration_secs: if fps > 0.0 {
                clip.length() as f64 / fps
            } else {
                0.0
            },
            audio: instance.is_audio(),
            position: instance.position(),
            track_id: instance.track_id(),
            linked_clips: instance.linked().iter().copied().collect(),
            filters: self
                .effects_on(EffectTarget::Clip(uuid))
                .into_iter()
                .map(EffectInfo::from)
                .collect(),
        })
    }

    pub fn transition_info(&self, uuid: Uuid) -> Option<TransitionInfo> {
        let transition = self.transitions.get(&uuid)?;
        let (track_a_id, track_b_id) = transition.placement().tracks();
        Some(TransitionInfo {
            uuid,
            identifier: transition.identifier().to_owned(),
            begin: transition.begin(),
            end: transition.end(),
            length: transition.length(),
            is_in_track: matches!(transition.placement(), TransitionPlacement::InTrack { .. }),
            track_a_id,
            track_b_id,
            audio: transition.track_type().is_audio(),
        })
    }
}
