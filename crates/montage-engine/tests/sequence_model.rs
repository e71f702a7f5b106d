use std::sync::Arc;

use montage_engine::backend::{Channel, HeadlessBackend};
use montage_engine::clips::{Media, MediaLibrary, SourceClip};
use montage_engine::config::SequenceConfig;
use montage_engine::core::{EffectTarget, SequenceEvent, SequenceModel, TrackType};
use pretty_assertions::assert_eq;

struct Fixture {
    sequence: SequenceModel,
    library: MediaLibrary,
    backend: HeadlessBackend,
}

fn fixture(track_count: usize) -> Fixture {
    let library = MediaLibrary::new();
    let backend = HeadlessBackend::new();
    let config = SequenceConfig {
        track_count,
        ..SequenceConfig::default()
    };
    let sequence = SequenceModel::new(config, Arc::new(library.clone()), Box::new(backend.clone()));
    Fixture {
        sequence,
        library,
        backend,
    }
}

fn cut(clip: &Arc<SourceClip>, begin: i64, end: i64) -> Arc<SourceClip> {
    Arc::new(clip.cut(begin, end).unwrap())
}

#[test]
fn every_index_gets_an_audio_and_a_video_track() {
    let fx = fixture(3);
    let root = fx.sequence.root_input();
    assert_eq!(fx.backend.children(root).len(), 3);
    for track_id in 0..3 {
        let lane = fx.sequence.lane_input(track_id).unwrap();
        let audio = fx
            .sequence
            .track(track_id, TrackType::Audio)
            .unwrap()
            .input();
        let video = fx
            .sequence
            .track(track_id, TrackType::Video)
            .unwrap()
            .input();
        assert_eq!(fx.backend.children(lane), vec![audio, video]);
        assert_eq!(
            fx.backend.hidden_channels(lane),
            vec![(0, Channel::Video), (1, Channel::Audio)]
        );
    }
    assert!(fx.sequence.track(3, TrackType::Audio).is_none());
}

#[test]
fn overlapping_placements_are_refused() {
    let mut fx = fixture(2);
    let base = fx.library.add_media(Media::new("a.mov", 100, true, true));

    let first = fx
        .sequence
        .add_clip(Arc::clone(&base), 0, 0, None, true)
        .unwrap();
    assert!(fx
        .sequence
        .add_clip(Arc::clone(&base), 0, 99, None, true)
        .is_none());
    let second = fx
        .sequence
        .add_clip(Arc::clone(&base), 0, 100, None, true)
        .unwrap();
    // Same index, other type: no conflict.
    assert!(fx
        .sequence
        .add_clip(Arc::clone(&base), 0, 50, None, false)
        .is_some());
    assert!(fx
        .sequence
        .add_clip(Arc::clone(&base), 7, 0, None, true)
        .is_none());

    let audio = fx.sequence.track(0, TrackType::Audio).unwrap();
    let order: Vec<_> = audio.clips().iter().map(|p| p.uuid).collect();
    assert_eq!(order, vec![first, second]);
    assert_eq!(fx.sequence.length(), 200);
    assert_eq!(fx.sequence.engine_length(), 200);
    assert!(base.is_on_timeline());
    fx.sequence.check_invariants().unwrap();
}

#[test]
fn explicit_instance_ids_are_kept() {
    let mut fx = fixture(1);
    let base = fx.library.add_media(Media::new("a.mov", 10, true, false));
    let wanted = uuid::Uuid::new_v4();
    let clip = Arc::clone(&base);
    assert_eq!(
        fx.sequence.add_clip(clip, 0, 0, Some(wanted), true),
        Some(wanted)
    );
    assert!(fx
        .sequence
        .add_clip(base, 0, 20, Some(wanted), true)
        .is_none());
}

#[test]
fn add_and_remove_report_through_events_and_the_timeline_flag() {
    let mut fx = fixture(1);
    let events = fx.sequence.subscribe();
    let base = fx.library.add_media(Media::new("a.mov", 10, true, false));

    let uuid = fx
        .sequence
        .add_clip(Arc::clone(&base), 0, 0, None, true)
        .unwrap();
    assert_eq!(
        events.try_iter().collect::<Vec<_>>(),
        vec![
            SequenceEvent::OnTimelineChanged {
                clip: base.uuid(),
                on_timeline: true
            },
            SequenceEvent::ClipAdded(uuid),
        ]
    );

    let removed = fx.sequence.remove_clip(uuid).unwrap();
    assert_eq!(removed.uuid(), uuid);
    assert!(!base.is_on_timeline());
    assert_eq!(
        events.try_iter().collect::<Vec<_>>(),
        vec![
            SequenceEvent::OnTimelineChanged {
                clip: base.uuid(),
                on_timeline: false
            },
            SequenceEvent::ClipRemoved(uuid),
        ]
    );
    assert!(fx.sequence.remove_clip(uuid).is_none());
}

#[test]
fn moving_across_tracks_keeps_the_instance() {
    let mut fx = fixture(2);
    let base = fx.library.add_media(Media::new("a.mov", 100, false, true));
    let blocker = fx
        .sequence
        .add_clip(cut(&base, 0, 9), 1, 0, None, false)
        .unwrap();
    let uuid = fx
        .sequence
        .add_clip(cut(&base, 0, 19), 0, 0, None, false)
        .unwrap();

    assert!(!fx.sequence.move_clip(uuid, 1, 5));
    assert_eq!(fx.sequence.track_id(uuid), Some(0));
    assert_eq!(fx.sequence.position(uuid), Some(0));

    assert!(fx.sequence.move_clip(uuid, 1, 10));
    assert_eq!(fx.sequence.track_id(uuid), Some(1));
    assert_eq!(fx.sequence.position(uuid), Some(10));
    assert!(fx.sequence.track(0, TrackType::Video).unwrap().is_empty());
    let video = fx.sequence.track(1, TrackType::Video).unwrap();
    let order: Vec<_> = video.clips().iter().map(|p| p.uuid).collect();
    assert_eq!(order, vec![blocker, uuid]);

    // Unchanged target is a successful no-op.
    assert!(fx.sequence.move_clip(uuid, 1, 10));
    assert!(!fx.sequence.move_clip(uuid, 9, 10));
    fx.sequence.check_invariants().unwrap();
}

#[test]
fn first_resize_clones_the_source_clip_once() {
    let mut fx = fixture(1);
    let base = fx.library.add_media(Media::new("a.mov", 100, true, false));
    let shared = fx
        .sequence
        .add_clip(Arc::clone(&base), 0, 0, None, true)
        .unwrap();

    assert!(fx.sequence.resize_clip(shared, 10, 49, 0));
    let first = fx.sequence.clip(shared).unwrap();
    assert!(first.has_been_duplicated());
    let cloned = first.clip().uuid();
    assert_ne!(cloned, base.uuid());
    assert_eq!(first.clip().origin(), base.uuid());
    assert_eq!(first.length(), 40);
    assert_eq!((base.begin(), base.end()), (0, 99));
    assert!(!base.is_on_timeline());

    assert!(fx.sequence.resize_clip(shared, 10, 59, 5));
    let second = fx.sequence.clip(shared).unwrap();
    assert_eq!(second.clip().uuid(), cloned);
    assert_eq!((second.begin_frame(), second.end_frame()), (10, 59));
    assert_eq!(second.position(), 5);
    fx.sequence.check_invariants().unwrap();
}

#[test]
fn resize_into_a_neighbour_changes_nothing() {
    let mut fx = fixture(1);
    let base = fx.library.add_media(Media::new("a.mov", 500, true, false));
    let left = fx
        .sequence
        .add_clip(cut(&base, 0, 99), 0, 0, None, true)
        .unwrap();
    fx.sequence
        .add_clip(cut(&base, 100, 199), 0, 100, None, true)
        .unwrap();
    let before = fx
        .sequence
        .track(0, TrackType::Audio)
        .unwrap()
        .clips()
        .to_vec();

    assert!(!fx.sequence.resize_clip(left, 0, 149, 0));
    assert!(!fx.sequence.resize_clip(left, 0, 9_999, 0));

    assert_eq!(
        fx.sequence.track(0, TrackType::Audio).unwrap().clips(),
        &before[..]
    );
    assert!(!fx.sequence.clip(left).unwrap().has_been_duplicated());
}

#[test]
fn links_are_symmetric_and_survive_restore() {
    let mut fx = fixture(1);
    let base = fx.library.add_media(Media::new("a.mov", 10, true, true));
    let audio = fx
        .sequence
        .add_clip(Arc::clone(&base), 0, 0, None, true)
        .unwrap();
    let video = fx
        .sequence
        .add_clip(Arc::clone(&base), 0, 0, None, false)
        .unwrap();

    assert!(!fx.sequence.link_clips(audio, audio));
    assert!(fx.sequence.link_clips(audio, video));
    assert!(!fx.sequence.link_clips(video, audio));
    assert!(fx.sequence.clip(video).unwrap().is_linked_to(audio));

    let removed = fx.sequence.remove_clip(video).unwrap();
    assert!(fx.sequence.clip(audio).unwrap().linked().is_empty());
    assert!(fx.sequence.restore_clip(removed));
    assert!(fx.sequence.clip(audio).unwrap().is_linked_to(video));
    assert!(fx.sequence.clip(video).unwrap().is_linked_to(audio));

    assert!(fx.sequence.unlink_clips(audio, video));
    assert!(!fx.sequence.unlink_clips(audio, video));
    fx.sequence.check_invariants().unwrap();
}

#[test]
fn in_track_transitions_cannot_change_tracks() {
    let mut fx = fixture(4);
    let uuid = fx
        .sequence
        .add_transition("dissolve", 10, 20, 3, TrackType::Video)
        .unwrap();
    assert!(!fx.sequence.move_transition_between_tracks(uuid, 1, 2));
    let transition = fx.sequence.transition(uuid).unwrap();
    assert!(transition.placement().is_in_track());
    assert_eq!(transition.placement().tracks(), (3, 3));

    // Overlaps only count among transitions of the same track.
    assert!(fx
        .sequence
        .add_transition("mix", 15, 30, 3, TrackType::Video)
        .is_none());
    assert!(fx
        .sequence
        .add_transition("mix", 15, 30, 3, TrackType::Audio)
        .is_some());

    assert!(fx.sequence.move_transition(uuid, 40, 49));
    assert_eq!(fx.sequence.transition(uuid).unwrap().length(), 10);
}

#[test]
fn cross_track_transitions_live_on_the_root() {
    let mut fx = fixture(4);
    let uuid = fx
        .sequence
        .add_transition_between_tracks("luma", 0, 24, 0, 1, TrackType::Video)
        .unwrap();
    assert!(fx.sequence.move_transition_between_tracks(uuid, 2, 3));
    let transitions = fx.backend.transitions();
    assert_eq!(transitions.len(), 1);
    assert_eq!(transitions[0].0, fx.sequence.root_input());
    assert_eq!(transitions[0].1.tracks, Some((2, 3)));

    assert!(!fx.sequence.move_transition_between_tracks(uuid, 2, 9));
    assert!(fx
        .sequence
        .add_transition_between_tracks("no.such.transition", 0, 5, 0, 1, TrackType::Video)
        .is_none());

    let removed = fx.sequence.remove_transition(uuid).unwrap();
    assert!(fx.backend.transitions().is_empty());
    assert!(fx.sequence.restore_transition(removed));
    let transition = fx.sequence.transition(uuid).unwrap();
    assert_eq!(transition.placement().tracks(), (2, 3));
}

#[test]
fn clip_effects_follow_the_instance_input() {
    let mut fx = fixture(1);
    let base = fx.library.add_media(Media::new("a.mov", 100, false, true));
    let uuid = fx.sequence.add_clip(base, 0, 0, None, false).unwrap();
    let effect = fx.sequence.create_effect("greyscale").unwrap();
    assert!(fx.sequence.attach_effect(effect, EffectTarget::Clip(uuid)));
    assert!(!fx.sequence.attach_effect(effect, EffectTarget::Sequence));

    assert!(fx.sequence.resize_clip(uuid, 0, 49, 0));
    let video = fx.sequence.track(0, TrackType::Video).unwrap().input();
    let input = fx.backend.children(video)[0];
    assert_eq!(
        fx.backend.attached_filters(input),
        vec!["greyscale".to_owned()]
    );

    assert_eq!(
        fx.sequence.detach_effect(effect),
        Some(EffectTarget::Clip(uuid))
    );
    assert!(fx.backend.attached_filters(input).is_empty());
    assert!(fx.sequence.discard_effect(effect));
    assert!(fx.sequence.create_effect("no.such.filter").is_none());
}

#[test]
fn clear_empties_everything() {
    let mut fx = fixture(2);
    let base = fx.library.add_media(Media::new("a.mov", 100, true, true));
    fx.sequence
        .add_clip(Arc::clone(&base), 0, 0, None, true)
        .unwrap();
    fx.sequence
        .add_transition_between_tracks("mix", 0, 9, 0, 1, TrackType::Audio)
        .unwrap();
    let effect = fx.sequence.create_effect("volume").unwrap();
    fx.sequence.attach_effect(effect, EffectTarget::Sequence);
    let events = fx.sequence.subscribe();

    fx.sequence.clear();

    assert_eq!(fx.sequence.clip_count(), 0);
    assert_eq!(fx.sequence.transitions().count(), 0);
    assert!(fx.sequence.effect(effect).is_none());
    assert_eq!(fx.sequence.length(), 0);
    assert!(!base.is_on_timeline());
    assert_eq!(events.try_iter().last(), Some(SequenceEvent::Cleared));
}

#[test]
fn moves_past_the_last_frame_are_refused() {
    let mut fx = fixture(2);
    let base = fx.library.add_media(Media::new("a.mov", 100, true, false));
    let uuid = fx.sequence.add_clip(base, 0, 0, None, true).unwrap();
    let before = fx
        .sequence
        .track(0, TrackType::Audio)
        .unwrap()
        .clips()
        .to_vec();

    assert!(!fx.sequence.move_clip(uuid, 0, i64::MAX - 10));
    assert!(!fx.sequence.move_clip(uuid, 1, i64::MAX - 10));
    assert!(!fx.sequence.move_clip(uuid, 0, i64::MAX));

    assert_eq!(fx.sequence.position(uuid), Some(0));
    assert_eq!(
        fx.sequence.track(0, TrackType::Audio).unwrap().clips(),
        &before[..]
    );
    assert!(fx
        .sequence
        .track(1, TrackType::Audio)
        .unwrap()
        .clips()
        .is_empty());
    fx.sequence.check_invariants().unwrap();
}

#[test]
fn resizes_past_the_last_frame_are_refused() {
    let mut fx = fixture(1);
    // A zero length media has no upper bound on its range.
    let base = fx.library.add_media(Media::new("live", 0, true, false));
    let uuid = fx.sequence.add_clip(base, 0, 0, None, true).unwrap();

    assert!(!fx.sequence.resize_clip(uuid, 0, i64::MAX, 0));
    assert!(!fx.sequence.resize_clip(uuid, i64::MIN, 10, 0));
    assert!(!fx.sequence.resize_clip(uuid, 0, i64::MAX - 1, 1));
    assert!(!fx.sequence.resize_clip(uuid, 0, 9, i64::MAX - 5));

    let instance = fx.sequence.clip(uuid).unwrap();
    assert_eq!((instance.position(), instance.length()), (0, 1));
    assert_eq!(fx.sequence.length(), 1);
    fx.sequence.check_invariants().unwrap();
}

#[test]
fn transitions_spanning_every_frame_are_refused() {
    let mut fx = fixture(4);
    assert!(fx
        .sequence
        .add_transition("dissolve", 0, i64::MAX, 3, TrackType::Video)
        .is_none());
    assert!(fx
        .sequence
        .add_transition_between_tracks("dissolve", -1, i64::MAX, 0, 1, TrackType::Video)
        .is_none());

    let uuid = fx
        .sequence
        .add_transition("dissolve", 10, 20, 3, TrackType::Video)
        .unwrap();
    assert!(!fx.sequence.move_transition(uuid, 0, i64::MAX));
    assert!(!fx.sequence.move_transition(uuid, i64::MAX - 5, i64::MAX));
    assert_eq!(fx.sequence.transition(uuid).unwrap().length(), 11);
    assert_eq!(fx.sequence.transitions().count(), 1);
}
