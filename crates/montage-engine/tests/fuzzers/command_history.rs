use std::sync::Arc;

use montage_engine::backend::HeadlessBackend;
use montage_engine::clips::{Media, MediaLibrary};
use montage_engine::config::SequenceConfig;
use montage_engine::core::{Command, SequenceModel, UndoStack};
use proptest::prelude::*;
use uuid::Uuid;

const TRACKS: u32 = 3;

#[derive(Clone, Debug)]
enum Operation {
    Add {
        media_hint: u8,
        track_hint: u8,
        position: u8,
    },
    Move {
        clip_hint: u8,
        track_hint: u8,
        offset: i8,
    },
    Resize {
        clip_hint: u8,
        trim_begin: u8,
        trim_end: u8,
        offset: i8,
    },
    Split { clip_hint: u8, at: u8 },
    Link { a_hint: u8, b_hint: u8 },
    Unlink { clip_hint: u8 },
    Remove { clip_hint: u8 },
    Undo,
    Redo,
}

fn operation_strategy() -> impl Strategy<Value = Operation> {
    prop_oneof![
        (any::<u8>(), any::<u8>(), any::<u8>()).prop_map(|(media_hint, track_hint, position)| {
            Operation::Add {
                media_hint,
                track_hint,
                position,
            }
        }),
        (any::<u8>(), any::<u8>(), any::<i8>()).prop_map(|(clip_hint, track_hint, offset)| {
            Operation::Move {
                clip_hint,
                track_hint,
                offset,
            }
        }),
        (any::<u8>(), any::<u8>(), any::<u8>(), any::<i8>()).prop_map(
            |(clip_hint, trim_begin, trim_end, offset)| Operation::Resize {
                clip_hint,
                trim_begin,
                trim_end,
                offset,
            }
        ),
        (any::<u8>(), any::<u8>()).prop_map(|(clip_hint, at)| Operation::Split { clip_hint, at }),
        (any::<u8>(), any::<u8>()).prop_map(|(a_hint, b_hint)| Operation::Link { a_hint, b_hint }),
        any::<u8>().prop_map(|clip_hint| Operation::Unlink { clip_hint }),
        any::<u8>().prop_map(|clip_hint| Operation::Remove { clip_hint }),
        Just(Operation::Undo),
        Just(Operation::Redo),
    ]
}

fn pick(sequence: &SequenceModel, hint: u8) -> Option<Uuid> {
    let clips: Vec<Uuid> = sequence.clips().map(|clip| clip.uuid()).collect();
    if clips.is_empty() {
        return None;
    }
    Some(clips[hint as usize % clips.len()])
}

proptest! {
    #[test]
    fn random_histories_preserve_invariants(ops in prop::collection::vec(operation_strategy(), 1..48)) {
        let library = MediaLibrary::new();
        let media = [
            library.add_media(Media::new("take", 40, true, true)).uuid(),
            library.add_media(Media::new("music", 25, true, false)).uuid(),
            library.add_media(Media::new("broll", 60, false, true)).uuid(),
        ];
        let config = SequenceConfig { track_count: TRACKS as usize, ..SequenceConfig::default() };
        let mut sequence = SequenceModel::new(config, Arc::new(library.clone()), Box::new(HeadlessBackend::new()));
        let mut stack = UndoStack::default();
        let initial = sequence.to_snapshot();
        let mut failures = 0usize;

        for op in ops {
            let command = match op {
                Operation::Add { media_hint, track_hint, position } => Some(Command::add_clip(
                    media[media_hint as usize % media.len()],
                    u32::from(track_hint) % TRACKS,
                    i64::from(position),
                )),
                Operation::Move { clip_hint, track_hint, offset } => pick(&sequence, clip_hint).map(|uuid| {
                    let position = sequence.position(uuid).unwrap_or(0);
                    let target = (position + i64::from(offset)).max(0);
                    Command::move_clip(&sequence, uuid, u32::from(track_hint) % TRACKS, target)
                }),
                Operation::Resize { clip_hint, trim_begin, trim_end, offset } => pick(&sequence, clip_hint).map(|uuid| {
                    let clip = sequence.clip(uuid).unwrap();
                    let begin = (clip.begin_frame() - 4 + i64::from(trim_begin % 9)).max(0);
                    let end = clip.end_frame() - 4 + i64::from(trim_end % 9);
                    let position = (clip.position() + i64::from(offset)).max(0);
                    Command::resize_clip(&sequence, uuid, begin, end, position)
                }),
                Operation::Split { clip_hint, at } => pick(&sequence, clip_hint).map(|uuid| {
                    let clip = sequence.clip(uuid).unwrap();
                    let frame = clip.begin_frame() + i64::from(at) % clip.length();
                    let position = clip.position() + (frame - clip.begin_frame());
                    Command::split_clip(&sequence, uuid, position, frame)
                }),
                Operation::Link { a_hint, b_hint } => pick(&sequence, a_hint)
                    .zip(pick(&sequence, b_hint))
                    .map(|(a, b)| Command::link_clips(a, b)),
                Operation::Unlink { clip_hint } => pick(&sequence, clip_hint).and_then(|a| {
                    let b = sequence.clip(a)?.linked().iter().next().copied()?;
                    Some(Command::unlink_clips(a, b))
                }),
                Operation::Remove { clip_hint } => {
                    pick(&sequence, clip_hint).map(|uuid| Command::remove_clip(&sequence, uuid))
                }
                Operation::Undo => {
                    failures += usize::from(stack.undo(&mut sequence).is_err());
                    None
                }
                Operation::Redo => {
                    failures += usize::from(stack.redo(&mut sequence).is_err());
                    None
                }
            };
            if let Some(command) = command {
                failures += usize::from(stack.push(command, &mut sequence).is_err());
            }
            prop_assert!(sequence.check_invariants().is_ok(), "{:?}", sequence.check_invariants());
        }

        if failures == 0 {
            while stack.can_undo() {
                prop_assert!(stack.undo(&mut sequence).is_ok());
                prop_assert!(sequence.check_invariants().is_ok());
            }
            prop_assert_eq!(sequence.to_snapshot(), initial);
        }
    }
}
