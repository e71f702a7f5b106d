use std::time::Duration;

use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use montage_engine::backend::HeadlessBackend;
use montage_engine::clips::{Media, MediaLibrary};
use montage_engine::config::{SequenceConfig, WorkflowConfig};
use montage_engine::workflow::Workflow;
use uuid::Uuid;

const CLIPS_PER_TRACK: i64 = 256;

fn dense_workflow(tracks: usize) -> (Workflow, Vec<Uuid>) {
    let config = WorkflowConfig {
        sequence: SequenceConfig {
            track_count: tracks,
            ..SequenceConfig::default()
        },
        undo_limit: 0,
    };
    let library = MediaLibrary::new();
    let take = library.add_media(Media::new("take.mov", 24, true, true));
    let mut workflow = Workflow::new(config, library, Box::new(HeadlessBackend::new()));
    let mut audio = Vec::new();
    for track in 0..tracks as u32 {
        for slot in 0..CLIPS_PER_TRACK {
            let added = workflow
                .add_clip(take.uuid(), track, slot * 30)
                .expect("add clip");
            audio.extend(added.audio);
        }
    }
    (workflow, audio)
}

fn placement(c: &mut Criterion) {
    let mut group = c.benchmark_group("sequence");
    group.measurement_time(Duration::from_secs(10));
    group.sample_size(20);

    group.bench_function("move_into_gap_8_tracks", |b| {
        b.iter_batched(
            || dense_workflow(8),
            |(mut workflow, audio)| {
                for (slot, uuid) in audio.iter().enumerate().take(64) {
                    let position = (CLIPS_PER_TRACK + slot as i64) * 30;
                    let _ = workflow.move_clip(*uuid, 7, position);
                }
                workflow
            },
            BatchSize::LargeInput,
        );
    });

    group.finish();
}

fn linked_history(c: &mut Criterion) {
    let mut group = c.benchmark_group("history");
    group.sample_size(20);

    group.bench_function("linked_moves_undo_redo", |b| {
        let (mut workflow, audio) = dense_workflow(2);
        let target = audio[0];
        b.iter(|| {
            workflow
                .move_linked_clips(target, 1, CLIPS_PER_TRACK * 30)
                .expect("linked move");
            workflow.undo().expect("undo");
            workflow.redo().expect("redo");
            workflow.undo().expect("undo");
        });
    });

    group.finish();
}

criterion_group!(benches, placement, linked_history);
criterion_main!(benches);
