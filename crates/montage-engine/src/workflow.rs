//! Entry points for the GUI and scripting layers.
//!
//! Every structural operation builds the matching [`Command`] and pushes it
//! onto the history, so whatever the caller does can be undone.

use std::sync::Arc;

use crossbeam_channel::{unbounded, Receiver, Sender};
use tracing::{debug, info};
use uuid::Uuid;

use crate::backend::{EngineBackend, HeadlessBackend};
use crate::clips::{LibraryClipInfo, MediaLibrary};
use crate::config::WorkflowConfig;
use crate::core::commands::{Command, CommandKind, UndoStack};
use crate::core::error::CommandError;
use crate::core::events::{EngineEvent, HistoryEvent, SequenceEvent};
use crate::core::sequence::{ClipInfo, EffectTarget, LoadSummary, SequenceModel, TransitionInfo};
use crate::core::track::TrackType;
use crate::project::{parse_snapshot, SnapshotError};

/// What the engine last reported about playback and rendering.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct PlaybackState {
    pub length: i64,
    pub position: i64,
    pub end_reached: bool,
    pub rendering: bool,
    /// `(frame, total)` of the running or last render.
    pub render_progress: Option<(i64, i64)>,
}

impl PlaybackState {
    fn apply(&mut self, event: EngineEvent) {
        match event {
            EngineEvent::LengthChanged(length) => self.length = length,
            EngineEvent::PositionChanged(position) => {
                self.position = position;
                self.end_reached = false;
            }
            EngineEvent::EndReached => self.end_reached = true,
            EngineEvent::RenderStarted => {
                self.rendering = true;
                self.render_progress = None;
            }
            EngineEvent::RenderProgress { frame, total } => {
                self.render_progress = Some((frame, total));
            }
            EngineEvent::RenderStopped => self.rendering = false,
        }
    }
}

/// Instances created by [`Workflow::add_clip`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct AddedClip {
    pub audio: Option<Uuid>,
    pub video: Option<Uuid>,
}

pub struct Workflow {
    library: MediaLibrary,
    sequence: SequenceModel,
    history: UndoStack,
    engine_tx: Sender<EngineEvent>,
    engine_rx: Receiver<EngineEvent>,
    playback: PlaybackState,
}

impl Workflow {
    pub fn new(
        config: WorkflowConfig,
        library: MediaLibrary,
        backend: Box<dyn EngineBackend>,
    ) -> Self {
        let catalog = Arc::new(library.clone());
        let sequence = SequenceModel::new(config.sequence.clone(), catalog, backend);
        let (engine_tx, engine_rx) = unbounded();
        info!(
            tracks = config.sequence.track_count,
            undo_limit = config.undo_limit,
            "workflow ready"
        );
        Self {
            library,
            sequence,
            history: UndoStack::new(config.undo_limit),
            engine_tx,
            engine_rx,
            playback: PlaybackState::default(),
        }
    }

    /// A workflow over an empty library and the in-process engine.
    pub fn headless(config: WorkflowConfig) -> Self {
        Self::new(
            config,
            MediaLibrary::new(),
            Box::new(HeadlessBackend::new()),
        )
    }

    pub fn library(&self) -> &MediaLibrary {
        &self.library
    }

    pub fn sequence(&self) -> &SequenceModel {
        &self.sequence
    }

    pub fn history(&self) -> &UndoStack {
        &self.history
    }

    pub fn subscribe_sequence(&mut self) -> Receiver<SequenceEvent> {
        self.sequence.subscribe()
    }

    pub fn subscribe_history(&mut self) -> Receiver<HistoryEvent> {
        self.history.subscribe()
    }

    /// Handle for the engine thread to report playback and render state.
    pub fn engine_events(&self) -> Sender<EngineEvent> {
        self.engine_tx.clone()
    }

    /// Drains pending engine notifications without blocking and returns how
    /// many were applied.
    pub fn process_engine_events(&mut self) -> usize {
        let mut processed = 0;
        while let Ok(event) = self.engine_rx.try_recv() {
            self.playback.apply(event);
            processed += 1;
        }
        if processed > 0 {
            debug!(processed, state = ?self.playback, "applied engine events");
        }
        processed
    }

    pub fn playback(&self) -> &PlaybackState {
        &self.playback
    }

    fn push(&mut self, command: Command) -> Result<(), CommandError> {
        self.history.push(command, &mut self.sequence)
    }

    fn top_kind(&self) -> Option<&CommandKind> {
        let top = self.history.index().checked_sub(1)?;
        self.history.command(top).map(Command::kind)
    }

    pub fn add_clip(
        &mut self,
        library_uuid: Uuid,
        track_id: u32,
        position: i64,
    ) -> Result<AddedClip, CommandError> {
        self.push(Command::add_clip(library_uuid, track_id, position))?;
        match self.top_kind() {
            Some(CommandKind::AddClip(command)) => Ok(AddedClip {
                audio: command.audio_instance(),
                video: command.video_instance(),
            }),
            _ => Err(CommandError::NotFound("added clip")),
        }
    }

    pub fn move_clip(
        &mut self,
        uuid: Uuid,
        track_id: u32,
        position: i64,
    ) -> Result<(), CommandError> {
        let command = Command::move_clip(&self.sequence, uuid, track_id, position);
        self.push(command)
    }

    /// Moves `uuid` and shifts every clip linked to it by the same track and
    /// frame offsets. The moves fold into a single history entry.
    pub fn move_linked_clips(
        &mut self,
        uuid: Uuid,
        track_id: u32,
        position: i64,
    ) -> Result<(), CommandError> {
        let partners: Vec<(Uuid, u32, i64)> = match self.sequence.clip(uuid) {
            Some(instance) => instance
                .linked()
                .iter()
                .filter_map(|partner| {
                    let other = self.sequence.clip(*partner)?;
                    Some((*partner, other.track_id(), other.position()))
                })
                .collect(),
            None => Vec::new(),
        };
        let (track_delta, position_delta) = match self.sequence.clip(uuid) {
            Some(instance) => (
                i64::from(track_id) - i64::from(instance.track_id()),
                position.saturating_sub(instance.position()),
            ),
            None => (0, 0),
        };

        self.move_clip(uuid, track_id, position)?;
        for (partner, partner_track, partner_position) in partners {
            let below = CommandError::Rejected("moving a linked clip below track 0");
            let out_of_range = CommandError::Rejected("moving a linked clip out of frame range");
            let track = u32::try_from(i64::from(partner_track) + track_delta)
                .map_err(|_| below)?;
            let position = partner_position
                .checked_add(position_delta)
                .ok_or(out_of_range)?;
            self.move_clip(partner, track, position)?;
        }
        Ok(())
    }

    pub fn resize_clip(
        &mut self,
        uuid: Uuid,
        begin: i64,
        end: i64,
        position: i64,
    ) -> Result<(), CommandError> {
        let command = Command::resize_clip(&self.sequence, uuid, begin, end, position);
        self.push(command)
    }

    pub fn remove_clip(&mut self, uuid: Uuid) -> Result<(), CommandError> {
        let command = Command::remove_clip(&self.sequence, uuid);
        self.push(command)
    }

    /// Removes `uuid` and every clip linked to it as one history entry.
    pub fn remove_linked_clips(&mut self, uuid: Uuid) -> Result<(), CommandError> {
        let partners: Vec<Uuid> = self
            .sequence
            .clip(uuid)
            .map(|instance| instance.linked().iter().copied().collect())
            .unwrap_or_default();
        self.remove_clip(uuid)?;
        for partner in partners {
            self.remove_clip(partner)?;
        }
        Ok(())
    }

    /// Returns the instance created for the second half.
    pub fn split_clip(
        &mut self,
        uuid: Uuid,
        new_clip_position: i64,
        new_clip_begin: i64,
    ) -> Result<Uuid, CommandError> {
        let command = Command::split_clip(&self.sequence, uuid, new_clip_position, new_clip_begin);
        self.push(command)?;
        match self.top_kind() {
            Some(CommandKind::SplitClip(command)) => command
                .new_instance()
                .ok_or(CommandError::NotFound("split-off clip")),
            _ => Err(CommandError::NotFound("split-off clip")),
        }
    }

    pub fn link_clips(&mut self, a: Uuid, b: Uuid) -> Result<(), CommandError> {
        self.push(Command::link_clips(a, b))
    }

    pub fn unlink_clips(&mut self, a: Uuid, b: Uuid) -> Result<(), CommandError> {
        self.push(Command::unlink_clips(a, b))
    }

    pub fn add_transition(
        &mut self,
        identifier: &str,
        begin: i64,
        end: i64,
        track_id: u32,
        track_type: TrackType,
    ) -> Result<Uuid, CommandError> {
        self.push(Command::add_transition(
            identifier, begin, end, track_id, track_type,
        ))?;
        self.added_transition()
    }

    pub fn add_transition_between_tracks(
        &mut self,
        identifier: &str,
        begin: i64,
        end: i64,
        track_a: u32,
        track_b: u32,
        track_type: TrackType,
    ) -> Result<Uuid, CommandError> {
        self.push(Command::add_transition_between_tracks(
            identifier, begin, end, track_a, track_b, track_type,
        ))?;
        self.added_transition()
    }

    fn added_transition(&self) -> Result<Uuid, CommandError> {
        match self.top_kind() {
            Some(CommandKind::AddTransition(command)) => {
                command
                    .transition()
                    .ok_or(CommandError::NotFound("transition"))
            }
            _ => Err(CommandError::NotFound("transition")),
        }
    }

    pub fn move_transition(
        &mut self,
        uuid: Uuid,
        begin: i64,
        end: i64,
    ) -> Result<(), CommandError> {
        let command = Command::move_transition(&self.sequence, uuid, begin, end);
        self.push(command)
    }

    pub fn move_transition_between_tracks(
        &mut self,
        uuid: Uuid,
        track_a: u32,
        track_b: u32,
    ) -> Result<(), CommandError> {
        let command =
            Command::move_transition_between_tracks(&self.sequence, uuid, track_a, track_b);
        self.push(command)
    }

    pub fn remove_transition(&mut self, uuid: Uuid) -> Result<(), CommandError> {
        self.push(Command::remove_transition(uuid))
    }

    pub fn add_effect(
        &mut self,
        identifier: &str,
        target: EffectTarget,
    ) -> Result<Uuid, CommandError> {
        let command = Command::add_effect(&mut self.sequence, identifier, target);
        self.push(command)?;
        match self.top_kind() {
            Some(CommandKind::AddEffect(command)) => Ok(command.effect()),
            _ => Err(CommandError::NotFound("effect")),
        }
    }

    pub fn move_effect(
        &mut self,
        uuid: Uuid,
        target: EffectTarget,
        position: i64,
    ) -> Result<(), CommandError> {
        let command = Command::move_effect(&self.sequence, uuid, target, position);
        self.push(command)
    }

    pub fn resize_effect(&mut self, uuid: Uuid, begin: i64, end: i64) -> Result<(), CommandError> {
        let command = Command::resize_effect(&self.sequence, uuid, begin, end);
        self.push(command)
    }

    pub fn remove_effect(&mut self, uuid: Uuid) -> Result<(), CommandError> {
        let command = Command::remove_effect(&self.sequence, uuid);
        self.push(command)
    }

    pub fn undo(&mut self) -> Result<bool, CommandError> {
        self.history.undo(&mut self.sequence)
    }

    pub fn redo(&mut self) -> Result<bool, CommandError> {
        self.history.redo(&mut self.sequence)
    }

    pub fn set_clean(&mut self) {
        self.history.set_clean();
    }

    pub fn is_clean(&self) -> bool {
        self.history.is_clean()
    }

    pub fn clip_info(&self, uuid: Uuid) -> Option<ClipInfo> {
        self.sequence.clip_info(uuid)
    }

    pub fn transition_info(&self, uuid: Uuid) -> Option<TransitionInfo> {
        self.sequence.transition_info(uuid)
    }

    pub fn library_clip_info(&self, uuid: Uuid) -> Option<LibraryClipInfo> {
        self.library.library_clip_info(uuid)
    }

    pub fn track_count(&self) -> usize {
        self.sequence.track_count()
    }

    pub fn length(&self) -> i64 {
        self.sequence.length()
    }

    pub fn can_render(&self) -> bool {
        self.sequence.length() > 0
    }

    /// Empties the sequence and forgets the history.
    pub fn clear(&mut self) {
        self.sequence.clear();
        self.history.clear();
    }

    pub fn save_snapshot(&self) -> Result<String, SnapshotError> {
        self.sequence.to_snapshot().to_json()
    }

    /// Replaces the sequence with a saved one. The history starts over and
    /// the loaded state counts as clean.
    pub fn load_snapshot(&mut self, data: &[u8]) -> Result<LoadSummary, SnapshotError> {
        let snapshot = parse_snapshot(data)?;
        let summary = self.sequence.load_snapshot(&snapshot);
        self.history.clear();
        info!(
            clips = summary.clips,
            transitions = summary.transitions,
            effects = summary.effects,
            skipped = summary.skipped,
            "loaded snapshot"
        );
        Ok(summary)
    }
}
