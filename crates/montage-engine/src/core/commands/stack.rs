use std::collections::HashSet;

use crossbeam_channel::Receiver;
use tracing::debug;
use uuid::Uuid;

use super::Command;
use crate::core::error::CommandError;
use crate::core::events::{EventHub, HistoryEvent};
use crate::core::sequence::SequenceModel;

/// Linear history of [`Command`]s.
///
/// `index` counts the commands currently applied; entries at and above it
/// can be redone until the next push discards them. The clean marker
/// remembers the index at which the sequence was last saved.
pub struct UndoStack {
    entries: Vec<Command>,
    index: usize,
    clean_index: Option<usize>,
    undo_limit: usize,
    events: EventHub<HistoryEvent>,
}

impl Default for UndoStack {
    fn default() -> Self {
        Self::new(0)
    }
}

impl UndoStack {
    /// `undo_limit` of `0` keeps every entry.
    pub fn new(undo_limit: usize) -> Self {
        Self {
            entries: Vec::new(),
            index: 0,
            clean_index: Some(0),
            undo_limit,
            events: EventHub::new(),
        }
    }

    pub fn subscribe(&mut self) -> Receiver<HistoryEvent> {
        self.events.subscribe()
    }

    /// Records `command` and runs its forward action.
    ///
    /// Invalid commands are recorded too, so the history shows them as
    /// "Invalid action". The error reports why the command is invalid.
    pub fn push(
        &mut self,
        mut command: Command,
        sequence: &mut SequenceModel,
    ) -> Result<(), CommandError> {
        let was_clean = self.is_clean();
        let mut dropped = Vec::new();
        if self.index < self.entries.len() {
            dropped.extend(self.entries.drain(self.index..));
            if self.clean_index.map_or(false, |clean| clean > self.index) {
                self.clean_index = None;
            }
        }

        let result = match command.invalid_reason() {
            Some(reason) => Err(reason.clone()),
            None => command.redo(sequence),
        };

        let merged = if result.is_ok() && self.clean_index != Some(self.index) {
            self.index
                .checked_sub(1)
                .and_then(|top| self.entries[top].try_merge(&command))
        } else {
            None
        };

        match merged {
            Some(merged) => {
                debug!(label = %merged.label(), "merged command into history top");
                let top = self.index - 1;
                self.entries[top] = merged;
            }
            None => {
                self.entries.push(command);
                self.index += 1;
                if let Err(reason) = &result {
                    self.report_invalid(self.index - 1, reason);
                }
                dropped.extend(self.enforce_limit());
            }
        }

        self.release_effects(&dropped, sequence);
        self.events.emit(HistoryEvent::IndexChanged(self.index));
        self.report_clean(was_clean);
        result
    }

    /// Steps back one command. `Ok(false)` when there is nothing to undo;
    /// an error means this step invalidated the command, which still counts
    /// as undone.
    pub fn undo(&mut self, sequence: &mut SequenceModel) -> Result<bool, CommandError> {
        if !self.can_undo() {
            return Ok(false);
        }
        let was_clean = self.is_clean();
        self.index -= 1;
        let index = self.index;
        let result = self.entries[index].undo(sequence);
        self.finish_step(index, was_clean, result)
    }

    /// Re-applies the next command, with the same reporting as
    /// [`undo`](Self::undo).
    pub fn redo(&mut self, sequence: &mut SequenceModel) -> Result<bool, CommandError> {
        if !self.can_redo() {
            return Ok(false);
        }
        let was_clean = self.is_clean();
        let index = self.index;
        self.index += 1;
        let result = self.entries[index].redo(sequence);
        self.finish_step(index, was_clean, result)
    }

    fn finish_step(
        &mut self,
        index: usize,
        was_clean: bool,
        result: Result<(), CommandError>,
    ) -> Result<bool, CommandError> {
        if let Err(reason) = &result {
            self.report_invalid(index, reason);
        }
        self.events.emit(HistoryEvent::IndexChanged(self.index));
        self.report_clean(was_clean);
        result.map(|()| true)
    }

    fn report_invalid(&mut self, index: usize, reason: &CommandError) {
        let text = self.entries[index].label().to_owned();
        self.events.emit(HistoryEvent::Invalidated {
            index,
            text,
            reason: reason.clone(),
        });
    }

    fn report_clean(&mut self, was_clean: bool) {
        let clean = self.is_clean();
        if clean != was_clean {
            self.events.emit(HistoryEvent::CleanChanged(clean));
        }
    }

    fn enforce_limit(&mut self) -> Vec<Command> {
        if self.undo_limit == 0 || self.entries.len() <= self.undo_limit {
            return Vec::new();
        }
        let excess = self.entries.len() - self.undo_limit;
        let dropped = self.entries.drain(..excess).collect();
        self.index = self.index.saturating_sub(excess);
        self.clean_index = self
            .clean_index
            .and_then(|clean| clean.checked_sub(excess));
        debug!(
            excess,
            limit = self.undo_limit,
            "dropped oldest history entries"
        );
        dropped
    }

    /// Releases detached effects that only `dropped` commands refer to.
    /// Effects still attached to the sequence are left alone.
    fn release_effects(&self, dropped: &[Command], sequence: &mut SequenceModel) {
        if dropped.is_empty() {
            return;
        }
        let kept: HashSet<Uuid> = self.entries.iter().filter_map(Command::effect).collect();
        for uuid in dropped.iter().filter_map(Command::effect) {
            if !kept.contains(&uuid) && sequence.discard_effect(uuid) {
                debug!(%uuid, "released effect of a discarded command");
            }
        }
    }

    pub fn can_undo(&self) -> bool {
        self.index > 0
    }

    pub fn can_redo(&self) -> bool {
        self.index < self.entries.len()
    }

    pub fn undo_text(&self) -> Option<&str> {
        self.index
            .checked_sub(1)
            .and_then(|top| self.entries.get(top))
            .map(Command::text)
    }

    pub fn redo_text(&self) -> Option<&str> {
        self.entries.get(self.index).map(Command::text)
    }

    pub fn count(&self) -> usize {
        self.entries.len()
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn undo_limit(&self) -> usize {
        self.undo_limit
    }

    pub fn command(&self, index: usize) -> Option<&Command> {
        self.entries.get(index)
    }

    pub fn commands(&self) -> impl Iterator<Item = &Command> {
        self.entries.iter()
    }

    pub fn is_clean(&self) -> bool {
        self.clean_index == Some(self.index)
    }

    pub fn set_clean(&mut self) {
        let was_clean = self.is_clean();
        self.clean_index = Some(self.index);
        self.report_clean(was_clean);
    }

    /// Forgets every entry without touching the sequence. The empty history
    /// is clean.
    pub fn clear(&mut self) {
        let was_clean = self.is_clean();
        self.entries.clear();
        self.index = 0;
        self.clean_index = Some(0);
        self.events.emit(HistoryEvent::IndexChanged(0));
        self.report_clean(was_clean);
    }
}
