use crossbeam_channel::{unbounded, Receiver, Sender};
use uuid::Uuid;

use super::error::CommandError;
use super::sequence::EffectTarget;

/// Fan-out of events to any number of subscribers.
///
/// Each subscriber gets its own unbounded channel. Subscribers that dropped
/// their receiver are pruned on the next emit.
#[derive(Debug)]
pub struct EventHub<T> {
    senders: Vec<Sender<T>>,
}

impl<T> Default for EventHub<T> {
    fn default() -> Self {
        Self {
            senders: Vec::new(),
        }
    }
}

impl<T: Clone> EventHub<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self) -> Receiver<T> {
        let (tx, rx) = unbounded();
        self.senders.push(tx);
        rx
    }

    pub fn emit(&mut self, event: T) {
        self.senders.retain(|tx| tx.send(event.clone()).is_ok());
    }

    pub fn subscriber_count(&self) -> usize {
        self.senders.len()
    }
}

/// Structural changes of the sequence.
#[derive(Debug, Clone, PartialEq)]
pub enum SequenceEvent {
    ClipAdded(Uuid),
    ClipRemoved(Uuid),
    ClipMoved(Uuid),
    ClipResized(Uuid),
    ClipLinked(Uuid, Uuid),
    ClipUnlinked(Uuid, Uuid),
    TransitionAdded(Uuid),
    TransitionMoved(Uuid),
    TransitionRemoved(Uuid),
    EffectsUpdated(EffectTarget),
    OnTimelineChanged { clip: Uuid, on_timeline: bool },
    Cleared,
}

/// Notifications for whoever presents the undo history.
#[derive(Debug, Clone, PartialEq)]
pub enum HistoryEvent {
    /// The command at `index` can no longer be done or undone.
    Invalidated {
        index: usize,
        text: String,
        reason: CommandError,
    },
    CleanChanged(bool),
    IndexChanged(usize),
}

/// Notifications coming from the compositing engine's own thread.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EngineEvent {
    LengthChanged(i64),
    PositionChanged(i64),
    EndReached,
    RenderStarted,
    RenderProgress { frame: i64, total: i64 },
    RenderStopped,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn emit_reaches_every_subscriber() {
        let mut hub = EventHub::new();
        let a = hub.subscribe();
        let b = hub.subscribe();
        hub.emit(SequenceEvent::Cleared);
        assert_eq!(a.try_recv(), Ok(SequenceEvent::Cleared));
        assert_eq!(b.try_recv(), Ok(SequenceEvent::Cleared));
    }

    #[test]
    fn dropped_subscribers_are_pruned() {
        let mut hub = EventHub::new();
        let kept = hub.subscribe();
        drop(hub.subscribe());
        hub.emit(HistoryEvent::IndexChanged(1));
        assert_eq!(hub.subscriber_count(), 1);
        assert_eq!(kept.try_recv(), Ok(HistoryEvent::IndexChanged(1)));
    }
}
