use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use anyhow::{anyhow, Result};
use parking_lot::Mutex;
use uuid::Uuid;

use super::{
    Channel, EngineBackend, FilterHandle, InputHandle, TransitionDesc, TransitionHandle,
};
use crate::clips::SourceClip;

const DEFAULT_FILTERS: &[&str] = &["brightness", "greyscale", "volume", "frei0r.glow"];
const DEFAULT_TRANSITIONS: &[&str] = &["dissolve", "luma", "mix", "composite"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NodeKind {
    Multitrack,
    Track,
    Clip { clip: Uuid, length: i64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Child {
    input: InputHandle,
    at: i64,
}

#[derive(Debug)]
struct Node {
    kind: NodeKind,
    children: Vec<Option<Child>>,
    hidden: Vec<(usize, Channel)>,
    filters: Vec<FilterHandle>,
}

impl Node {
    fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            children: Vec::new(),
            hidden: Vec::new(),
            filters: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct FilterState {
    identifier: String,
    begin: i64,
    end: i64,
}

#[derive(Debug, Default)]
struct HeadlessState {
    next_handle: u64,
    nodes: HashMap<InputHandle, Node>,
    filters: HashMap<FilterHandle, FilterState>,
    transitions: HashMap<TransitionHandle, (InputHandle, TransitionDesc)>,
    known_filters: BTreeSet<String>,
    known_transitions: BTreeSet<String>,
    position: i64,
}

impl HeadlessState {
    fn next(&mut self) -> u64 {
        self.next_handle += 1;
        self.next_handle
    }

    fn add_node(&mut self, kind: NodeKind) -> InputHandle {
        let handle = InputHandle(self.next());
        self.nodes.insert(handle, Node::new(kind));
        handle
    }

    fn length(&self, input: InputHandle) -> i64 {
        let Some(node) = self.nodes.get(&input) else {
            return 0;
        };
        match node.kind {
            NodeKind::Clip { length, .. } => length,
            NodeKind::Track => node
                .children
                .iter()
                .flatten()
                .map(|child| child.at.saturating_add(self.length(child.input)))
                .max()
                .unwrap_or(0),
            NodeKind::Multitrack => node
                .children
                .iter()
                .flatten()
                .map(|child| self.length(child.input))
                .max()
                .unwrap_or(0),
        }
    }
}

/// In-process engine that only keeps the composition tree in memory.
///
/// Handles are cheap clones sharing one state, so a caller can hand a clone
/// to the sequence model and keep another one to look at what was built.
#[derive(Clone)]
pub struct HeadlessBackend {
    state: Arc<Mutex<HeadlessState>>,
}

impl Default for HeadlessBackend {
    fn default() -> Self {
        Self::with_catalogs(
            DEFAULT_FILTERS.iter().copied(),
            DEFAULT_TRANSITIONS.iter().copied(),
        )
    }
}

impl HeadlessBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_catalogs<'a>(
        filters: impl IntoIterator<Item = &'a str>,
        transitions: impl IntoIterator<Item = &'a str>,
    ) -> Self {
        let state = HeadlessState {
            known_filters: filters.into_iter().map(str::to_owned).collect(),
            known_transitions: transitions.into_iter().map(str::to_owned).collect(),
            ..HeadlessState::default()
        };
        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    pub fn seek(&self, frame: i64) {
        self.state.lock().position = frame;
    }

    /// Children of `input` in sub-input order; empty slots are skipped.
    pub fn children(&self, input: InputHandle) -> Vec<InputHandle> {
        let state = self.state.lock();
        state
            .nodes
            .get(&input)
            .map(|node| {
                node.children.iter().flatten().map(|c| c.input).collect()
            })
            .unwrap_or_default()
    }

    /// Clip uuids placed on a playlist track, with their timeline frames.
    pub fn track_layout(&self, track: InputHandle) -> Vec<(Uuid, i64)> {
        let state = self.state.lock();
        let Some(node) = state.nodes.get(&track) else {
            return Vec::new();
        };
        node.children
            .iter()
            .flatten()
            .filter_map(|child| match state.nodes.get(&child.input)?.kind {
                NodeKind::Clip { clip, .. } => Some((clip, child.at)),
                _ => None,
            })
            .collect()
    }

    pub fn hidden_channels(&self, input: InputHandle) -> Vec<(usize, Channel)> {
        let state = self.state.lock();
        state
            .nodes
            .get(&input)
            .map(|node| node.hidden.clone())
            .unwrap_or_default()
    }

    pub fn attached_filters(&self, input: InputHandle) -> Vec<String> {
        let state = self.state.lock();
        let Some(node) = state.nodes.get(&input) else {
            return Vec::new();
        };
        node.filters
            .iter()
            .filter_map(|handle| state.filters.get(handle))
            .map(|filter| filter.identifier.clone())
            .collect()
    }

    pub fn filter_boundaries(&self, filter: FilterHandle) -> Option<(i64, i64)> {
        let state = self.state.lock();
        state.filters.get(&filter).map(|f| (f.begin, f.end))
    }

    pub fn transitions(&self) -> Vec<(InputHandle, TransitionDesc)> {
        let state = self.state.lock();
        let mut transitions: Vec<_> = state.transitions.iter().collect();
        transitions.sort_by_key(|(handle, _)| **handle);
        transitions
            .into_iter()
            .map(|(_, entry)| entry.clone())
            .collect()
    }

    pub fn live_inputs(&self) -> usize {
        self.state.lock().nodes.len()
    }

    pub fn live_filters(&self) -> usize {
        self.state.lock().filters.len()
    }
}

impl EngineBackend for HeadlessBackend {
    fn create_multitrack(&mut self) -> InputHandle {
        self.state.lock().add_node(NodeKind::Multitrack)
    }

    fn create_track(&mut self) -> InputHandle {
        self.state.lock().add_node(NodeKind::Track)
    }

    fn create_clip_input(&mut self, clip: &SourceClip) -> InputHandle {
        self.state.lock().add_node(NodeKind::Clip {
            clip: clip.uuid(),
            length: clip.length(),
        })
    }

    fn release(&mut self, input: InputHandle) {
        self.state.lock().nodes.remove(&input);
    }

    fn create_filter(&mut self, identifier: &str) -> Result<FilterHandle> {
        let mut state = self.state.lock();
        if !state.known_filters.contains(identifier) {
            return Err(anyhow!("unknown filter identifier `{identifier}`"));
        }
        let handle = FilterHandle(state.next());
        state.filters.insert(
            handle,
            FilterState {
                identifier: identifier.to_owned(),
                begin: 0,
                end: -1,
            },
        );
        Ok(handle)
    }

    fn release_filter(&mut self, filter: FilterHandle) {
        let mut state = self.state.lock();
        state.filters.remove(&filter);
        for node in state.nodes.values_mut() {
            node.filters.retain(|handle| *handle != filter);
        }
    }

    fn set_sub_input(&mut self, parent: InputHandle, child: InputHandle, index: usize, at: i64) {
        let mut state = self.state.lock();
        if let Some(node) = state.nodes.get_mut(&parent) {
            if node.children.len() <= index {
                node.children.resize(index + 1, None);
            }
            node.children[index] = Some(Child { input: child, at });
        }
    }

    fn insert_sub_input(&mut self, parent: InputHandle, child: InputHandle, index: usize, at: i64) {
        let mut state = self.state.lock();
        if let Some(node) = state.nodes.get_mut(&parent) {
            let index = index.min(node.children.len());
            node.children
                .insert(index, Some(Child { input: child, at }));
        }
    }

    fn remove_sub_input(&mut self, parent: InputHandle, index: usize) -> Option<InputHandle> {
        let mut state = self.state.lock();
        let node = state.nodes.get_mut(&parent)?;
        if index >= node.children.len() {
            return None;
        }
        node.children.remove(index).map(|child| child.input)
    }

    fn hide_channel(&mut self, parent: InputHandle, channel: Channel, index: usize) {
        let mut state = self.state.lock();
        if let Some(node) = state.nodes.get_mut(&parent) {
            if !node.hidden.contains(&(index, channel)) {
                node.hidden.push((index, channel));
            }
        }
    }

    fn attach_effect(&mut self, target: InputHandle, filter: FilterHandle) {
        let mut state = self.state.lock();
        if let Some(node) = state.nodes.get_mut(&target) {
            if !node.filters.contains(&filter) {
                node.filters.push(filter);
            }
        }
    }

    fn detach_effect(&mut self, target: InputHandle, filter: FilterHandle) {
        let mut state = self.state.lock();
        if let Some(node) = state.nodes.get_mut(&target) {
            node.filters.retain(|handle| *handle != filter);
        }
    }

    fn set_filter_boundaries(&mut self, filter: FilterHandle, begin: i64, end: i64) {
        let mut state = self.state.lock();
        if let Some(filter) = state.filters.get_mut(&filter) {
            filter.begin = begin;
            filter.end = end;
        }
    }

    fn add_transition(
        &mut self,
        composition: InputHandle,
        desc: &TransitionDesc,
    ) -> Result<TransitionHandle> {
        let mut state = self.state.lock();
        if !state.known_transitions.contains(&desc.identifier) {
            return Err(anyhow!(
                "unknown transition identifier `{}`",
                desc.identifier
            ));
        }
        let handle = TransitionHandle(state.next());
        let entry = (composition, desc.clone());
        state.transitions.insert(handle, entry);
        Ok(handle)
    }

    fn update_transition(&mut self, transition: TransitionHandle, desc: &TransitionDesc) {
        let mut state = self.state.lock();
        if let Some(entry) = state.transitions.get_mut(&transition) {
            entry.1 = desc.clone();
        }
    }

    fn remove_transition(&mut self, transition: TransitionHandle) {
        self.state.lock().transitions.remove(&transition);
    }

    fn length(&self, input: InputHandle) -> i64 {
        self.state.lock().length(input)
    }

    fn position(&self, _input: InputHandle) -> i64 {
        self.state.lock().position
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clips::Media;
    use pretty_assertions::assert_eq;

    #[test]
    fn unknown_filters_fail_construction() {
        let mut backend = HeadlessBackend::new();
        assert!(backend.create_filter("brightness").is_ok());
        assert!(backend.create_filter("does.not.exist").is_err());
    }

    #[test]
    fn track_length_follows_placed_inputs() {
        let mut backend = HeadlessBackend::new();
        let root = backend.create_multitrack();
        let track = backend.create_track();
        backend.set_sub_input(root, track, 3, 0);

        let clip = SourceClip::from_media(Arc::new(Media::new("a.mp4", 100, true, true)));
        let input = backend.create_clip_input(&clip);
        backend.insert_sub_input(track, input, 0, 50);

        assert_eq!(backend.length(track), 150);
        assert_eq!(backend.length(root), 150);
        assert_eq!(backend.track_layout(track), vec![(clip.uuid(), 50)]);

        assert_eq!(backend.remove_sub_input(track, 0), Some(input));
        assert_eq!(backend.length(root), 0);
        assert_eq!(backend.remove_sub_input(track, 0), None);
    }

    #[test]
    fn filters_detach_on_release() {
        let mut backend = HeadlessBackend::new();
        let track = backend.create_track();
        let filter = backend.create_filter("volume").unwrap();
        backend.attach_effect(track, filter);
        backend.attach_effect(track, filter);
        assert_eq!(backend.attached_filters(track), vec!["volume".to_owned()]);

        backend.release_filter(filter);
        assert!(backend.attached_filters(track).is_empty());
    }
}
