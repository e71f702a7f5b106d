//! Boundary to the compositing engine.
//!
//! The sequence model only ever talks to the engine through
//! [`EngineBackend`]: it builds a tree of opaque inputs (multitracks,
//! playlist tracks, clip producers), attaches filters and transitions, and
//! asks for lengths. Everything the engine does with that tree is out of
//! reach of the editing core.

use anyhow::Result;

use crate::clips::SourceClip;

mod headless;

pub use headless::HeadlessBackend;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InputHandle(pub u64);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FilterHandle(pub u64);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TransitionHandle(pub u64);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Channel {
    Audio,
    Video,
}

/// What the engine needs to know to render a transition.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransitionDesc {
    pub identifier: String,
    pub begin: i64,
    pub end: i64,
    /// Sub-inputs of the composition the transition blends, `None` when it
    /// blends consecutive clips inside a single playlist track.
    pub tracks: Option<(u32, u32)>,
}

pub trait EngineBackend: Send {
    fn create_multitrack(&mut self) -> InputHandle;
    fn create_track(&mut self) -> InputHandle;
    fn create_clip_input(&mut self, clip: &SourceClip) -> InputHandle;
    fn release(&mut self, input: InputHandle);

    /// Fails when the engine does not know `identifier`.
    fn create_filter(&mut self, identifier: &str) -> Result<FilterHandle>;
    fn release_filter(&mut self, filter: FilterHandle);

    /// Replaces the child at `index`. `at` is the timeline frame of the
    /// child inside a playlist track and is ignored by multitracks.
    fn set_sub_input(&mut self, parent: InputHandle, child: InputHandle, index: usize, at: i64);
    fn insert_sub_input(&mut self, parent: InputHandle, child: InputHandle, index: usize, at: i64);
    fn remove_sub_input(&mut self, parent: InputHandle, index: usize) -> Option<InputHandle>;
    fn hide_channel(&mut self, parent: InputHandle, channel: Channel, index: usize);

    fn attach_effect(&mut self, target: InputHandle, filter: FilterHandle);
    fn detach_effect(&mut self, target: InputHandle, filter: FilterHandle);
    fn set_filter_boundaries(&mut self, filter: FilterHandle, begin: i64, end: i64);

    fn add_transition(
        &mut self,
        composition: InputHandle,
        desc: &TransitionDesc,
    ) -> Result<TransitionHandle>;
    fn update_transition(&mut self, transition: TransitionHandle, desc: &TransitionDesc);
    fn remove_transition(&mut self, transition: TransitionHandle);

    fn length(&self, input: InputHandle) -> i64;
    fn position(&self, input: InputHandle) -> i64;
}
