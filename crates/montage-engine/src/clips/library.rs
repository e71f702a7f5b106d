use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::Serialize;
use uuid::Uuid;

use super::{Media, SourceClip};

/// Read access to the clips owned by the media catalog.
pub trait MediaCatalog: Send + Sync {
    fn lookup_clip(&self, id: Uuid) -> Option<Arc<SourceClip>>;
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LibraryClipInfo {
    pub uuid: Uuid,
    pub name: String,
    pub begin: i64,
    pub end: i64,
    pub length: i64,
    pub duration_secs: f64,
    pub audio: bool,
    pub video: bool,
    pub on_timeline: bool,
}

/// Shared, in-memory catalog. Cloning hands out another handle to the
/// same clip table.
#[derive(Clone, Default)]
pub struct MediaLibrary {
    clips: Arc<RwLock<HashMap<Uuid, Arc<SourceClip>>>>,
}

impl MediaLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a media item and returns its base clip.
    pub fn add_media(&self, media: Media) -> Arc<SourceClip> {
        let clip = Arc::new(SourceClip::from_media(Arc::new(media)));
        self.insert_clip(Arc::clone(&clip));
        clip
    }

    pub fn insert_clip(&self, clip: Arc<SourceClip>) {
        self.clips.write().insert(clip.uuid(), clip);
    }

    pub fn remove_clip(&self, id: Uuid) -> Option<Arc<SourceClip>> {
        self.clips.write().remove(&id)
    }

    pub fn len(&self) -> usize {
        self.clips.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.clips.read().is_empty()
    }

    pub fn library_clip_info(&self, id: Uuid) -> Option<LibraryClipInfo> {
        let clip = self.lookup_clip(id)?;
        let media = clip.media();
        let duration_secs = if media.fps > 0.0 {
            clip.length() as f64 / media.fps
        } else {
            0.0
        };
        Some(LibraryClipInfo {
            uuid: clip.uuid(),
            name: media.title.clone(),
            begin: clip.begin(),
            end: clip.end(),
            length: clip.length(),
            duration_secs,
            audio: media.has_audio,
            video: media.has_video,
            on_timeline: clip.is_on_timeline(),
        })
    }
}

impl MediaCatalog for MediaLibrary {
    fn lookup_clip(&self, id: Uuid) -> Option<Arc<SourceClip>> {
        self.clips.read().get(&id).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn lookup_returns_registered_clips() {
        let library = MediaLibrary::new();
        let base = library.add_media(Media::new("a.mp4", 300, true, true));
        let cut = Arc::new(base.cut(0, 99).unwrap());
        library.insert_clip(Arc::clone(&cut));

        assert_eq!(library.len(), 2);
        let found = library.lookup_clip(cut.uuid()).unwrap();
        assert!(Arc::ptr_eq(&found, &cut));
        assert!(library.lookup_clip(Uuid::new_v4()).is_none());
    }

    #[test]
    fn clones_share_the_same_table() {
        let library = MediaLibrary::new();
        let handle = library.clone();
        let base = library.add_media(Media::new("b.wav", 48, true, false));
        assert!(handle.lookup_clip(base.uuid()).is_some());
        assert_eq!(
            handle.remove_clip(base.uuid()).map(|c| c.uuid()),
            Some(base.uuid())
        );
        assert!(library.is_empty());
    }

    #[test]
    fn info_reports_media_flags() {
        let library = MediaLibrary::new();
        let base = library.add_media(Media::new("c.wav", 60, true, false).with_fps(30.0));
        let info = library.library_clip_info(base.uuid()).unwrap();
        assert_eq!(info.name, "c.wav");
        assert_eq!(info.length, 60);
        assert_eq!(info.duration_secs, 2.0);
        assert!(info.audio);
        assert!(!info.video);
        assert!(!info.on_timeline);
    }
}
