use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use uuid::Uuid;

use super::{ensure_range, ClipError};

/// A source media item as known to the catalog.
#[derive(Debug, Clone, PartialEq)]
pub struct Media {
    pub id: Uuid,
    pub title: String,
    pub fps: f64,
    /// Total length in frames, `0` when the media has no intrinsic length.
    pub length: i64,
    pub has_audio: bool,
    pub has_video: bool,
}

impl Media {
    pub fn new(title: impl Into<String>, length: i64, has_audio: bool, has_video: bool) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            fps: 29.97,
            length,
            has_audio,
            has_video,
        }
    }

    pub fn with_fps(mut self, fps: f64) -> Self {
        self.fps = fps;
        self
    }
}

/// An inclusive `[begin, end]` frame range over a source media.
///
/// Clips are shared as `Arc<SourceClip>` and never change their range. A
/// different range is always a different value, produced by [`SourceClip::cut`]
/// or [`SourceClip::with_boundaries`]. The only mutable bit is the "on
/// timeline" flag, which the sequence keeps up to date.
pub struct SourceClip {
    uuid: Uuid,
    origin: Uuid,
    media: Arc<Media>,
    begin: i64,
    end: i64,
    on_timeline: AtomicBool,
}

impl SourceClip {
    /// The base clip spanning the whole media.
    pub fn from_media(media: Arc<Media>) -> Self {
        let end = media.length.saturating_sub(1).max(0);
        let uuid = Uuid::new_v4();
        Self {
            uuid,
            origin: uuid,
            media,
            begin: 0,
            end,
            on_timeline: AtomicBool::new(false),
        }
    }

    /// Rebuilds a clip with a known identity, as found in a snapshot.
    pub fn restore(
        uuid: Uuid,
        origin: Uuid,
        media: Arc<Media>,
        begin: i64,
        end: i64,
    ) -> Result<Self, ClipError> {
        ensure_range(begin, end, media.length)?;
        Ok(Self {
            uuid,
            origin,
            media,
            begin,
            end,
            on_timeline: AtomicBool::new(false),
        })
    }

    /// Cuts a new clip out of the same media. The result gets a fresh uuid
    /// and remembers the catalog clip it descends from.
    pub fn cut(&self, begin: i64, end: i64) -> Result<SourceClip, ClipError> {
        Self::restore(
            Uuid::new_v4(),
            self.origin,
            Arc::clone(&self.media),
            begin,
            end,
        )
    }

    /// Same identity, new range.
    pub fn with_boundaries(&self, begin: i64, end: i64) -> Result<SourceClip, ClipError> {
        let clip = Self::restore(self.uuid, self.origin, Arc::clone(&self.media), begin, end)?;
        clip.set_on_timeline(self.is_on_timeline());
        Ok(clip)
    }

    pub fn uuid(&self) -> Uuid {
        self.uuid
    }

    pub fn origin(&self) -> Uuid {
        self.origin
    }

    pub fn is_root(&self) -> bool {
        self.uuid == self.origin
    }

    pub fn media(&self) -> &Arc<Media> {
        &self.media
    }

    pub fn begin(&self) -> i64 {
        self.begin
    }

    pub fn end(&self) -> i64 {
        self.end
    }

    /// Frames in `[begin, end]`. Construction keeps the range countable.
    pub fn length(&self) -> i64 {
        self.end.saturating_sub(self.begin).saturating_add(1)
    }

    pub fn is_on_timeline(&self) -> bool {
        self.on_timeline.load(Ordering::Acquire)
    }

    pub(crate) fn set_on_timeline(&self, value: bool) {
        self.on_timeline.store(value, Ordering::Release);
    }
}

impl fmt::Debug for SourceClip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceClip")
            .field("uuid", &self.uuid)
            .field("origin", &self.origin)
            .field("media", &self.media.title)
            .field("begin", &self.begin)
            .field("end", &self.end)
            .field("on_timeline", &self.is_on_timeline())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn media(length: i64) -> Arc<Media> {
        Arc::new(Media::new("clip.mkv", length, true, true))
    }

    #[test]
    fn base_clip_spans_media() {
        let clip = SourceClip::from_media(media(250));
        assert_eq!(clip.begin(), 0);
        assert_eq!(clip.end(), 249);
        assert_eq!(clip.length(), 250);
        assert!(clip.is_root());
    }

    #[test]
    fn cut_shares_media_and_origin() {
        let clip = SourceClip::from_media(media(250));
        let cut = clip.cut(10, 19).unwrap();
        assert_ne!(cut.uuid(), clip.uuid());
        assert_eq!(cut.origin(), clip.uuid());
        assert!(Arc::ptr_eq(cut.media(), clip.media()));
        assert_eq!(cut.length(), 10);
        assert!(!cut.is_root());

        let nested = cut.cut(12, 15).unwrap();
        assert_eq!(nested.origin(), clip.uuid());
    }

    #[test]
    fn cut_rejects_bad_ranges() {
        let clip = SourceClip::from_media(media(100));
        assert_eq!(
            clip.cut(20, 10).unwrap_err(),
            ClipError::InvalidRange { begin: 20, end: 10 }
        );
        assert_eq!(
            clip.cut(50, 100).unwrap_err(),
            ClipError::OutOfMedia {
                begin: 50,
                end: 100,
                length: 100
            }
        );
    }

    #[test]
    fn uncountable_ranges_are_rejected() {
        let open = SourceClip::from_media(media(0));
        assert_eq!(open.length(), 1);
        assert_eq!(
            open.cut(0, i64::MAX).unwrap_err(),
            ClipError::InvalidRange {
                begin: 0,
                end: i64::MAX
            }
        );
        assert_eq!(
            open.with_boundaries(-1, 10).unwrap_err(),
            ClipError::InvalidRange { begin: -1, end: 10 }
        );
        assert_eq!(open.cut(1, i64::MAX).unwrap().length(), i64::MAX);

        let odd = SourceClip::from_media(media(i64::MIN));
        assert_eq!((odd.begin(), odd.end()), (0, 0));
    }

    #[test]
    fn with_boundaries_keeps_identity_and_flag() {
        let clip = SourceClip::from_media(media(100));
        clip.set_on_timeline(true);
        let resized = clip.with_boundaries(5, 40).unwrap();
        assert_eq!(resized.uuid(), clip.uuid());
        assert_eq!(resized.length(), 36);
        assert!(resized.is_on_timeline());
    }
}
