mod clip;
mod library;

pub use clip::{Media, SourceClip};
pub use library::{LibraryClipInfo, MediaCatalog, MediaLibrary};

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ClipError {
    #[error("clip range {begin}..={end} is not a valid frame range")]
    InvalidRange { begin: i64, end: i64 },
    #[error("clip range {begin}..={end} exceeds media length {length}")]
    OutOfMedia { begin: i64, end: i64, length: i64 },
}

/// Number of frames in the inclusive range `[begin, end]`. `None` for reversed
/// ranges and ranges starting before frame 0, and when the count overflows.
pub(crate) fn frame_count(begin: i64, end: i64) -> Option<i64> {
    if begin < 0 || end < begin {
        return None;
    }
    end.checked_sub(begin)?.checked_add(1)
}

fn ensure_range(begin: i64, end: i64, media_length: i64) -> Result<(), ClipError> {
    if frame_count(begin, end).is_none() {
        return Err(ClipError::InvalidRange { begin, end });
    }
    if media_length > 0 && end >= media_length {
        return Err(ClipError::OutOfMedia {
            begin,
            end,
            length: media_length,
        });
    }
    Ok(())
}
