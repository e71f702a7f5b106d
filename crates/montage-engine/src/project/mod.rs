pub mod load;
pub mod migrate;
pub mod schema;

#[cfg(any(test, feature = "fuzzing"))]
pub use load::fuzz_parse_snapshot;
pub use load::{parse_snapshot, SnapshotError};
pub use migrate::MigrationError;
pub use schema::{
    ClipEntry, FilterEntry, PlacementEntry, SequenceSnapshot, TrackFiltersEntry, TransitionEntry,
    SNAPSHOT_VERSION,
};
