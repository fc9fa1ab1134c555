//! Terrain chunk streaming: the pooled, incremental patch builder and the
//! manager that keeps the resident patch set in step with the LOD index.
//!
//! Everything here runs on the caller's thread. Each call to
//! [`ChunkManager::update`] advances the in-flight build batch by one step,
//! and a new LOD diff is only taken once the previous batch has been
//! swapped in whole.

mod builder;
mod error;
mod manager;

pub use builder::{BatchReport, BuilderSettings, BuilderStats, ChunkBuilder, PatchEvent, PatchId};
pub use error::StreamingError;
pub use manager::{
    ChunkManager, DiffStats, LeafDiff, ResidentChunk, StreamingSettings, TerrainGenerators,
    TickSummary, diff_leaves,
};
