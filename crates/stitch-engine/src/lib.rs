//! Per-facility detection engine: order cache, order matcher and the
//! frame-by-frame orchestrator that ties the vision stages together.
//!
//! All stages take the current timestamp as an argument; nothing in here
//! reads the wall clock, which keeps cooldown behaviour testable.

pub mod cache;
pub mod engine;
pub mod matcher;

pub use cache::OrderCache;
pub use engine::{DetectionEngine, EngineConfig, FrameOutcome, SnapshotKind, SnapshotRequest};
pub use matcher::{best_match, score_order, MatchResult};
