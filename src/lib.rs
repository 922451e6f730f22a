// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod config;
pub mod filter;
pub mod listing;
pub mod profile;
pub mod relevance;
pub mod snapshot;
pub mod telemetry;

// ---- Re-exports for stable public API ----
pub use crate::filter::{filter, FilterParams, FundingFilter, SourceType};
pub use crate::listing::{Listing, Snapshot};
pub use crate::profile::{JsonFileStore, KeyValueStore, MemoryStore, Profile, ProfileStore};
pub use crate::relevance::{annotate, match_profile, ProfileMatch};
pub use crate::snapshot::SnapshotLoader;
