//! serialist-core library.
//!
//! Keeps the narrative state of a serialized novel consistent across
//! chapters: chapter packs are validated and merged into a durable
//! continuity store, and a minified view of that store is projected into the
//! request for the next chapter.

pub mod characters;
pub mod config;
pub mod continuity;
pub mod error;
pub mod export;
pub mod lifecycle;
pub mod minify;
pub mod model;
pub mod pack;
pub mod prompt;
pub mod summary;

/// # Conventions
///
/// - **Errors**: `thiserror` enums per module in the library; `anyhow::Result`
///   where several failure kinds meet (lifecycle, config).
/// - **Logging**: Use `tracing` macros (`info!`, `warn!`, `error!`, `debug!`, `trace!`).
pub use continuity::{ContinuityStore, StoreError};
pub use lifecycle::Project;
