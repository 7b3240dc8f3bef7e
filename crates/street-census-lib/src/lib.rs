//! Street Census Library - Identity Resolution for Street Centerline Segments
//!
//! This library reconciles daily batches of observed street geometries against a
//! canonical, append-only registry of centerline segments, so that the same
//! physical segment always receives the same stable identifier even though the
//! source re-emits raw geometry (with floating coordinates and no stable key)
//! on every pull.
//!
//! # Architecture
//!
//! - **[`Segment`] / [`Registry`]**: Immutable segment records and the growing registry
//! - **[`anchor`]**: Derives the representative point and planar length used for matching
//! - **[`AnchorIndex`]**: Disposable per-run R-tree over registry anchor points
//! - **[`Thresholds`] / [`Resolution`]**: Dual-cutoff matched/novel decision rule
//! - **[`IdAllocator`]**: Monotonic, collision-free identifier allocation
//! - **[`Registry::reconcile`]**: The single mutation point, producing the new registry
//!
//! The engine is pure computation: no network, file formats, or date handling.
//! Callers load the registry, resolve one batch, and persist the result.

mod allocate;
pub mod anchor;
mod classify;
mod index;
mod registry;

// Public API exports
pub use allocate::IdAllocator;
pub use classify::{Candidate, Resolution, Thresholds};
pub use index::AnchorIndex;
pub use registry::{Reconciliation, Registry, Segment};

/// Error types for the resolution engine
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// A record's coordinate sequence is empty and cannot yield an anchor.
    /// Signaled per-record; the engine never coerces it to a valid-looking anchor.
    #[error("record {index} has an empty coordinate sequence and no anchor can be derived")]
    MalformedGeometry { index: usize },

    /// Identifier uniqueness is the registry's only non-geometric invariant;
    /// a duplicate makes further allocation unsafe.
    #[error("registry id invariant violated: id {id} appears more than once")]
    DuplicateId { id: u64 },
}

pub type Result<T> = std::result::Result<T, RegistryError>;
