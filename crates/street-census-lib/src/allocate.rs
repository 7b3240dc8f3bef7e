//! Monotonic identifier allocation
//!
//! Fresh identifiers continue from the current registry maximum. The maximum
//! is recomputed from the live registry at allocation time rather than cached
//! across runs, so registries mutated externally between runs are tolerated.
//! An id is never reused once issued, even if a later segment looks identical.

use crate::{Registry, RegistryError, Result};
use std::collections::HashSet;

/// Issues registry-unique, strictly increasing identifiers.
#[derive(Debug, Clone)]
pub struct IdAllocator {
    next: u64,
}

impl IdAllocator {
    /// Create an allocator positioned just past the registry's maximum id.
    ///
    /// Scans the registry and refuses to allocate if the id invariant is
    /// already broken (a duplicate id), since any further allocation could
    /// collide. An empty registry allocates from 0.
    pub fn from_registry(registry: &Registry) -> Result<Self> {
        let mut seen = HashSet::with_capacity(registry.len());
        let mut max_id: Option<u64> = None;

        for segment in registry.segments() {
            if !seen.insert(segment.id) {
                return Err(RegistryError::DuplicateId { id: segment.id });
            }
            max_id = Some(max_id.map_or(segment.id, |m: u64| m.max(segment.id)));
        }

        Ok(Self {
            next: max_id.map_or(0, |m| m + 1),
        })
    }

    /// Take the next `count` identifiers, in increasing order.
    ///
    /// Consecutive calls never overlap, so allocation order is deterministic
    /// for a fixed batch ordering.
    pub fn allocate(&mut self, count: usize) -> Vec<u64> {
        let start = self.next;
        self.next += count as u64;
        (start..self.next).collect()
    }

    /// The id the next allocation would start from
    #[inline]
    pub fn next_id(&self) -> u64 {
        self.next
    }
}
