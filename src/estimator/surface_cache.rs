//! Density surface cache keyed by an input snapshot.
//!
//! The cache holds at most one surface together with the key it was computed
//! for. A lookup with a different key recomputes; there is no separate
//! invalidation step to forget.

use crate::EstimateConfig;
use crate::density::KernelCovariance;
use crate::error::Result;
use crate::grid::DensitySurface;

/// Everything a density surface depends on.
///
/// `generation` identifies the (points, weights) snapshot; the remaining
/// fields are the request parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SurfaceKey {
    pub generation: u64,
    pub weighted: bool,
    pub resolution: usize,
    /// Bit pattern of the kernel width, so the key stays `Eq`
    pub kernel_width_bits: u64,
    pub covariance: KernelCovariance,
}

impl SurfaceKey {
    pub fn new(generation: u64, config: &EstimateConfig) -> Self {
        Self {
            generation,
            weighted: config.weighted,
            resolution: config.resolution,
            kernel_width_bits: config.kernel_width.to_bits(),
            covariance: config.covariance,
        }
    }
}

#[derive(Debug, Clone)]
struct CachedSurface {
    key: SurfaceKey,
    surface: DensitySurface,
}

/// Single-entry cache of the last computed density surface.
#[derive(Debug, Default)]
pub struct SurfaceCache {
    entry: Option<CachedSurface>,
    hits: u64,
    computations: u64,
}

impl SurfaceCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Check whether the cached surface was computed for `key`.
    pub fn is_fresh(&self, key: &SurfaceKey) -> bool {
        self.entry.as_ref().is_some_and(|e| e.key == *key)
    }

    /// Get the cached surface without computing (None if missing or stale).
    pub fn get(&self, key: &SurfaceKey) -> Option<&DensitySurface> {
        self.entry
            .as_ref()
            .filter(|e| e.key == *key)
            .map(|e| &e.surface)
    }

    /// Key of the cached surface, if any.
    pub fn key(&self) -> Option<&SurfaceKey> {
        self.entry.as_ref().map(|e| &e.key)
    }

    /// Return the surface for `key`, computing it if the cache holds another.
    ///
    /// A failed computation leaves the cache empty.
    pub fn get_or_try_compute<F>(&mut self, key: SurfaceKey, compute: F) -> Result<&DensitySurface>
    where
        F: FnOnce() -> Result<DensitySurface>,
    {
        let entry = match self.entry.take() {
            Some(entry) if entry.key == key => {
                self.hits += 1;
                entry
            }
            _ => {
                let surface = compute()?;
                self.computations += 1;
                CachedSurface { key, surface }
            }
        };
        Ok(&self.entry.insert(entry).surface)
    }

    /// Drop the cached surface.
    pub fn clear(&mut self) {
        self.entry = None;
    }

    /// Number of lookups served from the cache.
    pub fn hits(&self) -> u64 {
        self.hits
    }

    /// Number of surfaces computed.
    pub fn computations(&self) -> u64 {
        self.computations
    }
}
