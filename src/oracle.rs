//! Memoized clip durations.

use crate::ids::ClipName;
use crate::source::ClipSource;
use std::collections::HashMap;

/// Memoizes clip durations fetched from a [`ClipSource`].
///
/// Both hits and misses are remembered, so an unknown clip costs one source
/// query per reload rather than one per attack. Durations that are zero,
/// negative or not finite are reported as unknown.
///
/// # Examples
///
/// ```rust
/// use extra_attacks::oracle::ClipLengthOracle;
/// use extra_attacks::source::{ClipCatalog, ClipHandle};
/// use extra_attacks::ClipName;
///
/// let mut catalog = ClipCatalog::empty();
/// catalog.insert(ClipName::new("Sweep"), 1.6, ClipHandle(3));
///
/// let mut oracle = ClipLengthOracle::new();
/// assert_eq!(oracle.length(&catalog, &ClipName::new("Sweep")), Some(1.6));
/// assert_eq!(oracle.length(&catalog, &ClipName::new("Sweep")), Some(1.6));
/// assert_eq!(oracle.source_lookups(), 1);
/// ```
#[derive(Debug, Default)]
pub struct ClipLengthOracle {
    memo: HashMap<ClipName, Option<f32>>,
    source_lookups: u64,
}

impl ClipLengthOracle {
    /// Create an empty memo.
    pub fn new() -> Self {
        Self::default()
    }

    /// Duration of `clip` in seconds, or `None` if it cannot be determined.
    pub fn length(&mut self, source: &dyn ClipSource, clip: &ClipName) -> Option<f32> {
        if let Some(known) = self.memo.get(clip) {
            return *known;
        }

        self.source_lookups += 1;
        let length = source
            .clip_length(clip)
            .filter(|len| len.is_finite() && *len > 0.0);
        self.memo.insert(clip.clone(), length);
        length
    }

    /// Number of times the underlying source was queried.
    pub fn source_lookups(&self) -> u64 {
        self.source_lookups
    }

    /// Forget every memoized duration.
    pub fn clear(&mut self) {
        self.memo.clear();
    }
}
