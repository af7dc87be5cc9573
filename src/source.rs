//! Clip sources module.
//!
//! The engine never loads animation assets itself. An external loader hands
//! it a table of replacement clips, each with a duration and an opaque
//! handle the host runtime understands. [`ClipSource`] is that boundary;
//! [`ClipCatalog`] is the plain in-memory implementation.

use crate::ids::ClipName;
use std::collections::HashMap;

/// Opaque, host-defined handle to a loaded clip.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub struct ClipHandle(pub u64);

/// Trait for the asset boundary that supplies replacement clips.
///
/// Sources are read-only from the engine's point of view and must answer
/// the same query the same way until the host reloads its assets.
///
/// # Examples
///
/// ```rust
/// use extra_attacks::source::{ClipCatalog, ClipHandle, ClipSource};
/// use extra_attacks::ClipName;
///
/// let mut catalog = ClipCatalog::empty();
/// catalog.insert(ClipName::new("GreatswordSlam"), 2.0, ClipHandle(1));
///
/// assert_eq!(catalog.clip_length(&ClipName::new("GreatswordSlam")), Some(2.0));
/// assert!(!catalog.contains(&ClipName::new("Missing")));
/// ```
pub trait ClipSource: Send + Sync {
    /// Duration of the clip in seconds, if the clip is known.
    fn clip_length(&self, clip: &ClipName) -> Option<f32>;

    /// Host handle for the clip, if the clip is known.
    fn clip_handle(&self, clip: &ClipName) -> Option<ClipHandle>;

    /// Returns true if the source can supply this clip.
    fn contains(&self, clip: &ClipName) -> bool {
        self.clip_handle(clip).is_some()
    }
}

/// A loaded clip as supplied by the asset loader.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClipAsset {
    pub length: f32,
    pub handle: ClipHandle,
}

/// Map-backed clip source.
#[derive(Debug, Clone, Default)]
pub struct ClipCatalog {
    clips: HashMap<ClipName, ClipAsset>,
}

impl ClipCatalog {
    /// Wrap a prepared clip table.
    pub fn new(clips: HashMap<ClipName, ClipAsset>) -> Self {
        Self { clips }
    }

    /// A catalog with no clips.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Insert or replace a clip.
    pub fn insert(&mut self, clip: ClipName, length: f32, handle: ClipHandle) {
        self.clips.insert(clip, ClipAsset { length, handle });
    }

    pub fn len(&self) -> usize {
        self.clips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clips.is_empty()
    }
}

impl FromIterator<(ClipName, f32)> for ClipCatalog {
    /// Build a catalog from `(name, length)` pairs, numbering handles in
    /// iteration order starting at 1.
    fn from_iter<I: IntoIterator<Item = (ClipName, f32)>>(iter: I) -> Self {
        let mut catalog = Self::empty();
        for (idx, (clip, length)) in iter.into_iter().enumerate() {
            catalog.insert(clip, length, ClipHandle(idx as u64 + 1));
        }
        catalog
    }
}

impl ClipSource for ClipCatalog {
    fn clip_length(&self, clip: &ClipName) -> Option<f32> {
        self.clips.get(clip).map(|asset| asset.length)
    }

    fn clip_handle(&self, clip: &ClipName) -> Option<ClipHandle> {
        self.clips.get(clip).map(|asset| asset.handle)
    }
}
