//! Scope resolver module.
//!
//! Provides the [`ScopeResolver`] type, which owns the replacement map store
//! and answers "which substitutions apply to this equipment and mode" by
//! probing the specialization hierarchy from most to least specific.

use crate::context::EquipmentState;
use crate::ids::ItemId;
use crate::resolved::{Probe, ScopeResolution};
use crate::scope::{ScopeKey, ScopeTarget};
use crate::source::ClipSource;
use crate::store::{ReplacementMap, ReplacementMapStore, StoreLoadReport};
use crate::weapon::{AttackMode, OffHand, WeaponCategory};
use std::sync::Arc;

/// Resolves replacement maps through the scope hierarchy.
///
/// Resolution runs in two steps:
/// 1. If the state names an individual item, the most specific key for the
///    current equipment is lazily seeded from the nearest authored map.
/// 2. The candidate chain is probed in order; the first present, non-empty
///    map wins. Empty maps are skipped, never treated as authoritative.
///
/// # Examples
///
/// ```rust
/// use extra_attacks::source::{ClipCatalog, ClipHandle};
/// use extra_attacks::store::ReplacementMap;
/// use extra_attacks::*;
///
/// let mut catalog = ClipCatalog::empty();
/// catalog.insert(ClipName::new("AxeSpin"), 2.0, ClipHandle(1));
///
/// let category_key = ScopeKey::category(AttackMode::ModeA, WeaponCategory::Axes);
/// let mut map = ReplacementMap::new();
/// map.insert(ClipName::new("axe_secondary"), ClipName::new("AxeSpin"));
///
/// let mut resolver = ScopeResolver::new();
/// resolver.load(vec![(category_key.clone(), map)], &catalog);
///
/// let state = EquipmentState::new(WeaponCategory::Axes);
/// let resolution = resolver.resolve(&state, AttackMode::ModeA);
/// assert_eq!(resolution.scope, category_key);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ScopeResolver {
    store: ReplacementMapStore,
}

impl ScopeResolver {
    /// Create a resolver over an empty store.
    ///
    /// Until [`ScopeResolver::load`] is called every resolution is a
    /// passthrough.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap an existing store, keeping its entries and seeds.
    pub fn with_store(store: ReplacementMapStore) -> Self {
        Self { store }
    }

    /// Read-only access to the underlying store.
    pub fn store(&self) -> &ReplacementMapStore {
        &self.store
    }

    /// Replace the store's contents. See [`ReplacementMapStore::load`].
    pub fn load<I>(&mut self, authored: I, clips: &dyn ClipSource) -> StoreLoadReport
    where
        I: IntoIterator<Item = (ScopeKey, ReplacementMap)>,
    {
        self.store.load(authored, clips)
    }

    /// Resolve the replacement map for `state` and `mode`.
    ///
    /// Never fails: when no layer has substitutions the result names the
    /// bare mode key with an empty map.
    pub fn resolve(&mut self, state: &EquipmentState, mode: AttackMode) -> ScopeResolution {
        let chain = state.candidates(mode);

        let seeded = match chain.split_first() {
            Some((entry, rest)) if matches!(entry.target, ScopeTarget::Item(_)) => {
                self.store.ensure_seeded(entry, rest)
            }
            _ => false,
        };

        let mut probes = Vec::with_capacity(chain.len());
        for candidate in &chain {
            match self.store.get_shared(candidate) {
                None => probes.push((candidate.clone(), Probe::Missing)),
                Some(map) if map.is_empty() => probes.push((candidate.clone(), Probe::Empty)),
                Some(map) => {
                    probes.push((candidate.clone(), Probe::Hit));
                    let mut resolution = ScopeResolution::new(candidate.clone(), map);
                    resolution.probes = probes;
                    resolution.seeded = seeded;
                    return resolution;
                }
            }
        }

        let bare = ScopeKey::bare(mode);
        let map = self
            .store
            .get_shared(&bare)
            .unwrap_or_else(|| Arc::new(ReplacementMap::new()));
        let mut resolution = ScopeResolution::new(bare, map);
        resolution.probes = probes;
        resolution.seeded = seeded;
        resolution
    }

    /// Resolve from loose parts rather than an [`EquipmentState`].
    pub fn resolve_parts(
        &mut self,
        category: WeaponCategory,
        item: Option<&ItemId>,
        off_hand: Option<OffHand>,
        mode: AttackMode,
    ) -> ScopeResolution {
        let state = EquipmentState {
            category,
            item: item.cloned(),
            off_hand,
        };
        self.resolve(&state, mode)
    }
}
