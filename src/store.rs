//! Replacement map storage.
//!
//! The [`ReplacementMapStore`] holds, per [`ScopeKey`], the table of
//! reference clip → replacement clip substitutions. It is replaced
//! wholesale by [`ReplacementMapStore::load`] and extended only by
//! [`ReplacementMapStore::ensure_seeded`].

use crate::ids::ClipName;
use crate::scope::ScopeKey;
use crate::source::ClipSource;
use crate::weapon::{AttackMode, WeaponCategory};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::{debug, warn};

/// Reference clip → replacement clip substitutions for one scope.
pub type ReplacementMap = BTreeMap<ClipName, ClipName>;

/// How an entry came to be in the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryOrigin {
    /// Written in a configuration document.
    Authored,
    /// Required scope absent from configuration, filled with an empty map.
    Defaulted,
    /// Cloned lazily from a less specific authored entry.
    Seeded,
}

#[derive(Debug, Clone)]
struct ScopeEntry {
    map: Arc<ReplacementMap>,
    origin: EntryOrigin,
}

/// A configuration mapping dropped because its replacement clip was not
/// supplied by the asset boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DroppedMapping {
    pub scope: ScopeKey,
    pub reference: ClipName,
    pub replacement: ClipName,
}

/// Summary of a [`ReplacementMapStore::load`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreLoadReport {
    /// Entries taken from configuration.
    pub authored: usize,
    /// Required scopes that were filled with an empty map.
    pub defaulted: usize,
    /// Mappings skipped because their replacement clip is unknown.
    pub dropped: Vec<DroppedMapping>,
}

/// In-memory `ScopeKey -> ReplacementMap` table.
///
/// # Examples
///
/// ```rust
/// use extra_attacks::source::{ClipCatalog, ClipHandle};
/// use extra_attacks::store::{ReplacementMap, ReplacementMapStore};
/// use extra_attacks::{AttackMode, ClipName, ScopeKey, WeaponCategory};
///
/// let mut catalog = ClipCatalog::empty();
/// catalog.insert(ClipName::new("AxeSpin"), 2.0, ClipHandle(1));
///
/// let key = ScopeKey::category(AttackMode::ModeA, WeaponCategory::Axes);
/// let mut map = ReplacementMap::new();
/// map.insert(ClipName::new("axe_secondary"), ClipName::new("AxeSpin"));
///
/// let mut store = ReplacementMapStore::new();
/// store.load(vec![(key.clone(), map)], &catalog);
///
/// assert_eq!(store.get(&key).map(|m| m.len()), Some(1));
/// // Required scopes always exist, even when not configured.
/// let clubs = ScopeKey::category(AttackMode::ModeB, WeaponCategory::Clubs);
/// assert_eq!(store.get(&clubs).map(|m| m.is_empty()), Some(true));
/// ```
#[derive(Debug, Clone, Default)]
pub struct ReplacementMapStore {
    entries: HashMap<ScopeKey, ScopeEntry>,
    seed_count: u64,
    generation: u64,
}

impl ReplacementMapStore {
    /// Create an empty store. Call [`ReplacementMapStore::load`] before resolving.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the entire table.
    ///
    /// Mappings whose replacement clip is unknown to `clips` are dropped
    /// individually. Every bare mode key and every bare category key is
    /// guaranteed to exist afterwards, possibly empty. Previously seeded
    /// entries are discarded along with everything else.
    pub fn load<I>(&mut self, authored: I, clips: &dyn ClipSource) -> StoreLoadReport
    where
        I: IntoIterator<Item = (ScopeKey, ReplacementMap)>,
    {
        let mut entries: HashMap<ScopeKey, ScopeEntry> = HashMap::new();
        let mut report = StoreLoadReport::default();

        for (scope, map) in authored {
            let mut kept = ReplacementMap::new();
            for (reference, replacement) in map {
                if clips.contains(&replacement) {
                    kept.insert(reference, replacement);
                } else {
                    warn!(
                        scope = %scope,
                        reference = %reference,
                        replacement = %replacement,
                        "replacement clip not supplied by asset loader, mapping skipped"
                    );
                    report.dropped.push(DroppedMapping {
                        scope: scope.clone(),
                        reference,
                        replacement,
                    });
                }
            }

            let entry = entries.entry(scope).or_insert_with(|| {
                report.authored += 1;
                ScopeEntry {
                    map: Arc::new(ReplacementMap::new()),
                    origin: EntryOrigin::Authored,
                }
            });
            Arc::make_mut(&mut entry.map).extend(kept);
        }

        for mode in AttackMode::EXTRA {
            let required = std::iter::once(ScopeKey::bare(mode)).chain(
                WeaponCategory::ALL
                    .into_iter()
                    .map(move |category| ScopeKey::category(mode, category)),
            );
            for scope in required {
                entries.entry(scope).or_insert_with(|| {
                    report.defaulted += 1;
                    ScopeEntry {
                        map: Arc::new(ReplacementMap::new()),
                        origin: EntryOrigin::Defaulted,
                    }
                });
            }
        }

        self.entries = entries;
        self.seed_count = 0;
        self.generation += 1;
        report
    }

    /// The map stored under `scope`, if any.
    pub fn get(&self, scope: &ScopeKey) -> Option<&ReplacementMap> {
        self.entries.get(scope).map(|entry| entry.map.as_ref())
    }

    /// Shared handle to the map stored under `scope`, if any.
    pub fn get_shared(&self, scope: &ScopeKey) -> Option<Arc<ReplacementMap>> {
        self.entries.get(scope).map(|entry| Arc::clone(&entry.map))
    }

    /// Whether the entry under `scope` was authored, defaulted or seeded.
    pub fn origin(&self, scope: &ScopeKey) -> Option<EntryOrigin> {
        self.entries.get(scope).map(|entry| entry.origin)
    }

    /// Returns true if `scope` has an entry, even an empty one.
    pub fn contains(&self, scope: &ScopeKey) -> bool {
        self.entries.contains_key(scope)
    }

    /// Seed `scope` from the first non-empty, non-seeded entry in
    /// `fallback_chain`.
    ///
    /// Does nothing if `scope` already exists (authored or seeded) or if no
    /// candidate in the chain has anything to copy. Returns true if an
    /// entry was inserted.
    ///
    /// Seeded entries are never used as a seed source, so a copy always
    /// reflects configuration and never another lazily made copy.
    pub fn ensure_seeded(&mut self, scope: &ScopeKey, fallback_chain: &[ScopeKey]) -> bool {
        if self.entries.contains_key(scope) {
            return false;
        }

        let source = fallback_chain.iter().find_map(|candidate| {
            self.entries
                .get(candidate)
                .filter(|entry| entry.origin != EntryOrigin::Seeded && !entry.map.is_empty())
                .map(|entry| (candidate, Arc::clone(&entry.map)))
        });

        match source {
            Some((from, map)) => {
                debug!(scope = %scope, from = %from, clips = map.len(), "seeded scope");
                self.entries.insert(
                    scope.clone(),
                    ScopeEntry {
                        map,
                        origin: EntryOrigin::Seeded,
                    },
                );
                self.seed_count += 1;
                true
            }
            None => false,
        }
    }

    /// Number of entries seeded since the last load.
    pub fn seed_count(&self) -> u64 {
        self.seed_count
    }

    /// Incremented by every load; lets callers detect a reload.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over every scope key currently in the store.
    pub fn scopes(&self) -> impl Iterator<Item = &ScopeKey> {
        self.entries.keys()
    }
}
