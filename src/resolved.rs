//! Scope resolution results.
//!
//! Contains the [`ScopeResolution`] type: the scope key a lookup settled on,
//! the map found there, and the full trail of candidates probed on the way.

use crate::scope::ScopeKey;
use crate::store::ReplacementMap;
use std::sync::Arc;

/// Outcome of probing a single candidate key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Probe {
    /// No entry exists under this key.
    Missing,
    /// An entry exists but has no substitutions; skipped.
    Empty,
    /// The lookup settled here.
    Hit,
}

/// Result of resolving the replacement map for an equipment state and mode.
///
/// A resolution always names a scope key. When nothing in the hierarchy
/// has substitutions it names the bare mode key with an empty map, and
/// callers treat that as "no override available".
///
/// # Examples
///
/// ```rust
/// use extra_attacks::resolved::{Probe, ScopeResolution};
/// use extra_attacks::store::ReplacementMap;
/// use extra_attacks::{AttackMode, ScopeKey};
/// use std::sync::Arc;
///
/// let mut resolution = ScopeResolution::new(
///     ScopeKey::bare(AttackMode::ModeA),
///     Arc::new(ReplacementMap::new()),
/// );
/// resolution.add_probe(ScopeKey::bare(AttackMode::ModeA), Probe::Empty);
///
/// assert!(resolution.is_passthrough());
/// assert_eq!(resolution.probes.len(), 1);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ScopeResolution {
    /// The key the lookup settled on.
    pub scope: ScopeKey,

    /// The substitutions stored under `scope`.
    pub map: Arc<ReplacementMap>,

    /// Every candidate probed, in probe order.
    pub probes: Vec<(ScopeKey, Probe)>,

    /// True if this resolution seeded a new entry in the store.
    pub seeded: bool,
}

impl ScopeResolution {
    /// A resolution with an empty probe trail.
    pub fn new(scope: ScopeKey, map: Arc<ReplacementMap>) -> Self {
        Self {
            scope,
            map,
            probes: Vec::new(),
            seeded: false,
        }
    }

    /// Record a probed candidate.
    pub fn add_probe(&mut self, scope: ScopeKey, probe: Probe) {
        self.probes.push((scope, probe));
    }

    /// True if no substitution applies.
    pub fn is_passthrough(&self) -> bool {
        self.map.is_empty()
    }

    /// Human-readable probe trail, e.g. `ModeA_AxeIron(missing) -> ModeA_Axes(hit)`.
    pub fn trail(&self) -> String {
        self.probes
            .iter()
            .map(|(scope, probe)| {
                let outcome = match probe {
                    Probe::Missing => "missing",
                    Probe::Empty => "empty",
                    Probe::Hit => "hit",
                };
                format!("{}({})", scope, outcome)
            })
            .collect::<Vec<_>>()
            .join(" -> ")
    }
}
