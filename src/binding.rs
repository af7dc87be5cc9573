//! Override bindings and their cache.
//!
//! An [`OverrideBinding`] is what the host runtime installs on a character's
//! animation controller: the base controller plus a finalized table of
//! reference clip → replacement clip substitutions. Building one walks every
//! clip of the base controller, so bindings are built once per distinct
//! identity and served from [`OverrideBindingCache`] afterwards.
//!
//! The cache is single-threaded and uses interior mutability so that a
//! builder which calls back into the cache is caught by the in-progress
//! guard instead of recursing.

use crate::ids::{ClipName, ControllerId, EntityId};
use crate::scope::ScopeKey;
use crate::source::{ClipHandle, ClipSource};
use crate::store::ReplacementMap;
use crate::weapon::AttackMode;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// A base animation controller as exposed by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaseController {
    id: ControllerId,
    clips: Arc<[ClipName]>,
}

impl BaseController {
    /// Create a controller description from its identity and the reference
    /// clips it contains.
    pub fn new(id: impl Into<ControllerId>, clips: impl IntoIterator<Item = ClipName>) -> Self {
        Self {
            id: id.into(),
            clips: clips.into_iter().collect(),
        }
    }

    /// Identity of the controller, part of every cache key.
    pub fn id(&self) -> &ControllerId {
        &self.id
    }

    /// Reference clips the controller plays.
    pub fn clips(&self) -> &[ClipName] {
        &self.clips
    }
}

/// One reference clip replaced by one replacement clip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Substitution {
    pub reference: ClipName,
    pub replacement: ClipName,
    pub handle: ClipHandle,
}

/// A finalized set of substitutions over a base controller.
///
/// Consumers only ever hold `Arc<OverrideBinding>` handles; a binding is
/// never mutated after construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverrideBinding {
    controller: ControllerId,
    scope: ScopeKey,
    substitutions: Vec<Substitution>,
}

impl OverrideBinding {
    /// A binding that substitutes nothing.
    pub fn passthrough(base: &BaseController, scope: ScopeKey) -> Self {
        Self {
            controller: base.id.clone(),
            scope,
            substitutions: Vec::new(),
        }
    }

    /// Build from explicit substitutions; they are kept sorted by reference clip.
    pub fn with_substitutions(
        base: &BaseController,
        scope: ScopeKey,
        mut substitutions: Vec<Substitution>,
    ) -> Self {
        substitutions.sort_by(|a, b| a.reference.cmp(&b.reference));
        Self {
            controller: base.id.clone(),
            scope,
            substitutions,
        }
    }

    /// Controller this binding was built over.
    pub fn controller(&self) -> &ControllerId {
        &self.controller
    }

    /// The scope whose map this binding was built from.
    pub fn scope(&self) -> &ScopeKey {
        &self.scope
    }

    /// Clip substitutions, in controller order.
    pub fn substitutions(&self) -> &[Substitution] {
        &self.substitutions
    }

    /// The substitution for `reference`, if this binding replaces it.
    pub fn replacement_for(&self, reference: &ClipName) -> Option<&Substitution> {
        self.substitutions
            .binary_search_by(|s| s.reference.cmp(reference))
            .ok()
            .map(|idx| &self.substitutions[idx])
    }

    /// Returns true if nothing is substituted.
    pub fn is_passthrough(&self) -> bool {
        self.substitutions.is_empty()
    }
}

/// Which hand's weapon a binding was resolved for.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub enum WeaponSlot {
    MainHand,
    /// A two-handed weapon occupying both hands.
    BothHands,
}

/// Cache identity of a binding.
///
/// Includes the owning entity and weapon slot so that two entities, or two
/// base controllers, never share a slot.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub struct BindingIdentity {
    pub owner: EntityId,
    pub slot: WeaponSlot,
    pub controller: ControllerId,
    pub mode: AttackMode,
    pub scope: ScopeKey,
}

/// Constructs bindings from a base controller and a replacement map.
pub trait BindingBuilder {
    fn build(&self, base: &BaseController, scope: &ScopeKey, map: &ReplacementMap) -> OverrideBinding;
}

/// Default builder: substitutes every base clip the map replaces, looking up
/// replacement handles in a [`ClipSource`].
///
/// Replacements without a handle are left out, so the original clip keeps
/// playing.
pub struct ClipSubstitutionBuilder<'a> {
    clips: &'a dyn ClipSource,
}

impl<'a> ClipSubstitutionBuilder<'a> {
    /// Create a builder reading clip handles from `clips`.
    pub fn new(clips: &'a dyn ClipSource) -> Self {
        Self { clips }
    }
}

impl BindingBuilder for ClipSubstitutionBuilder<'_> {
    fn build(&self, base: &BaseController, scope: &ScopeKey, map: &ReplacementMap) -> OverrideBinding {
        let substitutions = base
            .clips()
            .iter()
            .filter_map(|reference| {
                let replacement = map.get(reference)?;
                let handle = self.clips.clip_handle(replacement)?;
                Some(Substitution {
                    reference: reference.clone(),
                    replacement: replacement.clone(),
                    handle,
                })
            })
            .collect();
        OverrideBinding::with_substitutions(base, scope.clone(), substitutions)
    }
}

struct BuildGuard<'a>(&'a Cell<bool>);

impl Drop for BuildGuard<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

/// Write-once, read-many cache of override bindings.
///
/// # Examples
///
/// ```rust
/// use extra_attacks::binding::{
///     BaseController, BindingIdentity, ClipSubstitutionBuilder, OverrideBindingCache, WeaponSlot,
/// };
/// use extra_attacks::source::ClipCatalog;
/// use extra_attacks::store::ReplacementMap;
/// use extra_attacks::*;
/// use std::sync::Arc;
///
/// let catalog = ClipCatalog::empty();
/// let builder = ClipSubstitutionBuilder::new(&catalog);
/// let base = BaseController::new("player", vec![ClipName::new("axe_secondary")]);
/// let identity = BindingIdentity {
///     owner: EntityId(1),
///     slot: WeaponSlot::MainHand,
///     controller: base.id().clone(),
///     mode: AttackMode::ModeA,
///     scope: ScopeKey::bare(AttackMode::ModeA),
/// };
///
/// let cache = OverrideBindingCache::new();
/// let first = cache.get_or_build(&identity, &ReplacementMap::new(), &base, &builder);
/// let second = cache.get_or_build(&identity, &ReplacementMap::new(), &base, &builder);
///
/// assert!(first.is_passthrough());
/// assert!(Arc::ptr_eq(&first, &second));
/// assert_eq!(cache.build_count(), 1);
/// ```
#[derive(Debug, Default)]
pub struct OverrideBindingCache {
    entries: RefCell<HashMap<BindingIdentity, Arc<OverrideBinding>>>,
    baseline: RefCell<Option<BindingIdentity>>,
    building: Cell<bool>,
    builds: Cell<u64>,
    reentrant_rejections: Cell<u64>,
}

impl OverrideBindingCache {
    /// Create an empty cache with no baseline.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached binding for `identity`, building it on first demand.
    ///
    /// A cached binding is returned as-is even if `map` has changed since it
    /// was built; call [`OverrideBindingCache::invalidate_all`] after a
    /// configuration reload. An empty `map` yields a passthrough binding
    /// without invoking `builder`.
    ///
    /// If called while another build is in progress, returns an uncached
    /// passthrough binding and logs a warning.
    pub fn get_or_build(
        &self,
        identity: &BindingIdentity,
        map: &ReplacementMap,
        base: &BaseController,
        builder: &dyn BindingBuilder,
    ) -> Arc<OverrideBinding> {
        if let Some(existing) = self.entries.borrow().get(identity) {
            return Arc::clone(existing);
        }

        if self.building.get() {
            self.reentrant_rejections.set(self.reentrant_rejections.get() + 1);
            warn!(
                scope = %identity.scope,
                controller = %identity.controller,
                "re-entrant binding construction, returning passthrough"
            );
            return Arc::new(OverrideBinding::passthrough(base, identity.scope.clone()));
        }

        let binding = {
            self.building.set(true);
            let _guard = BuildGuard(&self.building);
            if map.is_empty() {
                OverrideBinding::passthrough(base, identity.scope.clone())
            } else {
                builder.build(base, &identity.scope, map)
            }
        };
        self.builds.set(self.builds.get() + 1);
        debug!(
            scope = %identity.scope,
            owner = %identity.owner,
            substitutions = binding.substitutions().len(),
            "built override binding"
        );

        let binding = Arc::new(binding);
        self.entries
            .borrow_mut()
            .insert(identity.clone(), Arc::clone(&binding));
        binding
    }

    /// The cached binding for `identity`, without building.
    pub fn get(&self, identity: &BindingIdentity) -> Option<Arc<OverrideBinding>> {
        self.entries.borrow().get(identity).cloned()
    }

    /// Mark `identity` as the baseline binding preserved across invalidation.
    pub fn designate_baseline(&self, identity: BindingIdentity) {
        *self.baseline.borrow_mut() = Some(identity);
    }

    /// The identity currently designated as baseline, if any.
    pub fn baseline(&self) -> Option<BindingIdentity> {
        self.baseline.borrow().clone()
    }

    /// Drop every cached binding.
    ///
    /// With `preserve_baseline` the designated baseline entry survives;
    /// otherwise the designation is cleared too.
    pub fn invalidate_all(&self, preserve_baseline: bool) {
        let mut entries = self.entries.borrow_mut();
        let baseline = self.baseline.borrow().clone();
        match baseline {
            Some(baseline) if preserve_baseline => entries.retain(|identity, _| *identity == baseline),
            _ => {
                entries.clear();
                *self.baseline.borrow_mut() = None;
            }
        }
        debug!(remaining = entries.len(), "invalidated override bindings");
    }

    /// Drop every binding owned by `owner`.
    ///
    /// If `owner` holds the designated baseline, the designation is cleared
    /// as well.
    pub fn evict_owner(&self, owner: EntityId) {
        self.entries.borrow_mut().retain(|identity, _| identity.owner != owner);
        let mut baseline = self.baseline.borrow_mut();
        if baseline.as_ref().is_some_and(|identity| identity.owner == owner) {
            *baseline = None;
        }
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    /// Number of bindings constructed (passthrough or built) and cached.
    pub fn build_count(&self) -> u64 {
        self.builds.get()
    }

    /// Number of construction attempts refused by the in-progress guard.
    pub fn reentrant_rejections(&self) -> u64 {
        self.reentrant_rejections.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::ClipCatalog;
    use crate::weapon::WeaponCategory;
    use std::rc::Rc;

    fn base() -> BaseController {
        BaseController::new(
            "humanoid",
            vec![
                ClipName::new("sword_secondary"),
                ClipName::new("sword_attack"),
                ClipName::new("block"),
            ],
        )
    }

    fn identity(owner: u64, mode: AttackMode) -> BindingIdentity {
        BindingIdentity {
            owner: EntityId(owner),
            slot: WeaponSlot::MainHand,
            controller: ControllerId::new("humanoid"),
            mode,
            scope: ScopeKey::category(mode, WeaponCategory::Swords),
        }
    }

    fn sword_map() -> ReplacementMap {
        let mut map = ReplacementMap::new();
        map.insert(ClipName::new("sword_secondary"), ClipName::new("Flurry"));
        map.insert(ClipName::new("not_in_controller"), ClipName::new("Flurry"));
        map
    }

    fn catalog() -> ClipCatalog {
        vec![(ClipName::new("Flurry"), 1.9)].into_iter().collect()
    }

    struct CountingBuilder {
        calls: Cell<u32>,
    }

    impl BindingBuilder for CountingBuilder {
        fn build(&self, base: &BaseController, scope: &ScopeKey, _map: &ReplacementMap) -> OverrideBinding {
            self.calls.set(self.calls.get() + 1);
            OverrideBinding::passthrough(base, scope.clone())
        }
    }

    #[test]
    fn test_builder_substitutes_only_controller_clips() {
        let catalog = catalog();
        let builder = ClipSubstitutionBuilder::new(&catalog);
        let binding = builder.build(&base(), &identity(1, AttackMode::ModeA).scope, &sword_map());

        assert_eq!(binding.substitutions().len(), 1);
        let sub = binding.replacement_for(&ClipName::new("sword_secondary")).unwrap();
        assert_eq!(sub.replacement, ClipName::new("Flurry"));
        assert!(binding.replacement_for(&ClipName::new("block")).is_none());
    }

    #[test]
    fn test_builder_skips_replacements_without_handle() {
        let catalog = ClipCatalog::empty();
        let builder = ClipSubstitutionBuilder::new(&catalog);
        let binding = builder.build(&base(), &identity(1, AttackMode::ModeA).scope, &sword_map());
        assert!(binding.is_passthrough());
    }

    #[test]
    fn test_second_lookup_is_cached() {
        let cache = OverrideBindingCache::new();
        let builder = CountingBuilder { calls: Cell::new(0) };
        let id = identity(1, AttackMode::ModeA);

        let first = cache.get_or_build(&id, &sword_map(), &base(), &builder);
        let second = cache.get_or_build(&id, &sword_map(), &base(), &builder);

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(builder.calls.get(), 1);
        assert_eq!(cache.build_count(), 1);
    }

    #[test]
    fn test_empty_map_never_invokes_builder() {
        let cache = OverrideBindingCache::new();
        let builder = CountingBuilder { calls: Cell::new(0) };
        let binding = cache.get_or_build(&identity(1, AttackMode::ModeB), &ReplacementMap::new(), &base(), &builder);

        assert!(binding.is_passthrough());
        assert_eq!(binding.controller(), &ControllerId::new("humanoid"));
        assert_eq!(builder.calls.get(), 0);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_different_owners_do_not_collide() {
        let cache = OverrideBindingCache::new();
        let builder = CountingBuilder { calls: Cell::new(0) };

        let a = cache.get_or_build(&identity(1, AttackMode::ModeA), &sword_map(), &base(), &builder);
        let b = cache.get_or_build(&identity(2, AttackMode::ModeA), &sword_map(), &base(), &builder);

        assert!(!Arc::ptr_eq(&a, &b));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_invalidate_preserves_baseline() {
        let cache = OverrideBindingCache::new();
        let builder = CountingBuilder { calls: Cell::new(0) };
        let baseline = identity(1, AttackMode::Normal);
        let other = identity(1, AttackMode::ModeA);

        let kept = cache.get_or_build(&baseline, &ReplacementMap::new(), &base(), &builder);
        cache.designate_baseline(baseline.clone());
        cache.get_or_build(&other, &sword_map(), &base(), &builder);
        assert_eq!(cache.len(), 2);

        cache.invalidate_all(true);
        assert_eq!(cache.len(), 1);
        assert!(Arc::ptr_eq(&cache.get(&baseline).unwrap(), &kept));

        cache.get_or_build(&other, &sword_map(), &base(), &builder);
        assert_eq!(builder.calls.get(), 2);

        cache.invalidate_all(false);
        assert!(cache.is_empty());
        assert_eq!(cache.baseline(), None);
    }

    #[test]
    fn test_evict_owner_keeps_others() {
        let cache = OverrideBindingCache::new();
        let builder = CountingBuilder { calls: Cell::new(0) };
        cache.get_or_build(&identity(1, AttackMode::ModeA), &sword_map(), &base(), &builder);
        cache.get_or_build(&identity(2, AttackMode::ModeA), &sword_map(), &base(), &builder);

        cache.evict_owner(EntityId(1));
        assert_eq!(cache.len(), 1);
        assert!(cache.get(&identity(2, AttackMode::ModeA)).is_some());
    }

    #[test]
    fn test_evict_owner_releases_baseline() {
        let cache = OverrideBindingCache::new();
        let builder = CountingBuilder { calls: Cell::new(0) };
        let baseline = identity(7, AttackMode::Normal);
        cache.get_or_build(&baseline, &ReplacementMap::new(), &base(), &builder);
        cache.designate_baseline(baseline);

        cache.evict_owner(EntityId(7));
        assert!(cache.is_empty());
        assert_eq!(cache.baseline(), None);
    }

    struct ReentrantBuilder {
        cache: Rc<OverrideBindingCache>,
        inner: RefCell<Option<Arc<OverrideBinding>>>,
    }

    impl BindingBuilder for ReentrantBuilder {
        fn build(&self, base: &BaseController, scope: &ScopeKey, map: &ReplacementMap) -> OverrideBinding {
            let nested = self.cache.get_or_build(&identity(9, AttackMode::ModeC), map, base, self);
            *self.inner.borrow_mut() = Some(nested);
            OverrideBinding::passthrough(base, scope.clone())
        }
    }

    #[test]
    fn test_reentrant_build_returns_passthrough() {
        let cache = Rc::new(OverrideBindingCache::new());
        let builder = ReentrantBuilder {
            cache: Rc::clone(&cache),
            inner: RefCell::new(None),
        };

        cache.get_or_build(&identity(1, AttackMode::ModeA), &sword_map(), &base(), &builder);

        let nested = builder.inner.borrow().clone().unwrap();
        assert!(nested.is_passthrough());
        assert_eq!(cache.reentrant_rejections(), 1);
        // Only the outer binding was cached.
        assert_eq!(cache.len(), 1);
        assert!(cache.get(&identity(9, AttackMode::ModeC)).is_none());
    }
}
