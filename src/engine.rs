//! The attack engine.
//!
//! [`AttackEngine`] owns every table and cache: the replacement-map store
//! (through [`ScopeResolver`]), the clip length oracle, the override binding
//! cache, and the timing, cost and exclusion tables. It is the explicit
//! context object handed to sessions; nothing here is global.

use crate::binding::{
    BaseController, BindingIdentity, ClipSubstitutionBuilder, OverrideBinding, OverrideBindingCache,
    WeaponSlot,
};
use crate::config::{self, ConfigSet};
use crate::context::EquipmentState;
use crate::cost::{CostProfile, CostProfileResolver};
use crate::error::ConfigError;
use crate::exclusion::ExclusionList;
use crate::ids::EntityId;
use crate::oracle::ClipLengthOracle;
use crate::resolved::ScopeResolution;
use crate::resolver::ScopeResolver;
use crate::scope::{ScopeKey, TargetKind};
use crate::source::ClipSource;
use crate::store::{ReplacementMap, StoreLoadReport};
use crate::timing::{TimingProfile, TimingProfileResolver};
use crate::weapon::{AttackMode, EquippedItem, WeaponCategory};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Everything resolved for one attack.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedAttack {
    pub mode: AttackMode,
    pub category: WeaponCategory,
    pub resolution: ScopeResolution,
    pub binding: Arc<OverrideBinding>,
    pub timing: TimingProfile,
    pub cost: CostProfile,
}

/// What happened to one document during a reload.
#[derive(Debug, Clone, PartialEq)]
pub enum DocumentOutcome {
    /// The document (or its built-in stand-in) replaced the previous table.
    Applied,
    /// The document was rejected; the previous table is still in use.
    Retained(ConfigError),
}

impl DocumentOutcome {
    /// Returns true if the document replaced the previous table.
    pub fn is_applied(&self) -> bool {
        matches!(self, DocumentOutcome::Applied)
    }
}

/// Per-document result of [`AttackEngine::reload`].
#[derive(Debug, Clone, PartialEq)]
pub struct ReloadReport {
    pub categories: DocumentOutcome,
    pub items: DocumentOutcome,
    /// Result of rebuilding the store from the last good replacement
    /// documents.
    pub store: StoreLoadReport,
    pub timing: DocumentOutcome,
    pub costs: DocumentOutcome,
    pub exclusions: DocumentOutcome,
}

impl ReloadReport {
    /// True if every document was applied.
    pub fn is_clean(&self) -> bool {
        self.outcomes().all(DocumentOutcome::is_applied)
    }

    /// Errors of the rejected documents.
    pub fn errors(&self) -> impl Iterator<Item = &ConfigError> {
        self.outcomes().filter_map(|outcome| match outcome {
            DocumentOutcome::Retained(err) => Some(err),
            DocumentOutcome::Applied => None,
        })
    }

    fn outcomes(&self) -> impl Iterator<Item = &DocumentOutcome> {
        [&self.categories, &self.items, &self.timing, &self.costs, &self.exclusions].into_iter()
    }
}

/// Owns the resolution tables and caches.
///
/// # Examples
///
/// ```rust
/// use extra_attacks::binding::{BaseController, WeaponSlot};
/// use extra_attacks::config::{ConfigSet, DocumentSource};
/// use extra_attacks::engine::AttackEngine;
/// use extra_attacks::error::DocumentKind;
/// use extra_attacks::source::ClipCatalog;
/// use extra_attacks::*;
/// use std::sync::Arc;
///
/// let catalog: ClipCatalog = [(ClipName::new("AxeSpin"), 2.0)].into_iter().collect();
/// let mut engine = AttackEngine::new(Arc::new(catalog));
///
/// let categories = DocumentSource::toml(
///     DocumentKind::Categories,
///     "[ModeA_Axes]\naxe_secondary = \"AxeSpin\"\n",
/// );
/// let report = engine.reload(&ConfigSet::new().with(categories));
/// assert!(report.is_clean());
///
/// let base = BaseController::new("player", vec![ClipName::new("axe_secondary")]);
/// let state = EquipmentState::new(WeaponCategory::Axes);
/// let attack = engine.resolve_attack(EntityId(1), WeaponSlot::MainHand, &base, &state, AttackMode::ModeA);
///
/// assert_eq!(attack.binding.substitutions().len(), 1);
/// // Built-in axe reference: impact at 1.122s of 1.4s, scaled to 2.0s.
/// assert!((attack.timing.hit_time - 1.6029).abs() < 1e-3);
/// ```
pub struct AttackEngine {
    resolver: ScopeResolver,
    /// Last good entries of each replacement document.
    category_entries: Vec<(ScopeKey, ReplacementMap)>,
    item_entries: Vec<(ScopeKey, ReplacementMap)>,
    clips: Arc<dyn ClipSource>,
    oracle: ClipLengthOracle,
    bindings: OverrideBindingCache,
    timing: TimingProfileResolver,
    costs: CostProfileResolver,
    exclusions: ExclusionList,
}

impl AttackEngine {
    /// Create an engine with built-in timing and costs and no replacement
    /// maps. Every extra mode resolves to a passthrough until
    /// [`AttackEngine::reload`] supplies configuration.
    pub fn new(clips: Arc<dyn ClipSource>) -> Self {
        let mut resolver = ScopeResolver::new();
        resolver.load(Vec::<(ScopeKey, ReplacementMap)>::new(), clips.as_ref());
        Self {
            resolver,
            category_entries: Vec::new(),
            item_entries: Vec::new(),
            clips,
            oracle: ClipLengthOracle::new(),
            bindings: OverrideBindingCache::new(),
            timing: TimingProfileResolver::default(),
            costs: CostProfileResolver::default(),
            exclusions: ExclusionList::default(),
        }
    }

    /// Create an engine and load `config` into it.
    pub fn with_config(clips: Arc<dyn ClipSource>, config: &ConfigSet) -> (Self, ReloadReport) {
        let mut engine = Self::new(clips);
        let report = engine.reload(config);
        (engine, report)
    }

    /// The scope resolver and the replacement-map store behind it.
    pub fn resolver(&self) -> &ScopeResolver {
        &self.resolver
    }

    /// The override binding cache.
    pub fn bindings(&self) -> &OverrideBindingCache {
        &self.bindings
    }

    /// The clip length memo.
    pub fn oracle(&self) -> &ClipLengthOracle {
        &self.oracle
    }

    /// The timing resolver and its table.
    pub fn timing(&self) -> &TimingProfileResolver {
        &self.timing
    }

    /// The cost resolver and its table.
    pub fn costs(&self) -> &CostProfileResolver {
        &self.costs
    }

    pub fn exclusions(&self) -> &ExclusionList {
        &self.exclusions
    }

    /// The asset boundary currently supplying replacement clips.
    pub fn clips(&self) -> &dyn ClipSource {
        self.clips.as_ref()
    }

    /// Swap in a refreshed asset catalog.
    ///
    /// The store is rebuilt from the last good replacement documents so
    /// entries naming newly shipped (or withdrawn) clips are re-checked.
    /// Memoized lengths and every cached binding except the baseline are
    /// dropped.
    pub fn replace_clips(&mut self, clips: Arc<dyn ClipSource>) -> StoreLoadReport {
        self.clips = clips;
        let report = self.rebuild_store();
        self.oracle.clear();
        self.bindings.invalidate_all(true);
        info!(
            scopes = self.resolver.store().len(),
            dropped = report.dropped.len(),
            "clip catalog replaced"
        );
        report
    }

    fn rebuild_store(&mut self) -> StoreLoadReport {
        let entries = self.category_entries.iter().chain(&self.item_entries).cloned();
        self.resolver.load(entries, self.clips.as_ref())
    }

    /// Returns true if extra modes are disabled for `item`.
    pub fn is_excluded(&self, item: &EquippedItem) -> bool {
        self.exclusions.excludes(item)
    }

    /// Cost and cooldown for `category` and `mode`.
    pub fn cost(&self, category: WeaponCategory, mode: AttackMode) -> CostProfile {
        self.costs.resolve(category, mode)
    }

    /// The passthrough binding installed when no extra attack is active.
    ///
    /// Built once per owner and controller, and designated as the cache
    /// baseline so it survives [`AttackEngine::reload`].
    pub fn baseline_binding(&self, owner: EntityId, base: &BaseController) -> Arc<OverrideBinding> {
        let identity = BindingIdentity {
            owner,
            slot: WeaponSlot::MainHand,
            controller: base.id().clone(),
            mode: AttackMode::Normal,
            scope: ScopeKey::bare(AttackMode::Normal),
        };
        let builder = ClipSubstitutionBuilder::new(self.clips.as_ref());
        let binding = self
            .bindings
            .get_or_build(&identity, &ReplacementMap::new(), base, &builder);
        self.bindings.designate_baseline(identity);
        binding
    }

    /// Resolve the binding, timing and cost of an attack.
    ///
    /// Never fails; missing data at any layer falls through to defaults.
    /// `Normal` always yields the baseline passthrough binding.
    pub fn resolve_attack(
        &mut self,
        owner: EntityId,
        slot: WeaponSlot,
        base: &BaseController,
        state: &EquipmentState,
        mode: AttackMode,
    ) -> ResolvedAttack {
        let category = state.category;

        if !mode.is_extra() {
            let binding = self.baseline_binding(owner, base);
            let scope = ScopeKey::bare(AttackMode::Normal);
            return ResolvedAttack {
                mode,
                category,
                resolution: ScopeResolution::new(scope, Arc::new(ReplacementMap::new())),
                binding,
                timing: self.timing.resolve(category, mode, self.reference_length(category)),
                cost: CostProfile {
                    stamina_cost: 0.0,
                    energy_cost: 0.0,
                    cooldown_seconds: 0.0,
                },
            };
        }

        let resolution = self.resolver.resolve(state, mode);
        debug!(
            owner = %owner,
            mode = %mode,
            scope = %resolution.scope,
            trail = %resolution.trail(),
            "resolved replacement scope"
        );

        let identity = BindingIdentity {
            owner,
            slot,
            controller: base.id().clone(),
            mode,
            scope: resolution.scope.clone(),
        };
        let builder = ClipSubstitutionBuilder::new(self.clips.as_ref());
        let binding = self
            .bindings
            .get_or_build(&identity, &resolution.map, base, &builder);

        let clip_length = self.replacement_length(category, &resolution.map);
        let timing = self.timing.resolve(category, mode, clip_length);
        let cost = self.costs.resolve(category, mode);

        ResolvedAttack {
            mode,
            category,
            resolution,
            binding,
            timing,
            cost,
        }
    }

    /// Length of the clip that will actually play for the category's
    /// secondary attack: the replacement if the map replaces it, otherwise
    /// the reference clip itself. Zero when unknown.
    fn replacement_length(&mut self, category: WeaponCategory, map: &ReplacementMap) -> f32 {
        let replacement = self
            .timing
            .table()
            .secondary_clip(category)
            .and_then(|reference| map.get(reference))
            .cloned();

        match replacement {
            Some(clip) => self.oracle.length(self.clips.as_ref(), &clip).unwrap_or(0.0),
            None => self.reference_length(category),
        }
    }

    fn reference_length(&self, category: WeaponCategory) -> f32 {
        self.timing
            .table()
            .reference(category)
            .map(|profile| profile.length)
            .unwrap_or(0.0)
    }

    /// Reload every configuration document.
    ///
    /// Each document is applied independently: one that fails to parse or
    /// validate leaves its previous table in place. The store is then
    /// rebuilt from the last good categories and items entries, which also
    /// discards lazily seeded keys. Afterwards the length memo is cleared
    /// and every cached binding except the baseline is dropped, so item
    /// entries are re-seeded lazily from the new data.
    pub fn reload(&mut self, config: &ConfigSet) -> ReloadReport {
        let categories = match config::load_replacements(config.categories.as_ref(), TargetKind::Category) {
            Ok(entries) => {
                self.category_entries = entries;
                DocumentOutcome::Applied
            }
            Err(err) => retain(err),
        };

        let items = match config::load_replacements(config.items.as_ref(), TargetKind::Item) {
            Ok(entries) => {
                self.item_entries = entries;
                DocumentOutcome::Applied
            }
            Err(err) => retain(err),
        };

        let store = self.rebuild_store();

        let timing = match config::load_timing(config.timing.as_ref()) {
            Ok(table) => {
                self.timing.replace_table(table);
                DocumentOutcome::Applied
            }
            Err(err) => retain(err),
        };

        let costs = match config::load_costs(config.costs.as_ref()) {
            Ok(table) => {
                self.costs.replace_table(table);
                DocumentOutcome::Applied
            }
            Err(err) => retain(err),
        };

        let exclusions = match config::load_exclusions(config.exclusions.as_ref()) {
            Ok(list) => {
                self.exclusions = list;
                DocumentOutcome::Applied
            }
            Err(err) => retain(err),
        };

        self.oracle.clear();
        self.bindings.invalidate_all(true);

        let report = ReloadReport {
            categories,
            items,
            store,
            timing,
            costs,
            exclusions,
        };
        info!(
            scopes = self.resolver.store().len(),
            dropped = report.store.dropped.len(),
            rejected = report.errors().count(),
            generation = self.resolver.store().generation(),
            "configuration reloaded"
        );
        report
    }
}

fn retain(err: ConfigError) -> DocumentOutcome {
    warn!(error = %err, "keeping previous table");
    DocumentOutcome::Retained(err)
}
