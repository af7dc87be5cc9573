//! # extra-attacks - Deterministic Extra Attack Mode Engine
//!
//! Resolution and caching engine for player-triggered melee attack variants
//! ("extra modes") layered over a host game's baseline attack:
//! - **Layered** replacement-map lookup (item + off-hand → item → category +
//!   off-hand → category → mode default)
//! - **Cached** override bindings, built once per identity
//! - **Scaled** event timings that keep the designer's intent on clips of
//!   any length
//! - **Separate** cost and cooldown tables
//!
//! ## Core Concepts
//!
//! ### Resolution Pipeline
//!
//! A mode trigger flows through:
//!
//! ```text
//! [EquipmentState + AttackMode] → [ScopeResolver] → [OverrideBindingCache]
//!                               → [TimingProfileResolver] → [CostProfileResolver]
//! ```
//!
//! 1. **Scope resolution** picks the most specific non-empty replacement map
//! 2. **Binding** substitutes reference clips with replacement clips
//! 3. **Timing** scales reference event times to the replacement clip length
//! 4. **Cost** looks up stamina/energy cost and cooldown
//!
//! Missing data at any layer falls through to a default; resolution never
//! fails. Only configuration loading and trigger gating return errors.
//!
//! ## Example
//!
//! ```rust
//! use extra_attacks::*;
//! use extra_attacks::source::ClipCatalog;
//! use extra_attacks::store::ReplacementMap;
//!
//! let catalog: ClipCatalog = [(ClipName::new("AxeSpin"), 2.0)].into_iter().collect();
//!
//! let mut map = ReplacementMap::new();
//! map.insert(ClipName::new("axe_secondary"), ClipName::new("AxeSpin"));
//! let category_key = ScopeKey::category(AttackMode::ModeA, WeaponCategory::Axes);
//!
//! let mut resolver = ScopeResolver::new();
//! resolver.load(vec![(category_key.clone(), map)], &catalog);
//!
//! // No item-specific entry: the category entry applies.
//! let axe = EquippedItem::new("AxeBronze", "Bronze axe", SkillFamily::Axes, false);
//! let resolution = resolver.resolve(&EquipmentState::for_item(&axe), AttackMode::ModeA);
//! assert_eq!(resolution.map.len(), 1);
//! assert_eq!(resolution.scope.specificity(), 3); // seeded item key
//! ```
//!
//! ## Modules
//!
//! - [`ids`] - Interned identifiers
//! - [`weapon`] - Weapon categories, off-hands and attack modes
//! - [`scope`] - Scope keys and the candidate chain
//! - [`context`] - Equipment state passed into resolution
//! - [`source`] - Asset boundary supplying replacement clips
//! - [`oracle`] - Memoized clip lengths
//! - [`store`] - Replacement map storage
//! - [`resolver`] - Scope resolver
//! - [`resolved`] - Scope resolution results
//! - [`binding`] - Override bindings and their cache
//! - [`timing`] - Timing and geometry resolution
//! - [`cost`] - Cost and cooldown resolution
//! - [`exclusion`] - Exclusion list
//! - [`config`] - Configuration documents
//! - [`engine`] - The engine owning every table and cache
//! - [`session`] - Per-entity attack sessions
//! - [`error`] - Error types

pub mod binding;
pub mod config;
pub mod context;
pub mod cost;
pub mod engine;
pub mod error;
pub mod exclusion;
pub mod ids;
pub mod oracle;
pub mod resolved;
pub mod resolver;
pub mod scope;
pub mod session;
pub mod source;
pub mod store;
pub mod timing;
pub mod weapon;

// Re-export main types for convenience
pub use context::EquipmentState;
pub use engine::{AttackEngine, ReloadReport, ResolvedAttack};
pub use error::{ConfigError, TriggerRejection};
pub use ids::{ClipName, ControllerId, EntityId, ItemId};
pub use resolved::ScopeResolution;
pub use resolver::ScopeResolver;
pub use scope::{ScopeKey, ScopeTarget};
pub use session::{AttackSession, AttackState, CombatHost, SessionManager};
pub use weapon::{AttackMode, EquippedItem, OffHand, SkillFamily, WeaponCategory};

// Re-export resolved profiles
pub use cost::CostProfile;
pub use timing::{AttackGeometry, TimingProfile};
