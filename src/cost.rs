//! Resource cost and cooldown resolution.
//!
//! Costs and cooldowns live in two structurally separate sub-tables. A cost
//! is a base value the host later runs through its own skill and equipment
//! modifiers; a cooldown is fixed policy and is never modified.

use crate::weapon::{AttackMode, WeaponCategory};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Base stamina and energy cost of one extra attack.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceCost {
    pub stamina: f32,
    pub energy: f32,
}

/// Resolved cost and cooldown for a category and mode.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CostProfile {
    pub stamina_cost: f32,
    pub energy_cost: f32,
    pub cooldown_seconds: f32,
}

impl CostProfile {
    /// Apply external cost multipliers.
    ///
    /// Only stamina and energy are scaled; the cooldown is returned as-is.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use extra_attacks::cost::CostProfile;
    ///
    /// let base = CostProfile { stamina_cost: 30.0, energy_cost: 10.0, cooldown_seconds: 5.0 };
    /// let modified = base.with_modifiers(0.5, 2.0);
    /// assert_eq!(modified.stamina_cost, 15.0);
    /// assert_eq!(modified.energy_cost, 20.0);
    /// assert_eq!(modified.cooldown_seconds, 5.0);
    /// ```
    pub fn with_modifiers(self, stamina_multiplier: f32, energy_multiplier: f32) -> Self {
        Self {
            stamina_cost: (self.stamina_cost * stamina_multiplier).max(0.0),
            energy_cost: (self.energy_cost * energy_multiplier).max(0.0),
            cooldown_seconds: self.cooldown_seconds,
        }
    }
}

/// Cost and cooldown sub-tables with their defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct CostTable {
    pub costs: HashMap<(WeaponCategory, AttackMode), ResourceCost>,
    pub default_cost: ResourceCost,
    pub cooldowns: HashMap<(WeaponCategory, AttackMode), f32>,
    pub default_cooldown: f32,
}

impl CostTable {
    /// A table holding only the given defaults.
    pub fn with_defaults(default_cost: ResourceCost, default_cooldown: f32) -> Self {
        Self {
            costs: HashMap::new(),
            default_cost,
            cooldowns: HashMap::new(),
            default_cooldown,
        }
    }

    /// Built-in balance values.
    pub fn builtin() -> Self {
        let mut table = Self::with_defaults(
            ResourceCost {
                stamina: 20.0,
                energy: 0.0,
            },
            2.0,
        );

        let heavy = [
            (WeaponCategory::GreatSwords, AttackMode::ModeB, 35.0, 6.0),
            (WeaponCategory::BattleAxes, AttackMode::ModeB, 38.0, 6.0),
            (WeaponCategory::Sledges, AttackMode::ModeB, 40.0, 8.0),
            (WeaponCategory::Polearms, AttackMode::ModeC, 30.0, 5.0),
        ];
        for (category, mode, stamina, cooldown) in heavy {
            table.costs.insert(
                (category, mode),
                ResourceCost {
                    stamina,
                    energy: 0.0,
                },
            );
            table.cooldowns.insert((category, mode), cooldown);
        }
        table
    }

    /// Stamina and energy cost, falling back to the default entry.
    pub fn cost(&self, category: WeaponCategory, mode: AttackMode) -> ResourceCost {
        self.costs
            .get(&(category, mode))
            .copied()
            .unwrap_or(self.default_cost)
    }

    /// Cooldown in seconds, falling back to the default cooldown.
    pub fn cooldown(&self, category: WeaponCategory, mode: AttackMode) -> f32 {
        self.cooldowns
            .get(&(category, mode))
            .copied()
            .unwrap_or(self.default_cooldown)
    }
}

impl Default for CostTable {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Resolves [`CostProfile`]s: exact `(category, mode)` entry, else default.
///
/// # Examples
///
/// ```rust
/// use extra_attacks::cost::CostProfileResolver;
/// use extra_attacks::{AttackMode, WeaponCategory};
///
/// let resolver = CostProfileResolver::default();
/// let heavy = resolver.resolve(WeaponCategory::GreatSwords, AttackMode::ModeB);
/// assert_eq!(heavy.stamina_cost, 35.0);
///
/// let plain = resolver.resolve(WeaponCategory::Knives, AttackMode::ModeA);
/// assert_eq!(plain.stamina_cost, 20.0);
/// ```
#[derive(Debug, Clone, Default)]
pub struct CostProfileResolver {
    table: CostTable,
}

impl CostProfileResolver {
    /// Create a resolver over `table`.
    pub fn new(table: CostTable) -> Self {
        Self { table }
    }

    /// The table in use.
    pub fn table(&self) -> &CostTable {
        &self.table
    }

    /// Swap the table after a reload.
    pub fn replace_table(&mut self, table: CostTable) {
        self.table = table;
    }

    /// Resolve the cost profile for `category` and `mode`.
    pub fn resolve(&self, category: WeaponCategory, mode: AttackMode) -> CostProfile {
        let cost = self.table.cost(category, mode);
        CostProfile {
            stamina_cost: cost.stamina,
            energy_cost: cost.energy,
            cooldown_seconds: self.table.cooldown(category, mode),
        }
    }
}
