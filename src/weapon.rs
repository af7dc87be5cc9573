//! Weapon classification and attack modes.
//!
//! A weapon's [`WeaponCategory`] is derived once from its skill family and
//! handedness; it never changes for a given item. [`AttackMode`] is the
//! closed set of selectable attack variants, so an unsupported mode cannot
//! be named at all.

use crate::ids::ItemId;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Skill family a weapon trains, as reported by the host.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SkillFamily {
    Swords,
    Axes,
    Clubs,
    Spears,
    Polearms,
    Knives,
    Unarmed,
}

/// Canonical weapon classification used as a lookup dimension by every table.
///
/// # Examples
///
/// ```rust
/// use extra_attacks::{SkillFamily, WeaponCategory};
///
/// assert_eq!(WeaponCategory::derive(SkillFamily::Swords, false), WeaponCategory::Swords);
/// assert_eq!(WeaponCategory::derive(SkillFamily::Swords, true), WeaponCategory::GreatSwords);
/// ```
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum WeaponCategory {
    Swords,
    GreatSwords,
    Axes,
    BattleAxes,
    Clubs,
    Sledges,
    Spears,
    Polearms,
    Knives,
    DualKnives,
    Fists,
}

impl WeaponCategory {
    /// Every supported category, in declaration order.
    pub const ALL: [WeaponCategory; 11] = [
        WeaponCategory::Swords,
        WeaponCategory::GreatSwords,
        WeaponCategory::Axes,
        WeaponCategory::BattleAxes,
        WeaponCategory::Clubs,
        WeaponCategory::Sledges,
        WeaponCategory::Spears,
        WeaponCategory::Polearms,
        WeaponCategory::Knives,
        WeaponCategory::DualKnives,
        WeaponCategory::Fists,
    ];

    /// Derive the category from a skill family and the two-handed flag.
    ///
    /// Two-handedness upgrades swords, axes, clubs and knives to their heavy
    /// variant. Spears and polearms keep their category either way, and
    /// unarmed always maps to fists.
    pub fn derive(skill: SkillFamily, two_handed: bool) -> Self {
        match (skill, two_handed) {
            (SkillFamily::Swords, false) => WeaponCategory::Swords,
            (SkillFamily::Swords, true) => WeaponCategory::GreatSwords,
            (SkillFamily::Axes, false) => WeaponCategory::Axes,
            (SkillFamily::Axes, true) => WeaponCategory::BattleAxes,
            (SkillFamily::Clubs, false) => WeaponCategory::Clubs,
            (SkillFamily::Clubs, true) => WeaponCategory::Sledges,
            (SkillFamily::Knives, false) => WeaponCategory::Knives,
            (SkillFamily::Knives, true) => WeaponCategory::DualKnives,
            (SkillFamily::Spears, _) => WeaponCategory::Spears,
            (SkillFamily::Polearms, _) => WeaponCategory::Polearms,
            (SkillFamily::Unarmed, _) => WeaponCategory::Fists,
        }
    }

    /// The name used in scope keys and configuration documents.
    pub fn as_str(self) -> &'static str {
        match self {
            WeaponCategory::Swords => "Swords",
            WeaponCategory::GreatSwords => "GreatSwords",
            WeaponCategory::Axes => "Axes",
            WeaponCategory::BattleAxes => "BattleAxes",
            WeaponCategory::Clubs => "Clubs",
            WeaponCategory::Sledges => "Sledges",
            WeaponCategory::Spears => "Spears",
            WeaponCategory::Polearms => "Polearms",
            WeaponCategory::Knives => "Knives",
            WeaponCategory::DualKnives => "DualKnives",
            WeaponCategory::Fists => "Fists",
        }
    }
}

impl fmt::Display for WeaponCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WeaponCategory {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        WeaponCategory::ALL
            .iter()
            .copied()
            .find(|c| c.as_str() == s)
            .ok_or(())
    }
}

/// Attack variant selected by the player.
///
/// `Normal` is the built-in attack; the three extra modes are the
/// player-triggered variants this crate resolves overrides for.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum AttackMode {
    #[default]
    Normal,
    ModeA,
    ModeB,
    ModeC,
}

impl AttackMode {
    /// The player-selectable extra modes.
    pub const EXTRA: [AttackMode; 3] = [AttackMode::ModeA, AttackMode::ModeB, AttackMode::ModeC];

    /// Returns true for every mode except `Normal`.
    pub fn is_extra(self) -> bool {
        self != AttackMode::Normal
    }

    /// Name used in scope keys and configuration.
    pub fn as_str(self) -> &'static str {
        match self {
            AttackMode::Normal => "Normal",
            AttackMode::ModeA => "ModeA",
            AttackMode::ModeB => "ModeB",
            AttackMode::ModeC => "ModeC",
        }
    }
}

impl fmt::Display for AttackMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AttackMode {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Normal" => Ok(AttackMode::Normal),
            "ModeA" => Ok(AttackMode::ModeA),
            "ModeB" => Ok(AttackMode::ModeB),
            "ModeC" => Ok(AttackMode::ModeC),
            _ => Err(()),
        }
    }
}

/// What the entity is holding in its off hand.
///
/// An empty off hand is modelled as `Option::<OffHand>::None` by callers.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum OffHand {
    Shield,
    Torch,
    Weapon(WeaponCategory),
}

impl fmt::Display for OffHand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OffHand::Shield => f.write_str("Shield"),
            OffHand::Torch => f.write_str("Torch"),
            OffHand::Weapon(category) => f.write_str(category.as_str()),
        }
    }
}

impl FromStr for OffHand {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Shield" => Ok(OffHand::Shield),
            "Torch" => Ok(OffHand::Torch),
            other => other.parse().map(OffHand::Weapon),
        }
    }
}

/// A weapon instance as seen by the engine.
///
/// The category is computed at construction and cannot drift from the
/// skill family and handedness it was derived from.
#[derive(Debug, Clone, PartialEq)]
pub struct EquippedItem {
    id: ItemId,
    name: String,
    skill: SkillFamily,
    two_handed: bool,
    category: WeaponCategory,
    has_secondary_attack: bool,
}

impl EquippedItem {
    /// Describe an equipped item.
    pub fn new(id: impl Into<ItemId>, name: impl Into<String>, skill: SkillFamily, two_handed: bool) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            skill,
            two_handed,
            category: WeaponCategory::derive(skill, two_handed),
            has_secondary_attack: true,
        }
    }

    /// Mark the item as lacking a secondary attack; extra modes are
    /// rejected for such items.
    pub fn without_secondary_attack(mut self) -> Self {
        self.has_secondary_attack = false;
        self
    }

    pub fn id(&self) -> &ItemId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn skill(&self) -> SkillFamily {
        self.skill
    }

    pub fn is_two_handed(&self) -> bool {
        self.two_handed
    }

    /// Weapon category derived from skill family and handedness.
    pub fn category(&self) -> WeaponCategory {
        self.category
    }

    /// Returns true if the item has a secondary attack to replace.
    pub fn has_secondary_attack(&self) -> bool {
        self.has_secondary_attack
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_two_handed_upgrades() {
        assert_eq!(WeaponCategory::derive(SkillFamily::Axes, true), WeaponCategory::BattleAxes);
        assert_eq!(WeaponCategory::derive(SkillFamily::Clubs, true), WeaponCategory::Sledges);
        assert_eq!(WeaponCategory::derive(SkillFamily::Knives, true), WeaponCategory::DualKnives);
    }

    #[test]
    fn test_handedness_ignored_for_polearms_and_spears() {
        assert_eq!(WeaponCategory::derive(SkillFamily::Polearms, true), WeaponCategory::Polearms);
        assert_eq!(WeaponCategory::derive(SkillFamily::Spears, false), WeaponCategory::Spears);
        assert_eq!(WeaponCategory::derive(SkillFamily::Unarmed, true), WeaponCategory::Fists);
    }

    #[test]
    fn test_category_name_round_trip() {
        for category in WeaponCategory::ALL {
            assert_eq!(category.as_str().parse::<WeaponCategory>(), Ok(category));
        }
        assert!("Bows".parse::<WeaponCategory>().is_err());
    }

    #[test]
    fn test_off_hand_parse() {
        assert_eq!("Shield".parse::<OffHand>(), Ok(OffHand::Shield));
        assert_eq!("Knives".parse::<OffHand>(), Ok(OffHand::Weapon(WeaponCategory::Knives)));
        assert!("Lantern".parse::<OffHand>().is_err());
    }

    #[test]
    fn test_mode_default_is_normal() {
        assert_eq!(AttackMode::default(), AttackMode::Normal);
        assert!(!AttackMode::Normal.is_extra());
        assert!(AttackMode::EXTRA.iter().all(|m| m.is_extra()));
    }

    #[test]
    fn test_equipped_item_category_fixed() {
        let item = EquippedItem::new("THSwordKrom", "Krom", SkillFamily::Swords, true);
        assert_eq!(item.category(), WeaponCategory::GreatSwords);
        assert!(item.has_secondary_attack());
        assert!(!item.clone().without_secondary_attack().has_secondary_attack());
    }
}
