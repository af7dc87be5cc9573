//! Items for which extra modes are disabled.

use crate::ids::ItemId;
use crate::weapon::{EquippedItem, SkillFamily};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Exclusion list, matched by item identity, display name or skill family.
///
/// # Examples
///
/// ```rust
/// use extra_attacks::exclusion::ExclusionList;
/// use extra_attacks::{EquippedItem, ItemId, SkillFamily};
///
/// let mut exclusions = ExclusionList::default();
/// exclusions.ids.insert(ItemId::new("PickaxeIron"));
///
/// let pick = EquippedItem::new("PickaxeIron", "Iron pickaxe", SkillFamily::Clubs, false);
/// assert!(exclusions.excludes(&pick));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExclusionList {
    pub ids: BTreeSet<ItemId>,
    /// Display names, compared case-insensitively.
    pub names: BTreeSet<String>,
    pub skills: BTreeSet<SkillFamily>,
}

impl ExclusionList {
    /// Returns true if extra modes are disabled for `item`.
    pub fn excludes(&self, item: &EquippedItem) -> bool {
        self.ids.contains(item.id())
            || self.skills.contains(&item.skill())
            || self
                .names
                .iter()
                .any(|name| name.eq_ignore_ascii_case(item.name()))
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty() && self.names.is_empty() && self.skills.is_empty()
    }
}
