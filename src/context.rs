//! Equipment context for resolution.
//!
//! An [`EquipmentState`] is the snapshot of what an entity is holding at the
//! moment a mode is triggered. It is passed by reference into every
//! resolver; the resolvers never reach back into the host for it.

use crate::ids::ItemId;
use crate::scope::{candidate_chain, ScopeKey};
use crate::weapon::{AttackMode, EquippedItem, OffHand, WeaponCategory};
use serde::{Deserialize, Serialize};

/// Snapshot of an entity's relevant equipment.
///
/// # Examples
///
/// ```rust
/// use extra_attacks::{EquipmentState, OffHand, WeaponCategory};
///
/// let state = EquipmentState::new(WeaponCategory::Swords)
///     .with_item("SwordIron")
///     .with_off_hand(OffHand::Shield);
///
/// assert_eq!(state.category, WeaponCategory::Swords);
/// assert_eq!(state.item.as_ref().map(|i| i.as_str()), Some("SwordIron"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EquipmentState {
    /// Category of the main-hand weapon.
    pub category: WeaponCategory,

    /// Identity of the main-hand item, if known.
    pub item: Option<ItemId>,

    /// Off-hand condition; `None` when the off hand is empty.
    pub off_hand: Option<OffHand>,
}

impl EquipmentState {
    /// Create a state with only a weapon category.
    pub fn new(category: WeaponCategory) -> Self {
        Self {
            category,
            item: None,
            off_hand: None,
        }
    }

    /// Build the state for an equipped main-hand item.
    pub fn for_item(item: &EquippedItem) -> Self {
        Self {
            category: item.category(),
            item: Some(item.id().clone()),
            off_hand: None,
        }
    }

    /// Set the individual item being wielded.
    pub fn with_item(mut self, item: impl Into<ItemId>) -> Self {
        self.item = Some(item.into());
        self
    }

    /// Set the off-hand condition.
    pub fn with_off_hand(mut self, off_hand: OffHand) -> Self {
        self.off_hand = Some(off_hand);
        self
    }

    /// Ordered lookup candidates for `mode`, most specific first.
    pub fn candidates(&self, mode: AttackMode) -> Vec<ScopeKey> {
        candidate_chain(mode, self.category, self.item.as_ref(), self.off_hand)
    }
}
