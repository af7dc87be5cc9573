//! Scope keys.
//!
//! A [`ScopeKey`] names one layer of the specialization hierarchy: a bare
//! mode default, a weapon category, or an individual item, each optionally
//! narrowed by an off-hand condition. Keys are small tagged structs with
//! derived equality and hashing; the underscore-joined string form is only
//! used at the configuration boundary and in log output.

use crate::ids::ItemId;
use crate::weapon::{AttackMode, OffHand, WeaponCategory};
use std::fmt;

/// The weapon dimension of a scope key.
#[derive(Debug, Clone, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub enum ScopeTarget {
    /// Weapon-agnostic default for the mode.
    Any,
    Category(WeaponCategory),
    Item(ItemId),
}

/// Which kind of target a configuration document is allowed to name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetKind {
    Category,
    Item,
}

/// Composite lookup key for a replacement-map layer.
///
/// # Examples
///
/// ```rust
/// use extra_attacks::{AttackMode, OffHand, ScopeKey, WeaponCategory};
///
/// let key = ScopeKey::category(AttackMode::ModeA, WeaponCategory::Axes)
///     .with_off_hand(OffHand::Shield);
/// assert_eq!(key.to_string(), "ModeA_Axes_LeftShield");
/// ```
#[derive(Debug, Clone, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct ScopeKey {
    pub mode: AttackMode,
    pub target: ScopeTarget,
    pub off_hand: Option<OffHand>,
}

impl ScopeKey {
    /// The bare, weapon-agnostic key for a mode.
    pub fn bare(mode: AttackMode) -> Self {
        Self {
            mode,
            target: ScopeTarget::Any,
            off_hand: None,
        }
    }

    /// Key for a weapon category under `mode`.
    pub fn category(mode: AttackMode, category: WeaponCategory) -> Self {
        Self {
            mode,
            target: ScopeTarget::Category(category),
            off_hand: None,
        }
    }

    /// Key for an individual item under `mode`.
    pub fn item(mode: AttackMode, item: ItemId) -> Self {
        Self {
            mode,
            target: ScopeTarget::Item(item),
            off_hand: None,
        }
    }

    /// Narrow the key to an off-hand condition.
    ///
    /// The bare key cannot carry an off-hand suffix; calling this on it
    /// returns the key unchanged.
    pub fn with_off_hand(mut self, off_hand: OffHand) -> Self {
        if self.target != ScopeTarget::Any {
            self.off_hand = Some(off_hand);
        }
        self
    }

    /// Returns true if this key names an individual item.
    pub fn is_item_scoped(&self) -> bool {
        matches!(self.target, ScopeTarget::Item(_))
    }

    /// Specificity rank: higher is more specific.
    ///
    /// Item+off-hand (4) > item (3) > category+off-hand (2) > category (1) > bare (0).
    pub fn specificity(&self) -> u8 {
        let base = match self.target {
            ScopeTarget::Any => return 0,
            ScopeTarget::Category(_) => 1,
            ScopeTarget::Item(_) => 3,
        };
        base + u8::from(self.off_hand.is_some())
    }

    /// Parse the configuration string form of a key.
    ///
    /// Accepted shapes are `Mode`, `Mode_Target` and `Mode_Target_Left<OffHand>`.
    /// Category documents may use the bare form; item documents may not.
    /// Only extra modes can carry replacements, so `Normal` keys are
    /// rejected. Returns `None` for anything that does not parse cleanly.
    pub fn parse(s: &str, kind: TargetKind) -> Option<Self> {
        let extra_mode = |name: &str| name.parse::<AttackMode>().ok().filter(|mode| mode.is_extra());
        let (mode, rest) = match s.split_once('_') {
            Some((mode, rest)) => (extra_mode(mode)?, rest),
            None => {
                let mode = extra_mode(s)?;
                return match kind {
                    TargetKind::Category => Some(Self::bare(mode)),
                    TargetKind::Item => None,
                };
            }
        };

        let (target, off_hand) = match rest.rfind("_Left") {
            Some(idx) => match rest[idx + "_Left".len()..].parse::<OffHand>() {
                Ok(off_hand) => (&rest[..idx], Some(off_hand)),
                Err(()) => (rest, None),
            },
            None => (rest, None),
        };
        if target.is_empty() {
            return None;
        }

        let target = match kind {
            TargetKind::Category => ScopeTarget::Category(target.parse().ok()?),
            TargetKind::Item => ScopeTarget::Item(ItemId::new(target)),
        };
        Some(Self {
            mode,
            target,
            off_hand,
        })
    }
}

impl fmt::Display for ScopeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.mode)?;
        match &self.target {
            ScopeTarget::Any => return Ok(()),
            ScopeTarget::Category(category) => write!(f, "_{}", category)?,
            ScopeTarget::Item(item) => write!(f, "_{}", item)?,
        }
        if let Some(off_hand) = self.off_hand {
            write!(f, "_Left{}", off_hand)?;
        }
        Ok(())
    }
}

/// Build the ordered candidate list for a lookup, most specific first.
///
/// Item candidates are skipped when `item` is `None` or empty; off-hand
/// candidates are only produced when the entity currently holds that exact
/// off-hand condition. The bare mode key is always last.
pub fn candidate_chain(
    mode: AttackMode,
    category: WeaponCategory,
    item: Option<&ItemId>,
    off_hand: Option<OffHand>,
) -> Vec<ScopeKey> {
    let mut chain = Vec::with_capacity(5);

    if let Some(item) = item.filter(|id| !id.is_empty()) {
        if let Some(off_hand) = off_hand {
            chain.push(ScopeKey::item(mode, item.clone()).with_off_hand(off_hand));
        }
        chain.push(ScopeKey::item(mode, item.clone()));
    }

    if let Some(off_hand) = off_hand {
        chain.push(ScopeKey::category(mode, category).with_off_hand(off_hand));
    }
    chain.push(ScopeKey::category(mode, category));
    chain.push(ScopeKey::bare(mode));

    chain
}
