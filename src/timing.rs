//! Attack timing resolution.
//!
//! Event timings (impact, trail on/off, chain window, speed event,
//! invulnerability window) are authored once per weapon category against the
//! host's built-in secondary-attack clip. A [`ReferenceProfile`] captures
//! that clip's length and absolute event times; dividing one by the other
//! gives the designer's intent as ratios ("impact lands 80% through the
//! swing"), which are then applied to a replacement clip of any length.
//!
//! Resolution falls back in three tiers:
//!
//! 1. reference ratios, when a profile exists with a positive length and the
//!    replacement clip's length is known;
//! 2. the configured ratio table (category+mode, then category, then global),
//!    when the clip length is known but no usable profile exists;
//! 3. fixed absolute defaults, when the clip length is unknown.
//!
//! Geometry is never time-scaled; it comes from its own layered table.

use crate::ids::ClipName;
use crate::weapon::{AttackMode, WeaponCategory};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The host's original secondary-attack timings for one category.
///
/// All times are absolute seconds within a clip of `length` seconds. A time
/// of zero means the event does not exist for this category.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ReferenceProfile {
    pub length: f32,
    pub hit: f32,
    pub trail_on: f32,
    pub trail_off: f32,
    pub chain: f32,
    pub speed: f32,
    pub invuln: f32,
}

impl ReferenceProfile {
    /// Event times as fractions of the reference length.
    ///
    /// Returns `None` if the length is not a positive finite number.
    pub fn ratios(&self) -> Option<TimingRatios> {
        if !(self.length.is_finite() && self.length > 0.0) {
            return None;
        }
        let ratio = |t: f32| if t > 0.0 { t / self.length } else { 0.0 };
        Some(TimingRatios {
            hit: ratio(self.hit),
            trail_on: ratio(self.trail_on),
            trail_off: ratio(self.trail_off),
            chain: ratio(self.chain),
            speed: ratio(self.speed),
            invuln: ratio(self.invuln),
        })
    }
}

/// Event times as fractions of clip length.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingRatios {
    pub hit: f32,
    pub trail_on: f32,
    pub trail_off: f32,
    pub chain: f32,
    pub speed: f32,
    pub invuln: f32,
}

impl Default for TimingRatios {
    fn default() -> Self {
        Self {
            hit: 0.5,
            trail_on: 0.35,
            trail_off: 0.7,
            chain: 0.85,
            speed: 0.3,
            invuln: 0.0,
        }
    }
}

impl TimingRatios {
    /// Apply the ratios to a clip of `length` seconds.
    ///
    /// Every produced time lies in `[0, length]`. Zero, negative and
    /// non-finite ratios produce zero.
    pub fn scale(&self, length: f32) -> EventTimes {
        let scaled = |ratio: f32| {
            if ratio.is_finite() && ratio > 0.0 {
                (length * ratio).clamp(0.0, length)
            } else {
                0.0
            }
        };
        EventTimes {
            hit: scaled(self.hit),
            trail_on: scaled(self.trail_on),
            trail_off: scaled(self.trail_off),
            chain: scaled(self.chain),
            speed: scaled(self.speed),
            invuln: scaled(self.invuln),
        }
    }

    /// Returns the first field that is negative or not finite, by name.
    pub fn invalid_field(&self) -> Option<&'static str> {
        [
            ("hit", self.hit),
            ("trail_on", self.trail_on),
            ("trail_off", self.trail_off),
            ("chain", self.chain),
            ("speed", self.speed),
            ("invuln", self.invuln),
        ]
        .into_iter()
        .find(|(_, v)| !v.is_finite() || *v < 0.0)
        .map(|(name, _)| name)
    }
}

/// Absolute event times in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventTimes {
    pub hit: f32,
    pub trail_on: f32,
    pub trail_off: f32,
    pub chain: f32,
    pub speed: f32,
    pub invuln: f32,
}

impl Default for EventTimes {
    fn default() -> Self {
        Self {
            hit: 0.6,
            trail_on: 0.4,
            trail_off: 0.9,
            chain: 1.1,
            speed: 0.35,
            invuln: 0.0,
        }
    }
}

/// Attack shape parameters handed to the host's hit detection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AttackGeometry {
    pub range: f32,
    pub height: f32,
    pub angle: f32,
    pub ray_width: f32,
    pub offset: f32,
}

impl Default for AttackGeometry {
    fn default() -> Self {
        Self {
            range: 2.0,
            height: 1.0,
            angle: 90.0,
            ray_width: 0.3,
            offset: 0.0,
        }
    }
}

/// Per-category or per-category-and-mode overrides.
///
/// Unset fields defer to the next less specific layer.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingLayer {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ratios: Option<TimingRatios>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speed_multiplier: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub geometry: Option<AttackGeometry>,
}

impl TimingLayer {
    /// Returns true if the layer overrides nothing.
    pub fn is_empty(&self) -> bool {
        self.ratios.is_none() && self.speed_multiplier.is_none() && self.geometry.is_none()
    }
}

/// Which fallback tier produced a [`TimingProfile`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimingBasis {
    Reference,
    RatioTable,
    FixedDefaults,
}

/// Fully resolved timing and geometry for one attack.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimingProfile {
    pub hit_time: f32,
    pub trail_on_time: f32,
    pub trail_off_time: f32,
    pub chain_time: f32,
    pub speed_event_time: f32,
    pub invuln_window_time: f32,
    pub speed_multiplier: f32,
    pub geometry: AttackGeometry,
    /// Length the times were scaled to, or zero when unknown.
    pub clip_length: f32,
    pub basis: TimingBasis,
}

impl TimingProfile {
    fn from_times(times: EventTimes, clip_length: f32, basis: TimingBasis) -> Self {
        Self {
            hit_time: times.hit,
            trail_on_time: times.trail_on,
            trail_off_time: times.trail_off,
            chain_time: times.chain,
            speed_event_time: times.speed,
            invuln_window_time: times.invuln,
            speed_multiplier: 1.0,
            geometry: AttackGeometry::default(),
            clip_length,
            basis,
        }
    }

    /// All time fields, in declaration order.
    pub fn times(&self) -> [f32; 6] {
        [
            self.hit_time,
            self.trail_on_time,
            self.trail_off_time,
            self.chain_time,
            self.speed_event_time,
            self.invuln_window_time,
        ]
    }
}

/// Reference profiles, ratio tables, geometry and fixed defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct TimingTable {
    /// Name of each category's built-in secondary-attack clip.
    pub secondary_clips: HashMap<WeaponCategory, ClipName>,
    pub references: HashMap<WeaponCategory, ReferenceProfile>,
    pub layers: HashMap<(WeaponCategory, Option<AttackMode>), TimingLayer>,
    pub default_ratios: TimingRatios,
    pub default_speed_multiplier: f32,
    pub default_geometry: AttackGeometry,
    pub fixed: EventTimes,
}

impl TimingTable {
    /// A table with no references, layers or clip names; every lookup
    /// lands on the global defaults.
    pub fn empty() -> Self {
        Self {
            secondary_clips: HashMap::new(),
            references: HashMap::new(),
            layers: HashMap::new(),
            default_ratios: TimingRatios::default(),
            default_speed_multiplier: 1.0,
            default_geometry: AttackGeometry::default(),
            fixed: EventTimes::default(),
        }
    }

    /// The host's built-in secondary-attack data.
    pub fn builtin() -> Self {
        let mut table = Self::empty();

        let builtin: [(WeaponCategory, &str, Option<ReferenceProfile>); 11] = [
            (WeaponCategory::Swords, "sword_secondary", Some(reference(1.6, 0.96, 0.72, 1.1, 1.25, 0.6, 0.0))),
            (WeaponCategory::GreatSwords, "greatsword_secondary", Some(reference(1.87, 1.2, 0.95, 1.35, 1.5, 0.8, 0.0))),
            (WeaponCategory::Axes, "axe_secondary", Some(reference(1.4, 1.122, 0.9, 1.2, 1.25, 0.7, 0.0))),
            (WeaponCategory::BattleAxes, "battleaxe_secondary", Some(reference(2.1, 1.05, 0.7, 1.4, 1.7, 0.6, 0.0))),
            (WeaponCategory::Clubs, "mace_secondary", Some(reference(1.5, 0.9, 0.62, 1.02, 1.2, 0.5, 0.0))),
            (WeaponCategory::Sledges, "sledge_secondary", Some(reference(2.2, 1.3, 0.9, 1.5, 0.0, 0.8, 0.0))),
            (WeaponCategory::Spears, "spear_throw", Some(reference(1.1, 0.55, 0.0, 0.0, 0.0, 0.3, 0.0))),
            (WeaponCategory::Polearms, "atgeir_secondary", Some(reference(2.0, 0.85, 0.55, 1.3, 0.0, 0.5, 0.4))),
            (WeaponCategory::Knives, "knife_secondary", Some(reference(1.3, 0.78, 0.6, 0.9, 1.0, 0.4, 0.35))),
            (WeaponCategory::DualKnives, "dualknives_secondary", None),
            (WeaponCategory::Fists, "unarmed_secondary", None),
        ];
        for (category, clip, profile) in builtin {
            table.secondary_clips.insert(category, ClipName::new(clip));
            if let Some(profile) = profile {
                table.references.insert(category, profile);
            }
        }

        let shapes: [(WeaponCategory, AttackGeometry); 5] = [
            (WeaponCategory::GreatSwords, geometry(2.5, 1.0, 120.0, 0.4)),
            (WeaponCategory::Polearms, geometry(3.0, 1.0, 360.0, 0.3)),
            (WeaponCategory::Spears, geometry(2.8, 0.8, 20.0, 0.2)),
            (WeaponCategory::Knives, geometry(1.6, 0.9, 60.0, 0.25)),
            (WeaponCategory::Fists, geometry(1.5, 0.9, 45.0, 0.3)),
        ];
        for (category, shape) in shapes {
            table.layers.insert(
                (category, None),
                TimingLayer {
                    geometry: Some(shape),
                    ..TimingLayer::default()
                },
            );
        }

        table
    }

    /// The built-in secondary clip for `category`, if known.
    pub fn secondary_clip(&self, category: WeaponCategory) -> Option<&ClipName> {
        self.secondary_clips.get(&category)
    }

    /// Reference profile of `category`, if the host ships one.
    pub fn reference(&self, category: WeaponCategory) -> Option<&ReferenceProfile> {
        self.references.get(&category)
    }

    /// First value `pick` yields walking category+mode, then category.
    fn layered<T>(
        &self,
        category: WeaponCategory,
        mode: AttackMode,
        pick: impl Fn(&TimingLayer) -> Option<T>,
    ) -> Option<T> {
        [(category, Some(mode)), (category, None)]
            .iter()
            .filter_map(|key| self.layers.get(key))
            .find_map(pick)
    }

    /// Event ratios for `category` and `mode`, layered over the defaults.
    pub fn ratios(&self, category: WeaponCategory, mode: AttackMode) -> TimingRatios {
        self.layered(category, mode, |layer| layer.ratios)
            .unwrap_or(self.default_ratios)
    }

    /// Playback speed multiplier for `category` and `mode`.
    pub fn speed_multiplier(&self, category: WeaponCategory, mode: AttackMode) -> f32 {
        self.layered(category, mode, |layer| layer.speed_multiplier)
            .unwrap_or(self.default_speed_multiplier)
    }

    /// Attack geometry for `category` and `mode`, never time-scaled.
    pub fn geometry(&self, category: WeaponCategory, mode: AttackMode) -> AttackGeometry {
        self.layered(category, mode, |layer| layer.geometry)
            .unwrap_or(self.default_geometry)
    }
}

impl Default for TimingTable {
    fn default() -> Self {
        Self::builtin()
    }
}

fn reference(length: f32, hit: f32, trail_on: f32, trail_off: f32, chain: f32, speed: f32, invuln: f32) -> ReferenceProfile {
    ReferenceProfile {
        length,
        hit,
        trail_on,
        trail_off,
        chain,
        speed,
        invuln,
    }
}

fn geometry(range: f32, height: f32, angle: f32, ray_width: f32) -> AttackGeometry {
    AttackGeometry {
        range,
        height,
        angle,
        ray_width,
        offset: 0.0,
    }
}

/// Produces [`TimingProfile`]s from a [`TimingTable`].
///
/// # Examples
///
/// ```rust
/// use extra_attacks::timing::{TimingBasis, TimingProfileResolver};
/// use extra_attacks::{AttackMode, WeaponCategory};
///
/// let resolver = TimingProfileResolver::default();
///
/// // Built-in axe secondary: 1.4s clip, impact at 1.122s.
/// let profile = resolver.resolve(WeaponCategory::Axes, AttackMode::ModeA, 2.0);
/// assert_eq!(profile.basis, TimingBasis::Reference);
/// assert!((profile.hit_time - 1.6029).abs() < 1e-3);
///
/// // Unknown clip length: fixed absolute defaults.
/// let fallback = resolver.resolve(WeaponCategory::Axes, AttackMode::ModeA, 0.0);
/// assert_eq!(fallback.basis, TimingBasis::FixedDefaults);
/// ```
#[derive(Debug, Clone, Default)]
pub struct TimingProfileResolver {
    table: TimingTable,
}

impl TimingProfileResolver {
    /// Create a resolver over `table`.
    pub fn new(table: TimingTable) -> Self {
        Self { table }
    }

    /// The table in use.
    pub fn table(&self) -> &TimingTable {
        &self.table
    }

    /// Swap in a freshly loaded table.
    pub fn replace_table(&mut self, table: TimingTable) {
        self.table = table;
    }

    /// Resolve timings for a replacement clip of `clip_length` seconds.
    ///
    /// A length that is zero, negative or not finite means "unknown".
    pub fn resolve(&self, category: WeaponCategory, mode: AttackMode, clip_length: f32) -> TimingProfile {
        let known = clip_length.is_finite() && clip_length > 0.0;

        let mut profile = if !known {
            TimingProfile::from_times(self.table.fixed, 0.0, TimingBasis::FixedDefaults)
        } else if let Some(ratios) = self.table.reference(category).and_then(ReferenceProfile::ratios) {
            TimingProfile::from_times(ratios.scale(clip_length), clip_length, TimingBasis::Reference)
        } else {
            let ratios = self.table.ratios(category, mode);
            TimingProfile::from_times(ratios.scale(clip_length), clip_length, TimingBasis::RatioTable)
        };

        profile.speed_multiplier = self.table.speed_multiplier(category, mode);
        profile.geometry = self.table.geometry(category, mode);
        profile
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-4
    }

    fn table_with_reference(category: WeaponCategory, profile: ReferenceProfile) -> TimingTable {
        let mut table = TimingTable::empty();
        table.references.insert(category, profile);
        table
    }

    #[test]
    fn test_half_ratio_scales_to_new_length() {
        let table = table_with_reference(
            WeaponCategory::Swords,
            ReferenceProfile {
                length: 1.4,
                hit: 0.7,
                ..ReferenceProfile::default()
            },
        );
        let resolver = TimingProfileResolver::new(table);
        let profile = resolver.resolve(WeaponCategory::Swords, AttackMode::ModeA, 2.0);

        assert!(approx(profile.hit_time, 1.0));
        assert_eq!(profile.basis, TimingBasis::Reference);
        // Events absent from the reference stay absent.
        assert_eq!(profile.trail_on_time, 0.0);
        assert_eq!(profile.invuln_window_time, 0.0);
    }

    #[test]
    fn test_unknown_length_uses_fixed_defaults() {
        let table = table_with_reference(
            WeaponCategory::Swords,
            ReferenceProfile {
                length: 1.4,
                hit: 0.7,
                ..ReferenceProfile::default()
            },
        );
        let resolver = TimingProfileResolver::new(table);

        for length in [0.0, -1.0, f32::NAN] {
            let profile = resolver.resolve(WeaponCategory::Swords, AttackMode::ModeA, length);
            assert_eq!(profile.basis, TimingBasis::FixedDefaults);
            assert!(approx(profile.hit_time, EventTimes::default().hit));
            assert!(profile.times().iter().all(|t| t.is_finite() && *t >= 0.0));
        }
    }

    #[test]
    fn test_zero_length_reference_falls_back_to_ratio_table() {
        let mut table = table_with_reference(WeaponCategory::Clubs, ReferenceProfile::default());
        table.layers.insert(
            (WeaponCategory::Clubs, None),
            TimingLayer {
                ratios: Some(TimingRatios {
                    hit: 0.25,
                    ..TimingRatios::default()
                }),
                ..TimingLayer::default()
            },
        );
        let resolver = TimingProfileResolver::new(table);
        let profile = resolver.resolve(WeaponCategory::Clubs, AttackMode::ModeB, 4.0);

        assert_eq!(profile.basis, TimingBasis::RatioTable);
        assert!(approx(profile.hit_time, 1.0));
    }

    #[test]
    fn test_mode_layer_beats_category_layer() {
        let mut table = TimingTable::empty();
        table.layers.insert(
            (WeaponCategory::Spears, None),
            TimingLayer {
                speed_multiplier: Some(1.1),
                ratios: Some(TimingRatios {
                    hit: 0.4,
                    ..TimingRatios::default()
                }),
                ..TimingLayer::default()
            },
        );
        table.layers.insert(
            (WeaponCategory::Spears, Some(AttackMode::ModeC)),
            TimingLayer {
                speed_multiplier: Some(1.5),
                ..TimingLayer::default()
            },
        );
        let resolver = TimingProfileResolver::new(table);

        let mode_c = resolver.resolve(WeaponCategory::Spears, AttackMode::ModeC, 1.0);
        assert!(approx(mode_c.speed_multiplier, 1.5));
        // Ratios are not set on the mode layer, so the category layer applies.
        assert!(approx(mode_c.hit_time, 0.4));

        let mode_a = resolver.resolve(WeaponCategory::Spears, AttackMode::ModeA, 1.0);
        assert!(approx(mode_a.speed_multiplier, 1.1));
    }

    #[test]
    fn test_ratio_above_one_is_clamped() {
        let ratios = TimingRatios {
            hit: 1.7,
            chain: 3.0,
            ..TimingRatios::default()
        };
        let times = ratios.scale(2.0);
        assert!(approx(times.hit, 2.0));
        assert!(approx(times.chain, 2.0));
    }

    #[test]
    fn test_geometry_not_time_scaled() {
        let resolver = TimingProfileResolver::default();
        let short = resolver.resolve(WeaponCategory::Polearms, AttackMode::ModeA, 0.5);
        let long = resolver.resolve(WeaponCategory::Polearms, AttackMode::ModeA, 5.0);
        assert_eq!(short.geometry, long.geometry);
        assert!(approx(short.geometry.angle, 360.0));

        let axes = resolver.resolve(WeaponCategory::Axes, AttackMode::ModeA, 1.0);
        assert_eq!(axes.geometry, AttackGeometry::default());
    }

    #[test]
    fn test_builtin_has_clip_for_every_category() {
        let table = TimingTable::builtin();
        for category in WeaponCategory::ALL {
            assert!(table.secondary_clip(category).is_some(), "{category} has no clip");
        }
        assert!(table.reference(WeaponCategory::Fists).is_none());
    }

    #[test]
    fn test_invalid_field_detection() {
        let ratios = TimingRatios {
            trail_off: -0.1,
            ..TimingRatios::default()
        };
        assert_eq!(ratios.invalid_field(), Some("trail_off"));
        assert_eq!(TimingRatios::default().invalid_field(), None);
    }
}
