//! Configuration documents.
//!
//! Five human-editable documents feed the engine:
//!
//! - `categories`: `{ "<Mode>[_<Category>[_Left<OffHand>]]": { "<reference clip>": "<replacement clip>" } }`
//! - `items`: same shape, keyed `<Mode>_<ItemId>[_Left<OffHand>]`
//! - `timing`: reference profiles, ratio tables, speed multipliers, geometry
//! - `costs`: stamina/energy costs and the separate cooldown sub-table
//! - `exclusions`: items for which extra modes are disabled
//!
//! Each document is TOML or JSON. A document that fails to parse or
//! validate is rejected as a whole; the caller keeps the previous table.

use crate::cost::{CostTable, ResourceCost};
use crate::error::{ConfigError, DocumentKind};
use crate::exclusion::ExclusionList;
use crate::ids::ClipName;
use crate::scope::{ScopeKey, TargetKind};
use crate::store::ReplacementMap;
use crate::timing::{AttackGeometry, EventTimes, ReferenceProfile, TimingLayer, TimingRatios, TimingTable};
use crate::weapon::{AttackMode, WeaponCategory};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Serialization format of a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Toml,
    Json,
}

impl DocumentFormat {
    /// Pick the format from a file extension.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("toml") => Ok(DocumentFormat::Toml),
            Some(ext) if ext.eq_ignore_ascii_case("json") => Ok(DocumentFormat::Json),
            _ => Err(ConfigError::UnknownFormat(path.display().to_string())),
        }
    }
}

/// The raw text of one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentSource {
    pub kind: DocumentKind,
    pub format: DocumentFormat,
    pub text: String,
}

impl DocumentSource {
    /// A TOML document held in memory.
    pub fn toml(kind: DocumentKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            format: DocumentFormat::Toml,
            text: text.into(),
        }
    }

    /// A JSON document held in memory.
    pub fn json(kind: DocumentKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            format: DocumentFormat::Json,
            text: text.into(),
        }
    }

    /// Read a document from disk, choosing the format by extension.
    pub fn read(kind: DocumentKind, path: &Path) -> Result<Self, ConfigError> {
        let format = DocumentFormat::from_path(path)?;
        let text = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Ok(Self { kind, format, text })
    }

    /// Deserialize the document into `T`.
    pub fn parse<T: DeserializeOwned>(&self) -> Result<T, ConfigError> {
        let parsed = match self.format {
            DocumentFormat::Toml => toml::from_str(&self.text).map_err(|e| e.to_string()),
            DocumentFormat::Json => serde_json::from_str(&self.text).map_err(|e| e.to_string()),
        };
        parsed.map_err(|message| ConfigError::Parse {
            document: self.kind,
            message,
        })
    }
}

/// The full set of documents for one load or reload.
///
/// An absent document loads as if it were empty: built-in data for timing
/// and costs, no replacements, no exclusions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigSet {
    pub categories: Option<DocumentSource>,
    pub items: Option<DocumentSource>,
    pub timing: Option<DocumentSource>,
    pub costs: Option<DocumentSource>,
    pub exclusions: Option<DocumentSource>,
}

impl ConfigSet {
    /// An empty set: every document absent.
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in timing and cost documents in TOML, with no replacement
    /// maps and no exclusions.
    pub fn defaults() -> Result<Self, ConfigError> {
        let timing = to_toml(&TimingDocument::builtin(), DocumentKind::Timing)?;
        let costs = to_toml(&CostDocument::builtin(), DocumentKind::Costs)?;
        Ok(Self::new()
            .with(DocumentSource::toml(DocumentKind::Timing, timing))
            .with(DocumentSource::toml(DocumentKind::Costs, costs)))
    }

    /// Add a document, placed by its kind.
    pub fn with(mut self, source: DocumentSource) -> Self {
        let slot = match source.kind {
            DocumentKind::Categories => &mut self.categories,
            DocumentKind::Items => &mut self.items,
            DocumentKind::Timing => &mut self.timing,
            DocumentKind::Costs => &mut self.costs,
            DocumentKind::Exclusions => &mut self.exclusions,
        };
        *slot = Some(source);
        self
    }
}

/// Replacement-map document as written on disk.
pub type ReplacementDocument = BTreeMap<String, ReplacementMap>;

/// Parse one replacement document into store entries.
///
/// `target` says whether keys name categories or items. An absent document
/// yields no entries; any unparsable scope key rejects the whole document.
pub fn load_replacements(
    source: Option<&DocumentSource>,
    target: TargetKind,
) -> Result<Vec<(ScopeKey, ReplacementMap)>, ConfigError> {
    let Some(source) = source else {
        return Ok(Vec::new());
    };
    let document: ReplacementDocument = source.parse()?;
    document
        .into_iter()
        .map(|(key, map)| {
            ScopeKey::parse(&key, target)
                .map(|scope| (scope, map))
                .ok_or_else(|| ConfigError::InvalidScopeKey {
                    document: source.kind,
                    key,
                })
        })
        .collect()
}

/// `[default]` section of the timing document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingDefaultsSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ratios: Option<TimingRatios>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speed_multiplier: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub geometry: Option<AttackGeometry>,
    /// Absolute times used when a clip's length is unknown.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fixed: Option<EventTimes>,
}

/// `[categories.<Category>]` section of the timing document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CategoryTimingSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ratios: Option<TimingRatios>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speed_multiplier: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub geometry: Option<AttackGeometry>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub modes: BTreeMap<String, TimingLayer>,
}

/// Timing and geometry document.
///
/// Values override the built-in table; anything left out keeps its
/// built-in value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingDocument {
    pub default: TimingDefaultsSection,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub clips: BTreeMap<String, ClipName>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub references: BTreeMap<String, ReferenceProfile>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub categories: BTreeMap<String, CategoryTimingSection>,
}

impl TimingDocument {
    /// The document that reproduces the built-in table exactly.
    pub fn builtin() -> Self {
        let table = TimingTable::builtin();
        let mut document = TimingDocument {
            default: TimingDefaultsSection {
                ratios: Some(table.default_ratios),
                speed_multiplier: Some(table.default_speed_multiplier),
                geometry: Some(table.default_geometry),
                fixed: Some(table.fixed),
            },
            ..TimingDocument::default()
        };
        for (category, clip) in &table.secondary_clips {
            document.clips.insert(category.to_string(), clip.clone());
        }
        for (category, profile) in &table.references {
            document.references.insert(category.to_string(), *profile);
        }
        for ((category, mode), layer) in &table.layers {
            let section = document.categories.entry(category.to_string()).or_default();
            match mode {
                Some(mode) => {
                    section.modes.insert(mode.to_string(), *layer);
                }
                None => {
                    section.ratios = layer.ratios;
                    section.speed_multiplier = layer.speed_multiplier;
                    section.geometry = layer.geometry;
                }
            }
        }
        document
    }

    /// Apply the document over `base`, validating every value.
    pub fn apply(self, mut base: TimingTable) -> Result<TimingTable, ConfigError> {
        let mut problems = Problems::new();

        if let Some(ratios) = self.default.ratios {
            problems.check_ratios("default.ratios", &ratios);
            base.default_ratios = ratios;
        }
        if let Some(multiplier) = self.default.speed_multiplier {
            problems.check_multiplier("default.speed_multiplier", multiplier);
            base.default_speed_multiplier = multiplier;
        }
        if let Some(geometry) = self.default.geometry {
            problems.check_geometry("default.geometry", &geometry);
            base.default_geometry = geometry;
        }
        if let Some(fixed) = self.default.fixed {
            problems.check_times("default.fixed", &fixed);
            base.fixed = fixed;
        }

        for (name, clip) in self.clips {
            if let Some(category) = problems.category(&format!("clips.{name}"), &name) {
                base.secondary_clips.insert(category, clip);
            }
        }

        for (name, profile) in self.references {
            let path = format!("references.{name}");
            if let Some(category) = problems.category(&path, &name) {
                problems.check_reference(&path, &profile);
                base.references.insert(category, profile);
            }
        }

        for (name, section) in self.categories {
            let path = format!("categories.{name}");
            let Some(category) = problems.category(&path, &name) else { continue };

            let layer = TimingLayer {
                ratios: section.ratios,
                speed_multiplier: section.speed_multiplier,
                geometry: section.geometry,
            };
            if !layer.is_empty() {
                problems.check_layer(&path, &layer);
                merge_layer(base.layers.entry((category, None)).or_default(), layer);
            }

            for (mode_name, layer) in section.modes {
                let mode_path = format!("{path}.modes.{mode_name}");
                if let Some(mode) = problems.extra_mode(&mode_path, &mode_name) {
                    problems.check_layer(&mode_path, &layer);
                    merge_layer(base.layers.entry((category, Some(mode))).or_default(), layer);
                }
            }
        }

        problems.finish(DocumentKind::Timing)?;
        Ok(base)
    }
}

fn merge_layer(into: &mut TimingLayer, from: TimingLayer) {
    if from.ratios.is_some() {
        into.ratios = from.ratios;
    }
    if from.speed_multiplier.is_some() {
        into.speed_multiplier = from.speed_multiplier;
    }
    if from.geometry.is_some() {
        into.geometry = from.geometry;
    }
}

/// `[default]` section of the cost document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CostDefaultsSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stamina: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub energy: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cooldown: Option<f32>,
}

/// Cost and cooldown document.
///
/// `costs` and `cooldowns` are nested `<Category> -> <Mode>` tables.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CostDocument {
    pub default: CostDefaultsSection,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub costs: BTreeMap<String, BTreeMap<String, ResourceCost>>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub cooldowns: BTreeMap<String, BTreeMap<String, f32>>,
}

impl CostDocument {
    /// The document that reproduces the built-in table exactly.
    pub fn builtin() -> Self {
        let table = CostTable::builtin();
        let mut document = CostDocument {
            default: CostDefaultsSection {
                stamina: Some(table.default_cost.stamina),
                energy: Some(table.default_cost.energy),
                cooldown: Some(table.default_cooldown),
            },
            ..CostDocument::default()
        };
        for ((category, mode), cost) in &table.costs {
            document
                .costs
                .entry(category.to_string())
                .or_default()
                .insert(mode.to_string(), *cost);
        }
        for ((category, mode), cooldown) in &table.cooldowns {
            document
                .cooldowns
                .entry(category.to_string())
                .or_default()
                .insert(mode.to_string(), *cooldown);
        }
        document
    }

    /// Apply the document over `base`, validating every value.
    pub fn apply(self, mut base: CostTable) -> Result<CostTable, ConfigError> {
        let mut problems = Problems::new();

        if let Some(stamina) = self.default.stamina {
            problems.check_non_negative("default.stamina", stamina);
            base.default_cost.stamina = stamina;
        }
        if let Some(energy) = self.default.energy {
            problems.check_non_negative("default.energy", energy);
            base.default_cost.energy = energy;
        }
        if let Some(cooldown) = self.default.cooldown {
            problems.check_non_negative("default.cooldown", cooldown);
            base.default_cooldown = cooldown;
        }

        for (category_name, modes) in self.costs {
            for (mode_name, cost) in modes {
                let path = format!("costs.{category_name}.{mode_name}");
                let category = problems.category(&path, &category_name);
                let mode = problems.extra_mode(&path, &mode_name);
                problems.check_non_negative(&format!("{path}.stamina"), cost.stamina);
                problems.check_non_negative(&format!("{path}.energy"), cost.energy);
                if let (Some(category), Some(mode)) = (category, mode) {
                    base.costs.insert((category, mode), cost);
                }
            }
        }

        for (category_name, modes) in self.cooldowns {
            for (mode_name, cooldown) in modes {
                let path = format!("cooldowns.{category_name}.{mode_name}");
                let category = problems.category(&path, &category_name);
                let mode = problems.extra_mode(&path, &mode_name);
                problems.check_non_negative(&path, cooldown);
                if let (Some(category), Some(mode)) = (category, mode) {
                    base.cooldowns.insert((category, mode), cooldown);
                }
            }
        }

        problems.finish(DocumentKind::Costs)?;
        Ok(base)
    }
}

/// Parse the timing document over the built-in table.
pub fn load_timing(source: Option<&DocumentSource>) -> Result<TimingTable, ConfigError> {
    match source {
        Some(source) => source.parse::<TimingDocument>()?.apply(TimingTable::builtin()),
        None => Ok(TimingTable::builtin()),
    }
}

/// Parse the cost document over the built-in table.
pub fn load_costs(source: Option<&DocumentSource>) -> Result<CostTable, ConfigError> {
    match source {
        Some(source) => source.parse::<CostDocument>()?.apply(CostTable::builtin()),
        None => Ok(CostTable::builtin()),
    }
}

/// Parse the exclusion list. An absent document excludes nothing.
pub fn load_exclusions(source: Option<&DocumentSource>) -> Result<ExclusionList, ConfigError> {
    match source {
        Some(source) => source.parse(),
        None => Ok(ExclusionList::default()),
    }
}

/// Serialize a document as TOML, e.g. to write out a default file.
pub fn to_toml<T: Serialize>(document: &T, kind: DocumentKind) -> Result<String, ConfigError> {
    toml::to_string_pretty(document).map_err(|e| ConfigError::Parse {
        document: kind,
        message: e.to_string(),
    })
}

/// Collects validation problems so one pass reports all of them.
struct Problems(Vec<String>);

impl Problems {
    fn new() -> Self {
        Self(Vec::new())
    }

    fn push(&mut self, problem: String) {
        self.0.push(problem);
    }

    fn category(&mut self, path: &str, name: &str) -> Option<WeaponCategory> {
        let parsed = name.parse().ok();
        if parsed.is_none() {
            self.push(format!("{path}: unknown weapon category '{name}'"));
        }
        parsed
    }

    fn extra_mode(&mut self, path: &str, name: &str) -> Option<AttackMode> {
        match name.parse::<AttackMode>() {
            Ok(mode) if mode.is_extra() => Some(mode),
            _ => {
                self.push(format!("{path}: '{name}' is not an extra attack mode"));
                None
            }
        }
    }

    fn check_non_negative(&mut self, path: &str, value: f32) {
        if !value.is_finite() || value < 0.0 {
            self.push(format!("{path}: must be a non-negative number, got {value}"));
        }
    }

    fn check_multiplier(&mut self, path: &str, value: f32) {
        if !value.is_finite() || value <= 0.0 {
            self.push(format!("{path}: must be a positive number, got {value}"));
        }
    }

    fn check_ratios(&mut self, path: &str, ratios: &TimingRatios) {
        if let Some(field) = ratios.invalid_field() {
            self.push(format!("{path}.{field}: must be a non-negative number"));
        }
    }

    fn check_times(&mut self, path: &str, times: &EventTimes) {
        for (field, value) in [
            ("hit", times.hit),
            ("trail_on", times.trail_on),
            ("trail_off", times.trail_off),
            ("chain", times.chain),
            ("speed", times.speed),
            ("invuln", times.invuln),
        ] {
            self.check_non_negative(&format!("{path}.{field}"), value);
        }
    }

    fn check_reference(&mut self, path: &str, profile: &ReferenceProfile) {
        self.check_non_negative(&format!("{path}.length"), profile.length);
        self.check_times(
            path,
            &EventTimes {
                hit: profile.hit,
                trail_on: profile.trail_on,
                trail_off: profile.trail_off,
                chain: profile.chain,
                speed: profile.speed,
                invuln: profile.invuln,
            },
        );
    }

    fn check_geometry(&mut self, path: &str, geometry: &AttackGeometry) {
        for (field, value) in [
            ("range", geometry.range),
            ("height", geometry.height),
            ("angle", geometry.angle),
            ("ray_width", geometry.ray_width),
        ] {
            self.check_non_negative(&format!("{path}.{field}"), value);
        }
        if !geometry.offset.is_finite() {
            self.push(format!("{path}.offset: must be finite"));
        }
    }

    fn check_layer(&mut self, path: &str, layer: &TimingLayer) {
        if let Some(ratios) = &layer.ratios {
            self.check_ratios(&format!("{path}.ratios"), ratios);
        }
        if let Some(multiplier) = layer.speed_multiplier {
            self.check_multiplier(&format!("{path}.speed_multiplier"), multiplier);
        }
        if let Some(geometry) = &layer.geometry {
            self.check_geometry(&format!("{path}.geometry"), geometry);
        }
    }

    fn finish(self, document: DocumentKind) -> Result<(), ConfigError> {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation {
                document,
                problems: self.0,
            })
        }
    }
}
