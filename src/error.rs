//! Error types.
//!
//! Resolution itself never fails: missing data falls through to defaults.
//! The two failure surfaces are configuration loading ([`ConfigError`]) and
//! the gates in front of an extra attack ([`TriggerRejection`]).

use crate::ids::{EntityId, ItemId};
use crate::weapon::AttackMode;
use thiserror::Error;

/// Which configuration document an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentKind {
    Categories,
    Items,
    Timing,
    Costs,
    Exclusions,
}

impl std::fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            DocumentKind::Categories => "categories",
            DocumentKind::Items => "items",
            DocumentKind::Timing => "timing",
            DocumentKind::Costs => "costs",
            DocumentKind::Exclusions => "exclusions",
        };
        f.write_str(name)
    }
}

/// Errors raised while reading or parsing a configuration document.
///
/// Any of these abandons the load of that one document; the previously
/// loaded table stays in place.
///
/// # Examples
///
/// ```rust
/// use extra_attacks::error::{ConfigError, DocumentKind};
///
/// let err = ConfigError::InvalidScopeKey {
///     document: DocumentKind::Categories,
///     key: "ModeZ_Axes".to_string(),
/// };
/// assert_eq!(err.to_string(), "invalid scope key in categories document: ModeZ_Axes");
/// ```
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    /// The document could not be read from disk.
    #[error("failed to read {path}: {message}")]
    Io { path: String, message: String },

    /// The file extension does not name a supported format.
    #[error("unsupported document format: {0}")]
    UnknownFormat(String),

    /// The document is not valid TOML/JSON or does not match the schema.
    #[error("failed to parse {document} document: {message}")]
    Parse {
        document: DocumentKind,
        message: String,
    },

    /// A replacement-map key does not parse as a scope key.
    #[error("invalid scope key in {document} document: {key}")]
    InvalidScopeKey { document: DocumentKind, key: String },

    /// Values parsed but are out of range.
    #[error("invalid values in {document} document: {}", .problems.join("; "))]
    Validation {
        document: DocumentKind,
        problems: Vec<String>,
    },
}

/// Reasons an extra-mode trigger is refused.
///
/// These are ordinary gameplay outcomes, not faults; the caller simply does
/// not start the attack.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TriggerRejection {
    #[error("no session for {0}")]
    UnknownEntity(EntityId),

    #[error("normal mode has no extra attack")]
    NormalMode,

    #[error("an attack is already in progress")]
    AlreadyAttacking,

    #[error("{mode} is on cooldown for {remaining:.2}s")]
    OnCooldown { mode: AttackMode, remaining: f32 },

    #[error("equipped item has no secondary attack")]
    NoSecondaryAttack,

    #[error("extra modes are disabled for {0}")]
    Excluded(ItemId),

    #[error("not enough stamina: need {required}, have {available}")]
    InsufficientStamina { required: f32, available: f32 },

    #[error("not enough energy: need {required}, have {available}")]
    InsufficientEnergy { required: f32, available: f32 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_display_joins_problems() {
        let err = ConfigError::Validation {
            document: DocumentKind::Timing,
            problems: vec!["a".to_string(), "b".to_string()],
        };
        assert_eq!(err.to_string(), "invalid values in timing document: a; b");
    }

    #[test]
    fn test_cooldown_display() {
        let err = TriggerRejection::OnCooldown {
            mode: AttackMode::ModeB,
            remaining: 1.5,
        };
        assert_eq!(err.to_string(), "ModeB is on cooldown for 1.50s");
    }
}
