//! Identifier types.
//!
//! Clip names, item identities and controller identities are all interned
//! strings backed by `Arc<str>`, so cloning a key into a cache slot never
//! reallocates and equality is a cheap string compare. Entities are plain
//! numeric handles handed out by the host.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::sync::Arc;

macro_rules! interned_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Hash, PartialEq, Eq, PartialOrd, Ord)]
        pub struct $name(Arc<str>);

        impl $name {
            /// Create a new identifier from a string slice.
            pub fn new(s: &str) -> Self {
                Self(Arc::from(s))
            }

            /// Get the string representation of this identifier.
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Returns true if the identifier is the empty string.
            pub fn is_empty(&self) -> bool {
                self.0.is_empty()
            }
        }

        impl Serialize for $name {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: Serializer,
            {
                self.0.as_ref().serialize(serializer)
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: Deserializer<'de>,
            {
                let s = String::deserialize(deserializer)?;
                Ok(Self::from(s))
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self::new(s)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(Arc::from(s))
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

interned_id! {
    /// Name of an animation clip, either a reference clip baked into a base
    /// controller or a replacement clip supplied by the asset boundary.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use extra_attacks::ClipName;
    ///
    /// let clip: ClipName = "axe_secondary".into();
    /// assert_eq!(clip.as_str(), "axe_secondary");
    /// ```
    ClipName
}

interned_id! {
    /// Identity of an individual item (the host's prefab name), e.g. `AxeBronze`.
    ItemId
}

interned_id! {
    /// Identity of a base animation controller.
    ControllerId
}

/// Handle of an acting entity, assigned by the host at spawn time.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub u64);

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "entity#{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clip_name_equality() {
        let a = ClipName::new("sword_secondary");
        let b: ClipName = String::from("sword_secondary").into();
        assert_eq!(a, b);
        assert_eq!(a.to_string(), "sword_secondary");
    }

    #[test]
    fn test_item_id_empty() {
        assert!(ItemId::new("").is_empty());
        assert!(!ItemId::new("AxeBronze").is_empty());
    }

    #[test]
    fn test_id_serde_as_plain_string() {
        let id = ItemId::new("SwordIron");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"SwordIron\"");
        let back: ItemId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn test_entity_display() {
        assert_eq!(EntityId(7).to_string(), "entity#7");
    }
}
