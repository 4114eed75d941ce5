//! Identifier newtypes
//!
//! The backend hands identifiers out as JSON strings or as bare integers
//! depending on the endpoint; both decode into the same string-backed type.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

#[derive(Deserialize)]
#[serde(untagged)]
enum WireId {
    Text(String),
    Integer(i64),
}

impl From<WireId> for String {
    fn from(id: WireId) -> Self {
        match id {
            WireId::Text(text) => text,
            WireId::Integer(n) => n.to_string(),
        }
    }
}

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Wrap a raw identifier
            #[inline]
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Borrow the raw identifier
            #[inline]
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self::new(id)
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                WireId::deserialize(deserializer).map(|id| Self(id.into()))
            }
        }
    };
}

string_id! {
    /// Catalog product identifier
    ProductId
}

string_id! {
    /// Server-assigned design identifier
    DesignId
}

string_id! {
    /// Manufacturer identifier
    ManufacturerId
}

string_id! {
    /// Owner (user account) identifier
    UserId
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_string_and_integer_ids() {
        let from_text: DesignId = serde_json::from_str("\"42\"").unwrap();
        let from_number: DesignId = serde_json::from_str("42").unwrap();
        assert_eq!(from_text, from_number);
        assert_eq!(from_number.as_str(), "42");
    }

    #[test]
    fn serializes_as_plain_string() {
        let id = ProductId::new("kite-9");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"kite-9\"");
        assert_eq!(id.to_string(), "kite-9");
    }

    #[test]
    fn rejects_non_scalar_ids() {
        assert!(serde_json::from_str::<UserId>("{\"id\": 1}").is_err());
    }
}
