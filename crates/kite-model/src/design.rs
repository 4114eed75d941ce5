//! Persisted designs
//!
//! A `Design` is what the editor submits: one `ComposedVariation` per product
//! variation, in product order, with the first marked primary. The storage
//! service answers with a `SavedDesign` carrying the server-assigned id.

use crate::error::ModelError;
use crate::ids::{DesignId, ProductId, UserId};
use serde::{Deserialize, Serialize};

/// A variation with all assignments baked into its markup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComposedVariation {
    /// Variation name (matches the product variation)
    pub name: String,
    /// True only for the first variation in product order
    #[serde(rename = "primary")]
    pub is_primary: bool,
    /// Final vector markup
    #[serde(rename = "svg")]
    pub svg_markup: String,
}

/// A design submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Design {
    /// User-chosen design name
    pub name: String,
    /// Owning account
    #[serde(rename = "user")]
    pub owner_id: UserId,
    /// Product the design was made from
    #[serde(rename = "product")]
    pub product_id: ProductId,
    /// Composed variations, product order
    pub variations: Vec<ComposedVariation>,
}

impl Design {
    /// The primary variation, if any
    #[must_use]
    pub fn primary_variation(&self) -> Option<&ComposedVariation> {
        self.variations.iter().find(|v| v.is_primary)
    }
}

/// A design as returned by the storage service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedDesign {
    /// Server-assigned identifier
    pub id: DesignId,
    /// Creation timestamp as reported by the server
    #[serde(default)]
    pub created: Option<String>,
    /// Design name
    pub name: String,
    /// Owner, absent from public listings
    #[serde(rename = "user", default)]
    pub owner_id: Option<UserId>,
    /// Product, absent from public listings
    #[serde(rename = "product", default)]
    pub product_id: Option<ProductId>,
    /// Composed variations
    pub variations: Vec<ComposedVariation>,
}

impl SavedDesign {
    /// The primary variation, if any
    #[must_use]
    pub fn primary_variation(&self) -> Option<&ComposedVariation> {
        self.variations.iter().find(|v| v.is_primary)
    }

    /// Variation by exact name
    #[must_use]
    pub fn variation(&self, name: &str) -> Option<&ComposedVariation> {
        self.variations.iter().find(|v| v.name == name)
    }
}

/// Storage wire shape of a design, `variations` JSON-encoded
#[derive(Debug, Clone, Deserialize)]
pub struct RawSavedDesign {
    /// Server-assigned identifier
    pub id: DesignId,
    /// Creation timestamp
    #[serde(default)]
    pub created: Option<String>,
    /// Design name
    pub name: String,
    /// Owner
    #[serde(default)]
    pub user: Option<UserId>,
    /// Product
    #[serde(default)]
    pub product: Option<ProductId>,
    /// JSON-encoded `Vec<ComposedVariation>`
    pub variations: String,
}

impl TryFrom<RawSavedDesign> for SavedDesign {
    type Error = ModelError;

    fn try_from(raw: RawSavedDesign) -> Result<Self, Self::Error> {
        let variations = serde_json::from_str(&raw.variations)
            .map_err(|e| ModelError::malformed("variations", e))?;
        Ok(Self {
            id: raw.id,
            created: raw.created,
            name: raw.name,
            owner_id: raw.user,
            product_id: raw.product,
            variations,
        })
    }
}
