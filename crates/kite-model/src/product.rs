//! Catalog types
//!
//! A `Product` is an immutable template: an ordered palette of colours and an
//! ordered list of variations, each carrying the blank vector markup for one
//! panel layout. The catalog ships `colors` and `variations` as JSON-encoded
//! strings; `RawProduct` is that wire shape.

use crate::error::ModelError;
use crate::ids::{ManufacturerId, ProductId};
use crate::text::soft_eq;
use serde::{Deserialize, Serialize};

/// A named palette entry
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color {
    /// Display name, e.g. "Neon Yellow"
    pub name: String,
    /// Fill value written into markup, e.g. `#ff0`
    #[serde(rename = "color")]
    pub hex: String,
}

impl Color {
    /// Create palette entry
    #[inline]
    #[must_use]
    pub fn new(name: impl Into<String>, hex: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            hex: hex.into(),
        }
    }
}

/// One structural layout of a product
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variation {
    /// Variation name, unique within the product
    pub name: String,
    /// Blank template markup
    #[serde(rename = "svg")]
    pub svg_markup: String,
}

impl Variation {
    /// Create variation
    #[inline]
    #[must_use]
    pub fn new(name: impl Into<String>, svg_markup: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            svg_markup: svg_markup.into(),
        }
    }
}

/// A colourable product template
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    /// Catalog identifier
    pub id: ProductId,
    /// Display name
    #[serde(default)]
    pub name: String,
    /// Owning manufacturer, when the catalog reports one
    #[serde(default)]
    pub manufacturer: Option<ManufacturerId>,
    /// Palette, in catalog order
    pub colors: Vec<Color>,
    /// Layouts, in catalog order (the first is the primary one)
    pub variations: Vec<Variation>,
}

impl Product {
    /// Create product
    #[must_use]
    pub fn new(id: impl Into<ProductId>, colors: Vec<Color>, variations: Vec<Variation>) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            manufacturer: None,
            colors,
            variations,
        }
    }

    /// With display name
    #[inline]
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// With manufacturer
    #[inline]
    #[must_use]
    pub fn with_manufacturer(mut self, manufacturer: impl Into<ManufacturerId>) -> Self {
        self.manufacturer = Some(manufacturer.into());
        self
    }

    /// Position of the colour whose name softly matches `name`
    #[must_use]
    pub fn color_index(&self, name: &str) -> Option<usize> {
        self.colors.iter().position(|color| soft_eq(&color.name, name))
    }

    /// Position of the variation whose name softly matches `name`
    #[must_use]
    pub fn variation_index(&self, name: &str) -> Option<usize> {
        self.variations
            .iter()
            .position(|variation| soft_eq(&variation.name, name))
    }

    /// Variation whose name softly matches `name`
    #[must_use]
    pub fn variation(&self, name: &str) -> Option<&Variation> {
        self.variation_index(name).map(|i| &self.variations[i])
    }

    /// Copy of this product with some variation templates replaced.
    ///
    /// Names are matched softly; overrides naming no variation are ignored.
    #[must_use]
    pub fn with_variation_markup<'a, I>(&self, overrides: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut product = self.clone();
        for (name, markup) in overrides {
            if let Some(i) = product.variation_index(name) {
                product.variations[i].svg_markup = markup.to_string();
            }
        }
        product
    }
}

/// Catalog wire shape of a product
#[derive(Debug, Clone, Deserialize)]
pub struct RawProduct {
    /// Catalog identifier
    pub id: ProductId,
    /// Display name
    #[serde(default)]
    pub name: String,
    /// Owning manufacturer
    #[serde(default)]
    pub manufacturer: Option<ManufacturerId>,
    /// JSON-encoded `Vec<Color>`
    pub colors: String,
    /// JSON-encoded `Vec<Variation>`
    pub variations: String,
}

impl TryFrom<RawProduct> for Product {
    type Error = ModelError;

    fn try_from(raw: RawProduct) -> Result<Self, Self::Error> {
        let colors = serde_json::from_str(&raw.colors)
            .map_err(|e| ModelError::malformed("colors", e))?;
        let variations = serde_json::from_str(&raw.variations)
            .map_err(|e| ModelError::malformed("variations", e))?;

        Ok(Self {
            id: raw.id,
            name: raw.name,
            manufacturer: raw.manufacturer,
            colors,
            variations,
        })
    }
}

/// Product manufacturer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manufacturer {
    /// Manufacturer identifier
    pub id: ManufacturerId,
    /// Display name
    pub name: String,
    /// Homepage, when listed
    #[serde(default)]
    pub website: Option<String>,
}
