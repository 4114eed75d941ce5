//! Sparse panel colour assignments
//!
//! Two levels of ordered maps: variation name → panel id → colour.
//!
//! Absence is meaningful at both levels and means the same thing as an empty
//! entry: a variation with no map, and a panel with no entry, both keep the
//! template's baked-in appearance.

use crate::error::ModelError;
use crate::product::{Color, Product};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

static EMPTY_ASSIGNMENT: PanelColorAssignment = PanelColorAssignment::new();

/// Panel id → colour for a single variation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PanelColorAssignment(BTreeMap<String, Color>);

impl PanelColorAssignment {
    /// Create empty assignment
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Assign `color` to `panel_id`, returning whether the map changed
    pub fn assign(&mut self, panel_id: impl Into<String>, color: Color) -> bool {
        let panel_id = panel_id.into();
        if self.0.get(&panel_id) == Some(&color) {
            return false;
        }
        self.0.insert(panel_id, color);
        true
    }

    /// Colour assigned to `panel_id`
    #[inline]
    #[must_use]
    pub fn get(&self, panel_id: &str) -> Option<&Color> {
        self.0.get(panel_id)
    }

    /// Whether `panel_id` has an assignment
    #[inline]
    #[must_use]
    pub fn contains(&self, panel_id: &str) -> bool {
        self.0.contains_key(panel_id)
    }

    /// Assignments ordered by panel id
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Color)> {
        self.0.iter().map(|(panel, color)| (panel.as_str(), color))
    }

    /// Number of assigned panels
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no panel is assigned
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Distinct colours in use, in panel id order
    #[must_use]
    pub fn used_colors(&self) -> Vec<&Color> {
        let mut used: Vec<&Color> = Vec::new();
        for color in self.0.values() {
            if !used.contains(&color) {
                used.push(color);
            }
        }
        used
    }
}

impl<K: Into<String>> FromIterator<(K, Color)> for PanelColorAssignment {
    fn from_iter<I: IntoIterator<Item = (K, Color)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, c)| (k.into(), c)).collect())
    }
}

/// Variation name → panel assignment for a whole product
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AppliedColors(BTreeMap<String, PanelColorAssignment>);

impl AppliedColors {
    /// Create empty map
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Assignment for `variation`; an untouched variation yields an empty map
    #[must_use]
    pub fn for_variation(&self, variation: &str) -> &PanelColorAssignment {
        self.0.get(variation).unwrap_or(&EMPTY_ASSIGNMENT)
    }

    /// Assign a colour, creating the variation's map on first use.
    ///
    /// Returns whether the state changed.
    pub fn assign(
        &mut self,
        variation: impl Into<String>,
        panel_id: impl Into<String>,
        color: Color,
    ) -> bool {
        self.0
            .entry(variation.into())
            .or_default()
            .assign(panel_id, color)
    }

    /// Variations that have a map, ordered by name
    pub fn variations(&self) -> impl Iterator<Item = (&str, &PanelColorAssignment)> {
        self.0.iter().map(|(name, map)| (name.as_str(), map))
    }

    /// Whether any variation has been touched
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.values().all(PanelColorAssignment::is_empty)
    }

    /// Distinct colours used by `variation`
    #[must_use]
    pub fn used_colors(&self, variation: &str) -> Vec<&Color> {
        self.for_variation(variation).used_colors()
    }

    /// Check that every key names a variation of `product` (exact names).
    ///
    /// # Errors
    /// `ModelError::UnknownVariation` for the first foreign key.
    pub fn validate_against(&self, product: &Product) -> Result<(), ModelError> {
        for name in self.0.keys() {
            if !product.variations.iter().any(|v| &v.name == name) {
                return Err(ModelError::UnknownVariation(name.clone()));
            }
        }
        Ok(())
    }
}
