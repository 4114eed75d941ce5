//! Composition of variations
//!
//! `compose` is pure: identical `(variation, assignment)` pairs yield
//! byte-identical markup, and the product template is never modified.

use crate::error::ComposeError;
use crate::svg::SvgDocument;
use kite_model::{AppliedColors, Color, ComposedVariation, PanelColorAssignment, Product, Variation};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Which attributes address panels and carry their colour
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComposeOptions {
    /// Attribute holding the panel id
    pub panel_attribute: String,
    /// Attribute receiving the colour value
    pub fill_attribute: String,
}

impl Default for ComposeOptions {
    fn default() -> Self {
        Self {
            panel_attribute: "data-id".to_string(),
            fill_attribute: "fill".to_string(),
        }
    }
}

impl ComposeOptions {
    /// With panel id attribute
    #[inline]
    #[must_use]
    pub fn with_panel_attribute(mut self, name: impl Into<String>) -> Self {
        self.panel_attribute = name.into();
        self
    }

    /// With fill attribute
    #[inline]
    #[must_use]
    pub fn with_fill_attribute(mut self, name: impl Into<String>) -> Self {
        self.fill_attribute = name.into();
        self
    }
}

/// Vector composition engine
#[derive(Debug, Clone, Default)]
pub struct Composer {
    options: ComposeOptions,
}

impl Composer {
    /// Create composer with default attributes (`data-id`, `fill`)
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create composer with custom attributes
    #[inline]
    #[must_use]
    pub fn with_options(options: ComposeOptions) -> Self {
        Self { options }
    }

    /// Attribute configuration
    #[inline]
    #[must_use]
    pub fn options(&self) -> &ComposeOptions {
        &self.options
    }

    /// Bake `assignment` into a fresh copy of `variation`'s template.
    ///
    /// For each assigned panel the first element (document order) carrying
    /// the panel id gets its fill set; unassigned panels keep the template
    /// fill and ids missing from the markup are skipped.
    ///
    /// # Errors
    /// `ComposeError::InvalidTemplate` if the template is malformed or has
    /// no `svg` element.
    pub fn compose(
        &self,
        variation: &Variation,
        assignment: &PanelColorAssignment,
    ) -> Result<String, ComposeError> {
        let mut doc = SvgDocument::parse(&variation.svg_markup)
            .map_err(|e| ComposeError::invalid_template(&variation.name, e))?;

        let mut pending: BTreeMap<&str, &Color> = assignment.iter().collect();
        let panel_attribute = self.options.panel_attribute.as_str();
        let fill_attribute = self.options.fill_attribute.as_str();

        doc.for_each_element_mut(|element| {
            let color = element
                .attribute(panel_attribute)
                .and_then(|id| pending.remove(id));
            if let Some(color) = color {
                element.set_attribute(fill_attribute, &color.hex);
            }
        });

        for panel in pending.keys() {
            tracing::debug!(variation = %variation.name, panel, "assigned panel not found in template");
        }

        Ok(doc.to_markup())
    }

    /// Compose one variation into its output artifact
    ///
    /// # Errors
    /// See [`Composer::compose`].
    pub fn compose_variation(
        &self,
        variation: &Variation,
        assignment: &PanelColorAssignment,
        is_primary: bool,
    ) -> Result<ComposedVariation, ComposeError> {
        Ok(ComposedVariation {
            name: variation.name.clone(),
            is_primary,
            svg_markup: self.compose(variation, assignment)?,
        })
    }

    /// Compose every variation of `product`, in product order.
    ///
    /// Untouched variations compose with an empty assignment; the first
    /// variation is the primary one.
    ///
    /// # Errors
    /// The first variation that fails aborts the whole batch.
    pub fn compose_all(
        &self,
        product: &Product,
        applied: &AppliedColors,
    ) -> Result<Vec<ComposedVariation>, ComposeError> {
        product
            .variations
            .iter()
            .enumerate()
            .map(|(index, variation)| {
                self.compose_variation(variation, applied.for_variation(&variation.name), index == 0)
            })
            .collect()
    }
}

/// Compose with the default attribute configuration
///
/// # Errors
/// See [`Composer::compose`].
pub fn compose(variation: &Variation, assignment: &PanelColorAssignment) -> Result<String, ComposeError> {
    Composer::new().compose(variation, assignment)
}
