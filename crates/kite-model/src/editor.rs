//! Selection-then-apply colour assignment model
//!
//! The model tracks:
//! - The current colour and current variation (always members of the product)
//! - The applied colours for every variation the user has touched
//!
//! `apply_color` is the only mutation of the applied colours. Nothing here
//! touches rendered markup; previews and final output go through the
//! composition engine.

use crate::assignment::{AppliedColors, PanelColorAssignment};
use crate::error::{ModelError, ModelResult};
use crate::product::{Color, Product, Variation};
use std::sync::Arc;

/// Requested initial selection, matched softly by name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionDefaults {
    /// Preferred colour name
    pub color: Option<String>,
    /// Preferred variation name
    pub variation: Option<String>,
}

impl SelectionDefaults {
    /// No preference: first colour, first variation
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With preferred colour
    #[inline]
    #[must_use]
    pub fn with_color(mut self, name: impl Into<String>) -> Self {
        self.color = Some(name.into());
        self
    }

    /// With preferred variation
    #[inline]
    #[must_use]
    pub fn with_variation(mut self, name: impl Into<String>) -> Self {
        self.variation = Some(name.into());
        self
    }
}

/// Panel colour assignments for one editing session
#[derive(Debug, Clone)]
pub struct ColorAssignmentModel {
    product: Arc<Product>,
    /// Index into `product.colors`
    current_color: usize,
    /// Index into `product.variations`
    current_variation: usize,
    applied: AppliedColors,
}

impl ColorAssignmentModel {
    /// Start editing `product`.
    ///
    /// A default that matches nothing falls back to the first entry.
    ///
    /// # Errors
    /// `ModelError::EmptyProduct` if the product has no colours or no
    /// variations.
    pub fn new(product: impl Into<Arc<Product>>, defaults: &SelectionDefaults) -> ModelResult<Self> {
        let product = product.into();

        if product.colors.is_empty() {
            return Err(ModelError::EmptyProduct {
                product: product.id.clone(),
                missing: "colors",
            });
        }
        if product.variations.is_empty() {
            return Err(ModelError::EmptyProduct {
                product: product.id.clone(),
                missing: "variations",
            });
        }

        let current_color = defaults
            .color
            .as_deref()
            .and_then(|name| product.color_index(name))
            .unwrap_or(0);
        let current_variation = defaults
            .variation
            .as_deref()
            .and_then(|name| product.variation_index(name))
            .unwrap_or(0);

        Ok(Self {
            product,
            current_color,
            current_variation,
            applied: AppliedColors::new(),
        })
    }

    /// The product being edited
    #[inline]
    #[must_use]
    pub fn product(&self) -> &Arc<Product> {
        &self.product
    }

    /// Currently selected colour
    #[inline]
    #[must_use]
    pub fn current_color(&self) -> &Color {
        &self.product.colors[self.current_color]
    }

    /// Currently selected variation
    #[inline]
    #[must_use]
    pub fn current_variation(&self) -> &Variation {
        &self.product.variations[self.current_variation]
    }

    /// All applied colours
    #[inline]
    #[must_use]
    pub fn applied_colors(&self) -> &AppliedColors {
        &self.applied
    }

    /// Applied colours of the current variation (empty if untouched)
    #[must_use]
    pub fn current_variation_colors(&self) -> &PanelColorAssignment {
        self.applied.for_variation(&self.current_variation().name)
    }

    /// Select the colour named `name`.
    ///
    /// Returns `false` and keeps the prior selection when nothing matches.
    pub fn select_color(&mut self, name: &str) -> bool {
        match self.product.color_index(name) {
            Some(i) => {
                self.current_color = i;
                true
            }
            None => {
                tracing::debug!(color = name, "ignoring selection of unknown colour");
                false
            }
        }
    }

    /// Select the variation named `name`.
    ///
    /// Returns `false` and keeps the prior selection when nothing matches.
    pub fn select_variation(&mut self, name: &str) -> bool {
        match self.product.variation_index(name) {
            Some(i) => {
                self.current_variation = i;
                true
            }
            None => {
                tracing::debug!(variation = name, "ignoring selection of unknown variation");
                false
            }
        }
    }

    /// Paint `panel_id` of the current variation with the current colour.
    ///
    /// Idempotent; returns whether the state changed.
    pub fn apply_color(&mut self, panel_id: &str) -> bool {
        let color = self.current_color().clone();
        let variation = self.current_variation().name.clone();
        self.applied.assign(variation, panel_id, color)
    }

    /// Copy of the applied colours at this instant
    #[inline]
    #[must_use]
    pub fn snapshot(&self) -> AppliedColors {
        self.applied.clone()
    }

    /// Discard every assignment, keeping the selection
    pub fn reset(&mut self) {
        self.applied = AppliedColors::new();
    }
}
