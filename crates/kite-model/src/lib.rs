//! KitePaint Model
//!
//! The data a design session works with:
//! - Catalog types (`Product`, `Color`, `Variation`, `Manufacturer`)
//! - Persisted designs (`Design`, `SavedDesign`, `ComposedVariation`)
//! - Sparse panel colour assignments (`PanelColorAssignment`, `AppliedColors`)
//! - The selection-then-apply editing model (`ColorAssignmentModel`)
//!
//! # Example
//!
//! ```rust,ignore
//! use kite_model::{ColorAssignmentModel, SelectionDefaults};
//!
//! let mut model = ColorAssignmentModel::new(product, &SelectionDefaults::default())?;
//! model.select_color("Blue");
//! model.apply_color("p1");
//! assert_eq!(model.current_variation_colors().len(), 1);
//! ```

#![warn(unreachable_pub)]

pub mod assignment;
pub mod design;
pub mod editor;
pub mod error;
pub mod ids;
pub mod product;
pub mod text;

// Re-exports for convenience
pub use assignment::{AppliedColors, PanelColorAssignment};
pub use design::{ComposedVariation, Design, RawSavedDesign, SavedDesign};
pub use editor::{ColorAssignmentModel, SelectionDefaults};
pub use error::{ModelError, ModelResult};
pub use ids::{DesignId, ManufacturerId, ProductId, UserId};
pub use product::{Color, Manufacturer, Product, RawProduct, Variation};
pub use text::soft_eq;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
