//! KitePaint Composition Engine
//!
//! Turns a blank variation template plus its panel assignment into final
//! vector markup.
//!
//! # Core Operations
//!
//! - **Parse**: template markup → owned `SvgDocument`
//! - **Transform**: set the fill of every assigned panel
//! - **Serialize**: root `svg` element → markup
//!
//! # Architecture
//!
//! ```text
//! Variation.svg_markup → SvgDocument::parse → paint panels → to_markup → ComposedVariation
//! ```
//!
//! Every call parses its own working copy, so composing the same template
//! repeatedly, or several variations of one product at once, never shares
//! mutable state.
//!
//! # Example
//!
//! ```rust,ignore
//! use kite_compose::Composer;
//!
//! let composer = Composer::new();
//! let markup = composer.compose(&variation, applied.for_variation(&variation.name))?;
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod compose;
pub mod error;
pub mod svg;

// Re-exports for convenience
pub use compose::{compose, ComposeOptions, Composer};
pub use error::{ComposeError, DocumentError};
pub use svg::{Attribute, Element, Node, SvgDocument};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
