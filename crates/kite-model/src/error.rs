//! Error types for the model layer
//!
//! Covers:
//! - Wire payloads whose nested JSON fields fail to decode
//! - Products that cannot back an editing session
//! - Assignment maps that reference variations the product lacks

use crate::ids::ProductId;

/// Model errors
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    /// A JSON-encoded field of a wire payload did not decode
    #[error("malformed `{field}` payload: {source}")]
    MalformedField {
        /// Name of the offending field
        field: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// The product lacks colours or variations, so no selection can exist
    #[error("product {product} has no {missing}")]
    EmptyProduct {
        /// The product that was loaded
        product: ProductId,
        /// Which list was empty ("colors" or "variations")
        missing: &'static str,
    },

    /// An assignment map names a variation the product does not have
    #[error("unknown variation: '{0}'")]
    UnknownVariation(String),
}

impl ModelError {
    /// Create malformed field error
    pub fn malformed(field: &'static str, source: serde_json::Error) -> Self {
        Self::MalformedField { field, source }
    }
}

/// Result type alias for model operations
pub type ModelResult<T> = Result<T, ModelError>;
