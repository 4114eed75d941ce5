//! Error types for composition
//!
//! Templates are system-controlled, so any failure here is structural: the
//! variation cannot be composed and nothing partial may be saved.

/// Errors reading a template document
#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    /// The markup is not well-formed XML
    #[error("malformed markup: {0}")]
    Malformed(#[from] roxmltree::Error),

    /// The document contains no `svg` element
    #[error("no svg element in document")]
    MissingSvgRoot,
}

/// Errors composing a variation
#[derive(Debug, thiserror::Error)]
pub enum ComposeError {
    /// The variation's template could not be read
    #[error("invalid template for variation '{variation}': {source}")]
    InvalidTemplate {
        /// Variation name
        variation: String,
        #[source]
        source: DocumentError,
    },
}

impl ComposeError {
    /// Create invalid template error
    pub fn invalid_template(variation: impl Into<String>, source: DocumentError) -> Self {
        Self::InvalidTemplate {
            variation: variation.into(),
            source,
        }
    }

    /// Name of the variation that failed
    #[must_use]
    pub fn variation(&self) -> &str {
        match self {
            Self::InvalidTemplate { variation, .. } => variation,
        }
    }
}
