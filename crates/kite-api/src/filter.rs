//! Design listing filters
//!
//! A `DesignFilter` renders to the query the designs endpoint expects and
//! to a stable signature used as the cache key. Two filters with the same
//! fields always produce the same signature.

use serde::{Deserialize, Serialize};

/// Default page size for design listings
pub const DEFAULT_PAGE_SIZE: usize = 50;

/// Columns requested for listings
const RETURN_FIELDS: [&str; 4] = ["id", "created", "name", "variations"];

/// Window into an ordered listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PageLimit {
    /// Rows to skip
    pub offset: usize,
    /// Rows to return
    pub count: usize,
}

impl Default for PageLimit {
    fn default() -> Self {
        Self::first(DEFAULT_PAGE_SIZE)
    }
}

impl PageLimit {
    /// First `count` rows
    #[inline]
    #[must_use]
    pub const fn first(count: usize) -> Self {
        Self { offset: 0, count }
    }

    /// `count` rows after skipping `offset`
    #[inline]
    #[must_use]
    pub const fn after(offset: usize, count: usize) -> Self {
        Self { offset, count }
    }

    /// Backend syntax: `count`, or `offset, count` past the first page
    #[must_use]
    pub fn render(&self) -> String {
        if self.offset == 0 {
            self.count.to_string()
        } else {
            format!("{}, {}", self.offset, self.count)
        }
    }
}

/// Ordering by design id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SortOrder {
    /// Highest id first
    #[default]
    NewestFirst,
    /// Lowest id first
    OldestFirst,
}

impl SortOrder {
    fn direction(self) -> &'static str {
        match self {
            Self::NewestFirst => "DESC",
            Self::OldestFirst => "ASC",
        }
    }
}

/// Which designs to list
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct DesignFilter {
    /// Only published designs
    pub public_only: bool,
    /// Page window
    pub limit: PageLimit,
    /// Ordering
    pub order: SortOrder,
}

impl Default for DesignFilter {
    fn default() -> Self {
        Self {
            public_only: true,
            limit: PageLimit::default(),
            order: SortOrder::default(),
        }
    }
}

impl DesignFilter {
    /// Public designs, first page of the default size
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Include unpublished designs
    #[inline]
    #[must_use]
    pub fn including_private(mut self) -> Self {
        self.public_only = false;
        self
    }

    /// With page window
    #[inline]
    #[must_use]
    pub fn with_limit(mut self, limit: PageLimit) -> Self {
        self.limit = limit;
        self
    }

    /// With ordering
    #[inline]
    #[must_use]
    pub fn with_order(mut self, order: SortOrder) -> Self {
        self.order = order;
        self
    }

    /// Query parameters for the designs endpoint, in a fixed order
    #[must_use]
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = vec![("filter[active]".to_string(), "1".to_string())];
        if self.public_only {
            pairs.push(("filter[status]".to_string(), "2".to_string()));
        }
        for (index, field) in RETURN_FIELDS.iter().enumerate() {
            pairs.push((format!("return[{index}]"), (*field).to_string()));
        }
        pairs.push(("limit".to_string(), self.limit.render()));
        pairs.push(("order[0]".to_string(), "id".to_string()));
        pairs.push(("order[1]".to_string(), self.order.direction().to_string()));
        pairs
    }

    /// Deterministic cache key for this filter
    #[must_use]
    pub fn signature(&self) -> String {
        self.query_pairs()
            .iter()
            .map(|(key, value)| format!("{key}={value}"))
            .collect::<Vec<_>>()
            .join("&")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_signature() {
        assert_eq!(
            DesignFilter::default().signature(),
            "filter[active]=1&filter[status]=2&return[0]=id&return[1]=created\
             &return[2]=name&return[3]=variations&limit=50&order[0]=id&order[1]=DESC"
        );
    }

    #[test]
    fn private_listing_has_no_status() {
        let signature = DesignFilter::new().including_private().signature();
        assert!(!signature.contains("filter[status]"));
        assert!(signature.starts_with("filter[active]=1&return[0]=id"));
    }

    #[test]
    fn later_pages_render_offset() {
        let filter = DesignFilter::new().with_limit(PageLimit::after(50, 50));
        assert!(filter.signature().contains("&limit=50, 50&"));
        assert_eq!(PageLimit::first(10).render(), "10");
    }

    #[test]
    fn signatures_distinguish_filters() {
        let a = DesignFilter::new();
        let b = DesignFilter::new().with_order(SortOrder::OldestFirst);
        assert_ne!(a.signature(), b.signature());
        assert_eq!(a.signature(), DesignFilter::default().signature());
    }
}
