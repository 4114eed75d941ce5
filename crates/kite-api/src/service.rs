//! Service contracts
//!
//! The editor and feed depend on these traits only. `KitePaintClient`
//! implements the storage and catalog services over HTTP; tests plug in
//! in-memory fakes.

use crate::cache::CachePolicy;
use crate::error::ApiResult;
use crate::filter::DesignFilter;
use async_trait::async_trait;
use kite_model::{Design, DesignId, Manufacturer, ManufacturerId, Product, ProductId, SavedDesign};

/// Read access to products and manufacturers
#[async_trait]
pub trait CatalogService: Send + Sync {
    /// Fetch one product
    async fn fetch_product(&self, id: &ProductId) -> ApiResult<Product>;

    /// Fetch one manufacturer
    async fn fetch_manufacturer(&self, id: &ManufacturerId) -> ApiResult<Manufacturer>;

    /// All active products.
    ///
    /// With `CachePolicy::Use` a recently made identical call yields an
    /// empty list.
    async fn list_products(&self, cache: CachePolicy) -> ApiResult<Vec<Product>>;

    /// All active manufacturers; caching as for `list_products`
    async fn list_manufacturers(&self, cache: CachePolicy) -> ApiResult<Vec<Manufacturer>>;
}

/// Persistence for saved designs
#[async_trait]
pub trait DesignStorage: Send + Sync {
    /// Persist a new design, returning the id the backend assigned
    async fn create_design(&self, design: &Design) -> ApiResult<DesignId>;

    /// Fetch one saved design
    async fn fetch_design(&self, id: &DesignId) -> ApiResult<SavedDesign>;

    /// Delete a design
    async fn delete_design(&self, id: &DesignId) -> ApiResult<()>;

    /// List designs matching `filter`.
    ///
    /// With `CachePolicy::Use` a recently made call with the same filter
    /// yields an empty list.
    async fn list_designs(
        &self,
        filter: &DesignFilter,
        cache: CachePolicy,
    ) -> ApiResult<Vec<SavedDesign>>;
}

/// Where the user goes after a successful save
pub trait Navigator: Send + Sync {
    /// Open the editing view for `design`
    fn redirect_to_edit(&self, design: &DesignId);
}
