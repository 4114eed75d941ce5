//! Designs feed
//!
//! Pages through published designs together with the catalog needed to
//! show them (products and their manufacturers).
//!
//! Listings go through the request cache, so a page requested again within
//! the freshness window comes back empty. Empty pages end pagination and
//! merging never drops what is already held.

use crate::error::{SessionError, SessionResult};
use crate::task::{Cancelable, TaskScope, TaskToken};
use kite_api::{CachePolicy, CatalogService, DesignFilter, DesignStorage, PageLimit};
use kite_model::{DesignId, Manufacturer, Product, ProductId, SavedDesign};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Feed configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    /// Designs requested per page
    pub page_size: usize,
    /// Only published designs
    pub public_only: bool,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            page_size: kite_api::filter::DEFAULT_PAGE_SIZE,
            public_only: true,
        }
    }
}

#[derive(Debug, Default)]
struct FeedState {
    designs: Vec<SavedDesign>,
    products: HashMap<ProductId, Product>,
    manufacturers: Vec<Manufacturer>,
    has_more: bool,
    loading: bool,
    error: Option<String>,
    torn_down: bool,
}

impl FeedState {
    fn merge_designs(&mut self, page: Vec<SavedDesign>, page_size: usize) -> usize {
        self.has_more = page.len() >= page_size;
        let mut added = 0;
        for design in page {
            if !self.designs.iter().any(|d| d.id == design.id) {
                self.designs.push(design);
                added += 1;
            }
        }
        added
    }

    fn merge_catalog(&mut self, products: Vec<Product>, manufacturers: Vec<Manufacturer>) {
        for product in products {
            self.products.insert(product.id.clone(), product);
        }
        for manufacturer in manufacturers {
            match self.manufacturers.iter_mut().find(|m| m.id == manufacturer.id) {
                Some(existing) => *existing = manufacturer,
                None => self.manufacturers.push(manufacturer),
            }
        }
        self.manufacturers.sort_by(|a, b| a.name.cmp(&b.name));
    }

    fn discard_load(&mut self) {
        if !self.torn_down {
            self.loading = false;
        }
    }

    fn fail(&mut self, err: SessionError) -> SessionError {
        tracing::warn!(error = %err, "feed request failed");
        self.loading = false;
        self.error = Some(err.user_message());
        err
    }
}

/// Handle to an in-flight page load; yields the number of new designs
pub type PageTask = Cancelable<SessionResult<usize>>;

/// Paged listing of saved designs
pub struct DesignFeed {
    catalog: Arc<dyn CatalogService>,
    storage: Arc<dyn DesignStorage>,
    config: FeedConfig,
    state: Arc<Mutex<FeedState>>,
    scope: TaskScope,
}

impl fmt::Debug for DesignFeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DesignFeed")
            .field("config", &self.config)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl DesignFeed {
    /// Create an empty feed
    pub fn new(
        catalog: Arc<dyn CatalogService>,
        storage: Arc<dyn DesignStorage>,
        config: FeedConfig,
    ) -> Self {
        Self {
            catalog,
            storage,
            config,
            state: Arc::new(Mutex::new(FeedState::default())),
            scope: TaskScope::new(),
        }
    }

    /// Fetch the first page, all products and all manufacturers together.
    ///
    /// Any failure fails the whole load and nothing is merged.
    ///
    /// # Errors
    /// `SessionError::TornDown` if the feed has been torn down.
    pub fn load_initial(&self) -> SessionResult<PageTask> {
        let token = self.live_token()?;
        self.state.lock().loading = true;

        let filter = self.filter(PageLimit::first(self.config.page_size));
        let page_size = self.config.page_size;
        let catalog = Arc::clone(&self.catalog);
        let storage = Arc::clone(&self.storage);

        let fetch = async move {
            tokio::try_join!(
                storage.list_designs(&filter, CachePolicy::Use),
                catalog.list_products(CachePolicy::Use),
                catalog.list_manufacturers(CachePolicy::Use),
            )
        };

        Ok(Cancelable::spawn_settled(
            token,
            Arc::clone(&self.state),
            fetch,
            move |state: &mut FeedState, fetched| match fetched {
                Ok((designs, products, manufacturers)) => {
                    state.merge_catalog(products, manufacturers);
                    let added = state.merge_designs(designs, page_size);
                    state.loading = false;
                    state.error = None;
                    tracing::debug!(added, has_more = state.has_more, "feed loaded");
                    Ok(added)
                }
                Err(err) => Err(state.fail(err.into())),
            },
            FeedState::discard_load,
            |_: &SessionResult<usize>| {},
        ))
    }

    /// Fetch the page after the designs already held
    ///
    /// # Errors
    /// `SessionError::TornDown` if the feed has been torn down.
    pub fn load_more(&self) -> SessionResult<PageTask> {
        let token = self.live_token()?;
        let offset = {
            let mut state = self.state.lock();
            state.loading = true;
            state.designs.len()
        };

        let filter = self.filter(PageLimit::after(offset, self.config.page_size));
        let page_size = self.config.page_size;
        let storage = Arc::clone(&self.storage);

        Ok(Cancelable::spawn_settled(
            token,
            Arc::clone(&self.state),
            async move { storage.list_designs(&filter, CachePolicy::Use).await },
            move |state: &mut FeedState, fetched| match fetched {
                Ok(designs) => {
                    let added = state.merge_designs(designs, page_size);
                    state.loading = false;
                    state.error = None;
                    tracing::debug!(offset, added, has_more = state.has_more, "feed page loaded");
                    Ok(added)
                }
                Err(err) => Err(state.fail(err.into())),
            },
            FeedState::discard_load,
            |_: &SessionResult<usize>| {},
        ))
    }

    /// Delete a design and drop it from the feed once the backend confirms
    ///
    /// # Errors
    /// `SessionError::TornDown` if the feed has been torn down.
    pub fn delete_design(&self, id: DesignId) -> SessionResult<Cancelable<SessionResult<()>>> {
        let token = self.live_token()?;
        let storage = Arc::clone(&self.storage);
        let target = id.clone();

        Ok(Cancelable::spawn_guarded(
            token,
            Arc::clone(&self.state),
            async move { storage.delete_design(&target).await },
            move |state: &mut FeedState, deleted| match deleted {
                Ok(()) => {
                    state.designs.retain(|d| d.id != id);
                    tracing::info!(design = %id, "design removed from feed");
                    Ok(())
                }
                Err(err) => Err(state.fail(err.into())),
            },
        ))
    }

    /// Designs held, in arrival order
    #[must_use]
    pub fn designs(&self) -> Vec<SavedDesign> {
        self.state.lock().designs.clone()
    }

    /// Whether the last page was full
    #[must_use]
    pub fn has_more(&self) -> bool {
        self.state.lock().has_more
    }

    /// Whether a load is in flight
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.state.lock().loading
    }

    /// Message of the last failure, cleared by the next success
    #[must_use]
    pub fn error(&self) -> Option<String> {
        self.state.lock().error.clone()
    }

    /// Product by id
    #[must_use]
    pub fn product(&self, id: &ProductId) -> Option<Product> {
        self.state.lock().products.get(id).cloned()
    }

    /// Manufacturers sorted by name
    #[must_use]
    pub fn manufacturers(&self) -> Vec<Manufacturer> {
        self.state.lock().manufacturers.clone()
    }

    /// Manufacturer of the given product
    #[must_use]
    pub fn manufacturer_for_product(&self, id: &ProductId) -> Option<Manufacturer> {
        let state = self.state.lock();
        let manufacturer = state.products.get(id)?.manufacturer.as_ref()?;
        state
            .manufacturers
            .iter()
            .find(|m| &m.id == manufacturer)
            .cloned()
    }

    /// Cancel every outstanding request; idempotent
    pub fn teardown(&self) -> usize {
        let mut state = self.state.lock();
        state.torn_down = true;
        self.scope.teardown()
    }

    fn filter(&self, limit: PageLimit) -> DesignFilter {
        let filter = DesignFilter::new().with_limit(limit);
        if self.config.public_only {
            filter
        } else {
            filter.including_private()
        }
    }

    fn live_token(&self) -> SessionResult<TaskToken> {
        if self.scope.is_torn_down() {
            return Err(SessionError::TornDown);
        }
        Ok(self.scope.token())
    }
}

impl Drop for DesignFeed {
    fn drop(&mut self) {
        self.teardown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kite_test_utils::{kite_product, manufacturer, saved_design, FakeCatalog, FakeStorage};

    #[test]
    fn merge_skips_known_ids() {
        let mut state = FeedState::default();
        state.merge_designs(vec![saved_design("1", "kite"), saved_design("2", "kite")], 2);
        assert!(state.has_more);
        let added = state.merge_designs(vec![saved_design("2", "kite")], 2);
        assert_eq!(added, 0);
        assert!(!state.has_more);
        assert_eq!(state.designs.len(), 2);
    }

    #[test]
    fn empty_catalog_page_keeps_index() {
        let mut state = FeedState::default();
        state.merge_catalog(vec![kite_product()], vec![manufacturer("m1", "Ozone")]);
        state.merge_catalog(Vec::new(), Vec::new());
        assert_eq!(state.products.len(), 1);
        assert_eq!(state.manufacturers.len(), 1);
    }

    #[tokio::test]
    async fn joins_product_to_manufacturer() {
        let catalog = FakeCatalog::new()
            .with_product(kite_product())
            .with_manufacturer(manufacturer("m2", "Zeta"))
            .with_manufacturer(manufacturer("m1", "Airush"));
        let feed = DesignFeed::new(
            Arc::new(catalog),
            Arc::new(FakeStorage::new()),
            FeedConfig::default(),
        );
        feed.load_initial().unwrap().join().await.unwrap().unwrap();

        let names: Vec<_> = feed.manufacturers().into_iter().map(|m| m.name).collect();
        assert_eq!(names, ["Airush", "Zeta"]);
        assert_eq!(
            feed.manufacturer_for_product(&ProductId::new("kite")).unwrap().name,
            "Airush"
        );
        assert!(feed.manufacturer_for_product(&ProductId::new("none")).is_none());
    }
}
