//! Testing utilities for the KitePaint workspace
//!
//! Shared fixtures and in-memory service fakes.

#![allow(missing_docs)]

use async_trait::async_trait;
use kite_api::{ApiError, ApiResult, CachePolicy, CatalogService, DesignFilter, DesignStorage, Navigator};
use kite_model::{
    Color, Design, DesignId, Manufacturer, ManufacturerId, Product, ProductId, SavedDesign,
    Variation,
};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use tokio::sync::{Notify, Semaphore};

pub const FRONT_SVG: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 100 40"><path data-id="p1" fill="#ffffff" d="M0 0L50 0L50 40Z"/><path data-id="p2" fill="#ffffff" d="M50 0L100 0L50 40Z"/></svg>"##;

pub const BACK_SVG: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 100 40"><path data-id="p1" fill="#ffffff" d="M0 0L100 0L100 40Z"/></svg>"##;

pub fn red() -> Color {
    Color::new("Red", "#ff0000")
}

pub fn blue() -> Color {
    Color::new("Blue", "#0000ff")
}

pub fn black() -> Color {
    Color::new("Black", "#000000")
}

/// Two-variation product: `front` (p1, p2) and `back` (p1)
pub fn kite_product() -> Product {
    Product::new(
        "kite",
        vec![red(), blue(), black()],
        vec![
            Variation::new("front", FRONT_SVG),
            Variation::new("back", BACK_SVG),
        ],
    )
    .with_name("Kite")
    .with_manufacturer("m1")
}

pub fn manufacturer(id: &str, name: &str) -> Manufacturer {
    Manufacturer {
        id: ManufacturerId::new(id),
        name: name.to_string(),
        website: None,
    }
}

pub fn saved_design(id: &str, product: &str) -> SavedDesign {
    SavedDesign {
        id: DesignId::new(id),
        created: None,
        name: format!("Design {id}"),
        owner_id: None,
        product_id: Some(ProductId::new(product)),
        variations: Vec::new(),
    }
}

/// Holds calls until the test lets them through
#[derive(Debug)]
pub struct Gate {
    held: AtomicBool,
    arrivals: AtomicUsize,
    arrived: Notify,
    permits: Semaphore,
}

impl Default for Gate {
    fn default() -> Self {
        Self {
            held: AtomicBool::new(false),
            arrivals: AtomicUsize::new(0),
            arrived: Notify::new(),
            permits: Semaphore::new(0),
        }
    }
}

impl Gate {
    /// Start holding calls
    pub fn hold(&self) {
        self.held.store(true, Ordering::SeqCst);
    }

    /// Let `n` held calls through
    pub fn release(&self, n: usize) {
        self.permits.add_permits(n);
    }

    /// Calls that reached the gate while it was held
    pub fn arrivals(&self) -> usize {
        self.arrivals.load(Ordering::SeqCst)
    }

    /// Wait until `n` calls are parked at the gate
    pub async fn wait_for_arrivals(&self, n: usize) {
        loop {
            let mut notified = std::pin::pin!(self.arrived.notified());
            // Enabled before the count check.
            notified.as_mut().enable();
            if self.arrivals() >= n {
                return;
            }
            notified.await;
        }
    }

    async fn pass(&self) -> ApiResult<()> {
        if !self.held.load(Ordering::SeqCst) {
            return Ok(());
        }
        self.arrivals.fetch_add(1, Ordering::SeqCst);
        self.arrived.notify_waiters();
        let permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| ApiError::Transport("gate closed".into()))?;
        permit.forget();
        Ok(())
    }
}

/// Shared call bookkeeping for the fakes
#[derive(Debug, Default)]
struct Calls {
    count: AtomicUsize,
    failure: Mutex<Option<String>>,
    gate: Gate,
}

impl Calls {
    async fn enter(&self) -> ApiResult<()> {
        self.count.fetch_add(1, Ordering::SeqCst);
        self.gate.pass().await?;
        match self.failure.lock().clone() {
            Some(message) => Err(ApiError::rejected(message)),
            None => Ok(()),
        }
    }
}

/// In-memory `CatalogService`
#[derive(Debug, Default)]
pub struct FakeCatalog {
    products: Mutex<Vec<Product>>,
    manufacturers: Mutex<Vec<Manufacturer>>,
    calls: Calls,
}

impl FakeCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_product(self, product: Product) -> Self {
        self.products.lock().push(product);
        self
    }

    pub fn with_manufacturer(self, manufacturer: Manufacturer) -> Self {
        self.manufacturers.lock().push(manufacturer);
        self
    }

    /// Every later call is rejected with `message`
    pub fn fail_with(&self, message: &str) {
        *self.calls.failure.lock() = Some(message.to_string());
    }

    pub fn calls(&self) -> usize {
        self.calls.count.load(Ordering::SeqCst)
    }

    pub fn gate(&self) -> &Gate {
        &self.calls.gate
    }
}

#[async_trait]
impl CatalogService for FakeCatalog {
    async fn fetch_product(&self, id: &ProductId) -> ApiResult<Product> {
        self.calls.enter().await?;
        self.products
            .lock()
            .iter()
            .find(|p| &p.id == id)
            .cloned()
            .ok_or_else(|| ApiError::NotFound(format!("product {id}")))
    }

    async fn fetch_manufacturer(&self, id: &ManufacturerId) -> ApiResult<Manufacturer> {
        self.calls.enter().await?;
        self.manufacturers
            .lock()
            .iter()
            .find(|m| &m.id == id)
            .cloned()
            .ok_or_else(|| ApiError::NotFound(format!("manufacturer {id}")))
    }

    async fn list_products(&self, _cache: CachePolicy) -> ApiResult<Vec<Product>> {
        self.calls.enter().await?;
        Ok(self.products.lock().clone())
    }

    async fn list_manufacturers(&self, _cache: CachePolicy) -> ApiResult<Vec<Manufacturer>> {
        self.calls.enter().await?;
        Ok(self.manufacturers.lock().clone())
    }
}

/// In-memory `DesignStorage`; ids are assigned from 1 upwards
#[derive(Debug, Default)]
pub struct FakeStorage {
    designs: Mutex<Vec<SavedDesign>>,
    created: Mutex<Vec<Design>>,
    listings: Mutex<Vec<DesignFilter>>,
    next_id: AtomicU64,
    calls: Calls,
}

impl FakeStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_designs(self, designs: impl IntoIterator<Item = SavedDesign>) -> Self {
        self.designs.lock().extend(designs);
        self
    }

    /// Every later call is rejected with `message`
    pub fn fail_with(&self, message: &str) {
        *self.calls.failure.lock() = Some(message.to_string());
    }

    pub fn calls(&self) -> usize {
        self.calls.count.load(Ordering::SeqCst)
    }

    pub fn gate(&self) -> &Gate {
        &self.calls.gate
    }

    /// Designs passed to `create_design`, in call order
    pub fn created(&self) -> Vec<Design> {
        self.created.lock().clone()
    }

    /// Filters passed to `list_designs`, in call order
    pub fn listings(&self) -> Vec<DesignFilter> {
        self.listings.lock().clone()
    }

    pub fn stored(&self) -> Vec<SavedDesign> {
        self.designs.lock().clone()
    }
}

#[async_trait]
impl DesignStorage for FakeStorage {
    async fn create_design(&self, design: &Design) -> ApiResult<DesignId> {
        self.calls.enter().await?;
        let id = DesignId::new((self.next_id.fetch_add(1, Ordering::SeqCst) + 1).to_string());
        self.created.lock().push(design.clone());
        self.designs.lock().push(SavedDesign {
            id: id.clone(),
            created: None,
            name: design.name.clone(),
            owner_id: Some(design.owner_id.clone()),
            product_id: Some(design.product_id.clone()),
            variations: design.variations.clone(),
        });
        Ok(id)
    }

    async fn fetch_design(&self, id: &DesignId) -> ApiResult<SavedDesign> {
        self.calls.enter().await?;
        self.designs
            .lock()
            .iter()
            .find(|d| &d.id == id)
            .cloned()
            .ok_or_else(|| ApiError::NotFound(format!("design {id}")))
    }

    async fn delete_design(&self, id: &DesignId) -> ApiResult<()> {
        self.calls.enter().await?;
        let mut designs = self.designs.lock();
        let index = designs
            .iter()
            .position(|d| &d.id == id)
            .ok_or_else(|| ApiError::rejected("There was an error deleting the design."))?;
        designs.remove(index);
        Ok(())
    }

    async fn list_designs(
        &self,
        filter: &DesignFilter,
        _cache: CachePolicy,
    ) -> ApiResult<Vec<SavedDesign>> {
        self.listings.lock().push(filter.clone());
        self.calls.enter().await?;
        Ok(self
            .designs
            .lock()
            .iter()
            .skip(filter.limit.offset)
            .take(filter.limit.count)
            .cloned()
            .collect())
    }
}

/// `Navigator` that remembers where it was sent
#[derive(Debug, Default)]
pub struct RecordingNavigator {
    redirects: Mutex<Vec<DesignId>>,
}

impl RecordingNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn redirects(&self) -> Vec<DesignId> {
        self.redirects.lock().clone()
    }
}

impl Navigator for RecordingNavigator {
    fn redirect_to_edit(&self, design: &DesignId) {
        self.redirects.lock().push(design.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn storage_assigns_sequential_ids() {
        let storage = FakeStorage::new();
        let design = Design {
            name: "Test".into(),
            owner_id: "7".into(),
            product_id: "kite".into(),
            variations: Vec::new(),
        };
        assert_eq!(storage.create_design(&design).await.unwrap(), DesignId::new("1"));
        assert_eq!(storage.create_design(&design).await.unwrap(), DesignId::new("2"));
        assert_eq!(storage.stored().len(), 2);
    }

    #[tokio::test]
    async fn gate_holds_until_released() {
        let catalog = Arc::new(FakeCatalog::new().with_product(kite_product()));
        catalog.gate().hold();

        let task = tokio::spawn({
            let catalog = Arc::clone(&catalog);
            async move { catalog.fetch_product(&ProductId::new("kite")).await }
        });
        catalog.gate().wait_for_arrivals(1).await;
        assert!(!task.is_finished());

        catalog.gate().release(1);
        assert_eq!(task.await.unwrap().unwrap().name, "Kite");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn waits_for_every_parked_call() {
        let catalog = Arc::new(FakeCatalog::new().with_product(kite_product()));
        catalog.gate().hold();
        catalog.gate().wait_for_arrivals(0).await;

        let waiter = tokio::spawn({
            let catalog = Arc::clone(&catalog);
            async move { catalog.gate().wait_for_arrivals(2).await }
        });
        let calls: Vec<_> = (0..2)
            .map(|_| {
                let catalog = Arc::clone(&catalog);
                tokio::spawn(async move { catalog.fetch_product(&ProductId::new("kite")).await })
            })
            .collect();

        waiter.await.unwrap();
        assert_eq!(catalog.gate().arrivals(), 2);
        catalog.gate().release(2);
        for call in calls {
            assert!(call.await.unwrap().is_ok());
        }
    }

    #[tokio::test]
    async fn failure_is_rejection() {
        let catalog = FakeCatalog::new();
        catalog.fail_with("boom");
        let err = catalog.list_products(CachePolicy::Use).await.unwrap_err();
        assert!(err.is_rejection());
        assert_eq!(catalog.calls(), 1);
    }
}
