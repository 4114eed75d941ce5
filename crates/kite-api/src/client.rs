//! HTTP client for the KitePaint backend
//!
//! Implements `CatalogService` and `DesignStorage` on top of a `Transport`.
//! Listings go through a per-endpoint `RequestCache`; single-record
//! fetches and writes never do.
//!
//! Response rules:
//! - A null body is an `EmptyResponse` carrying a fallback message
//! - Writes must answer `{"valid": true, ...}`; anything else is
//!   `Rejected`, with the server's `message` when it sent one
//! - Products and saved designs carry JSON-encoded nested fields that are
//!   decoded here

use crate::cache::{CachePolicy, RequestCache};
use crate::clock::{Clock, SystemClock};
use crate::config::ClientConfig;
use crate::error::{ApiError, ApiResult};
use crate::filter::DesignFilter;
use crate::service::{CatalogService, DesignStorage};
use crate::transport::{ReqwestTransport, Transport};
use async_trait::async_trait;
use kite_model::{
    Design, DesignId, Manufacturer, ManufacturerId, Product, ProductId, RawProduct,
    RawSavedDesign, SavedDesign,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;

const DESIGNS_PATH: &str = "/designs.php";
const PRODUCTS_PATH: &str = "/products.php";
const MANUFACTURERS_PATH: &str = "/manufacturers.php";

const ACTIVE_ONLY: &str = "activated=1";

/// KitePaint backend client
#[derive(Debug)]
pub struct KitePaintClient<T> {
    transport: T,
    designs_cache: RequestCache,
    products_cache: RequestCache,
    manufacturers_cache: RequestCache,
}

impl KitePaintClient<ReqwestTransport> {
    /// Client talking HTTP to `config.base_url`
    ///
    /// # Errors
    /// Returns `ApiError::Http` if the HTTP client cannot be built.
    pub fn connect(config: &ClientConfig) -> ApiResult<Self> {
        Ok(Self::new(ReqwestTransport::new(config)?, config))
    }
}

impl<T: Transport> KitePaintClient<T> {
    /// Client over `transport`, caches reading the system clock
    #[must_use]
    pub fn new(transport: T, config: &ClientConfig) -> Self {
        Self::with_clock(transport, config, Arc::new(SystemClock))
    }

    /// Client whose caches read time from `clock`
    #[must_use]
    pub fn with_clock(transport: T, config: &ClientConfig, clock: Arc<dyn Clock>) -> Self {
        let duration = config.cache_duration();
        Self {
            transport,
            designs_cache: RequestCache::with_clock(duration, Arc::clone(&clock)),
            products_cache: RequestCache::with_clock(duration, Arc::clone(&clock)),
            manufacturers_cache: RequestCache::with_clock(duration, clock),
        }
    }

    /// Underlying transport
    #[inline]
    #[must_use]
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Forget every cached listing
    pub fn clear_caches(&self) {
        self.designs_cache.clear();
        self.products_cache.clear();
        self.manufacturers_cache.clear();
    }

    async fn get_list<R: DeserializeOwned + Send>(
        &self,
        path: &str,
        query: &[(String, String)],
        fallback: &str,
    ) -> ApiResult<Vec<R>> {
        let body = self.transport.get(path, query).await?;
        Ok(serde_json::from_value(require_body(body, fallback)?)?)
    }

    async fn get_first<R: DeserializeOwned + Send>(
        &self,
        path: &str,
        id: &str,
        fallback: &str,
    ) -> ApiResult<R> {
        let query = [("id".to_string(), id.to_string())];
        self.get_list(path, &query, fallback)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| ApiError::NotFound(format!("{path}?id={id}")))
    }
}

#[async_trait]
impl<T: Transport> CatalogService for KitePaintClient<T> {
    async fn fetch_product(&self, id: &ProductId) -> ApiResult<Product> {
        let raw: RawProduct = self
            .get_first(PRODUCTS_PATH, id.as_str(), "There was an error loading the product.")
            .await?;
        Ok(Product::try_from(raw)?)
    }

    async fn fetch_manufacturer(&self, id: &ManufacturerId) -> ApiResult<Manufacturer> {
        self.get_first(
            MANUFACTURERS_PATH,
            id.as_str(),
            "There was an error loading the manufacturer.",
        )
        .await
    }

    async fn list_products(&self, cache: CachePolicy) -> ApiResult<Vec<Product>> {
        let signature = format!("{PRODUCTS_PATH}?{ACTIVE_ONLY}");
        if !self.products_cache.check(&signature, cache).should_fetch() {
            return Ok(Vec::new());
        }

        let raw: Vec<RawProduct> = self
            .get_list(
                PRODUCTS_PATH,
                &active_only(),
                "There was an error loading the products.",
            )
            .await?;
        let products = raw
            .into_iter()
            .map(Product::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        tracing::debug!(count = products.len(), "products loaded");
        Ok(products)
    }

    async fn list_manufacturers(&self, cache: CachePolicy) -> ApiResult<Vec<Manufacturer>> {
        let signature = format!("{MANUFACTURERS_PATH}?{ACTIVE_ONLY}");
        if !self.manufacturers_cache.check(&signature, cache).should_fetch() {
            return Ok(Vec::new());
        }

        let manufacturers: Vec<Manufacturer> = self
            .get_list(
                MANUFACTURERS_PATH,
                &active_only(),
                "There was an error loading the manufacturers.",
            )
            .await?;
        tracing::debug!(count = manufacturers.len(), "manufacturers loaded");
        Ok(manufacturers)
    }
}

#[async_trait]
impl<T: Transport> DesignStorage for KitePaintClient<T> {
    async fn create_design(&self, design: &Design) -> ApiResult<DesignId> {
        let form = vec![
            ("name".to_string(), design.name.clone()),
            ("user".to_string(), design.owner_id.to_string()),
            ("product".to_string(), design.product_id.to_string()),
            ("variations".to_string(), serde_json::to_string(&design.variations)?),
        ];
        let fallback = "There was an error saving the design.";
        let body = self.transport.post_form(DESIGNS_PATH, &form).await?;
        let body = require_valid(body, fallback)?;

        let id = body
            .get("id")
            .cloned()
            .ok_or_else(|| ApiError::rejected(fallback))?;
        let id: DesignId = serde_json::from_value(id)?;
        tracing::info!(design = %id, name = %design.name, "design created");
        Ok(id)
    }

    async fn fetch_design(&self, id: &DesignId) -> ApiResult<SavedDesign> {
        let raw: RawSavedDesign = self
            .get_first(DESIGNS_PATH, id.as_str(), "There was an error loading the design.")
            .await?;
        Ok(SavedDesign::try_from(raw)?)
    }

    async fn delete_design(&self, id: &DesignId) -> ApiResult<()> {
        let form = vec![
            ("delete".to_string(), "true".to_string()),
            ("id".to_string(), id.to_string()),
        ];
        let body = self.transport.post_form(DESIGNS_PATH, &form).await?;
        require_valid(body, "There was an error deleting the design.")?;
        tracing::info!(design = %id, "design deleted");
        Ok(())
    }

    async fn list_designs(
        &self,
        filter: &DesignFilter,
        cache: CachePolicy,
    ) -> ApiResult<Vec<SavedDesign>> {
        let signature = format!("{DESIGNS_PATH}?{}", filter.signature());
        if !self.designs_cache.check(&signature, cache).should_fetch() {
            return Ok(Vec::new());
        }

        let raw: Vec<RawSavedDesign> = self
            .get_list(
                DESIGNS_PATH,
                &filter.query_pairs(),
                "There was an error loading the designs.",
            )
            .await?;
        let designs = raw
            .into_iter()
            .map(SavedDesign::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        tracing::debug!(count = designs.len(), limit = %filter.limit.render(), "designs loaded");
        Ok(designs)
    }
}

fn active_only() -> [(String, String); 1] {
    [("activated".to_string(), "1".to_string())]
}

fn require_body(body: Value, fallback: &str) -> ApiResult<Value> {
    if body.is_null() {
        Err(ApiError::empty(fallback))
    } else {
        Ok(body)
    }
}

fn require_valid(body: Value, fallback: &str) -> ApiResult<Value> {
    let body = require_body(body, fallback)?;
    if body.get("valid").is_some_and(is_truthy) {
        return Ok(body);
    }
    let message = body
        .get("message")
        .and_then(Value::as_str)
        .filter(|m| !m.trim().is_empty())
        .unwrap_or(fallback);
    Err(ApiError::rejected(message))
}

/// The backend spells booleans as `true`, `1` or `"1"` depending on endpoint.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_i64().is_some_and(|n| n != 0),
        Value::String(s) => matches!(s.as_str(), "1" | "true"),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::filter::PageLimit;
    use crate::transport::MockTransport;
    use kite_model::{ComposedVariation, UserId};
    use serde_json::json;

    fn product_row() -> Value {
        json!({
            "id": 3,
            "name": "Kite",
            "manufacturer": "9",
            "colors": r##"[{"name":"Red","color":"#f00"},{"name":"Blue","color":"#00f"}]"##,
            "variations": r#"[{"name":"front","svg":"<svg/>"},{"name":"back","svg":"<svg/>"}]"#,
        })
    }

    fn design_row(id: u32) -> Value {
        json!({
            "id": id,
            "created": "2018-01-01 00:00:00",
            "name": format!("Design {id}"),
            "variations": r#"[{"name":"front","primary":true,"svg":"<svg/>"}]"#,
        })
    }

    fn client(transport: MockTransport) -> (KitePaintClient<MockTransport>, ManualClock) {
        let clock = ManualClock::starting_now();
        let client =
            KitePaintClient::with_clock(transport, &ClientConfig::default(), Arc::new(clock.clone()));
        (client, clock)
    }

    fn design() -> Design {
        Design {
            name: "Test".into(),
            owner_id: UserId::new("7"),
            product_id: ProductId::new("3"),
            variations: vec![ComposedVariation {
                name: "front".into(),
                is_primary: true,
                svg_markup: "<svg/>".into(),
            }],
        }
    }

    #[tokio::test]
    async fn identical_listing_within_window_hits_network_once() {
        let mut transport = MockTransport::new();
        transport
            .expect_get()
            .withf(|path, _| path == DESIGNS_PATH)
            .times(1)
            .returning(|_, _| Ok(json!([design_row(1), design_row(2)])));
        let (client, clock) = client(transport);

        let filter = DesignFilter::default();
        let first = client.list_designs(&filter, CachePolicy::Use).await.unwrap();
        assert_eq!(first.len(), 2);

        clock.advance(chrono::Duration::minutes(5));
        let second = client.list_designs(&filter, CachePolicy::Use).await.unwrap();
        assert!(second.is_empty());
    }

    #[tokio::test]
    async fn listing_refetches_after_window() {
        let mut transport = MockTransport::new();
        transport
            .expect_get()
            .times(2)
            .returning(|_, _| Ok(json!([design_row(1)])));
        let (client, clock) = client(transport);

        let filter = DesignFilter::default();
        client.list_designs(&filter, CachePolicy::Use).await.unwrap();
        clock.advance(chrono::Duration::minutes(11));
        let again = client.list_designs(&filter, CachePolicy::Use).await.unwrap();
        assert_eq!(again.len(), 1);
    }

    #[tokio::test]
    async fn bypass_always_fetches() {
        let mut transport = MockTransport::new();
        transport
            .expect_get()
            .times(2)
            .returning(|_, _| Ok(json!([design_row(1)])));
        let (client, _clock) = client(transport);

        let filter = DesignFilter::default();
        client.list_designs(&filter, CachePolicy::Bypass).await.unwrap();
        let again = client.list_designs(&filter, CachePolicy::Bypass).await.unwrap();
        assert_eq!(again.len(), 1);
    }

    #[tokio::test]
    async fn different_pages_are_cached_separately() {
        let mut transport = MockTransport::new();
        transport
            .expect_get()
            .times(2)
            .returning(|_, _| Ok(json!([])));
        let (client, _clock) = client(transport);

        let first = DesignFilter::default();
        let second = first.clone().with_limit(PageLimit::after(50, 50));
        client.list_designs(&first, CachePolicy::Use).await.unwrap();
        client.list_designs(&second, CachePolicy::Use).await.unwrap();
    }

    #[tokio::test]
    async fn listing_sends_filter_query() {
        let mut transport = MockTransport::new();
        transport
            .expect_get()
            .withf(|_, query| {
                query.contains(&("filter[status]".to_string(), "2".to_string()))
                    && query.contains(&("limit".to_string(), "50".to_string()))
            })
            .times(1)
            .returning(|_, _| Ok(json!([])));
        let (client, _clock) = client(transport);
        client
            .list_designs(&DesignFilter::default(), CachePolicy::Use)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn products_decode_nested_json() {
        let mut transport = MockTransport::new();
        transport
            .expect_get()
            .withf(|path, query| {
                path == PRODUCTS_PATH && query == [("activated".to_string(), "1".to_string())]
            })
            .times(1)
            .returning(|_, _| Ok(json!([product_row()])));
        let (client, _clock) = client(transport);

        let products = client.list_products(CachePolicy::Use).await.unwrap();
        assert_eq!(products.len(), 1);
        assert_eq!(products[0].id, ProductId::new("3"));
        assert_eq!(products[0].colors[1].hex, "#00f");
        assert_eq!(products[0].variations[0].name, "front");

        // Constant signature: second call is a cache hit.
        assert!(client.list_products(CachePolicy::Use).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn null_body_is_empty_response() {
        let mut transport = MockTransport::new();
        transport.expect_get().returning(|_, _| Ok(Value::Null));
        let (client, _clock) = client(transport);

        let err = client.list_manufacturers(CachePolicy::Bypass).await.unwrap_err();
        assert!(matches!(err, ApiError::EmptyResponse(ref m) if m.contains("manufacturers")));
    }

    #[tokio::test]
    async fn fetch_product_takes_first_row() {
        let mut transport = MockTransport::new();
        transport
            .expect_get()
            .withf(|path, query| path == PRODUCTS_PATH && query[0].1 == "3")
            .returning(|_, _| Ok(json!([product_row()])));
        let (client, _clock) = client(transport);

        let product = client.fetch_product(&ProductId::new("3")).await.unwrap();
        assert_eq!(product.name, "Kite");
    }

    #[tokio::test]
    async fn fetch_missing_design_is_not_found() {
        let mut transport = MockTransport::new();
        transport.expect_get().returning(|_, _| Ok(json!([])));
        let (client, _clock) = client(transport);

        let err = client.fetch_design(&DesignId::new("404")).await.unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[tokio::test]
    async fn create_design_posts_encoded_variations() {
        let mut transport = MockTransport::new();
        transport
            .expect_post_form()
            .withf(|path, form| {
                path == DESIGNS_PATH
                    && form.contains(&("name".to_string(), "Test".to_string()))
                    && form.contains(&("user".to_string(), "7".to_string()))
                    && form.contains(&("product".to_string(), "3".to_string()))
                    && form
                        .iter()
                        .any(|(k, v)| k == "variations" && v.contains("\"primary\":true"))
            })
            .times(1)
            .returning(|_, _| Ok(json!({"valid": true, "id": 12})));
        let (client, _clock) = client(transport);

        let id = client.create_design(&design()).await.unwrap();
        assert_eq!(id, DesignId::new("12"));
    }

    #[tokio::test]
    async fn create_design_rejection_carries_server_message() {
        let mut transport = MockTransport::new();
        transport
            .expect_post_form()
            .returning(|_, _| Ok(json!({"valid": false, "message": "Name taken"})));
        let (client, _clock) = client(transport);

        let err = client.create_design(&design()).await.unwrap_err();
        assert!(matches!(err, ApiError::Rejected(ref m) if m == "Name taken"));
    }

    #[tokio::test]
    async fn delete_requires_valid_flag() {
        let mut transport = MockTransport::new();
        transport
            .expect_post_form()
            .withf(|_, form| form.contains(&("delete".to_string(), "true".to_string())))
            .times(2)
            .returning(|_, form| {
                if form.contains(&("id".to_string(), "1".to_string())) {
                    Ok(json!({"valid": 1}))
                } else {
                    Ok(json!({}))
                }
            });
        let (client, _clock) = client(transport);

        client.delete_design(&DesignId::new("1")).await.unwrap();
        let err = client.delete_design(&DesignId::new("2")).await.unwrap_err();
        assert!(matches!(err, ApiError::Rejected(ref m) if m.contains("deleting")));
    }

    #[tokio::test]
    async fn transport_errors_propagate_and_stay_cached() {
        let mut transport = MockTransport::new();
        transport
            .expect_get()
            .times(1)
            .returning(|_, _| Err(ApiError::Transport("connection refused".into())));
        let (client, _clock) = client(transport);

        let err = client.list_products(CachePolicy::Use).await.unwrap_err();
        assert!(matches!(err, ApiError::Transport(_)));
        assert!(client.list_products(CachePolicy::Use).await.unwrap().is_empty());
    }

    #[test]
    fn truthiness() {
        assert!(is_truthy(&json!(true)));
        assert!(is_truthy(&json!(1)));
        assert!(is_truthy(&json!("1")));
        assert!(!is_truthy(&json!(0)));
        assert!(!is_truthy(&json!("false")));
        assert!(!is_truthy(&Value::Null));
    }
}
