//! KitePaint API
//!
//! The boundary between the design engine and the backend:
//! - Service contracts (`CatalogService`, `DesignStorage`, `Navigator`)
//! - `RequestCache`, a time-boxed memoizer for read-mostly listings
//! - `KitePaintClient`, the HTTP implementation of both services
//!
//! # Architecture
//!
//! ```text
//! Editor / Feed → CatalogService + DesignStorage → KitePaintClient → Transport → backend
//!                                                        ↑
//!                                                   RequestCache (per listing)
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use kite_api::{CachePolicy, ClientConfig, DesignFilter, DesignStorage, KitePaintClient};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = KitePaintClient::connect(&ClientConfig::for_host("kitepaint.com"))?;
//! let designs = client.list_designs(&DesignFilter::default(), CachePolicy::Use).await?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod cache;
pub mod client;
pub mod clock;
pub mod config;
pub mod error;
pub mod filter;
pub mod service;
pub mod transport;

// Re-exports for convenience
pub use cache::{CacheDecision, CacheEntry, CachePolicy, RequestCache, DEFAULT_CACHE_DURATION};
pub use client::KitePaintClient;
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{api_base_for_host, ClientConfig};
pub use error::{ApiError, ApiResult};
pub use filter::{DesignFilter, PageLimit, SortOrder};
pub use service::{CatalogService, DesignStorage, Navigator};
pub use transport::{ReqwestTransport, Transport};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
