//! KitePaint Core
//!
//! Orchestration on top of the model, composer and services:
//! - `EditorSession`: load, edit, compose and save one design
//! - `DesignFeed`: paged listing of saved designs with their catalog
//! - `Cancelable` / `TaskScope`: results discarded after teardown
//!
//! # Example
//!
//! ```rust,ignore
//! use kite_core::{EditorConfig, EditorSession, SaveRequest, Services};
//! use kite_model::{ProductId, SelectionDefaults};
//!
//! # async fn example(services: Services) -> Result<(), kite_core::SessionError> {
//! let session = EditorSession::new(services, EditorConfig::default());
//! session
//!     .load_product(ProductId::new("3"), SelectionDefaults::default())?
//!     .join()
//!     .await;
//! session.select_color("Blue")?;
//! session.apply_color("p1")?;
//! session.save(SaveRequest::new("Sunset", "7"))?.join().await;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod error;
pub mod feed;
pub mod session;
pub mod task;

// Re-exports
pub use error::{SessionError, SessionResult};
pub use feed::{DesignFeed, FeedConfig, PageTask};
pub use session::{
    EditorConfig, EditorSession, LoadState, LoadTask, SaveRequest, SaveState, SaveTask, Services,
    SessionId,
};
pub use task::{Cancelable, TaskScope, TaskToken};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
