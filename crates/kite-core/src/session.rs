//! Editor session
//!
//! Orchestrates one editing session:
//! - Loading a product (or a saved design over its product)
//! - Routing colour edits into the `ColorAssignmentModel`
//! - Composing every variation and submitting the design
//! - Redirecting to the editing view after a successful save
//!
//! Every network call runs as a `Cancelable` bound to the session's
//! `TaskScope`. Results are settled under the session state lock, and
//! `teardown` cancels under the same lock, so nothing observable happens
//! once the session is gone. Navigation runs after the lock is released,
//! so a navigator may tear the session down.
//!
//! Cancelling a single load or save handle rolls its in-flight marker back
//! once the request returns; after teardown state is left as it was.

use crate::error::{SessionError, SessionResult};
use crate::task::{Cancelable, TaskScope, TaskToken};
use kite_api::{ApiError, CatalogService, DesignStorage, Navigator};
use kite_compose::{ComposeOptions, Composer};
use kite_model::{
    AppliedColors, Color, ColorAssignmentModel, Design, DesignId, Product, ProductId,
    SelectionDefaults, UserId, Variation,
};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use ulid::Ulid;

/// Unique session identifier (ULID for sortability)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SessionId(pub Ulid);

impl SessionId {
    /// Generate new session ID
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self(Ulid::new())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Backends a session talks to
#[derive(Clone)]
pub struct Services {
    /// Product catalog
    pub catalog: Arc<dyn CatalogService>,
    /// Design persistence
    pub storage: Arc<dyn DesignStorage>,
    /// Post-save navigation
    pub navigator: Arc<dyn Navigator>,
}

impl Services {
    /// Bundle the three services
    pub fn new(
        catalog: Arc<dyn CatalogService>,
        storage: Arc<dyn DesignStorage>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        Self {
            catalog,
            storage,
            navigator,
        }
    }
}

impl fmt::Debug for Services {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Services").finish_non_exhaustive()
    }
}

/// Editor configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Panel addressing used when composing
    pub compose: ComposeOptions,
}

/// Product loading progress
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LoadState {
    /// Nothing requested
    #[default]
    Idle,
    /// Fetch in flight
    Loading,
    /// Product loaded and editable
    Ready,
    /// Fetch failed; user-facing message
    Failed(String),
}

/// Save progress
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SaveState {
    /// No save attempted
    #[default]
    Idle,
    /// Submission in flight
    Saving,
    /// Saved under this id
    Saved(DesignId),
    /// Submission failed; user-facing message
    Failed(String),
}

/// What to save the current design as
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveRequest {
    /// Design name
    pub name: String,
    /// Owning user
    pub owner_id: UserId,
}

impl SaveRequest {
    /// Create save request
    pub fn new(name: impl Into<String>, owner_id: impl Into<UserId>) -> Self {
        Self {
            name: name.into(),
            owner_id: owner_id.into(),
        }
    }
}

#[derive(Debug, Default)]
struct SessionState {
    load: LoadState,
    save: SaveState,
    model: Option<ColorAssignmentModel>,
    opened_design: Option<DesignId>,
    load_generation: u64,
    torn_down: bool,
}

impl SessionState {
    fn model(&self) -> SessionResult<&ColorAssignmentModel> {
        self.model.as_ref().ok_or(SessionError::NotLoaded)
    }

    fn model_mut(&mut self) -> SessionResult<&mut ColorAssignmentModel> {
        self.model.as_mut().ok_or(SessionError::NotLoaded)
    }

    fn begin_load(&mut self) -> u64 {
        self.load_generation += 1;
        self.load = LoadState::Loading;
        self.load_generation
    }

    fn discard_load(&mut self, generation: u64) {
        if self.torn_down || generation != self.load_generation {
            return;
        }
        self.load = if self.model.is_some() {
            LoadState::Ready
        } else {
            LoadState::Idle
        };
    }

    fn discard_save(&mut self) {
        if !self.torn_down && self.save == SaveState::Saving {
            self.save = SaveState::Idle;
        }
    }

    fn settle_load(
        &mut self,
        generation: u64,
        loaded: SessionResult<(ColorAssignmentModel, Option<DesignId>)>,
    ) -> SessionResult<()> {
        if generation != self.load_generation {
            return Err(SessionError::Superseded);
        }
        match loaded {
            Ok((model, design)) => {
                self.model = Some(model);
                self.opened_design = design;
                self.load = LoadState::Ready;
                Ok(())
            }
            Err(err) => {
                tracing::warn!(error = %err, "load failed");
                self.load = LoadState::Failed(err.user_message());
                Err(err)
            }
        }
    }
}

/// Handle to an in-flight load
pub type LoadTask = Cancelable<SessionResult<()>>;

/// Handle to an in-flight save
pub type SaveTask = Cancelable<SessionResult<DesignId>>;

/// One user's editing session
#[derive(Debug)]
pub struct EditorSession {
    id: SessionId,
    services: Services,
    composer: Composer,
    state: Arc<Mutex<SessionState>>,
    scope: TaskScope,
}

impl EditorSession {
    /// Create an idle session
    #[must_use]
    pub fn new(services: Services, config: EditorConfig) -> Self {
        let id = SessionId::new();
        tracing::debug!(session = %id, "editor session created");
        Self {
            id,
            services,
            composer: Composer::with_options(config.compose),
            state: Arc::new(Mutex::new(SessionState::default())),
            scope: TaskScope::new(),
        }
    }

    /// Session identifier
    #[inline]
    #[must_use]
    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Fetch a product and start editing it.
    ///
    /// A later load supersedes this one; the superseded task settles with
    /// `SessionError::Superseded` and leaves state untouched.
    ///
    /// # Errors
    /// `SessionError::TornDown` if the session has been torn down.
    pub fn load_product(
        &self,
        product_id: ProductId,
        defaults: SelectionDefaults,
    ) -> SessionResult<LoadTask> {
        let token = self.live_token()?;
        let generation = self.state.lock().begin_load();
        let catalog = Arc::clone(&self.services.catalog);
        tracing::debug!(session = %self.id, product = %product_id, "loading product");

        Ok(Cancelable::spawn_settled(
            token,
            Arc::clone(&self.state),
            async move { catalog.fetch_product(&product_id).await },
            move |state: &mut SessionState, fetched| {
                let loaded = fetched
                    .map_err(SessionError::from)
                    .and_then(|product| Ok(ColorAssignmentModel::new(product, &defaults)?))
                    .map(|model| (model, None));
                state.settle_load(generation, loaded)
            },
            move |state: &mut SessionState| state.discard_load(generation),
            |_: &SessionResult<()>| {},
        ))
    }

    /// Fetch a saved design and its product, and continue editing it.
    ///
    /// Variation templates are replaced by the design's composed markup,
    /// so the saved colours show as the starting point.
    ///
    /// # Errors
    /// `SessionError::TornDown` if the session has been torn down.
    pub fn open_design(&self, design_id: DesignId) -> SessionResult<LoadTask> {
        let token = self.live_token()?;
        let generation = self.state.lock().begin_load();
        let catalog = Arc::clone(&self.services.catalog);
        let storage = Arc::clone(&self.services.storage);
        tracing::debug!(session = %self.id, design = %design_id, "opening design");

        let fetch = async move {
            let design = storage.fetch_design(&design_id).await?;
            let product_id = design
                .product_id
                .clone()
                .ok_or_else(|| ApiError::NotFound(format!("product of design {design_id}")))?;
            let product = catalog.fetch_product(&product_id).await?;
            let product = product.with_variation_markup(
                design
                    .variations
                    .iter()
                    .map(|v| (v.name.as_str(), v.svg_markup.as_str())),
            );
            Ok::<_, SessionError>((product, design.id))
        };

        Ok(Cancelable::spawn_settled(
            token,
            Arc::clone(&self.state),
            fetch,
            move |state: &mut SessionState, fetched| {
                let loaded = fetched.and_then(|(product, design)| {
                    let model = ColorAssignmentModel::new(product, &SelectionDefaults::default())?;
                    Ok((model, Some(design)))
                });
                state.settle_load(generation, loaded)
            },
            move |state: &mut SessionState| state.discard_load(generation),
            |_: &SessionResult<()>| {},
        ))
    }

    /// Make `name` the current colour
    ///
    /// # Errors
    /// `SessionError::NotLoaded` before a product is ready.
    pub fn select_color(&self, name: &str) -> SessionResult<bool> {
        Ok(self.state.lock().model_mut()?.select_color(name))
    }

    /// Make `name` the current variation
    ///
    /// # Errors
    /// `SessionError::NotLoaded` before a product is ready.
    pub fn select_variation(&self, name: &str) -> SessionResult<bool> {
        Ok(self.state.lock().model_mut()?.select_variation(name))
    }

    /// Paint `panel` of the current variation with the current colour
    ///
    /// # Errors
    /// `SessionError::NotLoaded` before a product is ready.
    pub fn apply_color(&self, panel: &str) -> SessionResult<bool> {
        Ok(self.state.lock().model_mut()?.apply_color(panel))
    }

    /// Clear every assignment
    ///
    /// # Errors
    /// `SessionError::NotLoaded` before a product is ready.
    pub fn reset(&self) -> SessionResult<()> {
        self.state.lock().model_mut()?.reset();
        Ok(())
    }

    /// Current load state
    #[must_use]
    pub fn load_state(&self) -> LoadState {
        self.state.lock().load.clone()
    }

    /// Current save state
    #[must_use]
    pub fn save_state(&self) -> SaveState {
        self.state.lock().save.clone()
    }

    /// Design this session was opened from, if any
    #[must_use]
    pub fn opened_design(&self) -> Option<DesignId> {
        self.state.lock().opened_design.clone()
    }

    /// Product being edited
    #[must_use]
    pub fn product(&self) -> Option<Arc<Product>> {
        self.state.lock().model.as_ref().map(|m| Arc::clone(m.product()))
    }

    /// Current colour
    #[must_use]
    pub fn current_color(&self) -> Option<Color> {
        self.state.lock().model.as_ref().map(|m| m.current_color().clone())
    }

    /// Current variation
    #[must_use]
    pub fn current_variation(&self) -> Option<Variation> {
        self.state
            .lock()
            .model
            .as_ref()
            .map(|m| m.current_variation().clone())
    }

    /// Snapshot of every assignment
    #[must_use]
    pub fn applied_colors(&self) -> AppliedColors {
        self.state
            .lock()
            .model
            .as_ref()
            .map(ColorAssignmentModel::snapshot)
            .unwrap_or_default()
    }

    /// Markup for `variation` with the current assignments baked in
    ///
    /// # Errors
    /// `SessionError::NotLoaded` before a product is ready,
    /// `SessionError::Model` for an unknown variation and
    /// `SessionError::Compose` for an unreadable template.
    pub fn preview(&self, variation: &str) -> SessionResult<String> {
        let (template, assignment) = {
            let state = self.state.lock();
            let model = state.model()?;
            let template = model
                .product()
                .variation(variation)
                .cloned()
                .ok_or_else(|| kite_model::ModelError::UnknownVariation(variation.to_string()))?;
            let assignment = model.applied_colors().for_variation(&template.name).clone();
            (template, assignment)
        };
        Ok(self.composer.compose(&template, &assignment)?)
    }

    /// Compose every variation and submit the design.
    ///
    /// Assignments are snapshotted now; edits made while the save is in
    /// flight do not affect it. On success the navigator is sent to the new
    /// design, outside the state lock, unless the session was torn down
    /// first.
    ///
    /// # Errors
    /// - `SessionError::TornDown` after teardown
    /// - `SessionError::NotLoaded` before a product is ready
    /// - `SessionError::SaveInProgress` while another save runs
    /// - `SessionError::Compose` if a template cannot be composed
    pub fn save(&self, request: SaveRequest) -> SessionResult<SaveTask> {
        let token = self.live_token()?;
        let design = {
            let mut state = self.state.lock();
            if state.save == SaveState::Saving {
                return Err(SessionError::SaveInProgress);
            }
            let model = state.model()?;
            let product = Arc::clone(model.product());
            let snapshot = model.snapshot();

            let variations = match self.composer.compose_all(&product, &snapshot) {
                Ok(variations) => variations,
                Err(err) => {
                    let err = SessionError::from(err);
                    state.save = SaveState::Failed(err.user_message());
                    return Err(err);
                }
            };
            state.save = SaveState::Saving;
            Design {
                name: request.name,
                owner_id: request.owner_id,
                product_id: product.id.clone(),
                variations,
            }
        };

        tracing::info!(session = %self.id, name = %design.name, product = %design.product_id, "saving design");
        let storage = Arc::clone(&self.services.storage);
        let navigator = Arc::clone(&self.services.navigator);
        let session = self.id;

        Ok(Cancelable::spawn_settled(
            token,
            Arc::clone(&self.state),
            async move { storage.create_design(&design).await },
            move |state: &mut SessionState, created| match created {
                Ok(id) => {
                    tracing::info!(session = %session, design = %id, "design saved");
                    state.save = SaveState::Saved(id.clone());
                    Ok(id)
                }
                Err(err) => {
                    let err = SessionError::from(err);
                    tracing::warn!(session = %session, error = %err, "save failed");
                    state.save = SaveState::Failed(err.user_message());
                    Err(err)
                }
            },
            SessionState::discard_save,
            move |saved: &SessionResult<DesignId>| {
                if let Ok(id) = saved {
                    navigator.redirect_to_edit(id);
                }
            },
        ))
    }

    /// Cancel every outstanding task.
    ///
    /// Idempotent. Returns how many live tokens this call cancelled.
    pub fn teardown(&self) -> usize {
        let mut state = self.state.lock();
        state.torn_down = true;
        let cancelled = self.scope.teardown();
        if cancelled > 0 {
            tracing::debug!(session = %self.id, cancelled, "session torn down");
        }
        cancelled
    }

    /// Whether `teardown` has run
    #[must_use]
    pub fn is_torn_down(&self) -> bool {
        self.scope.is_torn_down()
    }

    fn live_token(&self) -> SessionResult<TaskToken> {
        if self.scope.is_torn_down() {
            return Err(SessionError::TornDown);
        }
        Ok(self.scope.token())
    }
}

impl Drop for EditorSession {
    fn drop(&mut self) {
        self.teardown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kite_test_utils::{kite_product, FakeCatalog, FakeStorage, RecordingNavigator};

    fn session() -> EditorSession {
        let services = Services::new(
            Arc::new(FakeCatalog::new().with_product(kite_product())),
            Arc::new(FakeStorage::new()),
            Arc::new(RecordingNavigator::new()),
        );
        EditorSession::new(services, EditorConfig::default())
    }

    #[test]
    fn edits_before_load_fail() {
        let session = session();
        assert!(matches!(session.apply_color("p1"), Err(SessionError::NotLoaded)));
        assert!(matches!(
            session.save(SaveRequest::new("x", "1")),
            Err(SessionError::NotLoaded)
        ));
        assert!(session.applied_colors().is_empty());
    }

    #[tokio::test]
    async fn load_then_edit() {
        let session = session();
        let task = session
            .load_product(ProductId::new("kite"), SelectionDefaults::new().with_color("blue"))
            .unwrap();
        assert_eq!(session.load_state(), LoadState::Loading);
        task.join().await.unwrap().unwrap();

        assert_eq!(session.load_state(), LoadState::Ready);
        assert_eq!(session.current_color().unwrap().name, "Blue");
        assert!(session.apply_color("p1").unwrap());
        assert!(!session.apply_color("p1").unwrap());
    }

    #[tokio::test]
    async fn operations_after_teardown_fail() {
        let session = session();
        session.teardown();
        assert!(session.is_torn_down());
        assert!(matches!(
            session.load_product(ProductId::new("kite"), SelectionDefaults::new()),
            Err(SessionError::TornDown)
        ));
        assert_eq!(session.teardown(), 0);
    }

    #[test]
    fn session_ids_are_unique() {
        assert_ne!(SessionId::new(), SessionId::new());
    }
}
