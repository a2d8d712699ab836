//! Request entry point.

use std::sync::Arc;
use std::time::Duration;

use folio_binder::{CommandBinder, FieldCatalog, ResourceJanitor};
use folio_core::{
    ConfigError, EngineConfig, PageError, PageId, TransactionContext, DEFAULT_REDIRECT_STATUS,
};
use folio_observability::{execution_span, record_outcome, record_page_id, EngineMetrics};
use folio_registry::{
    PersistentPageRecord, PersistentPageRegistry, RegistryError, SweeperHandle,
};
use folio_security::{NonceGuard, Session};
use tracing::{debug, info, warn};

use crate::catalog::PageCatalog;
use crate::instance::PageInstance;
use crate::lifecycle::LifecycleEngine;
use crate::response::PageResponse;

/// Registry holding persistent pages of every type.
pub type PageRegistry = PersistentPageRegistry<Box<dyn PageInstance>>;

type PageRecord = PersistentPageRecord<Box<dyn PageInstance>>;

/// Serves requests against registered pages.
///
/// Construct once at application start and share it across request
/// handlers; call [`start_sweeper`](Self::start_sweeper) alongside it and
/// shut the sweeper down at application stop.
///
/// # Example
///
/// ```rust,ignore
/// let pages = PageCatalog::new().with("/signup", PageType::of::<Signup>().persistent());
/// let fields = FieldCatalog::new().with::<Signup>();
/// let engine = PageEngine::new(EngineConfig::default(), pages, fields)?;
///
/// let response = engine.service(&cx, &session)?;
/// ```
#[derive(Debug)]
pub struct PageEngine {
    config: EngineConfig,
    pages: PageCatalog,
    registry: Arc<PageRegistry>,
    lifecycle: LifecycleEngine,
    metrics: Arc<EngineMetrics>,
}

impl PageEngine {
    /// Create an engine with an empty registry.
    pub fn new(
        config: EngineConfig,
        pages: PageCatalog,
        fields: FieldCatalog,
    ) -> Result<Self, ConfigError> {
        Self::with_registry(config, pages, fields, Arc::new(PageRegistry::new()))
    }

    /// Create an engine over an existing registry.
    pub fn with_registry(
        config: EngineConfig,
        pages: PageCatalog,
        fields: FieldCatalog,
        registry: Arc<PageRegistry>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        let metrics = Arc::new(EngineMetrics::new());
        let binder = CommandBinder::new(Arc::new(fields), Arc::new(ResourceJanitor::new()));
        let lifecycle = LifecycleEngine::new(&config, binder, Arc::clone(&metrics));

        info!(pages = pages.len(), "Page engine ready");
        Ok(Self {
            config,
            pages,
            registry,
            lifecycle,
            metrics,
        })
    }

    /// Engine settings.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Registered page types.
    pub fn pages(&self) -> &PageCatalog {
        &self.pages
    }

    /// Persistent page storage.
    pub fn registry(&self) -> &Arc<PageRegistry> {
        &self.registry
    }

    /// Execution counters.
    pub fn metrics(&self) -> &EngineMetrics {
        &self.metrics
    }

    /// Session nonce issuer.
    pub fn nonce_guard(&self) -> &NonceGuard {
        self.lifecycle.nonce_guard()
    }

    /// Parameter binder.
    pub fn binder(&self) -> &CommandBinder {
        self.lifecycle.binder()
    }

    /// Handle one request.
    ///
    /// A request carrying the page identity parameter is routed to the
    /// registered page; any other request builds a fresh page from the
    /// catalog entry for its path.
    pub fn service(
        &self,
        cx: &TransactionContext,
        session: &Session,
    ) -> Result<PageResponse, PageError> {
        let span = execution_span(cx);
        let _entered = span.enter();
        self.metrics.record_execution();

        let result = match cx.parameter(&self.config.params.page_id) {
            Some(raw) => self.service_persistent(raw, cx, session),
            None => self.service_fresh(cx, session),
        };

        if let Ok(response) = &result {
            if let Some(id) = response.page_id {
                record_page_id(&span, id);
            }
        }
        record_outcome(&span, &result);

        match &result {
            Ok(_) => self.metrics.record_success(),
            Err(e) => {
                self.metrics.record_failure(e.kind());
                if e.is_security_failure() {
                    warn!(kind = e.kind().as_str(), path = cx.path(), "Rejected request");
                } else {
                    debug!(kind = e.kind().as_str(), error = %e, "Page execution failed");
                }
            }
        }
        result
    }

    fn service_persistent(
        &self,
        raw_id: &str,
        cx: &TransactionContext,
        session: &Session,
    ) -> Result<PageResponse, PageError> {
        let not_found = || PageError::PageNotFound(raw_id.to_string());

        let id = PageId::parse(raw_id).ok_or_else(not_found)?;
        let record = match self.registry.lookup_for(id, session.id().as_str()) {
            Ok(record) => record,
            Err(RegistryError::NotOwner(_)) => {
                warn!(page_id = %id, session = %session.id(), "Page requested from foreign session");
                return Err(not_found());
            }
            Err(RegistryError::NotFound(_)) => return Err(not_found()),
        };

        if let Some(uri) = record.replacement_uri() {
            debug!(page_id = %id, uri = %uri, "Redirecting replaced page");
            let mut response = PageResponse::redirect(
                uri,
                DEFAULT_REDIRECT_STATUS,
                self.config.model.default_content_type.clone(),
            );
            response.page_id = Some(id);
            return Ok(response);
        }

        let mut page = record.lock();
        if page.core().state().is_finished() {
            self.registry.invalidate(id);
            return Err(not_found());
        }

        let view = self.lifecycle.execute(&mut **page, cx, session);
        self.settle(&record, &**page, false);
        view.map(|view| PageResponse::from_page(page.core(), view))
    }

    fn service_fresh(
        &self,
        cx: &TransactionContext,
        session: &Session,
    ) -> Result<PageResponse, PageError> {
        let path = cx.path();
        let page_type = self
            .pages
            .get(path)
            .ok_or_else(|| PageError::RouteNotFound(path.to_string()))?;

        let mut page = page_type.instantiate(
            &self.config.model.default_content_type,
            &self.config.params.page_id,
        );

        if !page_type.is_persistent() {
            let view = self.lifecycle.execute(&mut *page, cx, session)?;
            return Ok(PageResponse::from_page(page.core(), view));
        }

        // Registered up front so the first execution already sees its
        // identity and canonical URI.
        let record = self
            .registry
            .register_record(page, Some(session.id().as_str().to_string()));
        self.metrics.record_registered();

        let mut page = record.lock();
        let view = self.lifecycle.execute(&mut **page, cx, session);
        self.settle(&record, &**page, view.is_err());
        view.map(|view| PageResponse::from_page(page.core(), view))
    }

    /// Drop records that must not be reached again: finished pages, and
    /// fresh pages whose first execution failed.
    fn settle(&self, record: &PageRecord, page: &dyn PageInstance, first_failed: bool) {
        if page.core().state().is_finished() {
            debug!(page_id = %record.id(), "Page finished");
            self.registry.invalidate(record.id());
        } else if first_failed {
            debug!(page_id = %record.id(), "Discarding page after failed first execution");
            self.registry.invalidate(record.id());
        }
    }

    /// Redirect future requests for a page to another URI.
    pub fn replace_page(&self, id: PageId, uri: impl Into<String>) -> Result<(), PageError> {
        self.registry
            .set_replacement(id, uri)
            .map_err(|_| PageError::PageNotFound(id.to_string()))
    }

    /// Evict idle persistent pages now. Returns the number evicted.
    pub fn evict_idle(&self, max_idle: Duration) -> usize {
        let evicted = self.registry.evict_idle(max_idle);
        self.metrics.record_evicted(evicted);
        evicted
    }

    /// Start periodic idle eviction using the configured interval and idle
    /// limit. Must be called from within a tokio runtime.
    pub fn start_sweeper(&self) -> SweeperHandle {
        let interval = Duration::from_secs(self.config.registry.sweep_interval_secs);
        let max_idle = Duration::from_secs(self.config.registry.max_idle_secs);
        let metrics = Arc::clone(&self.metrics);

        self.registry.start_sweeper_with(interval, max_idle, move |evicted| {
            metrics.record_evicted(evicted)
        })
    }
}
