//! One execution against one page.

use std::sync::Arc;

use folio_binder::{CleanupReport, CommandBinder, CommandKey, ResourceJanitor};
use folio_core::{EngineConfig, Method, PageError, TransactionContext, View};
use folio_observability::EngineMetrics;
use folio_security::{NonceGuard, Session};
use tracing::{debug, warn};

use crate::instance::PageInstance;

/// Runs the lifecycle of a single request against a single page.
///
/// The caller is responsible for exclusive access to the page; for
/// persistent pages that is the registry record lock.
#[derive(Debug, Clone)]
pub struct LifecycleEngine {
    nonce_param: String,
    nonce_key: String,
    binder: CommandBinder,
    nonce: NonceGuard,
    metrics: Arc<EngineMetrics>,
}

impl LifecycleEngine {
    /// Create an engine.
    pub fn new(config: &EngineConfig, binder: CommandBinder, metrics: Arc<EngineMetrics>) -> Self {
        Self {
            nonce_param: config.params.nonce.clone(),
            nonce_key: config.model.nonce_key.clone(),
            binder,
            nonce: NonceGuard::new(config.nonce.clone()),
            metrics,
        }
    }

    /// The parameter binder.
    pub fn binder(&self) -> &CommandBinder {
        &self.binder
    }

    /// The nonce guard.
    pub fn nonce_guard(&self) -> &NonceGuard {
        &self.nonce
    }

    /// Execute one request.
    ///
    /// Exactly one of commit or rollback runs, followed by exactly one
    /// janitor cleanup for the page's command object, on every exit path.
    pub fn execute(
        &self,
        page: &mut dyn PageInstance,
        cx: &TransactionContext,
        session: &Session,
    ) -> Result<View, PageError> {
        let cleanup = CleanupGuard::new(self.binder.janitor(), page.command_key());
        page.core_mut().attach(cx);

        let result = self.run(page, cx, session);
        match &result {
            Ok(_) => page.commit(),
            Err(e) => {
                debug!(kind = e.kind().as_str(), error = %e, "Rolling back page execution");
                page.rollback(e);
            }
        }

        let report = cleanup.finish();
        if !report.is_clean() {
            self.metrics.record_cleanup_failures(report.failures.len());
        }
        result
    }

    fn run(
        &self,
        page: &mut dyn PageInstance,
        cx: &TransactionContext,
        session: &Session,
    ) -> Result<View, PageError> {
        // Rejected before the nonce check, binding or any page hook
        if let Method::Other(name) = &cx.method {
            warn!(method = %name, page = page.core().type_name(), "Unsupported request method");
            return Err(PageError::UnsupportedMethod(name.clone()));
        }

        if let Some(view) = self.pre_service(page, cx, session)? {
            return Ok(view);
        }

        // A GET against a persistent page keeps the previous POST's errors
        if !page.core().is_persistent() || cx.is_post() {
            page.core_mut().errors_mut().clear();
        }

        let errors = page.bind(&self.binder, cx);
        page.core_mut().errors_mut().extend(errors);

        if let Some(view) = page.validate(cx)? {
            return Ok(view);
        }

        if page.core().has_errors() {
            debug!(
                errors = page.core().errors().len(),
                persistent = page.core().is_persistent(),
                "Parameter validation failed"
            );
            if let Some(view) = page.on_validation_error(cx)? {
                return Ok(view);
            }
        }

        page.load_data(cx)?;
        let view = self.dispatch(page, cx)?;
        self.update_state(page, cx);
        Ok(view)
    }

    /// Verify the nonce of a protected POST and expose the session nonce to
    /// the model, then run the page's own pre-service hook.
    pub fn pre_service(
        &self,
        page: &mut dyn PageInstance,
        cx: &TransactionContext,
        session: &Session,
    ) -> Result<Option<View>, PageError> {
        let mut nonce = self.nonce.get_or_create_nonce(session);

        if cx.is_post() && page.core().is_persistent() {
            let supplied = cx
                .parameter(&self.nonce_param)
                .ok_or(PageError::NonceMissing)?;
            let verified = if self.nonce.rotates_after_verify() {
                self.nonce.verify_and_rotate(session, supplied)
            } else {
                self.nonce.verify(session, supplied).then_some(nonce)
            };
            nonce = match verified {
                Some(token) => token,
                None => {
                    warn!(session = %session.id(), "Nonce mismatch");
                    return Err(PageError::NonceMismatch);
                }
            };
        }

        page.core_mut().model_mut().insert(self.nonce_key.clone(), nonce);
        page.pre_service(cx)
    }

    /// Route to the page's GET or POST handler.
    pub fn dispatch(
        &self,
        page: &mut dyn PageInstance,
        cx: &TransactionContext,
    ) -> Result<View, PageError> {
        match &cx.method {
            Method::Get | Method::Head => page.on_get(cx),
            Method::Post => page.on_post(cx),
            Method::Other(name) => Err(PageError::UnsupportedMethod(name.clone())),
        }
    }

    /// The first POST observed moves a page from NEW to SUBMIT.
    pub fn update_state(&self, page: &mut dyn PageInstance, cx: &TransactionContext) {
        if cx.is_post() {
            page.core_mut().mark_submitted();
        }
    }
}

/// Releases a command object's temporary files exactly once.
///
/// Dropping the guard without calling [`finish`](Self::finish) still cleans
/// up, so a panicking handler leaves nothing behind.
struct CleanupGuard<'a> {
    janitor: &'a ResourceJanitor,
    key: Option<CommandKey>,
}

impl<'a> CleanupGuard<'a> {
    fn new(janitor: &'a Arc<ResourceJanitor>, key: CommandKey) -> Self {
        Self {
            janitor,
            key: Some(key),
        }
    }

    fn finish(mut self) -> CleanupReport {
        match self.key.take() {
            Some(key) => self.janitor.cleanup(key),
            None => CleanupReport::default(),
        }
    }
}

impl Drop for CleanupGuard<'_> {
    fn drop(&mut self) {
        if let Some(key) = self.key.take() {
            self.janitor.cleanup(key);
        }
    }
}
