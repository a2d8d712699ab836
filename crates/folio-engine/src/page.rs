//! Pages: framework-owned state plus application hooks.

use std::any::Any;

use folio_binder::{CommandSlot, CommandTarget, ResolvedCommand};
use folio_core::{
    strip_query, Errors, Model, PageError, PageId, PageState, ShadowInput, TransactionContext,
    View,
};
use serde_json::json;

/// Application logic of one page type.
///
/// Every hook has a default. A page opts into each HTTP method it supports
/// by overriding [`on_get`] and/or [`on_post`]; the defaults reject the
/// request with [`PageError::UnsupportedMethod`].
///
/// Hooks run in this order for every execution:
///
/// 1. [`pre_service`] (after the nonce check)
/// 2. parameter binding into the command object
/// 3. [`validate`]
/// 4. [`on_validation_error`], only if errors were collected
/// 5. [`load_data`]
/// 6. [`on_get`] or [`on_post`]
/// 7. [`commit`] on success, [`rollback`] on failure
///
/// A hook returning `Some(view)` short-circuits the remaining steps up to
/// commit.
///
/// [`on_get`]: PageHandler::on_get
/// [`on_post`]: PageHandler::on_post
/// [`pre_service`]: PageHandler::pre_service
/// [`validate`]: PageHandler::validate
/// [`on_validation_error`]: PageHandler::on_validation_error
/// [`load_data`]: PageHandler::load_data
/// [`commit`]: PageHandler::commit
/// [`rollback`]: PageHandler::rollback
pub trait PageHandler: Any + Send + 'static {
    /// Handle GET and HEAD.
    fn on_get(&mut self, page: &mut PageCore, cx: &TransactionContext) -> Result<View, PageError> {
        let _ = page;
        Err(PageError::UnsupportedMethod(cx.method.to_string()))
    }

    /// Handle POST.
    fn on_post(&mut self, page: &mut PageCore, cx: &TransactionContext) -> Result<View, PageError> {
        let _ = page;
        Err(PageError::UnsupportedMethod(cx.method.to_string()))
    }

    /// Prepare for the request. Runs after the nonce check.
    fn pre_service(
        &mut self,
        page: &mut PageCore,
        cx: &TransactionContext,
    ) -> Result<Option<View>, PageError> {
        let _ = (page, cx);
        Ok(None)
    }

    /// Domain validation after binding. May add entries to `page.errors_mut()`.
    fn validate(
        &mut self,
        page: &mut PageCore,
        cx: &TransactionContext,
    ) -> Result<Option<View>, PageError> {
        let _ = (page, cx);
        Ok(None)
    }

    /// React to binding or validation errors.
    ///
    /// Persistent pages carry on so the business method can re-render the
    /// form; one-shot pages fail with [`PageError::ValidationFailed`].
    fn on_validation_error(
        &mut self,
        page: &mut PageCore,
        cx: &TransactionContext,
    ) -> Result<Option<View>, PageError> {
        let _ = cx;
        if page.is_persistent() {
            Ok(None)
        } else {
            Err(PageError::ValidationFailed(page.errors().clone()))
        }
    }

    /// Load data needed by the business method.
    fn load_data(&mut self, page: &mut PageCore, cx: &TransactionContext) -> Result<(), PageError> {
        let _ = (page, cx);
        Ok(())
    }

    /// Pick the object request parameters are bound into.
    ///
    /// Called at most once per page instance.
    fn command_object(&mut self) -> CommandTarget {
        CommandTarget::Page
    }

    /// Finish a successful execution.
    fn commit(&mut self, page: &mut PageCore) {
        let _ = page;
    }

    /// Undo a failed execution.
    fn rollback(&mut self, page: &mut PageCore, error: &PageError) {
        let _ = (page, error);
    }
}

/// Framework-owned state of a page instance.
#[derive(Debug)]
pub struct PageCore {
    id: Option<PageId>,
    type_name: &'static str,
    persistent: bool,
    state: PageState,
    uri: String,
    page_id_param: String,
    view_name: Option<String>,
    content_type: String,
    model: Model,
    errors: Errors,
    pub(crate) shadow: ShadowInput,
    pub(crate) command: CommandSlot,
}

impl PageCore {
    /// Create the state of a fresh page.
    pub fn new(
        type_name: &'static str,
        persistent: bool,
        content_type: impl Into<String>,
        page_id_param: impl Into<String>,
    ) -> Self {
        Self {
            id: None,
            type_name,
            persistent,
            state: PageState::New,
            uri: String::new(),
            page_id_param: page_id_param.into(),
            view_name: None,
            content_type: content_type.into(),
            model: Model::new(),
            errors: Errors::new(),
            shadow: ShadowInput::new(),
            command: CommandSlot::new(),
        }
    }

    /// Registry identity, once the page has been registered.
    pub fn id(&self) -> Option<PageId> {
        self.id
    }

    pub(crate) fn assign_id(&mut self, id: PageId) {
        self.id = Some(id);
    }

    /// Name of the handler type.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Whether the page survives across requests.
    pub fn is_persistent(&self) -> bool {
        self.persistent
    }

    /// Current lifecycle state.
    pub fn state(&self) -> PageState {
        self.state
    }

    /// Move to a later state.
    ///
    /// # Errors
    ///
    /// Fails with [`PageError::InvalidStateTransition`] when `next` ranks
    /// below the current state or the page is already finished.
    pub fn advance(&mut self, next: PageState) -> Result<(), PageError> {
        if !self.state.can_advance_to(next) {
            return Err(PageError::InvalidStateTransition {
                from: self.state,
                to: next,
            });
        }
        self.state = next;
        Ok(())
    }

    /// Mark the page done. It will not be scheduled again.
    pub fn finish(&mut self) -> Result<(), PageError> {
        self.advance(PageState::Finished)
    }

    pub(crate) fn mark_submitted(&mut self) {
        if self.state.is_new_or_post() {
            self.state = PageState::Submit;
        }
    }

    /// URI the page is reachable at.
    ///
    /// A registered page answers at its path plus the identity parameter;
    /// any other query parameters are dropped. Other pages report the
    /// request URI unchanged.
    pub fn uri(&self) -> String {
        match self.id {
            Some(id) => format!("{}?{}={}", self.path(), self.page_id_param, id),
            None => self.uri.clone(),
        }
    }

    /// Request path without the query string.
    pub fn path(&self) -> &str {
        strip_query(&self.uri)
    }

    pub(crate) fn attach(&mut self, cx: &TransactionContext) {
        self.uri.clone_from(&cx.uri);
    }

    /// View rendered by [`View::Default`]; the request path unless changed.
    pub fn view_name(&self) -> &str {
        self.view_name.as_deref().unwrap_or_else(|| self.path())
    }

    /// Change the default view.
    pub fn set_view_name(&mut self, name: impl Into<String>) {
        self.view_name = Some(name.into());
    }

    /// Response content type.
    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    /// Change the response content type.
    pub fn set_content_type(&mut self, content_type: impl Into<String>) {
        self.content_type = content_type.into();
    }

    /// Values exposed to the view.
    pub fn model(&self) -> &Model {
        &self.model
    }

    /// Mutable access to the model.
    pub fn model_mut(&mut self) -> &mut Model {
        &mut self.model
    }

    /// Errors collected for the current request.
    pub fn errors(&self) -> &Errors {
        &self.errors
    }

    /// Mutable access to the errors.
    pub fn errors_mut(&mut self) -> &mut Errors {
        &mut self.errors
    }

    /// Check if any errors were collected.
    pub fn has_errors(&self) -> bool {
        self.errors.has_errors()
    }

    /// Raw submitted values, for redisplay.
    pub fn shadow_input(&self) -> &ShadowInput {
        &self.shadow
    }

    /// The command object, once resolved.
    pub fn command(&self) -> Option<&ResolvedCommand> {
        self.command.get()
    }

    /// Developer diagnostics.
    pub fn snapshot(&self) -> serde_json::Value {
        json!({
            "id": self.id.map(|id| id.get()),
            "type": self.type_name,
            "persistent": self.persistent,
            "state": self.state.to_string(),
            "uri": self.uri(),
            "view": self.view_name(),
            "errors": self.errors,
            "model": self.model,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_core::Method;

    fn core(persistent: bool) -> PageCore {
        PageCore::new("Wizard", persistent, "text/html; charset=UTF-8", "_pid")
    }

    #[test]
    fn test_uri_of_registered_page_keeps_only_identity() {
        let mut page = core(true);
        page.attach(&TransactionContext::new(Method::Get, "/wizard?step=2&x=1"));
        assert_eq!(page.uri(), "/wizard?step=2&x=1");

        page.assign_id(PageId(7));
        assert_eq!(page.uri(), "/wizard?_pid=7");
        assert_eq!(page.path(), "/wizard");
    }

    #[test]
    fn test_view_name_defaults_to_path() {
        let mut page = core(false);
        page.attach(&TransactionContext::new(Method::Get, "/orders/list?page=3"));
        assert_eq!(page.view_name(), "/orders/list");

        page.set_view_name("orders/index");
        assert_eq!(page.view_name(), "orders/index");
    }

    #[test]
    fn test_state_moves_forward_only() {
        let mut page = core(true);
        page.mark_submitted();
        assert_eq!(page.state(), PageState::Submit);

        page.advance(PageState::Step(1)).unwrap();
        page.mark_submitted();
        assert_eq!(page.state(), PageState::Step(1));

        let err = page.advance(PageState::Submit).unwrap_err();
        assert!(matches!(err, PageError::InvalidStateTransition { .. }));

        page.finish().unwrap();
        assert!(page.finish().is_err());
    }

    #[test]
    fn test_snapshot() {
        let mut page = core(true);
        page.assign_id(PageId(3));
        page.errors_mut().add_field("age", "Invalid integer value: abc");
        page.model_mut().insert("name", "Ada");

        let snapshot = page.snapshot();
        assert_eq!(snapshot["id"], 3);
        assert_eq!(snapshot["state"], "NEW");
        assert_eq!(snapshot["errors"][0]["field"], "age");
        assert_eq!(snapshot["model"]["name"], "Ada");
    }
}
