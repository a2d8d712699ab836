//! Type-erased page instances.

use folio_binder::{CommandBinder, CommandKey, CommandTarget, ResolvedCommand};
use folio_core::{Errors, PageError, PageId, TransactionContext, View};
use folio_registry::Persistable;

use crate::page::{PageCore, PageHandler};

/// A page: framework state plus the application handler.
#[derive(Debug)]
pub struct Page<H> {
    core: PageCore,
    handler: H,
}

impl<H: PageHandler> Page<H> {
    /// Wrap a handler.
    pub fn new(core: PageCore, handler: H) -> Self {
        Self { core, handler }
    }

    /// The application handler.
    pub fn handler(&self) -> &H {
        &self.handler
    }

    /// Mutable access to the application handler.
    pub fn handler_mut(&mut self) -> &mut H {
        &mut self.handler
    }

    fn resolved(&mut self) -> &ResolvedCommand {
        let handler = &mut self.handler;
        self.core.command.resolve(|| handler.command_object())
    }
}

/// Object-safe view of a [`Page`], used by the engine and the registry.
pub trait PageInstance: Send + 'static {
    /// Framework state.
    fn core(&self) -> &PageCore;

    /// Mutable framework state.
    fn core_mut(&mut self) -> &mut PageCore;

    /// Resolve the command object (once) and return its key.
    fn command_key(&mut self) -> CommandKey;

    /// Bind request parameters into the command object.
    fn bind(&mut self, binder: &CommandBinder, cx: &TransactionContext) -> Errors;

    /// Current text of a command object field, for redisplay.
    fn field_text(&self, binder: &CommandBinder, field: &str) -> Option<String>;

    fn pre_service(&mut self, cx: &TransactionContext) -> Result<Option<View>, PageError>;
    fn validate(&mut self, cx: &TransactionContext) -> Result<Option<View>, PageError>;
    fn on_validation_error(&mut self, cx: &TransactionContext) -> Result<Option<View>, PageError>;
    fn load_data(&mut self, cx: &TransactionContext) -> Result<(), PageError>;
    fn on_get(&mut self, cx: &TransactionContext) -> Result<View, PageError>;
    fn on_post(&mut self, cx: &TransactionContext) -> Result<View, PageError>;
    fn commit(&mut self);
    fn rollback(&mut self, error: &PageError);
}

impl<H: PageHandler> PageInstance for Page<H> {
    fn core(&self) -> &PageCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut PageCore {
        &mut self.core
    }

    fn command_key(&mut self) -> CommandKey {
        self.resolved().key()
    }

    fn bind(&mut self, binder: &CommandBinder, cx: &TransactionContext) -> Errors {
        let handler = &mut self.handler;
        let command = self.core.command.resolve(|| handler.command_object());
        binder.bind(command, handler, &cx.params, &cx.files, &mut self.core.shadow)
    }

    fn field_text(&self, binder: &CommandBinder, field: &str) -> Option<String> {
        match self.core.command()?.target() {
            CommandTarget::Page => binder.field_text(&self.handler, field),
            CommandTarget::Alternate(shared) => {
                let target = shared.lock();
                binder.field_text(&**target, field)
            }
        }
    }

    fn pre_service(&mut self, cx: &TransactionContext) -> Result<Option<View>, PageError> {
        self.handler.pre_service(&mut self.core, cx)
    }

    fn validate(&mut self, cx: &TransactionContext) -> Result<Option<View>, PageError> {
        self.handler.validate(&mut self.core, cx)
    }

    fn on_validation_error(&mut self, cx: &TransactionContext) -> Result<Option<View>, PageError> {
        self.handler.on_validation_error(&mut self.core, cx)
    }

    fn load_data(&mut self, cx: &TransactionContext) -> Result<(), PageError> {
        self.handler.load_data(&mut self.core, cx)
    }

    fn on_get(&mut self, cx: &TransactionContext) -> Result<View, PageError> {
        self.handler.on_get(&mut self.core, cx)
    }

    fn on_post(&mut self, cx: &TransactionContext) -> Result<View, PageError> {
        self.handler.on_post(&mut self.core, cx)
    }

    fn commit(&mut self) {
        self.handler.commit(&mut self.core)
    }

    fn rollback(&mut self, error: &PageError) {
        self.handler.rollback(&mut self.core, error)
    }
}

impl Persistable for Box<dyn PageInstance> {
    fn assign_identity(&mut self, id: PageId) {
        self.core_mut().assign_id(id);
    }
}
