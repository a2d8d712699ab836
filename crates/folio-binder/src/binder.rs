//! Binding request parameters into command objects.

use std::any::Any;
use std::sync::Arc;

use folio_core::{Errors, Parameters, ShadowInput, UploadedFiles};

use crate::catalog::FieldCatalog;
use crate::command::{CommandTarget, ResolvedCommand};
use crate::field::BindScope;
use crate::janitor::ResourceJanitor;

/// Populates command objects from request parameters.
///
/// Binding never fails as a whole: conversion problems come back as a
/// non-empty [`Errors`] collection so the page can react.
#[derive(Debug, Clone)]
pub struct CommandBinder {
    catalog: Arc<FieldCatalog>,
    janitor: Arc<ResourceJanitor>,
}

impl CommandBinder {
    /// Create a binder over a field catalog and janitor.
    pub fn new(catalog: Arc<FieldCatalog>, janitor: Arc<ResourceJanitor>) -> Self {
        Self { catalog, janitor }
    }

    /// The janitor uploaded files are registered with.
    pub fn janitor(&self) -> &Arc<ResourceJanitor> {
        &self.janitor
    }

    /// The field catalog.
    pub fn catalog(&self) -> &FieldCatalog {
        &self.catalog
    }

    /// Bind parameters into a resolved command object.
    ///
    /// `page_target` is the page handler, used when the page is its own
    /// command object. Raw values land in `shadow`.
    pub fn bind(
        &self,
        command: &ResolvedCommand,
        page_target: &mut dyn Any,
        params: &Parameters,
        files: &UploadedFiles,
        shadow: &mut ShadowInput,
    ) -> Errors {
        let mut errors = Errors::new();
        let mut scope = BindScope {
            key: command.key(),
            params,
            files,
            shadow,
            errors: &mut errors,
            janitor: &self.janitor,
        };

        let bound = match command.target() {
            CommandTarget::Page => self.catalog.bind_any(page_target, &mut scope),
            CommandTarget::Alternate(shared) => {
                let mut target = shared.lock();
                self.catalog.bind_any(&mut **target, &mut scope)
            }
        };

        if !bound {
            tracing::trace!(command = %command.key(), "command object has no field table");
        }
        errors
    }

    /// Render a field of a command object back into text.
    pub fn field_text(&self, target: &dyn Any, field: &str) -> Option<String> {
        self.catalog.field_text_any(target, field)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::CommandSlot;
    use crate::convert::{IntegerConverter, StringConverter};
    use crate::field::{Command, FieldTable};
    use folio_core::UploadedFile;

    #[derive(Default)]
    struct Order {
        quantity: i32,
        note: String,
        receipt: Option<UploadedFile>,
    }

    impl Command for Order {
        fn field_table() -> FieldTable<Self> {
            FieldTable::<Order>::builder()
                .field("quantity", IntegerConverter, |o| &o.quantity, |o, v| o.quantity = v)
                .field("note", StringConverter, |o| &o.note, |o, v| o.note = v)
                .upload("receipt", |o| o.receipt.as_ref(), |o, f| o.receipt = Some(f))
                .build()
        }
    }

    fn binder() -> CommandBinder {
        let catalog = FieldCatalog::new().with::<Order>();
        CommandBinder::new(Arc::new(catalog), Arc::new(ResourceJanitor::new()))
    }

    #[test]
    fn test_bind_page_target() {
        let binder = binder();
        let slot = CommandSlot::new();
        let command = slot.resolve(|| CommandTarget::Page);
        let mut order = Order::default();
        let params: Parameters = [("quantity".to_string(), "42".to_string())]
            .into_iter()
            .collect();
        let mut shadow = ShadowInput::new();

        let errors = binder.bind(command, &mut order, &params, &UploadedFiles::new(), &mut shadow);

        assert!(errors.is_empty());
        assert_eq!(order.quantity, 42);
        assert_eq!(binder.field_text(&order, "quantity").as_deref(), Some("42"));
    }

    #[test]
    fn test_bind_alternate_target() {
        let binder = binder();
        let slot = CommandSlot::new();
        let command = slot.resolve(|| CommandTarget::alternate(Order::default()));
        let params: Parameters = [
            ("quantity".to_string(), "abc".to_string()),
            ("note".to_string(), "gift".to_string()),
        ]
        .into_iter()
        .collect();
        let mut shadow = ShadowInput::new();
        let mut unrelated = ();

        let errors = binder.bind(command, &mut unrelated, &params, &UploadedFiles::new(), &mut shadow);

        assert_eq!(errors.for_field("quantity").count(), 1);
        assert_eq!(shadow.get("quantity"), Some("abc"));
        let CommandTarget::Alternate(shared) = command.target() else {
            panic!("expected alternate target");
        };
        let target = shared.lock();
        let order = target.downcast_ref::<Order>().unwrap();
        assert_eq!(order.note, "gift");
        assert_eq!(order.quantity, 0);
    }

    #[test]
    fn test_unregistered_type_binds_nothing() {
        let binder = binder();
        let slot = CommandSlot::new();
        let command = slot.resolve(|| CommandTarget::Page);
        let params: Parameters = [("x".to_string(), "1".to_string())].into_iter().collect();
        let mut target = 5u8;
        let mut shadow = ShadowInput::new();

        let errors = binder.bind(command, &mut target, &params, &UploadedFiles::new(), &mut shadow);
        assert!(errors.is_empty());
        assert!(shadow.is_empty());
    }

    #[test]
    fn test_uploads_tracked_even_when_binding_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("receipt.pdf");
        std::fs::write(&path, b"%PDF").unwrap();

        let binder = binder();
        let slot = CommandSlot::new();
        let command = slot.resolve(|| CommandTarget::Page);
        let mut order = Order::default();
        let params: Parameters = [("quantity".to_string(), "many".to_string())]
            .into_iter()
            .collect();
        let files: UploadedFiles = [(
            "receipt".to_string(),
            UploadedFile::new(&path).with_content_type("application/pdf"),
        )]
        .into_iter()
        .collect();
        let mut shadow = ShadowInput::new();

        let errors = binder.bind(command, &mut order, &params, &files, &mut shadow);

        assert!(errors.has_errors());
        assert_eq!(order.receipt.as_ref().map(|f| f.path()), Some(path.as_path()));
        assert_eq!(binder.janitor().tracked_count(command.key()), 1);

        let report = binder.janitor().cleanup(command.key());
        assert_eq!(report.deleted, 1);
        assert!(!path.exists());
    }
}
