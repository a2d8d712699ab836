//! Field tables keyed by command type.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;

use crate::field::{BindScope, Command, ErasedFieldTable, FieldTable};

/// Registry of field tables, built once at application start.
///
/// Request-time lookups go by the concrete type of the command object; a
/// type with no registered table simply has no bindable fields.
#[derive(Default)]
pub struct FieldCatalog {
    tables: HashMap<TypeId, Arc<dyn ErasedFieldTable>>,
}

impl FieldCatalog {
    /// Create an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a command type using its derived table.
    pub fn register<C: Command>(&mut self) -> &mut Self {
        self.register_table(C::field_table())
    }

    /// Register an explicitly built table.
    pub fn register_table<C: Any + Send>(&mut self, table: FieldTable<C>) -> &mut Self {
        tracing::debug!(
            command = std::any::type_name::<C>(),
            fields = table.fields().len(),
            "registered command fields"
        );
        self.tables.insert(TypeId::of::<C>(), Arc::new(table));
        self
    }

    /// Builder-style registration.
    pub fn with<C: Command>(mut self) -> Self {
        self.register::<C>();
        self
    }

    /// Check whether a command type is registered.
    pub fn contains<C: Any>(&self) -> bool {
        self.tables.contains_key(&TypeId::of::<C>())
    }

    /// Field names of a registered command type.
    pub fn field_names<C: Any>(&self) -> Option<Vec<&'static str>> {
        self.tables
            .get(&TypeId::of::<C>())
            .map(|table| table.field_names())
    }

    /// Number of registered command types.
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    /// Check if no command type is registered.
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    pub(crate) fn bind_any(&self, target: &mut dyn Any, scope: &mut BindScope<'_>) -> bool {
        let type_id = (*target).type_id();
        match self.tables.get(&type_id) {
            Some(table) => table.bind_any(target, scope),
            None => false,
        }
    }

    pub(crate) fn field_text_any(&self, target: &dyn Any, name: &str) -> Option<String> {
        self.tables.get(&(*target).type_id())?.field_text_any(target, name)
    }
}

impl std::fmt::Debug for FieldCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldCatalog")
            .field("types", &self.tables.len())
            .finish()
    }
}
