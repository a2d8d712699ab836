//! Static field metadata for command objects.

use std::any::Any;
use std::sync::Arc;

use folio_core::{Errors, Parameters, ShadowInput, UploadedFile, UploadedFiles};

use crate::command::CommandKey;
use crate::convert::Converter;
use crate::error::ConversionError;
use crate::janitor::ResourceJanitor;

type ApplyFn<C> = Box<dyn Fn(&mut C, &str) -> Result<(), ConversionError> + Send + Sync>;
type RenderFn<C> = Box<dyn Fn(&C) -> String + Send + Sync>;

/// A command type with a declarative field table.
///
/// Usually implemented with `#[derive(Command)]`.
pub trait Command: Any + Send + Sized {
    /// Build this type's field table. Called once, at registration.
    fn field_table() -> FieldTable<Self>;
}

/// What kind of data a field holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Converted from parameter text.
    Value,
    /// Temporary uploaded file; tracked for cleanup.
    Upload,
}

enum Access<C> {
    Value {
        apply: ApplyFn<C>,
        render: RenderFn<C>,
    },
    Upload {
        get: fn(&C) -> Option<&UploadedFile>,
        set: fn(&mut C, UploadedFile),
    },
}

/// Metadata for one command object field.
pub struct FieldSpec<C> {
    name: &'static str,
    bindable: bool,
    access: Access<C>,
}

impl<C> FieldSpec<C> {
    /// Field name (also the request parameter name).
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Whether request parameters may populate this field.
    pub fn is_bindable(&self) -> bool {
        self.bindable
    }

    /// Field kind.
    pub fn kind(&self) -> FieldKind {
        match self.access {
            Access::Value { .. } => FieldKind::Value,
            Access::Upload { .. } => FieldKind::Upload,
        }
    }
}

impl<C> std::fmt::Debug for FieldSpec<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldSpec")
            .field("name", &self.name)
            .field("bindable", &self.bindable)
            .field("kind", &self.kind())
            .finish()
    }
}

/// Per-request inputs and sinks for one binding pass.
pub struct BindScope<'a> {
    /// Command object being bound.
    pub key: CommandKey,
    /// Request parameters.
    pub params: &'a Parameters,
    /// Uploaded files.
    pub files: &'a UploadedFiles,
    /// Raw value snapshot.
    pub shadow: &'a mut ShadowInput,
    /// Accumulated field errors.
    pub errors: &'a mut Errors,
    /// Tracks uploaded files for cleanup.
    pub janitor: &'a ResourceJanitor,
}

/// The ordered field metadata of one command type.
pub struct FieldTable<C> {
    fields: Vec<FieldSpec<C>>,
}

impl<C: 'static> FieldTable<C> {
    /// Start building a table.
    pub fn builder() -> FieldTableBuilder<C> {
        FieldTableBuilder { fields: Vec::new() }
    }

    /// All fields, in declaration order.
    pub fn fields(&self) -> &[FieldSpec<C>] {
        &self.fields
    }

    /// Look up a field by name.
    pub fn field(&self, name: &str) -> Option<&FieldSpec<C>> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Bind every bindable field of `target`.
    ///
    /// All fields are attempted; conversion failures are recorded per field.
    /// Absent parameters leave the current value untouched. Uploaded files
    /// are registered with the janitor before they are stored in the field.
    pub fn bind(&self, target: &mut C, scope: &mut BindScope<'_>) {
        for spec in self.fields.iter().filter(|f| f.bindable) {
            match &spec.access {
                Access::Value { apply, .. } => {
                    let Some(text) = scope.params.get(spec.name) else {
                        continue;
                    };
                    scope.shadow.set(spec.name, text.as_str());
                    if let Err(e) = apply(target, text) {
                        tracing::debug!(field = spec.name, error = %e, "field conversion failed");
                        scope.errors.add_field(spec.name, e.to_string());
                    }
                }
                Access::Upload { set, .. } => {
                    let Some(file) = scope.files.get(spec.name) else {
                        continue;
                    };
                    scope.janitor.register_temp_file(scope.key, spec.name, file.clone());
                    set(target, file.clone());
                }
            }
        }
    }

    /// Render a value field back into text.
    pub fn field_text(&self, target: &C, name: &str) -> Option<String> {
        match &self.field(name)?.access {
            Access::Value { render, .. } => Some(render(target)),
            Access::Upload { get, .. } => get(target).map(|f| f.path().display().to_string()),
        }
    }
}

/// Builder for [`FieldTable`].
pub struct FieldTableBuilder<C> {
    fields: Vec<FieldSpec<C>>,
}

impl<C: 'static> FieldTableBuilder<C> {
    /// Add a bindable value field.
    pub fn field<K>(
        self,
        name: &'static str,
        converter: K,
        get: fn(&C) -> &K::Value,
        set: fn(&mut C, K::Value),
    ) -> Self
    where
        K: Converter,
    {
        self.value_field(name, true, converter, get, set)
    }

    /// Add a value field that is displayed but never bound from the request.
    pub fn readonly<K>(
        self,
        name: &'static str,
        converter: K,
        get: fn(&C) -> &K::Value,
        set: fn(&mut C, K::Value),
    ) -> Self
    where
        K: Converter,
    {
        self.value_field(name, false, converter, get, set)
    }

    /// Add an uploaded-file field.
    pub fn upload(
        mut self,
        name: &'static str,
        get: fn(&C) -> Option<&UploadedFile>,
        set: fn(&mut C, UploadedFile),
    ) -> Self {
        self.fields.push(FieldSpec {
            name,
            bindable: true,
            access: Access::Upload { get, set },
        });
        self
    }

    /// Finish the table.
    pub fn build(self) -> FieldTable<C> {
        FieldTable {
            fields: self.fields,
        }
    }

    fn value_field<K>(
        mut self,
        name: &'static str,
        bindable: bool,
        converter: K,
        get: fn(&C) -> &K::Value,
        set: fn(&mut C, K::Value),
    ) -> Self
    where
        K: Converter,
    {
        let converter = Arc::new(converter);
        let reader = Arc::clone(&converter);
        self.fields.push(FieldSpec {
            name,
            bindable,
            access: Access::Value {
                apply: Box::new(move |target: &mut C, text: &str| {
                    let value = converter.from_text(text)?;
                    set(target, value);
                    Ok(())
                }),
                render: Box::new(move |target: &C| reader.to_text(get(target))),
            },
        });
        self
    }
}

/// Type-erased view of a field table, stored in the catalog.
pub(crate) trait ErasedFieldTable: Send + Sync {
    fn bind_any(&self, target: &mut dyn Any, scope: &mut BindScope<'_>) -> bool;
    fn field_text_any(&self, target: &dyn Any, name: &str) -> Option<String>;
    fn field_names(&self) -> Vec<&'static str>;
}

impl<C: Any + Send> ErasedFieldTable for FieldTable<C> {
    fn bind_any(&self, target: &mut dyn Any, scope: &mut BindScope<'_>) -> bool {
        match target.downcast_mut::<C>() {
            Some(target) => {
                self.bind(target, scope);
                true
            }
            None => false,
        }
    }

    fn field_text_any(&self, target: &dyn Any, name: &str) -> Option<String> {
        self.field_text(target.downcast_ref::<C>()?, name)
    }

    fn field_names(&self) -> Vec<&'static str> {
        self.fields.iter().map(|f| f.name).collect()
    }
}
