//! Procedural macros for the Folio page framework.
//!
//! Provides:
//! - `#[derive(Command)]` - Build the field table of a command object

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::spanned::Spanned;
use syn::{parse_macro_input, Data, DeriveInput, Expr, Fields, LitStr};

/// Derive `folio_binder::Command` for a struct with named fields.
///
/// Only fields marked `#[param]` are bound from request parameters.
///
/// # Example
///
/// ```rust,ignore
/// use folio_macros::Command;
///
/// #[derive(Default, Command)]
/// struct Signup {
///     #[param]
///     age: i32,
///
///     #[param(name = "e-mail")]
///     email: String,
///
///     #[param(converter = RangeConverter::new(IntegerConverter, 1, 10))]
///     seats: i32,
///
///     #[param(readonly)]
///     plan: String,
///
///     #[param(upload)]
///     avatar: Option<UploadedFile>,
///
///     // Not bound
///     attempts: u32,
/// }
/// ```
///
/// Fields without a `converter` use the one registered for their type
/// through `folio_binder::Convertible`. The generated code refers to the
/// `folio_binder` crate, which must be a dependency of the deriving crate.
#[proc_macro_derive(Command, attributes(param))]
pub fn derive_command(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    expand_command(&input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

/// Options parsed from one `#[param(...)]` attribute.
#[derive(Default)]
struct ParamOptions {
    name: Option<LitStr>,
    converter: Option<Expr>,
    readonly: bool,
    upload: bool,
}

fn expand_command(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let ident = &input.ident;

    if !input.generics.params.is_empty() {
        return Err(syn::Error::new(
            input.generics.span(),
            "#[derive(Command)] does not support generic types",
        ));
    }

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(named) => &named.named,
            _ => {
                return Err(syn::Error::new(
                    ident.span(),
                    "#[derive(Command)] requires a struct with named fields",
                ))
            }
        },
        _ => {
            return Err(syn::Error::new(
                ident.span(),
                "#[derive(Command)] can only be used on structs",
            ))
        }
    };

    let mut registrations = Vec::new();
    for field in fields {
        let Some(options) = param_options(field)? else {
            continue;
        };
        let Some(member) = &field.ident else {
            continue;
        };
        let ty = &field.ty;
        let name = match &options.name {
            Some(lit) => lit.value(),
            None => member.to_string(),
        };

        if options.upload {
            if options.converter.is_some() || options.readonly {
                return Err(syn::Error::new(
                    field.span(),
                    "upload fields take no converter and cannot be readonly",
                ));
            }
            registrations.push(quote! {
                .upload(#name, |c| c.#member.as_ref(), |c, file| c.#member = Some(file))
            });
            continue;
        }

        let converter = match &options.converter {
            Some(expr) => quote! { #expr },
            None => quote! {
                <<#ty as ::folio_binder::Convertible>::Converter as ::core::default::Default>::default()
            },
        };
        let method = if options.readonly {
            quote! { readonly }
        } else {
            quote! { field }
        };

        registrations.push(quote! {
            .#method(#name, #converter, |c| &c.#member, |c, value| c.#member = value)
        });
    }

    Ok(quote! {
        impl ::folio_binder::Command for #ident {
            fn field_table() -> ::folio_binder::FieldTable<Self> {
                ::folio_binder::FieldTable::<Self>::builder()
                    #(#registrations)*
                    .build()
            }
        }
    })
}

/// Parse the `#[param]` attribute of a field, if any.
fn param_options(field: &syn::Field) -> syn::Result<Option<ParamOptions>> {
    let Some(attr) = field.attrs.iter().find(|a| a.path().is_ident("param")) else {
        return Ok(None);
    };

    let mut options = ParamOptions::default();
    if matches!(attr.meta, syn::Meta::Path(_)) {
        return Ok(Some(options));
    }

    attr.parse_nested_meta(|meta| {
        if meta.path.is_ident("name") {
            options.name = Some(meta.value()?.parse()?);
            Ok(())
        } else if meta.path.is_ident("converter") {
            options.converter = Some(meta.value()?.parse()?);
            Ok(())
        } else if meta.path.is_ident("readonly") {
            options.readonly = true;
            Ok(())
        } else if meta.path.is_ident("upload") {
            options.upload = true;
            Ok(())
        } else {
            Err(meta.error("expected `name`, `converter`, `readonly` or `upload`"))
        }
    })?;

    Ok(Some(options))
}
