//! Page type registrations.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use folio_core::strip_query;

use crate::instance::{Page, PageInstance};
use crate::page::{PageCore, PageHandler};

type PageFactory = dyn Fn(PageCore) -> Box<dyn PageInstance> + Send + Sync;

/// How to build pages of one handler type.
#[derive(Clone)]
pub struct PageType {
    name: &'static str,
    persistent: bool,
    factory: Arc<PageFactory>,
}

impl PageType {
    /// Pages built by calling `factory` for every fresh request.
    pub fn new<H, F>(factory: F) -> Self
    where
        H: PageHandler,
        F: Fn() -> H + Send + Sync + 'static,
    {
        Self {
            name: short_type_name::<H>(),
            persistent: false,
            factory: Arc::new(move |core| -> Box<dyn PageInstance> {
                Box::new(Page::new(core, factory()))
            }),
        }
    }

    /// Pages built from `H::default()`.
    pub fn of<H: PageHandler + Default>() -> Self {
        Self::new(H::default)
    }

    /// Keep pages of this type across requests.
    ///
    /// POSTs to persistent pages must carry the session nonce.
    pub fn persistent(mut self) -> Self {
        self.persistent = true;
        self
    }

    /// Handler type name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Whether pages of this type survive across requests.
    pub fn is_persistent(&self) -> bool {
        self.persistent
    }

    /// Build a fresh page.
    pub fn instantiate(&self, content_type: &str, page_id_param: &str) -> Box<dyn PageInstance> {
        let core = PageCore::new(self.name, self.persistent, content_type, page_id_param);
        (self.factory)(core)
    }
}

impl fmt::Debug for PageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PageType")
            .field("name", &self.name)
            .field("persistent", &self.persistent)
            .finish()
    }
}

fn short_type_name<T>() -> &'static str {
    let full = std::any::type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

/// Maps request paths to page types.
#[derive(Debug, Clone, Default)]
pub struct PageCatalog {
    pages: HashMap<String, PageType>,
}

impl PageCatalog {
    /// Create an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a page type under a path. A later registration for the same
    /// path replaces the earlier one.
    pub fn register(&mut self, path: impl Into<String>, page_type: PageType) -> &mut Self {
        let path = path.into();
        let path = strip_query(&path).to_string();
        tracing::debug!(
            path = %path,
            page = page_type.name(),
            persistent = page_type.is_persistent(),
            "Registered page type"
        );
        self.pages.insert(path, page_type);
        self
    }

    /// Builder form of [`register`](Self::register).
    pub fn with(mut self, path: impl Into<String>, page_type: PageType) -> Self {
        self.register(path, page_type);
        self
    }

    /// Page type registered for a request path.
    pub fn get(&self, path: &str) -> Option<&PageType> {
        self.pages.get(strip_query(path))
    }

    /// Registered paths, sorted.
    pub fn paths(&self) -> Vec<&str> {
        let mut paths: Vec<_> = self.pages.keys().map(String::as_str).collect();
        paths.sort_unstable();
        paths
    }

    /// Number of registered page types.
    pub fn len(&self) -> usize {
        self.pages.len()
    }

    /// Whether nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }
}
