//! What the rendering layer receives.

use folio_core::{Errors, Model, PageId, PageState, View};
use http::StatusCode;
use serde::Serialize;

use crate::page::PageCore;

/// A view with the page defaults applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ResolvedView {
    /// Render a template.
    Render {
        /// Template name.
        name: String,
    },
    /// Send the client elsewhere.
    Redirect {
        /// Target URI.
        uri: String,
        /// Redirect status code.
        status: u16,
    },
}

/// Result of a successful page execution.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageResponse {
    /// Selected view.
    pub view: ResolvedView,
    /// Response content type.
    pub content_type: String,
    /// Values for the view, including the session nonce.
    pub model: Model,
    /// Errors to display next to the form.
    pub errors: Errors,
    /// Identity of a persistent page.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_id: Option<PageId>,
    /// Canonical page URI.
    pub uri: String,
    /// Page state after the execution; absent for redirects that never
    /// reached the page.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<PageState>,
}

impl PageResponse {
    /// Build the response for a page and the view its handler selected.
    pub fn from_page(page: &PageCore, view: View) -> Self {
        let view = match view {
            View::Default => ResolvedView::Render {
                name: page.view_name().to_string(),
            },
            View::Named(name) => ResolvedView::Render { name },
            View::Redirect { uri, status } => ResolvedView::Redirect { uri, status },
        };

        Self {
            view,
            content_type: page.content_type().to_string(),
            model: page.model().clone(),
            errors: page.errors().clone(),
            page_id: page.id(),
            uri: page.uri(),
            state: Some(page.state()),
        }
    }

    /// A redirect issued without running any page.
    pub fn redirect(uri: impl Into<String>, status: u16, content_type: impl Into<String>) -> Self {
        let uri = uri.into();
        Self {
            view: ResolvedView::Redirect {
                uri: uri.clone(),
                status,
            },
            content_type: content_type.into(),
            model: Model::new(),
            errors: Errors::new(),
            page_id: None,
            uri,
            state: None,
        }
    }

    /// Check whether the response is a redirect.
    pub fn is_redirect(&self) -> bool {
        matches!(self.view, ResolvedView::Redirect { .. })
    }

    /// Suggested HTTP status.
    pub fn status(&self) -> StatusCode {
        match &self.view {
            ResolvedView::Render { .. } => StatusCode::OK,
            ResolvedView::Redirect { status, .. } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::MOVED_PERMANENTLY)
            }
        }
    }

    /// Template name, when rendering.
    pub fn view_name(&self) -> Option<&str> {
        match &self.view {
            ResolvedView::Render { name } => Some(name),
            ResolvedView::Redirect { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_core::{Method, TransactionContext};

    #[test]
    fn test_default_view_resolves_to_path() {
        let mut page = PageCore::new("Report", false, "text/html; charset=UTF-8", "_pid");
        page.attach(&TransactionContext::new(Method::Get, "/reports/daily?day=3"));

        let response = PageResponse::from_page(&page, View::Default);

        assert_eq!(response.view_name(), Some("/reports/daily"));
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.uri, "/reports/daily?day=3");
        assert_eq!(response.content_type, "text/html; charset=UTF-8");
    }

    #[test]
    fn test_redirect() {
        let response = PageResponse::redirect("/done", 302, "text/html");
        assert!(response.is_redirect());
        assert_eq!(response.status(), StatusCode::FOUND);
        assert!(response.view_name().is_none());

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["view"]["kind"], "redirect");
        assert!(json.get("state").is_none());
    }
}
