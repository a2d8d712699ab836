//! View selection returned by page business methods.

use serde::{Deserialize, Serialize};

/// Default status used for redirects.
pub const DEFAULT_REDIRECT_STATUS: u16 = 301;

/// What a page wants rendered once it has handled a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum View {
    /// Render the page's own view (derived from its URI unless changed).
    Default,
    /// Render a named view.
    Named(String),
    /// Redirect the client elsewhere.
    Redirect {
        /// Target URI.
        uri: String,
        /// Redirect status code.
        status: u16,
    },
}

impl View {
    /// Render a named view.
    pub fn named(name: impl Into<String>) -> Self {
        View::Named(name.into())
    }

    /// Redirect with the default status.
    pub fn redirect(uri: impl Into<String>) -> Self {
        View::Redirect {
            uri: uri.into(),
            status: DEFAULT_REDIRECT_STATUS,
        }
    }

    /// Redirect with an explicit status. Non-redirect statuses fall back to
    /// the default.
    pub fn redirect_with_status(uri: impl Into<String>, status: u16) -> Self {
        let status = if (300..400).contains(&status) {
            status
        } else {
            DEFAULT_REDIRECT_STATUS
        };
        View::Redirect {
            uri: uri.into(),
            status,
        }
    }

    /// Check whether this view is a redirect.
    pub fn is_redirect(&self) -> bool {
        matches!(self, View::Redirect { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redirect_status() {
        assert_eq!(
            View::redirect("/done"),
            View::Redirect {
                uri: "/done".to_string(),
                status: 301
            }
        );
        assert_eq!(
            View::redirect_with_status("/x", 303),
            View::Redirect {
                uri: "/x".to_string(),
                status: 303
            }
        );
        assert_eq!(
            View::redirect_with_status("/x", 200),
            View::Redirect {
                uri: "/x".to_string(),
                status: 301
            }
        );
        assert!(View::redirect("/a").is_redirect());
        assert!(!View::Default.is_redirect());
    }
}
