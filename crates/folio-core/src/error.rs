//! Request-level error taxonomy.

use http::StatusCode;
use thiserror::Error;

use crate::lifecycle::PageState;
use crate::model::Errors;

/// Failure kinds the rendering layer maps to responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Request method not handled by the page.
    UnsupportedMethod,
    /// CSRF token missing from a protected POST.
    NonceMissing,
    /// CSRF token did not match the session token.
    NonceMismatch,
    /// One field's text could not be converted.
    FieldConversion,
    /// Binding or domain validation produced errors.
    ValidationFailed,
    /// Persistent page identity unknown, evicted or finished.
    PageNotFound,
    /// No page type registered for the request path.
    RouteNotFound,
    /// A temporary file could not be deleted.
    ResourceCleanup,
    /// A page attempted a backward state transition.
    InvalidStateTransition,
    /// Business logic failed.
    Handler,
}

impl ErrorKind {
    /// Every kind, in declaration order.
    pub const ALL: [ErrorKind; 10] = [
        ErrorKind::UnsupportedMethod,
        ErrorKind::NonceMissing,
        ErrorKind::NonceMismatch,
        ErrorKind::FieldConversion,
        ErrorKind::ValidationFailed,
        ErrorKind::PageNotFound,
        ErrorKind::RouteNotFound,
        ErrorKind::ResourceCleanup,
        ErrorKind::InvalidStateTransition,
        ErrorKind::Handler,
    ];

    /// Get the kind as a static label (for logs and metrics).
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::UnsupportedMethod => "unsupported_method",
            ErrorKind::NonceMissing => "nonce_missing",
            ErrorKind::NonceMismatch => "nonce_mismatch",
            ErrorKind::FieldConversion => "field_conversion",
            ErrorKind::ValidationFailed => "validation_failed",
            ErrorKind::PageNotFound => "page_not_found",
            ErrorKind::RouteNotFound => "route_not_found",
            ErrorKind::ResourceCleanup => "resource_cleanup",
            ErrorKind::InvalidStateTransition => "invalid_state_transition",
            ErrorKind::Handler => "handler",
        }
    }
}

/// Errors that terminate one page execution.
#[derive(Error, Debug)]
pub enum PageError {
    /// Request method not handled by the page.
    #[error("request method {0} not supported")]
    UnsupportedMethod(String),

    /// CSRF token missing.
    #[error("nonce missing")]
    NonceMissing,

    /// CSRF token mismatch.
    #[error("nonce mismatch")]
    NonceMismatch,

    /// Parameter validation failed on a page that cannot recover.
    #[error("parameter validation failed ({} error(s))", .0.len())]
    ValidationFailed(Errors),

    /// Persistent page not found.
    #[error("page not found: {0}")]
    PageNotFound(String),

    /// No page registered for the path.
    #[error("route not found: {0}")]
    RouteNotFound(String),

    /// Backward or post-terminal state transition.
    #[error("invalid state transition from {from} to {to}")]
    InvalidStateTransition { from: PageState, to: PageState },

    /// Business logic failure.
    #[error("page handler failed: {0}")]
    Handler(#[from] anyhow::Error),
}

impl PageError {
    /// Classify the failure.
    pub fn kind(&self) -> ErrorKind {
        match self {
            PageError::UnsupportedMethod(_) => ErrorKind::UnsupportedMethod,
            PageError::NonceMissing => ErrorKind::NonceMissing,
            PageError::NonceMismatch => ErrorKind::NonceMismatch,
            PageError::ValidationFailed(_) => ErrorKind::ValidationFailed,
            PageError::PageNotFound(_) => ErrorKind::PageNotFound,
            PageError::RouteNotFound(_) => ErrorKind::RouteNotFound,
            PageError::InvalidStateTransition { .. } => ErrorKind::InvalidStateTransition,
            PageError::Handler(_) => ErrorKind::Handler,
        }
    }

    /// Check if this is a CSRF failure.
    pub fn is_security_failure(&self) -> bool {
        matches!(self, PageError::NonceMissing | PageError::NonceMismatch)
    }

    /// Check if the failure ends the execution as a hard failure.
    ///
    /// Always true: recoverable validation failures stay in the page's
    /// [`Errors`] and never escape the lifecycle. `ValidationFailed` only
    /// escapes from a non-persistent page that kept the default handler.
    pub fn is_fatal(&self) -> bool {
        true
    }

    /// Check if the failure is terminal for the addressed page (retrying the
    /// same request cannot succeed).
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            PageError::PageNotFound(_) | PageError::RouteNotFound(_)
        )
    }

    /// Suggested HTTP status for the rendering layer.
    pub fn status(&self) -> StatusCode {
        match self {
            PageError::UnsupportedMethod(_) => StatusCode::METHOD_NOT_ALLOWED,
            PageError::NonceMissing | PageError::NonceMismatch => StatusCode::FORBIDDEN,
            PageError::ValidationFailed(_) => StatusCode::BAD_REQUEST,
            PageError::PageNotFound(_) | PageError::RouteNotFound(_) => StatusCode::NOT_FOUND,
            PageError::InvalidStateTransition { .. } | PageError::Handler(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

/// Invalid engine configuration.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        let err = PageError::UnsupportedMethod("GET".to_string());
        assert_eq!(err.kind(), ErrorKind::UnsupportedMethod);
        assert_eq!(err.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert!(!err.is_security_failure());
        assert!(err.is_fatal());

        assert!(PageError::NonceMissing.is_security_failure());
        assert_eq!(PageError::NonceMismatch.status(), StatusCode::FORBIDDEN);

        let not_found = PageError::PageNotFound("7".to_string());
        assert!(not_found.is_terminal());
        assert_eq!(not_found.kind().as_str(), "page_not_found");
    }

    #[test]
    fn test_handler_errors_convert() {
        fn business() -> Result<(), PageError> {
            Err(anyhow::anyhow!("downstream unavailable"))?;
            Ok(())
        }

        let err = business().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Handler);
        assert!(err.to_string().contains("downstream unavailable"));
    }

    #[test]
    fn test_validation_message() {
        let mut errors = Errors::new();
        errors.add_field("age", "bad");
        let err = PageError::ValidationFailed(errors);
        assert_eq!(err.to_string(), "parameter validation failed (1 error(s))");
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert!(err.is_fatal());
    }
}
