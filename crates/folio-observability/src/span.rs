//! Execution spans.

use folio_core::{PageError, TransactionContext};
use tracing::field::Empty;
use tracing::Span;

/// Create the span wrapping one page execution.
///
/// `page_id` and `outcome` are recorded later through [`record_page_id`]
/// and [`record_outcome`].
pub fn execution_span(cx: &TransactionContext) -> Span {
    tracing::info_span!(
        "page_execution",
        request_id = %cx.request_id,
        method = %cx.method,
        path = cx.path(),
        page_id = Empty,
        outcome = Empty,
    )
}

/// Record the persistent identity once it is known.
pub fn record_page_id(span: &Span, page_id: impl std::fmt::Display) {
    span.record("page_id", tracing::field::display(page_id));
}

/// Record how the execution ended.
pub fn record_outcome<T>(span: &Span, result: &Result<T, PageError>) {
    let outcome = match result {
        Ok(_) => "ok",
        Err(e) => e.kind().as_str(),
    };
    span.record("outcome", outcome);
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_core::Method;

    #[test]
    fn test_execution_span_records_fields() {
        crate::init_test_tracing();

        let cx = TransactionContext::new(Method::Post, "/orders?x=1");
        let span = execution_span(&cx);
        record_page_id(&span, 7);
        record_outcome::<()>(&span, &Err(PageError::NonceMissing));

        let _entered = span.enter();
        tracing::debug!("inside execution span");
    }
}
