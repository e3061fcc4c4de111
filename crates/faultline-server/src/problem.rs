use std::panic::AssertUnwindSafe;

use axum::extract::Request;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use faultline_core::trace::{TRACE_ID, trace_id_or_generate};
use faultline_core::{Failure, ProblemRenderer, RenderedProblem};
use futures::FutureExt;
use http::{HeaderValue, header};

/// Middleware that turns failures escaping a handler into problem responses
///
/// Catches both handler panics and `Failure` values returned as errors
/// (`Result<_, Failure>` handlers). Everything else passes through
/// untouched.
pub async fn problem_middleware(renderer: ProblemRenderer, request: Request, next: Next) -> Response {
    let trace_id = trace_id_or_generate(request.headers());
    let method = request.method().clone();
    let path = request.uri().path().to_owned();

    tracing::info!(%method, %path, "incoming request");

    let failure = match AssertUnwindSafe(next.run(request)).catch_unwind().await {
        Ok(mut response) => match response.extensions_mut().remove::<Failure>() {
            Some(failure) => failure,
            None => return response,
        },
        Err(payload) => Failure::from_panic(&*payload),
    };

    tracing::error!(
        %method,
        %path,
        %trace_id,
        failure_type = %failure.failure_type(),
        detail = failure.message(),
        "request failed"
    );

    let rendered = renderer.render(Some(&failure), Some(&trace_id));
    problem_response(rendered, &trace_id)
}

fn problem_response(rendered: RenderedProblem, trace_id: &str) -> Response {
    let mut response = (rendered.status.http(), rendered.body).into_response();
    let headers = response.headers_mut();

    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
    if let Ok(value) = HeaderValue::from_str(trace_id) {
        headers.insert(&TRACE_ID, value);
    }

    response
}
