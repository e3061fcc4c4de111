use std::sync::OnceLock;

use axum::response::{IntoResponse, Response};
use http::{HeaderValue, header};

use crate::classify::ClassificationMap;
use crate::failure::Failure;
use crate::problem::ProblemResponse;
use crate::render::{STATIC_FALLBACK_BODY, serialize};
use crate::status::catalog;

/// Classification used when no problem middleware re-renders the response
fn default_map() -> &'static ClassificationMap {
    static MAP: OnceLock<ClassificationMap> = OnceLock::new();
    MAP.get_or_init(ClassificationMap::new)
}

/// Renders the failure with the default classification
///
/// The failure itself is kept in the response extensions so the problem
/// middleware can re-render it with the configured classification map and
/// the request's trace id. Nothing is logged here; the adapter that writes
/// the final response does that.
impl IntoResponse for Failure {
    fn into_response(self) -> Response {
        let entry = default_map().classify(&self);

        let (status, body) = match serialize(&ProblemResponse::from_entry(entry, Some(&self), None)) {
            Ok(body) => (entry.http(), body),
            Err(_) => (
                catalog::INTERNAL_UNKNOWN_ERROR.http(),
                serialize(&ProblemResponse::minimal(None)).unwrap_or_else(|_| STATIC_FALLBACK_BODY.to_owned()),
            ),
        };

        let mut response = (status, body).into_response();
        response
            .headers_mut()
            .insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
        response.extensions_mut().insert(self);
        response
    }
}

#[cfg(test)]
mod tests {
    use http::StatusCode;

    use super::*;

    #[test]
    fn failure_response_keeps_failure_in_extensions() {
        let response = Failure::not_found("Widget", 42).into_response();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/json");

        let failure = response.extensions().get::<Failure>().unwrap();
        assert_eq!(failure.failure_type().as_str(), "NotFoundError");
    }
}
