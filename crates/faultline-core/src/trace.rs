use http::HeaderMap;
use http::header::HeaderName;

/// W3C trace context header
pub static TRACEPARENT: HeaderName = HeaderName::from_static("traceparent");

pub static REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// Response header carrying the trace id of a problem response
pub static TRACE_ID: HeaderName = HeaderName::from_static("x-trace-id");

/// Trace id supplied by the caller, if any
///
/// `traceparent` wins over `x-request-id`. Blank or non-ASCII values are
/// ignored.
pub fn trace_id_from_headers(headers: &HeaderMap) -> Option<String> {
    [&TRACEPARENT, &REQUEST_ID].into_iter().find_map(|name| {
        headers
            .get(name)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(ToOwned::to_owned)
    })
}

/// Trace id supplied by the caller, or a fresh random one
pub fn trace_id_or_generate(headers: &HeaderMap) -> String {
    trace_id_from_headers(headers).unwrap_or_else(|| uuid::Uuid::new_v4().to_string())
}
