use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::classify::ClassificationMap;
use crate::failure::Failure;
use crate::problem::ProblemResponse;
use crate::status::{StatusEntry, catalog};

/// Last-resort body if even the minimal response fails to serialize
pub(crate) const STATIC_FALLBACK_BODY: &str = r#"{"detail":"500","title":"500","type":"An internal unknown error occurred.","status":500,"traceId":null}"#;

/// Errors raised while encoding a problem response
#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("failed to serialize problem response: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to encode problem response: {0}")]
    Other(String),
}

/// Turns a problem response into response body text
pub trait ProblemEncoder: Send + Sync {
    fn encode(&self, problem: &ProblemResponse) -> Result<String, EncodeError>;
}

/// JSON encoder with lowerCamelCase field names
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonEncoder;

impl ProblemEncoder for JsonEncoder {
    fn encode(&self, problem: &ProblemResponse) -> Result<String, EncodeError> {
        serialize(problem)
    }
}

/// Serialize a problem response to JSON text
pub fn serialize(problem: &ProblemResponse) -> Result<String, EncodeError> {
    Ok(serde_json::to_string(problem)?)
}

/// A problem response ready to be written to a transport
#[derive(Debug, Clone)]
pub struct RenderedProblem {
    /// Status the transport should report
    pub status: StatusEntry,
    /// Encoded response body
    pub body: String,
    /// Whether the minimal fallback response was used
    pub fallback: bool,
}

/// Classifies, builds and encodes problem responses
///
/// Cheap to clone; shared by every adapter invocation.
#[derive(Clone)]
pub struct ProblemRenderer {
    map: Arc<ClassificationMap>,
    encoder: Arc<dyn ProblemEncoder>,
}

impl fmt::Debug for ProblemRenderer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProblemRenderer").field("map", &self.map).finish_non_exhaustive()
    }
}

impl Default for ProblemRenderer {
    fn default() -> Self {
        Self::new(Arc::new(ClassificationMap::new()))
    }
}

impl ProblemRenderer {
    pub fn new(map: Arc<ClassificationMap>) -> Self {
        Self {
            map,
            encoder: Arc::new(JsonEncoder),
        }
    }

    /// Replace the JSON encoder
    #[must_use]
    pub fn with_encoder(mut self, encoder: impl ProblemEncoder + 'static) -> Self {
        self.encoder = Arc::new(encoder);
        self
    }

    pub fn classification(&self) -> &ClassificationMap {
        &self.map
    }

    /// Render the problem response for a failure
    ///
    /// Never fails: if encoding breaks, the minimal unknown response is
    /// returned instead.
    pub fn render(&self, failure: Option<&Failure>, trace_id: Option<&str>) -> RenderedProblem {
        let entry = match failure {
            Some(failure) => self.map.classify(failure),
            None => {
                tracing::warn!("absent failure used to build a problem response, default returned");
                self.map.unknown_entry()
            }
        };

        let problem = ProblemResponse::from_entry(entry, failure, trace_id);

        match self.encoder.encode(&problem) {
            Ok(body) => {
                tracing::info!(
                    http_status = entry.http().as_u16(),
                    rpc_code = ?entry.rpc(),
                    body = %body,
                    "problem response built"
                );

                RenderedProblem {
                    status: entry.clone(),
                    body,
                    fallback: false,
                }
            }
            Err(e) => {
                tracing::error!(error = %e, problem = ?problem, "problem response was not serialized, using fallback");
                Self::fallback(trace_id)
            }
        }
    }

    fn fallback(trace_id: Option<&str>) -> RenderedProblem {
        let body = serialize(&ProblemResponse::minimal(trace_id)).unwrap_or_else(|_| STATIC_FALLBACK_BODY.to_owned());

        RenderedProblem {
            status: catalog::INTERNAL_UNKNOWN_ERROR.clone(),
            body,
            fallback: true,
        }
    }
}
