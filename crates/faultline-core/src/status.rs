use std::borrow::Cow;
use std::fmt;

use http::StatusCode;
use tonic::Code;

use crate::error::ClassificationError;

/// RPC status code type, re-exported for callers that do not depend on tonic
pub use tonic::Code as RpcCode;

/// Pairs an HTTP status, an RPC status code and a shared description
///
/// Entries are plain values: two entries with the same codes and
/// description are the same entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusEntry {
    http: StatusCode,
    rpc: Code,
    description: Cow<'static, str>,
}

impl StatusEntry {
    /// Create an entry from already-valid codes
    pub const fn new(http: StatusCode, rpc: Code, description: &'static str) -> Self {
        Self {
            http,
            rpc,
            description: Cow::Borrowed(description),
        }
    }

    /// Create an entry with an owned description
    pub fn custom(http: StatusCode, rpc: Code, description: impl Into<Cow<'static, str>>) -> Self {
        Self {
            http,
            rpc,
            description: description.into(),
        }
    }

    /// Create an entry from raw numeric codes
    ///
    /// The HTTP status must lie in `100..=599` and the RPC code in `0..=16`.
    pub fn from_parts(
        http: u16,
        rpc: i32,
        description: impl Into<Cow<'static, str>>,
    ) -> Result<Self, ClassificationError> {
        if !(100..=599).contains(&http) {
            return Err(ClassificationError::InvalidHttpStatus(http));
        }
        let http = StatusCode::from_u16(http).map_err(|_| ClassificationError::InvalidHttpStatus(http))?;

        if !(0..=16).contains(&rpc) {
            return Err(ClassificationError::InvalidRpcCode(rpc));
        }

        Ok(Self::custom(http, Code::from_i32(rpc), description))
    }

    pub const fn http(&self) -> StatusCode {
        self.http
    }

    pub const fn rpc(&self) -> Code {
        self.rpc
    }

    pub fn description(&self) -> &str {
        &self.description
    }
}

impl fmt::Display for StatusEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} / {:?}: {}", self.http.as_u16(), self.rpc, self.description)
    }
}

/// Canonical status entries
pub mod catalog {
    use http::StatusCode;
    use tonic::Code;

    use super::StatusEntry;

    pub static ALREADY_EXISTS: StatusEntry =
        StatusEntry::new(StatusCode::CONFLICT, Code::AlreadyExists, "Entity already exists.");

    pub static ARGUMENT_ERROR: StatusEntry =
        StatusEntry::new(StatusCode::BAD_REQUEST, Code::InvalidArgument, "Argument is incorrect.");

    pub static ARGUMENT_OUT_OF_RANGE: StatusEntry =
        StatusEntry::new(StatusCode::BAD_REQUEST, Code::OutOfRange, "Argument is out of range.");

    pub static FAILED_DEPENDENCY: StatusEntry = StatusEntry::new(
        StatusCode::FAILED_DEPENDENCY,
        Code::Internal,
        "Underlying component on which the system depends failed.",
    );

    pub static FORBIDDEN_PERMISSION: StatusEntry = StatusEntry::new(
        StatusCode::FORBIDDEN,
        Code::PermissionDenied,
        "Permission to operation is not granted.",
    );

    pub static INTERNAL_ERROR: StatusEntry =
        StatusEntry::new(StatusCode::INTERNAL_SERVER_ERROR, Code::Internal, "An internal error occurred.");

    pub static INTERNAL_UNKNOWN_ERROR: StatusEntry = StatusEntry::new(
        StatusCode::INTERNAL_SERVER_ERROR,
        Code::Unknown,
        "An internal unknown error occurred.",
    );

    pub static NOT_FOUND: StatusEntry = StatusEntry::new(StatusCode::NOT_FOUND, Code::NotFound, "Entity not found.");

    pub static NOT_IMPLEMENTED: StatusEntry =
        StatusEntry::new(StatusCode::NOT_IMPLEMENTED, Code::Unimplemented, "Operation is not supported.");

    pub static PRECONDITION_FAILED: StatusEntry = StatusEntry::new(
        StatusCode::BAD_REQUEST,
        Code::FailedPrecondition,
        "Precondition required to operation failed.",
    );

    pub static REQUEST_CANCELLED: StatusEntry =
        StatusEntry::new(StatusCode::BAD_REQUEST, Code::Cancelled, "Operation was cancelled.");

    pub static TIMEOUT: StatusEntry =
        StatusEntry::new(StatusCode::GATEWAY_TIMEOUT, Code::DeadlineExceeded, "Operation timed out.");

    pub static UNAUTHENTICATED: StatusEntry = StatusEntry::new(
        StatusCode::UNAUTHORIZED,
        Code::Unauthenticated,
        "Required authentication is absent.",
    );

    pub static UNAVAILABLE: StatusEntry =
        StatusEntry::new(StatusCode::SERVICE_UNAVAILABLE, Code::Unavailable, "Service is not available.");
}
