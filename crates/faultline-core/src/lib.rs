#![allow(clippy::must_use_candidate, clippy::missing_errors_doc)]

pub mod classify;
mod error;
pub mod failure;
pub mod guard;
pub mod problem;
pub mod render;
#[cfg(feature = "axum")]
mod response;
pub mod status;
pub mod trace;

pub use classify::{Classification, ClassificationMap, Resolution};
pub use error::ClassificationError;
pub use failure::{Failure, FailureKind, FailureType, ValidationFailure};
pub use problem::{ProblemErrors, ProblemResponse};
pub use render::{EncodeError, JsonEncoder, ProblemEncoder, ProblemRenderer, RenderedProblem, serialize};
pub use status::{RpcCode, StatusEntry, catalog};
