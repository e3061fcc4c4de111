use thiserror::Error;

/// Errors raised while building a classification map
#[derive(Debug, Error)]
pub enum ClassificationError {
    /// HTTP status outside `100..=599`
    #[error("invalid HTTP status code: {0}")]
    InvalidHttpStatus(u16),

    /// RPC status code outside `0..=16`
    #[error("invalid RPC status code: {0}")]
    InvalidRpcCode(i32),

    /// Override without a failure type
    #[error("failure type must not be blank")]
    BlankFailureType,

    /// Configured override could not be applied
    #[error("invalid override for failure type '{failure_type}': {source}")]
    InvalidOverride {
        failure_type: String,
        #[source]
        source: Box<ClassificationError>,
    },
}
