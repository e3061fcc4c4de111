use std::any::Any;
use std::borrow::{Borrow, Cow};
use std::error::Error as StdError;
use std::fmt;

use convert_case::{Case, Casing};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::status::{StatusEntry, catalog};

/// Upper bound on how many `source()` links are converted into causes
const MAX_SOURCE_DEPTH: usize = 8;

/// Category tag attached to every failure at construction time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// Generic failure of a system we own
    OwnedSystem,
    AlreadyExists,
    NotFound,
    ExternalComponent,
    ValidationFailed,
    ArgumentInvalid,
    ArgumentOutOfRange,
    Unauthenticated,
    Forbidden,
    Unavailable,
    NotImplemented,
    Cancelled,
    Timeout,
    /// Several independent failures grouped together
    Aggregate,
    Unknown,
}

impl FailureKind {
    /// Whether this kind belongs to the owned-system family
    pub const fn is_owned(self) -> bool {
        matches!(
            self,
            Self::OwnedSystem | Self::AlreadyExists | Self::NotFound | Self::ExternalComponent | Self::ValidationFailed
        )
    }

    /// Type identity used for failures built without an explicit type
    pub const fn canonical_type(self) -> FailureType {
        match self {
            Self::OwnedSystem => FailureType::OWNED_SYSTEM,
            Self::AlreadyExists => FailureType::ALREADY_EXISTS,
            Self::NotFound => FailureType::NOT_FOUND,
            Self::ExternalComponent => FailureType::EXTERNAL_COMPONENT,
            Self::ValidationFailed => FailureType::VALIDATION_FAILED,
            Self::ArgumentInvalid => FailureType::ARGUMENT,
            Self::ArgumentOutOfRange => FailureType::ARGUMENT_OUT_OF_RANGE,
            Self::Unauthenticated => FailureType::UNAUTHENTICATED,
            Self::Forbidden => FailureType::FORBIDDEN,
            Self::Unavailable => FailureType::UNAVAILABLE,
            Self::NotImplemented => FailureType::NOT_IMPLEMENTED,
            Self::Cancelled => FailureType::CANCELLED,
            Self::Timeout => FailureType::TIMEOUT,
            Self::Aggregate => FailureType::AGGREGATE,
            Self::Unknown => FailureType::UNKNOWN,
        }
    }

    /// Catalog entry used when the classification map has nothing registered
    pub fn default_entry(self) -> &'static StatusEntry {
        match self {
            Self::OwnedSystem => &catalog::INTERNAL_ERROR,
            Self::AlreadyExists => &catalog::ALREADY_EXISTS,
            Self::NotFound => &catalog::NOT_FOUND,
            Self::ExternalComponent => &catalog::FAILED_DEPENDENCY,
            Self::ValidationFailed => &catalog::PRECONDITION_FAILED,
            Self::ArgumentInvalid => &catalog::ARGUMENT_ERROR,
            Self::ArgumentOutOfRange => &catalog::ARGUMENT_OUT_OF_RANGE,
            Self::Unauthenticated => &catalog::UNAUTHENTICATED,
            Self::Forbidden => &catalog::FORBIDDEN_PERMISSION,
            Self::Unavailable => &catalog::UNAVAILABLE,
            Self::NotImplemented => &catalog::NOT_IMPLEMENTED,
            Self::Cancelled => &catalog::REQUEST_CANCELLED,
            Self::Timeout => &catalog::TIMEOUT,
            Self::Aggregate | Self::Unknown => &catalog::INTERNAL_UNKNOWN_ERROR,
        }
    }

    /// Message used when a failure is created without one
    pub const fn default_message(self) -> &'static str {
        match self {
            Self::OwnedSystem => "A failure related with an owned system occurred.",
            Self::AlreadyExists => "A failure occurred due to an entity that already exists.",
            Self::NotFound => "A failure occurred due to an entity that was not found.",
            Self::ExternalComponent => "A failure related with an external component occurred.",
            Self::ValidationFailed => "One or more validation failures occurred.",
            Self::ArgumentInvalid => "Value does not fall within the expected range.",
            Self::ArgumentOutOfRange => "Specified argument was out of the range of valid values.",
            Self::Unauthenticated => "Authentication failed.",
            Self::Forbidden => "Attempted to perform an unauthorized operation.",
            Self::Unavailable => "The service is unavailable.",
            Self::NotImplemented => "The method or operation is not implemented.",
            Self::Cancelled => "The operation was canceled.",
            Self::Timeout => "The operation has timed out.",
            Self::Aggregate => "One or more errors occurred.",
            Self::Unknown => "An unknown failure occurred.",
        }
    }
}

/// Runtime type identity of a failure
///
/// Classification looks this up by exact value, so two failure types never
/// match each other even when they share a kind.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FailureType(Cow<'static, str>);

impl FailureType {
    pub const OWNED_SYSTEM: Self = Self::from_static("OwnedSystemError");
    pub const ALREADY_EXISTS: Self = Self::from_static("AlreadyExistsError");
    pub const NOT_FOUND: Self = Self::from_static("NotFoundError");
    pub const EXTERNAL_COMPONENT: Self = Self::from_static("ExternalComponentError");
    pub const VALIDATION_FAILED: Self = Self::from_static("ValidationFailedError");
    pub const ARGUMENT: Self = Self::from_static("ArgumentError");
    pub const ARGUMENT_NULL: Self = Self::from_static("ArgumentNullError");
    pub const ARGUMENT_OUT_OF_RANGE: Self = Self::from_static("ArgumentOutOfRangeError");
    pub const UNAUTHENTICATED: Self = Self::from_static("UnauthenticatedError");
    pub const FORBIDDEN: Self = Self::from_static("ForbiddenError");
    pub const UNAVAILABLE: Self = Self::from_static("UnavailableError");
    pub const NOT_IMPLEMENTED: Self = Self::from_static("NotImplementedError");
    pub const CANCELLED: Self = Self::from_static("CancelledError");
    pub const TIMEOUT: Self = Self::from_static("TimeoutError");
    pub const AGGREGATE: Self = Self::from_static("AggregateError");
    pub const IO: Self = Self::from_static("IoError");
    pub const PANIC: Self = Self::from_static("PanicError");
    pub const UNKNOWN: Self = Self::from_static("Error");

    pub const fn from_static(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }

    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    /// Type identity derived from a Rust type name, without module path or generics
    pub fn of<T: ?Sized>() -> Self {
        let full = std::any::type_name::<T>();
        let without_generics = full.split('<').next().unwrap_or(full);
        let short = without_generics.rsplit("::").next().unwrap_or(without_generics);
        Self(Cow::Owned(short.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Human readable label used to group failures in problem responses
    ///
    /// `NotFoundError` becomes `Not Found`; a name that is nothing but
    /// `Error` becomes `Unknown`.
    pub fn label(&self) -> String {
        let label = self
            .0
            .replace("Error", " ")
            .split_whitespace()
            .map(|word| word.to_case(Case::Title))
            .collect::<Vec<_>>()
            .join(" ");

        if label.is_empty() { "Unknown".to_owned() } else { label }
    }
}

impl fmt::Display for FailureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for FailureType {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&'static str> for FailureType {
    fn from(name: &'static str) -> Self {
        Self::from_static(name)
    }
}

impl From<String> for FailureType {
    fn from(name: String) -> Self {
        Self(Cow::Owned(name))
    }
}

/// A single field-level validation failure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationFailure {
    pub field: String,
    pub message: String,
}

impl ValidationFailure {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl<F: Into<String>, M: Into<String>> From<(F, M)> for ValidationFailure {
    fn from((field, message): (F, M)) -> Self {
        Self::new(field, message)
    }
}

/// A failure raised while handling a request or call
///
/// Carries a category tag, an exact type identity, a message and at most one
/// of: a wrapped cause, a set of sub-failures, or a validation list.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{message}")]
pub struct Failure {
    kind: FailureKind,
    failure_type: FailureType,
    message: String,
    #[source]
    cause: Option<Box<Failure>>,
    children: Vec<Failure>,
    validation: Vec<ValidationFailure>,
}

impl Failure {
    /// Create a failure of the given kind with its default type and message
    pub fn new(kind: FailureKind) -> Self {
        Self {
            kind,
            failure_type: kind.canonical_type(),
            message: kind.default_message().to_owned(),
            cause: None,
            children: Vec::new(),
            validation: Vec::new(),
        }
    }

    /// Application-defined failure in the owned-system family
    ///
    /// Unless its type is registered in the classification map it resolves
    /// to the generic owned-system entry.
    pub fn custom(failure_type: impl Into<FailureType>, message: impl Into<String>) -> Self {
        Self::new(FailureKind::OwnedSystem)
            .with_type(failure_type)
            .with_message(message)
    }

    pub fn owned(message: impl Into<String>) -> Self {
        Self::new(FailureKind::OwnedSystem).with_message(message)
    }

    pub fn already_exists(entity: &str, key: impl fmt::Display) -> Self {
        Self::new(FailureKind::AlreadyExists).with_entity(entity, key)
    }

    pub fn not_found(entity: &str, key: impl fmt::Display) -> Self {
        Self::new(FailureKind::NotFound).with_entity(entity, key)
    }

    pub fn external_component(name: &str, description: &str) -> Self {
        let message = format!(
            "{} | Component name: '{name}'. Component description: '{description}'.",
            FailureKind::ExternalComponent.default_message()
        );
        Self::new(FailureKind::ExternalComponent).with_message(message)
    }

    pub fn validation_failed<I>(failures: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<ValidationFailure>,
    {
        let mut failure = Self::new(FailureKind::ValidationFailed);
        failure.validation = failures.into_iter().map(Into::into).collect();
        failure
    }

    pub fn aggregate(children: impl IntoIterator<Item = Self>) -> Self {
        let mut failure = Self::new(FailureKind::Aggregate);
        failure.children = children.into_iter().collect();
        failure
    }

    pub fn argument(message: impl Into<String>) -> Self {
        Self::new(FailureKind::ArgumentInvalid).with_message(message)
    }

    pub fn unauthenticated(message: impl Into<String>) -> Self {
        Self::new(FailureKind::Unauthenticated).with_message(message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(FailureKind::Forbidden).with_message(message)
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(FailureKind::Unavailable).with_message(message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(FailureKind::Timeout).with_message(message)
    }

    pub fn unknown(message: impl Into<String>) -> Self {
        Self::new(FailureKind::Unknown).with_message(message)
    }

    pub fn out_of_range(message: impl Into<String>) -> Self {
        Self::new(FailureKind::ArgumentOutOfRange).with_message(message)
    }

    pub fn not_implemented(message: impl Into<String>) -> Self {
        Self::new(FailureKind::NotImplemented).with_message(message)
    }

    pub fn cancelled(message: impl Into<String>) -> Self {
        Self::new(FailureKind::Cancelled).with_message(message)
    }

    /// Replace the message; blank messages keep the current one
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        let message = message.into();
        if !message.trim().is_empty() {
            self.message = message;
        }
        self
    }

    /// Give the failure its own type identity while keeping its kind
    #[must_use]
    pub fn with_type(mut self, failure_type: impl Into<FailureType>) -> Self {
        self.failure_type = failure_type.into();
        self
    }

    #[must_use]
    pub fn with_cause(mut self, cause: Self) -> Self {
        self.cause = Some(Box::new(cause));
        self
    }

    fn with_entity(self, entity: &str, key: impl fmt::Display) -> Self {
        let message = format!("{} | Entity: '{entity}'. Entity key: '{key}'.", self.kind.default_message());
        self.with_message(message)
    }

    /// Convert any error, keeping its `source()` chain as nested causes
    pub fn from_error<E: StdError + 'static>(error: &E) -> Self {
        from_error_chain(error, FailureType::of::<E>())
    }

    /// Convert the payload of a caught panic
    pub fn from_panic(payload: &(dyn Any + Send)) -> Self {
        let detail = payload
            .downcast_ref::<&str>()
            .map(|s| (*s).to_owned())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic payload".to_owned());

        Self::unknown(format!("handler panicked: {detail}")).with_type(FailureType::PANIC)
    }

    pub const fn kind(&self) -> FailureKind {
        self.kind
    }

    pub const fn failure_type(&self) -> &FailureType {
        &self.failure_type
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn cause(&self) -> Option<&Self> {
        self.cause.as_deref()
    }

    pub fn children(&self) -> &[Self] {
        &self.children
    }

    pub fn validation_failures(&self) -> &[ValidationFailure] {
        &self.validation
    }

    /// Validation messages grouped per field, in first-seen field order
    pub fn validation_errors(&self) -> IndexMap<String, Vec<String>> {
        group_messages(
            self.validation
                .iter()
                .map(|v| (v.field.clone(), v.message.clone())),
        )
    }
}

impl From<std::io::Error> for Failure {
    fn from(error: std::io::Error) -> Self {
        Self::from_error(&error)
    }
}

impl From<anyhow::Error> for Failure {
    fn from(error: anyhow::Error) -> Self {
        // `downcast` would also see through context, so walk from the outermost error
        let outer: &(dyn StdError + 'static) = error.as_ref();
        from_error_chain(outer, FailureType::UNKNOWN)
    }
}

/// Group `(key, message)` pairs, keeping the first-seen order of keys
pub(crate) fn group_messages(pairs: impl Iterator<Item = (String, String)>) -> IndexMap<String, Vec<String>> {
    let mut groups: IndexMap<String, Vec<String>> = IndexMap::new();
    for (key, message) in pairs {
        groups.entry(key).or_default().push(message);
    }
    groups
}

fn from_error_chain(error: &(dyn StdError + 'static), outer_type: FailureType) -> Failure {
    let mut links = Vec::new();
    let mut current = Some(error);

    while let Some(link) = current {
        if links.len() >= MAX_SOURCE_DEPTH {
            break;
        }
        links.push(link);
        // A nested failure already carries its own causes
        if link.is::<Failure>() {
            break;
        }
        current = link.source();
    }

    let last = links.len().saturating_sub(1);
    let mut cause: Option<Failure> = None;

    for (depth, link) in links.into_iter().enumerate().rev() {
        let mut failure = convert_link(link);
        // a failure passed in directly keeps its own type
        if depth == 0 && !link.is::<Failure>() && failure.failure_type == FailureType::UNKNOWN {
            failure.failure_type = outer_type.clone();
        }
        if depth != last || failure.cause.is_none() {
            failure.cause = cause.take().map(Box::new);
        }
        cause = Some(failure);
    }

    cause.unwrap_or_else(|| Failure::unknown(error.to_string()))
}

fn convert_link(error: &(dyn StdError + 'static)) -> Failure {
    if let Some(failure) = error.downcast_ref::<Failure>() {
        return failure.clone();
    }

    if let Some(io) = error.downcast_ref::<std::io::Error>() {
        return Failure::new(io_kind(io.kind()))
            .with_type(FailureType::IO)
            .with_message(io.to_string());
    }

    Failure::unknown(error.to_string())
}

const fn io_kind(kind: std::io::ErrorKind) -> FailureKind {
    use std::io::ErrorKind;

    match kind {
        ErrorKind::InvalidInput | ErrorKind::InvalidData => FailureKind::ArgumentInvalid,
        ErrorKind::PermissionDenied => FailureKind::Forbidden,
        ErrorKind::TimedOut => FailureKind::Timeout,
        ErrorKind::Unsupported => FailureKind::NotImplemented,
        ErrorKind::ConnectionRefused
        | ErrorKind::ConnectionReset
        | ErrorKind::ConnectionAborted
        | ErrorKind::NotConnected => FailureKind::Unavailable,
        _ => FailureKind::Unknown,
    }
}

#[cfg(test)]
mod tests {
    use std::io;

    use super::*;

    #[derive(Debug, thiserror::Error)]
    #[error("storage layer failed")]
    struct StorageError {
        #[source]
        source: io::Error,
    }

    #[test]
    fn blank_message_keeps_default() {
        let failure = Failure::owned("   ");
        assert_eq!(failure.message(), "A failure related with an owned system occurred.");
        assert_eq!(failure.failure_type(), &FailureType::OWNED_SYSTEM);
    }

    #[test]
    fn not_found_message_names_entity_and_key() {
        let failure = Failure::not_found("Widget", 42);
        assert_eq!(
            failure.message(),
            "A failure occurred due to an entity that was not found. | Entity: 'Widget'. Entity key: '42'."
        );
        assert_eq!(failure.kind(), FailureKind::NotFound);
    }

    #[test]
    fn external_component_message_names_component() {
        let failure = Failure::external_component("billing", "payment gateway");
        assert_eq!(
            failure.message(),
            "A failure related with an external component occurred. | Component name: 'billing'. Component description: 'payment gateway'."
        );
    }

    #[test]
    fn custom_failure_is_owned() {
        let failure = Failure::custom("TeaPotError", "I'm a teapot");
        assert!(failure.kind().is_owned());
        assert_eq!(failure.failure_type().as_str(), "TeaPotError");
    }

    #[test]
    fn validation_errors_group_by_field_in_first_seen_order() {
        let failure =
            Failure::validation_failed([("Prop1", "msg1"), ("Prop2", "msg3"), ("Prop1", "msg2")]);
        let errors = failure.validation_errors();

        assert_eq!(errors.keys().collect::<Vec<_>>(), ["Prop1", "Prop2"]);
        assert_eq!(errors["Prop1"], ["msg1", "msg2"]);
        assert_eq!(errors["Prop2"], ["msg3"]);
    }

    #[test]
    fn labels_strip_error_and_split_words() {
        assert_eq!(FailureType::NOT_FOUND.label(), "Not Found");
        assert_eq!(FailureType::ARGUMENT_OUT_OF_RANGE.label(), "Argument Out Of Range");
        assert_eq!(FailureType::TIMEOUT.label(), "Timeout");
        assert_eq!(FailureType::UNKNOWN.label(), "Unknown");
    }

    #[test]
    fn type_of_drops_path_and_generics() {
        assert_eq!(FailureType::of::<io::Error>().as_str(), "Error");
        assert_eq!(FailureType::of::<Vec<u8>>().as_str(), "Vec");
        assert_eq!(FailureType::of::<StorageError>().as_str(), "StorageError");
    }

    #[test]
    fn source_exposes_cause() {
        let failure = Failure::owned("outer").with_cause(Failure::timeout("inner"));
        let source = StdError::source(&failure).unwrap();
        assert_eq!(source.to_string(), "inner");
    }

    #[test]
    fn io_error_maps_to_platform_kind() {
        let failure = Failure::from(io::Error::new(io::ErrorKind::TimedOut, "read timed out"));
        assert_eq!(failure.kind(), FailureKind::Timeout);
        assert_eq!(failure.failure_type(), &FailureType::IO);
        assert_eq!(failure.message(), "read timed out");
    }

    #[test]
    fn from_error_keeps_source_chain() {
        let error = StorageError {
            source: io::Error::new(io::ErrorKind::ConnectionRefused, "refused"),
        };
        let failure = Failure::from_error(&error);

        assert_eq!(failure.failure_type().as_str(), "StorageError");
        assert_eq!(failure.kind(), FailureKind::Unknown);
        assert_eq!(failure.message(), "storage layer failed");

        let cause = failure.cause().unwrap();
        assert_eq!(cause.kind(), FailureKind::Unavailable);
        assert_eq!(cause.message(), "refused");
    }

    #[derive(Debug, thiserror::Error)]
    #[error("layer {depth}")]
    struct Layered {
        depth: usize,
        #[source]
        source: Option<Box<Layered>>,
    }

    fn layered(depth: usize) -> Layered {
        let source = (depth > 1).then(|| Box::new(layered(depth - 1)));
        Layered { depth, source }
    }

    #[test]
    fn from_error_stops_at_max_depth() {
        let failure = Failure::from_error(&layered(12));
        let chain: Vec<_> = std::iter::successors(Some(&failure), |f| Failure::cause(f)).collect();

        assert_eq!(chain.len(), MAX_SOURCE_DEPTH);
        assert_eq!(chain[0].message(), "layer 12");
        assert_eq!(chain[MAX_SOURCE_DEPTH - 1].message(), "layer 5");
    }

    #[test]
    fn from_error_keeps_type_of_a_failure() {
        let failure = Failure::from_error(&Failure::unknown("lost"));
        assert_eq!(failure.failure_type(), &FailureType::UNKNOWN);
        assert_eq!(failure.message(), "lost");
    }

    #[test]
    fn named_constructors_set_kind() {
        assert_eq!(Failure::cancelled("client left").kind(), FailureKind::Cancelled);
        assert_eq!(Failure::not_implemented("later").kind(), FailureKind::NotImplemented);

        let failure = Failure::out_of_range("too big");
        assert_eq!(failure.kind(), FailureKind::ArgumentOutOfRange);
        assert_eq!(failure.failure_type(), &FailureType::ARGUMENT_OUT_OF_RANGE);
        assert_eq!(failure.message(), "too big");
    }

    #[test]
    fn anyhow_error_downcasts_to_failure() {
        let error = anyhow::Error::new(Failure::not_found("Widget", "7"));
        let failure = Failure::from(error);
        assert_eq!(failure.kind(), FailureKind::NotFound);
    }

    #[test]
    fn anyhow_context_wraps_failure_as_cause() {
        let error = anyhow::Error::new(Failure::timeout("slow")).context("loading widget");
        let failure = Failure::from(error);

        assert_eq!(failure.message(), "loading widget");
        assert_eq!(failure.cause().unwrap().kind(), FailureKind::Timeout);
    }

    #[test]
    fn panic_payload_becomes_unknown_failure() {
        let failure = Failure::from_panic(&"boom");
        assert_eq!(failure.kind(), FailureKind::Unknown);
        assert_eq!(failure.failure_type(), &FailureType::PANIC);
        assert_eq!(failure.message(), "handler panicked: boom");
    }
}
