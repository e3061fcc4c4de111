//! Precondition checks that fail with a classified [`Failure`].

use std::fmt;

use crate::failure::{Failure, FailureKind, FailureType};

/// Fail with `failure` unless `condition` holds
///
/// The failure is only built when the check fails.
pub fn ensure(condition: bool, failure: impl FnOnce() -> Failure) -> Result<(), Failure> {
    if condition { Ok(()) } else { Err(failure()) }
}

/// Unwrap a value that must be present
pub fn not_null<T>(value: Option<T>, description: &str) -> Result<T, Failure> {
    value.ok_or_else(|| argument_null(description))
}

/// Unwrap an entity that must exist
pub fn found<T>(value: Option<T>, entity: &str, key: impl fmt::Display) -> Result<T, Failure> {
    value.ok_or_else(|| Failure::not_found(entity, key))
}

pub fn in_range(condition: bool, description: &str) -> Result<(), Failure> {
    ensure(condition, || {
        Failure::out_of_range(format!(
            "{} Argument description: {description}",
            FailureKind::ArgumentOutOfRange.default_message()
        ))
    })
}

/// Reject empty or whitespace-only strings
pub fn not_blank<'a>(value: &'a str, description: &str) -> Result<&'a str, Failure> {
    if value.trim().is_empty() {
        return Err(Failure::argument(format!(
            "String cannot be null, empty or white space. Argument description: {description}"
        )));
    }
    Ok(value)
}

/// Unwrap every value; the first missing one fails the whole list
pub fn all_not_null<T>(values: impl IntoIterator<Item = Option<T>>, description: &str) -> Result<Vec<T>, Failure> {
    values.into_iter().map(|value| not_null(value, description)).collect()
}

pub fn all_not_blank<'a, I>(values: I, description: &str) -> Result<(), Failure>
where
    I: IntoIterator<Item = &'a str>,
{
    values
        .into_iter()
        .try_for_each(|value| not_blank(value, description).map(|_| ()))
}

fn argument_null(description: &str) -> Failure {
    Failure::argument(format!("Value cannot be null. Argument description: {description}"))
        .with_type(FailureType::ARGUMENT_NULL)
}
