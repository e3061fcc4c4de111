use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::classify::ClassificationMap;
use crate::failure::{Failure, FailureKind, group_messages};
use crate::status::{StatusEntry, catalog};

/// Per-label failure messages, in first-seen label order
pub type ProblemErrors = IndexMap<String, Vec<String>>;

/// Structured description of a failure returned to a caller
///
/// Serializes with lowerCamelCase field names; `errors` is left out entirely
/// when there is nothing to group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProblemResponse {
    detail: String,
    title: String,
    #[serde(rename = "type")]
    status_type_description: String,
    #[serde(rename = "status")]
    http_status: u16,
    trace_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    errors: Option<ProblemErrors>,
}

impl ProblemResponse {
    /// Build the response for a failure
    ///
    /// An absent failure yields the unknown response with an empty detail.
    pub fn build(map: &ClassificationMap, failure: Option<&Failure>, trace_id: Option<&str>) -> Self {
        let entry = failure.map_or_else(|| map.unknown_entry(), |failure| map.classify(failure));
        Self::from_entry(entry, failure, trace_id)
    }

    /// Build the response for a failure that was already classified
    pub fn from_entry(entry: &StatusEntry, failure: Option<&Failure>, trace_id: Option<&str>) -> Self {
        Self {
            detail: failure.map(Failure::message).unwrap_or_default().to_owned(),
            title: entry.http().as_u16().to_string(),
            status_type_description: entry.description().to_owned(),
            http_status: entry.http().as_u16(),
            trace_id: trace_id.map(ToOwned::to_owned),
            errors: failure.and_then(collect_errors),
        }
    }

    /// Bare response used when the full one cannot be rendered
    ///
    /// Holds only scalar fields, so it always serializes.
    pub fn minimal(trace_id: Option<&str>) -> Self {
        let entry = &catalog::INTERNAL_UNKNOWN_ERROR;
        let status_text = entry.http().as_u16().to_string();

        Self {
            detail: status_text.clone(),
            title: status_text,
            status_type_description: entry.description().to_owned(),
            http_status: entry.http().as_u16(),
            trace_id: trace_id.map(ToOwned::to_owned),
            errors: None,
        }
    }

    pub fn detail(&self) -> &str {
        &self.detail
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn status_type_description(&self) -> &str {
        &self.status_type_description
    }

    pub const fn http_status(&self) -> u16 {
        self.http_status
    }

    pub fn trace_id(&self) -> Option<&str> {
        self.trace_id.as_deref()
    }

    pub const fn errors(&self) -> Option<&ProblemErrors> {
        self.errors.as_ref()
    }
}

/// Grouped detail for aggregates, validation failures and single causes
///
/// Only direct children or the direct cause are read; deeper levels stay in
/// the failure itself.
fn collect_errors(failure: &Failure) -> Option<ProblemErrors> {
    if failure.kind() == FailureKind::Aggregate {
        let groups = group_messages(
            failure
                .children()
                .iter()
                .map(|child| (child.failure_type().label(), child.message().to_owned())),
        );
        return (!groups.is_empty()).then_some(groups);
    }

    if !failure.validation_failures().is_empty() {
        return Some(failure.validation_errors());
    }

    failure.cause().map(|cause| {
        let mut errors = ProblemErrors::with_capacity(1);
        errors.insert(cause.failure_type().label(), vec![cause.message().to_owned()]);
        errors
    })
}
