use faultline_config::ClassificationConfig;
use indexmap::IndexMap;

use crate::error::ClassificationError;
use crate::failure::{Failure, FailureKind, FailureType};
use crate::status::StatusEntry;

/// Kinds registered at start-up, in registration order
const DEFAULT_KINDS: [FailureKind; 14] = [
    FailureKind::AlreadyExists,
    FailureKind::ExternalComponent,
    FailureKind::NotFound,
    FailureKind::ValidationFailed,
    FailureKind::OwnedSystem,
    FailureKind::ArgumentInvalid,
    FailureKind::ArgumentOutOfRange,
    FailureKind::Unauthenticated,
    FailureKind::Unavailable,
    FailureKind::NotImplemented,
    FailureKind::Cancelled,
    FailureKind::Timeout,
    FailureKind::Forbidden,
    FailureKind::Unknown,
];

/// Order in which platform kinds are tested when no exact type matches
const PLATFORM_PRIORITY: [FailureKind; 8] = [
    FailureKind::ArgumentInvalid,
    FailureKind::ArgumentOutOfRange,
    FailureKind::Unauthenticated,
    FailureKind::Unavailable,
    FailureKind::NotImplemented,
    FailureKind::Cancelled,
    FailureKind::Timeout,
    FailureKind::Forbidden,
];

/// How a failure was matched to its status entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// The failure's exact type is registered
    ExactType,
    /// Unregistered type in the owned-system family
    OwnedSystem,
    /// Unregistered type matched by its platform kind
    PlatformKind(FailureKind),
    /// Nothing matched
    Unknown,
}

/// Result of classifying one failure
#[derive(Debug, Clone, Copy)]
pub struct Classification<'a> {
    pub entry: &'a StatusEntry,
    pub resolution: Resolution,
}

/// Registry from failure type identity to status entry
///
/// Built and extended once at start-up by the composition root, then shared
/// read-only (typically behind an `Arc`). Mutation needs `&mut self`, so a
/// shared map cannot change while requests are served.
#[derive(Debug, Clone)]
pub struct ClassificationMap {
    entries: IndexMap<FailureType, StatusEntry>,
}

impl Default for ClassificationMap {
    fn default() -> Self {
        Self::new()
    }
}

impl ClassificationMap {
    /// Create a map holding the default registrations
    pub fn new() -> Self {
        let mut map = Self {
            entries: IndexMap::with_capacity(DEFAULT_KINDS.len()),
        };
        for kind in DEFAULT_KINDS {
            map.register(kind.canonical_type(), kind.default_entry().clone());
        }
        map
    }

    /// Create a map with the defaults plus the configured overrides
    ///
    /// Overrides are applied in declaration order, so the last entry for a
    /// type wins.
    pub fn from_config(config: &ClassificationConfig) -> Result<Self, ClassificationError> {
        let mut map = Self::new();

        for entry in &config.overrides {
            if entry.failure_type.trim().is_empty() {
                return Err(ClassificationError::BlankFailureType);
            }

            let status = StatusEntry::from_parts(entry.http_status, entry.rpc_code.value(), entry.description.clone())
                .map_err(|source| ClassificationError::InvalidOverride {
                    failure_type: entry.failure_type.clone(),
                    source: Box::new(source),
                })?;

            map.register(entry.failure_type.clone(), status);
        }

        tracing::debug!(entries = map.len(), "classification map built");

        Ok(map)
    }

    /// Add or replace the entry for a failure type
    ///
    /// Returns the entry that was replaced, if any.
    pub fn register(&mut self, failure_type: impl Into<FailureType>, entry: StatusEntry) -> Option<StatusEntry> {
        self.entries.insert(failure_type.into(), entry)
    }

    /// Entry registered for an exact failure type
    pub fn get(&self, failure_type: &str) -> Option<&StatusEntry> {
        self.entries.get(failure_type)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&FailureType, &StatusEntry)> {
        self.entries.iter()
    }

    /// Status entry for a failure; never fails
    pub fn classify(&self, failure: &Failure) -> &StatusEntry {
        self.resolve(failure).entry
    }

    /// Status entry for a failure together with the rule that matched
    ///
    /// Exact type first, then the owned-system family, then platform kinds
    /// in priority order, then unknown.
    pub fn resolve(&self, failure: &Failure) -> Classification<'_> {
        if let Some(entry) = self.entries.get(failure.failure_type()) {
            return Classification {
                entry,
                resolution: Resolution::ExactType,
            };
        }

        if failure.kind().is_owned() {
            return Classification {
                entry: self.entry_for(FailureKind::OwnedSystem),
                resolution: Resolution::OwnedSystem,
            };
        }

        if let Some(kind) = PLATFORM_PRIORITY.into_iter().find(|kind| *kind == failure.kind()) {
            return Classification {
                entry: self.entry_for(kind),
                resolution: Resolution::PlatformKind(kind),
            };
        }

        Classification {
            entry: self.unknown_entry(),
            resolution: Resolution::Unknown,
        }
    }

    /// Entry used when nothing is known about a failure
    pub fn unknown_entry(&self) -> &StatusEntry {
        self.entry_for(FailureKind::Unknown)
    }

    fn entry_for(&self, kind: FailureKind) -> &StatusEntry {
        self.entries
            .get(&kind.canonical_type())
            .unwrap_or_else(|| kind.default_entry())
    }
}
