use std::fmt;

use convert_case::{Case, Casing};
use serde::Deserialize;

/// RPC status code names, indexed by their numeric value
const RPC_CODE_NAMES: [&str; 17] = [
    "ok",
    "cancelled",
    "unknown",
    "invalid_argument",
    "deadline_exceeded",
    "not_found",
    "already_exists",
    "permission_denied",
    "resource_exhausted",
    "failed_precondition",
    "aborted",
    "out_of_range",
    "unimplemented",
    "internal",
    "unavailable",
    "data_loss",
    "unauthenticated",
];

/// Additions to and overrides of the default failure classification
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClassificationConfig {
    /// Applied in declaration order; a later entry for the same type wins
    #[serde(default)]
    pub overrides: Vec<StatusOverride>,
}

/// Status entry registered for one failure type
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StatusOverride {
    /// Exact failure type name, e.g. `NotFoundError`
    pub failure_type: String,
    pub http_status: u16,
    pub rpc_code: RpcCodeSetting,
    pub description: String,
}

/// RPC status code written either as a name or as its number
///
/// Names are matched in any casing, so `deadline_exceeded`,
/// `DEADLINE_EXCEEDED` and `DeadlineExceeded` are the same code. Numbers are
/// kept as written and range-checked during validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RpcCodeSetting(i32);

impl RpcCodeSetting {
    pub const fn new(code: i32) -> Self {
        Self(code)
    }

    pub const fn value(self) -> i32 {
        self.0
    }

    /// Whether the value is a known RPC status code
    pub fn is_valid(self) -> bool {
        usize::try_from(self.0).is_ok_and(|index| index < RPC_CODE_NAMES.len())
    }

    /// Look up a code by name
    pub fn from_name(name: &str) -> Option<Self> {
        let normalized = match name.trim().to_case(Case::Snake) {
            // both spellings show up in the wild
            n if n == "canceled" => "cancelled".to_owned(),
            n => n,
        };

        RPC_CODE_NAMES
            .iter()
            .position(|known| *known == normalized)
            .and_then(|index| i32::try_from(index).ok())
            .map(Self)
    }
}

impl<'de> Deserialize<'de> for RpcCodeSetting {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        use serde::de;

        struct RpcCodeVisitor;

        impl de::Visitor<'_> for RpcCodeVisitor {
            type Value = RpcCodeSetting;

            fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
                formatter.write_str("an RPC status code name or number")
            }

            fn visit_i64<E>(self, v: i64) -> Result<RpcCodeSetting, E>
            where
                E: de::Error,
            {
                i32::try_from(v)
                    .map(RpcCodeSetting)
                    .map_err(|_| E::invalid_value(de::Unexpected::Signed(v), &self))
            }

            fn visit_u64<E>(self, v: u64) -> Result<RpcCodeSetting, E>
            where
                E: de::Error,
            {
                i32::try_from(v)
                    .map(RpcCodeSetting)
                    .map_err(|_| E::invalid_value(de::Unexpected::Unsigned(v), &self))
            }

            fn visit_str<E>(self, v: &str) -> Result<RpcCodeSetting, E>
            where
                E: de::Error,
            {
                RpcCodeSetting::from_name(v).ok_or_else(|| E::invalid_value(de::Unexpected::Str(v), &self))
            }
        }

        deserializer.deserialize_any(RpcCodeVisitor)
    }
}
