//! Typed identifiers
//!
//! Every id wraps a time-ordered UUID (v7), so ids sort roughly by creation.
//! They display with a short prefix (`USR-…`, `IVC-…`) but serialize as the
//! bare UUID, which is also what the database stores.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

/// An identifier string that is neither `PREFIX-uuid` nor a bare UUID
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid {kind} id: {input}")]
pub struct InvalidId {
    pub kind: &'static str,
    pub input: String,
}

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            pub const PREFIX: &'static str = $prefix;

            /// Fresh time-ordered identifier
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            /// Alias of [`Self::new`]
            pub fn new_v7() -> Self {
                Self::new()
            }

            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}-{}", Self::PREFIX, self.0)
            }
        }

        /// Accepts `PREFIX-uuid` (prefix in any case) or a bare UUID
        impl FromStr for $name {
            type Err = InvalidId;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let trimmed = s.trim();
                let body = trimmed
                    .get(..Self::PREFIX.len())
                    .filter(|head| head.eq_ignore_ascii_case(Self::PREFIX))
                    .and_then(|_| trimmed[Self::PREFIX.len()..].strip_prefix('-'))
                    .unwrap_or(trimmed);
                Uuid::parse_str(body).map(Self).map_err(|_| InvalidId {
                    kind: stringify!($name),
                    input: s.to_string(),
                })
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Uuid {
                id.0
            }
        }
    };
}

define_id!(
    /// A registered account
    UserId,
    "USR"
);
define_id!(
    /// An invoice, unique across all accounts
    InvoiceId,
    "IVC"
);
define_id!(
    /// One row of an invoice
    LineItemId,
    "LIN"
);
