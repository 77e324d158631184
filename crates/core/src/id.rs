// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Numeric identifier newtypes for events, organizations and sessions.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Session id the timing system uses to mean "no session".
///
/// A session-change carrying this id never creates or mutates a
/// `Sessions` row and never becomes a live `SessionState`.
pub const RESERVED_SESSION_ID: u32 = 999_999;

macro_rules! numeric_id {
    (
        $(#[$meta:meta])*
        pub struct $name:ident($ty:ty);
    ) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize,
            Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub $ty);

        impl $name {
            pub fn new(id: $ty) -> Self {
                Self(id)
            }

            pub fn value(&self) -> $ty {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<$ty> for $name {
            fn from(id: $ty) -> Self {
                Self(id)
            }
        }
    };
}

numeric_id! {
    /// Identifier of an event (a race weekend) scoped to an organization.
    pub struct EventId(i64);
}

numeric_id! {
    /// Identifier of the organization owning an event.
    pub struct OrgId(i64);
}

numeric_id! {
    /// Identifier a timing system assigns to a run within an event.
    pub struct SessionId(u32);
}

impl SessionId {
    /// Returns true for the reserved "no session" sentinel.
    pub fn is_reserved(&self) -> bool {
        self.0 == RESERVED_SESSION_ID
    }
}

#[cfg(test)]
#[path = "id_tests.rs"]
mod tests;
