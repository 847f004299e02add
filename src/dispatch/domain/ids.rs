//! Identifier and validated scalar types for the dispatch domain.

use super::DispatchDomainError;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

macro_rules! uuid_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Creates a new random identifier.
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Creates an identifier from an existing UUID.
            #[must_use]
            pub const fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Returns the wrapped UUID.
            #[must_use]
            pub const fn into_inner(self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl AsRef<Uuid> for $name {
            fn as_ref(&self) -> &Uuid {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

uuid_id! {
    /// Unique identifier for a service task.
    TaskId
}

uuid_id! {
    /// Unique identifier for a field technician.
    TechnicianId
}

uuid_id! {
    /// Unique identifier for an assignment ledger row.
    AssignmentId
}

uuid_id! {
    /// Unique identifier for an assignment history audit row.
    HistoryId
}

/// Validated service task title.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskTitle(String);

impl TaskTitle {
    /// Minimum title length in characters after trimming.
    pub const MIN_LENGTH: usize = 3;

    /// Creates a validated title.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchDomainError::TitleTooShort`] when the trimmed value
    /// is shorter than [`Self::MIN_LENGTH`] characters.
    pub fn new(value: impl Into<String>) -> Result<Self, DispatchDomainError> {
        let raw = value.into();
        let trimmed = raw.trim();
        if trimmed.chars().count() < Self::MIN_LENGTH {
            return Err(DispatchDomainError::TitleTooShort {
                min: Self::MIN_LENGTH,
            });
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the title as `str`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskTitle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Validated client street address for a service visit.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClientAddress(String);

impl ClientAddress {
    /// Creates a validated address.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchDomainError::BlankClientAddress`] when the value is
    /// empty or whitespace-only.
    pub fn new(value: impl Into<String>) -> Result<Self, DispatchDomainError> {
        let raw = value.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(DispatchDomainError::BlankClientAddress);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the address as `str`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClientAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Positive estimated task duration in minutes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EstimatedDuration(u32);

impl EstimatedDuration {
    /// Largest duration representable in the current `PostgreSQL` schema.
    pub const MAX_PERSISTED_MINUTES: u32 = i32::MAX as u32;

    /// Creates a validated duration.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchDomainError::InvalidEstimatedDuration`] when the
    /// value is zero or exceeds the schema-backed maximum (`i32::MAX`).
    pub const fn new(minutes: u32) -> Result<Self, DispatchDomainError> {
        if minutes == 0 || minutes > Self::MAX_PERSISTED_MINUTES {
            return Err(DispatchDomainError::InvalidEstimatedDuration(minutes));
        }
        Ok(Self(minutes))
    }

    /// Returns the duration in minutes.
    #[must_use]
    pub const fn minutes(self) -> u32 {
        self.0
    }
}

impl fmt::Display for EstimatedDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} min", self.0)
    }
}
