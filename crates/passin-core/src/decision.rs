//! Admission decisions.

use std::fmt;

use serde::Serialize;

/// Why a registration was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectionReason {
    /// The (event, email) pair is already registered.
    DuplicateRegistration,
    /// The event reached its attendee cap.
    CapacityExceeded,
    /// No event exists with the requested id.
    UnknownEvent,
}

impl RejectionReason {
    /// Stable machine-readable code.
    #[must_use]
    pub fn code(self) -> &'static str {
        match self {
            Self::DuplicateRegistration => "duplicate_registration",
            Self::CapacityExceeded => "capacity_exceeded",
            Self::UnknownEvent => "unknown_event",
        }
    }

    /// Human-readable explanation.
    #[must_use]
    pub fn message(self) -> &'static str {
        match self {
            Self::DuplicateRegistration => "This email is already registered for this event",
            Self::CapacityExceeded => "This event is full",
            Self::UnknownEvent => "Event not found",
        }
    }
}

impl fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Outcome of evaluating one registration request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdmissionDecision {
    /// The registration was committed.
    Accepted {
        /// Store-assigned attendee id.
        attendee_id: i64,
    },
    /// The registration was refused and nothing was written.
    Rejected(RejectionReason),
}

impl AdmissionDecision {
    /// Returns `true` for `Accepted`.
    #[must_use]
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted { .. })
    }

    /// Returns the new attendee's id if the registration was accepted.
    #[must_use]
    pub fn attendee_id(&self) -> Option<i64> {
        match self {
            Self::Accepted { attendee_id } => Some(*attendee_id),
            Self::Rejected(_) => None,
        }
    }
}
