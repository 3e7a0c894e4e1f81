//! Attendee store abstraction.

use async_trait::async_trait;

use crate::decision::RejectionReason;
use crate::error::DomainError;
use crate::model::{Attendee, Event, NewAttendee};

/// Result of one atomic admission unit of work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdmitOutcome {
    /// The attendee row was inserted and the unit committed.
    Committed(Attendee),
    /// The unit was rolled back; nothing was written.
    Refused(RejectionReason),
}

/// Transactional registry of events and their attendees.
///
/// `atomic_admit` is the only write path for attendee rows. Implementations
/// must perform the duplicate check, the capacity check and the insert as one
/// indivisible unit with respect to every other `atomic_admit` call for the
/// same event, reading the event's cap inside that unit.
#[async_trait]
pub trait AttendeeStore: Send + Sync {
    /// Look up an event. Non-authoritative for admission decisions.
    async fn find_event(&self, event_id: &str) -> Result<Option<Event>, DomainError>;

    /// Admit `attendee` if the (event, email) pair is free and the event has
    /// room.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::ConcurrencyConflict` if the store aborted the
    /// unit because of a concurrent writer, or `DomainError::Infrastructure`
    /// if the store could not be reached. A failure while the commit was being
    /// acknowledged can leave the row written; callers that retry confirm
    /// with `find_attendee`.
    async fn atomic_admit(&self, attendee: &NewAttendee) -> Result<AdmitOutcome, DomainError>;

    /// Look up the committed registration of `email` for `event_id`.
    async fn find_attendee(
        &self,
        event_id: &str,
        email: &str,
    ) -> Result<Option<Attendee>, DomainError>;

    /// Checks that the store is reachable.
    async fn ping(&self) -> Result<(), DomainError> {
        Ok(())
    }
}
