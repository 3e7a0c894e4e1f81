//! Registry records.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// An event that attendees register for.
///
/// Events are owned by the event-management side of the system; the
/// registry only reads them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Event {
    /// Opaque event identifier (UUID-shaped).
    pub id: String,
    /// Display title.
    pub title: String,
    /// Attendee cap. `None` means unlimited; `Some(0)` admits nobody.
    pub maximum_attendees: Option<u32>,
}

impl Event {
    /// Returns `true` if an event holding `current` attendees has no room
    /// for another one.
    #[must_use]
    pub fn is_full(&self, current: u64) -> bool {
        self.maximum_attendees
            .is_some_and(|max| current >= u64::from(max))
    }
}

/// A registration request that has not yet been admitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAttendee {
    /// The event being registered for.
    pub event_id: String,
    /// Attendee display name.
    pub name: String,
    /// Attendee email; unique per event.
    pub email: String,
    /// When the registration was requested.
    pub registered_at: DateTime<Utc>,
}

/// A committed registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Attendee {
    /// Store-assigned identifier.
    pub id: i64,
    /// The event this attendee is registered for.
    pub event_id: String,
    /// Attendee display name.
    pub name: String,
    /// Attendee email.
    pub email: String,
    /// When the registration was admitted.
    pub registered_at: DateTime<Utc>,
}

impl Attendee {
    /// Builds the committed record for `new` under the given id.
    #[must_use]
    pub fn from_new(id: i64, new: &NewAttendee) -> Self {
        Self {
            id,
            event_id: new.event_id.clone(),
            name: new.name.clone(),
            email: new.email.clone(),
            registered_at: new.registered_at,
        }
    }

    /// Returns `true` if this row was written for exactly `new`: same event,
    /// email, name and request timestamp.
    #[must_use]
    pub fn is_registration_of(&self, new: &NewAttendee) -> bool {
        self.event_id == new.event_id
            && self.email == new.email
            && self.name == new.name
            && self.registered_at == new.registered_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(maximum_attendees: Option<u32>) -> Event {
        Event {
            id: "e1".to_owned(),
            title: "Rust Meetup".to_owned(),
            maximum_attendees,
        }
    }

    #[test]
    fn test_unlimited_event_is_never_full() {
        assert!(!event(None).is_full(0));
        assert!(!event(None).is_full(u64::MAX));
    }

    #[test]
    fn test_capped_event_is_full_at_cap() {
        let e = event(Some(2));
        assert!(!e.is_full(1));
        assert!(e.is_full(2));
        assert!(e.is_full(3));
    }

    #[test]
    fn test_zero_cap_is_always_full() {
        assert!(event(Some(0)).is_full(0));
    }

    #[test]
    fn test_is_registration_of_requires_same_name_and_timestamp() {
        let requested_at = Utc::now();
        let new = NewAttendee {
            event_id: "e1".to_owned(),
            name: "Alice Doe".to_owned(),
            email: "a@x.com".to_owned(),
            registered_at: requested_at,
        };
        let committed = Attendee::from_new(1, &new);

        let other_name = NewAttendee {
            name: "Alice Smith".to_owned(),
            ..new.clone()
        };
        let later = NewAttendee {
            registered_at: requested_at + chrono::Duration::seconds(1),
            ..new.clone()
        };

        assert!(committed.is_registration_of(&new));
        assert!(!committed.is_registration_of(&other_name));
        assert!(!committed.is_registration_of(&later));
    }
}
