//! Test stores — `AttendeeStore` implementations for tests.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use passin_core::decision::RejectionReason;
use passin_core::error::DomainError;
use passin_core::model::{Attendee, Event, NewAttendee};
use passin_core::store::{AdmitOutcome, AttendeeStore};

#[derive(Debug, Default)]
struct Registry {
    events: HashMap<String, Event>,
    attendees: Vec<Attendee>,
    last_id: i64,
}

/// An attendee store held in process memory.
///
/// `atomic_admit` performs the duplicate check, the capacity check and the
/// insert under one mutex guard, which is the in-process equivalent of the
/// row lock the PostgreSQL store takes.
#[derive(Debug, Default)]
pub struct InMemoryAttendeeStore {
    registry: Mutex<Registry>,
    admit_calls: AtomicUsize,
}

impl InMemoryAttendeeStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style variant of `insert_event`.
    #[must_use]
    pub fn with_event(self, id: &str, maximum_attendees: Option<u32>) -> Self {
        self.insert_event(id, maximum_attendees);
        self
    }

    /// Add or replace an event.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn insert_event(&self, id: &str, maximum_attendees: Option<u32>) {
        let event = Event {
            id: id.to_owned(),
            title: format!("Event {id}"),
            maximum_attendees,
        };
        self.registry
            .lock()
            .unwrap()
            .events
            .insert(id.to_owned(), event);
    }

    /// Remove an event and its attendees.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn remove_event(&self, id: &str) {
        let mut registry = self.registry.lock().unwrap();
        registry.events.remove(id);
        registry.attendees.retain(|a| a.event_id != id);
    }

    /// Returns a snapshot of the attendees registered for `event_id`, in
    /// admission order.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn attendees(&self, event_id: &str) -> Vec<Attendee> {
        self.registry
            .lock()
            .unwrap()
            .attendees
            .iter()
            .filter(|a| a.event_id == event_id)
            .cloned()
            .collect()
    }

    /// Number of `atomic_admit` calls received so far.
    pub fn admit_calls(&self) -> usize {
        self.admit_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AttendeeStore for InMemoryAttendeeStore {
    async fn find_event(&self, event_id: &str) -> Result<Option<Event>, DomainError> {
        Ok(self.registry.lock().unwrap().events.get(event_id).cloned())
    }

    async fn atomic_admit(&self, attendee: &NewAttendee) -> Result<AdmitOutcome, DomainError> {
        self.admit_calls.fetch_add(1, Ordering::SeqCst);

        // Give other admissions a chance to interleave before the unit starts.
        tokio::task::yield_now().await;

        let mut registry = self.registry.lock().unwrap();

        let Some(event) = registry.events.get(&attendee.event_id).cloned() else {
            return Ok(AdmitOutcome::Refused(RejectionReason::UnknownEvent));
        };

        let mut current = 0_u64;
        for existing in registry
            .attendees
            .iter()
            .filter(|a| a.event_id == attendee.event_id)
        {
            if existing.email == attendee.email {
                return Ok(AdmitOutcome::Refused(
                    RejectionReason::DuplicateRegistration,
                ));
            }
            current += 1;
        }

        if event.is_full(current) {
            return Ok(AdmitOutcome::Refused(RejectionReason::CapacityExceeded));
        }

        registry.last_id += 1;
        let committed = Attendee::from_new(registry.last_id, attendee);
        registry.attendees.push(committed.clone());

        Ok(AdmitOutcome::Committed(committed))
    }

    async fn find_attendee(
        &self,
        event_id: &str,
        email: &str,
    ) -> Result<Option<Attendee>, DomainError> {
        Ok(self
            .registry
            .lock()
            .unwrap()
            .attendees
            .iter()
            .find(|a| a.event_id == event_id && a.email == email)
            .cloned())
    }
}

/// A store whose first `conflicts` admission attempts abort with a
/// concurrency conflict before touching the registry. Later attempts are
/// delegated to an inner `InMemoryAttendeeStore`.
#[derive(Debug)]
pub struct ConflictingAttendeeStore {
    inner: InMemoryAttendeeStore,
    conflicts_remaining: AtomicU32,
}

impl ConflictingAttendeeStore {
    /// Wrap `inner`, failing the next `conflicts` admissions.
    #[must_use]
    pub fn new(inner: InMemoryAttendeeStore, conflicts: u32) -> Self {
        Self {
            inner,
            conflicts_remaining: AtomicU32::new(conflicts),
        }
    }

    /// The wrapped store.
    #[must_use]
    pub fn inner(&self) -> &InMemoryAttendeeStore {
        &self.inner
    }
}

#[async_trait]
impl AttendeeStore for ConflictingAttendeeStore {
    async fn find_event(&self, event_id: &str) -> Result<Option<Event>, DomainError> {
        self.inner.find_event(event_id).await
    }

    async fn atomic_admit(&self, attendee: &NewAttendee) -> Result<AdmitOutcome, DomainError> {
        let conflicted = self
            .conflicts_remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if conflicted {
            return Err(DomainError::ConcurrencyConflict(
                "could not serialize access due to concurrent update".into(),
            ));
        }
        self.inner.atomic_admit(attendee).await
    }

    async fn find_attendee(
        &self,
        event_id: &str,
        email: &str,
    ) -> Result<Option<Attendee>, DomainError> {
        self.inner.find_attendee(event_id, email).await
    }
}

/// A store whose first `lost` admissions commit through the inner
/// `InMemoryAttendeeStore` and then report an infrastructure error, as if the
/// connection dropped while the commit was being acknowledged.
#[derive(Debug)]
pub struct LostReplyAttendeeStore {
    inner: InMemoryAttendeeStore,
    lost_remaining: AtomicU32,
}

impl LostReplyAttendeeStore {
    /// Wrap `inner`, losing the reply of the next `lost` commits.
    #[must_use]
    pub fn new(inner: InMemoryAttendeeStore, lost: u32) -> Self {
        Self {
            inner,
            lost_remaining: AtomicU32::new(lost),
        }
    }

    /// The wrapped store.
    #[must_use]
    pub fn inner(&self) -> &InMemoryAttendeeStore {
        &self.inner
    }
}

#[async_trait]
impl AttendeeStore for LostReplyAttendeeStore {
    async fn find_event(&self, event_id: &str) -> Result<Option<Event>, DomainError> {
        self.inner.find_event(event_id).await
    }

    async fn atomic_admit(&self, attendee: &NewAttendee) -> Result<AdmitOutcome, DomainError> {
        let outcome = self.inner.atomic_admit(attendee).await?;
        let lost = matches!(outcome, AdmitOutcome::Committed(_))
            && self
                .lost_remaining
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok();
        if lost {
            return Err(DomainError::Infrastructure(
                "connection reset during commit".into(),
            ));
        }
        Ok(outcome)
    }

    async fn find_attendee(
        &self,
        event_id: &str,
        email: &str,
    ) -> Result<Option<Attendee>, DomainError> {
        self.inner.find_attendee(event_id, email).await
    }
}

/// A store whose event disappears right after `find_event` reports it, so
/// the following `atomic_admit` no longer finds it.
#[derive(Debug)]
pub struct VanishingEventStore {
    inner: InMemoryAttendeeStore,
}

impl VanishingEventStore {
    /// Wrap `inner`.
    #[must_use]
    pub fn new(inner: InMemoryAttendeeStore) -> Self {
        Self { inner }
    }

    /// The wrapped store.
    #[must_use]
    pub fn inner(&self) -> &InMemoryAttendeeStore {
        &self.inner
    }
}

#[async_trait]
impl AttendeeStore for VanishingEventStore {
    async fn find_event(&self, event_id: &str) -> Result<Option<Event>, DomainError> {
        let event = self.inner.find_event(event_id).await?;
        self.inner.remove_event(event_id);
        Ok(event)
    }

    async fn atomic_admit(&self, attendee: &NewAttendee) -> Result<AdmitOutcome, DomainError> {
        self.inner.atomic_admit(attendee).await
    }

    async fn find_attendee(
        &self,
        event_id: &str,
        email: &str,
    ) -> Result<Option<Attendee>, DomainError> {
        self.inner.find_attendee(event_id, email).await
    }
}

/// A store that always returns an infrastructure error. Counts calls so
/// tests can assert on the retry bound.
#[derive(Debug, Default)]
pub struct FailingAttendeeStore {
    calls: AtomicUsize,
}

impl FailingAttendeeStore {
    /// Create a new failing store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of store calls received so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AttendeeStore for FailingAttendeeStore {
    async fn find_event(&self, _event_id: &str) -> Result<Option<Event>, DomainError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(DomainError::Infrastructure("connection refused".into()))
    }

    async fn atomic_admit(&self, _attendee: &NewAttendee) -> Result<AdmitOutcome, DomainError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(DomainError::Infrastructure("connection refused".into()))
    }

    async fn find_attendee(
        &self,
        _event_id: &str,
        _email: &str,
    ) -> Result<Option<Attendee>, DomainError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(DomainError::Infrastructure("connection refused".into()))
    }

    async fn ping(&self) -> Result<(), DomainError> {
        Err(DomainError::Infrastructure("connection refused".into()))
    }
}

/// A store that waits for `delay` inside every admission before delegating
/// to an inner `InMemoryAttendeeStore`. Used to exercise caller timeouts.
#[derive(Debug)]
pub struct StallingAttendeeStore {
    inner: InMemoryAttendeeStore,
    delay: Duration,
}

impl StallingAttendeeStore {
    /// Wrap `inner`, stalling each admission for `delay`.
    #[must_use]
    pub fn new(inner: InMemoryAttendeeStore, delay: Duration) -> Self {
        Self { inner, delay }
    }

    /// The wrapped store.
    #[must_use]
    pub fn inner(&self) -> &InMemoryAttendeeStore {
        &self.inner
    }
}

#[async_trait]
impl AttendeeStore for StallingAttendeeStore {
    async fn find_event(&self, event_id: &str) -> Result<Option<Event>, DomainError> {
        self.inner.find_event(event_id).await
    }

    async fn atomic_admit(&self, attendee: &NewAttendee) -> Result<AdmitOutcome, DomainError> {
        tokio::time::sleep(self.delay).await;
        self.inner.atomic_admit(attendee).await
    }

    async fn find_attendee(
        &self,
        event_id: &str,
        email: &str,
    ) -> Result<Option<Attendee>, DomainError> {
        self.inner.find_attendee(event_id, email).await
    }
}
