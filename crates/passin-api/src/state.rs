//! Shared application state.

use std::sync::Arc;

use passin_core::clock::Clock;
use passin_core::store::AttendeeStore;
use passin_registration::application::policy::AdmissionPolicy;

/// Application state shared across all request handlers.
///
/// Holds no registration data of its own; every decision goes to the store.
#[derive(Clone)]
pub struct AppState {
    /// Clock used to stamp registrations.
    pub clock: Arc<dyn Clock + Send + Sync>,
    /// The attendee store.
    pub attendee_store: Arc<dyn AttendeeStore>,
    /// Retry and timeout policy for admissions.
    pub admission_policy: AdmissionPolicy,
}

impl AppState {
    /// Create new application state.
    #[must_use]
    pub fn new(
        clock: Arc<dyn Clock + Send + Sync>,
        attendee_store: Arc<dyn AttendeeStore>,
        admission_policy: AdmissionPolicy,
    ) -> Self {
        Self {
            clock,
            attendee_store,
            admission_policy,
        }
    }
}
