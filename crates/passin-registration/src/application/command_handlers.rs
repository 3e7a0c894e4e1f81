//! Command handlers for the registration context.
//!
//! `admit` is the admission controller: it turns a `RegisterAttendee`
//! command into exactly one `AdmissionDecision`, retrying the store's atomic
//! unit of work on transient failures.

use std::sync::atomic::{AtomicU32, Ordering};

use chrono::SubsecRound;
use passin_core::clock::Clock;
use passin_core::decision::{AdmissionDecision, RejectionReason};
use passin_core::error::DomainError;
use passin_core::model::NewAttendee;
use passin_core::store::{AdmitOutcome, AttendeeStore};
use thiserror::Error;
use tracing::{error, info, instrument, warn};

use crate::application::policy::{AdmissionPolicy, RetryPolicy};
use crate::domain::commands::RegisterAttendee;

/// The store could not decide the registration. Nothing was written; the
/// identical request may be retried later.
#[derive(Debug, Error)]
#[error("attendee store unavailable after {attempts} attempt(s): {cause}")]
pub struct TransientStoreFailure {
    /// Attempts started before giving up.
    pub attempts: u32,
    /// The last error reported by the store, or the timeout.
    #[source]
    pub cause: DomainError,
}

/// Admits or rejects one registration.
///
/// The event is looked up first so unknown events are rejected without
/// opening a unit of work. The cap observed there is not used: the store
/// re-reads it inside `atomic_admit`, together with the duplicate check and
/// the insert.
///
/// The attendee record, including its timestamp, is built once and reused
/// by every attempt. An attempt that fails may still have committed, so a
/// later `DuplicateRegistration` is checked against the stored row before
/// it is reported.
///
/// # Errors
///
/// Returns `TransientStoreFailure` when the store kept failing after
/// `policy.retry.max_attempts()` attempts, failed with a non-retryable error,
/// or `policy.timeout` expired.
#[instrument(
    skip_all,
    fields(
        correlation_id = %command.correlation_id,
        event_id = %command.event_id,
    )
)]
pub async fn admit(
    command: &RegisterAttendee,
    clock: &dyn Clock,
    store: &dyn AttendeeStore,
    policy: &AdmissionPolicy,
) -> Result<AdmissionDecision, TransientStoreFailure> {
    // TIMESTAMPTZ keeps microseconds.
    let attendee = NewAttendee {
        event_id: command.event_id.clone(),
        name: command.name.clone(),
        email: command.email.clone(),
        registered_at: clock.now().trunc_subsecs(6),
    };
    let attempts = AtomicU32::new(0);
    let run = admit_with_retries(&attendee, store, &policy.retry, &attempts);

    let result = match policy.timeout {
        Some(limit) => tokio::time::timeout(limit, run)
            .await
            .unwrap_or(Err(DomainError::TimedOut(limit))),
        None => run.await,
    };

    match result {
        Ok(decision) => {
            match decision {
                AdmissionDecision::Accepted { attendee_id } => {
                    info!(attendee_id, "registration accepted");
                }
                AdmissionDecision::Rejected(reason) => {
                    info!(%reason, "registration rejected");
                }
            }
            Ok(decision)
        }
        Err(cause) => {
            let attempts = attempts.load(Ordering::SeqCst);
            error!(attempts, error = %cause, "registration could not be decided");
            Err(TransientStoreFailure { attempts, cause })
        }
    }
}

async fn admit_with_retries(
    attendee: &NewAttendee,
    store: &dyn AttendeeStore,
    retry: &RetryPolicy,
    attempts: &AtomicU32,
) -> Result<AdmissionDecision, DomainError> {
    // Set once an `atomic_admit` call has failed without telling us whether
    // it committed.
    let mut write_unconfirmed = false;
    loop {
        let attempt = attempts.fetch_add(1, Ordering::SeqCst) + 1;
        match admit_once(attendee, store, &mut write_unconfirmed).await {
            Ok(decision) => return Ok(decision),
            Err(err) if err.is_transient() && retry.should_retry(attempt) => {
                let delay = retry.delay_for_attempt(attempt - 1);
                warn!(attempt, ?delay, error = %err, "admission attempt failed, retrying");
                tokio::time::sleep(delay).await;
            }
            Err(err) => return Err(err),
        }
    }
}

async fn admit_once(
    attendee: &NewAttendee,
    store: &dyn AttendeeStore,
    write_unconfirmed: &mut bool,
) -> Result<AdmissionDecision, DomainError> {
    if store.find_event(&attendee.event_id).await?.is_none() {
        return Ok(AdmissionDecision::Rejected(RejectionReason::UnknownEvent));
    }

    let outcome = match store.atomic_admit(attendee).await {
        Ok(outcome) => outcome,
        Err(err) => {
            *write_unconfirmed = true;
            return Err(err);
        }
    };

    match outcome {
        AdmitOutcome::Committed(committed) => Ok(AdmissionDecision::Accepted {
            attendee_id: committed.id,
        }),
        AdmitOutcome::Refused(RejectionReason::DuplicateRegistration) if *write_unconfirmed => {
            reclaim_earlier_commit(attendee, store).await
        }
        AdmitOutcome::Refused(reason) => Ok(AdmissionDecision::Rejected(reason)),
    }
}

/// Resolves a duplicate refusal that follows a failed attempt: if the stored
/// row is this request's own earlier write, the registration was accepted.
async fn reclaim_earlier_commit(
    attendee: &NewAttendee,
    store: &dyn AttendeeStore,
) -> Result<AdmissionDecision, DomainError> {
    match store
        .find_attendee(&attendee.event_id, &attendee.email)
        .await?
    {
        Some(existing) if existing.is_registration_of(attendee) => {
            warn!(
                attendee_id = existing.id,
                "earlier attempt committed before failing"
            );
            Ok(AdmissionDecision::Accepted {
                attendee_id: existing.id,
            })
        }
        _ => Ok(AdmissionDecision::Rejected(
            RejectionReason::DuplicateRegistration,
        )),
    }
}
