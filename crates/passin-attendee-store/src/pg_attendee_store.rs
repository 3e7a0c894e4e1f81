//! `PostgreSQL` implementation of the `AttendeeStore` trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};
use tracing::{debug, instrument};

use passin_core::decision::RejectionReason;
use passin_core::error::DomainError;
use passin_core::model::{Attendee, Event, NewAttendee};
use passin_core::store::{AdmitOutcome, AttendeeStore};

use crate::schema::{ATTENDEE_EVENT_EMAIL_UNIQUE, DEADLOCK_DETECTED, SERIALIZATION_FAILURE};

/// PostgreSQL-backed attendee store.
#[derive(Debug, Clone)]
pub struct PgAttendeeStore {
    pool: PgPool,
}

impl PgAttendeeStore {
    /// Creates a new `PgAttendeeStore`.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Classifies a sqlx error as a transient conflict or an infrastructure
/// failure.
fn map_sqlx_error(err: sqlx::Error) -> DomainError {
    if let sqlx::Error::Database(db_err) = &err {
        let code = db_err.code();
        if matches!(
            code.as_deref(),
            Some(SERIALIZATION_FAILURE | DEADLOCK_DETECTED)
        ) {
            return DomainError::ConcurrencyConflict(db_err.message().to_owned());
        }
    }
    DomainError::Infrastructure(err.to_string())
}

fn is_duplicate_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => {
            db_err.is_unique_violation()
                && db_err.constraint() == Some(ATTENDEE_EVENT_EMAIL_UNIQUE)
        }
        _ => false,
    }
}

fn capacity_from_column(value: Option<i32>) -> Result<Option<u32>, DomainError> {
    value
        .map(|max| {
            u32::try_from(max).map_err(|_| {
                DomainError::Infrastructure(format!("negative maximum_attendees: {max}"))
            })
        })
        .transpose()
}

async fn rollback(tx: Transaction<'_, Postgres>) -> Result<(), DomainError> {
    tx.rollback().await.map_err(map_sqlx_error)
}

#[async_trait]
impl AttendeeStore for PgAttendeeStore {
    #[instrument(skip(self))]
    async fn find_event(&self, event_id: &str) -> Result<Option<Event>, DomainError> {
        let row: Option<(String, String, Option<i32>)> =
            sqlx::query_as("SELECT id, title, maximum_attendees FROM events WHERE id = $1")
                .bind(event_id)
                .fetch_optional(&self.pool)
                .await
                .map_err(map_sqlx_error)?;

        row.map(|(id, title, maximum_attendees)| {
            Ok(Event {
                id,
                title,
                maximum_attendees: capacity_from_column(maximum_attendees)?,
            })
        })
        .transpose()
    }

    #[instrument(skip(self, attendee), fields(event_id = %attendee.event_id))]
    async fn atomic_admit(&self, attendee: &NewAttendee) -> Result<AdmitOutcome, DomainError> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx_error)?;

        // Every admission for this event queues here until the holder commits
        // or rolls back.
        let locked: Option<(Option<i32>,)> =
            sqlx::query_as("SELECT maximum_attendees FROM events WHERE id = $1 FOR UPDATE")
                .bind(&attendee.event_id)
                .fetch_optional(&mut *tx)
                .await
                .map_err(map_sqlx_error)?;

        let Some((maximum_attendees,)) = locked else {
            rollback(tx).await?;
            return Ok(AdmitOutcome::Refused(RejectionReason::UnknownEvent));
        };
        let maximum_attendees = capacity_from_column(maximum_attendees)?;

        let existing: Option<(i64,)> =
            sqlx::query_as("SELECT id FROM attendees WHERE event_id = $1 AND email = $2")
                .bind(&attendee.event_id)
                .bind(&attendee.email)
                .fetch_optional(&mut *tx)
                .await
                .map_err(map_sqlx_error)?;

        if existing.is_some() {
            rollback(tx).await?;
            return Ok(AdmitOutcome::Refused(
                RejectionReason::DuplicateRegistration,
            ));
        }

        if let Some(max) = maximum_attendees {
            let (count,): (i64,) =
                sqlx::query_as("SELECT COUNT(*) FROM attendees WHERE event_id = $1")
                    .bind(&attendee.event_id)
                    .fetch_one(&mut *tx)
                    .await
                    .map_err(map_sqlx_error)?;

            debug!(count, max, "checked event capacity");

            if count >= i64::from(max) {
                rollback(tx).await?;
                return Ok(AdmitOutcome::Refused(RejectionReason::CapacityExceeded));
            }
        }

        let inserted: Result<(i64,), sqlx::Error> = sqlx::query_as(
            "INSERT INTO attendees (name, email, created_at, event_id) \
             VALUES ($1, $2, $3, $4) RETURNING id",
        )
        .bind(&attendee.name)
        .bind(&attendee.email)
        .bind(attendee.registered_at)
        .bind(&attendee.event_id)
        .fetch_one(&mut *tx)
        .await;

        let (attendee_id,) = match inserted {
            Ok(row) => row,
            Err(err) if is_duplicate_violation(&err) => {
                rollback(tx).await?;
                return Ok(AdmitOutcome::Refused(
                    RejectionReason::DuplicateRegistration,
                ));
            }
            Err(err) => return Err(map_sqlx_error(err)),
        };

        tx.commit().await.map_err(map_sqlx_error)?;

        debug!(attendee_id, "attendee committed");

        Ok(AdmitOutcome::Committed(Attendee::from_new(
            attendee_id,
            attendee,
        )))
    }

    #[instrument(skip(self, email))]
    async fn find_attendee(
        &self,
        event_id: &str,
        email: &str,
    ) -> Result<Option<Attendee>, DomainError> {
        let row: Option<(i64, String, String, String, DateTime<Utc>)> = sqlx::query_as(
            "SELECT id, event_id, name, email, created_at FROM attendees \
             WHERE event_id = $1 AND email = $2",
        )
        .bind(event_id)
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(|(id, event_id, name, email, registered_at)| Attendee {
            id,
            event_id,
            name,
            email,
            registered_at,
        }))
    }

    async fn ping(&self) -> Result<(), DomainError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map(|_| ())
            .map_err(map_sqlx_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_timeout_maps_to_infrastructure() {
        let err = map_sqlx_error(sqlx::Error::PoolTimedOut);
        assert!(matches!(err, DomainError::Infrastructure(_)));
        assert!(err.is_transient());
    }

    #[test]
    fn test_row_not_found_is_not_a_duplicate() {
        assert!(!is_duplicate_violation(&sqlx::Error::RowNotFound));
    }

    #[test]
    fn test_capacity_from_column() {
        assert_eq!(capacity_from_column(None).unwrap(), None);
        assert_eq!(capacity_from_column(Some(0)).unwrap(), Some(0));
        assert_eq!(capacity_from_column(Some(50)).unwrap(), Some(50));
        assert!(capacity_from_column(Some(-1)).is_err());
    }
}
