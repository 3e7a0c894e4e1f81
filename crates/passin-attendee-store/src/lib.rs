//! Pass.in — PostgreSQL attendee store.
//!
//! Implements `AttendeeStore` on top of sqlx. The admission unit of work
//! serializes on the event row with `SELECT ... FOR UPDATE`.

pub mod pg_attendee_store;
pub mod schema;
