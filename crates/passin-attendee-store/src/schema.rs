//! Attendee store database schema.
//!
//! The DDL lives in the workspace `migrations/` directory; these are the
//! names the store relies on when interpreting database errors.

/// Unique constraint over `(event_id, email)` on the attendees table.
pub const ATTENDEE_EVENT_EMAIL_UNIQUE: &str = "attendees_event_id_email_key";

/// SQLSTATE raised when a serializable transaction cannot be serialized.
pub const SERIALIZATION_FAILURE: &str = "40001";

/// SQLSTATE raised when the lock manager breaks a deadlock.
pub const DEADLOCK_DETECTED: &str = "40P01";
