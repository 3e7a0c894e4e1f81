//! Commands for the registration context.

use passin_core::error::DomainError;
use uuid::Uuid;

use crate::domain::validation::{is_valid_email, is_valid_name};

/// Command to register an attendee for an event.
#[derive(Debug, Clone)]
pub struct RegisterAttendee {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The event to register for.
    pub event_id: String,
    /// The attendee's display name.
    pub name: String,
    /// The attendee's email address.
    pub email: String,
}

impl RegisterAttendee {
    /// Checks the request's syntactic shape.
    ///
    /// This is the transport layer's job; `admit` assumes it has been done.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if the name is shorter than four
    /// characters or the email address is malformed.
    pub fn validate(&self) -> Result<(), DomainError> {
        if !is_valid_name(&self.name) {
            return Err(DomainError::Validation(
                "name must be at least 4 characters".into(),
            ));
        }
        if !is_valid_email(&self.email) {
            return Err(DomainError::Validation(
                "email must be a valid email address".into(),
            ));
        }
        Ok(())
    }
}
