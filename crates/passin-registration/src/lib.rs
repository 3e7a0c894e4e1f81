//! Pass.in — attendee registration.
//!
//! Responsible for admitting attendees to events: one registration per
//! (event, email) and never more attendees than the event's cap, however
//! many requests race for the last seat.

pub mod application;
pub mod domain;
