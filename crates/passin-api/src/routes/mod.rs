//! Route modules.

pub mod attendees;
pub mod health;
