//! Shared test stores and utilities for the pass.in event registry.

mod clock;
mod store;

pub use clock::FixedClock;
pub use store::{
    ConflictingAttendeeStore, FailingAttendeeStore, InMemoryAttendeeStore,
    LostReplyAttendeeStore, StallingAttendeeStore, VanishingEventStore,
};
