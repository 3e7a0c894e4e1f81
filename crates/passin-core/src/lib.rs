//! Pass.in Core — shared domain abstractions.
//!
//! This crate defines the registry's records, the admission decision types
//! and the `AttendeeStore` seam that storage backends implement. It contains
//! no infrastructure code.

pub mod clock;
pub mod decision;
pub mod error;
pub mod model;
pub mod store;
