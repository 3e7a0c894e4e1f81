//! Registration application services.

pub mod command_handlers;
pub mod policy;
