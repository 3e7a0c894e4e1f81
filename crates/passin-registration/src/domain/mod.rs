//! Registration domain types.

pub mod commands;
pub mod validation;
