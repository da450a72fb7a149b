//! # Command Handlers
//!
//! Contains handler functions for the non-feature commands (admin, status, help).
//! These handlers are invoked by the Dispatcher.

pub mod admin;
pub mod help;
pub mod misc;
