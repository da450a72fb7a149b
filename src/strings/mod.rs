//! # Strings Module
//!
//! Centralizes user-facing strings and help text.
//! Ensures consistency in messaging and easier localization/updates.

pub mod features;
pub mod help;
pub mod messages;
