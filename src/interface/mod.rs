//! # Interface Layer
//!
//! User-facing command handlers that sit next to the feature plugins.

pub mod commands;
