//! # Application Layer
//!
//! Contains the dispatch core: access control, per-participant modes, the
//! handler set registry, audit notifications and the dispatcher tying them
//! together, plus message parsing and the optional state snapshot.

pub mod access;
pub mod audit;
pub mod dispatcher;
pub mod modes;
pub mod parsing;
pub mod registry;
pub mod state;
