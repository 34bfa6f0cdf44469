//! REST endpoint handlers.

pub mod status;
