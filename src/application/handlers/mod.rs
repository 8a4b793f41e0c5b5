//! Command handlers, one per use case.

pub mod billing;
