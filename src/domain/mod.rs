//! Domain layer. Pure types and rules, no IO except through the port traits
//! handed in by callers.

pub mod billing;
pub mod foundation;
