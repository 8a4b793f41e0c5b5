//! HTTP adapters.

pub mod webhook;
