//! HTTP API surface.

pub mod admin;
pub mod extractors;
pub mod webhooks;
