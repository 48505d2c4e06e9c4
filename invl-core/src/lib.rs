#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![forbid(unsafe_code)]

pub mod adapters;
pub mod config;
pub mod entities;
pub mod framework;
pub mod ids;
pub mod ledger;
pub mod orchestrator;
pub mod platform;

#[cfg(test)]
pub(crate) mod testing;
