//! Shared wire types for the inventory change ledger.
//!
//! - [`objects`]: inbound webhook payloads and admin API DTOs
//! - [`signature`]: webhook HMAC verification and header names
//! - `client` (feature `client`): typed admin API client

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![forbid(unsafe_code)]

#[cfg(feature = "client")]
pub mod client;
pub mod objects;
pub mod signature;
