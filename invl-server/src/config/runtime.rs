//! Runtime configuration re-exports.
//!
//! The validated config types live in `invl-core::config` so the core can
//! read reloadable sections directly.

pub use invl_core::config::{
    AdminConfig, PlatformConfig, ServerConfig, SharedConfig, TenantConfig, TenantDirectory,
};
pub use invl_core::ledger::ReconciliationWindow;
