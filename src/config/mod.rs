//! Panel Configuration Module
//!
//! Provides the panel configuration loaded from TOML files: session protocol
//! limits, artifact paths, hosted-model settings and the judge roster.
//!
//! ## Loading Order
//!
//! 1. `AURA_CONFIG` environment variable (path to TOML file)
//! 2. `panel_config.toml` in the current working directory
//! 3. Built-in defaults
//!
//! ## Usage
//!
//! Call `config::init()` once at startup, then `config::get()` anywhere:
//!
//! ```ignore
//! config::init(PanelConfig::load());
//! let turns = config::get().session.max_turns;
//! ```

mod panel_config;
pub mod defaults;

pub use panel_config::*;

use std::sync::OnceLock;

/// Global panel configuration, initialized once at startup.
static PANEL_CONFIG: OnceLock<PanelConfig> = OnceLock::new();

/// Initialize the global panel configuration.
///
/// Later calls are ignored with a warning.
pub fn init(config: PanelConfig) {
    if PANEL_CONFIG.set(config).is_err() {
        tracing::warn!("config::init() called more than once, ignoring");
    }
}

/// Get a reference to the global panel configuration.
///
/// Falls back to the built-in defaults when `init()` was never called.
pub fn get() -> &'static PanelConfig {
    PANEL_CONFIG.get_or_init(|| {
        tracing::debug!("config::get() before config::init(), using defaults");
        PanelConfig::default()
    })
}

/// Check whether the config has been initialized.
pub fn is_initialized() -> bool {
    PANEL_CONFIG.get().is_some()
}
