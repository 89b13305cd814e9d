//! Application configuration constants.
//! Queue sizing defaults and package-derived names in one place.

use std::sync::OnceLock;

// ---- Package / paths (from CARGO_PKG_NAME, cached) ----

/// Package-derived names: built once from `CARGO_PKG_NAME`, then cached.
pub struct PackagePaths {
    pkg_name: &'static str,
    config_filename: String,
}

static PACKAGE_PATHS: OnceLock<PackagePaths> = OnceLock::new();

impl PackagePaths {
    /// Build and cache names from `CARGO_PKG_NAME`. Called once on first use.
    pub fn get() -> &'static PackagePaths {
        PACKAGE_PATHS.get_or_init(|| {
            let pkg = env!("CARGO_PKG_NAME");
            PackagePaths {
                pkg_name: pkg,
                config_filename: format!(".{pkg}.toml"),
            }
        })
    }

    pub fn pkg_name(&self) -> &str {
        self.pkg_name
    }

    /// Config file looked up in the working directory (e.g. `.parsim.toml`).
    pub fn config_filename(&self) -> &str {
        &self.config_filename
    }
}

// ---- Queue sizing ----

/// Queue capacity defaults.
pub struct QueueCapacity;

impl QueueCapacity {
    /// Service queue size when neither an explicit nor a default capacity was given.
    pub const FALLBACK: usize = 1;
    /// Result (backend) queue size when not configured.
    pub const BACKEND: usize = 1;
}
