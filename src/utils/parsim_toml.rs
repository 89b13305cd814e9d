//! Load `.parsim.toml` (CLI only). Library callers build a `PipelineConfig` directly.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

use crate::Opts;
use crate::engine::operations::OperationType;

#[derive(Debug, Default, Deserialize)]
pub struct ParsimToml {
    #[serde(default)]
    settings: SettingsSection,
    /// Service name or id → queue capacity. 0 means "use the default capacity".
    #[serde(default)]
    services: BTreeMap<String, usize>,
}

#[derive(Debug, Default, Deserialize)]
struct SettingsSection {
    default_capacity: Option<usize>,
    backend_capacity: Option<usize>,
    verbose: Option<bool>,
}

impl ParsimToml {
    pub fn parse(s: &str) -> Result<Self> {
        toml::from_str(s).context("parse config")
    }
}

/// Load a config file. `required` makes a missing file an error (explicit `--config`).
pub fn load_parsim_toml(path: &Path, required: bool) -> Result<Option<ParsimToml>> {
    let s = match std::fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) if !required && e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e).with_context(|| format!("read config {}", path.display())),
    };
    let file = ParsimToml::parse(&s).with_context(|| format!("in {}", path.display()))?;
    Ok(Some(file))
}

/// Overwrite opts field from file when present.
macro_rules! apply_file_opt {
    ($section:expr, $opts:expr, $field:ident) => {
        if let Some(v) = $section.$field {
            $opts.$field = Some(v);
        }
    };
}

/// Apply file config to opts (only fields present in the file). Call before applying CLI.
pub fn apply_file_to_opts(file: &ParsimToml, opts: &mut Opts) -> Result<()> {
    let settings = &file.settings;
    apply_file_opt!(settings, opts, default_capacity);
    apply_file_opt!(settings, opts, backend_capacity);
    if let Some(v) = settings.verbose {
        opts.verbose = v;
    }
    for (key, capacity) in &file.services {
        let op: OperationType = key
            .parse()
            .with_context(|| format!("[services] entry '{key}'"))?;
        let capacity = (*capacity > 0).then_some(*capacity);
        opts.services.insert(op, capacity);
    }
    Ok(())
}
