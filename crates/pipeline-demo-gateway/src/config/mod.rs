//! Service config loader (strict parsing + env overrides).

pub mod schema;

use std::fs;

use pipeline_demo_core::error::{PipelineError, Result};

pub use schema::{MetricsSection, ServerSection, ServiceConfig};

/// Optional path to a YAML config file.
pub const CONFIG_ENV: &str = "PIPELINE_CONFIG";
/// Listening port override.
pub const PORT_ENV: &str = "PORT";

/// Load the config file named by `PIPELINE_CONFIG` (defaults if unset), then
/// apply the `PORT` override.
pub fn load_from_env() -> Result<ServiceConfig> {
    let mut cfg = match std::env::var(CONFIG_ENV) {
        Ok(path) if !path.is_empty() => load_from_file(&path)?,
        _ => ServiceConfig::default(),
    };
    apply_port_override(&mut cfg, std::env::var(PORT_ENV).ok().as_deref())?;
    Ok(cfg)
}

pub fn load_from_file(path: &str) -> Result<ServiceConfig> {
    let s = fs::read_to_string(path)
        .map_err(|e| PipelineError::BadConfig(format!("read config {path} failed: {e}")))?;
    load_from_str(&s)
}

pub fn load_from_str(s: &str) -> Result<ServiceConfig> {
    let cfg: ServiceConfig = serde_yaml::from_str(s)
        .map_err(|e| PipelineError::BadConfig(format!("invalid yaml: {e}")))?;
    cfg.validate()?;
    Ok(cfg)
}

/// Any non-empty value replaces `server.port`; it must be a valid port number.
pub fn apply_port_override(cfg: &mut ServiceConfig, port: Option<&str>) -> Result<()> {
    let Some(raw) = port.filter(|p| !p.is_empty()) else {
        return Ok(());
    };
    cfg.server.port = raw
        .parse::<u16>()
        .map_err(|e| PipelineError::BadConfig(format!("{PORT_ENV}={raw:?} is not a valid port: {e}")))?;
    Ok(())
}
