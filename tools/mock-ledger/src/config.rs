use crate::errors::MockError;
use crate::logging::DEFAULT_DISK_BUDGET_BYTES;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_MAX_PAYLOAD_BYTES: usize = 4096;
pub const DEFAULT_MAX_ARGUMENT_BYTES: usize = 1024;

#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub config_path: Option<PathBuf>,
    pub trace_path: Option<PathBuf>,
    pub disable_trace: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LedgerConfig {
    pub trace: TraceConfig,
    pub render: RenderConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TraceConfig {
    pub path: Option<PathBuf>,
    pub max_payload_bytes: usize,
    pub budget_bytes: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RenderConfig {
    pub max_argument_bytes: usize,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            trace: TraceConfig {
                path: None,
                max_payload_bytes: DEFAULT_MAX_PAYLOAD_BYTES,
                budget_bytes: DEFAULT_DISK_BUDGET_BYTES,
            },
            render: RenderConfig {
                max_argument_bytes: DEFAULT_MAX_ARGUMENT_BYTES,
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct PartialLedgerConfig {
    trace: Option<PartialTraceConfig>,
    render: Option<PartialRenderConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct PartialTraceConfig {
    path: Option<PathBuf>,
    max_payload_bytes: Option<usize>,
    budget_bytes: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct PartialRenderConfig {
    max_argument_bytes: Option<usize>,
}

pub fn load_config(
    overrides: &ConfigOverrides,
    process_cwd: &Path,
) -> Result<LedgerConfig, MockError> {
    let mut cfg = LedgerConfig::default();

    if let Some(path) = &overrides.config_path {
        let file_contents =
            std::fs::read_to_string(path).map_err(|e| MockError::Io(e.to_string()))?;
        cfg = parse_config(&file_contents)?;
    }

    apply_overrides(&mut cfg, overrides);

    if let Some(path) = &cfg.trace.path {
        cfg.trace.path = Some(absolutize_path(process_cwd, path));
    }
    validate_config(&cfg)?;
    Ok(cfg)
}

/// Parses a TOML document over the defaults. Does not validate.
pub fn parse_config(contents: &str) -> Result<LedgerConfig, MockError> {
    let partial: PartialLedgerConfig =
        toml::from_str(contents).map_err(|e| MockError::ConfigParse(e.to_string()))?;
    let mut cfg = LedgerConfig::default();
    merge_partial_config(&mut cfg, partial);
    Ok(cfg)
}

fn merge_partial_config(cfg: &mut LedgerConfig, partial: PartialLedgerConfig) {
    if let Some(trace) = partial.trace {
        if let Some(path) = trace.path {
            cfg.trace.path = Some(path);
        }
        if let Some(value) = trace.max_payload_bytes {
            cfg.trace.max_payload_bytes = value;
        }
        if let Some(value) = trace.budget_bytes {
            cfg.trace.budget_bytes = value;
        }
    }

    if let Some(render) = partial.render {
        if let Some(value) = render.max_argument_bytes {
            cfg.render.max_argument_bytes = value;
        }
    }
}

fn apply_overrides(cfg: &mut LedgerConfig, overrides: &ConfigOverrides) {
    if let Some(path) = &overrides.trace_path {
        cfg.trace.path = Some(path.clone());
    }
    if overrides.disable_trace {
        cfg.trace.path = None;
    }
}

fn absolutize_path(base: &Path, value: &Path) -> PathBuf {
    if value.is_absolute() {
        value.to_path_buf()
    } else {
        base.join(value)
    }
}

pub fn validate_config(cfg: &LedgerConfig) -> Result<(), MockError> {
    if cfg.trace.max_payload_bytes == 0 {
        return Err(MockError::InvalidConfig(
            "trace.max_payload_bytes must be greater than zero".to_string(),
        ));
    }

    if cfg.trace.budget_bytes < cfg.trace.max_payload_bytes as u64 {
        return Err(MockError::InvalidConfig(
            "trace.budget_bytes must be at least trace.max_payload_bytes".to_string(),
        ));
    }

    if cfg.render.max_argument_bytes == 0 {
        return Err(MockError::InvalidConfig(
            "render.max_argument_bytes must be greater than zero".to_string(),
        ));
    }

    // Arguments share the payload with the record's other fields.
    if cfg.render.max_argument_bytes >= cfg.trace.max_payload_bytes {
        return Err(MockError::InvalidConfig(
            "render.max_argument_bytes must be less than trace.max_payload_bytes".to_string(),
        ));
    }

    Ok(())
}
