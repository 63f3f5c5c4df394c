//! `detkit.toml`: framework executable and training overrides.
//!
//! ```toml
//! [framework]
//! program = "python3"
//! args = ["-m", "ultralytics"]
//!
//! [train]
//! epochs = 50
//! batch = 8
//! ```

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use detkit_framework::{ParamValue, TrainConfig, UltralyticsCli};
use serde::Deserialize;
use tracing::{debug, info};

pub const DEFAULT_CONFIG_NAME: &str = "detkit.toml";
pub const CONFIG_ENV: &str = "DETKIT_CONFIG";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToolConfig {
    pub program: Option<PathBuf>,
    pub program_args: Vec<String>,
    pub train: Vec<(String, ParamValue)>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct ToolConfigFile {
    framework: Option<FrameworkSection>,
    train: Option<toml::Table>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct FrameworkSection {
    program: Option<String>,
    args: Option<Vec<String>>,
}

impl ToolConfig {
    /// `explicit`, else `$DETKIT_CONFIG`, else `./detkit.toml` when present.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::from_path(path);
        }
        if let Some(path) = std::env::var_os(CONFIG_ENV) {
            return Self::from_path(Path::new(&path));
        }
        let default = Path::new(DEFAULT_CONFIG_NAME);
        if default.exists() {
            return Self::from_path(default);
        }
        debug!("no config file; using built-in defaults");
        Ok(Self::default())
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let cfg = Self::parse(&raw).with_context(|| format!("invalid config {}", path.display()))?;
        info!(path = %path.display(), overrides = cfg.train.len(), "loaded config");
        Ok(cfg)
    }

    pub fn parse(raw: &str) -> Result<Self> {
        let file: ToolConfigFile = toml::from_str(raw)?;
        let framework = file.framework.unwrap_or_default();
        let train = file
            .train
            .unwrap_or_default()
            .into_iter()
            .map(|(key, value)| {
                let value = param_from_toml(&key, value)?;
                Ok((key, value))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            program: framework.program.map(PathBuf::from),
            program_args: framework.args.unwrap_or_default(),
            train,
        })
    }

    pub fn apply(&self, config: &mut TrainConfig) {
        for (key, value) in &self.train {
            config.set(key, value.clone());
        }
    }

    /// The framework driver; `program` from the command line beats the file.
    pub fn framework(&self, program: Option<&Path>) -> UltralyticsCli {
        let cli = match program.or(self.program.as_deref()) {
            Some(program) => UltralyticsCli::with_program(program),
            None => UltralyticsCli::new(),
        };
        cli.with_args(self.program_args.iter().cloned())
    }
}

fn param_from_toml(key: &str, value: toml::Value) -> Result<ParamValue> {
    Ok(match value {
        toml::Value::Boolean(v) => ParamValue::Bool(v),
        toml::Value::Integer(v) => ParamValue::Int(v),
        toml::Value::Float(v) => ParamValue::Float(v),
        toml::Value::String(v) => ParamValue::Str(v),
        other => bail!("train.{key}: expected a string, number or boolean, got {}", other.type_str()),
    })
}
