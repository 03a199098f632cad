// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

static CONFIG: OnceLock<VeccastConfig> = OnceLock::new();

fn default_log_level() -> String {
    "info".to_string()
}

pub fn init_from_path(path: impl AsRef<Path>) -> Result<&'static VeccastConfig> {
    if let Some(cfg) = CONFIG.get() {
        return Ok(cfg);
    }
    let path = path.as_ref().to_path_buf();
    let cfg = VeccastConfig::load_from_file(&path)?;
    let _ = CONFIG.set(cfg);
    Ok(CONFIG.get().expect("CONFIG set"))
}

pub fn init_from_env_or_default() -> Result<&'static VeccastConfig> {
    if let Some(cfg) = CONFIG.get() {
        return Ok(cfg);
    }
    let cfg = match config_path_from_env() {
        Some(path) => VeccastConfig::load_from_file(&path)?,
        None => VeccastConfig::default(),
    };
    let _ = CONFIG.set(cfg);
    Ok(CONFIG.get().expect("CONFIG set"))
}

pub fn config() -> Result<&'static VeccastConfig> {
    init_from_env_or_default()
}

fn config_path_from_env() -> Option<PathBuf> {
    if let Ok(p) = std::env::var("VECCAST_CONFIG") {
        if !p.trim().is_empty() {
            return Some(PathBuf::from(p));
        }
    }

    let candidate = PathBuf::from("veccast.toml");
    if candidate.exists() {
        return Some(candidate);
    }
    None
}

#[derive(Clone, Deserialize)]
pub struct VeccastConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Optional full tracing EnvFilter expression.
    /// If set, this takes precedence over `log_level`.
    /// Example: "veccast=debug"
    #[serde(default)]
    pub log_filter: Option<String>,

    #[serde(default)]
    pub execution: ExecutionConfig,
}

impl VeccastConfig {
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let s = std::fs::read_to_string(path)
            .with_context(|| format!("read config file: {}", path.display()))?;
        let cfg: VeccastConfig =
            toml::from_str(&s).with_context(|| format!("parse toml: {}", path.display()))?;
        Ok(cfg)
    }
}

impl Default for VeccastConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_filter: None,
            execution: ExecutionConfig::default(),
        }
    }
}

#[derive(Clone, Default, Deserialize)]
pub struct ExecutionConfig {
    /// Strict SQL mode: recoverable cast failures abort the batch instead of
    /// degrading to warnings.
    #[serde(default)]
    pub strict_mode: bool,
}

#[cfg(test)]
mod tests {
    use super::VeccastConfig;

    #[test]
    fn test_strict_mode_defaults_off() {
        let cfg: VeccastConfig = toml::from_str(
            r#"
[execution]
"#,
        )
        .expect("parse config");
        assert!(!cfg.execution.strict_mode);
        assert_eq!(cfg.log_level, "info");
    }

    #[test]
    fn test_strict_mode_can_be_enabled() {
        let cfg: VeccastConfig = toml::from_str(
            r#"
log_level = "debug"

[execution]
strict_mode = true
"#,
        )
        .expect("parse config");
        assert!(cfg.execution.strict_mode);
        assert_eq!(cfg.log_level, "debug");
    }
}
