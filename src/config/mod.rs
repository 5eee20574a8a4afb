pub mod env;
pub mod types;

use anyhow::{Context, Result};
use std::path::Path;

pub use types::FilterConfig;

pub fn load_config(path: &Path) -> Result<FilterConfig> {
    let content = load_config_content(path)?;
    let config = parse_config(&content)
        .with_context(|| format!("failed to parse config {}", path.display()))?;
    Ok(config)
}

/// 解析 YAML 配置文本（空文档视为全部默认值）
pub fn parse_config(content: &str) -> Result<FilterConfig> {
    if content.trim().is_empty() {
        return Ok(FilterConfig::default());
    }
    let config: FilterConfig = serde_yml::from_str(content)?;
    config.validate()?;
    Ok(config)
}

pub fn load_config_content(path: &Path) -> Result<String> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    Ok(env::expand_env_vars(&raw))
}
