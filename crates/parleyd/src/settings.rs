//! Settings loading with deep merge and environment variable overrides.
//!
//! Loading flow:
//! 1. Start with compiled [`ServerConfig::default()`]
//! 2. If the settings file exists, deep-merge user values over defaults
//! 3. Apply `PARLEY_*` environment variable overrides (highest priority)
//!
//! Deep merge rules:
//! - Objects are merged recursively (source overrides target per-key)
//! - Arrays and primitives are replaced entirely by source
//! - Null values in source are skipped (preserving target)

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde_json::Value;
use tracing::debug;

use parley_server::config::ServerConfig;

/// Resolve the default settings file path (`~/.parley/settings.json`).
pub fn settings_path() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
    PathBuf::from(home).join(".parley").join("settings.json")
}

/// Load settings from a specific path with env var overrides.
///
/// A missing file yields defaults; invalid JSON is an error.
pub fn load_settings_from_path(path: &Path) -> anyhow::Result<ServerConfig> {
    let defaults = serde_json::to_value(ServerConfig::default())?;

    let merged = if path.exists() {
        debug!(?path, "loading settings from file");
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read settings file {}", path.display()))?;
        let user: Value = serde_json::from_str(&content)
            .with_context(|| format!("invalid JSON in settings file {}", path.display()))?;
        deep_merge(defaults, user)
    } else {
        debug!(?path, "settings file not found, using defaults");
        defaults
    };

    let mut config: ServerConfig = serde_json::from_value(merged)
        .with_context(|| format!("invalid settings in {}", path.display()))?;
    apply_env_overrides(&mut config);
    Ok(config)
}

/// Recursive deep merge of two JSON values.
///
/// - Objects are merged recursively (source overrides target per-key)
/// - Arrays and primitives are replaced entirely by source
/// - Null values in source are skipped (preserving target)
pub fn deep_merge(target: Value, source: Value) -> Value {
    match (target, source) {
        (Value::Object(mut target_map), Value::Object(source_map)) => {
            for (key, source_val) in source_map {
                if source_val.is_null() {
                    continue;
                }
                let merged = if let Some(target_val) = target_map.remove(&key) {
                    deep_merge(target_val, source_val)
                } else {
                    source_val
                };
                let _ = target_map.insert(key, merged);
            }
            Value::Object(target_map)
        }
        (_, source) => source,
    }
}

/// Apply `PARLEY_*` environment variable overrides to loaded settings.
///
/// Invalid or out-of-range values are silently ignored (fall back to
/// file/default).
pub fn apply_env_overrides(config: &mut ServerConfig) {
    apply_overrides(config, |name| std::env::var(name).ok());
}

/// Override core, parameterized over the variable source for testability.
fn apply_overrides(config: &mut ServerConfig, get: impl Fn(&str) -> Option<String>) {
    if let Some(v) = read_string(&get, "PARLEY_HOST") {
        config.host = v;
    }
    if let Some(v) = read_u64(&get, "PARLEY_PORT", 0, 65535) {
        config.port = v as u16;
    }
    if let Some(v) = read_string(&get, "PARLEY_PUBLIC_URL") {
        config.public_url = Some(v);
    }
    if let Some(v) = read_string(&get, "PARLEY_DEFAULT_ROOM") {
        config.default_room = v;
    }
    if let Some(v) = read_u64(&get, "PARLEY_MAX_MESSAGE_SIZE", 1, 64 * 1024 * 1024) {
        config.max_message_size = v as usize;
    }
    if let Some(v) = read_u64(&get, "PARLEY_PONG_TIMEOUT_SECS", 1, 3600) {
        config.pong_timeout_secs = v;
    }
    if let Some(v) = read_u64(&get, "PARLEY_MAILBOX_CAPACITY", 1, 65536) {
        config.mailbox_capacity = v as usize;
    }
    if let Some(v) = read_string(&get, "PARLEY_STATIC_DIR") {
        config.static_dir = Some(PathBuf::from(v));
    }
}

fn read_string(get: &impl Fn(&str) -> Option<String>, name: &str) -> Option<String> {
    get(name).filter(|v| !v.is_empty())
}

fn read_u64(get: &impl Fn(&str) -> Option<String>, name: &str, min: u64, max: u64) -> Option<u64> {
    get(name)
        .and_then(|v| v.parse::<u64>().ok())
        .filter(|v| (min..=max).contains(v))
}
