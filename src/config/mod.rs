/// Configuration system for querydeck.
///
/// Provides a layered configuration hierarchy:
///
/// 1. **Built-in defaults** — hardcoded in [`schema::QueryDeckConfig::default()`]
/// 2. **User global config** — `~/.querydeck/config.toml`
/// 3. **Project local config** — `.querydeck.toml` in the current working directory
/// 4. **Environment variables** — `QUERYDECK_*` overrides (highest precedence)
///
/// File layers are merged key by key, so a project file that only sets
/// `api.base_url` keeps every other value from the global file.
///
/// # Usage
///
/// ```rust,ignore
/// use querydeck::config;
///
/// let cfg = config::load();
/// let backend = HttpBackend::from_config(&cfg.api);
/// ```
pub mod schema;

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};

pub use schema::QueryDeckConfig;

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Load the fully resolved querydeck configuration.
///
/// Merges all layers in order: defaults → global TOML → project TOML → env
/// vars.
pub fn load() -> QueryDeckConfig {
    let mut merged = toml::Value::Table(toml::map::Map::new());

    for path in [global_config_path(), project_config_path()] {
        if let Some(layer) = load_toml_value(path) {
            merge_value(&mut merged, layer);
        }
    }

    let mut config: QueryDeckConfig = merged.try_into().unwrap_or_default();
    apply_env_overrides(&mut config);
    config
}

/// Load a TOML file as a raw value tree.
///
/// Returns `None` if the path is `None`, the file doesn't exist, or the
/// content is malformed. Malformed files are ignored rather than failing
/// startup.
fn load_toml_value(path: Option<PathBuf>) -> Option<toml::Value> {
    let path = path?;
    let content = fs::read_to_string(&path).ok()?;
    let value: toml::Value = toml::from_str(&content).ok()?;
    // Reject files that parse as TOML but not as our schema.
    value.clone().try_into::<QueryDeckConfig>().ok()?;
    Some(value)
}

/// Merge `overlay` into `base`, recursing into tables. Non-table values in
/// the overlay win.
fn merge_value(base: &mut toml::Value, overlay: toml::Value) {
    match (base, overlay) {
        (toml::Value::Table(base), toml::Value::Table(overlay)) => {
            for (key, value) in overlay {
                match base.get_mut(&key) {
                    Some(existing) => merge_value(existing, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}

// ---------------------------------------------------------------------------
// File paths
// ---------------------------------------------------------------------------

/// Path to the user global config: `~/.querydeck/config.toml`.
fn global_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".querydeck").join("config.toml"))
}

/// Path to the project local config: `.querydeck.toml` in the current directory.
fn project_config_path() -> Option<PathBuf> {
    std::env::current_dir()
        .ok()
        .map(|cwd| cwd.join(".querydeck.toml"))
}

/// Return the path to the global config file for display/init purposes.
pub fn global_config_file() -> Option<PathBuf> {
    global_config_path()
}

/// Return the path to the project config file for display purposes.
pub fn project_config_file() -> Option<PathBuf> {
    project_config_path()
}

// ---------------------------------------------------------------------------
// Environment variable overrides
// ---------------------------------------------------------------------------

/// Apply environment variable overrides (highest precedence layer).
///
/// Supported variables:
/// - `QUERYDECK_API_URL` — backend base URL
/// - `QUERYDECK_TIMEOUT_MS` — request timeout (`0` = none)
/// - `QUERYDECK_RAW_JSON` — print raw result JSON (`1`/`true`/`yes`/`on`)
/// - `QUERYDECK_HISTORY` — run log enabled
/// - `QUERYDECK_COLOR` — colored output
fn apply_env_overrides(config: &mut QueryDeckConfig) {
    if let Ok(val) = std::env::var("QUERYDECK_API_URL")
        && !val.is_empty()
    {
        config.api.base_url = val;
    }
    if let Ok(val) = std::env::var("QUERYDECK_TIMEOUT_MS")
        && let Ok(ms) = val.parse::<u64>()
    {
        config.api.timeout_ms = ms;
    }
    if let Ok(val) = std::env::var("QUERYDECK_RAW_JSON") {
        config.display.show_raw_json = is_truthy(&val);
    }
    if let Ok(val) = std::env::var("QUERYDECK_HISTORY") {
        config.history.enabled = is_truthy(&val);
    }
    if let Ok(val) = std::env::var("QUERYDECK_COLOR") {
        config.display.color = is_truthy(&val);
    }
}

/// Check if a string value represents a truthy boolean.
fn is_truthy(val: &str) -> bool {
    matches!(
        val.to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

// ---------------------------------------------------------------------------
// Config init / set / reset
// ---------------------------------------------------------------------------

/// Write the default annotated config to `~/.querydeck/config.toml`.
///
/// Creates the `~/.querydeck/` directory if it doesn't exist. Returns an
/// error if the file already exists (use `force = true` to overwrite).
pub fn init_config(force: bool) -> Result<PathBuf> {
    let path = global_config_path().context("could not determine home directory")?;

    if path.exists() && !force {
        anyhow::bail!(
            "config file already exists at {}. Use --force to overwrite.",
            path.display()
        );
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("failed to create ~/.querydeck/ directory")?;
    }

    fs::write(&path, QueryDeckConfig::default_toml()).context("failed to write config file")?;

    Ok(path)
}

/// Set a single config key to a value in the global config file.
///
/// Reads the current global config (or defaults), updates the specified
/// dotted key, and writes the result back. Unknown keys are rejected.
pub fn set_config_value(key: &str, value: &str) -> Result<()> {
    let path = global_config_path().context("could not determine home directory")?;

    let mut root: toml::Value = if path.exists() {
        let content = fs::read_to_string(&path).context("failed to read config file")?;
        toml::from_str(&content).context("failed to parse config as TOML value")?
    } else {
        toml::Value::try_from(QueryDeckConfig::default())
            .context("failed to serialize default config")?
    };

    // Fill in sections missing from a hand-written file so any schema key
    // can be set.
    let mut full = toml::Value::try_from(QueryDeckConfig::default())
        .context("failed to serialize default config")?;
    merge_value(&mut full, root);
    root = full;

    set_toml_value(&mut root, key, value)?;

    root.clone()
        .try_into::<QueryDeckConfig>()
        .with_context(|| format!("invalid value for '{key}': {value}"))?;

    let output = toml::to_string_pretty(&root).context("failed to serialize updated config")?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("failed to create config directory")?;
    }
    fs::write(&path, output).context("failed to write config file")?;

    Ok(())
}

/// Set a value in a TOML value tree using a dotted key path.
///
/// The leaf must already exist; its current type decides how `raw_value`
/// is parsed.
fn set_toml_value(root: &mut toml::Value, key: &str, raw_value: &str) -> Result<()> {
    let Some((section_path, leaf)) = key.rsplit_once('.') else {
        anyhow::bail!("config key must be dotted (e.g. api.base_url), got '{key}'");
    };

    let mut current = root;
    for part in section_path.split('.') {
        current = current
            .get_mut(part)
            .with_context(|| format!("config key not found: section '{part}' in '{key}'"))?;
    }

    let table = current
        .as_table_mut()
        .with_context(|| format!("expected table at '{section_path}'"))?;

    let new_value = match table.get(leaf) {
        Some(toml::Value::Boolean(_)) => toml::Value::Boolean(is_truthy(raw_value)),
        Some(toml::Value::Integer(_)) => {
            let n: i64 = raw_value
                .parse()
                .with_context(|| format!("expected integer for '{key}', got '{raw_value}'"))?;
            toml::Value::Integer(n)
        }
        Some(toml::Value::String(_)) => toml::Value::String(raw_value.to_string()),
        Some(_) => anyhow::bail!("config key '{key}' cannot be set from the command line"),
        None => anyhow::bail!("config key not found: '{key}'"),
    };

    table.insert(leaf.to_string(), new_value);
    Ok(())
}

/// Reset the global config to defaults (overwrite the file).
pub fn reset_config() -> Result<PathBuf> {
    init_config(true)
}

/// Show the effective (fully resolved) config as TOML.
pub fn show_effective_config() -> Result<String> {
    let config = load();
    toml::to_string_pretty(&config).context("failed to serialize effective config")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
