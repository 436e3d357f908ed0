mod settings;

pub use settings::{Company, Config, OutputSettings, ReportSettings};

use crate::error::{ClosingError, Result};
use directories::ProjectDirs;
use std::fs;
use std::path::{Path, PathBuf};

/// Get the config directory path (~/.closings/)
pub fn config_dir() -> Result<PathBuf> {
    // First try XDG-style directories
    if let Some(proj_dirs) = ProjectDirs::from("", "", "closings") {
        return Ok(proj_dirs.config_dir().to_path_buf());
    }

    // Fallback to ~/.closings/
    let home = dirs_home().ok_or_else(|| {
        ClosingError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "Could not determine home directory",
        ))
    })?;

    Ok(home.join(".closings"))
}

fn dirs_home() -> Option<PathBuf> {
    std::env::var_os("HOME").map(PathBuf::from)
}

/// Expand ~ in paths
pub fn expand_path(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs_home() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}

/// Load the main config.toml
pub fn load_config(config_dir: &Path) -> Result<Config> {
    if !config_dir.exists() {
        return Err(ClosingError::ConfigNotFound(config_dir.to_path_buf()));
    }
    let path = config_dir.join("config.toml");
    if !path.exists() {
        return Err(ClosingError::ConfigFileNotFound(path));
    }
    let content = fs::read_to_string(&path)?;
    parse_config(&content).map_err(|e| ClosingError::ConfigParse { path, source: e })
}

fn parse_config(content: &str) -> std::result::Result<Config, toml::de::Error> {
    toml::from_str(content)
}

/// Resolve an export path: relative paths land in the configured output directory
pub fn resolve_output_path(config: &Config, path: &Path) -> PathBuf {
    if path.is_absolute() || path.parent().is_some_and(|p| !p.as_os_str().is_empty()) {
        return path.to_path_buf();
    }
    expand_path(&config.output.output_dir).join(path)
}

/// Template content for config.toml
pub const CONFIG_TEMPLATE: &str = r#"[company]
name = "Your Print Shop"

[report]
currency_symbol = "R$"
decimal_separator = ","
thousands_separator = "."
distribution = "per-order"   # or "proportional"
date_mode = "auto"           # "entry", "delivery" or "auto"

[layout]
# A4 portrait, sizes in points
page_width = 595.0
page_height = 842.0
margin_top = 40.0
margin_bottom = 40.0
margin_left = 40.0
margin_right = 40.0
font_size = 9.0
line_height = 12.0
id_column_width = 60.0
value_column_width = 85.0
min_description_width = 120.0

[output]
output_dir = "~/.closings/output"
"#;
