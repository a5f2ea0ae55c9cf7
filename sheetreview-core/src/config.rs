//! Configuration loaded from `sheetreview.toml`

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Result, ReviewError};

/// Directory name under the per-user data directory
pub const APP_DIR: &str = "sheetreview";
pub const DEFAULT_DATABASE: &str = "product_reviews.db";
pub const DEFAULT_CONFIG_FILE: &str = "sheetreview.toml";

/// Main application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewConfig {
    /// Overrides the per-user data directory
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
    #[serde(default = "default_database")]
    pub database: String,
    /// Worksheet to import; the first sheet when unset
    #[serde(default)]
    pub sheet: Option<String>,
    #[serde(default)]
    pub colors: ColorConfig,
}

/// Fill colors for the verified column, as 6-digit RGB hex
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorConfig {
    #[serde(default = "default_verified_color")]
    pub verified: String,
    #[serde(default = "default_unverified_color")]
    pub unverified: String,
}

fn default_database() -> String {
    DEFAULT_DATABASE.to_string()
}

fn default_verified_color() -> String {
    "00FF00".to_string()
}

fn default_unverified_color() -> String {
    "FF0000".to_string()
}

impl Default for ColorConfig {
    fn default() -> Self {
        Self {
            verified: default_verified_color(),
            unverified: default_unverified_color(),
        }
    }
}

impl ColorConfig {
    pub fn verified_rgb(&self) -> Result<u32> {
        parse_hex_color(&self.verified)
    }

    pub fn unverified_rgb(&self) -> Result<u32> {
        parse_hex_color(&self.unverified)
    }
}

impl Default for ReviewConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            database: default_database(),
            sheet: None,
            colors: ColorConfig::default(),
        }
    }
}

impl ReviewConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| ReviewError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: ReviewConfig =
            toml::from_str(content).map_err(|e| ReviewError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load `path` if given, else `sheetreview.toml` in the working directory if present
    pub fn load(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::from_file(path);
        }
        let default_path = PathBuf::from(DEFAULT_CONFIG_FILE);
        if default_path.exists() {
            Self::from_file(&default_path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.colors.verified_rgb()?;
        self.colors.unverified_rgb()?;
        if self.database.trim().is_empty() {
            return Err(ReviewError::Config("database name is empty".to_string()));
        }
        Ok(())
    }

    /// Directory holding the store and session files
    pub fn data_dir(&self) -> Result<PathBuf> {
        match &self.data_dir {
            Some(dir) => Ok(dir.clone()),
            None => dirs::data_dir()
                .map(|dir| dir.join(APP_DIR))
                .ok_or_else(|| ReviewError::Config("no per-user data directory".to_string())),
        }
    }

    pub fn database_path(&self) -> Result<PathBuf> {
        Ok(self.data_dir()?.join(&self.database))
    }
}

/// "00FF00", "#00ff00" -> 0x00FF00
fn parse_hex_color(s: &str) -> Result<u32> {
    let hex = s.trim().trim_start_matches('#');
    if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(ReviewError::Config(format!("color '{}' is not 6 hex digits", s)));
    }
    u32::from_str_radix(hex, 16)
        .map_err(|_| ReviewError::Config(format!("color '{}' is not valid hex", s)))
}
