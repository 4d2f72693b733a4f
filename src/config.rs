//! Service configuration parsed from environment variables.

use std::path::PathBuf;

use canvas::export::OutputFormat;

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_JPEG_QUALITY: u8 = 90;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid {var}: `{value}`")]
    Invalid { var: &'static str, value: String },
    #[error("unsupported OUTPUT_FORMAT `{0}` (expected `png` or `jpeg`)")]
    UnknownFormat(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub port: u16,
    /// Directory that relative image references resolve against.
    pub asset_root: PathBuf,
    /// Directory of `.ttf`/`.otf` faces loaded at startup.
    pub font_dir: Option<PathBuf>,
    /// Hosts whose images may be fetched over HTTP. Empty allows none.
    pub allowed_image_hosts: Vec<String>,
    pub http_timeout_secs: u64,
    pub output_format: OutputFormat,
}

impl AppConfig {
    /// Build typed config from the process environment.
    ///
    /// Optional:
    /// - `PORT`: default 3000
    /// - `ASSET_ROOT`: default `.`
    /// - `FONT_DIR`: no fonts loaded when absent
    /// - `ALLOWED_IMAGE_HOSTS`: comma-separated host names
    /// - `HTTP_TIMEOUT_SECS`: default 30
    /// - `OUTPUT_FORMAT`: `png` (default) or `jpeg`
    /// - `JPEG_QUALITY`: default 90, only read for `jpeg`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a present variable does not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`AppConfig::from_env`] with an arbitrary variable source.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a present variable does not parse.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let port = parse_or("PORT", lookup("PORT"), DEFAULT_PORT)?;
        let asset_root = lookup("ASSET_ROOT").map_or_else(|| PathBuf::from("."), PathBuf::from);
        let font_dir = lookup("FONT_DIR").filter(|v| !v.trim().is_empty()).map(PathBuf::from);
        let allowed_image_hosts = lookup("ALLOWED_IMAGE_HOSTS")
            .map(|raw| parse_hosts(&raw))
            .unwrap_or_default();
        let http_timeout_secs = parse_or("HTTP_TIMEOUT_SECS", lookup("HTTP_TIMEOUT_SECS"), DEFAULT_HTTP_TIMEOUT_SECS)?;
        let quality = parse_or("JPEG_QUALITY", lookup("JPEG_QUALITY"), DEFAULT_JPEG_QUALITY)?;
        if !(1..=100).contains(&quality) {
            return Err(ConfigError::Invalid { var: "JPEG_QUALITY", value: quality.to_string() });
        }
        let output_format = parse_format(lookup("OUTPUT_FORMAT").as_deref(), quality)?;

        Ok(Self { port, asset_root, font_dir, allowed_image_hosts, http_timeout_secs, output_format })
    }
}

fn parse_or<T: std::str::FromStr>(var: &'static str, raw: Option<String>, default: T) -> Result<T, ConfigError> {
    match raw {
        None => Ok(default),
        Some(value) => value.trim().parse().map_err(|_| ConfigError::Invalid { var, value }),
    }
}

fn parse_hosts(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|h| h.trim().to_lowercase())
        .filter(|h| !h.is_empty())
        .collect()
}

/// Parse an output format name. `quality` applies to `jpeg` only.
///
/// # Errors
///
/// Returns [`ConfigError::UnknownFormat`] for anything but `png`/`jpeg`/`jpg`.
pub fn parse_format(raw: Option<&str>, quality: u8) -> Result<OutputFormat, ConfigError> {
    match raw.map(|v| v.trim().to_lowercase()).as_deref() {
        None | Some("png") => Ok(OutputFormat::Png),
        Some("jpeg" | "jpg") => Ok(OutputFormat::Jpeg { quality }),
        Some(other) => Err(ConfigError::UnknownFormat(other.to_owned())),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
