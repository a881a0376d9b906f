//! Layered configuration.
//!
//! The effective [`Config`] starts from defaults and is overlaid by every
//! `rtsp-test-server.conf` found in an ordered list of directories. Later
//! directories win. Missing files are skipped silently, an out-of-range port
//! is reported and ignored, and a malformed file stops the walk: directories
//! after it are never consulted and whatever was accumulated before it is
//! kept.
//!
//! The file holds flat `key = value` settings. Both TOML and the libconfig
//! scalar forms are accepted, so all of these set the port:
//!
//! ```text
//! port = 8554
//! port = 8554;
//! port: 8554;
//! ```
//!
//! Only a syntax error counts as malformed. A `port` that is not an integer
//! is treated as absent.

use std::borrow::Cow;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::ConfigError;

pub const CONFIG_FILE_NAME: &str = "rtsp-test-server.conf";
pub const DEFAULT_PORT: u16 = 9554;

const DEFAULT_SYSTEM_CONFIG_DIRS: &str = "/etc/xdg";

/// Effective daemon configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// RTSP listening port, always in `1..=65534`.
    pub port: u16,
}

impl Default for Config {
    fn default() -> Self {
        Self { port: DEFAULT_PORT }
    }
}

/// On-disk document. Unknown keys are ignored.
#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    port: Option<toml::Value>,
}

/// Platform configuration directories, lowest priority first.
///
/// System directories from `$XDG_CONFIG_DIRS` come first, reversed so the
/// most important one is applied last among them, followed by the user's
/// configuration directory.
pub fn config_dirs() -> Vec<PathBuf> {
    let system = env::var("XDG_CONFIG_DIRS")
        .ok()
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| DEFAULT_SYSTEM_CONFIG_DIRS.to_string());

    let mut dirs: Vec<PathBuf> = system
        .split(':')
        .filter(|d| !d.is_empty())
        .map(PathBuf::from)
        .rev()
        .collect();

    if let Some(base) = directories::BaseDirs::new() {
        dirs.push(base.config_dir().to_path_buf());
    }
    dirs
}

/// Resolve against the platform directories.
pub fn resolve() -> Config {
    resolve_from(&config_dirs())
}

/// Resolve against an explicit directory list, applied in order.
pub fn resolve_from<P: AsRef<Path>>(dirs: &[P]) -> Config {
    let mut config = Config::default();

    for dir in dirs {
        let path = dir.as_ref().join(CONFIG_FILE_NAME);
        if !path.is_file() {
            continue;
        }

        tracing::info!(path = %path.display(), "loading config");
        let file = match load_file(&path) {
            Ok(file) => file,
            Err(e) => {
                tracing::error!("fail load config. {e}");
                return config;
            }
        };

        match file.port {
            Some(toml::Value::Integer(raw)) => match validate_port(raw) {
                Some(port) => config.port = port,
                None => tracing::error!(path = %path.display(), port = raw, "invalid port value"),
            },
            Some(other) => {
                tracing::error!(path = %path.display(), value = %other, "port is not an integer");
            }
            None => {}
        }
    }

    config
}

/// Accept only `1..=65534`.
fn validate_port(value: i64) -> Option<u16> {
    u16::try_from(value).ok().filter(|&p| p > 0 && p < u16::MAX)
}

fn load_file(path: &Path) -> Result<ConfigFile, ConfigError> {
    let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let document = normalize_libconfig(&text);
    toml::from_str(&document).map_err(|e| ConfigError::Parse {
        path: path.to_path_buf(),
        line: e.span().map_or(1, |span| line_of(&document, span.start)),
        message: e.message().trim_end().to_string(),
    })
}

/// Rewrite libconfig scalar settings into TOML, one line in, one line out,
/// so parser line numbers still point into the original file.
fn normalize_libconfig(text: &str) -> String {
    text.lines()
        .map(normalize_line)
        .collect::<Vec<_>>()
        .join("\n")
}

fn normalize_line(line: &str) -> Cow<'_, str> {
    let trimmed = line.trim_start();
    if let Some(comment) = trimmed.strip_prefix("//") {
        return Cow::Owned(format!("#{comment}"));
    }

    let Some(sep) = trimmed.find(['=', ':']) else {
        return Cow::Borrowed(line);
    };
    let key = trimmed[..sep].trim_end();
    let bare_key = !key.is_empty()
        && key
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'_' | b'-' | b'.'));
    if !bare_key {
        return Cow::Borrowed(line);
    }

    let mut value = trimmed[sep + 1..].trim();
    value = value.strip_suffix(';').map_or(value, str::trim_end);
    // A trailing comma also ends a setting, except inside a TOML array.
    if !value.starts_with('[') {
        value = value.strip_suffix(',').map_or(value, str::trim_end);
    }
    Cow::Owned(format!("{key} = {value}"))
}

/// 1-based line containing byte `offset`.
fn line_of(text: &str, offset: usize) -> usize {
    let end = offset.min(text.len());
    text.as_bytes()[..end].iter().filter(|&&b| b == b'\n').count() + 1
}
