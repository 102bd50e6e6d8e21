use std::{fs, path::Path};

use serde::Deserialize;
use shared::protocol::DEFAULT_RADIUS_MILES;
use thiserror::Error;
use url::Url;

pub const SETTINGS_FILE: &str = "widgets.toml";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to parse {path}: {source}")]
    File {
        path: String,
        source: toml::de::Error,
    },
    #[error("invalid backend url '{url}': {source}")]
    BackendUrl {
        url: String,
        source: url::ParseError,
    },
    #[error("invalid default radius '{0}'")]
    Radius(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub backend_url: String,
    pub default_radius_miles: f64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            backend_url: "http://127.0.0.1:8080/".into(),
            default_radius_miles: DEFAULT_RADIUS_MILES,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    backend_url: Option<String>,
    default_radius_miles: Option<f64>,
}

impl Settings {
    pub fn backend_url(&self) -> Result<Url, SettingsError> {
        parse_backend_url(&self.backend_url)
    }

    pub fn set_backend_url(&mut self, raw: &str) -> Result<(), SettingsError> {
        self.backend_url = parse_backend_url(raw)?.to_string();
        Ok(())
    }
}

fn parse_backend_url(raw: &str) -> Result<Url, SettingsError> {
    Url::parse(raw.trim()).map_err(|source| SettingsError::BackendUrl {
        url: raw.to_string(),
        source,
    })
}

/// Defaults, then `widgets.toml` in the working directory, then environment.
pub fn load_settings() -> Result<Settings, SettingsError> {
    load_settings_from(Path::new(SETTINGS_FILE), |key| std::env::var(key).ok())
}

pub fn load_settings_from(
    path: &Path,
    env: impl Fn(&str) -> Option<String>,
) -> Result<Settings, SettingsError> {
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string(path) {
        let file_cfg: FileSettings =
            toml::from_str(&raw).map_err(|source| SettingsError::File {
                path: path.display().to_string(),
                source,
            })?;
        if let Some(v) = file_cfg.backend_url {
            settings.set_backend_url(&v)?;
        }
        if let Some(v) = file_cfg.default_radius_miles {
            if v.is_nan() {
                return Err(SettingsError::Radius(v.to_string()));
            }
            settings.default_radius_miles = v;
        }
    }

    if let Some(v) = env("WIDGETS_BACKEND_URL") {
        settings.set_backend_url(&v)?;
    }
    if let Some(v) = env("APP__BACKEND_URL") {
        settings.set_backend_url(&v)?;
    }

    if let Some(v) = env("APP__DEFAULT_RADIUS_MILES") {
        settings.default_radius_miles = v
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|radius| !radius.is_nan())
            .ok_or(SettingsError::Radius(v))?;
    }

    Ok(settings)
}
