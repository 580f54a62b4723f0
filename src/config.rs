//! Runtime configuration, read from the environment.
//!
//! Values come from the process environment first, then a `.env` file in the
//! working directory, then the bundled `assets/config.env`. Nothing here ever
//! supplies a default API key.

use anyhow::{Context, Result};
use std::env;
use std::path::PathBuf;

use crate::types::Coordinates;

/// Defaults compiled in for builds that ship without a `.env`.
const BUNDLED_CONFIG: &str = include_str!("../assets/config.env");

pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-pro";
pub const DEFAULT_RECOGNITION_LOCALE: &str = "en-US";

#[derive(Clone, Debug, PartialEq)]
pub struct AppConfig {
    pub gemini_base_url: String,
    pub gemini_model: String,
    pub gemini_api_key: Option<String>,
    pub mode: Option<String>,
    pub storage_dir: Option<PathBuf>,
    pub recognition_locale: String,
    pub fixed_location: Option<Coordinates>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            gemini_base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
            gemini_model: DEFAULT_GEMINI_MODEL.to_string(),
            gemini_api_key: None,
            mode: None,
            storage_dir: None,
            recognition_locale: DEFAULT_RECOGNITION_LOCALE.to_string(),
            fixed_location: None,
        }
    }
}

impl AppConfig {
    /// Loads `.env`/bundled defaults into the environment, then reads it.
    pub fn from_env() -> Result<Self> {
        load_dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds a config from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let defaults = Self::default();

        let fixed_location = match (read("SAHAYAK_LATITUDE"), read("SAHAYAK_LONGITUDE")) {
            (Some(lat), Some(lon)) => Some(Coordinates {
                latitude: lat
                    .parse()
                    .with_context(|| format!("SAHAYAK_LATITUDE is not a number: {lat}"))?,
                longitude: lon
                    .parse()
                    .with_context(|| format!("SAHAYAK_LONGITUDE is not a number: {lon}"))?,
            }),
            _ => None,
        };

        Ok(Self {
            gemini_base_url: read("SAHAYAK_GEMINI_BASE_URL").unwrap_or(defaults.gemini_base_url),
            gemini_model: read("SAHAYAK_GEMINI_MODEL").unwrap_or(defaults.gemini_model),
            gemini_api_key: read("GEMINI_API_KEY"),
            mode: read("SAHAYAK_MODE"),
            storage_dir: read("SAHAYAK_STORAGE_DIR").map(PathBuf::from),
            recognition_locale: read("SAHAYAK_SPEECH_LOCALE")
                .unwrap_or(defaults.recognition_locale),
            fixed_location,
        })
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn load_dotenv() {
    match dotenvy::dotenv() {
        Ok(path) => tracing::debug!(path = %path.display(), "loaded .env"),
        Err(_) => apply_bundled_defaults(),
    }
}

#[cfg(target_arch = "wasm32")]
fn load_dotenv() {
    apply_bundled_defaults();
}

/// Fills in variables from `assets/config.env` that the environment lacks.
fn apply_bundled_defaults() {
    let missing: Vec<_> = parse_env_lines(BUNDLED_CONFIG)
        .filter(|(key, _)| env::var_os(key).is_none())
        .collect();
    for (key, value) in missing {
        // SAFETY: `from_env` runs in `main` before the UI or any runtime
        // starts another thread.
        unsafe { env::set_var(key, value) };
    }
}

fn parse_env_lines(source: &str) -> impl Iterator<Item = (&str, &str)> {
    source
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| line.split_once('='))
        .map(|(key, value)| (key.trim(), value.trim()))
}
