//! Run configuration: defaults, an optional TOML file, then environment overrides.
//!
//! ```toml
//! data_dir = "data/kline_data"
//! base_url = "https://fapi.binance.com"
//! page_limit = 1500
//! page_delay_ms = 300
//!
//! [chart]
//! width = 1200
//! height = 720
//! ```
//!
//! Every key is optional. Unknown keys are rejected.
//!
//! Environment (blank values are ignored):
//! - `POSITION_CHART_CONFIG`: TOML file used when `--config` is not given
//! - `KLINE_DATA_DIR`: overrides `data_dir`
//! - `BINANCE_FAPI_URL`: overrides `base_url`

use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use kline_ingestor::{
    io::jsonl::{DEFAULT_DATA_DIR, JsonlKlineStore},
    providers::binance_rest::{
        BinanceRestProvider, BinanceRestSettings, DEFAULT_BASE_URL, DEFAULT_PAGE_DELAY,
        DEFAULT_PAGE_LIMIT,
    },
};
use serde::Deserialize;
use shared_utils::env::get_env_override;
use snafu::{ResultExt, ensure};

use crate::{
    errors::{
        ConfigError, EnvValueSnafu, ParseFileSnafu, PipelineError, ProviderInitSnafu,
        ReadFileSnafu, SettingSnafu,
    },
    render::ChartStyle,
};

pub const CONFIG_PATH_ENV: &str = "POSITION_CHART_CONFIG";
pub const DATA_DIR_ENV: &str = "KLINE_DATA_DIR";
pub const BASE_URL_ENV: &str = "BINANCE_FAPI_URL";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct ChartConfig {
    /// Root of the month-partitioned kline files.
    pub data_dir: PathBuf,
    pub base_url: String,
    /// Rows requested per page, at most 1500.
    pub page_limit: u32,
    /// Pause between page requests.
    pub page_delay_ms: u64,
    pub chart: ChartStyle,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            base_url: DEFAULT_BASE_URL.to_string(),
            page_limit: DEFAULT_PAGE_LIMIT,
            page_delay_ms: DEFAULT_PAGE_DELAY.as_millis() as u64,
            chart: ChartStyle::default(),
        }
    }
}

fn is_http_url(s: &str) -> bool {
    s.starts_with("http://") || s.starts_with("https://")
}

impl ChartConfig {
    /// Parses a TOML document; `origin` only labels errors.
    pub fn from_toml_str(toml_str: &str, origin: &Path) -> Result<Self, ConfigError> {
        toml::from_str(toml_str).context(ParseFileSnafu { path: origin })
    }

    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).context(ReadFileSnafu { path })?;
        Self::from_toml_str(&text, path)
    }

    /// Applies `KLINE_DATA_DIR` and `BINANCE_FAPI_URL` as returned by `lookup`.
    pub fn apply_env_with(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        if let Some(dir) = lookup(DATA_DIR_ENV) {
            self.data_dir = PathBuf::from(dir);
        }
        if let Some(url) = lookup(BASE_URL_ENV) {
            ensure!(
                is_http_url(&url),
                EnvValueSnafu {
                    key: BASE_URL_ENV,
                    value: url,
                    message: "expected an http:// or https:// URL",
                }
            );
            self.base_url = url;
        }
        Ok(self)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        ensure!(
            (1..=DEFAULT_PAGE_LIMIT).contains(&self.page_limit),
            SettingSnafu {
                field: "page_limit",
                message: format!("must be between 1 and {DEFAULT_PAGE_LIMIT}"),
            }
        );
        ensure!(
            is_http_url(&self.base_url),
            SettingSnafu {
                field: "base_url",
                message: "expected an http:// or https:// URL",
            }
        );
        ensure!(
            self.chart.width > 0 && self.chart.height > 0,
            SettingSnafu {
                field: "chart",
                message: "width and height must be positive",
            }
        );
        Ok(())
    }

    /// Layers defaults, the TOML file (`explicit`, else `POSITION_CHART_CONFIG`) and
    /// environment overrides, all read through `lookup`.
    pub fn load_with(
        explicit: Option<&Path>,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let file = explicit
            .map(Path::to_path_buf)
            .or_else(|| lookup(CONFIG_PATH_ENV).map(PathBuf::from));

        let base = match file {
            Some(path) => Self::from_path(&path)?,
            None => Self::default(),
        };
        let config = base.apply_env_with(lookup)?;
        config.validate()?;
        Ok(config)
    }

    /// [`load_with`](Self::load_with) over the process environment.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load_with(explicit, get_env_override)
    }

    pub fn provider_settings(&self) -> BinanceRestSettings {
        BinanceRestSettings {
            base_url: self.base_url.clone(),
            page_limit: self.page_limit,
            page_delay: Duration::from_millis(self.page_delay_ms),
        }
    }

    pub fn provider(&self) -> Result<BinanceRestProvider, PipelineError> {
        BinanceRestProvider::new(self.provider_settings()).context(ProviderInitSnafu)
    }

    pub fn store(&self) -> JsonlKlineStore {
        JsonlKlineStore::new(&self.data_dir)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use proptest::prelude::*;
    use tempfile::TempDir;

    use super::*;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_without_file_or_env() {
        let cfg = ChartConfig::load_with(None, env(&[])).unwrap();
        assert_eq!(cfg, ChartConfig::default());
        assert_eq!(cfg.data_dir, PathBuf::from("data/kline_data"));
        assert_eq!(cfg.page_limit, 1500);
        assert_eq!(cfg.page_delay_ms, 300);
        assert_eq!((cfg.chart.width, cfg.chart.height), (1200, 720));
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let cfg = ChartConfig::from_toml_str(
            "page_delay_ms = 0\n[chart]\nwidth = 800\n",
            Path::new("inline.toml"),
        )
        .unwrap();
        assert_eq!(cfg.page_delay_ms, 0);
        assert_eq!(cfg.chart.width, 800);
        assert_eq!(cfg.chart.height, 720);
        assert_eq!(cfg.base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = ChartConfig::from_toml_str("page_size = 10\n", Path::new("inline.toml"))
            .unwrap_err();
        assert!(matches!(err, ConfigError::ParseFile { .. }));

        let err = ChartConfig::from_toml_str("[chart]\ndpi = 2\n", Path::new("inline.toml"))
            .unwrap_err();
        assert!(matches!(err, ConfigError::ParseFile { .. }));
    }

    #[test]
    fn env_overrides_file() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("chart.toml");
        fs::write(&file, "data_dir = \"from/file\"\nbase_url = \"http://file\"\n").unwrap();

        let cfg = ChartConfig::load_with(
            None,
            env(&[
                (CONFIG_PATH_ENV, file.to_str().unwrap()),
                (DATA_DIR_ENV, "from/env"),
            ]),
        )
        .unwrap();
        assert_eq!(cfg.data_dir, PathBuf::from("from/env"));
        assert_eq!(cfg.base_url, "http://file");
    }

    #[test]
    fn explicit_path_wins_over_env_path() {
        let dir = TempDir::new().unwrap();
        let explicit = dir.path().join("a.toml");
        fs::write(&explicit, "page_limit = 10\n").unwrap();

        let cfg = ChartConfig::load_with(
            Some(&explicit),
            env(&[(CONFIG_PATH_ENV, "/does/not/exist.toml")]),
        )
        .unwrap();
        assert_eq!(cfg.page_limit, 10);
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let err = ChartConfig::load_with(Some(Path::new("/does/not/exist.toml")), env(&[]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::ReadFile { .. }));
    }

    #[test]
    fn bad_env_url_is_rejected() {
        let err = ChartConfig::load_with(None, env(&[(BASE_URL_ENV, "fapi.binance.com")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::EnvValue { .. }));
    }

    #[test]
    fn settings_follow_config() {
        let cfg = ChartConfig {
            page_delay_ms: 0,
            ..Default::default()
        };
        let settings = cfg.provider_settings();
        assert!(settings.page_delay.is_zero());
        assert_eq!(settings.page_limit, 1500);
        assert!(cfg.provider().is_ok());
        assert_eq!(cfg.store().root(), Path::new("data/kline_data"));
    }

    proptest! {
        #[test]
        fn page_limit_bounds(limit in 0u32..3000) {
            let cfg = ChartConfig { page_limit: limit, ..Default::default() };
            prop_assert_eq!(cfg.validate().is_ok(), (1..=1500).contains(&limit));
        }
    }
}
