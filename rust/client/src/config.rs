//! Environment configuration: file + inline snippets + `WEBSHOP__` env overrides.
//!
//! Every field has a default, so an empty source yields a usable config that
//! attaches to a shop already listening on `http://127.0.0.1:3000`.

use crate::common::defs::*;
use crate::{ObservationMode, Result};
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Plain HTTP requests, no browser and a blank screenshot.
    #[default]
    Http,
    /// A WebDriver-controlled headless Chrome.
    Browser,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvConfig {
    pub backend: Backend,
    pub observation_mode: ObservationMode,
    pub base_url: String,
    /// Fixed session id used by every reset.
    pub session: Option<String>,
    /// Seconds to sleep after each step. Handy for demos.
    pub pause: Option<f64>,
    /// Show the browser window. Not supported, window sizes would be wrong.
    pub render: bool,
    pub screenshots: bool,
    pub request_timeout_secs: u64,
    pub window: WindowConfig,
    pub session_params: SessionParams,
    /// How to launch the shop. `None` attaches to `base_url`.
    pub server: Option<LaunchConfig>,
    pub webdriver: WebDriverConfig,
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self {
            backend: Backend::default(),
            observation_mode: ObservationMode::default(),
            base_url: DEFAULT_BASE_URL.to_string(),
            session: None,
            pause: None,
            render: false,
            screenshots: true,
            request_timeout_secs: 30,
            window: WindowConfig::default(),
            session_params: SessionParams::default(),
            server: None,
            webdriver: WebDriverConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub width: u32,
    pub height: u32,
    pub scroll_amount: i64,
    /// Milliseconds a scroll gesture takes.
    pub scroll_time: u64,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: WINDOW_WIDTH,
            height: WINDOW_HEIGHT,
            scroll_amount: DEFAULT_SCROLL_AMOUNT,
            scroll_time: DEFAULT_SCROLL_TIME,
        }
    }
}

/// Query parameters the shop reads when an episode starts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionParams {
    pub return_n: Option<u32>,
    pub num_random: Option<u32>,
    pub seed: Option<u64>,
    pub shuffle_products: Option<bool>,
    pub episode_start: Option<u64>,
}

impl SessionParams {
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(v) = self.return_n {
            pairs.push(("return_n", v.to_string()));
        }
        if let Some(v) = self.num_random {
            pairs.push(("num_random", v.to_string()));
        }
        if let Some(v) = self.seed {
            pairs.push(("seed", v.to_string()));
        }
        if let Some(v) = self.shuffle_products {
            pairs.push(("shuffle_products", v.to_string()));
        }
        if let Some(v) = self.episode_start {
            pairs.push(("episode_start", v.to_string()));
        }
        pairs
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LaunchConfig {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: Option<PathBuf>,
    pub ready_timeout_secs: u64,
}

impl Default for LaunchConfig {
    fn default() -> Self {
        Self {
            program: "python".to_string(),
            args: vec!["-m".to_string(), "web_agent_site.app".to_string()],
            cwd: None,
            ready_timeout_secs: 60,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WebDriverConfig {
    pub url: String,
    /// Path to `chromedriver`. Looked up on `PATH` when unset.
    pub binary: Option<PathBuf>,
    /// Spawn the driver ourselves instead of expecting one at `url`.
    pub launch: bool,
    pub ready_timeout_secs: u64,
}

impl Default for WebDriverConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_WEBDRIVER_URL.to_string(),
            binary: None,
            launch: true,
            ready_timeout_secs: 30,
        }
    }
}

/// Builder hiding the `config` crate wiring.
pub struct ConfigLoader {
    builder: config::ConfigBuilder<config::builder::DefaultState>,
    env_prefix: Option<&'static str>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    pub const ENV_PREFIX: &'static str = "WEBSHOP";

    pub fn new() -> Self {
        Self {
            builder: Config::builder(),
            env_prefix: Some(Self::ENV_PREFIX),
        }
    }

    /// Skip `WEBSHOP__*` overrides, for callers that want a hermetic config.
    pub fn without_env(mut self) -> Self {
        self.env_prefix = None;
        self
    }

    /// TOML/YAML/JSON, inferred from the file suffix.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(true));
        self
    }

    pub fn with_toml_str(mut self, toml: &str) -> Self {
        self.builder = self.builder.add_source(File::from_str(toml, FileFormat::Toml));
        self
    }

    /// Environment overrides are applied last so they beat every file.
    pub fn load(self) -> Result<EnvConfig> {
        let mut builder = self.builder;
        if let Some(prefix) = self.env_prefix {
            builder = builder.add_source(
                Environment::with_prefix(prefix)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            );
        }
        Ok(builder.build()?.try_deserialize()?)
    }
}
