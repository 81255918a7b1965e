extern crate rand;
extern crate reqwest;
extern crate serde;
extern crate serde_json;

pub mod common;
pub mod config;
pub mod env;
pub mod error;
pub mod extract;
pub mod observation;
pub mod page;
pub mod policy;
pub mod process;
pub mod session;
pub mod ui;

pub use crate::config::{Backend, ConfigLoader, EnvConfig};
pub use crate::env::{
    browser::{BrowserAction, BrowserEnvironment},
    http::HttpEnvironment,
};
pub use crate::error::{Error, Result};
pub use crate::observation::{BrowserMetadata, Observation, ObservationMode};
pub use crate::policy::{Policy, RandomPolicy};

use image::RgbImage;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderMode {
    #[default]
    Human,
    RgbArray,
    Ansi,
}

#[derive(Debug)]
pub enum RenderFrame {
    Ansi(String),
    Rgb(RgbImage),
}

impl RenderFrame {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            RenderFrame::Ansi(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_rgb(&self) -> Option<&RgbImage> {
        match self {
            RenderFrame::Rgb(img) => Some(img),
            _ => None,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct StepInfo {
    pub observation: Observation,
    pub reward: f64,
    pub done: bool,
    pub info: Value,
}

/// Lifecycle shared by every shop backend, after the usual gym contract.
/// NOTE: All APIs are sync, the shop is expected to be local.
pub trait Environment {
    /// Start a new episode. A seed pins the session id to `fixed_<seed>`.
    fn reset(&mut self, seed: Option<u64>) -> Result<(Observation, Value)>;

    /// Take the action with the given index. Indices that map to nothing are
    /// logged and ignored.
    fn step(&mut self, action: usize) -> Result<StepInfo>;

    fn render(&mut self, mode: RenderMode) -> Result<RenderFrame>;

    fn close(&mut self) -> Result<()>;

    /// Number of valid action indices on the current page.
    fn action_count(&mut self) -> Result<usize>;

    fn session(&self) -> Option<&str>;
}

/// Build the backend `config` asks for, launching the shop first if configured.
pub fn make_env(config: EnvConfig) -> Result<Box<dyn Environment>> {
    if let Some(launch) = &config.server {
        process::ensure_web_app(launch, &config.base_url)?;
    }

    Ok(match config.backend {
        Backend::Http => Box::new(HttpEnvironment::new(config)?),
        Backend::Browser => Box::new(BrowserEnvironment::new(config)?),
    })
}
