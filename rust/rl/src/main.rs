use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, ValueEnum};
use serde_json::json;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use webshop_gym::*;

#[derive(Parser, Debug)]
#[command(name = "webshop-rl", version, about = "Run a policy against the WebShop app")]
struct Cli {
    /// TOML/YAML/JSON file with the environment configuration
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// Overrides `backend` from the configuration
    #[arg(long, value_enum)]
    backend: Option<BackendArg>,

    /// Overrides `base_url` from the configuration
    #[arg(long)]
    base_url: Option<String>,

    #[arg(long, default_value_t = 1)]
    episodes: usize,

    /// Steps after which an episode is cut short
    #[arg(long, default_value_t = 100)]
    max_steps: usize,

    /// Seeds both the session and the policy
    #[arg(long)]
    seed: Option<u64>,

    /// Append every step as a JSON line to this file
    #[arg(long)]
    dump: Option<PathBuf>,

    /// Open the playback window instead of running headless
    #[arg(long)]
    gui: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum BackendArg {
    Http,
    Browser,
}

impl From<BackendArg> for Backend {
    fn from(b: BackendArg) -> Self {
        match b {
            BackendArg::Http => Backend::Http,
            BackendArg::Browser => Backend::Browser,
        }
    }
}

impl Cli {
    fn env_config(&self) -> Result<EnvConfig> {
        let mut loader = ConfigLoader::new();
        if let Some(path) = &self.config {
            loader = loader.with_file(path);
        }
        let mut config = loader.load().context("loading configuration")?;
        self.apply_overrides(&mut config);
        Ok(config)
    }

    fn apply_overrides(&self, config: &mut EnvConfig) {
        if let Some(backend) = self.backend {
            config.backend = backend.into();
        }
        if let Some(base_url) = &self.base_url {
            config.base_url = base_url.clone();
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();
    let config = cli.env_config()?;
    info!(backend = ?config.backend, base_url = %config.base_url, "configuration loaded");

    let mut env = make_env(config)?;
    let policy = RandomPolicy::new(cli.seed);

    if cli.gui {
        return ui::WebShopApp::run(env, cli.seed, Box::new(policy)).context("viewer failed");
    }

    let mut dump = match &cli.dump {
        Some(path) => Some(BufWriter::new(
            File::create(path).with_context(|| format!("creating {}", path.display()))?,
        )),
        None => None,
    };

    let mut total = 0.;
    for episode in 0..cli.episodes {
        let (steps, ret) = run_episode(
            env.as_mut(),
            &policy,
            cli.seed,
            cli.max_steps,
            episode,
            dump.as_mut().map(|w| w as &mut dyn Write),
        )?;
        info!(episode, steps, episode_return = ret, "episode finished");
        total += ret;
    }

    if let Some(w) = dump.as_mut() {
        w.flush()?;
    }
    if cli.episodes > 0 {
        info!(
            episodes = cli.episodes,
            mean_return = total / cli.episodes as f64,
            "done"
        );
    }

    env.close()?;
    process::shutdown_all();
    Ok(())
}

fn run_episode(
    env: &mut dyn Environment,
    policy: &dyn Policy,
    seed: Option<u64>,
    max_steps: usize,
    episode: usize,
    mut dump: Option<&mut dyn Write>,
) -> Result<(usize, f64)> {
    let (mut observation, reset_info) = env.reset(seed)?;
    info!(episode, session = ?env.session(), "episode started");
    if let Some(w) = dump.as_mut() {
        let line = json!({
            "timestamp": Utc::now(),
            "episode": episode,
            "reset": reset_info,
            "observation": observation,
        });
        writeln!(w, "{line}")?;
    }

    let mut ret = 0.;
    for step in 0..max_steps {
        let action = policy.policy(&observation, env.action_count()?);
        let si = env.step(action)?;
        ret += si.reward;

        if let Some(w) = dump.as_mut() {
            let line = json!({
                "timestamp": Utc::now(),
                "episode": episode,
                "step": step,
                "action": action,
                "step_info": si,
            });
            writeln!(w, "{line}")?;
        }

        if si.done {
            return Ok((step + 1, ret));
        }
        observation = si.observation;
    }

    warn!(episode, max_steps, "episode truncated");
    Ok((max_steps, ret))
}
