//! The at-most-one web application and WebDriver processes shared by every
//! environment in this process.

use crate::config::{LaunchConfig, WebDriverConfig};
use crate::{Error, Result};
use std::process::{Child, Command, Stdio};
use std::sync::{Mutex, MutexGuard};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use url::Url;

const READY_POLL_INTERVAL: Duration = Duration::from_millis(250);

static WEB_APP: Mutex<Option<ManagedProcess>> = Mutex::new(None);
static WEB_DRIVER: Mutex<Option<ManagedProcess>> = Mutex::new(None);

/// A child process that is killed when dropped.
#[derive(Debug)]
pub struct ManagedProcess {
    name: String,
    child: Child,
}

impl ManagedProcess {
    pub fn spawn(name: &str, command: &mut Command) -> Result<Self> {
        let child = command.stdin(Stdio::null()).spawn()?;
        info!(process = name, pid = child.id(), "spawned process");

        Ok(Self {
            name: name.to_string(),
            child,
        })
    }

    pub fn id(&self) -> u32 {
        self.child.id()
    }

    pub fn is_running(&mut self) -> bool {
        matches!(self.child.try_wait(), Ok(None))
    }

    pub fn kill(&mut self) {
        if self.is_running() {
            if let Err(e) = self.child.kill() {
                warn!(process = %self.name, "failed to kill process: {e}");
            }
        }
        let _ = self.child.wait();
    }
}

impl Drop for ManagedProcess {
    fn drop(&mut self) {
        self.kill();
    }
}

/// Start the shop unless this process already did. Waits until `base_url` answers.
pub fn ensure_web_app(launch: &LaunchConfig, base_url: &str) -> Result<()> {
    let mut command = Command::new(&launch.program);
    command.args(&launch.args);
    if let Some(cwd) = &launch.cwd {
        command.current_dir(cwd);
    }

    ensure_running(
        &WEB_APP,
        "web app",
        &mut command,
        base_url,
        Duration::from_secs(launch.ready_timeout_secs),
    )
}

/// Start `chromedriver` on the port of `webdriver.url` unless it is already up.
pub fn ensure_web_driver(webdriver: &WebDriverConfig) -> Result<()> {
    let url = Url::parse(&webdriver.url)?;
    let port = url
        .port_or_known_default()
        .ok_or_else(|| Error::Unsupported(format!("no port in '{}'", webdriver.url)))?;
    let binary = match &webdriver.binary {
        Some(path) => path.clone(),
        None => which::which("chromedriver")
            .map_err(|e| Error::Unsupported(format!("chromedriver not found: {e}")))?,
    };

    let mut command = Command::new(binary);
    command.arg(format!("--port={port}"));

    let status_url = url.join("status")?;
    ensure_running(
        &WEB_DRIVER,
        "chromedriver",
        &mut command,
        status_url.as_str(),
        Duration::from_secs(webdriver.ready_timeout_secs),
    )
}

/// Stop both singletons if they were started here.
pub fn shutdown_all() {
    for slot in [&WEB_APP, &WEB_DRIVER] {
        if let Some(mut process) = lock(slot).take() {
            info!(process = %process.name, "stopping process");
            process.kill();
        }
    }
}

/// Pid of the web app started by this process, if it is held.
pub fn web_app_pid() -> Option<u32> {
    lock(&WEB_APP).as_ref().map(ManagedProcess::id)
}

pub fn web_driver_pid() -> Option<u32> {
    lock(&WEB_DRIVER).as_ref().map(ManagedProcess::id)
}

fn ensure_running(
    slot: &Mutex<Option<ManagedProcess>>,
    name: &str,
    command: &mut Command,
    ready_url: &str,
    timeout: Duration,
) -> Result<()> {
    let mut guard = lock(slot);

    if let Some(process) = guard.as_mut() {
        if process.is_running() {
            debug!(process = name, pid = process.id(), "process already running");
            return Ok(());
        }
        warn!(process = name, "process exited, restarting");
        *guard = None;
    }

    // only a process that answered takes the slot, a failed one is killed on drop
    let process = ManagedProcess::spawn(name, command)?;
    wait_until_ready(name, ready_url, timeout)?;
    *guard = Some(process);
    Ok(())
}

/// Poll `url` until anything answers. Status codes do not matter, only that a
/// server is listening.
pub fn wait_until_ready(name: &str, url: &str, timeout: Duration) -> Result<()> {
    let client = reqwest::blocking::Client::builder()
        .timeout(READY_POLL_INTERVAL * 4)
        .build()?;
    let deadline = Instant::now() + timeout;

    loop {
        match client.get(url).send() {
            Ok(res) => {
                info!(process = name, status = %res.status(), "process is ready");
                return Ok(());
            }
            Err(e) => debug!(process = name, "not ready yet: {e}"),
        }

        if Instant::now() >= deadline {
            return Err(Error::ProcessTimeout {
                name: name.to_string(),
                url: url.to_string(),
            });
        }
        thread::sleep(READY_POLL_INTERVAL);
    }
}

fn lock(slot: &Mutex<Option<ManagedProcess>>) -> MutexGuard<'_, Option<ManagedProcess>> {
    slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
