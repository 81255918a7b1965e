use super::ansi_frame;
use crate::common::defs::*;
use crate::common::utils::decode_png;
use crate::config::WindowConfig;
use crate::extract::clean_url;
use crate::page::Page;
use crate::session::{resolve_session_id, session_url};
use crate::*;
use fantoccini::elements::Element;
use fantoccini::error::{CmdError, ErrorStatus};
use fantoccini::{Client, ClientBuilder, Locator};
use image::RgbImage;
use serde_json::{json, Map, Value};
use std::thread;
use std::time::Duration;
use tokio::runtime::Runtime;
use tracing::{debug, info, warn};

/// Actions before the first clickable.
const FIXED_ACTIONS: usize = 4;
const FIXED_ACTION_LABELS: [&str; FIXED_ACTIONS] = ["search", "scroll down", "scroll up", "done"];

/// What an action index does in the browser.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrowserAction {
    /// Type the instruction into the search box.
    Search,
    ScrollDown,
    ScrollUp,
    Done,
    /// Click the clickable at this position.
    Click(usize),
    /// Nothing maps to the index.
    Invalid,
}

impl BrowserAction {
    pub fn from_index(action: usize, clickables: usize) -> Self {
        match action {
            0 => Self::Search,
            1 => Self::ScrollDown,
            2 => Self::ScrollUp,
            3 => Self::Done,
            n if n - FIXED_ACTIONS < clickables => Self::Click(n - FIXED_ACTIONS),
            _ => Self::Invalid,
        }
    }

    /// Number of valid indices with `clickables` elements in view.
    pub fn count(clickables: usize) -> usize {
        FIXED_ACTIONS + clickables
    }
}

const IN_VIEWPORT_JS: &str = r#"
    var rect = arguments[0].getBoundingClientRect();
    return (
        rect.top >= 0 &&
        rect.left >= 0 &&
        rect.bottom <= (window.innerHeight || document.documentElement.clientHeight) &&
        rect.right <= (window.innerWidth || document.documentElement.clientWidth)
    );
"#;
const SCROLL_JS: &str = "window.scrollBy({ top: arguments[0], left: 0, behavior: 'smooth' });";
const FORCE_CLICK_JS: &str = "arguments[0].click();";

/// Drives the shop through a headless Chrome. Actions are browser gestures
/// followed by the clickable elements currently inside the viewport.
///
/// Every call blocks on a private runtime, so this type must not be used from
/// within another async runtime.
pub struct BrowserEnvironment {
    config: EnvConfig,
    runtime: Runtime,
    client: Option<Client>,
    session: Option<String>,
    instruction_text: String,
    best_products: Vec<Value>,
}

impl BrowserEnvironment {
    pub fn new(config: EnvConfig) -> Result<Self> {
        if config.render {
            return Err(Error::Unsupported(
                "rendering a visible browser would result in invalid window sizes".to_string(),
            ));
        }
        if config.webdriver.launch {
            process::ensure_web_driver(&config.webdriver)?;
        }

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .enable_all()
            .build()?;

        let mut caps = Map::new();
        caps.insert(
            "goog:chromeOptions".to_string(),
            json!({ "args": chrome_args(&config.window) }),
        );
        let client = runtime.block_on(async {
            ClientBuilder::native()
                .capabilities(caps)
                .connect(&config.webdriver.url)
                .await
        })?;
        info!(url = %config.webdriver.url, "connected to WebDriver");

        Ok(Self {
            config,
            runtime,
            client: Some(client),
            session: None,
            instruction_text: String::new(),
            best_products: Vec::new(),
        })
    }

    /// Current viewport as RGB. Frames are not colour-managed: an embedded ICC
    /// profile is ignored rather than converted to sRGB.
    pub fn screenshot(&self) -> Result<RgbImage> {
        let client = self.client()?;
        let png = self.runtime.block_on(client.screenshot())?;
        decode_png(&png)
    }

    pub fn metadata(&self) -> Result<BrowserMetadata> {
        let client = self.client()?;
        self.runtime.block_on(metadata(client))
    }

    /// Labels of the clickables, action `4 + i` clicks entry `i`.
    pub fn available_click_actions(&self) -> Result<Vec<String>> {
        let client = self.client()?;
        self.runtime.block_on(async {
            let mut labels = Vec::new();
            for el in clickables(client).await? {
                labels.push(el.text().await?);
            }
            Ok(labels)
        })
    }

    fn client(&self) -> Result<&Client> {
        self.client
            .as_ref()
            .ok_or_else(|| Error::Unsupported("the browser was already closed".to_string()))
    }

    fn observe(&self) -> Result<(Observation, f64)> {
        let client = self.client()?;
        let html = self.runtime.block_on(client.source())?;
        let metadata = self.metadata()?;
        let click_actions = self.available_click_actions()?;
        let screenshot = match self.config.screenshots {
            true => Some(self.screenshot()?),
            false => None,
        };

        let page = Page::parse(&html);
        let text = match self.config.observation_mode {
            ObservationMode::Text => Some(page.visible_texts()),
            ObservationMode::Html => None,
        };
        let reward = page.reward()?;

        let observation = Observation {
            mode: self.config.observation_mode,
            text,
            instruction_text: self.instruction_text.clone(),
            best_products: self.best_products.clone(),
            click_actions,
            url: clean_url(&relative_location(&metadata.url)),
            metadata: Some(metadata),
            screenshot,
            html,
        };

        Ok((observation, reward))
    }

    fn pause(&self) {
        if let Some(secs) = self.config.pause {
            thread::sleep(Duration::from_secs_f64(secs));
        }
    }
}

impl Environment for BrowserEnvironment {
    fn reset(&mut self, seed: Option<u64>) -> Result<(Observation, Value)> {
        let session = resolve_session_id(self.config.session.as_deref(), seed);
        let mut params = self.config.session_params.clone();
        if seed.is_some() {
            params.seed = seed;
        }
        let url = session_url(&self.config.base_url, &session, &params)?;
        info!(%session, "starting episode");

        let client = self.client()?;
        let html = self.runtime.block_on(async {
            client.goto(url.as_str()).await?;
            client.source().await
        })?;
        let page = Page::parse(&html);
        let instruction_text = page.instruction_text()?;
        let best_products = page.best_products()?;

        self.instruction_text = instruction_text;
        self.best_products = best_products;

        let info = json!({ "session": session, "url": url.as_str() });
        self.session = Some(session);
        let (observation, _) = self.observe()?;

        Ok((observation, info))
    }

    fn step(&mut self, action: usize) -> Result<StepInfo> {
        let client = self.client()?;
        let window = &self.config.window;
        let instruction = self.instruction_text.as_str();
        let mut done = false;

        self.runtime.block_on(async {
            let clickables = clickables(client).await?;
            match BrowserAction::from_index(action, clickables.len()) {
                BrowserAction::Search => type_instruction(client, instruction).await,
                BrowserAction::ScrollDown => scroll(client, window, false).await?,
                BrowserAction::ScrollUp => scroll(client, window, true).await?,
                BrowserAction::Done => done = true,
                BrowserAction::Click(i) => click(client, &clickables[i]).await?,
                BrowserAction::Invalid => warn!(
                    action,
                    available = clickables.len(),
                    "invalid action, no action performed"
                ),
            }
            Ok::<_, Error>(())
        })?;

        self.pause();
        let (observation, reward) = self.observe()?;

        Ok(StepInfo {
            observation,
            reward,
            done,
            info: Value::Null,
        })
    }

    fn render(&mut self, mode: RenderMode) -> Result<RenderFrame> {
        Ok(match mode {
            RenderMode::Human | RenderMode::RgbArray => RenderFrame::Rgb(self.screenshot()?),
            RenderMode::Ansi => {
                let metadata = self.metadata()?;
                let mut labels: Vec<String> =
                    FIXED_ACTION_LABELS.iter().map(|l| l.to_string()).collect();
                labels.extend(self.available_click_actions()?);
                RenderFrame::Ansi(ansi_frame(
                    &clean_url(&relative_location(&metadata.url)),
                    &self.instruction_text,
                    &labels,
                ))
            }
        })
    }

    fn close(&mut self) -> Result<()> {
        if let Some(client) = self.client.take() {
            self.runtime.block_on(client.close())?;
            info!("Browser closed.");
        }
        Ok(())
    }

    fn action_count(&mut self) -> Result<usize> {
        let client = self.client()?;
        let clickables = self.runtime.block_on(clickables(client))?;
        Ok(BrowserAction::count(clickables.len()))
    }

    fn session(&self) -> Option<&str> {
        self.session.as_deref()
    }
}

impl Drop for BrowserEnvironment {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            warn!("failed to close the browser: {e}");
        }
    }
}

fn chrome_args(window: &WindowConfig) -> Vec<String> {
    vec![
        format!("window-size={},{}", window.width, window.height),
        "--force-device-scale-factor=1".to_string(),
        "headless".to_string(),
        "disable-gpu".to_string(),
        "no-sandbox".to_string(),
    ]
}

/// Path and query of an absolute url, or the input when it does not parse.
fn relative_location(url: &str) -> String {
    match url::Url::parse(url) {
        Ok(u) => match u.query() {
            Some(q) => format!("{}?{q}", u.path()),
            None => u.path().to_string(),
        },
        Err(_) => url.to_string(),
    }
}

/// Buttons then product links, keeping only those fully inside the viewport.
async fn clickables(client: &Client) -> Result<Vec<Element>> {
    let mut candidates = client.find_all(Locator::Css(BUTTON_SELECTOR)).await?;
    candidates.extend(client.find_all(Locator::Css(PRODUCT_LINK_SELECTOR)).await?);

    let mut visible = Vec::with_capacity(candidates.len());
    for el in candidates {
        let in_viewport = client
            .execute(IN_VIEWPORT_JS, vec![serde_json::to_value(&el)?])
            .await?;
        if in_viewport.as_bool().unwrap_or(false) {
            visible.push(el);
        }
    }
    Ok(visible)
}

async fn type_instruction(client: &Client, instruction: &str) {
    let typed = async {
        let input = client.find(Locator::Id(SEARCH_INPUT_ID)).await?;
        input.send_keys(instruction).await?;
        Ok::<_, CmdError>(())
    };
    if let Err(e) = typed.await {
        debug!("search input unavailable: {e}");
    }
}

async fn scroll(client: &Client, window: &WindowConfig, up: bool) -> Result<()> {
    let delta = if up {
        -window.scroll_amount
    } else {
        window.scroll_amount
    };
    client.execute(SCROLL_JS, vec![json!(delta)]).await?;
    tokio::time::sleep(Duration::from_millis(window.scroll_time)).await;
    Ok(())
}

async fn click(client: &Client, el: &Element) -> Result<()> {
    match el.click().await {
        Ok(_) => Ok(()),
        Err(e) if is_not_interactable(&e) => {
            debug!("element not interactable, clicking from script");
            client
                .execute(FORCE_CLICK_JS, vec![serde_json::to_value(el)?])
                .await?;
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

fn is_not_interactable(e: &CmdError) -> bool {
    matches!(e, CmdError::Standard(wd) if wd.error == ErrorStatus::ElementNotInteractable)
}

async fn metadata(client: &Client) -> Result<BrowserMetadata> {
    Ok(BrowserMetadata {
        url: client.current_url().await?.to_string(),
        y_offset: eval_f64(client, "return window.pageYOffset;").await?,
        x_offset: eval_f64(client, "return window.pageXOffset;").await?,
        height: eval_f64(client, "return window.innerHeight;").await?,
        width: eval_f64(client, "return window.innerWidth;").await?,
    })
}

async fn eval_f64(client: &Client, script: &str) -> Result<f64> {
    Ok(client.execute(script, vec![]).await?.as_f64().unwrap_or_default())
}
