use super::ansi_frame;
use crate::common::utils::blank_screenshot;
use crate::extract::{clean_url, click_urls};
use crate::page::Page;
use crate::session::{resolve_session_id, session_url};
use crate::*;
use image::RgbImage;
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use serde_json::{json, Value};
use std::thread;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

const NOOP_ACTION: usize = 0;

/// Navigates the shop by requesting the urls found in each page, without a
/// browser. Action `0` is a no-op and action `i` follows the `i`-th url.
#[derive(Debug)]
pub struct HttpEnvironment {
    config: EnvConfig,
    base_url: Url,
    client: Client,
    session: Option<String>,
    page_source: Option<String>,
    cur_state: String,
    instruction_text: String,
    best_products: Vec<Value>,
}

impl HttpEnvironment {
    pub fn new(config: EnvConfig) -> Result<Self> {
        let base_url = Url::parse(&config.base_url)?;
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Self {
            config,
            base_url,
            client,
            session: None,
            page_source: None,
            cur_state: String::new(),
            instruction_text: String::new(),
            best_products: Vec::new(),
        })
    }

    pub fn page_source(&self) -> Option<&str> {
        self.page_source.as_deref()
    }

    /// Targets reachable from the current page, action `i` maps to entry `i - 1`.
    pub fn available_click_urls(&self) -> Result<Vec<String>> {
        Ok(click_urls(self.page()?))
    }

    pub fn screenshot(&self) -> RgbImage {
        blank_screenshot(self.config.window.width, self.config.window.height)
    }

    fn page(&self) -> Result<&str> {
        self.page_source.as_deref().ok_or(Error::NotReset)
    }

    fn observe(&self) -> Result<(Observation, f64)> {
        let html = self.page()?;
        let page = Page::parse(html);
        let text = match self.config.observation_mode {
            ObservationMode::Text => Some(page.visible_texts()),
            ObservationMode::Html => None,
        };
        let reward = page.reward()?;

        let observation = Observation {
            mode: self.config.observation_mode,
            html: html.to_string(),
            text,
            instruction_text: self.instruction_text.clone(),
            best_products: self.best_products.clone(),
            click_actions: click_urls(html),
            url: self.cur_state.clone(),
            metadata: None,
            screenshot: self.config.screenshots.then(|| self.screenshot()),
        };

        Ok((observation, reward))
    }

    fn http_get(&self, url: &Url) -> Result<String> {
        debug!(%url, "fetching page");
        let res = self
            .client
            .get(url.clone())
            .headers(Self::construct_common_headers())
            .send()?;
        if !res.status().is_success() {
            warn!(%url, status = %res.status(), "shop answered with an error page");
        }
        Ok(res.text()?)
    }

    fn construct_common_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("text/html"));
        headers
    }

    fn pause(&self) {
        if let Some(secs) = self.config.pause {
            thread::sleep(Duration::from_secs_f64(secs));
        }
    }
}

impl Environment for HttpEnvironment {
    fn reset(&mut self, seed: Option<u64>) -> Result<(Observation, Value)> {
        let session = resolve_session_id(self.config.session.as_deref(), seed);
        let mut params = self.config.session_params.clone();
        if seed.is_some() {
            params.seed = seed;
        }
        let url = session_url(self.base_url.as_str(), &session, &params)?;
        info!(%session, "starting episode");

        let html = self.http_get(&url)?;
        let page = Page::parse(&html);
        let instruction_text = page.instruction_text()?;
        let best_products = page.best_products()?;

        self.instruction_text = instruction_text;
        self.best_products = best_products;
        self.page_source = Some(html);
        self.cur_state = clean_url(&format!("/{session}"));

        let info = json!({ "session": session, "url": url.as_str() });
        self.session = Some(session);
        let (observation, _) = self.observe()?;

        Ok((observation, info))
    }

    fn step(&mut self, action: usize) -> Result<StepInfo> {
        let urls = self.available_click_urls()?;

        if action == NOOP_ACTION {
            debug!("no-op action");
        } else if action > urls.len() {
            warn!(action, available = urls.len(), "invalid action, no action performed");
        } else {
            let target = &urls[action - 1];
            let url = self.base_url.join(target)?;
            self.page_source = Some(self.http_get(&url)?);
            self.cur_state = clean_url(target);
        }

        self.pause();
        let (observation, reward) = self.observe()?;

        Ok(StepInfo {
            observation,
            reward,
            done: false,
            info: Value::Null,
        })
    }

    fn render(&mut self, mode: RenderMode) -> Result<RenderFrame> {
        Ok(match mode {
            RenderMode::Human | RenderMode::RgbArray => RenderFrame::Rgb(self.screenshot()),
            RenderMode::Ansi => {
                let mut labels = vec!["(no-op)".to_string()];
                labels.extend(self.available_click_urls()?.iter().map(|u| clean_url(u)));
                RenderFrame::Ansi(ansi_frame(&self.cur_state, &self.instruction_text, &labels))
            }
        })
    }

    fn close(&mut self) -> Result<()> {
        info!(session = ?self.session, "environment closed");
        self.page_source = None;
        Ok(())
    }

    fn action_count(&mut self) -> Result<usize> {
        Ok(self.available_click_urls()?.len() + 1)
    }

    fn session(&self) -> Option<&str> {
        self.session.as_deref()
    }
}
