//! Reads the episode state the web application embeds in each page.

use crate::common::defs::*;
use crate::{Error, Result};
use scraper::{Html, Selector};
use serde_json::Value;
use std::sync::OnceLock;

/// Text under these parents never reaches the agent.
const IGNORED_PARENTS: [&str; 5] = ["style", "script", "head", "title", "meta"];
const HIDDEN_STYLE: &str = "display: none;";

fn instruction_selector() -> &'static Selector {
    static SEL: OnceLock<Selector> = OnceLock::new();
    SEL.get_or_init(|| Selector::parse("#instruction-text h4").expect("valid selector"))
}

fn best_products_selector() -> &'static Selector {
    static SEL: OnceLock<Selector> = OnceLock::new();
    SEL.get_or_init(|| Selector::parse("#best-products h4").expect("valid selector"))
}

fn reward_selector() -> &'static Selector {
    static SEL: OnceLock<Selector> = OnceLock::new();
    SEL.get_or_init(|| Selector::parse("#reward").expect("valid selector"))
}

fn pre_selector() -> &'static Selector {
    static SEL: OnceLock<Selector> = OnceLock::new();
    SEL.get_or_init(|| Selector::parse("pre").expect("valid selector"))
}

/// A parsed page of the shop.
pub struct Page {
    doc: Html,
}

impl Page {
    pub fn parse(html: &str) -> Self {
        Self {
            doc: Html::parse_document(html),
        }
    }

    /// The goal the agent is asked to fulfil in this episode.
    pub fn instruction_text(&self) -> Result<String> {
        self.heading_text(instruction_selector(), INSTRUCTION_TEXT_ID)
    }

    /// Products the site considers the best match for the instruction, as the
    /// raw JSON records it publishes.
    pub fn best_products(&self) -> Result<Vec<Value>> {
        let text = self.heading_text(best_products_selector(), BEST_PRODUCTS_ID)?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Score shown once the episode finished, `0.0` on every other page.
    pub fn reward(&self) -> Result<f64> {
        let Some(block) = self.doc.select(reward_selector()).next() else {
            return Ok(0.0);
        };
        let pre = block
            .select(pre_selector())
            .next()
            .ok_or(Error::MissingElement(REWARD_ID))?;
        let text = pre.text().collect::<String>();
        text.trim()
            .parse::<f64>()
            .map_err(|_| Error::Reward(text.trim().to_string()))
    }

    /// Human-visible strings of the page in document order.
    pub fn visible_texts(&self) -> Vec<String> {
        self.doc
            .tree
            .root()
            .descendants()
            .filter_map(|node| {
                let text = node.value().as_text()?;
                let parent = node.parent()?;
                let parent_el = parent.value().as_element()?;
                if IGNORED_PARENTS.contains(&parent_el.name()) {
                    return None;
                }
                let hidden = parent
                    .parent()
                    .and_then(|gp| gp.value().as_element())
                    .and_then(|el| el.attr("style"))
                    .is_some_and(|style| style == HIDDEN_STYLE);
                if hidden {
                    return None;
                }
                let trimmed = text.trim();
                (!trimmed.is_empty()).then(|| trimmed.to_string())
            })
            .collect()
    }

    fn heading_text(&self, selector: &Selector, id: &'static str) -> Result<String> {
        self.doc
            .select(selector)
            .next()
            .map(|el| el.text().collect::<String>())
            .ok_or(Error::MissingElement(id))
    }
}
