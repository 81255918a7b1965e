use crate::common::utils::{encode_png_base64, image_to_array};
use crate::Result;
use image::RgbImage;
use ndarray::Array3;
use serde::ser::{Error as _, SerializeStruct};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObservationMode {
    /// Raw page markup.
    #[default]
    Html,
    /// Visible strings of the page, joined with separators.
    Text,
}

/// Where the browser viewport sits on the page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrowserMetadata {
    pub url: String,
    pub x_offset: f64,
    pub y_offset: f64,
    pub width: f64,
    pub height: f64,
}

/// Everything an agent may look at after `reset` or `step`.
#[derive(Debug, Clone)]
pub struct Observation {
    pub mode: ObservationMode,
    pub html: String,
    /// Visible strings, only collected in [`ObservationMode::Text`].
    pub text: Option<Vec<String>>,
    pub instruction_text: String,
    pub best_products: Vec<Value>,
    /// Labels of the actions past the fixed ones, in action order.
    pub click_actions: Vec<String>,
    /// Current location with long segments elided.
    pub url: String,
    pub metadata: Option<BrowserMetadata>,
    pub screenshot: Option<RgbImage>,
}

impl Observation {
    pub const TEXT_SEPARATOR: &'static str = " [SEP] ";

    /// What the agent sees under the configured observation mode.
    pub fn content(&self) -> String {
        match (&self.mode, &self.text) {
            (ObservationMode::Text, Some(texts)) => texts.join(Self::TEXT_SEPARATOR),
            _ => self.html.clone(),
        }
    }

    pub fn screenshot_array(&self) -> Result<Option<Array3<u8>>> {
        self.screenshot.as_ref().map(image_to_array).transpose()
    }
}

impl Serialize for Observation {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let screenshot = self
            .screenshot
            .as_ref()
            .map(encode_png_base64)
            .transpose()
            .map_err(S::Error::custom)?;

        let mut s = serializer.serialize_struct("Observation", 9)?;
        s.serialize_field("mode", &self.mode)?;
        s.serialize_field("html", &self.html)?;
        s.serialize_field("text", &self.text)?;
        s.serialize_field("instruction_text", &self.instruction_text)?;
        s.serialize_field("best_products", &self.best_products)?;
        s.serialize_field("click_actions", &self.click_actions)?;
        s.serialize_field("url", &self.url)?;
        s.serialize_field("metadata", &self.metadata)?;
        s.serialize_field("screenshot", &screenshot)?;
        s.end()
    }
}
