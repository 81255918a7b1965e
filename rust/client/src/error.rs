use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("WebDriver command failed: {0}")]
    WebDriver(#[from] fantoccini::error::CmdError),

    #[error("Could not open a WebDriver session: {0}")]
    WebDriverSession(#[from] fantoccini::error::NewSessionError),

    #[error("Page has no '{0}' element")]
    MissingElement(&'static str),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Reward '{0}' is not a number")]
    Reward(String),

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("Image decoding failed: {0}")]
    Image(#[from] image::ImageError),

    #[error("Invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("Frame has unexpected shape: {0}")]
    Shape(#[from] ndarray::ShapeError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Not supported: {0}")]
    Unsupported(String),

    #[error("'{name}' did not answer on {url} in time")]
    ProcessTimeout { name: String, url: String },

    #[error("Environment has no page loaded, call reset first")]
    NotReset,
}
