pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:3000";
pub const DEFAULT_WEBDRIVER_URL: &str = "http://localhost:9515";

pub const WINDOW_WIDTH: u32 = 960;
pub const WINDOW_HEIGHT: u32 = 540;
pub const DEFAULT_SCROLL_AMOUNT: i64 = 180;
pub const DEFAULT_SCROLL_TIME: u64 = 150;

/// Length of generated session ids.
pub const SESSION_ID_LEN: usize = 5;

pub const INSTRUCTION_TEXT_ID: &str = "instruction-text";
pub const BEST_PRODUCTS_ID: &str = "best-products";
pub const REWARD_ID: &str = "reward";
pub const SEARCH_INPUT_ID: &str = "search_input";

pub const BUTTON_SELECTOR: &str = ".btn";
pub const PRODUCT_LINK_SELECTOR: &str = ".product-link";
