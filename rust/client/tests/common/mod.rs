#![allow(dead_code)]

use tokio::runtime::Runtime;
use webshop_gym::*;
use wiremock::matchers::{method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const SESSION: &str = "fixed_7";
pub const INSTRUCTION: &str = "Instruction: i need a red shirt";

pub const HOME_PAGE: &str = r#"<!DOCTYPE html>
<html>
<head><title>WebShop</title><style>body { margin: 0; }</style></head>
<body>
<div id="instruction-text"><h4>Instruction: i need a red shirt</h4></div>
<div id="best-products"><h4>[{"asin": "B01", "name": "Red Shirt"}]</h4></div>
<form action="/search_results/fixed_7/red-shirt/1" method="post">
  <input id="search_input" name="search_query" type="text">
  <button type="submit" class="btn">Search</button>
</form>
<a class="product-link" href="/item_page/fixed_7/B01">Red Shirt</a>
<a class="product-link" href="https://elsewhere.example/B02">Elsewhere</a>
<div><p style="display: none;"><span>hidden promo</span></p></div>
<script>var tracking = 1;</script>
</body>
</html>"#;

pub const ITEM_PAGE: &str = r#"<!DOCTYPE html>
<html>
<body>
<div id="instruction-text"><h4>Instruction: i need a red shirt</h4></div>
<h2>Red Shirt</h2>
<form action="/done/fixed_7/B01" method="post">
  <button type="submit" class="btn">Buy Now</button>
</form>
</body>
</html>"#;

pub const DONE_PAGE: &str = r#"<!DOCTYPE html>
<html>
<body>
<h1>Thank you for shopping with us!</h1>
<div id="reward"><h3>Your score (min 0.0, max 1.0)</h3><pre>0.75</pre></div>
</body>
</html>"#;

/// A stand-in shop serving fixed pages. The server is declared before the
/// runtime so it shuts down while the runtime is still alive.
pub struct Shop {
    pub server: MockServer,
    rt: Runtime,
}

impl Shop {
    pub fn start() -> Self {
        let rt = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .enable_all()
            .build()
            .unwrap();
        let server = rt.block_on(MockServer::start());

        Self { server, rt }
    }

    /// Home, item and done pages of the `fixed_7` session.
    pub fn with_episode() -> Self {
        let shop = Self::start();
        shop.page(&format!("/{SESSION}"), HOME_PAGE);
        shop.page("/item_page/fixed_7/B01", ITEM_PAGE);
        shop.page("/done/fixed_7/B01", DONE_PAGE);
        shop.page("/search_results/fixed_7/red-shirt/1", ITEM_PAGE);
        shop
    }

    pub fn page(&self, at: &str, body: &str) {
        self.mount(
            Mock::given(method("GET"))
                .and(path(at))
                .respond_with(html_response(body)),
        );
    }

    pub fn page_matching(&self, pattern: &str, body: &str) {
        self.mount(
            Mock::given(method("GET"))
                .and(path_regex(pattern))
                .respond_with(html_response(body)),
        );
    }

    pub fn uri(&self) -> String {
        self.server.uri()
    }

    /// Paths the shop was asked for, in order.
    pub fn requested_paths(&self) -> Vec<String> {
        self.rt
            .block_on(self.server.received_requests())
            .unwrap_or_default()
            .iter()
            .map(|r| r.url.path().to_string())
            .collect()
    }

    /// Query strings the shop was asked with, in order.
    pub fn requested_queries(&self) -> Vec<String> {
        self.rt
            .block_on(self.server.received_requests())
            .unwrap_or_default()
            .iter()
            .map(|r| r.url.query().unwrap_or_default().to_string())
            .collect()
    }

    fn mount(&self, mock: Mock) {
        self.rt.block_on(mock.mount(&self.server));
    }
}

fn html_response(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body.to_string(), "text/html; charset=utf-8")
}

pub fn http_config(base_url: &str) -> EnvConfig {
    EnvConfig {
        base_url: base_url.to_string(),
        ..EnvConfig::default()
    }
}

pub fn observation(html: &str) -> Observation {
    Observation {
        mode: ObservationMode::Html,
        html: html.to_string(),
        text: None,
        instruction_text: INSTRUCTION.to_string(),
        best_products: vec![],
        click_actions: vec![],
        url: format!("/{SESSION}"),
        metadata: None,
        screenshot: None,
    }
}
