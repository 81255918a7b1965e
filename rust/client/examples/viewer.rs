extern crate webshop_gym;

use webshop_gym::*;

// NOTE: Set WEBSHOP__BACKEND=browser to watch real screenshots.

fn main() -> ui::Result {
    let config = ConfigLoader::new()
        .load()
        .unwrap_or_else(|e| panic!("bad configuration: {e}"));
    let env = make_env(config).unwrap_or_else(|e| panic!("cannot create environment: {e}"));

    ui::WebShopApp::run(env, None, Box::new(RandomPolicy::new(None)))
}
