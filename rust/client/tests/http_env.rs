extern crate webshop_gym;
mod common;

use assertor::*;
use common::*;
use float_eq::*;
use webshop_gym::*;

fn reset_env(shop: &Shop) -> (HttpEnvironment, Observation, serde_json::Value) {
    let mut env = HttpEnvironment::new(http_config(&shop.uri())).unwrap();
    let (observation, info) = env.reset(Some(7)).unwrap();
    (env, observation, info)
}

#[test]
fn reset_reads_the_episode() {
    let shop = Shop::with_episode();
    let (env, observation, info) = reset_env(&shop);

    assert_eq!(env.session(), Some(SESSION));
    assert_eq!(info["session"], SESSION);
    assert!(info["url"].as_str().unwrap().ends_with("/fixed_7?seed=7"));
    assert_eq!(shop.requested_queries(), vec!["seed=7"]);

    assert_eq!(observation.instruction_text, INSTRUCTION);
    assert_eq!(observation.best_products[0]["asin"], "B01");
    assert_eq!(observation.url, "/fixed_7");
    assert_eq!(observation.html, HOME_PAGE);
    assert_eq!(
        observation.click_actions,
        vec!["/search_results/fixed_7/red-shirt/1", "/item_page/fixed_7/B01"]
    );
    assert!(observation.text.is_none());
    assert!(observation.metadata.is_none());
}

#[test]
fn screenshot_is_a_blank_page() {
    let shop = Shop::with_episode();
    let (_, observation, _) = reset_env(&shop);

    let screenshot = observation.screenshot.unwrap();
    assert_eq!(screenshot.dimensions(), (960, 540));
    assert!(screenshot.pixels().all(|p| p.0 == [255, 255, 255]));
}

#[test]
fn screenshots_can_be_disabled() {
    let shop = Shop::with_episode();
    let config = EnvConfig {
        screenshots: false,
        ..http_config(&shop.uri())
    };
    let mut env = HttpEnvironment::new(config).unwrap();

    let (observation, _) = env.reset(Some(7)).unwrap();

    assert!(observation.screenshot.is_none());
}

#[test]
fn assigned_session_wins_over_seed() {
    let shop = Shop::start();
    shop.page("/abc", HOME_PAGE);
    let config = EnvConfig {
        session: Some("abc".to_string()),
        ..http_config(&shop.uri())
    };
    let mut env = HttpEnvironment::new(config).unwrap();

    let (_, info) = env.reset(Some(9)).unwrap();

    assert_eq!(info["session"], "abc");
    assert_eq!(shop.requested_paths(), vec!["/abc"]);
    assert_eq!(shop.requested_queries(), vec!["seed=9"]);
}

#[test]
fn unseeded_reset_picks_a_random_session() {
    let shop = Shop::start();
    shop.page_matching(r"^/[a-z]{5}$", HOME_PAGE);
    let mut env = HttpEnvironment::new(http_config(&shop.uri())).unwrap();

    env.reset(None).unwrap();

    let session = env.session().unwrap().to_string();
    assert_eq!(shop.requested_paths(), vec![format!("/{session}")]);
}

#[test]
fn action_zero_is_a_no_op() {
    let shop = Shop::with_episode();
    let (mut env, before, _) = reset_env(&shop);

    let si = env.step(0).unwrap();

    assert_eq!(si.observation.html, before.html);
    assert_eq!(si.observation.url, before.url);
    assert!(!si.done);
    assert_eq!(shop.requested_paths().len(), 1);
}

#[test]
fn out_of_range_actions_are_ignored() {
    let shop = Shop::with_episode();
    let (mut env, before, _) = reset_env(&shop);

    let si = env.step(3).unwrap();
    assert_eq!(si.observation.html, before.html);
    let si = env.step(usize::MAX).unwrap();
    assert_eq!(si.observation.url, before.url);

    assert_eq!(shop.requested_paths().len(), 1);
}

#[test]
fn actions_follow_links_to_the_reward() {
    let shop = Shop::with_episode();
    let (mut env, _, _) = reset_env(&shop);
    assert_eq!(env.action_count().unwrap(), 3);

    let si = env.step(2).unwrap();
    assert_eq!(si.observation.url, "/item_page/fixed_7/B01");
    assert_eq!(si.observation.instruction_text, INSTRUCTION);
    assert_eq!(si.observation.click_actions, vec!["/done/fixed_7/B01"]);
    assert_float_eq!(si.reward, 0.0, abs <= 0.0);
    assert!(!si.done);
    assert_eq!(env.action_count().unwrap(), 2);

    let si = env.step(1).unwrap();
    assert_eq!(si.observation.url, "/done/fixed_7/B01");
    assert_float_eq!(si.reward, 0.75, rmax <= 1e-12);
    assert!(!si.done);
    assert_eq!(env.action_count().unwrap(), 1);

    assert_eq!(
        shop.requested_paths(),
        vec!["/fixed_7", "/item_page/fixed_7/B01", "/done/fixed_7/B01"]
    );
}

#[test]
fn failed_reset_keeps_the_previous_episode() {
    let shop = Shop::with_episode();
    shop.page(
        "/fixed_8",
        r#"<div id="instruction-text"><h4>Instruction: i need blue socks</h4></div>"#,
    );
    let (mut env, _, _) = reset_env(&shop);

    let result = env.reset(Some(8));
    assert!(matches!(result, Err(Error::MissingElement("best-products"))));

    let si = env.step(0).unwrap();
    assert_eq!(env.session(), Some(SESSION));
    assert_eq!(si.observation.instruction_text, INSTRUCTION);
    assert_eq!(si.observation.best_products[0]["asin"], "B01");
    assert_eq!(si.observation.html, HOME_PAGE);
}

#[test]
fn stepping_before_reset() {
    let shop = Shop::with_episode();
    let mut env = HttpEnvironment::new(http_config(&shop.uri())).unwrap();

    assert!(matches!(env.step(0), Err(Error::NotReset)));
    assert!(matches!(env.action_count(), Err(Error::NotReset)));
    assert!(shop.requested_paths().is_empty());
}

#[test]
fn text_observations() {
    let shop = Shop::with_episode();
    let config = EnvConfig {
        observation_mode: ObservationMode::Text,
        ..http_config(&shop.uri())
    };
    let mut env = HttpEnvironment::new(config).unwrap();

    let (observation, _) = env.reset(Some(7)).unwrap();

    let texts = observation.text.clone().unwrap();
    assert_that!(texts).contains(INSTRUCTION.to_string());
    assert!(!texts.contains(&"hidden promo".to_string()));
    let content = observation.content();
    assert!(content.starts_with(INSTRUCTION), "{content}");
    assert!(content.contains(" [SEP] "));
}

#[test]
fn ansi_render_lists_the_actions() {
    let shop = Shop::with_episode();
    let (mut env, _, _) = reset_env(&shop);

    let frame = env.render(RenderMode::Ansi).unwrap();

    insta::assert_snapshot!(frame.as_str().unwrap(), @r"
    /fixed_7
    Instruction: i need a red shirt
    [0] (no-op)
    [1] /search_results/fixed_7/red-shirt/1
    [2] /item_page/fixed_7/B01
    ");
}

#[test]
fn rgb_render_is_the_screenshot() {
    let shop = Shop::with_episode();
    let (mut env, _, _) = reset_env(&shop);

    let frame = env.render(RenderMode::RgbArray).unwrap();

    assert_eq!(frame.as_rgb().unwrap().dimensions(), (960, 540));
    assert!(frame.as_str().is_none());
}

#[test]
fn close_drops_the_page() {
    let shop = Shop::with_episode();
    let (mut env, _, _) = reset_env(&shop);

    env.close().unwrap();

    assert!(env.page_source().is_none());
    assert!(matches!(env.step(1), Err(Error::NotReset)));
}

#[test]
fn make_env_builds_the_configured_backend() {
    let shop = Shop::with_episode();
    let mut env = make_env(http_config(&shop.uri())).unwrap();

    let (observation, _) = env.reset(Some(7)).unwrap();
    let action = RandomPolicy::new(Some(1)).policy(&observation, env.action_count().unwrap());
    let si = env.step(action).unwrap();

    assert!(!si.done);
    assert_that!(shop.requested_paths()).contains("/fixed_7".to_string());
}

#[test]
fn shop_errors_are_still_observed() {
    let shop = Shop::start();
    shop.page("/fixed_7", HOME_PAGE);
    let mut env = HttpEnvironment::new(http_config(&shop.uri())).unwrap();
    env.reset(Some(7)).unwrap();

    // nothing is mounted for the item page, the shop answers 404
    let si = env.step(2).unwrap();

    assert_eq!(si.observation.url, "/item_page/fixed_7/B01");
    assert!(si.observation.click_actions.is_empty());
}
