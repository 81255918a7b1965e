extern crate webshop_gym;
mod common;

use common::*;
use rstest::*;
use webshop_gym::extract::*;

#[test]
fn form_actions_come_before_product_links() {
    let urls = click_urls(HOME_PAGE);

    assert_eq!(
        urls,
        vec![
            "/search_results/fixed_7/red-shirt/1".to_string(),
            "/item_page/fixed_7/B01".to_string(),
        ]
    );
}

#[test]
fn order_follows_kind_not_position() {
    let html = r#"
        <a class="product-link" href="/item_page/s/B09">first in markup</a>
        <form action="/search_results/s/socks/1"></form>
    "#;

    assert_eq!(
        click_urls(html),
        vec!["/search_results/s/socks/1", "/item_page/s/B09"]
    );
}

#[rstest]
#[case::absolute(r#"<a class="product-link" href="https://other.example/x">x</a>"#)]
#[case::relative(r#"<form action="search"></form>"#)]
#[case::empty(r#"<form action=""></form>"#)]
#[case::other_class(r#"<a class="nav-link" href="/item_page/s/B01">x</a>"#)]
fn non_site_targets_are_dropped(#[case] html: &str) {
    assert!(click_urls(html).is_empty());
}

#[rstest]
#[case("/search_results/s/red%20shirt/1", "/search_results/s/red%20shirt/1")]
#[case("/search_results/s/red shirt/1", "/search_results/s/red%20shirt/1")]
#[case("/item_page/s/B01?q=a&amp;b=1", "/item_page/s/B01%3Fq%3Da%26b%3D1")]
#[case("/item_page/s/%7B%27size%27%3A%20%27m%27%7D", "/item_page/s/%7B%27size%27%3A%20%27m%27%7D")]
#[case("/done/s/B01/caf%C3%A9", "/done/s/B01/caf%C3%A9")]
#[case("/a_b.c-d~e", "/a_b.c-d~e")]
#[case::entity_without_semicolon("/a?x=1&ampy=2", "/a%3Fx%3D1%26ampy%3D2")]
fn targets_are_normalized(#[case] raw: &str, #[case] expected: &str) {
    assert_eq!(normalize_target(raw), expected);
}

#[test]
fn extracted_targets_are_normalized() {
    let html = r#"<a class="product-link" href="/item_page/s/B01?q=a&amp;b=1">x</a>"#;

    assert_eq!(click_urls(html), vec!["/item_page/s/B01%3Fq%3Da%26b%3D1"]);
}

#[rstest]
#[case("/fixed_7", "/fixed_7")]
#[case("/item_page/abcdefghijklmnopqrst/B01", "/item_page/abcdefghijklmnopqrst/B01")]
#[case("", "")]
fn short_segments_are_kept(#[case] url: &str, #[case] expected: &str) {
    assert_eq!(clean_url(url), expected);
}

#[test]
fn long_segments_are_elided() {
    let url = "/search_results/fixed_7/%5B%27red%27%2C%20%27cotton%27%5D/1";

    insta::assert_snapshot!(clean_url(url), @"/search_results/fixed_7/%5B%27red%...tton%27%5D/1");
}
