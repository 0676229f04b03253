use async_std::task::block_on;
use mirror_landing::{
    config::StorefrontConfig,
    net::{HttpMethod, HttpResponse, TransportError},
    storefront::{variant_global_id, CheckoutSource, StorefrontClient, StorefrontError},
};

use crate::support::{storefront_config, FakeTransport};

const FALLBACK_URL: &str = "https://mirror-shop.myshopify.com/cart/123:1";

fn checkout_with(transport: FakeTransport) -> (String, CheckoutSource) {
    let client = StorefrontClient::new(storefront_config(), transport);
    let target = block_on(client.start_checkout());
    (target.url, target.source)
}

#[test]
fn test_checkout_uses_cart_url_from_api() {
    let transport = FakeTransport::json(
        200,
        r#"{"data":{"cartCreate":{"cart":{"checkoutUrl":"https://x/cn/123"},"userErrors":[]}}}"#,
    );
    let client = StorefrontClient::new(storefront_config(), transport);
    let target = block_on(client.start_checkout());

    assert_eq!(target.url, "https://x/cn/123");
    assert_eq!(target.source, CheckoutSource::Api);

    let requests = client.transport().requests();
    assert_eq!(requests.len(), 1);
    let request = &requests[0];
    assert_eq!(request.method, HttpMethod::Post);
    assert_eq!(
        request.url,
        "https://mirror-shop.myshopify.com/api/2023-07/graphql.json"
    );
    assert_eq!(
        request.header("X-Shopify-Storefront-Access-Token"),
        Some("token-123")
    );
    assert_eq!(request.header("content-type"), Some("application/json"));

    let body: serde_json::Value = serde_json::from_str(request.body.as_deref().unwrap()).unwrap();
    let query = body["query"].as_str().unwrap();
    assert!(query.contains("cartCreate"));
    assert!(query.contains(r#""gid://shopify/ProductVariant/123""#));
}

#[test]
fn test_checkout_falls_back_on_network_failure() {
    let (url, source) = checkout_with(FakeTransport::scripted(vec![Err(TransportError::new(
        "https://mirror-shop.myshopify.com",
        "offline",
    ))]));
    assert_eq!(url, FALLBACK_URL);
    assert!(matches!(source, CheckoutSource::Fallback(reason) if reason.contains("offline")));
}

#[test]
fn test_checkout_falls_back_on_error_status() {
    let (url, source) = checkout_with(FakeTransport::json(401, "Unauthorized"));
    assert_eq!(url, FALLBACK_URL);
    assert!(matches!(source, CheckoutSource::Fallback(reason) if reason.contains("401")));
}

#[test]
fn test_checkout_falls_back_on_graphql_errors() {
    let (url, source) = checkout_with(FakeTransport::json(
        200,
        r#"{"errors":[{"message":"Throttled"}]}"#,
    ));
    assert_eq!(url, FALLBACK_URL);
    assert!(matches!(source, CheckoutSource::Fallback(reason) if reason.contains("Throttled")));
}

#[test]
fn test_checkout_falls_back_on_user_errors() {
    let (url, source) = checkout_with(FakeTransport::json(
        200,
        r#"{"data":{"cartCreate":{"cart":null,"userErrors":[{"field":["input","lines"],"message":"Sold out"}]}}}"#,
    ));
    assert_eq!(url, FALLBACK_URL);
    assert!(
        matches!(source, CheckoutSource::Fallback(reason) if reason.contains("input.lines: Sold out"))
    );
}

#[test]
fn test_checkout_falls_back_on_missing_url() {
    let (url, _) = checkout_with(FakeTransport::json(
        200,
        r#"{"data":{"cartCreate":{"cart":{"checkoutUrl":null},"userErrors":[]}}}"#,
    ));
    assert_eq!(url, FALLBACK_URL);

    let (url, _) = checkout_with(FakeTransport::json(200, "<html>maintenance</html>"));
    assert_eq!(url, FALLBACK_URL);
}

#[test]
fn test_direct_cart_mode_skips_api() {
    let config = StorefrontConfig {
        direct_cart_only: true,
        ..storefront_config()
    };
    let client = StorefrontClient::new(config, FakeTransport::json(500, ""));
    let target = block_on(client.start_checkout());

    assert_eq!(target.url, FALLBACK_URL);
    assert_eq!(target.source, CheckoutSource::Direct);
    assert!(client.transport().requests().is_empty());
}

#[test]
fn test_available_quantity_query() {
    let client = StorefrontClient::new(
        storefront_config(),
        FakeTransport::json(200, r#"{"data":{"node":{"quantityAvailable":92}}}"#),
    );
    assert_eq!(block_on(client.fetch_available_quantity()).unwrap(), 92);

    let body = client.transport().requests()[0].body.clone().unwrap();
    assert!(body.contains("quantityAvailable"));
}

#[test]
fn test_available_quantity_missing_node() {
    let client = StorefrontClient::new(
        storefront_config(),
        FakeTransport::json(200, r#"{"data":{"node":null}}"#),
    );
    assert!(matches!(
        block_on(client.fetch_available_quantity()),
        Err(StorefrontError::MissingField(_))
    ));
}

#[test]
fn test_global_id_is_not_double_wrapped() {
    assert_eq!(variant_global_id("42"), "gid://shopify/ProductVariant/42");
    assert_eq!(
        variant_global_id("gid://shopify/ProductVariant/42"),
        "gid://shopify/ProductVariant/42"
    );
}

#[test]
fn test_error_status_is_reported() {
    let client = StorefrontClient::new(
        storefront_config(),
        FakeTransport::scripted(vec![Ok(HttpResponse::new(503, "busy"))]),
    );
    assert!(matches!(
        block_on(client.create_checkout()),
        Err(StorefrontError::Status(503))
    ));
}
