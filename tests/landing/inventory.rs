use std::{cell::RefCell, time::Duration};

use async_std::task::block_on;
use mirror_landing::{
    net::{HttpResponse, TransportError},
    page::inventory::{
        InventoryCounter, InventoryPoller, RetryPolicy, EDITION_SIZE, FALLBACK_CLAIMED,
    },
    storefront::StorefrontClient,
};

use crate::support::{storefront_config, FakeTransport, HostCall, RecordingHost};

fn quick_poller() -> InventoryPoller {
    InventoryPoller {
        retry: RetryPolicy {
            max_retries: 3,
            base_delay: Duration::ZERO,
        },
        refresh_interval: Duration::ZERO,
    }
}

fn available(quantity: i64) -> Result<HttpResponse, TransportError> {
    Ok(HttpResponse::new(
        200,
        format!(r#"{{"data":{{"node":{{"quantityAvailable":{quantity}}}}}}}"#),
    ))
}

fn offline() -> Result<HttpResponse, TransportError> {
    Err(TransportError::new("https://mirror-shop.myshopify.com", "offline"))
}

fn inventory_labels(host: &RecordingHost) -> Vec<String> {
    host.calls()
        .into_iter()
        .filter_map(|call| match call {
            HostCall::Inventory(label) => Some(label),
            _ => None,
        })
        .collect()
}

#[test]
fn test_sold_count_from_available_quantity() {
    let host = RecordingHost::default();
    let client = StorefrontClient::new(
        storefront_config(),
        FakeTransport::scripted(vec![available(92)]),
    );
    let counter = RefCell::new(InventoryCounter::default());
    assert_eq!(counter.borrow().label(), "--/100");

    assert!(block_on(quick_poller().refresh(&client, &counter, &host)));
    assert_eq!(counter.borrow().sold(), Some(8));
    assert!(!counter.borrow().is_loading());
    assert!(counter.borrow().updated_at().is_some());
    assert_eq!(inventory_labels(&host), vec!["8/100"]);
}

#[test]
fn test_failures_use_fallback_and_retry_three_times() {
    let host = RecordingHost::default();
    let client = StorefrontClient::new(storefront_config(), FakeTransport::scripted(vec![offline()]));
    let counter = RefCell::new(InventoryCounter::default());

    assert!(!block_on(quick_poller().refresh(&client, &counter, &host)));
    assert_eq!(client.transport().requests().len(), 4);
    assert_eq!(counter.borrow().sold(), Some(FALLBACK_CLAIMED));
    assert!(counter.borrow().last_error().unwrap().contains("offline"));
    assert_eq!(inventory_labels(&host), vec!["8/100"; 4]);
}

#[test]
fn test_retry_recovers_after_transient_failure() {
    let host = RecordingHost::default();
    let client = StorefrontClient::new(
        storefront_config(),
        FakeTransport::scripted(vec![offline(), offline(), available(40)]),
    );
    let counter = RefCell::new(InventoryCounter::default());

    assert!(block_on(quick_poller().refresh(&client, &counter, &host)));
    assert_eq!(client.transport().requests().len(), 3);
    assert_eq!(counter.borrow().sold(), Some(60));
    assert_eq!(counter.borrow().last_error(), None);
    assert_eq!(inventory_labels(&host), vec!["8/100", "8/100", "60/100"]);
}

#[test]
fn test_failure_keeps_last_known_count() {
    let host = RecordingHost::default();
    let client = StorefrontClient::new(
        storefront_config(),
        FakeTransport::scripted(vec![available(70), offline()]),
    );
    let counter = RefCell::new(InventoryCounter::default());
    let poller = quick_poller();

    assert!(block_on(poller.refresh(&client, &counter, &host)));
    assert!(!block_on(poller.refresh(&client, &counter, &host)));
    assert_eq!(counter.borrow().sold(), Some(30));
    assert_eq!(counter.borrow().label(), "30/100");
}

#[test]
fn test_sold_count_stays_within_edition() {
    for (quantity, sold) in [(150, 0), (100, 0), (0, 100), (-5, 100)] {
        let mut counter = InventoryCounter::default();
        counter.record_available(quantity);
        assert_eq!(counter.sold(), Some(sold));
        assert!(counter.sold().unwrap() <= EDITION_SIZE);
    }
}
