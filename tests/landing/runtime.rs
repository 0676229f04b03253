use std::{rc::Rc, time::Duration};

use async_std::{
    channel::{self, Receiver},
    task::{block_on, sleep},
};
use mirror_landing::{
    config::PageConfig,
    net::{HttpRequest, HttpResponse, TransportError},
    page::{
        commands::{PageCommand, PageRuntime},
        inventory::{InventoryPoller, RetryPolicy},
        routes::Route,
    },
};

use crate::support::{
    png_bytes, storefront_config, test_variants, FakeTransport, HostCall, RecordingHost,
};

const CHECKOUT_URL: &str = "https://x/cn/123";

type Runtime = PageRuntime<RecordingHost, Rc<FakeTransport>>;

struct Harness {
    host: RecordingHost,
    transport: Rc<FakeTransport>,
    runtime: Runtime,
    _rx: Receiver<PageCommand>,
}

fn harness<F>(retry_delay: Duration, storefront: F) -> Harness
where
    F: Fn(&str) -> Result<HttpResponse, TransportError> + 'static,
{
    let host = RecordingHost::default();
    let transport = Rc::new(FakeTransport::new(move |request: &HttpRequest, _| {
        match request.body.as_deref() {
            Some(query) => storefront(query),
            None => Ok(HttpResponse::new(200, png_bytes(1, 1, 0))),
        }
    }));
    let config = PageConfig {
        storefront: storefront_config(),
        password: None,
        variants: test_variants(),
    };
    let (tx, rx) = channel::unbounded();
    let runtime = PageRuntime::new(host.clone(), Rc::clone(&transport), config, None, tx)
        .with_inventory_poller(InventoryPoller {
            retry: RetryPolicy {
                max_retries: 3,
                base_delay: retry_delay,
            },
            refresh_interval: Duration::from_millis(2),
        });
    Harness {
        host,
        transport,
        runtime,
        _rx: rx,
    }
}

fn healthy_storefront(query: &str) -> Result<HttpResponse, TransportError> {
    let body = if query.contains("cartCreate") {
        format!(
            r#"{{"data":{{"cartCreate":{{"cart":{{"checkoutUrl":"{CHECKOUT_URL}"}},"userErrors":[]}}}}}}"#
        )
    } else {
        r#"{"data":{"node":{"quantityAvailable":92}}}"#.to_owned()
    };
    Ok(HttpResponse::new(200, body))
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

fn redirects(host: &RecordingHost) -> Vec<String> {
    host.calls()
        .into_iter()
        .filter_map(|call| match call {
            HostCall::Redirect(url) => Some(url),
            _ => None,
        })
        .collect()
}

fn storefront_requests(transport: &FakeTransport, marker: &str) -> usize {
    transport
        .requests()
        .iter()
        .filter(|request| request.body.as_deref().is_some_and(|body| body.contains(marker)))
        .count()
}

#[test]
fn test_navigation_starts_inventory_polling() {
    let Harness {
        host, mut runtime, ..
    } = harness(Duration::ZERO, healthy_storefront);

    block_on(async {
        runtime.apply(PageCommand::Navigate("/".to_owned()));
        assert_eq!(host.routes(), vec![Route::Home]);
        assert_eq!(inventory_labels(&host), vec!["--/100"]);

        sleep(Duration::from_millis(30)).await;
        assert!(inventory_labels(&host).contains(&"8/100".to_owned()));
        assert_eq!(runtime.inventory().borrow().sold(), Some(8));
    });
}

#[test]
fn test_teardown_stops_inventory_polling() {
    let Harness {
        host, mut runtime, ..
    } = harness(Duration::ZERO, healthy_storefront);

    block_on(async {
        runtime.apply(PageCommand::Navigate("/".to_owned()));
        sleep(Duration::from_millis(20)).await;
        runtime.apply(PageCommand::Teardown);
        assert_eq!(runtime.session().route(), None);
        assert!(host.calls().contains(&HostCall::ScrollLocked(false)));

        let published = inventory_labels(&host).len();
        sleep(Duration::from_millis(30)).await;
        assert_eq!(inventory_labels(&host).len(), published);
    });
}

#[test]
fn test_teardown_cancels_pending_retries() {
    let Harness {
        host,
        transport,
        mut runtime,
        ..
    } = harness(Duration::from_millis(40), |_| {
        Err(TransportError::new("https://mirror-shop.myshopify.com", "offline"))
    });

    block_on(async {
        runtime.apply(PageCommand::Navigate("/mirror".to_owned()));
        sleep(Duration::from_millis(10)).await;
        assert_eq!(storefront_requests(&transport, "quantityAvailable"), 1);
        assert_eq!(inventory_labels(&host), vec!["--/100", "8/100"]);

        runtime.apply(PageCommand::Teardown);
        sleep(Duration::from_millis(120)).await;
        assert_eq!(storefront_requests(&transport, "quantityAvailable"), 1);
        assert_eq!(inventory_labels(&host).len(), 2);
    });
}

#[test]
fn test_navigation_after_teardown_resumes_polling() {
    let Harness {
        host, mut runtime, ..
    } = harness(Duration::ZERO, healthy_storefront);

    block_on(async {
        runtime.apply(PageCommand::Navigate("/".to_owned()));
        sleep(Duration::from_millis(10)).await;
        runtime.apply(PageCommand::Teardown);
        let published = inventory_labels(&host).len();

        runtime.apply(PageCommand::Navigate("/".to_owned()));
        assert_eq!(runtime.session().route(), Some(Route::Home));
        assert_eq!(host.routes(), vec![Route::Home, Route::Home]);

        sleep(Duration::from_millis(30)).await;
        assert!(inventory_labels(&host).len() > published);
    });
}

#[test]
fn test_second_acquire_ignored_while_checkout_pending() {
    let Harness {
        host,
        transport,
        mut runtime,
        ..
    } = harness(Duration::ZERO, healthy_storefront);

    block_on(async {
        runtime.apply(PageCommand::Acquire);
        runtime.apply(PageCommand::Acquire);
        sleep(Duration::from_millis(10)).await;
        assert_eq!(redirects(&host), vec![CHECKOUT_URL]);
        assert_eq!(storefront_requests(&transport, "cartCreate"), 1);

        // Once the first checkout finished, the button works again.
        runtime.apply(PageCommand::Acquire);
        sleep(Duration::from_millis(10)).await;
        assert_eq!(redirects(&host), vec![CHECKOUT_URL, CHECKOUT_URL]);
    });
}

#[test]
fn test_failed_checkout_redirects_to_cart() {
    let Harness {
        host, mut runtime, ..
    } = harness(Duration::ZERO, |_| Ok(HttpResponse::new(502, "bad gateway")));

    block_on(async {
        runtime.apply(PageCommand::Acquire);
        sleep(Duration::from_millis(10)).await;
        assert_eq!(
            redirects(&host),
            vec!["https://mirror-shop.myshopify.com/cart/123:1"]
        );
    });
}
