use std::{cell::RefCell, time::Duration};

use chrono::{DateTime, Local};
use log::{info, warn};

use crate::{
    net::Transport,
    storefront::{StorefrontClient, StorefrontError},
};

use super::host::PageHost;

/// Only this many mirrors will ever exist.
pub const EDITION_SIZE: u32 = 100;
/// Claimed count shown when the storefront cannot be reached and nothing
/// better is known.
pub const FALLBACK_CLAIMED: u32 = 8;

pub fn sold_from_available(total: u32, available: i64) -> u32 {
    (total as i64 - available).clamp(0, total as i64) as u32
}

/// The "claimed/total" counter on the acquire button.
#[derive(Clone, Debug)]
pub struct InventoryCounter {
    total: u32,
    fallback_claimed: u32,
    sold: Option<u32>,
    loading: bool,
    last_error: Option<String>,
    updated_at: Option<DateTime<Local>>,
}

impl Default for InventoryCounter {
    fn default() -> Self {
        InventoryCounter::new(EDITION_SIZE, FALLBACK_CLAIMED)
    }
}

impl InventoryCounter {
    pub fn new(total: u32, fallback_claimed: u32) -> InventoryCounter {
        InventoryCounter {
            total,
            fallback_claimed: fallback_claimed.min(total),
            sold: None,
            loading: true,
            last_error: None,
            updated_at: None,
        }
    }

    pub fn sold(&self) -> Option<u32> {
        self.sold
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn updated_at(&self) -> Option<DateTime<Local>> {
        self.updated_at
    }

    pub fn begin_fetch(&mut self) {
        self.loading = true;
    }

    pub fn record_available(&mut self, available: i64) {
        self.sold = Some(sold_from_available(self.total, available));
        self.loading = false;
        self.last_error = None;
        self.updated_at = Some(Local::now());
    }

    /// Keeps the last known count; only an empty counter takes the fallback.
    pub fn record_failure(&mut self, error: &StorefrontError) {
        self.loading = false;
        self.last_error = Some(error.to_string());
        if self.sold.is_none() {
            self.sold = Some(self.fallback_claimed);
        }
    }

    pub fn label(&self) -> String {
        match self.sold {
            Some(sold) => format!("{}/{}", sold, self.total),
            None => format!("--/{}", self.total),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            max_retries: 3,
            base_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// Delay before retry number `retry` (zero based): 1s, 2s, 4s, ...
    pub fn delay_for(&self, retry: u32) -> Duration {
        self.base_delay.saturating_mul(2u32.saturating_pow(retry))
    }
}

#[derive(Clone, Copy, Debug)]
pub struct InventoryPoller {
    pub retry: RetryPolicy,
    pub refresh_interval: Duration,
}

impl Default for InventoryPoller {
    fn default() -> Self {
        InventoryPoller {
            retry: RetryPolicy::default(),
            refresh_interval: Duration::from_secs(5 * 60),
        }
    }
}

impl InventoryPoller {
    /// One fetch round including retries. Every attempt publishes the label,
    /// so a failure shows the fallback straight away instead of waiting for
    /// the retries to run out. Returns whether a fresh count arrived.
    pub async fn refresh<T, H>(
        &self,
        client: &StorefrontClient<T>,
        counter: &RefCell<InventoryCounter>,
        host: &H,
    ) -> bool
    where
        T: Transport,
        H: PageHost,
    {
        let mut retry = 0;
        loop {
            counter.borrow_mut().begin_fetch();
            let result = client.fetch_available_quantity().await;
            let fetched = match result {
                Ok(available) => {
                    counter.borrow_mut().record_available(available);
                    true
                }
                Err(err) => {
                    warn!("Inventory fetch failed: {}", err);
                    counter.borrow_mut().record_failure(&err);
                    false
                }
            };
            host.show_inventory(&counter.borrow().label());

            if fetched || retry >= self.retry.max_retries {
                return fetched;
            }
            let delay = self.retry.delay_for(retry);
            info!("Will retry inventory fetch in {}s", delay.as_secs_f64());
            retry += 1;
            async_std::task::sleep(delay).await;
        }
    }

    /// Refreshes forever. Callers wrap this in an abortable future so
    /// teardown can stop it.
    pub async fn run<T, H>(
        &self,
        client: &StorefrontClient<T>,
        counter: &RefCell<InventoryCounter>,
        host: &H,
    ) where
        T: Transport,
        H: PageHost,
    {
        loop {
            self.refresh(client, counter, host).await;
            async_std::task::sleep(self.refresh_interval).await;
        }
    }
}
