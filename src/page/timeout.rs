use fxhash::FxHashMap;

use super::host::PageHost;

pub const SCROLL_SETTLE_TIMEOUT: &str = "scroll-settle";

pub struct TimeoutManager {
    pub timeouts: FxHashMap<String, Timeout>,
}

pub struct Timeout {
    pub name: String,
    pub period_ms: u32,
    pub is_scheduled: bool,
}

impl TimeoutManager {
    pub fn new() -> TimeoutManager {
        TimeoutManager {
            timeouts: FxHashMap::default(),
        }
    }

    /// Schedules `name`, cancelling an earlier run of it first.
    pub fn restart<H: PageHost>(&mut self, host: &H, name: &str, period_ms: u32) {
        let timeout = self
            .timeouts
            .entry(name.to_owned())
            .or_insert_with(|| Timeout::new(name, period_ms));
        timeout.period_ms = period_ms;
        timeout.schedule(host);
    }

    /// Called when the host reports the timeout fired. Returns `false` for
    /// names that are unknown or were cancelled in the meantime.
    pub fn fired(&mut self, name: &str) -> bool {
        match self.timeouts.get_mut(name) {
            Some(timeout) if timeout.is_scheduled => {
                timeout.is_scheduled = false;
                true
            }
            _ => false,
        }
    }

    pub fn clear<H: PageHost>(&mut self, host: &H) {
        for (_, timeout) in self.timeouts.iter_mut() {
            timeout.cancel(host);
        }
        self.timeouts.clear();
    }
}

impl Timeout {
    pub fn new(name: &str, period_ms: u32) -> Timeout {
        Timeout {
            name: name.to_owned(),
            period_ms,
            is_scheduled: false,
        }
    }

    pub fn cancel<H: PageHost>(&mut self, host: &H) {
        if self.is_scheduled {
            host.clear_timeout(&self.name);
            self.is_scheduled = false;
        }
    }

    pub fn schedule<H: PageHost>(&mut self, host: &H) {
        self.cancel(host);
        host.schedule_timeout(&self.name, self.period_ms);
        self.is_scheduled = true;
    }
}
