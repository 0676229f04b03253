use super::{
    animation::{AnimationWindow, Progress},
    gate::UnlockGate,
};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SamplerSettings {
    /// Minimum time between two emitted samples.
    pub min_interval_ms: f64,
    /// Scroll deltas smaller than this, measured from the last emitted
    /// position, are treated as noise.
    pub threshold_px: f64,
}

impl Default for SamplerSettings {
    fn default() -> Self {
        SamplerSettings {
            min_interval_ms: 1000.0 / 60.0,
            threshold_px: 1.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScrollSample {
    pub scroll_y: f64,
    pub at_ms: f64,
}

impl ScrollSample {
    pub fn new(scroll_y: f64, at_ms: f64) -> ScrollSample {
        ScrollSample { scroll_y, at_ms }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SampleOutcome {
    /// Gate still locked.
    Ignored,
    /// Below the noise threshold.
    Suppressed,
    /// Stored as the latest pending position; a flush will pick it up.
    Pending,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum FlushOutcome {
    Idle,
    /// Too soon after the previous emission; the sample stays pending.
    Deferred,
    Emitted(Progress),
}

#[derive(Clone, Copy, Debug)]
struct Emission {
    scroll_y: f64,
    at_ms: f64,
}

/// Turns raw scroll positions into rate limited progress values.
#[derive(Clone, Debug)]
pub struct ScrollSampler {
    window: AnimationWindow,
    settings: SamplerSettings,
    last_emitted: Option<Emission>,
    pending: Option<f64>,
}

impl ScrollSampler {
    pub fn new(window: AnimationWindow, settings: SamplerSettings) -> ScrollSampler {
        ScrollSampler {
            window,
            settings,
            last_emitted: None,
            pending: None,
        }
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn offer(&mut self, gate: &UnlockGate, scroll_y: f64) -> SampleOutcome {
        if !gate.is_unlocked() {
            return SampleOutcome::Ignored;
        }
        if let Some(last) = self.last_emitted {
            if (scroll_y - last.scroll_y).abs() < self.settings.threshold_px {
                // Back within noise of what is on screen.
                self.pending = None;
                return SampleOutcome::Suppressed;
            }
        }
        self.pending = Some(scroll_y);
        SampleOutcome::Pending
    }

    pub fn flush(&mut self, at_ms: f64) -> FlushOutcome {
        let Some(scroll_y) = self.pending else {
            return FlushOutcome::Idle;
        };
        if let Some(last) = self.last_emitted {
            if at_ms - last.at_ms < self.settings.min_interval_ms {
                return FlushOutcome::Deferred;
            }
        }
        FlushOutcome::Emitted(self.emit(scroll_y, at_ms))
    }

    /// Emits whatever is pending without waiting for the interval. Used once
    /// scrolling has settled.
    pub fn flush_now(&mut self, at_ms: f64) -> Option<Progress> {
        let scroll_y = self.pending?;
        Some(self.emit(scroll_y, at_ms))
    }

    fn emit(&mut self, scroll_y: f64, at_ms: f64) -> Progress {
        self.pending = None;
        self.last_emitted = Some(Emission { scroll_y, at_ms });
        self.window.progress_at(scroll_y)
    }

    /// Feeds a sample sequence through the sampler, flushing at each sample's
    /// own timestamp. Samples that land inside the rate limit are coalesced
    /// into the next one that gets through.
    pub fn progress_iter<'a, I>(
        &'a mut self,
        gate: &'a UnlockGate,
        samples: I,
    ) -> impl Iterator<Item = Progress> + 'a
    where
        I: IntoIterator<Item = ScrollSample>,
        I::IntoIter: 'a,
    {
        samples.into_iter().filter_map(move |sample| {
            if self.offer(gate, sample.scroll_y) == SampleOutcome::Ignored {
                return None;
            }
            match self.flush(sample.at_ms) {
                FlushOutcome::Emitted(progress) => Some(progress),
                _ => None,
            }
        })
    }
}
