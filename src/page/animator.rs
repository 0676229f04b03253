use std::{cell::RefCell, rc::Rc};

use log::{debug, info};

use crate::config::PageVariant;

use super::{
    animation::{FrameIndex, FrameSelector, Progress},
    gate::{ScrollVerdict, UnlockGate},
    host::{AnimationFrameHandle, PageHost},
    preload::FrameStore,
    sampler::{FlushOutcome, SampleOutcome, ScrollSampler},
    timeout::{SCROLL_SETTLE_TIMEOUT, TimeoutManager},
};

/// Scroll driven frame sequence for one mounted page variant.
///
/// The animator owns no host; every entry point takes the host it should act
/// on. At most one animation frame request is outstanding at any time.
pub struct ScrollAnimator {
    variant_name: String,
    settle_ms: u32,
    gate: UnlockGate,
    sampler: ScrollSampler,
    selector: FrameSelector,
    frames: Rc<RefCell<FrameStore>>,
    timeouts: TimeoutManager,
    animation_request: Option<AnimationFrameHandle>,
    last_scroll_y: f64,
    last_sample_at: f64,
    is_mounted: bool,
}

impl ScrollAnimator {
    pub fn new(variant: &PageVariant, frames: Rc<RefCell<FrameStore>>) -> ScrollAnimator {
        ScrollAnimator {
            variant_name: variant.name.to_owned(),
            settle_ms: variant.settle_ms,
            gate: UnlockGate::new(variant.preview_limit),
            sampler: ScrollSampler::new(variant.window, variant.sampler),
            selector: FrameSelector::new(variant.total_frames, variant.easing),
            frames,
            timeouts: TimeoutManager::new(),
            animation_request: None,
            last_scroll_y: 0.0,
            last_sample_at: 0.0,
            is_mounted: false,
        }
    }

    pub fn variant_name(&self) -> &str {
        &self.variant_name
    }

    pub fn gate(&self) -> &UnlockGate {
        &self.gate
    }

    pub fn rendered_frame(&self) -> Option<FrameIndex> {
        self.selector.rendered()
    }

    pub fn is_mounted(&self) -> bool {
        self.is_mounted
    }

    pub fn has_animation_request(&self) -> bool {
        self.animation_request.is_some()
    }

    pub fn mount<H: PageHost>(&mut self, host: &H) {
        if self.is_mounted {
            return;
        }
        self.is_mounted = true;
        host.set_scroll_locked(!self.gate.is_unlocked());
        self.render(host, Progress::START);
    }

    pub fn on_scroll<H: PageHost>(&mut self, host: &H, scroll_y: f64, at_ms: f64) {
        if !self.is_mounted {
            return;
        }
        let scroll_y = match self.gate.constrain(scroll_y) {
            ScrollVerdict::Allowed => scroll_y,
            ScrollVerdict::Reset(limit) => {
                host.scroll_to(limit);
                limit
            }
        };
        self.last_scroll_y = scroll_y;
        self.last_sample_at = at_ms;

        match self.sampler.offer(&self.gate, scroll_y) {
            SampleOutcome::Ignored => {}
            SampleOutcome::Suppressed => {
                self.timeouts
                    .restart(host, SCROLL_SETTLE_TIMEOUT, self.settle_ms);
            }
            SampleOutcome::Pending => {
                self.request_animation_frame(host);
                self.timeouts
                    .restart(host, SCROLL_SETTLE_TIMEOUT, self.settle_ms);
            }
        }
    }

    pub fn on_animation_frame<H: PageHost>(
        &mut self,
        host: &H,
        handle: AnimationFrameHandle,
        at_ms: f64,
    ) {
        if self.animation_request != Some(handle) {
            debug!("Ignoring stale animation frame {}", handle.0);
            return;
        }
        self.animation_request = None;

        match self.sampler.flush(at_ms) {
            FlushOutcome::Idle => {}
            FlushOutcome::Deferred => self.request_animation_frame(host),
            FlushOutcome::Emitted(progress) => self.render(host, progress),
        }
    }

    /// Returns `false` when the timeout is not one of ours or was cancelled.
    pub fn on_timeout<H: PageHost>(&mut self, host: &H, name: &str) -> bool {
        if !self.timeouts.fired(name) {
            return false;
        }
        if name == SCROLL_SETTLE_TIMEOUT {
            if let Some(progress) = self.sampler.flush_now(self.last_sample_at) {
                self.render(host, progress);
            }
            self.cancel_animation_frame(host);
        }
        true
    }

    pub fn on_primary_media_ended<H: PageHost>(&mut self, host: &H) {
        if !self.gate.unlock() {
            return;
        }
        info!("Scroll animation unlocked for {}", self.variant_name);
        if !self.is_mounted {
            return;
        }
        host.set_scroll_locked(false);
        // Catch up with wherever the visitor already is.
        if self.sampler.offer(&self.gate, self.last_scroll_y) == SampleOutcome::Pending {
            self.request_animation_frame(host);
        }
    }

    pub fn on_frame_loaded<H: PageHost>(&mut self, host: &H, frame: FrameIndex) {
        if self.is_mounted && self.selector.rendered() == Some(frame) {
            self.draw(host, frame);
        }
    }

    pub fn teardown<H: PageHost>(&mut self, host: &H) {
        if !self.is_mounted {
            return;
        }
        self.cancel_animation_frame(host);
        self.timeouts.clear(host);
        host.set_scroll_locked(false);
        self.is_mounted = false;
    }

    fn render<H: PageHost>(&mut self, host: &H, progress: Progress) {
        if let Some(frame) = self.selector.select(progress) {
            self.draw(host, frame);
        }
    }

    fn draw<H: PageHost>(&self, host: &H, frame: FrameIndex) {
        let image = self.frames.borrow().image(frame);
        host.draw_frame(frame, image.as_deref());
    }

    fn request_animation_frame<H: PageHost>(&mut self, host: &H) {
        self.cancel_animation_frame(host);
        self.animation_request = Some(host.request_animation_frame());
    }

    fn cancel_animation_frame<H: PageHost>(&mut self, host: &H) {
        if let Some(handle) = self.animation_request.take() {
            host.cancel_animation_frame(handle);
        }
    }
}
