use std::{cell::RefCell, rc::Rc};

use futures::future::join_all;
use image::RgbaImage;
use log::{debug, warn};
use manual_future::{ManualFuture, ManualFutureCompleter};
use url::Url;

use crate::{
    config::{ConfigError, PageVariant},
    net::{HttpRequest, Transport},
};

use super::animation::FrameIndex;

const PLACEHOLDER_OPEN: &str = "{index";

/// Path of a single still frame, e.g. `/frames/frame-{index:03}.jpg`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FramePathTemplate {
    prefix: String,
    width: usize,
    suffix: String,
}

impl FramePathTemplate {
    pub fn parse(template: &str) -> Result<FramePathTemplate, ConfigError> {
        let invalid = |reason| ConfigError::InvalidFrameTemplate {
            template: template.to_owned(),
            reason,
        };

        let start = template
            .find(PLACEHOLDER_OPEN)
            .ok_or_else(|| invalid("missing {index} placeholder"))?;
        let rest = &template[start + PLACEHOLDER_OPEN.len()..];
        let close = rest
            .find('}')
            .ok_or_else(|| invalid("unterminated placeholder"))?;
        let width_format = &rest[..close];
        let suffix = &rest[close + 1..];
        if suffix.contains(PLACEHOLDER_OPEN) {
            return Err(invalid("more than one placeholder"));
        }

        let width = if width_format.is_empty() {
            0
        } else {
            width_format
                .strip_prefix(":0")
                .and_then(|digits| digits.parse::<usize>().ok())
                .ok_or_else(|| invalid("padding must look like {index:0N}"))?
        };

        Ok(FramePathTemplate {
            prefix: template[..start].to_owned(),
            width,
            suffix: suffix.to_owned(),
        })
    }

    pub fn path_for(&self, frame: FrameIndex) -> String {
        format!(
            "{}{:0width$}{}",
            self.prefix,
            frame.get(),
            self.suffix,
            width = self.width
        )
    }

    pub fn url_for(&self, base_url: Option<&Url>, frame: FrameIndex) -> String {
        let path = self.path_for(frame);
        match base_url.and_then(|base| base.join(&path).ok()) {
            Some(url) => url.to_string(),
            None => path,
        }
    }
}

#[derive(Clone, Debug)]
pub enum FrameSlot {
    Pending,
    Loaded(Rc<RgbaImage>),
    Failed(String),
}

impl FrameSlot {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, FrameSlot::Pending)
    }
}

/// Decoded frames keyed by frame index, readable synchronously while the
/// preloader is still filling it.
pub struct FrameStore {
    slots: Vec<FrameSlot>,
    ready: bool,
    ready_completers: Vec<ManualFutureCompleter<()>>,
}

impl FrameStore {
    pub fn new(total_frames: u32) -> FrameStore {
        FrameStore {
            slots: vec![FrameSlot::Pending; total_frames as usize],
            ready: false,
            ready_completers: vec![],
        }
    }

    pub fn total_frames(&self) -> u32 {
        self.slots.len() as u32
    }

    pub fn slot(&self, frame: FrameIndex) -> Option<&FrameSlot> {
        self.slots.get(frame.get() as usize - 1)
    }

    pub fn image(&self, frame: FrameIndex) -> Option<Rc<RgbaImage>> {
        match self.slot(frame) {
            Some(FrameSlot::Loaded(image)) => Some(Rc::clone(image)),
            _ => None,
        }
    }

    /// Terminal slots are never overwritten. Returns whether the slot changed.
    pub fn record(&mut self, frame: FrameIndex, slot: FrameSlot) -> bool {
        match self.slots.get_mut(frame.get() as usize - 1) {
            Some(existing) if !existing.is_terminal() => {
                *existing = slot;
                true
            }
            _ => false,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.slots.iter().all(FrameSlot::is_terminal)
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    pub fn loaded_count(&self) -> u32 {
        self.slots
            .iter()
            .filter(|x| matches!(x, FrameSlot::Loaded(_)))
            .count() as u32
    }

    pub fn failed_count(&self) -> u32 {
        self.slots
            .iter()
            .filter(|x| matches!(x, FrameSlot::Failed(_)))
            .count() as u32
    }

    pub fn ready_future(&mut self) -> ManualFuture<()> {
        if self.ready {
            return ManualFuture::new_completed(());
        }
        let (future, completer) = ManualFuture::<()>::new();
        self.ready_completers.push(completer);
        future
    }

    /// Flips the store to ready. Only the first call hands back the waiters.
    fn take_ready_completers(&mut self) -> Option<Vec<ManualFutureCompleter<()>>> {
        if self.ready || !self.is_complete() {
            return None;
        }
        self.ready = true;
        Some(std::mem::take(&mut self.ready_completers))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct PreloadReport {
    pub loaded: u32,
    pub failed: u32,
}

pub struct FramePreloader {
    template: FramePathTemplate,
    base_url: Option<Url>,
    eager_frames: u32,
    store: Rc<RefCell<FrameStore>>,
}

impl FramePreloader {
    pub fn new(variant: &PageVariant, base_url: Option<Url>) -> FramePreloader {
        FramePreloader {
            template: variant.frames.clone(),
            base_url,
            eager_frames: variant.eager_frames.min(variant.total_frames),
            store: Rc::new(RefCell::new(FrameStore::new(variant.total_frames))),
        }
    }

    pub fn store(&self) -> Rc<RefCell<FrameStore>> {
        Rc::clone(&self.store)
    }

    pub fn ready(&self) -> ManualFuture<()> {
        self.store.borrow_mut().ready_future()
    }

    /// Requests every frame, eager ones first. `on_frame` sees each frame as
    /// it finishes along with whether it decoded.
    pub async fn run<T, F>(&self, transport: &T, on_frame: F) -> PreloadReport
    where
        T: Transport,
        F: Fn(FrameIndex, bool),
    {
        let total = self.store.borrow().total_frames();
        let eager = self.eager_frames.min(total);

        self.load_range(transport, 1, eager, &on_frame).await;
        self.load_range(transport, eager + 1, total, &on_frame).await;

        let completers = self.store.borrow_mut().take_ready_completers();
        if let Some(completers) = completers {
            for completer in completers {
                completer.complete(()).await;
            }
        }

        let store = self.store.borrow();
        let report = PreloadReport {
            loaded: store.loaded_count(),
            failed: store.failed_count(),
        };
        debug!(
            "Frame preload finished: {} loaded, {} failed",
            report.loaded, report.failed
        );
        report
    }

    async fn load_range<T, F>(&self, transport: &T, first: u32, last: u32, on_frame: &F)
    where
        T: Transport,
        F: Fn(FrameIndex, bool),
    {
        let requests = (first..=last)
            .filter_map(FrameIndex::new)
            .filter(|frame| {
                !self
                    .store
                    .borrow()
                    .slot(*frame)
                    .is_some_and(FrameSlot::is_terminal)
            })
            .map(|frame| async move {
                let url = self.template.url_for(self.base_url.as_ref(), frame);
                let slot = match load_frame(transport, &url).await {
                    Ok(image) => FrameSlot::Loaded(Rc::new(image)),
                    Err(reason) => {
                        warn!("Frame {} ({}) failed to load: {}", frame, url, reason);
                        FrameSlot::Failed(reason)
                    }
                };
                let loaded = matches!(slot, FrameSlot::Loaded(_));
                if self.store.borrow_mut().record(frame, slot) {
                    on_frame(frame, loaded);
                }
            });
        join_all(requests).await;
    }
}

async fn load_frame<T: Transport>(transport: &T, url: &str) -> Result<RgbaImage, String> {
    let response = transport
        .fetch(HttpRequest::get(url))
        .await
        .map_err(|err| err.to_string())?;
    if !response.is_success() {
        return Err(format!("status {}", response.status));
    }
    image::load_from_memory(&response.body)
        .map(|image| image.to_rgba8())
        .map_err(|err| err.to_string())
}
