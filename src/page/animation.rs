use serde::Deserialize;

use crate::config::ConfigError;

/// Scroll range over which the frame sequence plays.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AnimationWindow {
    start_offset: f64,
    length: f64,
}

impl AnimationWindow {
    pub fn new(start_offset: f64, length: f64) -> Result<AnimationWindow, ConfigError> {
        if !start_offset.is_finite() || !length.is_finite() || length <= 0.0 {
            return Err(ConfigError::InvalidWindow {
                start_offset,
                length,
            });
        }
        Ok(AnimationWindow {
            start_offset,
            length,
        })
    }

    pub fn progress_at(&self, scroll_y: f64) -> Progress {
        Progress::new((scroll_y - self.start_offset) / self.length)
    }
}

/// Position inside an [`AnimationWindow`], always within `0.0..=1.0`.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd, Default)]
pub struct Progress(f64);

impl Progress {
    pub const START: Progress = Progress(0.0);
    pub const END: Progress = Progress(1.0);

    /// Out of range values are expected while scrolling past either end of
    /// the window and are clamped.
    pub fn new(raw: f64) -> Progress {
        if raw.is_nan() {
            return Progress::START;
        }
        Progress(raw.clamp(0.0, 1.0))
    }

    pub fn value(self) -> f64 {
        self.0
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FrameIndex(u32);

impl FrameIndex {
    pub const FIRST: FrameIndex = FrameIndex(1);

    /// `None` for zero; frame numbering starts at one.
    pub fn new(index: u32) -> Option<FrameIndex> {
        (index >= 1).then_some(FrameIndex(index))
    }

    pub fn get(self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for FrameIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Easing {
    Linear,
    #[default]
    OutCubic,
    InOutCubic,
}

impl Easing {
    pub fn apply(self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Self::Linear => t,
            Self::OutCubic => {
                let inv = 1.0 - t;
                1.0 - inv * inv * inv
            }
            Self::InOutCubic => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    let inv = -2.0 * t + 2.0;
                    1.0 - inv * inv * inv / 2.0
                }
            }
        }
    }
}

/// Maps progress onto a frame of the sequence and remembers what is on
/// screen, so a redraw is only requested when the frame actually changes.
#[derive(Clone, Debug)]
pub struct FrameSelector {
    total_frames: u32,
    easing: Easing,
    rendered: Option<FrameIndex>,
}

impl FrameSelector {
    pub fn new(total_frames: u32, easing: Easing) -> FrameSelector {
        FrameSelector {
            total_frames: total_frames.max(1),
            easing,
            rendered: None,
        }
    }

    pub fn frame_for(&self, progress: Progress) -> FrameIndex {
        let eased = self.easing.apply(progress.value());
        let index = (eased * self.total_frames as f64).ceil() as u32;
        FrameIndex(index.clamp(1, self.total_frames))
    }

    pub fn select(&mut self, progress: Progress) -> Option<FrameIndex> {
        let frame = self.frame_for(progress);
        if self.rendered == Some(frame) {
            return None;
        }
        self.rendered = Some(frame);
        Some(frame)
    }

    pub fn rendered(&self) -> Option<FrameIndex> {
        self.rendered
    }
}
