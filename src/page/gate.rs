/// One-shot gate in front of the scroll animation. Playback of the intro
/// media has to finish before the page may be scrolled past the preview and
/// before scroll samples drive frames.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum UnlockGate {
    Locked { preview_limit: f64 },
    Unlocked,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ScrollVerdict {
    Allowed,
    /// The host has to put the page back at this offset.
    Reset(f64),
}

impl UnlockGate {
    pub fn new(preview_limit: f64) -> UnlockGate {
        UnlockGate::Locked {
            preview_limit: preview_limit.max(0.0),
        }
    }

    pub fn is_unlocked(&self) -> bool {
        matches!(self, UnlockGate::Unlocked)
    }

    /// Returns `true` only for the call that performs the transition.
    pub fn unlock(&mut self) -> bool {
        match self {
            UnlockGate::Locked { .. } => {
                *self = UnlockGate::Unlocked;
                true
            }
            UnlockGate::Unlocked => false,
        }
    }

    pub fn constrain(&self, scroll_y: f64) -> ScrollVerdict {
        match *self {
            UnlockGate::Locked { preview_limit } if scroll_y > preview_limit => {
                ScrollVerdict::Reset(preview_limit)
            }
            _ => ScrollVerdict::Allowed,
        }
    }
}
