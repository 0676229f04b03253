pub mod animation;
pub mod animator;
pub mod auth;
pub mod commands;
pub mod gate;
pub mod host;
pub mod inventory;
pub mod preload;
pub mod routes;
pub mod sampler;
pub mod session;
pub mod timeout;

pub use animator::ScrollAnimator;
pub use host::{AnimationFrameHandle, PageHost};
pub use session::{LandingSession, PageTask};
