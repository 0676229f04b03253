use image::RgbaImage;

use super::{animation::FrameIndex, routes::Route};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct AnimationFrameHandle(pub u32);

/// Side effects the page asks of its surroundings. The browser build forwards
/// these to the DOM and the JS shell; tests record them.
pub trait PageHost {
    /// `image` is `None` while the frame has not finished preloading.
    fn draw_frame(&self, frame: FrameIndex, image: Option<&RgbaImage>);
    fn scroll_to(&self, scroll_y: f64);
    fn set_scroll_locked(&self, locked: bool);
    fn request_animation_frame(&self) -> AnimationFrameHandle;
    fn cancel_animation_frame(&self, handle: AnimationFrameHandle);
    fn schedule_timeout(&self, name: &str, period_ms: u32);
    fn clear_timeout(&self, name: &str);
    fn show_route(&self, route: Route);
    fn show_login_error(&self, message: Option<&str>);
    fn show_inventory(&self, label: &str);
    /// Leaves the page, e.g. for the checkout.
    fn redirect(&self, url: &str);
}
