use image::RgbaImage;
use js_sys::Object;
use log::warn;
use wasm_bindgen::prelude::*;

use crate::{
    page::{
        animation::FrameIndex,
        host::{AnimationFrameHandle, PageHost},
        routes::Route,
    },
    rendering::with_canvas_renderer_mut,
};

pub fn safe_string(s: &str) -> String {
    String::from_utf8_lossy(s.as_bytes()).into_owned()
}

pub fn safe_js_string(s: &str) -> JsValue {
    JsValue::from_str(&safe_string(s))
}

pub fn describe_js_error(value: &JsValue) -> String {
    if let Some(message) = value.as_string() {
        return message;
    }
    value
        .dyn_ref::<js_sys::Error>()
        .map(|err| String::from(err.message()))
        .unwrap_or_else(|| format!("{:?}", value))
}

#[wasm_bindgen(module = "mirror-landing-js-api")]
extern "C" {
    pub fn onFrameChanged(frame: u32, loaded: bool);
    pub fn onScrollLockChanged(locked: bool);
    pub fn onRequestAnimationFrame() -> u32;
    pub fn onCancelAnimationFrame(handle: u32);
    pub fn onScheduleTimeout(timeout_name: &str, interval: u32);
    pub fn onClearTimeout(timeout_name: &str);
    pub fn onRouteChanged(route: Object);
    pub fn onLoginError(message: Option<String>);
    pub fn onInventoryChanged(label: &str);
}

pub struct JsApi {}

impl JsApi {
    pub fn dispatch_frame_changed(frame: FrameIndex, loaded: bool) {
        onFrameChanged(frame.get(), loaded);
    }
    pub fn dispatch_scroll_lock_changed(locked: bool) {
        onScrollLockChanged(locked);
    }
    pub fn dispatch_request_animation_frame() -> AnimationFrameHandle {
        AnimationFrameHandle(onRequestAnimationFrame())
    }
    pub fn dispatch_cancel_animation_frame(handle: AnimationFrameHandle) {
        onCancelAnimationFrame(handle.0);
    }
    pub fn dispatch_schedule_timeout(timeout_name: &str, interval: u32) {
        onScheduleTimeout(timeout_name, interval);
    }
    pub fn dispatch_clear_timeout(timeout_name: &str) {
        onClearTimeout(timeout_name);
    }
    pub fn dispatch_route_changed(route: Route) {
        let route_map = js_sys::Map::new();
        route_map.str_set("name", &safe_js_string(route_name(route)));
        route_map.str_set("path", &safe_js_string(route.path()));
        route_map.str_set("animated", &JsValue::from_bool(route.is_animated()));
        onRouteChanged(route_map.to_js_object());
    }
    pub fn dispatch_login_error(message: Option<&str>) {
        onLoginError(message.map(safe_string));
    }
    pub fn dispatch_inventory_changed(label: &str) {
        onInventoryChanged(label);
    }
}

fn route_name(route: Route) -> &'static str {
    match route {
        Route::Home => "home",
        Route::Mirror => "mirror",
        Route::Password => "password",
    }
}

pub trait JsSerializable {
    fn to_js_object(&self) -> js_sys::Object;
}

pub trait JsUtils {
    fn str_set(&self, key: &str, value: &JsValue);
}

impl JsSerializable for js_sys::Map {
    fn to_js_object(&self) -> js_sys::Object {
        js_sys::Object::from_entries(self).unwrap_or_else(|_| js_sys::Object::new())
    }
}

impl JsUtils for js_sys::Map {
    fn str_set(&self, key: &str, value: &JsValue) {
        self.set(&safe_js_string(key), value);
    }
}

/// `PageHost` backed by the DOM and the JS shell module.
#[derive(Clone, Copy, Debug, Default)]
pub struct JsPageHost;

impl PageHost for JsPageHost {
    fn draw_frame(&self, frame: FrameIndex, image: Option<&RgbaImage>) {
        with_canvas_renderer_mut(|renderer| {
            if let Some(renderer) = renderer.as_mut() {
                renderer.draw_frame(frame, image);
            }
        });
        JsApi::dispatch_frame_changed(frame, image.is_some());
    }

    fn scroll_to(&self, scroll_y: f64) {
        if let Some(window) = web_sys::window() {
            window.scroll_to_with_x_and_y(0.0, scroll_y);
        }
    }

    /// The page keeps native scrolling while locked so the preview region
    /// stays reachable. Scrolls past it are reset through `scroll_to`.
    fn set_scroll_locked(&self, locked: bool) {
        JsApi::dispatch_scroll_lock_changed(locked);
    }

    fn request_animation_frame(&self) -> AnimationFrameHandle {
        JsApi::dispatch_request_animation_frame()
    }

    fn cancel_animation_frame(&self, handle: AnimationFrameHandle) {
        JsApi::dispatch_cancel_animation_frame(handle);
    }

    fn schedule_timeout(&self, name: &str, period_ms: u32) {
        JsApi::dispatch_schedule_timeout(name, period_ms);
    }

    fn clear_timeout(&self, name: &str) {
        JsApi::dispatch_clear_timeout(name);
    }

    fn show_route(&self, route: Route) {
        JsApi::dispatch_route_changed(route);
    }

    fn show_login_error(&self, message: Option<&str>) {
        JsApi::dispatch_login_error(message);
    }

    fn show_inventory(&self, label: &str) {
        JsApi::dispatch_inventory_changed(label);
    }

    fn redirect(&self, url: &str) {
        let result = web_sys::window()
            .ok_or_else(|| JsValue::from_str("no window"))
            .and_then(|window| window.location().set_href(url));
        if let Err(err) = result {
            warn!("Failed to redirect to {}: {}", url, describe_js_error(&err));
        }
    }
}
