pub mod config;
pub mod js_api;
pub mod net;
pub mod page;
pub mod rendering;
pub mod storefront;
mod utils;

use std::cell::RefCell;

use config::{PageConfig, StorefrontSettings};
use js_api::JsPageHost;
use log::info;
use net::FetchTransport;
use page::commands::{PageCommand, init_page, page_dispatch};
use utils::{document_base_url, set_panic_hook};
use wasm_bindgen::prelude::*;

thread_local! {
    static STOREFRONT_OVERRIDES: RefCell<StorefrontSettings> = RefCell::new(StorefrontSettings::default());
}

fn js_string(params: &js_sys::Object, key: &str) -> Option<String> {
    js_sys::Reflect::get(params, &JsValue::from_str(key))
        .ok()
        .and_then(|value| value.as_string())
}

fn js_bool(params: &js_sys::Object, key: &str) -> Option<bool> {
    js_sys::Reflect::get(params, &JsValue::from_str(key))
        .ok()
        .and_then(|value| value.as_bool())
}

/// Storefront values handed over by the page shell. Must be called before
/// `start_page` to take effect.
#[wasm_bindgen]
pub fn set_storefront_config(params: js_sys::Object) {
    let settings = StorefrontSettings {
        store_domain: js_string(&params, "storeDomain"),
        access_token: js_string(&params, "storefrontAccessToken"),
        variant_id: js_string(&params, "productVariantId"),
        api_version: js_string(&params, "apiVersion"),
        direct_cart_only: js_bool(&params, "directCart"),
    };
    STOREFRONT_OVERRIDES.with_borrow_mut(|overrides| {
        *overrides = std::mem::take(overrides).merge(settings);
    });
}

#[wasm_bindgen]
pub fn start_page(path: String) -> Result<(), JsValue> {
    let overrides = STOREFRONT_OVERRIDES.with_borrow(StorefrontSettings::clone);
    let config = PageConfig::from_build_env(overrides).map_err(|err| {
        console_error!("Invalid page configuration: {}", err);
        JsValue::from_str(&err.to_string())
    })?;
    let base_url = document_base_url();
    if base_url.is_none() {
        console_warn!("Could not determine document base URL, frame paths stay relative to the page");
    }
    info!("Starting page at {}", path);
    init_page(JsPageHost, FetchTransport, config, base_url, &path);
    Ok(())
}

#[wasm_bindgen]
pub fn navigate(path: String) {
    page_dispatch(PageCommand::Navigate(path));
}

#[wasm_bindgen]
pub fn scroll(scroll_y: f64, timestamp: f64) {
    page_dispatch(PageCommand::Scroll {
        scroll_y,
        at_ms: timestamp,
    });
}

#[wasm_bindgen]
pub fn animation_frame(handle: u32, timestamp: f64) {
    page_dispatch(PageCommand::AnimationFrame {
        handle,
        at_ms: timestamp,
    });
}

#[wasm_bindgen]
pub fn trigger_timeout(timeout_name: String) {
    page_dispatch(PageCommand::TimeoutTriggered(timeout_name));
}

#[wasm_bindgen]
pub fn primary_media_ended() {
    page_dispatch(PageCommand::PrimaryMediaEnded);
}

#[wasm_bindgen]
pub fn login(password: String) {
    page_dispatch(PageCommand::Login(password));
}

#[wasm_bindgen]
pub fn logout() {
    page_dispatch(PageCommand::Logout);
}

#[wasm_bindgen]
pub fn acquire() {
    page_dispatch(PageCommand::Acquire);
}

#[wasm_bindgen]
pub fn teardown() {
    page_dispatch(PageCommand::Teardown);
}

#[wasm_bindgen(start)]
pub fn main() {
    set_panic_hook();
    console_log::init_with_level(log::Level::Info).unwrap_or(());
}
