use url::Url;

pub fn set_panic_hook() {
    // When the `console_error_panic_hook` feature is enabled, we can call the
    // `set_panic_hook` function at least once during initialization, and then
    // we will get better error messages if our code ever panics.
    //
    // For more details see
    // https://github.com/rustwasm/console_error_panic_hook#readme
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

#[macro_export]
macro_rules! console_warn {
  ($($arg:tt)*) => (
    web_sys::console::warn_1(&$crate::js_api::safe_js_string(&format_args!($($arg)*).to_string().as_str()))
  )
}

#[macro_export]
macro_rules! console_error {
  ($($arg:tt)*) => (
    web_sys::console::error_1(&$crate::js_api::safe_js_string(&format_args!($($arg)*).to_string().as_str()))
  )
}

/// Directory of the document, used to resolve relative frame paths.
pub fn get_base_url(url: &Url) -> Option<Url> {
    let mut result = url.clone();
    result.set_fragment(None);
    result.set_query(None);
    result.join("./").ok()
}

/// Base URL of the current document, if running in a browser.
pub fn document_base_url() -> Option<Url> {
    let href = web_sys::window()?.location().href().ok()?;
    let url = Url::parse(&href).ok()?;
    get_base_url(&url)
}
