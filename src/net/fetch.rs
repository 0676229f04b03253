use js_sys::Uint8Array;
use log::debug;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::Response;

use crate::js_api::describe_js_error;

use super::{HttpMethod, HttpRequest, HttpResponse, Transport, TransportError};

/// Browser `fetch()` backed transport.
#[derive(Clone, Copy, Debug, Default)]
pub struct FetchTransport;

impl Transport for FetchTransport {
    async fn fetch(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        debug!("fetch {:?} {}", request.method, request.url);
        let url = request.url.clone();
        fetch_request(request)
            .await
            .map_err(|err| TransportError::new(&url, describe_js_error(&err)))
    }
}

async fn fetch_request(request: HttpRequest) -> Result<HttpResponse, JsValue> {
    let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;

    let opts = web_sys::RequestInit::new();
    opts.set_method(match request.method {
        HttpMethod::Get => "GET",
        HttpMethod::Post => "POST",
    });
    if let Some(body) = &request.body {
        opts.set_body(&JsValue::from_str(body));
    }
    let headers = web_sys::Headers::new()?;
    for (name, value) in &request.headers {
        headers.set(name, value)?;
    }
    opts.set_headers(&headers);

    let js_request = web_sys::Request::new_with_str_and_init(&request.url, &opts)?;
    let resp_value = JsFuture::from(window.fetch_with_request(&js_request)).await?;
    let resp: Response = resp_value.dyn_into()?;

    let buffer = JsFuture::from(resp.array_buffer()?).await?;
    let body = Uint8Array::new(&buffer).to_vec();

    Ok(HttpResponse::new(resp.status(), body))
}
