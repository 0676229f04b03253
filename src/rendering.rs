use std::cell::RefCell;

use image::RgbaImage;
use log::warn;
use wasm_bindgen::{Clamped, prelude::*};

use crate::page::animation::FrameIndex;

pub const DEFAULT_CANVAS_CONTAINER: &str = "#frame_canvas_container";

pub struct PageCanvasRenderer {
    pub container_element: Option<web_sys::HtmlElement>,
    pub canvas: web_sys::HtmlCanvasElement,
    pub ctx2d: web_sys::CanvasRenderingContext2d,
    pub size: (u32, u32),
    pub drawn_frame: Option<FrameIndex>,
}

impl PageCanvasRenderer {
    pub fn set_size(&mut self, width: u32, height: u32) {
        if self.size == (width, height) {
            return;
        }
        self.size = (width, height);
        self.canvas.set_width(width);
        self.canvas.set_height(height);
    }

    pub fn set_container_element(
        &mut self,
        container_element: web_sys::HtmlElement,
    ) -> Result<(), JsValue> {
        if self.canvas.parent_node().is_some() {
            self.canvas.remove();
        }
        container_element.append_child(&self.canvas)?;
        self.container_element = Some(container_element);
        Ok(())
    }

    /// Frames that are still loading leave the previous picture in place.
    pub fn draw_frame(&mut self, frame: FrameIndex, image: Option<&RgbaImage>) {
        let Some(image) = image else {
            return;
        };
        self.set_size(image.width(), image.height());
        let image_data = web_sys::ImageData::new_with_u8_clamped_array_and_sh(
            Clamped(image.as_raw().as_slice()),
            image.width(),
            image.height(),
        );
        match image_data {
            Ok(image_data) => match self.ctx2d.put_image_data(&image_data, 0.0, 0.0) {
                Ok(()) => self.drawn_frame = Some(frame),
                Err(err) => warn!("Failed to draw frame {}: {:?}", frame, err),
            },
            Err(err) => warn!("Failed to wrap frame {}: {:?}", frame, err),
        }
    }
}

thread_local! {
    pub static RENDERER_LOCK: RefCell<Option<PageCanvasRenderer>> = const { RefCell::new(None) };
}

pub fn with_canvas_renderer_mut<F, R>(f: F) -> R
where
    F: FnOnce(&mut Option<PageCanvasRenderer>) -> R,
{
    RENDERER_LOCK.with_borrow_mut(f)
}

fn document() -> Result<web_sys::Document, JsValue> {
    web_sys::window()
        .and_then(|window| window.document())
        .ok_or_else(|| JsValue::from_str("no document"))
}

/// Creates the frame canvas inside `container_selector`, or
/// `#frame_canvas_container` when empty. Calling it again moves the
/// existing canvas.
#[wasm_bindgen]
pub fn page_create_canvas(container_selector: &str) -> Result<(), JsValue> {
    let selector = if container_selector.is_empty() {
        DEFAULT_CANVAS_CONTAINER
    } else {
        container_selector
    };
    let document = document()?;
    let container_element = document
        .query_selector(selector)?
        .ok_or_else(|| JsValue::from_str(&format!("{} not found", selector)))?
        .dyn_into::<web_sys::HtmlElement>()?;

    with_canvas_renderer_mut(|renderer_lock| -> Result<(), JsValue> {
        if renderer_lock.is_none() {
            let canvas = document
                .create_element("canvas")?
                .dyn_into::<web_sys::HtmlCanvasElement>()?;
            let canvas_size = (1, 1);
            canvas.set_width(canvas_size.0);
            canvas.set_height(canvas_size.1);
            canvas.style().set_property("width", "100%").unwrap_or(());
            canvas.style().set_property("height", "100%").unwrap_or(());
            canvas.style().set_property("object-fit", "cover").unwrap_or(());

            let ctx = canvas
                .get_context("2d")?
                .ok_or_else(|| JsValue::from_str("2d context unavailable"))?
                .dyn_into::<web_sys::CanvasRenderingContext2d>()?;

            *renderer_lock = Some(PageCanvasRenderer {
                container_element: None,
                canvas,
                ctx2d: ctx,
                size: canvas_size,
                drawn_frame: None,
            });
        }
        match renderer_lock.as_mut() {
            Some(renderer) => renderer.set_container_element(container_element),
            None => Ok(()),
        }
    })
}
