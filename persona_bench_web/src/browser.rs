//! Browser-side plumbing: timers, Chart.js objects, file reading and downloads.

use gloo_timers::callback::Interval;
use persona_bench::export::EXPORT_MIME;
use persona_bench::{Disposable, ExportFile, IntervalScheduler, LogFile, TimerHandle};
use serde::Serialize;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{
    Blob, BlobPropertyBag, Document, File, FileList, HtmlAnchorElement, ScrollBehavior,
    ScrollIntoViewOptions, Url,
};

/// `setInterval` on the page's event loop.
#[derive(Clone, Copy, Debug, Default)]
pub struct BrowserScheduler;

pub struct IntervalTicker(Interval);

impl TimerHandle for IntervalTicker {
    fn cancel(self) {
        self.0.cancel();
    }
}

impl IntervalScheduler for BrowserScheduler {
    type Handle = IntervalTicker;

    fn every(&self, period_ms: u32, tick: Box<dyn FnMut()>) -> IntervalTicker {
        IntervalTicker(Interval::new(period_ms, tick))
    }
}

/// A live `Chart` instance; destroyed before its canvas is reused.
pub struct ChartJsHandle(JsValue);

impl Disposable for ChartJsHandle {
    fn dispose(self) {
        let destroy = js_sys::Reflect::get(&self.0, &JsValue::from_str("destroy"))
            .ok()
            .and_then(|f| f.dyn_into::<js_sys::Function>().ok());
        if let Some(destroy) = destroy {
            let _ = destroy.call0(&self.0);
        }
    }
}

/// `new Chart(canvas, config)`; `None` if Chart.js or the canvas is missing.
pub fn draw_chart(canvas_id: &str, config: &serde_json::Value) -> Option<ChartJsHandle> {
    let canvas = document()?.get_element_by_id(canvas_id)?;
    let ctor = js_sys::Reflect::get(&js_sys::global(), &JsValue::from_str("Chart"))
        .ok()?
        .dyn_into::<js_sys::Function>()
        .ok()?;
    let config = config
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .ok()?;
    let args = js_sys::Array::of2(&canvas.into(), &config);
    js_sys::Reflect::construct(&ctor, &args)
        .ok()
        .map(ChartJsHandle)
}

pub fn document() -> Option<Document> {
    web_sys::window()?.document()
}

pub fn element_exists(id: &str) -> bool {
    document()
        .and_then(|doc| doc.get_element_by_id(id))
        .is_some()
}

pub fn scroll_to(id: &str) {
    if let Some(element) = document().and_then(|doc| doc.get_element_by_id(id)) {
        let options = ScrollIntoViewOptions::new();
        options.set_behavior(ScrollBehavior::Smooth);
        element.scroll_into_view_with_scroll_into_view_options(&options);
    }
}

/// `lang` attribute of the root element, as rendered by the server.
pub fn page_lang() -> Option<String> {
    document()?.document_element()?.get_attribute("lang")
}

pub fn reload() {
    if let Some(window) = web_sys::window() {
        let _ = window.location().reload();
    }
}

pub async fn read_file(file: &File) -> Option<LogFile> {
    let buffer = JsFuture::from(file.array_buffer()).await.ok()?;
    let array = js_sys::Uint8Array::new(&buffer);
    let mut bytes = vec![0u8; array.length() as usize];
    array.copy_to(&mut bytes[..]);
    Some(LogFile::new(file.name(), bytes))
}

/// Only the first file of a selection is uploaded.
pub async fn read_first(list: &FileList) -> Option<LogFile> {
    let file = list.item(0)?;
    read_file(&file).await
}

pub fn download(file: &ExportFile) -> Result<(), JsValue> {
    let parts = js_sys::Array::of1(&JsValue::from_str(&file.contents));
    let options = BlobPropertyBag::new();
    options.set_type(EXPORT_MIME);
    let blob = Blob::new_with_str_sequence_and_options(&parts, &options)?;
    let url = Url::create_object_url_with_blob(&blob)?;
    let document = document().ok_or_else(|| JsValue::from_str("no document"))?;
    let anchor: HtmlAnchorElement = document.create_element("a")?.dyn_into()?;
    anchor.set_href(&url);
    anchor.set_download(&file.filename);
    anchor.click();
    Url::revoke_object_url(&url)
}
