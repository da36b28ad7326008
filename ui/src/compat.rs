//! Host environment capabilities, one implementation per platform.
//!
//! Everything the scanner needs from its host (timers, clipboard, an image
//! file picker and vibration) is reached through here, so the rest of the
//! crate never has to care which platform it is running on.

// Re-export the public API from the appropriate module
#[cfg(target_arch = "wasm32")]
pub use wasm32::*;

#[cfg(not(target_arch = "wasm32"))]
pub use non_wasm32::*;

/// Extensions offered by the image file picker.
pub const IMAGE_EXTENSIONS: [&str; 6] = ["png", "jpg", "jpeg", "gif", "bmp", "webp"];

#[cfg(target_arch = "wasm32")]
pub mod wasm32 {
    use std::time::Duration;

    use futures::channel::oneshot;
    use wasm_bindgen::prelude::*;
    use wasm_bindgen_futures::JsFuture;
    use web_sys::{self, FileReader, HtmlInputElement, Window};

    use crate::scanner::engine::ImageFile;

    pub async fn sleep(duration: Duration) {
        gloo_timers::future::sleep(duration).await;
    }

    /// `navigator.vibrate`. Returns false when the browser has no vibration API.
    pub fn vibrate(duration: Duration) -> bool {
        let Some(window) = web_sys::window() else {
            return false;
        };
        let navigator = window.navigator();
        // Desktop Safari and Firefox do not expose `vibrate` at all.
        let supported = js_sys::Reflect::has(&navigator, &JsValue::from_str("vibrate"))
            .unwrap_or(false);
        supported && navigator.vibrate_with_duration(duration.as_millis() as u32)
    }

    /// Writes text through `navigator.clipboard`.
    #[derive(Clone)]
    pub struct ClipboardWriter;

    impl ClipboardWriter {
        pub async fn write(self, text: String) -> bool {
            match web_sys::window().map(|win: Window| win.navigator().clipboard()) {
                Some(clipboard) => {
                    let promise = clipboard.write_text(&text);
                    JsFuture::from(promise).await.is_ok()
                }
                _ => false,
            }
        }
    }

    pub fn use_clipboard_writer() -> ClipboardWriter {
        ClipboardWriter
    }

    /// Opens the browser's file picker for images and reads the chosen file.
    /// `Ok(None)` means the user picked nothing.
    pub async fn read_image_file() -> Result<Option<ImageFile>, String> {
        let (tx, rx) = oneshot::channel();
        let window = web_sys::window().ok_or("no window")?;
        let document = window.document().ok_or("no document")?;
        let body = document.body().ok_or("no body")?;
        let input: HtmlInputElement = document
            .create_element("input")
            .map_err(|e| e.as_string().unwrap_or_default())?
            .dyn_into()
            .map_err(|_| "Failed to cast to HtmlInputElement".to_string())?;
        input.set_type("file");
        input.set_accept("image/*");

        let onchange_closure = Closure::once(move |event: web_sys::Event| {
            let file = event
                .target()
                .and_then(|target| target.dyn_into::<HtmlInputElement>().ok())
                .and_then(|input| input.files())
                .and_then(|files| files.get(0));
            let Some(file) = file else {
                let _ = tx.send(Ok(None));
                return;
            };
            let reader = match FileReader::new() {
                Ok(reader) => reader,
                Err(_) => {
                    let _ = tx.send(Err("Failed to create a FileReader".to_string()));
                    return;
                }
            };
            let reader_clone = reader.clone();
            let name = file.name();
            let onload_closure = Closure::once(move |_: web_sys::ProgressEvent| {
                let loaded = reader_clone
                    .result()
                    .map(|buffer| js_sys::Uint8Array::new(&buffer).to_vec())
                    .map(|bytes| Some(ImageFile { name, bytes }))
                    .map_err(|_| "Failed to read the selected file".to_string());
                let _ = tx.send(loaded);
            });
            reader.set_onload(Some(onload_closure.as_ref().unchecked_ref()));
            if reader.read_as_array_buffer(&file).is_ok() {
                onload_closure.forget();
            }
        });
        input.set_onchange(Some(onchange_closure.as_ref().unchecked_ref()));
        onchange_closure.forget();

        body.append_child(&input)
            .map_err(|e| e.as_string().unwrap_or_default())?;
        input.click();
        body.remove_child(&input)
            .map_err(|e| e.as_string().unwrap_or_default())?;

        rx.await.map_err(|e| e.to_string())?
    }
}

#[cfg(not(target_arch = "wasm32"))]
pub mod non_wasm32 {
    use dioxus_clipboard::prelude::*;
    use std::time::Duration;

    use super::IMAGE_EXTENSIONS;
    use crate::scanner::engine::ImageFile;

    pub async fn sleep(duration: Duration) {
        tokio::time::sleep(duration).await;
    }

    /// Native builds have no vibration motor to drive.
    pub fn vibrate(_duration: Duration) -> bool {
        false
    }

    /// Writes text to the system clipboard. Obtain one with
    /// [`use_clipboard_writer`] while rendering.
    #[derive(Clone)]
    pub struct ClipboardWriter {
        clipboard: UseClipboard,
    }

    impl ClipboardWriter {
        pub async fn write(mut self, text: String) -> bool {
            self.clipboard.set(text).is_ok()
        }
    }

    pub fn use_clipboard_writer() -> ClipboardWriter {
        ClipboardWriter {
            clipboard: use_clipboard(),
        }
    }

    /// Prompts the user to select an image and reads it.
    pub async fn read_image_file() -> Result<Option<ImageFile>, String> {
        let file_handle = rfd::AsyncFileDialog::new()
            .add_filter("Images", &IMAGE_EXTENSIONS)
            .pick_file()
            .await;

        match file_handle {
            Some(handle) => Ok(Some(ImageFile {
                name: handle.file_name(),
                bytes: handle.read().await,
            })),
            None => Ok(None),
        }
    }
}
