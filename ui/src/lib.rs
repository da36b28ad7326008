// The client-side Dioxus application logic.

use dioxus::prelude::*;

pub mod compat;
mod components;
pub mod hooks;
pub mod scanner;

use components::pico::{Button, ButtonType, Card, Container, CopyButton, Modal};
pub use components::qr_scanner::QrScanner;

const PICO_CSS: &str = "https://cdn.jsdelivr.net/npm/@picocss/pico@2/css/pico.cyan.min.css";

//=============================================================================
// MAIN APPLICATION COMPONENT (Client-side)
//=============================================================================

#[allow(non_snake_case)]
pub fn App() -> Element {
    rsx! {
        document::Meta {
            name: "viewport",
            content: "width=device-width, initial-scale=1.0",
        }
        document::Stylesheet {
            href: PICO_CSS,
        }
        AppBody {}
    }
}

/// Hosts the scanner in a modal. Closing the modal unmounts the scanner,
/// which releases the camera.
#[component]
fn AppBody() -> Element {
    let mut is_scanner_open = use_signal(|| false);
    let mut last_scanned = use_signal(|| None::<String>);

    rsx! {
        Container {
            Card {
                header: rsx! { h3 { style: "margin-bottom: 0;", "QR Scanner" } },
                p { "Scan a QR code with your camera, or upload an image that contains one." }
                Button {
                    button_type: ButtonType::Primary,
                    on_click: move |_| is_scanner_open.set(true),
                    "Open Scanner"
                }
                if let Some(text) = last_scanned() {
                    h4 { "Last scanned" }
                    p { style: "word-break: break-all;", "{text}" }
                    CopyButton { text_to_copy: text.clone() }
                }
            }
            Modal {
                is_open: is_scanner_open(),
                title: "Scan QR Code".to_string(),
                on_close: move |_| is_scanner_open.set(false),
                QrScanner {
                    on_scan: move |text: String| {
                        dioxus_logger::tracing::info!("scanned {} bytes", text.len());
                        last_scanned.set(Some(text));
                    },
                    on_close: move |_| is_scanner_open.set(false),
                }
            }
        }
    }
}
