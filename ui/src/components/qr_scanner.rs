//=============================================================================
// File: src/components/qr_scanner.rs
//=============================================================================

use dioxus::prelude::*;

use crate::compat;
use crate::components::pico::{Alert, Button, ButtonType, Card, CopyButton, Switch};
use crate::hooks::use_scan_controller::use_scan_controller;
use crate::scanner::platform::surface_from_mounted;
use crate::scanner::{ScanCommand, ScanState, ScannerSettings};

// Rendered inside the component, so it comes and goes with it.
const SCANNER_CSS: &str = r#"
.qr-scanner { max-width: 500px; margin: auto; }
.qr-scanner .scanner-header { display: flex; align-items: center; justify-content: space-between; gap: 1rem; }
.qr-scanner .scanner-header button { margin-bottom: 0; }
.qr-scanner .scanner-preview {
    width: 100%;
    aspect-ratio: 4 / 3;
    object-fit: cover;
    border-radius: var(--pico-border-radius);
    border: 1px solid var(--pico-form-element-border-color);
    background-color: var(--pico-muted-background-color);
}
.qr-scanner .scanner-preview.hidden { display: none; }
.qr-scanner .scanner-alert { color: var(--pico-del-color); }
.qr-scanner .scanner-result-text {
    padding: 0.75rem;
    word-break: break-all;
    border-radius: var(--pico-border-radius);
    background-color: var(--pico-muted-background-color);
}
.qr-scanner .scanner-actions { display: flex; flex-wrap: wrap; gap: 0.75rem; }
.qr-scanner .scanner-danger { background-color: var(--pico-del-color); border-color: var(--pico-del-color); }
"#;

/// Scans QR codes from the camera or from an uploaded image.
///
/// `on_scan` is called once for every new decoded payload. When `on_close` is
/// given, a Close button dismisses the scanner (releasing the camera) and then
/// calls it.
#[component]
pub fn QrScanner(
    on_scan: Option<EventHandler<String>>,
    on_close: Option<EventHandler<()>>,
) -> Element {
    let settings = use_hook(ScannerSettings::from_env);
    let scanner = use_scan_controller(settings);
    let session = scanner.session();

    // a memo so the effect below only fires when the payload changes
    let last_result = use_memo(move || session.read().last_result.clone());
    use_effect(move || {
        if let (Some(text), Some(handler)) = (last_result(), on_scan) {
            handler.call(text);
        }
    });

    let snapshot = session.read().clone();
    let busy = snapshot.is_busy();
    let facing = snapshot.facing;
    let show_preview = snapshot.is_scanning || snapshot.state.is_starting();

    // --- Pre-build conditional UI elements to simplify the main rsx! macro ---

    let status_display: Option<Element> = match snapshot.state {
        ScanState::Starting => Some(rsx! { p { "aria-busy": "true", "Starting camera..." } }),
        ScanState::Stopping => Some(rsx! { p { "aria-busy": "true", "Stopping camera..." } }),
        _ => None,
    };

    let result_display: Option<Element> = snapshot.last_result.clone().map(|text| {
        rsx! {
            section {
                h4 { "Result" }
                p { class: "scanner-result-text", "{text}" }
                div {
                    class: "scanner-actions",
                    CopyButton { text_to_copy: text.clone() }
                    Button {
                        button_type: ButtonType::Secondary,
                        on_click: move |_| scanner.send(ScanCommand::Dismiss),
                        "Dismiss"
                    }
                }
            }
        }
    });

    let close_button: Option<Element> = on_close.map(|handler| {
        rsx! {
            Button {
                button_type: ButtonType::Secondary,
                outline: true,
                on_click: move |_| {
                    scanner.send(ScanCommand::Dismiss);
                    handler.call(());
                },
                "Close"
            }
        }
    });

    let header = rsx! {
        div {
            class: "scanner-header",
            strong { "Scan QR Code" }
            Button {
                button_type: if snapshot.is_scanning { ButtonType::Danger } else { ButtonType::Primary },
                disabled: busy,
                on_click: move |_| scanner.send(ScanCommand::Toggle),
                if snapshot.is_scanning { "Stop" } else { "Start" }
            }
        }
    };

    rsx! {
        style { {SCANNER_CSS} }
        div {
            class: "qr-scanner",
            Card {
                header,

                Switch {
                    label: facing.label().to_string(),
                    checked: facing.is_front(),
                    disabled: busy,
                    on_change: move |_| scanner.send(ScanCommand::SetFacing(facing.toggled())),
                }

                Alert { message: snapshot.last_error.clone() }
                {status_display}

                video {
                    class: if show_preview { "scanner-preview" } else { "scanner-preview hidden" },
                    autoplay: true,
                    playsinline: true,
                    muted: true,
                    onmounted: move |evt: MountedEvent| {
                        if let Some(surface) = surface_from_mounted(&evt.data()) {
                            scanner.send(ScanCommand::BindSurface(surface));
                        }
                    },
                }

                {result_display}

                div {
                    class: "scanner-actions",
                    style: "margin-top: 1rem;",
                    Button {
                        button_type: ButtonType::Secondary,
                        outline: true,
                        on_click: move |_| {
                            spawn(async move {
                                match compat::read_image_file().await {
                                    Ok(Some(image)) => scanner.send(ScanCommand::DecodeImage(image)),
                                    Ok(None) => {}
                                    Err(e) => {
                                        dioxus_logger::tracing::warn!("could not read the selected image: {}", e);
                                    }
                                }
                            });
                        },
                        "Upload Image"
                    }
                    {close_button}
                }
            }
        }
    }
}
