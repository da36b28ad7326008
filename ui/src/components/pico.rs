//! A set of reusable, lifetime-free Dioxus components for the Pico.css framework.
//! To use, ensure you have pico.min.css linked in your main application.
//! These are pure presentation: they take labels, state and callbacks, and
//! hold no scanner logic.

#![allow(non_snake_case)] // Allow PascalCase for component function names

use dioxus::html::input_data::keyboard_types::Key;
use dioxus::prelude::*;

use crate::compat;

//=============================================================================
// Layout Components
//=============================================================================

/// A centered container for your content.
/// Wraps content in a `<main class="container">` element.
#[component]
pub fn Container(children: Element) -> Element {
    rsx! { main { class: "container", {children} } }
}

//=============================================================================
// Content Components
//=============================================================================

#[derive(Props, PartialEq, Clone)]
pub struct CardProps {
    #[props(optional)]
    header: Option<Element>,
    children: Element,
}

/// A card for grouping related content.
/// Wraps content in an `<article>` element, with an optional `<header>`.
pub fn Card(props: CardProps) -> Element {
    rsx! {
        article {
            if let Some(heading) = props.header {
                header { {heading} }
            }
            {props.children}
        }
    }
}

/// An error banner. Renders nothing for an empty message.
#[component]
pub fn Alert(message: Option<String>) -> Element {
    rsx! {
        if let Some(message) = message {
            p {
                role: "alert",
                class: "scanner-alert",
                "{message}"
            }
        }
    }
}

//=============================================================================
// Interactive Components
//=============================================================================

#[derive(PartialEq, Clone, Copy, Default)]
pub enum ButtonType {
    #[default]
    Primary,
    Secondary,
    /// For actions that end something, e.g. stopping the camera.
    Danger,
}

impl ButtonType {
    fn to_class(self, outline: bool) -> &'static str {
        match (self, outline) {
            (ButtonType::Primary, false) => "",
            (ButtonType::Primary, true) => "outline",
            (ButtonType::Secondary, false) => "secondary",
            (ButtonType::Secondary, true) => "secondary outline",
            (ButtonType::Danger, _) => "scanner-danger",
        }
    }
}

#[derive(Props, PartialEq, Clone)]
pub struct ButtonProps {
    children: Element,
    #[props(optional)]
    on_click: Option<EventHandler<MouseEvent>>,
    #[props(default)]
    button_type: ButtonType,
    #[props(default = false)]
    outline: bool,
    #[props(default = false)]
    disabled: bool,
}

/// A versatile button component.
pub fn Button(props: ButtonProps) -> Element {
    rsx! {
        button {
            class: "{props.button_type.to_class(props.outline)}",
            disabled: props.disabled,
            onclick: move |evt| {
                if let Some(handler) = &props.on_click {
                    handler.call(evt);
                }
            },
            {props.children}
        }
    }
}

#[derive(Props, PartialEq, Clone)]
pub struct SwitchProps {
    label: String,
    checked: bool,
    on_change: EventHandler<bool>,
    #[props(default = false)]
    disabled: bool,
}

/// A labelled Pico switch (`<input type="checkbox" role="switch">`).
pub fn Switch(props: SwitchProps) -> Element {
    rsx! {
        label {
            input {
                r#type: "checkbox",
                role: "switch",
                checked: props.checked,
                disabled: props.disabled,
                onchange: move |_| props.on_change.call(!props.checked),
            }
            "{props.label}"
        }
    }
}

/// Copies `text_to_copy` to the clipboard and briefly confirms it.
#[component]
pub fn CopyButton(text_to_copy: String) -> Element {
    let clipboard = compat::use_clipboard_writer();
    let mut copied = use_signal(|| false);

    rsx! {
        Button {
            button_type: ButtonType::Secondary,
            outline: true,
            on_click: move |_| {
                let clipboard = clipboard.clone();
                let text = text_to_copy.clone();
                spawn(async move {
                    if clipboard.write(text).await {
                        copied.set(true);
                        compat::sleep(std::time::Duration::from_secs(2)).await;
                        copied.set(false);
                    } else {
                        dioxus_logger::tracing::warn!("clipboard write failed");
                    }
                });
            },
            if copied() { "Copied" } else { "Copy" }
        }
    }
}

#[derive(Props, PartialEq, Clone)]
pub struct ModalProps {
    is_open: bool,
    title: String,
    on_close: EventHandler<()>,
    children: Element,
}

/// A dialog that closes through `on_close`: the close link, a backdrop
/// click, or Escape. The owner decides what closing means.
pub fn Modal(props: ModalProps) -> Element {
    rsx! {
        if props.is_open {
            dialog {
                open: true,
                autofocus: true,
                onclick: move |_| props.on_close.call(()),
                onkeydown: move |evt| {
                    if evt.key() == Key::Escape {
                        props.on_close.call(());
                    }
                },
                // The <article> stops clicks from reaching the backdrop.
                article {
                    onclick: |evt| evt.stop_propagation(),
                    header {
                        a {
                            href: "#",
                            "aria-label": "Close",
                            class: "close",
                            onclick: move |evt| {
                                evt.prevent_default();
                                props.on_close.call(());
                            }
                        }
                        h3 { style: "margin-bottom: 0;", "{props.title}" }
                    }
                    {props.children}
                }
            }
        }
    }
}
