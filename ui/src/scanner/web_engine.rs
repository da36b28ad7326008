//! Browser engine: `getUserMedia` into the preview `<video>`, frames sampled
//! through an offscreen canvas on a timer and handed to `rqrr`.

use async_trait::async_trait;
use dioxus_logger::tracing::{debug, info, warn};
use futures::channel::oneshot;
use gloo_timers::callback::Interval;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;
use web_sys::{
    CanvasRenderingContext2d, HtmlCanvasElement, HtmlVideoElement, MediaStream,
    MediaStreamConstraints,
};

use super::decode;
use super::engine::{AttachConfig, DecoderEngine, FacingConstraint, FrameEvent, FrameSink, ImageFile};
use super::error::EngineError;

/// Ideal capture width. Enough detail for small codes without making every
/// canvas read expensive.
const IDEAL_WIDTH: i32 = 1280;

#[derive(Default)]
pub struct WebDecoderEngine {
    stream: Option<MediaStream>,
    video: Option<HtmlVideoElement>,
    // dropping the interval cancels it
    ticker: Option<Interval>,
}

impl WebDecoderEngine {
    pub fn new() -> Self {
        Self::default()
    }

    fn close(&mut self) {
        self.ticker = None;
        if let Some(video) = self.video.take() {
            video.set_src_object(None);
        }
        if let Some(stream) = self.stream.take() {
            stop_tracks(&stream);
        }
    }
}

#[async_trait(?Send)]
impl DecoderEngine for WebDecoderEngine {
    type Surface = HtmlVideoElement;

    async fn attach(
        &mut self,
        surface: &HtmlVideoElement,
        config: &AttachConfig,
        sink: FrameSink,
    ) -> Result<(), EngineError> {
        if self.stream.is_some() {
            debug!("attach ignored: a stream is already open");
            return Ok(());
        }

        let (canvas, ctx) = offscreen_canvas()?;
        let constraints = build_constraints(config).map_err(platform_error)?;
        let stream = request_stream(constraints).await?;

        surface.set_src_object(Some(&stream));
        // owned from here on, so a drop during play() still stops the tracks
        self.stream = Some(stream);
        self.video = Some(surface.clone());

        if let Ok(promise) = surface.play() {
            // autoplay policy may reject play(); frames still arrive once the user interacts
            if let Err(e) = JsFuture::from(promise).await {
                debug!("video.play() rejected: {:?}", e);
            }
        }

        let video = surface.clone();
        let region_size = config.decode_region;
        let ticker = Interval::new(config.frame_interval_ms(), move || {
            let event = match scan_frame(&video, &canvas, &ctx, region_size) {
                Some(Ok(content)) => FrameEvent::Decoded(content),
                Some(Err(e)) => FrameEvent::Miss(e.to_string()),
                // video not ready
                None => return,
            };
            sink.send(event);
        });

        info!(
            "camera stream open, sampling every {}ms",
            config.frame_interval_ms()
        );
        self.ticker = Some(ticker);
        Ok(())
    }

    async fn detach(&mut self) -> Result<(), EngineError> {
        self.close();
        Ok(())
    }

    async fn decode_still_image(&mut self, image: &ImageFile) -> Result<String, EngineError> {
        decode::decode_image_bytes(&image.bytes)
    }

    fn is_attached(&self) -> bool {
        self.stream.is_some()
    }

    fn release(&mut self) {
        self.close();
    }
}

/// Requests the camera. The browser promise is awaited on its own task so
/// that a stream granted after the caller went away (unmount during a
/// permission prompt) is still stopped.
async fn request_stream(constraints: MediaStreamConstraints) -> Result<MediaStream, EngineError> {
    let media_devices = web_sys::window()
        .ok_or_else(|| EngineError::Platform("no global `window` exists".to_string()))?
        .navigator()
        .media_devices()
        .map_err(|_| EngineError::Unavailable("media devices are not available".to_string()))?;
    let promise = media_devices
        .get_user_media_with_constraints(&constraints)
        .map_err(camera_error)?;

    let (tx, rx) = oneshot::channel();
    wasm_bindgen_futures::spawn_local(async move {
        let result = JsFuture::from(promise).await.map(MediaStream::from);
        if let Err(Ok(stream)) = tx.send(result) {
            warn!("camera granted after the scanner was released; closing it");
            stop_tracks(&stream);
        }
    });

    match rx.await {
        Ok(result) => result.map_err(camera_error),
        Err(_) => Err(EngineError::Platform("camera request was dropped".to_string())),
    }
}

fn build_constraints(config: &AttachConfig) -> Result<MediaStreamConstraints, JsValue> {
    let set = |target: &js_sys::Object, key: &str, value: &JsValue| {
        js_sys::Reflect::set(target, &JsValue::from_str(key), value).map(|_| ())
    };
    let ideal = |value: JsValue| -> Result<js_sys::Object, JsValue> {
        let object = js_sys::Object::new();
        set(&object, "ideal", &value)?;
        Ok(object)
    };

    // { exact: "environment" } or { ideal: "environment" }
    let facing_mode = js_sys::Object::new();
    let strictness = match config.constraint {
        FacingConstraint::Exact => "exact",
        FacingConstraint::Ideal => "ideal",
    };
    set(
        &facing_mode,
        strictness,
        &JsValue::from_str(config.facing.facing_mode()),
    )?;

    let video = js_sys::Object::new();
    set(&video, "facingMode", &facing_mode)?;
    set(&video, "aspectRatio", &ideal(JsValue::from_f64(config.aspect_ratio))?)?;
    set(&video, "width", &ideal(JsValue::from(IDEAL_WIDTH))?)?;

    let constraints = js_sys::Object::new();
    set(&constraints, "video", &video)?;
    set(&constraints, "audio", &JsValue::FALSE)?;
    Ok(constraints.unchecked_into())
}

fn offscreen_canvas() -> Result<(HtmlCanvasElement, CanvasRenderingContext2d), EngineError> {
    let document = web_sys::window()
        .and_then(|window| window.document())
        .ok_or_else(|| EngineError::Platform("no document".to_string()))?;
    let canvas: HtmlCanvasElement = document
        .create_element("canvas")
        .map_err(platform_error)?
        .dyn_into()
        .map_err(|_| EngineError::Platform("failed to cast to HtmlCanvasElement".to_string()))?;
    let ctx = canvas
        .get_context("2d")
        .map_err(platform_error)?
        .ok_or_else(|| EngineError::Platform("2d context unavailable".to_string()))?
        .dyn_into::<CanvasRenderingContext2d>()
        .map_err(|_| EngineError::Platform("failed to cast 2d context".to_string()))?;
    Ok((canvas, ctx))
}

/// Samples the decode region of the current video frame.
/// Returns `None` until the video has dimensions.
fn scan_frame(
    video: &HtmlVideoElement,
    canvas: &HtmlCanvasElement,
    ctx: &CanvasRenderingContext2d,
    region_size: u32,
) -> Option<Result<String, EngineError>> {
    let width = video.video_width();
    let height = video.video_height();
    if width == 0 || height == 0 {
        return None;
    }

    let region = decode::centered_region(width, height, region_size);
    if region.size == 0 {
        return None;
    }
    if canvas.width() != region.size || canvas.height() != region.size {
        canvas.set_width(region.size);
        canvas.set_height(region.size);
    }

    let size = region.size as f64;
    if let Err(e) = ctx.draw_image_with_html_video_element_and_sw_and_sh_and_dx_and_dy_and_dw_and_dh(
        video,
        region.x as f64,
        region.y as f64,
        size,
        size,
        0.0,
        0.0,
        size,
        size,
    ) {
        return Some(Err(platform_error(e)));
    }

    let image_data = match ctx.get_image_data(0.0, 0.0, size, size) {
        Ok(data) => data,
        Err(e) => return Some(Err(platform_error(e))),
    };
    let luma = decode::luma_from_rgba(&image_data.data().0);
    Some(decode::decode_luma(region.size, region.size, luma))
}

fn stop_tracks(stream: &MediaStream) {
    stream
        .get_tracks()
        .for_each(&mut |track, _, _| web_sys::MediaStreamTrack::from(track).stop());
}

fn js_field(value: &JsValue, key: &str) -> Option<String> {
    js_sys::Reflect::get(value, &JsValue::from_str(key))
        .ok()
        .and_then(|v| v.as_string())
}

/// Maps a `getUserMedia` rejection (a `DOMException`) onto [`EngineError`].
fn camera_error(err: JsValue) -> EngineError {
    let message = js_field(&err, "message").unwrap_or_default();
    match js_field(&err, "name").as_deref() {
        Some("NotAllowedError") | Some("SecurityError") => EngineError::PermissionDenied,
        Some("OverconstrainedError") => EngineError::ConstraintUnsatisfied,
        Some("NotFoundError") | Some("NotReadableError") | Some("AbortError") => {
            EngineError::Unavailable(message)
        }
        _ => platform_error(err),
    }
}

fn platform_error(err: JsValue) -> EngineError {
    EngineError::Platform(err.as_string().unwrap_or_else(|| format!("{:?}", err)))
}
