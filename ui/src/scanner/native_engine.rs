use async_trait::async_trait;

use super::decode;
use super::engine::{AttachConfig, DecoderEngine, FrameSink, ImageFile};
use super::error::EngineError;

/// Engine for native builds. Decodes uploaded images; the webview gives us
/// no camera access, so every attach fails with a camera error.
#[derive(Debug, Default)]
pub struct StillImageEngine;

impl StillImageEngine {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait(?Send)]
impl DecoderEngine for StillImageEngine {
    type Surface = ();

    async fn attach(
        &mut self,
        _surface: &(),
        _config: &AttachConfig,
        _sink: FrameSink,
    ) -> Result<(), EngineError> {
        Err(EngineError::Unavailable(
            "live scanning is only supported in the browser; upload an image instead".to_string(),
        ))
    }

    async fn detach(&mut self) -> Result<(), EngineError> {
        Ok(())
    }

    async fn decode_still_image(&mut self, image: &ImageFile) -> Result<String, EngineError> {
        decode::decode_image_bytes(&image.bytes)
    }

    fn is_attached(&self) -> bool {
        false
    }

    fn release(&mut self) {}
}
