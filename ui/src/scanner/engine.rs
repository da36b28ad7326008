//! The seam between the scanner state machine and whatever actually talks to
//! the camera and the QR decoder.

use async_trait::async_trait;
use futures::channel::mpsc::UnboundedSender;

use super::error::EngineError;
use super::session::Facing;

/// How strictly the requested facing must be honoured.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum FacingConstraint {
    /// `facingMode: { exact: .. }`. Fails if no such camera exists.
    Exact,
    /// `facingMode: { ideal: .. }`. The browser may pick another camera.
    Ideal,
}

/// Parameters for one attach call.
#[derive(Clone, PartialEq, Debug)]
pub struct AttachConfig {
    pub frame_rate: u32,
    /// Edge length of the centred square that is sampled for codes, in px.
    pub decode_region: u32,
    pub aspect_ratio: f64,
    pub facing: Facing,
    pub constraint: FacingConstraint,
}

impl AttachConfig {
    /// Milliseconds between two sampled frames.
    pub fn frame_interval_ms(&self) -> u32 {
        1000 / self.frame_rate.max(1)
    }
}

/// Reported by an attached engine for every sampled frame.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum FrameEvent {
    Decoded(String),
    /// The frame held no readable code.
    Miss(String),
}

/// A [`FrameEvent`] together with the attach that produced it.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct TaggedFrame {
    pub attach_id: u64,
    pub event: FrameEvent,
}

/// Where an attached engine reports its frames.
///
/// Every attach gets a sink with a fresh id, so events still queued from an
/// earlier stream can be told apart from the current one.
#[derive(Clone, Debug)]
pub struct FrameSink {
    attach_id: u64,
    tx: UnboundedSender<TaggedFrame>,
}

impl FrameSink {
    pub fn new(attach_id: u64, tx: UnboundedSender<TaggedFrame>) -> Self {
        Self { attach_id, tx }
    }

    pub fn attach_id(&self) -> u64 {
        self.attach_id
    }

    /// Returns false once the receiving controller is gone.
    pub fn send(&self, event: FrameEvent) -> bool {
        self.tx
            .unbounded_send(TaggedFrame {
                attach_id: self.attach_id,
                event,
            })
            .is_ok()
    }
}

/// A still image picked by the user.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct ImageFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

/// Capability that decodes QR codes from a live camera stream or a still image.
///
/// Engines run on the UI event loop, so nothing here is `Send`.
#[async_trait(?Send)]
pub trait DecoderEngine {
    /// Handle to the element the live preview is rendered into.
    type Surface: Clone + 'static;

    /// Opens a camera stream, binds it to `surface` and starts sampling frames
    /// into `sink`. Returns once the stream is live.
    async fn attach(
        &mut self,
        surface: &Self::Surface,
        config: &AttachConfig,
        sink: FrameSink,
    ) -> Result<(), EngineError>;

    /// Stops sampling and closes the stream. Safe to call when not attached.
    async fn detach(&mut self) -> Result<(), EngineError>;

    async fn decode_still_image(&mut self, image: &ImageFile) -> Result<String, EngineError>;

    fn is_attached(&self) -> bool;

    /// Synchronous, best-effort variant of [`detach`](Self::detach) for use
    /// where awaiting is impossible, such as `Drop`.
    fn release(&mut self);
}

#[cfg(test)]
pub(crate) mod mock {
    //! A scripted engine that records every call in order.

    use super::*;
    use std::cell::RefCell;
    use std::collections::VecDeque;
    use std::rc::Rc;

    #[derive(Clone, PartialEq, Debug)]
    pub enum EngineCall {
        Attach(Facing, FacingConstraint),
        Detach,
        DecodeStill(String),
        Release,
    }

    #[derive(Default)]
    pub struct MockState {
        pub calls: Vec<EngineCall>,
        pub attach_results: VecDeque<Result<(), EngineError>>,
        pub detach_result: Option<EngineError>,
        pub still_result: Option<Result<String, EngineError>>,
        pub attached: bool,
        pub sink: Option<FrameSink>,
        pub last_attach_id: Option<u64>,
        pub last_config: Option<AttachConfig>,
        pub hang_next_attach: bool,
    }

    /// The engine half is moved into the controller; the [`MockHandle`] half
    /// stays with the test.
    pub struct MockEngine(Rc<RefCell<MockState>>);

    #[derive(Clone)]
    pub struct MockHandle(Rc<RefCell<MockState>>);

    pub fn mock_engine() -> (MockEngine, MockHandle) {
        let state = Rc::new(RefCell::new(MockState::default()));
        (MockEngine(state.clone()), MockHandle(state))
    }

    impl MockHandle {
        /// Queues the outcome of the next attach. Unscripted attaches succeed.
        pub fn push_attach(&self, result: Result<(), EngineError>) {
            self.0.borrow_mut().attach_results.push_back(result);
        }

        pub fn fail_detach(&self, err: EngineError) {
            self.0.borrow_mut().detach_result = Some(err);
        }

        pub fn set_still_result(&self, result: Result<String, EngineError>) {
            self.0.borrow_mut().still_result = Some(result);
        }

        pub fn calls(&self) -> Vec<EngineCall> {
            self.0.borrow().calls.clone()
        }

        pub fn is_attached(&self) -> bool {
            self.0.borrow().attached
        }

        pub fn last_config(&self) -> Option<AttachConfig> {
            self.0.borrow().last_config.clone()
        }

        /// The next attach opens its stream and then never completes, like a
        /// browser still waiting on `video.play()`.
        pub fn hang_next_attach(&self) {
            self.0.borrow_mut().hang_next_attach = true;
        }

        /// Pushes a frame event through the sink handed over by the last attach.
        pub fn emit(&self, event: FrameEvent) {
            if let Some(sink) = &self.0.borrow().sink {
                sink.send(event);
            }
        }

        /// `event` as the most recent attach would have reported it, even after
        /// that stream was detached.
        pub fn tagged(&self, event: FrameEvent) -> TaggedFrame {
            TaggedFrame {
                attach_id: self.0.borrow().last_attach_id.unwrap_or_default(),
                event,
            }
        }
    }

    #[async_trait(?Send)]
    impl DecoderEngine for MockEngine {
        type Surface = ();

        async fn attach(
            &mut self,
            _surface: &(),
            config: &AttachConfig,
            sink: FrameSink,
        ) -> Result<(), EngineError> {
            let hang = {
                let mut state = self.0.borrow_mut();
                state
                    .calls
                    .push(EngineCall::Attach(config.facing, config.constraint));
                state.last_config = Some(config.clone());
                std::mem::take(&mut state.hang_next_attach)
            };
            if hang {
                // the stream is owned before the final await, as in the web engine
                self.0.borrow_mut().attached = true;
                futures::future::pending::<()>().await;
            }

            let mut state = self.0.borrow_mut();
            let result = state.attach_results.pop_front().unwrap_or(Ok(()));
            if result.is_ok() {
                state.attached = true;
                state.last_attach_id = Some(sink.attach_id());
                state.sink = Some(sink);
            }
            result
        }

        async fn detach(&mut self) -> Result<(), EngineError> {
            let mut state = self.0.borrow_mut();
            state.calls.push(EngineCall::Detach);
            // a failed detach still drops the stream, mirroring track.stop()
            state.attached = false;
            state.sink = None;
            match state.detach_result.take() {
                Some(err) => Err(err),
                None => Ok(()),
            }
        }

        async fn decode_still_image(&mut self, image: &ImageFile) -> Result<String, EngineError> {
            let mut state = self.0.borrow_mut();
            state.calls.push(EngineCall::DecodeStill(image.name.clone()));
            state
                .still_result
                .clone()
                .unwrap_or(Err(EngineError::NoCode))
        }

        fn is_attached(&self) -> bool {
            self.0.borrow().attached
        }

        fn release(&mut self) {
            let mut state = self.0.borrow_mut();
            state.calls.push(EngineCall::Release);
            state.attached = false;
            state.sink = None;
        }
    }
}
