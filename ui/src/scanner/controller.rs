//! The scanner lifecycle state machine.
//!
//! `ScanController` owns the engine for its whole life. Every operation runs
//! to completion before the next one starts, so a camera switch can never
//! issue its attach before the previous detach has finished.

use dioxus_logger::tracing::{debug, info, trace, warn};
use futures::channel::mpsc::{self, UnboundedReceiver, UnboundedSender};
use futures::StreamExt;

use super::engine::{DecoderEngine, FacingConstraint, FrameEvent, FrameSink, ImageFile, TaggedFrame};
use super::error::{EngineError, ScanError};
use super::host::Haptics;
use super::session::{Facing, ScanSession, ScanState};
use super::settings::ScannerSettings;
use crate::compat;

/// Requests the view can make of a running controller.
#[derive(Clone, Debug)]
pub enum ScanCommand<S> {
    /// The preview element is mounted and can receive a stream.
    BindSurface(S),
    Start,
    Stop,
    /// Stop when scanning, start otherwise.
    Toggle,
    SetFacing(Facing),
    DecodeImage(ImageFile),
    /// Dismiss the result (or close the modal): stop, then clear everything.
    Dismiss,
}

type Observer = Box<dyn FnMut(&ScanSession)>;

pub struct ScanController<E: DecoderEngine, H: Haptics> {
    engine: E,
    haptics: H,
    settings: ScannerSettings,
    surface: Option<E::Surface>,
    session: ScanSession,
    frames_tx: UnboundedSender<TaggedFrame>,
    frames: Option<UnboundedReceiver<TaggedFrame>>,
    // id of the most recent attach; frames carrying any other id are stale
    attach_id: u64,
    observer: Option<Observer>,
}

impl<E: DecoderEngine, H: Haptics> ScanController<E, H> {
    pub fn new(engine: E, haptics: H, settings: ScannerSettings) -> Self {
        let (frames_tx, frames) = mpsc::unbounded();
        Self {
            engine,
            haptics,
            session: ScanSession::new(settings.initial_facing),
            settings,
            surface: None,
            frames_tx,
            frames: Some(frames),
            attach_id: 0,
            observer: None,
        }
    }

    /// Calls `observer` with a snapshot after every state change.
    pub fn with_observer(mut self, observer: impl FnMut(&ScanSession) + 'static) -> Self {
        self.observer = Some(Box::new(observer));
        self
    }

    pub fn session(&self) -> &ScanSession {
        &self.session
    }

    pub fn bind_surface(&mut self, surface: E::Surface) {
        self.surface = Some(surface);
    }

    /// Drives the controller until `commands` closes, then releases the camera.
    ///
    /// Commands and frame events are handled one at a time, in arrival order.
    pub async fn run(mut self, mut commands: UnboundedReceiver<ScanCommand<E::Surface>>) {
        let Some(mut frames) = self.frames.take() else {
            warn!("scanner loop is already running");
            return;
        };
        self.publish();

        loop {
            futures::select! {
                command = commands.next() => match command {
                    Some(command) => self.apply(command).await,
                    None => break,
                },
                frame = frames.next() => {
                    if let Some(frame) = frame {
                        self.handle_frame_event(frame).await;
                    }
                }
            }
        }

        self.shutdown().await;
    }

    pub async fn apply(&mut self, command: ScanCommand<E::Surface>) {
        match command {
            ScanCommand::BindSurface(surface) => self.bind_surface(surface),
            ScanCommand::Start => self.start().await,
            ScanCommand::Stop => self.stop().await,
            ScanCommand::Toggle => self.toggle().await,
            ScanCommand::SetFacing(facing) => self.set_facing(facing).await,
            ScanCommand::DecodeImage(image) => self.decode_image(image).await,
            ScanCommand::Dismiss => self.dismiss().await,
        }
    }

    /// `IDLE | ERROR -> STARTING -> SCANNING | ERROR`.
    ///
    /// The back camera is first requested with an exact constraint and, if
    /// that fails, once more with a relaxed one.
    pub async fn start(&mut self) {
        if self.session.is_scanning {
            debug!("start ignored: camera already attached");
            return;
        }

        self.session.state = ScanState::Starting;
        self.session.clear_outcome();
        self.publish();

        let Some(surface) = self.surface.clone() else {
            self.fail_start(EngineError::Unavailable(
                "camera preview is not ready".to_string(),
            ));
            return;
        };

        let facing = self.session.facing;
        let first_try = match facing {
            Facing::Back => FacingConstraint::Exact,
            Facing::Front => FacingConstraint::Ideal,
        };

        let mut result = self.attach(&surface, facing, first_try).await;
        if let Err(e) = &result {
            if first_try == FacingConstraint::Exact {
                warn!(
                    "exact {} request failed ({}); retrying with a relaxed constraint",
                    facing.facing_mode(),
                    e
                );
                result = self.attach(&surface, facing, FacingConstraint::Ideal).await;
            }
        }

        match result {
            Ok(()) => {
                info!("camera attached ({})", facing.facing_mode());
                self.session.state = ScanState::Scanning;
                self.session.is_scanning = true;
                self.session.last_error = None;
                self.publish();
            }
            Err(e) => self.fail_start(e),
        }
    }

    /// `SCANNING -> STOPPING -> IDLE`. A no-op without a stream.
    ///
    /// A failing detach is logged; the controller still ends up idle.
    pub async fn stop(&mut self) {
        if !self.session.is_scanning {
            debug!("stop ignored: no camera attached");
            return;
        }

        self.session.state = ScanState::Stopping;
        self.publish();

        if let Err(e) = self.engine.detach().await {
            self.report(ScanError::Cleanup(e));
        }

        info!("camera released");
        self.session.is_scanning = false;
        self.session.state = ScanState::Idle;
        self.publish();
    }

    pub async fn toggle(&mut self) {
        if self.session.is_scanning {
            self.stop().await;
        } else {
            self.start().await;
        }
    }

    /// Records the new facing. While scanning this restarts the camera:
    /// stop, settle delay, start.
    pub async fn set_facing(&mut self, facing: Facing) {
        if facing == self.session.facing {
            return;
        }

        if !self.session.is_scanning {
            self.session.facing = facing;
            self.publish();
            return;
        }

        self.stop().await;
        self.session.facing = facing;
        self.publish();

        debug!(
            "waiting {:?} for the camera to settle",
            self.settings.settle_delay
        );
        compat::sleep(self.settings.settle_delay).await;
        self.start().await;
    }

    /// Handles one frame report. Only frames from the stream that is live
    /// right now count; anything queued by an earlier attach is dropped.
    pub async fn handle_frame_event(&mut self, frame: TaggedFrame) {
        if frame.attach_id != self.attach_id {
            debug!(
                "discarding a frame from stream #{} (current is #{})",
                frame.attach_id, self.attach_id
            );
            return;
        }

        match frame.event {
            FrameEvent::Miss(reason) => self.report(ScanError::TransientFrame(reason)),
            FrameEvent::Decoded(text) => {
                // queued before the last detach finished
                if !self.session.state.is_scanning() {
                    debug!("discarding a decode that arrived after the stream stopped");
                    return;
                }

                info!("decoded QR code ({} bytes)", text.len());
                self.session.last_result = Some(text);
                if !self.haptics.pulse(self.settings.haptic_pulse) {
                    trace!("haptic feedback unavailable");
                }
                self.publish();

                if self.settings.auto_stop {
                    self.stop().await;
                }
            }
        }
    }

    /// One-shot decode of a still image. Leaves the live stream alone.
    pub async fn decode_image(&mut self, image: ImageFile) {
        match self.engine.decode_still_image(&image).await {
            Ok(text) => {
                info!("decoded QR code from {}", image.name);
                self.session.last_result = Some(text);
                self.session.last_error = None;
                if self.session.state.is_error() {
                    self.session.state = ScanState::Idle;
                }
            }
            Err(e) => {
                warn!("could not decode {}", image.name);
                self.report(ScanError::ImageDecode(e));
            }
        }
        self.publish();
    }

    /// Any state `-> IDLE` with result and error cleared.
    pub async fn dismiss(&mut self) {
        self.stop().await;
        self.session.clear_outcome();
        self.session.state = ScanState::Idle;
        self.publish();
    }

    /// Graceful teardown: detaches a live stream.
    pub async fn shutdown(&mut self) {
        self.stop().await;
    }

    async fn attach(
        &mut self,
        surface: &E::Surface,
        facing: Facing,
        constraint: FacingConstraint,
    ) -> Result<(), EngineError> {
        let config = self.settings.attach_config(facing, constraint);
        self.attach_id += 1;
        let sink = FrameSink::new(self.attach_id, self.frames_tx.clone());
        self.engine.attach(surface, &config, sink).await
    }

    fn fail_start(&mut self, cause: EngineError) {
        self.session.state = ScanState::Error;
        self.session.is_scanning = false;
        self.report(ScanError::CameraAccess(cause));
        self.publish();
    }

    /// Logs `err`, and shows it when it is meant for the user.
    fn report(&mut self, err: ScanError) {
        match &err {
            ScanError::TransientFrame(_) => trace!("{}", err),
            _ => warn!("{}", err),
        }
        if err.is_user_visible() {
            self.session.last_error = Some(err.to_string());
        }
    }

    fn publish(&mut self) {
        if let Some(observer) = self.observer.as_mut() {
            observer(&self.session);
        }
    }
}

impl<E: DecoderEngine, H: Haptics> Drop for ScanController<E, H> {
    fn drop(&mut self) {
        if self.engine.is_attached() {
            info!("scanner dropped while attached; releasing camera");
            self.engine.release();
        }
    }
}
