use std::{
    sync::{Arc, Mutex},
    time::Instant,
};

use iced::{
    widget::{button, column, container, image::Handle, row, text, Space},
    Alignment, ContentFit, Element, Length, Task,
};

use crate::{
    backend::{
        cameras::{self, CameraBackend, CameraError, CaptureConstraints},
        handoff::{HandoffStore, PhotoSet},
        routes::Route,
        sequencer::{CaptureSequencer, SequencerAction, SequencerState},
        still,
        templates::Template,
    },
    BoothContext,
};

use super::{
    camera_feed::{CameraFeed, CameraFeedOptions, CameraMessage},
    title_overlay::{error_banner, supporting_text, title_overlay, title_text},
};

mod animations;

const THUMBNAIL_HEIGHT: f32 = 120.0;

#[derive(Debug, Clone)]
pub enum CaptureMessage {
    CameraOpened(Result<(), String>),
    Camera(CameraMessage),
    Tick,
    StartPressed,
    Captured(Result<Vec<u8>, String>),
    CompletePressed,
    BackPressed,
}

pub struct Capture<C: CameraBackend + 'static> {
    template: &'static Template,
    feed: Option<CameraFeed<C::Camera>>,
    /// Filled by the blocking task that opens the camera.
    opening: Arc<Mutex<Option<Result<C::Camera, CameraError>>>>,
    store: HandoffStore,
    sequencer: CaptureSequencer,
    /// Fixed from the first frame for the whole session.
    is_landscape: Option<bool>,
    thumbnails: Vec<Handle>,
    countdown_timeline: Option<(u32, anim::Timeline<animations::CountdownState>)>,
    flash_timeline: Option<anim::Timeline<f32>>,
    error: Option<String>,
    pub navigate: Option<Route>,
}

impl<C: CameraBackend + 'static> Capture<C> {
    /// Builds the page and starts opening `camera` on a blocking thread.
    pub fn new(
        template: &'static Template,
        camera: Option<C::EnumeratedCamera>,
        context: &BoothContext,
    ) -> (Self, Task<CaptureMessage>) {
        let mut page = Self {
            template,
            feed: None,
            opening: Arc::new(Mutex::new(None)),
            store: context.store.clone(),
            sequencer: CaptureSequencer::new(template.slot_count),
            is_landscape: None,
            thumbnails: Vec::with_capacity(template.slot_count),
            countdown_timeline: None,
            flash_timeline: None,
            error: None,
            navigate: None,
        };
        let Some(item) = camera else {
            log::error!("No camera was selected");
            page.error = Some("Camera unavailable: no camera was selected.".to_string());
            return (page, Task::none());
        };

        let constraints =
            CaptureConstraints::preferred(template.layout, context.config.portrait_mount);
        let slot = page.opening.clone();
        let task = Task::perform(
            async move {
                tokio::task::spawn_blocking(move || {
                    let opened = cameras::open_with_fallback::<C>(item, &constraints);
                    *slot.lock().expect("failed to lock camera slot") = Some(opened);
                })
                .await
                .map_err(|err| format!("camera task failed: {err}"))
            },
            CaptureMessage::CameraOpened,
        );
        (page, task)
    }

    /// Starts the feed on a freshly opened camera, or reports why there is
    /// none.
    fn camera_opened(
        &mut self,
        opened: Result<C::Camera, CameraError>,
    ) -> Task<CaptureMessage> {
        match opened {
            Ok(camera) => {
                let (feed, task) = CameraFeed::new(camera, CameraFeedOptions::default());
                self.feed = Some(feed);
                task.map(CaptureMessage::Camera)
            }
            Err(err) => {
                log::error!("Camera unavailable: {}", err);
                self.error = Some(format!("Camera unavailable: {err}"));
                Task::none()
            }
        }
    }

    /// Ready once the stream has delivered a frame.
    fn camera_ready(&self) -> bool {
        self.is_landscape.is_some()
    }

    fn can_start(&self) -> bool {
        self.camera_ready()
            && self.sequencer.state() == SequencerState::Idle
            && self.sequencer.photos().len() < self.sequencer.slot_count()
    }

    pub fn update(&mut self, message: CaptureMessage) -> Task<CaptureMessage> {
        match message {
            CaptureMessage::CameraOpened(Ok(())) => {
                let opened = self
                    .opening
                    .lock()
                    .expect("failed to lock camera slot")
                    .take();
                match opened {
                    Some(opened) => self.camera_opened(opened),
                    None => Task::none(),
                }
            }
            CaptureMessage::CameraOpened(Err(err)) => {
                log::error!("Camera unavailable: {}", err);
                self.error = Some(format!("Camera unavailable: {err}"));
                Task::none()
            }
            CaptureMessage::Camera(msg) => {
                let Some(feed) = self.feed.as_mut() else {
                    return Task::none();
                };
                let task = feed.update(msg).map(CaptureMessage::Camera);
                if self.is_landscape.is_none() {
                    if let Some((width, height)) = feed.stream_size() {
                        let is_landscape = still::is_landscape(width, height);
                        log::info!(
                            "Session orientation: {}",
                            if is_landscape { "landscape" } else { "portrait" }
                        );
                        self.is_landscape = Some(is_landscape);
                    }
                }
                task
            }
            CaptureMessage::Tick => {
                let now = Instant::now();
                if let Some(timeline) = self.flash_timeline.as_mut() {
                    if timeline.update().is_completed() {
                        self.flash_timeline = None;
                    }
                }

                let action = self.sequencer.poll(now);
                match self.sequencer.countdown() {
                    Some(remaining) => {
                        let restart = !matches!(&self.countdown_timeline, Some((shown, _)) if *shown == remaining);
                        if restart {
                            self.countdown_timeline = Some((remaining, animations::countdown()));
                        } else if let Some((_, timeline)) = self.countdown_timeline.as_mut() {
                            timeline.update();
                        }
                    }
                    None => self.countdown_timeline = None,
                }

                match (action, self.feed.as_ref()) {
                    (Some(SequencerAction::Capture), Some(feed)) => {
                        self.flash_timeline = Some(animations::flash());
                        Task::perform(feed.capture_still(), CaptureMessage::Captured)
                    }
                    (Some(SequencerAction::Capture), None) => {
                        self.sequencer.capture_failed();
                        Task::none()
                    }
                    (None, _) => Task::none(),
                }
            }
            CaptureMessage::StartPressed => {
                if self.can_start() && self.sequencer.start(Instant::now()) {
                    self.error = None;
                }
                Task::none()
            }
            CaptureMessage::Captured(Ok(photo)) => {
                match image::load_from_memory(&photo) {
                    Ok(decoded) => {
                        let thumbnail = decoded
                            .thumbnail(u32::MAX, THUMBNAIL_HEIGHT as u32)
                            .to_rgba8();
                        self.thumbnails.push(Handle::from_rgba(
                            thumbnail.width(),
                            thumbnail.height(),
                            thumbnail.into_raw(),
                        ));
                    }
                    Err(err) => log::warn!("Could not build a thumbnail: {}", err),
                }
                self.sequencer.photo_captured(photo, Instant::now());
                Task::none()
            }
            CaptureMessage::Captured(Err(err)) => {
                log::error!("Still capture failed: {}", err);
                self.sequencer.capture_failed();
                self.error = Some(format!("Could not take the photo: {err}"));
                Task::none()
            }
            CaptureMessage::CompletePressed => {
                if !self.sequencer.is_done() {
                    return Task::none();
                }
                let photo_set = PhotoSet {
                    photos: self.sequencer.photos().to_vec(),
                    is_landscape: self.is_landscape.unwrap_or(true),
                };
                match self.store.put_photos(&photo_set) {
                    Ok(()) => self.navigate = Some(Route::compose(self.template)),
                    Err(err) => {
                        log::error!("Error saving photos: {}", err);
                        self.error = Some(format!("Could not save the photos: {err}"));
                    }
                }
                Task::none()
            }
            CaptureMessage::BackPressed => {
                self.navigate = Some(Route::Frames);
                Task::none()
            }
        }
    }

    /// The space bar starts the sequence, or finishes it once all photos are in.
    pub fn key_pressed(&mut self) -> Task<CaptureMessage> {
        if self.sequencer.is_done() {
            self.update(CaptureMessage::CompletePressed)
        } else {
            self.update(CaptureMessage::StartPressed)
        }
    }

    fn controls(&self) -> Element<'_, CaptureMessage> {
        let taken = self.sequencer.photos().len();
        let total = self.sequencer.slot_count();

        let action: Element<CaptureMessage> = if self.sequencer.is_done() {
            button(text("Complete").size(20))
                .padding([12, 32])
                .style(button::success)
                .on_press(CaptureMessage::CompletePressed)
                .into()
        } else if taken == 0 && self.sequencer.state() == SequencerState::Idle {
            button(text("Start Taking Photos").size(20))
                .padding([12, 32])
                .on_press_maybe(self.can_start().then_some(CaptureMessage::StartPressed))
                .into()
        } else if self.sequencer.state() == SequencerState::Idle {
            button(text("Try Again").size(20))
                .padding([12, 32])
                .on_press_maybe(self.can_start().then_some(CaptureMessage::StartPressed))
                .into()
        } else {
            supporting_text(match self.sequencer.state() {
                SequencerState::Waiting { .. } => "Get ready for next photo!",
                _ => "Taking photo...",
            })
            .into()
        };

        let thumbnails = row(self.thumbnails.iter().map(|handle| {
            iced::widget::Image::new(handle.clone())
                .height(THUMBNAIL_HEIGHT)
                .into()
        }))
        .spacing(8);

        column([
            title_text(format!("Take Your Photos ({taken}/{total})")).into(),
            match &self.error {
                Some(err) => error_banner(err).into(),
                None => Space::new(0, 0).into(),
            },
            row([
                button("Back")
                    .style(button::secondary)
                    .padding([12, 24])
                    .on_press(CaptureMessage::BackPressed)
                    .into(),
                action,
            ])
            .spacing(16)
            .align_y(Alignment::Center)
            .into(),
            thumbnails.into(),
        ])
        .spacing(12)
        .align_x(Alignment::Center)
        .into()
    }

    pub fn view(&self) -> Element<'_, CaptureMessage> {
        let feed: Element<CaptureMessage> = match &self.feed {
            Some(feed) => feed
                .view()
                .content_fit(ContentFit::Contain)
                .width(Length::Fill)
                .height(Length::Fill)
                .into(),
            None => container(supporting_text(if self.error.is_some() {
                "No camera"
            } else {
                "Starting camera..."
            }))
                .center(Length::Fill)
                .into(),
        };

        let mut layers = vec![feed];
        if let Some((remaining, timeline)) = &self.countdown_timeline {
            layers.push(animations::countdown_view(*remaining, timeline.value()).into());
        }
        if let Some(timeline) = &self.flash_timeline {
            layers.push(animations::flash_view(timeline.value()).into());
        }
        layers.push(title_overlay(self.controls()));

        iced::widget::stack(layers).into()
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        backend::{
            assets::AssetLoader,
            cameras::mock::{MockBackend, MockCameraInfo},
            sequencer::{COUNTDOWN_TICK, NEXT_PHOTO_DELAY},
            templates,
        },
        config::BoothConfig,
    };

    use super::*;

    fn context(dir: &std::path::Path) -> BoothContext {
        let config = BoothConfig {
            asset_dir: dir.join("assets"),
            store_dir: dir.join("store"),
            camera_index: None,
            portrait_mount: false,
        };
        BoothContext {
            store: HandoffStore::new(&config.store_dir),
            assets: AssetLoader::new(&config.asset_dir),
            config,
        }
    }

    fn frame(width: u32, height: u32) -> CaptureMessage {
        CaptureMessage::Camera(CameraMessage::NewFrame(Ok((
            Handle::from_rgba(1, 1, vec![0; 4]),
            (width, height),
        ))))
    }

    /// Runs the blocking open inline and delivers it the way the task does.
    fn open_camera(
        template: &'static Template,
        item: MockCameraInfo,
        context: &BoothContext,
    ) -> Capture<MockBackend> {
        let (mut page, _) = Capture::<MockBackend>::new(template, Some(item.clone()), context);
        assert!(page.feed.is_none());
        assert!(page.error.is_none());

        let constraints = CaptureConstraints::preferred(template.layout, false);
        let opened = cameras::open_with_fallback::<MockBackend>(item, &constraints);
        *page.opening.lock().unwrap() = Some(opened);
        let _ = page.update(CaptureMessage::CameraOpened(Ok(())));
        page
    }

    #[test]
    fn orientation_is_fixed_by_the_first_frame() {
        let dir = tempfile::tempdir().unwrap();
        let template = templates::find("quad-landscape").unwrap();
        let mut page = open_camera(template, MockCameraInfo::default(), &context(dir.path()));
        assert!(page.feed.is_some());
        assert!(!page.can_start());

        let _ = page.update(frame(1920, 1080));
        assert_eq!(page.is_landscape, Some(true));
        let _ = page.update(frame(1080, 1920));
        assert_eq!(page.is_landscape, Some(true));

        let _ = page.update(CaptureMessage::StartPressed);
        assert_eq!(page.sequencer.countdown(), Some(3));

        // the title carries a formatted photo count
        let _ = page.view();
    }

    #[test]
    fn refused_camera_keeps_capture_disabled() {
        let dir = tempfile::tempdir().unwrap();
        let template = templates::find("vertical-nocturne").unwrap();
        let item = MockCameraInfo {
            refuse_preferred: true,
            refuse_fallback: true,
            ..Default::default()
        };
        let mut page = open_camera(template, item, &context(dir.path()));
        assert!(page.feed.is_none());
        assert!(page.error.is_some());

        let _ = page.update(frame(640, 480));
        let _ = page.update(CaptureMessage::StartPressed);
        assert_eq!(page.sequencer.state(), SequencerState::Idle);
    }

    #[test]
    fn failed_open_task_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let template = templates::find("vertical-nocturne").unwrap();
        let (mut page, _) =
            Capture::<MockBackend>::new(template, Some(MockCameraInfo::default()), &context(dir.path()));
        let _ = page.update(CaptureMessage::CameraOpened(Err("panicked".to_string())));
        assert!(page.feed.is_none());
        assert!(page.error.is_some());
    }

    #[test]
    fn completed_session_is_handed_to_compose() {
        let dir = tempfile::tempdir().unwrap();
        let context = context(dir.path());
        let template = templates::find("vertical-narrow").unwrap();
        let mut page = open_camera(template, MockCameraInfo::default(), &context);
        let _ = page.update(frame(1080, 1920));
        assert_eq!(page.is_landscape, Some(false));

        let mut now = Instant::now();
        assert!(page.sequencer.start(now));
        for i in 0..4u8 {
            loop {
                now += COUNTDOWN_TICK;
                if page.sequencer.poll(now) == Some(SequencerAction::Capture) {
                    break;
                }
            }
            let _ = page.update(CaptureMessage::Captured(Ok(vec![0xff, 0xd8, i])));
            if i < 3 {
                now += NEXT_PHOTO_DELAY;
                assert_eq!(page.sequencer.poll(now), None);
            }
        }
        assert!(page.sequencer.is_done());

        let _ = page.update(CaptureMessage::CompletePressed);
        assert_eq!(
            page.navigate.as_ref().map(|route| route.to_string()),
            Some("/compose?frameId=vertical-narrow".to_string())
        );
        let stored = context.store.peek().unwrap().unwrap();
        assert_eq!(stored.photo_set.photos.len(), 4);
        assert_eq!(stored.photo_set.photos[2], vec![0xff, 0xd8, 2]);
        assert!(!stored.photo_set.is_landscape);
        assert_eq!(stored.overlay, None);
    }

    #[test]
    fn completing_early_does_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let context = context(dir.path());
        let template = templates::find("vertical-nocturne").unwrap();
        let (mut page, _) = Capture::<MockBackend>::new(template, None, &context);

        let _ = page.update(CaptureMessage::CompletePressed);
        assert!(page.navigate.is_none());
        assert_eq!(context.store.peek().unwrap(), None);

        let _ = page.update(CaptureMessage::BackPressed);
        assert_eq!(page.navigate, Some(Route::Frames));
    }
}
