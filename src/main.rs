use std::time::Duration;

use backend::{
    assets::AssetLoader,
    cameras::{CameraBackend, DefaultCameraBackend},
    handoff::HandoffStore,
    routes::{Route, Screen},
};
use config::BoothConfig;
use frontend::{
    capture::{Capture, CaptureMessage},
    compose::{Compose, ComposeMessage},
    landing::{Landing, LandingMessage},
    selection::{Selection, SelectionMessage},
};
use iced::{keyboard::Key, Task};

mod backend;
mod config;
mod frontend;

/// Shared by every screen for the whole run.
pub struct BoothContext {
    pub config: BoothConfig,
    pub store: HandoffStore,
    pub assets: AssetLoader,
}

enum AppPage<C: CameraBackend + 'static> {
    Landing(Landing),
    Selection(Selection<C>),
    Capture(Capture<C>),
    Compose(Compose),
}

struct PhotoBoothApplication<C: CameraBackend + 'static> {
    page: AppPage<C>,
    context: BoothContext,
    camera: Option<C::EnumeratedCamera>,
    fullscreen: bool,
}

#[derive(Debug, Clone)]
enum PhotoBoothMessage<C: CameraBackend + 'static> {
    Landing(LandingMessage),
    Selection(SelectionMessage<C>),
    Capture(CaptureMessage),
    Compose(ComposeMessage),
    Tick,
    SpaceReleased,
}

impl<C: CameraBackend + 'static> PhotoBoothApplication<C> {
    fn new(context: BoothContext, initial_route: Route) -> (Self, Task<PhotoBoothMessage<C>>) {
        let mut app = PhotoBoothApplication {
            page: AppPage::Landing(Landing::default()),
            context,
            camera: None,
            fullscreen: false,
        };
        let task = app.open(initial_route);
        (app, task)
    }

    /// Switches to the screen `route` points at, redirecting to selection
    /// when it can't be shown.
    fn open(&mut self, route: Route) -> Task<PhotoBoothMessage<C>> {
        log::info!("Opening {}", route);
        match route.resolve() {
            Screen::Landing => {
                self.page = AppPage::Landing(Landing::default());
                Task::none()
            }
            Screen::Selection => {
                self.page = AppPage::Selection(Selection::new(
                    self.camera.clone(),
                    self.context.config.camera_index,
                    self.context.assets.root(),
                ));
                Task::none()
            }
            Screen::Capture(template) => {
                if self.camera.is_none() {
                    self.camera = Selection::<C>::new(
                        None,
                        self.context.config.camera_index,
                        self.context.assets.root(),
                    )
                    .camera_option;
                }
                let (page, task) = Capture::new(template, self.camera.clone(), &self.context);
                self.page = AppPage::Capture(page);
                Task::batch([self.enter_fullscreen(), task.map(PhotoBoothMessage::Capture)])
            }
            Screen::Compose(template) => match Compose::new(template, &self.context) {
                Some((page, task)) => {
                    self.page = AppPage::Compose(page);
                    task.map(PhotoBoothMessage::Compose)
                }
                None => self.open(Route::Frames),
            },
        }
    }

    fn enter_fullscreen(&mut self) -> Task<PhotoBoothMessage<C>> {
        if self.fullscreen {
            return Task::none();
        }
        self.fullscreen = true;
        iced::window::get_latest().then(|id| match id {
            Some(id) => Task::batch([
                iced::window::change_mode(id, iced::window::Mode::Fullscreen),
                iced::window::toggle_decorations(id),
            ]),
            None => Task::none(),
        })
    }

    fn update(&mut self, message: PhotoBoothMessage<C>) -> Task<PhotoBoothMessage<C>> {
        let (task, navigate) = match (message, &mut self.page) {
            (PhotoBoothMessage::Landing(msg), AppPage::Landing(page)) => {
                let task = page.update(msg).map(PhotoBoothMessage::Landing);
                (task, page.navigate.take())
            }
            (PhotoBoothMessage::SpaceReleased, AppPage::Landing(page)) => {
                let task = page
                    .update(LandingMessage::StartPressed)
                    .map(PhotoBoothMessage::Landing);
                (task, page.navigate.take())
            }
            (PhotoBoothMessage::Selection(msg), AppPage::Selection(page)) => {
                let task = page.update(msg).map(PhotoBoothMessage::Selection);
                self.camera = page.camera_option.clone();
                (task, page.navigate.take())
            }
            (PhotoBoothMessage::Capture(msg), AppPage::Capture(page)) => {
                let task = page.update(msg).map(PhotoBoothMessage::Capture);
                (task, page.navigate.take())
            }
            (PhotoBoothMessage::Compose(msg), AppPage::Compose(page)) => {
                let task = page.update(msg).map(PhotoBoothMessage::Compose);
                (task, page.navigate.take())
            }
            (PhotoBoothMessage::Tick, AppPage::Capture(page)) => {
                let task = page
                    .update(CaptureMessage::Tick)
                    .map(PhotoBoothMessage::Capture);
                (task, page.navigate.take())
            }
            (PhotoBoothMessage::SpaceReleased, AppPage::Capture(page)) => {
                let task = page.key_pressed().map(PhotoBoothMessage::Capture);
                (task, page.navigate.take())
            }
            // messages for a page that is gone
            _ => (Task::none(), None),
        };

        match navigate {
            Some(route) => task.chain(self.open(route)),
            None => task,
        }
    }

    fn view(&self) -> iced::Element<PhotoBoothMessage<C>> {
        match &self.page {
            AppPage::Landing(page) => page.view().map(PhotoBoothMessage::Landing),
            AppPage::Selection(page) => page.view().map(PhotoBoothMessage::Selection),
            AppPage::Capture(page) => page.view().map(PhotoBoothMessage::Capture),
            AppPage::Compose(page) => page.view().map(PhotoBoothMessage::Compose),
        }
    }

    fn subscription(&self) -> iced::Subscription<PhotoBoothMessage<C>> {
        const FPS: f32 = 30.0;
        iced::Subscription::batch([
            iced::time::every(Duration::from_secs_f32(1.0 / FPS))
                .map(|_tick| PhotoBoothMessage::Tick),
            iced::keyboard::on_key_release(|key, _modifiers| match key {
                Key::Named(iced::keyboard::key::Named::Space) => {
                    Some(PhotoBoothMessage::SpaceReleased)
                }
                _ => None,
            }),
        ])
    }
}

fn main() -> iced::Result {
    env_logger::init();

    let config = match BoothConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            log::error!("Invalid configuration: {}", err);
            std::process::exit(2);
        }
    };
    if let Err(err) = DefaultCameraBackend::initialize() {
        log::error!("Failed to initialize camera backend: {}", err);
    }

    let initial_route = std::env::args()
        .nth(1)
        .map(|route| Route::parse(&route))
        .unwrap_or(Route::Home);

    iced::application(
        "Nocturne Photo Booth",
        PhotoBoothApplication::update,
        PhotoBoothApplication::view,
    )
    .subscription(PhotoBoothApplication::subscription)
    .theme(|_| iced::Theme::Dark)
    .run_with(move || {
        let context = BoothContext {
            store: HandoffStore::new(config.store_dir.clone()),
            assets: AssetLoader::new(config.asset_dir.clone()),
            config,
        };
        log::info!(
            "Assets in {}, handoff store in {}",
            context.assets.root().display(),
            context.store.dir().display()
        );
        PhotoBoothApplication::<DefaultCameraBackend>::new(context, initial_route)
    })
}
