use std::path::Path;

use iced::{
    widget::{button, column, container, pick_list, row, svg, text, Space},
    Alignment, ContentFit, Element, Length, Task,
};

use crate::backend::{
    cameras::CameraBackend,
    routes::Route,
    templates::{self, Layout, Template},
};

use super::title_overlay::{error_banner, supporting_text};

const PREVIEW_HEIGHT: f32 = 240.0;
const LANDSCAPE_PREVIEW_WIDTH: f32 = 240.0;

#[derive(Debug, Clone)]
pub enum SelectionMessage<C: CameraBackend + 'static> {
    CameraSelected(C::EnumeratedCamera),
    TemplatePressed(&'static str),
}

pub struct Selection<C: CameraBackend + 'static> {
    /// Frame artwork shown on each template card.
    previews: Vec<(&'static Template, svg::Handle)>,
    camera_options: Vec<C::EnumeratedCamera>,
    pub camera_option: Option<C::EnumeratedCamera>,
    error: Option<String>,
    pub navigate: Option<Route>,
}

impl<C: CameraBackend + 'static> Selection<C> {
    /// `previous` keeps the camera chosen earlier in the session; otherwise
    /// `preferred_index` picks from the enumerated list, defaulting to the
    /// first camera.
    pub fn new(
        previous: Option<C::EnumeratedCamera>,
        preferred_index: Option<usize>,
        asset_root: &Path,
    ) -> Self {
        let (camera_options, error) = match C::enumerate_cameras() {
            Ok(cameras) => (cameras, None),
            Err(err) => {
                log::error!("Failed to enumerate cameras: {}", err);
                (vec![], Some(format!("Could not list cameras: {err}")))
            }
        };
        let camera_option = previous
            .filter(|camera| camera_options.contains(camera))
            .or_else(|| {
                preferred_index
                    .and_then(|index| camera_options.get(index))
                    .or_else(|| camera_options.first())
                    .cloned()
            });
        let error = error.or_else(|| {
            camera_options
                .is_empty()
                .then(|| "No cameras were found.".to_string())
        });

        let previews = templates::all()
            .iter()
            .map(|template| {
                (
                    template,
                    svg::Handle::from_path(asset_root.join(template.artwork)),
                )
            })
            .collect();

        Self {
            previews,
            camera_options,
            camera_option,
            error,
            navigate: None,
        }
    }

    pub fn update(&mut self, message: SelectionMessage<C>) -> Task<SelectionMessage<C>> {
        match message {
            SelectionMessage::CameraSelected(new) => {
                log::info!("Selected camera {}", new);
                self.camera_option = Some(new);
            }
            SelectionMessage::TemplatePressed(id) => {
                if let Some(template) = templates::find(id) {
                    self.navigate = Some(Route::capture(template));
                }
            }
        }
        Task::none()
    }

    fn template_card(
        &self,
        template: &'static Template,
        preview: &svg::Handle,
    ) -> Element<'_, SelectionMessage<C>> {
        let canvas = template.canvas_size();
        let (width, height) = match template.layout {
            Layout::Horizontal => (
                LANDSCAPE_PREVIEW_WIDTH,
                LANDSCAPE_PREVIEW_WIDTH * canvas.height as f32 / canvas.width as f32,
            ),
            _ => (
                PREVIEW_HEIGHT * canvas.width as f32 / canvas.height as f32,
                PREVIEW_HEIGHT,
            ),
        };

        button(
            column([
                container(
                    svg(preview.clone())
                        .width(width)
                        .height(height)
                        .content_fit(ContentFit::Contain),
                )
                .center_x(LANDSCAPE_PREVIEW_WIDTH)
                .center_y(PREVIEW_HEIGHT)
                .into(),
                text(template.name).size(24).into(),
                supporting_text(template.description).into(),
                text(format!("{} photos", template.slot_count))
                    .size(14)
                    .into(),
            ])
            .spacing(4)
            .width(240)
            .align_x(Alignment::Center),
        )
        .padding(16)
        .style(button::secondary)
        .on_press_maybe(
            self.camera_option
                .is_some()
                .then_some(SelectionMessage::TemplatePressed(template.id)),
        )
        .into()
    }

    pub fn view(&self) -> Element<'_, SelectionMessage<C>> {
        container(
            container(
                column([
                    text("Choose Your Frame").size(32).into(),
                    row([
                        text("Camera").into(),
                        pick_list(
                            self.camera_options.as_slice(),
                            self.camera_option.as_ref(),
                            SelectionMessage::CameraSelected,
                        )
                        .into(),
                    ])
                    .spacing(8)
                    .align_y(Alignment::Center)
                    .into(),
                    match &self.error {
                        Some(err) => error_banner(err).into(),
                        None => Space::new(0, 0).into(),
                    },
                    row(self
                        .previews
                        .iter()
                        .map(|(template, preview)| self.template_card(template, preview)))
                    .spacing(16)
                    .into(),
                ])
                .align_x(Alignment::Center)
                .spacing(16),
            )
            .padding(24)
            .style(container::rounded_box),
        )
        .center_x(Length::Fill)
        .center_y(Length::Fill)
        .into()
    }
}
