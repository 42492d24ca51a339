use std::{path::PathBuf, sync::Arc};

use iced::{
    widget::{button, column, container, image::Handle, pick_list, row, text, Space},
    Alignment, ContentFit, Element, Length, Task,
};

use crate::{
    backend::{
        assets::AssetLoader,
        handoff::{HandoffStore, PhotoSet},
        overlays::{self, Overlay},
        render_take::{self, ComposeRequest, ComposedImage, OUTPUT_FILE_NAME},
        routes::Route,
        templates::Template,
    },
    BoothContext,
};

use super::title_overlay::{error_banner, supporting_text, title_text};

#[derive(Debug, Clone)]
pub enum ComposeMessage {
    /// Result of the composition with the given generation.
    Composed(u64, Result<Arc<ComposedImage>, String>),
    OverlaySelected(Overlay),
    DownloadPressed,
    Saved(Result<Option<PathBuf>, String>),
    RetakePressed,
}

pub struct Compose {
    template: &'static Template,
    photo_set: PhotoSet,
    overlay: Option<Overlay>,
    store: HandoffStore,
    assets: AssetLoader,
    /// Bumped on every recomposition so stale results are dropped.
    generation: u64,
    composing: bool,
    composed: Option<(Arc<ComposedImage>, Handle)>,
    saving: bool,
    status: Option<String>,
    error: Option<String>,
    pub navigate: Option<Route>,
}

impl Compose {
    /// Consumes the stored photo set. Returns `None` when there is nothing to
    /// compose, in which case the caller goes back to selection.
    pub fn new(template: &'static Template, context: &BoothContext) -> Option<(Self, Task<ComposeMessage>)> {
        let handoff = match context.store.take() {
            Ok(Some(handoff)) => handoff,
            Ok(None) => {
                log::info!("No photos to compose, back to selection");
                return None;
            }
            Err(err) => {
                log::error!("Error reading captured photos: {}", err);
                return None;
            }
        };
        let overlay = overlays::resolve(template.layout, handoff.overlay.as_deref());
        log::info!(
            "Composing {} photos into {} (overlay: {})",
            handoff.photo_set.photos.len(),
            template.id,
            overlay.map(|overlay| overlay.name).unwrap_or("none")
        );

        let mut page = Compose {
            template,
            photo_set: handoff.photo_set,
            overlay,
            store: context.store.clone(),
            assets: context.assets.clone(),
            generation: 0,
            composing: false,
            composed: None,
            saving: false,
            status: None,
            error: None,
            navigate: None,
        };
        let task = page.recompose();
        Some((page, task))
    }

    fn recompose(&mut self) -> Task<ComposeMessage> {
        self.generation += 1;
        self.composing = true;
        let generation = self.generation;
        let request = ComposeRequest {
            template: self.template,
            photos: self.photo_set.photos.clone(),
            is_landscape: self.photo_set.is_landscape,
            overlay: self.overlay,
        };
        let assets = self.assets.clone();
        Task::perform(
            async move {
                tokio::task::spawn_blocking(move || {
                    render_take::compose(&request, &assets)
                        .map(Arc::new)
                        .map_err(|err| err.to_string())
                })
                .await
                .map_err(|err| format!("compose task failed: {err}"))?
            },
            move |result| ComposeMessage::Composed(generation, result),
        )
    }

    pub fn update(&mut self, message: ComposeMessage) -> Task<ComposeMessage> {
        match message {
            ComposeMessage::Composed(generation, _) if generation != self.generation => {
                log::debug!("Dropping stale composition {}", generation);
                Task::none()
            }
            ComposeMessage::Composed(_, Ok(composed)) => {
                let image = &composed.image;
                let handle = Handle::from_rgba(image.width(), image.height(), image.as_raw().clone());
                self.composed = Some((composed, handle));
                self.composing = false;
                self.error = None;
                Task::none()
            }
            ComposeMessage::Composed(_, Err(err)) => {
                // the previous image stays on screen
                log::error!("Composition failed: {}", err);
                self.composing = false;
                self.error = Some(format!("Could not compose the photos: {err}"));
                Task::none()
            }
            ComposeMessage::OverlaySelected(overlay) => {
                if self.overlay == Some(overlay) {
                    return Task::none();
                }
                self.overlay = Some(overlay);
                if let Err(err) = self.store.put_overlay(&self.photo_set, overlay.file) {
                    log::warn!("Could not remember the overlay: {}", err);
                }
                self.recompose()
            }
            ComposeMessage::DownloadPressed => {
                let Some((composed, _)) = &self.composed else {
                    return Task::none();
                };
                self.saving = true;
                self.status = None;
                let jpeg = composed.jpeg.clone();
                Task::perform(save_jpeg(jpeg), ComposeMessage::Saved)
            }
            ComposeMessage::Saved(result) => {
                self.saving = false;
                match result {
                    Ok(Some(path)) => {
                        log::info!("Saved photos to {}", path.display());
                        self.status = Some(format!("Saved to {}", path.display()));
                    }
                    Ok(None) => {}
                    Err(err) => {
                        log::error!("Error saving photos: {}", err);
                        self.error = Some(format!("Could not save the photos: {err}"));
                    }
                }
                Task::none()
            }
            ComposeMessage::RetakePressed => {
                if let Err(err) = self.store.remove(crate::backend::handoff::PHOTOS_KEY) {
                    log::warn!("Could not clear captured photos: {}", err);
                }
                self.navigate = Some(Route::Frames);
                Task::none()
            }
        }
    }

    pub fn view(&self) -> Element<'_, ComposeMessage> {
        let preview: Element<ComposeMessage> = match &self.composed {
            Some((_, handle)) => iced::widget::Image::new(handle.clone())
                .content_fit(ContentFit::Contain)
                .width(Length::Fill)
                .height(Length::Fill)
                .into(),
            None => container(supporting_text(if self.composing {
                "Putting your photos together..."
            } else {
                "Nothing to show yet"
            }))
            .center(Length::Fill)
            .into(),
        };

        let overlay_options = overlays::for_layout(self.template.layout);
        let overlay_picker: Element<ComposeMessage> = if overlay_options.is_empty() {
            Space::new(0, 0).into()
        } else {
            row([
                text("Overlay").into(),
                pick_list(overlay_options, self.overlay, ComposeMessage::OverlaySelected).into(),
            ])
            .spacing(8)
            .align_y(Alignment::Center)
            .into()
        };

        let sidebar = column([
            title_text(self.template.name).into(),
            supporting_text(self.template.description).into(),
            overlay_picker,
            button(text("Download").size(20))
                .padding([12, 32])
                .style(button::success)
                .on_press_maybe(
                    (self.composed.is_some() && !self.saving).then_some(ComposeMessage::DownloadPressed),
                )
                .into(),
            button("Retake")
                .padding([12, 32])
                .style(button::secondary)
                .on_press(ComposeMessage::RetakePressed)
                .into(),
            match (&self.error, &self.status) {
                (Some(err), _) => error_banner(err).into(),
                (None, Some(status)) => text(status.clone()).size(14).into(),
                (None, None) => Space::new(0, 0).into(),
            },
        ])
        .spacing(16)
        .width(320)
        .align_x(Alignment::Center);

        container(
            row([preview, container(sidebar).padding(16).style(container::rounded_box).into()])
                .spacing(24)
                .align_y(Alignment::Center),
        )
        .padding(24)
        .center(Length::Fill)
        .into()
    }
}

/// Asks where to put the composed JPEG and writes it there. `None` means the
/// dialog was dismissed.
async fn save_jpeg(jpeg: Vec<u8>) -> Result<Option<PathBuf>, String> {
    let Some(file) = rfd::AsyncFileDialog::new()
        .set_title("Save your photos")
        .set_file_name(OUTPUT_FILE_NAME)
        .add_filter("JPEG image", &["jpg", "jpeg"])
        .save_file()
        .await
    else {
        return Ok(None);
    };
    let path = file.path().to_path_buf();
    tokio::fs::write(&path, jpeg)
        .await
        .map_err(|err| err.to_string())?;
    Ok(Some(path))
}
