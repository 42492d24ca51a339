use iced::{
    widget::{button, column, container, text},
    Alignment, Element, Length, Task,
};

use crate::backend::routes::Route;

use super::title_overlay::{supporting_text, title_text};

#[derive(Debug, Clone)]
pub enum LandingMessage {
    StartPressed,
}

#[derive(Debug, Default)]
pub struct Landing {
    pub navigate: Option<Route>,
}

impl Landing {
    pub fn update(&mut self, message: LandingMessage) -> Task<LandingMessage> {
        match message {
            LandingMessage::StartPressed => {
                self.navigate = Some(Route::Frames);
                Task::none()
            }
        }
    }

    pub fn view(&self) -> Element<'_, LandingMessage> {
        container(
            column([
                title_text("Nocturne's Studio").size(64).into(),
                supporting_text("Capture your moments in the ethereal glow of moonlight").into(),
                button(text("Start Capture").size(24))
                    .padding([16, 48])
                    .on_press(LandingMessage::StartPressed)
                    .into(),
            ])
            .spacing(32)
            .max_width(640)
            .align_x(Alignment::Center),
        )
        .center(Length::Fill)
        .into()
    }
}
