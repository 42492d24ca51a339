use iced::{
    gradient::Linear,
    widget::{container, text, Container, Text},
    Alignment, Background, Color, Element, Length, Radians,
};

/// Darkens the bottom of whatever is stacked underneath so captions stay
/// readable over the live camera feed.
pub fn title_overlay<'a, Message: 'a>(
    content: impl Into<Element<'a, Message>>,
) -> Element<'a, Message> {
    container(content)
        .style(move |theme: &iced::Theme| {
            container::background(Background::Gradient(iced::Gradient::Linear(
                Linear::new(Radians::PI)
                    .add_stop(0.0, Color::TRANSPARENT)
                    .add_stop(0.55, Color::TRANSPARENT)
                    .add_stop(1.0, theme.extended_palette().background.base.color),
            )))
        })
        .padding(24)
        .width(Length::Fill)
        .height(Length::Fill)
        .align_y(Alignment::End)
        .align_x(Alignment::Center)
        .into()
}

pub fn title_text(content: impl Into<String>) -> Text<'static> {
    text(content.into())
        .style(|theme: &iced::Theme| text::Style {
            color: Some(theme.extended_palette().background.base.text),
        })
        .size(36)
        .align_x(Alignment::Center)
        .width(Length::Fill)
}

pub fn supporting_text(content: impl Into<String>) -> Text<'static> {
    text(content.into())
        .style(|theme: &iced::Theme| text::Style {
            color: Some(
                theme
                    .extended_palette()
                    .background
                    .base
                    .text
                    .scale_alpha(0.6),
            ),
        })
        .size(20)
        .align_x(Alignment::Center)
        .width(Length::Fill)
}

/// A red outlined box for errors a screen recovered from.
pub fn error_banner<'a, Message: 'a>(message: &str) -> Container<'a, Message> {
    container(text(message.to_owned()).size(14))
        .style(|theme: &iced::Theme| container::Style {
            border: iced::Border::default()
                .rounded(4.0)
                .color(theme.extended_palette().danger.strong.color)
                .width(1.0),
            background: Some(theme.extended_palette().danger.weak.color.into()),
            text_color: Some(theme.extended_palette().danger.weak.text),
            ..Default::default()
        })
        .padding(8)
}
