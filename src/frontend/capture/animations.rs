use std::time::Duration;

use anim::{easing, Animatable, Animation};
use iced::{
    widget::{container, text, Container},
    Border, Color, Length,
};

use crate::backend::sequencer::COUNTDOWN_TICK;

const FLASH_LENGTH: Duration = Duration::from_millis(400);
const DIGIT_SIZE: f32 = 120.0;

#[derive(Debug, Clone, Copy, Animatable)]
pub struct CountdownState {
    opacity: f32,
    text_size: f32,
}

/// One countdown digit: pops in, holds, shrinks away within a single tick.
pub fn countdown() -> anim::Timeline<CountdownState> {
    anim::builder::key_frames([
        anim::KeyFrame::new(CountdownState {
            opacity: 0.0,
            text_size: DIGIT_SIZE * 0.5,
        })
        .by_percent(0.0),
        anim::KeyFrame::new(CountdownState {
            opacity: 1.0,
            text_size: DIGIT_SIZE,
        })
        .easing(easing::cubic_ease().mode(easing::EasingMode::Out))
        .by_percent(0.3),
        anim::KeyFrame::new(CountdownState {
            opacity: 1.0,
            text_size: DIGIT_SIZE,
        })
        .by_percent(0.8),
        anim::KeyFrame::new(CountdownState {
            opacity: 0.0,
            text_size: DIGIT_SIZE * 0.7,
        })
        .easing(easing::cubic_ease().mode(easing::EasingMode::In))
        .by_duration(COUNTDOWN_TICK),
    ])
    .begin_animation()
}

pub fn countdown_view<Message: 'static>(
    remaining: u32,
    state: CountdownState,
) -> Container<'static, Message> {
    container(
        container(text(format!("{remaining}")).size(state.text_size))
            .padding(32)
            .style(move |theme: &iced::Theme| container::Style {
                text_color: Some(
                    theme
                        .extended_palette()
                        .primary
                        .strong
                        .text
                        .scale_alpha(state.opacity),
                ),
                background: Some(
                    Color::BLACK
                        .scale_alpha(0.5 * state.opacity)
                        .into(),
                ),
                border: Border {
                    radius: 9999.0.into(),
                    ..Default::default()
                },
                shadow: Default::default(),
            }),
    )
    .center(Length::Fill)
}

pub fn flash() -> anim::Timeline<f32> {
    anim::Options::new(1.0, 0.0)
        .duration(FLASH_LENGTH)
        .easing(easing::cubic_ease().mode(easing::EasingMode::Out))
        .begin_animation()
}

/// White flash over the feed while the still is taken.
pub fn flash_view<Message>(opacity: f32) -> Container<'static, Message> {
    container(text("SMILE!").size(DIGIT_SIZE * 0.6).color(Color::BLACK.scale_alpha(opacity)))
        .center(Length::Fill)
        .style(move |_| container::Style {
            background: Some(Color::WHITE.scale_alpha(opacity).into()),
            ..Default::default()
        })
        .width(Length::Fill)
        .height(Length::Fill)
}
