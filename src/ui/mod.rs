/// Screens of the album viewer
///
/// Each screen is a plain function from projected state to widgets.
/// None of them hold state or talk to the projector directly.
pub mod detail;
pub mod grid;
pub mod saved;

use iced::widget::container;
use iced::{Element, Length};

use crate::Message;

/// Center a single widget in the remaining space
pub fn centered<'a>(content: impl Into<Element<'a, Message>>) -> Element<'a, Message> {
    container(content)
        .width(Length::Fill)
        .height(Length::Fill)
        .center_x(Length::Fill)
        .center_y(Length::Fill)
        .into()
}
