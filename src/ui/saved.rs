use iced::widget::{button, row, scrollable, text, Column};
use iced::{Element, Length};

use album_viewer::Photo;

use super::centered;
use crate::Message;

/// List of saved photos, each with open and delete actions
pub fn view<'a>(saved: &[Photo]) -> Element<'a, Message> {
    if saved.is_empty() {
        return centered(text("No saved photos yet."));
    }

    let rows = saved.iter().map(|photo| -> Element<'a, Message> {
        row![
            button(text(photo.title.clone()))
                .on_press(Message::Open(photo.clone()))
                .width(Length::Fill),
            button("Delete").on_press(Message::DeletePhoto(photo.clone())),
        ]
        .spacing(10)
        .into()
    });

    scrollable(Column::with_children(rows).spacing(8))
        .width(Length::Fill)
        .height(Length::Fill)
        .into()
}
