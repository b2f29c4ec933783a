use iced::widget::{button, column, image, row, text};
use iced::{Element, Length};

use album_viewer::Selection;

use super::centered;
use crate::{Message, Screen};

/// One photo: title, album, image and the save or delete action
pub fn view<'a>(
    selection: Option<&Selection>,
    image_handle: Option<&image::Handle>,
    saved: bool,
) -> Element<'a, Message> {
    let back = button("Back").on_press(Message::Show(Screen::Grid));

    let Some(selection) = selection else {
        return centered(column![text("Nothing selected."), back].spacing(20));
    };

    let album = match &selection.album {
        Some(album) => format!("Album: {}", album.title),
        None => format!("Album #{}", selection.photo.album_id),
    };

    let picture: Element<'a, Message> = match image_handle {
        Some(handle) => image(handle.clone()).width(Length::Fill).into(),
        None => text("Loading image...").into(),
    };

    let action = if saved {
        button("Delete").on_press(Message::DeleteSelection)
    } else {
        button("Save").on_press(Message::SaveSelection)
    };

    column![
        row![back, action].spacing(10),
        text(selection.photo.title.clone()).size(24),
        text(album).size(16),
        picture,
    ]
    .spacing(20)
    .into()
}
