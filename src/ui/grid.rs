use iced::widget::{button, column, scrollable, text, Column, Row};
use iced::{Alignment, Element, Length};

use album_viewer::{FetchState, GridItem};

use super::centered;
use crate::Message;

/// Tiles per grid row
const TILES_PER_ROW: usize = 4;
const TILE_WIDTH: f32 = 200.0;

/// The photo grid, or the loading / error affordance in its place
pub fn view<'a>(fetch: &FetchState, items: Vec<GridItem>) -> Element<'a, Message> {
    match fetch {
        FetchState::Loading => centered(text("Loading photos...").size(24)),
        FetchState::Error(_) => centered(
            column![
                text("Could not load photos.").size(24),
                button("Retry").on_press(Message::Retry).padding(10),
            ]
            .spacing(20)
            .align_x(Alignment::Center),
        ),
        FetchState::Success(_) if items.is_empty() => centered(text("The catalog is empty.")),
        FetchState::Success(_) => {
            let rows = items.chunks(TILES_PER_ROW).map(|chunk| -> Element<'a, Message> {
                Row::with_children(chunk.iter().map(tile)).spacing(10).into()
            });

            scrollable(Column::with_children(rows).spacing(10))
                .width(Length::Fill)
                .height(Length::Fill)
                .into()
        }
    }
}

fn tile<'a>(item: &GridItem) -> Element<'a, Message> {
    let marker = if item.saved { "★ saved" } else { "" };
    let (label, intent) = save_or_delete(item);

    column![
        button(
            column![
                text(item.photo.title.clone()).size(14),
                text(marker).size(12),
            ]
            .spacing(4),
        )
        .on_press(Message::Open(item.photo.clone()))
        .width(Length::Fill)
        .padding(10),
        button(text(label).size(12)).on_press(intent).padding(4),
    ]
    .spacing(4)
    .width(Length::Fixed(TILE_WIDTH))
    .into()
}

/// The tile's save toggle: saved photos offer Delete, the rest Save
fn save_or_delete(item: &GridItem) -> (&'static str, Message) {
    if item.saved {
        ("Delete", Message::DeletePhoto(item.photo.clone()))
    } else {
        ("Save", Message::SavePhoto(item.photo.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use album_viewer::Photo;

    fn item(saved: bool) -> GridItem {
        GridItem {
            photo: Photo {
                id: 7,
                album_id: 1,
                title: "Harbor".into(),
                image_url: "u7".into(),
                thumbnail_url: "t7".into(),
            },
            saved,
        }
    }

    #[test]
    fn test_unsaved_tile_offers_save() {
        let (label, intent) = save_or_delete(&item(false));

        assert_eq!(label, "Save");
        assert!(matches!(intent, Message::SavePhoto(photo) if photo.id == 7));
    }

    #[test]
    fn test_saved_tile_offers_delete() {
        let (label, intent) = save_or_delete(&item(true));

        assert_eq!(label, "Delete");
        assert!(matches!(intent, Message::DeletePhoto(photo) if photo.id == 7));
    }
}
