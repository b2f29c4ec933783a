use iced::widget::{button, column, container, image, row, text};
use iced::{Element, Length, Subscription, Task, Theme};
use std::sync::Arc;
use tokio_stream::wrappers::WatchStream;
use tokio_stream::StreamExt;
use tracing::{info, warn};

use album_viewer::remote::HttpRemoteSource;
use album_viewer::{
    logging, Config, Photo, PhotoId, PhotoLibrary, PhotoRepository, Projection, Projector,
};

mod ui;

/// Which screen is showing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Grid,
    Saved,
    Detail,
}

/// Application messages (events)
#[derive(Debug, Clone)]
pub enum Message {
    /// User asked to fetch the catalog again
    Retry,
    /// The projector published a new state
    Projected(Projection),
    /// The saved set changed
    SavedChanged(Vec<Photo>),
    /// User opened a photo in the detail view
    Open(Photo),
    /// Image bytes arrived for the given url
    ImageLoaded(String, Result<Vec<u8>, String>),
    /// Whether the photo with this id is currently saved
    DetailSaved(PhotoId, bool),
    Show(Screen),
    SaveSelection,
    DeleteSelection,
    SavePhoto(Photo),
    DeletePhoto(Photo),
    /// A background intent finished; errors become a notice
    Done(Result<(), String>),
    Dismiss,
}

/// Main application state
struct AlbumViewer {
    projector: Arc<Projector>,
    /// Latest projection received from the state owner
    projection: Projection,
    saved: Vec<Photo>,
    screen: Screen,
    /// Photo shown by the detail view and whether it is saved
    detail: Option<PhotoId>,
    detail_saved: bool,
    image: Option<image::Handle>,
    /// Url of the image the detail view is waiting for
    wanted_image: Option<String>,
    /// Non-fatal failure shown above the current screen
    notice: Option<String>,
}

impl AlbumViewer {
    fn new(projector: Arc<Projector>) -> Self {
        let projection = projector.state().borrow().clone();
        let saved = projector.saved_items().borrow().clone();

        AlbumViewer {
            projector,
            projection,
            saved,
            screen: Screen::Grid,
            detail: None,
            detail_saved: false,
            image: None,
            wanted_image: None,
            notice: None,
        }
    }

    /// Start with a fetch so the grid fills in right away
    fn boot(self) -> (Self, Task<Message>) {
        (self, Task::done(Message::Retry))
    }

    /// Handle application messages and update state
    fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::Retry => {
                let projector = Arc::clone(&self.projector);
                Task::perform(async move { projector.retry_fetch().await }, done)
            }
            Message::Projected(projection) => {
                self.projection = projection;
                Task::none()
            }
            Message::SavedChanged(saved) => {
                self.saved = saved;
                Task::none()
            }
            Message::Open(photo) => {
                self.screen = Screen::Detail;
                self.detail = Some(photo.id);
                self.detail_saved = false;
                self.image = None;
                self.wanted_image = Some(photo.image_url.clone());

                let id = photo.id;
                let url = photo.image_url.clone();
                let saved = Task::perform(is_saved(Arc::clone(&self.projector), id), move |result| {
                    match result {
                        Ok(saved) => Message::DetailSaved(id, saved),
                        Err(e) => Message::Done(Err(e.to_string())),
                    }
                });
                let select = Task::perform(open_photo(Arc::clone(&self.projector), photo), done);
                let load = Task::perform(
                    load_image(Arc::clone(&self.projector), url.clone()),
                    move |result| Message::ImageLoaded(url.clone(), result),
                );
                Task::batch([saved, select, load])
            }
            Message::DetailSaved(id, saved) => {
                if self.detail == Some(id) {
                    self.detail_saved = saved;
                }
                Task::none()
            }
            Message::ImageLoaded(url, result) => {
                match result {
                    // Only show it if the user has not moved on to another photo
                    Ok(bytes) if self.wanted_image.as_deref() == Some(url.as_str()) => {
                        self.image = Some(image::Handle::from_bytes(bytes));
                    }
                    Ok(_) => {}
                    Err(e) => warn!("⚠️  Could not load {}: {}", url, e),
                }
                Task::none()
            }
            Message::Show(screen) => {
                self.screen = screen;
                Task::none()
            }
            Message::SaveSelection => {
                let projector = Arc::clone(&self.projector);
                Task::perform(async move { projector.save_selection().await }, done)
            }
            Message::DeleteSelection => {
                let projector = Arc::clone(&self.projector);
                Task::perform(async move { projector.delete_selection().await }, done)
            }
            Message::SavePhoto(photo) => {
                let projector = Arc::clone(&self.projector);
                Task::perform(async move { projector.save_photo(&photo).await }, done)
            }
            Message::DeletePhoto(photo) => {
                let projector = Arc::clone(&self.projector);
                Task::perform(async move { projector.delete_photo(&photo).await }, done)
            }
            Message::Done(Ok(())) => Task::none(),
            Message::Done(Err(e)) => {
                self.notice = Some(e);
                Task::none()
            }
            Message::Dismiss => {
                self.notice = None;
                Task::none()
            }
        }
    }

    /// Build the user interface
    fn view(&self) -> Element<'_, Message> {
        let header = row![
            button("Photos")
                .on_press(Message::Show(Screen::Grid))
                .padding(8),
            button(text(format!("Saved ({})", self.saved.len())))
                .on_press(Message::Show(Screen::Saved))
                .padding(8),
        ]
        .spacing(10);

        let body = match self.screen {
            Screen::Grid => ui::grid::view(&self.projection.fetch, self.projector.grid()),
            Screen::Saved => ui::saved::view(&self.saved),
            Screen::Detail => ui::detail::view(
                self.projection.selection.as_ref(),
                self.image.as_ref(),
                self.detail_saved,
            ),
        };

        let mut content = column![header].spacing(20).padding(20);
        if let Some(notice) = &self.notice {
            content = content.push(
                row![
                    text(notice.clone()),
                    button("Dismiss").on_press(Message::Dismiss),
                ]
                .spacing(10),
            );
        }

        container(content.push(body))
            .width(Length::Fill)
            .height(Length::Fill)
            .into()
    }

    /// Follow the projector's state, the saved set and the detail photo's saved status
    fn subscription(&self) -> Subscription<Message> {
        let projection = WatchStream::new(self.projector.state()).map(Message::Projected);
        let saved = WatchStream::new(self.projector.saved_items()).map(Message::SavedChanged);

        let mut subscriptions = vec![
            Subscription::run_with_id("projection", projection),
            Subscription::run_with_id("saved-photos", saved),
        ];

        if let (Screen::Detail, Some(id)) = (self.screen, self.detail) {
            let status = self
                .projector
                .observe_saved_photo(id)
                .map(move |photo| Message::DetailSaved(id, photo.is_some()));
            subscriptions.push(Subscription::run_with_id(("saved-photo", id), status));
        }

        Subscription::batch(subscriptions)
    }

    /// Set the application theme
    fn theme(&self) -> Theme {
        Theme::Dark
    }
}

fn done(result: album_viewer::Result<()>) -> Message {
    Message::Done(result.map_err(|e| e.to_string()))
}

async fn open_photo(projector: Arc<Projector>, photo: Photo) -> album_viewer::Result<()> {
    projector.select_photo(photo).await?;
    projector.resolve_album_for_selection().await?;
    Ok(())
}

async fn is_saved(projector: Arc<Projector>, id: PhotoId) -> album_viewer::Result<bool> {
    Ok(projector.saved_photo(id).await?.is_some())
}

async fn load_image(projector: Arc<Projector>, url: String) -> Result<Vec<u8>, String> {
    projector.load_image(&url).await.map_err(|e| e.to_string())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    logging::init(&config.log_filter);

    // Background work (fetches, the state owner) runs here; iced keeps its own executor
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    let library = PhotoLibrary::open(&config.database_path)?;
    let saved_count = runtime.block_on(library.count())?;
    if let Some(path) = library.path() {
        info!("📚 {} saved photos in {}", saved_count, path.display());
    }
    let remote = HttpRemoteSource::from_config(&config)?;
    info!("🎨 Album viewer using catalog at {}", remote.base_url());

    let repository = Arc::new(PhotoRepository::new(Arc::new(remote), library));
    let projector = {
        let _guard = runtime.enter();
        Arc::new(Projector::spawn(repository))
    };
    let app = AlbumViewer::new(projector);

    iced::application("Album Viewer", AlbumViewer::update, AlbumViewer::view)
        .subscription(AlbumViewer::subscription)
        .theme(AlbumViewer::theme)
        .centered()
        .run_with(move || app.boot())?;

    Ok(())
}
