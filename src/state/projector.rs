//! State projector
//!
//! A single owner task holds the projected state (fetch state and selection)
//! and is the only writer of it. Everything else sends it commands and reads
//! the result through a `watch` receiver. Background fetches report back to
//! the owner through the same command channel.
//!
//! A new `retry_fetch` cancels the fetch still in flight and bumps a
//! generation counter; results tagged with an older generation are dropped.
//! The last fetch *issued* wins, regardless of completion order.

use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, watch};
use tokio_stream::Stream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::data::{
    Album, Catalog, FetchFailure, FetchState, GridItem, Photo, PhotoId, Projection, Selection,
};
use crate::error::{Error, FailureKind, Result};
use crate::repository::PhotoRepository;

/// Messages handled by the state owner
#[derive(Debug)]
enum Command {
    /// Set `Loading` and start a new fetch, replacing any in flight
    Retry { ack: oneshot::Sender<()> },
    /// A background fetch finished
    Fetched { generation: u64, outcome: Result<Catalog> },
    Select { photo: Photo, ack: oneshot::Sender<()> },
    ResolveAlbum { reply: oneshot::Sender<Option<Album>> },
}

/// Handle to the projected UI state.
///
/// Dropping it stops the owner task and cancels any fetch in flight.
pub struct Projector {
    repository: Arc<PhotoRepository>,
    commands: mpsc::UnboundedSender<Command>,
    projection: watch::Receiver<Projection>,
    shutdown: CancellationToken,
}

impl Projector {
    /// Start the state owner. The fetch state begins as `Loading`; nothing is
    /// fetched until the first `retry_fetch`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(repository: Arc<PhotoRepository>) -> Self {
        let (commands, commands_rx) = mpsc::unbounded_channel();
        let shutdown = CancellationToken::new();

        let (owner, projection) =
            StateOwner::new(Arc::clone(&repository), commands.clone(), shutdown.clone());
        tokio::spawn(owner.run(commands_rx));

        Self {
            repository,
            commands,
            projection,
            shutdown,
        }
    }

    /// Subscribe to the projected state
    pub fn state(&self) -> watch::Receiver<Projection> {
        self.projection.clone()
    }

    pub fn fetch_state(&self) -> FetchState {
        self.projection.borrow().fetch.clone()
    }

    pub fn selection(&self) -> Option<Selection> {
        self.projection.borrow().selection.clone()
    }

    /// The saved set, mirrored straight from the repository
    pub fn saved_items(&self) -> watch::Receiver<Vec<Photo>> {
        self.repository.observe_saved_photos()
    }

    /// Live saved status of one photo, `None` while it is not saved
    pub fn observe_saved_photo(&self, id: PhotoId) -> impl Stream<Item = Option<Photo>> {
        self.repository.observe_saved_photo(id)
    }

    pub async fn saved_photo(&self, id: PhotoId) -> Result<Option<Photo>> {
        self.repository.saved_photo(id).await
    }

    /// The last fetched photos with their saved flag; empty unless `Success`
    pub fn grid(&self) -> Vec<GridItem> {
        let saved = self.repository.observe_saved_photos().borrow().clone();
        let projection = self.projection.borrow();

        projection
            .fetch
            .catalog()
            .map(|catalog| catalog.grid(&saved))
            .unwrap_or_default()
    }

    /// Publish `Loading` and start a new fetch of photos and albums.
    ///
    /// Returns once `Loading` is published; the outcome arrives through
    /// [`Projector::state`].
    pub async fn retry_fetch(&self) -> Result<()> {
        let (ack, done) = oneshot::channel();
        self.send(Command::Retry { ack })?;
        done.await.map_err(|_| Error::Closed)
    }

    /// Replace the selection. The album stays unresolved until asked for.
    pub async fn select_photo(&self, photo: Photo) -> Result<()> {
        let (ack, done) = oneshot::channel();
        self.send(Command::Select { photo, ack })?;
        done.await.map_err(|_| Error::Closed)
    }

    /// Find the selected photo's album in the last fetched catalog.
    ///
    /// `Ok(None)` when nothing is selected, the last fetch did not succeed,
    /// or no album matches; the selection is then left unresolved.
    pub async fn resolve_album_for_selection(&self) -> Result<Option<Album>> {
        let (reply, album) = oneshot::channel();
        self.send(Command::ResolveAlbum { reply })?;
        album.await.map_err(|_| Error::Closed)
    }

    pub async fn save_selection(&self) -> Result<()> {
        let photo = self.selected_photo()?;
        self.repository.save_photo(&photo).await
    }

    pub async fn delete_selection(&self) -> Result<()> {
        let photo = self.selected_photo()?;
        self.repository.delete_photo(&photo).await
    }

    pub async fn save_photo(&self, photo: &Photo) -> Result<()> {
        self.repository.save_photo(photo).await
    }

    pub async fn delete_photo(&self, photo: &Photo) -> Result<()> {
        self.repository.delete_photo(photo).await
    }

    /// Image bytes for the detail view
    pub async fn load_image(&self, url: &str) -> Result<Vec<u8>> {
        self.repository.fetch_image(url).await
    }

    /// Stop the owner task and cancel any fetch in flight
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    fn selected_photo(&self) -> Result<Photo> {
        self.projection
            .borrow()
            .selection
            .as_ref()
            .map(|selection| selection.photo.clone())
            .ok_or(Error::NoSelection)
    }

    fn send(&self, command: Command) -> Result<()> {
        self.commands.send(command).map_err(|_| Error::Closed)
    }
}

impl Drop for Projector {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

impl std::fmt::Debug for Projector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Projector")
            .field("projection", &*self.projection.borrow())
            .finish_non_exhaustive()
    }
}

/// Sole writer of the projection
struct StateOwner {
    repository: Arc<PhotoRepository>,
    projection: watch::Sender<Projection>,
    /// Handed to fetch tasks so they can report back
    commands: mpsc::UnboundedSender<Command>,
    generation: u64,
    in_flight: Option<CancellationToken>,
    shutdown: CancellationToken,
}

impl StateOwner {
    fn new(
        repository: Arc<PhotoRepository>,
        commands: mpsc::UnboundedSender<Command>,
        shutdown: CancellationToken,
    ) -> (Self, watch::Receiver<Projection>) {
        let (projection, projection_rx) = watch::channel(Projection::default());
        let owner = StateOwner {
            repository,
            projection,
            commands,
            generation: 0,
            in_flight: None,
            shutdown,
        };
        (owner, projection_rx)
    }

    async fn run(mut self, mut commands: mpsc::UnboundedReceiver<Command>) {
        loop {
            let command = tokio::select! {
                biased;
                _ = self.shutdown.cancelled() => break,
                command = commands.recv() => match command {
                    Some(command) => command,
                    None => break,
                },
            };

            self.handle(command);
        }

        if let Some(fetch) = self.in_flight.take() {
            fetch.cancel();
        }
        debug!("state owner stopped");
    }

    fn handle(&mut self, command: Command) {
        match command {
            Command::Retry { ack } => {
                self.start_fetch();
                let _ = ack.send(());
            }
            Command::Fetched {
                generation,
                outcome,
            } => self.finish_fetch(generation, outcome),
            Command::Select { photo, ack } => {
                self.projection.send_modify(|projection| {
                    projection.selection = Some(Selection { photo, album: None });
                });
                let _ = ack.send(());
            }
            Command::ResolveAlbum { reply } => {
                let album = self.resolve_album();
                let _ = reply.send(album);
            }
        }
    }

    fn start_fetch(&mut self) {
        if let Some(previous) = self.in_flight.take() {
            debug!(generation = self.generation, "cancelling superseded fetch");
            previous.cancel();
        }

        self.generation += 1;
        let generation = self.generation;
        let token = self.shutdown.child_token();
        self.in_flight = Some(token.clone());

        self.projection.send_modify(|projection| {
            projection.fetch = FetchState::Loading;
        });

        let repository = Arc::clone(&self.repository);
        let commands = self.commands.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {
                    debug!(generation, "fetch cancelled before completion");
                }
                outcome = fetch_catalog(&repository) => {
                    // The owner may already be gone; nothing to report to then
                    let _ = commands.send(Command::Fetched { generation, outcome });
                }
            }
        });
    }

    fn finish_fetch(&mut self, generation: u64, outcome: Result<Catalog>) {
        if generation != self.generation {
            debug!(
                generation,
                current = self.generation,
                "dropping result of superseded fetch"
            );
            return;
        }
        self.in_flight = None;

        let fetch = match outcome {
            Ok(catalog) => {
                info!(
                    "📷 Fetched {} photos in {} albums",
                    catalog.photos.len(),
                    catalog.albums.len()
                );
                FetchState::Success(Arc::new(catalog))
            }
            Err(err) => {
                let kind = err.failure_kind().unwrap_or(FailureKind::Protocol);
                warn!(?kind, "⚠️  Fetch failed: {}", err);
                FetchState::Error(FetchFailure {
                    kind,
                    message: err.to_string(),
                })
            }
        };

        self.projection.send_modify(|projection| projection.fetch = fetch);
    }

    fn resolve_album(&mut self) -> Option<Album> {
        let mut resolved = None;

        self.projection.send_if_modified(|projection| {
            let Projection { fetch, selection } = projection;
            let (Some(catalog), Some(selection)) = (fetch.catalog(), selection.as_mut()) else {
                return false;
            };
            let Some(album) = catalog.album_for(&selection.photo).cloned() else {
                return false;
            };

            resolved = Some(album.clone());
            let changed = selection.album.as_ref() != Some(&album);
            selection.album = Some(album);
            changed
        });

        resolved
    }
}

/// Both collections, fetched concurrently. The first failure wins.
async fn fetch_catalog(repository: &PhotoRepository) -> Result<Catalog> {
    let (photos, albums) = tokio::try_join!(repository.fetch_photos(), repository.fetch_albums())?;
    Ok(Catalog::new(photos, albums))
}
