//! Synchronization repository
//!
//! Composes the remote catalog and the saved-photo library behind one type.
//! It is the only code that mutates the library.

use std::sync::Arc;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;
use tokio_stream::{Stream, StreamExt};
use tracing::{info, instrument};

use crate::error::Result;
use crate::remote::RemoteSource;
use crate::state::data::{Album, Photo, PhotoId};
use crate::state::library::PhotoLibrary;

pub struct PhotoRepository {
    remote: Arc<dyn RemoteSource>,
    library: PhotoLibrary,
}

impl PhotoRepository {
    pub fn new(remote: Arc<dyn RemoteSource>, library: PhotoLibrary) -> Self {
        Self { remote, library }
    }

    /// Every photo in the remote catalog. Errors are passed through, never retried.
    #[instrument(skip(self))]
    pub async fn fetch_photos(&self) -> Result<Vec<Photo>> {
        self.remote.photos().await
    }

    #[instrument(skip(self))]
    pub async fn fetch_albums(&self) -> Result<Vec<Album>> {
        self.remote.albums().await
    }

    pub async fn fetch_image(&self, url: &str) -> Result<Vec<u8>> {
        self.remote.image(url).await
    }

    /// Live view of the saved set; re-emits the whole list on every change.
    pub fn observe_saved_photos(&self) -> watch::Receiver<Vec<Photo>> {
        self.library.subscribe()
    }

    /// Live view of one saved photo, `None` while it is not saved
    pub fn observe_saved_photo(&self, id: PhotoId) -> impl Stream<Item = Option<Photo>> {
        WatchStream::new(self.library.subscribe())
            .map(move |photos| photos.into_iter().find(|photo| photo.id == id))
    }

    pub async fn saved_photo(&self, id: PhotoId) -> Result<Option<Photo>> {
        self.library.get(id).await
    }

    /// Strict insert: saving an id twice fails with `Duplicate`.
    #[instrument(skip(self, photo), fields(id = photo.id))]
    pub async fn save_photo(&self, photo: &Photo) -> Result<()> {
        self.library.insert(photo.clone()).await?;
        info!("💾 Saved photo {}", photo.id);
        Ok(())
    }

    /// Fails with `NotFound` when the photo was never saved.
    #[instrument(skip(self, photo), fields(id = photo.id))]
    pub async fn delete_photo(&self, photo: &Photo) -> Result<()> {
        self.library.delete(photo.id).await?;
        info!("🗑️  Deleted photo {}", photo.id);
        Ok(())
    }
}

impl std::fmt::Debug for PhotoRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PhotoRepository")
            .field("library", &self.library)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::error::Error;
    use async_trait::async_trait;

    /// Remote source serving fixed lists
    pub(crate) struct FixedRemote {
        pub photos: Vec<Photo>,
        pub albums: Vec<Album>,
    }

    #[async_trait]
    impl RemoteSource for FixedRemote {
        async fn photos(&self) -> Result<Vec<Photo>> {
            Ok(self.photos.clone())
        }

        async fn albums(&self) -> Result<Vec<Album>> {
            Ok(self.albums.clone())
        }

        async fn image(&self, _url: &str) -> Result<Vec<u8>> {
            Err(Error::Protocol("no images here".into()))
        }
    }

    pub(crate) fn photo(id: PhotoId, album_id: i64) -> Photo {
        Photo {
            id,
            album_id,
            title: format!("photo {id}"),
            image_url: format!("u{id}"),
            thumbnail_url: format!("t{id}"),
        }
    }

    fn repository() -> PhotoRepository {
        let remote = FixedRemote {
            photos: vec![photo(3, 1), photo(1, 1), photo(2, 2)],
            albums: vec![Album { id: 1, owner_id: 9, title: "Vacation".into() }],
        };
        PhotoRepository::new(Arc::new(remote), PhotoLibrary::open_in_memory().unwrap())
    }

    #[tokio::test]
    async fn test_fetch_is_verbatim() {
        let repository = repository();

        let ids: Vec<PhotoId> = repository
            .fetch_photos()
            .await
            .unwrap()
            .iter()
            .map(|p| p.id)
            .collect();
        assert_eq!(ids, vec![3, 1, 2]);
        assert_eq!(repository.fetch_albums().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_save_then_observe() {
        let repository = repository();
        let saved = repository.observe_saved_photos();
        assert!(saved.borrow().is_empty());

        let p = photo(1, 1);
        repository.save_photo(&p).await.unwrap();

        let current = saved.borrow().clone();
        assert_eq!(current, vec![p.clone()]);
        assert_eq!(repository.saved_photo(1).await.unwrap(), Some(p));
    }

    #[tokio::test]
    async fn test_save_twice_is_duplicate() {
        let repository = repository();
        let p = photo(1, 1);

        repository.save_photo(&p).await.unwrap();
        let err = repository.save_photo(&p).await.unwrap_err();

        assert!(matches!(err, Error::Duplicate(1)));
        let matching = repository
            .observe_saved_photos()
            .borrow()
            .iter()
            .filter(|saved| saved.id == 1)
            .count();
        assert_eq!(matching, 1);
    }

    #[tokio::test]
    async fn test_delete_after_save() {
        let repository = repository();
        let p = photo(2, 2);

        repository.save_photo(&p).await.unwrap();
        repository.delete_photo(&p).await.unwrap();

        assert!(repository
            .observe_saved_photos()
            .borrow()
            .iter()
            .all(|saved| saved.id != 2));
    }

    #[tokio::test]
    async fn test_delete_never_saved_is_not_found() {
        let repository = repository();

        let err = repository.delete_photo(&photo(8, 1)).await.unwrap_err();
        assert!(matches!(err, Error::NotFound(8)));
    }

    #[tokio::test]
    async fn test_observe_single_photo() {
        let repository = repository();
        let p = photo(1, 1);
        let mut updates = Box::pin(repository.observe_saved_photo(1));

        assert_eq!(updates.next().await, Some(None));

        repository.save_photo(&p).await.unwrap();
        assert_eq!(updates.next().await, Some(Some(p.clone())));

        repository.delete_photo(&p).await.unwrap();
        assert_eq!(updates.next().await, Some(None));
    }
}
