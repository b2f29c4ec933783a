//! Shared data structures for the application state
//!
//! These structs represent the data model that flows between
//! the remote catalog, the saved-photo database and the UI layer.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::error::FailureKind;

/// Stable key of a photo, as assigned by the remote catalog
pub type PhotoId = i64;

/// Represents a single remotely-catalogued photo
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub struct Photo {
    /// Unique id, also the primary key in the saved set
    pub id: PhotoId,
    /// Id of the album this photo belongs to
    pub album_id: i64,
    pub title: String,
    /// Full-size image location (`url` on the wire)
    #[serde(rename = "url")]
    pub image_url: String,
    /// Preview image location
    pub thumbnail_url: String,
}

/// A named grouping of photos
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
pub struct Album {
    pub id: i64,
    #[serde(rename = "userId", alias = "ownerId")]
    pub owner_id: i64,
    pub title: String,
}

/// Snapshot of the remote collections from one successful fetch
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    pub photos: Vec<Photo>,
    pub albums: Vec<Album>,
}

/// One grid tile: a remote photo plus whether it is in the saved set
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridItem {
    pub photo: Photo,
    pub saved: bool,
}

impl Catalog {
    pub fn new(photos: Vec<Photo>, albums: Vec<Album>) -> Self {
        Self { photos, albums }
    }

    /// The album a photo belongs to, joined on `photo.album_id`
    pub fn album_for(&self, photo: &Photo) -> Option<&Album> {
        self.albums.iter().find(|album| album.id == photo.album_id)
    }

    /// Project every photo into a grid tile, marking the ones already saved
    pub fn grid(&self, saved: &[Photo]) -> Vec<GridItem> {
        let saved_ids: HashSet<PhotoId> = saved.iter().map(|photo| photo.id).collect();

        self.photos
            .iter()
            .map(|photo| GridItem {
                photo: photo.clone(),
                saved: saved_ids.contains(&photo.id),
            })
            .collect()
    }
}

/// Why the last fetch failed. The UI shows every failure the same way,
/// the kind is kept for logs and tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchFailure {
    pub kind: FailureKind,
    pub message: String,
}

/// Outcome of the last remote synchronization attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchState {
    Loading,
    Success(std::sync::Arc<Catalog>),
    Error(FetchFailure),
}

impl FetchState {
    pub fn is_loading(&self) -> bool {
        matches!(self, FetchState::Loading)
    }

    pub fn catalog(&self) -> Option<&Catalog> {
        match self {
            FetchState::Success(catalog) => Some(catalog),
            _ => None,
        }
    }
}

/// The photo currently open in the detail view
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub photo: Photo,
    /// Filled in by album resolution; `None` until then or if no album matched
    pub album: Option<Album>,
}

/// Everything the state owner publishes to the UI
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Projection {
    pub fetch: FetchState,
    pub selection: Option<Selection>,
}

impl Default for Projection {
    fn default() -> Self {
        Self {
            fetch: FetchState::Loading,
            selection: None,
        }
    }
}
