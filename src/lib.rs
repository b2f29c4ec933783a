//! Photo album browser core.
//!
//! Fetches photos and albums from a remote JSON catalog, keeps a local SQLite
//! set of saved photos, and projects both into a state the UI subscribes to.
//!
//! Dependencies flow one way and are wired at the composition root:
//! [`remote::HttpRemoteSource`] and [`state::library::PhotoLibrary`] go into a
//! [`repository::PhotoRepository`], which goes into a
//! [`state::projector::Projector`].

pub mod config;
pub mod error;
pub mod logging;
pub mod remote;
pub mod repository;
pub mod state;

pub use config::Config;
pub use error::{Error, FailureKind, Result};
pub use repository::PhotoRepository;
pub use state::data::{Album, Catalog, FetchFailure, FetchState, GridItem, Photo, PhotoId, Projection, Selection};
pub use state::library::PhotoLibrary;
pub use state::projector::Projector;
