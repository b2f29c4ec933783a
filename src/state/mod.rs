/// State management module
///
/// This module handles all application state, including:
/// - The data model shared by every layer (data.rs)
/// - The SQLite database of saved photos (library.rs)
/// - The projected UI state and its single owner task (projector.rs)
pub mod data;
pub mod library;
pub mod projector;
