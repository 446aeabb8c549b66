//! story-shelf: reading progress and personal library for serialized
//! illustrated stories.
//!
//! This crate keeps one reading-progress record per user and story, a
//! favorite set, and statistics derived from both. It also resolves a
//! story's chapter listings, spread over several mirror servers, into a
//! navigable sequence of page images from the catalog API.
//!
//! # Features
//!
//! - Document store abstraction with in-memory and SQLite backends
//! - At-most-one progress record per user and story, under concurrency
//! - Statistics recomputed from scratch after every mutation
//! - Per-user library cache with stale-load suppression
//! - Chapter lookup across mirror servers and prev/next navigation
//! - JSON HTTP API and CLI

#![forbid(unsafe_code)]
#![warn(missing_docs)]

/// Story catalog client and chapter resolution.
pub mod catalog;
/// Configuration and CLI.
pub mod config;
/// Error types.
pub mod error;
/// Stale-response guard.
pub mod guard;
/// Personal library.
pub mod library;
/// Stored record types.
pub mod models;
/// HTTP server.
pub mod server;
/// Signed-in user tracking.
pub mod session;
/// Document store.
pub mod store;


pub use catalog::CatalogClient;
pub use config::{Cli, Command, Config};
pub use error::{AppError, Result};
pub use library::LibraryStateCache;
pub use server::AppState;
pub use store::{DocumentStore, MemoryStore, SqliteStore};
