/// Posts Service Library
///
/// Serves the Yatube blogging pages: posts published to topical groups,
/// comments, the follow graph and a personalized follow feed.
///
/// # Modules
///
/// - `handlers`: HTTP request handlers and route registration
/// - `services`: Business logic layer (feeds, posts, comments, follows)
/// - `db`: `PostsRepository` and its PostgreSQL / in-memory backends
/// - `models`: Data structures for users, groups, posts, comments, follows
/// - `cache`: Page cache for the home feed
/// - `pagination`: Fixed-size page slicing
/// - `forms`: Form binding and validation
/// - `middleware`: Session resolution and login-required extractors
/// - `error`: Error types and handling
/// - `config`: Configuration management
/// - `metrics`: Prometheus collectors
pub mod cache;
pub mod config;
pub mod db;
pub mod error;
pub mod forms;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod models;
pub mod pagination;
pub mod services;
pub mod state;

pub use config::Config;
pub use error::{AppError, Result};
pub use state::AppState;
