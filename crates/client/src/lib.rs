//! HTTP client, request cache and view models for the PlatformOPS console.
//!
//! [`AppContext`](context::AppContext) is the composition root: it owns the
//! session, the shared tick window, the HTTP client and the query cache,
//! and is handed to every view by reference.

pub mod api;
pub mod cache;
pub mod config;
pub mod context;
pub mod error;
pub mod http;
pub mod mutation;
pub mod query;
pub mod session;
pub mod storage;
pub mod time_window;
pub mod views;

pub use context::AppContext;
pub use error::ApiError;
