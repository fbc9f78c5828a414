//! Domain types shared by the PlatformOPS client crates.
//!
//! Everything in here is pure data: backend records mirrored as view
//! models, the envelope decoders that coerce the backend's response shapes,
//! the shared tick window and the cosmetic health banding used by views.
//! No module performs I/O.

pub mod alerts;
pub mod analytics;
pub mod anomalies;
pub mod auth;
pub mod components;
pub mod envelope;
pub mod error;
pub mod incidents;
pub mod presentation;
pub mod types;
pub mod window;
