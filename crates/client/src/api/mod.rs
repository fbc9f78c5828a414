//! Typed request functions, one module per backend resource area.
//!
//! Every function is a method on [`PlatformApi`], which only knows how to
//! build paths and parameters; transport, auth and status handling live in
//! [`HttpClient`].

mod alerts;
mod analytics;
mod anomalies;
mod auth;
mod components;
mod incidents;
mod system;

use std::sync::Arc;

use crate::http::HttpClient;

/// Request functions for every backend endpoint the console uses.
#[derive(Clone)]
pub struct PlatformApi {
    http: Arc<HttpClient>,
}

impl PlatformApi {
    pub fn new(http: Arc<HttpClient>) -> Self {
        Self { http }
    }

    pub fn http(&self) -> &HttpClient {
        &self.http
    }
}
