//! Composition root shared by every view.

use std::future::Future;
use std::sync::Arc;

use platformops_core::auth::UserInfo;

use crate::api::PlatformApi;
use crate::cache::{QueryCache, QueryKey};
use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::http::HttpClient;
use crate::mutation::Mutation;
use crate::session::SessionStore;
use crate::storage::{FileStore, KeyValueStore};
use crate::time_window::TimeWindowState;

/// Owns the session, tick window, API client and cache for one run of the
/// console. Views take it by reference.
pub struct AppContext {
    config: ClientConfig,
    session: Arc<SessionStore>,
    time_window: TimeWindowState,
    api: PlatformApi,
    cache: QueryCache,
}

impl AppContext {
    /// Build the context with the session persisted under
    /// [`ClientConfig::state_dir`].
    pub fn init(config: ClientConfig) -> Result<Self, ApiError> {
        let storage = Arc::new(FileStore::new(config.session_path()));
        Self::with_storage(config, storage)
    }

    /// Build the context over an arbitrary session storage.
    pub fn with_storage(
        config: ClientConfig,
        storage: Arc<dyn KeyValueStore>,
    ) -> Result<Self, ApiError> {
        let session = Arc::new(SessionStore::load(storage)?);
        let http = HttpClient::new(&config.api_url, Arc::clone(&session))?;

        tracing::info!(
            api_url = %config.api_url,
            authenticated = session.is_authenticated(),
            "Client context initialized",
        );

        Ok(Self {
            api: PlatformApi::new(Arc::new(http)),
            session,
            time_window: TimeWindowState::default(),
            cache: QueryCache::new(),
            config,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn api(&self) -> &PlatformApi {
        &self.api
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    pub fn time_window(&self) -> &TimeWindowState {
        &self.time_window
    }

    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    /// Run a declared query through the cache.
    pub async fn query<T, F>(&self, key: QueryKey, fetch: F) -> Result<T, ApiError>
    where
        T: Clone + Send + Sync + 'static,
        F: Future<Output = Result<T, ApiError>>,
    {
        self.cache.fetch(key, fetch).await
    }

    /// Run a write and, only if it succeeds, invalidate what it affects.
    pub async fn mutate<T, F>(&self, mutation: Mutation, call: F) -> Result<T, ApiError>
    where
        F: Future<Output = Result<T, ApiError>>,
    {
        match call.await {
            Ok(value) => {
                self.cache.apply(&mutation).await;
                Ok(value)
            }
            Err(e) => {
                tracing::warn!(mutation = ?mutation, error = %e, "Mutation failed");
                Err(e)
            }
        }
    }

    /// Log in and persist the resulting session.
    pub async fn login(&self, username: &str, password: &str) -> Result<UserInfo, ApiError> {
        let token = self.api.login(username, password).await?;
        let user = self.api.fetch_user_for_token(&token).await?;
        self.session.set_session(token, user.clone())?;
        self.cache.clear().await;
        Ok(user)
    }

    pub async fn logout(&self) -> Result<(), ApiError> {
        self.session.clear_session()?;
        self.cache.clear().await;
        Ok(())
    }

    /// Release cached data. The persisted session is left in place.
    pub async fn shutdown(self) {
        let entries = self.cache.len().await;
        self.cache.clear().await;
        tracing::info!(entries, "Client context shut down");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::Resource;
    use crate::storage::MemoryStore;

    fn context() -> AppContext {
        AppContext::with_storage(ClientConfig::default(), Arc::new(MemoryStore::new())).unwrap()
    }

    #[tokio::test]
    async fn failed_mutation_leaves_cache_alone() {
        let ctx = context();
        ctx.query(QueryKey::new(Resource::AlertSummary), async { Ok::<_, ApiError>(1_i64) })
            .await
            .unwrap();

        let result = ctx
            .mutate(Mutation::EvaluateAlerts, async {
                Err::<(), _>(ApiError::Status {
                    status: 503,
                    body: String::new(),
                })
            })
            .await;

        assert!(result.is_err());
        assert!(ctx.cache().contains(&QueryKey::new(Resource::AlertSummary)).await);
    }

    #[tokio::test]
    async fn successful_mutation_invalidates() {
        let ctx = context();
        ctx.query(QueryKey::new(Resource::AlertSummary), async { Ok::<_, ApiError>(1_i64) })
            .await
            .unwrap();

        ctx.mutate(Mutation::EvaluateAlerts, async { Ok::<_, ApiError>(()) })
            .await
            .unwrap();

        assert!(!ctx.cache().contains(&QueryKey::new(Resource::AlertSummary)).await);
    }

    #[test]
    fn invalid_api_url_fails_init() {
        let config = ClientConfig {
            api_url: "localhost without scheme".into(),
            ..ClientConfig::default()
        };
        assert!(AppContext::with_storage(config, Arc::new(MemoryStore::new())).is_err());
    }
}
