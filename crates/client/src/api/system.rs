use platformops_core::components::ComponentOverview;

use super::PlatformApi;
use crate::error::ApiError;
use crate::query::QueryParams;

impl PlatformApi {
    /// Health, alert count and status of every component.
    pub async fn fetch_system_overview(&self) -> Result<Vec<ComponentOverview>, ApiError> {
        self.http.get_as("/api/system/overview", &QueryParams::new()).await
    }
}
