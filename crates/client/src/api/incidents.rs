use serde_json::json;

use platformops_core::incidents::{
    GroupedIncidents, Incident, IncidentComment, IncidentStatus, IncidentTimeline,
    IncidentTimelineEvent,
};
use platformops_core::types::DbId;

use super::PlatformApi;
use crate::error::ApiError;
use crate::query::QueryParams;

impl PlatformApi {
    pub async fn fetch_incidents(&self, status: IncidentStatus) -> Result<Vec<Incident>, ApiError> {
        let query = QueryParams::new().push("status", status);
        self.http.get_as("/api/incidents", &query).await
    }

    pub async fn fetch_incident(&self, id: DbId) -> Result<Incident, ApiError> {
        self.http
            .get_as(&format!("/api/incidents/{id}"), &QueryParams::new())
            .await
    }

    pub async fn fetch_incident_timeline(
        &self,
        id: DbId,
    ) -> Result<Vec<IncidentTimelineEvent>, ApiError> {
        let timeline: IncidentTimeline = self
            .http
            .get_as(&format!("/api/incidents/{id}/timeline"), &QueryParams::new())
            .await?;
        Ok(timeline.timeline)
    }

    pub async fn acknowledge_incident(&self, id: DbId) -> Result<Incident, ApiError> {
        self.http
            .post_as::<(), _>(&format!("/api/incidents/{id}/acknowledge"), &QueryParams::new(), None)
            .await
    }

    pub async fn resolve_incident(&self, id: DbId, note: &str) -> Result<Incident, ApiError> {
        self.http
            .post_as(
                &format!("/api/incidents/{id}/resolve"),
                &QueryParams::new(),
                Some(&json!({ "note": note })),
            )
            .await
    }

    /// Group open alerts into incidents; returns how many were created.
    pub async fn group_alerts_into_incidents(&self) -> Result<i64, ApiError> {
        let grouped: GroupedIncidents = self
            .http
            .post_as::<(), _>("/api/incidents/group-alerts", &QueryParams::new(), None)
            .await?;
        Ok(grouped.grouped_incidents)
    }

    pub async fn fetch_incident_comments(&self, id: DbId) -> Result<Vec<IncidentComment>, ApiError> {
        self.http
            .get_as(&format!("/api/incidents/{id}/comments"), &QueryParams::new())
            .await
    }

    pub async fn add_incident_comment(
        &self,
        id: DbId,
        comment: &str,
    ) -> Result<IncidentComment, ApiError> {
        self.http
            .post_as(
                &format!("/api/incidents/{id}/comments"),
                &QueryParams::new(),
                Some(&json!({ "comment": comment })),
            )
            .await
    }
}
